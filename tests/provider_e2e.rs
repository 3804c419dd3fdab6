//! End-to-end tests for the authorization decision engine.
//!
//! These tests exercise the full pipeline against real backing files:
//! request → goal construction → solver → solution aggregation →
//! permission/bool/string results.

use std::path::Path;

use tempfile::tempdir;

use rulegate::{AccessTypes, PermissionProvider, PermissionRequest};

fn provider(dir: &Path) -> PermissionProvider {
    let _ = env_logger::builder().is_test(true).try_init();
    PermissionProvider::open(dir.join("facts.pl"), dir.join("rules.pl")).unwrap()
}

/// The power-user scenario: a rule chain grants `modifier` on `publicStuff`
/// within `stuff` to every power user.
fn seed_power_user(p: &PermissionProvider) {
    p.add_fact("powerUser(alice).").unwrap();
    p.add_rule("userCanDoActionOnTarget(U, modifier, publicStuff) :- powerUser(U).")
        .unwrap();
    p.add_rule("authorisation(U, T, stuff, A) :- userCanDoActionOnTarget(U, A, T).")
        .unwrap();
}

#[test]
fn test_power_user_scenario() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    seed_power_user(&p);

    let granted = PermissionRequest::new()
        .user("alice")
        .target("publicStuff")
        .entity("stuff")
        .action("modifier");
    assert!(p.is_authorized(&granted));

    let denied = PermissionRequest::new()
        .user("alice")
        .target("publicStuff")
        .entity("stuff")
        .action("supprimer");
    assert!(!p.is_authorized(&denied));
}

#[test]
fn test_wildcard_fields_match_any_value() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("authorisation(alice, doc1, stuff, read).")
        .unwrap();

    // Absent fields become anonymous variables; the check succeeds iff any
    // proof exists for the bound ones.
    assert!(p.is_authorized(&PermissionRequest::new().user("alice")));
    assert!(!p.is_authorized(&PermissionRequest::new().user("bob")));
    assert!(p.is_authorized(&PermissionRequest::new().action("read")));
}

#[test]
fn test_deny_by_default_when_nothing_unifies() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    let req = PermissionRequest::new()
        .user("alice")
        .target("doc")
        .entity("stuff")
        .action("read");
    assert!(!p.is_authorized(&req));
}

#[test]
fn test_authorized_targets_sorted_and_distinct() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("role(alice, reviewer).").unwrap();
    p.add_fact("role(alice, editor).").unwrap();
    // Two independent proofs for the same target must not duplicate it.
    p.add_rule("authorisation(U, sharedDoc, stuff, read) :- role(U, R).")
        .unwrap();
    p.add_fact("authorisation(alice, archive, stuff, read).")
        .unwrap();

    let req = PermissionRequest::new()
        .user("alice")
        .entity("stuff")
        .action("read");
    let targets = p.authorized_targets(&req).unwrap();
    assert_eq!(targets, vec!["archive", "sharedDoc"]);
}

#[test]
fn test_authorized_targets_validates_required_fields() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    let err = p
        .authorized_targets(&PermissionRequest::new().action("read").entity("stuff"))
        .unwrap_err();
    assert!(err.is_validation());
    assert!(format!("{err}").contains("'user'"));
}

#[test]
fn test_target_permissions_aggregates_bitmask() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("authorisation(u, targetA, stuff, read).").unwrap();
    p.add_fact("authorisation(u, targetA, stuff, update).")
        .unwrap();
    p.add_fact("authorisation(u, targetB, stuff, delete).")
        .unwrap();

    let req = PermissionRequest::new()
        .user("u")
        .entity("stuff")
        .target("targetA");
    let permission = p.target_permissions(&req).unwrap();
    assert_eq!(permission.entity, "stuff");
    assert_eq!(permission.target.as_deref(), Some("targetA"));
    assert_eq!(
        permission.access_types,
        AccessTypes::READ | AccessTypes::UPDATE
    );
    assert!(permission.has_read_access());
    assert!(permission.has_update_access());
    assert!(!permission.has_delete_access());
}

#[test]
fn test_target_permissions_no_proof_is_none_not_error() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    let req = PermissionRequest::new().user("ghost").entity("stuff");
    let permission = p.target_permissions(&req).unwrap();
    assert_eq!(permission.access_types, AccessTypes::NONE);
    assert!(permission.target.is_none());
}

#[test]
fn test_target_permissions_ignores_unknown_actions() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("authorisation(u, t, stuff, read).").unwrap();
    p.add_fact("authorisation(u, t, stuff, supprimer).").unwrap();

    let req = PermissionRequest::new().user("u").entity("stuff").target("t");
    let permission = p.target_permissions(&req).unwrap();
    assert_eq!(permission.access_types, AccessTypes::READ);
}

#[test]
fn test_user_permissions_groups_by_target_and_entity() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("authorisation(u, t1, e1, read).").unwrap();
    p.add_fact("authorisation(u, t1, e1, update).").unwrap();
    p.add_fact("authorisation(u, t2, e1, read).").unwrap();

    let permissions = p
        .user_permissions(&PermissionRequest::new().user("u"))
        .unwrap();
    assert_eq!(permissions.len(), 2);

    let t1 = permissions
        .iter()
        .find(|perm| perm.target.as_deref() == Some("t1"))
        .unwrap();
    assert_eq!(t1.entity, "e1");
    assert_eq!(t1.access_types, AccessTypes::READ | AccessTypes::UPDATE);

    let t2 = permissions
        .iter()
        .find(|perm| perm.target.as_deref() == Some("t2"))
        .unwrap();
    assert_eq!(t2.access_types, AccessTypes::READ);
}

#[test]
fn test_user_permissions_order_is_deterministic() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("authorisation(u, zeta, e1, read).").unwrap();
    p.add_fact("authorisation(u, alpha, e1, read).").unwrap();

    let first = p
        .user_permissions(&PermissionRequest::new().user("u"))
        .unwrap();
    let second = p
        .user_permissions(&PermissionRequest::new().user("u"))
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(first[0].target.as_deref(), Some("alpha"));
    assert_eq!(first[1].target.as_deref(), Some("zeta"));
}

#[test]
fn test_add_fact_idempotent_through_provider() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("powerUser(alice).").unwrap();
    p.add_fact("powerUser(alice).").unwrap();
    assert_eq!(p.facts().unwrap(), vec!["powerUser(alice)."]);
}

#[test]
fn test_add_then_remove_is_inverse() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("powerUser(alice).").unwrap();
    let before = p.facts().unwrap();

    p.add_fact("powerUser(bob).").unwrap();
    p.remove_fact("powerUser(bob).").unwrap();
    assert_eq!(p.facts().unwrap(), before);
}

#[test]
fn test_rapid_successive_mutations_are_all_applied() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    for i in 0..25 {
        p.add_fact(&format!("authorisation(u, doc{i}, stuff, read)."))
            .unwrap();
    }
    let req = PermissionRequest::new()
        .user("u")
        .entity("stuff")
        .action("read");
    assert_eq!(p.authorized_targets(&req).unwrap().len(), 25);
}

#[test]
fn test_enumeration_propagates_solver_errors() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    // The embedded quote makes the generated goal unparseable; enumeration
    // must fail, not return an empty (indistinguishable) result.
    let req = PermissionRequest::new()
        .user("al'ice")
        .entity("stuff")
        .action("read");
    let err = p.authorized_targets(&req).unwrap_err();
    assert!(err.is_solver());
}

#[test]
fn test_rejected_clause_rolls_back_and_keeps_serving() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("authorisation(alice, doc1, stuff, read).")
        .unwrap();
    let before = p.facts().unwrap();

    // Passes the store's clause-syntax check but the engine rejects the
    // nested compound argument on reload; the mutation must be undone.
    let err = p.add_fact("owns(alice, box(books)).").unwrap_err();
    assert!(err.is_solver());
    assert_eq!(p.facts().unwrap(), before);

    // The provider still answers, and the persisted files still open.
    let req = PermissionRequest::new()
        .user("alice")
        .target("doc1")
        .entity("stuff")
        .action("read");
    assert!(p.is_authorized(&req));
    drop(p);
    let reopened = PermissionProvider::open(
        dir.path().join("facts.pl"),
        dir.path().join("rules.pl"),
    )
    .unwrap();
    assert!(reopened.is_authorized(&req));
}

#[test]
fn test_user_permissions_skips_unbound_positions() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_fact("powerUser(alice).").unwrap();
    // The target position is unconstrained by the rule, so proofs leave it
    // unbound; such proofs must not surface as a permission group.
    p.add_rule("authorisation(U, T, stuff, read) :- powerUser(U).")
        .unwrap();

    let permissions = p
        .user_permissions(&PermissionRequest::new().user("alice"))
        .unwrap();
    assert!(permissions.is_empty());
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let p = provider(dir.path());
        seed_power_user(&p);
    }

    // A fresh provider over the same files sees the persisted knowledge.
    let p = PermissionProvider::open(
        dir.path().join("facts.pl"),
        dir.path().join("rules.pl"),
    )
    .unwrap();
    let req = PermissionRequest::new()
        .user("alice")
        .target("publicStuff")
        .entity("stuff")
        .action("modifier");
    assert!(p.is_authorized(&req));
}

#[test]
fn test_batch_mutations_reload_once_and_apply_in_sequence() {
    let dir = tempdir().unwrap();
    let p = provider(dir.path());
    p.add_facts(&[
        "authorisation(u, a, e, read).",
        "authorisation(u, b, e, read).",
        "authorisation(u, a, e, read).",
    ])
    .unwrap();
    assert_eq!(p.facts().unwrap().len(), 2);

    p.remove_facts(&[
        "authorisation(u, a, e, read).",
        "authorisation(u, missing, e, read).",
    ])
    .unwrap();
    assert_eq!(p.facts().unwrap(), vec!["authorisation(u, b, e, read)."]);
}
