use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use tempfile::tempdir;

use rulegate::{PermissionProvider, PermissionRequest};

/// Seed a knowledge base with `n` direct grants plus a small rule chain.
fn make_provider(dir: &std::path::Path, n: usize) -> PermissionProvider {
    let provider =
        PermissionProvider::open(dir.join("facts.pl"), dir.join("rules.pl")).unwrap();

    let facts: Vec<String> = (0..n)
        .map(|i| format!("authorisation(user{}, doc{i}, stuff, read).", i % 16))
        .collect();
    let fact_refs: Vec<&str> = facts.iter().map(String::as_str).collect();
    provider.add_facts(&fact_refs).unwrap();

    provider
        .add_rule("authorisation(U, everything, stuff, update) :- powerUser(U).")
        .unwrap();
    provider.add_fact("powerUser(user0).").unwrap();

    provider
}

fn bench_is_authorized(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let provider = make_provider(dir.path(), 512);
    let request = PermissionRequest::new()
        .user("user0")
        .target("doc0")
        .entity("stuff")
        .action("read");

    let mut group = c.benchmark_group("is_authorized");
    group.throughput(Throughput::Elements(1));
    group.bench_function("hit_512_facts", |b| {
        b.iter(|| assert!(provider.is_authorized(&request)));
    });

    let miss = PermissionRequest::new()
        .user("nobody")
        .target("doc0")
        .entity("stuff")
        .action("read");
    group.bench_function("miss_512_facts", |b| {
        b.iter(|| assert!(!provider.is_authorized(&miss)));
    });
    group.finish();
}

fn bench_enumeration(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let provider = make_provider(dir.path(), 512);
    let request = PermissionRequest::new()
        .user("user0")
        .entity("stuff")
        .action("read");

    let mut group = c.benchmark_group("enumeration");
    group.throughput(Throughput::Elements(32));
    group.bench_function("authorized_targets", |b| {
        b.iter(|| {
            let targets = provider.authorized_targets(&request).unwrap();
            assert!(!targets.is_empty());
        });
    });

    let user_req = PermissionRequest::new().user("user0");
    group.bench_function("user_permissions", |b| {
        b.iter(|| {
            let permissions = provider.user_permissions(&user_req).unwrap();
            assert!(!permissions.is_empty());
        });
    });
    group.finish();
}

fn bench_mutation_reload(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let provider = make_provider(dir.path(), 256);

    c.bench_function("add_remove_fact_with_reload", |b| {
        b.iter(|| {
            provider.add_fact("authorisation(tmp, tmpDoc, stuff, read).").unwrap();
            provider
                .remove_fact("authorisation(tmp, tmpDoc, stuff, read).")
                .unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_is_authorized,
    bench_enumeration,
    bench_mutation_reload
);
criterion_main!(benches);
