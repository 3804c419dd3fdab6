//! Authorization decision engine.
//!
//! Composes the knowledge base, goal builder, and solver adapter into the
//! four public policy operations, all built on one fixed 4-ary predicate
//! `authorisation(User, Target, Entity, Action)` (name configurable, arity
//! and argument order fixed).
//!
//! The provider treats the knowledge base and the engine as one
//! serially-accessible resource: a single mutex guards every
//! mutate → reload → query sequence, since a query racing a reload produces
//! undefined results.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use log::{debug, warn};

use crate::error::{RulegateError, RulegateResult, SolverError, ValidationError};
use crate::kb::KnowledgeBase;
use crate::permission::{access_for_action, AccessTypes, Permission};
use crate::request::PermissionRequest;
use crate::solution::Solution;
use crate::solver::{ResolutionEngine, Solver, SolverAdapter};
use crate::term::{as_constant, build_goal};

/// Default name of the authorization predicate.
pub const DEFAULT_PREDICATE: &str = "authorisation";

/// Variable name binding the target position.
pub const TERM_TARGET: &str = "Target";
/// Variable name binding the entity position.
pub const TERM_ENTITY: &str = "Entity";
/// Variable name binding the action position.
pub const TERM_ACTION: &str = "Action";

struct ProviderInner {
    kb: KnowledgeBase,
    adapter: SolverAdapter,
}

/// Resolves permission requests against the knowledge base.
pub struct PermissionProvider {
    predicate: String,
    inner: Mutex<ProviderInner>,
}

impl PermissionProvider {
    /// Opens the knowledge base at the given file paths and loads it into
    /// the built-in resolution engine.
    ///
    /// # Errors
    /// Persistence errors opening or validating the files, or solver
    /// errors loading the initial theory.
    pub fn open(
        facts_path: impl Into<std::path::PathBuf>,
        rules_path: impl Into<std::path::PathBuf>,
    ) -> RulegateResult<Self> {
        let kb = KnowledgeBase::open(facts_path, rules_path)?;
        Self::with_solver(kb, Box::new(ResolutionEngine::new()))
    }

    /// Builds a provider around an externally supplied solver.
    ///
    /// The initial reload happens here; the solver is never queried with a
    /// stale or absent theory.
    ///
    /// # Errors
    /// Persistence or solver errors loading the initial theory.
    pub fn with_solver(kb: KnowledgeBase, solver: Box<dyn Solver>) -> RulegateResult<Self> {
        let mut adapter = SolverAdapter::new(solver);
        adapter.reload(&kb)?;
        Ok(Self {
            predicate: DEFAULT_PREDICATE.to_string(),
            inner: Mutex::new(ProviderInner { kb, adapter }),
        })
    }

    /// Overrides the authorization predicate name.
    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = predicate.into();
        self
    }

    /// The authorization predicate name in use.
    #[must_use]
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    /// Builds the goal string for `predicate` over positional arguments.
    ///
    /// Exposed for diagnostics and testing.
    #[must_use]
    pub fn build_predicate(predicate: &str, arguments: &[String]) -> String {
        build_goal(predicate, arguments)
    }

    /// Returns whether the request is authorized.
    ///
    /// All four request fields are bound (absent fields become anonymous
    /// variables). Never fails for a well-formed request: solver errors
    /// are logged and resolved to deny.
    pub fn is_authorized(&self, request: &PermissionRequest) -> bool {
        let goal = build_goal(
            &self.predicate,
            &[
                as_constant(request.user.as_deref()),
                as_constant(request.target.as_deref()),
                as_constant(request.entity.as_deref()),
                as_constant(request.action.as_deref()),
            ],
        );

        let mut inner = match self.lock() {
            Ok(inner) => inner,
            Err(err) => {
                warn!("denying request, provider unavailable: {err}");
                return false;
            }
        };
        match inner.adapter.eval(&goal) {
            Ok(proved) => proved,
            Err(err) => {
                warn!("denying request, solver failed on goal {goal}: {err}");
                false
            }
        }
    }

    /// Lists every distinct target the user may act on.
    ///
    /// Requires `user`, `action`, and `entity`; the target position is
    /// solved for. The result is deduplicated and sorted ascending.
    ///
    /// # Errors
    /// Validation error for missing required fields; solver and
    /// persistence errors propagate (an empty result always means
    /// "successfully proved nothing").
    pub fn authorized_targets(&self, request: &PermissionRequest) -> RulegateResult<Vec<String>> {
        let user = required(request.user.as_deref(), "user")?;
        let action = required(request.action.as_deref(), "action")?;
        let entity = required(request.entity.as_deref(), "entity")?;

        let goal = build_goal(
            &self.predicate,
            &[
                as_constant(Some(user)),
                TERM_TARGET.to_string(),
                as_constant(Some(entity)),
                as_constant(Some(action)),
            ],
        );

        let solutions = self.solve(&goal, request.max_solutions)?;
        let mut targets: Vec<String> = solutions
            .iter()
            .filter_map(|s| s.term_value(TERM_TARGET))
            .map(str::to_string)
            .collect();
        targets.sort();
        targets.dedup();
        Ok(targets)
    }

    /// Summarizes the user's access rights on one target.
    ///
    /// Requires `user` and `entity`; `target` may be bound or left
    /// unconstrained; the action position is solved for and every observed
    /// action is folded into the access bitmask. No proof at all yields
    /// [`AccessTypes::NONE`], not an error.
    ///
    /// # Errors
    /// Validation error for missing required fields; solver and
    /// persistence errors propagate.
    pub fn target_permissions(&self, request: &PermissionRequest) -> RulegateResult<Permission> {
        let user = required(request.user.as_deref(), "user")?;
        let entity = required(request.entity.as_deref(), "entity")?;

        let goal = build_goal(
            &self.predicate,
            &[
                as_constant(Some(user)),
                as_constant(request.target.as_deref()),
                as_constant(Some(entity)),
                TERM_ACTION.to_string(),
            ],
        );

        let solutions = self.solve(&goal, request.max_solutions)?;
        let access = solutions
            .iter()
            .filter_map(|s| s.term_value(TERM_ACTION))
            .fold(AccessTypes::NONE, |acc, action| {
                acc | access_for_action(action)
            });

        Ok(Permission {
            entity: entity.to_string(),
            target: request.target.clone(),
            access_types: access,
        })
    }

    /// Computes the user's full permission set.
    ///
    /// Requires `user`; target, entity, and action positions are all
    /// solved for. Proofs are grouped by (target, entity) and each group's
    /// actions are folded into one bitmask. Group order is deterministic
    /// for a fixed knowledge base and request.
    ///
    /// # Errors
    /// Validation error for a missing user; solver and persistence errors
    /// propagate.
    pub fn user_permissions(&self, request: &PermissionRequest) -> RulegateResult<Vec<Permission>> {
        let user = required(request.user.as_deref(), "user")?;

        let goal = build_goal(
            &self.predicate,
            &[
                as_constant(Some(user)),
                TERM_TARGET.to_string(),
                TERM_ENTITY.to_string(),
                TERM_ACTION.to_string(),
            ],
        );

        let solutions = self.solve(&goal, request.max_solutions)?;

        // BTreeMap keeps the grouping stable across runs.
        let mut groups: BTreeMap<(String, String), AccessTypes> = BTreeMap::new();
        for solution in &solutions {
            let (Some(target), Some(entity)) = (
                solution.term_value(TERM_TARGET),
                solution.term_value(TERM_ENTITY),
            ) else {
                continue;
            };
            let access = groups
                .entry((target.to_string(), entity.to_string()))
                .or_insert(AccessTypes::NONE);
            if let Some(action) = solution.term_value(TERM_ACTION) {
                *access |= access_for_action(action);
            }
        }

        Ok(groups
            .into_iter()
            .map(|((target, entity), access_types)| Permission {
                entity,
                target: Some(target),
                access_types,
            })
            .collect())
    }

    /// Appends a fact and reloads the solver.
    ///
    /// # Errors
    /// Validation, persistence, or reload errors.
    pub fn add_fact(&self, fact: &str) -> RulegateResult<()> {
        self.add_facts(&[fact])
    }

    /// Appends facts (idempotent per element) and reloads the solver once.
    ///
    /// # Errors
    /// Validation, persistence, or reload errors.
    pub fn add_facts(&self, facts: &[&str]) -> RulegateResult<()> {
        debug!("adding facts: {facts:?}");
        self.mutate(|kb| kb.add_facts(facts))
    }

    /// Removes a fact and reloads the solver.
    ///
    /// # Errors
    /// Persistence or reload errors.
    pub fn remove_fact(&self, fact: &str) -> RulegateResult<()> {
        self.remove_facts(&[fact])
    }

    /// Removes facts (no-op per absent element) and reloads the solver once.
    ///
    /// # Errors
    /// Persistence or reload errors.
    pub fn remove_facts(&self, facts: &[&str]) -> RulegateResult<()> {
        debug!("removing facts: {facts:?}");
        self.mutate(|kb| kb.remove_facts(facts))
    }

    /// Appends a rule and reloads the solver.
    ///
    /// # Errors
    /// Validation, persistence, or reload errors.
    pub fn add_rule(&self, rule: &str) -> RulegateResult<()> {
        self.add_rules(&[rule])
    }

    /// Appends rules (idempotent per element) and reloads the solver once.
    ///
    /// # Errors
    /// Validation, persistence, or reload errors.
    pub fn add_rules(&self, rules: &[&str]) -> RulegateResult<()> {
        debug!("adding rules: {rules:?}");
        self.mutate(|kb| kb.add_rules(rules))
    }

    /// Removes a rule and reloads the solver.
    ///
    /// # Errors
    /// Persistence or reload errors.
    pub fn remove_rule(&self, rule: &str) -> RulegateResult<()> {
        self.remove_rules(&[rule])
    }

    /// Removes rules (no-op per absent element) and reloads the solver once.
    ///
    /// # Errors
    /// Persistence or reload errors.
    pub fn remove_rules(&self, rules: &[&str]) -> RulegateResult<()> {
        debug!("removing rules: {rules:?}");
        self.mutate(|kb| kb.remove_rules(rules))
    }

    /// Current fact clauses, in file order.
    ///
    /// # Errors
    /// Persistence errors.
    pub fn facts(&self) -> RulegateResult<Vec<String>> {
        self.lock()?.kb.facts()
    }

    /// Current rule clauses, in file order.
    ///
    /// # Errors
    /// Persistence errors.
    pub fn rules(&self) -> RulegateResult<Vec<String>> {
        self.lock()?.kb.rules()
    }

    /// Applies a knowledge-base mutation, then reloads the solver.
    ///
    /// The store's clause-syntax check is looser than what a given solver
    /// may accept, so the mutated state can fail to load. In that case the
    /// snapshot taken before the mutation is written back and reloaded, and
    /// the load error propagates: a mutation either leaves the persisted
    /// state loaded and consistent, or leaves it exactly as it was.
    fn mutate(&self, apply: impl FnOnce(&KnowledgeBase) -> RulegateResult<bool>) -> RulegateResult<()> {
        let mut inner = self.lock()?;
        let snapshot = inner.kb.snapshot()?;
        apply(&inner.kb)?;
        if let Err(err) = reload(&mut inner) {
            warn!("reload failed after mutation, rolling back: {err}");
            inner.kb.restore(&snapshot)?;
            reload(&mut inner)?;
            return Err(err);
        }
        Ok(())
    }

    fn solve(&self, goal: &str, max: Option<usize>) -> RulegateResult<Vec<Solution>> {
        let mut inner = self.lock()?;
        let max = max.unwrap_or(usize::MAX);
        Ok(inner.adapter.solve_all(goal, max, true)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ProviderInner>, RulegateError> {
        self.inner.lock().map_err(|_| {
            RulegateError::Solver(SolverError::Engine {
                message: "poisoned provider lock".to_string(),
            })
        })
    }
}

impl std::fmt::Debug for PermissionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionProvider")
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

/// Rebuild the loaded theory after a knowledge-base mutation.
fn reload(inner: &mut ProviderInner) -> RulegateResult<()> {
    let ProviderInner { kb, adapter } = inner;
    adapter.reload(kb)
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ValidationError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ValidationError::MissingField {
            field: field.to_string(),
        }),
    }
}
