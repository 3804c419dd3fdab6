//! Solver boundary: the narrow contract to the inference engine, and the
//! adapter that owns the live engine instance.
//!
//! The engine itself is a pluggable collaborator consumed through the
//! [`Solver`] trait. The [`SolverAdapter`] owns exactly one engine and its
//! lifecycle: after every knowledge-base mutation the adapter fully rebuilds
//! the loaded theory (reset, consult facts, consult rules, in that order)
//! rather than patching it, so the engine's view is always consistent with
//! persisted state.

mod engine;

pub use engine::ResolutionEngine;

use log::debug;

use crate::error::{RulegateResult, SolverError};
use crate::kb::KnowledgeBase;
use crate::solution::Solution;

/// Contract an inference engine must provide.
///
/// Implementations back [`SolverAdapter`]; the built-in
/// [`ResolutionEngine`] is the default. Zero solutions is success; engine
/// failures must surface as [`SolverError`], never as an empty result.
pub trait Solver: Send {
    /// Discards all loaded clauses.
    fn reset(&mut self);

    /// Loads a theory: one clause per line, blank and `%` lines skipped.
    ///
    /// # Errors
    /// [`SolverError::MalformedClause`] for unparseable lines.
    fn consult(&mut self, theory: &str) -> Result<(), SolverError>;

    /// Returns the first proof of `goal`, or `None` when no proof exists.
    ///
    /// # Errors
    /// [`SolverError`] for malformed goals or engine failures.
    fn solve(&mut self, goal: &str) -> Result<Option<Solution>, SolverError>;

    /// Enumerates up to `max` proofs of `goal`, each binding every named
    /// variable appearing in the goal.
    ///
    /// # Errors
    /// [`SolverError`] for malformed goals or engine failures.
    fn solve_all(&mut self, goal: &str, max: usize) -> Result<Vec<Solution>, SolverError>;
}

/// Owns the single live engine instance and its loaded-theory lifecycle.
///
/// Callers must serialize access: reload and query on the same adapter are
/// mutually exclusive (the decision engine holds one lock around both).
pub struct SolverAdapter {
    engine: Box<dyn Solver>,
    loaded: bool,
}

impl SolverAdapter {
    /// Wraps an engine; the theory is not loaded until [`Self::reload`].
    #[must_use]
    pub fn new(engine: Box<dyn Solver>) -> Self {
        Self {
            engine,
            loaded: false,
        }
    }

    /// Discards engine state and re-consults the current facts and rules,
    /// in that order.
    ///
    /// # Errors
    /// Persistence errors reading the knowledge base, or solver errors for
    /// clauses the engine cannot parse. On error the adapter stays
    /// unloaded and refuses queries.
    pub fn reload(&mut self, kb: &KnowledgeBase) -> RulegateResult<()> {
        self.loaded = false;
        self.engine.reset();
        let facts = kb.facts_theory()?;
        let rules = kb.rules_theory()?;
        self.engine.consult(&facts)?;
        self.engine.consult(&rules)?;
        self.loaded = true;
        debug!(
            "theory reloaded from {} and {}",
            kb.facts_path().display(),
            kb.rules_path().display()
        );
        Ok(())
    }

    /// Returns whether at least one proof of `goal` exists.
    ///
    /// # Errors
    /// [`SolverError::TheoryNotLoaded`] before a successful reload, or any
    /// engine failure. Zero proofs is `Ok(false)`.
    pub fn eval(&mut self, goal: &str) -> Result<bool, SolverError> {
        self.ensure_loaded()?;
        debug!("running goal: {goal}");
        Ok(self.engine.solve(goal)?.is_some())
    }

    /// Enumerates up to `max` proofs of `goal`.
    ///
    /// With `refine` set, proofs whose every binding is of a non-concrete
    /// kind are dropped; such proofs are search artifacts and must not
    /// reach the caller.
    ///
    /// # Errors
    /// [`SolverError::TheoryNotLoaded`] before a successful reload, or any
    /// engine failure.
    pub fn solve_all(
        &mut self,
        goal: &str,
        max: usize,
        refine: bool,
    ) -> Result<Vec<Solution>, SolverError> {
        self.ensure_loaded()?;
        debug!("running goal: {goal} (max {max}, refine {refine})");
        let solutions = self.engine.solve_all(goal, max)?;
        if refine {
            Ok(solutions
                .into_iter()
                .filter(|s| s.terms().iter().any(|t| t.kind.is_concrete()))
                .collect())
        } else {
            Ok(solutions)
        }
    }

    fn ensure_loaded(&self) -> Result<(), SolverError> {
        if self.loaded {
            Ok(())
        } else {
            Err(SolverError::TheoryNotLoaded)
        }
    }
}

impl std::fmt::Debug for SolverAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverAdapter")
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}
