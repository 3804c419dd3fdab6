//! # Rulegate - Logic-Driven Authorization Resolution
//!
//! Rulegate answers fine-grained access-control questions — can user U
//! perform action A on target T within entity E? — by compiling structured
//! requests into logic-programming goals, evaluating them against a mutable
//! fact/rule knowledge base, and translating the resulting variable bindings
//! back into typed permission objects.
//!
//! ## Core Concepts
//!
//! - **Fact / Rule**: one clause line of logic-program text, persisted to a
//!   backing file and re-consulted by the solver after every mutation
//! - **Goal**: a predicate name plus ordered arguments submitted to the solver
//! - **Solution**: one satisfying assignment of the goal's named variables
//! - **Permission**: the access-right bitmask aggregated from all proofs for
//!   one (entity, target) pair
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rulegate::{PermissionProvider, PermissionRequest};
//!
//! let provider = PermissionProvider::open("facts.pl", "rules.pl")?;
//! provider.add_fact("powerUser(alice).")?;
//! provider.add_rule("authorisation(U, T, stuff, A) :- userCanDoActionOnTarget(U, A, T).")?;
//!
//! let request = PermissionRequest::new()
//!     .user("alice")
//!     .target("publicStuff")
//!     .entity("stuff")
//!     .action("read");
//! let allowed = provider.is_authorized(&request);
//! ```
//!
//! The inference engine is a pluggable collaborator behind the
//! [`solver::Solver`] trait; the built-in [`solver::ResolutionEngine`]
//! covers the flat predicate shapes the decision engine emits.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod kb;
pub mod permission;
pub mod provider;
pub mod request;
pub mod solution;
pub mod solver;
pub mod term;

// Re-export primary types at crate root for convenience
pub use error::{
    PersistenceError, RulegateError, RulegateResult, SolverError, ValidationError,
};
pub use kb::{KbSnapshot, KnowledgeBase};
pub use permission::{access_for_action, AccessTypes, Permission};
pub use provider::{
    PermissionProvider, DEFAULT_PREDICATE, TERM_ACTION, TERM_ENTITY, TERM_TARGET,
};
pub use request::PermissionRequest;
pub use solution::Solution;
pub use solver::{ResolutionEngine, Solver, SolverAdapter};
pub use term::{as_constant, build_goal, Term, TermKind, ANONYMOUS};
