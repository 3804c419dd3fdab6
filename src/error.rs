//! Error types for Rulegate.
//!
//! All errors are strongly typed using thiserror. The layering follows the
//! policy in the crate docs: validation errors are raised before any solver
//! interaction, solver errors are distinct from "no solutions", and
//! persistence errors always propagate (silent data loss on a fact mutation
//! is unacceptable).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Validation errors raised before any engine interaction.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A request field documented as required was missing or blank.
    #[error("Required field '{field}' is missing or blank")]
    MissingField {
        /// Name of the missing request field.
        field: String,
    },

    /// A clause submitted for insertion does not look like a clause.
    #[error("Malformed clause '{clause}': {reason}")]
    MalformedClause {
        /// The rejected clause text.
        clause: String,
        /// Why the clause was rejected.
        reason: String,
    },
}

/// Errors surfaced by the inference-engine boundary.
///
/// Zero solutions is a successful outcome and is never represented here.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The goal text could not be parsed.
    #[error("Malformed goal '{goal}': {reason}")]
    MalformedGoal {
        /// The goal as submitted.
        goal: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A clause in a consulted theory could not be parsed.
    #[error("Malformed clause '{clause}': {reason}")]
    MalformedClause {
        /// The offending clause text.
        clause: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// Proof search was truncated at the resolution depth bound before any
    /// proof was found (typically a left-recursive rule set). A truncated
    /// search that already produced proofs returns them instead.
    #[error("Proof search exceeded the depth limit of {limit}")]
    DepthLimitExceeded {
        /// The configured resolution depth bound.
        limit: usize,
    },

    /// A query was issued before the theory was (re)loaded.
    #[error("Theory not loaded; reload the solver before querying")]
    TheoryNotLoaded,

    /// Internal engine failure.
    #[error("Inference engine failure: {message}")]
    Engine {
        /// Engine-reported diagnostic.
        message: String,
    },
}

/// Errors touching the backing fact/rule files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A knowledge-base file could not be read.
    #[error("Failed to read knowledge base file {path}: {source}")]
    Read {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A knowledge-base file could not be written.
    #[error("Failed to write knowledge base file {path}: {source}")]
    Write {
        /// File that failed to persist.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A persisted line failed clause-syntax validation on load.
    ///
    /// Malformed lines are never silently skipped.
    #[error("Malformed clause at {path}:{line}: '{text}'")]
    MalformedClause {
        /// File containing the bad line.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// The offending line.
        text: String,
    },
}

/// Top-level error type for Rulegate operations.
#[derive(Debug, Error)]
pub enum RulegateError {
    /// Input validation failed; nothing was evaluated or persisted.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The solver failed to execute (distinct from "no solutions").
    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// The backing knowledge-base files could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl RulegateError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a solver error.
    #[must_use]
    pub const fn is_solver(&self) -> bool {
        matches!(self, Self::Solver(_))
    }

    /// Returns true if this is a persistence error.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

/// Result type alias for Rulegate operations.
pub type RulegateResult<T> = Result<T, RulegateError>;
