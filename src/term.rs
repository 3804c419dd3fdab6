//! Term model and goal construction.
//!
//! A [`Term`] is one binding produced by the solver: the unification-variable
//! name, a kind classifying the bound value, and the value's text with any
//! quoting stripped. The free functions translate domain values into goal
//! argument syntax: [`as_constant`] quotes bound values (or substitutes the
//! anonymous-variable marker), [`build_goal`] joins arguments positionally
//! into a clause-terminated goal string.

use serde::{Deserialize, Serialize};

/// The anonymous-variable marker: "any value, not reported".
pub const ANONYMOUS: &str = "_";

/// Classification of a value bound by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    /// An atomic constant (`alice`, `publicStuff`).
    Atom,
    /// A quoted string constant (`'alice'`).
    Str,
    /// A numeric constant.
    Number,
    /// A compound structure; not produced by the built-in engine.
    Compound,
    /// An unbound or anonymous variable.
    Unbound,
}

impl TermKind {
    /// Returns true for kinds carrying a concrete, consumable value.
    ///
    /// The solve-result refinement filter keeps a solution only when at
    /// least one of its terms is concrete.
    #[must_use]
    pub const fn is_concrete(self) -> bool {
        matches!(self, Self::Atom | Self::Str | Self::Number)
    }
}

/// One variable binding from a satisfying assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Kind of the bound value.
    pub kind: TermKind,
    /// The unification-variable name used in the goal.
    pub name: String,
    /// Textual value, quotes stripped. Empty for [`TermKind::Unbound`].
    pub value: String,
}

/// Renders a request field as a goal argument.
///
/// `None`, an empty string, or the anonymous marker itself all map to the
/// anonymous variable (the call is idempotent); anything else becomes a
/// single-quoted constant.
#[must_use]
pub fn as_constant(value: Option<&str>) -> String {
    match value {
        None | Some("") => ANONYMOUS.to_string(),
        Some(v) if v == ANONYMOUS => ANONYMOUS.to_string(),
        Some(v) => format!("'{v}'"),
    }
}

/// Builds a goal string for `predicate` from positional arguments.
///
/// Arguments are joined verbatim: callers decide per argument whether it is
/// a quoted constant (via [`as_constant`]), a bare atom, or a capitalized
/// variable name signalling "solve for this". Argument order is significant
/// and arity is the caller's responsibility. Pure function of its inputs.
#[must_use]
pub fn build_goal(predicate: &str, arguments: &[String]) -> String {
    format!("{predicate}({}).", arguments.join(", "))
}
