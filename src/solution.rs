//! Solution model: one satisfying assignment for one proof of a goal.

use serde::{Deserialize, Serialize};

use crate::term::{Term, TermKind};

/// An ordered collection of [`Term`]s representing one full satisfying
/// assignment for one proof of a goal.
///
/// Multiple solutions for one goal are alternative proofs from backtracking;
/// they are not sorted and may repeat. Consumers requiring set semantics
/// must deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Solution(Vec<Term>);

impl Solution {
    /// Creates a solution from bound terms, preserving order.
    #[must_use]
    pub fn new(terms: Vec<Term>) -> Self {
        Self(terms)
    }

    /// The terms of this assignment, in goal-variable order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.0
    }

    /// Looks up the bound value of the variable `name`.
    ///
    /// An unbound variable has no value: `None` is returned both for a
    /// missing binding and for a variable the proof left unbound, so
    /// consumers never mistake an empty string for a real value.
    #[must_use]
    pub fn term_value(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|t| t.name == name && t.kind != TermKind::Unbound)
            .map(|t| t.value.as_str())
    }

    /// Looks up the kind of the variable `name`.
    #[must_use]
    pub fn term_kind(&self, name: &str) -> Option<TermKind> {
        self.0.iter().find(|t| t.name == name).map(|t| t.kind)
    }

    /// Returns true if a binding for `name` is present.
    #[must_use]
    pub fn contains_term(&self, name: &str) -> bool {
        self.0.iter().any(|t| t.name == name)
    }

    /// Number of bound terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the assignment binds no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Term> for Solution {
    fn from_iter<I: IntoIterator<Item = Term>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Solution {
    type Item = Term;
    type IntoIter = std::vec::IntoIter<Term>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
