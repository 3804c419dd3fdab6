//! Permission request: the input aggregate for decision-engine operations.

use serde::{Deserialize, Serialize};

/// Input to the decision engine.
///
/// Any of the four goal fields may be `None`, meaning "unconstrained" (bound
/// to an anonymous variable) when used as a goal argument. Each operation
/// documents which fields it requires.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionRequest {
    /// The requesting user.
    pub user: Option<String>,
    /// The target the action applies to.
    pub target: Option<String>,
    /// The entity (domain) the target belongs to.
    pub entity: Option<String>,
    /// The requested action.
    pub action: Option<String>,
    /// Upper bound on enumerated proofs; `None` means unbounded.
    pub max_solutions: Option<usize>,
    /// Opaque caller payload, carried through untouched.
    pub custom: Option<serde_json::Value>,
}

impl PermissionRequest {
    /// Creates an empty (fully unconstrained) request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the user.
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the target.
    #[must_use]
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets the entity.
    #[must_use]
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Sets the action.
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Caps the number of proofs enumerated on behalf of this request.
    #[must_use]
    pub fn max_solutions(mut self, max: usize) -> Self {
        self.max_solutions = Some(max);
        self
    }
}
