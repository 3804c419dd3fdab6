//! Permission output model: access-right bit flags and their aggregation.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Action vocabulary granting the create bit.
pub const ACTION_CREATE: &str = "create";
/// Action vocabulary granting the read bit.
pub const ACTION_READ: &str = "read";
/// Action vocabulary granting the update bit.
pub const ACTION_UPDATE: &str = "update";
/// Action vocabulary granting the delete bit.
pub const ACTION_DELETE: &str = "delete";

/// Access-right bit flags.
///
/// Aggregated as the bitwise union of every action observed across all
/// solutions contributing to one (entity, target) pair.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessTypes(u8);

impl AccessTypes {
    /// No access.
    pub const NONE: Self = Self(0);
    /// Permission to create.
    pub const CREATE: Self = Self(1);
    /// Permission to read.
    pub const READ: Self = Self(2);
    /// Permission to update.
    pub const UPDATE: Self = Self(4);
    /// Permission to delete.
    pub const DELETE: Self = Self(8);

    /// Raw bit value.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if no bit is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for AccessTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for AccessTypes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for AccessTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        let mut first = true;
        for (label, flag) in [
            ("CREATE", Self::CREATE),
            ("READ", Self::READ),
            ("UPDATE", Self::UPDATE),
            ("DELETE", Self::DELETE),
        ] {
            if self.contains(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{label}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Fixed, exhaustive action-to-flag table.
///
/// A lookup table rather than a defaulted match, so "unmapped action" stays
/// an explicit, testable case.
const ACTION_FLAGS: [(&str, AccessTypes); 4] = [
    (ACTION_CREATE, AccessTypes::CREATE),
    (ACTION_READ, AccessTypes::READ),
    (ACTION_UPDATE, AccessTypes::UPDATE),
    (ACTION_DELETE, AccessTypes::DELETE),
];

/// Maps an action string to its access flag.
///
/// Unmapped actions contribute no bits.
#[must_use]
pub fn access_for_action(action: &str) -> AccessTypes {
    ACTION_FLAGS
        .iter()
        .find(|(name, _)| *name == action)
        .map_or(AccessTypes::NONE, |(_, flag)| *flag)
}

/// Aggregated access rights for one (entity, target) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    /// The entity the rights apply within.
    pub entity: String,
    /// The target the rights apply to; `None` when the query left the
    /// target unconstrained.
    pub target: Option<String>,
    /// Union of every granted access bit.
    pub access_types: AccessTypes,
}

impl Permission {
    /// Returns true if the create bit is set.
    #[must_use]
    pub const fn has_create_access(&self) -> bool {
        self.access_types.contains(AccessTypes::CREATE)
    }

    /// Returns true if the read bit is set.
    #[must_use]
    pub const fn has_read_access(&self) -> bool {
        self.access_types.contains(AccessTypes::READ)
    }

    /// Returns true if the update bit is set.
    #[must_use]
    pub const fn has_update_access(&self) -> bool {
        self.access_types.contains(AccessTypes::UPDATE)
    }

    /// Returns true if the delete bit is set.
    #[must_use]
    pub const fn has_delete_access(&self) -> bool {
        self.access_types.contains(AccessTypes::DELETE)
    }
}
