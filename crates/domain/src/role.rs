// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Operator roles, ordered by authority.
///
/// Roles apply to operators (dashboard principals), never to the
/// event users observed in telemetry. The derived ordering is the
/// authorization ordering: `basic < advanced < administrator < god`,
/// and `administrator` passes every gate that `god` does except an
/// explicit `god` gate.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Role {
    /// Read access to events and aggregates.
    #[default]
    #[serde(rename = "basic")]
    Basic,
    /// Additionally may run bulk deletions.
    #[serde(rename = "advanced")]
    Advanced,
    /// Additionally administers teams, orgs, mappings, and operators.
    #[serde(rename = "administrator")]
    Administrator,
    /// The seed principal. Equivalent to `administrator` for every
    /// current gate; reserved for irreversible operations.
    #[serde(rename = "god")]
    God,
}

impl Role {
    /// Returns true when this role satisfies a gate requiring `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self >= required
    }

    /// Returns true when this role may administer operators, teams,
    /// orgs, and mappings.
    #[must_use]
    pub fn is_admin(self) -> bool {
        self.satisfies(Self::Administrator)
    }

    /// Converts this role to its wire string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
            Self::Administrator => "administrator",
            Self::God => "god",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "advanced" => Ok(Self::Advanced),
            "administrator" => Ok(Self::Administrator),
            "god" => Ok(Self::God),
            _ => Err(DomainError::InvalidRole(s.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
