// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The event kind is not in the enumerated set.
    InvalidEventKind(String),
    /// The role string is not a known role.
    InvalidRole(String),
    /// The color is not `#RGB` or `#RRGGBB` hex.
    InvalidColor(String),
    /// The logo MIME type is not png, jpeg, or webp.
    InvalidLogoMime(String),
    /// The team name is empty or invalid.
    InvalidTeamName(String),
    /// The operator username is empty or invalid.
    InvalidUsername(String),
    /// The pagination limit is out of range.
    InvalidLimit {
        /// The requested limit.
        limit: i64,
        /// The maximum accepted limit.
        max: i64,
    },
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEventKind(kind) => write!(f, "Invalid event kind: '{kind}'"),
            Self::InvalidRole(role) => write!(f, "Invalid role: '{role}'"),
            Self::InvalidColor(color) => {
                write!(f, "Invalid color '{color}': expected #RGB or #RRGGBB hex")
            }
            Self::InvalidLogoMime(mime) => {
                write!(f, "Invalid logo MIME type '{mime}': expected png, jpeg, or webp")
            }
            Self::InvalidTeamName(msg) => write!(f, "Invalid team name: {msg}"),
            Self::InvalidUsername(msg) => write!(f, "Invalid username: {msg}"),
            Self::InvalidLimit { limit, max } => {
                write!(f, "Invalid limit {limit}: must be between 1 and {max}")
            }
        }
    }
}

impl std::error::Error for DomainError {}
