// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the service layer.
//!
//! Every variant maps onto one stable wire code (see [`ApiError::code`])
//! so the browser can localize failures without string matching.

use toolscope_persistence::PersistenceError;

/// Service-layer errors.
///
/// These represent the API contract and are distinct from storage errors,
/// which are classified on the way up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed: missing, invalid, or expired session, or bad
    /// credentials.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// The request's CSRF header did not match the session's CSRF token.
    CsrfMismatch,
    /// The operator's role does not satisfy the endpoint's requirement.
    RoleInsufficient {
        /// The minimum role required for this action.
        required: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// The payload exceeded a configured size cap.
    PayloadTooLarge {
        /// The cap in bytes.
        limit: usize,
    },
    /// A requested resource was not found.
    NotFound {
        /// A human-readable description of what was not found.
        message: String,
    },
    /// A unique constraint was violated.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// The request exceeded its deadline.
    Timeout,
    /// The service cannot take the request right now: backpressure or
    /// unreachable storage.
    Unavailable {
        /// A human-readable description.
        message: String,
    },
    /// An internal error occurred. Opaque to clients.
    Internal {
        /// A description of the internal error.
        message: String,
    },
}

impl ApiError {
    /// The stable wire code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed { .. } => "unauthorized",
            Self::CsrfMismatch => "csrf_mismatch",
            Self::RoleInsufficient { .. } => "role_insufficient",
            Self::InvalidInput { .. } => "bad_request",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::Timeout => "timeout",
            Self::Unavailable { .. } => "unavailable",
            Self::Internal { .. } => "internal",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::CsrfMismatch => write!(f, "CSRF token mismatch"),
            Self::RoleInsufficient { required } => {
                write!(f, "This action requires the {required} role")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for '{field}': {message}")
            }
            Self::PayloadTooLarge { limit } => {
                write!(f, "Payload exceeds the {limit}-byte limit")
            }
            Self::NotFound { message } => write!(f, "Not found: {message}"),
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::Timeout => write!(f, "Request deadline exceeded"),
            Self::Unavailable { message } => write!(f, "Service unavailable: {message}"),
            Self::Internal { message } => write!(f, "Internal error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound(message) => Self::NotFound { message },
            PersistenceError::Conflict(message) => Self::Conflict { message },
            PersistenceError::StorageError(message)
            | PersistenceError::DatabaseConnectionFailed(message) => {
                Self::Unavailable { message }
            }
            other => Self::Internal {
                message: other.to_string(),
            },
        }
    }
}

impl From<toolscope_domain::DomainError> for ApiError {
    fn from(err: toolscope_domain::DomainError) -> Self {
        Self::InvalidInput {
            field: String::from("value"),
            message: err.to_string(),
        }
    }
}
