// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and session management.
//!
//! Sessions are rows in the storage engine: an opaque bearer token plus a
//! CSRF token bound 1:1 to it. Producer principals (machine submitters)
//! get a longer TTL and a CSRF exemption recorded on the session row; the
//! exemption is opt-in per operator account, never inferred.

use rand::Rng;
use time::{Duration, OffsetDateTime};
use toolscope_domain::Role;
use toolscope_persistence::{
    OperatorRow, Persistence, SessionRow, mutations, queries,
};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::{format_timestamp, now_timestamp, parse_timestamp};

/// Session token length in bytes before hex encoding.
const TOKEN_BYTES: usize = 32;

/// An authenticated operator resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentOperator {
    /// The operator's login name.
    pub username: String,
    /// The operator's role.
    pub role: Role,
    /// Whether this account is an opted-in machine producer.
    pub is_producer: bool,
    /// The session token this identity was resolved from.
    pub session_token: String,
    /// The CSRF token bound to the session.
    pub csrf_token: String,
    /// Whether the session is exempt from CSRF checks (producers only).
    pub csrf_exempt: bool,
}

impl CurrentOperator {
    /// Whether this operator satisfies `required`.
    #[must_use]
    pub fn satisfies(&self, required: Role) -> bool {
        self.role.satisfies(required)
    }
}

/// The result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// The freshly issued session row.
    pub session: SessionRow,
    /// The authenticated operator's role.
    pub role: Role,
}

/// Issues, validates, and revokes sessions.
#[derive(Debug, Clone, Copy)]
pub struct AuthService {
    /// TTL for interactive operator sessions.
    pub session_ttl: Duration,
    /// TTL for machine producer sessions.
    pub producer_session_ttl: Duration,
    /// bcrypt cost used when hashing passwords.
    pub hash_cost: u32,
}

impl AuthService {
    /// Creates an auth service from TTLs in seconds.
    #[must_use]
    pub const fn new(session_ttl_seconds: i64, producer_session_ttl_seconds: i64, hash_cost: u32) -> Self {
        Self {
            session_ttl: Duration::seconds(session_ttl_seconds),
            producer_session_ttl: Duration::seconds(producer_session_ttl_seconds),
            hash_cost,
        }
    }

    /// Authenticates credentials and issues a session.
    ///
    /// Failed lookups and failed password checks produce the same error so
    /// responses do not reveal which usernames exist.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` on bad credentials, or a storage
    /// error if session creation fails.
    pub fn login(
        &self,
        persistence: &Persistence,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, ApiError> {
        let mut conn = persistence.writer()?;

        let operator: OperatorRow =
            match queries::operators::get_operator_by_username(&mut conn, username) {
                Ok(operator) => operator,
                Err(toolscope_persistence::PersistenceError::NotFound(_)) => {
                    warn!(username, "Login attempt for unknown operator");
                    return Err(Self::invalid_credentials());
                }
                Err(e) => return Err(e.into()),
            };

        let verified: bool = queries::operators::verify_password(&operator, password)?;
        if !verified {
            warn!(username, "Login attempt with wrong password");
            return Err(Self::invalid_credentials());
        }

        let role: Role = parse_role(&operator.role)?;
        let is_producer: bool = operator.is_producer != 0;

        let ttl: Duration = if is_producer {
            self.producer_session_ttl
        } else {
            self.session_ttl
        };
        let now: OffsetDateTime = OffsetDateTime::now_utc();
        let issued_at: String = format_timestamp(now)?;
        let expires_at: String = format_timestamp(now + ttl)?;

        let token: String = generate_token();
        let csrf_token: String = generate_token();

        let session: SessionRow = mutations::sessions::create_session(
            &mut conn,
            &token,
            &csrf_token,
            &operator.username,
            &issued_at,
            &expires_at,
            is_producer,
        )?;
        mutations::operators::touch_last_login(&mut conn, &operator.username, &issued_at)?;

        info!(username, ?role, is_producer, "Operator logged in");
        Ok(LoginOutcome { session, role })
    }

    /// Resolves a session token into its operator, rejecting expired or
    /// unknown tokens.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailed` for unknown or expired tokens.
    pub fn validate_session(
        persistence: &Persistence,
        token: &str,
    ) -> Result<CurrentOperator, ApiError> {
        let mut conn = persistence.reader()?;

        let session: SessionRow = queries::sessions::get_session_by_token(&mut conn, token)
            .map_err(|_| ApiError::AuthenticationFailed {
                reason: String::from("Invalid session"),
            })?;

        let expires_at: OffsetDateTime = parse_timestamp(&session.expires_at)
            .map_err(|_| ApiError::AuthenticationFailed {
                reason: String::from("Malformed session expiry"),
            })?;
        if OffsetDateTime::now_utc() >= expires_at {
            return Err(ApiError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let operator: OperatorRow =
            queries::operators::get_operator_by_username(&mut conn, &session.operator_username)
                .map_err(|_| ApiError::AuthenticationFailed {
                    reason: String::from("Session operator no longer exists"),
                })?;

        Ok(CurrentOperator {
            username: operator.username,
            role: parse_role(&operator.role)?,
            is_producer: operator.is_producer != 0,
            session_token: session.token,
            csrf_token: session.csrf_token,
            csrf_exempt: session.csrf_exempt != 0,
        })
    }

    /// Revokes a session. Unknown tokens are ignored; logout is
    /// idempotent.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub fn logout(persistence: &Persistence, token: &str) -> Result<(), ApiError> {
        let mut conn = persistence.writer()?;
        mutations::sessions::delete_session_by_token(&mut conn, token)?;
        Ok(())
    }

    /// Deletes expired session rows. Called periodically by the lifecycle
    /// layer.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the sweep fails.
    pub fn cleanup_expired(persistence: &Persistence) -> Result<usize, ApiError> {
        let now: String = now_timestamp()?;
        let mut conn = persistence.writer()?;
        Ok(mutations::sessions::delete_expired_sessions(&mut conn, &now)?)
    }

    /// Verifies a CSRF header value against the session's token,
    /// byte-for-byte. Producer sessions opt out.
    ///
    /// # Errors
    ///
    /// Returns `CsrfMismatch` when the header is missing or differs.
    pub fn check_csrf(operator: &CurrentOperator, header: Option<&str>) -> Result<(), ApiError> {
        if operator.csrf_exempt {
            return Ok(());
        }
        match header {
            Some(value) if value.as_bytes() == operator.csrf_token.as_bytes() => Ok(()),
            _ => Err(ApiError::CsrfMismatch),
        }
    }

    fn invalid_credentials() -> ApiError {
        ApiError::AuthenticationFailed {
            reason: String::from("Invalid username or password"),
        }
    }
}

/// Generates an unpredictable hex token.
fn generate_token() -> String {
    let mut bytes: [u8; TOKEN_BYTES] = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    bytes.iter().fold(
        String::with_capacity(TOKEN_BYTES * 2),
        |mut acc, byte| {
            use std::fmt::Write;
            let _ = write!(acc, "{byte:02x}");
            acc
        },
    )
}

/// Parses a stored role string, treating unknown values as corruption.
fn parse_role(value: &str) -> Result<Role, ApiError> {
    value.parse().map_err(|_| ApiError::Internal {
        message: format!("Invalid stored role: {value}"),
    })
}
