// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Event ingestion: payload validation, normalization, and the single
//! INSERT that persists an event.
//!
//! Producers send loosely-shaped JSON; field aliases absorb the camelCase
//! and snake_case variants seen in the wild. The `data` payload is stored
//! verbatim so it round-trips bytewise through the query surface.

use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;
use toolscope_domain::{EventKind, org_identifier_key};
use toolscope_persistence::{NewEvent, Persistence, mutations};
use tracing::debug;

use crate::error::ApiError;
use crate::{format_timestamp, now_timestamp};

/// Default cap on the serialized `data` payload.
pub const DEFAULT_DATA_MAX_BYTES: usize = 128 * 1024;

/// Payload-shape failures, separated from [`ApiError`] so the validation
/// rules stay testable on their own.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The request body exceeded the configured cap.
    #[error("payload exceeds the {limit}-byte limit")]
    TooLarge {
        /// The cap in bytes.
        limit: usize,
    },
    /// The body was not valid JSON for the expected shape.
    #[error("malformed event payload: {0}")]
    Malformed(String),
    /// The event kind is not in the enumerated set.
    #[error("unknown event kind '{0}'")]
    UnknownKind(String),
    /// The client timestamp did not parse as ISO-8601.
    #[error("invalid event timestamp '{0}'")]
    BadTimestamp(String),
    /// The `data` payload exceeded its own cap.
    #[error("data payload exceeds the {limit}-byte limit")]
    DataTooLarge {
        /// The cap in bytes.
        limit: usize,
    },
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::TooLarge { limit } | PayloadError::DataTooLarge { limit } => {
                Self::PayloadTooLarge { limit }
            }
            PayloadError::Malformed(message) => Self::InvalidInput {
                field: String::from("body"),
                message,
            },
            PayloadError::UnknownKind(kind) => Self::InvalidInput {
                field: String::from("eventType"),
                message: format!("Unknown event kind '{kind}'"),
            },
            PayloadError::BadTimestamp(value) => Self::InvalidInput {
                field: String::from("timestamp"),
                message: format!("Invalid ISO-8601 timestamp '{value}'"),
            },
        }
    }
}

/// The nested `user` object some producers send.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingUser {
    /// Display name.
    pub name: Option<String>,
    /// Opaque identifier.
    pub id: Option<String>,
}

/// An incoming event payload before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingEvent {
    /// The event kind (wire string).
    #[serde(alias = "eventType", alias = "event_type", alias = "kind")]
    pub event_kind: String,
    /// Client-provided event time; defaults to `received_at`.
    #[serde(default, alias = "eventTime", alias = "event_time")]
    pub timestamp: Option<String>,
    /// Telemetry session identifier.
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
    /// Opaque user identifier.
    #[serde(default, alias = "userId")]
    pub user_id: Option<String>,
    /// Explicit user display name.
    #[serde(default, alias = "userName")]
    pub user_name: Option<String>,
    /// Nested user object; its `name` wins over the flat fields.
    #[serde(default)]
    pub user: Option<IncomingUser>,
    /// Producer server identifier.
    #[serde(default, alias = "serverId")]
    pub server_id: Option<String>,
    /// Producer version string.
    #[serde(default)]
    pub version: Option<String>,
    /// Functional area label.
    #[serde(default)]
    pub area: Option<String>,
    /// Tool name label.
    #[serde(default, alias = "toolName")]
    pub tool_name: Option<String>,
    /// Company name label.
    #[serde(default, alias = "companyName")]
    pub company_name: Option<String>,
    /// Producer org identifier; normalized for team resolution.
    #[serde(default, alias = "orgIdentifier")]
    pub org_identifier: Option<String>,
    /// Whether the recorded operation succeeded. Defaults to true.
    #[serde(default)]
    pub success: Option<bool>,
    /// Error detail for failed operations.
    #[serde(default, alias = "errorMessage")]
    pub error_message: Option<String>,
    /// Opaque structured payload, preserved verbatim.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// The result of a successful ingest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedEvent {
    /// The assigned event ID.
    pub id: i64,
    /// The server-assigned receipt time.
    pub received_at: String,
}

/// Validates, normalizes, and persists incoming events.
#[derive(Debug, Clone, Copy)]
pub struct IngestService {
    /// Cap on the whole request body in bytes.
    pub max_event_bytes: usize,
    /// Cap on the serialized `data` payload in bytes.
    pub data_max_bytes: usize,
}

impl IngestService {
    /// Creates an ingest service with the default `data` cap.
    #[must_use]
    pub const fn new(max_event_bytes: usize) -> Self {
        Self {
            max_event_bytes,
            data_max_bytes: DEFAULT_DATA_MAX_BYTES,
        }
    }

    /// Ingests one raw event body.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest`-class errors for shape and size violations,
    /// and storage errors when the insert fails.
    pub fn ingest(
        &self,
        persistence: &Persistence,
        body: &[u8],
    ) -> Result<IngestedEvent, ApiError> {
        let incoming: IncomingEvent = self.parse(body)?;
        let received_at: String = now_timestamp()?;
        let event: NewEvent = self.normalize(incoming, &received_at)?;

        let mut conn = persistence.writer()?;
        let id: i64 = mutations::events::insert_event(&mut conn, &event)?;

        debug!(id, kind = %event.event_kind, "Ingested event");
        Ok(IngestedEvent { id, received_at })
    }

    /// Parses a raw body, enforcing the whole-payload cap.
    ///
    /// # Errors
    ///
    /// Returns a payload error on oversized or malformed bodies.
    pub fn parse(&self, body: &[u8]) -> Result<IncomingEvent, PayloadError> {
        if body.len() > self.max_event_bytes {
            return Err(PayloadError::TooLarge {
                limit: self.max_event_bytes,
            });
        }
        serde_json::from_slice(body).map_err(|e| PayloadError::Malformed(e.to_string()))
    }

    /// Applies the normalization rules to a parsed payload.
    ///
    /// # Errors
    ///
    /// Returns a payload error for unknown kinds, bad timestamps, or an
    /// oversized `data` payload.
    pub fn normalize(
        &self,
        incoming: IncomingEvent,
        received_at: &str,
    ) -> Result<NewEvent, PayloadError> {
        let kind: EventKind = incoming
            .event_kind
            .trim()
            .parse()
            .map_err(|_| PayloadError::UnknownKind(incoming.event_kind.clone()))?;

        let event_time: String = match incoming.timestamp.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => {
                let parsed: OffsetDateTime = OffsetDateTime::parse(
                    value,
                    &time::format_description::well_known::Iso8601::DEFAULT,
                )
                .map_err(|_| PayloadError::BadTimestamp(value.to_string()))?;
                format_timestamp(parsed)
                    .map_err(|e| PayloadError::BadTimestamp(e.to_string()))?
            }
            _ => received_at.to_string(),
        };

        let data_json: String = match &incoming.data {
            Some(value) => {
                let serialized: String = serde_json::to_string(value)
                    .map_err(|e| PayloadError::Malformed(e.to_string()))?;
                if serialized.len() > self.data_max_bytes {
                    return Err(PayloadError::DataTooLarge {
                        limit: self.data_max_bytes,
                    });
                }
                serialized
            }
            None => String::new(),
        };

        let mut user_id: String = trimmed(incoming.user_id);
        if user_id.is_empty() {
            if let Some(id) = incoming.user.as_ref().and_then(|u| u.id.as_deref()) {
                user_id = id.trim().to_string();
            }
        }
        let user_name: String = derive_user_name(
            incoming.user.as_ref(),
            incoming.user_name.as_deref(),
            &user_id,
        );

        let org_identifier: String = match trimmed(incoming.org_identifier) {
            value if !value.is_empty() => value,
            _ => org_identifier_from_data(incoming.data.as_ref()),
        };
        let org_key: String = org_identifier_key(&org_identifier);

        Ok(NewEvent {
            received_at: received_at.to_string(),
            event_time,
            event_kind: kind.as_str().to_string(),
            session_id: trimmed(incoming.session_id),
            user_id,
            user_name,
            server_id: trimmed(incoming.server_id),
            version: trimmed(incoming.version),
            area: trimmed(incoming.area),
            tool_name: trimmed(incoming.tool_name),
            company_name: trimmed(incoming.company_name),
            org_identifier,
            org_identifier_key: org_key,
            success: i32::from(incoming.success.unwrap_or(true)),
            error_message: trimmed(incoming.error_message),
            data_json,
        })
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Derivation order: `user.name`, then the flat name fields, then the
/// user ID as a last-resort label.
fn derive_user_name(
    user: Option<&IncomingUser>,
    flat_name: Option<&str>,
    user_id: &str,
) -> String {
    if let Some(name) = user.and_then(|u| u.name.as_deref()) {
        let name: &str = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    if let Some(name) = flat_name {
        let name: &str = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    user_id.to_string()
}

/// Producers that omit the flat org field often carry it at
/// `data.state.org.id`.
fn org_identifier_from_data(data: Option<&serde_json::Value>) -> String {
    data.and_then(|value| value.pointer("/state/org/id"))
        .and_then(serde_json::Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
