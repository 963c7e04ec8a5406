// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Service layer for the Toolscope telemetry viewer.
//!
//! This crate sits between the HTTP surface and the storage engine. It
//! owns the operation contracts: credential checking and session issuance,
//! event payload validation and normalization, the composite filter and
//! pagination rules for event queries, team/org mapping resolution, and
//! operator administration with its safety guards.
//!
//! Handlers in the server crate translate HTTP into these calls and map
//! [`ApiError`] values onto status codes; nothing in here knows about
//! routes, cookies, or headers.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

pub mod auth;
pub mod error;
pub mod ingest;
pub mod query;
pub mod request_response;
pub mod stats;
pub mod teams;
pub mod users;

#[cfg(test)]
mod tests;

pub use auth::{AuthService, CurrentOperator, LoginOutcome};
pub use error::ApiError;
pub use ingest::IngestService;
pub use query::{EventQuery, QueryService};
pub use stats::StatsService;
pub use teams::TeamService;
pub use users::OperatorAdminService;

/// Formats a timestamp as the fixed-width UTC ISO-8601 string used across
/// the storage layer. Values produced here compare lexicographically in
/// chronological order.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn format_timestamp(value: time::OffsetDateTime) -> Result<String, ApiError> {
    value
        .to_offset(time::UtcOffset::UTC)
        .format(&time::format_description::well_known::Iso8601::DEFAULT)
        .map_err(|e| ApiError::Internal {
            message: format!("Failed to format timestamp: {e}"),
        })
}

/// Parses a stored or client-provided ISO-8601 timestamp.
///
/// # Errors
///
/// Returns an error if the value does not parse.
pub fn parse_timestamp(value: &str) -> Result<time::OffsetDateTime, ApiError> {
    time::OffsetDateTime::parse(
        value,
        &time::format_description::well_known::Iso8601::DEFAULT,
    )
    .map_err(|e| ApiError::InvalidInput {
        field: String::from("timestamp"),
        message: format!("Invalid ISO-8601 timestamp '{value}': {e}"),
    })
}

/// The current moment, formatted for storage.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn now_timestamp() -> Result<String, ApiError> {
    format_timestamp(time::OffsetDateTime::now_utc())
}
