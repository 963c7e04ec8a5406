// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Domain types and rule validation for the Toolscope telemetry viewer.
//!
//! This crate holds the vocabulary shared by every other layer: event kinds,
//! operator roles, team colors and logos, and the normalization rules used
//! to match events to teams. It performs no I/O.

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

mod error;
mod event_kind;
mod role;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use error::DomainError;
pub use event_kind::EventKind;
pub use role::Role;
pub use types::{LogoMime, TeamColor, org_identifier_key};
pub use validation::{validate_limit, validate_team_name, validate_username};

/// The sentinel value on the `userId` query parameter that means
/// "all users deselected": the response must be empty, not unfiltered.
pub const USER_FILTER_NONE: &str = "__none__";
