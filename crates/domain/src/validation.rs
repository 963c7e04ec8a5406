// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::DomainError;

/// The maximum page size accepted by event queries.
pub const MAX_PAGE_LIMIT: i64 = 500;

/// Validates a pagination limit against the `[1, 500]` range.
///
/// # Errors
///
/// Returns an error when the limit is zero, negative, or above the cap.
pub const fn validate_limit(limit: i64) -> Result<i64, DomainError> {
    if limit < 1 || limit > MAX_PAGE_LIMIT {
        return Err(DomainError::InvalidLimit {
            limit,
            max: MAX_PAGE_LIMIT,
        });
    }
    Ok(limit)
}

/// Validates a team name: non-empty after trimming, at most 128 characters.
///
/// Uniqueness is case-insensitive and enforced by the storage layer; this
/// only checks shape.
///
/// # Errors
///
/// Returns an error when the name is empty or too long.
pub fn validate_team_name(name: &str) -> Result<String, DomainError> {
    let trimmed: &str = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidTeamName(String::from(
            "name must not be empty",
        )));
    }
    if trimmed.chars().count() > 128 {
        return Err(DomainError::InvalidTeamName(String::from(
            "name must be at most 128 characters",
        )));
    }
    Ok(trimmed.to_string())
}

/// Validates an operator username: non-empty, at most 64 characters, no
/// whitespace. Usernames are case-sensitive.
///
/// # Errors
///
/// Returns an error when the username is empty, too long, or contains
/// whitespace.
pub fn validate_username(username: &str) -> Result<String, DomainError> {
    if username.is_empty() {
        return Err(DomainError::InvalidUsername(String::from(
            "username must not be empty",
        )));
    }
    if username.chars().count() > 64 {
        return Err(DomainError::InvalidUsername(String::from(
            "username must be at most 64 characters",
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidUsername(String::from(
            "username must not contain whitespace",
        )));
    }
    Ok(username.to_string())
}
