// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session token lookups. Expiry comparison happens in the auth service;
//! this layer only fetches rows.

use diesel::prelude::*;

use crate::data_models::SessionRow;
use crate::diesel_schema::sessions;
use crate::error::PersistenceError;

/// Fetches a session by its opaque token.
///
/// # Errors
///
/// Returns `NotFound` if no such session exists.
pub fn get_session_by_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<SessionRow, PersistenceError> {
    sessions::table
        .filter(sessions::token.eq(token))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound("Session not found".to_string()))
}

/// Counts live session rows, expired or not.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_sessions(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(sessions::table.count().get_result(conn)?)
}
