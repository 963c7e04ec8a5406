// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session row mutations. Token generation and TTL arithmetic live in the
//! auth service; this layer stores what it is given.

use diesel::prelude::*;
use tracing::debug;

use crate::data_models::SessionRow;
use crate::diesel_schema::sessions;
use crate::error::PersistenceError;

/// Inserts a session row.
///
/// # Errors
///
/// Returns an error if the insert fails.
#[allow(clippy::too_many_arguments)]
pub fn create_session(
    conn: &mut SqliteConnection,
    token: &str,
    csrf_token: &str,
    operator_username: &str,
    issued_at: &str,
    expires_at: &str,
    csrf_exempt: bool,
) -> Result<SessionRow, PersistenceError> {
    diesel::insert_into(sessions::table)
        .values((
            sessions::token.eq(token),
            sessions::csrf_token.eq(csrf_token),
            sessions::operator_username.eq(operator_username),
            sessions::issued_at.eq(issued_at),
            sessions::expires_at.eq(expires_at),
            sessions::csrf_exempt.eq(i32::from(csrf_exempt)),
        ))
        .execute(conn)?;

    sessions::table
        .filter(sessions::token.eq(token))
        .first(conn)
        .map_err(Into::into)
}

/// Deletes the session carrying `token`. Deleting an unknown token is not
/// an error; logout is idempotent.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_session_by_token(
    conn: &mut SqliteConnection,
    token: &str,
) -> Result<(), PersistenceError> {
    diesel::delete(sessions::table.filter(sessions::token.eq(token))).execute(conn)?;
    Ok(())
}

/// Deletes every session belonging to one operator.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_sessions_for_operator(
    conn: &mut SqliteConnection,
    operator_username: &str,
) -> Result<usize, PersistenceError> {
    Ok(diesel::delete(
        sessions::table.filter(sessions::operator_username.eq(operator_username)),
    )
    .execute(conn)?)
}

/// Deletes sessions whose expiry is at or before `now` and returns how
/// many were removed.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_expired_sessions(
    conn: &mut SqliteConnection,
    now: &str,
) -> Result<usize, PersistenceError> {
    let deleted: usize =
        diesel::delete(sessions::table.filter(sessions::expires_at.le(now.to_string())))
            .execute(conn)?;
    if deleted > 0 {
        debug!(deleted, "Removed expired sessions");
    }
    Ok(deleted)
}
