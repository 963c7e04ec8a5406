// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator lookups and credential verification.

use diesel::prelude::*;
use toolscope_domain::Role;

use crate::data_models::OperatorRow;
use crate::diesel_schema::operators;
use crate::error::PersistenceError;

/// Fetches an operator by username.
///
/// # Errors
///
/// Returns `NotFound` if no such operator exists.
pub fn get_operator_by_username(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<OperatorRow, PersistenceError> {
    operators::table
        .filter(operators::username.eq(username))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Operator '{username}' not found")))
}

/// Lists all operators, ordered by username.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_operators(conn: &mut SqliteConnection) -> Result<Vec<OperatorRow>, PersistenceError> {
    Ok(operators::table.order(operators::username.asc()).load(conn)?)
}

/// Counts all operators.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_operators(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(operators::table.count().get_result(conn)?)
}

/// Counts operators holding an administrative role.
///
/// Used by the last-administrator guard on role changes and deletions.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_admins(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(operators::table
        .filter(operators::role.eq_any(vec![
            Role::Administrator.as_str().to_string(),
            Role::God.as_str().to_string(),
        ]))
        .count()
        .get_result(conn)?)
}

/// Verifies a candidate password against an operator's stored bcrypt hash.
///
/// # Errors
///
/// Returns an error if the stored hash is malformed.
pub fn verify_password(
    operator: &OperatorRow,
    password: &str,
) -> Result<bool, PersistenceError> {
    bcrypt::verify(password, &operator.password_hash)
        .map_err(|e| PersistenceError::Other(format!("Password verification failed: {e}")))
}
