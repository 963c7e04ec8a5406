// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator account mutations. Passwords are hashed here with bcrypt so
//! plaintext never crosses back out of this module.

use diesel::prelude::*;
use tracing::info;

use crate::data_models::OperatorRow;
use crate::diesel_schema::operators;
use crate::error::PersistenceError;
use crate::queries::operators::get_operator_by_username;

/// Creates an operator with a bcrypt-hashed password.
///
/// # Errors
///
/// Returns `Conflict` if the username is already taken, or an error if
/// hashing or the insert fails.
pub fn create_operator(
    conn: &mut SqliteConnection,
    username: &str,
    password: &str,
    role: &str,
    is_producer: bool,
    hash_cost: u32,
) -> Result<OperatorRow, PersistenceError> {
    let password_hash: String = bcrypt::hash(password, hash_cost)
        .map_err(|e| PersistenceError::Other(format!("Password hashing failed: {e}")))?;

    diesel::insert_into(operators::table)
        .values((
            operators::username.eq(username),
            operators::password_hash.eq(password_hash),
            operators::role.eq(role),
            operators::is_producer.eq(i32::from(is_producer)),
        ))
        .execute(conn)?;

    info!(username, role, is_producer, "Created operator");
    get_operator_by_username(conn, username)
}

/// Seeds the default `god`/`god` operator when no operators exist yet.
///
/// Returns `true` when the seed account was created.
///
/// # Errors
///
/// Returns an error if the count or insert fails.
pub fn seed_default_operator(
    conn: &mut SqliteConnection,
    hash_cost: u32,
) -> Result<bool, PersistenceError> {
    let existing: i64 = operators::table.count().get_result(conn)?;
    if existing > 0 {
        return Ok(false);
    }
    create_operator(conn, "god", "god", "god", false, hash_cost)?;
    info!("Seeded default operator account");
    Ok(true)
}

/// Replaces an operator's password hash.
///
/// # Errors
///
/// Returns `NotFound` if no such operator exists, or an error if hashing
/// fails.
pub fn update_operator_password(
    conn: &mut SqliteConnection,
    username: &str,
    new_password: &str,
    hash_cost: u32,
) -> Result<(), PersistenceError> {
    let password_hash: String = bcrypt::hash(new_password, hash_cost)
        .map_err(|e| PersistenceError::Other(format!("Password hashing failed: {e}")))?;

    let updated: usize = diesel::update(operators::table.filter(operators::username.eq(username)))
        .set(operators::password_hash.eq(password_hash))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Operator '{username}' not found"
        )));
    }
    info!(username, "Updated operator password");
    Ok(())
}

/// Changes an operator's role. The last-administrator guard lives in the
/// service layer; this is a plain column update.
///
/// # Errors
///
/// Returns `NotFound` if no such operator exists.
pub fn update_operator_role(
    conn: &mut SqliteConnection,
    username: &str,
    role: &str,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(operators::table.filter(operators::username.eq(username)))
        .set(operators::role.eq(role))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Operator '{username}' not found"
        )));
    }
    info!(username, role, "Updated operator role");
    Ok(())
}

/// Records a successful login time.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn touch_last_login(
    conn: &mut SqliteConnection,
    username: &str,
    login_at: &str,
) -> Result<(), PersistenceError> {
    diesel::update(operators::table.filter(operators::username.eq(username)))
        .set(operators::last_login_at.eq(login_at.to_string()))
        .execute(conn)?;
    Ok(())
}

/// Deletes an operator. Session rows cascade away with the account.
///
/// # Errors
///
/// Returns `NotFound` if no such operator exists.
pub fn delete_operator(conn: &mut SqliteConnection, username: &str) -> Result<(), PersistenceError> {
    let deleted: usize =
        diesel::delete(operators::table.filter(operators::username.eq(username))).execute(conn)?;
    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Operator '{username}' not found"
        )));
    }
    info!(username, "Deleted operator");
    Ok(())
}
