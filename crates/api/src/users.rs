// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator administration with its safety guards: the last account with
//! administrative authority can be neither demoted nor deleted, operators
//! cannot delete themselves, and god accounts are only touchable by god.

use toolscope_domain::{Role, validate_username};
use toolscope_persistence::{OperatorRow, Persistence, mutations, queries};
use tracing::info;

use crate::auth::CurrentOperator;
use crate::error::ApiError;
use crate::request_response::OperatorDto;

/// Operator account management.
#[derive(Debug, Clone, Copy)]
pub struct OperatorAdminService {
    /// bcrypt cost for newly hashed passwords.
    pub hash_cost: u32,
}

impl OperatorAdminService {
    /// Creates the service.
    #[must_use]
    pub const fn new(hash_cost: u32) -> Self {
        Self { hash_cost }
    }

    /// Lists all operators. Password hashes never leave this layer.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn list(persistence: &Persistence) -> Result<Vec<OperatorDto>, ApiError> {
        let mut conn = persistence.reader()?;
        Ok(queries::operators::list_operators(&mut conn)?
            .into_iter()
            .map(OperatorDto::from)
            .collect())
    }

    /// Creates an operator.
    ///
    /// # Errors
    ///
    /// Returns validation errors for bad usernames/roles, `Conflict` for
    /// duplicates, and `RoleInsufficient` when a non-god actor grants god.
    pub fn create(
        &self,
        persistence: &Persistence,
        actor: &CurrentOperator,
        username: &str,
        password: &str,
        role: &str,
        is_producer: bool,
    ) -> Result<OperatorDto, ApiError> {
        let username: String = validate_username(username)?;
        let role: Role = parse_role(role)?;
        require_god_for_god(actor, role)?;
        if password.is_empty() {
            return Err(ApiError::InvalidInput {
                field: String::from("password"),
                message: String::from("Password must not be empty"),
            });
        }

        let mut conn = persistence.writer()?;
        let row: OperatorRow = mutations::operators::create_operator(
            &mut conn,
            &username,
            password,
            role.as_str(),
            is_producer,
            self.hash_cost,
        )?;
        info!(actor = %actor.username, username, role = %role, "Operator created");
        Ok(OperatorDto::from(row))
    }

    /// Replaces an operator's password.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown operators and `RoleInsufficient`
    /// when a non-god actor touches a god account.
    pub fn set_password(
        &self,
        persistence: &Persistence,
        actor: &CurrentOperator,
        username: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        if password.is_empty() {
            return Err(ApiError::InvalidInput {
                field: String::from("password"),
                message: String::from("Password must not be empty"),
            });
        }
        let mut conn = persistence.writer()?;
        let target: OperatorRow =
            queries::operators::get_operator_by_username(&mut conn, username)?;
        require_god_for_god(actor, parse_role(&target.role)?)?;
        mutations::operators::update_operator_password(
            &mut conn,
            username,
            password,
            self.hash_cost,
        )?;
        Ok(())
    }

    /// Changes an operator's role.
    ///
    /// Demoting the last account with administrative authority is refused,
    /// so user administration always stays reachable.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Conflict` (last-administrator guard), or
    /// `RoleInsufficient` for god-account changes by non-god actors.
    pub fn set_role(
        persistence: &Persistence,
        actor: &CurrentOperator,
        username: &str,
        role: &str,
    ) -> Result<(), ApiError> {
        let new_role: Role = parse_role(role)?;
        require_god_for_god(actor, new_role)?;

        let mut conn = persistence.writer()?;
        let target: OperatorRow =
            queries::operators::get_operator_by_username(&mut conn, username)?;
        let old_role: Role = parse_role(&target.role)?;
        require_god_for_god(actor, old_role)?;

        if old_role.is_admin() && !new_role.is_admin() {
            let admins: i64 = queries::operators::count_admins(&mut conn)?;
            if admins <= 1 {
                return Err(ApiError::Conflict {
                    message: String::from("Cannot demote the last administrator"),
                });
            }
        }

        mutations::operators::update_operator_role(&mut conn, username, new_role.as_str())?;
        info!(actor = %actor.username, username, role = %new_role, "Operator role changed");
        Ok(())
    }

    /// Deletes an operator. Self-deletion and removing the last
    /// administrator are refused.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidInput` (self-delete), `Conflict`
    /// (last-administrator guard), or `RoleInsufficient`.
    pub fn delete(
        persistence: &Persistence,
        actor: &CurrentOperator,
        username: &str,
    ) -> Result<(), ApiError> {
        if actor.username == username {
            return Err(ApiError::InvalidInput {
                field: String::from("username"),
                message: String::from("Operators cannot delete their own account"),
            });
        }

        let mut conn = persistence.writer()?;
        let target: OperatorRow =
            queries::operators::get_operator_by_username(&mut conn, username)?;
        let target_role: Role = parse_role(&target.role)?;
        require_god_for_god(actor, target_role)?;

        if target_role.is_admin() {
            let admins: i64 = queries::operators::count_admins(&mut conn)?;
            if admins <= 1 {
                return Err(ApiError::Conflict {
                    message: String::from("Cannot delete the last administrator"),
                });
            }
        }

        mutations::operators::delete_operator(&mut conn, username)?;
        info!(actor = %actor.username, username, "Operator deleted");
        Ok(())
    }
}

fn parse_role(value: &str) -> Result<Role, ApiError> {
    value.parse().map_err(|_| ApiError::InvalidInput {
        field: String::from("role"),
        message: format!("Unknown role '{value}'"),
    })
}

/// Touching a god account (or granting the god role) requires god.
fn require_god_for_god(actor: &CurrentOperator, touched: Role) -> Result<(), ApiError> {
    if touched == Role::God && actor.role != Role::God {
        return Err(ApiError::RoleInsufficient {
            required: Role::God.as_str().to_string(),
        });
    }
    Ok(())
}
