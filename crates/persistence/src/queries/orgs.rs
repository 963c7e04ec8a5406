// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Org lookups. The `org_id` column collates case-insensitively, so
//! lookups by raw identifier need no normalization on this side.

use diesel::prelude::*;

use crate::data_models::OrgRow;
use crate::diesel_schema::orgs;
use crate::error::PersistenceError;

/// Lists all orgs ordered by identifier.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_orgs(conn: &mut SqliteConnection) -> Result<Vec<OrgRow>, PersistenceError> {
    Ok(orgs::table.order(orgs::org_id.asc()).load(conn)?)
}

/// Fetches an org by numeric ID.
///
/// # Errors
///
/// Returns `NotFound` if no such org exists.
pub fn get_org(conn: &mut SqliteConnection, org_id: i64) -> Result<OrgRow, PersistenceError> {
    orgs::table
        .filter(orgs::id.eq(org_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Org {org_id} not found")))
}

/// Fetches an org by its external identifier (case-insensitive).
///
/// # Errors
///
/// Returns `NotFound` if no such org exists.
pub fn get_org_by_identifier(
    conn: &mut SqliteConnection,
    identifier: &str,
) -> Result<OrgRow, PersistenceError> {
    orgs::table
        .filter(orgs::org_id.eq(identifier))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Org '{identifier}' not found")))
}

/// Lists the orgs assigned to a team.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_orgs_for_team(
    conn: &mut SqliteConnection,
    team_id: i64,
) -> Result<Vec<OrgRow>, PersistenceError> {
    Ok(orgs::table
        .filter(orgs::team_id.eq(team_id))
        .order(orgs::org_id.asc())
        .load(conn)?)
}
