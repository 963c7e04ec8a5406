// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Org mutations.

use diesel::prelude::*;
use tracing::info;

use crate::backend::get_last_insert_rowid;
use crate::data_models::OrgRow;
use crate::diesel_schema::orgs;
use crate::error::PersistenceError;
use crate::queries::orgs::get_org;

/// Creates an org with its external identifier and optional metadata.
///
/// # Errors
///
/// Returns `Conflict` when the identifier is already registered
/// (case-insensitive).
pub fn create_org(
    conn: &mut SqliteConnection,
    org_id: &str,
    alias: &str,
    color: Option<&str>,
) -> Result<OrgRow, PersistenceError> {
    diesel::insert_into(orgs::table)
        .values((
            orgs::org_id.eq(org_id),
            orgs::alias.eq(alias),
            orgs::color.eq(color),
        ))
        .execute(conn)?;
    let row_id: i64 = get_last_insert_rowid(conn)?;
    info!(org_id, "Created org");
    get_org(conn, row_id)
}

/// Updates an org's alias and/or color.
///
/// # Errors
///
/// Returns `NotFound` if no such org exists.
pub fn update_org(
    conn: &mut SqliteConnection,
    id: i64,
    alias: Option<&str>,
    color: Option<Option<&str>>,
) -> Result<OrgRow, PersistenceError> {
    conn.transaction(|conn| {
        if let Some(alias) = alias {
            let updated: usize = diesel::update(orgs::table.filter(orgs::id.eq(id)))
                .set(orgs::alias.eq(alias))
                .execute(conn)?;
            if updated == 0 {
                return Err(PersistenceError::NotFound(format!("Org {id} not found")));
            }
        }
        if let Some(color) = color {
            let updated: usize = diesel::update(orgs::table.filter(orgs::id.eq(id)))
                .set(orgs::color.eq(color))
                .execute(conn)?;
            if updated == 0 {
                return Err(PersistenceError::NotFound(format!("Org {id} not found")));
            }
        }
        get_org(conn, id)
    })
}

/// Assigns an org to a team, or detaches it when `team_id` is `None`.
///
/// # Errors
///
/// Returns `NotFound` if no such org exists, or a database error when the
/// target team does not exist (foreign key violation).
pub fn assign_org_team(
    conn: &mut SqliteConnection,
    id: i64,
    team_id: Option<i64>,
) -> Result<OrgRow, PersistenceError> {
    let updated: usize = diesel::update(orgs::table.filter(orgs::id.eq(id)))
        .set(orgs::team_id.eq(team_id))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!("Org {id} not found")));
    }
    info!(org = id, ?team_id, "Updated org team assignment");
    get_org(conn, id)
}

/// Deletes an org.
///
/// # Errors
///
/// Returns `NotFound` if no such org exists.
pub fn delete_org(conn: &mut SqliteConnection, id: i64) -> Result<(), PersistenceError> {
    let deleted: usize = diesel::delete(orgs::table.filter(orgs::id.eq(id))).execute(conn)?;
    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!("Org {id} not found")));
    }
    info!(org = id, "Deleted org");
    Ok(())
}
