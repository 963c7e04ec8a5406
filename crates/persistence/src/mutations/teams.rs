// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Team mutations. Deleting a team relies on the schema's referential
//! actions: org assignments null out and event-user links cascade away.

use diesel::prelude::*;
use tracing::info;

use crate::backend::get_last_insert_rowid;
use crate::diesel_schema::teams;
use crate::error::PersistenceError;
use crate::queries::teams::{TeamListing, get_team};

/// Creates a team and returns it.
///
/// # Errors
///
/// Returns `Conflict` when the name is already taken (case-insensitive).
pub fn create_team(
    conn: &mut SqliteConnection,
    name: &str,
    color: Option<&str>,
) -> Result<TeamListing, PersistenceError> {
    diesel::insert_into(teams::table)
        .values((teams::name.eq(name), teams::color.eq(color)))
        .execute(conn)?;
    let team_id: i64 = get_last_insert_rowid(conn)?;
    info!(team_id, name, "Created team");
    get_team(conn, team_id)
}

/// Renames a team and/or replaces its color.
///
/// # Errors
///
/// Returns `NotFound` if no such team exists, or `Conflict` when the new
/// name collides with another team.
pub fn update_team(
    conn: &mut SqliteConnection,
    team_id: i64,
    name: Option<&str>,
    color: Option<Option<&str>>,
) -> Result<TeamListing, PersistenceError> {
    conn.transaction(|conn| {
        if let Some(name) = name {
            let updated: usize = diesel::update(teams::table.filter(teams::id.eq(team_id)))
                .set(teams::name.eq(name))
                .execute(conn)?;
            if updated == 0 {
                return Err(PersistenceError::NotFound(format!(
                    "Team {team_id} not found"
                )));
            }
        }
        if let Some(color) = color {
            let updated: usize = diesel::update(teams::table.filter(teams::id.eq(team_id)))
                .set(teams::color.eq(color))
                .execute(conn)?;
            if updated == 0 {
                return Err(PersistenceError::NotFound(format!(
                    "Team {team_id} not found"
                )));
            }
        }
        get_team(conn, team_id)
    })
}

/// Stores a team logo blob and its MIME type.
///
/// # Errors
///
/// Returns `NotFound` if no such team exists.
pub fn set_team_logo(
    conn: &mut SqliteConnection,
    team_id: i64,
    logo: &[u8],
    mime: &str,
) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(teams::table.filter(teams::id.eq(team_id)))
        .set((
            teams::logo.eq(Some(logo.to_vec())),
            teams::logo_mime.eq(Some(mime.to_string())),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Team {team_id} not found"
        )));
    }
    info!(team_id, mime, bytes = logo.len(), "Stored team logo");
    Ok(())
}

/// Removes a team's logo.
///
/// # Errors
///
/// Returns `NotFound` if no such team exists.
pub fn clear_team_logo(conn: &mut SqliteConnection, team_id: i64) -> Result<(), PersistenceError> {
    let updated: usize = diesel::update(teams::table.filter(teams::id.eq(team_id)))
        .set((
            teams::logo.eq(None::<Vec<u8>>),
            teams::logo_mime.eq(None::<String>),
        ))
        .execute(conn)?;
    if updated == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Team {team_id} not found"
        )));
    }
    Ok(())
}

/// Deletes a team.
///
/// # Errors
///
/// Returns `NotFound` if no such team exists.
pub fn delete_team(conn: &mut SqliteConnection, team_id: i64) -> Result<(), PersistenceError> {
    let deleted: usize =
        diesel::delete(teams::table.filter(teams::id.eq(team_id))).execute(conn)?;
    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Team {team_id} not found"
        )));
    }
    info!(team_id, "Deleted team");
    Ok(())
}
