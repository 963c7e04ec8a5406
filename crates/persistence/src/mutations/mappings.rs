// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Legacy mapping bulk replacement and event-user team links.

use diesel::prelude::*;
use tracing::info;

use crate::data_models::NewOrgTeamMapping;
use crate::diesel_schema::{event_user_teams, org_team_mappings};
use crate::error::PersistenceError;

/// Atomically replaces the whole legacy mapping table with `rows`.
///
/// Runs inside one transaction so a failed insert leaves the previous
/// mapping set intact.
///
/// # Errors
///
/// Returns an error if the delete or any insert fails.
pub fn replace_mappings(
    conn: &mut SqliteConnection,
    rows: &[NewOrgTeamMapping],
) -> Result<usize, PersistenceError> {
    conn.transaction(|conn| {
        diesel::delete(org_team_mappings::table).execute(conn)?;
        let mut inserted: usize = 0;
        for row in rows {
            inserted += diesel::insert_into(org_team_mappings::table)
                .values(row)
                .execute(conn)?;
        }
        info!(inserted, "Replaced org-team mappings");
        Ok(inserted)
    })
}

/// Links an event user to a team, replacing any existing link.
///
/// # Errors
///
/// Returns a database error when the target team does not exist (foreign
/// key violation).
pub fn set_event_user_team(
    conn: &mut SqliteConnection,
    user_name: &str,
    team_id: i64,
) -> Result<(), PersistenceError> {
    conn.transaction(|conn| {
        diesel::delete(
            event_user_teams::table.filter(event_user_teams::user_name.eq(user_name)),
        )
        .execute(conn)?;
        diesel::insert_into(event_user_teams::table)
            .values((
                event_user_teams::user_name.eq(user_name),
                event_user_teams::team_id.eq(team_id),
            ))
            .execute(conn)?;
        info!(user_name, team_id, "Linked event user to team");
        Ok(())
    })
}

/// Removes an event user's team link. Removing a missing link is not an
/// error.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_event_user_team(
    conn: &mut SqliteConnection,
    user_name: &str,
) -> Result<(), PersistenceError> {
    diesel::delete(event_user_teams::table.filter(event_user_teams::user_name.eq(user_name)))
        .execute(conn)?;
    Ok(())
}
