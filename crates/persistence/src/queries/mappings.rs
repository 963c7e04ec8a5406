// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Legacy org->team mapping lookups and explicit event-user team links.

use diesel::prelude::*;

use crate::data_models::{EventUserTeamRow, OrgTeamMappingRow};
use crate::diesel_schema::{event_user_teams, org_team_mappings};
use crate::error::PersistenceError;

/// Lists mapping tuples, optionally restricted to active ones.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_mappings(
    conn: &mut SqliteConnection,
    active_only: bool,
) -> Result<Vec<OrgTeamMappingRow>, PersistenceError> {
    let mut query = org_team_mappings::table.into_boxed();
    if active_only {
        query = query.filter(org_team_mappings::active.eq(1));
    }
    Ok(query.order(org_team_mappings::org_identifier.asc()).load(conn)?)
}

/// Lists all explicit event-user -> team links.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_event_user_teams(
    conn: &mut SqliteConnection,
) -> Result<Vec<EventUserTeamRow>, PersistenceError> {
    Ok(event_user_teams::table
        .order(event_user_teams::user_name.asc())
        .load(conn)?)
}

/// Lists the event users linked to one team.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_event_users_for_team(
    conn: &mut SqliteConnection,
    team_id: i64,
) -> Result<Vec<EventUserTeamRow>, PersistenceError> {
    Ok(event_user_teams::table
        .filter(event_user_teams::team_id.eq(team_id))
        .order(event_user_teams::user_name.asc())
        .load(conn)?)
}
