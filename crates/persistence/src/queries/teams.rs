// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Team lookups. Listings project the logo away so table scans never
//! drag blobs through the pool; the blob loads only via `get_team_logo`.

use diesel::prelude::*;

use crate::data_models::TeamRow;
use crate::diesel_schema::teams;
use crate::error::PersistenceError;

/// A team listing entry without the logo blob.
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct TeamListing {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub logo_mime: Option<String>,
    pub created_at: String,
}

/// The projection shared by all listing queries.
type ListingColumns = (
    teams::id,
    teams::name,
    teams::color,
    teams::logo_mime,
    teams::created_at,
);

const LISTING_COLUMNS: ListingColumns = (
    teams::id,
    teams::name,
    teams::color,
    teams::logo_mime,
    teams::created_at,
);

/// Lists all teams ordered by name, without logo blobs.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_teams(conn: &mut SqliteConnection) -> Result<Vec<TeamListing>, PersistenceError> {
    Ok(teams::table
        .select(LISTING_COLUMNS)
        .order(teams::name.asc())
        .load(conn)?)
}

/// Fetches a team by ID, without the logo blob.
///
/// # Errors
///
/// Returns `NotFound` if no such team exists.
pub fn get_team(conn: &mut SqliteConnection, team_id: i64) -> Result<TeamListing, PersistenceError> {
    teams::table
        .filter(teams::id.eq(team_id))
        .select(LISTING_COLUMNS)
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Team {team_id} not found")))
}

/// Fetches a team by name. The name column collates case-insensitively,
/// so `Platform` and `platform` resolve to the same row.
///
/// # Errors
///
/// Returns `NotFound` if no such team exists.
pub fn get_team_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<TeamListing, PersistenceError> {
    teams::table
        .filter(teams::name.eq(name))
        .select(LISTING_COLUMNS)
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Team '{name}' not found")))
}

/// Fetches a team's logo blob and MIME type.
///
/// # Errors
///
/// Returns `NotFound` if the team does not exist or carries no logo.
pub fn get_team_logo(
    conn: &mut SqliteConnection,
    team_id: i64,
) -> Result<(Vec<u8>, String), PersistenceError> {
    let row: TeamRow = teams::table
        .filter(teams::id.eq(team_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Team {team_id} not found")))?;

    match (row.logo, row.logo_mime) {
        (Some(logo), Some(mime)) if !logo.is_empty() => Ok((logo, mime)),
        _ => Err(PersistenceError::NotFound(format!(
            "Team {team_id} has no logo"
        ))),
    }
}
