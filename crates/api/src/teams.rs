// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Team, org, and mapping management, plus the org->team resolution
//! function used by queries and aggregates.
//!
//! Resolution precedence is fixed: a direct `Org.team_id` assignment wins;
//! otherwise the first active legacy mapping whose normalized org
//! identifier matches decides; otherwise the event is unresolved. No other
//! module may reimplement this.

use std::collections::HashMap;
use toolscope_domain::{LogoMime, TeamColor, org_identifier_key, validate_team_name};
use toolscope_persistence::{
    OrgRow, OrgTeamMappingRow, NewOrgTeamMapping, Persistence, mutations, queries,
};
use toolscope_persistence::queries::teams::TeamListing;
use tracing::info;

use crate::error::ApiError;
use crate::request_response::{
    EventUserTeamDto, MappingDto, OrgDto, TeamDto, UpsertOrgRequest,
};

/// A validated logo upload.
#[derive(Debug, Clone)]
pub struct LogoUpload {
    /// The raw image bytes.
    pub bytes: Vec<u8>,
    /// The declared MIME type.
    pub mime: String,
}

/// Fields of a team update. `color` distinguishes "leave alone" (`None`)
/// from "clear" (`Some(None)`); logo removal is an explicit flag.
#[derive(Debug, Clone, Default)]
pub struct UpdateTeamInput {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub logo: Option<LogoUpload>,
    pub remove_logo: bool,
}

/// The materialized org-key -> team map.
#[derive(Debug, Clone, Default)]
pub struct TeamResolution {
    by_org_key: HashMap<String, i64>,
}

impl TeamResolution {
    /// Loads the current resolution map in one pass over teams, orgs, and
    /// active mappings.
    ///
    /// # Errors
    ///
    /// Returns a storage error if any read fails.
    pub fn load(persistence: &Persistence) -> Result<Self, ApiError> {
        let mut conn = persistence.reader()?;

        let teams: Vec<TeamListing> = queries::teams::list_teams(&mut conn)?;
        let team_by_key: HashMap<String, i64> = teams
            .iter()
            .map(|t| (t.name.trim().to_lowercase(), t.id))
            .collect();

        let mut by_org_key: HashMap<String, i64> = HashMap::new();

        // Active mappings seed the map; the first match per org key wins.
        let mappings: Vec<OrgTeamMappingRow> = queries::mappings::list_mappings(&mut conn, true)?;
        for mapping in &mappings {
            let key: String = org_identifier_key(&mapping.org_identifier);
            if key.is_empty() {
                continue;
            }
            if let Some(team_id) = team_by_key.get(&mapping.team_name.trim().to_lowercase()) {
                by_org_key.entry(key).or_insert(*team_id);
            }
        }

        // Direct org assignments override mappings.
        let orgs: Vec<OrgRow> = queries::orgs::list_orgs(&mut conn)?;
        for org in &orgs {
            if let Some(team_id) = org.team_id {
                by_org_key.insert(org_identifier_key(&org.org_id), team_id);
            }
        }

        Ok(Self { by_org_key })
    }

    /// Resolves an org key to its team, if any.
    #[must_use]
    pub fn team_for(&self, org_key: &str) -> Option<i64> {
        self.by_org_key.get(org_key).copied()
    }

    /// Collects every org key currently resolved to `team_id`.
    #[must_use]
    pub fn org_keys_for(&self, team_id: i64) -> Vec<String> {
        let mut keys: Vec<String> = self
            .by_org_key
            .iter()
            .filter(|(_, id)| **id == team_id)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

/// Team, org, and mapping operations.
#[derive(Debug, Clone, Copy)]
pub struct TeamService {
    /// Cap on logo blobs in bytes.
    pub logo_max_bytes: usize,
}

impl TeamService {
    /// Creates the service with a logo size cap.
    #[must_use]
    pub const fn new(logo_max_bytes: usize) -> Self {
        Self { logo_max_bytes }
    }

    /// Expands a team key (lowercased team name) into the set of org keys
    /// currently resolved to that team. An unknown key yields the empty
    /// set, which matches no events.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the resolution load fails.
    pub fn org_keys_for_team_key(
        persistence: &Persistence,
        team_key: &str,
    ) -> Result<Vec<String>, ApiError> {
        let mut conn = persistence.reader()?;
        let team: Option<TeamListing> =
            match queries::teams::get_team_by_name(&mut conn, team_key.trim()) {
                Ok(team) => Some(team),
                Err(toolscope_persistence::PersistenceError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            };
        drop(conn);

        let Some(team) = team else {
            return Ok(Vec::new());
        };
        let resolution: TeamResolution = TeamResolution::load(persistence)?;
        Ok(resolution.org_keys_for(team.id))
    }

    /// Lists all teams.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn list_teams(persistence: &Persistence) -> Result<Vec<TeamDto>, ApiError> {
        let mut conn = persistence.reader()?;
        Ok(queries::teams::list_teams(&mut conn)?
            .into_iter()
            .map(team_dto)
            .collect())
    }

    /// Fetches one team.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs.
    pub fn get_team(persistence: &Persistence, team_id: i64) -> Result<TeamDto, ApiError> {
        let mut conn = persistence.reader()?;
        Ok(team_dto(queries::teams::get_team(&mut conn, team_id)?))
    }

    /// Creates a team with optional color and logo.
    ///
    /// # Errors
    ///
    /// Returns validation errors for bad names, colors, or logos, and
    /// `Conflict` for duplicate names.
    pub fn create_team(
        &self,
        persistence: &Persistence,
        name: &str,
        color: Option<&str>,
        logo: Option<LogoUpload>,
    ) -> Result<TeamDto, ApiError> {
        let name: String = validate_team_name(name)?;
        let color: Option<String> = validate_color(color)?;
        let logo: Option<LogoUpload> = logo.map(|l| self.validate_logo(l)).transpose()?;

        let mut conn = persistence.writer()?;
        let team: TeamListing =
            mutations::teams::create_team(&mut conn, &name, color.as_deref())?;
        if let Some(logo) = logo {
            mutations::teams::set_team_logo(&mut conn, team.id, &logo.bytes, &logo.mime)?;
        }
        info!(team = team.id, name = %team.name, "Team created");
        Ok(team_dto(queries::teams::get_team(&mut conn, team.id)?))
    }

    /// Applies a partial team update.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs and validation errors for bad
    /// fields.
    pub fn update_team(
        &self,
        persistence: &Persistence,
        team_id: i64,
        input: UpdateTeamInput,
    ) -> Result<TeamDto, ApiError> {
        let name: Option<String> = input.name.as_deref().map(validate_team_name).transpose()?;
        let color: Option<Option<String>> = match input.color {
            Some(value) => Some(validate_color(value.as_deref())?),
            None => None,
        };
        let logo: Option<LogoUpload> = input.logo.map(|l| self.validate_logo(l)).transpose()?;

        let mut conn = persistence.writer()?;
        mutations::teams::update_team(
            &mut conn,
            team_id,
            name.as_deref(),
            color.as_ref().map(Option::as_deref),
        )?;
        if input.remove_logo {
            mutations::teams::clear_team_logo(&mut conn, team_id)?;
        } else if let Some(logo) = logo {
            mutations::teams::set_team_logo(&mut conn, team_id, &logo.bytes, &logo.mime)?;
        }
        Ok(team_dto(queries::teams::get_team(&mut conn, team_id)?))
    }

    /// Deletes a team. Orgs detach; event-user links disappear; event rows
    /// are untouched.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs.
    pub fn delete_team(persistence: &Persistence, team_id: i64) -> Result<(), ApiError> {
        let mut conn = persistence.writer()?;
        mutations::teams::delete_team(&mut conn, team_id)?;
        Ok(())
    }

    /// Fetches a team's logo blob and MIME type.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the team or its logo is absent.
    pub fn team_logo(
        persistence: &Persistence,
        team_id: i64,
    ) -> Result<(Vec<u8>, String), ApiError> {
        let mut conn = persistence.reader()?;
        Ok(queries::teams::get_team_logo(&mut conn, team_id)?)
    }

    /// Lists all orgs.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn list_orgs(persistence: &Persistence) -> Result<Vec<OrgDto>, ApiError> {
        let mut conn = persistence.reader()?;
        Ok(queries::orgs::list_orgs(&mut conn)?
            .into_iter()
            .map(OrgDto::from)
            .collect())
    }

    /// Creates or updates an org keyed by its case-insensitive identifier.
    /// Repeating the same payload leaves the database unchanged.
    ///
    /// # Errors
    ///
    /// Returns validation errors for bad colors and `NotFound` when the
    /// target team does not exist.
    pub fn upsert_org(
        persistence: &Persistence,
        request: &UpsertOrgRequest,
    ) -> Result<OrgDto, ApiError> {
        let org_id: &str = request.org_id.trim();
        if org_id.is_empty() {
            return Err(ApiError::InvalidInput {
                field: String::from("orgId"),
                message: String::from("Org identifier must not be empty"),
            });
        }
        let color: Option<String> = validate_color(request.color.as_deref())?;
        let alias: String = request
            .alias
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let mut conn = persistence.writer()?;
        if let Some(team_id) = request.team_id {
            // Fail before any write when the team is unknown.
            queries::teams::get_team(&mut conn, team_id)?;
        }

        let existing: Option<OrgRow> =
            match queries::orgs::get_org_by_identifier(&mut conn, org_id) {
                Ok(org) => Some(org),
                Err(toolscope_persistence::PersistenceError::NotFound(_)) => None,
                Err(e) => return Err(e.into()),
            };

        let org: OrgRow = match existing {
            Some(existing) => {
                mutations::orgs::update_org(
                    &mut conn,
                    existing.id,
                    Some(&alias),
                    Some(color.as_deref()),
                )?;
                mutations::orgs::assign_org_team(&mut conn, existing.id, request.team_id)?
            }
            None => {
                let created: OrgRow =
                    mutations::orgs::create_org(&mut conn, org_id, &alias, color.as_deref())?;
                match request.team_id {
                    Some(_) => {
                        mutations::orgs::assign_org_team(&mut conn, created.id, request.team_id)?
                    }
                    None => created,
                }
            }
        };
        Ok(OrgDto::from(org))
    }

    /// Moves an org (by external identifier) onto a team, or detaches it.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the org or target team does not exist.
    pub fn move_org(
        persistence: &Persistence,
        org_id: &str,
        team_id: Option<i64>,
    ) -> Result<OrgDto, ApiError> {
        let mut conn = persistence.writer()?;
        if let Some(team_id) = team_id {
            queries::teams::get_team(&mut conn, team_id)?;
        }
        let org: OrgRow = queries::orgs::get_org_by_identifier(&mut conn, org_id.trim())?;
        Ok(OrgDto::from(mutations::orgs::assign_org_team(
            &mut conn, org.id, team_id,
        )?))
    }

    /// Links an observed event user to a team.
    ///
    /// # Errors
    ///
    /// Returns validation errors for bad names and `NotFound` for unknown
    /// teams.
    pub fn add_event_user(
        persistence: &Persistence,
        team_id: i64,
        user_name: &str,
    ) -> Result<(), ApiError> {
        let user_name: String = user_name.trim().to_string();
        if user_name.is_empty() {
            return Err(ApiError::InvalidInput {
                field: String::from("userName"),
                message: String::from("User name must not be empty"),
            });
        }
        let mut conn = persistence.writer()?;
        queries::teams::get_team(&mut conn, team_id)?;
        mutations::mappings::set_event_user_team(&mut conn, &user_name, team_id)?;
        Ok(())
    }

    /// Removes an event user's team link.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown teams.
    pub fn remove_event_user(
        persistence: &Persistence,
        team_id: i64,
        user_name: &str,
    ) -> Result<(), ApiError> {
        let mut conn = persistence.writer()?;
        queries::teams::get_team(&mut conn, team_id)?;
        mutations::mappings::delete_event_user_team(&mut conn, user_name.trim())?;
        Ok(())
    }

    /// Lists event-user team links.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn list_event_user_teams(
        persistence: &Persistence,
    ) -> Result<Vec<EventUserTeamDto>, ApiError> {
        let mut conn = persistence.reader()?;
        Ok(queries::mappings::list_event_user_teams(&mut conn)?
            .into_iter()
            .map(|row| EventUserTeamDto {
                user_name: row.user_name,
                team_id: row.team_id,
            })
            .collect())
    }

    /// Lists all legacy mapping tuples.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn list_mappings(persistence: &Persistence) -> Result<Vec<MappingDto>, ApiError> {
        let mut conn = persistence.reader()?;
        Ok(queries::mappings::list_mappings(&mut conn, false)?
            .into_iter()
            .map(MappingDto::from)
            .collect())
    }

    /// Atomically replaces the legacy mapping table.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the transaction fails.
    pub fn replace_mappings(
        persistence: &Persistence,
        mappings: Vec<MappingDto>,
    ) -> Result<usize, ApiError> {
        let rows: Vec<NewOrgTeamMapping> = mappings
            .into_iter()
            .map(|m| NewOrgTeamMapping {
                org_identifier: m.org_identifier.trim().to_string(),
                client_name: m.client_name.trim().to_string(),
                team_name: m.team_name.trim().to_string(),
                color: m.color.trim().to_string(),
                active: i32::from(m.active),
            })
            .collect();

        let mut conn = persistence.writer()?;
        Ok(mutations::mappings::replace_mappings(&mut conn, &rows)?)
    }

    /// Validates a logo's MIME type and size.
    fn validate_logo(&self, logo: LogoUpload) -> Result<LogoUpload, ApiError> {
        let mime: LogoMime = logo.mime.parse()?;
        if logo.bytes.len() > self.logo_max_bytes {
            return Err(ApiError::PayloadTooLarge {
                limit: self.logo_max_bytes,
            });
        }
        Ok(LogoUpload {
            bytes: logo.bytes,
            mime: mime.as_str().to_string(),
        })
    }
}

fn validate_color(color: Option<&str>) -> Result<Option<String>, ApiError> {
    match color.map(str::trim) {
        Some(value) if !value.is_empty() => {
            let parsed: TeamColor = TeamColor::parse(value)?;
            Ok(Some(parsed.as_str().to_string()))
        }
        _ => Ok(None),
    }
}

fn team_dto(team: TeamListing) -> TeamDto {
    TeamDto {
        id: team.id,
        name: team.name,
        color: team.color,
        has_logo: team.logo_mime.is_some(),
        created_at: team.created_at,
    }
}
