// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Windowed aggregates: per-team stats, daily counts, and the top-N
//! leaderboards.
//!
//! "Today" means the server's calendar day. The local UTC offset is
//! captured once at startup and day windows are computed from it, then
//! converted back to UTC strings so they compare correctly against stored
//! timestamps.

use std::collections::HashMap;
use time::{Date, Duration, OffsetDateTime, UtcOffset};
use toolscope_persistence::{OrgRow, OrgTeamMappingRow, Persistence, queries};
use toolscope_persistence::queries::teams::TeamListing;

use crate::error::ApiError;
use crate::format_timestamp;
use crate::request_response::{DailyCountDto, DatabaseSizeDto, TeamStatsDto, TopEntryDto};
use crate::teams::TeamResolution;

/// Default number of days covered by the daily-stats view.
pub const DEFAULT_DAILY_STATS_DAYS: u32 = 14;

/// Aggregate computations over the event store.
#[derive(Debug, Clone, Copy)]
pub struct StatsService {
    /// The server's UTC offset, captured at startup.
    pub local_offset: UtcOffset,
    /// The configured database size limit in bytes.
    pub db_max_bytes: u64,
    /// Warning threshold as a percentage of the limit.
    pub db_size_warn_pct: f64,
    /// Critical threshold as a percentage of the limit.
    pub db_size_crit_pct: f64,
}

impl StatsService {
    /// Creates the service, capturing the process-local UTC offset. Falls
    /// back to UTC when the offset cannot be determined (multi-threaded
    /// environments commonly refuse the lookup).
    #[must_use]
    pub fn new(db_max_bytes: u64, db_size_warn_pct: f64, db_size_crit_pct: f64) -> Self {
        let local_offset: UtcOffset =
            UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Self {
            local_offset,
            db_max_bytes,
            db_size_warn_pct,
            db_size_crit_pct,
        }
    }

    /// Computes per-team statistics over the whole event table.
    ///
    /// Event counts come from the resolution map, so the sum across teams
    /// equals the number of events whose org key resolves to any team.
    /// Output is sorted by team name, case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns a storage error if any read fails.
    pub fn team_stats(persistence: &Persistence) -> Result<Vec<TeamStatsDto>, ApiError> {
        let resolution: TeamResolution = TeamResolution::load(persistence)?;

        let mut conn = persistence.reader()?;
        let teams: Vec<TeamListing> = queries::teams::list_teams(&mut conn)?;
        let orgs: Vec<OrgRow> = queries::orgs::list_orgs(&mut conn)?;
        let mappings: Vec<OrgTeamMappingRow> =
            queries::mappings::list_mappings(&mut conn, false)?;
        let event_counts: Vec<(String, i64)> = queries::aggregates::org_key_counts(&mut conn)?;
        drop(conn);

        let counts_by_key: HashMap<&str, i64> = event_counts
            .iter()
            .map(|(key, count)| (key.as_str(), *count))
            .collect();

        let mut stats: Vec<TeamStatsDto> = teams
            .into_iter()
            .map(|team| {
                let org_keys: Vec<String> = resolution.org_keys_for(team.id);
                let event_count: i64 = org_keys
                    .iter()
                    .map(|key| counts_by_key.get(key.as_str()).copied().unwrap_or(0))
                    .sum();

                let team_key: String = team.name.trim().to_lowercase();
                let mut active_mappings: i64 = 0;
                let mut inactive_mappings: i64 = 0;
                let mut clients: Vec<String> = Vec::new();
                for mapping in &mappings {
                    if mapping.team_name.trim().to_lowercase() != team_key {
                        continue;
                    }
                    if mapping.active != 0 {
                        active_mappings += 1;
                    } else {
                        inactive_mappings += 1;
                    }
                    let client: &str = mapping.client_name.trim();
                    if !client.is_empty() && !clients.iter().any(|c| c == client) {
                        clients.push(client.to_string());
                    }
                }
                clients.sort();

                let mut team_orgs: Vec<String> = orgs
                    .iter()
                    .filter(|org| org.team_id == Some(team.id))
                    .map(|org| org.org_id.clone())
                    .collect();
                team_orgs.sort();

                TeamStatsDto {
                    team_id: team.id,
                    name: team.name,
                    color: team.color,
                    event_count,
                    active_mappings,
                    inactive_mappings,
                    orgs: team_orgs,
                    clients,
                }
            })
            .collect();

        stats.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(stats)
    }

    /// Computes per-day event and error counts for the trailing `days`
    /// window, oldest day first. Days are server-local.
    ///
    /// # Errors
    ///
    /// Returns a storage error if any count fails.
    pub fn daily_stats(
        &self,
        persistence: &Persistence,
        days: u32,
    ) -> Result<Vec<DailyCountDto>, ApiError> {
        let today: Date = OffsetDateTime::now_utc().to_offset(self.local_offset).date();
        let mut out: Vec<DailyCountDto> = Vec::with_capacity(days as usize);
        let mut conn = persistence.reader()?;

        for back in (0..i64::from(days)).rev() {
            let day: Date = today
                .checked_sub(Duration::days(back))
                .ok_or_else(|| ApiError::Internal {
                    message: String::from("Date arithmetic underflow"),
                })?;
            let (from, to): (String, String) = self.day_bounds(day)?;
            let count: i64 = queries::aggregates::count_events_between(&mut conn, &from, &to)?;
            let error_count: i64 =
                queries::aggregates::error_count_between(&mut conn, &from, &to)?;
            out.push(DailyCountDto {
                date: format!("{day}"),
                count,
                error_count,
            });
        }
        Ok(out)
    }

    /// The top `n` teams by event count for the server's current day.
    /// Ties break by name ascending.
    ///
    /// # Errors
    ///
    /// Returns a storage error if any read fails.
    pub fn top_teams_today(
        &self,
        persistence: &Persistence,
        n: usize,
    ) -> Result<Vec<TopEntryDto>, ApiError> {
        let (from, to): (String, String) = self.today_bounds()?;

        let mut conn = persistence.reader()?;
        let org_counts: Vec<(String, i64)> =
            queries::aggregates::org_key_counts_between(&mut conn, &from, &to)?;
        let teams: Vec<TeamListing> = queries::teams::list_teams(&mut conn)?;
        drop(conn);

        let resolution: TeamResolution = TeamResolution::load(persistence)?;
        let name_by_id: HashMap<i64, &str> =
            teams.iter().map(|t| (t.id, t.name.as_str())).collect();

        let mut totals: HashMap<i64, i64> = HashMap::new();
        for (key, count) in &org_counts {
            if let Some(team_id) = resolution.team_for(key) {
                *totals.entry(team_id).or_insert(0) += count;
            }
        }

        let mut entries: Vec<TopEntryDto> = totals
            .into_iter()
            .filter_map(|(team_id, count)| {
                name_by_id.get(&team_id).map(|name| TopEntryDto {
                    name: (*name).to_string(),
                    count,
                })
            })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        entries.truncate(n);
        Ok(entries)
    }

    /// The top `n` users by event count for the server's current day.
    /// Ties break by name ascending.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the count fails.
    pub fn top_users_today(
        &self,
        persistence: &Persistence,
        n: usize,
    ) -> Result<Vec<TopEntryDto>, ApiError> {
        let (from, to): (String, String) = self.today_bounds()?;
        let mut conn = persistence.reader()?;
        let mut entries: Vec<TopEntryDto> =
            queries::aggregates::user_counts_between(&mut conn, &from, &to)?
                .into_iter()
                .map(|(name, count)| TopEntryDto { name, count })
                .collect();
        entries.truncate(n);
        Ok(entries)
    }

    /// Reports the database size against the configured limit, classified
    /// by the warn/crit thresholds.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file metadata cannot be read.
    pub fn database_size(&self, persistence: &Persistence) -> Result<DatabaseSizeDto, ApiError> {
        let (bytes, pct_of_limit): (u64, f64) = persistence.database_size(self.db_max_bytes)?;
        let status: &str = if pct_of_limit >= self.db_size_crit_pct {
            "critical"
        } else if pct_of_limit >= self.db_size_warn_pct {
            "warning"
        } else {
            "ok"
        };
        Ok(DatabaseSizeDto {
            bytes,
            pct_of_limit,
            status: status.to_string(),
        })
    }

    /// The UTC string bounds of the server-local current day.
    fn today_bounds(&self) -> Result<(String, String), ApiError> {
        let today: Date = OffsetDateTime::now_utc().to_offset(self.local_offset).date();
        self.day_bounds(today)
    }

    /// The half-open `[midnight, next midnight)` window of one local day,
    /// formatted as UTC strings.
    fn day_bounds(&self, day: Date) -> Result<(String, String), ApiError> {
        let next: Date = day
            .checked_add(Duration::days(1))
            .ok_or_else(|| ApiError::Internal {
                message: String::from("Date arithmetic overflow"),
            })?;
        let start: OffsetDateTime = day.midnight().assume_offset(self.local_offset);
        let end: OffsetDateTime = next.midnight().assume_offset(self.local_offset);
        Ok((format_timestamp(start)?, format_timestamp(end)?))
    }
}
