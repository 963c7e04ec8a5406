// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The read side: composite event queries, session listings, and the user
//! directory feeds.
//!
//! The `__none__` sentinel on the user filter means "all users
//! deselected": it short-circuits to an empty result before any storage
//! work, never "no filter".

use toolscope_domain::{USER_FILTER_NONE, validate_limit};
use toolscope_persistence::{
    EventFilter, EventPage, Persistence, QueriedEvents, mutations, queries,
};
use tracing::debug;

use crate::error::ApiError;
use crate::request_response::{
    DeletedCountResponse, EventDto, EventUserDto, EventsResponse, SessionSummaryDto,
    TelemetryUserDto,
};
use crate::teams::TeamService;

/// A parsed event query: the filter dimensions plus the view.
#[derive(Debug, Clone)]
pub struct EventQuery {
    /// Event kind filter (wire strings); empty means no filter.
    pub kinds: Vec<String>,
    /// Exact telemetry session match.
    pub session_id: Option<String>,
    /// User filter values from the `userId` params.
    pub user_ids: Vec<String>,
    /// Case-insensitive substring search.
    pub search: Option<String>,
    /// Inclusive lower bound on `received_at`.
    pub from: Option<String>,
    /// Exclusive upper bound on `received_at`.
    pub to: Option<String>,
    /// A team key; expands to an org-key IN set.
    pub team_key: Option<String>,
    /// Page size; validated against `[1, 500]`.
    pub limit: Option<i64>,
    /// Rows to skip.
    pub offset: Option<i64>,
    /// `asc` or `desc` (default).
    pub descending: bool,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            kinds: Vec::new(),
            session_id: None,
            user_ids: Vec::new(),
            search: None,
            from: None,
            to: None,
            team_key: None,
            limit: None,
            offset: None,
            descending: true,
        }
    }
}

impl EventQuery {
    const DEFAULT_LIMIT: i64 = 50;

    fn contains_sentinel(&self) -> bool {
        self.user_ids.iter().any(|u| u == USER_FILTER_NONE)
    }

    fn page(&self) -> Result<EventPage, ApiError> {
        let limit: i64 = validate_limit(self.limit.unwrap_or(Self::DEFAULT_LIMIT))?;
        let offset: i64 = self.offset.unwrap_or(0);
        if offset < 0 {
            return Err(ApiError::InvalidInput {
                field: String::from("offset"),
                message: String::from("Offset must not be negative"),
            });
        }
        Ok(EventPage {
            limit,
            offset,
            descending: self.descending,
        })
    }
}

/// Read-side operations over the event store.
#[derive(Debug, Clone, Copy)]
pub struct QueryService;

impl QueryService {
    /// Queries one page of events under the composed filter.
    ///
    /// # Errors
    ///
    /// Returns validation errors for bad pagination and storage errors for
    /// failed reads.
    pub fn events(
        persistence: &Persistence,
        query: &EventQuery,
    ) -> Result<EventsResponse, ApiError> {
        let page: EventPage = query.page()?;

        if query.contains_sentinel() {
            debug!("User filter sentinel present; returning empty page");
            return Ok(EventsResponse::empty());
        }

        let filter: EventFilter = Self::build_filter(persistence, query)?;
        let mut conn = persistence.reader()?;
        let result: QueriedEvents = queries::events::query_events(&mut conn, &filter, &page)?;

        Ok(EventsResponse {
            events: result.events.into_iter().map(EventDto::from).collect(),
            has_more: result.has_more,
            total: result.total,
        })
    }

    /// Fetches a single event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs.
    pub fn event(persistence: &Persistence, event_id: i64) -> Result<EventDto, ApiError> {
        let mut conn = persistence.reader()?;
        Ok(EventDto::from(queries::events::get_event(
            &mut conn, event_id,
        )?))
    }

    /// Deletes one event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown IDs.
    pub fn delete_event(persistence: &Persistence, event_id: i64) -> Result<(), ApiError> {
        let mut conn = persistence.writer()?;
        mutations::events::delete_event(&mut conn, event_id)?;
        Ok(())
    }

    /// Deletes every event of one telemetry session.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub fn delete_session_events(
        persistence: &Persistence,
        session_id: &str,
    ) -> Result<DeletedCountResponse, ApiError> {
        let mut conn = persistence.writer()?;
        let deleted_count: i64 =
            mutations::events::delete_events_by_session(&mut conn, session_id)?;
        Ok(DeletedCountResponse { deleted_count })
    }

    /// Deletes every stored event.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the delete fails.
    pub fn delete_all_events(persistence: &Persistence) -> Result<DeletedCountResponse, ApiError> {
        let mut conn = persistence.writer()?;
        let deleted_count: i64 = mutations::events::delete_all_events(&mut conn)?;
        Ok(DeletedCountResponse { deleted_count })
    }

    /// Counts matching events per kind.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn event_types(
        persistence: &Persistence,
        query: &EventQuery,
    ) -> Result<std::collections::BTreeMap<String, i64>, ApiError> {
        if query.contains_sentinel() {
            return Ok(std::collections::BTreeMap::new());
        }
        let filter: EventFilter = Self::build_filter(persistence, query)?;
        let mut conn = persistence.reader()?;
        Ok(queries::events::count_event_types(&mut conn, &filter)?)
    }

    /// Lists telemetry session summaries, honoring the user filter rules.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn sessions(
        persistence: &Persistence,
        user_ids: &[String],
    ) -> Result<Vec<SessionSummaryDto>, ApiError> {
        if user_ids.iter().any(|u| u == USER_FILTER_NONE) {
            return Ok(Vec::new());
        }
        let mut conn = persistence.reader()?;
        Ok(queries::events::list_session_summaries(&mut conn, user_ids)?
            .into_iter()
            .map(|s| SessionSummaryDto {
                session_id: s.session_id,
                first_event: s.first_event,
                last_event: s.last_event,
                event_count: s.event_count,
                user_id: s.user_id,
                user_name: s.user_name,
            })
            .collect())
    }

    /// Returns the raw events of one session (or all sessions when the
    /// selector is `all`), oldest first. Clients bucket the timeline.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn session_activity(
        persistence: &Persistence,
        selector: &str,
    ) -> Result<Vec<EventDto>, ApiError> {
        let session_id: Option<&str> = if selector == "all" {
            None
        } else {
            Some(selector)
        };
        let mut conn = persistence.reader()?;
        Ok(queries::events::session_activity(&mut conn, session_id)?
            .into_iter()
            .map(EventDto::from)
            .collect())
    }

    /// Lists distinct event users with counts and last-seen timestamps.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn event_users(persistence: &Persistence) -> Result<Vec<EventUserDto>, ApiError> {
        let mut conn = persistence.reader()?;
        Ok(queries::events::list_event_users(&mut conn)?
            .into_iter()
            .map(|(user_name, count, last_seen)| EventUserDto {
                user_name,
                count,
                last_seen,
            })
            .collect())
    }

    /// Lists distinct `(user_id, user_name)` pairs with counts.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the read fails.
    pub fn telemetry_users(persistence: &Persistence) -> Result<Vec<TelemetryUserDto>, ApiError> {
        let mut conn = persistence.reader()?;
        Ok(queries::events::list_telemetry_users(&mut conn)?
            .into_iter()
            .map(|(user_id, user_name, count)| TelemetryUserDto {
                user_id,
                user_name,
                count,
            })
            .collect())
    }

    /// Builds the storage filter, expanding the team key into an org-key
    /// set when present.
    fn build_filter(
        persistence: &Persistence,
        query: &EventQuery,
    ) -> Result<EventFilter, ApiError> {
        let org_keys: Option<Vec<String>> = match query.team_key.as_deref() {
            Some(team_key) => Some(TeamService::org_keys_for_team_key(persistence, team_key)?),
            None => None,
        };

        Ok(EventFilter {
            kinds: query.kinds.clone(),
            session_id: query.session_id.clone(),
            user_names: query.user_ids.clone(),
            search: query
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            received_from: query.from.clone(),
            received_to: query.to.clone(),
            org_keys,
        })
    }
}
