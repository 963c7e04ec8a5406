// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Filtered event queries and derived session/user listings.
//!
//! Filters compose by AND across dimensions and OR within one dimension.
//! Index-backed predicates (kind, session, user, time range, org key) are
//! pushed into SQL; the substring `search` predicate runs last, in process,
//! over the surviving candidates because it matches against a projection
//! of the whole row including the serialized payload.

use diesel::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

use crate::data_models::EventRow;
use crate::diesel_schema::events;
use crate::error::PersistenceError;

/// A composed filter over the events table. All dimensions are optional
/// and combine by AND; values within one dimension are OR-ed.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Restrict to these event kinds (wire strings). Empty means no filter.
    pub kinds: Vec<String>,
    /// Exact session match.
    pub session_id: Option<String>,
    /// Restrict to these user names. Empty means no filter. The `__none__`
    /// sentinel is resolved by the query service before this layer.
    pub user_names: Vec<String>,
    /// Case-insensitive substring over the row projection.
    pub search: Option<String>,
    /// Half-open lower bound on `received_at` (inclusive), ISO-8601.
    pub received_from: Option<String>,
    /// Half-open upper bound on `received_at` (exclusive), ISO-8601.
    pub received_to: Option<String>,
    /// Restrict to events whose org key is in this set. `None` means no
    /// team filter; an empty set matches nothing.
    pub org_keys: Option<Vec<String>>,
}

/// Pagination and ordering for event queries.
#[derive(Debug, Clone, Copy)]
pub struct EventPage {
    /// Rows per page, already validated against `[1, 500]`.
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
    /// Newest first when true (the default).
    pub descending: bool,
}

impl Default for EventPage {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
            descending: true,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone)]
pub struct QueriedEvents {
    /// The page of rows.
    pub events: Vec<EventRow>,
    /// Whether more rows exist beyond this page.
    pub has_more: bool,
    /// Total matching rows, when computing it was cheap.
    pub total: Option<i64>,
}

/// A materialized session summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session_id: String,
    pub first_event: String,
    pub last_event: String,
    pub event_count: i64,
    pub user_id: String,
    pub user_name: String,
}

/// Builds the index-backed portion of the filter as a boxed query.
fn boxed_events(
    filter: &EventFilter,
) -> events::BoxedQuery<'static, diesel::sqlite::Sqlite> {
    let mut query = events::table.into_boxed();

    if !filter.kinds.is_empty() {
        query = query.filter(events::event_kind.eq_any(filter.kinds.clone()));
    }
    if let Some(session_id) = &filter.session_id {
        query = query.filter(events::session_id.eq(session_id.clone()));
    }
    if !filter.user_names.is_empty() {
        query = query.filter(events::user_name.eq_any(filter.user_names.clone()));
    }
    if let Some(from) = &filter.received_from {
        query = query.filter(events::received_at.ge(from.clone()));
    }
    if let Some(to) = &filter.received_to {
        query = query.filter(events::received_at.lt(to.clone()));
    }
    if let Some(org_keys) = &filter.org_keys {
        query = query.filter(events::org_identifier_key.eq_any(org_keys.clone()));
    }

    query
}

/// The deterministic projection of a row that the `search` filter scans.
fn search_projection(row: &EventRow) -> String {
    format!(
        "{} {} {} {} {} {} {}",
        row.event_kind,
        row.area,
        row.tool_name,
        row.company_name,
        row.error_message,
        row.user_name,
        row.data_json
    )
    .to_lowercase()
}

/// Queries one page of events under the composed filter.
///
/// `has_more` is computed by requesting one row beyond the limit. When no
/// substring search is present the total match count is also reported.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn query_events(
    conn: &mut SqliteConnection,
    filter: &EventFilter,
    page: &EventPage,
) -> Result<QueriedEvents, PersistenceError> {
    if let Some(search) = &filter.search {
        return query_events_with_search(conn, filter, page, search);
    }

    let total: i64 = boxed_events(filter).count().get_result(conn)?;

    let query = boxed_events(filter);
    let query = if page.descending {
        query.order((events::received_at.desc(), events::id.desc()))
    } else {
        query.order((events::received_at.asc(), events::id.asc()))
    };

    let mut rows: Vec<EventRow> = query
        .offset(page.offset)
        .limit(page.limit + 1)
        .load(conn)?;

    let has_more: bool = rows.len() as i64 > page.limit;
    rows.truncate(usize::try_from(page.limit).unwrap_or(usize::MAX));

    debug!(
        returned = rows.len(),
        has_more, total, "Queried events without search"
    );

    Ok(QueriedEvents {
        events: rows,
        has_more,
        total: Some(total),
    })
}

/// The search path: index predicates in SQL, substring scan in process,
/// pagination applied to the surviving candidates.
fn query_events_with_search(
    conn: &mut SqliteConnection,
    filter: &EventFilter,
    page: &EventPage,
    search: &str,
) -> Result<QueriedEvents, PersistenceError> {
    let query = boxed_events(filter);
    let query = if page.descending {
        query.order((events::received_at.desc(), events::id.desc()))
    } else {
        query.order((events::received_at.asc(), events::id.asc()))
    };

    let candidates: Vec<EventRow> = query.load(conn)?;

    let needle: String = search.to_lowercase();
    let matches: Vec<EventRow> = candidates
        .into_iter()
        .filter(|row| search_projection(row).contains(&needle))
        .collect();

    let total: i64 = i64::try_from(matches.len()).unwrap_or(i64::MAX);
    let start: usize = usize::try_from(page.offset).unwrap_or(usize::MAX).min(matches.len());
    let end: usize = start
        .saturating_add(usize::try_from(page.limit).unwrap_or(usize::MAX))
        .min(matches.len());
    let has_more: bool = end < matches.len();
    let rows: Vec<EventRow> = matches[start..end].to_vec();

    debug!(
        returned = rows.len(),
        has_more, total, "Queried events with search"
    );

    Ok(QueriedEvents {
        events: rows,
        has_more,
        total: Some(total),
    })
}

/// Fetches a single event by ID.
///
/// # Errors
///
/// Returns `NotFound` if no such event exists.
pub fn get_event(conn: &mut SqliteConnection, event_id: i64) -> Result<EventRow, PersistenceError> {
    events::table
        .filter(events::id.eq(event_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| PersistenceError::NotFound(format!("Event {event_id} not found")))
}

/// Counts matching events per event kind.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_event_types(
    conn: &mut SqliteConnection,
    filter: &EventFilter,
) -> Result<BTreeMap<String, i64>, PersistenceError> {
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();

    if let Some(search) = &filter.search {
        let candidates: Vec<EventRow> = boxed_events(filter).load(conn)?;
        let needle: String = search.to_lowercase();
        for row in candidates {
            if search_projection(&row).contains(&needle) {
                *counts.entry(row.event_kind).or_insert(0) += 1;
            }
        }
        return Ok(counts);
    }

    let kinds: Vec<String> = boxed_events(filter).select(events::event_kind).load(conn)?;
    for kind in kinds {
        *counts.entry(kind).or_insert(0) += 1;
    }
    Ok(counts)
}

/// Lists session summaries, newest activity first.
///
/// Applies the user-name filter when non-empty; the `__none__` sentinel is
/// resolved before this layer.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_session_summaries(
    conn: &mut SqliteConnection,
    user_names: &[String],
) -> Result<Vec<SessionSummary>, PersistenceError> {
    use diesel::dsl::{count_star, max, min};

    type GroupedRow = (String, Option<String>, Option<String>, i64, Option<String>, Option<String>);

    let rows: Vec<GroupedRow> = if user_names.is_empty() {
        events::table
            .group_by(events::session_id)
            .select((
                events::session_id,
                min(events::received_at),
                max(events::received_at),
                count_star(),
                max(events::user_id),
                max(events::user_name),
            ))
            .load(conn)?
    } else {
        events::table
            .filter(events::user_name.eq_any(user_names.to_vec()))
            .group_by(events::session_id)
            .select((
                events::session_id,
                min(events::received_at),
                max(events::received_at),
                count_star(),
                max(events::user_id),
                max(events::user_name),
            ))
            .load(conn)?
    };

    let mut summaries: Vec<SessionSummary> = rows
        .into_iter()
        .map(|(session_id, first, last, count, user_id, user_name)| SessionSummary {
            session_id,
            first_event: first.unwrap_or_default(),
            last_event: last.unwrap_or_default(),
            event_count: count,
            user_id: user_id.unwrap_or_default(),
            user_name: user_name.unwrap_or_default(),
        })
        .collect();

    summaries.sort_by(|a, b| b.last_event.cmp(&a.last_event));
    Ok(summaries)
}

/// Returns the raw events of one session (or of all sessions), ordered by
/// `received_at` ascending. The caller buckets; this layer does not.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn session_activity(
    conn: &mut SqliteConnection,
    session_id: Option<&str>,
) -> Result<Vec<EventRow>, PersistenceError> {
    let mut query = events::table.into_boxed();
    if let Some(session_id) = session_id {
        query = query.filter(events::session_id.eq(session_id.to_string()));
    }
    Ok(query
        .order((events::received_at.asc(), events::id.asc()))
        .load(conn)?)
}

/// Lists distinct event users with counts and last-seen timestamps.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_event_users(
    conn: &mut SqliteConnection,
) -> Result<Vec<(String, i64, String)>, PersistenceError> {
    use diesel::dsl::{count_star, max};

    let rows: Vec<(String, i64, Option<String>)> = events::table
        .filter(events::user_name.ne(""))
        .group_by(events::user_name)
        .select((events::user_name, count_star(), max(events::received_at)))
        .load(conn)?;

    let mut users: Vec<(String, i64, String)> = rows
        .into_iter()
        .map(|(name, count, last_seen)| (name, count, last_seen.unwrap_or_default()))
        .collect();
    users.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));
    Ok(users)
}

/// Lists distinct `(user_id, user_name)` pairs with counts, the feed for
/// the filter dropdown.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_telemetry_users(
    conn: &mut SqliteConnection,
) -> Result<Vec<(String, String, i64)>, PersistenceError> {
    use diesel::dsl::count_star;

    let mut rows: Vec<(String, String, i64)> = events::table
        .group_by((events::user_id, events::user_name))
        .select((events::user_id, events::user_name, count_star()))
        .load(conn)?;

    rows.sort_by(|a, b| a.1.to_lowercase().cmp(&b.1.to_lowercase()));
    Ok(rows)
}
