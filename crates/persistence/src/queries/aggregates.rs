// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Windowed and whole-table aggregate counts.
//!
//! Timestamps are stored as fixed-width ISO-8601 strings, so lexicographic
//! comparison is chronological comparison and day windows are plain string
//! ranges. The aggregation service computes the window boundaries; this
//! layer only counts.

use diesel::dsl::count_star;
use diesel::prelude::*;

use crate::diesel_schema::events;
use crate::error::PersistenceError;

/// Counts all stored events.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_all_events(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(events::table.count().get_result(conn)?)
}

/// Counts events received in the half-open window `[from, to)`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_events_between(
    conn: &mut SqliteConnection,
    from: &str,
    to: &str,
) -> Result<i64, PersistenceError> {
    Ok(events::table
        .filter(events::received_at.ge(from.to_string()))
        .filter(events::received_at.lt(to.to_string()))
        .count()
        .get_result(conn)?)
}

/// Counts events per org key over the whole table, descending by count.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn org_key_counts(conn: &mut SqliteConnection) -> Result<Vec<(String, i64)>, PersistenceError> {
    let mut rows: Vec<(String, i64)> = events::table
        .filter(events::org_identifier_key.ne(""))
        .group_by(events::org_identifier_key)
        .select((events::org_identifier_key, count_star()))
        .load(conn)?;
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(rows)
}

/// Counts events per org key in the half-open window `[from, to)`,
/// descending by count.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn org_key_counts_between(
    conn: &mut SqliteConnection,
    from: &str,
    to: &str,
) -> Result<Vec<(String, i64)>, PersistenceError> {
    let mut rows: Vec<(String, i64)> = events::table
        .filter(events::received_at.ge(from.to_string()))
        .filter(events::received_at.lt(to.to_string()))
        .filter(events::org_identifier_key.ne(""))
        .group_by(events::org_identifier_key)
        .select((events::org_identifier_key, count_star()))
        .load(conn)?;
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(rows)
}

/// Counts events per user name in the half-open window `[from, to)`,
/// descending by count.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn user_counts_between(
    conn: &mut SqliteConnection,
    from: &str,
    to: &str,
) -> Result<Vec<(String, i64)>, PersistenceError> {
    let mut rows: Vec<(String, i64)> = events::table
        .filter(events::received_at.ge(from.to_string()))
        .filter(events::received_at.lt(to.to_string()))
        .filter(events::user_name.ne(""))
        .group_by(events::user_name)
        .select((events::user_name, count_star()))
        .load(conn)?;
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(rows)
}

/// Counts failed events (explicit `success = 0`) in the half-open window
/// `[from, to)`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn error_count_between(
    conn: &mut SqliteConnection,
    from: &str,
    to: &str,
) -> Result<i64, PersistenceError> {
    Ok(events::table
        .filter(events::received_at.ge(from.to_string()))
        .filter(events::received_at.lt(to.to_string()))
        .filter(events::success.eq(0))
        .count()
        .get_result(conn)?)
}
