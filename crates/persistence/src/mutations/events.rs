// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Event inserts and deletions.

use diesel::prelude::*;
use tracing::debug;

use crate::backend::get_last_insert_rowid;
use crate::data_models::NewEvent;
use crate::diesel_schema::events;
use crate::error::PersistenceError;

/// Inserts one event and returns its assigned row ID.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_event(conn: &mut SqliteConnection, event: &NewEvent) -> Result<i64, PersistenceError> {
    diesel::insert_into(events::table)
        .values(event)
        .execute(conn)?;
    let event_id: i64 = get_last_insert_rowid(conn)?;
    debug!(event_id, kind = %event.event_kind, "Inserted event");
    Ok(event_id)
}

/// Deletes one event by ID.
///
/// # Errors
///
/// Returns `NotFound` if no such event exists.
pub fn delete_event(conn: &mut SqliteConnection, event_id: i64) -> Result<(), PersistenceError> {
    let deleted: usize =
        diesel::delete(events::table.filter(events::id.eq(event_id))).execute(conn)?;
    if deleted == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Event {event_id} not found"
        )));
    }
    Ok(())
}

/// Deletes every event belonging to one telemetry session and returns how
/// many rows went away.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_events_by_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> Result<i64, PersistenceError> {
    let deleted: usize =
        diesel::delete(events::table.filter(events::session_id.eq(session_id))).execute(conn)?;
    debug!(session_id, deleted, "Deleted session events");
    Ok(i64::try_from(deleted).unwrap_or(i64::MAX))
}

/// Deletes every stored event and returns how many rows went away.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_all_events(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    let deleted: usize = diesel::delete(events::table).execute(conn)?;
    Ok(i64::try_from(deleted).unwrap_or(i64::MAX))
}
