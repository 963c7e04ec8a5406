// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Storage engine for the Toolscope telemetry viewer.
//!
//! A single embedded `SQLite` database holds events, operators, sessions,
//! teams, orgs, legacy org->team mappings, and event-user team links. The
//! engine exposes typed queries and mutations over Diesel; schema changes
//! ship as embedded migrations applied in order at startup.
//!
//! ## Concurrency
//!
//! Two r2d2 pools share the database file: a writer pool capped at one
//! connection (`SQLite` has a single-writer discipline anyway, so the cap
//! turns lock contention into queueing) and a larger reader pool. WAL
//! journal mode lets readers run against a stable snapshot while the
//! writer commits.
//!
//! ## Bootstrap
//!
//! On first boot the configured template database file is copied into
//! place before the pools open; if the operators table is still empty
//! after migrations, the seed `god` operator is created.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

use diesel::SqliteConnection;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

pub mod backend;
mod data_models;
pub mod diesel_schema;
mod error;
pub mod mutations;
pub mod queries;

#[cfg(test)]
mod tests;

pub use data_models::{
    EventRow, EventUserTeamRow, NewEvent, NewOrgTeamMapping, OperatorRow, OrgRow,
    OrgTeamMappingRow, SessionRow, TeamRow,
};
pub use error::PersistenceError;
pub use queries::events::{EventFilter, EventPage, QueriedEvents};

/// Atomic counter for generating unique in-memory database names.
///
/// Each call to `new_in_memory()` receives a unique sequential ID, which
/// keeps parallel tests isolated without time-based collisions.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Default size of the reader pool.
const DEFAULT_READER_POOL_SIZE: u32 = 8;

/// A pooled SQLite connection.
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Storage engine handle: split reader/writer pools over one database.
///
/// Cloning is cheap; all clones share the same pools.
#[derive(Clone)]
pub struct Persistence {
    readers: Pool<ConnectionManager<SqliteConnection>>,
    writers: Pool<ConnectionManager<SqliteConnection>>,
    db_path: Option<PathBuf>,
}

impl Persistence {
    /// Creates a storage engine over a unique shared in-memory database.
    ///
    /// Both pools keep at least one idle connection so the in-memory
    /// database outlives individual checkouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new_in_memory() -> Result<Self, PersistenceError> {
        let db_id: u64 = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let url: String = format!("file:toolscope_memdb_{db_id}?mode=memory&cache=shared");
        Self::open(&url, None, 2)
    }

    /// Creates a storage engine over a file-based database, copying the
    /// template file into place first when the database does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the template copy, connection, or migrations
    /// fail.
    pub fn new_with_file<P: AsRef<Path>>(
        path: P,
        initial_template: Option<&Path>,
    ) -> Result<Self, PersistenceError> {
        let path: &Path = path.as_ref();

        if !path.exists() {
            if let Some(template) = initial_template {
                info!(template = %template.display(), db = %path.display(), "Seeding database from template");
                std::fs::copy(template, path)
                    .map_err(|e| PersistenceError::InitializationError(e.to_string()))?;
            }
        }

        let url: &str = path.to_str().ok_or_else(|| {
            PersistenceError::InitializationError("Invalid database path".to_string())
        })?;

        Self::open(url, Some(path.to_path_buf()), DEFAULT_READER_POOL_SIZE)
    }

    /// Opens both pools against `url` and runs migrations on the writer.
    fn open(
        url: &str,
        db_path: Option<PathBuf>,
        reader_pool_size: u32,
    ) -> Result<Self, PersistenceError> {
        let writers: Pool<ConnectionManager<SqliteConnection>> = Pool::builder()
            .max_size(1)
            .min_idle(Some(1))
            .connection_customizer(Box::new(backend::ConnectionCustomizer))
            .build(ConnectionManager::new(url))?;

        let readers: Pool<ConnectionManager<SqliteConnection>> = Pool::builder()
            .max_size(reader_pool_size)
            .min_idle(Some(1))
            .connection_customizer(Box::new(backend::ConnectionCustomizer))
            .build(ConnectionManager::new(url))?;

        let mut conn: DbConnection = writers.get()?;
        backend::run_migrations(&mut conn)?;
        backend::verify_foreign_key_enforcement(&mut conn)?;
        drop(conn);

        info!(url, "Storage engine initialized");

        Ok(Self {
            readers,
            writers,
            db_path,
        })
    }

    /// Checks out a reader connection.
    ///
    /// # Errors
    ///
    /// Returns an error when the pool is exhausted or the database is
    /// unreachable.
    pub fn reader(&self) -> Result<DbConnection, PersistenceError> {
        Ok(self.readers.get()?)
    }

    /// Checks out the writer connection.
    ///
    /// # Errors
    ///
    /// Returns an error when the writer is unavailable.
    pub fn writer(&self) -> Result<DbConnection, PersistenceError> {
        Ok(self.writers.get()?)
    }

    /// Reports the database file size in bytes and the percentage of the
    /// configured limit it occupies. In-memory databases report zero.
    ///
    /// # Errors
    ///
    /// Returns a storage error when the file metadata cannot be read.
    pub fn database_size(&self, max_bytes: u64) -> Result<(u64, f64), PersistenceError> {
        let Some(path) = &self.db_path else {
            return Ok((0, 0.0));
        };
        let bytes: u64 = std::fs::metadata(path)
            .map_err(|e| PersistenceError::StorageError(e.to_string()))?
            .len();
        #[allow(clippy::cast_precision_loss)]
        let pct: f64 = if max_bytes == 0 {
            0.0
        } else {
            (bytes as f64 / max_bytes as f64) * 100.0
        };
        Ok((bytes, pct))
    }
}
