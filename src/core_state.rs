//! Shared application state.
//!
//! Each request opens its own SQLite connection against the shared
//! database file; the store's transaction mechanism is the only
//! concurrency primitive. There is no row-level locking on inventory —
//! two bookings that both read sufficient stock before either commits
//! rely on SQLite's single-writer isolation to serialise.

use std::path::PathBuf;

use rusqlite::Connection;
use thiserror::Error;

use crate::db::{self, DatabaseError};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Transport-agnostic application state, wrapped in `Arc` at startup.
pub struct CoreState {
    /// Path of the SQLite database file.
    pub db_path: PathBuf,
}

impl CoreState {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    /// Open a connection to the application database. Migrations have
    /// already run at startup, so this re-runs them as a cheap no-op.
    pub fn open_db(&self) -> Result<Connection, CoreError> {
        Ok(db::open_database(&self.db_path)?)
    }
}
