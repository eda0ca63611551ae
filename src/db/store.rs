//! SQLite persistence for the monitor state snapshot.
//!
//! The core exposes full-state get/replace, not incremental diffs: the
//! scheduler loads the snapshot before a check cycle and stores it once
//! afterwards.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::state::MonitorState;

/// Database error types.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("state serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Thread-safe snapshot store.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Create a new store with the given database path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init()?;
        Ok(store)
    }

    /// Initialize the database with migrations.
    fn init(&self) -> Result<(), DbError> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(include_str!("../../migrations/000001_init.up.sql"))
            .map_err(|e| DbError::Migration(format!("Migration 1 failed: {}", e)))?;
        Ok(())
    }

    /// Load the persisted state snapshot, if one exists.
    pub fn load_state(&self) -> Result<Option<MonitorState>, DbError> {
        let conn = self.conn.lock().unwrap();
        let data: Option<String> = conn
            .query_row("SELECT data FROM monitor_state WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Replace the persisted state snapshot.
    pub fn save_state(&self, state: &MonitorState) -> Result<(), DbError> {
        let json = serde_json::to_string(state)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO monitor_state (id, data, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET data=excluded.data, updated_at=excluded.updated_at",
            params![json, Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()],
        )?;
        Ok(())
    }
}
