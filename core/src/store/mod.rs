//! SQLite persistence layer.
//!
//! RULE: Only store/ talks to the database.
//! Engine components call store methods — they never execute SQL directly.
//!
//! Referential integrity is NOT enforced by the schema: bulk imports may
//! land dirty, the validator reports dangling references, and the analytic
//! join fails fast on them. Cascade semantics (campaign → ads → events,
//! user → event user reference nulled) live in the delete methods here.

use crate::error::EngineResult;
mod dimension;
mod event;
mod rollup;

use rusqlite::Connection;

pub struct AdStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl AdStore {
    pub fn open(path: &str) -> EngineResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> EngineResult<Self> {
        let conn = Connection::open(":memory:")?;
        Ok(Self { conn, path: None })
    }

    /// Reopen a new connection to the same database.
    /// For in-memory databases, this returns a new in-memory database (isolated).
    /// For file-based databases, this opens the same file.
    pub fn reopen(&self) -> EngineResult<Self> {
        match &self.path {
            Some(p) => Self::open(p),
            None => Self::in_memory(),
        }
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> EngineResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_dimensions.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_events.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_rollups.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/004_views.sql"))?;
        Ok(())
    }
}
