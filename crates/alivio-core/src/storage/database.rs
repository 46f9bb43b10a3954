//! SQLite-based host storage.
//!
//! Provides:
//! - A key-value store used by hosts to persist the serialized funnel
//!   state between invocations
//! - A log of completed funnel sessions and conversion statistics

use chrono::{DateTime, Utc};
use indoc::indoc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

use super::data_dir;

/// One completed funnel run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedSession {
    pub id: i64,
    pub session_id: String,
    /// Empty when the session completed without capturing an email.
    pub email: String,
    pub points: u32,
    pub badge_count: u32,
    pub completed_at: DateTime<Utc>,
}

/// Conversion statistics over the completed-session log.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FunnelStats {
    pub total_sessions: u64,
    pub today_sessions: u64,
    pub leads_captured: u64,
    pub avg_points: f64,
    pub best_points: u32,
}

/// SQLite database at `~/.config/alivio/alivio.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database, creating the file and schema if needed.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
            .join("alivio.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(indoc! {"
            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS funnel_sessions (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id   TEXT NOT NULL,
                email        TEXT NOT NULL DEFAULT '',
                points       INTEGER NOT NULL,
                badge_count  INTEGER NOT NULL,
                completed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_funnel_sessions_completed_at
                ON funnel_sessions(completed_at);
        "})?;
        Ok(())
    }

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), DatabaseError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// Log a completed funnel run.
    pub fn record_completed(
        &self,
        session_id: &str,
        email: &str,
        points: u32,
        badge_count: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO funnel_sessions (session_id, email, points, badge_count, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session_id,
                email,
                points,
                badge_count,
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent completed sessions, newest first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<CompletedSession>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, email, points, badge_count, completed_at
             FROM funnel_sessions ORDER BY completed_at DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let completed_at: String = row.get(5)?;
            Ok(CompletedSession {
                id: row.get(0)?,
                session_id: row.get(1)?,
                email: row.get(2)?,
                points: row.get(3)?,
                badge_count: row.get(4)?,
                completed_at: completed_at
                    .parse::<DateTime<Utc>>()
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn stats(&self) -> Result<FunnelStats, DatabaseError> {
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let (total, leads, avg, best) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN email != '' THEN 1 ELSE 0 END), 0),
                    COALESCE(AVG(points), 0.0),
                    COALESCE(MAX(points), 0)
             FROM funnel_sessions",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )?;
        let today_sessions: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM funnel_sessions WHERE completed_at LIKE ?1 || '%'",
            params![today],
            |row| row.get(0),
        )?;
        Ok(FunnelStats {
            total_sessions: total as u64,
            today_sessions: today_sessions as u64,
            leads_captured: leads as u64,
            avg_points: avg,
            best_points: best as u32,
        })
    }
}
