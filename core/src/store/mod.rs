//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Agents, the dispatcher and the workflow call store methods; they never
//! execute SQL directly.
//!
//! The connection sits behind a mutex so one `Arc<RiskStore>` can be shared
//! by every scheduler task. Methods lock once and do all their work on the
//! guarded connection; none of them calls another locking method while
//! holding the guard.

use crate::{
    error::{RiskError, RiskResult},
    types::{from_millis, to_millis, OrgId},
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

mod alert;
mod audit;
mod entity;
mod org;
mod risk_score;

pub struct RiskStore {
    conn: Mutex<Connection>,
}

impl RiskStore {
    pub fn open(path: &str) -> RiskResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> RiskResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> RiskResult<()> {
        self.conn()
            .execute_batch(include_str!("../../../migrations/001_risk_engine.sql"))?;
        Ok(())
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    // ── Organizations ──────────────────────────────────────────

    pub fn insert_organization(&self, organization_id: &str, name: &str, now: DateTime<Utc>) -> RiskResult<()> {
        self.conn().execute(
            "INSERT INTO organization (organization_id, name, is_active, created_at)
             VALUES (?1, ?2, 1, ?3)",
            params![organization_id, name, to_millis(now)],
        )?;
        Ok(())
    }

    /// Organizations the agents should visit, in id order.
    pub fn list_active_organizations(&self) -> RiskResult<Vec<OrgId>> {
        list_active_orgs(&self.conn())
    }

    pub fn set_organization_active(&self, organization_id: &str, active: bool) -> RiskResult<()> {
        let n = self.conn().execute(
            "UPDATE organization SET is_active=?1 WHERE organization_id=?2",
            params![active as i32, organization_id],
        )?;
        if n == 0 {
            return Err(RiskError::not_found("organization", organization_id));
        }
        Ok(())
    }
}

fn list_active_orgs(conn: &Connection) -> RiskResult<Vec<OrgId>> {
    let mut stmt = conn.prepare(
        "SELECT organization_id FROM organization
         WHERE is_active=1 AND deleted_at IS NULL
         ORDER BY organization_id",
    )?;
    let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
    let mut result = Vec::new();
    for r in rows {
        result.push(r?);
    }
    Ok(result)
}

// ── Optimistic concurrency ─────────────────────────────────────

/// Interpret the row count of a `... WHERE id=? AND organization_id=? AND
/// version=?` update. Zero rows means either the row is gone or its version
/// moved on; the two are reported differently.
pub(crate) fn check_versioned_update(
    conn: &Connection,
    affected: usize,
    table: &'static str,
    id: &str,
    organization_id: &str,
    expected_version: i64,
) -> RiskResult<()> {
    if affected > 0 {
        return Ok(());
    }
    // `table` is always one of our own literals.
    let exists = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE id=?1 AND organization_id=?2"),
            params![id, organization_id],
            |_| Ok(()),
        )
        .optional()?
        .is_some();
    if exists {
        log::warn!("version conflict on {table} id={id}: expected {expected_version}");
        Err(RiskError::ConcurrencyConflict {
            entity: table,
            id: id.to_string(),
            expected: expected_version,
        })
    } else {
        Err(RiskError::not_found(table, id))
    }
}

// ── Row helpers ────────────────────────────────────────────────

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

pub(crate) fn json_col<T: DeserializeOwned>(r: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = r.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_json_col<T: DeserializeOwned>(r: &Row<'_>, idx: usize) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = r.get(idx)?;
    raw.map(|s| {
        serde_json::from_str(&s)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

/// Decode a text column through one of the `parse(&str) -> Option<T>` helpers.
pub(crate) fn enum_col<T>(r: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = r.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, format!("unexpected value '{raw}'")))
}

pub(crate) fn ts_col(r: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(from_millis(r.get(idx)?))
}

pub(crate) fn opt_ts_col(r: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    Ok(r.get::<_, Option<i64>>(idx)?.map(from_millis))
}

pub(crate) fn opt_ts(ts: Option<DateTime<Utc>>) -> Option<i64> {
    ts.map(to_millis)
}
