// SQLite repository implementation
use crate::application::repository::{PriceRepository, ScheduleRepository, SettingsRepository};
use crate::domain::mode::Mode;
use crate::domain::price::{PriceArea, PricePoint};
use crate::domain::schedule::{ScheduleBreakpoint, StoredBreakpoint};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS prices (
        timestamp   TEXT PRIMARY KEY,
        price       INTEGER NOT NULL,
        area        TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS schedule (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp   TEXT NOT NULL,
        mode        INTEGER NOT NULL,
        created_at  TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS settings (
        key         TEXT PRIMARY KEY,
        value       TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_schedule_timestamp ON schedule(timestamp);
";

#[derive(Debug)]
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn open(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let conn =
            Connection::open(path).with_context(|| format!("Failed to open database: {path}"))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))
    }
}

/// Fixed-width RFC 3339 so that text order equals time order.
fn encode_time(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_time(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp in database: {s}"))?
        .with_timezone(&Utc))
}

#[async_trait]
impl PriceRepository for SqliteRepository {
    async fn replace_prices(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        points: &[PricePoint],
    ) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;

        tx.execute(
            "DELETE FROM prices WHERE timestamp >= ?1 AND timestamp < ?2",
            params![encode_time(from), encode_time(to)],
        )?;

        {
            let mut stmt =
                tx.prepare("INSERT INTO prices (timestamp, price, area) VALUES (?1, ?2, ?3)")?;
            for point in points {
                stmt.execute(params![
                    encode_time(point.timestamp),
                    point.price,
                    point.area.code()
                ])
                .with_context(|| format!("Failed to store price for {}", point.timestamp))?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    async fn prices_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Vec<PricePoint>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT timestamp, price, area FROM prices
             WHERE timestamp >= ?1 AND timestamp < ?2 ORDER BY timestamp",
        )?;

        let rows = stmt
            .query_map(params![encode_time(from), encode_time(to)], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(timestamp, price, area)| {
                Ok(PricePoint::new(
                    decode_time(&timestamp)?,
                    price,
                    area.parse::<PriceArea>()?,
                ))
            })
            .collect()
    }
}

#[async_trait]
impl ScheduleRepository for SqliteRepository {
    async fn replace_schedule(&self, breakpoints: &[ScheduleBreakpoint]) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let created_at = encode_time(Utc::now());

        tx.execute("DELETE FROM schedule", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO schedule (timestamp, mode, created_at) VALUES (?1, ?2, ?3)",
            )?;
            for breakpoint in breakpoints {
                stmt.execute(params![
                    encode_time(breakpoint.timestamp),
                    u8::from(breakpoint.mode),
                    created_at
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    async fn load_schedule(&self) -> Result<Vec<StoredBreakpoint>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, timestamp, mode, created_at FROM schedule ORDER BY timestamp, id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u8>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, timestamp, mode, created_at)| {
                Ok(StoredBreakpoint {
                    id,
                    timestamp: decode_time(&timestamp)?,
                    mode: Mode::try_from(mode)?,
                    created_at: decode_time(&created_at)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl SettingsRepository for SqliteRepository {
    async fn setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection()?;
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn all_settings(&self) -> Result<HashMap<String, String>> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
        let settings = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<HashMap<String, String>, _>>()?;
        Ok(settings)
    }

    async fn save_settings(&self, settings: &HashMap<String, String>) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            )?;
            for (key, value) in settings {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
