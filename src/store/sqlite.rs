//! sqlite backend. reception time is stored as unix milliseconds so range
//! filters and ordering stay plain integer comparisons.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;

use super::ReadingStore;
use crate::domain::{NewReading, Reading};
use crate::error::SensorError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS readings (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        created_at_ms INTEGER NOT NULL,
        particle      REAL    NOT NULL,
        pm25          REAL    NOT NULL,
        hcho          REAL    NOT NULL,
        co2           REAL    NOT NULL,
        temperature   REAL    NOT NULL,
        humidity      REAL    NOT NULL,
        voc           REAL    NOT NULL,
        sequence_num  INTEGER NOT NULL,
        is_valid      BOOLEAN NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_readings_created_at ON readings (created_at_ms)",
    "CREATE INDEX IF NOT EXISTS idx_readings_sequence ON readings (sequence_num)",
    "CREATE INDEX IF NOT EXISTS idx_readings_is_valid ON readings (is_valid)",
];

const COLUMNS: &str = "id, created_at_ms, particle, pm25, hcho, co2, temperature, humidity, voc, sequence_num, is_valid";

#[derive(sqlx::FromRow)]
struct ReadingRow {
    id: i64,
    created_at_ms: i64,
    particle: f64,
    pm25: f64,
    hcho: f64,
    co2: f64,
    temperature: f64,
    humidity: f64,
    voc: f64,
    sequence_num: i64,
    is_valid: bool,
}

impl TryFrom<ReadingRow> for Reading {
    type Error = SensorError;

    fn try_from(row: ReadingRow) -> Result<Self, Self::Error> {
        let created_at = DateTime::from_timestamp_millis(row.created_at_ms).ok_or_else(|| {
            sqlx::Error::Decode(
                format!("reading {}: created_at_ms {} out of range", row.id, row.created_at_ms).into(),
            )
        })?;

        Ok(Reading {
            id: row.id,
            created_at,
            particle: row.particle,
            pm25: row.pm25,
            hcho: row.hcho,
            co2: row.co2,
            temperature: row.temperature,
            humidity: row.humidity,
            voc: row.voc,
            sequence_num: row.sequence_num,
            is_valid: row.is_valid,
        })
    }
}

fn decode_all(rows: Vec<ReadingRow>) -> Result<Vec<Reading>, SensorError> {
    rows.into_iter().map(Reading::try_from).collect()
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// open (creating if needed) the database at `url` and apply the schema
    ///
    /// connections are never recycled, which keeps `sqlite::memory:`
    /// databases alive for the life of the pool.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, SensorError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect(url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), SensorError> {
        let mut tx = self.pool.begin().await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ReadingStore for SqliteStore {
    async fn insert(&self, reading: NewReading) -> Result<Reading, SensorError> {
        let s = reading.sample;
        let result = sqlx::query(
            "INSERT INTO readings \
             (created_at_ms, particle, pm25, hcho, co2, temperature, humidity, voc, sequence_num, is_valid) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(reading.created_at.timestamp_millis())
        .bind(s.particle)
        .bind(s.pm25)
        .bind(s.hcho)
        .bind(s.co2)
        .bind(s.temperature)
        .bind(s.humidity)
        .bind(s.voc)
        .bind(s.sequence_num)
        .bind(reading.is_valid)
        .execute(&self.pool)
        .await?;

        Ok(Reading::from_new(result.last_insert_rowid(), reading))
    }

    async fn latest(&self) -> Result<Option<Reading>, SensorError> {
        let row: Option<ReadingRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM readings ORDER BY created_at_ms DESC, id DESC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        row.map(Reading::try_from).transpose()
    }

    async fn recent(
        &self,
        since: Option<DateTime<Utc>>,
        limit: Option<usize>,
    ) -> Result<Vec<Reading>, SensorError> {
        // sqlite treats a negative LIMIT as "no limit"
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let since = since.map_or(i64::MIN, |t| t.timestamp_millis());

        let rows: Vec<ReadingRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM readings WHERE created_at_ms >= ? \
             ORDER BY created_at_ms DESC, id DESC LIMIT ?"
        ))
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    async fn window(&self, since: DateTime<Utc>) -> Result<Vec<Reading>, SensorError> {
        let rows: Vec<ReadingRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM readings WHERE created_at_ms >= ? \
             ORDER BY created_at_ms ASC, id ASC"
        ))
        .bind(since.timestamp_millis())
        .fetch_all(&self.pool)
        .await?;
        decode_all(rows)
    }

    async fn max_valid_sequence(&self) -> Result<Option<i64>, SensorError> {
        let max: Option<i64> =
            sqlx::query_scalar("SELECT MAX(sequence_num) FROM readings WHERE is_valid = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(max)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
