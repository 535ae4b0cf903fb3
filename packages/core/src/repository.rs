//! Database repository for ticker persistence.
//!
//! All SQLite read/write logic lives here. The worker calls
//! [`TickerRepository::insert_price`] once per processed update and
//! [`TickerRepository::upsert_metadata`] when a company profile was fetched.
//! The API reads back through [`TickerRepository::latest_price`] and
//! [`TickerRepository::get_metadata`].
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that string
//! order is chronological order.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::services::market_data::TickerProfile;

/// A stored price observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPrice {
    pub id: i64,
    pub ticker: String,
    pub price: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A price observation about to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTickerPrice {
    pub ticker: String,
    pub price: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Company metadata, one row per ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMetadata {
    pub id: i64,
    pub ticker: String,
    pub company_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// Repository for reading and writing ticker data to SQLite.
pub struct TickerRepository {
    pool: SqlitePool,
}

impl TickerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one price observation. Returns the new row id.
    pub async fn insert_price(&self, price: &NewTickerPrice) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO ticker_prices
             (ticker, price, volume, market_cap, timestamp, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&price.ticker)
        .bind(price.price)
        .bind(price.volume)
        .bind(price.market_cap)
        .bind(format_timestamp(price.timestamp))
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Most recent observation for `ticker`: newest `timestamp`, then newest row.
    pub async fn latest_price(&self, ticker: &str) -> Result<Option<TickerPrice>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, ticker, price, volume, market_cap, timestamp, created_at
             FROM ticker_prices
             WHERE ticker = ?
             ORDER BY timestamp DESC, id DESC
             LIMIT 1",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(price_from_row).transpose()
    }

    /// Insert or refresh the metadata row for `profile.symbol`.
    ///
    /// Fields the profile leaves empty keep their stored value;
    /// `last_updated` is always bumped.
    pub async fn upsert_metadata(&self, profile: &TickerProfile) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO ticker_metadata (ticker, company_name, sector, industry, last_updated)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(ticker) DO UPDATE SET
                 company_name = COALESCE(excluded.company_name, ticker_metadata.company_name),
                 sector       = COALESCE(excluded.sector, ticker_metadata.sector),
                 industry     = COALESCE(excluded.industry, ticker_metadata.industry),
                 last_updated = excluded.last_updated",
        )
        .bind(&profile.symbol)
        .bind(&profile.company_name)
        .bind(&profile.sector)
        .bind(&profile.industry)
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_metadata(&self, ticker: &str) -> Result<Option<TickerMetadata>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, ticker, company_name, sector, industry, last_updated
             FROM ticker_metadata
             WHERE ticker = ?",
        )
        .bind(ticker)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(metadata_from_row).transpose()
    }
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|err| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(err),
        })
}

fn price_from_row(row: &SqliteRow) -> Result<TickerPrice, sqlx::Error> {
    Ok(TickerPrice {
        id: row.try_get("id")?,
        ticker: row.try_get("ticker")?,
        price: row.try_get("price")?,
        volume: row.try_get("volume")?,
        market_cap: row.try_get("market_cap")?,
        timestamp: parse_timestamp(row, "timestamp")?,
        created_at: parse_timestamp(row, "created_at")?,
    })
}

fn metadata_from_row(row: &SqliteRow) -> Result<TickerMetadata, sqlx::Error> {
    Ok(TickerMetadata {
        id: row.try_get("id")?,
        ticker: row.try_get("ticker")?,
        company_name: row.try_get("company_name")?,
        sector: row.try_get("sector")?,
        industry: row.try_get("industry")?,
        last_updated: parse_timestamp(row, "last_updated")?,
    })
}
