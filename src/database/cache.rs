/*!
 * SQLite-backed cache service.
 *
 * Entries carry an absolute expiry in Unix milliseconds. Expired rows read
 * as missing and are deleted on access; `purge_expired` sweeps the rest.
 */

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rusqlite::{params, OptionalExtension};
use std::time::Duration;

use super::connection::DatabaseConnection;
use crate::cache::CacheService;
use crate::errors::TranslationError;

#[derive(Clone)]
pub struct SqliteCache {
    db: DatabaseConnection,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn unavailable(e: anyhow::Error) -> TranslationError {
    TranslationError::CacheUnavailable(format!("{:#}", e))
}

impl SqliteCache {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Delete every expired row, returning how many were removed
    pub async fn purge_expired(&self) -> Result<usize> {
        let removed = self
            .db
            .execute_async(|conn| Ok(conn.execute("DELETE FROM cache_entries WHERE expires_at <= ?1", [now_millis()])?))
            .await?;
        if removed > 0 {
            debug!("Purged {} expired cache rows", removed);
        }
        Ok(removed)
    }

    /// Number of rows, including expired ones not yet purged
    pub async fn len(&self) -> Result<usize> {
        self.db
            .execute_async(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
    }

    /// Delete every row
    pub async fn clear(&self) -> Result<()> {
        self.db
            .execute_async(|conn| {
                conn.execute("DELETE FROM cache_entries", [])?;
                Ok(())
            })
            .await
    }
}

#[async_trait]
impl CacheService for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>, TranslationError> {
        let key = key.to_string();

        self.db
            .execute_async(move |conn| {
                let row: Option<(String, i64)> = conn
                    .query_row(
                        "SELECT value, expires_at FROM cache_entries WHERE key = ?1",
                        [&key],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                match row {
                    Some((value, expires_at)) if expires_at > now_millis() => Ok(Some(value)),
                    Some(_) => {
                        conn.execute("DELETE FROM cache_entries WHERE key = ?1", [&key])?;
                        Ok(None)
                    }
                    None => Ok(None),
                }
            })
            .await
            .map_err(unavailable)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), TranslationError> {
        let key = key.to_string();
        let value = value.to_string();
        let expires_at = now_millis().saturating_add(i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX));

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
                    ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at
                    "#,
                    params![key, value, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(unavailable)
    }

    async fn delete(&self, key: &str) -> Result<(), TranslationError> {
        let key = key.to_string();

        self.db
            .execute_async(move |conn| {
                conn.execute("DELETE FROM cache_entries WHERE key = ?1", [&key])?;
                Ok(())
            })
            .await
            .map_err(unavailable)
    }
}
