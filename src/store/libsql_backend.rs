//! libSQL backend for the rate-limit store.
//!
//! Supports a local database file (production) and in-memory databases
//! (tests). `libsql::Connection` is `Send + Sync` and safe for concurrent
//! async use, though within this design only the single poll worker
//! touches it.

use std::path::Path;

use async_trait::async_trait;
use libsql::{Connection, params};
use tracing::info;

use crate::error::StoreError;
use crate::store::migrations;
use crate::store::traits::RateLimitStore;

/// libSQL-backed `RateLimitStore`.
pub struct LibSqlStore {
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Open(format!("Failed to create database directory: {e}")))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        info!(path = %path.display(), "Rate-limit store opened");
        Ok(Self { conn })
    }

    /// Create an in-memory store (for tests).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl RateLimitStore for LibSqlStore {
    async fn last_request_at(&self, sender: &str) -> Result<Option<i64>, StoreError> {
        let mut rows = self
            .conn
            .query(
                "SELECT last_request_at FROM request_times WHERE sender = ?1",
                params![sender],
            )
            .await
            .map_err(|e| StoreError::Query(format!("last_request_at lookup failed: {e}")))?;

        let row = rows
            .next()
            .await
            .map_err(|e| StoreError::Query(format!("last_request_at read failed: {e}")))?;

        match row {
            Some(row) => {
                let ts: i64 = row
                    .get(0)
                    .map_err(|e| StoreError::Query(format!("last_request_at decode failed: {e}")))?;
                Ok(Some(ts))
            }
            None => Ok(None),
        }
    }

    async fn try_begin_request(
        &self,
        sender: &str,
        now: i64,
        cooldown_secs: u64,
    ) -> Result<bool, StoreError> {
        // Single-statement check-then-charge: the conditional upsert either
        // records `now` (no prior row, or the prior row is outside the
        // window) or touches nothing. Rows-affected tells which.
        let affected = self
            .conn
            .execute(
                "INSERT INTO request_times (sender, last_request_at) VALUES (?1, ?2)
                 ON CONFLICT(sender) DO UPDATE SET last_request_at = excluded.last_request_at
                 WHERE excluded.last_request_at - request_times.last_request_at >= ?3",
                params![sender, now, cooldown_secs as i64],
            )
            .await
            .map_err(|e| StoreError::Query(format!("try_begin_request upsert failed: {e}")))?;

        Ok(affected > 0)
    }
}
