// SPDX-FileCopyrightText: 2026 AutoPier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread: `Database` wraps a single `tokio_rusqlite::Connection`, query
//! modules accept `&Database` and go through `connection().call()`. Do NOT
//! create additional `Connection` instances for writes.

use std::path::Path;
use std::time::Duration;

use autopier_core::AutopierError;

/// Handle to the AutoPier SQLite database.
///
/// Cheap to clone; all clones share the same single writer thread.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with WAL mode enabled and
    /// run pending migrations.
    pub async fn open(path: &str) -> Result<Self, AutopierError> {
        Self::open_with(path, true).await
    }

    /// Open (or create) the database at `path`, optionally enabling WAL.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, AutopierError> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| AutopierError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        // PRAGMA setup and migrations run on a short-lived blocking
        // connection before the long-lived writer opens. WAL mode is a
        // database-file property, so it persists.
        let setup_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), AutopierError> {
            let map = |e: rusqlite::Error| AutopierError::Storage {
                source: Box::new(e),
            };
            let mut conn = rusqlite::Connection::open(&setup_path).map_err(map)?;
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL").map_err(map)?;
            }
            conn.pragma_update(None, "synchronous", "NORMAL").map_err(map)?;
            crate::migrations::run_migrations(&mut conn)?;
            Ok(())
        })
        .await
        .map_err(|e| AutopierError::Internal(format!("database setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| AutopierError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.busy_timeout(Duration::from_millis(5000))?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        tracing::debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying single-writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoint the WAL so all committed data lands in the main file.
    pub async fn checkpoint(&self) -> Result<(), AutopierError> {
        self.conn
            .call(|conn| {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Checkpoint and close the connection's background thread.
    pub async fn close(&self) -> Result<(), AutopierError> {
        self.checkpoint().await?;
        self.conn.clone().close().await.map_err(map_tr_err)?;
        tracing::debug!("database closed");
        Ok(())
    }
}

/// Map a tokio-rusqlite error into the workspace storage error.
pub(crate) fn map_tr_err(err: tokio_rusqlite::Error) -> AutopierError {
    AutopierError::Storage {
        source: Box::new(err),
    }
}
