// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed run store
//!
//! Reads the `runs(workflow_id, status)` table of the antfarm database.
//! Each query opens a short-lived read-only connection on the blocking
//! pool, so a locked or missing database never stalls the scheduler.

use super::{RunStore, RunStoreError, RUNNING_STATUS};
use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct SqliteRunStore {
    path: Arc<PathBuf>,
}

impl SqliteRunStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn query<T, F>(&self, f: F) -> Result<T, RunStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let path = Arc::clone(&self.path);
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(
                path.as_path(),
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| RunStoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
            conn.busy_timeout(BUSY_TIMEOUT)
                .map_err(|e| RunStoreError::Unavailable(e.to_string()))?;
            f(&conn).map_err(|e| RunStoreError::Query(e.to_string()))
        })
        .await
        .map_err(|e| RunStoreError::Unavailable(e.to_string()))?
    }
}

#[async_trait]
impl RunStore for SqliteRunStore {
    async fn count_active_runs(&self, workflow_id: &str) -> Result<usize, RunStoreError> {
        let workflow_id = workflow_id.to_string();
        let count: i64 = self
            .query(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM runs WHERE workflow_id = ?1 AND status = ?2",
                    (&workflow_id, RUNNING_STATUS),
                    |row| row.get(0),
                )
            })
            .await?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn list_active_workflow_ids(&self) -> Result<Vec<String>, RunStoreError> {
        self.query(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT workflow_id FROM runs WHERE status = ?1 ORDER BY workflow_id",
            )?;
            let ids = stmt
                .query_map([RUNNING_STATUS], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(ids)
        })
        .await
    }
}

#[cfg(test)]
#[path = "sqlite_tests.rs"]
mod tests;
