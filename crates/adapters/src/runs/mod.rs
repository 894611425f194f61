// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only access to the workflow run store

mod sqlite;

pub use sqlite::SqliteRunStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeRunStore;

use async_trait::async_trait;
use thiserror::Error;

/// Status value of a run that is still in progress
pub const RUNNING_STATUS: &str = "running";

/// Errors from run store queries
#[derive(Debug, Error)]
pub enum RunStoreError {
    #[error("run store unavailable: {0}")]
    Unavailable(String),
    #[error("run store query failed: {0}")]
    Query(String),
}

/// Queries over workflow runs. Runs are owned elsewhere; nothing here
/// mutates them.
#[async_trait]
pub trait RunStore: Clone + Send + Sync + 'static {
    /// Number of runs of `workflow_id` whose status is `running`
    async fn count_active_runs(&self, workflow_id: &str) -> Result<usize, RunStoreError>;

    /// Distinct workflow ids with at least one `running` run
    async fn list_active_workflow_ids(&self) -> Result<Vec<String>, RunStoreError>;
}
