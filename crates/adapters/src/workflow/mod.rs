// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow definition loading

mod fs;

pub use fs::{FsWorkflowLoader, WORKFLOW_FILE};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWorkflowLoader;

use af_core::{ParseError, WorkflowSpec};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading a workflow definition
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("workflow not installed: {0}")]
    NotFound(String),
    #[error("invalid workflow id: {0:?}")]
    InvalidId(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error("workflow in {dir} declares id {found:?}")]
    IdMismatch { dir: String, found: String },
}

/// Loads installed workflow definitions by id
#[async_trait]
pub trait WorkflowLoader: Clone + Send + Sync + 'static {
    async fn load(&self, workflow_id: &str) -> Result<WorkflowSpec, LoadError>;
}
