// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Loads `<root>/<workflow_id>/workflow.toml`

use super::{LoadError, WorkflowLoader};
use af_core::{parse_workflow, WorkflowSpec};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Definition file inside each workflow directory
pub const WORKFLOW_FILE: &str = "workflow.toml";

#[derive(Clone, Debug)]
pub struct FsWorkflowLoader {
    root: PathBuf,
}

impl FsWorkflowLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding an installed workflow
    pub fn workflow_dir(&self, workflow_id: &str) -> Result<PathBuf, LoadError> {
        let valid = !workflow_id.is_empty()
            && workflow_id != "."
            && workflow_id != ".."
            && !workflow_id.contains(['/', '\\']);
        if !valid {
            return Err(LoadError::InvalidId(workflow_id.to_string()));
        }
        Ok(self.root.join(workflow_id))
    }
}

#[async_trait]
impl WorkflowLoader for FsWorkflowLoader {
    async fn load(&self, workflow_id: &str) -> Result<WorkflowSpec, LoadError> {
        let path = self.workflow_dir(workflow_id)?.join(WORKFLOW_FILE);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(workflow_id.to_string()));
            }
            Err(source) => return Err(LoadError::Io { path, source }),
        };

        let workflow = parse_workflow(&content).map_err(|source| LoadError::Parse {
            path: path.clone(),
            source,
        })?;

        if workflow.id != workflow_id {
            return Err(LoadError::IdMismatch {
                dir: workflow_id.to_string(),
                found: workflow.id,
            });
        }

        tracing::debug!(
            workflow_id,
            agents = workflow.agents.len(),
            path = %path.display(),
            "loaded workflow"
        );
        Ok(workflow)
    }
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
