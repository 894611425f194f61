// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake workflow loader for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LoadError, WorkflowLoader};
use af_core::WorkflowSpec;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory workflow definitions keyed by id
#[derive(Clone, Default)]
pub struct FakeWorkflowLoader {
    workflows: Arc<Mutex<HashMap<String, WorkflowSpec>>>,
    loads: Arc<Mutex<Vec<String>>>,
}

impl FakeWorkflowLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, workflow: WorkflowSpec) {
        self.workflows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(workflow.id.clone(), workflow);
    }

    /// Ids requested so far, in order
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl WorkflowLoader for FakeWorkflowLoader {
    async fn load(&self, workflow_id: &str) -> Result<WorkflowSpec, LoadError> {
        self.loads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(workflow_id.to_string());

        self.workflows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(workflow_id.to_string()))
    }
}
