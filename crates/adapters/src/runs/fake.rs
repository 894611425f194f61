// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake run store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{RunStore, RunStoreError};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory run counts per workflow
#[derive(Clone, Default)]
pub struct FakeRunStore {
    active: Arc<Mutex<BTreeMap<String, usize>>>,
    unavailable: Arc<AtomicBool>,
    queries: Arc<AtomicUsize>,
}

impl FakeRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of running runs for a workflow
    pub fn set_active(&self, workflow_id: &str, count: usize) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if count == 0 {
            active.remove(workflow_id);
        } else {
            active.insert(workflow_id.to_string(), count);
        }
    }

    pub fn start_run(&self, workflow_id: &str) {
        let count = self.active_count(workflow_id);
        self.set_active(workflow_id, count + 1);
    }

    pub fn finish_run(&self, workflow_id: &str) {
        let count = self.active_count(workflow_id);
        self.set_active(workflow_id, count.saturating_sub(1));
    }

    /// Make every query fail as if the database were gone
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of queries served (including failed ones)
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn active_count(&self, workflow_id: &str) -> usize {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(workflow_id)
            .copied()
            .unwrap_or(0)
    }

    fn check(&self) -> Result<(), RunStoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RunStoreError::Unavailable("fake store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RunStore for FakeRunStore {
    async fn count_active_runs(&self, workflow_id: &str) -> Result<usize, RunStoreError> {
        self.check()?;
        Ok(self.active_count(workflow_id))
    }

    async fn list_active_workflow_ids(&self) -> Result<Vec<String>, RunStoreError> {
        self.check()?;
        Ok(self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect())
    }
}
