// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake agent executor for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AgentExecutor, ExecutionResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Recorded executor call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorCall {
    pub invocation_id: String,
    pub prompt: String,
}

/// Fake executor that records turns and can hold them in flight
#[derive(Clone)]
pub struct FakeAgentExecutor {
    calls: Arc<Mutex<Vec<ExecutorCall>>>,
    result: Arc<Mutex<ExecutionResult>>,
    available: Arc<AtomicBool>,
    held: Arc<AtomicBool>,
    gate: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for FakeAgentExecutor {
    fn default() -> Self {
        Self {
            calls: Arc::default(),
            result: Arc::new(Mutex::new(ExecutionResult::exited(
                Some(0),
                "HEARTBEAT_OK".to_string(),
                false,
            ))),
            available: Arc::new(AtomicBool::new(true)),
            held: Arc::default(),
            gate: Arc::new(Semaphore::new(0)),
            in_flight: Arc::default(),
            max_in_flight: Arc::default(),
        }
    }
}

impl FakeAgentExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<ExecutorCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Invocation ids in call order
    pub fn invocations(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.invocation_id).collect()
    }

    /// Result returned by every subsequent turn
    pub fn set_result(&self, result: ExecutionResult) {
        *self.result.lock().unwrap_or_else(|e| e.into_inner()) = result;
    }

    /// Whether `locate` finds the tool
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Keep subsequent turns in flight until [`release`](Self::release)
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let `n` held turns complete
    pub fn release(&self, n: usize) {
        self.gate.add_permits(n);
    }

    /// Stop holding and let every waiting turn complete
    pub fn release_all(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.gate.add_permits(self.in_flight());
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent turns observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentExecutor for FakeAgentExecutor {
    async fn locate(&self) -> Option<PathBuf> {
        self.available
            .load(Ordering::SeqCst)
            .then(|| PathBuf::from("/fake/bin/claude"))
    }

    async fn execute(&self, invocation_id: &str, prompt: &str) -> ExecutionResult {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ExecutorCall {
                invocation_id: invocation_id.to_string(),
                prompt: prompt.to_string(),
            });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if self.held.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if !self.available.load(Ordering::SeqCst) {
            return ExecutionResult::not_found("claude");
        }
        self.result
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
