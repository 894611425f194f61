// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake cron gateway for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CronGateway, CronJob, CronJobSpec, GatewayError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Recorded gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Create { name: String },
    List,
    DeleteByPrefix { prefix: String },
    CheckReachable,
}

#[derive(Default)]
struct FakeGatewayState {
    jobs: Vec<CronJobSpec>,
    calls: Vec<GatewayCall>,
    unreachable: bool,
    fail_agent: Option<String>,
}

/// In-memory gateway holding created jobs
#[derive(Clone, Default)]
pub struct FakeGateway {
    inner: Arc<Mutex<FakeGatewayState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Specs of every job currently held
    pub fn jobs(&self) -> Vec<CronJobSpec> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .jobs
            .clone()
    }

    pub fn job_names(&self) -> Vec<String> {
        self.jobs().into_iter().map(|j| j.name).collect()
    }

    /// Make every call fail as unreachable
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).unreachable = unreachable;
    }

    /// Reject creation of the job for `agent_id` (`workflow/agent`)
    pub fn fail_on_agent(&self, agent_id: &str) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).fail_agent = Some(agent_id.to_string());
    }

    fn record(&self, call: GatewayCall) -> Result<(), GatewayError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.calls.push(call);
        if inner.unreachable {
            return Err(GatewayError::Unreachable {
                url: "fake://gateway".to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CronGateway for FakeGateway {
    async fn create_job(&self, spec: &CronJobSpec) -> Result<(), GatewayError> {
        self.record(GatewayCall::Create {
            name: spec.name.clone(),
        })?;

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner.fail_agent.as_deref() == Some(spec.agent_id.as_str()) {
            return Err(GatewayError::Rejected(format!(
                "agent {} is not configured",
                spec.agent_id
            )));
        }
        inner.jobs.push(spec.clone());
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<CronJob>, GatewayError> {
        self.record(GatewayCall::List)?;

        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner
            .jobs
            .iter()
            .map(|job| CronJob {
                id: job.name.clone(),
                name: job.name.clone(),
            })
            .collect())
    }

    async fn delete_jobs_by_prefix(&self, prefix: &str) -> Result<usize, GatewayError> {
        self.record(GatewayCall::DeleteByPrefix {
            prefix: prefix.to_string(),
        })?;

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let before = inner.jobs.len();
        inner.jobs.retain(|job| !job.name.starts_with(prefix));
        Ok(before - inner.jobs.len())
    }

    async fn check_reachable(&self) -> Result<(), GatewayError> {
        self.record(GatewayCall::CheckReachable)
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
