// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::agent::{AgentExecutor, ExecutionResult};
use crate::gateway::{CronGateway, CronJob, CronJobSpec, GatewayError};
use af_core::JOB_NAMESPACE;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any CronGateway
#[derive(Clone)]
pub struct TracedGateway<G> {
    inner: G,
}

impl<G> TracedGateway<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

fn in_namespace(name: &str) -> bool {
    name.strip_prefix(JOB_NAMESPACE)
        .is_some_and(|rest| rest.starts_with('/'))
}

#[async_trait]
impl<G: CronGateway> CronGateway for TracedGateway<G> {
    async fn create_job(&self, spec: &CronJobSpec) -> Result<(), GatewayError> {
        let span = tracing::info_span!("gateway.create_job", name = %spec.name);

        async {
            tracing::info!(agent_id = %spec.agent_id, "creating job");

            // Precondition: jobs we create must be removable by prefix later
            if !in_namespace(&spec.name) {
                tracing::error!("job name outside namespace");
                return Err(GatewayError::Rejected(format!(
                    "job name outside {} namespace: {}",
                    JOB_NAMESPACE, spec.name
                )));
            }

            let start = Instant::now();
            let result = self.inner.create_job(spec).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(()) => tracing::info!(elapsed_ms, "job created"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "create failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn list_jobs(&self) -> Result<Vec<CronJob>, GatewayError> {
        let result = self.inner.list_jobs().await;
        tracing::trace!(count = result.as_ref().map(|v| v.len()).ok(), "listed jobs");
        result
    }

    async fn delete_jobs_by_prefix(&self, prefix: &str) -> Result<usize, GatewayError> {
        let span = tracing::info_span!("gateway.delete_jobs", prefix);

        async {
            // Precondition: never sweep jobs we do not own
            if !in_namespace(prefix) {
                tracing::error!("prefix outside namespace");
                return Err(GatewayError::Rejected(format!(
                    "refusing to delete jobs outside {} namespace: {:?}",
                    JOB_NAMESPACE, prefix
                )));
            }

            let start = Instant::now();
            let result = self.inner.delete_jobs_by_prefix(prefix).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(deleted) => tracing::info!(deleted, elapsed_ms, "jobs deleted"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn check_reachable(&self) -> Result<(), GatewayError> {
        let result = self.inner.check_reachable().await;
        match &result {
            Ok(()) => tracing::debug!("gateway reachable"),
            Err(e) => tracing::warn!(error = %e, "gateway unreachable"),
        }
        result
    }
}

/// Wrapper that adds tracing to any AgentExecutor
#[derive(Clone)]
pub struct TracedAgentExecutor<X> {
    inner: X,
}

impl<X> TracedAgentExecutor<X> {
    pub fn new(inner: X) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<X: AgentExecutor> AgentExecutor for TracedAgentExecutor<X> {
    async fn locate(&self) -> Option<PathBuf> {
        let result = self.inner.locate().await;
        tracing::trace!(found = result.is_some(), "located agent binary");
        result
    }

    async fn execute(&self, invocation_id: &str, prompt: &str) -> ExecutionResult {
        let span = tracing::info_span!("agent.execute", invocation_id);

        async {
            tracing::info!(prompt_len = prompt.len(), "starting");

            let start = Instant::now();
            let result = self.inner.execute(invocation_id, prompt).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            if result.ok {
                tracing::info!(elapsed_ms, "turn completed");
            } else {
                tracing::warn!(
                    elapsed_ms,
                    exit_code = ?result.exit_code,
                    timed_out = result.timed_out,
                    "turn failed"
                );
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
