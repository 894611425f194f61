// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch backends
//!
//! Both backends turn the same workflow into staggered agent schedules.
//! The in-process backend registers them with the local scheduler; the
//! gateway backend creates one remote cron job per agent.

use crate::error::DispatchError;
use crate::scheduler::{AgentEntry, SchedulerHandle};
use af_adapters::{AgentExecutor, CronGateway, CronJobSpec, PromptBuilder};
use af_core::{job_prefix, plan_agents, ExecutorMode, WorkflowSpec};
use async_trait::async_trait;

const CLAUDE_MISSING: &str = "Claude Code CLI not found. Install it or set ANTFARM_CLAUDE_PATH \
     (unset ANTFARM_EXECUTOR to dispatch through the gateway instead)";

/// One way of getting agents fired on schedule
#[async_trait]
pub trait DispatchBackend: Send + Sync {
    fn mode(&self) -> ExecutorMode;

    /// Whether schedules for the workflow are already in place
    async fn exists(&self, workflow_id: &str) -> Result<bool, DispatchError>;

    /// Fail with an actionable message if the backend cannot run agents
    async fn preflight(&self) -> Result<(), DispatchError>;

    /// Create schedules for every agent of the workflow. Returns the number
    /// of agents scheduled.
    async fn ensure(&self, workflow: &WorkflowSpec) -> Result<usize, DispatchError>;

    /// Remove all schedules of the workflow. Safe when none exist.
    async fn teardown(&self, workflow_id: &str) -> Result<(), DispatchError>;
}

/// Agents fired by the local scheduler through the agent CLI
#[derive(Clone)]
pub struct InProcessBackend<X, P> {
    scheduler: SchedulerHandle,
    executor: X,
    prompts: P,
}

impl<X, P> InProcessBackend<X, P> {
    pub fn new(scheduler: SchedulerHandle, executor: X, prompts: P) -> Self {
        Self {
            scheduler,
            executor,
            prompts,
        }
    }
}

#[async_trait]
impl<X: AgentExecutor, P: PromptBuilder> DispatchBackend for InProcessBackend<X, P> {
    fn mode(&self) -> ExecutorMode {
        ExecutorMode::ClaudeCode
    }

    async fn exists(&self, workflow_id: &str) -> Result<bool, DispatchError> {
        Ok(self.scheduler.has_registered_agents(workflow_id).await?)
    }

    async fn preflight(&self) -> Result<(), DispatchError> {
        match self.executor.locate().await {
            Some(_) => Ok(()),
            None => Err(DispatchError::BackendUnreachable {
                mode: self.mode(),
                message: CLAUDE_MISSING.to_string(),
            }),
        }
    }

    async fn ensure(&self, workflow: &WorkflowSpec) -> Result<usize, DispatchError> {
        let entries: Vec<AgentEntry> = plan_agents(workflow)
            .iter()
            .map(|plan| {
                let prompt = self.prompts.build(&workflow.id, &plan.key.agent_id);
                AgentEntry::from_plan(plan, prompt)
            })
            .collect();
        let count = entries.len();

        self.scheduler.register_agents(entries).await?;
        self.scheduler.start().await?;
        Ok(count)
    }

    async fn teardown(&self, workflow_id: &str) -> Result<(), DispatchError> {
        self.scheduler.unregister_agents(workflow_id).await?;
        Ok(())
    }
}

/// Agents fired by remote cron jobs on the gateway
#[derive(Clone)]
pub struct GatewayBackend<G, P> {
    gateway: G,
    prompts: P,
}

impl<G, P> GatewayBackend<G, P> {
    pub fn new(gateway: G, prompts: P) -> Self {
        Self { gateway, prompts }
    }
}

#[async_trait]
impl<G: CronGateway, P: PromptBuilder> DispatchBackend for GatewayBackend<G, P> {
    fn mode(&self) -> ExecutorMode {
        ExecutorMode::Gateway
    }

    async fn exists(&self, workflow_id: &str) -> Result<bool, DispatchError> {
        let prefix = job_prefix(workflow_id);
        match self.gateway.list_jobs().await {
            Ok(jobs) => Ok(jobs.iter().any(|job| job.name.starts_with(&prefix))),
            Err(e) => {
                // Unknown counts as absent; preflight reports the real problem
                tracing::warn!(workflow_id, error = %e, "could not list cron jobs");
                Ok(false)
            }
        }
    }

    async fn preflight(&self) -> Result<(), DispatchError> {
        self.gateway
            .check_reachable()
            .await
            .map_err(|e| DispatchError::BackendUnreachable {
                mode: self.mode(),
                message: e.to_string(),
            })
    }

    async fn ensure(&self, workflow: &WorkflowSpec) -> Result<usize, DispatchError> {
        let plans = plan_agents(workflow);

        // No rollback on failure; teardown sweeps the prefix
        for plan in &plans {
            let prompt = self.prompts.build(&workflow.id, &plan.key.agent_id);
            let spec = CronJobSpec::for_agent(plan, prompt);
            self.gateway
                .create_job(&spec)
                .await
                .map_err(|source| DispatchError::AgentSetup {
                    agent: plan.key.agent_id.clone(),
                    source,
                })?;
        }
        Ok(plans.len())
    }

    async fn teardown(&self, workflow_id: &str) -> Result<(), DispatchError> {
        self.gateway
            .delete_jobs_by_prefix(&job_prefix(workflow_id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
