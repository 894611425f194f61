// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run-scoped schedule lifecycle
//!
//! Schedules exist while at least one run of a workflow is active. The
//! first run to start creates them; the last run to finish removes them.

use crate::backend::DispatchBackend;
use crate::error::DispatchError;
use af_adapters::RunStore;
use af_core::{resolve_mode, ExecutorMode, WorkflowSpec};

/// Result of [`LifecycleController::ensure_schedules_for_run`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// Another run of the workflow is already served
    AlreadyScheduled { mode: ExecutorMode },
    Created { mode: ExecutorMode, agents: usize },
}

/// Result of [`LifecycleController::teardown_schedules_if_idle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// Runs are still active, schedules kept
    StillActive { runs: usize },
    /// The run store could not be read, schedules kept
    StoreUnavailable,
    Removed,
}

/// Creates and removes schedules around workflow runs
pub struct LifecycleController<I, G, R> {
    in_process: I,
    gateway: G,
    runs: R,
    mode_override: Option<String>,
}

impl<I, G, R> LifecycleController<I, G, R>
where
    I: DispatchBackend,
    G: DispatchBackend,
    R: RunStore,
{
    pub fn new(in_process: I, gateway: G, runs: R, mode_override: Option<String>) -> Self {
        Self {
            in_process,
            gateway,
            runs,
            mode_override,
        }
    }

    pub fn mode_for(&self, workflow: &WorkflowSpec) -> ExecutorMode {
        resolve_mode(workflow, self.mode_override.as_deref())
    }

    fn backend(&self, mode: ExecutorMode) -> &dyn DispatchBackend {
        match mode {
            ExecutorMode::ClaudeCode => &self.in_process,
            ExecutorMode::Gateway => &self.gateway,
        }
    }

    /// Make sure the workflow's agents are scheduled for a starting run.
    ///
    /// No-op when the resolved backend already holds schedules for the
    /// workflow. Otherwise the backend is pre-flighted before anything is
    /// created.
    pub async fn ensure_schedules_for_run(
        &self,
        workflow: &WorkflowSpec,
    ) -> Result<EnsureOutcome, DispatchError> {
        let mode = self.mode_for(workflow);
        let backend = self.backend(mode);

        if backend.exists(&workflow.id).await? {
            tracing::debug!(workflow_id = %workflow.id, %mode, "schedules already exist");
            return Ok(EnsureOutcome::AlreadyScheduled { mode });
        }

        backend.preflight().await?;
        let agents = backend.ensure(workflow).await?;

        tracing::info!(workflow_id = %workflow.id, %mode, agents, "schedules created");
        Ok(EnsureOutcome::Created { mode, agents })
    }

    /// Remove the workflow's schedules once no run of it is active
    pub async fn teardown_schedules_if_idle(
        &self,
        workflow_id: &str,
    ) -> Result<TeardownOutcome, DispatchError> {
        match self.runs.count_active_runs(workflow_id).await {
            Ok(0) => {}
            Ok(runs) => {
                tracing::debug!(workflow_id, runs, "runs still active, keeping schedules");
                return Ok(TeardownOutcome::StillActive { runs });
            }
            Err(e) => {
                tracing::warn!(
                    workflow_id,
                    error = %e,
                    "cannot count active runs, keeping schedules"
                );
                return Ok(TeardownOutcome::StoreUnavailable);
            }
        }

        self.remove_schedules(workflow_id).await?;
        Ok(TeardownOutcome::Removed)
    }

    /// Remove the workflow's schedules from both backends regardless of
    /// active runs. Both backends are always attempted; the first failure
    /// is returned.
    pub async fn remove_schedules(&self, workflow_id: &str) -> Result<(), DispatchError> {
        let mut first_error = None;

        let backends = [
            self.backend(ExecutorMode::ClaudeCode),
            self.backend(ExecutorMode::Gateway),
        ];
        for backend in backends {
            if let Err(e) = backend.teardown(workflow_id).await {
                tracing::warn!(workflow_id, mode = %backend.mode(), error = %e, "teardown failed");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::info!(workflow_id, "schedules removed");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
