// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use af_adapters::{
    AgentExecutor, FakeAgentExecutor, FakeRunStore, FakeWorkflowLoader, StepPromptBuilder,
    WorkflowLoader,
};
use af_core::{AgentSpec, CronSpec, FakeClock, WorkflowSpec};
use af_engine::{AgentScheduler, SchedulerConfig, SchedulerDeps, SchedulerHandle};
use std::time::Duration;

/// Tick period long enough that only explicit ticks happen during a test
pub const MANUAL_TICKS: Duration = Duration::from_secs(3600);

pub fn workflow(id: &str, agents: &[&str], executor: Option<&str>) -> WorkflowSpec {
    WorkflowSpec {
        id: id.to_string(),
        agents: agents.iter().map(|a| AgentSpec::new(*a)).collect(),
        cron: Some(CronSpec {
            executor: executor.map(str::to_string),
            interval_ms: Some(300_000),
        }),
    }
}

pub fn spawn_scheduler<X, L>(
    executor: X,
    runs: FakeRunStore,
    workflows: L,
    clock: FakeClock,
) -> SchedulerHandle
where
    X: AgentExecutor,
    L: WorkflowLoader,
{
    AgentScheduler::spawn(
        SchedulerDeps {
            executor,
            runs,
            workflows,
            prompts: StepPromptBuilder::default(),
        },
        SchedulerConfig {
            tick_interval: MANUAL_TICKS,
            mode_override: None,
        },
        clock,
    )
}

/// Scheduler over fakes only
pub fn fake_scheduler() -> (SchedulerHandle, FakeAgentExecutor, FakeRunStore, FakeClock) {
    let executor = FakeAgentExecutor::new();
    let runs = FakeRunStore::new();
    let clock = FakeClock::new();
    let handle = spawn_scheduler(
        executor.clone(),
        runs.clone(),
        FakeWorkflowLoader::new(),
        clock.clone(),
    );
    (handle, executor, runs, clock)
}

pub async fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    for _ in 0..1000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {}", what);
}

pub async fn wait_idle(handle: &SchedulerHandle) {
    for _ in 0..1000 {
        if handle.snapshot().await.unwrap().iter().all(|a| !a.running) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("agents still running");
}
