// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use af_adapters::{
    FakeAgentExecutor, FakeGateway, FakeRunStore, FakeWorkflowLoader, StepPromptBuilder,
};
use af_core::{AgentSpec, CronSpec, FakeClock, WorkflowSpec};
use af_engine::{
    AgentScheduler, GatewayBackend, InProcessBackend, SchedulerConfig, SchedulerDeps,
    SchedulerHandle,
};
use std::time::Duration;

type TestControls = Controls<
    InProcessBackend<FakeAgentExecutor, StepPromptBuilder>,
    GatewayBackend<FakeGateway, StepPromptBuilder>,
    FakeRunStore,
    FakeWorkflowLoader,
>;

struct Harness {
    controls: TestControls,
    scheduler: SchedulerHandle,
    gateway: FakeGateway,
    runs: FakeRunStore,
    workflows: FakeWorkflowLoader,
}

fn harness() -> Harness {
    let executor = FakeAgentExecutor::new();
    let gateway = FakeGateway::new();
    let runs = FakeRunStore::new();
    let workflows = FakeWorkflowLoader::new();
    let prompts = StepPromptBuilder::default();

    let scheduler = AgentScheduler::spawn(
        SchedulerDeps {
            executor: executor.clone(),
            runs: runs.clone(),
            workflows: workflows.clone(),
            prompts: prompts.clone(),
        },
        SchedulerConfig {
            tick_interval: Duration::from_secs(3600),
            mode_override: None,
        },
        FakeClock::new(),
    );

    let lifecycle = LifecycleController::new(
        InProcessBackend::new(scheduler.clone(), executor, prompts.clone()),
        GatewayBackend::new(gateway.clone(), prompts),
        runs.clone(),
        None,
    );

    Harness {
        controls: Controls::new(lifecycle, workflows.clone()),
        scheduler,
        gateway,
        runs,
        workflows,
    }
}

fn workflow(id: &str, executor: &str) -> WorkflowSpec {
    WorkflowSpec {
        id: id.to_string(),
        agents: vec![AgentSpec::new("planner"), AgentSpec::new("developer")],
        cron: Some(CronSpec {
            executor: Some(executor.to_string()),
            interval_ms: None,
        }),
    }
}

#[tokio::test]
async fn ensure_registers_in_process_agents_once() {
    let h = harness();
    h.workflows.insert(workflow("w", "claude-code"));

    let first = h.controls.ensure("w").await;
    let second = h.controls.ensure("w").await;

    assert_eq!(
        first,
        Response::Ensured {
            mode: "claude-code".to_string(),
            created: Some(2),
        }
    );
    assert_eq!(
        second,
        Response::Ensured {
            mode: "claude-code".to_string(),
            created: None,
        }
    );
    assert_eq!(h.scheduler.snapshot().await.unwrap().len(), 2);
    assert!(h.scheduler.is_running().await.unwrap());
}

#[tokio::test]
async fn ensure_creates_gateway_jobs() {
    let h = harness();
    h.workflows.insert(workflow("w", "openclaw"));

    let response = h.controls.ensure("w").await;

    assert_eq!(
        response,
        Response::Ensured {
            mode: "openclaw".to_string(),
            created: Some(2),
        }
    );
    assert_eq!(
        h.gateway.job_names(),
        vec!["antfarm/w/planner", "antfarm/w/developer"]
    );
}

#[tokio::test]
async fn ensure_unknown_workflow_is_an_error() {
    let h = harness();

    let response = h.controls.ensure("missing").await;

    assert_eq!(
        response,
        Response::Error {
            message: "workflow not installed: missing".to_string(),
        }
    );
}

#[tokio::test]
async fn ensure_reports_an_unreachable_gateway() {
    let h = harness();
    h.workflows.insert(workflow("w", "openclaw"));
    h.gateway.set_unreachable(true);

    let response = h.controls.ensure("w").await;

    assert!(matches!(response, Response::Error { .. }));
    assert!(h.gateway.job_names().is_empty());
}

#[tokio::test]
async fn teardown_keeps_schedules_while_runs_remain() {
    let h = harness();
    h.workflows.insert(workflow("w", "claude-code"));
    h.controls.ensure("w").await;
    h.runs.set_active("w", 1);

    let response = h.controls.teardown_if_idle("w").await;

    assert_eq!(
        response,
        Response::Teardown {
            removed: false,
            reason: Some("1 run(s) still active".to_string()),
        }
    );
    assert!(h.scheduler.has_registered_agents("w").await.unwrap());
}

#[tokio::test]
async fn teardown_removes_schedules_when_idle() {
    let h = harness();
    h.workflows.insert(workflow("w", "claude-code"));
    h.controls.ensure("w").await;

    let response = h.controls.teardown_if_idle("w").await;

    assert_eq!(
        response,
        Response::Teardown {
            removed: true,
            reason: None,
        }
    );
    assert!(!h.scheduler.has_registered_agents("w").await.unwrap());
}

#[tokio::test]
async fn teardown_with_unavailable_store_keeps_schedules() {
    let h = harness();
    h.workflows.insert(workflow("w", "claude-code"));
    h.controls.ensure("w").await;
    h.runs.set_unavailable(true);

    let response = h.controls.teardown_if_idle("w").await;

    assert_eq!(
        response,
        Response::Teardown {
            removed: false,
            reason: Some("run database unavailable".to_string()),
        }
    );
    assert!(h.scheduler.has_registered_agents("w").await.unwrap());
}

#[tokio::test]
async fn remove_clears_both_backends_despite_active_runs() {
    let h = harness();
    h.workflows.insert(workflow("w", "openclaw"));
    h.controls.ensure("w").await;
    h.runs.set_active("w", 3);

    assert_eq!(h.controls.remove("w").await, Response::Ok);
    assert!(h.gateway.job_names().is_empty());
    assert!(!h.scheduler.has_registered_agents("w").await.unwrap());
}
