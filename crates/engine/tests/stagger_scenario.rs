// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Staggered firing across a whole workflow, driven by a fake clock

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

mod common;

use af_adapters::{FakeWorkflowLoader, PromptBuilder, StepPromptBuilder};
use af_core::{plan_agents, AgentKey, Clock, FakeClock};
use af_engine::AgentEntry;
use common::{fake_scheduler, spawn_scheduler, wait_idle, workflow};
use std::time::Duration;

fn entries_for(id: &str, agents: &[&str]) -> Vec<AgentEntry> {
    let prompts = StepPromptBuilder::default();
    plan_agents(&workflow(id, agents, Some("claude-code")))
        .iter()
        .map(|plan| AgentEntry::from_plan(plan, prompts.build(id, &plan.key.agent_id)))
        .collect()
}

fn key(agent: &str) -> AgentKey {
    AgentKey::new("w", agent)
}

#[tokio::test]
async fn two_agents_fire_on_their_staggered_schedule() {
    let (handle, executor, runs, clock) = fake_scheduler();
    runs.set_active("w", 1);
    handle.register_agents(entries_for("w", &["a0", "a1"])).await.unwrap();

    // t=0: start ticks immediately, a0 fires, a1 is still inside its window
    handle.start().await.unwrap();
    wait_idle(&handle).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.iter().any(|a| a.key == key("a0") && a.last_fired.is_some()));
    assert!(snapshot.iter().any(|a| a.key == key("a1") && a.last_fired.is_none()));

    // t=60s: a1 opens, a0 waits for its interval
    clock.advance_ms(60_000);
    assert_eq!(handle.tick_now().await.unwrap().fired, vec![key("a1")]);
    wait_idle(&handle).await;

    // t=299.985s: nothing
    clock.advance_ms(239_985);
    assert!(handle.tick_now().await.unwrap().fired.is_empty());

    // t=300s: a0 again
    clock.advance_ms(15);
    assert_eq!(handle.tick_now().await.unwrap().fired, vec![key("a0")]);
    wait_idle(&handle).await;

    // t=360s: a1 again
    clock.advance_ms(60_000);
    assert_eq!(handle.tick_now().await.unwrap().fired, vec![key("a1")]);
    wait_idle(&handle).await;

    assert_eq!(executor.invocations(), vec!["w/a0", "w/a1", "w/a0", "w/a1"]);
}

#[tokio::test]
async fn coarse_ticks_fire_late_but_never_early() {
    let (handle, executor, runs, clock) = fake_scheduler();
    runs.set_active("w", 1);
    handle.register_agents(entries_for("w", &["a0", "a1"])).await.unwrap();
    handle.start().await.unwrap();
    wait_idle(&handle).await;

    // 15 s tick grid: 45 s is still early for a1, 75 s is the first tick past it
    clock.advance_ms(45_000);
    assert!(handle.tick_now().await.unwrap().fired.is_empty());
    clock.advance_ms(30_000);
    assert_eq!(handle.tick_now().await.unwrap().fired, vec![key("a1")]);
    wait_idle(&handle).await;

    assert_eq!(executor.calls().len(), 2);
}

#[tokio::test]
async fn rapid_ticks_keep_one_execution_per_agent() {
    let (handle, executor, runs, clock) = fake_scheduler();
    executor.hold();
    runs.set_active("w", 1);
    handle.register_agents(entries_for("w", &["a0"])).await.unwrap();

    handle.start().await.unwrap();
    for _ in 0..5 {
        clock.advance(Duration::from_secs(600));
        assert!(handle.tick_now().await.unwrap().fired.is_empty());
    }
    common::wait_until("first execution", || executor.calls().len() == 1).await;

    assert_eq!(executor.max_in_flight(), 1);
    executor.release_all();
    wait_idle(&handle).await;
}

#[tokio::test]
async fn discovered_workflow_fires_after_a_restart() {
    let loader = FakeWorkflowLoader::new();
    loader.insert(workflow("w", &["a0", "a1"], Some("claude-code")));
    let executor = af_adapters::FakeAgentExecutor::new();
    let runs = af_adapters::FakeRunStore::new();
    let clock = FakeClock::new();
    runs.set_active("w", 1);

    let handle = spawn_scheduler(executor.clone(), runs.clone(), loader, clock.clone());
    let started = clock.now();
    handle.start().await.unwrap();
    wait_idle(&handle).await;

    assert_eq!(executor.invocations(), vec!["w/a0"]);
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].last_fired, Some(started));

    // The run ends: nothing fires even once intervals pass
    runs.finish_run("w");
    clock.advance_ms(600_000);
    assert!(handle.tick_now().await.unwrap().fired.is_empty());
}
