// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::workflow::{AgentSpec, CronSpec};
use yare::parameterized;

fn workflow(executor: Option<&str>) -> WorkflowSpec {
    WorkflowSpec {
        id: "feature-dev".to_string(),
        agents: vec![AgentSpec::new("planner")],
        cron: Some(CronSpec {
            executor: executor.map(str::to_string),
            interval_ms: None,
        }),
    }
}

#[parameterized(
    default_is_gateway = { None, None, ExecutorMode::Gateway },
    env_selects_claude = { None, Some("claude-code"), ExecutorMode::ClaudeCode },
    env_selects_gateway = { None, Some("openclaw"), ExecutorMode::Gateway },
    env_is_trimmed = { None, Some("  claude-code\n"), ExecutorMode::ClaudeCode },
    workflow_beats_env = { Some("openclaw"), Some("claude-code"), ExecutorMode::Gateway },
    workflow_selects_claude = { Some("claude-code"), None, ExecutorMode::ClaudeCode },
    unknown_workflow_falls_to_env = { Some("docker"), Some("claude-code"), ExecutorMode::ClaudeCode },
    unknown_everywhere_is_default = { Some("docker"), Some("kubernetes"), ExecutorMode::Gateway },
    empty_env_is_default = { None, Some(""), ExecutorMode::Gateway },
)]
fn resolves_with_precedence(from_workflow: Option<&str>, env: Option<&str>, expected: ExecutorMode) {
    assert_eq!(resolve_mode(&workflow(from_workflow), env), expected);
}

#[test]
fn missing_cron_section_uses_env() {
    let mut wf = workflow(None);
    wf.cron = None;
    assert_eq!(resolve_mode(&wf, Some("claude-code")), ExecutorMode::ClaudeCode);
}

#[test]
fn mode_tags_round_trip_through_display() {
    for mode in [ExecutorMode::Gateway, ExecutorMode::ClaudeCode] {
        assert_eq!(mode.to_string().parse::<ExecutorMode>(), Ok(mode));
    }
}
