// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stagger and interval arithmetic shared by both backends
//!
//! Agent `i` of a workflow is anchored `i * STAGGER_STEP` after the
//! schedule starts and then repeats every `interval`. The gateway receives
//! the same anchor/interval pair as an "every" schedule; the in-process
//! scheduler evaluates [`is_due`] on each tick.

use crate::agent::AgentKey;
use crate::workflow::WorkflowSpec;
use std::time::{Duration, Instant};

/// Spacing between consecutive agents' first firings
pub const STAGGER_STEP: Duration = Duration::from_secs(60);

/// Interval used when the workflow does not configure one
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Per-turn timeout handed to the gateway when an agent has none
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Schedule derived for one agent of a workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentPlan {
    pub key: AgentKey,
    pub anchor: Duration,
    pub interval: Duration,
    pub timeout: Duration,
}

/// Derive the staggered schedule of every agent in a workflow
pub fn plan_agents(workflow: &WorkflowSpec) -> Vec<AgentPlan> {
    let interval = workflow.interval().unwrap_or(DEFAULT_INTERVAL);

    workflow
        .agents
        .iter()
        .enumerate()
        .map(|(i, agent)| AgentPlan {
            key: AgentKey::new(&workflow.id, &agent.id),
            anchor: STAGGER_STEP * i as u32,
            interval,
            timeout: agent
                .timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_AGENT_TIMEOUT),
        })
        .collect()
}

/// Whether an agent may fire at `now`.
///
/// Nothing fires before `started_at + anchor`. An agent that never fired is
/// due as soon as its anchor has passed, so its first firing lands at
/// `started_at + anchor` and not one `interval` after it. Afterwards it is
/// due once `interval` has elapsed since the last firing began.
pub fn is_due(
    started_at: Instant,
    anchor: Duration,
    interval: Duration,
    last_fired: Option<Instant>,
    now: Instant,
) -> bool {
    let elapsed = now.saturating_duration_since(started_at);
    if elapsed < anchor {
        return false;
    }

    match last_fired {
        Some(fired) => now.saturating_duration_since(fired) >= interval,
        None => true,
    }
}

#[cfg(test)]
#[path = "stagger_tests.rs"]
mod tests;
