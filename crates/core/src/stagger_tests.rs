// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::workflow::{AgentSpec, CronSpec};
use proptest::prelude::*;

const MIN: Duration = Duration::from_secs(60);

fn two_agent_workflow(interval_ms: Option<u64>) -> WorkflowSpec {
    WorkflowSpec {
        id: "w".to_string(),
        agents: vec![
            AgentSpec::new("a0"),
            AgentSpec {
                id: "a1".to_string(),
                timeout_seconds: Some(120),
            },
        ],
        cron: Some(CronSpec {
            executor: None,
            interval_ms,
        }),
    }
}

#[test]
fn plan_staggers_agents_by_index() {
    let plans = plan_agents(&two_agent_workflow(None));

    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0].key, AgentKey::new("w", "a0"));
    assert_eq!(plans[0].anchor, Duration::ZERO);
    assert_eq!(plans[1].anchor, MIN);
    assert!(plans.iter().all(|p| p.interval == DEFAULT_INTERVAL));
}

#[test]
fn plan_uses_configured_interval_and_timeouts() {
    let plans = plan_agents(&two_agent_workflow(Some(90_000)));

    assert_eq!(plans[0].interval, Duration::from_millis(90_000));
    assert_eq!(plans[0].timeout, DEFAULT_AGENT_TIMEOUT);
    assert_eq!(plans[1].timeout, Duration::from_secs(120));
}

#[test]
fn anchored_agent_waits_then_repeats_on_interval() {
    let t = Instant::now();
    let anchor = MIN;
    let interval = 5 * MIN;

    assert!(!is_due(t, anchor, interval, None, t));
    assert!(!is_due(t, anchor, interval, None, t + Duration::from_secs(59)));
    assert!(is_due(t, anchor, interval, None, t + MIN));

    let fired = t + MIN;
    assert!(!is_due(t, anchor, interval, Some(fired), fired + 4 * MIN));
    assert!(is_due(t, anchor, interval, Some(fired), fired + 5 * MIN));
}

#[test]
fn first_firing_lands_on_the_anchor_not_an_interval_later() {
    let t = Instant::now();
    let anchor = 2 * MIN;
    let interval = 10 * MIN;

    // Due at the anchor, well before anchor + interval
    assert!(is_due(t, anchor, interval, None, t + anchor));
    assert!(is_due(t, anchor, interval, None, t + anchor + MIN));
}

#[test]
fn zero_anchor_is_due_immediately() {
    let t = Instant::now();
    assert!(is_due(t, Duration::ZERO, 5 * MIN, None, t));
}

proptest! {
    #[test]
    fn never_due_before_anchor(anchor_s in 0u64..3_600, offset_s in 0u64..3_600, interval_s in 1u64..3_600) {
        let t = Instant::now();
        let anchor = Duration::from_secs(anchor_s);
        let now = t + Duration::from_secs(offset_s);
        if now < t + anchor {
            prop_assert!(!is_due(t, anchor, Duration::from_secs(interval_s), None, now));
        }
    }

    #[test]
    fn never_due_within_interval_of_last_fire(gap_s in 0u64..300, interval_s in 1u64..3_600) {
        let t = Instant::now();
        let fired = t + MIN;
        let now = fired + Duration::from_secs(gap_s);
        let interval = Duration::from_secs(interval_s);
        prop_assert_eq!(is_due(t, Duration::ZERO, interval, Some(fired), now), gap_s >= interval_s);
    }
}
