// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use af_core::{AgentKey, AgentPlan};
use std::time::Duration;

fn spec(workflow: &str, agent: &str) -> CronJobSpec {
    let plan = AgentPlan {
        key: AgentKey::new(workflow, agent),
        anchor: Duration::ZERO,
        interval: Duration::from_secs(300),
        timeout: Duration::from_secs(1800),
    };
    CronJobSpec::for_agent(&plan, "prompt".to_string())
}

#[tokio::test]
async fn delete_by_prefix_only_touches_matching_jobs() {
    let gateway = FakeGateway::new();
    gateway.create_job(&spec("w1", "a")).await.unwrap();
    gateway.create_job(&spec("w1", "b")).await.unwrap();
    gateway.create_job(&spec("w10", "a")).await.unwrap();

    let deleted = gateway.delete_jobs_by_prefix("antfarm/w1/").await.unwrap();

    assert_eq!(deleted, 2);
    assert_eq!(gateway.job_names(), vec!["antfarm/w10/a"]);
    assert_eq!(gateway.delete_jobs_by_prefix("antfarm/w1/").await.unwrap(), 0);
}

#[tokio::test]
async fn failing_agent_is_rejected() {
    let gateway = FakeGateway::new();
    gateway.fail_on_agent("w/b");

    assert!(gateway.create_job(&spec("w", "a")).await.is_ok());
    assert!(matches!(
        gateway.create_job(&spec("w", "b")).await,
        Err(GatewayError::Rejected(_))
    ));
    assert_eq!(gateway.job_names(), vec!["antfarm/w/a"]);
}

#[tokio::test]
async fn unreachable_gateway_fails_every_call_but_records_it() {
    let gateway = FakeGateway::new();
    gateway.set_unreachable(true);

    assert!(gateway.check_reachable().await.is_err());
    assert!(gateway.list_jobs().await.is_err());
    assert_eq!(
        gateway.calls(),
        vec![GatewayCall::CheckReachable, GatewayCall::List]
    );
}
