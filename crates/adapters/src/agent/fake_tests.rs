// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn records_calls_and_returns_configured_result() {
    let executor = FakeAgentExecutor::new();
    executor.set_result(ExecutionResult::exited(Some(2), "nope".to_string(), false));

    let result = executor.execute("w/a", "prompt").await;

    assert_eq!(result.exit_code, Some(2));
    assert_eq!(
        executor.calls(),
        vec![ExecutorCall {
            invocation_id: "w/a".to_string(),
            prompt: "prompt".to_string(),
        }]
    );
}

#[tokio::test]
async fn held_turns_wait_for_release() {
    let executor = FakeAgentExecutor::new();
    executor.hold();

    let task = tokio::spawn({
        let executor = executor.clone();
        async move { executor.execute("w/a", "").await }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(executor.in_flight(), 1);
    assert!(!task.is_finished());

    executor.release(1);
    let result = task.await.unwrap();
    assert!(result.ok);
    assert_eq!(executor.in_flight(), 0);
    assert_eq!(executor.max_in_flight(), 1);
}

#[tokio::test]
async fn unavailable_tool_is_not_located() {
    let executor = FakeAgentExecutor::new();
    executor.set_available(false);

    assert_eq!(executor.locate().await, None);
    assert!(!executor.execute("w/a", "").await.ok);
}
