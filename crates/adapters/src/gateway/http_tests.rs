// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn ok_envelope_yields_result() {
    let result = parse_tool_response(200, r#"{"ok":true,"result":{"jobs":[]}}"#).unwrap();
    assert_eq!(result, json!({ "jobs": [] }));
}

#[test]
fn error_envelope_is_rejected_with_message() {
    let err = parse_tool_response(200, r#"{"ok":false,"error":{"message":"bad schedule"}}"#)
        .unwrap_err();
    assert!(matches!(err, GatewayError::Rejected(ref m) if m == "bad schedule"));
}

#[parameterized(
    unauthorized = { 401, "OPENCLAW_GATEWAY_TOKEN" },
    forbidden = { 403, "OPENCLAW_GATEWAY_TOKEN" },
    missing_tool = { 404, "not exposed" },
    server_error = { 500, "HTTP 500" },
)]
fn http_failures_are_rejections(status: u16, needle: &str) {
    let err = parse_tool_response(status, "<html>oops</html>").unwrap_err();
    match err {
        GatewayError::Rejected(message) => assert!(message.contains(needle), "{}", message),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn garbage_success_body_is_invalid() {
    let err = parse_tool_response(200, "not json").unwrap_err();
    assert!(matches!(err, GatewayError::InvalidResponse(_)));
}

#[test]
fn jobs_parse_from_object_or_array() {
    let wrapped = json!({ "jobs": [{ "id": "j1", "name": "antfarm/w/a" }] });
    let bare = json!([{ "id": "j1", "name": "antfarm/w/a" }]);

    let expected = vec![CronJob {
        id: "j1".to_string(),
        name: "antfarm/w/a".to_string(),
    }];
    assert_eq!(parse_jobs(&wrapped).unwrap(), expected);
    assert_eq!(parse_jobs(&bare).unwrap(), expected);
}

#[test]
fn nameless_jobs_are_skipped_and_id_defaults_to_name() {
    let result = json!([{ "id": "x" }, { "name": "antfarm/w/b" }]);
    let jobs = parse_jobs(&result).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, "antfarm/w/b");
}

#[test]
fn non_array_job_list_is_invalid() {
    assert!(matches!(
        parse_jobs(&json!({ "jobs": 3 })),
        Err(GatewayError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let gateway = HttpGateway::new(GatewayConfig {
        url: format!("http://127.0.0.1:{}", port),
        token: None,
        timeout: Duration::from_secs(2),
    });

    let err = gateway.check_reachable().await.unwrap_err();
    assert!(matches!(err, GatewayError::Unreachable { .. }));
}
