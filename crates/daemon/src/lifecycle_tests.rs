// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::client::{ClientError, DaemonClient};
use crate::protocol::{Request, Response};
use crate::server::handle_connection;
use tempfile::tempdir;

#[test]
fn config_derives_paths_from_state_dir() {
    let config = Config::for_state_dir(Path::new("/var/antfarm"));

    assert_eq!(config.db_path, PathBuf::from("/var/antfarm/antfarm.db"));
    assert_eq!(config.workflows_path, PathBuf::from("/var/antfarm/workflows"));
    assert_eq!(config.agent_logs_path, PathBuf::from("/var/antfarm/agent-logs"));
    assert_eq!(config.log_path, PathBuf::from("/var/antfarm/daemon.log"));
    assert_eq!(config.lock_path, PathBuf::from("/var/antfarm/daemon.pid"));
    assert_eq!(config.socket_path, PathBuf::from("/var/antfarm/daemon.sock"));
}

#[tokio::test]
async fn startup_locks_and_starts_the_scheduler() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(&dir.path().join("state"));

    let mut daemon = startup(&config).await.unwrap();

    let pid = std::fs::read_to_string(&config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
    assert!(config.agent_logs_path.is_dir());
    assert!(config.workflows_path.is_dir());
    assert!(daemon.scheduler.is_running().await.unwrap());

    daemon.shutdown().await.unwrap();
    assert!(!config.lock_path.exists());
    assert!(!daemon.scheduler.is_running().await.unwrap());
}

#[tokio::test]
async fn second_daemon_fails_to_lock() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path());

    let mut first = startup(&config).await.unwrap();
    let second = startup(&config).await;

    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));
    // The running daemon keeps its PID file
    assert!(config.lock_path.exists());

    first.shutdown().await.unwrap();
}

#[tokio::test]
async fn status_reports_registered_agents() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path());
    let mut daemon = startup(&config).await.unwrap();

    daemon.log_status().await.unwrap();

    daemon.shutdown().await.unwrap();
}

/// Send one request through the daemon's socket and serve it
async fn round_trip(daemon: &mut DaemonState, request: Request) -> Result<Response, ClientError> {
    let client = DaemonClient::new(&daemon.config.socket_path);
    let pending = tokio::spawn(async move { client.send(&request).await });

    let (stream, _) = daemon.listener.accept().await.unwrap();
    handle_connection(daemon, stream).await.unwrap();
    pending.await.unwrap()
}

#[tokio::test]
async fn socket_serves_schedule_requests() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path());
    let mut daemon = startup(&config).await.unwrap();
    assert!(config.socket_path.exists());

    let pong = round_trip(&mut daemon, Request::Ping).await.unwrap();
    assert_eq!(pong, Response::Pong);

    let status = round_trip(&mut daemon, Request::Status).await.unwrap();
    assert!(matches!(status, Response::Status { agents: 0, running: 0, .. }));

    let missing = round_trip(
        &mut daemon,
        Request::EnsureSchedules {
            workflow_id: "not-installed".to_string(),
        },
    )
    .await;
    assert!(matches!(missing, Err(ClientError::Rejected(m)) if m.contains("not-installed")));

    // No run database yet: schedules are kept
    let teardown = round_trip(
        &mut daemon,
        Request::TeardownIfIdle {
            workflow_id: "w".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(
        teardown,
        Response::Teardown {
            removed: false,
            reason: Some("run database unavailable".to_string()),
        }
    );

    daemon.shutdown().await.unwrap();
    assert!(!config.socket_path.exists());
}

#[tokio::test]
async fn shutdown_request_sets_the_flag() {
    let dir = tempdir().unwrap();
    let config = Config::for_state_dir(dir.path());
    let mut daemon = startup(&config).await.unwrap();

    let response = round_trip(&mut daemon, Request::Shutdown).await.unwrap();

    assert_eq!(response, Response::ShuttingDown);
    assert!(daemon.shutdown_requested);
    daemon.shutdown().await.unwrap();
}
