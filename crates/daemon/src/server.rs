// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use af_adapters::{RunStore, WorkflowLoader};
use af_engine::{DispatchBackend, EnsureOutcome, LifecycleController, TeardownOutcome};
use tokio::net::UnixStream;
use tracing::{debug, error};

use crate::lifecycle::DaemonState;
use crate::protocol::{self, Request, Response, DEFAULT_TIMEOUT};

/// Run-scoped schedule operations exposed over the socket
pub struct Controls<I, G, R, L> {
    lifecycle: LifecycleController<I, G, R>,
    workflows: L,
}

impl<I, G, R, L> Controls<I, G, R, L>
where
    I: DispatchBackend,
    G: DispatchBackend,
    R: RunStore,
    L: WorkflowLoader,
{
    pub fn new(lifecycle: LifecycleController<I, G, R>, workflows: L) -> Self {
        Self {
            lifecycle,
            workflows,
        }
    }

    pub async fn ensure(&self, workflow_id: &str) -> Response {
        let workflow = match self.workflows.load(workflow_id).await {
            Ok(workflow) => workflow,
            Err(e) => return error_response(e),
        };
        match self.lifecycle.ensure_schedules_for_run(&workflow).await {
            Ok(EnsureOutcome::AlreadyScheduled { mode }) => Response::Ensured {
                mode: mode.to_string(),
                created: None,
            },
            Ok(EnsureOutcome::Created { mode, agents }) => Response::Ensured {
                mode: mode.to_string(),
                created: Some(agents),
            },
            Err(e) => error_response(e),
        }
    }

    pub async fn teardown_if_idle(&self, workflow_id: &str) -> Response {
        match self.lifecycle.teardown_schedules_if_idle(workflow_id).await {
            Ok(TeardownOutcome::Removed) => Response::Teardown {
                removed: true,
                reason: None,
            },
            Ok(TeardownOutcome::StillActive { runs }) => Response::Teardown {
                removed: false,
                reason: Some(format!("{} run(s) still active", runs)),
            },
            Ok(TeardownOutcome::StoreUnavailable) => Response::Teardown {
                removed: false,
                reason: Some("run database unavailable".to_string()),
            },
            Err(e) => error_response(e),
        }
    }

    pub async fn remove(&self, workflow_id: &str) -> Response {
        match self.lifecycle.remove_schedules(workflow_id).await {
            Ok(()) => Response::Ok,
            Err(e) => error_response(e),
        }
    }
}

fn error_response(e: impl std::fmt::Display) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

/// Handle a single client connection
pub async fn handle_connection(
    daemon: &mut DaemonState,
    stream: UnixStream,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);
    let response = handle_request(daemon, request).await;
    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

async fn handle_request(daemon: &mut DaemonState, request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Status => match daemon.scheduler.snapshot().await {
            Ok(agents) => Response::Status {
                uptime_secs: daemon.start_time.elapsed().as_secs(),
                agents: agents.len(),
                running: agents.iter().filter(|a| a.running).count(),
            },
            Err(e) => error_response(e),
        },

        Request::EnsureSchedules { workflow_id } => daemon.controls.ensure(&workflow_id).await,

        Request::TeardownIfIdle { workflow_id } => {
            daemon.controls.teardown_if_idle(&workflow_id).await
        }

        Request::RemoveSchedules { workflow_id } => daemon.controls.remove(&workflow_id).await,

        Request::Shutdown => {
            daemon.shutdown_requested = true;
            Response::ShuttingDown
        }
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
