// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control client behind the `afd <command>` forms

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tokio::net::UnixStream;

use crate::protocol::{self, ProtocolError, Request, Response, DEFAULT_TIMEOUT};

pub const USAGE: &str = "usage: afd [run | status | ping | stop | ensure <workflow> | teardown <workflow> | remove <workflow>]";

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),

    #[error("{0}")]
    Rejected(String),
}

/// Parse command-line arguments (without the program name). `None` means
/// run the daemon itself.
pub fn parse_command(args: &[String]) -> Result<Option<Request>, ClientError> {
    let workflow = |rest: &[String]| match rest {
        [id] if !id.is_empty() => Ok(id.clone()),
        _ => Err(ClientError::Usage(USAGE.to_string())),
    };

    match args {
        [] => Ok(None),
        [cmd] if cmd == "run" => Ok(None),
        [cmd] if cmd == "status" => Ok(Some(Request::Status)),
        [cmd] if cmd == "ping" => Ok(Some(Request::Ping)),
        [cmd] if cmd == "stop" => Ok(Some(Request::Shutdown)),
        [cmd, rest @ ..] if cmd == "ensure" => Ok(Some(Request::EnsureSchedules {
            workflow_id: workflow(rest)?,
        })),
        [cmd, rest @ ..] if cmd == "teardown" => Ok(Some(Request::TeardownIfIdle {
            workflow_id: workflow(rest)?,
        })),
        [cmd, rest @ ..] if cmd == "remove" => Ok(Some(Request::RemoveSchedules {
            workflow_id: workflow(rest)?,
        })),
        _ => Err(ClientError::Usage(USAGE.to_string())),
    }
}

/// Daemon client
pub struct DaemonClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl DaemonClient {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Creating gateway jobs can take several round-trips
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a request and receive a response
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = match UnixStream::connect(&self.socket_path).await {
            Ok(stream) => stream,
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
                ) =>
            {
                return Err(ClientError::DaemonNotRunning)
            }
            Err(e) => return Err(e.into()),
        };
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(request)?;
        tokio::time::timeout(self.timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let bytes = tokio::time::timeout(self.timeout, protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        match protocol::decode(&bytes)? {
            Response::Error { message } => Err(ClientError::Rejected(message)),
            response => Ok(response),
        }
    }
}

/// One-line human summary of a response
pub fn describe(response: &Response) -> String {
    match response {
        Response::Pong => "pong".to_string(),
        Response::Status {
            uptime_secs,
            agents,
            running,
        } => format!(
            "up {}s, {} agent(s) registered, {} running",
            uptime_secs, agents, running
        ),
        Response::Ensured {
            mode,
            created: Some(agents),
        } => format!("scheduled {} agent(s) via {}", agents, mode),
        Response::Ensured {
            mode,
            created: None,
        } => format!("already scheduled via {}", mode),
        Response::Teardown {
            removed: true, ..
        } => "schedules removed".to_string(),
        Response::Teardown {
            removed: false,
            reason,
        } => format!(
            "schedules kept: {}",
            reason.as_deref().unwrap_or("no reason given")
        ),
        Response::Ok => "ok".to_string(),
        Response::ShuttingDown => "daemon shutting down".to_string(),
        Response::Error { message } => format!("error: {}", message),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
