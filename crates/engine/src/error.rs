// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the dispatch engine

use af_adapters::GatewayError;
use af_core::{AgentKey, ExecutorMode};
use thiserror::Error;

/// Errors from the scheduler handle
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler has shut down")]
    Closed,
    #[error("agent {0} has a zero interval")]
    InvalidInterval(AgentKey),
}

/// Errors from ensuring or removing schedules
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{mode} backend unavailable: {message}")]
    BackendUnreachable { mode: ExecutorMode, message: String },
    #[error("failed to create cron job for agent {agent:?}: {source}")]
    AgentSetup {
        agent: String,
        #[source]
        source: GatewayError,
    },
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
}
