// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote cron gateway
//!
//! The gateway owns the timing of remote jobs. This side only creates,
//! lists and deletes them by name.

mod http;

pub use http::{GatewayConfig, HttpGateway, GATEWAY_TOKEN_ENV, GATEWAY_URL_ENV};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeGateway, GatewayCall};

use af_core::AgentPlan;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from gateway calls
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(
        "cron gateway at {url} is unreachable: {message}. Start the gateway, point \
         ANTFARM_GATEWAY_URL at it, or set ANTFARM_EXECUTOR=claude-code to run agents in-process"
    )]
    Unreachable { url: String, message: String },
    #[error("gateway rejected request: {0}")]
    Rejected(String),
    #[error("invalid gateway response: {0}")]
    InvalidResponse(String),
}

/// A job as reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronJob {
    pub id: String,
    pub name: String,
}

/// Recurring schedule of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CronSchedule {
    #[serde(rename_all = "camelCase")]
    Every { every_ms: u64, anchor_ms: u64 },
}

/// What the job does when it fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CronPayload {
    #[serde(rename_all = "camelCase")]
    AgentTurn { message: String, timeout_seconds: u64 },
}

/// Delivery of the agent's reply back through the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronDelivery {
    pub mode: String,
}

/// Job creation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CronJobSpec {
    pub name: String,
    pub schedule: CronSchedule,
    pub session_target: String,
    pub agent_id: String,
    pub payload: CronPayload,
    pub enabled: bool,
    pub delivery: CronDelivery,
}

impl CronJobSpec {
    /// Job for one planned agent. Every firing runs in an isolated session
    /// and replies are not delivered; agents report through the step CLI.
    pub fn for_agent(plan: &AgentPlan, prompt: String) -> Self {
        Self {
            name: plan.key.job_name(),
            schedule: CronSchedule::Every {
                every_ms: plan.interval.as_millis() as u64,
                anchor_ms: plan.anchor.as_millis() as u64,
            },
            session_target: "isolated".to_string(),
            agent_id: plan.key.to_string(),
            payload: CronPayload::AgentTurn {
                message: prompt,
                timeout_seconds: plan.timeout.as_secs(),
            },
            enabled: true,
            delivery: CronDelivery {
                mode: "none".to_string(),
            },
        }
    }
}

/// Remote cron service
#[async_trait]
pub trait CronGateway: Clone + Send + Sync + 'static {
    async fn create_job(&self, spec: &CronJobSpec) -> Result<(), GatewayError>;

    async fn list_jobs(&self) -> Result<Vec<CronJob>, GatewayError>;

    /// Delete every job whose name starts with `prefix`, returning how many
    /// were removed. Deleting nothing is not an error.
    async fn delete_jobs_by_prefix(&self, prefix: &str) -> Result<usize, GatewayError>;

    /// Pre-flight check that the cron tool answers
    async fn check_reachable(&self) -> Result<(), GatewayError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
