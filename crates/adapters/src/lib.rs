// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: the agent CLI, the run database, workflow
//! definitions on disk and the remote cron gateway

pub mod agent;
pub mod gateway;
pub mod prompt;
pub mod runs;
pub mod traced;
pub mod workflow;

pub use agent::{AgentExecutor, ClaudeConfig, ClaudeExecutor, ExecutionResult};
pub use gateway::{
    CronDelivery, CronGateway, CronJob, CronJobSpec, CronPayload, CronSchedule, GatewayConfig,
    GatewayError, HttpGateway,
};
pub use prompt::{PromptBuilder, StepPromptBuilder, STEP_CLI_ENV};
pub use runs::{RunStore, RunStoreError, SqliteRunStore};
pub use traced::{TracedAgentExecutor, TracedGateway};
pub use workflow::{FsWorkflowLoader, LoadError, WorkflowLoader};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use agent::{ExecutorCall, FakeAgentExecutor};
#[cfg(any(test, feature = "test-support"))]
pub use gateway::{FakeGateway, GatewayCall};
#[cfg(any(test, feature = "test-support"))]
pub use runs::FakeRunStore;
#[cfg(any(test, feature = "test-support"))]
pub use workflow::FakeWorkflowLoader;
