// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! af-core: domain types for the antfarm agent dispatcher
//!
//! This crate provides:
//! - A clock abstraction so schedules can be driven from tests
//! - Executor-mode resolution (gateway cron vs in-process scheduler)
//! - Agent identity, cron job naming and stagger arithmetic
//! - Workflow definitions and their TOML format

pub mod agent;
pub mod clock;
pub mod mode;
pub mod stagger;
pub mod workflow;

pub use agent::{job_name, job_prefix, AgentKey, JOB_NAMESPACE};
pub use clock::{Clock, FakeClock, SystemClock};
pub use mode::{resolve_mode, ExecutorMode, EXECUTOR_ENV};
pub use stagger::{
    is_due, plan_agents, AgentPlan, DEFAULT_AGENT_TIMEOUT, DEFAULT_INTERVAL, STAGGER_STEP,
};
pub use workflow::{parse_workflow, AgentSpec, CronSpec, ParseError, WorkflowSpec};
