// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Antfarm dispatch engine: the in-process scheduler, the two dispatch
//! backends and the run-scoped lifecycle controller

mod backend;
mod error;
mod lifecycle;
mod scheduler;

pub use backend::{DispatchBackend, GatewayBackend, InProcessBackend};
pub use error::{DispatchError, SchedulerError};
pub use lifecycle::{EnsureOutcome, LifecycleController, TeardownOutcome};
pub use scheduler::{
    AgentEntry, AgentScheduler, AgentStatus, SchedulerConfig, SchedulerDeps, SchedulerHandle,
    TickReport, DEFAULT_TICK_INTERVAL,
};
