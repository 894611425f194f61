// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Executor-mode resolution
//!
//! A workflow's agents are fired either by cron jobs hosted on the remote
//! gateway or by the in-process scheduler that shells out to the Claude
//! Code CLI. Precedence: workflow `[cron].executor`, then the
//! `ANTFARM_EXECUTOR` environment override, then the gateway default.
//! Unrecognized values at any level fall through to the next.

use crate::workflow::WorkflowSpec;
use std::fmt;
use std::str::FromStr;

/// Environment variable holding the process-wide mode override
pub const EXECUTOR_ENV: &str = "ANTFARM_EXECUTOR";

/// Which backend fires a workflow's agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutorMode {
    /// Remote gateway-hosted cron jobs
    #[default]
    Gateway,
    /// In-process polling scheduler driving the Claude Code CLI
    ClaudeCode,
}

impl ExecutorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorMode::Gateway => "openclaw",
            ExecutorMode::ClaudeCode => "claude-code",
        }
    }

    /// Read the process-wide override, if set
    pub fn env_override() -> Option<String> {
        std::env::var(EXECUTOR_ENV).ok()
    }
}

impl fmt::Display for ExecutorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExecutorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "openclaw" => Ok(ExecutorMode::Gateway),
            "claude-code" => Ok(ExecutorMode::ClaudeCode),
            other => Err(format!("unknown executor mode: {}", other)),
        }
    }
}

/// Pick the executor mode for a workflow.
///
/// `env_override` is the raw value of [`EXECUTOR_ENV`], passed in so the
/// decision stays pure.
pub fn resolve_mode(workflow: &WorkflowSpec, env_override: Option<&str>) -> ExecutorMode {
    let from_workflow = workflow
        .cron
        .as_ref()
        .and_then(|c| c.executor.as_deref())
        .and_then(|v| v.parse().ok());

    from_workflow
        .or_else(|| env_override.and_then(|v| v.parse().ok()))
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "mode_tests.rs"]
mod tests;
