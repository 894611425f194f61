// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent executors: run one agent turn to completion

mod claude;
mod log;

pub use claude::{
    ClaudeConfig, ClaudeExecutor, CLAUDE_ARGS, CLAUDE_PATH_ENV, DEFAULT_KILL_GRACE,
    DEFAULT_TIMEOUT, NESTED_SESSION_VARS,
};
pub use log::{log_file_name, write_invocation_log};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{ExecutorCall, FakeAgentExecutor};

use async_trait::async_trait;
use std::path::PathBuf;

/// Outcome of a single agent turn.
///
/// Not-found, spawn failures and timeouts are reported here rather than
/// as errors so a failed turn never takes the scheduler down with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub ok: bool,
    /// Captured stdout, or a description of why nothing ran
    pub output: String,
    /// `None` when the process never started or died from a signal
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Result for an exited process
    pub fn exited(exit_code: Option<i32>, output: String, timed_out: bool) -> Self {
        Self {
            ok: exit_code == Some(0) && !timed_out,
            output,
            exit_code,
            timed_out,
        }
    }

    /// No executable was located
    pub fn not_found(tool: &str) -> Self {
        Self {
            ok: false,
            output: format!("{} binary not found", tool),
            exit_code: None,
            timed_out: false,
        }
    }

    /// The executable exists but could not be launched
    pub fn spawn_failed(error: &std::io::Error) -> Self {
        Self {
            ok: false,
            output: format!("spawn error: {}", error),
            exit_code: None,
            timed_out: false,
        }
    }

    /// First `limit` characters of the output, for log lines
    pub fn excerpt(&self, limit: usize) -> &str {
        match self.output.char_indices().nth(limit) {
            Some((idx, _)) => &self.output[..idx],
            None => &self.output,
        }
    }
}

/// Runs agent turns against some external tool
#[async_trait]
pub trait AgentExecutor: Clone + Send + Sync + 'static {
    /// Locate the tool backing this executor, `None` if it is not installed
    async fn locate(&self) -> Option<PathBuf>;

    /// Run one turn with `prompt` as input.
    ///
    /// `invocation_id` names the turn in logs (usually `<workflow>/<agent>`).
    async fn execute(&self, invocation_id: &str, prompt: &str) -> ExecutionResult;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
