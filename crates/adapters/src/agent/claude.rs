// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claude Code CLI executor
//!
//! Spawns `claude -p --dangerously-skip-permissions` with the prompt piped
//! through stdin, enforces a wall-clock timeout (SIGTERM, then SIGKILL after
//! a grace period) and writes one plain-text log per invocation.

use super::log::write_invocation_log;
use super::{AgentExecutor, ExecutionResult};
use async_trait::async_trait;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Environment variable overriding the CLI location
pub const CLAUDE_PATH_ENV: &str = "ANTFARM_CLAUDE_PATH";

/// Flags passed on every invocation; the prompt itself goes through stdin
pub const CLAUDE_ARGS: [&str; 2] = ["-p", "--dangerously-skip-permissions"];

/// Variables that make the CLI think it is nested inside another session
pub const NESTED_SESSION_VARS: [&str; 2] = ["CLAUDECODE", "CLAUDE_CODE_SESSION"];

/// Hard limit on one agent turn
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Time between SIGTERM and SIGKILL
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// Executor configuration
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub timeout: Duration,
    pub kill_grace: Duration,
    /// Directory receiving one log file per invocation
    pub log_dir: PathBuf,
    /// Environment variable read on every resolution, checked first
    pub override_env: Option<String>,
    /// Explicit binary location, checked after `override_env`
    pub binary_override: Option<PathBuf>,
    /// Well-known install locations, checked in order
    pub candidates: Vec<PathBuf>,
    /// Fall back to searching `PATH`
    pub search_path: bool,
}

impl ClaudeConfig {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            kill_grace: DEFAULT_KILL_GRACE,
            log_dir: log_dir.into(),
            override_env: None,
            binary_override: None,
            candidates: default_candidates(),
            search_path: true,
        }
    }

    /// Defaults plus the [`CLAUDE_PATH_ENV`] override, re-read whenever
    /// the binary is resolved again
    pub fn from_env(log_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::new(log_dir);
        config.override_env = Some(CLAUDE_PATH_ENV.to_string());
        config
    }

    fn env_override(&self) -> Option<PathBuf> {
        let var = self.override_env.as_deref()?;
        std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}

fn default_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local/bin/claude"));
        candidates.push(home.join(".claude/local/claude"));
    }
    candidates.push(PathBuf::from("/usr/local/bin/claude"));
    candidates.push(PathBuf::from("/opt/homebrew/bin/claude"));
    candidates
}

/// Runs agent turns through the Claude Code CLI
#[derive(Clone)]
pub struct ClaudeExecutor {
    config: Arc<ClaudeConfig>,
    binary: Arc<Mutex<Option<PathBuf>>>,
}

impl ClaudeExecutor {
    pub fn new(config: ClaudeConfig) -> Self {
        Self {
            config: Arc::new(config),
            binary: Arc::new(Mutex::new(None)),
        }
    }

    pub fn config(&self) -> &ClaudeConfig {
        &self.config
    }

    /// Forget the cached binary location so the next call resolves again
    pub fn reset_binary_cache(&self) {
        *self.binary.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn resolve_binary(&self) -> Option<PathBuf> {
        let overrides = self
            .config
            .env_override()
            .into_iter()
            .chain(self.config.binary_override.clone());
        for path in overrides {
            if is_executable(&path) {
                return Some(path);
            }
            tracing::warn!(
                path = %path.display(),
                "binary override is not an executable file, ignoring"
            );
        }

        if let Some(path) = self.config.candidates.iter().find(|p| is_executable(p)) {
            return Some(path.clone());
        }

        if self.config.search_path {
            return search_path("claude");
        }
        None
    }
}

#[async_trait]
impl AgentExecutor for ClaudeExecutor {
    async fn locate(&self) -> Option<PathBuf> {
        let mut cached = self.binary.lock().unwrap_or_else(|e| e.into_inner());
        if cached.is_none() {
            *cached = self.resolve_binary();
            if let Some(path) = cached.as_ref() {
                tracing::debug!(path = %path.display(), "located claude binary");
            }
        }
        cached.clone()
    }

    async fn execute(&self, invocation_id: &str, prompt: &str) -> ExecutionResult {
        let Some(binary) = self.locate().await else {
            tracing::warn!(invocation_id, "claude binary not found");
            return ExecutionResult::not_found("claude");
        };

        let mut command = Command::new(&binary);
        command
            .args(CLAUDE_ARGS)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for var in NESTED_SESSION_VARS {
            command.env_remove(var);
        }

        let start = Instant::now();
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(invocation_id, binary = %binary.display(), error = %e, "spawn failed");
                return ExecutionResult::spawn_failed(&e);
            }
        };

        // Written from a separate task so a large prompt cannot deadlock
        // against a child that is already filling its stdout pipe.
        if let Some(mut stdin) = child.stdin.take() {
            let input = prompt.as_bytes().to_vec();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&input).await {
                    tracing::debug!(error = %e, "stdin closed early");
                }
            });
        }

        let stdout = OutputBuffer::capture(child.stdout.take());
        let stderr = OutputBuffer::capture(child.stderr.take());

        let (status, timed_out) =
            wait_with_escalation(&mut child, self.config.timeout, self.config.kill_grace).await;

        let stdout = stdout.finish(self.config.kill_grace).await;
        let stderr = stderr.finish(self.config.kill_grace).await;
        let exit_code = status.and_then(|s| s.code());

        tracing::info!(
            invocation_id,
            exit_code = ?exit_code,
            timed_out,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "claude exited"
        );

        write_invocation_log(
            &self.config.log_dir,
            invocation_id,
            exit_code,
            timed_out,
            &stdout,
            &stderr,
        )
        .await;

        ExecutionResult::exited(exit_code, stdout, timed_out)
    }
}

/// Wait for the child, escalating SIGTERM then SIGKILL once `timeout`
/// passes. Returns the exit status (if it could be collected) and whether
/// the timeout fired.
async fn wait_with_escalation(
    child: &mut Child,
    timeout: Duration,
    grace: Duration,
) -> (Option<ExitStatus>, bool) {
    tokio::select! {
        status = child.wait() => (status.ok(), false),
        () = tokio::time::sleep(timeout) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "agent timed out, sending SIGTERM");
            send_signal(child, Signal::SIGTERM);

            match tokio::time::timeout(grace, child.wait()).await {
                Ok(status) => (status.ok(), true),
                Err(_) => {
                    tracing::warn!(grace_ms = grace.as_millis() as u64, "agent ignored SIGTERM, sending SIGKILL");
                    if let Err(e) = child.start_kill() {
                        tracing::warn!(error = %e, "SIGKILL failed (may be expected)");
                    }
                    (child.wait().await.ok(), true)
                }
            }
        }
    }
}

fn send_signal(child: &Child, signal: Signal) {
    let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(pid), signal) {
        tracing::warn!(pid, ?signal, error = %e, "failed to signal agent");
    }
}

/// Pipe contents collected chunk by chunk, so whatever arrived before a
/// forced kill is still reported.
struct OutputBuffer {
    data: Arc<Mutex<Vec<u8>>>,
    reader: Option<JoinHandle<()>>,
}

impl OutputBuffer {
    fn capture<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let data = Arc::new(Mutex::new(Vec::new()));
        let reader = pipe.map(|mut pipe| {
            let data = Arc::clone(&data);
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match pipe.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => data
                            .lock()
                            .unwrap_or_else(|e| e.into_inner())
                            .extend_from_slice(&chunk[..n]),
                    }
                }
            })
        });
        Self { data, reader }
    }

    /// Wait up to `limit` for the pipe to drain. Grandchildren can keep a
    /// pipe open after the agent itself is gone.
    async fn finish(self, limit: Duration) -> String {
        if let Some(mut reader) = self.reader {
            if tokio::time::timeout(limit, &mut reader).await.is_err() {
                reader.abort();
            }
        }
        let data = self.data.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&data).into_owned()
    }
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

fn search_path(name: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
