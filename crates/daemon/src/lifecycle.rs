// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup and shutdown.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use af_adapters::{
    ClaudeConfig, ClaudeExecutor, FsWorkflowLoader, GatewayConfig, HttpGateway, SqliteRunStore,
    StepPromptBuilder, TracedAgentExecutor, TracedGateway,
};
use af_core::{ExecutorMode, SystemClock};
use af_engine::{
    AgentScheduler, GatewayBackend, InProcessBackend, LifecycleController, SchedulerConfig,
    SchedulerDeps, SchedulerHandle,
};
use fs2::FileExt;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::server::Controls;

/// Environment variable overriding the state directory
pub const STATE_DIR_ENV: &str = "ANTFARM_STATE_DIR";

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of all antfarm state
    pub state_dir: PathBuf,
    /// Run database (read only)
    pub db_path: PathBuf,
    /// Installed workflow definitions
    pub workflows_path: PathBuf,
    /// One log file per agent invocation
    pub agent_logs_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Control socket
    pub socket_path: PathBuf,
}

impl Config {
    /// Configuration rooted at [`STATE_DIR_ENV`] or the default state dir
    pub fn from_env() -> Result<Self, LifecycleError> {
        let state_dir = match std::env::var(STATE_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
            _ => dirs::home_dir()
                .ok_or(LifecycleError::NoStateDir)?
                .join(".openclaw")
                .join("antfarm"),
        };
        Ok(Self::for_state_dir(&state_dir))
    }

    pub fn for_state_dir(state_dir: &Path) -> Self {
        Self {
            state_dir: state_dir.to_path_buf(),
            db_path: state_dir.join("antfarm.db"),
            workflows_path: state_dir.join("workflows"),
            agent_logs_path: state_dir.join("agent-logs"),
            log_path: state_dir.join("daemon.log"),
            lock_path: state_dir.join("daemon.pid"),
            socket_path: state_dir.join("daemon.sock"),
        }
    }
}

type Executor = TracedAgentExecutor<ClaudeExecutor>;

/// Schedule controls over the production adapters
pub type DaemonControls = Controls<
    InProcessBackend<Executor, StepPromptBuilder>,
    GatewayBackend<TracedGateway<HttpGateway>, StepPromptBuilder>,
    SqliteRunStore,
    FsWorkflowLoader,
>;

/// Daemon state during operation
pub struct DaemonState {
    /// Configuration
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    /// Control socket listener
    pub listener: UnixListener,
    /// Handle to the in-process agent scheduler
    pub scheduler: SchedulerHandle,
    /// Run-scoped schedule operations
    pub controls: DaemonControls,
    /// Set by a shutdown request over the socket
    pub shutdown_requested: bool,
    /// When daemon started
    pub start_time: Instant,
}

impl DaemonState {
    /// Log a one-line summary of the registry
    pub async fn log_status(&self) -> Result<(), LifecycleError> {
        let agents = self.scheduler.snapshot().await?;
        let running = agents.iter().filter(|a| a.running).count();
        info!(
            uptime_secs = self.start_time.elapsed().as_secs(),
            agents = agents.len(),
            running,
            "scheduler status"
        );
        Ok(())
    }

    /// Shutdown the daemon gracefully
    pub async fn shutdown(&mut self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");

        // 1. Stop future firings; in-flight turns finish on their own
        self.scheduler.stop().await?;

        // 2. Remove socket file
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }

        // 3. Remove PID file
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        // 4. Lock file is released automatically when self.lock_file is dropped

        info!("Daemon shutdown complete");
        Ok(())
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Could not determine state directory (set ANTFARM_STATE_DIR)")]
    NoStateDir,

    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] af_engine::SchedulerError),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(e) => {
            // Clean up any resources created before failure
            cleanup_on_failure(config, &e);
            Err(e)
        }
    }
}

/// Inner startup logic - cleanup_on_failure called if this fails
async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Create state directory
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire lock file FIRST - prevents two schedulers firing the same agents
    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    // Write PID to lock file
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 3. Create directories
    std::fs::create_dir_all(&config.agent_logs_path)?;
    std::fs::create_dir_all(&config.workflows_path)?;

    if !config.db_path.exists() {
        warn!(
            path = %config.db_path.display(),
            "run database not found, no workflow will be dispatched until it exists"
        );
    }

    // 4. Set up adapters (wrapped with tracing for observability)
    let claude = ClaudeExecutor::new(ClaudeConfig::from_env(&config.agent_logs_path));
    let executor = TracedAgentExecutor::new(claude);
    let gateway_config = GatewayConfig::from_env();
    let gateway_url = gateway_config.url.clone();
    let gateway = TracedGateway::new(HttpGateway::new(gateway_config));
    let runs = SqliteRunStore::new(&config.db_path);
    let workflows = FsWorkflowLoader::new(&config.workflows_path);
    let prompts = StepPromptBuilder::from_env();
    let scheduler_config = SchedulerConfig::from_env();
    let mode_override = scheduler_config.mode_override.clone();
    let default_mode = scheduler_config
        .mode_override
        .as_deref()
        .and_then(|v| v.parse::<ExecutorMode>().ok())
        .unwrap_or_default();

    // 5. Spawn and start the scheduler. Discovery picks up runs that were
    // active before a restart.
    let scheduler = AgentScheduler::spawn(
        SchedulerDeps {
            executor: executor.clone(),
            runs: runs.clone(),
            workflows: workflows.clone(),
            prompts: prompts.clone(),
        },
        scheduler_config,
        SystemClock,
    );
    scheduler.start().await?;

    // 6. Lifecycle controller over both backends
    let lifecycle = LifecycleController::new(
        InProcessBackend::new(scheduler.clone(), executor, prompts.clone()),
        GatewayBackend::new(gateway, prompts),
        runs,
        mode_override,
    );
    let controls = Controls::new(lifecycle, workflows);

    // 7. Remove stale socket and bind (LAST - only after everything else is up)
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(
        state_dir = %config.state_dir.display(),
        default_mode = %default_mode,
        gateway = %gateway_url,
        "Daemon started"
    );

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        scheduler,
        controls,
        shutdown_requested: false,
        start_time: Instant::now(),
    })
}

/// Clean up resources on startup failure
fn cleanup_on_failure(config: &Config, error: &LifecycleError) {
    // Another daemon owns the PID file
    if matches!(error, LifecycleError::LockFailed(_)) {
        return;
    }
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
