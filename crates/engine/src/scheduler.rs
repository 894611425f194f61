// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process agent scheduler
//!
//! A single task owns the agent registry. Callers talk to it through a
//! cloneable [`SchedulerHandle`]; finished executions report back through
//! the same command queue, so the registry is never shared.

use crate::error::SchedulerError;
use af_adapters::{AgentExecutor, ExecutionResult, PromptBuilder, RunStore, WorkflowLoader};
use af_core::{is_due, plan_agents, resolve_mode, AgentKey, AgentPlan, Clock, ExecutorMode};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};

/// Period between scheduler ticks
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(15);

/// Output excerpt length in failure logs
const FAILURE_EXCERPT: usize = 200;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    /// Raw process-wide executor override, consulted during discovery
    pub mode_override: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            mode_override: None,
        }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            mode_override: ExecutorMode::env_override(),
            ..Self::default()
        }
    }
}

/// Scheduler adapter dependencies
pub struct SchedulerDeps<X, R, L, P> {
    pub executor: X,
    pub runs: R,
    pub workflows: L,
    pub prompts: P,
}

/// Registration request for one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentEntry {
    pub key: AgentKey,
    pub prompt: String,
    pub interval: Duration,
    pub anchor: Duration,
}

impl AgentEntry {
    pub fn from_plan(plan: &AgentPlan, prompt: String) -> Self {
        Self {
            key: plan.key.clone(),
            prompt,
            interval: plan.interval,
            anchor: plan.anchor,
        }
    }
}

/// Point-in-time view of one registered agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentStatus {
    pub key: AgentKey,
    pub interval: Duration,
    pub anchor: Duration,
    pub running: bool,
    pub last_fired: Option<Instant>,
}

/// What a single tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Workflows registered by discovery
    pub discovered: Vec<String>,
    /// Agents whose execution was started
    pub fired: Vec<AgentKey>,
}

enum Command {
    Register {
        entries: Vec<AgentEntry>,
        reply: oneshot::Sender<Result<usize, SchedulerError>>,
    },
    Unregister {
        workflow_id: String,
        reply: oneshot::Sender<usize>,
    },
    HasRegistered {
        workflow_id: String,
        reply: oneshot::Sender<bool>,
    },
    Start {
        reply: oneshot::Sender<bool>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    IsRunning {
        reply: oneshot::Sender<bool>,
    },
    Snapshot {
        reply: oneshot::Sender<Vec<AgentStatus>>,
    },
    Tick {
        reply: oneshot::Sender<TickReport>,
    },
    Finished {
        key: AgentKey,
        fire_id: u64,
    },
}

/// Cloneable handle to a running scheduler task
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| SchedulerError::Closed)?;
        rx.await.map_err(|_| SchedulerError::Closed)
    }

    /// Add agents. Keys already registered keep their first registration.
    /// Returns how many entries were new.
    pub async fn register_agents(&self, entries: Vec<AgentEntry>) -> Result<usize, SchedulerError> {
        self.request(|reply| Command::Register { entries, reply })
            .await?
    }

    /// Remove every agent of `workflow_id`, returning how many were removed
    pub async fn unregister_agents(&self, workflow_id: &str) -> Result<usize, SchedulerError> {
        let workflow_id = workflow_id.to_string();
        self.request(|reply| Command::Unregister { workflow_id, reply })
            .await
    }

    pub async fn has_registered_agents(&self, workflow_id: &str) -> Result<bool, SchedulerError> {
        let workflow_id = workflow_id.to_string();
        self.request(|reply| Command::HasRegistered { workflow_id, reply })
            .await
    }

    /// Start ticking and run one tick immediately. Returns false if the
    /// scheduler was already running.
    pub async fn start(&self) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::Start { reply }).await
    }

    /// Stop ticking and clear the whole registry. In-flight executions run
    /// to completion and their agents stay busy until they report back.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        self.request(|reply| Command::Stop { reply }).await
    }

    pub async fn is_running(&self) -> Result<bool, SchedulerError> {
        self.request(|reply| Command::IsRunning { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Vec<AgentStatus>, SchedulerError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Run one tick now. Does nothing while stopped.
    pub async fn tick_now(&self) -> Result<TickReport, SchedulerError> {
        self.request(|reply| Command::Tick { reply }).await
    }
}

struct Registered {
    entry: AgentEntry,
    last_fired: Option<Instant>,
}

/// Clears the busy flag when the execution task ends, including by panic
struct BusyGuard {
    tx: mpsc::UnboundedSender<Command>,
    key: Option<AgentKey>,
    fire_id: u64,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            // Scheduler may already be gone
            let _ = self.tx.send(Command::Finished {
                key,
                fire_id: self.fire_id,
            });
        }
    }
}

/// Scheduler task state
pub struct AgentScheduler<X, R, L, P, C: Clock> {
    deps: SchedulerDeps<X, R, L, P>,
    config: SchedulerConfig,
    clock: C,
    registry: BTreeMap<AgentKey, Registered>,
    /// Executions not yet reported finished, by fire id. Outlives the
    /// registry entry so re-registration cannot start a second turn.
    in_flight: HashMap<AgentKey, u64>,
    started_at: Option<Instant>,
    ticker: Option<Interval>,
    next_fire_id: u64,
    /// Weak so the task ends once every handle is dropped
    self_tx: mpsc::WeakUnboundedSender<Command>,
}

impl<X, R, L, P, C> AgentScheduler<X, R, L, P, C>
where
    X: AgentExecutor,
    R: RunStore,
    L: WorkflowLoader,
    P: PromptBuilder,
    C: Clock,
{
    /// Spawn the scheduler task. It starts stopped.
    pub fn spawn(
        deps: SchedulerDeps<X, R, L, P>,
        config: SchedulerConfig,
        clock: C,
    ) -> SchedulerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            deps,
            config,
            clock,
            registry: BTreeMap::new(),
            in_flight: HashMap::new(),
            started_at: None,
            ticker: None,
            next_fire_id: 0,
            self_tx: tx.downgrade(),
        };
        tokio::spawn(scheduler.run(rx));
        SchedulerHandle { tx }
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                () = next_tick(&mut self.ticker) => {
                    self.tick().await;
                }
            }
        }
        tracing::debug!("scheduler task exiting");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Register { entries, reply } => {
                let _ = reply.send(self.register(entries));
            }
            Command::Unregister { workflow_id, reply } => {
                let _ = reply.send(self.unregister(&workflow_id));
            }
            Command::HasRegistered { workflow_id, reply } => {
                let _ = reply.send(self.has_registered(&workflow_id));
            }
            Command::Start { reply } => {
                let started = self.start();
                if started {
                    self.tick().await;
                }
                let _ = reply.send(started);
            }
            Command::Stop { reply } => {
                self.stop();
                let _ = reply.send(());
            }
            Command::IsRunning { reply } => {
                let _ = reply.send(self.started_at.is_some());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Tick { reply } => {
                let report = self.tick().await;
                let _ = reply.send(report);
            }
            Command::Finished { key, fire_id } => self.finished(&key, fire_id),
        }
    }

    fn register(&mut self, entries: Vec<AgentEntry>) -> Result<usize, SchedulerError> {
        if let Some(entry) = entries.iter().find(|e| e.interval.is_zero()) {
            return Err(SchedulerError::InvalidInterval(entry.key.clone()));
        }

        let mut added = 0;
        for entry in entries {
            if self.registry.contains_key(&entry.key) {
                continue;
            }
            tracing::debug!(
                agent = %entry.key,
                anchor_ms = entry.anchor.as_millis() as u64,
                interval_ms = entry.interval.as_millis() as u64,
                "registered agent"
            );
            self.registry.insert(
                entry.key.clone(),
                Registered {
                    entry,
                    last_fired: None,
                },
            );
            added += 1;
        }
        Ok(added)
    }

    fn unregister(&mut self, workflow_id: &str) -> usize {
        let before = self.registry.len();
        self.registry.retain(|key, _| !key.belongs_to(workflow_id));
        let removed = before - self.registry.len();
        if removed > 0 {
            tracing::info!(workflow_id, removed, "unregistered agents");
        }
        removed
    }

    fn has_registered(&self, workflow_id: &str) -> bool {
        self.registry.keys().any(|key| key.belongs_to(workflow_id))
    }

    fn start(&mut self) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(self.clock.now());

        let period = self.config.tick_interval;
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.ticker = Some(ticker);

        tracing::info!(
            tick_ms = period.as_millis() as u64,
            agents = self.registry.len(),
            "scheduler started"
        );
        true
    }

    fn stop(&mut self) {
        let cleared = self.registry.len();
        self.registry.clear();
        self.ticker = None;
        if self.started_at.take().is_some() {
            tracing::info!(cleared, "scheduler stopped");
        }
    }

    fn snapshot(&self) -> Vec<AgentStatus> {
        self.registry
            .values()
            .map(|r| AgentStatus {
                key: r.entry.key.clone(),
                interval: r.entry.interval,
                anchor: r.entry.anchor,
                running: self.in_flight.contains_key(&r.entry.key),
                last_fired: r.last_fired,
            })
            .collect()
    }

    fn finished(&mut self, key: &AgentKey, fire_id: u64) {
        if self.in_flight.get(key) == Some(&fire_id) {
            self.in_flight.remove(key);
        }
    }

    async fn tick(&mut self) -> TickReport {
        let Some(started_at) = self.started_at else {
            return TickReport::default();
        };

        let active = match self.deps.runs.list_active_workflow_ids().await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!(error = %e, "run store unavailable, skipping tick");
                return TickReport::default();
            }
        };

        let discovered = self.discover(&active).await;
        let active: HashSet<String> = active.into_iter().collect();
        let fired = self.fire_due(started_at, &active);

        if !discovered.is_empty() || !fired.is_empty() {
            tracing::debug!(
                discovered = discovered.len(),
                fired = fired.len(),
                "tick complete"
            );
        }
        TickReport { discovered, fired }
    }

    /// Register agents for active workflows that have none yet
    async fn discover(&mut self, active: &[String]) -> Vec<String> {
        let mut discovered = Vec::new();

        for workflow_id in active {
            if self.has_registered(workflow_id) {
                continue;
            }

            let workflow = match self.deps.workflows.load(workflow_id).await {
                Ok(workflow) => workflow,
                Err(e) => {
                    tracing::warn!(%workflow_id, error = %e, "discovery: failed to load workflow");
                    continue;
                }
            };

            let mode = resolve_mode(&workflow, self.config.mode_override.as_deref());
            if mode != ExecutorMode::ClaudeCode {
                tracing::trace!(%workflow_id, %mode, "discovery: not an in-process workflow");
                continue;
            }

            let entries: Vec<AgentEntry> = plan_agents(&workflow)
                .iter()
                .map(|plan| {
                    let prompt = self
                        .deps
                        .prompts
                        .build(&plan.key.workflow_id, &plan.key.agent_id);
                    AgentEntry::from_plan(plan, prompt)
                })
                .collect();

            match self.register(entries) {
                Ok(added) if added > 0 => {
                    tracing::info!(%workflow_id, agents = added, "discovered active workflow");
                    discovered.push(workflow_id.clone());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(%workflow_id, error = %e, "discovery: rejected workflow"),
            }
        }
        discovered
    }

    /// Start every idle agent that is due, evaluated at one instant
    fn fire_due(&mut self, started_at: Instant, active: &HashSet<String>) -> Vec<AgentKey> {
        let Some(tx) = self.self_tx.upgrade() else {
            return Vec::new();
        };
        let now = self.clock.now();
        let mut fired = Vec::new();

        for registered in self.registry.values_mut() {
            let entry = &registered.entry;
            if self.in_flight.contains_key(&entry.key)
                || !active.contains(&entry.key.workflow_id)
            {
                continue;
            }
            if !is_due(
                started_at,
                entry.anchor,
                entry.interval,
                registered.last_fired,
                now,
            ) {
                continue;
            }

            self.next_fire_id += 1;
            registered.last_fired = Some(now);
            self.in_flight.insert(entry.key.clone(), self.next_fire_id);

            let guard = BusyGuard {
                tx: tx.clone(),
                key: Some(entry.key.clone()),
                fire_id: self.next_fire_id,
            };
            let executor = self.deps.executor.clone();
            let key = entry.key.clone();
            let prompt = entry.prompt.clone();

            tracing::info!(agent = %key, "firing agent");
            tokio::spawn(async move {
                let _guard = guard;
                let result = executor.execute(&key.to_string(), &prompt).await;
                log_outcome(&key, &result);
            });

            fired.push(entry.key.clone());
        }
        fired
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn log_outcome(key: &AgentKey, result: &ExecutionResult) {
    if result.timed_out {
        tracing::error!(agent = %key, "agent turn timed out");
    } else if !result.ok {
        tracing::error!(
            agent = %key,
            exit_code = ?result.exit_code,
            output = result.excerpt(FAILURE_EXCERPT),
            "agent turn failed"
        );
    } else {
        tracing::info!(agent = %key, "agent turn completed");
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
