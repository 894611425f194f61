// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow definitions
//!
//! Only the parts of a workflow that drive dispatch are modelled here: its
//! id, its agents and the optional `[cron]` table.
//!
//! ```toml
//! id = "feature-dev"
//!
//! [cron]
//! executor = "claude-code"
//! interval_ms = 300000
//!
//! [[agents]]
//! id = "planner"
//! timeout_seconds = 1800
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while parsing a workflow definition
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("missing required field: {0}")]
    MissingField(String),
    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

/// A workflow as seen by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSpec {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub cron: Option<CronSpec>,
}

/// One recurring agent of a workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub id: String,
    /// Per-turn timeout forwarded to the gateway
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl AgentSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timeout_seconds: None,
        }
    }
}

/// Dispatch settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSpec {
    /// `openclaw` or `claude-code`; anything else is ignored
    #[serde(default)]
    pub executor: Option<String>,
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

impl WorkflowSpec {
    /// Configured firing interval, if any
    pub fn interval(&self) -> Option<Duration> {
        self.cron
            .as_ref()
            .and_then(|c| c.interval_ms)
            .map(Duration::from_millis)
    }
}

/// Parse and validate a workflow definition from TOML content
pub fn parse_workflow(content: &str) -> Result<WorkflowSpec, ParseError> {
    let workflow: WorkflowSpec = toml::from_str(content)?;

    if workflow.id.trim().is_empty() {
        return Err(ParseError::MissingField("id".to_string()));
    }

    let mut seen = HashSet::new();
    for (i, agent) in workflow.agents.iter().enumerate() {
        if agent.id.trim().is_empty() {
            return Err(ParseError::MissingField(format!("agents[{}].id", i)));
        }
        if agent.id.contains('/') {
            return Err(ParseError::InvalidFormat(format!(
                "agent id must not contain '/': {}",
                agent.id
            )));
        }
        if !seen.insert(agent.id.as_str()) {
            return Err(ParseError::InvalidFormat(format!(
                "duplicate agent id: {}",
                agent.id
            )));
        }
    }

    if workflow.cron.as_ref().and_then(|c| c.interval_ms) == Some(0) {
        return Err(ParseError::InvalidFormat(
            "cron.interval_ms must be greater than zero".to_string(),
        ));
    }

    Ok(workflow)
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
