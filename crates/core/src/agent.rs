// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity and remote cron job naming

use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace prefix for every cron job this system owns on the gateway
pub const JOB_NAMESPACE: &str = "antfarm";

/// Identity of a scheduled agent: `<workflow>/<agent>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentKey {
    pub workflow_id: String,
    pub agent_id: String,
}

impl AgentKey {
    pub fn new(workflow_id: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            agent_id: agent_id.into(),
        }
    }

    /// Gateway job name for this agent
    pub fn job_name(&self) -> String {
        job_name(&self.workflow_id, &self.agent_id)
    }

    pub fn belongs_to(&self, workflow_id: &str) -> bool {
        self.workflow_id == workflow_id
    }
}

impl fmt::Display for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.workflow_id, self.agent_id)
    }
}

/// `antfarm/<workflow>/<agent>`
pub fn job_name(workflow_id: &str, agent_id: &str) -> String {
    format!("{}{}", job_prefix(workflow_id), agent_id)
}

/// `antfarm/<workflow>/`, the prefix shared by all of a workflow's jobs.
///
/// The trailing slash keeps `feature` from matching `feature-dev`.
pub fn job_prefix(workflow_id: &str) -> String {
    format!("{}/{}/", JOB_NAMESPACE, workflow_id)
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
