// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent turn prompts
//!
//! The prompt is opaque to the dispatcher. It tells the agent how to find
//! and report work through the step CLI.

/// Environment variable naming the step CLI command
pub const STEP_CLI_ENV: &str = "ANTFARM_CLI";

const DEFAULT_CLI: &str = "antfarm";

/// Builds the prompt handed to an agent on every turn
pub trait PromptBuilder: Clone + Send + Sync + 'static {
    fn build(&self, workflow_id: &str, agent_id: &str) -> String;
}

/// Prompt driving the peek, claim, complete/fail step protocol
#[derive(Debug, Clone)]
pub struct StepPromptBuilder {
    cli: String,
}

impl Default for StepPromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CLI)
    }
}

impl StepPromptBuilder {
    pub fn new(cli: impl Into<String>) -> Self {
        Self { cli: cli.into() }
    }

    pub fn from_env() -> Self {
        std::env::var(STEP_CLI_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Self::new)
            .unwrap_or_default()
    }
}

impl PromptBuilder for StepPromptBuilder {
    fn build(&self, workflow_id: &str, agent_id: &str) -> String {
        let agent = format!("{}/{}", workflow_id, agent_id);
        let cli = &self.cli;

        format!(
            r#"You are an Antfarm workflow agent. Check for pending work and execute it.

CRITICAL: once you claim a step you MUST call "step complete" or "step fail" before ending your session. Otherwise the workflow is stuck.

Step 1: check for pending work without claiming it:
```
{cli} step peek "{agent}"
```

If output is "NO_WORK", reply HEARTBEAT_OK and stop.

Step 2: claim the work:
```
{cli} step claim "{agent}"
```

If output is "NO_WORK" (another session took it), reply HEARTBEAT_OK and stop.
Otherwise the output is JSON: {{"stepId": "...", "runId": "...", "input": "..."}}
Save the stepId. The "input" field holds your fully resolved task instructions.

Step 3: do the work described in the input. Format your output with KEY: value lines as specified.

Step 4: report completion immediately after finishing:
```
cat <<'ANTFARM_EOF' > /tmp/antfarm-step-output.txt
STATUS: done
CHANGES: what you did
TESTS: what tests you ran
ANTFARM_EOF
cat /tmp/antfarm-step-output.txt | {cli} step complete "<stepId>"
```

If the work failed:
```
{cli} step fail "<stepId>" "description of what went wrong"
```

RULES:
1. Never end a session holding a claimed step without calling step complete or step fail
2. Write output to a file first, then pipe it via stdin
3. If unsure whether to complete or fail, call step fail with an explanation"#
        )
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
