// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-invocation agent logs
//!
//! One human-readable file per agent turn. Failures to write are logged
//! and otherwise ignored; a turn never fails because its log could not be
//! written.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Filesystem-safe file name for an invocation started at `at`
pub fn log_file_name(invocation_id: &str, at: DateTime<Utc>) -> String {
    let safe_id: String = invocation_id
        .replace('/', "__")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}.log", safe_id, at.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

fn render(
    invocation_id: &str,
    at: DateTime<Utc>,
    exit_code: Option<i32>,
    timed_out: bool,
    stdout: &str,
    stderr: &str,
) -> String {
    let exit = exit_code.map_or_else(|| "null".to_string(), |c| c.to_string());
    [
        format!("Agent: {}", invocation_id),
        format!("Time: {}", at.to_rfc3339()),
        format!("Exit: {}", exit),
        format!("Timed out: {}", timed_out),
        "--- STDOUT ---".to_string(),
        stdout.to_string(),
        "--- STDERR ---".to_string(),
        stderr.to_string(),
    ]
    .join("\n")
}

/// Write the log for one invocation, returning its path when it was written
pub async fn write_invocation_log(
    log_dir: &Path,
    invocation_id: &str,
    exit_code: Option<i32>,
    timed_out: bool,
    stdout: &str,
    stderr: &str,
) -> Option<PathBuf> {
    let now = Utc::now();
    let path = log_dir.join(log_file_name(invocation_id, now));
    let content = render(invocation_id, now, exit_code, timed_out, stdout, stderr);

    let written: std::io::Result<()> = async {
        tokio::fs::create_dir_all(log_dir).await?;
        tokio::fs::write(&path, content).await
    }
    .await;

    match written {
        Ok(()) => Some(path),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to write agent log");
            None
        }
    }
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
