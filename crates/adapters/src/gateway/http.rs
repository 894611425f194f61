// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway client for the `POST /tools/invoke` JSON tool protocol

use super::{CronGateway, CronJob, CronJobSpec, GatewayError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the gateway base URL
pub const GATEWAY_URL_ENV: &str = "ANTFARM_GATEWAY_URL";

/// Environment variable holding the gateway bearer token
pub const GATEWAY_TOKEN_ENV: &str = "OPENCLAW_GATEWAY_TOKEN";

const DEFAULT_URL: &str = "http://127.0.0.1:18789";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut config = Self::default();
        if let Some(url) = var(GATEWAY_URL_ENV) {
            config.url = url.trim_end_matches('/').to_string();
        }
        config.token = var(GATEWAY_TOKEN_ENV);
        config
    }
}

/// Cron gateway reached over HTTP
#[derive(Clone)]
pub struct HttpGateway {
    config: Arc<GatewayConfig>,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Invoke the cron tool with `args`, returning its `result` value
    async fn invoke(&self, args: Value) -> Result<Value, GatewayError> {
        let config = Arc::clone(&self.config);
        let body = json!({ "tool": "cron", "args": args });

        tokio::task::spawn_blocking(move || post_blocking(&config, &body))
            .await
            .map_err(|e| GatewayError::InvalidResponse(format!("request task failed: {}", e)))?
    }
}

fn post_blocking(config: &GatewayConfig, body: &Value) -> Result<Value, GatewayError> {
    let url = format!("{}/tools/invoke", config.url);
    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(config.timeout))
        .http_status_as_error(false)
        .build()
        .into();

    let mut request = agent.post(&url);
    if let Some(token) = &config.token {
        request = request.header("Authorization", format!("Bearer {}", token).as_str());
    }

    let unreachable = |e: ureq::Error| GatewayError::Unreachable {
        url: config.url.clone(),
        message: e.to_string(),
    };
    let mut response = request.send_json(body).map_err(unreachable)?;
    let status = response.status().as_u16();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| GatewayError::InvalidResponse(format!("failed to read response: {}", e)))?;

    parse_tool_response(status, &text)
}

/// Interpret a `/tools/invoke` response envelope
pub(crate) fn parse_tool_response(status: u16, body: &str) -> Result<Value, GatewayError> {
    match status {
        401 | 403 => {
            return Err(GatewayError::Rejected(format!(
                "HTTP {} (check {})",
                status, GATEWAY_TOKEN_ENV
            )))
        }
        404 => {
            return Err(GatewayError::Rejected(
                "cron tool is not exposed by this gateway".to_string(),
            ))
        }
        _ => {}
    }

    let envelope: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) if !(200..300).contains(&status) => {
            return Err(GatewayError::Rejected(format!("HTTP {}", status)));
        }
        Err(e) => return Err(GatewayError::InvalidResponse(e.to_string())),
    };

    if envelope.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(envelope.get("result").cloned().unwrap_or(Value::Null));
    }

    let message = envelope
        .pointer("/error/message")
        .and_then(Value::as_str)
        .or_else(|| envelope.get("error").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status));
    Err(GatewayError::Rejected(message))
}

/// Jobs from a `list` result, either `{"jobs": [...]}` or a bare array
pub(crate) fn parse_jobs(result: &Value) -> Result<Vec<CronJob>, GatewayError> {
    let jobs = result
        .get("jobs")
        .unwrap_or(result)
        .as_array()
        .ok_or_else(|| GatewayError::InvalidResponse("job list is not an array".to_string()))?;

    Ok(jobs
        .iter()
        .filter_map(|job| {
            let name = job.get("name").and_then(Value::as_str)?;
            let id = job.get("id").and_then(Value::as_str).unwrap_or(name);
            Some(CronJob {
                id: id.to_string(),
                name: name.to_string(),
            })
        })
        .collect())
}

#[async_trait]
impl CronGateway for HttpGateway {
    async fn create_job(&self, spec: &CronJobSpec) -> Result<(), GatewayError> {
        let job = serde_json::to_value(spec)
            .map_err(|e| GatewayError::InvalidResponse(format!("unencodable job: {}", e)))?;
        self.invoke(json!({ "action": "add", "job": job })).await?;
        Ok(())
    }

    async fn list_jobs(&self) -> Result<Vec<CronJob>, GatewayError> {
        let result = self.invoke(json!({ "action": "list" })).await?;
        parse_jobs(&result)
    }

    async fn delete_jobs_by_prefix(&self, prefix: &str) -> Result<usize, GatewayError> {
        let jobs = self.list_jobs().await?;
        let mut deleted = 0;
        for job in jobs.iter().filter(|j| j.name.starts_with(prefix)) {
            self.invoke(json!({ "action": "remove", "id": job.id }))
                .await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    async fn check_reachable(&self) -> Result<(), GatewayError> {
        self.list_jobs().await.map(|_| ())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
