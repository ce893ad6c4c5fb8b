// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Custom Runtime API Client
//
// HTTP client for the platform's custom-runtime interface:
//
//   POST /runtime/init/ready            once, after start-up
//   GET  /runtime/invocation/next       long-poll for the next event
//   POST /runtime/invocation/response   success result
//   POST /runtime/invocation/error      failure result
//
// The endpoint is http://$SCF_RUNTIME_API:$SCF_RUNTIME_API_PORT.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::application::gate::EnvironmentGate;
use crate::domain::collaborators::CollaboratorError;
use crate::domain::environment::{EnvSource, MissingEnvironment};
use crate::infrastructure::{network_error, status_error};

pub const RUNTIME_API_HOST_ENV: &str = "SCF_RUNTIME_API";
pub const RUNTIME_API_PORT_ENV: &str = "SCF_RUNTIME_API_PORT";

/// One event handed out by `/runtime/invocation/next`.
#[derive(Debug, Clone, PartialEq)]
pub struct NextInvocation {
    pub request_id: Option<String>,
    pub memory_limit_mb: Option<u64>,
    pub time_limit_ms: Option<u64>,
    pub event: Value,
}

#[derive(Debug, Clone)]
pub struct RuntimeApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl RuntimeApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build the client from the platform-provided host and port.
    pub fn from_env(env: &dyn EnvSource) -> Result<Self, MissingEnvironment> {
        let snapshot = EnvironmentGate::new([RUNTIME_API_HOST_ENV, RUNTIME_API_PORT_ENV])
            .evaluate(env)
            .into_result()?;
        Ok(Self::new(format!(
            "http://{}:{}",
            snapshot.require(RUNTIME_API_HOST_ENV),
            snapshot.require(RUNTIME_API_PORT_ENV)
        )))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn ready(&self) -> Result<(), CollaboratorError> {
        self.post("/runtime/init/ready", &Value::String(String::new()))
            .await
    }

    pub async fn next(&self) -> Result<NextInvocation, CollaboratorError> {
        let url = format!("{}/runtime/invocation/next", self.base_url);
        let response = self.client.get(&url).send().await.map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text, "invocation/next"));
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let request_id = header("request_id");
        let memory_limit_mb = header("memory_limit_in_mb").and_then(|v| v.parse().ok());
        let time_limit_ms = header("time_limit_in_ms").and_then(|v| v.parse().ok());

        let body = response.text().await.map_err(network_error)?;
        let event = if body.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        };
        debug!(request_id = ?request_id, "Received invocation");

        Ok(NextInvocation {
            request_id,
            memory_limit_mb,
            time_limit_ms,
            event,
        })
    }

    pub async fn respond<T: Serialize + ?Sized>(&self, result: &T) -> Result<(), CollaboratorError> {
        self.post("/runtime/invocation/response", result).await
    }

    pub async fn report_error<T: Serialize + ?Sized>(&self, error: &T) -> Result<(), CollaboratorError> {
        self.post("/runtime/invocation/error", error).await
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), CollaboratorError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text, path));
        }
        Ok(())
    }
}
