// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Function Handler
//!
//! The single externally-invocable operation of a serverless unit, its
//! result shape and the one error type every handler returns.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** `FunctionHandler` trait, `HandlerOutput`, `HandlerError`

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::collaborators::CollaboratorError;
use crate::domain::environment::{MissingEnvironment, ServiceUnavailableBody, MISSING_ENV_CONFIG};
use crate::domain::invocation::{InvocationContext, InvocationEvent};

/// Contract implemented by every function in this workspace.
///
/// A handler extracts what it needs from the event, performs exactly one
/// delegated call to an external collaborator and maps the outcome.
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    /// Name the handler is registered and selected under.
    fn name(&self) -> &'static str;

    /// Environment names that must be non-empty before `invoke` runs.
    fn required_env(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether repeating `invoke` for the same event has no further effect.
    /// Only idempotent handlers are re-invoked under a retry policy.
    fn idempotent(&self) -> bool {
        false
    }

    async fn invoke(
        &self,
        event: InvocationEvent,
        ctx: &InvocationContext,
    ) -> Result<HandlerOutput, HandlerError>;
}

/// HTTP-shaped handler result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl HttpResponse {
    pub fn new(status_code: u16, content_type: &str, body: impl Into<String>) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body: body.into(),
            is_base64_encoded: false,
        }
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::new(200, "text/html; charset=utf-8", body)
    }

    pub fn binary(content_type: &str, data: &[u8]) -> Self {
        let mut response = Self::new(
            200,
            content_type,
            base64::engine::general_purpose::STANDARD.encode(data),
        );
        response.is_base64_encoded = true;
        response
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Raw body bytes, decoding base64 when flagged.
    pub fn body_bytes(&self) -> Result<Vec<u8>, HandlerError> {
        if self.is_base64_encoded {
            base64::engine::general_purpose::STANDARD
                .decode(&self.body)
                .map_err(|e| HandlerError::Internal(format!("invalid base64 body: {}", e)))
        } else {
            Ok(self.body.clone().into_bytes())
        }
    }
}

/// JSON-serialisable success value of one invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    Text(String),
    /// Serialised as a base64 string.
    Binary(Bytes),
    Json(Value),
    Http(HttpResponse),
}

impl HandlerOutput {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Binary(data) => {
                Value::String(base64::engine::general_purpose::STANDARD.encode(data))
            }
            Self::Json(value) => value.clone(),
            Self::Http(response) => serde_json::to_value(response).unwrap_or(Value::Null),
        }
    }
}

impl Serialize for HandlerOutput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(text) => serializer.serialize_str(text),
            Self::Binary(data) => serializer
                .serialize_str(&base64::engine::general_purpose::STANDARD.encode(data)),
            Self::Json(value) => value.serialize(serializer),
            Self::Http(response) => response.serialize(serializer),
        }
    }
}

/// Failure of one invocation, classified for the bootstrap to translate.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    MissingConfiguration(MissingEnvironment),

    #[error("Collaborator call failed: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Template render failed: {0}")]
    Render(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Machine-readable code surfaced to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEvent(_) => "INVALID_EVENT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::MissingConfiguration(_) => MISSING_ENV_CONFIG,
            Self::Collaborator(_) => "COLLABORATOR_ERROR",
            Self::Render(_) => "RENDER_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status an HTTP-style bootstrap answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidEvent(_) => 400,
            Self::NotFound(_) => 404,
            Self::MissingConfiguration(_) => 503,
            Self::Collaborator(_) => 502,
            Self::Render(_) | Self::Internal(_) => 500,
        }
    }

    /// Only collaborator failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Collaborator(e) if e.is_transient())
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            Self::MissingConfiguration(missing) => missing.body().into(),
            other => ErrorBody {
                error: reason_phrase(other.status_code()).to_string(),
                message: other.to_string(),
                code: other.code().to_string(),
            },
        }
    }
}

impl From<MissingEnvironment> for HandlerError {
    fn from(missing: MissingEnvironment) -> Self {
        Self::MissingConfiguration(missing)
    }
}

/// `{error, message, code}` body shared by all error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub code: String,
}

impl From<ServiceUnavailableBody> for ErrorBody {
    fn from(body: ServiceUnavailableBody) -> Self {
        Self {
            error: body.error,
            message: body.message,
            code: body.code,
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        404 => "Not Found",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Internal Server Error",
    }
}
