// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use serde_json::{json, Value};
use webfunc_core::application::{EnvironmentGate, HandlerRegistry, InvocationService};
use webfunc_core::domain::environment::MapEnv;
use webfunc_core::domain::handler::{FunctionHandler, HandlerError, HandlerOutput};
use webfunc_core::domain::invocation::{InvocationContext, InvocationEvent};
use webfunc_core::presentation::{create_router, GateState};

pub const OPENAI_ENV: [(&str, &str); 3] = [
    ("OPENAI_MODEL", "gpt-4o-mini"),
    ("OPENAI_API_KEY", "sk-test"),
    ("OPENAI_BASE_URL", "https://llm.invalid/v1"),
];

/// Echoes its event and limits, and counts invocations.
#[derive(Default)]
pub struct CountingHandler {
    pub calls: AtomicUsize,
}

#[async_trait]
impl FunctionHandler for CountingHandler {
    fn name(&self) -> &'static str {
        "count"
    }

    async fn invoke(
        &self,
        event: InvocationEvent,
        ctx: &InvocationContext,
    ) -> Result<HandlerOutput, HandlerError> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(HandlerOutput::Json(json!({
            "calls": calls,
            "request_id": ctx.request_id,
            "memory_limit_mb": ctx.memory_limit_mb,
            "time_limit_ms": ctx.time_limit_ms,
            "event": event.into_payload(),
        })))
    }
}

pub fn openai_env() -> MapEnv {
    OPENAI_ENV.into_iter().collect()
}

/// Router with the default gate over `env` and the given handlers.
pub fn router(env: MapEnv, registry: HandlerRegistry) -> Router {
    let env = Arc::new(env);
    let service = Arc::new(InvocationService::new(registry, env.clone()));
    create_router(service, GateState::new(EnvironmentGate::default(), env), None)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
