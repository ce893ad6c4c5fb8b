// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! Environment gate as axum middleware.
//!
//! Runs before every route. A rejected request never reaches `next`; an
//! accepted one is forwarded exactly once and untouched.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::gate::EnvironmentGate;
use crate::domain::environment::{EnvSource, GateDecision, MissingEnvironment};

#[derive(Clone)]
pub struct GateState {
    pub gate: Arc<EnvironmentGate>,
    pub env: Arc<dyn EnvSource>,
}

impl GateState {
    pub fn new(gate: EnvironmentGate, env: Arc<dyn EnvSource>) -> Self {
        Self {
            gate: Arc::new(gate),
            env,
        }
    }
}

/// 503 written when required configuration is absent.
#[derive(Debug)]
pub struct GateRejection(pub MissingEnvironment);

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, Json(self.0.body())).into_response()
    }
}

pub async fn require_environment(
    State(state): State<GateState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match state.gate.evaluate(state.env.as_ref()) {
        GateDecision::Pass(_) => next.run(req).await,
        GateDecision::Reject(missing) => GateRejection(missing).into_response(),
    }
}
