// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! HTTP Listener Routes
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `GET /healthz` | liveness, lists registered handlers |
//! | `GET /metrics` | Prometheus exposition |
//! | `POST /invoke/{handler}` | plain invocation: JSON event in, Handler Result out |
//! | `POST /chat/completions` | OpenAI-compatible front for the `agent` handler |
//! | `POST /send-message` | agent turn keyed by `threadId` |
//! | `POST /v1/aibot/bots/{agent_id}/send-message` | same, with the agent id in the path |
//!
//! The environment gate wraps every route. Handler failures are written as
//! `{error, message, code}` with the status mapped from the error kind.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::application::invocation::InvocationService;
use crate::domain::collaborators::ChatMessage;
use crate::domain::handler::{HandlerError, HandlerOutput, HttpResponse};
use crate::domain::invocation::InvocationEvent;
use crate::presentation::middleware::{require_environment, GateState};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
const AGENT_HANDLER: &str = "agent";

pub struct AppState {
    pub service: Arc<InvocationService>,
    pub metrics: Option<PrometheusHandle>,
}

pub fn create_router(
    service: Arc<InvocationService>,
    gate: GateState,
    metrics: Option<PrometheusHandle>,
) -> Router {
    let state = Arc::new(AppState { service, metrics });

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .route("/invoke/{handler}", post(invoke_handler))
        .route("/chat/completions", post(chat_completions))
        .route("/send-message", post(send_message))
        .route("/v1/aibot/bots/{agent_id}/send-message", post(send_message_for_agent))
        .layer(from_fn_with_state(gate, require_environment))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body())).into_response()
    }
}

fn request_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_event(body: &Bytes) -> Result<InvocationEvent, HandlerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(InvocationEvent::empty());
    }
    serde_json::from_slice::<Value>(body)
        .map(InvocationEvent::new)
        .map_err(|_| HandlerError::InvalidEvent("request body is not a json string".into()))
}

fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(value) = HeaderValue::from_str(request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// Write an HTTP-shaped Handler Result as a real response.
fn http_response(output: HttpResponse) -> Result<Response, HandlerError> {
    let body = output.body_bytes()?;
    let status = StatusCode::from_u16(output.status_code)
        .map_err(|e| HandlerError::Internal(format!("invalid status code: {}", e)))?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    for (name, value) in &output.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HandlerError::Internal(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| HandlerError::Internal(format!("invalid header value: {}", e)))?;
        response.headers_mut().insert(name, value);
    }
    Ok(response)
}

async fn run(
    state: &AppState,
    handler: &str,
    event: InvocationEvent,
    request_id: Option<String>,
) -> (String, Result<HandlerOutput, HandlerError>) {
    let mut ctx = state.service.new_context();
    if let Some(id) = request_id {
        ctx = ctx.with_request_id(id);
    }
    let id = ctx.request_id.clone();
    (id, state.service.invoke(handler, event, ctx).await)
}

async fn healthz(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "handlers": state.service.registry().names(),
    }))
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.metrics.as_ref().map(|h| h.render()).unwrap_or_default();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

async fn invoke_handler(
    State(state): State<Arc<AppState>>,
    Path(handler): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let event = match parse_event(&body) {
        Ok(event) => event,
        Err(e) => return e.into_response(),
    };

    let (id, result) = run(&state, &handler, event, request_id(&headers)).await;
    let response = match result {
        Ok(HandlerOutput::Http(output)) => http_response(output).unwrap_or_else(|e| e.into_response()),
        Ok(output) => Json(output).into_response(),
        Err(e) => e.into_response(),
    };
    with_request_id(response, &id)
}

// ============================================================================
// Agent routes
// ============================================================================

#[derive(Debug, Deserialize)]
struct ChatCompletionRequest {
    #[serde(default)]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    #[serde(default)]
    stream: bool,
    /// Conversation key; OpenAI clients send it as `user`.
    #[serde(default, alias = "user")]
    thread_id: Option<String>,
}

async fn chat_completions(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request: ChatCompletionRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => return HandlerError::InvalidEvent(format!("invalid chat request: {}", e)).into_response(),
    };
    if request.stream {
        return HandlerError::InvalidEvent("streaming responses are not supported".into())
            .into_response();
    }
    debug!(requested_model = ?request.model, "Chat completion request");

    let event = InvocationEvent::new(json!({
        "messages": request.messages,
        "thread_id": request.thread_id,
    }));
    let (id, result) = run(&state, AGENT_HANDLER, event, request_id(&headers)).await;

    let response = match result {
        Ok(output) => {
            let out = output.to_json();
            Json(json!({
                "id": format!("chatcmpl-{}", uuid::Uuid::new_v4().simple()),
                "object": "chat.completion",
                "created": chrono::Utc::now().timestamp(),
                "model": out.get("model").cloned().or(request.model.map(Value::String)).unwrap_or(Value::Null),
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": out["reply"]},
                    "finish_reason": out.get("finish_reason").cloned().unwrap_or_else(|| json!("stop")),
                }],
                "usage": out.get("usage").cloned().unwrap_or_else(|| json!({})),
                "thread_id": out["thread_id"],
            }))
            .into_response()
        }
        Err(e) => e.into_response(),
    };
    with_request_id(response, &id)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendMessageRequest {
    #[serde(default, alias = "thread_id")]
    thread_id: Option<String>,
    #[serde(default, alias = "run_id")]
    run_id: Option<String>,
    messages: Vec<ChatMessage>,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    agent_turn(&state, None, &headers, &body).await
}

async fn send_message_for_agent(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    agent_turn(&state, Some(agent_id), &headers, &body).await
}

async fn agent_turn(
    state: &AppState,
    agent_id: Option<String>,
    headers: &HeaderMap,
    body: &Bytes,
) -> Response {
    let request: SendMessageRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(e) => return HandlerError::InvalidEvent(format!("invalid send-message request: {}", e)).into_response(),
    };
    let run_id = request
        .run_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let event = InvocationEvent::new(json!({
        "messages": request.messages,
        "thread_id": request.thread_id,
    }));
    let (id, result) = run(state, AGENT_HANDLER, event, request_id(headers)).await;

    let response = match result {
        Ok(output) => {
            let out = output.to_json();
            let mut reply = json!({
                "threadId": out["thread_id"],
                "runId": run_id,
                "messages": [{"role": "assistant", "content": out["reply"]}],
            });
            if let Some(agent_id) = agent_id {
                reply["agentId"] = Value::String(agent_id);
            }
            Json(reply).into_response()
        }
        Err(e) => e.into_response(),
    };
    with_request_id(response, &id)
}
