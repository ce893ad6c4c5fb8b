// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! Listener routes with the bundled handlers behind them.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{body_json, openai_env, post_json, router, CountingHandler};
use serde_json::json;
use tower::ServiceExt;
use webfunc_core::application::HandlerRegistry;
use webfunc_core::domain::config::AgentConfig;
use webfunc_core::domain::environment::MapEnv;
use webfunc_core::infrastructure::handlers::{default_registry, AgentHandler, RenderHandler};
use webfunc_core::infrastructure::llm::MemoryCheckpointer;

fn render_registry() -> HandlerRegistry {
    HandlerRegistry::new()
        .with(Arc::new(RenderHandler::new()))
        .unwrap()
        .with(Arc::new(CountingHandler::default()))
        .unwrap()
}

#[tokio::test]
async fn healthz_reports_handlers() {
    let response = router(openai_env(), render_registry())
        .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["handlers"], json!(["count", "render"]));
}

#[tokio::test]
async fn metrics_without_recorder_is_empty() {
    let response = router(openai_env(), render_registry())
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn render_writes_real_html_response() {
    let response = router(openai_env(), render_registry())
        .oneshot(post_json(
            "/invoke/render",
            json!({"template": "<h1>${greeting}</h1>", "vars": {"greeting": "hi"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>hi</h1>");
}

#[tokio::test]
async fn request_id_header_is_propagated() {
    let mut request = post_json("/invoke/count", json!({}));
    request
        .headers_mut()
        .insert("x-request-id", "req-123".parse().unwrap());

    let response = router(openai_env(), render_registry())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.headers()["x-request-id"], "req-123");
    assert_eq!(body_json(response).await["request_id"], "req-123");
}

#[tokio::test]
async fn fresh_request_id_when_header_absent() {
    let response = router(openai_env(), render_registry())
        .oneshot(post_json("/invoke/count", json!({})))
        .await
        .unwrap();

    let header = response.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&header).is_ok());
    assert_eq!(body_json(response).await["request_id"], header);
}

#[tokio::test]
async fn unknown_handler_lists_available_names() {
    let response = router(openai_env(), render_registry())
        .oneshot(post_json("/invoke/missing", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
    assert_eq!(
        body["message"],
        "No function named missing available, available functions are: count, render"
    );
}

#[tokio::test]
async fn non_json_body_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/invoke/count")
        .body(Body::from("not json"))
        .unwrap();
    let response = router(openai_env(), render_registry())
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "INVALID_EVENT");
    assert_eq!(body["message"], "Invalid event: request body is not a json string");
}

#[tokio::test]
async fn handler_specific_environment_is_gated_per_invocation() {
    let registry = default_registry(&MapEnv::new(), &AgentConfig::default()).unwrap();
    let response = router(openai_env(), registry)
        .oneshot(post_json("/invoke/kv-demo", json!({"key": "k", "value": "v"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "Service Unavailable",
            "message": "Missing required environment variables: KV_REST_URL, KV_REST_TOKEN",
            "code": "MISSING_ENV_CONFIG"
        })
    );
}

#[tokio::test]
async fn kv_demo_against_rest_store() {
    let mut server = mockito::Server::new_async().await;
    let set = server
        .mock("GET", "/set/lang/rust")
        .match_header("authorization", "Bearer kv-token")
        .with_body(r#"{"result":"OK"}"#)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/get/lang")
        .with_body(r#"{"result":"rust"}"#)
        .create_async()
        .await;

    let env = openai_env()
        .with("KV_REST_URL", server.url())
        .with("KV_REST_TOKEN", "kv-token");
    let registry = default_registry(&env, &AgentConfig::default()).unwrap();

    let response = router(env, registry)
        .oneshot(post_json("/invoke/kv-demo", json!({"key": "lang", "value": "rust"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"key": "lang", "value": "rust"}));
    set.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn collaborator_failure_is_bad_gateway() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/set/hello/world")
        .with_status(401)
        .with_body("bad token")
        .create_async()
        .await;

    let env = openai_env()
        .with("KV_REST_URL", server.url())
        .with("KV_REST_TOKEN", "wrong");
    let registry = default_registry(&env, &AgentConfig::default()).unwrap();

    let response = router(env, registry)
        .oneshot(post_json("/invoke/kv-demo", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["code"], "COLLABORATOR_ERROR");
    assert_eq!(body["error"], "Bad Gateway");
}

fn completion_body(content: &str) -> String {
    json!({
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 4, "completion_tokens": 2, "total_tokens": 6}
    })
    .to_string()
}

#[tokio::test]
async fn chat_completions_fronts_the_agent() {
    let mut server = mockito::Server::new_async().await;
    let llm = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .with_body(completion_body("Hello there"))
        .create_async()
        .await;

    let env = openai_env().with("OPENAI_BASE_URL", format!("{}/v1", server.url()));
    let registry = HandlerRegistry::new()
        .with(Arc::new(AgentHandler::new(Arc::new(MemoryCheckpointer::new()))))
        .unwrap();

    let response = router(env, registry)
        .oneshot(post_json(
            "/chat/completions",
            json!({"model": "gpt-4o-mini", "messages": [{"role": "user", "content": "Hi"}]}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["choices"][0]["message"]["content"], "Hello there");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
    assert_eq!(body["usage"]["total_tokens"], 6);
    llm.assert_async().await;
}

#[tokio::test]
async fn send_message_keeps_thread() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_body(completion_body("noted"))
        .expect(2)
        .create_async()
        .await;

    let env = openai_env().with("OPENAI_BASE_URL", server.url());
    let registry = HandlerRegistry::new()
        .with(Arc::new(AgentHandler::new(Arc::new(MemoryCheckpointer::new()))))
        .unwrap();
    let app = router(env, registry);

    let first = app
        .clone()
        .oneshot(post_json(
            "/send-message",
            json!({"threadId": "thread-9", "messages": [{"role": "user", "content": "remember 9"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_json(first).await;
    assert_eq!(first["threadId"], "thread-9");
    assert_eq!(first["messages"][0]["content"], "noted");

    let second = app
        .oneshot(post_json(
            "/v1/aibot/bots/bot-1/send-message",
            json!({"threadId": "thread-9", "runId": "run-2", "messages": [{"role": "user", "content": "again"}]}),
        ))
        .await
        .unwrap();
    let second = body_json(second).await;
    assert_eq!(second["runId"], "run-2");
    assert_eq!(second["agentId"], "bot-1");
}

#[tokio::test]
async fn streaming_chat_is_rejected() {
    let registry = HandlerRegistry::new()
        .with(Arc::new(AgentHandler::new(Arc::new(MemoryCheckpointer::new()))))
        .unwrap();
    let response = router(openai_env(), registry)
        .oneshot(post_json(
            "/chat/completions",
            json!({"stream": true, "messages": [{"role": "user", "content": "Hi"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stateless_chat_requests_keep_memory_bounded() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_body(completion_body("ok"))
        .expect(40)
        .create_async()
        .await;

    let memory = Arc::new(MemoryCheckpointer::bounded(&AgentConfig {
        max_threads: 5,
        max_messages: 10,
    }));
    let env = openai_env().with("OPENAI_BASE_URL", server.url());
    let registry = HandlerRegistry::new()
        .with(Arc::new(AgentHandler::new(memory.clone())))
        .unwrap();
    let app = router(env, registry);

    for _ in 0..40 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/chat/completions",
                json!({"messages": [{"role": "user", "content": "Hi"}]}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(memory.thread_count(), 5);
}
