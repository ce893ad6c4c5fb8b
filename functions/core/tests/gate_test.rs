// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! Environment gate behaviour through the HTTP listener.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, openai_env, post_json, router, CountingHandler};
use serde_json::json;
use tower::ServiceExt;
use webfunc_core::application::HandlerRegistry;
use webfunc_core::domain::environment::MapEnv;

fn registry(handler: Arc<CountingHandler>) -> HandlerRegistry {
    HandlerRegistry::new().with(handler).unwrap()
}

#[tokio::test]
async fn missing_model_rejects_with_exact_body() {
    let handler = Arc::new(CountingHandler::default());
    let env = MapEnv::new()
        .with("OPENAI_API_KEY", "sk-test")
        .with("OPENAI_BASE_URL", "https://llm.invalid/v1");

    let response = router(env, registry(handler.clone()))
        .oneshot(post_json("/invoke/count", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await,
        json!({
            "error": "Service Unavailable",
            "message": "Missing required environment variables: OPENAI_MODEL",
            "code": "MISSING_ENV_CONFIG"
        })
    );
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn all_missing_names_listed_in_declared_order() {
    let handler = Arc::new(CountingHandler::default());
    let env = MapEnv::new().with("OPENAI_API_KEY", "");

    let response = router(env, registry(handler.clone()))
        .oneshot(post_json("/invoke/count", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "Missing required environment variables: OPENAI_MODEL, OPENAI_API_KEY, OPENAI_BASE_URL"
    );
    assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn health_check_is_gated_too() {
    let response = router(MapEnv::new(), HandlerRegistry::new())
        .oneshot(
            axum::http::Request::builder()
                .uri("/healthz")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn complete_environment_reaches_handler_once() {
    let handler = Arc::new(CountingHandler::default());

    let response = router(openai_env(), registry(handler.clone()))
        .oneshot(post_json("/invoke/count", json!({"ping": true})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["calls"], 1);
    assert_eq!(body["event"], json!({"ping": true}));
    assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn gate_reevaluates_every_request() {
    let handler = Arc::new(CountingHandler::default());
    let app = router(openai_env(), registry(handler.clone()));

    for expected in 1..=3 {
        let response = app
            .clone()
            .oneshot(post_json("/invoke/count", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["calls"], expected);
    }
}
