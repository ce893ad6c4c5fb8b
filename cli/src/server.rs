// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// HTTP Listener Bootstrap
//
// Wires configuration, the handler registry and the environment gate into
// the axum router, then serves it until SIGINT or SIGTERM.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tracing::{info, warn};

use webfunc_core::application::{EnvironmentGate, InvocationService, RetryPolicy};
use webfunc_core::domain::config::FunctionConfig;
use webfunc_core::domain::environment::EnvSource;
use webfunc_core::infrastructure::handlers::default_registry;
use webfunc_core::presentation::{create_router, GateState};

/// Invocation service over every bundled handler.
pub fn build_service(config: &FunctionConfig, env: Arc<dyn EnvSource>) -> Result<Arc<InvocationService>> {
    let registry = default_registry(env.as_ref(), &config.agent).context("Failed to build handler registry")?;
    info!("Registered handlers: {}", registry.names().join(", "));

    let service = InvocationService::new(registry, env)
        .with_retry(RetryPolicy::from(&config.retry))
        .with_identity(config.function.clone());
    Ok(Arc::new(service))
}

/// Router with the configured gate in front of every route.
pub fn build_router(
    config: &FunctionConfig,
    service: Arc<InvocationService>,
    env: Arc<dyn EnvSource>,
    metrics: Option<PrometheusHandle>,
) -> axum::Router {
    let gate = GateState::new(EnvironmentGate::new(&config.gate.required_env), env);
    create_router(service, gate, metrics)
}

fn install_metrics_recorder() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Metrics recorder unavailable, /metrics will be empty: {}", e);
            None
        }
    }
}

pub async fn serve(config: FunctionConfig, env: Arc<dyn EnvSource>) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let service = build_service(&config, Arc::clone(&env))?;
    let app = build_router(&config, service, env, install_metrics_recorder());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(
        required_env = ?config.gate.required_env,
        "webfunc listening on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP listener failed")?;

    info!("webfunc stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use webfunc_core::domain::environment::MapEnv;

    fn env() -> Arc<dyn EnvSource> {
        Arc::new(
            MapEnv::new()
                .with("OPENAI_MODEL", "gpt-4o-mini")
                .with("OPENAI_API_KEY", "sk-test")
                .with("OPENAI_BASE_URL", "https://llm.invalid/v1"),
        )
    }

    #[test]
    fn service_registers_bundled_handlers() {
        let service = build_service(&FunctionConfig::default(), env()).unwrap();
        assert_eq!(service.registry().len(), 6);
        assert!(service.registry().get("thumbnail").is_some());
    }

    #[test]
    fn service_carries_function_identity() {
        let mut config = FunctionConfig::default();
        config.function.name = "thumbs".into();
        let service = build_service(&config, env()).unwrap();
        assert_eq!(service.new_context().function_name, "thumbs");
    }

    #[tokio::test]
    async fn router_uses_configured_gate() {
        let mut config = FunctionConfig::default();
        config.gate.required_env = vec!["THUMBNAIL_BUCKET".into()];
        let service = build_service(&config, env()).unwrap();

        let response = build_router(&config, service, env(), None)
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn empty_gate_lets_everything_through() {
        let mut config = FunctionConfig::default();
        config.gate.required_env.clear();
        let env: Arc<dyn EnvSource> = Arc::new(MapEnv::new());
        let service = build_service(&config, Arc::clone(&env)).unwrap();

        let response = build_router(&config, service, env, None)
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
