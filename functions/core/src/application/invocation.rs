// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Invocation Service
//!
//! Runs one Function Handler for one Invocation Event:
//!
//! 1. select the handler by name
//! 2. gate its declared environment names (miss → `MissingConfiguration`,
//!    the handler never runs)
//! 3. invoke inside an `invocation` span, under the configured retry policy
//!    when the handler is idempotent and with a single attempt otherwise
//! 4. record call/failure/duration metrics
//!
//! Every bootstrap (HTTP listener, custom runtime loop, local invoke) goes
//! through this service, so failure translation happens in one place.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Uniform handler dispatch

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, Instrument};

use crate::application::gate::EnvironmentGate;
use crate::application::registry::HandlerRegistry;
use crate::application::retry::RetryPolicy;
use crate::domain::config::FunctionIdentity;
use crate::domain::environment::EnvSource;
use crate::domain::handler::{FunctionHandler, HandlerError, HandlerOutput};
use crate::domain::invocation::{InvocationContext, InvocationEvent};

pub struct InvocationService {
    registry: HandlerRegistry,
    env: Arc<dyn EnvSource>,
    retry: RetryPolicy,
    identity: FunctionIdentity,
}

impl InvocationService {
    pub fn new(registry: HandlerRegistry, env: Arc<dyn EnvSource>) -> Self {
        Self {
            registry,
            env,
            retry: RetryPolicy::default(),
            identity: FunctionIdentity::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_identity(mut self, identity: FunctionIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }

    /// Fresh context for one invocation, carrying the configured limits.
    pub fn new_context(&self) -> InvocationContext {
        InvocationContext::new(self.identity.name.clone())
            .with_limits(self.identity.memory_limit_mb, self.identity.time_limit_ms)
    }

    /// Invoke the handler registered under `name`.
    pub async fn invoke(
        &self,
        name: &str,
        event: InvocationEvent,
        ctx: InvocationContext,
    ) -> Result<HandlerOutput, HandlerError> {
        let handler = self
            .registry
            .select(name)
            .map_err(|e| HandlerError::NotFound(e.to_string()))?;
        self.invoke_handler(handler, event, ctx).await
    }

    pub async fn invoke_handler(
        &self,
        handler: Arc<dyn FunctionHandler>,
        event: InvocationEvent,
        mut ctx: InvocationContext,
    ) -> Result<HandlerOutput, HandlerError> {
        let name = handler.name();
        let span = tracing::info_span!(
            "invocation",
            request_id = %ctx.request_id,
            handler = name,
            trigger = %event.trigger(),
        );

        async move {
            metrics::counter!("function_calls_total", "handler" => name).increment(1);
            let started = Instant::now();

            let result: Result<HandlerOutput, HandlerError> = async {
                let gate = EnvironmentGate::new(handler.required_env().iter().copied());
                ctx.environment = gate.evaluate(self.env.as_ref()).into_result()?;

                let retry = if handler.idempotent() {
                    self.retry
                } else {
                    RetryPolicy::none()
                };

                let ctx = &ctx;
                retry
                    .run(|attempt| {
                        let handler = handler.clone();
                        let event = event.clone();
                        async move {
                            if attempt > 1 {
                                info!(attempt, "Re-invoking handler");
                            }
                            handler.invoke(event, ctx).await
                        }
                    })
                    .await
            }
            .await;

            let elapsed = started.elapsed();
            metrics::histogram!("function_duration_seconds", "handler" => name)
                .record(elapsed.as_secs_f64());

            match &result {
                Ok(_) => info!(elapsed_ms = elapsed.as_millis() as u64, "Invocation succeeded"),
                Err(e) => {
                    metrics::counter!(
                        "function_failures_total",
                        "handler" => name,
                        "code" => e.code()
                    )
                    .increment(1);
                    error!(code = e.code(), "Invocation failed: {}", e);
                }
            }

            result
        }
        .instrument(span)
        .await
    }
}
