// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Custom Runtime Loop
//
// Trigger-style bootstrap: announce readiness once, then fetch, invoke and
// report one event at a time until shutdown. Each event runs through the
// same invocation service as the HTTP listener.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::invocation::InvocationService;
use crate::domain::handler::FunctionHandler;
use crate::domain::invocation::InvocationEvent;
use crate::infrastructure::runtime_api::{NextInvocation, RuntimeApiClient};

const FETCH_BACKOFF: Duration = Duration::from_secs(1);

pub struct RuntimeLoop {
    service: Arc<InvocationService>,
    handler: Arc<dyn FunctionHandler>,
    client: RuntimeApiClient,
    max_invocations: Option<usize>,
}

impl RuntimeLoop {
    /// Fails when `handler` is not registered.
    pub fn new(service: Arc<InvocationService>, handler: &str, client: RuntimeApiClient) -> Result<Self> {
        let handler = service.registry().select(handler)?;
        Ok(Self {
            service,
            handler,
            client,
            max_invocations: None,
        })
    }

    /// Stop after `n` invocations.
    pub fn with_max_invocations(mut self, n: usize) -> Self {
        self.max_invocations = Some(n);
        self
    }

    pub async fn run<S>(self, shutdown: S) -> Result<usize>
    where
        S: Future<Output = ()>,
    {
        self.client
            .ready()
            .await
            .context("Failed to report runtime readiness")?;
        info!(handler = self.handler.name(), api = self.client.base_url(), "Runtime ready");

        tokio::pin!(shutdown);
        let mut handled = 0usize;

        while self.max_invocations.is_none_or(|max| handled < max) {
            let next = tokio::select! {
                next = self.client.next() => next,
                _ = &mut shutdown => {
                    info!("Runtime loop stopping");
                    break;
                }
            };

            match next {
                Ok(invocation) => {
                    self.handle(invocation).await;
                    handled += 1;
                }
                Err(e) => {
                    warn!("Failed to fetch next invocation: {}", e);
                    tokio::time::sleep(FETCH_BACKOFF).await;
                }
            }
        }

        Ok(handled)
    }

    async fn handle(&self, invocation: NextInvocation) {
        let mut ctx = self.service.new_context();
        if let Some(id) = invocation.request_id {
            ctx = ctx.with_request_id(id);
        }
        if invocation.memory_limit_mb.is_some() || invocation.time_limit_ms.is_some() {
            let memory = invocation.memory_limit_mb.unwrap_or(ctx.memory_limit_mb);
            let time = invocation.time_limit_ms.unwrap_or(ctx.time_limit_ms);
            ctx = ctx.with_limits(memory, time);
        }

        let event = InvocationEvent::new(invocation.event);
        let reported = match self
            .service
            .invoke_handler(self.handler.clone(), event, ctx)
            .await
        {
            Ok(output) => self.client.respond(&output).await,
            Err(e) => self.client.report_error(&e.body()).await,
        };

        if let Err(e) = reported {
            warn!("Failed to report invocation result: {}", e);
        }
    }
}
