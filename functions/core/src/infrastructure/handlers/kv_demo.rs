// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Key-Value Demo Handler
//
// SET the event's key/value, then GET it back through the same store.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::domain::collaborators::{CollaboratorError, KeyValueStore};
use crate::domain::handler::{FunctionHandler, HandlerError, HandlerOutput};
use crate::domain::invocation::{InvocationContext, InvocationEvent};
use crate::infrastructure::kv::RestKeyValueStore;

pub const KV_REST_URL: &str = "KV_REST_URL";
pub const KV_REST_TOKEN: &str = "KV_REST_TOKEN";

#[derive(Default)]
pub struct KvDemoHandler {
    store: Option<Arc<dyn KeyValueStore>>,
}

impl KvDemoHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store: Some(store) }
    }

    fn store(&self, ctx: &InvocationContext) -> Arc<dyn KeyValueStore> {
        match &self.store {
            Some(store) => store.clone(),
            None => Arc::new(RestKeyValueStore::new(
                ctx.environment.require(KV_REST_URL),
                ctx.environment.require(KV_REST_TOKEN),
            )),
        }
    }
}

#[async_trait]
impl FunctionHandler for KvDemoHandler {
    fn name(&self) -> &'static str {
        "kv-demo"
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn required_env(&self) -> &'static [&'static str] {
        &[KV_REST_URL, KV_REST_TOKEN]
    }

    async fn invoke(
        &self,
        event: InvocationEvent,
        ctx: &InvocationContext,
    ) -> Result<HandlerOutput, HandlerError> {
        let key = event.str_field("key")?.unwrap_or_else(|| "hello".to_string());
        let value = event.str_field("value")?.unwrap_or_else(|| "world".to_string());

        let store = self.store(ctx);
        store.set(&key, &value).await?;
        let stored = store
            .get(&key)
            .await?
            .ok_or_else(|| CollaboratorError::NotFound(format!("key {}", key)))?;

        Ok(HandlerOutput::Json(json!({ "key": key, "value": stored })))
    }
}
