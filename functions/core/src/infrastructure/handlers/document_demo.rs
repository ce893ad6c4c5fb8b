// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Document Store Demo Handler
//
// Inserts one document and lists the collection inside a single session that
// is released on every exit path.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::collaborators::DocumentStore;
use crate::domain::handler::{FunctionHandler, HandlerError, HandlerOutput};
use crate::domain::invocation::{InvocationContext, InvocationEvent};
use crate::infrastructure::docstore::{with_session, DataApiDocumentStore};

pub const DOCSTORE_URL: &str = "DOCSTORE_URL";
pub const DOCSTORE_API_KEY: &str = "DOCSTORE_API_KEY";
pub const DOCSTORE_DATABASE: &str = "DOCSTORE_DATABASE";
pub const DOCSTORE_COLLECTION: &str = "DOCSTORE_COLLECTION";

#[derive(Default)]
pub struct DocumentDemoHandler {
    store: Option<Arc<dyn DocumentStore>>,
}

impl DocumentDemoHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self { store: Some(store) }
    }

    fn store(&self, ctx: &InvocationContext) -> Arc<dyn DocumentStore> {
        match &self.store {
            Some(store) => store.clone(),
            None => {
                let env = &ctx.environment;
                Arc::new(DataApiDocumentStore::new(
                    env.require(DOCSTORE_URL),
                    env.require(DOCSTORE_API_KEY),
                    env.require(DOCSTORE_DATABASE),
                    env.require(DOCSTORE_COLLECTION),
                ))
            }
        }
    }
}

fn object_field(body: &Value, name: &str, default: Value) -> Result<Value, HandlerError> {
    match body.get(name) {
        None | Some(Value::Null) => Ok(default),
        Some(value @ Value::Object(_)) => Ok(value.clone()),
        Some(_) => Err(HandlerError::InvalidEvent(format!("{} must be an object", name))),
    }
}

#[async_trait]
impl FunctionHandler for DocumentDemoHandler {
    fn name(&self) -> &'static str {
        "document-demo"
    }

    fn required_env(&self) -> &'static [&'static str] {
        &[DOCSTORE_URL, DOCSTORE_API_KEY, DOCSTORE_DATABASE, DOCSTORE_COLLECTION]
    }

    async fn invoke(
        &self,
        event: InvocationEvent,
        ctx: &InvocationContext,
    ) -> Result<HandlerOutput, HandlerError> {
        let body = event.body_json()?;
        let document = object_field(&body, "document", json!({"name": "webfunc"}))?;
        let filter = object_field(&body, "filter", json!({}))?;

        let store = self.store(ctx);
        let (inserted_id, documents) = with_session(store.as_ref(), |session| {
            Box::pin(async move {
                let id = session.insert_one(document).await?;
                let documents = session.find(filter).await?;
                Ok((id, documents))
            })
        })
        .await?;

        Ok(HandlerOutput::Json(json!({
            "inserted_id": inserted_id,
            "documents": documents,
        })))
    }
}
