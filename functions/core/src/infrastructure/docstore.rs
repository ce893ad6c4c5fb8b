// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Document Store Adapters
//!
//! A document session is acquired, used and released within one invocation.
//! [`with_session`] owns that lifecycle: the session is closed whether the
//! work succeeds or fails, and a drop guard reports sessions abandoned by a
//! cancelled invocation.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** HTTP Data API adapter and an in-memory store for tests
//!
//! # Wire format
//!
//! `POST {base}/action/insertOne` and `POST {base}/action/find`, each with an
//! `api-key` header and a JSON body naming the database and collection.
//! Replies are `{"insertedId": ...}` and `{"documents": [...]}`.

use async_trait::async_trait;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::collaborators::{CollaboratorError, DocumentSession, DocumentStore};
use crate::domain::handler::HandlerError;
use crate::infrastructure::{network_error, status_error};

/// Run `work` against a fresh session and release it on every exit path.
///
/// A failure from `work` wins over a failure to close; a close failure after
/// successful work is reported as the invocation's error.
pub async fn with_session<T, F>(store: &dyn DocumentStore, work: F) -> Result<T, HandlerError>
where
    F: for<'s> FnOnce(&'s mut dyn DocumentSession) -> BoxFuture<'s, Result<T, HandlerError>>,
{
    let mut session = store.connect().await?;

    // Fires only if this future is dropped between acquire and release.
    let abandoned = scopeguard::guard((), |_| {
        warn!("Document session dropped before it was closed");
    });

    let result = work(session.as_mut()).await;
    let closed = session.close().await;
    scopeguard::ScopeGuard::into_inner(abandoned);

    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            warn!("Failed to close document session after error: {}", close_err);
            Err(e)
        }
    }
}

// ============================================================================
// Data API
// ============================================================================

#[derive(Debug, Clone)]
pub struct DataApiDocumentStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    database: String,
    collection: String,
    data_source: Option<String>,
}

impl DataApiDocumentStore {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            database: database.into(),
            collection: collection.into(),
            data_source: None,
        }
    }

    pub fn with_data_source(mut self, data_source: impl Into<String>) -> Self {
        self.data_source = Some(data_source.into());
        self
    }
}

#[async_trait]
impl DocumentStore for DataApiDocumentStore {
    async fn connect(&self) -> Result<Box<dyn DocumentSession>, CollaboratorError> {
        debug!(database = %self.database, collection = %self.collection, "Opening document session");
        Ok(Box::new(DataApiSession {
            store: self.clone(),
            closed: false,
        }))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    data_source: Option<&'a str>,
    database: &'a str,
    collection: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InsertOneReply {
    inserted_id: Value,
}

#[derive(Deserialize)]
struct FindReply {
    #[serde(default)]
    documents: Vec<Value>,
}

struct DataApiSession {
    store: DataApiDocumentStore,
    closed: bool,
}

impl DataApiSession {
    fn ensure_open(&self) -> Result<(), CollaboratorError> {
        if self.closed {
            return Err(CollaboratorError::Protocol("document session is closed".into()));
        }
        Ok(())
    }

    async fn action<R: DeserializeOwned>(
        &self,
        action: &str,
        request: &ActionRequest<'_>,
    ) -> Result<R, CollaboratorError> {
        self.ensure_open()?;
        let url = format!("{}/action/{}", self.store.base_url.trim_end_matches('/'), action);
        let response = self
            .store
            .client
            .post(&url)
            .header("api-key", &self.store.api_key)
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text, &self.store.collection));
        }

        response
            .json()
            .await
            .map_err(|e| CollaboratorError::Protocol(format!("Failed to parse {} reply: {}", action, e)))
    }

    fn request<'a>(&'a self, document: Option<&'a Value>, filter: Option<&'a Value>) -> ActionRequest<'a> {
        ActionRequest {
            data_source: self.store.data_source.as_deref(),
            database: &self.store.database,
            collection: &self.store.collection,
            document,
            filter,
        }
    }
}

#[async_trait]
impl DocumentSession for DataApiSession {
    async fn insert_one(&mut self, document: Value) -> Result<String, CollaboratorError> {
        let reply: InsertOneReply = self
            .action("insertOne", &self.request(Some(&document), None))
            .await?;
        Ok(match reply.inserted_id {
            Value::String(id) => id,
            // Extended JSON ObjectId: {"$oid": "..."}
            Value::Object(map) => map
                .get("$oid")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| Value::Object(map).to_string()),
            other => other.to_string(),
        })
    }

    async fn find(&mut self, filter: Value) -> Result<Vec<Value>, CollaboratorError> {
        let reply: FindReply = self.action("find", &self.request(None, Some(&filter))).await?;
        Ok(reply.documents)
    }

    async fn close(&mut self) -> Result<(), CollaboratorError> {
        self.closed = true;
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local collection that tracks how many sessions are open.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<Mutex<Vec<Value>>>,
    open_sessions: Arc<AtomicUsize>,
    fail_find: bool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `find` fail, to exercise error-path release.
    pub fn failing_find(mut self) -> Self {
        self.fail_find = true;
        self
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub fn documents(&self) -> Vec<Value> {
        self.documents.lock().clone()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn connect(&self) -> Result<Box<dyn DocumentSession>, CollaboratorError> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemorySession {
            store: self.clone(),
            open: true,
        }))
    }
}

struct InMemorySession {
    store: InMemoryDocumentStore,
    open: bool,
}

impl InMemorySession {
    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.store.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for InMemorySession {
    fn drop(&mut self) {
        self.release();
    }
}

fn matches_filter(document: &Value, filter: &Value) -> bool {
    match filter.as_object() {
        Some(fields) => fields.iter().all(|(k, v)| document.get(k) == Some(v)),
        None => true,
    }
}

#[async_trait]
impl DocumentSession for InMemorySession {
    async fn insert_one(&mut self, mut document: Value) -> Result<String, CollaboratorError> {
        let id = match document.get("_id") {
            Some(Value::String(existing)) => existing.clone(),
            Some(existing) => existing.to_string(),
            None => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                if let Some(map) = document.as_object_mut() {
                    map.insert("_id".to_string(), Value::String(id.clone()));
                }
                id
            }
        };
        self.store.documents.lock().push(document);
        Ok(id)
    }

    async fn find(&mut self, filter: Value) -> Result<Vec<Value>, CollaboratorError> {
        if self.store.fail_find {
            return Err(CollaboratorError::Network("connection closed by peer".into()));
        }
        Ok(self
            .store
            .documents
            .lock()
            .iter()
            .filter(|doc| matches_filter(doc, &filter))
            .cloned()
            .collect())
    }

    async fn close(&mut self) -> Result<(), CollaboratorError> {
        self.release();
        Ok(())
    }
}
