// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Key-Value Store Adapters
//
// Redis over its REST interface: every command is a GET whose path segments
// are the command and its arguments, authenticated with a bearer token.
// Replies arrive as `{"result": ...}` or `{"error": "..."}`.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::domain::collaborators::{CollaboratorError, KeyValueStore};
use crate::infrastructure::{network_error, status_error};

pub struct RestKeyValueStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl RestKeyValueStore {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    fn command_url(&self, args: &[&str]) -> Result<Url, CollaboratorError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| CollaboratorError::Protocol(format!("invalid KV_REST_URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| CollaboratorError::Protocol("KV_REST_URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(args);
        Ok(url)
    }

    async fn command(&self, args: &[&str]) -> Result<Value, CollaboratorError> {
        let url = self.command_url(args)?;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text, args.first().copied().unwrap_or_default()));
        }

        let reply: RestReply = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Protocol(format!("Failed to parse reply: {}", e)))?;
        match reply.error {
            Some(error) => Err(CollaboratorError::Provider(error)),
            None => Ok(reply.result),
        }
    }
}

#[async_trait]
impl KeyValueStore for RestKeyValueStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), CollaboratorError> {
        match self.command(&["set", key, value]).await? {
            Value::String(ok) if ok == "OK" => Ok(()),
            other => Err(CollaboratorError::Protocol(format!("unexpected SET reply: {}", other))),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError> {
        match self.command(&["get", key]).await? {
            Value::Null => Ok(None),
            Value::String(value) => Ok(Some(value)),
            other => Ok(Some(other.to_string())),
        }
    }
}

/// Process-local store for tests and offline invocation.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: DashMap<String, String>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn set(&self, key: &str, value: &str) -> Result<(), CollaboratorError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_over_rest() {
        let mut server = mockito::Server::new_async().await;
        let set = server
            .mock("GET", "/set/greeting/hello%20world")
            .match_header("authorization", "Bearer secret")
            .with_body(r#"{"result":"OK"}"#)
            .create_async()
            .await;
        let get = server
            .mock("GET", "/get/greeting")
            .match_header("authorization", "Bearer secret")
            .with_body(r#"{"result":"hello world"}"#)
            .create_async()
            .await;

        let store = RestKeyValueStore::new(server.url(), "secret");
        store.set("greeting", "hello world").await.unwrap();
        assert_eq!(store.get("greeting").await.unwrap().as_deref(), Some("hello world"));

        set.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get/nothing")
            .with_body(r#"{"result":null}"#)
            .create_async()
            .await;

        let store = RestKeyValueStore::new(format!("{}/", server.url()), "t");
        assert_eq!(store.get("nothing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unauthorized_maps_to_authentication() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/get/k")
            .with_status(401)
            .with_body("bad token")
            .create_async()
            .await;

        let store = RestKeyValueStore::new(server.url(), "wrong");
        let err = store.get("k").await.unwrap_err();
        assert_eq!(err, CollaboratorError::Authentication("bad token".into()));
    }

    #[tokio::test]
    async fn error_envelope_is_provider_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/set/k/v")
            .with_body(r#"{"error":"ERR max requests limit exceeded"}"#)
            .create_async()
            .await;

        let store = RestKeyValueStore::new(server.url(), "t");
        let err = store.set("k", "v").await.unwrap_err();
        assert!(matches!(err, CollaboratorError::Provider(msg) if msg.contains("limit exceeded")));
    }

    #[tokio::test]
    async fn in_memory_store_round_trip() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get("a").await.unwrap(), None);
        store.set("a", "1").await.unwrap();
        store.set("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
        assert_eq!(store.len(), 1);
    }
}
