// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! External Collaborators
//!
//! Domain interfaces for the services the bundled handlers delegate to.
//! Implementations live in `infrastructure/`; handlers only see these traits,
//! which keeps vendor wire formats out of handler code and lets tests swap in
//! in-memory fakes.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Anti-corruption layer over key-value, document, browser and
//!   chat-model services

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Failure reported by an external collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected response: {0}")]
    Protocol(String),

    #[error("Provider error: {0}")]
    Provider(String),
}

impl CollaboratorError {
    /// Whether the same call might succeed if repeated.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimit | Self::Provider(_))
    }
}

// ============================================================================
// Key-value store
// ============================================================================

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), CollaboratorError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CollaboratorError>;
}

// ============================================================================
// Document store
// ============================================================================

/// Connection-like handle owned by exactly one invocation.
#[async_trait]
pub trait DocumentSession: Send {
    async fn insert_one(&mut self, document: Value) -> Result<String, CollaboratorError>;

    async fn find(&mut self, filter: Value) -> Result<Vec<Value>, CollaboratorError>;

    /// Release the session. Called on every exit path.
    async fn close(&mut self) -> Result<(), CollaboratorError>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn DocumentSession>, CollaboratorError>;
}

// ============================================================================
// Headless browser
// ============================================================================

/// Screenshot options passed to the browser service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotRequest {
    pub url: String,
    #[serde(default)]
    pub full_page: bool,
}

#[async_trait]
pub trait BrowserAutomation: Send + Sync {
    /// Launch a page, navigate to `request.url`, capture a PNG and close.
    async fn screenshot(&self, request: &ScreenshotRequest) -> Result<Bytes, CollaboratorError>;
}

// ============================================================================
// Chat model
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub message: ChatMessage,
    pub model: String,
    pub finish_reason: String,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion, CollaboratorError>;
}

/// Conversation history store used by the agent runtime.
pub trait Checkpointer: Send + Sync {
    fn load(&self, thread_id: &str) -> Vec<ChatMessage>;

    fn append(&self, thread_id: &str, messages: &[ChatMessage]);
}
