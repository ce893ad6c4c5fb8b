// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod browser;
pub mod docstore;
pub mod handlers;
pub mod kv;
pub mod llm;
pub mod object_storage;
pub mod runtime_api;
pub mod template_engine;

pub use browser::RemoteBrowser;
pub use docstore::{with_session, DataApiDocumentStore, InMemoryDocumentStore};
pub use kv::{InMemoryKeyValueStore, RestKeyValueStore};
pub use llm::{MemoryCheckpointer, OpenAiChatModel};
pub use runtime_api::RuntimeApiClient;
pub use template_engine::{TemplateEngine, TemplateVars};

use crate::domain::collaborators::CollaboratorError;

/// Translate a non-success HTTP status from a collaborator into the domain error.
pub(crate) fn status_error(status: reqwest::StatusCode, body: String, resource: &str) -> CollaboratorError {
    match status.as_u16() {
        401 | 403 => CollaboratorError::Authentication(body),
        404 => CollaboratorError::NotFound(resource.to_string()),
        429 => CollaboratorError::RateLimit,
        _ => CollaboratorError::Provider(format!("HTTP {}: {}", status, body)),
    }
}

pub(crate) fn network_error(e: reqwest::Error) -> CollaboratorError {
    CollaboratorError::Network(e.to_string())
}
