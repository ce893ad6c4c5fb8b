// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Bundled Function Handlers
//!
//! Each handler extracts its inputs from the event, makes one delegated call
//! and maps the outcome. Collaborators are built from the validated
//! environment snapshot on every invocation unless a test injected one.
//!
//! | Name | Collaborator | Required environment |
//! |------|--------------|----------------------|
//! | `thumbnail` | image-processing URL convention | none |
//! | `kv-demo` | key-value store | `KV_REST_URL`, `KV_REST_TOKEN` |
//! | `document-demo` | document store | `DOCSTORE_URL`, `DOCSTORE_API_KEY`, `DOCSTORE_DATABASE`, `DOCSTORE_COLLECTION` |
//! | `screenshot` | headless browser | `BROWSER_ENDPOINT` |
//! | `render` | template engine | none |
//! | `agent` | chat model | `OPENAI_MODEL`, `OPENAI_API_KEY`, `OPENAI_BASE_URL` |

pub mod agent;
pub mod document_demo;
pub mod kv_demo;
pub mod render;
pub mod screenshot;
pub mod thumbnail;

pub use agent::AgentHandler;
pub use document_demo::DocumentDemoHandler;
pub use kv_demo::KvDemoHandler;
pub use render::RenderHandler;
pub use screenshot::ScreenshotHandler;
pub use thumbnail::ThumbnailHandler;

use anyhow::Context;
use std::sync::Arc;

use crate::application::registry::HandlerRegistry;
use crate::domain::config::AgentConfig;
use crate::domain::environment::EnvSource;
use crate::infrastructure::llm::MemoryCheckpointer;
use crate::infrastructure::object_storage::parse_quality;

pub const THUMBNAIL_QUALITY_ENV: &str = "THUMBNAIL_QUALITY";

/// Registry holding every bundled handler.
///
/// Optional settings (`THUMBNAIL_QUALITY`) are read once here; required
/// credentials are gated and read per invocation. The agent's conversation
/// memory is bounded by `agent`.
pub fn default_registry(env: &dyn EnvSource, agent: &AgentConfig) -> anyhow::Result<HandlerRegistry> {
    let quality = parse_quality(env.get(THUMBNAIL_QUALITY_ENV).as_deref())
        .with_context(|| format!("Invalid {}", THUMBNAIL_QUALITY_ENV))?;

    let registry = HandlerRegistry::new()
        .with(Arc::new(ThumbnailHandler::new(quality)))?
        .with(Arc::new(KvDemoHandler::new()))?
        .with(Arc::new(DocumentDemoHandler::new()))?
        .with(Arc::new(ScreenshotHandler::new()))?
        .with(Arc::new(RenderHandler::new()))?
        .with(Arc::new(AgentHandler::new(Arc::new(MemoryCheckpointer::bounded(agent)))))?;
    Ok(registry)
}
