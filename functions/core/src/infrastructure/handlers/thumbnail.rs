// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Thumbnail Handler
//
// Turns object-storage upload records into thumbnail URLs served by the
// storage provider's image processing. Directly invoked events may carry a
// single `url` instead of `Records`, and a `quality` override.

use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use crate::domain::handler::{FunctionHandler, HandlerError, HandlerOutput};
use crate::domain::invocation::{InvocationContext, InvocationEvent, Trigger};
use crate::infrastructure::object_storage::{parse_quality, thumbnail_url, ObjectLocation};

pub struct ThumbnailHandler {
    quality: u8,
}

impl ThumbnailHandler {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    fn locations(event: &InvocationEvent) -> Result<Vec<ObjectLocation>, HandlerError> {
        if event.trigger() == Trigger::ObjectStorage {
            return event
                .object_records()?
                .iter()
                .map(ObjectLocation::from_record)
                .collect();
        }
        match event.str_field("url")? {
            Some(url) => Ok(vec![ObjectLocation::parse(&url)?]),
            None => Err(HandlerError::InvalidEvent(
                "expected object storage Records or a url".into(),
            )),
        }
    }
}

#[async_trait]
impl FunctionHandler for ThumbnailHandler {
    fn name(&self) -> &'static str {
        "thumbnail"
    }

    fn idempotent(&self) -> bool {
        true
    }

    async fn invoke(
        &self,
        event: InvocationEvent,
        _ctx: &InvocationContext,
    ) -> Result<HandlerOutput, HandlerError> {
        let quality = match event.body_json()?.get("quality") {
            Some(Value::Number(n)) => parse_quality(Some(n.to_string().as_str()))?,
            Some(Value::String(s)) => parse_quality(Some(s.as_str()))?,
            _ => self.quality,
        };

        let mut urls: Vec<String> = Self::locations(&event)?
            .iter()
            .map(|loc| thumbnail_url(&loc.url, quality))
            .collect();
        info!(count = urls.len(), quality, "Built thumbnail urls");

        if urls.len() == 1 {
            Ok(HandlerOutput::Text(urls.remove(0)))
        } else {
            Ok(HandlerOutput::Json(Value::from(urls)))
        }
    }
}
