// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Screenshot Handler
//
// Captures a PNG of the event's `url` through the browser service and
// returns it as a base64-encoded HTTP response.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::domain::collaborators::{BrowserAutomation, ScreenshotRequest};
use crate::domain::handler::{FunctionHandler, HandlerError, HandlerOutput, HttpResponse};
use crate::domain::invocation::{InvocationContext, InvocationEvent};
use crate::infrastructure::browser::RemoteBrowser;

pub const BROWSER_ENDPOINT: &str = "BROWSER_ENDPOINT";

#[derive(Default)]
pub struct ScreenshotHandler {
    browser: Option<Arc<dyn BrowserAutomation>>,
}

impl ScreenshotHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_browser(browser: Arc<dyn BrowserAutomation>) -> Self {
        Self {
            browser: Some(browser),
        }
    }

    fn request(event: &InvocationEvent) -> Result<ScreenshotRequest, HandlerError> {
        let body = event.body_json()?;
        let url = body
            .get("url")
            .and_then(Value::as_str)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| HandlerError::InvalidEvent("url is required".into()))?;
        url::Url::parse(url)
            .map_err(|e| HandlerError::InvalidEvent(format!("invalid url {}: {}", url, e)))?;
        let full_page = body
            .get("fullPage")
            .or_else(|| body.get("full_page"))
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Ok(ScreenshotRequest {
            url: url.to_string(),
            full_page,
        })
    }
}

#[async_trait]
impl FunctionHandler for ScreenshotHandler {
    fn name(&self) -> &'static str {
        "screenshot"
    }

    fn idempotent(&self) -> bool {
        true
    }

    fn required_env(&self) -> &'static [&'static str] {
        &[BROWSER_ENDPOINT]
    }

    async fn invoke(
        &self,
        event: InvocationEvent,
        ctx: &InvocationContext,
    ) -> Result<HandlerOutput, HandlerError> {
        let request = Self::request(&event)?;
        let image = match &self.browser {
            Some(browser) => browser.screenshot(&request).await?,
            None => {
                RemoteBrowser::new(ctx.environment.require(BROWSER_ENDPOINT))
                    .screenshot(&request)
                    .await?
            }
        };

        Ok(HandlerOutput::Http(HttpResponse::binary("image/png", &image)))
    }
}
