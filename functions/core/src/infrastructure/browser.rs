// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Remote Browser Adapter
//
// Drives a headless-browser service over HTTP. The service owns the browser
// process: one request launches a page, navigates, captures a PNG and closes.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use tracing::debug;

use crate::domain::collaborators::{BrowserAutomation, CollaboratorError, ScreenshotRequest};
use crate::infrastructure::{network_error, status_error};

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G'];

pub struct RemoteBrowser {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl RemoteBrowser {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl BrowserAutomation for RemoteBrowser {
    async fn screenshot(&self, request: &ScreenshotRequest) -> Result<Bytes, CollaboratorError> {
        let url = format!("{}/screenshot", self.endpoint.trim_end_matches('/'));
        debug!(target_url = %request.url, "Requesting screenshot");

        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text, &request.url));
        }

        let image = response.bytes().await.map_err(network_error)?;
        if !image.starts_with(PNG_SIGNATURE) {
            return Err(CollaboratorError::Protocol(
                "browser service did not return a PNG image".into(),
            ));
        }
        Ok(image)
    }
}
