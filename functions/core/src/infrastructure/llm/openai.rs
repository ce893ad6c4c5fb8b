// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// OpenAI Chat Adapter
//
// Anti-corruption layer over `POST {base}/chat/completions`. Works with any
// OpenAI-compatible endpoint configured through OPENAI_BASE_URL.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::collaborators::{ChatCompletion, ChatMessage, ChatModel, CollaboratorError, TokenUsage};
use crate::infrastructure::{network_error, status_error};

pub struct OpenAiChatModel {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl OpenAiChatModel {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion, CollaboratorError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_text, &format!("model {}", self.model)));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Protocol(format!("Failed to parse response: {}", e)))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CollaboratorError::Provider("No response from model".into()))?;

        Ok(ChatCompletion {
            message: choice.message,
            model: body.model.unwrap_or_else(|| self.model.clone()),
            finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
            usage: body
                .usage
                .map(|u| TokenUsage {
                    prompt_tokens: u.prompt_tokens,
                    completion_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
        })
    }
}
