// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Agent Runtime
//!
//! One conversational turn: prior thread history plus the new messages go to
//! the chat model, and the new messages plus the reply are checkpointed.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Glue between a `ChatModel` and a `Checkpointer`
//! - **Integration:** `agent` handler, `/chat/completions`, `/send-message`

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::domain::collaborators::{ChatCompletion, ChatMessage, ChatModel, Checkpointer, CollaboratorError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    pub thread_id: String,
    pub reply: String,
    #[serde(skip)]
    pub completion: Option<ChatCompletion>,
}

#[derive(Clone)]
pub struct AgentRuntime {
    model: Arc<dyn ChatModel>,
    checkpointer: Arc<dyn Checkpointer>,
    system_prompt: Option<String>,
}

impl AgentRuntime {
    pub fn new(model: Arc<dyn ChatModel>, checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self {
            model,
            checkpointer,
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Run one turn. A missing or empty `thread_id` starts a new thread.
    pub async fn run(
        &self,
        thread_id: Option<&str>,
        messages: Vec<ChatMessage>,
    ) -> Result<AgentReply, CollaboratorError> {
        let thread_id = thread_id
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let history = self.checkpointer.load(&thread_id);
        debug!(thread_id = %thread_id, history = history.len(), "Running agent turn");

        let mut request: Vec<ChatMessage> = Vec::with_capacity(history.len() + messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            request.push(ChatMessage::system(prompt.clone()));
        }
        request.extend(history);
        request.extend(messages.iter().cloned());

        let completion = self.model.complete(&request).await?;

        let mut turn = messages;
        turn.push(completion.message.clone());
        self.checkpointer.append(&thread_id, &turn);

        Ok(AgentReply {
            thread_id,
            reply: completion.message.content.clone(),
            completion: Some(completion),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::collaborators::TokenUsage;
    use crate::infrastructure::llm::MemoryCheckpointer;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Echoes how many messages it received; remembers the last request.
    #[derive(Default)]
    pub(crate) struct CountingModel {
        pub last_request: Mutex<Vec<ChatMessage>>,
    }

    #[async_trait]
    impl ChatModel for CountingModel {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatCompletion, CollaboratorError> {
            *self.last_request.lock() = messages.to_vec();
            Ok(ChatCompletion {
                message: ChatMessage::assistant(format!("seen {}", messages.len())),
                model: "fake".into(),
                finish_reason: "stop".into(),
                usage: TokenUsage::default(),
            })
        }
    }

    #[tokio::test]
    async fn history_carries_across_turns() {
        let model = Arc::new(CountingModel::default());
        let runtime = AgentRuntime::new(model.clone(), Arc::new(MemoryCheckpointer::new()));

        let first = runtime.run(Some("t1"), vec![ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(first.reply, "seen 1");

        let second = runtime.run(Some("t1"), vec![ChatMessage::user("again")]).await.unwrap();
        assert_eq!(second.reply, "seen 3");
        assert_eq!(second.thread_id, "t1");
    }

    #[tokio::test]
    async fn missing_thread_id_starts_new_thread() {
        let model = Arc::new(CountingModel::default());
        let runtime = AgentRuntime::new(model, Arc::new(MemoryCheckpointer::new()));

        let a = runtime.run(None, vec![ChatMessage::user("hi")]).await.unwrap();
        let b = runtime.run(Some(""), vec![ChatMessage::user("hi")]).await.unwrap();
        assert_ne!(a.thread_id, b.thread_id);
        assert_eq!(b.reply, "seen 1");
    }

    #[tokio::test]
    async fn system_prompt_leads_the_request() {
        let model = Arc::new(CountingModel::default());
        let runtime = AgentRuntime::new(model.clone(), Arc::new(MemoryCheckpointer::new()))
            .with_system_prompt("be brief");

        runtime.run(Some("t"), vec![ChatMessage::user("hi")]).await.unwrap();
        let request = model.last_request.lock().clone();
        assert_eq!(request[0], ChatMessage::system("be brief"));
        assert_eq!(request.len(), 2);
    }
}
