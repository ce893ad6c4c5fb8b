// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Agent Handler
//
// One conversational turn against the configured chat model. Thread history
// is kept by the checkpointer shared across invocations of this process.
//
// Accepted event fields: `messages` ([{role, content}]) or `message` (a
// single user message), `thread_id` / `threadId`, and an optional `system`
// prompt.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::collaborators::{ChatMessage, ChatModel, Checkpointer};
use crate::domain::handler::{FunctionHandler, HandlerError, HandlerOutput};
use crate::domain::invocation::{InvocationContext, InvocationEvent};
use crate::infrastructure::llm::{AgentRuntime, OpenAiChatModel};

pub const OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";

pub struct AgentHandler {
    checkpointer: Arc<dyn Checkpointer>,
    model: Option<Arc<dyn ChatModel>>,
}

impl AgentHandler {
    pub fn new(checkpointer: Arc<dyn Checkpointer>) -> Self {
        Self {
            checkpointer,
            model: None,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    fn model(&self, ctx: &InvocationContext) -> Arc<dyn ChatModel> {
        match &self.model {
            Some(model) => model.clone(),
            None => {
                let env = &ctx.environment;
                Arc::new(OpenAiChatModel::new(
                    env.require(OPENAI_BASE_URL),
                    env.require(OPENAI_API_KEY),
                    env.require(OPENAI_MODEL),
                ))
            }
        }
    }
}

/// Messages of the turn, from `messages` or a bare `message` string.
fn turn_messages(body: &Value) -> Result<Vec<ChatMessage>, HandlerError> {
    if let Some(messages) = body.get("messages").filter(|v| !v.is_null()) {
        let messages: Vec<ChatMessage> = serde_json::from_value(messages.clone()).map_err(|e| {
            HandlerError::InvalidEvent(format!("messages must be [{{role, content}}]: {}", e))
        })?;
        if messages.is_empty() {
            return Err(HandlerError::InvalidEvent("messages must not be empty".into()));
        }
        return Ok(messages);
    }
    match body.get("message").and_then(Value::as_str) {
        Some(text) if !text.is_empty() => Ok(vec![ChatMessage::user(text)]),
        _ => Err(HandlerError::InvalidEvent("message or messages is required".into())),
    }
}

#[async_trait]
impl FunctionHandler for AgentHandler {
    fn name(&self) -> &'static str {
        "agent"
    }

    fn required_env(&self) -> &'static [&'static str] {
        &[OPENAI_MODEL, OPENAI_API_KEY, OPENAI_BASE_URL]
    }

    async fn invoke(
        &self,
        event: InvocationEvent,
        ctx: &InvocationContext,
    ) -> Result<HandlerOutput, HandlerError> {
        let body = event.body_json()?;
        let messages = turn_messages(&body)?;
        let thread_id = body
            .get("thread_id")
            .or_else(|| body.get("threadId"))
            .and_then(Value::as_str);

        let mut runtime = AgentRuntime::new(self.model(ctx), self.checkpointer.clone());
        if let Some(system) = body.get("system").and_then(Value::as_str) {
            runtime = runtime.with_system_prompt(system);
        }

        let reply = runtime.run(thread_id, messages).await?;
        let mut output = json!({
            "thread_id": reply.thread_id,
            "reply": reply.reply,
        });
        if let Some(completion) = reply.completion {
            output["model"] = Value::String(completion.model);
            output["finish_reason"] = Value::String(completion.finish_reason);
            output["usage"] = json!(completion.usage);
        }
        Ok(HandlerOutput::Json(output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::agent::tests::CountingModel;
    use crate::infrastructure::llm::MemoryCheckpointer;

    fn handler() -> AgentHandler {
        AgentHandler::new(Arc::new(MemoryCheckpointer::new()))
            .with_model(Arc::new(CountingModel::default()))
    }

    async fn invoke(handler: &AgentHandler, event: Value) -> Result<HandlerOutput, HandlerError> {
        handler
            .invoke(InvocationEvent::new(event), &InvocationContext::new("agent"))
            .await
    }

    #[tokio::test]
    async fn thread_history_persists_between_invocations() {
        let handler = handler();
        invoke(&handler, json!({"message": "hi", "thread_id": "t-1"}))
            .await
            .unwrap();
        let HandlerOutput::Json(second) =
            invoke(&handler, json!({"messages": [{"role": "user", "content": "again"}], "threadId": "t-1"}))
                .await
                .unwrap()
        else {
            panic!("expected json output");
        };
        assert_eq!(second["thread_id"], "t-1");
        assert_eq!(second["reply"], "seen 3");
        assert_eq!(second["model"], "fake");
    }

    #[tokio::test]
    async fn api_gateway_body_is_decoded() {
        let output = invoke(&handler(), json!({"body": r#"{"message":"hello"}"#}))
            .await
            .unwrap();
        let HandlerOutput::Json(value) = output else {
            panic!("expected json output");
        };
        assert_eq!(value["reply"], "seen 1");
        assert!(!value["thread_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_message_is_invalid() {
        let err = invoke(&handler(), json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid event: message or messages is required");

        let err = invoke(&handler(), json!({"messages": []})).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_EVENT");

        let err = invoke(&handler(), json!({"messages": "nope"})).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_EVENT");
    }

    #[test]
    fn declares_chat_model_credentials() {
        assert_eq!(
            handler().required_env(),
            &["OPENAI_MODEL", "OPENAI_API_KEY", "OPENAI_BASE_URL"]
        );
    }
}
