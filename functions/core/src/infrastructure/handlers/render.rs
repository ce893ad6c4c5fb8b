// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Render Handler
//
// Substitutes `${name}` placeholders in an HTML template and returns the page.
// The template comes from the event or falls back to the built-in page.
// `strict: true` turns unresolved placeholders into an error.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::handler::{FunctionHandler, HandlerError, HandlerOutput, HttpResponse};
use crate::domain::invocation::{InvocationContext, InvocationEvent};
use crate::infrastructure::template_engine::{TemplateEngine, TemplateVars};

#[derive(Debug, Default)]
pub struct RenderHandler {
    engine: TemplateEngine,
}

impl RenderHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FunctionHandler for RenderHandler {
    fn name(&self) -> &'static str {
        "render"
    }

    fn idempotent(&self) -> bool {
        true
    }

    async fn invoke(
        &self,
        event: InvocationEvent,
        ctx: &InvocationContext,
    ) -> Result<HandlerOutput, HandlerError> {
        let body = event.body_json()?;
        let template = match body.get("template") {
            None | Some(Value::Null) => TemplateEngine::default_template().to_string(),
            Some(Value::String(t)) => t.clone(),
            Some(_) => return Err(HandlerError::InvalidEvent("template must be a string".into())),
        };

        let mut vars = TemplateVars::new()
            .var("title", "webfunc")
            .var("function", ctx.function_name.clone())
            .var("request_id", ctx.request_id.clone());
        if let Some(Value::Object(fields)) = body.get("vars") {
            for (name, value) in fields {
                vars = vars.value(name.clone(), value.clone());
            }
        }

        let page = self.engine.render(&template, &vars);

        if body.get("strict").and_then(Value::as_bool).unwrap_or(false) {
            let unresolved = self.engine.placeholders(&page);
            if !unresolved.is_empty() {
                return Err(HandlerError::Render(format!(
                    "unresolved placeholders: {}",
                    unresolved.join(", ")
                )));
            }
        }

        Ok(HandlerOutput::Http(HttpResponse::html(page)))
    }
}
