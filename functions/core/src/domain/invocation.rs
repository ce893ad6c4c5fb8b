// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Invocation
//!
//! Per-call input delivered by the hosting platform: the opaque event
//! payload and the read-only context that accompanies it.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Invocation Event, trigger classification, Invocation Context

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::domain::environment::EnvSnapshot;
use crate::domain::handler::HandlerError;

/// Event name emitted by object storage when an inventory report lands.
pub const INVENTORY_REPORT_EVENT: &str = "cos:InventoryReportCreated:Put";

/// Which platform trigger produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    ObjectStorage,
    StorageWorkflow,
    Timer,
    ApiGateway,
    Invoke,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ObjectStorage => "object_storage",
            Self::StorageWorkflow => "storage_workflow",
            Self::Timer => "timer",
            Self::ApiGateway => "api_gateway",
            Self::Invoke => "invoke",
        };
        f.write_str(name)
    }
}

/// One record of an object-storage trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_queue: Option<String>,
}

impl ObjectRecord {
    pub fn is_inventory_report(&self) -> bool {
        self.event_name.as_deref() == Some(INVENTORY_REPORT_EVENT)
    }
}

/// Opaque, handler-specific request payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvocationEvent(pub Value);

impl InvocationEvent {
    pub fn new(payload: Value) -> Self {
        Self(payload)
    }

    pub fn empty() -> Self {
        Self(Value::Object(Default::default()))
    }

    pub fn payload(&self) -> &Value {
        &self.0
    }

    pub fn into_payload(self) -> Value {
        self.0
    }

    /// Classify the event by the trigger-specific keys it carries.
    pub fn trigger(&self) -> Trigger {
        let has = |key: &str| self.0.get(key).is_some_and(|v| !v.is_null());

        if has("Records") {
            Trigger::ObjectStorage
        } else if has("ObjectInfo") {
            Trigger::StorageWorkflow
        } else if has("Time") {
            Trigger::Timer
        } else if has("body") {
            Trigger::ApiGateway
        } else {
            Trigger::Invoke
        }
    }

    /// Records of an object-storage trigger.
    pub fn object_records(&self) -> Result<Vec<ObjectRecord>, HandlerError> {
        let records = self
            .0
            .get("Records")
            .and_then(Value::as_array)
            .ok_or_else(|| HandlerError::InvalidEvent("event has no Records array".into()))?;

        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let object = record.pointer("/cos/cosObject");
                let url = object
                    .and_then(|o| o.get("url"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        HandlerError::InvalidEvent(format!(
                            "Records[{}].cos.cosObject.url is missing",
                            index
                        ))
                    })?;
                let text = |pointer: &str| {
                    record
                        .pointer(pointer)
                        .and_then(Value::as_str)
                        .map(str::to_string)
                };

                Ok(ObjectRecord {
                    url: url.to_string(),
                    key: text("/cos/cosObject/key"),
                    event_name: text("/event/eventName"),
                    event_queue: text("/event/eventQueue"),
                })
            })
            .collect()
    }

    /// The request body of an API-gateway event, parsed as JSON.
    ///
    /// Events without a `body` are returned as-is.
    pub fn body_json(&self) -> Result<Value, HandlerError> {
        match self.0.get("body") {
            None | Some(Value::Null) => Ok(self.0.clone()),
            Some(Value::String(raw)) if raw.trim().is_empty() => {
                Ok(Value::Object(Default::default()))
            }
            Some(Value::String(raw)) => serde_json::from_str(raw).map_err(|_| {
                HandlerError::InvalidEvent("request body is not a json string".into())
            }),
            Some(other) => Ok(other.clone()),
        }
    }

    /// String field of the (body-decoded) payload.
    pub fn str_field(&self, name: &str) -> Result<Option<String>, HandlerError> {
        Ok(self
            .body_json()?
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string))
    }
}

impl From<Value> for InvocationEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Platform-supplied metadata for one invocation. Read-only to handlers.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub request_id: String,
    pub function_name: String,
    pub memory_limit_mb: u64,
    pub time_limit_ms: u64,
    pub started_at: DateTime<Utc>,
    /// Values of the handler's required names, filled in after gating.
    pub environment: EnvSnapshot,
}

impl InvocationContext {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            function_name: function_name.into(),
            memory_limit_mb: 0,
            time_limit_ms: 0,
            started_at: Utc::now(),
            environment: EnvSnapshot::new(),
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn with_limits(mut self, memory_limit_mb: u64, time_limit_ms: u64) -> Self {
        self.memory_limit_mb = memory_limit_mb;
        self.time_limit_ms = time_limit_ms;
        self
    }

    /// Time budget left. `None` when the platform supplied no limit.
    pub fn remaining(&self) -> Option<Duration> {
        if self.time_limit_ms == 0 {
            return None;
        }
        let elapsed = (Utc::now() - self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        Some(Duration::from_millis(self.time_limit_ms).saturating_sub(elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_triggers_in_precedence_order() {
        let cases = [
            (json!({"Records": [], "body": "{}"}), Trigger::ObjectStorage),
            (json!({"ObjectInfo": {}}), Trigger::StorageWorkflow),
            (json!({"Time": "2026-01-01T00:00:00Z", "Message": ""}), Trigger::Timer),
            (json!({"body": "{}", "httpMethod": "POST"}), Trigger::ApiGateway),
            (json!({"key": "value"}), Trigger::Invoke),
        ];
        for (payload, expected) in cases {
            assert_eq!(InvocationEvent::new(payload).trigger(), expected);
        }
    }

    #[test]
    fn parses_object_records() {
        let event = InvocationEvent::new(json!({
            "Records": [{
                "cos": {"cosObject": {"url": "https://b-1250000000.cos.ap-guangzhou.myqcloud.com/a.jpg", "key": "/1250000000/b/a.jpg"}},
                "event": {"eventName": "cos:ObjectCreated:Put"}
            }]
        }));
        let records = event.object_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key.as_deref(), Some("/1250000000/b/a.jpg"));
        assert!(!records[0].is_inventory_report());
    }

    #[test]
    fn record_without_url_is_invalid() {
        let event = InvocationEvent::new(json!({"Records": [{"cos": {"cosObject": {}}}]}));
        let err = event.object_records().unwrap_err();
        assert!(matches!(err, HandlerError::InvalidEvent(_)));
    }

    #[test]
    fn body_json_rejects_non_json_body() {
        let event = InvocationEvent::new(json!({"body": "not json"}));
        let err = event.body_json().unwrap_err();
        assert_eq!(err.to_string(), "Invalid event: request body is not a json string");
    }

    #[test]
    fn body_json_decodes_string_body() {
        let event = InvocationEvent::new(json!({"body": "{\"name\":\"Alice\"}"}));
        assert_eq!(event.str_field("name").unwrap().as_deref(), Some("Alice"));
    }

    #[test]
    fn remaining_is_none_without_limit() {
        let ctx = InvocationContext::new("render");
        assert!(ctx.remaining().is_none());
        let ctx = ctx.with_limits(128, 3_000);
        assert!(ctx.remaining().unwrap() <= Duration::from_millis(3_000));
    }
}
