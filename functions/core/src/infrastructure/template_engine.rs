// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Template Engine
//!
//! `${name}` placeholder substitution for HTML templates.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Turn a template plus a variable set into the final page
//! - **Integration:** `render` handler → HTTP-shaped response body
//!
//! # Semantics
//!
//! - `${name}` is replaced by the value of `name`. Whitespace inside the
//!   braces is ignored (`${ name }` works too).
//! - A placeholder whose variable is absent is left intact, braces included.
//!   Rendering never fails on unknown names.
//! - String values are inserted verbatim; other JSON values are inserted in
//!   their JSON text form.
//! - Rendering is a pure function of `(template, vars)`.
//!
//! # Usage
//!
//! ```ignore
//! let engine = TemplateEngine::new();
//! let vars = TemplateVars::new().var("name", "Alice");
//! assert_eq!(engine.render("Hello ${name}", &vars), "Hello Alice");
//! ```

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{\s*([A-Za-z_][A-Za-z0-9_.\-]*)\s*\}").expect("placeholder pattern is valid")
});

// ============================================================================
// Template Variables
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateVars {
    values: BTreeMap<String, Value>,
}

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for a string variable
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), Value::String(value.into()));
        self
    }

    /// Builder-style setter for an arbitrary JSON value
    pub fn value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Variables from a JSON object. Non-object values yield no variables.
    pub fn from_json(value: &Value) -> Self {
        let values = value
            .as_object()
            .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        Self { values }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.values.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEngine;

impl TemplateEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, template: &str, vars: &TemplateVars) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures<'_>| {
                vars.lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Names referenced by the template, in order of first appearance.
    pub fn placeholders(&self, template: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for caps in PLACEHOLDER.captures_iter(template) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Built-in page served when an event carries no template.
    pub fn default_template() -> &'static str {
        include_str!("templates/index.html")
    }
}

/// Render a template string with a simple key-value map
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> String {
    let vars = vars
        .iter()
        .fold(TemplateVars::new(), |acc, (k, v)| acc.var(k.clone(), v.clone()));
    TemplateEngine::new().render(template, &vars)
}
