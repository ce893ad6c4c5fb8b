// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Handler Registry
//
// Maps handler names to instances so a single binary can expose several
// functions and the bootstrap can select one by name.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::handler::FunctionHandler;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No function named {name} available, available functions are: {available}")]
    UnknownHandler { name: String, available: String },

    #[error("Function {0} is registered twice")]
    Duplicate(String),
}

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: BTreeMap<String, Arc<dyn FunctionHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn FunctionHandler>) -> Result<(), RegistryError> {
        let name = handler.name().to_string();
        if self.handlers.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Builder-style registration
    pub fn with(mut self, handler: Arc<dyn FunctionHandler>) -> Result<Self, RegistryError> {
        self.register(handler)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FunctionHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Like `get`, but names the registered handlers when `name` is unknown.
    pub fn select(&self, name: &str) -> Result<Arc<dyn FunctionHandler>, RegistryError> {
        self.get(name).ok_or_else(|| RegistryError::UnknownHandler {
            name: name.to_string(),
            available: self.names().join(", "),
        })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
