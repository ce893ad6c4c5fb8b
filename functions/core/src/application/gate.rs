// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Environment Precondition Gate
//!
//! Verifies that every required name resolves to a non-empty value before a
//! request is allowed to reach a Function Handler.
//!
//! ```text
//! request
//!   └─ EnvironmentGate::evaluate(&env)
//!         ├─ Pass(snapshot)  → next stage, unchanged
//!         └─ Reject(missing) → 503 {error, message, code: MISSING_ENV_CONFIG}
//! ```
//!
//! The gate holds no state besides the name list. Every call reads the
//! source again, so two calls against the same environment always agree.

use tracing::warn;

use crate::domain::config::DEFAULT_REQUIRED_ENV;
use crate::domain::environment::{EnvSnapshot, EnvSource, GateDecision, MissingEnvironment};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentGate {
    required: Vec<String>,
}

impl EnvironmentGate {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Check every required name in declared order.
    pub fn evaluate(&self, env: &dyn EnvSource) -> GateDecision {
        let mut snapshot = EnvSnapshot::new();
        let mut missing = Vec::new();

        for name in &self.required {
            match env.get(name) {
                Some(value) if !value.is_empty() => snapshot.insert(name.clone(), value),
                _ => missing.push(name.clone()),
            }
        }

        if missing.is_empty() {
            GateDecision::Pass(snapshot)
        } else {
            let missing = MissingEnvironment::new(missing);
            warn!(missing = ?missing.missing, "Environment precondition failed");
            GateDecision::Reject(missing)
        }
    }
}

impl Default for EnvironmentGate {
    fn default() -> Self {
        Self::new(DEFAULT_REQUIRED_ENV)
    }
}
