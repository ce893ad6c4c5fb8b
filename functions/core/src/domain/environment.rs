// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Environment Configuration
//!
//! Read-only view over process-wide named settings and the outcome of
//! checking them against a required-name list.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** `EnvSource` abstraction, validated snapshots, gate decisions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Error code carried by every missing-configuration rejection.
pub const MISSING_ENV_CONFIG: &str = "MISSING_ENV_CONFIG";

/// Read access to named configuration values.
///
/// Implementations must not cache: every call reflects the current state of
/// the underlying source.
pub trait EnvSource: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
}

/// Live process environment. Reads `std::env` on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed set of values, for tests and local invocations.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    values: BTreeMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Values of the required names, captured after a successful gate check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSnapshot {
    values: BTreeMap<String, String>,
}

impl EnvSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of a name the gate already validated. Falls back to an empty
    /// string only if the caller asks for a name outside the validated set.
    pub fn require(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for EnvSnapshot {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Required names that were unset or empty, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingEnvironment {
    pub missing: Vec<String>,
}

impl MissingEnvironment {
    pub fn new(missing: Vec<String>) -> Self {
        Self { missing }
    }

    /// Human-readable message listing exactly the missing names.
    pub fn message(&self) -> String {
        format!(
            "Missing required environment variables: {}",
            self.missing.join(", ")
        )
    }

    /// Terminal response body written by the gate.
    pub fn body(&self) -> ServiceUnavailableBody {
        ServiceUnavailableBody {
            error: "Service Unavailable".to_string(),
            message: self.message(),
            code: MISSING_ENV_CONFIG.to_string(),
        }
    }
}

impl std::fmt::Display for MissingEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for MissingEnvironment {}

/// JSON body of a 503 gate rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUnavailableBody {
    pub error: String,
    pub message: String,
    pub code: String,
}

/// Two-state outcome of a gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Pass(EnvSnapshot),
    Reject(MissingEnvironment),
}

impl GateDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass(_))
    }

    pub fn into_result(self) -> Result<EnvSnapshot, MissingEnvironment> {
        match self {
            Self::Pass(snapshot) => Ok(snapshot),
            Self::Reject(missing) => Err(missing),
        }
    }
}
