// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Function Configuration
//
// Settings for the process bootstrap:
// - Listener address (HTTP-style bootstraps)
// - Environment names the precondition gate requires
// - Retry policy applied to collaborator failures
// - Function identity and platform limits reported to handlers
//
// Loaded from YAML with discovery, then overridden from the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::environment::{EnvSource, ProcessEnv};

/// Names the HTTP gate requires unless configured otherwise.
pub const DEFAULT_REQUIRED_ENV: [&str; 3] = ["OPENAI_MODEL", "OPENAI_API_KEY", "OPENAI_BASE_URL"];

pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const CONFIG_FILE_NAME: &str = "webfunc.yaml";
pub const CONFIG_PATH_ENV: &str = "WEBFUNC_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FunctionConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub function: FunctionIdentity,

    #[serde(default)]
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Checked in this order; rejection messages list misses in this order.
    #[serde(default = "default_required_env")]
    pub required_env: Vec<String>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            required_env: default_required_env(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per invocation, including the first. 1 disables retry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_retry_delay")]
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            delay_ms: default_retry_delay(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionIdentity {
    #[serde(default = "default_function_name")]
    pub name: String,

    /// 0 when the platform does not report a limit.
    #[serde(default)]
    pub memory_limit_mb: u64,

    #[serde(default)]
    pub time_limit_ms: u64,
}

impl Default for FunctionIdentity {
    fn default() -> Self {
        Self {
            name: default_function_name(),
            memory_limit_mb: 0,
            time_limit_ms: 0,
        }
    }
}

/// Bounds on the agent's in-process conversation memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Threads kept at once; the least recently used is evicted first.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    /// Messages kept per thread; the oldest are dropped first.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_threads: default_max_threads(),
            max_messages: default_max_messages(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_required_env() -> Vec<String> {
    DEFAULT_REQUIRED_ENV.iter().map(|s| s.to_string()).collect()
}

fn default_max_attempts() -> u32 {
    1
}

fn default_retry_delay() -> u64 {
    500
}

fn default_max_threads() -> usize {
    1024
}

fn default_max_messages() -> usize {
    100
}

fn default_function_name() -> String {
    "webfunc".to_string()
}

impl FunctionConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. WEBFUNC_CONFIG_PATH environment variable
    /// 2. ./webfunc.yaml (working directory)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from(format!("./{}", CONFIG_FILE_NAME));
        if cwd.exists() {
            return Some(cwd);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides(&ProcessEnv);
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides(&ProcessEnv);
            Ok(config)
        } else {
            tracing::debug!("No configuration file found. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides(&ProcessEnv);
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self, env: &dyn EnvSource) {
        if let Some(host) = env.get("WEBFUNC_HOST").filter(|v| !v.is_empty()) {
            tracing::info!("Environment override: WEBFUNC_HOST={}", host);
            self.server.host = host;
        }

        if let Some(val) = env.get("WEBFUNC_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: WEBFUNC_PORT={}", port);
                    self.server.port = port;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for WEBFUNC_PORT: '{}'. Expected a port number. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = env.get("WEBFUNC_REQUIRED_ENV") {
            let names: Vec<String> = val
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            tracing::info!("Environment override: WEBFUNC_REQUIRED_ENV={:?}", names);
            self.gate.required_env = names;
        }

        if let Some(val) = env.get("WEBFUNC_RETRY_MAX_ATTEMPTS") {
            match val.parse::<u32>() {
                Ok(attempts) => {
                    tracing::info!("Environment override: WEBFUNC_RETRY_MAX_ATTEMPTS={}", attempts);
                    self.retry.max_attempts = attempts;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for WEBFUNC_RETRY_MAX_ATTEMPTS: '{}'. Ignoring.",
                    val
                ),
            }
        }

        for (name, target) in [
            ("WEBFUNC_AGENT_MAX_THREADS", &mut self.agent.max_threads),
            ("WEBFUNC_AGENT_MAX_MESSAGES", &mut self.agent.max_messages),
        ] {
            if let Some(val) = env.get(name) {
                match val.parse::<usize>() {
                    Ok(n) => {
                        tracing::info!("Environment override: {}={}", name, n);
                        *target = n;
                    }
                    Err(_) => tracing::warn!("Invalid value for {}: '{}'. Ignoring.", name, val),
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.host.trim().is_empty() {
            anyhow::bail!("server.host cannot be empty");
        }

        if self.server.port == 0 {
            anyhow::bail!("server.port must be between 1 and 65535");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        if let Some(blank) = self.gate.required_env.iter().position(|n| n.trim().is_empty()) {
            anyhow::bail!("gate.required_env[{}] cannot be blank", blank);
        }

        if self.agent.max_threads == 0 {
            anyhow::bail!("agent.max_threads must be at least 1");
        }

        if self.agent.max_messages == 0 {
            anyhow::bail!("agent.max_messages must be at least 1");
        }

        if self.function.name.is_empty() {
            anyhow::bail!("function.name cannot be empty");
        }

        Ok(())
    }

    /// Socket address string for the HTTP listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::environment::MapEnv;

    #[test]
    fn test_defaults() {
        let config = FunctionConfig::default();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.gate.required_env,
            vec!["OPENAI_MODEL", "OPENAI_API_KEY", "OPENAI_BASE_URL"]
        );
        assert_eq!(config.retry.max_attempts, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = FunctionConfig::from_yaml_str("server:\n  port: 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.gate.required_env.len(), 3);
    }

    #[test]
    fn test_env_overrides() {
        let env = MapEnv::new()
            .with("WEBFUNC_PORT", "9100")
            .with("WEBFUNC_REQUIRED_ENV", "KV_REST_URL, KV_REST_TOKEN,")
            .with("WEBFUNC_RETRY_MAX_ATTEMPTS", "3");
        let mut config = FunctionConfig::default();
        config.apply_env_overrides(&env);

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.gate.required_env, vec!["KV_REST_URL", "KV_REST_TOKEN"]);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_agent_memory_bounds() {
        let config = FunctionConfig::from_yaml_str("agent:\n  max_threads: 16\n").unwrap();
        assert_eq!(config.agent.max_threads, 16);
        assert_eq!(config.agent.max_messages, 100);

        let env = MapEnv::new()
            .with("WEBFUNC_AGENT_MAX_THREADS", "8")
            .with("WEBFUNC_AGENT_MAX_MESSAGES", "lots");
        let mut config = FunctionConfig::default();
        config.apply_env_overrides(&env);
        assert_eq!(config.agent.max_threads, 8);
        assert_eq!(config.agent.max_messages, 100);

        config.agent.max_threads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let env = MapEnv::new().with("WEBFUNC_PORT", "not-a-port");
        let mut config = FunctionConfig::default();
        config.apply_env_overrides(&env);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = FunctionConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = FunctionConfig::default();
        config.gate.required_env.push("  ".to_string());
        assert!(config.validate().is_err());

        let mut config = FunctionConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webfunc.yaml");
        let mut config = FunctionConfig::default();
        config.function.name = "render".to_string();
        config.to_yaml_file(&path).unwrap();

        let loaded = FunctionConfig::from_yaml_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
