// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! `webfunc serve`

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use webfunc_core::domain::config::FunctionConfig;
use webfunc_core::domain::environment::ProcessEnv;

use crate::server;

pub async fn handle_command(
    config_override: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let mut config =
        FunctionConfig::load_or_default(config_override).context("Failed to load configuration")?;
    apply_listener_flags(&mut config, host, port);

    server::serve(config, Arc::new(ProcessEnv)).await
}

/// Flags win over the file and the environment overrides.
fn apply_listener_flags(config: &mut FunctionConfig, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host.filter(|h| !h.is_empty()) {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
}
