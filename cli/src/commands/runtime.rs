// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! `webfunc runtime`

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use webfunc_core::domain::config::FunctionConfig;
use webfunc_core::domain::environment::ProcessEnv;
use webfunc_core::infrastructure::RuntimeApiClient;
use webfunc_core::presentation::RuntimeLoop;

use crate::server::{build_service, shutdown_signal};

pub async fn handle_command(config_override: Option<PathBuf>, handler: &str) -> Result<()> {
    let config =
        FunctionConfig::load_or_default(config_override).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let client = RuntimeApiClient::from_env(&ProcessEnv)
        .context("Runtime API location is not configured")?;
    let service = build_service(&config, Arc::new(ProcessEnv))?;

    let handled = RuntimeLoop::new(service, handler, client)?
        .run(shutdown_signal())
        .await?;

    info!(handled, "Runtime loop finished");
    Ok(())
}
