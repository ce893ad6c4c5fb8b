// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! `webfunc invoke`
//!
//! Runs one handler in-process against the live environment and prints the
//! Handler Result as JSON. Failures print the error body and exit 1.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use webfunc_core::domain::config::FunctionConfig;
use webfunc_core::domain::environment::ProcessEnv;
use webfunc_core::domain::invocation::InvocationEvent;

use crate::server::build_service;

pub async fn handle_command(
    config_override: Option<PathBuf>,
    handler: &str,
    event_file: Option<PathBuf>,
    data: Option<String>,
) -> Result<()> {
    let config =
        FunctionConfig::load_or_default(config_override).context("Failed to load configuration")?;
    let event = read_event(event_file.as_deref(), data.as_deref())?;
    let service = build_service(&config, Arc::new(ProcessEnv))?;

    let ctx = service.new_context();
    match service.invoke(handler, event, ctx).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", format!("✗ {} failed ({})", handler, e.status_code()).red());
            eprintln!("{}", serde_json::to_string_pretty(&e.body())?);
            std::process::exit(1);
        }
    }
}

/// Event from a file, inline JSON, or empty when neither is given.
fn read_event(file: Option<&Path>, data: Option<&str>) -> Result<InvocationEvent> {
    let raw = match (file, data) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {:?}", path))?,
        (None, Some(data)) => data.to_string(),
        (None, None) => return Ok(InvocationEvent::empty()),
    };

    let payload = serde_json::from_str(&raw).context("Event is not valid JSON")?;
    Ok(InvocationEvent::new(payload))
}
