// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! `webfunc handlers`

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use webfunc_core::domain::config::FunctionConfig;
use webfunc_core::domain::environment::ProcessEnv;

use crate::server::build_service;

pub fn handle_command(config_override: Option<PathBuf>) -> Result<()> {
    let config =
        FunctionConfig::load_or_default(config_override).context("Failed to load configuration")?;
    let service = build_service(&config, Arc::new(ProcessEnv))?;

    println!("{}", "Registered handlers:".bold());
    for name in service.registry().names() {
        let Some(handler) = service.registry().get(name) else {
            continue;
        };
        let required = handler.required_env();
        if required.is_empty() {
            println!("  {}", name.bold());
        } else {
            println!("  {} {}", name.bold(), format!("(requires {})", required.join(", ")).dimmed());
        }
    }

    Ok(())
}
