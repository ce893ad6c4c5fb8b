// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use webfunc_core::domain::config::{FunctionConfig, CONFIG_FILE_NAME, CONFIG_PATH_ENV};
use webfunc_core::domain::environment::{EnvSource, ProcessEnv};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,

        /// Print the effective configuration as YAML
        #[arg(long)]
        yaml: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./webfunc.yaml)
        #[arg(short, long, default_value = "./webfunc.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths, yaml } => show(config_override, paths, yaml),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, examples } => generate(&output, examples),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool, as_yaml: bool) -> Result<()> {
    let config = FunctionConfig::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./{}", CONFIG_FILE_NAME);
        println!();
    }

    if as_yaml {
        print!("{}", serde_yaml::to_string(&config)?);
        return Ok(());
    }

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Listener:".bold());
    println!("  Address: {}", config.bind_address());
    println!();

    println!("{}", "Environment Gate:".bold());
    if config.gate.required_env.is_empty() {
        println!("  {}", "(no required names)".dimmed());
    }
    for name in &config.gate.required_env {
        let status = if ProcessEnv.get(name).is_some_and(|v| !v.is_empty()) {
            "set".green()
        } else {
            "missing".red()
        };
        println!("  {} ({})", name, status);
    }
    println!();

    println!("{}", "Retry:".bold());
    println!("  Max attempts: {}", config.retry.max_attempts);
    println!("  Delay: {}ms", config.retry.delay_ms);
    println!();

    println!("{}", "Function:".bold());
    println!("  Name: {}", config.function.name);
    println!("  Memory limit: {} MB", config.function.memory_limit_mb);
    println!("  Time limit: {} ms", config.function.time_limit_ms);
    println!();

    println!("{}", "Agent Memory:".bold());
    println!("  Max threads: {}", config.agent.max_threads);
    println!("  Max messages per thread: {}", config.agent.max_messages);
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config =
        FunctionConfig::load_or_default(config_path).context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn sample(with_examples: bool) -> &'static str {
    if with_examples {
        include_str!("../../templates/webfunc-with-examples.yaml")
    } else {
        include_str!("../../templates/webfunc-minimal.yaml")
    }
}

fn generate(output: &Path, with_examples: bool) -> Result<()> {
    std::fs::write(output, sample(with_examples))
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
