// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! # webfunc
//!
//! Process bootstrap for the bundled function handlers.
//!
//! ## Commands
//!
//! - `webfunc serve` - HTTP listener on 0.0.0.0:9000, gated on required environment
//! - `webfunc runtime --handler NAME` - custom-runtime loop against the platform runtime API
//! - `webfunc invoke NAME` - run one handler locally and print its result
//! - `webfunc handlers` - list registered handlers
//! - `webfunc config show|validate|generate` - configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use webfunc_cli::commands::{self, ConfigCommand};

/// webfunc - serverless function handlers
#[derive(Parser)]
#[command(name = "webfunc")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "WEBFUNC_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "WEBFUNC_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve handlers over HTTP
    #[command(name = "serve")]
    Serve {
        /// Listener host (default: 0.0.0.0)
        #[arg(long, env = "WEBFUNC_HOST")]
        host: Option<String>,

        /// Listener port (default: 9000)
        #[arg(long, env = "WEBFUNC_PORT")]
        port: Option<u16>,
    },

    /// Run one handler against the platform runtime API
    #[command(name = "runtime")]
    Runtime {
        /// Handler to serve
        #[arg(long, env = "WEBFUNC_HANDLER")]
        handler: String,
    },

    /// Invoke one handler locally
    #[command(name = "invoke")]
    Invoke {
        /// Handler name
        handler: String,

        /// JSON event file
        #[arg(short, long, value_name = "FILE", conflicts_with = "data")]
        event: Option<PathBuf>,

        /// Inline JSON event
        #[arg(short, long)]
        data: Option<String>,
    },

    /// List registered handlers
    #[command(name = "handlers")]
    Handlers,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
    }) {
        Commands::Serve { host, port } => commands::serve::handle_command(cli.config, host, port).await,
        Commands::Runtime { handler } => commands::runtime::handle_command(cli.config, &handler).await,
        Commands::Invoke {
            handler,
            event,
            data,
        } => commands::invoke::handle_command(cli.config, &handler, event, data).await,
        Commands::Handlers => commands::handlers::handle_command(cli.config),
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
