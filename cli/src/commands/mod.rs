// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

//! CLI command implementations

pub mod config;
pub mod handlers;
pub mod invoke;
pub mod runtime;
pub mod serve;

pub use config::ConfigCommand;
