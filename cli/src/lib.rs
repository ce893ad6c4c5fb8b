// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! webfunc CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** Process bootstrap wiring shared by the `webfunc` subcommands

pub mod commands;
pub mod server;
