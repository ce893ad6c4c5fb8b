// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! # webfunc core
//!
//! Function handler contract, environment precondition gate and the
//! collaborator adapters the bundled handlers delegate to.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Everything the `webfunc` bootstrap binary wires together

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
