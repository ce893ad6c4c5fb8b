// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Types and traits shared by every function handler.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Invocation shapes, handler contract, collaborator interfaces

pub mod invocation;
pub mod environment;
pub mod handler;
pub mod collaborators;
pub mod config;
