// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`webfunc-core`)
//!
//! Process-facing surfaces that turn platform input into invocation service
//! calls. No handler logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Listener routes behind the environment gate |
//! | [`middleware`] | HTTP (Axum) | `require_environment` gate middleware |
//! | [`runtime`] | HTTP client | Custom-runtime fetch/invoke/report loop |

pub mod api;
pub mod middleware;
pub mod runtime;

pub use api::create_router;
pub use middleware::{require_environment, GateState};
pub use runtime::RuntimeLoop;
