// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod gate;
pub mod retry;
pub mod registry;
pub mod invocation;

// Re-export use cases for convenience
pub use gate::EnvironmentGate;
pub use invocation::InvocationService;
pub use registry::{HandlerRegistry, RegistryError};
pub use retry::RetryPolicy;
