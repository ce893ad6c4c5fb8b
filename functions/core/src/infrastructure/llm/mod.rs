// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// Chat Model Infrastructure
//
// OpenAI-compatible chat adapter, conversation memory and the small agent
// runtime the `agent` handler and the agent HTTP routes share.

pub mod agent;
pub mod checkpointer;
pub mod openai;

pub use agent::{AgentReply, AgentRuntime};
pub use checkpointer::MemoryCheckpointer;
pub use openai::OpenAiChatModel;
