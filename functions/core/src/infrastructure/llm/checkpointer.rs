// Copyright (c) 2026 webfunc contributors
// SPDX-License-Identifier: AGPL-3.0

// In-process conversation memory keyed by thread id. A warm instance keeps
// context between invocations. Both the number of threads and the history
// per thread can be bounded; past the thread bound the least recently used
// thread is evicted.

use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

use crate::domain::collaborators::{ChatMessage, Checkpointer};
use crate::domain::config::AgentConfig;

#[derive(Debug, Default)]
struct Thread {
    messages: Vec<ChatMessage>,
    last_used: u64,
}

#[derive(Debug, Default)]
struct Threads {
    by_id: HashMap<String, Thread>,
    clock: u64,
}

impl Threads {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_least_recent(&mut self) {
        let oldest = self
            .by_id
            .iter()
            .min_by_key(|(_, thread)| thread.last_used)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            debug!(thread_id = %id, "Evicting least recently used thread");
            self.by_id.remove(&id);
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCheckpointer {
    threads: Mutex<Threads>,
    max_messages: Option<usize>,
    max_threads: Option<usize>,
}

impl MemoryCheckpointer {
    /// Unbounded memory.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounded(config: &AgentConfig) -> Self {
        Self::new()
            .with_max_threads(config.max_threads)
            .with_max_messages(config.max_messages)
    }

    /// Keep at most `max` messages per thread, oldest dropped first.
    pub fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = Some(max);
        self
    }

    /// Keep at most `max` threads, least recently used evicted first.
    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads = Some(max.max(1));
        self
    }

    pub fn thread_count(&self) -> usize {
        self.threads.lock().by_id.len()
    }
}

impl Checkpointer for MemoryCheckpointer {
    fn load(&self, thread_id: &str) -> Vec<ChatMessage> {
        let mut threads = self.threads.lock();
        let now = threads.tick();
        match threads.by_id.get_mut(thread_id) {
            Some(thread) => {
                thread.last_used = now;
                thread.messages.clone()
            }
            None => Vec::new(),
        }
    }

    fn append(&self, thread_id: &str, messages: &[ChatMessage]) {
        let mut threads = self.threads.lock();
        let now = threads.tick();

        if let Some(max) = self.max_threads {
            if !threads.by_id.contains_key(thread_id) {
                while threads.by_id.len() >= max {
                    threads.evict_least_recent();
                }
            }
        }

        let thread = threads.by_id.entry(thread_id.to_string()).or_default();
        thread.last_used = now;
        thread.messages.extend_from_slice(messages);
        if let Some(max) = self.max_messages {
            if thread.messages.len() > max {
                let excess = thread.messages.len() - max;
                thread.messages.drain(..excess);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threads_are_isolated() {
        let memory = MemoryCheckpointer::new();
        memory.append("a", &[ChatMessage::user("hi")]);
        memory.append("b", &[ChatMessage::user("yo")]);
        memory.append("a", &[ChatMessage::assistant("hello")]);

        assert_eq!(
            memory.load("a"),
            vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")]
        );
        assert_eq!(memory.load("b").len(), 1);
        assert!(memory.load("c").is_empty());
        assert_eq!(memory.thread_count(), 2);
    }

    #[test]
    fn oldest_messages_are_trimmed() {
        let memory = MemoryCheckpointer::new().with_max_messages(2);
        memory.append(
            "t",
            &[ChatMessage::user("1"), ChatMessage::assistant("2"), ChatMessage::user("3")],
        );
        assert_eq!(
            memory.load("t"),
            vec![ChatMessage::assistant("2"), ChatMessage::user("3")]
        );
    }

    #[test]
    fn least_recently_used_thread_is_evicted() {
        let memory = MemoryCheckpointer::new().with_max_threads(2);
        memory.append("a", &[ChatMessage::user("1")]);
        memory.append("b", &[ChatMessage::user("2")]);
        memory.load("a");
        memory.append("c", &[ChatMessage::user("3")]);

        assert_eq!(memory.thread_count(), 2);
        assert_eq!(memory.load("a").len(), 1);
        assert!(memory.load("b").is_empty());
        assert_eq!(memory.load("c").len(), 1);
    }

    #[test]
    fn many_new_threads_stay_within_bound() {
        let memory = MemoryCheckpointer::bounded(&AgentConfig {
            max_threads: 10,
            max_messages: 4,
        });
        for i in 0..500 {
            memory.append(&format!("thread-{}", i), &[ChatMessage::user("x")]);
        }
        assert_eq!(memory.thread_count(), 10);
        assert_eq!(memory.load("thread-499").len(), 1);
    }
}
