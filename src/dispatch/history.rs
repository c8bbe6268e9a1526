/*!
 * Bounded conversational history for the serial dispatch strategy.
 *
 * The window keeps the most recent assistant turns so follow-up requests
 * carry context to the backend. Eviction is FIFO: once the configured bound
 * is exceeded, the oldest entry goes first.
 */

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Chat message object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, or assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Bounded FIFO of past conversational turns
///
/// Owned by one serial dispatcher instance; never shared across dispatchers.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    /// Entries in oldest-first order
    entries: VecDeque<ChatMessage>,
    /// Maximum number of entries kept
    max_size: usize,
}

impl HistoryWindow {
    /// Create an empty window with the given bound
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Append a message, evicting the oldest entries beyond the bound
    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push_back(message);
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
    }

    /// Number of entries currently held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the window holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of the entries in oldest-first order
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }
}
