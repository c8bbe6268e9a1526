/*!
 * Translation task model.
 *
 * A task carries one line of source text through a dispatcher. Its result
 * is written at most once, at disposition time, and the task is never
 * touched by the dispatcher after it has been released downstream.
 */

use std::time::{Duration, Instant};

/// Unit of translation work flowing through a dispatcher
#[derive(Debug, Clone)]
pub struct TranslationTask {
    /// Input text to translate, immutable once created
    pub source_text: String,

    /// Translated text; `None` means pending, failed or timed out
    pub result_text: Option<String>,

    /// Stamped when dispatch begins, not when the task is created upstream
    pub submitted_at: Option<Instant>,
}

impl TranslationTask {
    /// Create a new pending task for the given source text
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            result_text: None,
            submitted_at: None,
        }
    }

    /// Stamp the dispatch timestamp
    pub fn stamp_submitted(&mut self) {
        self.submitted_at = Some(Instant::now());
    }

    /// Whether a result has been written
    pub fn is_completed(&self) -> bool {
        self.result_text.is_some()
    }

    /// Whether the task has exceeded its timeout since dispatch began
    ///
    /// A task that was never submitted cannot time out.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        match self.submitted_at {
            Some(submitted_at) => submitted_at.elapsed() > timeout,
            None => false,
        }
    }

    /// Write the result text
    ///
    /// The result transitions at most once, from absent to present. A second
    /// write is a contract violation and is ignored.
    pub fn complete(&mut self, text: String) {
        debug_assert!(self.result_text.is_none(), "task completed twice");
        if self.result_text.is_none() {
            self.result_text = Some(text);
        }
    }
}
