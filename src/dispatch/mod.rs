/*!
 * Task dispatching.
 *
 * This module contains the two dispatch strategies and the plumbing they
 * share. A dispatcher drains an input queue of tasks, starts backend calls,
 * applies the timeout policy, and pushes every task to an output queue with
 * exactly one disposition: completed (result present) or timed out (result
 * absent). The strategies differ in their ordering contract:
 * - `parallel`: many calls in flight, output restored to submission order
 *   via head-of-line blocking
 * - `serial`: one call at a time, with a bounded conversational history
 */

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Semaphore};

use crate::app_config::Config;
use crate::dispatch::history::ChatMessage;
use crate::task::TranslationTask;
use crate::translation_client::TranslationClient;

pub mod history;
pub mod parallel;
pub mod serial;

/// Sending half of a task queue
pub type TaskSender = mpsc::UnboundedSender<TranslationTask>;
/// Receiving half of a task queue
pub type TaskReceiver = mpsc::UnboundedReceiver<TranslationTask>;

/// Create an unbounded task queue
pub fn task_queue() -> (TaskSender, TaskReceiver) {
    mpsc::unbounded_channel()
}

/// Runtime settings shared by both dispatch strategies
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// Per-task timeout
    pub timeout: Duration,
    /// Coordinator loop interval
    pub poll_interval: Duration,
    /// Maximum concurrent backend calls (parallel strategy)
    pub max_concurrent_requests: usize,
    /// Bound of the conversational history window (serial strategy)
    pub history_size: usize,
}

impl DispatcherSettings {
    /// Build settings from the application configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: Duration::from_secs(config.dispatch.timeout_secs),
            poll_interval: Duration::from_millis(config.dispatch.poll_interval_ms),
            max_concurrent_requests: config.dispatch.max_concurrent_requests,
            history_size: config.dispatch.history_size,
        }
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A dispatched task together with the channel its worker reports through
///
/// The worker owns the sending half and sends only on success. The
/// coordinator's single `try_recv` at disposition time is the one read of
/// the result; dropping the receiver abandons the worker, whose late send
/// then fails harmlessly.
pub(crate) struct InFlightCall {
    /// The task being worked on
    pub task: TranslationTask,
    /// Receives the translated text if the call succeeds
    receiver: oneshot::Receiver<String>,
}

impl InFlightCall {
    /// Single non-blocking read of the worker's result
    ///
    /// Returns `None` both while the call is still running and after the
    /// worker has given up without a result; the timeout policy decides
    /// what happens then.
    pub fn poll_result(&mut self) -> Option<String> {
        self.receiver.try_recv().ok()
    }
}

/// Stamp a task and start its backend call on a worker
///
/// The coordinator never blocks on network I/O; the spawned worker does the
/// waiting. When a semaphore is given, the worker acquires a permit before
/// calling the backend, capping concurrent calls without changing the
/// ordering contract.
pub(crate) fn spawn_backend_call(
    client: Arc<TranslationClient>,
    mut task: TranslationTask,
    history: Vec<ChatMessage>,
    semaphore: Option<Arc<Semaphore>>,
) -> InFlightCall {
    task.stamp_submitted();

    let (sender, receiver) = oneshot::channel();
    let text = task.source_text.clone();

    tokio::spawn(async move {
        let _permit = match semaphore {
            Some(semaphore) => match semaphore.acquire_owned().await {
                Ok(permit) => Some(permit),
                // Semaphore closed, dispatcher is gone
                Err(_) => return,
            },
            None => None,
        };

        if let Some(translated) = client.translate(&text, &history).await {
            // Fails if the task already timed out and was released; the
            // late result is discarded
            let _ = sender.send(translated);
        }
    });

    InFlightCall { task, receiver }
}
