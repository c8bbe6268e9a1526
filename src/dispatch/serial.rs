/*!
 * Serial dispatch strategy.
 *
 * Runs at most one backend call at a time so a bounded conversational
 * history can be meaningfully appended to follow-up requests, trading
 * throughput for context continuity. Output order equals submission order
 * trivially, since only one task is ever in flight.
 */

use std::sync::Arc;

use anyhow::Result;
use log::{debug, warn};
use tokio::sync::mpsc::error::TryRecvError;

use crate::dispatch::history::{ChatMessage, HistoryWindow};
use crate::dispatch::{
    spawn_backend_call, DispatcherSettings, InFlightCall, TaskReceiver, TaskSender,
};
use crate::errors::DispatchError;
use crate::task::TranslationTask;
use crate::translation_client::TranslationClient;

/// Dispatcher that runs one backend call at a time and maintains a bounded
/// rolling history of past results for conversational context
pub struct SerialDispatcher {
    /// Backend call collaborator, shared with the worker task
    client: Arc<TranslationClient>,

    /// Timeout and loop settings
    settings: DispatcherSettings,

    /// Past assistant turns, bounded to `settings.history_size`
    history: HistoryWindow,

    /// The single task currently in flight, if any
    current: Option<InFlightCall>,
}

impl SerialDispatcher {
    /// Create a new serial dispatcher with an empty history window
    pub fn new(client: Arc<TranslationClient>, settings: DispatcherSettings) -> Self {
        let history = HistoryWindow::new(settings.history_size);
        Self {
            client,
            settings,
            history,
            current: None,
        }
    }

    /// Snapshot of the current history window, oldest first
    pub fn history_snapshot(&self) -> Vec<ChatMessage> {
        self.history.snapshot()
    }

    /// Whether a task is currently in flight
    pub fn is_in_flight(&self) -> bool {
        self.current.is_some()
    }

    /// Dispose of the current task if it has completed or timed out
    ///
    /// On completion the result is appended to the history window; on
    /// timeout the history is untouched and the worker abandoned. Returns
    /// the released task, or `None` while the call is still within its
    /// timeout.
    fn take_disposed(&mut self) -> Option<TranslationTask> {
        let call = self.current.as_mut()?;

        if let Some(translated) = call.poll_result() {
            let mut call = self.current.take().expect("current exists");
            call.task.complete(translated.clone());
            self.history.push(ChatMessage::assistant(translated));
            return Some(call.task);
        }

        if call.task.is_timed_out(self.settings.timeout) {
            let call = self.current.take().expect("current exists");
            warn!("Translation timeout or failed: {}", call.task.source_text);
            return Some(call.task);
        }

        None
    }

    /// Start the next task's backend call, passing the current history as
    /// context
    fn submit(&mut self, task: TranslationTask) {
        debug_assert!(self.current.is_none(), "serial dispatcher already in flight");
        let call = spawn_backend_call(
            Arc::clone(&self.client),
            task,
            self.history.snapshot(),
            None,
        );
        self.current = Some(call);
    }

    /// Drive the dispatcher: dispose the current task when it resolves,
    /// then take the next one from the input queue, idle briefly, repeat
    ///
    /// Returns once the input queue is closed and the last task has been
    /// disposed.
    pub async fn run(&mut self, mut input: TaskReceiver, output: TaskSender) -> Result<()> {
        let mut input_open = true;

        loop {
            if let Some(task) = self.take_disposed() {
                output.send(task).map_err(|e| {
                    DispatchError::OutputClosed(format!(
                        "Dropped task with source text: {}",
                        e.0.source_text
                    ))
                })?;
            }

            if self.current.is_none() && input_open {
                match input.try_recv() {
                    Ok(task) => self.submit(task),
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => {
                        debug!("Input queue closed");
                        input_open = false;
                    }
                }
            }

            if !input_open && self.current.is_none() {
                return Ok(());
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}
