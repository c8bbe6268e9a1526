/*!
 * Parallel dispatch strategy.
 *
 * Maximizes throughput by overlapping backend calls while presenting output
 * strictly in submission order. A completed task that is not at the front of
 * the pending list is withheld until everything ahead of it has resolved
 * (head-of-line blocking), so downstream order always equals submission
 * order at the cost of a fast task waiting behind a slow one.
 */

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::Result;
use log::{debug, warn};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::Semaphore;

use crate::dispatch::{
    spawn_backend_call, DispatcherSettings, InFlightCall, TaskReceiver, TaskSender,
};
use crate::errors::DispatchError;
use crate::task::TranslationTask;
use crate::translation_client::TranslationClient;

/// Dispatcher that fires one backend call per task and reorders completions
/// back into submission order
pub struct ParallelDispatcher {
    /// Backend call collaborator, shared with worker tasks
    client: Arc<TranslationClient>,

    /// Timeout and loop settings
    settings: DispatcherSettings,

    /// Caps concurrent backend calls
    semaphore: Arc<Semaphore>,

    /// In-flight tasks in submission order; the front is the release gate
    pending: VecDeque<InFlightCall>,
}

impl ParallelDispatcher {
    /// Create a new parallel dispatcher
    pub fn new(client: Arc<TranslationClient>, settings: DispatcherSettings) -> Self {
        let semaphore = Arc::new(Semaphore::new(settings.max_concurrent_requests));
        Self {
            client,
            settings,
            semaphore,
            pending: VecDeque::new(),
        }
    }

    /// Number of tasks currently awaiting disposition
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Accept a task: stamp it, append it to the pending list, and start
    /// its backend call. Non-blocking; does not wait for completion.
    pub fn submit(&mut self, task: TranslationTask) {
        let call = spawn_backend_call(
            Arc::clone(&self.client),
            task,
            Vec::new(),
            Some(Arc::clone(&self.semaphore)),
        );
        self.pending.push_back(call);
    }

    /// Release every task at the front of the pending list that has resolved
    ///
    /// Pops from the front while the head is completed or timed out; a
    /// completed task behind an unresolved one stays put. Timed-out heads
    /// are released with their result absent and their worker abandoned.
    pub fn drain_ready(&mut self) -> Vec<TranslationTask> {
        let mut ready = Vec::new();

        while let Some(head) = self.pending.front_mut() {
            if let Some(translated) = head.poll_result() {
                let mut call = self.pending.pop_front().expect("head exists");
                call.task.complete(translated);
                ready.push(call.task);
            } else if head.task.is_timed_out(self.settings.timeout) {
                let call = self.pending.pop_front().expect("head exists");
                warn!("Translation timeout or failed: {}", call.task.source_text);
                ready.push(call.task);
            } else {
                break;
            }
        }

        ready
    }

    /// Drive the dispatcher: drain input into `submit`, release resolved
    /// heads downstream, idle briefly, repeat
    ///
    /// Returns once the input queue is closed and every submitted task has
    /// been disposed.
    pub async fn run(&mut self, mut input: TaskReceiver, output: TaskSender) -> Result<()> {
        let mut input_open = true;

        loop {
            while input_open {
                match input.try_recv() {
                    Ok(task) => self.submit(task),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        debug!("Input queue closed, draining {} pending tasks", self.pending.len());
                        input_open = false;
                    }
                }
            }

            for task in self.drain_ready() {
                output.send(task).map_err(|e| {
                    DispatchError::OutputClosed(format!(
                        "Dropped task with source text: {}",
                        e.0.source_text
                    ))
                })?;
            }

            if !input_open && self.pending.is_empty() {
                return Ok(());
            }

            tokio::time::sleep(self.settings.poll_interval).await;
        }
    }
}
