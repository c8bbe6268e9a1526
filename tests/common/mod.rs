/*!
 * Common test utilities for the livetrans test suite
 */

use std::time::Duration;

use livetrans::{task_queue, DispatcherSettings, TaskReceiver, TaskSender, TranslationTask};

/// Dispatcher settings with short intervals suitable for tests
pub fn test_settings(timeout_ms: u64, poll_interval_ms: u64) -> DispatcherSettings {
    DispatcherSettings {
        timeout: Duration::from_millis(timeout_ms),
        poll_interval: Duration::from_millis(poll_interval_ms),
        max_concurrent_requests: 32,
        history_size: 10,
    }
}

/// Build an input queue preloaded with one task per line, with the sending
/// half already dropped so a dispatcher run terminates once drained
pub fn preloaded_input(lines: &[&str]) -> TaskReceiver {
    let (tx, rx) = task_queue();
    for line in lines {
        tx.send(TranslationTask::new(*line)).expect("queue accepts tasks");
    }
    rx
}

/// Create an output queue pair
pub fn output_queue() -> (TaskSender, TaskReceiver) {
    task_queue()
}

/// Drain every task buffered in a queue without waiting
pub fn drain_output(rx: &mut TaskReceiver) -> Vec<TranslationTask> {
    let mut tasks = Vec::new();
    while let Ok(task) = rx.try_recv() {
        tasks.push(task);
    }
    tasks
}
