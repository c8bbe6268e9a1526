/*!
 * Tests for the serial dispatch strategy: single in-flight call, bounded
 * history window, and context passing.
 */

use std::sync::Arc;

use anyhow::Result;

use livetrans::providers::mock::MockProvider;
use livetrans::{DispatcherSettings, SerialDispatcher, TranslationClient};

use crate::common::{drain_output, output_queue, preloaded_input, test_settings};

fn settings_with_history(timeout_ms: u64, history_size: usize) -> DispatcherSettings {
    DispatcherSettings {
        history_size,
        ..test_settings(timeout_ms, 10)
    }
}

#[tokio::test]
async fn test_run_withSlowBackend_shouldKeepAtMostOneCallInFlight() -> Result<()> {
    let provider = MockProvider::slow(50);
    let client = Arc::new(TranslationClient::mock(provider.clone()));
    let mut dispatcher = SerialDispatcher::new(client, settings_with_history(5000, 10));

    let input = preloaded_input(&["one", "two", "three", "four"]);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    assert_eq!(provider.request_count(), 4);
    assert_eq!(provider.max_in_flight(), 1, "serial dispatch never overlaps calls");

    let released = drain_output(&mut output_rx);
    assert_eq!(released.len(), 4);
    Ok(())
}

#[tokio::test]
async fn test_run_withBoundedHistory_shouldKeepOnlyMostRecentResults() -> Result<()> {
    // Three successes against a window of two: only the last two remain
    let client = Arc::new(TranslationClient::mock(MockProvider::working()));
    let mut dispatcher = SerialDispatcher::new(client, settings_with_history(5000, 2));

    let input = preloaded_input(&["first", "second", "third"]);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let history = dispatcher.history_snapshot();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "[TRANSLATED] second");
    assert_eq!(history[1].content, "[TRANSLATED] third");

    let released = drain_output(&mut output_rx);
    assert_eq!(released.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_run_withFewerTasksThanBound_shouldHoldAllResults() -> Result<()> {
    let client = Arc::new(TranslationClient::mock(MockProvider::working()));
    let mut dispatcher = SerialDispatcher::new(client, settings_with_history(5000, 8));

    let input = preloaded_input(&["first", "second", "third"]);
    let (output_tx, _output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    // min(N, K) entries, in completion order
    let history = dispatcher.history_snapshot();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].content, "[TRANSLATED] first");
    assert_eq!(history[2].content, "[TRANSLATED] third");
    Ok(())
}

#[tokio::test]
async fn test_run_shouldPassGrowingHistoryToBackend() -> Result<()> {
    let provider = MockProvider::working();
    let client = Arc::new(TranslationClient::mock(provider.clone()));
    let mut dispatcher = SerialDispatcher::new(client, settings_with_history(5000, 10));

    let input = preloaded_input(&["first", "second", "third"]);
    let (output_tx, _output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let captured = provider.captured_requests();
    assert_eq!(captured.len(), 3);
    assert!(captured[0].history.is_empty());
    assert_eq!(captured[1].history.len(), 1);
    assert_eq!(captured[1].history[0].content, "[TRANSLATED] first");
    assert_eq!(captured[2].history.len(), 2);
    assert_eq!(captured[2].history[1].content, "[TRANSLATED] second");
    Ok(())
}

#[tokio::test]
async fn test_run_withStalledBackend_shouldReleaseTimedOutWithoutHistory() -> Result<()> {
    let client = Arc::new(TranslationClient::mock(MockProvider::stalled()));
    let mut dispatcher = SerialDispatcher::new(client, settings_with_history(80, 5));

    let input = preloaded_input(&["never answered", "also dispatched"]);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let released = drain_output(&mut output_rx);
    assert_eq!(released.len(), 2);
    assert!(released.iter().all(|t| !t.is_completed()));
    assert!(dispatcher.history_snapshot().is_empty(), "timeouts leave no context");
    Ok(())
}

#[tokio::test]
async fn test_run_shouldPreserveSubmissionOrder() -> Result<()> {
    let client = Arc::new(TranslationClient::mock(MockProvider::working()));
    let mut dispatcher = SerialDispatcher::new(client, settings_with_history(5000, 4));

    let lines: Vec<String> = (0..6).map(|i| format!("line {}", i)).collect();
    let line_refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();

    let input = preloaded_input(&line_refs);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let released = drain_output(&mut output_rx);
    for (i, task) in released.iter().enumerate() {
        assert_eq!(task.source_text, format!("line {}", i));
    }
    Ok(())
}

#[tokio::test]
async fn test_run_withEmptyLine_shouldRecordSentinelInHistory() -> Result<()> {
    // The sentinel is a completion, so it joins the history like any result
    let provider = MockProvider::working();
    let client = Arc::new(TranslationClient::mock(provider.clone()));
    let mut dispatcher = SerialDispatcher::new(client, settings_with_history(5000, 10));

    let input = preloaded_input(&["hello", ""]);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let released = drain_output(&mut output_rx);
    assert_eq!(released[1].result_text.as_deref(), Some("......"));
    assert_eq!(provider.request_count(), 1, "empty line never reached the backend");

    let history = dispatcher.history_snapshot();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].content, "......");
    Ok(())
}
