/*!
 * Tests for the parallel dispatch strategy: ordering, timeout and
 * disposition guarantees under concurrent backend calls.
 */

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use rand::Rng;

use livetrans::providers::mock::MockProvider;
use livetrans::{ParallelDispatcher, TranslationClient, NO_CONTENT_SENTINEL};

use crate::common::{drain_output, output_queue, preloaded_input, test_settings};

#[tokio::test]
async fn test_run_withRandomLatencies_shouldPreserveSubmissionOrder() -> Result<()> {
    // Random per-request latencies: completion order differs from
    // submission order, output order must not
    let mut rng = rand::rng();
    let count: usize = 12;
    let delays: Vec<u64> = (0..count).map(|_| rng.random_range(0..80)).collect();

    let lines: Vec<String> = (0..count).map(|i| format!("line {}", i)).collect();
    let line_refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();

    let provider = MockProvider::scripted(delays);
    let client = Arc::new(TranslationClient::mock(provider));
    let mut dispatcher = ParallelDispatcher::new(client, test_settings(5000, 10));

    let input = preloaded_input(&line_refs);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let released = drain_output(&mut output_rx);
    assert_eq!(released.len(), count);
    for (i, task) in released.iter().enumerate() {
        assert_eq!(task.source_text, format!("line {}", i));
        assert_eq!(
            task.result_text.as_deref(),
            Some(format!("[TRANSLATED] line {}", i).as_str())
        );
    }
    Ok(())
}

#[tokio::test]
async fn test_run_withEverySubmittedTask_shouldReleaseExactlyOnce() -> Result<()> {
    let lines: Vec<String> = (0..20).map(|i| format!("caption {}", i)).collect();
    let line_refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();

    let client = Arc::new(TranslationClient::mock(MockProvider::working()));
    let mut dispatcher = ParallelDispatcher::new(client, test_settings(5000, 10));

    let input = preloaded_input(&line_refs);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let released = drain_output(&mut output_rx);
    assert_eq!(released.len(), 20);

    let distinct: HashSet<&str> = released.iter().map(|t| t.source_text.as_str()).collect();
    assert_eq!(distinct.len(), 20, "no task released more than once");
    Ok(())
}

#[tokio::test]
async fn test_run_withStalledBackend_shouldReleaseWithinTimeoutBounds() -> Result<()> {
    let timeout_ms = 200;
    let poll_ms = 50;

    let client = Arc::new(TranslationClient::mock(MockProvider::stalled()));
    let mut dispatcher = ParallelDispatcher::new(client, test_settings(timeout_ms, poll_ms));

    let input = preloaded_input(&["never answered"]);
    let (output_tx, mut output_rx) = output_queue();

    let started = Instant::now();
    dispatcher.run(input, output_tx).await?;
    let elapsed = started.elapsed();

    let released = drain_output(&mut output_rx);
    assert_eq!(released.len(), 1);
    assert!(!released[0].is_completed());

    // No earlier than the timeout; no later than timeout plus one polling
    // interval plus scheduling slack
    assert!(elapsed >= Duration::from_millis(timeout_ms));
    assert!(elapsed < Duration::from_millis(timeout_ms + poll_ms + 500));
    Ok(())
}

#[tokio::test]
async fn test_run_withTimedOutHead_shouldReleaseFastFollowerAfterIt() -> Result<()> {
    // Head stalls past the timeout while the second task finishes at once;
    // the follower must still come out second
    let provider = MockProvider::scripted(vec![600, 0]);
    let client = Arc::new(TranslationClient::mock(provider));
    let mut dispatcher = ParallelDispatcher::new(client, test_settings(150, 20));

    let input = preloaded_input(&["stalls", "instant"]);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let released = drain_output(&mut output_rx);
    assert_eq!(released.len(), 2);
    assert_eq!(released[0].source_text, "stalls");
    assert!(!released[0].is_completed(), "timed out head has no result");
    assert_eq!(released[1].source_text, "instant");
    assert!(released[1].is_completed());
    Ok(())
}

#[tokio::test]
async fn test_run_withEmptyLineBetweenCaptions_shouldEmitSentinelInOrder() -> Result<()> {
    let provider = MockProvider::working();
    let client = Arc::new(TranslationClient::mock(provider.clone()));
    let mut dispatcher = ParallelDispatcher::new(client, test_settings(5000, 10));

    let input = preloaded_input(&["こんにちは", "", "ありがとう"]);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let released = drain_output(&mut output_rx);
    assert_eq!(released.len(), 3);
    assert_eq!(released[0].source_text, "こんにちは");
    assert_eq!(released[0].result_text.as_deref(), Some("[TRANSLATED] こんにちは"));
    assert_eq!(released[1].result_text.as_deref(), Some(NO_CONTENT_SENTINEL));
    assert_eq!(released[2].source_text, "ありがとう");
    assert_eq!(released[2].result_text.as_deref(), Some("[TRANSLATED] ありがとう"));

    // The empty line never reached the backend
    assert_eq!(provider.request_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingBackend_shouldReleaseAllAsTimedOut() -> Result<()> {
    // A definitive backend failure surfaces the same way as a slow one:
    // the task waits out its timeout and is released without a result
    let client = Arc::new(TranslationClient::mock(MockProvider::failing()));
    let mut dispatcher = ParallelDispatcher::new(client, test_settings(100, 20));

    let input = preloaded_input(&["first", "second"]);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let released = drain_output(&mut output_rx);
    assert_eq!(released.len(), 2);
    assert!(released.iter().all(|t| !t.is_completed()));
    assert_eq!(released[0].source_text, "first");
    assert_eq!(released[1].source_text, "second");
    Ok(())
}

#[tokio::test]
async fn test_run_withFailingPrimaryAndWorkingFallback_shouldComplete() -> Result<()> {
    let fallback = MockProvider::working();
    let client = Arc::new(TranslationClient::mock_with_fallback(
        MockProvider::failing(),
        fallback.clone(),
    ));
    let mut dispatcher = ParallelDispatcher::new(client, test_settings(5000, 10));

    let input = preloaded_input(&["hello"]);
    let (output_tx, mut output_rx) = output_queue();
    dispatcher.run(input, output_tx).await?;

    let released = drain_output(&mut output_rx);
    assert_eq!(released[0].result_text.as_deref(), Some("[TRANSLATED] hello"));
    assert_eq!(fallback.request_count(), 1);
    Ok(())
}
