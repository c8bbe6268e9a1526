/*!
 * Mock provider implementation for testing.
 *
 * This module provides a mock provider that simulates different backend
 * behaviors:
 * - `MockProvider::working()` - Always succeeds with translated text
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::slow(ms)` - Succeeds after a fixed delay
 * - `MockProvider::stalled()` - Never completes within any reasonable timeout
 * - `MockProvider::scripted(delays)` - Per-request delays, for ordering tests
 *
 * The provider also records every request it receives and tracks how many
 * calls are in flight at once, so tests can assert on dispatch behavior.
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use crate::dispatch::history::ChatMessage;
use crate::errors::ProviderError;
use crate::providers::Provider;

/// Mock request for testing
#[derive(Debug, Clone)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Conversation history passed along with the request
    pub history: Vec<ChatMessage>,
}

/// Mock response for testing
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// The translated text
    pub text: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a translated marker
    Working,
    /// Always fails with an error
    Failing,
    /// Succeeds after a fixed delay (for timeout testing)
    Slow { delay_ms: u64 },
    /// Never completes within any reasonable timeout
    Stalled,
    /// Per-request delays indexed by arrival order; requests beyond the
    /// script complete immediately
    Scripted { delays_ms: Vec<u64> },
}

/// Mock provider for testing dispatch behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Total number of requests received
    request_count: Arc<AtomicUsize>,
    /// Number of calls currently in flight
    in_flight: Arc<AtomicUsize>,
    /// Highest number of concurrent calls observed
    max_in_flight: Arc<AtomicUsize>,
    /// Every request received, in arrival order
    captured_requests: Arc<StdMutex<Vec<MockRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            captured_requests: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that responds after a fixed delay
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock that never completes in time
    pub fn stalled() -> Self {
        Self::new(MockBehavior::Stalled)
    }

    /// Create a mock with scripted per-request delays
    pub fn scripted(delays_ms: Vec<u64>) -> Self {
        Self::new(MockBehavior::Scripted { delays_ms })
    }

    /// Total number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent calls observed so far
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Snapshot of every request received, in arrival order
    pub fn captured_requests(&self) -> Vec<MockRequest> {
        self.captured_requests.lock().unwrap().clone()
    }

    /// The canonical mock translation for a given input
    pub fn translation_of(text: &str) -> String {
        format!("[TRANSLATED] {}", text)
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            request_count: Arc::clone(&self.request_count),
            in_flight: Arc::clone(&self.in_flight),
            max_in_flight: Arc::clone(&self.max_in_flight),
            captured_requests: Arc::clone(&self.captured_requests),
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    type Request = MockRequest;
    type Response = MockResponse;

    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError> {
        let index = self.request_count.fetch_add(1, Ordering::SeqCst);
        self.captured_requests.lock().unwrap().push(request.clone());

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let result = match &self.behavior {
            MockBehavior::Working => Ok(MockResponse {
                text: Self::translation_of(&request.text),
            }),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(MockResponse {
                    text: Self::translation_of(&request.text),
                })
            }

            MockBehavior::Stalled => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(MockResponse {
                    text: Self::translation_of(&request.text),
                })
            }

            MockBehavior::Scripted { delays_ms } => {
                if let Some(delay_ms) = delays_ms.get(index) {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                }
                Ok(MockResponse {
                    text: Self::translation_of(&request.text),
                })
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    fn extract_text(response: &Self::Response) -> String {
        response.text.clone()
    }
}
