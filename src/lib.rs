/*!
 * # livetrans - Live Caption Translation Dispatcher
 *
 * A Rust library for dispatching short text-translation requests to an AI
 * or machine-translation backend, with per-request timeouts and ordered
 * delivery to a downstream consumer.
 *
 * ## Features
 *
 * - Two dispatch strategies:
 *   - Parallel: concurrent fan-out with submission-order output
 *     (head-of-line blocking)
 *   - Serial: one request at a time with a bounded conversational history
 * - Per-task timeout with the abandoned call's result discarded safely
 * - Pluggable translation backends:
 *   - OpenAI API and OpenAI-compatible local servers (LM Studio)
 *   - DeepLX machine translation
 * - Optional secondary backend tried when the primary call fails
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `task`: The translation task model
 * - `dispatch`: Task dispatching:
 *   - `dispatch::parallel`: Concurrent dispatch with output reordering
 *   - `dispatch::serial`: One-at-a-time dispatch with history
 *   - `dispatch::history`: Bounded conversational history window
 * - `translation_client`: Backend call collaborator with fallback policy
 * - `providers`: Client implementations for translation backends:
 *   - `providers::openai`: OpenAI-compatible chat completion client
 *   - `providers::deeplx`: DeepLX machine-translation client
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod dispatch;
pub mod errors;
pub mod providers;
pub mod task;
pub mod translation_client;

// Re-export main types for easier usage
pub use app_config::{Config, DispatchMode};
pub use dispatch::history::{ChatMessage, HistoryWindow};
pub use dispatch::parallel::ParallelDispatcher;
pub use dispatch::serial::SerialDispatcher;
pub use dispatch::{task_queue, DispatcherSettings, TaskReceiver, TaskSender};
pub use errors::{AppError, DispatchError, ProviderError, TranslationError};
pub use task::TranslationTask;
pub use translation_client::{TranslationClient, NO_CONTENT_SENTINEL};
