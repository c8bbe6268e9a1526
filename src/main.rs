// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::app_config::{Config, DispatchMode, TranslationProvider};
use crate::dispatch::parallel::ParallelDispatcher;
use crate::dispatch::serial::SerialDispatcher;
use crate::dispatch::{task_queue, DispatcherSettings, TaskSender};
use crate::task::TranslationTask;
use crate::translation_client::TranslationClient;

mod app_config;
mod dispatch;
mod errors;
mod providers;
mod task;
mod translation_client;

/// CLI Wrapper for DispatchMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliDispatchMode {
    Parallel,
    Serial,
}

impl From<CliDispatchMode> for DispatchMode {
    fn from(cli_mode: CliDispatchMode) -> Self {
        match cli_mode {
            CliDispatchMode::Parallel => DispatchMode::Parallel,
            CliDispatchMode::Serial => DispatchMode::Serial,
        }
    }
}

/// CLI Wrapper for TranslationProvider to implement ValueEnum
///
/// Value names are pinned to the identifiers the config file uses, so
/// `-p deeplx` on the command line and `"provider": "deeplx"` in conf.json
/// are the same string.
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(name = "openai")]
    OpenAI,
    #[value(name = "lmstudio")]
    LMStudio,
    #[value(name = "deeplx")]
    DeepLX,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::OpenAI => TranslationProvider::OpenAI,
            CliTranslationProvider::LMStudio => TranslationProvider::LMStudio,
            CliTranslationProvider::DeepLX => TranslationProvider::DeepLX,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

/// livetrans - Live Caption Translation Dispatcher
///
/// Reads caption lines from a file or stdin, translates them through an AI
/// or machine-translation backend, and prints the results in order.
#[derive(Parser, Debug)]
#[command(name = "livetrans")]
#[command(version = "1.0.0")]
#[command(about = "AI-powered live caption translation dispatcher")]
#[command(long_about = "livetrans reads caption lines from a file or stdin, dispatches them to a
translation backend, and prints results downstream in submission order.

EXAMPLES:
    livetrans captions.txt                      # Translate a file of caption lines
    cat captions.txt | livetrans                # Same, via stdin
    livetrans -m serial captions.txt            # One request at a time, with context
    livetrans -p deeplx captions.txt            # Use the DeepLX backend
    livetrans -t 10 captions.txt                # 10 second per-line timeout

DISPATCH MODES:
    parallel - many requests in flight, output restored to input order
    serial   - one request at a time, past results passed as context

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config. If the config file doesn't exist,
    a default one will be created automatically.")]
struct CommandLineOptions {
    /// Input file with one caption line per row; stdin when omitted
    #[arg(value_name = "INPUT_FILE")]
    input_file: Option<PathBuf>,

    /// Dispatch strategy to use
    #[arg(short = 'm', long, value_enum)]
    mode: Option<CliDispatchMode>,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Model name to use for translation
    #[arg(long)]
    model: Option<String>,

    /// Per-line timeout in seconds
    #[arg(short, long)]
    timeout_secs: Option<u64>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &cli.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&config_log_level));
    }

    // Load or create configuration
    let config_path = &cli.config_path;
    let mut config = if Path::new(config_path).exists() {
        let contents = std::fs::read_to_string(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        serde_json::from_str::<Config>(&contents)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Override config with CLI options if provided
    if let Some(mode) = &cli.mode {
        config.dispatch.mode = mode.clone().into();
    }

    if let Some(provider) = &cli.provider {
        config.translation.provider = provider.clone().into();
    }

    if let Some(model) = &cli.model {
        // Find the provider config and update the model
        let provider_str = config.translation.provider.to_lowercase_string();
        if let Some(provider_config) = config.translation.available_providers.iter_mut()
            .find(|p| p.provider_type == provider_str) {
            provider_config.model = model.clone();
        }
    }

    if let Some(timeout_secs) = cli.timeout_secs {
        config.dispatch.timeout_secs = timeout_secs;
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if cli.log_level.is_none() {
        log::set_max_level(level_filter(&config.log_level));
    }

    run(config, cli.input_file).await
}

async fn run(config: Config, input_file: Option<PathBuf>) -> Result<()> {
    let client = Arc::new(TranslationClient::new(&config.translation));
    let settings = DispatcherSettings::from_config(&config);
    let mode = config.dispatch.mode;

    info!(
        "Dispatching with {} strategy via {} (timeout {}s)",
        mode,
        config.translation.provider.display_name(),
        config.dispatch.timeout_secs
    );

    let (input_tx, input_rx) = task_queue();
    let (output_tx, mut output_rx) = task_queue();

    // Producer: one task per input line; closing the sender ends the run
    let producer = tokio::spawn(async move {
        match input_file {
            Some(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .context(format!("Failed to open input file: {:?}", path))?;
                produce_lines(BufReader::new(file), input_tx).await
            }
            None => produce_lines(BufReader::new(tokio::io::stdin()), input_tx).await,
        }
    });

    // Dispatcher: drains the input queue under the chosen strategy
    let dispatcher = tokio::spawn(async move {
        match mode {
            DispatchMode::Parallel => {
                ParallelDispatcher::new(client, settings)
                    .run(input_rx, output_tx)
                    .await
            }
            DispatchMode::Serial => {
                SerialDispatcher::new(client, settings)
                    .run(input_rx, output_tx)
                    .await
            }
        }
    });

    // Consumer: results arrive in submission order under both strategies
    let mut completed = 0usize;
    let mut failed = 0usize;
    while let Some(task) = output_rx.recv().await {
        match &task.result_text {
            Some(result) => {
                completed += 1;
                println!("{}", result);
                debug!("{} -> {}", task.source_text, result);
            }
            None => {
                failed += 1;
                println!("[untranslated] {}", task.source_text);
            }
        }
    }

    producer.await.map_err(|e| anyhow!("Producer task panicked: {}", e))??;
    dispatcher.await.map_err(|e| anyhow!("Dispatcher task panicked: {}", e))??;

    info!("Finished: {} translated, {} failed or timed out", completed, failed);

    Ok(())
}

/// Feed input lines into the dispatch queue as translation tasks
async fn produce_lines<R>(reader: BufReader<R>, input_tx: TaskSender) -> Result<()>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if input_tx.send(TranslationTask::new(line)).is_err() {
            // Dispatcher is gone; stop reading
            break;
        }
    }
    Ok(())
}
