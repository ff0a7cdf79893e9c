//! CLI entrypoint for chorus
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod args;
mod output;
mod progress;

use anyhow::{Context, Result, anyhow, bail};
use args::Cli;
use chorus_application::{
    ChatTransport, ConversationLogger, ConversationOrchestrator, ConversationStore, ModelRegistry,
    NoConversationLogger, NoProgress, SendTurnInput, TurnProgressNotifier,
};
use chorus_domain::{ConversationMode, ModeSpec, ModelId};
use chorus_infrastructure::{
    ConfigLoader, ConfiguredModelRegistry, DslLoader, InMemoryConversationStore,
    JsonlConversationLogger, OpenAiChatTransport, TranscriptSummaryGenerator,
};
use clap::Parser;
use output::ConsoleFormatter;
use progress::ConsoleProgress;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install the diagnostics subscriber. The returned guard flushes the log
/// file on drop and must live until exit.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    info!("Starting chorus");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    if !issues.is_empty() {
        let list: Vec<String> = issues.iter().map(|i| format!("  - {}", i)).collect();
        bail!("Invalid configuration:\n{}", list.join("\n"));
    }
    if config.models.is_empty() {
        bail!("No models configured. Add a [[models]] entry to chorus.toml.");
    }

    let mode: ModeSpec = match (&cli.dsl, &cli.mode) {
        (Some(path), _) => DslLoader::load(path)?.into(),
        (None, Some(name)) => name
            .parse::<ConversationMode>()
            .map_err(|e| anyhow!(e))?
            .into(),
        (None, None) => config.mode().into(),
    };

    let temperature = cli.temperature.unwrap_or(config.engine.temperature);
    if !(0.0..=2.0).contains(&temperature) {
        bail!("Temperature {} is outside 0.0..=2.0", temperature);
    }

    // === Dependency Injection ===
    let registry = Arc::new(ConfiguredModelRegistry::from_config(&config.models));
    let transport: Arc<dyn ChatTransport> = Arc::new(
        OpenAiChatTransport::with_connect_timeout(Duration::from_secs(10))
            .map_err(|e| anyhow!(e))?,
    );
    let store = Arc::new(InMemoryConversationStore::new());
    let logger: Arc<dyn ConversationLogger> = match &config.logging.conversation_log {
        Some(path) => match JsonlConversationLogger::open(path) {
            Some(logger) => Arc::new(logger),
            None => Arc::new(NoConversationLogger),
        },
        None => Arc::new(NoConversationLogger),
    };
    let summary = Arc::new(TranscriptSummaryGenerator::new(
        Arc::clone(&transport),
        registry.clone() as Arc<dyn ModelRegistry>,
    ));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted; cancelling in-flight responses");
                cancel.cancel();
            }
        });
    }

    let orchestrator = ConversationOrchestrator::new(
        Arc::clone(&transport),
        store.clone() as Arc<dyn ConversationStore>,
        registry.clone() as Arc<dyn ModelRegistry>,
    )
    .with_config(config.to_engine_config())
    .with_summary(summary)
    .with_logger(logger)
    .with_cancellation(cancel);

    let respondents: Vec<ModelId> = if cli.model.is_empty() {
        registry.model_ids()
    } else {
        cli.model.iter().map(|m| ModelId::new(m.as_str())).collect()
    };
    for id in &respondents {
        if registry.resolve(id).is_none() {
            warn!("Model '{}' is not configured", id);
        }
    }

    let chat_id = store.create_chat().await;
    let input = SendTurnInput::new(chat_id.clone(), cli.prompt.clone(), respondents)
        .with_temperature(temperature)
        .with_mode(mode);

    let names = registry.display_names();
    let progress: Arc<dyn TurnProgressNotifier> = if cli.quiet {
        Arc::new(NoProgress)
    } else {
        Arc::new(ConsoleProgress::new(registry.display_names()))
    };

    let turn = orchestrator.send_turn_with_progress(input, progress).await?;
    let chat = store.get_chat(&chat_id).await?;

    let output = if cli.json {
        ConsoleFormatter::format_json(&chat)
    } else {
        ConsoleFormatter::format(&chat, &names, &turn)
    };
    println!("{}", output);

    Ok(())
}
