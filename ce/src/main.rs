//! Census Explorer - conversational client for regional census data
//!
//! CLI entry point: the interactive client by default, plus one-shot commands.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use census_explorer::api::{SUGGESTED_PROMPTS, create_client};
use census_explorer::cli::{Cli, Command, OutputFormat};
use census_explorer::config::{Config, MOCK_ENV_VAR};
use census_explorer::payload::{AnswerEnvelope, AskResponse};
use census_explorer::render::{ChartView, RenderedView, TableView, render};
use census_explorer::session::SessionController;
use census_explorer::submit::SubmitError;
use census_explorer::transcript::Transcript;
use census_explorer::tui;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("census-explorer")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("census-explorer.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let mock_env = std::env::var(MOCK_ENV_VAR).ok();
    config.apply_overrides(cli.mock, cli.api_url.as_deref(), mock_env.as_deref());
    config.validate().context("Invalid configuration")?;

    info!(
        mock = config.mock.enabled,
        base_url = %config.api.base_url,
        "Census Explorer loaded config"
    );

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Ask { question, format }) => {
            debug!(%question, ?format, "main: matched Ask command");
            cmd_ask(&config, &question, format).await
        }
        Some(Command::Prompts) => {
            debug!("main: matched Prompts command");
            cmd_prompts();
            Ok(())
        }
        None => {
            debug!("main: no command specified, launching TUI");
            cmd_tui(&config).await
        }
    }
}

fn open_session(config: &Config) -> Result<SessionController> {
    let api = create_client(config).context("Failed to create census client")?;
    let transcript = if config.debug.log_conversations {
        Transcript::enabled(api.name())
    } else {
        Transcript::disabled()
    };
    if let Some(path) = transcript.path() {
        info!("Conversation transcript: {}", path.display());
    }
    Ok(SessionController::with_transcript(api, transcript))
}

/// Launch the interactive client
async fn cmd_tui(config: &Config) -> Result<()> {
    debug!("cmd_tui: called");
    let session = open_session(config)?;
    tui::run(session).await
}

/// Ask one question and print the answer
async fn cmd_ask(config: &Config, question: &str, format: OutputFormat) -> Result<()> {
    debug!(%question, ?format, "cmd_ask: called");
    let mut session = open_session(config)?;

    match session.submit(question) {
        Ok(turn) => debug!(%turn, "cmd_ask: submitted"),
        Err(SubmitError::Blank) => {
            println!("{} Question is empty", "✗".red());
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to submit question"),
    }

    session.wait().await;

    if let Some(message) = session.submit_error() {
        debug!(%message, "cmd_ask: request failed");
        println!("{} {}", "✗".red(), message);
        drop(session);
        std::process::exit(1);
    }

    let envelope = session
        .log()
        .last_fulfilled()
        .and_then(|turn| turn.answer.clone())
        .ok_or_else(|| eyre::eyre!("No answer received for: {}", question))?;
    let view = session.displayed_view().cloned();
    drop(session);

    match format {
        OutputFormat::Json => {
            let body = serde_json::to_string_pretty(&AskResponse::from_envelope(&envelope))?;
            println!("{}", body);
        }
        OutputFormat::Text => print_answer(&envelope, view.as_ref()),
    }

    if let Some(detail) = envelope.error_detail() {
        debug!(%detail, "cmd_ask: service reported an error");
        if format == OutputFormat::Text {
            println!("{} {}", "✗".red(), detail);
        }
        std::process::exit(1);
    }
    Ok(())
}

fn print_answer(envelope: &AnswerEnvelope, view: Option<&RenderedView>) {
    println!("{}", envelope.text_answer);

    let Some(payload) = envelope.payload.as_ref() else {
        return;
    };
    let rendered;
    let view = match view {
        Some(view) => view,
        None => {
            rendered = render(payload);
            &rendered
        }
    };

    println!();
    if matches!(view.chart, ChartView::Unsupported { .. }) {
        println!("{} Unsupported chart type: '{}'", "⚠".yellow(), payload.kind());
        return;
    }
    if !view.title.is_empty() {
        println!("{}", view.title.bold());
    }
    print_table(&view.table);
}

fn print_table(table: &TableView) {
    let widths = table.column_widths();
    let cell = |i: usize, text: &str| format!("{:<width$}", text, width = widths.get(i).copied().unwrap_or(0));

    let header: Vec<String> = table.headers.iter().enumerate().map(|(i, h)| cell(i, h)).collect();
    println!("{}", header.join("  ").cyan());
    for row in &table.rows {
        let cells: Vec<String> = row.iter().enumerate().map(|(i, c)| cell(i, c)).collect();
        println!("{}", cells.join("  "));
    }
}

/// List the suggested questions
fn cmd_prompts() {
    debug!("cmd_prompts: called");
    println!("{}", "Suggested questions:".bold());
    for (i, prompt) in SUGGESTED_PROMPTS.iter().enumerate() {
        println!("  {} {}", format!("{}.", i + 1).dimmed(), prompt);
    }
}
