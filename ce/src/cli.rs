//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// Census Explorer - ask questions about New York census data
#[derive(Parser, Debug)]
#[command(
    name = "ce",
    about = "Ask questions about New York census data and see the answers as charts",
    version,
    after_help = after_help()
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Answer from built-in fixtures instead of the census service
    #[arg(long, global = true)]
    pub mock: bool,

    /// Base URL of the census answer service
    #[arg(long = "api-url", global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Subcommand to execute; the interactive client when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        question: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// List suggested starter questions
    Prompts,
}

/// Output format for one-shot answers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}

/// Where the log file is written
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("census-explorer")
        .join("logs")
        .join("census-explorer.log")
}

fn after_help() -> String {
    format!(
        "Run without a subcommand to start the interactive client.\n\nLogs are written to: {}",
        get_log_path().display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["ce"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.mock);
    }

    #[test]
    fn test_ask_with_global_flags() {
        let cli = Cli::try_parse_from([
            "ce",
            "ask",
            "Show me population by county",
            "--format",
            "json",
            "--mock",
            "--api-url",
            "http://127.0.0.1:9000",
        ])
        .unwrap();
        assert!(cli.mock);
        assert_eq!(cli.api_url.as_deref(), Some("http://127.0.0.1:9000"));
        match cli.command {
            Some(Command::Ask { question, format }) => {
                assert_eq!(question, "Show me population by county");
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("expected ask, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["ce", "ask", "q", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_log_path_location() {
        let path = get_log_path();
        assert!(path.ends_with("census-explorer/logs/census-explorer.log"));
    }
}
