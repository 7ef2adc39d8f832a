use std::path::PathBuf;

use clap::{ArgAction, Parser};
use compass_api::{DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS};

use crate::{CliCommandFileErrorMode, CliQueryMode};

pub const DEFAULT_HISTORY_FILE: &str = ".clausecompass/repl_history.txt";

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_api_base(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("api base cannot be empty".to_string());
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err("api base must start with http:// or https://".to_string());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "clausecompass",
    about = "Interactive terminal client for the ClauseCompass decision engine",
    version
)]
pub struct Cli {
    #[arg(
        long = "api-base",
        env = "CLAUSECOMPASS_API_URL",
        hide_env_values = true,
        default_value = DEFAULT_API_BASE,
        value_parser = parse_api_base,
        help = "Base URL of the decision engine API"
    )]
    pub api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "CLAUSECOMPASS_REQUEST_TIMEOUT_MS",
        hide_env_values = true,
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "HTTP request timeout in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long,
        value_enum,
        default_value = "persistent",
        help = "Query mode the session starts in"
    )]
    pub mode: CliQueryMode,

    #[arg(
        long = "session-file",
        env = "CLAUSECOMPASS_SESSION_FILE",
        hide_env_values = true,
        help = "Persist the login token to this file and restore it on startup"
    )]
    pub session_file: Option<PathBuf>,

    #[arg(
        long = "history-file",
        env = "CLAUSECOMPASS_HISTORY_FILE",
        hide_env_values = true,
        default_value = DEFAULT_HISTORY_FILE,
        help = "Interactive line-editor history file"
    )]
    pub history_file: PathBuf,

    #[arg(
        long = "no-history",
        env = "CLAUSECOMPASS_NO_HISTORY",
        hide_env_values = true,
        default_value_t = false,
        action = ArgAction::SetTrue,
        help = "Do not load or save interactive history"
    )]
    pub no_history: bool,

    #[arg(
        long = "command-file",
        env = "CLAUSECOMPASS_COMMAND_FILE",
        hide_env_values = true,
        conflicts_with = "execute",
        help = "Execute REPL lines from a UTF-8 file and exit"
    )]
    pub command_file: Option<PathBuf>,

    #[arg(
        short = 'e',
        long = "execute",
        action = ArgAction::Append,
        help = "Execute a REPL line and exit (repeatable)"
    )]
    pub execute: Vec<String>,

    #[arg(
        long = "command-file-error-mode",
        env = "CLAUSECOMPASS_COMMAND_FILE_ERROR_MODE",
        hide_env_values = true,
        value_enum,
        default_value = "fail-fast",
        help = "Behavior when scripted execution hits a failing line"
    )]
    pub command_file_error_mode: CliCommandFileErrorMode,
}

impl Cli {
    /// Returns the history path unless history is disabled.
    pub fn effective_history_file(&self) -> Option<&std::path::Path> {
        if self.no_history {
            None
        } else {
            Some(self.history_file.as_path())
        }
    }

    pub fn is_scripted(&self) -> bool {
        self.command_file.is_some() || !self.execute.is_empty()
    }
}
