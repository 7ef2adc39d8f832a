mod bootstrap_helpers;
mod command_runner;
mod commands;
mod credential_prompt;
mod runtime_loop;
mod runtime_output;
mod session_state;
mod session_store;

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use compass_api::{ApiClient, ApiConfig};
use compass_cli::{parse_command_file, Cli, CommandFileEntry};

use crate::bootstrap_helpers::init_tracing;
use crate::command_runner::execute_scripted_lines;
use crate::commands::{execute_repl_line, CommandExecutionContext};
use crate::credential_prompt::{CredentialPrompter, ReaderPrompter, TerminalPrompter};
use crate::runtime_loop::{run_interactive, InteractiveRuntimeConfig};
use crate::session_state::SessionState;
use crate::session_store::load_persisted_session;

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    let api = ApiClient::new(ApiConfig {
        api_base: cli.api_base.clone(),
        request_timeout_ms: cli.request_timeout_ms,
    })
    .context("failed to initialize decision engine client")?;

    let mut state = SessionState::new(cli.mode.into());
    if let Some(path) = cli.session_file.as_deref() {
        restore_session(&mut state, path);
    }

    let command_context = CommandExecutionContext {
        api: &api,
        session_file: cli.session_file.as_deref(),
    };

    if cli.is_scripted() {
        return run_scripted(cli, &mut state, command_context);
    }

    run_interactive(
        &mut state,
        InteractiveRuntimeConfig {
            command_context,
            history_path: cli.effective_history_file(),
        },
    )
}

fn restore_session(state: &mut SessionState, path: &Path) {
    match load_persisted_session(path) {
        Ok(Some(session)) => {
            tracing::info!(path = %path.display(), "restored saved session");
            state.login(session.token, session.user_email);
        }
        Ok(None) => {}
        Err(error) => eprintln!("warning: ignoring saved session: {error:#}"),
    }
}

fn execute_flag_entries(lines: &[String]) -> Vec<CommandFileEntry> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| CommandFileEntry {
            line_number: index + 1,
            command: line.trim().to_string(),
        })
        .collect()
}

fn run_scripted(
    cli: &Cli,
    state: &mut SessionState,
    command_context: CommandExecutionContext<'_>,
) -> Result<()> {
    let (source, entries) = match cli.command_file.as_deref() {
        Some(path) => (path.display().to_string(), parse_command_file(path)?),
        None => ("--execute".to_string(), execute_flag_entries(&cli.execute)),
    };

    let mut prompter: Box<dyn CredentialPrompter> = if std::io::stdin().is_terminal() {
        Box::new(TerminalPrompter::new())
    } else {
        Box::new(ReaderPrompter::new(std::io::stdin()))
    };

    execute_scripted_lines(&source, &entries, cli.command_file_error_mode, |line| {
        let outcome = execute_repl_line(line, state, prompter.as_mut(), command_context)?;
        if !outcome.output.is_empty() {
            println!("{}", outcome.output);
        }
        Ok(outcome.action)
    })?;
    Ok(())
}
