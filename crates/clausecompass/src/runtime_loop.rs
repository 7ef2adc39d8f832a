use std::io::{IsTerminal, Write};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use compass_cli::COMMAND_NAMES;
use rustyline::{
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::Highlighter,
    hint::Hinter,
    history::DefaultHistory,
    validate::Validator,
    Config as ReadlineConfig, Context as ReadlineContext, Editor, Helper,
};

use crate::commands::{execute_repl_line, CommandAction, CommandExecutionContext};
use crate::credential_prompt::{CredentialPrompter, ReaderPrompter, TerminalPrompter};
use crate::session_state::SessionState;

const REPL_CONTINUATION_PROMPT: &str = "...> ";
const REPL_WELCOME: &str =
    "welcome to the ClauseCompass decision engine CLI. type 'help' for commands.";

#[derive(Clone, Copy)]
pub(crate) struct InteractiveRuntimeConfig<'a> {
    pub(crate) command_context: CommandExecutionContext<'a>,
    pub(crate) history_path: Option<&'a Path>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InteractiveLoopControl {
    Continue,
    Exit,
}

#[derive(Debug, Default)]
struct ReplMultilineState {
    lines: Vec<String>,
}

impl ReplMultilineState {
    fn prompt(&self, state: &SessionState) -> String {
        if self.lines.is_empty() {
            state.prompt()
        } else {
            REPL_CONTINUATION_PROMPT.to_string()
        }
    }

    /// Buffers lines ending in a single `\`; returns the joined input once complete.
    fn push_line(&mut self, line: String) -> Option<String> {
        let continued = line.ends_with('\\') && !line.ends_with("\\\\");
        if continued {
            let mut trimmed = line;
            trimmed.pop();
            self.lines.push(trimmed);
            None
        } else {
            self.lines.push(line);
            let input = self.lines.join("\n");
            self.lines.clear();
            Some(input)
        }
    }

    fn has_pending(&self) -> bool {
        !self.lines.is_empty()
    }

    fn clear(&mut self) {
        self.lines.clear();
    }
}

#[derive(Debug)]
struct ReplCommandCompleter {
    commands: Vec<String>,
}

impl ReplCommandCompleter {
    fn new(commands: &[&str]) -> Self {
        Self {
            commands: commands
                .iter()
                .map(|command| (*command).to_string())
                .collect(),
        }
    }

    fn complete_token(&self, token: &str) -> Vec<String> {
        if token.is_empty() {
            return Vec::new();
        }
        let lowered = token.to_ascii_lowercase();
        self.commands
            .iter()
            .filter(|candidate| candidate.starts_with(&lowered))
            .cloned()
            .collect()
    }
}

impl Helper for ReplCommandCompleter {}
impl Validator for ReplCommandCompleter {}
impl Highlighter for ReplCommandCompleter {}

impl Hinter for ReplCommandCompleter {
    type Hint = String;
}

impl Completer for ReplCommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let safe_pos = pos.min(line.len());
        let before_cursor = &line[..safe_pos];
        let start = before_cursor.len() - before_cursor.trim_start().len();
        let token = &before_cursor[start..];
        // Only the leading word names a command; later words are arguments or query text.
        if token.contains(char::is_whitespace) {
            return Ok((safe_pos, Vec::new()));
        }

        let matches = self
            .complete_token(token)
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect::<Vec<_>>();
        Ok((start, matches))
    }
}

pub(crate) fn run_interactive(
    state: &mut SessionState,
    config: InteractiveRuntimeConfig<'_>,
) -> Result<()> {
    println!("{REPL_WELCOME}");
    let result = if std::io::stdin().is_terminal() && std::io::stdout().is_terminal() {
        run_interactive_tty(state, config)
    } else {
        run_interactive_stdin(state, config)
    };
    println!("\nexiting...");
    result
}

fn run_interactive_stdin(
    state: &mut SessionState,
    config: InteractiveRuntimeConfig<'_>,
) -> Result<()> {
    let mut prompter = ReaderPrompter::new(std::io::stdin());

    loop {
        print!("{}", state.prompt());
        std::io::stdout()
            .flush()
            .context("failed to flush stdout")?;

        let mut line = String::new();
        let read = std::io::stdin()
            .read_line(&mut line)
            .context("failed to read interactive input")?;
        if read == 0 {
            break;
        }

        match dispatch_interactive_turn(&line, state, &mut prompter, config.command_context) {
            InteractiveLoopControl::Continue => continue,
            InteractiveLoopControl::Exit => break,
        }
    }

    Ok(())
}

fn run_interactive_tty(
    state: &mut SessionState,
    config: InteractiveRuntimeConfig<'_>,
) -> Result<()> {
    let mut editor = build_repl_editor()?;
    if let Some(path) = config.history_path {
        load_repl_history(&mut editor, path);
    }
    let mut prompter = TerminalPrompter::new();
    let mut multiline = ReplMultilineState::default();

    loop {
        let prompt = multiline.prompt(state);
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                if multiline.has_pending() {
                    multiline.clear();
                    println!();
                    continue;
                }
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(error) => return Err(anyhow!("failed to read interactive input: {error}")),
        };

        let Some(input) = multiline.push_line(line) else {
            continue;
        };

        if input.trim().is_empty() {
            continue;
        }

        if matches!(editor.add_history_entry(input.as_str()), Ok(true)) {
            if let Some(path) = config.history_path {
                save_repl_history(&mut editor, path);
            }
        }

        match dispatch_interactive_turn(&input, state, &mut prompter, config.command_context) {
            InteractiveLoopControl::Continue => continue,
            InteractiveLoopControl::Exit => break,
        }
    }

    if let Some(path) = config.history_path {
        save_repl_history(&mut editor, path);
    }
    Ok(())
}

fn dispatch_interactive_turn(
    input: &str,
    state: &mut SessionState,
    prompter: &mut dyn CredentialPrompter,
    context: CommandExecutionContext<'_>,
) -> InteractiveLoopControl {
    match execute_repl_line(input, state, prompter, context) {
        Ok(outcome) => {
            if !outcome.output.is_empty() {
                println!("{}", outcome.output);
            }
            match outcome.action {
                CommandAction::Continue => InteractiveLoopControl::Continue,
                CommandAction::Exit => InteractiveLoopControl::Exit,
            }
        }
        Err(error) => {
            report_interactive_turn_error(&error);
            InteractiveLoopControl::Continue
        }
    }
}

fn build_repl_editor() -> Result<Editor<ReplCommandCompleter, DefaultHistory>> {
    let config = ReadlineConfig::builder().build();
    let mut editor = Editor::<ReplCommandCompleter, DefaultHistory>::with_config(config)
        .context("failed to initialize interactive editor")?;
    editor.set_helper(Some(ReplCommandCompleter::new(COMMAND_NAMES)));
    Ok(editor)
}

fn load_repl_history(editor: &mut Editor<ReplCommandCompleter, DefaultHistory>, path: &Path) {
    if let Err(error) = editor.load_history(path) {
        if !matches!(
            error,
            ReadlineError::Io(ref io_error) if io_error.kind() == std::io::ErrorKind::NotFound
        ) {
            eprintln!(
                "warning: failed to load REPL history from {}: {error}",
                path.display()
            );
        }
    }
}

fn save_repl_history(editor: &mut Editor<ReplCommandCompleter, DefaultHistory>, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(error) = std::fs::create_dir_all(parent) {
                eprintln!(
                    "warning: failed to create REPL history directory {}: {error}",
                    parent.display()
                );
                return;
            }
        }
    }

    if let Err(error) = editor.save_history(path) {
        eprintln!(
            "warning: failed to persist REPL history to {}: {error}",
            path.display()
        );
    }
}

fn report_interactive_turn_error(error: &anyhow::Error) {
    eprintln!("error: {error:#}");
}
