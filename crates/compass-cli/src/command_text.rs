use anyhow::{anyhow, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSection {
    Core,
    Persistent,
    Temporary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub details: &'static str,
    pub example: &'static str,
    pub section: CommandSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: &'static str,
    pub args: &'a str,
}

/// Classification of one REPL line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplInput<'a> {
    Empty,
    Command(ParsedCommand<'a>),
    Query(&'a str),
}

pub const COMMAND_SPECS: &[CommandSpec] = &[
    CommandSpec {
        name: "mode",
        usage: "mode <persistent|temporary>",
        description: "Switch query mode; clears any document context",
        details: "persistent queries the server knowledge base; temporary uploads staged local files with each query. Both document contexts are cleared on switch.",
        example: "mode temporary",
        section: CommandSection::Core,
    },
    CommandSpec {
        name: "register",
        usage: "register",
        description: "Create an account on the decision engine",
        details: "Prompts for user id, email, and password. Log in afterwards.",
        example: "register",
        section: CommandSection::Core,
    },
    CommandSpec {
        name: "login",
        usage: "login [email]",
        description: "Start an authenticated session",
        details: "Prompts for the email (unless given) and the password. The token is saved when a session file is configured.",
        example: "login analyst@example.com",
        section: CommandSection::Core,
    },
    CommandSpec {
        name: "logout",
        usage: "logout",
        description: "End the session and clear document contexts",
        details: "Forgets the token and email, clears both document contexts, and removes the saved session file.",
        example: "logout",
        section: CommandSection::Core,
    },
    CommandSpec {
        name: "status",
        usage: "status",
        description: "Show API endpoint, mode, user, and context sizes",
        details: "Prints a one-screen summary of the current session.",
        example: "status",
        section: CommandSection::Core,
    },
    CommandSpec {
        name: "help",
        usage: "help [command]",
        description: "Show this help message",
        details: "Without arguments lists every command. With a command name shows its usage and an example.",
        example: "help set_docs",
        section: CommandSection::Core,
    },
    CommandSpec {
        name: "exit",
        usage: "exit / quit",
        description: "Exit the application",
        details: "Alias: quit",
        example: "exit",
        section: CommandSection::Core,
    },
    CommandSpec {
        name: "list_docs",
        usage: "list_docs",
        description: "List documents in the persistent knowledge base",
        details: "Requires login and persistent mode. Names are printed sorted.",
        example: "list_docs",
        section: CommandSection::Persistent,
    },
    CommandSpec {
        name: "set_docs",
        usage: "set_docs [file1.pdf]...",
        description: "Restrict queries to server-side documents",
        details: "Replaces the persistent document context. Quote names containing spaces. No arguments or '*' clears the context.",
        example: "set_docs policy.pdf \"claims handbook.pdf\"",
        section: CommandSection::Persistent,
    },
    CommandSpec {
        name: "add_doc",
        usage: "add_doc /path/to/file.pdf...",
        description: "Stage local documents for the next query",
        details: "Temporary mode only. Paths are stored as absolute paths; already staged paths are skipped.",
        example: "add_doc ./contract.pdf ./annex.pdf",
        section: CommandSection::Temporary,
    },
    CommandSpec {
        name: "show_docs",
        usage: "show_docs",
        description: "Show the document context for the current mode",
        details: "Persistent mode shows server-side names; temporary mode shows staged local files.",
        example: "show_docs",
        section: CommandSection::Temporary,
    },
    CommandSpec {
        name: "clear_docs",
        usage: "clear_docs",
        description: "Clear the document context for the current mode",
        details: "Only the active mode's context is cleared.",
        example: "clear_docs",
        section: CommandSection::Temporary,
    },
];

pub const COMMAND_NAMES: &[&str] = &[
    "help",
    "mode",
    "register",
    "login",
    "logout",
    "status",
    "list_docs",
    "set_docs",
    "add_doc",
    "show_docs",
    "clear_docs",
    "exit",
    "quit",
];

pub fn canonical_command_name(name: &str) -> &str {
    if name == "quit" {
        "exit"
    } else {
        name
    }
}

fn lookup_command_name(word: &str) -> Option<&'static str> {
    let lowered = word.to_ascii_lowercase();
    let canonical = canonical_command_name(&lowered);
    COMMAND_NAMES
        .iter()
        .copied()
        .find(|candidate| *candidate == canonical)
}

/// Classifies a REPL line: known leading words are commands, anything else is a query.
pub fn parse_repl_input(input: &str) -> ReplInput<'_> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return ReplInput::Empty;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let word = parts.next().unwrap_or_default();
    let args = parts.next().map(str::trim).unwrap_or_default();
    match lookup_command_name(word) {
        Some(name) => ReplInput::Command(ParsedCommand { name, args }),
        None => ReplInput::Query(trimmed),
    }
}

/// Splits command arguments using shell quoting rules.
pub fn split_command_args(args: &str) -> Result<Vec<String>> {
    shell_words::split(args).map_err(|error| anyhow!("failed to parse arguments: {error}"))
}

fn render_section(lines: &mut Vec<String>, specs: &[CommandSpec], section: CommandSection) {
    for spec in specs.iter().filter(|spec| spec.section == section) {
        lines.push(format!("  {:<30} {}", spec.usage, spec.description));
    }
}

pub fn render_help_overview(command_specs: &[CommandSpec]) -> String {
    let mut lines = vec![
        "ClauseCompass decision engine CLI".to_string(),
        "core commands:".to_string(),
    ];
    render_section(&mut lines, command_specs, CommandSection::Core);
    lines.push(String::new());
    lines.push("persistent mode commands (query the pre-loaded server knowledge base):".to_string());
    render_section(&mut lines, command_specs, CommandSection::Persistent);
    lines.push(String::new());
    lines.push("temporary mode commands (upload your own documents for a one-time query):".to_string());
    render_section(&mut lines, command_specs, CommandSection::Temporary);
    lines.push(String::new());
    lines.push("querying:".to_string());
    lines.push(
        "  type your query and press enter; the current mode decides how it runs".to_string(),
    );
    lines.push("tip: run help <command> for details".to_string());
    lines.join("\n")
}

pub fn render_command_help(topic: &str, command_specs: &[CommandSpec]) -> Option<String> {
    let lowered = topic.trim().to_ascii_lowercase();
    let command_name = canonical_command_name(&lowered);
    let spec = command_specs
        .iter()
        .find(|entry| entry.name == command_name)?;
    Some(format!(
        "command: {}\nusage: {}\n{}\n{}\nexample: {}",
        spec.name, spec.usage, spec.description, spec.details, spec.example
    ))
}

pub fn unknown_help_topic_message(topic: &str, command_names: &[&str]) -> String {
    match suggest_command(topic, command_names) {
        Some(suggestion) => format!(
            "unknown help topic: {topic}\ndid you mean {suggestion}?\nrun help for command list"
        ),
        None => format!("unknown help topic: {topic}\nrun help for command list"),
    }
}

fn suggest_command<'a>(command: &str, command_names: &'a [&str]) -> Option<&'a str> {
    let lowered = command.trim().to_ascii_lowercase();
    let command = canonical_command_name(&lowered);
    if command.is_empty() {
        return None;
    }

    if let Some(prefix_match) = command_names
        .iter()
        .copied()
        .find(|candidate| candidate.starts_with(command))
    {
        return Some(prefix_match);
    }

    let mut best: Option<(&str, usize)> = None;
    for candidate in command_names.iter().copied() {
        let distance = levenshtein_distance(command, candidate);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((candidate, distance)),
        }
    }

    let (candidate, distance) = best?;
    let threshold = match command.len() {
        0..=4 => 1,
        5..=8 => 2,
        _ => 3,
    };
    if distance <= threshold {
        Some(candidate)
    } else {
        None
    }
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }
    if a.is_empty() {
        return b.chars().count();
    }
    if b.is_empty() {
        return a.chars().count();
    }

    let b_chars = b.chars().collect::<Vec<_>>();
    let mut previous = (0..=b_chars.len()).collect::<Vec<_>>();
    let mut current = vec![0; b_chars.len() + 1];

    for (i, left) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, right) in b_chars.iter().enumerate() {
            let substitution_cost = usize::from(left != *right);
            let deletion = previous[j + 1] + 1;
            let insertion = current[j] + 1;
            let substitution = previous[j] + substitution_cost;
            current[j + 1] = deletion.min(insertion).min(substitution);
        }
        previous.clone_from_slice(&current);
    }

    previous[b_chars.len()]
}
