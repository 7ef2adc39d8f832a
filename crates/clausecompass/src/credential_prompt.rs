use std::borrow::Cow;
use std::io::Write;

use anyhow::{anyhow, Context, Result};
use rustyline::{
    completion::Completer, error::ReadlineError, highlight::Highlighter, hint::Hinter,
    history::DefaultHistory, validate::Validator, Editor, Helper,
};

/// Source of interactive answers for commands that need credentials.
///
/// `Ok(None)` means the user cancelled (EOF or interrupt).
pub(crate) trait CredentialPrompter {
    fn prompt_line(&mut self, label: &str) -> Result<Option<String>>;

    fn prompt_secret(&mut self, label: &str) -> Result<Option<String>>;
}

#[derive(Debug, Default)]
struct MaskingHelper {
    masking: bool,
}

impl Helper for MaskingHelper {}
impl Validator for MaskingHelper {}

impl Completer for MaskingHelper {
    type Candidate = String;
}

impl Hinter for MaskingHelper {
    type Hint = String;
}

impl Highlighter for MaskingHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if self.masking {
            Cow::Owned("*".repeat(line.chars().count()))
        } else {
            Cow::Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        self.masking
    }
}

/// Line-editor prompter for TTY sessions; secrets echo as `*`.
pub(crate) struct TerminalPrompter {
    editor: Option<Editor<MaskingHelper, DefaultHistory>>,
}

impl TerminalPrompter {
    pub(crate) fn new() -> Self {
        Self { editor: None }
    }

    fn read(&mut self, label: &str, masking: bool) -> Result<Option<String>> {
        if self.editor.is_none() {
            let mut editor = Editor::<MaskingHelper, DefaultHistory>::new()
                .context("failed to initialize credential prompt")?;
            editor.set_helper(Some(MaskingHelper::default()));
            self.editor = Some(editor);
        }
        let Some(editor) = self.editor.as_mut() else {
            return Err(anyhow!("credential prompt is unavailable"));
        };
        if let Some(helper) = editor.helper_mut() {
            helper.masking = masking;
        }

        let result = match editor.readline(label) {
            Ok(line) if masking => Ok(Some(line)),
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(error) => Err(anyhow!("failed to read input: {error}")),
        };
        if let Some(helper) = editor.helper_mut() {
            helper.masking = false;
        }
        result
    }
}

impl CredentialPrompter for TerminalPrompter {
    fn prompt_line(&mut self, label: &str) -> Result<Option<String>> {
        self.read(label, false)
    }

    fn prompt_secret(&mut self, label: &str) -> Result<Option<String>> {
        self.read(label, true)
    }
}

/// Line-oriented input shared between the REPL loop and credential prompts.
pub(crate) trait LineSource {
    fn read_line_into(&mut self, buf: &mut String) -> std::io::Result<usize>;
}

impl LineSource for std::io::Stdin {
    fn read_line_into(&mut self, buf: &mut String) -> std::io::Result<usize> {
        self.read_line(buf)
    }
}

/// Prompter for piped input; answers are read line by line without echo control.
pub(crate) struct ReaderPrompter<R> {
    reader: R,
}

impl<R: LineSource> ReaderPrompter<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self { reader }
    }

    fn read(&mut self, label: &str, secret: bool) -> Result<Option<String>> {
        print!("{label}");
        std::io::stdout()
            .flush()
            .context("failed to flush stdout")?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line_into(&mut line)
            .context("failed to read input")?;
        if read == 0 {
            println!();
            return Ok(None);
        }
        println!();
        let answer = if secret {
            line.trim_end_matches(['\r', '\n'])
        } else {
            line.trim()
        };
        Ok(Some(answer.to_string()))
    }
}

impl<R: LineSource> CredentialPrompter for ReaderPrompter<R> {
    fn prompt_line(&mut self, label: &str) -> Result<Option<String>> {
        self.read(label, false)
    }

    fn prompt_secret(&mut self, label: &str) -> Result<Option<String>> {
        self.read(label, true)
    }
}
