use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Result};
use compass_cli::CliQueryMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum SessionMode {
    #[default]
    Persistent,
    Temporary,
}

impl SessionMode {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Persistent => "persistent",
            Self::Temporary => "temporary",
        }
    }
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "persistent" => Ok(Self::Persistent),
            "temporary" => Ok(Self::Temporary),
            _ => bail!("invalid mode. use 'persistent' or 'temporary'"),
        }
    }
}

impl From<CliQueryMode> for SessionMode {
    fn from(value: CliQueryMode) -> Self {
        match value {
            CliQueryMode::Persistent => Self::Persistent,
            CliQueryMode::Temporary => Self::Temporary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StageOutcome {
    Staged(PathBuf),
    AlreadyStaged(PathBuf),
}

/// Client-side session: credentials, mode, and per-mode document context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SessionState {
    pub(crate) token: Option<String>,
    pub(crate) user_email: Option<String>,
    pub(crate) mode: SessionMode,
    pub(crate) persistent_docs: Vec<String>,
    pub(crate) staged_docs: Vec<PathBuf>,
}

impl SessionState {
    pub(crate) fn new(mode: SessionMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub(crate) fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn switch_mode(&mut self, mode: SessionMode) {
        self.mode = mode;
        self.clear_all_contexts();
    }

    pub(crate) fn login(&mut self, token: String, user_email: String) {
        self.token = Some(token);
        self.user_email = Some(user_email);
    }

    pub(crate) fn logout(&mut self) {
        self.token = None;
        self.user_email = None;
        self.clear_all_contexts();
    }

    fn clear_all_contexts(&mut self) {
        self.persistent_docs.clear();
        self.staged_docs.clear();
    }

    pub(crate) fn clear_active_context(&mut self) {
        match self.mode {
            SessionMode::Persistent => self.persistent_docs.clear(),
            SessionMode::Temporary => self.staged_docs.clear(),
        }
    }

    /// Appends an absolute path unless it is already staged.
    pub(crate) fn stage_document(&mut self, absolute_path: PathBuf) -> StageOutcome {
        if self.staged_docs.contains(&absolute_path) {
            return StageOutcome::AlreadyStaged(absolute_path);
        }
        self.staged_docs.push(absolute_path.clone());
        StageOutcome::Staged(absolute_path)
    }

    pub(crate) fn active_context(&self) -> Vec<String> {
        match self.mode {
            SessionMode::Persistent => self.persistent_docs.clone(),
            SessionMode::Temporary => self
                .staged_docs
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
        }
    }

    fn active_context_len(&self) -> usize {
        match self.mode {
            SessionMode::Persistent => self.persistent_docs.len(),
            SessionMode::Temporary => self.staged_docs.len(),
        }
    }

    pub(crate) fn prompt(&self) -> String {
        let user = self.user_email.as_deref().unwrap_or("logged out");
        let count = self.active_context_len();
        let docs = if count == 0 {
            String::new()
        } else {
            let label = match self.mode {
                SessionMode::Persistent => "docs",
                SessionMode::Temporary => "staged",
            };
            format!(" [{count} {label}]")
        };
        format!("ClauseCompass ({}) ({user}){docs} > ", self.mode)
    }
}
