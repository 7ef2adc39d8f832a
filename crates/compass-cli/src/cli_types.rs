use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliCommandFileErrorMode {
    FailFast,
    ContinueOnError,
}

impl CliCommandFileErrorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FailFast => "fail-fast",
            Self::ContinueOnError => "continue-on-error",
        }
    }
}

/// Query mode the session starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliQueryMode {
    Persistent,
    Temporary,
}
