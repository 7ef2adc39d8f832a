use std::path::Path;

use anyhow::{bail, Context, Result};
use compass_core::{current_unix_timestamp_ms, remove_file_if_exists, write_text_atomic_private};
use serde::{Deserialize, Serialize};

const SESSION_FILE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct PersistedSession {
    pub(crate) schema_version: u32,
    pub(crate) token: String,
    pub(crate) user_email: String,
    pub(crate) saved_at_unix_ms: u64,
}

/// Reads a saved session; `Ok(None)` when the file does not exist.
pub(crate) fn load_persisted_session(path: &Path) -> Result<Option<PersistedSession>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read session file {}", path.display()))
        }
    };
    let session = serde_json::from_str::<PersistedSession>(&raw)
        .with_context(|| format!("failed to parse session file {}", path.display()))?;
    if session.schema_version != SESSION_FILE_SCHEMA_VERSION {
        bail!(
            "unsupported session file schema_version {} in {} (expected {})",
            session.schema_version,
            path.display(),
            SESSION_FILE_SCHEMA_VERSION
        );
    }
    if session.token.trim().is_empty() {
        bail!("session file {} carries an empty token", path.display());
    }
    Ok(Some(session))
}

pub(crate) fn save_persisted_session(path: &Path, token: &str, user_email: &str) -> Result<()> {
    let session = PersistedSession {
        schema_version: SESSION_FILE_SCHEMA_VERSION,
        token: token.to_string(),
        user_email: user_email.to_string(),
        saved_at_unix_ms: current_unix_timestamp_ms(),
    };
    let mut payload =
        serde_json::to_string_pretty(&session).context("failed to encode session file")?;
    payload.push('\n');
    write_text_atomic_private(path, &payload)?;
    tracing::debug!(path = %path.display(), "session saved");
    Ok(())
}

pub(crate) fn clear_persisted_session(path: &Path) -> Result<bool> {
    remove_file_if_exists(path)
}
