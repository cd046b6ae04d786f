use std::fmt;
use thiserror::Error;

/// Leading text of the first ledger line; the freeze commit follows it.
pub const PREAMBLE_PREFIX: &str = "# ABI freeze commit: ";

/// Opaque revision identifier naming the ledger baseline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitMarker(String);

impl CommitMarker {
    /// Wrap any revision id. Only lowercase hex ids can anchor a
    /// [`BreaksLedger`](crate::BreaksLedger).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommitMarker {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CommitMarker {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("the ABI breaks list does not have a valid preamble: {message}")]
    Preamble { message: String },
}

/// Render the preamble line (including its trailing newline).
pub fn preamble(baseline: &CommitMarker) -> String {
    format!("{PREAMBLE_PREFIX}{baseline}\n")
}

/// Check that `hash` can appear in a preamble: a non-empty run of lowercase
/// hex digits.
pub(crate) fn validate_commit(hash: &str) -> Result<(), LedgerError> {
    if hash.is_empty() {
        return Err(LedgerError::Preamble {
            message: "missing freeze commit".to_string(),
        });
    }
    if !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return Err(LedgerError::Preamble {
            message: format!("freeze commit '{hash}' is not a lowercase hex hash"),
        });
    }
    Ok(())
}

/// Extract the freeze commit from the first line of a ledger.
///
/// The commit must be a non-empty run of lowercase hex digits terminated by a
/// newline. A file consisting of the preamble alone may omit the newline.
pub fn parse_preamble(text: &str) -> Result<CommitMarker, LedgerError> {
    let line = match text.split_once('\n') {
        Some((line, _)) => line,
        None => text,
    };

    let Some(hash) = line.strip_prefix(PREAMBLE_PREFIX) else {
        return Err(LedgerError::Preamble {
            message: format!("first line must start with '{}'", PREAMBLE_PREFIX.trim_end()),
        });
    };

    validate_commit(hash)?;
    Ok(CommitMarker::new(hash))
}
