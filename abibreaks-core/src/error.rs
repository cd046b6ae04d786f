//! Error types for abibreaks-core.
//!
//! Every error is fatal to a run. The split mirrors what the user has to do
//! about it:
//! - Input problems (exit code 2): missing files, unsupported ABI format,
//!   malformed ledger preamble
//! - Tool errors (exit code 1): failed git/stgdiff invocations, unresolvable
//!   history, internal I/O failures

use abibreaks_ledger::{CommitMarker, LedgerError};
use std::fmt;
use thiserror::Error;

/// A child process that did not finish the way the caller required.
///
/// Carries everything needed to reproduce and diagnose the failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    pub command: String,
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "command '{}' returned exit status {}", self.command, code)?,
            None => write!(f, "command '{}' was terminated by a signal", self.command)?,
        }
        if !self.stdout.is_empty() {
            write!(f, "\nstdout:\n{}", self.stdout)?;
        }
        if !self.stderr.is_empty() {
            write!(f, "\nstderr:\n{}", self.stderr)?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum AbiBreaksError {
    /// `git show` for a historical revision failed.
    #[error("failed to extract ABI revision: {0}")]
    Extraction(CommandFailure),

    /// The comparer exited with a status that is neither "no diff" nor "diff".
    #[error("ABI comparison failed: {0}")]
    Comparison(CommandFailure),

    #[error("{message}")]
    Format { message: String },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(
        "ABI file has no history from commit {baseline}, are you sure the commit belongs to the branch you are at? ({message})"
    )]
    HistoryResolution {
        baseline: CommitMarker,
        message: String,
    },

    #[error("{message}")]
    Precondition { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AbiBreaksError {
    /// Returns true if the error is caused by bad input rather than a tool failure.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AbiBreaksError::Precondition { .. }
                | AbiBreaksError::Format { .. }
                | AbiBreaksError::Ledger(_)
        )
    }

    /// Returns the recommended process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        if self.is_input_error() { 2 } else { 1 }
    }
}
