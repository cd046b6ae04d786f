//! ABI compatibility checks and exit-status classification.

use crate::error::AbiBreaksError;
use crate::extract::Snapshot;
use crate::format::AbiFormat;
use crate::ports::ComparerPort;
use crate::process::CommandOutput;
use abibreaks_ledger::CommitMarker;
use camino::{Utf8Path, Utf8PathBuf};
use std::sync::Arc;
use tracing::debug;

/// stgdiff found no difference that is not ignored.
pub const STGDIFF_NO_DIFF_STATUS: i32 = 0;
/// stgdiff found differences and printed them.
pub const STGDIFF_DIFF_STATUS: i32 = 4;

/// Result of comparing one historical revision against the current ABI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityReport {
    pub revision: CommitMarker,
    pub old_file: Utf8PathBuf,
    pub new_file: Utf8PathBuf,
    pub compatible: bool,
    /// Raw comparer output; the break list when `compatible` is false.
    pub report: String,
}

/// Map comparer output to `(compatible, report)`.
pub fn classify(output: CommandOutput) -> Result<(bool, String), AbiBreaksError> {
    match output.status {
        Some(STGDIFF_NO_DIFF_STATUS) => Ok((true, output.stdout)),
        Some(STGDIFF_DIFF_STATUS) => Ok((false, output.stdout)),
        _ => Err(AbiBreaksError::Comparison(output.into_failure())),
    }
}

pub struct CompatibilityComparer<C> {
    port: Arc<C>,
    format: AbiFormat,
}

impl<C> Clone for CompatibilityComparer<C> {
    fn clone(&self) -> Self {
        Self {
            port: Arc::clone(&self.port),
            format: self.format,
        }
    }
}

impl<C: ComparerPort> CompatibilityComparer<C> {
    pub fn new(port: Arc<C>, format: AbiFormat) -> Self {
        Self { port, format }
    }

    pub fn format(&self) -> AbiFormat {
        self.format
    }

    /// Compare a historical snapshot against `current`.
    pub async fn compare(
        &self,
        snapshot: &Snapshot,
        current: &Utf8Path,
    ) -> Result<CompatibilityReport, AbiBreaksError> {
        let args = self.format.comparer_args(&snapshot.path, current);
        let output = self.port.run(args).await?;
        let (compatible, report) = classify(output)?;
        debug!(commit = %snapshot.commit, compatible, "compared ABI revision");

        Ok(CompatibilityReport {
            revision: snapshot.commit.clone(),
            old_file: snapshot.path.clone(),
            new_file: current.to_owned(),
            compatible,
            report,
        })
    }
}
