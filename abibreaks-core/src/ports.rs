//! Port traits abstracting git and the ABI comparer away from the pipeline.

use crate::error::AbiBreaksError;
use crate::history::{CommitSequence, TrackedFile};
use crate::process::CommandOutput;
use abibreaks_ledger::CommitMarker;
use camino::Utf8Path;
use std::fs::File;
use std::future::Future;

/// Git queries and revision extraction.
pub trait GitPort: Send + Sync + 'static {
    /// Resolve the working tree root and the ABI file path relative to it.
    fn locate(
        &self,
        abi_path: &Utf8Path,
    ) -> impl Future<Output = Result<TrackedFile, AbiBreaksError>> + Send;

    /// Commits changing the ABI file since `baseline`, oldest first, following
    /// first-parent history. The baseline itself is the first element.
    fn commits_since(
        &self,
        tracked: &TrackedFile,
        baseline: &CommitMarker,
    ) -> impl Future<Output = Result<CommitSequence, AbiBreaksError>> + Send;

    /// Write the exact content of the ABI file at `commit` into `out`.
    fn write_revision(
        &self,
        tracked: &TrackedFile,
        commit: &CommitMarker,
        out: File,
    ) -> impl Future<Output = Result<(), AbiBreaksError>> + Send;
}

/// Runs the structural ABI comparer.
///
/// Implementations only run the tool; exit statuses are classified by
/// [`CompatibilityComparer`](crate::compare::CompatibilityComparer).
pub trait ComparerPort: Send + Sync + 'static {
    fn run(
        &self,
        args: Vec<String>,
    ) -> impl Future<Output = Result<CommandOutput, AbiBreaksError>> + Send;
}
