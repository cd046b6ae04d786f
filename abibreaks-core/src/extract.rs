//! Materialization of historical ABI revisions.

use crate::error::AbiBreaksError;
use crate::history::TrackedFile;
use crate::ports::GitPort;
use abibreaks_ledger::CommitMarker;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::OpenOptions;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

/// The ABI file as of one commit, stored in the run's scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub commit: CommitMarker,
    pub path: Utf8PathBuf,
}

/// Extracts revisions into `workspace`, at most `jobs` at a time.
///
/// Snapshots are named after their commit, so extracting the same commit
/// twice in one workspace fails.
pub struct RevisionExtractor<G> {
    git: Arc<G>,
    tracked: Arc<TrackedFile>,
    workspace: Utf8PathBuf,
    permits: Arc<Semaphore>,
}

impl<G> Clone for RevisionExtractor<G> {
    fn clone(&self) -> Self {
        Self {
            git: Arc::clone(&self.git),
            tracked: Arc::clone(&self.tracked),
            workspace: self.workspace.clone(),
            permits: Arc::clone(&self.permits),
        }
    }
}

impl<G: GitPort> RevisionExtractor<G> {
    pub fn new(
        git: Arc<G>,
        tracked: TrackedFile,
        workspace: impl Into<Utf8PathBuf>,
        jobs: NonZeroUsize,
    ) -> Self {
        Self {
            git,
            tracked: Arc::new(tracked),
            workspace: workspace.into(),
            permits: Arc::new(Semaphore::new(jobs.get())),
        }
    }

    pub fn workspace(&self) -> &Utf8Path {
        &self.workspace
    }

    /// Extract the ABI file at `commit`. Waits for a free slot first; the slot
    /// is released when this returns, whatever the outcome.
    pub async fn extract(&self, commit: &CommitMarker) -> Result<Snapshot, AbiBreaksError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .context("extraction gate closed")?;

        let path = self.workspace.join(commit.as_str());
        let out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| format!("create snapshot {path} for {commit}"))?;

        debug!(%commit, path = %path, "extracting ABI revision");
        self.git.write_revision(&self.tracked, commit, out).await?;

        Ok(Snapshot {
            commit: commit.clone(),
            path,
        })
    }
}
