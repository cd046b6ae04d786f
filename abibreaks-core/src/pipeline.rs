//! Concurrent extraction and comparison over a commit range.
//!
//! Every extraction is started up front and throttled by the extractor's
//! worker budget. Each commit gets a comparison task that waits for its own
//! extraction and then runs the comparer; comparisons have no separate limit.
//! Results are written into a slot per commit, so the returned reports follow
//! the input order no matter which task finishes first.

use crate::compare::{CompatibilityComparer, CompatibilityReport};
use crate::error::AbiBreaksError;
use crate::extract::{RevisionExtractor, Snapshot};
use crate::history::CommitSequence;
use crate::ports::{ComparerPort, GitPort};
use camino::Utf8Path;
use tokio::task::{AbortHandle, JoinError, JoinHandle, JoinSet};
use tracing::{debug, warn};

fn task_failure(err: JoinError) -> AbiBreaksError {
    AbiBreaksError::Internal(anyhow::anyhow!("pipeline task did not complete: {err}"))
}

pub struct HistoryPipeline<G, C> {
    extractor: RevisionExtractor<G>,
    comparer: CompatibilityComparer<C>,
}

impl<G: GitPort, C: ComparerPort> HistoryPipeline<G, C> {
    pub fn new(extractor: RevisionExtractor<G>, comparer: CompatibilityComparer<C>) -> Self {
        Self {
            extractor,
            comparer,
        }
    }

    /// Compare every commit's revision with `current`.
    ///
    /// `result[i]` belongs to the `i`-th commit. The first failing task fails
    /// the whole run; no partial results are returned.
    pub async fn run(
        &self,
        commits: &CommitSequence,
        current: &Utf8Path,
    ) -> Result<Vec<CompatibilityReport>, AbiBreaksError> {
        let extractions: Vec<JoinHandle<Result<Snapshot, AbiBreaksError>>> = commits
            .iter()
            .map(|commit| {
                let extractor = self.extractor.clone();
                let commit = commit.clone();
                tokio::spawn(async move { extractor.extract(&commit).await })
            })
            .collect();
        let extraction_aborts: Vec<AbortHandle> =
            extractions.iter().map(JoinHandle::abort_handle).collect();

        let mut comparisons = JoinSet::new();
        for (index, extraction) in extractions.into_iter().enumerate() {
            let comparer = self.comparer.clone();
            let current = current.to_owned();
            comparisons.spawn(async move {
                let snapshot = extraction.await.map_err(task_failure)??;
                let report = comparer.compare(&snapshot, &current).await?;
                Ok::<_, AbiBreaksError>((index, report))
            });
        }

        let mut slots: Vec<Option<CompatibilityReport>> =
            std::iter::repeat_with(|| None).take(commits.len()).collect();
        while let Some(joined) = comparisons.join_next().await {
            match joined.map_err(task_failure).and_then(|result| result) {
                Ok((index, report)) => slots[index] = Some(report),
                Err(err) => {
                    warn!(
                        pending = comparisons.len(),
                        "aborting ABI history comparison"
                    );
                    for handle in &extraction_aborts {
                        handle.abort();
                    }
                    comparisons.abort_all();
                    return Err(err);
                }
            }
        }

        debug!(reports = slots.len(), "all ABI revisions compared");
        slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AbiBreaksError::Internal(anyhow::anyhow!("missing comparison result")))
    }
}
