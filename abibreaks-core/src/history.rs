//! Location of the tracked ABI file and the commits to examine.

use abibreaks_ledger::CommitMarker;
use camino::Utf8PathBuf;
use tracing::debug;

/// The ABI file as git sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    /// Working tree root (`git rev-parse --show-toplevel`).
    pub toplevel: Utf8PathBuf,
    /// Path of the ABI file relative to `toplevel`.
    pub relative: Utf8PathBuf,
}

/// Commits touching the ABI file, oldest first, starting with the baseline.
///
/// Never empty and never contains the same commit twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSequence {
    commits: Vec<CommitMarker>,
}

impl CommitSequence {
    pub fn new(baseline: CommitMarker, later: impl IntoIterator<Item = CommitMarker>) -> Self {
        let mut commits = vec![baseline];
        for commit in later {
            if commits.contains(&commit) {
                debug!(%commit, "dropping repeated commit from history");
                continue;
            }
            commits.push(commit);
        }
        Self { commits }
    }

    pub fn baseline(&self) -> &CommitMarker {
        &self.commits[0]
    }

    pub fn as_slice(&self) -> &[CommitMarker] {
        &self.commits
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CommitMarker> {
        self.commits.iter()
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }
}

impl<'a> IntoIterator for &'a CommitSequence {
    type Item = &'a CommitMarker;
    type IntoIter = std::slice::Iter<'a, CommitMarker>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
