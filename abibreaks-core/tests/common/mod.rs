//! In-memory git and comparer ports for pipeline tests.

#![allow(dead_code)]

use abibreaks_core::error::{AbiBreaksError, CommandFailure};
use abibreaks_core::history::{CommitSequence, TrackedFile};
use abibreaks_core::ports::{ComparerPort, GitPort};
use abibreaks_core::process::CommandOutput;
use abibreaks_core::CommitMarker;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Git history held in memory. Revision content defaults to `abi@<commit>`.
#[derive(Default)]
pub struct FakeGit {
    order: Vec<String>,
    contents: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    active: AtomicUsize,
    peak: AtomicUsize,
    extractions: AtomicUsize,
}

impl FakeGit {
    pub fn with_commits(commits: &[&str]) -> Self {
        let mut git = Self::default();
        for commit in commits {
            git.order.push(commit.to_string());
            git.contents
                .insert(commit.to_string(), format!("abi@{commit}"));
        }
        git
    }

    pub fn delay(mut self, commit: &str, millis: u64) -> Self {
        self.delays
            .insert(commit.to_string(), Duration::from_millis(millis));
        self
    }

    pub fn failing(mut self, commit: &str) -> Self {
        self.failing.insert(commit.to_string());
        self
    }

    /// Highest number of extractions observed running at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn extractions(&self) -> usize {
        self.extractions.load(Ordering::SeqCst)
    }
}

impl GitPort for FakeGit {
    async fn locate(&self, abi_path: &Utf8Path) -> Result<TrackedFile, AbiBreaksError> {
        Ok(TrackedFile {
            toplevel: Utf8PathBuf::from("/fake/repo"),
            relative: Utf8PathBuf::from(abi_path.file_name().unwrap_or("abi.stg")),
        })
    }

    async fn commits_since(
        &self,
        _tracked: &TrackedFile,
        baseline: &CommitMarker,
    ) -> Result<CommitSequence, AbiBreaksError> {
        let Some(pos) = self.order.iter().position(|c| c == baseline.as_str()) else {
            return Err(AbiBreaksError::HistoryResolution {
                baseline: baseline.clone(),
                message: "commit not found in repository".to_string(),
            });
        };
        Ok(CommitSequence::new(
            baseline.clone(),
            self.order[pos + 1..]
                .iter()
                .map(|c| CommitMarker::from(c.as_str())),
        ))
    }

    async fn write_revision(
        &self,
        _tracked: &TrackedFile,
        commit: &CommitMarker,
        mut out: File,
    ) -> Result<(), AbiBreaksError> {
        self.extractions.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .get(commit.as_str())
            .copied()
            .unwrap_or(Duration::from_millis(2));
        tokio::time::sleep(delay).await;
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(commit.as_str()) {
            return Err(AbiBreaksError::Extraction(CommandFailure {
                command: format!("git show {commit}:abi.stg"),
                status: Some(128),
                stdout: String::new(),
                stderr: format!("fatal: bad object {commit}"),
            }));
        }

        let content = self
            .contents
            .get(commit.as_str())
            .cloned()
            .unwrap_or_default();
        out.write_all(content.as_bytes())
            .map_err(|e| AbiBreaksError::Internal(e.into()))?;
        Ok(())
    }
}

/// Comparer that answers by the content of the old file.
///
/// Content without a configured verdict compares as compatible.
#[derive(Default)]
pub struct FakeComparer {
    verdicts: HashMap<String, (i32, String)>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeComparer {
    pub fn verdict(mut self, content: &str, status: i32, stdout: &str) -> Self {
        self.verdicts
            .insert(content.to_string(), (status, stdout.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

/// The file following the `--stg`/`--abi` flag.
pub fn old_file(args: &[String]) -> &str {
    let pos = args
        .iter()
        .position(|a| a == "--stg" || a == "--abi")
        .expect("format flag");
    &args[pos + 1]
}

impl ComparerPort for FakeComparer {
    async fn run(&self, args: Vec<String>) -> Result<CommandOutput, AbiBreaksError> {
        let content = std::fs::read_to_string(old_file(&args))
            .map_err(|e| AbiBreaksError::Internal(e.into()))?;
        self.calls.lock().unwrap().push(args.clone());

        let (status, stdout) = self
            .verdicts
            .get(&content)
            .cloned()
            .unwrap_or((0, String::new()));
        Ok(CommandOutput {
            command: format!("stgdiff {}", args.join(" ")),
            status: Some(status),
            stdout,
            stderr: String::new(),
        })
    }
}

pub fn markers(ids: &[&str]) -> Vec<CommitMarker> {
    ids.iter().map(|id| CommitMarker::from(*id)).collect()
}
