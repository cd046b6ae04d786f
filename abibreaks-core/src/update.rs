//! Ledger update: resolve history, compare every revision, fold in new breaks.
//!
//! The ledger file is only read here. Callers persist the returned ledger with
//! [`write_ledger`] once the whole run succeeded, so a failed run leaves the
//! previous ledger untouched.

use crate::adapters::{ShellGitPort, StgdiffPort};
use crate::compare::{CompatibilityComparer, CompatibilityReport};
use crate::error::AbiBreaksError;
use crate::extract::RevisionExtractor;
use crate::format::AbiFormat;
use crate::pipeline::HistoryPipeline;
use crate::ports::{ComparerPort, GitPort};
use crate::settings::UpdateSettings;
use abibreaks_ledger::BreaksLedger;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Counters describing one update run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub baseline: String,
    pub commits_examined: usize,
    pub incompatible_commits: usize,
    pub new_breaks: usize,
    pub total_breaks: usize,
    /// Set by the caller once the ledger has been persisted.
    pub written: bool,
}

/// Outcome of [`run_update`].
#[derive(Debug)]
pub struct UpdateOutcome {
    pub ledger: BreaksLedger,
    pub reports: Vec<CompatibilityReport>,
    pub summary: UpdateSummary,
}

/// Read a ledger file, mapping a missing file to a precondition error.
pub fn read_ledger(path: &Utf8Path) -> Result<BreaksLedger, AbiBreaksError> {
    if !path.exists() {
        return Err(AbiBreaksError::Precondition {
            message: format!("The ABI breaks list {path} does not exist"),
        });
    }
    let text = fs::read_to_string(path).with_context(|| format!("read {path}"))?;
    Ok(BreaksLedger::load(&text)?)
}

/// Run the update pipeline and return the merged ledger.
pub async fn run_update<G: GitPort, C: ComparerPort>(
    settings: &UpdateSettings,
    git: Arc<G>,
    comparer: Arc<C>,
) -> Result<UpdateOutcome, AbiBreaksError> {
    let abi_path = &settings.abi_path;
    if !abi_path.exists() {
        return Err(AbiBreaksError::Precondition {
            message: format!("ABI file does not exist: {abi_path}"),
        });
    }
    let format = AbiFormat::from_path(abi_path)?;
    let tracked = git.locate(abi_path).await?;

    let mut ledger = read_ledger(&settings.ledger_path)?;
    let baseline = ledger.baseline().clone();
    let known_before = ledger.len();

    let commits = git.commits_since(&tracked, &baseline).await?;
    info!(
        %baseline,
        commits = commits.len(),
        jobs = settings.jobs.get(),
        "comparing ABI history against {abi_path}"
    );

    let workspace = tempfile::Builder::new()
        .prefix("abibreaks-")
        .tempdir()
        .context("create temporary workspace")?;
    let workspace_path = Utf8PathBuf::from_path_buf(workspace.path().to_path_buf())
        .map_err(|p| anyhow::anyhow!("temporary directory is not UTF-8: {}", p.display()))?;
    debug!(workspace = %workspace_path, "extracting revisions");

    let pipeline = HistoryPipeline::new(
        RevisionExtractor::new(git, tracked, workspace_path, settings.jobs),
        CompatibilityComparer::new(comparer, format),
    );
    let reports = pipeline.run(&commits, abi_path).await?;

    let mut incompatible_commits = 0;
    for report in reports.iter().filter(|r| !r.compatible) {
        incompatible_commits += 1;
        let added = ledger.merge_report(&report.report);
        debug!(commit = %report.revision, added, "incompatible revision");
    }

    let summary = UpdateSummary {
        baseline: baseline.to_string(),
        commits_examined: reports.len(),
        incompatible_commits,
        new_breaks: ledger.len() - known_before,
        total_breaks: ledger.len(),
        written: false,
    };
    info!(
        incompatible = summary.incompatible_commits,
        new_breaks = summary.new_breaks,
        total_breaks = summary.total_breaks,
        "ABI history compared"
    );

    Ok(UpdateOutcome {
        ledger,
        reports,
        summary,
    })
}

/// [`run_update`] with the default `git` and stgdiff adapters.
pub async fn run_update_with_shell(
    settings: &UpdateSettings,
) -> Result<UpdateOutcome, AbiBreaksError> {
    run_update(
        settings,
        Arc::new(ShellGitPort),
        Arc::new(StgdiffPort::from_settings(&settings.comparer)),
    )
    .await
}

/// Overwrite the ledger file with `ledger`.
pub fn write_ledger(path: &Utf8Path, ledger: &BreaksLedger) -> anyhow::Result<()> {
    fs::write(path, ledger.serialize()).with_context(|| format!("write {path}"))?;
    info!(path = %path, entries = ledger.len(), "wrote ABI breaks list");
    Ok(())
}
