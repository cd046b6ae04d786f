//! Default process-backed port implementations.

use crate::error::{AbiBreaksError, CommandFailure};
use crate::history::{CommitSequence, TrackedFile};
use crate::ports::{ComparerPort, GitPort};
use crate::process::{CommandOutput, display_command};
use crate::settings::ComparerSettings;
use abibreaks_ledger::CommitMarker;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Git operations by shelling out to `git`.
#[derive(Debug, Clone, Default)]
pub struct ShellGitPort;

async fn git(dir: &Utf8Path, args: &[&str]) -> Result<CommandOutput, AbiBreaksError> {
    let mut full = vec!["-C", dir.as_str()];
    full.extend_from_slice(args);
    let command = display_command("git", &full);
    debug!(command = %command, "running git");

    let output = Command::new("git")
        .args(&full)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("run {command}"))?;
    Ok(CommandOutput::from_std(command, output))
}

fn history_error(baseline: &CommitMarker, message: impl Into<String>) -> AbiBreaksError {
    AbiBreaksError::HistoryResolution {
        baseline: baseline.clone(),
        message: message.into(),
    }
}

impl GitPort for ShellGitPort {
    async fn locate(&self, abi_path: &Utf8Path) -> Result<TrackedFile, AbiBreaksError> {
        let file_name = abi_path
            .file_name()
            .ok_or_else(|| AbiBreaksError::Precondition {
                message: format!("ABI path has no file name: {abi_path}"),
            })?;
        let dir = match abi_path.parent() {
            Some(parent) if !parent.as_str().is_empty() => parent,
            _ => Utf8Path::new("."),
        };

        let output = git(dir, &["rev-parse", "--show-toplevel", "--show-prefix"]).await?;
        if !output.success() {
            return Err(AbiBreaksError::Precondition {
                message: format!(
                    "{abi_path} is not inside a git work tree: {}",
                    output.into_failure()
                ),
            });
        }

        // The prefix line is empty when the file sits at the top level.
        let mut lines = output.stdout.lines();
        let toplevel = lines.next().unwrap_or_default().trim();
        let prefix = lines.next().unwrap_or_default().trim();
        if toplevel.is_empty() {
            return Err(AbiBreaksError::Internal(anyhow::anyhow!(
                "git rev-parse printed no top-level directory for {abi_path}"
            )));
        }

        let tracked = TrackedFile {
            toplevel: Utf8PathBuf::from(toplevel),
            relative: Utf8PathBuf::from(prefix).join(file_name),
        };
        debug!(toplevel = %tracked.toplevel, relative = %tracked.relative, "located ABI file");
        Ok(tracked)
    }

    async fn commits_since(
        &self,
        tracked: &TrackedFile,
        baseline: &CommitMarker,
    ) -> Result<CommitSequence, AbiBreaksError> {
        let root = &tracked.toplevel;

        let rev = format!("{baseline}^{{commit}}");
        let verify = git(root, &["rev-parse", "--verify", "--quiet", rev.as_str()]).await?;
        if !verify.success() {
            return Err(history_error(baseline, "commit not found in repository"));
        }

        let ancestor = git(root, &["merge-base", "--is-ancestor", baseline.as_str(), "HEAD"]).await?;
        match ancestor.status {
            Some(0) => {}
            Some(1) => return Err(history_error(baseline, "commit is not an ancestor of HEAD")),
            _ => return Err(history_error(baseline, ancestor.into_failure().to_string())),
        }

        let range = format!("{baseline}..HEAD");
        let log = git(
            root,
            &[
                "log",
                "--reverse",
                "--first-parent",
                "--pretty=%H",
                range.as_str(),
                "--",
                tracked.relative.as_str(),
            ],
        )
        .await?;
        if !log.success() {
            return Err(history_error(baseline, log.into_failure().to_string()));
        }

        // `<baseline>..HEAD` excludes the baseline itself.
        Ok(CommitSequence::new(
            baseline.clone(),
            log.stdout.split_whitespace().map(CommitMarker::from),
        ))
    }

    async fn write_revision(
        &self,
        tracked: &TrackedFile,
        commit: &CommitMarker,
        out: File,
    ) -> Result<(), AbiBreaksError> {
        let args = [
            "-C".to_string(),
            tracked.toplevel.to_string(),
            "show".to_string(),
            format!("{commit}:{}", tracked.relative),
        ];
        let command = display_command("git", &args);

        // `output()` would re-pipe stdout; spawn keeps the file redirection.
        let child = Command::new("git")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(out))
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("run {command}"))?;
        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("wait for {command}"))?;

        if !output.status.success() {
            return Err(AbiBreaksError::Extraction(CommandFailure {
                command,
                status: output.status.code(),
                stdout: String::new(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }));
        }
        Ok(())
    }
}

/// Runs `stgdiff` (or a configured replacement) as a child process.
#[derive(Debug, Clone)]
pub struct StgdiffPort {
    program: String,
}

impl StgdiffPort {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_settings(settings: &ComparerSettings) -> Self {
        Self::new(settings.program.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ComparerPort for StgdiffPort {
    async fn run(&self, args: Vec<String>) -> Result<CommandOutput, AbiBreaksError> {
        let command = display_command(&self.program, &args);
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("run {command}"))?;
        Ok(CommandOutput::from_std(command, output))
    }
}
