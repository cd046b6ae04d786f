//! HistoryPipeline ordering, throttling and failure propagation.

mod common;

use abibreaks_core::compare::CompatibilityComparer;
use abibreaks_core::error::AbiBreaksError;
use abibreaks_core::extract::RevisionExtractor;
use abibreaks_core::format::AbiFormat;
use abibreaks_core::history::{CommitSequence, TrackedFile};
use abibreaks_core::pipeline::HistoryPipeline;
use abibreaks_core::CommitMarker;
use camino::{Utf8Path, Utf8PathBuf};
use common::{FakeComparer, FakeGit, markers};
use pretty_assertions::assert_eq;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tempfile::TempDir;

fn tracked() -> TrackedFile {
    TrackedFile {
        toplevel: Utf8PathBuf::from("/fake/repo"),
        relative: Utf8PathBuf::from("abi.stg"),
    }
}

fn workspace() -> (TempDir, Utf8PathBuf) {
    let temp = TempDir::new().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
    (temp, path)
}

fn sequence(ids: &[&str]) -> CommitSequence {
    let mut all = markers(ids).into_iter();
    let baseline = all.next().expect("baseline");
    CommitSequence::new(baseline, all)
}

fn pipeline(
    git: &Arc<FakeGit>,
    comparer: &Arc<FakeComparer>,
    workspace: &Utf8Path,
    jobs: usize,
) -> HistoryPipeline<FakeGit, FakeComparer> {
    HistoryPipeline::new(
        RevisionExtractor::new(
            Arc::clone(git),
            tracked(),
            workspace,
            NonZeroUsize::new(jobs).expect("jobs"),
        ),
        CompatibilityComparer::new(Arc::clone(comparer), AbiFormat::Stg),
    )
}

fn revisions(reports: &[abibreaks_core::compare::CompatibilityReport]) -> Vec<&str> {
    reports.iter().map(|r| r.revision.as_str()).collect()
}

#[tokio::test]
async fn reports_follow_commit_order_despite_delays() {
    let ids = ["c0", "c1", "c2", "c3", "c4", "c5"];
    let mut git = FakeGit::with_commits(&ids);
    for (i, id) in ids.iter().enumerate() {
        // Earlier commits finish last.
        git = git.delay(id, 5 + 10 * (ids.len() - i) as u64);
    }
    let git = Arc::new(git);
    let comparer = Arc::new(
        FakeComparer::default()
            .verdict("abi@c1", 4, "break in c1\n")
            .verdict("abi@c4", 4, "break in c4\n"),
    );
    let (_temp, ws) = workspace();

    let reports = pipeline(&git, &comparer, &ws, 6)
        .run(&sequence(&ids), Utf8Path::new("abi.stg"))
        .await
        .unwrap();

    assert_eq!(revisions(&reports), ids.to_vec());
    let incompatible: Vec<bool> = reports.iter().map(|r| !r.compatible).collect();
    assert_eq!(incompatible, vec![false, true, false, false, true, false]);
    assert_eq!(reports[1].report, "break in c1\n");
    assert_eq!(reports[4].report, "break in c4\n");
}

#[tokio::test]
async fn order_is_kept_when_later_commits_are_slow() {
    let ids = ["a", "b", "c", "d"];
    let git = Arc::new(
        FakeGit::with_commits(&ids)
            .delay("c", 40)
            .delay("d", 30),
    );
    let comparer = Arc::new(FakeComparer::default());
    let (_temp, ws) = workspace();

    let reports = pipeline(&git, &comparer, &ws, 2)
        .run(&sequence(&ids), Utf8Path::new("abi.stg"))
        .await
        .unwrap();
    assert_eq!(revisions(&reports), ids.to_vec());
    assert!(reports.iter().all(|r| r.compatible));
}

#[tokio::test]
async fn extractions_never_exceed_worker_budget() {
    let ids: Vec<String> = (0..12).map(|i| format!("c{i}")).collect();
    let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
    let mut git = FakeGit::with_commits(&ids);
    for id in &ids {
        git = git.delay(id, 5);
    }
    let git = Arc::new(git);
    let comparer = Arc::new(FakeComparer::default());
    let (_temp, ws) = workspace();

    let reports = pipeline(&git, &comparer, &ws, 3)
        .run(&sequence(&ids), Utf8Path::new("abi.stg"))
        .await
        .unwrap();

    assert_eq!(reports.len(), 12);
    assert_eq!(git.extractions(), 12);
    assert_eq!(git.peak(), 3);
}

#[tokio::test]
async fn single_worker_serializes_extractions() {
    let ids = ["a", "b", "c", "d", "e"];
    let git = Arc::new(FakeGit::with_commits(&ids));
    let comparer = Arc::new(FakeComparer::default());
    let (_temp, ws) = workspace();

    pipeline(&git, &comparer, &ws, 1)
        .run(&sequence(&ids), Utf8Path::new("abi.stg"))
        .await
        .unwrap();
    assert_eq!(git.peak(), 1);
}

#[tokio::test]
async fn comparer_gets_snapshot_and_current_file() {
    let ids = ["base"];
    let git = Arc::new(FakeGit::with_commits(&ids));
    let comparer = Arc::new(FakeComparer::default());
    let (_temp, ws) = workspace();

    pipeline(&git, &comparer, &ws, 1)
        .run(&sequence(&ids), Utf8Path::new("android/abi.stg"))
        .await
        .unwrap();

    let calls = comparer.calls();
    assert_eq!(calls.len(), 1);
    let args = &calls[0];
    assert_eq!(common::old_file(args), ws.join("base").as_str());
    let snapshot = ws.join("base");
    let tail: Vec<&str> = args[args.len() - 5..].iter().map(String::as_str).collect();
    assert_eq!(
        tail,
        vec!["--stg", snapshot.as_str(), "android/abi.stg", "--output", "/dev/stdout"]
    );
}

#[tokio::test]
async fn extraction_failure_fails_the_run() {
    let ids = ["a", "b", "c"];
    let git = Arc::new(FakeGit::with_commits(&ids).failing("b"));
    let comparer = Arc::new(FakeComparer::default());
    let (_temp, ws) = workspace();

    let err = pipeline(&git, &comparer, &ws, 2)
        .run(&sequence(&ids), Utf8Path::new("abi.stg"))
        .await
        .unwrap_err();
    match err {
        AbiBreaksError::Extraction(failure) => {
            assert_eq!(failure.status, Some(128));
            assert!(failure.stderr.contains("bad object b"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unexpected_comparer_status_fails_the_run() {
    let ids = ["a", "b", "c"];
    let git = Arc::new(FakeGit::with_commits(&ids));
    let comparer = Arc::new(
        FakeComparer::default()
            .verdict("abi@a", 4, "break\n")
            .verdict("abi@c", 1, "usage: stgdiff ...\n"),
    );
    let (_temp, ws) = workspace();

    let err = pipeline(&git, &comparer, &ws, 3)
        .run(&sequence(&ids), Utf8Path::new("abi.stg"))
        .await
        .unwrap_err();
    match err {
        AbiBreaksError::Comparison(failure) => {
            assert_eq!(failure.status, Some(1));
            assert_eq!(failure.stdout, "usage: stgdiff ...\n");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn extracting_a_commit_twice_is_rejected() {
    let git = Arc::new(FakeGit::with_commits(&["a"]));
    let (_temp, ws) = workspace();
    let extractor = RevisionExtractor::new(git, tracked(), ws.clone(), NonZeroUsize::MIN);

    let snapshot = extractor.extract(&CommitMarker::from("a")).await.unwrap();
    assert_eq!(snapshot.path, ws.join("a"));
    assert_eq!(std::fs::read_to_string(&snapshot.path).unwrap(), "abi@a");

    assert!(extractor.extract(&CommitMarker::from("a")).await.is_err());
}

#[tokio::test]
async fn failed_extraction_releases_its_slot() {
    let git = Arc::new(FakeGit::with_commits(&["bad", "good"]).failing("bad"));
    let (_temp, ws) = workspace();
    let extractor = RevisionExtractor::new(Arc::clone(&git), tracked(), ws.clone(), NonZeroUsize::MIN);

    let err = extractor
        .extract(&CommitMarker::from("bad"))
        .await
        .unwrap_err();
    assert!(matches!(err, AbiBreaksError::Extraction(_)));

    let snapshot = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        extractor.extract(&CommitMarker::from("good")),
    )
    .await
    .expect("second extraction waited for a released slot")
    .unwrap();
    assert_eq!(std::fs::read_to_string(&snapshot.path).unwrap(), "abi@good");
    assert_eq!(git.extractions(), 2);
}
