//! Clap-free settings for the update pipeline.

use camino::Utf8PathBuf;
use std::num::NonZeroUsize;

/// Comparer binary used when nothing else is configured.
pub const DEFAULT_COMPARER: &str = "stgdiff";

/// Settings for the external ABI comparer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparerSettings {
    /// Executable name (looked up on `PATH`) or path.
    pub program: String,
}

impl Default for ComparerSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_COMPARER.to_string(),
        }
    }
}

/// Number of concurrent extractions when not configured: host parallelism.
pub fn default_jobs() -> NonZeroUsize {
    std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Settings for one ledger update run.
#[derive(Debug, Clone)]
pub struct UpdateSettings {
    /// Current ABI representation (`.xml` or `.stg`).
    pub abi_path: Utf8PathBuf,
    /// Known ABI breaks ledger to update.
    pub ledger_path: Utf8PathBuf,
    /// Maximum number of revisions extracted at the same time.
    pub jobs: NonZeroUsize,
    pub comparer: ComparerSettings,
}

impl UpdateSettings {
    pub fn new(abi_path: impl Into<Utf8PathBuf>, ledger_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            abi_path: abi_path.into(),
            ledger_path: ledger_path.into(),
            jobs: default_jobs(),
            comparer: ComparerSettings::default(),
        }
    }
}
