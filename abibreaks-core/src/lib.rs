//! Embeddable core library for abibreaks.
//!
//! Tracks which revisions of an ABI representation are incompatible with the
//! current one and folds their break reports into the known ABI breaks list.
//!
//! # Port traits
//!
//! All process I/O is abstracted behind port traits in [`ports`]:
//! - [`GitPort`](ports::GitPort): locate the ABI file, list and extract revisions
//! - [`ComparerPort`](ports::ComparerPort): run stgdiff
//!
//! The [`adapters`] module provides the default process-backed implementations.
//!
//! # Entry points
//!
//! - [`run_update`](update::run_update): compare history and merge new breaks
//! - [`write_ledger`](update::write_ledger): persist the merged ledger

pub mod adapters;
pub mod compare;
pub mod error;
pub mod extract;
pub mod format;
pub mod history;
pub mod pipeline;
pub mod ports;
pub mod process;
pub mod settings;
pub mod update;

pub use error::{AbiBreaksError, CommandFailure};

// Re-export ledger types so embedders don't need abibreaks-ledger directly.
pub use abibreaks_ledger::{BreakEntry, BreaksLedger, CommitMarker, LedgerError};
