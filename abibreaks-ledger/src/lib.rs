//! Known ABI breaks ledger.
//!
//! The ledger is a UTF-8 text file. Its first line pins the freeze commit the
//! ledger was built from:
//!
//! ```text
//! # ABI freeze commit: 0123abcd...
//! ```
//!
//! Everything after it is a sequence of blank-line separated blocks, one per
//! distinct incompatibility. Other lines starting with `#` are comments and are
//! dropped on load.
//!
//! The ledger never forgets an entry and never reorders one: blocks keep the
//! position at which they were first seen, later duplicates are ignored.

mod ledger;
mod marker;

pub use ledger::{BreakEntry, BreaksLedger, split_report};
pub use marker::{CommitMarker, LedgerError, PREAMBLE_PREFIX, parse_preamble, preamble};
