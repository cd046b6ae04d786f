use crate::marker::{CommitMarker, LedgerError, parse_preamble, preamble, validate_commit};
use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// One distinct incompatibility: a trimmed, non-empty block of report text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BreakEntry(String);

impl BreakEntry {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BreakEntry {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BreakEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split report text into blank-line delimited blocks.
///
/// Blocks are trimmed; blocks that are empty after trimming are dropped.
pub fn split_report(report: &str) -> impl Iterator<Item = BreakEntry> + '_ {
    report
        .split("\n\n")
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| BreakEntry(chunk.to_string()))
}

fn strip_comments(text: &str) -> String {
    text.split('\n')
        .filter(|line| !line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ordered set of known breaks anchored at a freeze commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreaksLedger {
    baseline: CommitMarker,
    entries: Vec<BreakEntry>,
    seen: HashSet<BreakEntry>,
}

impl BreaksLedger {
    /// Start an empty ledger. The baseline must be a lowercase hex hash so
    /// the serialized preamble can be loaded again.
    pub fn new(baseline: CommitMarker) -> Result<Self, LedgerError> {
        validate_commit(baseline.as_str())?;
        Ok(Self {
            baseline,
            entries: Vec::new(),
            seen: HashSet::new(),
        })
    }

    /// Parse a persisted ledger.
    pub fn load(text: &str) -> Result<Self, LedgerError> {
        let baseline = parse_preamble(text)?;
        let mut ledger = Self::new(baseline)?;
        let loaded = ledger.merge_report(&strip_comments(text));
        debug!(baseline = %ledger.baseline, entries = loaded, "loaded ABI breaks ledger");
        Ok(ledger)
    }

    pub fn baseline(&self) -> &CommitMarker {
        &self.baseline
    }

    pub fn entries(&self) -> &[BreakEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, block: &str) -> bool {
        self.seen.contains(block)
    }

    /// Append every block of `report` not already present, in the order
    /// encountered. Returns the number of entries added.
    pub fn merge_report(&mut self, report: &str) -> usize {
        let mut added = 0;
        for entry in split_report(report) {
            if self.seen.insert(entry.clone()) {
                self.entries.push(entry);
                added += 1;
            }
        }
        added
    }

    /// Consuming form of [`merge_report`](Self::merge_report).
    pub fn with_report(mut self, report: &str) -> Self {
        self.merge_report(report);
        self
    }

    /// Render the ledger in its on-disk form. The baseline is written back
    /// unchanged.
    pub fn serialize(&self) -> String {
        let mut out = preamble(&self.baseline);
        for entry in &self.entries {
            out.push_str(entry.as_str());
            out.push_str("\n\n");
        }
        out
    }
}
