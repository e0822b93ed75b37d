//! Sync requests and reports

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::source::Source;

/// Per-source merge accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeCounts {
    pub fetched: usize,
    pub inserted: usize,
    pub already_present: usize,
    pub duplicates_dropped: usize,
    pub failed: usize,
}

impl MergeCounts {
    pub fn absorb(&mut self, other: Self) {
        self.fetched += other.fetched;
        self.inserted += other.inserted;
        self.already_present += other.already_present;
        self.duplicates_dropped += other.duplicates_dropped;
        self.failed += other.failed;
    }
}

/// Outcome of one merge pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
    pub totals: MergeCounts,
    pub by_source: BTreeMap<Source, MergeCounts>,
}

impl MergeReport {
    pub fn counts_mut(&mut self, source: Source) -> &mut MergeCounts {
        self.by_source.entry(source).or_default()
    }

    #[must_use]
    pub fn counts(&self, source: Source) -> MergeCounts {
        self.by_source.get(&source).copied().unwrap_or_default()
    }

    /// Recompute totals from the per-source entries.
    pub fn finalize(&mut self) {
        let mut totals = MergeCounts::default();
        for counts in self.by_source.values() {
            totals.absorb(*counts);
        }
        self.totals = totals;
    }
}

/// How a single source fared during a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SourceStatus {
    Synced { counts: MergeCounts },
    /// No usable credential; the needs-credential flag was raised.
    NeedsCredential,
    Failed { message: String },
    /// Another sync for the same user and source is still running.
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSyncResult {
    pub source: Source,
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// Result of one sync request across all requested sources.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub results: Vec<SourceSyncResult>,
    pub report: MergeReport,
    /// Newly inserted tasks that start out pending or overdue.
    pub new_pending: usize,
    pub new_completed: usize,
}

impl SyncSummary {
    #[must_use]
    pub fn status_of(&self, source: Source) -> Option<&SourceStatus> {
        self.results.iter().find(|r| r.source == source).map(|r| &r.status)
    }
}

/// Sync request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// Sources to sync, in tie-break order. Empty means all synced sources.
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Wait for the user to supply a missing credential instead of skipping.
    #[serde(default)]
    pub await_credentials: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { sources: Source::SYNCED.to_vec(), await_credentials: false }
    }
}

impl SyncOptions {
    pub fn only(sources: impl IntoIterator<Item = Source>) -> Self {
        Self { sources: sources.into_iter().collect(), await_credentials: false }
    }

    /// Requested synced sources, deduplicated, in request order.
    #[must_use]
    pub fn resolved_sources(&self) -> Vec<Source> {
        let requested: &[Source] =
            if self.sources.is_empty() { &Source::SYNCED } else { &self.sources };
        let mut resolved = Vec::with_capacity(requested.len());
        for source in requested {
            if source.is_synced() && !resolved.contains(source) {
                resolved.push(*source);
            }
        }
        resolved
    }
}
