//! Merge engine
//!
//! Inserts fetched candidates whose `(source, source_id)` key is not yet
//! persisted. Existing tasks are never updated or deleted here, so a user's
//! status edits survive every re-sync.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use goldfish_domain::{MergeReport, Result, Source, Task, TaskCandidate, TaskKey};
use tracing::{debug, error, info, instrument, warn};

use crate::tasks::ports::TaskRepository;

/// Candidates selected for insertion plus the accounting so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    /// New candidates with the source batch they came from.
    pub to_insert: Vec<(Source, TaskCandidate)>,
    pub report: MergeReport,
}

/// Decide which candidates are new.
///
/// Batches are visited in order and candidates in adapter order; when a key
/// repeats inside the fetched set the first occurrence wins. Manual-source
/// candidates are skipped.
#[must_use]
pub fn plan_merge(
    batches: Vec<(Source, Vec<TaskCandidate>)>,
    existing: &HashSet<TaskKey>,
) -> MergePlan {
    let mut plan = MergePlan::default();
    let mut seen: HashSet<TaskKey> = HashSet::new();

    for (source, candidates) in batches {
        let counts = plan.report.counts_mut(source);
        for candidate in candidates {
            if !candidate.source.is_synced() {
                warn!(%source, title = %candidate.title, "skipping manual candidate in sync batch");
                continue;
            }
            counts.fetched += 1;

            let key = candidate.key();
            if existing.contains(&key) {
                counts.already_present += 1;
            } else if seen.insert(key.clone()) {
                plan.to_insert.push((source, candidate));
            } else {
                debug!(%key, "dropping duplicate candidate within fetched set");
                counts.duplicates_dropped += 1;
            }
        }
    }

    plan.report.finalize();
    plan
}

/// Tasks written by a merge and the final report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub report: MergeReport,
    pub inserted: Vec<Task>,
}

/// Applies [`plan_merge`] against a [`TaskRepository`].
pub struct MergeEngine {
    repository: Arc<dyn TaskRepository>,
}

impl MergeEngine {
    pub fn new(repository: Arc<dyn TaskRepository>) -> Self {
        Self { repository }
    }

    /// Merge fetched batches into the user's collection.
    ///
    /// New tasks go in as one batch. If the batch write fails, each task is
    /// retried on its own and individual failures are logged and counted.
    ///
    /// # Errors
    /// Fails only when the persisted key set cannot be read.
    #[instrument(skip(self, batches), fields(batches = batches.len()))]
    pub async fn merge(
        &self,
        user_id: &str,
        batches: Vec<(Source, Vec<TaskCandidate>)>,
    ) -> Result<MergeOutcome> {
        let existing = self.repository.source_keys(user_id).await?;
        let MergePlan { to_insert, mut report } = plan_merge(batches, &existing);

        if to_insert.is_empty() {
            debug!(user_id, fetched = report.totals.fetched, "nothing new to insert");
            return Ok(MergeOutcome { report, inserted: Vec::new() });
        }

        let now = Utc::now();
        let mut origin: HashMap<String, Source> = HashMap::with_capacity(to_insert.len());
        let tasks: Vec<Task> = to_insert
            .into_iter()
            .map(|(source, candidate)| {
                let task = candidate.into_task(user_id, now);
                origin.insert(task.id.clone(), source);
                task
            })
            .collect();

        let inserted = match self.repository.insert_batch(tasks.clone()).await {
            Ok(inserted) => {
                let written: HashSet<&str> = inserted.iter().map(|t| t.id.as_str()).collect();
                for task in &tasks {
                    let source = origin.get(&task.id).copied().unwrap_or(task.source);
                    let counts = report.counts_mut(source);
                    if written.contains(task.id.as_str()) {
                        counts.inserted += 1;
                    } else {
                        counts.already_present += 1;
                    }
                }
                inserted
            }
            Err(err) => {
                warn!(user_id, error = %err, count = tasks.len(), "batch insert failed; inserting individually");
                self.insert_individually(tasks, &origin, &mut report).await
            }
        };

        report.finalize();
        info!(
            user_id,
            fetched = report.totals.fetched,
            inserted = report.totals.inserted,
            already_present = report.totals.already_present,
            failed = report.totals.failed,
            "merge completed"
        );
        Ok(MergeOutcome { report, inserted })
    }

    async fn insert_individually(
        &self,
        tasks: Vec<Task>,
        origin: &HashMap<String, Source>,
        report: &mut MergeReport,
    ) -> Vec<Task> {
        let mut inserted = Vec::with_capacity(tasks.len());
        for task in tasks {
            let source = origin.get(&task.id).copied().unwrap_or(task.source);
            match self.repository.insert_one(task.clone()).await {
                Ok(true) => {
                    report.counts_mut(source).inserted += 1;
                    inserted.push(task);
                }
                Ok(false) => report.counts_mut(source).already_present += 1,
                Err(err) => {
                    error!(key = ?task.key(), error = %err, "failed to insert task");
                    report.counts_mut(source).failed += 1;
                }
            }
        }
        inserted
    }
}
