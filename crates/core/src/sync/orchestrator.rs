//! Sync orchestrator
//!
//! Fetches from every requested source concurrently and hands the results to
//! the merge engine in one pass. Each source succeeds or fails on its own:
//! a missing or rejected credential, or an upstream outage, only affects
//! that source's entry in the summary.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use goldfish_domain::{
    AccessToken, GoldfishError, Result, Source, SourceStatus, SourceSyncResult, SyncOptions,
    SyncSummary, TaskCandidate, TaskStatus,
};
use parking_lot::Mutex;
use tracing::{error, info, instrument, warn};

use super::merge::MergeEngine;
use crate::credentials::CredentialStore;
use crate::sources::ports::SourceAdapter;
use crate::tasks::ports::TaskRepository;

type InFlightKey = (String, Source);

/// Releases the per-(user, source) sync slot on drop.
struct InFlightGuard<'a> {
    slots: &'a Mutex<HashSet<InFlightKey>>,
    key: InFlightKey,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.slots.lock().remove(&self.key);
    }
}

enum FetchOutcome {
    Fetched(Vec<TaskCandidate>),
    Finished(SourceStatus),
}

/// Runs source adapters and merges their output.
pub struct SyncOrchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    credentials: Arc<CredentialStore>,
    merge: MergeEngine,
    in_flight: Mutex<HashSet<InFlightKey>>,
}

impl SyncOrchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        credentials: Arc<CredentialStore>,
        tasks: Arc<dyn TaskRepository>,
    ) -> Self {
        Self {
            adapters,
            credentials,
            merge: MergeEngine::new(tasks),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    fn adapter(&self, source: Source) -> Option<&Arc<dyn SourceAdapter>> {
        self.adapters.iter().find(|adapter| adapter.source() == source)
    }

    fn try_claim(&self, user_id: &str, source: Source) -> Option<InFlightGuard<'_>> {
        let key = (user_id.to_string(), source);
        if self.in_flight.lock().insert(key.clone()) {
            Some(InFlightGuard { slots: &self.in_flight, key })
        } else {
            None
        }
    }

    /// Sync the requested sources for one user.
    ///
    /// Per-source problems, including a failed merge, are reported in the
    /// returned summary rather than as an `Err`.
    #[instrument(skip(self, options), fields(await_credentials = options.await_credentials))]
    pub async fn sync(&self, user_id: &str, options: &SyncOptions) -> Result<SyncSummary> {
        let sources = options.resolved_sources();
        info!(user_id, sources = ?sources, "sync started");

        let mut guards = Vec::with_capacity(sources.len());
        let mut pending = Vec::with_capacity(sources.len());
        let mut statuses: Vec<(Source, Option<SourceStatus>)> = Vec::with_capacity(sources.len());

        for source in sources {
            let Some(adapter) = self.adapter(source) else {
                warn!(user_id, %source, "no adapter registered");
                statuses.push((
                    source,
                    Some(SourceStatus::Failed { message: format!("{source} is not configured") }),
                ));
                continue;
            };
            let Some(guard) = self.try_claim(user_id, source) else {
                info!(user_id, %source, "sync already running for source");
                statuses.push((source, Some(SourceStatus::AlreadyRunning)));
                continue;
            };
            guards.push(guard);
            statuses.push((source, None));
            pending.push(self.fetch_source(user_id, Arc::clone(adapter), options.await_credentials));
        }

        let outcomes = join_all(pending).await;

        let mut batches = Vec::new();
        let mut outcomes = outcomes.into_iter();
        for (source, status) in &mut statuses {
            if status.is_some() {
                continue;
            }
            match outcomes.next() {
                Some(FetchOutcome::Fetched(candidates)) => batches.push((*source, candidates)),
                Some(FetchOutcome::Finished(finished)) => *status = Some(finished),
                None => {
                    *status = Some(SourceStatus::Failed { message: "fetch did not complete".into() });
                }
            }
        }

        let fetched_sources: Vec<Source> = batches.iter().map(|(source, _)| *source).collect();
        let mut summary = SyncSummary::default();

        if !batches.is_empty() {
            match self.merge.merge(user_id, batches).await {
                Ok(outcome) => {
                    for source in &fetched_sources {
                        if let Some((_, status)) = statuses.iter_mut().find(|(s, _)| s == source) {
                            *status =
                                Some(SourceStatus::Synced { counts: outcome.report.counts(*source) });
                        }
                    }
                    summary.new_completed = outcome
                        .inserted
                        .iter()
                        .filter(|task| task.status == TaskStatus::Completed)
                        .count();
                    summary.new_pending = outcome.inserted.len() - summary.new_completed;
                    summary.report = outcome.report;
                }
                Err(err) => {
                    error!(user_id, error = %err, "merge failed");
                    for source in &fetched_sources {
                        if let Some((_, status)) = statuses.iter_mut().find(|(s, _)| s == source) {
                            *status = Some(SourceStatus::Failed { message: err.to_string() });
                        }
                    }
                }
            }
        }
        drop(guards);

        summary.results = statuses
            .into_iter()
            .map(|(source, status)| SourceSyncResult {
                source,
                status: status.unwrap_or(SourceStatus::Failed { message: "not run".into() }),
            })
            .collect();

        info!(
            user_id,
            new_pending = summary.new_pending,
            new_completed = summary.new_completed,
            inserted = summary.report.totals.inserted,
            "sync finished"
        );
        Ok(summary)
    }

    async fn fetch_source(
        &self,
        user_id: &str,
        adapter: Arc<dyn SourceAdapter>,
        await_credentials: bool,
    ) -> FetchOutcome {
        let source = adapter.source();

        let credential = match self.credential_for(user_id, source, await_credentials).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                self.credentials.mark_needed(user_id, source);
                info!(user_id, %source, "skipping source without credential");
                return FetchOutcome::Finished(SourceStatus::NeedsCredential);
            }
            Err(err) => {
                error!(user_id, %source, error = %err, "failed to load credential");
                return FetchOutcome::Finished(SourceStatus::Failed { message: err.to_string() });
            }
        };

        match adapter.fetch_assignments(Some(&credential)).await {
            Ok(candidates) => {
                info!(user_id, %source, fetched = candidates.len(), "source fetch completed");
                FetchOutcome::Fetched(candidates)
            }
            Err(GoldfishError::Auth(message)) => {
                warn!(user_id, %source, reason = %message, "credential rejected by upstream");
                if let Err(err) = self.credentials.invalidate(user_id, source).await {
                    error!(user_id, %source, error = %err, "failed to invalidate credential");
                }
                FetchOutcome::Finished(SourceStatus::NeedsCredential)
            }
            Err(err) => {
                warn!(user_id, %source, error = %err, "source fetch failed");
                FetchOutcome::Finished(SourceStatus::Failed { message: err.to_string() })
            }
        }
    }

    async fn credential_for(
        &self,
        user_id: &str,
        source: Source,
        await_credentials: bool,
    ) -> Result<Option<AccessToken>> {
        if await_credentials {
            self.credentials.request_credential(user_id, source).await
        } else {
            self.credentials.load(user_id, source).await
        }
    }
}
