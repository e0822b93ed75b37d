//! Credential store
//!
//! Read-through cache over [`CredentialRepository`] plus two signals the UI
//! layer observes:
//! - a per-source "needs credential" flag (`tokio::sync::watch`)
//! - a single in-flight credential request per (user, source), resolved
//!   when a token is saved or the prompt is dismissed

use std::collections::HashMap;
use std::sync::Arc;

use goldfish_domain::{
    AccessToken, CredentialStatus, Result, Source, StoredCredential,
};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, instrument, warn};

use super::ports::CredentialRepository;

type SlotKey = (String, Source);

fn slot(user_id: &str, source: Source) -> SlotKey {
    (user_id.to_string(), source)
}

/// Token cache with needs-credential signalling.
pub struct CredentialStore {
    repository: Arc<dyn CredentialRepository>,
    cache: RwLock<HashMap<SlotKey, StoredCredential>>,
    flags: Mutex<HashMap<SlotKey, watch::Sender<bool>>>,
    prompts: Mutex<HashMap<SlotKey, Vec<oneshot::Sender<Option<AccessToken>>>>>,
}

impl CredentialStore {
    pub fn new(repository: Arc<dyn CredentialRepository>) -> Self {
        Self {
            repository,
            cache: RwLock::new(HashMap::new()),
            flags: Mutex::new(HashMap::new()),
            prompts: Mutex::new(HashMap::new()),
        }
    }

    /// Current token, or `None` when absent or invalidated.
    pub async fn load(&self, user_id: &str, source: Source) -> Result<Option<AccessToken>> {
        Ok(self.stored(user_id, source).await?.token().cloned())
    }

    async fn stored(&self, user_id: &str, source: Source) -> Result<StoredCredential> {
        let key = slot(user_id, source);
        if let Some(cached) = self.cache.read().get(&key) {
            return Ok(cached.clone());
        }

        let stored = self.repository.load(user_id, source).await?;
        debug!(user_id, %source, state = %stored.state(), "credential loaded from storage");
        // A save or invalidate that ran during the load takes precedence.
        Ok(self.cache.write().entry(key).or_insert(stored).clone())
    }

    /// Persist a token, then cache it and release anyone waiting for it.
    ///
    /// # Errors
    /// Storage failures are logged and returned; the cache is left untouched.
    #[instrument(skip(self, token), fields(source = %source))]
    pub async fn save(&self, user_id: &str, source: Source, token: AccessToken) -> Result<()> {
        if let Err(err) = self.repository.save(user_id, source, &token).await {
            error!(user_id, %source, error = %err, "failed to persist credential");
            return Err(err);
        }

        let key = slot(user_id, source);
        let waiters = {
            let mut prompts = self.prompts.lock();
            self.cache.write().insert(key.clone(), StoredCredential::Valid(token.clone()));
            prompts.remove(&key).unwrap_or_default()
        };

        self.set_flag(&key, false);

        if !waiters.is_empty() {
            info!(user_id, %source, waiters = waiters.len(), "credential request fulfilled");
        }
        for waiter in waiters {
            let _ = waiter.send(Some(token.clone()));
        }
        Ok(())
    }

    /// Mark the stored token unusable after an upstream rejection.
    ///
    /// The flag is raised even when writing the tombstone fails.
    #[instrument(skip(self), fields(source = %source))]
    pub async fn invalidate(&self, user_id: &str, source: Source) -> Result<()> {
        let key = slot(user_id, source);
        self.cache.write().insert(key.clone(), StoredCredential::Invalidated);
        self.set_flag(&key, true);
        warn!(user_id, %source, "credential invalidated");

        self.repository.tombstone(user_id, source).await.map_err(|err| {
            error!(user_id, %source, error = %err, "failed to persist credential tombstone");
            err
        })
    }

    /// Raise the needs-credential flag without touching storage.
    pub fn mark_needed(&self, user_id: &str, source: Source) {
        self.set_flag(&slot(user_id, source), true);
    }

    /// Observe the needs-credential flag for one source.
    pub fn needs_credential(&self, user_id: &str, source: Source) -> watch::Receiver<bool> {
        let mut flags = self.flags.lock();
        flags.entry(slot(user_id, source)).or_insert_with(|| watch::channel(false).0).subscribe()
    }

    /// Wait for the user to supply a token.
    ///
    /// Resolves immediately with the stored token when one is valid. Otherwise
    /// raises the flag and waits until [`save`](Self::save) delivers a token
    /// or [`dismiss_request`](Self::dismiss_request) cancels with `None`.
    /// Concurrent callers join the same pending request.
    #[instrument(skip(self), fields(source = %source))]
    pub async fn request_credential(
        &self,
        user_id: &str,
        source: Source,
    ) -> Result<Option<AccessToken>> {
        if let Some(token) = self.load(user_id, source).await? {
            return Ok(Some(token));
        }

        let key = slot(user_id, source);
        let receiver = {
            let mut prompts = self.prompts.lock();
            // A save may have landed since the load above.
            if let Some(StoredCredential::Valid(token)) = self.cache.read().get(&key) {
                return Ok(Some(token.clone()));
            }

            let waiters = prompts.entry(key.clone()).or_default();
            if waiters.is_empty() {
                info!(user_id, %source, "credential request raised");
            } else {
                debug!(user_id, %source, waiting = waiters.len(), "joined pending credential request");
            }
            let (tx, rx) = oneshot::channel();
            waiters.push(tx);
            self.set_flag(&key, true);
            rx
        };

        Ok(receiver.await.unwrap_or(None))
    }

    /// Whether a credential request is waiting for user input.
    pub fn has_pending_request(&self, user_id: &str, source: Source) -> bool {
        self.prompts.lock().get(&slot(user_id, source)).is_some_and(|w| !w.is_empty())
    }

    /// Cancel the pending request; every waiter receives `None`.
    pub fn dismiss_request(&self, user_id: &str, source: Source) {
        let waiters = self.prompts.lock().remove(&slot(user_id, source)).unwrap_or_default();
        if !waiters.is_empty() {
            info!(user_id, %source, waiters = waiters.len(), "credential request dismissed");
        }
        for waiter in waiters {
            let _ = waiter.send(None);
        }
    }

    /// Per-source credential overview for one user.
    pub async fn status(&self, user_id: &str) -> Result<Vec<CredentialStatus>> {
        let mut statuses = Vec::with_capacity(Source::SYNCED.len());
        for source in Source::SYNCED {
            let state = self.stored(user_id, source).await?.state();
            let needs_credential = *self.needs_credential(user_id, source).borrow();
            statuses.push(CredentialStatus { source, state, needs_credential });
        }
        Ok(statuses)
    }

    fn set_flag(&self, key: &SlotKey, value: bool) {
        let mut flags = self.flags.lock();
        let sender = flags.entry(key.clone()).or_insert_with(|| watch::channel(false).0);
        sender.send_replace(value);
    }
}
