//! Persistence port for access tokens

use async_trait::async_trait;
use goldfish_domain::{AccessToken, Result, Source, StoredCredential};

/// Durable storage of one token slot per (user, source).
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn load(&self, user_id: &str, source: Source) -> Result<StoredCredential>;

    async fn save(&self, user_id: &str, source: Source, token: &AccessToken) -> Result<()>;

    /// Replace the slot with an explicit invalid marker.
    async fn tombstone(&self, user_id: &str, source: Source) -> Result<()>;
}
