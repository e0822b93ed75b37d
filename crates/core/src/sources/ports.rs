//! Port interface implemented once per upstream learning platform

use async_trait::async_trait;
use goldfish_domain::{AccessToken, GoldfishError, Result, Source, TaskCandidate};

/// Fetches a user's assignments from one upstream and normalizes them.
///
/// Adapters hold no token state; the credential is injected per call.
///
/// # Errors
/// - `GoldfishError::Auth` when `credential` is `None` or upstream rejects it
/// - `GoldfishError::Upstream` when a primary listing call fails
///
/// Failures fetching per-item detail degrade to defaults instead.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Namespace of every candidate this adapter emits.
    fn source(&self) -> Source;

    async fn fetch_assignments(
        &self,
        credential: Option<&AccessToken>,
    ) -> Result<Vec<TaskCandidate>>;
}

/// Unwrap an injected credential or fail with an auth error.
///
/// # Errors
/// Returns `GoldfishError::Auth` when no credential was supplied.
pub fn require_credential(source: Source, credential: Option<&AccessToken>) -> Result<&AccessToken> {
    credential.ok_or_else(|| GoldfishError::Auth(format!("no {source} credential available")))
}
