//! Sync trigger

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use goldfish_domain::{SyncOptions, SyncSummary};

use super::timed;
use crate::context::AppContext;
use crate::errors::{ApiError, ApiResult};
use crate::extract::UserId;

/// Run a sync for the caller. A missing body syncs every source without
/// waiting for credentials.
pub async fn run_sync(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    options: Option<Json<SyncOptions>>,
) -> ApiResult<Json<SyncSummary>> {
    let options = options.map(|Json(options)| options).unwrap_or_default();
    timed("sync::run", ctx.sync.sync(&user_id, &options))
        .await
        .map(Json)
        .map_err(|err| ApiError::from(err).summary("Sync failed"))
}
