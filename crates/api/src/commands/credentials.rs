//! Per-source credential management

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use goldfish_domain::{AccessToken, CredentialStatus, Source};
use serde::Deserialize;

use super::timed;
use crate::context::AppContext;
use crate::errors::{ApiError, ApiResult};
use crate::extract::UserId;

#[derive(Debug, Deserialize)]
pub struct SaveCredential {
    token: String,
}

fn synced_source(raw: &str) -> ApiResult<Source> {
    match raw.parse::<Source>() {
        Ok(source) if source.is_synced() => Ok(source),
        _ => Err(ApiError::bad_request(format!("Unknown source: {raw}"))),
    }
}

pub async fn status(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<Vec<CredentialStatus>>> {
    Ok(Json(timed("credentials::status", ctx.credentials.status(&user_id)).await?))
}

/// Store a token. Resolves any sync waiting on this credential.
pub async fn save(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(source): Path<String>,
    Json(request): Json<SaveCredential>,
) -> ApiResult<StatusCode> {
    let source = synced_source(&source)?;
    let token =
        AccessToken::new(request.token).ok_or_else(|| ApiError::bad_request("Token is required"))?;
    timed("credentials::save", ctx.credentials.save(&user_id, source, token)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark the stored token unusable; the next sync asks for a new one.
pub async fn invalidate(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(source): Path<String>,
) -> ApiResult<StatusCode> {
    let source = synced_source(&source)?;
    timed("credentials::invalidate", ctx.credentials.invalidate(&user_id, source)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cancel a pending credential prompt; waiting syncs skip the source.
pub async fn dismiss(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(source): Path<String>,
) -> ApiResult<StatusCode> {
    let source = synced_source(&source)?;
    ctx.credentials.dismiss_request(&user_id, source);
    Ok(StatusCode::NO_CONTENT)
}
