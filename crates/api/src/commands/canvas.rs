//! Canvas pass-through endpoints
//!
//! Each call uses the caller's bearer token, falling back to the server's
//! configured token. Responses carry the upstream JSON unchanged apart from
//! the `course_name` / `course_code` stamps on assignments.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use goldfish_domain::AccessToken;
use goldfish_infra::canvas::{CanvasAssignment, CanvasCourse};
use serde_json::Value;

use super::timed;
use crate::context::AppContext;
use crate::errors::{ApiError, ApiResult};
use crate::extract::bearer_token;

fn canvas_token(ctx: &AppContext, headers: &HeaderMap, summary: &str) -> ApiResult<AccessToken> {
    ctx.canvas_token(bearer_token(headers))
        .ok_or_else(|| ApiError::unauthorized("No Canvas API token provided").summary(summary))
}

pub async fn courses(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<CanvasCourse>>> {
    const SUMMARY: &str = "Failed to fetch courses";
    let token = canvas_token(&ctx, &headers, SUMMARY)?;
    timed("canvas::courses", ctx.canvas.courses(&token))
        .await
        .map(Json)
        .map_err(|err| ApiError::from(err).summary(SUMMARY))
}

pub async fn course_assignments(
    State(ctx): State<Arc<AppContext>>,
    Path(course_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<CanvasAssignment>>> {
    const SUMMARY: &str = "Failed to fetch assignments";
    let token = canvas_token(&ctx, &headers, SUMMARY)?;
    timed("canvas::course_assignments", ctx.canvas.course_assignments(&token, &course_id))
        .await
        .map(Json)
        .map_err(|err| ApiError::from(err).summary(SUMMARY))
}

pub async fn all_assignments(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<CanvasAssignment>>> {
    const SUMMARY: &str = "Failed to fetch all assignments";
    let token = canvas_token(&ctx, &headers, SUMMARY)?;
    timed("canvas::all_assignments", ctx.canvas.all_assignments(&token))
        .await
        .map(Json)
        .map_err(|err| ApiError::from(err).summary(SUMMARY))
}

pub async fn upcoming_assignments(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<CanvasAssignment>>> {
    const SUMMARY: &str = "Failed to fetch upcoming assignments";
    let token = canvas_token(&ctx, &headers, SUMMARY)?;
    let window_days = ctx.config.sync.upcoming_window_days;
    timed(
        "canvas::upcoming_assignments",
        ctx.canvas.upcoming_assignments(&token, window_days, Utc::now()),
    )
    .await
    .map(Json)
    .map_err(|err| ApiError::from(err).summary(SUMMARY))
}

pub async fn profile(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    const SUMMARY: &str = "Failed to fetch user profile";
    let token = canvas_token(&ctx, &headers, SUMMARY)?;
    timed("canvas::profile", ctx.canvas.profile(&token))
        .await
        .map(Json)
        .map_err(|err| ApiError::from(err).summary(SUMMARY))
}
