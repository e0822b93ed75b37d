//! USTeP portal login and assignment endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use goldfish_domain::GoldfishError;
use goldfish_infra::portal::PortalAssignment;
use serde::{Deserialize, Serialize};

use super::timed;
use crate::context::AppContext;
use crate::errors::{ApiError, ApiResult};
use crate::extract::bearer_token;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
}

/// Exchange portal credentials for a web service token.
pub async fn login(
    State(ctx): State<Arc<AppContext>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let (Some(username), Some(password)) = (
        request.username.filter(|u| !u.trim().is_empty()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Username and password are required"));
    };

    match timed("ustep::login", ctx.portal.login(username.trim(), &password)).await {
        Ok(token) => Ok(Json(LoginResponse { token: token.expose().to_string() })),
        Err(GoldfishError::Auth(message)) => Err(ApiError::unauthorized(message)),
        Err(err) => Err(ApiError::from(err).summary("Failed to login to UStep")),
    }
}

/// Every assignment across the token owner's enrolled courses.
pub async fn assignments(
    State(ctx): State<Arc<AppContext>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<PortalAssignment>>> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("Missing authorization token"))?;
    timed("ustep::assignments", ctx.portal.assignments(&token))
        .await
        .map(Json)
        .map_err(|err| ApiError::from(err).summary("Failed to fetch UStep assignments"))
}
