//! # Goldfish API
//!
//! HTTP layer - routes, handlers and the proxy binary.
//!
//! This crate contains:
//! - Canvas and USTeP pass-through endpoints for the browser client
//! - Sync, task, credential and note endpoints
//! - Application context (dependency injection)
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod errors;
pub mod extract;
pub mod utils;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

pub use context::AppContext;
pub use errors::{ApiError, ApiResult};

use crate::commands::{canvas, credentials, health, notes, portal, sync, tasks};
use crate::utils::cors::cors_layer;

/// Every route, with CORS and request tracing applied.
pub fn router(ctx: Arc<AppContext>) -> Router {
    let cors = cors_layer(ctx.config.server.allowed_origins.clone());

    Router::new()
        .route("/health", get(health::health))
        .route("/api/health", get(health::detailed_health))
        // Canvas proxy
        .route("/api/canvas/courses", get(canvas::courses))
        .route("/api/canvas/courses/{course_id}/assignments", get(canvas::course_assignments))
        .route("/api/canvas/assignments", get(canvas::all_assignments))
        .route("/api/canvas/assignments/upcoming", get(canvas::upcoming_assignments))
        .route("/api/canvas/profile", get(canvas::profile))
        // USTeP proxy
        .route("/api/ustep/login", post(portal::login))
        .route("/api/ustep/assignments", get(portal::assignments))
        // Application
        .route("/api/sync", post(sync::run_sync))
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route("/api/tasks/by-course", get(tasks::by_course))
        .route("/api/tasks/events", get(tasks::events))
        .route("/api/tasks/bulk-delete", post(tasks::bulk_delete))
        .route(
            "/api/tasks/{id}",
            get(tasks::get).patch(tasks::update_status).delete(tasks::delete),
        )
        .route("/api/credentials", get(credentials::status))
        .route(
            "/api/credentials/{source}",
            put(credentials::save).delete(credentials::invalidate),
        )
        .route("/api/credentials/{source}/dismiss", post(credentials::dismiss))
        .route("/api/notes", get(notes::list))
        .route("/api/notes/{course_id}", get(notes::get).put(notes::save))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ctx)
}
