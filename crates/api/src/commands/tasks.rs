//! Task listing, editing and the live change feed

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{self, Stream};
use goldfish_core::ListQuery;
use goldfish_domain::{
    ArchiveWindow, CourseGroup, NewManualTask, Platform, Task, TaskChange, TaskStatus, TaskView,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use super::timed;
use crate::context::AppContext;
use crate::errors::ApiResult;
use crate::extract::UserId;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    view: TaskView,
    #[serde(default)]
    platform: Option<Platform>,
    #[serde(default)]
    window: ArchiveWindow,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    status: TaskStatus,
}

#[derive(Debug, Deserialize)]
pub struct BulkDelete {
    ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResult {
    deleted: usize,
}

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Vec<Task>>> {
    let query = ListQuery { view: params.view, platform: params.platform, window: params.window };
    Ok(Json(timed("tasks::list", ctx.tasks.list(&user_id, query)).await?))
}

pub async fn by_course(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<Vec<CourseGroup>>> {
    Ok(Json(timed("tasks::by_course", ctx.tasks.by_course(&user_id)).await?))
}

pub async fn get(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    Ok(Json(timed("tasks::get", ctx.tasks.get(&user_id, &id)).await?))
}

pub async fn create(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Json(input): Json<NewManualTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = timed("tasks::create_manual", ctx.tasks.create_manual(&user_id, input)).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_status(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> ApiResult<Json<Task>> {
    Ok(Json(timed("tasks::set_status", ctx.tasks.set_status(&user_id, &id, update.status)).await?))
}

pub async fn delete(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    timed("tasks::delete", ctx.tasks.delete(&user_id, &id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk_delete(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Json(request): Json<BulkDelete>,
) -> ApiResult<Json<BulkDeleteResult>> {
    let deleted = timed("tasks::delete_many", ctx.tasks.delete_many(&user_id, &request.ids)).await?;
    Ok(Json(BulkDeleteResult { deleted }))
}

/// Server-sent events with every change to the caller's tasks.
///
/// A client that falls behind the channel receives a `resync` event and
/// should reload its task list.
pub async fn events(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = ctx.tasks.subscribe();

    let stream = stream::unfold((receiver, user_id), |(mut receiver, user_id)| async move {
        loop {
            match receiver.recv().await {
                Ok(change) if change.user_id() == user_id => {
                    let event = change_event(&change);
                    return Some((Ok(event), (receiver, user_id)));
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %user_id, skipped, "task change subscriber lagged");
                    let event = Event::default().event("resync").data(json!({ "skipped": skipped }).to_string());
                    return Some((Ok(event), (receiver, user_id)));
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn change_event(change: &TaskChange) -> Event {
    let name = match change {
        TaskChange::Inserted { .. } => "inserted",
        TaskChange::StatusChanged { .. } => "statusChanged",
        TaskChange::Deleted { .. } => "deleted",
    };
    let data = serde_json::to_string(change).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(name).data(data)
}
