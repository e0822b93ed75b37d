//! Course notes

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use goldfish_domain::{CourseNote, GoldfishError, NoteUpdate};

use super::timed;
use crate::context::AppContext;
use crate::errors::ApiResult;
use crate::extract::UserId;

pub async fn list(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
) -> ApiResult<Json<Vec<CourseNote>>> {
    Ok(Json(timed("notes::list", ctx.tasks.notes(&user_id)).await?))
}

pub async fn get(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(course_id): Path<String>,
) -> ApiResult<Json<CourseNote>> {
    let note = timed("notes::get", ctx.tasks.note(&user_id, &course_id)).await?;
    note.map(Json)
        .ok_or_else(|| GoldfishError::NotFound(format!("note for course {course_id}")).into())
}

pub async fn save(
    State(ctx): State<Arc<AppContext>>,
    UserId(user_id): UserId,
    Path(course_id): Path<String>,
    Json(update): Json<NoteUpdate>,
) -> ApiResult<Json<CourseNote>> {
    Ok(Json(timed("notes::save", ctx.tasks.save_note(&user_id, &course_id, update)).await?))
}
