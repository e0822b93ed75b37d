//! Course note persistence

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goldfish_core::NoteRepository;
use goldfish_domain::{CourseNote, NoteUpdate, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};
use super::{format_timestamp, parse_timestamp};

pub struct SqliteNoteRepository {
    db: Arc<DbManager>,
}

impl SqliteNoteRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NoteRepository for SqliteNoteRepository {
    async fn get(&self, user_id: &str, course_id: &str) -> Result<Option<CourseNote>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let course_id = course_id.to_string();

        task::spawn_blocking(move || -> Result<Option<CourseNote>> {
            let conn = db.get_connection()?;
            select_note(&conn, &user_id, &course_id)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list(&self, user_id: &str) -> Result<Vec<CourseNote>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<Vec<CourseNote>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT user_id, course_id, course_name, content, created_at, updated_at
                     FROM course_notes WHERE user_id = ?1 ORDER BY course_name, course_id",
                )
                .map_err(map_sql_error)?;
            let rows = stmt.query_map(params![&user_id], map_note_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn upsert(
        &self,
        user_id: &str,
        course_id: &str,
        update: NoteUpdate,
        now: DateTime<Utc>,
    ) -> Result<CourseNote> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let course_id = course_id.to_string();

        task::spawn_blocking(move || -> Result<CourseNote> {
            let conn = db.get_connection()?;
            let stamp = format_timestamp(&now);
            conn.execute(
                "INSERT INTO course_notes (user_id, course_id, course_name, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 ON CONFLICT(user_id, course_id) DO UPDATE SET
                     course_name = excluded.course_name,
                     content = excluded.content,
                     updated_at = excluded.updated_at",
                params![&user_id, &course_id, update.course_name, update.content, stamp],
            )
            .map_err(map_sql_error)?;
            select_note(&conn, &user_id, &course_id)?.ok_or_else(|| {
                goldfish_domain::GoldfishError::Internal(format!(
                    "note for course {course_id} vanished after upsert"
                ))
            })
        })
        .await
        .map_err(map_join_error)?
    }
}

fn select_note(conn: &Connection, user_id: &str, course_id: &str) -> Result<Option<CourseNote>> {
    conn.query_row(
        "SELECT user_id, course_id, course_name, content, created_at, updated_at
         FROM course_notes WHERE user_id = ?1 AND course_id = ?2",
        params![user_id, course_id],
        map_note_row,
    )
    .optional()
    .map_err(map_sql_error)
}

fn map_note_row(row: &Row<'_>) -> rusqlite::Result<CourseNote> {
    Ok(CourseNote {
        user_id: row.get(0)?,
        course_id: row.get(1)?,
        course_name: row.get(2)?,
        content: row.get(3)?,
        created_at: parse_timestamp(4, &row.get::<_, String>(4)?)?,
        updated_at: parse_timestamp(5, &row.get::<_, String>(5)?)?,
    })
}
