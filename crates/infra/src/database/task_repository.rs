//! SQLite-backed task store
//!
//! Writes publish a [`TaskChange`] on a broadcast channel once the
//! transaction has committed, so subscribers never observe rolled-back rows.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goldfish_core::TaskRepository;
use goldfish_domain::constants::TASK_CHANGE_CHANNEL_CAPACITY;
use goldfish_domain::{GoldfishError, Result, Task, TaskChange, TaskKey, TaskStatus};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::broadcast;
use tokio::task;
use tracing::{debug, instrument};

use super::manager::{map_join_error, map_sql_error, DbManager};
use super::{format_timestamp, parse_column, parse_timestamp};

const TASK_COLUMNS: &str = "id, user_id, title, platform, source, source_id, course_name,
     course_code, due_date, status, original_link, description, created_at, updated_at";

const INSERT_TASK_SQL: &str = "INSERT INTO tasks (id, user_id, title, platform, source, source_id,
     course_name, course_code, due_date, status, original_link, description, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
     ON CONFLICT DO NOTHING";

/// Task repository over the shared [`DbManager`].
pub struct SqliteTaskRepository {
    db: Arc<DbManager>,
    changes: broadcast::Sender<TaskChange>,
}

impl SqliteTaskRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        let (changes, _) = broadcast::channel(TASK_CHANGE_CHANNEL_CAPACITY);
        Self { db, changes }
    }

    fn publish(&self, change: TaskChange) {
        // No subscribers is not an error.
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    #[instrument(skip(self))]
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<Vec<Task>> {
            let conn = db.get_connection()?;
            let sql = format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 ORDER BY due_date IS NULL, due_date, title"
            );
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt.query_map(params![&user_id], map_task_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn source_keys(&self, user_id: &str) -> Result<HashSet<TaskKey>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<HashSet<TaskKey>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(
                    "SELECT source, source_id FROM tasks
                     WHERE user_id = ?1 AND source <> 'manual' AND source_id IS NOT NULL",
                )
                .map_err(map_sql_error)?;
            let rows = stmt
                .query_map(params![&user_id], |row| {
                    let source = parse_column(row, 0)?;
                    let source_id: String = row.get(1)?;
                    Ok(TaskKey::new(source, source_id))
                })
                .map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<HashSet<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, tasks), fields(count = tasks.len()))]
    async fn insert_batch(&self, tasks: Vec<Task>) -> Result<Vec<Task>> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let db = Arc::clone(&self.db);

        let inserted = task::spawn_blocking(move || -> Result<Vec<Task>> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let mut inserted = Vec::with_capacity(tasks.len());
            for task in tasks {
                if insert_task(&tx, &task).map_err(map_sql_error)? {
                    inserted.push(task);
                }
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(inserted)
        })
        .await
        .map_err(map_join_error)??;

        debug!(inserted = inserted.len(), "task batch committed");
        for task in &inserted {
            self.publish(TaskChange::Inserted { task: task.clone() });
        }
        Ok(inserted)
    }

    async fn insert_one(&self, task: Task) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let row = task.clone();

        let inserted = task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            insert_task(&conn, &row).map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)??;

        if inserted {
            self.publish(TaskChange::Inserted { task });
        }
        Ok(inserted)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<Task>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let id = id.to_string();

        task::spawn_blocking(move || -> Result<Option<Task>> {
            let conn = db.get_connection()?;
            select_task(&conn, &user_id, &id)
        })
        .await
        .map_err(map_join_error)?
    }

    #[instrument(skip(self, updated_at))]
    async fn update_status(
        &self,
        user_id: &str,
        id: &str,
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Task> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let id = id.to_string();

        let task = task::spawn_blocking(move || -> Result<Task> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE user_id = ?3 AND id = ?4",
                    params![status.to_string(), format_timestamp(&updated_at), &user_id, &id],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(GoldfishError::NotFound(format!("task {id}")));
            }
            select_task(&conn, &user_id, &id)?
                .ok_or_else(|| GoldfishError::NotFound(format!("task {id}")))
        })
        .await
        .map_err(map_join_error)??;

        self.publish(TaskChange::StatusChanged { task: task.clone() });
        Ok(task)
    }

    #[instrument(skip(self))]
    async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let db = Arc::clone(&self.db);
        let owner = user_id.to_string();
        let task_id = id.to_string();

        let removed = task::spawn_blocking(move || -> Result<bool> {
            let conn = db.get_connection()?;
            let count = conn
                .execute("DELETE FROM tasks WHERE user_id = ?1 AND id = ?2", params![&owner, &task_id])
                .map_err(map_sql_error)?;
            Ok(count > 0)
        })
        .await
        .map_err(map_join_error)??;

        if removed {
            self.publish(TaskChange::Deleted { user_id: user_id.to_string(), id: id.to_string() });
        }
        Ok(removed)
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    async fn delete_many(&self, user_id: &str, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let db = Arc::clone(&self.db);
        let owner = user_id.to_string();
        let ids = ids.to_vec();

        let removed = task::spawn_blocking(move || -> Result<Vec<String>> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let mut removed = Vec::new();
            {
                let mut stmt = tx
                    .prepare("DELETE FROM tasks WHERE user_id = ?1 AND id = ?2")
                    .map_err(map_sql_error)?;
                for id in ids {
                    if stmt.execute(params![&owner, &id]).map_err(map_sql_error)? > 0 {
                        removed.push(id);
                    }
                }
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(removed)
        })
        .await
        .map_err(map_join_error)??;

        let count = removed.len();
        for id in removed {
            self.publish(TaskChange::Deleted { user_id: user_id.to_string(), id });
        }
        Ok(count)
    }

    fn subscribe(&self) -> broadcast::Receiver<TaskChange> {
        self.changes.subscribe()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Returns `false` when the identity index swallowed the row.
fn insert_task(conn: &Connection, task: &Task) -> rusqlite::Result<bool> {
    let count = conn.execute(
        INSERT_TASK_SQL,
        params![
            task.id,
            task.user_id,
            task.title,
            task.platform.as_str(),
            task.source.to_string(),
            task.source_id,
            task.course_name,
            task.course_code,
            task.due_date.as_ref().map(format_timestamp),
            task.status.to_string(),
            task.original_link,
            task.description,
            format_timestamp(&task.created_at),
            format_timestamp(&task.updated_at),
        ],
    )?;
    Ok(count > 0)
}

fn select_task(conn: &Connection, user_id: &str, id: &str) -> Result<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ?1 AND id = ?2");
    conn.query_row(&sql, params![user_id, id], map_task_row).optional().map_err(map_sql_error)
}

fn map_task_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    let due_date: Option<String> = row.get(8)?;
    Ok(Task {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        platform: parse_column(row, 3)?,
        source: parse_column(row, 4)?,
        source_id: row.get(5)?,
        course_name: row.get(6)?,
        course_code: row.get(7)?,
        due_date: due_date.map(|raw| parse_timestamp(8, &raw)).transpose()?,
        status: parse_column(row, 9)?,
        original_link: row.get(10)?,
        description: row.get(11)?,
        created_at: parse_timestamp(12, &row.get::<_, String>(12)?)?,
        updated_at: parse_timestamp(13, &row.get::<_, String>(13)?)?,
    })
}

#[cfg(test)]
mod tests {
    use goldfish_domain::{Platform, Source, TaskCandidate};
    use tempfile::TempDir;

    use super::*;

    fn setup_test_db() -> (SqliteTaskRepository, TempDir) {
        let temp_dir = TempDir::new().expect("create temp dir");
        let manager = DbManager::new(temp_dir.path().join("test.db"), 2).expect("create db manager");
        manager.run_migrations().expect("run migrations");
        (SqliteTaskRepository::new(Arc::new(manager)), temp_dir)
    }

    fn synced(user_id: &str, source_id: &str) -> Task {
        TaskCandidate {
            title: format!("Assignment {source_id}"),
            platform: Platform::Canvas,
            source: Source::Canvas,
            source_id: source_id.into(),
            course_name: "Algorithms".into(),
            course_code: Some("CS301".into()),
            due_date: None,
            status: TaskStatus::Pending,
            original_link: Some("https://canvas.example/a".into()),
            description: "Read chapter 2".into(),
        }
        .into_task(user_id, Utc::now())
    }

    #[tokio::test]
    async fn batch_insert_skips_existing_keys() {
        let (repo, _dir) = setup_test_db();
        let mut changes = repo.subscribe();

        let first = repo.insert_batch(vec![synced("u", "1"), synced("u", "2")]).await.unwrap();
        assert_eq!(first.len(), 2);

        let second = repo.insert_batch(vec![synced("u", "2"), synced("u", "3")]).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].source_id.as_deref(), Some("3"));

        let keys = repo.source_keys("u").await.unwrap();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&TaskKey::new(Source::Canvas, "2")));

        let mut inserted = 0;
        while let Ok(TaskChange::Inserted { .. }) = changes.try_recv() {
            inserted += 1;
        }
        assert_eq!(inserted, 3);
    }

    #[tokio::test]
    async fn same_key_for_different_users_is_allowed() {
        let (repo, _dir) = setup_test_db();
        assert!(repo.insert_one(synced("alice", "7")).await.unwrap());
        assert!(repo.insert_one(synced("bob", "7")).await.unwrap());
        assert!(!repo.insert_one(synced("bob", "7")).await.unwrap());
    }

    #[tokio::test]
    async fn rows_round_trip_through_storage() {
        let (repo, _dir) = setup_test_db();
        let mut task = synced("u", "11");
        task.due_date = Some(Utc::now());
        repo.insert_one(task.clone()).await.unwrap();

        let loaded = repo.get("u", &task.id).await.unwrap().expect("task stored");
        assert_eq!(loaded, task);
        assert!(repo.get("someone-else", &task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_update_touches_only_status() {
        let (repo, _dir) = setup_test_db();
        let task = synced("u", "4");
        repo.insert_one(task.clone()).await.unwrap();

        let later = Utc::now();
        let updated = repo.update_status("u", &task.id, TaskStatus::Completed, later).await.unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.title, task.title);
        assert_eq!(updated.created_at, task.created_at);

        let missing = repo.update_status("u", "nope", TaskStatus::Completed, later).await;
        assert!(matches!(missing, Err(GoldfishError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_many_reports_removed_rows() {
        let (repo, _dir) = setup_test_db();
        let a = synced("u", "1");
        let b = synced("u", "2");
        repo.insert_batch(vec![a.clone(), b.clone()]).await.unwrap();
        let mut changes = repo.subscribe();

        let removed = repo.delete_many("u", &[a.id.clone(), "ghost".into()]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            changes.recv().await.unwrap(),
            TaskChange::Deleted { user_id: "u".into(), id: a.id.clone() }
        );
        assert!(repo.delete("u", &b.id).await.unwrap());
        assert!(repo.list_tasks("u").await.unwrap().is_empty());
    }
}
