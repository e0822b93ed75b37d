//! Storage ports for tasks and course notes

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goldfish_domain::{CourseNote, NoteUpdate, Result, Task, TaskChange, TaskKey, TaskStatus};
use tokio::sync::broadcast;

/// Per-user task collection with change notification.
///
/// Implementations publish a [`TaskChange`] for every committed write.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list_tasks(&self, user_id: &str) -> Result<Vec<Task>>;

    /// Identity keys of every synced task the user owns.
    async fn source_keys(&self, user_id: &str) -> Result<HashSet<TaskKey>>;

    /// Insert all tasks in one transaction.
    ///
    /// Rows whose identity key already exists are skipped, not failed; the
    /// returned vector holds only the rows actually written.
    async fn insert_batch(&self, tasks: Vec<Task>) -> Result<Vec<Task>>;

    /// Insert one task. Returns `false` when its identity key already exists.
    async fn insert_one(&self, task: Task) -> Result<bool>;

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<Task>>;

    /// # Errors
    /// Returns `GoldfishError::NotFound` when the task does not exist.
    async fn update_status(
        &self,
        user_id: &str,
        id: &str,
        status: TaskStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<Task>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, user_id: &str, id: &str) -> Result<bool>;

    /// Delete several tasks in one transaction, returning the number removed.
    async fn delete_many(&self, user_id: &str, ids: &[String]) -> Result<usize>;

    fn subscribe(&self) -> broadcast::Receiver<TaskChange>;
}

/// Per-course note storage.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn get(&self, user_id: &str, course_id: &str) -> Result<Option<CourseNote>>;

    async fn list(&self, user_id: &str) -> Result<Vec<CourseNote>>;

    /// Create or merge into the existing note, preserving `created_at`.
    async fn upsert(
        &self,
        user_id: &str,
        course_id: &str,
        update: NoteUpdate,
        now: DateTime<Utc>,
    ) -> Result<CourseNote>;
}
