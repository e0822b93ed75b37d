//! Task use cases: manual entry, status edits, deletion, and read views

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use goldfish_domain::constants::UNASSIGNED_COURSE;
use goldfish_domain::{
    ArchiveWindow, CourseGroup, CourseNote, GoldfishError, NewManualTask, NoteUpdate, Platform,
    Result, Task, TaskChange, TaskStatus, TaskView,
};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use super::ports::{NoteRepository, TaskRepository};

/// Listing parameters for [`TaskService::list`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ListQuery {
    pub view: TaskView,
    pub platform: Option<Platform>,
    pub window: ArchiveWindow,
}

/// User-facing task operations.
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    notes: Arc<dyn NoteRepository>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskRepository>, notes: Arc<dyn NoteRepository>) -> Self {
        Self { tasks, notes }
    }

    #[instrument(skip(self, input))]
    pub async fn create_manual(&self, user_id: &str, input: NewManualTask) -> Result<Task> {
        input.validate()?;
        let task = input.into_task(user_id, Utc::now());
        self.tasks.insert_one(task.clone()).await?;
        info!(user_id, task_id = %task.id, "manual task created");
        Ok(task)
    }

    /// Set a task's status. Concurrent edits resolve last-write-wins.
    #[instrument(skip(self))]
    pub async fn set_status(&self, user_id: &str, id: &str, status: TaskStatus) -> Result<Task> {
        let task = self.tasks.update_status(user_id, id, status, Utc::now()).await?;
        debug!(user_id, task_id = id, %status, "task status updated");
        Ok(task)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        if self.tasks.delete(user_id, id).await? {
            Ok(())
        } else {
            Err(GoldfishError::NotFound(format!("task {id}")))
        }
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn delete_many(&self, user_id: &str, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let deleted = self.tasks.delete_many(user_id, ids).await?;
        info!(user_id, deleted, "tasks deleted");
        Ok(deleted)
    }

    pub async fn get(&self, user_id: &str, id: &str) -> Result<Task> {
        self.tasks
            .get(user_id, id)
            .await?
            .ok_or_else(|| GoldfishError::NotFound(format!("task {id}")))
    }

    pub async fn list(&self, user_id: &str, query: ListQuery) -> Result<Vec<Task>> {
        let tasks = self.tasks.list_tasks(user_id).await?;
        Ok(apply_view(tasks, query, Utc::now()))
    }

    pub async fn by_course(&self, user_id: &str) -> Result<Vec<CourseGroup>> {
        let tasks = self.tasks.list_tasks(user_id).await?;
        Ok(group_by_course(tasks))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TaskChange> {
        self.tasks.subscribe()
    }

    pub async fn note(&self, user_id: &str, course_id: &str) -> Result<Option<CourseNote>> {
        self.notes.get(user_id, course_id).await
    }

    pub async fn notes(&self, user_id: &str) -> Result<Vec<CourseNote>> {
        self.notes.list(user_id).await
    }

    #[instrument(skip(self, update))]
    pub async fn save_note(
        &self,
        user_id: &str,
        course_id: &str,
        update: NoteUpdate,
    ) -> Result<CourseNote> {
        if course_id.trim().is_empty() {
            return Err(GoldfishError::InvalidInput("course id is required".into()));
        }
        self.notes.upsert(user_id, course_id, update, Utc::now()).await
    }
}

/// Filter and order tasks for one view.
///
/// - `Current`: not completed, dated, due date ascending
/// - `Undated`: no due date, newest first
/// - `Archive`: completed within the window, most recently updated first
/// - `All`: everything, dated first by due date, then undated
#[must_use]
pub fn apply_view(tasks: Vec<Task>, query: ListQuery, now: DateTime<Utc>) -> Vec<Task> {
    let mut tasks: Vec<Task> = tasks
        .into_iter()
        .filter(|task| query.platform.map_or(true, |platform| task.platform == platform))
        .collect();

    match query.view {
        TaskView::All => {
            tasks.sort_by(|a, b| due_order(a, b).then_with(|| a.title.cmp(&b.title)));
        }
        TaskView::Current => {
            tasks.retain(|t| t.status != TaskStatus::Completed && t.due_date.is_some());
            tasks.sort_by(due_order);
        }
        TaskView::Undated => {
            tasks.retain(|t| t.due_date.is_none());
            tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        TaskView::Archive => {
            let cutoff = query.window.cutoff(now);
            tasks.retain(|t| {
                t.status == TaskStatus::Completed && cutoff.map_or(true, |c| t.updated_at >= c)
            });
            tasks.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        }
    }
    tasks
}

fn due_order(a: &Task, b: &Task) -> std::cmp::Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Group tasks by course label, courses in name order.
#[must_use]
pub fn group_by_course(tasks: Vec<Task>) -> Vec<CourseGroup> {
    let mut groups: BTreeMap<String, Vec<Task>> = BTreeMap::new();
    for task in tasks {
        let name = if task.course_name.trim().is_empty() {
            UNASSIGNED_COURSE.to_string()
        } else {
            task.course_name.clone()
        };
        groups.entry(name).or_default().push(task);
    }

    groups
        .into_iter()
        .map(|(course_name, mut tasks)| {
            tasks.sort_by(due_order);
            let completed = tasks.iter().filter(|t| t.status == TaskStatus::Completed).count();
            CourseGroup { course_name, pending: tasks.len() - completed, completed, tasks }
        })
        .collect()
}
