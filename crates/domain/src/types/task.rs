//! Unified task model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::source::{Platform, Source};
use crate::errors::{GoldfishError, Result};
use crate::impl_domain_status_conversions;

/// Completion state of a task.
///
/// Adapters pick the initial value; afterwards only the user changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
    Overdue,
}

impl_domain_status_conversions!(TaskStatus {
    Pending => "pending",
    Completed => "completed",
    Overdue => "overdue",
});

/// Durable identity of a synced task: `(source, source_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskKey {
    pub source: Source,
    pub source_id: String,
}

impl TaskKey {
    pub fn new(source: Source, source_id: impl Into<String>) -> Self {
        Self { source, source_id: source_id.into() }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.source_id)
    }
}

/// Persisted task record owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub platform: Platform,
    pub source: Source,
    /// Upstream id, absent for manual tasks.
    pub source_id: Option<String>,
    pub course_name: String,
    pub course_code: Option<String>,
    /// `None` means undated: kept, but excluded from time-based views.
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub original_link: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Identity key, or `None` for manual tasks which never collide.
    #[must_use]
    pub fn key(&self) -> Option<TaskKey> {
        if !self.source.is_synced() {
            return None;
        }
        self.source_id.as_ref().map(|id| TaskKey::new(self.source, id.clone()))
    }
}

/// Normalized task produced by a source adapter before persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCandidate {
    pub title: String,
    pub platform: Platform,
    pub source: Source,
    pub source_id: String,
    pub course_name: String,
    pub course_code: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: TaskStatus,
    pub original_link: Option<String>,
    pub description: String,
}

impl TaskCandidate {
    #[must_use]
    pub fn key(&self) -> TaskKey {
        TaskKey::new(self.source, self.source_id.clone())
    }

    /// Materialize the candidate as a new task with store-assigned fields.
    #[must_use]
    pub fn into_task(self, user_id: &str, now: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            title: self.title,
            platform: self.platform,
            source: self.source,
            source_id: Some(self.source_id),
            course_name: self.course_name,
            course_code: self.course_code,
            due_date: self.due_date,
            status: self.status,
            original_link: self.original_link,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// User-entered task that does not come from any upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewManualTask {
    pub title: String,
    pub course_name: String,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub original_link: Option<String>,
}

impl NewManualTask {
    /// # Errors
    /// Returns `GoldfishError::InvalidInput` when the title or course is blank.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(GoldfishError::InvalidInput("task title is required".into()));
        }
        if self.course_name.trim().is_empty() {
            return Err(GoldfishError::InvalidInput("course name is required".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn into_task(self, user_id: &str, now: DateTime<Utc>) -> Task {
        Task {
            id: Uuid::now_v7().to_string(),
            user_id: user_id.to_string(),
            title: self.title.trim().to_string(),
            platform: Platform::Manual,
            source: Source::Manual,
            source_id: None,
            course_name: self.course_name.trim().to_string(),
            course_code: self.course_code,
            due_date: self.due_date,
            status: TaskStatus::Pending,
            original_link: self.original_link,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Change notification emitted by the task store after a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskChange {
    Inserted { task: Task },
    StatusChanged { task: Task },
    #[serde(rename_all = "camelCase")]
    Deleted { user_id: String, id: String },
}

impl TaskChange {
    #[must_use]
    pub fn user_id(&self) -> &str {
        match self {
            Self::Inserted { task } | Self::StatusChanged { task } => &task.user_id,
            Self::Deleted { user_id, .. } => user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(source_id: &str) -> TaskCandidate {
        TaskCandidate {
            title: "Lab 3".into(),
            platform: Platform::Canvas,
            source: Source::Canvas,
            source_id: source_id.into(),
            course_name: "Physics".into(),
            course_code: Some("PHY101".into()),
            due_date: None,
            status: TaskStatus::Pending,
            original_link: None,
            description: String::new(),
        }
    }

    #[test]
    fn key_display_joins_source_and_id() {
        assert_eq!(candidate("5").key().to_string(), "canvas-5");
    }

    #[test]
    fn candidate_into_task_keeps_identity() {
        let now = Utc::now();
        let task = candidate("9").into_task("user-1", now);
        assert_eq!(task.key(), Some(TaskKey::new(Source::Canvas, "9")));
        assert_eq!(task.user_id, "user-1");
        assert_eq!(task.created_at, now);
        assert_eq!(task.updated_at, now);
    }

    #[test]
    fn manual_tasks_have_no_key() {
        let manual = NewManualTask {
            title: "  Read chapter 4 ".into(),
            course_name: "History".into(),
            course_code: None,
            due_date: None,
            description: String::new(),
            original_link: None,
        };
        manual.validate().unwrap();
        let task = manual.into_task("user-1", Utc::now());
        assert_eq!(task.title, "Read chapter 4");
        assert_eq!(task.key(), None);
        assert_eq!(task.platform, Platform::Manual);
    }

    #[test]
    fn manual_task_requires_title() {
        let manual = NewManualTask {
            title: "   ".into(),
            course_name: "History".into(),
            course_code: None,
            due_date: None,
            description: String::new(),
            original_link: None,
        };
        assert!(matches!(manual.validate(), Err(GoldfishError::InvalidInput(_))));
    }

    #[test]
    fn task_change_serializes_with_kind() {
        let change = TaskChange::Deleted { user_id: "u".into(), id: "t".into() };
        let json = serde_json::to_value(&change).unwrap();
        assert_eq!(json["kind"], "deleted");
        assert_eq!(json["userId"], "u");
        assert_eq!(change.user_id(), "u");
    }
}
