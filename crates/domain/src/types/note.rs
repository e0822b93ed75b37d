//! Per-course notes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-text note attached to one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseNote {
    pub user_id: String,
    pub course_id: String,
    pub course_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a note save; merged into any existing note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdate {
    pub course_name: String,
    pub content: String,
}
