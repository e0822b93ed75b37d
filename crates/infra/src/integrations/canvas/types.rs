//! Canvas REST payloads
//!
//! Only the fields the adapter reads are typed; everything else is kept in
//! `extra` so the proxy endpoints can return the upstream object unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Canvas ids are JSON numbers but some institutions emit strings.
pub(crate) fn id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasCourse {
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanvasCourse {
    pub fn id_string(&self) -> String {
        id_to_string(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasAssignment {
    pub id: Value,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Stamped by the client from the owning course.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CanvasAssignment {
    pub fn id_string(&self) -> String {
        id_to_string(&self.id)
    }

    /// Parsed due timestamp; unparseable values count as undated.
    pub fn due(&self) -> Option<DateTime<Utc>> {
        self.due_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|due| due.with_timezone(&Utc))
    }

    pub(crate) fn stamp(mut self, course: &CanvasCourse) -> Self {
        self.course_name = course.name.clone();
        self.course_code = course.course_code.clone();
        self
    }
}
