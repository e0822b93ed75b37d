//! Moodle web service payloads

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct SiteInfo {
    pub userid: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrolledCourse {
    pub id: i64,
    #[serde(default)]
    pub shortname: Option<String>,
    #[serde(default)]
    pub fullname: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignmentsResponse {
    #[serde(default)]
    pub courses: Vec<CourseAssignments>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseAssignments {
    pub id: i64,
    #[serde(default)]
    pub fullname: Option<String>,
    #[serde(default)]
    pub shortname: Option<String>,
    #[serde(default)]
    pub assignments: Vec<PortalAssignment>,
}

/// One `mod_assign` entry, with unread fields preserved for the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortalAssignment {
    pub id: i64,
    #[serde(default)]
    pub cmid: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    /// Epoch seconds; `0` means no due date.
    #[serde(default)]
    pub duedate: Option<i64>,
    #[serde(default)]
    pub intro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/login/token.php`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error payload Moodle returns with HTTP 200.
#[derive(Debug, Clone, Deserialize)]
pub struct MoodleException {
    #[serde(default)]
    pub exception: Option<String>,
    #[serde(default)]
    pub errorcode: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MoodleException {
    /// Parse the exception shape out of a response body, if present.
    pub fn detect(body: &Value) -> Option<Self> {
        let object = body.as_object()?;
        if !object.contains_key("exception") && !object.contains_key("errorcode") {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }

    pub fn describe(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.errorcode.clone())
            .or_else(|| self.exception.clone())
            .unwrap_or_else(|| "unknown Moodle error".to_string())
    }
}
