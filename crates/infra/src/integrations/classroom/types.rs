//! Google Classroom v1 payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseList {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWorkList {
    #[serde(default)]
    pub course_work: Vec<CourseWork>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseWork {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DueDate>,
    #[serde(default)]
    pub due_time: Option<TimeOfDay>,
    #[serde(default)]
    pub alternate_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DueDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Omitted fields are zero, as in `google.type.TimeOfDay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct TimeOfDay {
    #[serde(default)]
    pub hours: u32,
    #[serde(default)]
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
}

/// End of the due day when no time is given.
const DEFAULT_DUE_TIME: TimeOfDay = TimeOfDay { hours: 23, minutes: 59, seconds: 0 };

impl CourseWork {
    /// Due instant in UTC; `None` when undated or the date is invalid.
    pub fn due(&self) -> Option<DateTime<Utc>> {
        let date = self.due_date?;
        let time = self.due_time.unwrap_or(DEFAULT_DUE_TIME);
        NaiveDate::from_ymd_opt(date.year, date.month, date.day)?
            .and_hms_opt(time.hours, time.minutes, time.seconds)
            .map(|naive| naive.and_utc())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionList {
    #[serde(default)]
    pub student_submissions: Vec<StudentSubmission>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSubmission {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub late: bool,
}
