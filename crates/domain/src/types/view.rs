//! Read-side views over a user's tasks

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::task::Task;
use crate::constants::{ARCHIVE_MONTH_DAYS, ARCHIVE_SEMESTER_DAYS, ARCHIVE_WEEK_DAYS};
use crate::impl_domain_status_conversions;

/// Named task listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskView {
    #[default]
    All,
    /// Pending, dated tasks ordered by due date.
    Current,
    /// Tasks without a due date.
    Undated,
    /// Completed tasks ordered by last update, newest first.
    Archive,
}

impl_domain_status_conversions!(TaskView {
    All => "all",
    Current => "current",
    Undated => "undated",
    Archive => "archive",
});

/// Lookback window for the archive view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveWindow {
    Week,
    Month,
    Semester,
    #[default]
    All,
}

impl_domain_status_conversions!(ArchiveWindow {
    Week => "week",
    Month => "month",
    Semester => "semester",
    All => "all",
});

impl ArchiveWindow {
    #[must_use]
    pub const fn days(self) -> Option<i64> {
        match self {
            Self::Week => Some(ARCHIVE_WEEK_DAYS),
            Self::Month => Some(ARCHIVE_MONTH_DAYS),
            Self::Semester => Some(ARCHIVE_SEMESTER_DAYS),
            Self::All => None,
        }
    }

    /// Earliest `updated_at` included in the window.
    #[must_use]
    pub fn cutoff(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.days().map(|days| now - Duration::days(days))
    }
}

/// Tasks sharing one course label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseGroup {
    pub course_name: String,
    pub pending: usize,
    pub completed: usize,
    pub tasks: Vec<Task>,
}
