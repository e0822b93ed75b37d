//! USTeP (Moodle) source adapter
//!
//! Moodle's assignment listing carries no submission state, so a portal task
//! is either overdue (due date passed) or pending. It is never reported as
//! completed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use goldfish_core::{require_credential, SourceAdapter};
use goldfish_domain::constants::{DESCRIPTION_MAX_CHARS, PORTAL_UNKNOWN_COURSE};
use goldfish_domain::{excerpt, AccessToken, Result, Source, TaskCandidate, TaskStatus};
use tracing::{info, instrument};

use super::client::PortalClient;
use super::types::PortalAssignment;

pub struct PortalAdapter {
    client: PortalClient,
}

impl PortalAdapter {
    pub fn new(client: PortalClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for PortalAdapter {
    fn source(&self) -> Source {
        Source::Ustep
    }

    #[instrument(skip(self, credential))]
    async fn fetch_assignments(
        &self,
        credential: Option<&AccessToken>,
    ) -> Result<Vec<TaskCandidate>> {
        let token = require_credential(Source::Ustep, credential)?;
        let assignments = self.client.assignments(token).await?;
        let now = Utc::now();

        let candidates: Vec<TaskCandidate> = assignments
            .into_iter()
            .map(|assignment| to_candidate(self.client.base_url(), assignment, now))
            .collect();
        info!(count = candidates.len(), "normalized portal assignments");
        Ok(candidates)
    }
}

pub fn to_candidate(
    base_url: &str,
    assignment: PortalAssignment,
    now: DateTime<Utc>,
) -> TaskCandidate {
    let due_date = assignment
        .duedate
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::from_timestamp(secs, 0));
    let status = match due_date {
        Some(due) if due < now => TaskStatus::Overdue,
        _ => TaskStatus::Pending,
    };
    let course_name = [assignment.course_name, assignment.course_code.clone()]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| PORTAL_UNKNOWN_COURSE.to_string());

    TaskCandidate {
        title: assignment.name.unwrap_or_default(),
        platform: Source::Ustep.platform(),
        source: Source::Ustep,
        source_id: assignment.id.to_string(),
        course_name,
        course_code: assignment.course_code,
        due_date,
        status,
        original_link: assignment
            .cmid
            .map(|cmid| format!("{base_url}/mod/assign/view.php?id={cmid}")),
        description: assignment
            .intro
            .as_deref()
            .map(|html| excerpt(html, DESCRIPTION_MAX_CHARS))
            .unwrap_or_default(),
    }
}
