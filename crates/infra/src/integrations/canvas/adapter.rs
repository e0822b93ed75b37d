//! Canvas source adapter

use async_trait::async_trait;
use chrono::Utc;
use goldfish_core::{require_credential, SourceAdapter};
use goldfish_domain::constants::{CANVAS_UNKNOWN_COURSE, DESCRIPTION_MAX_CHARS};
use goldfish_domain::{excerpt, AccessToken, Result, Source, TaskCandidate, TaskStatus};
use tracing::{info, instrument};

use super::client::CanvasClient;
use super::types::CanvasAssignment;

/// Which assignments a Canvas fetch returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanvasMode {
    /// Every assignment, dated or not.
    #[default]
    All,
    /// Only assignments due within the next `window_days`.
    Upcoming { window_days: i64 },
}

pub struct CanvasAdapter {
    client: CanvasClient,
    mode: CanvasMode,
}

impl CanvasAdapter {
    pub fn new(client: CanvasClient) -> Self {
        Self { client, mode: CanvasMode::All }
    }

    pub fn with_mode(mut self, mode: CanvasMode) -> Self {
        self.mode = mode;
        self
    }
}

#[async_trait]
impl SourceAdapter for CanvasAdapter {
    fn source(&self) -> Source {
        Source::Canvas
    }

    #[instrument(skip(self, credential), fields(mode = ?self.mode))]
    async fn fetch_assignments(
        &self,
        credential: Option<&AccessToken>,
    ) -> Result<Vec<TaskCandidate>> {
        let token = require_credential(Source::Canvas, credential)?;
        let assignments = match self.mode {
            CanvasMode::All => self.client.all_assignments(token).await?,
            CanvasMode::Upcoming { window_days } => {
                self.client.upcoming_assignments(token, window_days, Utc::now()).await?
            }
        };

        let candidates: Vec<TaskCandidate> = assignments.into_iter().map(to_candidate).collect();
        info!(count = candidates.len(), "normalized canvas assignments");
        Ok(candidates)
    }
}

/// Canvas never reports completion, so every task starts pending.
pub fn to_candidate(assignment: CanvasAssignment) -> TaskCandidate {
    let due_date = assignment.due();
    let source_id = assignment.id_string();
    let course_name = [assignment.course_name, assignment.course_code.clone()]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or_else(|| CANVAS_UNKNOWN_COURSE.to_string());

    TaskCandidate {
        title: assignment.name.unwrap_or_default(),
        platform: Source::Canvas.platform(),
        source: Source::Canvas,
        source_id,
        course_name,
        course_code: assignment.course_code,
        due_date,
        status: TaskStatus::Pending,
        original_link: assignment.html_url,
        description: assignment
            .description
            .as_deref()
            .map(|html| excerpt(html, DESCRIPTION_MAX_CHARS))
            .unwrap_or_default(),
    }
}
