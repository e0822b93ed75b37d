//! Google Classroom source adapter
//!
//! Lists active courses, their coursework and the student's own submission
//! for each piece of coursework. Courses and coursework are fetched in
//! parallel. A failed submission lookup only downgrades that item's status
//! to pending.

use async_trait::async_trait;
use futures::future::join_all;
use goldfish_core::{require_credential, SourceAdapter};
use goldfish_domain::constants::{
    CLASSROOM_COURSEWORK_PAGE_SIZE, CLASSROOM_COURSE_PAGE_SIZE, CLASSROOM_DESCRIPTION_MAX_CHARS,
    UNASSIGNED_COURSE,
};
use goldfish_domain::{
    truncate_with_ellipsis, AccessToken, GoldfishError, Result, Source, TaskCandidate, TaskStatus,
};
use tracing::{debug, info, instrument, warn};

use super::types::{Course, CourseList, CourseWork, CourseWorkList, StudentSubmission, SubmissionList};
use crate::http::HttpClient;

pub struct ClassroomAdapter {
    http: HttpClient,
    api_root: String,
}

impl ClassroomAdapter {
    /// `base_url` is the API host, normally `https://classroom.googleapis.com`.
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self { http, api_root: format!("{}/v1", base_url.trim_end_matches('/')) }
    }

    async fn active_courses(&self, token: &AccessToken) -> Result<Vec<Course>> {
        let url = format!("{}/courses", self.api_root);
        let page_size = CLASSROOM_COURSE_PAGE_SIZE.to_string();
        let mut courses = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .http
                .get(&url)
                .bearer_auth(token.expose())
                .query(&[("courseStates", "ACTIVE"), ("pageSize", page_size.as_str())]);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page.as_str())]);
            }
            let page: CourseList = self.http.get_json(request).await?;
            courses.extend(page.courses);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(courses)
    }

    async fn course_work(&self, token: &AccessToken, course_id: &str) -> Result<Vec<CourseWork>> {
        let url = format!("{}/courses/{}/courseWork", self.api_root, course_id);
        let page_size = CLASSROOM_COURSEWORK_PAGE_SIZE.to_string();
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .http
                .get(&url)
                .bearer_auth(token.expose())
                .query(&[("pageSize", page_size.as_str())]);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page.as_str())]);
            }
            let page: CourseWorkList = self.http.get_json(request).await?;
            items.extend(page.course_work);
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }
        Ok(items)
    }

    async fn own_submission(
        &self,
        token: &AccessToken,
        course_id: &str,
        work_id: &str,
    ) -> Result<Option<StudentSubmission>> {
        let url = format!(
            "{}/courses/{}/courseWork/{}/studentSubmissions",
            self.api_root, course_id, work_id
        );
        let request = self.http.get(url).bearer_auth(token.expose()).query(&[("userId", "me")]);
        let list: SubmissionList = self
            .http
            .get_json(request)
            .await
            .map_err(|err| GoldfishError::PartialItem(err.to_string()))?;
        Ok(list.student_submissions.into_iter().next())
    }

    async fn course_candidates(
        &self,
        token: &AccessToken,
        course: &Course,
    ) -> Result<Vec<TaskCandidate>> {
        let works = self.course_work(token, &course.id).await?;
        debug!(course_id = %course.id, coursework = works.len(), "fetched coursework");

        let items = works.into_iter().map(|work| async move {
            let status = match self.own_submission(token, &course.id, &work.id).await {
                Ok(submission) => classify(submission.as_ref()),
                Err(err) => {
                    debug!(course_id = %course.id, work_id = %work.id, error = %err, "submission lookup failed");
                    TaskStatus::Pending
                }
            };
            to_candidate(course, work, status)
        });
        Ok(join_all(items).await)
    }
}

#[async_trait]
impl SourceAdapter for ClassroomAdapter {
    fn source(&self) -> Source {
        Source::GoogleClassroom
    }

    #[instrument(skip(self, credential))]
    async fn fetch_assignments(
        &self,
        credential: Option<&AccessToken>,
    ) -> Result<Vec<TaskCandidate>> {
        let token = require_credential(Source::GoogleClassroom, credential)?;
        let courses = self.active_courses(token).await?;
        info!(courses = courses.len(), "fetched classroom courses");

        let per_course = join_all(courses.iter().map(|course| async move {
            match self.course_candidates(token, course).await {
                Ok(items) => Ok(items),
                Err(err @ GoldfishError::Auth(_)) => Err(err),
                Err(err) => {
                    warn!(course_id = %course.id, error = %err, "skipping classroom course");
                    Ok(Vec::new())
                }
            }
        }))
        .await;

        let mut candidates = Vec::new();
        for items in per_course {
            candidates.extend(items?);
        }
        Ok(candidates)
    }
}

/// Status from the student's own submission.
pub fn classify(submission: Option<&StudentSubmission>) -> TaskStatus {
    match submission {
        Some(s) if matches!(s.state.as_deref(), Some("TURNED_IN" | "RETURNED")) => {
            TaskStatus::Completed
        }
        Some(s) if s.late => TaskStatus::Overdue,
        _ => TaskStatus::Pending,
    }
}

fn to_candidate(course: &Course, work: CourseWork, status: TaskStatus) -> TaskCandidate {
    let due_date = work.due();
    let course_name = course
        .name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| UNASSIGNED_COURSE.to_string());

    TaskCandidate {
        title: work.title.unwrap_or_default(),
        platform: Source::GoogleClassroom.platform(),
        source: Source::GoogleClassroom,
        source_id: work.id,
        course_name,
        course_code: course.section.clone().filter(|s| !s.trim().is_empty()),
        due_date,
        status,
        original_link: work.alternate_link,
        description: work
            .description
            .as_deref()
            .map(|text| truncate_with_ellipsis(text, CLASSROOM_DESCRIPTION_MAX_CHARS))
            .unwrap_or_default(),
    }
}
