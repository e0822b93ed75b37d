//! Canvas LMS REST client
//!
//! Every call takes the bearer token explicitly. Listing endpoints request
//! `per_page=100` and follow the `Link: <…>; rel="next"` header until the
//! last page.

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use goldfish_domain::constants::CANVAS_PAGE_SIZE;
use goldfish_domain::{AccessToken, GoldfishError, Result};
use reqwest::header::{HeaderMap, LINK};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::types::{CanvasAssignment, CanvasCourse};
use crate::http::client::read_json;
use crate::http::HttpClient;

#[derive(Clone)]
pub struct CanvasClient {
    http: HttpClient,
    api_root: String,
}

impl CanvasClient {
    /// `base_url` is the institution root; `/api/v1` is appended here.
    pub fn new(http: HttpClient, base_url: &str) -> Self {
        Self { http, api_root: format!("{}/api/v1", base_url.trim_end_matches('/')) }
    }

    /// Active-enrollment courses of the token's owner.
    #[instrument(skip(self, token))]
    pub async fn courses(&self, token: &AccessToken) -> Result<Vec<CanvasCourse>> {
        let url = format!("{}/courses", self.api_root);
        self.get_paginated(token, &url, &[("enrollment_state", "active")]).await
    }

    #[instrument(skip(self, token))]
    pub async fn course_assignments(
        &self,
        token: &AccessToken,
        course_id: &str,
    ) -> Result<Vec<CanvasAssignment>> {
        let url = format!("{}/courses/{}/assignments", self.api_root, course_id);
        self.get_paginated(token, &url, &[]).await
    }

    /// Assignments across every active course, stamped with course name and
    /// code.
    ///
    /// A course whose listing fails contributes nothing and is logged; an
    /// auth failure aborts the whole call since the token itself is bad.
    pub async fn all_assignments(&self, token: &AccessToken) -> Result<Vec<CanvasAssignment>> {
        let courses = self.courses(token).await?;
        debug!(courses = courses.len(), "fetched canvas courses");

        let fetches = courses.iter().map(|course| async move {
            let course_id = course.id_string();
            match self.course_assignments(token, &course_id).await {
                Ok(assignments) => {
                    Ok(assignments.into_iter().map(|a| a.stamp(course)).collect::<Vec<_>>())
                }
                Err(err @ GoldfishError::Auth(_)) => Err(err),
                Err(err) => {
                    warn!(course_id = %course_id, error = %err, "skipping canvas course");
                    Ok(Vec::new())
                }
            }
        });

        let mut all = Vec::new();
        for result in join_all(fetches).await {
            all.extend(result?);
        }
        Ok(all)
    }

    /// Assignments due within `[now, now + window_days]`, soonest first.
    pub async fn upcoming_assignments(
        &self,
        token: &AccessToken,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<CanvasAssignment>> {
        let assignments = self.all_assignments(token).await?;
        Ok(filter_upcoming(assignments, now, window_days))
    }

    /// Profile of the token's owner, returned as-is.
    pub async fn profile(&self, token: &AccessToken) -> Result<Value> {
        let url = format!("{}/users/self/profile", self.api_root);
        self.http.get_json(self.http.get(url).bearer_auth(token.expose())).await
    }

    async fn get_paginated<T>(
        &self,
        token: &AccessToken,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let per_page = CANVAS_PAGE_SIZE.to_string();
        let first = self
            .http
            .get(url)
            .bearer_auth(token.expose())
            .query(query)
            .query(&[("per_page", per_page.as_str())]);

        let mut response = self.http.send_checked(first).await?;
        let mut items = Vec::new();
        loop {
            let next = next_link(response.headers());
            let page: Vec<T> = read_json(response).await?;
            items.extend(page);

            let Some(next) = next else {
                break;
            };
            if !same_origin(&self.api_root, &next) {
                warn!(api_root = %self.api_root, "not following canvas page link to another host");
                break;
            }
            response =
                self.http.send_checked(self.http.get(next).bearer_auth(token.expose())).await?;
        }
        Ok(items)
    }
}

/// Keep assignments due within the window and sort them by due date.
pub fn filter_upcoming(
    assignments: Vec<CanvasAssignment>,
    now: DateTime<Utc>,
    window_days: i64,
) -> Vec<CanvasAssignment> {
    let horizon = now + Duration::days(window_days);
    let mut upcoming: Vec<(DateTime<Utc>, CanvasAssignment)> = assignments
        .into_iter()
        .filter_map(|assignment| assignment.due().map(|due| (due, assignment)))
        .filter(|(due, _)| *due >= now && *due <= horizon)
        .collect();
    upcoming.sort_by_key(|(due, _)| *due);
    upcoming.into_iter().map(|(_, assignment)| assignment).collect()
}

/// Whether `candidate` shares scheme, host and port with `root`.
fn same_origin(root: &str, candidate: &str) -> bool {
    match (Url::parse(root), Url::parse(candidate)) {
        (Ok(root), Ok(candidate)) => root.origin() == candidate.origin(),
        _ => false,
    }
}

/// URL of the `rel="next"` entry of an RFC 5988 `Link` header.
fn next_link(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(LINK)?.to_str().ok()?;
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target.strip_prefix('<')?.strip_suffix('>').map(str::to_string)
    })
}
