//! Moodle web service client for the USTeP portal
//!
//! Moodle answers most failures with HTTP 200 and an
//! `{exception, errorcode, message}` body. Token-related error codes are
//! reported as auth errors, everything else as an upstream error.

use goldfish_domain::{AccessToken, GoldfishError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::types::{
    AssignmentsResponse, EnrolledCourse, MoodleException, PortalAssignment, SiteInfo,
    TokenResponse,
};
use crate::http::HttpClient;

const REST_ENDPOINT: &str = "/webservice/rest/server.php";
const TOKEN_ENDPOINT: &str = "/login/token.php";

/// Moodle error codes meaning the token itself is unusable.
const AUTH_ERROR_CODES: [&str; 3] = ["invalidtoken", "accessexception", "requireloginerror"];

#[derive(Clone)]
pub struct PortalClient {
    http: HttpClient,
    base_url: String,
    service: String,
}

impl PortalClient {
    pub fn new(http: HttpClient, base_url: &str, service: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service: service.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange a username and password for a web service token.
    ///
    /// # Errors
    /// `GoldfishError::Auth` carrying Moodle's message when the login is
    /// rejected.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        let url = format!("{}{}", self.base_url, TOKEN_ENDPOINT);
        let request = self.http.get(url).query(&[
            ("username", username),
            ("password", password),
            ("service", self.service.as_str()),
        ]);
        let response: TokenResponse = self.http.get_json(request).await?;

        if let Some(error) = response.error {
            warn!(username, "portal login rejected");
            return Err(GoldfishError::Auth(error));
        }
        response
            .token
            .and_then(AccessToken::new)
            .ok_or_else(|| GoldfishError::Auth("portal returned no token".into()))
    }

    /// Every assignment across the user's enrolled courses, stamped with
    /// `course_name` and `course_code`.
    #[instrument(skip(self, token))]
    pub async fn assignments(&self, token: &AccessToken) -> Result<Vec<PortalAssignment>> {
        let site: SiteInfo = self.call(token, "core_webservice_get_site_info", &[]).await?;
        let userid = site.userid.to_string();

        let courses: Vec<EnrolledCourse> = self
            .call(token, "core_enrol_get_users_courses", &[("userid".to_string(), userid)])
            .await?;
        debug!(courses = courses.len(), "fetched portal courses");
        if courses.is_empty() {
            return Ok(Vec::new());
        }

        let course_params: Vec<(String, String)> = courses
            .iter()
            .enumerate()
            .map(|(i, course)| (format!("courseids[{i}]"), course.id.to_string()))
            .collect();
        let response: AssignmentsResponse =
            self.call(token, "mod_assign_get_assignments", &course_params).await?;

        let mut assignments = Vec::new();
        for group in response.courses {
            let code = courses
                .iter()
                .find(|course| course.id == group.id)
                .and_then(|course| course.shortname.clone())
                .or_else(|| group.shortname.clone());
            for mut assignment in group.assignments {
                assignment.course_name = group.fullname.clone();
                assignment.course_code = code.clone();
                assignments.push(assignment);
            }
        }
        Ok(assignments)
    }

    async fn call<T>(
        &self,
        token: &AccessToken,
        function: &str,
        params: &[(String, String)],
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, REST_ENDPOINT);
        let request = self
            .http
            .get(url)
            .query(&[
                ("wstoken", token.expose()),
                ("wsfunction", function),
                ("moodlewsrestformat", "json"),
            ])
            .query(params);

        let body: Value = self.http.get_json(request).await?;
        if let Some(exception) = MoodleException::detect(&body) {
            return Err(exception_error(function, &exception));
        }
        serde_json::from_value(body).map_err(|err| {
            GoldfishError::Network(format!("malformed {function} response: {err}"))
        })
    }
}

fn exception_error(function: &str, exception: &MoodleException) -> GoldfishError {
    let message = format!("{function}: {}", exception.describe());
    let is_auth = exception
        .errorcode
        .as_deref()
        .is_some_and(|code| AUTH_ERROR_CODES.contains(&code));
    if is_auth {
        GoldfishError::Auth(message)
    } else {
        // Moodle reports these with HTTP 200; surface them as a bad gateway.
        GoldfishError::upstream(502, message)
    }
}
