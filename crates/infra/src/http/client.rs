use std::time::Duration;

use goldfish_domain::{GoldfishError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::InfraError;

/// Longest upstream error body kept in an error message.
const ERROR_BODY_LIMIT: usize = 512;

/// HTTP client shared by every upstream adapter.
///
/// Each request is attempted once; failures surface to the caller, which
/// decides whether they are fatal for the whole sync or for one item.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Shorthand for a GET request.
    pub fn get<U>(&self, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.request(Method::GET, url)
    }

    /// Execute the request and return the raw response, whatever its status.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(|err| GoldfishError::from(InfraError::from(err)))?;

        let method = request.method().clone();
        let url = redacted(request.url());
        debug!(%method, %url, "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, %url, status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, %url, error = %err, "HTTP request failed");
                Err(InfraError::from(err).into())
            }
        }
    }

    /// Execute the request and fail on any non-success status.
    ///
    /// 401 and 403 become [`GoldfishError::Auth`]; every other failure
    /// status becomes [`GoldfishError::Upstream`] carrying the status code
    /// and the start of the response body.
    pub async fn send_checked(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    /// Execute the request and decode a JSON body.
    pub async fn get_json<T>(&self, builder: RequestBuilder) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send_checked(builder).await?;
        read_json(response).await
    }
}

/// Decode a JSON response body.
pub async fn read_json<T>(response: Response) -> Result<T>
where
    T: DeserializeOwned,
{
    response.json::<T>().await.map_err(|err| GoldfishError::from(InfraError::from(err)))
}

fn status_error(status: StatusCode, body: &str) -> GoldfishError {
    let reason = status.canonical_reason().unwrap_or("unknown status");
    let detail: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
    let message = if detail.is_empty() {
        format!("HTTP {} {}", status.as_u16(), reason)
    } else {
        format!("HTTP {} {}: {}", status.as_u16(), reason, detail)
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GoldfishError::Auth(message),
        _ => GoldfishError::upstream(status.as_u16(), message),
    }
}

/// Strip query parameters, which may carry tokens, before logging a URL.
fn redacted(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: Some(concat!("goldfish/", env!("CARGO_PKG_VERSION")).to_string()),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    /// Overall per-request deadline. Unset means the transport default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().no_proxy();

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder.build().map_err(|err| GoldfishError::from(InfraError::from(err)))?;

        Ok(HttpClient { client })
    }
}
