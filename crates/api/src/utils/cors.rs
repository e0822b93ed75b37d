//! CORS policy for the browser client

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::extract::USER_ID_HEADER;

const DEV_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://127.0.0.1:5173"];

/// Whether a browser origin may call the API.
///
/// Allows the local dev server, any `*.vercel.app` deployment and the
/// configured extra origins.
pub fn origin_allowed(origin: &str, extra: &[String]) -> bool {
    if DEV_ORIGINS.contains(&origin) || extra.iter().any(|allowed| allowed == origin) {
        return true;
    }
    origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))
        .and_then(|host| host.strip_suffix(".vercel.app"))
        .is_some_and(|name| !name.is_empty() && !name.contains('/'))
}

pub fn cors_layer(extra_origins: Vec<String>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin.to_str().is_ok_and(|origin| origin_allowed(origin, &extra_origins))
        }))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, HeaderName::from_static(USER_ID_HEADER)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_dev_and_vercel_origins() {
        assert!(origin_allowed("http://localhost:5173", &[]));
        assert!(origin_allowed("http://127.0.0.1:5173", &[]));
        assert!(origin_allowed("https://goldfish-git-main.vercel.app", &[]));
    }

    #[test]
    fn rejects_lookalikes() {
        assert!(!origin_allowed("http://localhost:3000", &[]));
        assert!(!origin_allowed("https://.vercel.app", &[]));
        assert!(!origin_allowed("https://evil.com/x.vercel.app", &[]));
        assert!(!origin_allowed("https://vercel.app.evil.com", &[]));
    }

    #[test]
    fn honours_configured_origins() {
        let extra = vec!["https://goldfish.example".to_string()];
        assert!(origin_allowed("https://goldfish.example", &extra));
    }
}
