use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use goldfish_api::{router, AppContext};
use goldfish_domain::{
    CanvasConfig, ClassroomConfig, Config, DatabaseConfig, PortalConfig, ServerConfig, SyncConfig,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub const USER: &str = "student-1";

/// Router over a fresh database, pointing every upstream at `upstream`.
pub struct TestApp {
    pub router: Router,
    pub ctx: Arc<AppContext>,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn new(upstream: &str, canvas_token: Option<&str>) -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let config = Config {
            database: DatabaseConfig {
                path: temp_dir.path().join("goldfish.db").display().to_string(),
                pool_size: 2,
            },
            server: ServerConfig::default(),
            canvas: CanvasConfig {
                base_url: upstream.to_string(),
                api_token: canvas_token.map(str::to_string),
            },
            classroom: ClassroomConfig { base_url: upstream.to_string() },
            portal: PortalConfig { base_url: upstream.to_string(), service: "moodle_mobile_app".into() },
            sync: SyncConfig::default(),
        };
        let ctx = Arc::new(AppContext::new(config).expect("context should build"));
        Self { router: router(Arc::clone(&ctx)), ctx, _temp_dir: temp_dir }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, body)
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).header("x-user-id", USER).body(Body::empty()).unwrap()
}

pub fn json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", USER)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
