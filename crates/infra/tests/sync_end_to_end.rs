//! Full sync runs against mocked upstreams and a real SQLite store.

mod support;

use std::sync::Arc;

use goldfish_core::{
    CredentialRepository, CredentialStore, SourceAdapter, SyncOrchestrator, TaskRepository,
};
use goldfish_domain::{
    AccessToken, Source, SourceStatus, StoredCredential, SyncOptions, TaskStatus,
};
use goldfish_infra::canvas::{CanvasAdapter, CanvasClient};
use goldfish_infra::database::{SqliteCredentialRepository, SqliteTaskRepository};
use goldfish_infra::http::HttpClient;
use goldfish_infra::portal::{PortalAdapter, PortalClient};
use serde_json::json;
use support::TestDatabase;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER: &str = "student-1";

struct Harness {
    _db: TestDatabase,
    orchestrator: SyncOrchestrator,
    tasks: Arc<SqliteTaskRepository>,
    credentials: Arc<SqliteCredentialRepository>,
    store: Arc<CredentialStore>,
}

fn harness(canvas: &MockServer, portal: &MockServer) -> Harness {
    let db = TestDatabase::new();
    let tasks = Arc::new(SqliteTaskRepository::new(db.manager.clone()));
    let credentials = Arc::new(SqliteCredentialRepository::new(db.manager.clone()));
    let store = Arc::new(CredentialStore::new(credentials.clone()));
    let http = HttpClient::new().unwrap();

    let adapters: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(CanvasAdapter::new(CanvasClient::new(http.clone(), &canvas.uri()))),
        Arc::new(PortalAdapter::new(PortalClient::new(http, &portal.uri(), "moodle_mobile_app"))),
    ];
    let orchestrator = SyncOrchestrator::new(adapters, store.clone(), tasks.clone());
    Harness { _db: db, orchestrator, tasks, credentials, store }
}

async fn mount_canvas(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .and(header("authorization", "Bearer canvas-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 10, "name": "Calculus", "course_code": "MATH-201" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/10/assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "name": "Problem set 1",
                "description": "<p>Chapters 1-2</p>",
                "due_at": "2030-01-10T23:59:00Z",
                "html_url": "https://canvas.example/courses/10/assignments/1"
            },
            { "id": 2, "name": "Reading", "due_at": null }
        ])))
        .mount(server)
        .await;
}

async fn mount_portal(server: &MockServer) {
    let ws = |function: &str| {
        Mock::given(method("GET"))
            .and(path("/webservice/rest/server.php"))
            .and(query_param("wsfunction", function))
    };
    ws("core_webservice_get_site_info")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "userid": 7 })))
        .mount(server)
        .await;
    ws("core_enrol_get_users_courses")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 3, "shortname": "IT101", "fullname": "Intro to IT" }
        ])))
        .mount(server)
        .await;
    ws("mod_assign_get_assignments")
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "courses": [{
                "id": 3,
                "fullname": "Intro to IT",
                "assignments": [
                    { "id": 900, "cmid": 31, "name": "Lab 1", "duedate": 1_000_000_000 }
                ]
            }]
        })))
        .mount(server)
        .await;
}

async fn seed_tokens(h: &Harness) {
    h.store.save(USER, Source::Canvas, AccessToken::new("canvas-token").unwrap()).await.unwrap();
    h.store.save(USER, Source::Ustep, AccessToken::new("ws-token").unwrap()).await.unwrap();
}

#[tokio::test]
async fn resync_is_idempotent_and_keeps_user_status() {
    let canvas = MockServer::start().await;
    let portal = MockServer::start().await;
    mount_canvas(&canvas).await;
    mount_portal(&portal).await;
    let h = harness(&canvas, &portal);
    seed_tokens(&h).await;
    let options = SyncOptions::only([Source::Canvas, Source::Ustep]);

    let first = h.orchestrator.sync(USER, &options).await.unwrap();
    assert_eq!(first.report.totals.inserted, 3);

    let tasks = h.tasks.list_tasks(USER).await.unwrap();
    let lab = tasks.iter().find(|t| t.source == Source::Ustep).unwrap();
    assert_eq!(lab.status, TaskStatus::Overdue);
    assert_eq!(lab.course_code.as_deref(), Some("IT101"));
    assert_eq!(
        lab.original_link.as_deref(),
        Some(format!("{}/mod/assign/view.php?id=31", portal.uri()).as_str())
    );
    let set = tasks.iter().find(|t| t.source_id.as_deref() == Some("1")).unwrap();
    assert_eq!(set.course_name, "Calculus");
    assert_eq!(set.description, "Chapters 1-2");
    h.tasks
        .update_status(USER, &set.id, TaskStatus::Completed, chrono::Utc::now())
        .await
        .unwrap();

    let second = h.orchestrator.sync(USER, &options).await.unwrap();
    assert_eq!(second.report.totals.inserted, 0);
    assert_eq!(second.report.totals.already_present, 3);

    let tasks = h.tasks.list_tasks(USER).await.unwrap();
    assert_eq!(tasks.len(), 3);
    let set = tasks.iter().find(|t| t.source_id.as_deref() == Some("1")).unwrap();
    assert_eq!(set.status, TaskStatus::Completed);
}

#[tokio::test]
async fn rejected_portal_token_is_tombstoned_while_canvas_syncs() {
    let canvas = MockServer::start().await;
    let portal = MockServer::start().await;
    mount_canvas(&canvas).await;
    Mock::given(method("GET"))
        .and(path("/webservice/rest/server.php"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "exception": "moodle_exception",
            "errorcode": "invalidtoken",
            "message": "Invalid token - token not found"
        })))
        .mount(&portal)
        .await;
    let h = harness(&canvas, &portal);
    seed_tokens(&h).await;

    let summary =
        h.orchestrator.sync(USER, &SyncOptions::only([Source::Canvas, Source::Ustep])).await.unwrap();

    assert!(matches!(summary.status_of(Source::Canvas), Some(SourceStatus::Synced { .. })));
    assert_eq!(summary.status_of(Source::Ustep), Some(&SourceStatus::NeedsCredential));
    assert_eq!(
        h.credentials.load(USER, Source::Ustep).await.unwrap(),
        StoredCredential::Invalidated
    );
    assert_eq!(h.tasks.list_tasks(USER).await.unwrap().len(), 2);
}

#[tokio::test]
async fn canvas_outage_is_reported_per_source() {
    let canvas = MockServer::start().await;
    let portal = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&canvas)
        .await;
    mount_portal(&portal).await;
    let h = harness(&canvas, &portal);
    seed_tokens(&h).await;

    let summary =
        h.orchestrator.sync(USER, &SyncOptions::only([Source::Canvas, Source::Ustep])).await.unwrap();

    match summary.status_of(Source::Canvas) {
        Some(SourceStatus::Failed { message }) => assert!(message.contains("503")),
        other => panic!("expected failed canvas sync, got {other:?}"),
    }
    assert!(matches!(summary.status_of(Source::Ustep), Some(SourceStatus::Synced { .. })));
    assert!(matches!(
        h.credentials.load(USER, Source::Canvas).await.unwrap(),
        StoredCredential::Valid(_)
    ));
}
