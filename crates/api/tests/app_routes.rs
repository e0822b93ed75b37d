//! Sync, task, credential and note routes

mod support;

use std::time::Duration;

use axum::body::{Body, BodyDataStream};
use axum::http::{header, Request, StatusCode};
use futures::StreamExt;
use goldfish_domain::NewManualTask;
use serde_json::{json, Value};
use support::{get, json, TestApp};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_canvas(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/courses"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 10, "name": "Calculus", "course_code": "MATH-201" }
        ])))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/courses/10/assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Problem set", "due_at": "2099-01-10T23:59:00Z" },
            { "id": 2, "name": "Reading", "due_at": null }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn requests_without_user_id_are_rejected() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri(), None);

    let (status, body) = app.send(Request::get("/api/tasks").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing user id");
}

#[tokio::test]
async fn sync_with_saved_token_imports_tasks_once() {
    let server = MockServer::start().await;
    mount_canvas(&server).await;
    let app = TestApp::new(&server.uri(), None);

    let (status, _) =
        app.send(json("PUT", "/api/credentials/canvas", json!({ "token": "canvas-token" }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let request = json("POST", "/api/sync", json!({ "sources": ["canvas"] }));
    let (status, first) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["newPending"], 2);
    assert_eq!(first["results"][0]["source"], "canvas");

    let (_, second) = app.send(json("POST", "/api/sync", json!({ "sources": ["canvas"] }))).await;
    assert_eq!(second["newPending"], 0);

    let (status, tasks) = app.send(get("/api/tasks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tasks.as_array().unwrap().len(), 2);

    let (_, undated) = app.send(get("/api/tasks?view=undated")).await;
    assert_eq!(undated.as_array().unwrap().len(), 1);
    assert_eq!(undated[0]["title"], "Reading");
}

#[tokio::test]
async fn sync_without_credential_reports_need() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri(), None);

    let (status, summary) =
        app.send(json("POST", "/api/sync", json!({ "sources": ["ustep"] }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["results"][0]["source"], "ustep");
    assert_eq!(summary["results"][0]["status"], "needsCredential");

    let (_, credentials) = app.send(get("/api/credentials")).await;
    let ustep = credentials
        .as_array()
        .unwrap()
        .iter()
        .find(|entry| entry["source"] == "ustep")
        .unwrap()
        .clone();
    assert_eq!(ustep["needsCredential"], true);
    assert_eq!(ustep["state"], "absent");
}

#[tokio::test]
async fn manual_task_lifecycle() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri(), None);

    let (status, created) = app
        .send(json(
            "POST",
            "/api/tasks",
            json!({ "title": "Lab report", "courseName": "Biology", "dueDate": "2099-05-01T12:00:00Z" }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["source"], "manual");
    let id = created["id"].as_str().unwrap().to_string();

    let (status, updated) = app
        .send(json("PATCH", &format!("/api/tasks/{id}"), json!({ "status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "completed");

    let (_, archive) = app.send(get("/api/tasks?view=archive&window=week")).await;
    assert_eq!(archive.as_array().unwrap().len(), 1);

    let (_, groups) = app.send(get("/api/tasks/by-course")).await;
    assert_eq!(groups[0]["courseName"], "Biology");

    let delete = Request::delete(format!("/api/tasks/{id}"))
        .header("x-user-id", support::USER)
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(delete).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.send(get(&format!("/api/tasks/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn bulk_delete_counts_removed_tasks() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri(), None);
    let mut ids = Vec::new();
    for title in ["One", "Two"] {
        let (_, task) = app
            .send(json("POST", "/api/tasks", json!({ "title": title, "courseName": "Art" })))
            .await;
        ids.push(task["id"].clone());
    }
    ids.push(json!("missing"));

    let (status, body) =
        app.send(json("POST", "/api/tasks/bulk-delete", json!({ "ids": ids }))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "deleted": 2 }));
}

#[tokio::test]
async fn notes_round_trip() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri(), None);

    let (status, _) = app.send(get("/api/notes/bio-101")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, saved) = app
        .send(json(
            "PUT",
            "/api/notes/bio-101",
            json!({ "courseName": "Biology", "content": "Quiz on Friday" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["content"], "Quiz on Friday");

    let (_, notes) = app.send(get("/api/notes")).await;
    assert_eq!(notes.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_credential_source_is_bad_request() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri(), None);

    let (status, _) =
        app.send(json("PUT", "/api/credentials/manual", json!({ "token": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        app.send(json("PUT", "/api/credentials/blackboard", json!({ "token": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

/// Reads named events off an open `text/event-stream` body.
struct EventReader {
    body: BodyDataStream,
    buffer: String,
}

impl EventReader {
    async fn open(app: &TestApp) -> Self {
        let response = app.router.clone().oneshot(get("/api/tasks/events")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");
        Self { body: response.into_body().into_data_stream(), buffer: String::new() }
    }

    async fn next_event(&mut self) -> (String, Value) {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                let mut name = String::new();
                let mut data = String::new();
                for line in frame.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        name = value.trim().to_string();
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push_str(value.trim());
                    }
                }
                // Keep-alive comments carry no event name.
                if name.is_empty() {
                    continue;
                }
                return (name, serde_json::from_str(&data).unwrap());
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), self.body.next())
                .await
                .expect("event should arrive in time")
                .expect("stream should stay open")
                .unwrap();
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }
}

#[tokio::test]
async fn event_stream_delivers_own_sync_inserts_only() {
    let server = MockServer::start().await;
    mount_canvas(&server).await;
    let app = TestApp::new(&server.uri(), None);
    app.send(json("PUT", "/api/credentials/canvas", json!({ "token": "canvas-token" }))).await;

    let mut events = EventReader::open(&app).await;

    let foreign = Request::post("/api/tasks")
        .header("x-user-id", "student-2")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "title": "Not mine", "courseName": "History" }).to_string()))
        .unwrap();
    let (status, _) = app.send(foreign).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app.send(json("POST", "/api/sync", json!({ "sources": ["canvas"] }))).await;
    assert_eq!(status, StatusCode::OK);

    let mut titles = Vec::new();
    for _ in 0..2 {
        let (name, data) = events.next_event().await;
        assert_eq!(name, "inserted");
        assert_eq!(data["kind"], "inserted");
        assert_eq!(data["task"]["userId"], support::USER);
        assert_eq!(data["task"]["source"], "canvas");
        titles.push(data["task"]["title"].as_str().unwrap().to_string());
    }
    titles.sort();
    assert_eq!(titles, ["Problem set", "Reading"]);
}

#[tokio::test]
async fn lagging_event_stream_is_told_to_resync() {
    let server = MockServer::start().await;
    let app = TestApp::new(&server.uri(), None);

    let mut events = EventReader::open(&app).await;

    // More changes than the channel holds, before the stream is read.
    for n in 0..300 {
        let input = NewManualTask {
            title: format!("Task {n}"),
            course_name: "Biology".into(),
            course_code: None,
            due_date: None,
            description: String::new(),
            original_link: None,
        };
        app.ctx.tasks.create_manual(support::USER, input).await.unwrap();
    }

    let (name, data) = events.next_event().await;
    assert_eq!(name, "resync");
    assert!(data["skipped"].as_u64().unwrap() > 0);

    let (name, data) = events.next_event().await;
    assert_eq!(name, "inserted");
    assert_eq!(data["task"]["userId"], support::USER);
}
