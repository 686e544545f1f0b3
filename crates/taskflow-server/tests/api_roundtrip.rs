//! The API served on a free port, driven by `RemoteProvider` and raw HTTP.

use chrono::NaiveDate;
use serde_json::{json, Value};
use taskflow_core::provider::{Provider, ProviderError, RemoteProvider, DEFAULT_TIMEOUT};
use taskflow_core::{
    ClockTime, Database, EntityKind, EventPatch, NewEvent, NewTask, TaskPatch, TaskPriority,
    TaskStatus,
};
use taskflow_server::ApiServer;

async fn serve() -> ApiServer {
    ApiServer::start(Database::open_memory().unwrap(), "127.0.0.1:0")
        .await
        .unwrap()
}

fn client(server: &ApiServer) -> RemoteProvider {
    RemoteProvider::new(&server.base_url(), DEFAULT_TIMEOUT).unwrap()
}

fn at(s: &str) -> ClockTime {
    s.parse().unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

#[tokio::test]
async fn task_lifecycle_through_remote_provider() {
    let server = serve().await;
    let api = client(&server);

    let mut input = NewTask::new("Write report").with_priority(TaskPriority::High);
    input.id = Some("t-1".into());
    let created = api.create_task(&input).await.unwrap();
    assert_eq!(created.id, "t-1");
    assert_eq!(created.status, TaskStatus::Todo);

    let updated = api
        .update_task("t-1", &TaskPatch::status(TaskStatus::Completed))
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::Completed);
    assert_eq!(updated.title, "Write report");

    assert_eq!(api.list_tasks().await.unwrap(), vec![updated]);

    api.delete_task("t-1").await.unwrap();
    assert!(api.list_tasks().await.unwrap().is_empty());

    let err = api.delete_task("t-1").await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { entity: EntityKind::Task, .. }));
}

#[tokio::test]
async fn event_times_can_be_cleared() {
    let server = serve().await;
    let api = client(&server);

    let event = api
        .create_event(&NewEvent::new("Review", day()).with_times(at("14:00"), at("15:00")))
        .await
        .unwrap();
    assert_eq!(event.start_time, Some(at("14:00")));

    let patch = EventPatch {
        start_time: Some(None),
        end_time: Some(None),
        ..Default::default()
    };
    let cleared = api.update_event(&event.id, &patch).await.unwrap();
    assert_eq!(cleared.start_time, None);
    assert_eq!(cleared.end_time, None);
    assert_eq!(cleared.date, day());
}

#[tokio::test]
async fn inverted_event_update_is_rejected() {
    let server = serve().await;
    let api = client(&server);
    let event = api
        .create_event(&NewEvent::new("Lunch", day()).with_times(at("12:00"), at("13:00")))
        .await
        .unwrap();

    let patch = EventPatch {
        end_time: Some(Some(at("11:00"))),
        ..Default::default()
    };
    let err = api.update_event(&event.id, &patch).await.unwrap_err();
    assert!(matches!(err, ProviderError::Status { status: 400, .. }));
}

#[tokio::test]
async fn missing_fields_yield_400_envelopes() {
    let server = serve().await;
    let http = reqwest::Client::new();
    let url = |path: &str| format!("{}{path}", server.base_url());

    let res = http.post(url("tasks")).json(&json!({"title": "  "})).send().await.unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "message": "Title is required"}));

    let res = http.post(url("events")).json(&json!({"title": "No date"})).send().await.unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Title and Date are required");

    let res = http.put(url("tasks")).json(&json!({"title": "x"})).send().await.unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "ID is required");

    let res = http.delete(url("events")).send().await.unwrap();
    assert_eq!(res.status(), 400);

    let res = http.post(url("tasks")).body("{not json").send().await.unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn empty_patch_and_unknown_id() {
    let server = serve().await;
    let http = reqwest::Client::new();
    let url = format!("{}tasks", server.base_url());

    let res = http.put(&url).json(&json!({"id": "ghost"})).send().await.unwrap();
    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "No fields to update");

    let res = http
        .put(&url)
        .json(&json!({"id": "ghost", "status": "completed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "message": "Task not found"}));
}

#[tokio::test]
async fn create_returns_201_with_envelope() {
    let server = serve().await;
    let res = reqwest::Client::new()
        .post(format!("{}events", server.base_url()))
        .json(&json!({"title": "Demo", "date": "2024-03-15", "startTime": "09:00"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["event"]["title"], "Demo");
    assert_eq!(body["event"]["color"], taskflow_core::DEFAULT_EVENT_COLOR);
}

#[tokio::test]
async fn delete_reports_message() {
    let server = serve().await;
    let api = client(&server);
    let task = api.create_task(&NewTask::new("Temp")).await.unwrap();

    let res = reqwest::Client::new()
        .delete(format!("{}tasks", server.base_url()))
        .query(&[("id", task.id.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "message": "Task deleted"}));
}

#[tokio::test]
async fn options_and_unsupported_methods() {
    let server = serve().await;
    let http = reqwest::Client::new();
    let url = format!("{}tasks", server.base_url());

    let res = http.request(reqwest::Method::OPTIONS, &url).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = http.patch(&url).send().await.unwrap();
    assert_eq!(res.status(), 405);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"success": false, "message": "Method not allowed"}));
}

#[tokio::test]
async fn responses_carry_cors_headers() {
    let server = serve().await;
    let res = reqwest::Client::new()
        .get(format!("{}events", server.base_url()))
        .header("Origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("access-control-allow-origin"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!([]));
}
