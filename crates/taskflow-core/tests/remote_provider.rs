//! RemoteProvider against a mocked HTTP API.
//!
//! Covers request shapes (method, path, query, body) and the mapping of
//! response envelopes and status codes onto `ProviderError`.

use mockito::{Matcher, Server};
use serde_json::json;
use taskflow_core::provider::{Provider, ProviderError, RemoteProvider, DEFAULT_TIMEOUT};
use taskflow_core::{ClockTime, EntityKind, EventPatch, NewEvent, NewTask, TaskPatch, TaskStatus};

fn task_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "description": "",
        "assignee": null,
        "status": "todo",
        "priority": "medium",
        "deadline": null,
        "createdAt": "2024-03-01 08:00:00",
        "updatedAt": "2024-03-01 08:00:00"
    })
}

async fn provider(server: &Server) -> RemoteProvider {
    RemoteProvider::new(&server.url(), DEFAULT_TIMEOUT).unwrap()
}

#[tokio::test]
async fn list_tasks_parses_array() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/tasks")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([task_json("t-1", "One"), task_json("t-2", "Two")]).to_string())
        .create_async()
        .await;

    let tasks = provider(&server).await.list_tasks().await.unwrap();
    mock.assert_async().await;
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].assignee, "");
    assert_eq!(tasks[1].title, "Two");
}

#[tokio::test]
async fn list_events_maps_sql_shapes() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/events")
        .with_status(200)
        .with_body(
            json!([{
                "id": "e-1",
                "title": "Standup",
                "description": "",
                "date": "2024-03-15",
                "startTime": "09:00:00",
                "endTime": "09:15:00",
                "location": "",
                "color": "hsl(260, 70%, 55%)",
                "reminder": "none",
                "createdAt": "2024-03-01 08:00:00",
                "updatedAt": "2024-03-01 08:00:00"
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let events = provider(&server).await.list_events().await.unwrap();
    assert_eq!(events[0].start_time, ClockTime::from_hm(9, 0));
    assert_eq!(events[0].end_time, ClockTime::from_hm(9, 15));
}

#[tokio::test]
async fn create_task_posts_fields_and_unwraps_envelope() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/tasks")
        .match_body(Matcher::PartialJson(json!({"id": "t-9", "title": "Plan", "priority": "high"})))
        .with_status(201)
        .with_body(json!({"success": true, "task": task_json("t-9", "Plan")}).to_string())
        .create_async()
        .await;

    let mut input = NewTask::new("Plan").with_priority(taskflow_core::TaskPriority::High);
    input.id = Some("t-9".into());
    let task = provider(&server).await.create_task(&input).await.unwrap();
    mock.assert_async().await;
    assert_eq!(task.id, "t-9");
}

#[tokio::test]
async fn update_puts_id_with_patch_fields() {
    let mut server = Server::new_async().await;
    let mut updated = task_json("t-1", "One");
    updated["status"] = json!("completed");
    let mock = server
        .mock("PUT", "/tasks")
        .match_body(Matcher::Json(json!({"id": "t-1", "status": "completed"})))
        .with_status(200)
        .with_body(json!({"success": true, "task": updated}).to_string())
        .create_async()
        .await;

    let task = provider(&server)
        .await
        .update_task("t-1", &TaskPatch::status(TaskStatus::Completed))
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(task.status, TaskStatus::Completed);
}

#[tokio::test]
async fn update_clearing_times_sends_nulls() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/events")
        .match_body(Matcher::Json(json!({"id": "e-1", "startTime": null, "endTime": null})))
        .with_status(404)
        .with_body(json!({"success": false, "message": "Event not found"}).to_string())
        .create_async()
        .await;

    let patch = EventPatch {
        start_time: Some(None),
        end_time: Some(None),
        ..Default::default()
    };
    let err = provider(&server).await.update_event("e-1", &patch).await.unwrap_err();
    mock.assert_async().await;
    assert!(matches!(err, ProviderError::NotFound { entity: EntityKind::Event, .. }));
}

#[tokio::test]
async fn delete_sends_id_as_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/events")
        .match_query(Matcher::UrlEncoded("id".into(), "e-7".into()))
        .with_status(200)
        .with_body(json!({"success": true, "message": "Event deleted"}).to_string())
        .create_async()
        .await;

    provider(&server).await.delete_event("e-7").await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_unknown_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/tasks")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(json!({"success": false, "message": "Task not found"}).to_string())
        .create_async()
        .await;

    let err = provider(&server).await.delete_task("nope").await.unwrap_err();
    assert!(matches!(err, ProviderError::NotFound { entity: EntityKind::Task, ref id } if id == "nope"));
}

#[tokio::test]
async fn server_errors_carry_their_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/events")
        .with_status(400)
        .with_body(json!({"success": false, "message": "Title and Date are required"}).to_string())
        .create_async()
        .await;

    let input = NewEvent::new("x", chrono::NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    match provider(&server).await.create_event(&input).await {
        Err(ProviderError::Status { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Title and Date are required");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn success_false_with_ok_status_is_rejected() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/tasks")
        .with_status(200)
        .with_body(json!({"success": false, "message": "Failed to create task"}).to_string())
        .create_async()
        .await;

    let err = provider(&server)
        .await
        .create_task(&NewTask::new("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Rejected(ref m) if m == "Failed to create task"));
}

#[tokio::test]
async fn malformed_json_is_reported() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/tasks")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let err = provider(&server).await.list_tasks().await.unwrap_err();
    assert!(matches!(err, ProviderError::Malformed(_)));

    let core: taskflow_core::CoreError = err.into();
    assert!(matches!(core, taskflow_core::CoreError::Transport(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    let provider = RemoteProvider::new("http://127.0.0.1:9/", std::time::Duration::from_secs(2)).unwrap();
    let err = provider.list_events().await.unwrap_err();
    assert!(matches!(err, ProviderError::Network(_)));
}
