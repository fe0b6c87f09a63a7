//! Commands driven through the HTTP gateway against a mock backend

use crm_kanban::{
    board::LoadBoard,
    task::{AddTask, MoveTask},
    BoardContext, ColumnId, Execute, GatewayError, HttpGateway, KanbanError, TaskId,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn context(server: &MockServer) -> BoardContext {
    let gateway = HttpGateway::new(server.uri(), Duration::from_secs(2)).unwrap();
    BoardContext::new(Arc::new(gateway))
}

#[tokio::test]
async fn test_load_then_move() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Call Acme", "status": "todo", "priority": "High", "tags": "sales"},
            {"id": 2, "title": "Demo", "status": "pending", "priority": null, "tags": null},
            {"id": 3, "title": "Follow up", "status": "qa", "dueDate": "2024-06-01"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/tasks/move/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Task moved successfully",
            "taskId": "1",
            "status": "qa"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server).await;
    let loaded = LoadBoard::new().execute(&ctx).await.into_result().unwrap();
    assert_eq!(loaded["tasks"], 3);
    assert_eq!(loaded["columns_created"], json!(["qa"]));

    MoveTask::new("1", "todo", "qa").execute(&ctx).await.into_result().unwrap();

    let store = ctx.read_store().await;
    let qa: Vec<&str> = store
        .column(&ColumnId::from("qa"))
        .unwrap()
        .task_ids
        .iter()
        .map(TaskId::as_str)
        .collect();
    assert_eq!(qa, vec!["3", "1"]);
    assert_eq!(store.task(&TaskId::from("2")).unwrap().status, ColumnId::todo());
    store.check_invariants().unwrap();
}

#[tokio::test]
async fn test_add_task_posts_camel_case() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/tasks/post"))
        .and(body_partial_json(json!({
            "title": "Renewal",
            "assignedTo": "ana",
            "status": "todo",
            "tags": ["renewal"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Task created successfully",
            "task": {
                "id": 12,
                "title": "Renewal",
                "assignedTo": "ana",
                "status": "todo",
                "tags": "renewal",
                "priority": "medium"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = context(&server).await;
    let task = AddTask::new("Renewal")
        .with_assigned_to("ana")
        .with_tags(["renewal"])
        .execute(&ctx)
        .await
        .into_result()
        .unwrap();

    assert_eq!(task["id"], "12");
    assert_eq!(task["tags"], json!(["renewal"]));
    assert!(ctx.read_store().await.contains_task(&TaskId::from("12")));
}

#[tokio::test]
async fn test_backend_error_leaves_store_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "title": "Call Acme", "status": "todo"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/tasks/move/1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "Failed to move task"})),
        )
        .mount(&server)
        .await;

    let ctx = context(&server).await;
    LoadBoard::new().execute(&ctx).await.into_result().unwrap();

    let err = MoveTask::to_column("1", "done")
        .execute(&ctx)
        .await
        .into_result()
        .unwrap_err();
    match err {
        KanbanError::Persistence(GatewayError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to move task");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        ctx.read_store().await.task(&TaskId::from("1")).unwrap().status,
        ColumnId::todo()
    );
}
