//! Integration tests for the REST mutation surface.
//!
//! Exercises the handlers against the in-memory store and a failing store
//! double:
//! - field validation rejects before persistence
//! - identifier immutability under patch
//! - idempotent user registration
//! - read-your-own-write visibility after each mutation
//! - the broadcast is gated on persistence success

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use syncboard_proto::task::{NewTask, ReorderEntry, ReorderRequest, Task, TaskId, TaskPatch};
use syncboard_proto::user::{NewUser, User};
use syncboard_server::handlers;
use syncboard_server::server::AppState;
use syncboard_server::store::{
    MemoryStore, NewTaskRecord, PositionUpdate, StoreError, TaskStore,
};

fn new_state() -> Arc<AppState<MemoryStore>> {
    Arc::new(AppState::new(MemoryStore::new()))
}

fn new_task(title: &str) -> NewTask {
    NewTask {
        title: Some(title.to_string()),
        description: None,
        category: None,
    }
}

async fn create(state: &Arc<AppState<MemoryStore>>, body: NewTask) -> StatusCode {
    match handlers::create_task(State(Arc::clone(state)), Json(body)).await {
        Ok(resp) => resp.status(),
        Err(e) => e.into_response().status(),
    }
}

async fn list(state: &Arc<AppState<MemoryStore>>) -> Vec<Task> {
    let Json(tasks) = handlers::list_tasks(State(Arc::clone(state))).await.unwrap();
    tasks
}

// --- Create ---

#[tokio::test]
async fn scenario_a_create_lands_in_default_lane_with_numeric_position() {
    let state = new_state();

    let status = create(&state, new_task("Buy milk")).await;
    assert_eq!(status, StatusCode::CREATED);

    // The mutation's own success is immediately visible to a reader.
    let tasks = list(&state).await;
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].category, "To-Do");
    assert!(tasks[0].position > 0.0);
    assert!(tasks[0].created_at > 0);
}

#[tokio::test]
async fn scenario_b_oversized_title_rejected_and_nothing_persisted() {
    let state = new_state();
    create(&state, new_task("valid")).await;

    let status = create(&state, new_task(&"a".repeat(51))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(list(&state).await.len(), 1);
}

#[tokio::test]
async fn empty_and_missing_titles_rejected() {
    let state = new_state();

    assert_eq!(create(&state, new_task("")).await, StatusCode::BAD_REQUEST);
    assert_eq!(
        create(&state, NewTask::default()).await,
        StatusCode::BAD_REQUEST
    );
    assert!(list(&state).await.is_empty());
}

#[tokio::test]
async fn oversized_description_rejected() {
    let state = new_state();
    let body = NewTask {
        title: Some("fine".to_string()),
        description: Some("d".repeat(201)),
        category: None,
    };
    assert_eq!(create(&state, body).await, StatusCode::BAD_REQUEST);
    assert!(list(&state).await.is_empty());
}

#[tokio::test]
async fn create_honors_explicit_category() {
    let state = new_state();
    let body = NewTask {
        title: Some("review".to_string()),
        description: None,
        category: Some("In Progress".to_string()),
    };
    assert_eq!(create(&state, body).await, StatusCode::CREATED);
    assert_eq!(list(&state).await[0].category, "In Progress");
}

// --- Update ---

#[tokio::test]
async fn update_patches_fields_and_is_visible() {
    let state = new_state();
    create(&state, new_task("old title")).await;
    let id = list(&state).await[0].id;

    let patch = TaskPatch {
        title: Some("new title".to_string()),
        ..TaskPatch::default()
    };
    handlers::update_task(State(Arc::clone(&state)), Path(id.to_string()), Json(patch))
        .await
        .unwrap();

    let tasks = list(&state).await;
    assert_eq!(tasks[0].title, "new title");
}

#[tokio::test]
async fn p2_client_supplied_id_in_patch_body_is_ignored() {
    let state = new_state();
    create(&state, new_task("keep my id")).await;
    let original_id = list(&state).await[0].id;

    // A patch body smuggling both `_id` and `id` alongside a real change.
    let body = format!(
        r#"{{"_id":"{}","id":"{}","title":"renamed"}}"#,
        TaskId::new(),
        TaskId::new()
    );
    let patch: TaskPatch = serde_json::from_str(&body).unwrap();
    handlers::update_task(
        State(Arc::clone(&state)),
        Path(original_id.to_string()),
        Json(patch),
    )
    .await
    .unwrap();

    let tasks = list(&state).await;
    assert_eq!(tasks[0].id, original_id);
    assert_eq!(tasks[0].title, "renamed");
}

#[tokio::test]
async fn update_malformed_id_is_400() {
    let state = new_state();
    let err = handlers::update_task(
        State(Arc::clone(&state)),
        Path("not-an-id".to_string()),
        Json(TaskPatch::default()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_unknown_id_is_404() {
    let state = new_state();
    let err = handlers::update_task(
        State(Arc::clone(&state)),
        Path(TaskId::new().to_string()),
        Json(TaskPatch {
            title: Some("x".to_string()),
            ..TaskPatch::default()
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_with_no_effective_change_is_404() {
    let state = new_state();
    create(&state, new_task("same")).await;
    let id = list(&state).await[0].id;

    // Matching document already equals the patch — indistinguishable from
    // not-found, reported the same way.
    let err = handlers::update_task(
        State(Arc::clone(&state)),
        Path(id.to_string()),
        Json(TaskPatch {
            title: Some("same".to_string()),
            ..TaskPatch::default()
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

// --- Delete ---

#[tokio::test]
async fn delete_removes_task_and_is_visible() {
    let state = new_state();
    create(&state, new_task("to delete")).await;
    let id = list(&state).await[0].id;

    handlers::delete_task(State(Arc::clone(&state)), Path(id.to_string()))
        .await
        .unwrap();
    assert!(list(&state).await.is_empty());
}

#[tokio::test]
async fn scenario_d_delete_unknown_is_404_and_malformed_is_400() {
    let state = new_state();

    let err = handlers::delete_task(
        State(Arc::clone(&state)),
        Path(TaskId::new().to_string()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let err = handlers::delete_task(State(Arc::clone(&state)), Path("zzz".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

// --- Reorder ---

#[tokio::test]
async fn scenario_c_reorder_moves_both_tasks_in_one_batch() {
    let state = new_state();
    create(&state, new_task("first")).await;
    create(&state, new_task("second")).await;
    let tasks = list(&state).await;
    let (a, b) = (tasks[0].id, tasks[1].id);

    let req = ReorderRequest {
        updated_tasks: vec![
            ReorderEntry {
                id: a.to_string(),
                position: 2.0,
                category: "Done".to_string(),
            },
            ReorderEntry {
                id: b.to_string(),
                position: 1.0,
                category: "Done".to_string(),
            },
        ],
    };
    handlers::reorder_tasks(State(Arc::clone(&state)), Json(req))
        .await
        .unwrap();

    let tasks = list(&state).await;
    assert!(tasks.iter().all(|t| t.category == "Done"));
    // Delivery order follows the new positions: b (1.0) before a (2.0).
    assert_eq!(tasks[0].id, b);
    assert_eq!(tasks[1].id, a);
}

#[tokio::test]
async fn reorder_with_malformed_id_rejects_whole_batch_before_writes() {
    let state = new_state();
    create(&state, new_task("untouched")).await;
    let good = list(&state).await[0].id;

    let req = ReorderRequest {
        updated_tasks: vec![
            ReorderEntry {
                id: good.to_string(),
                position: 99.0,
                category: "Done".to_string(),
            },
            ReorderEntry {
                id: "###".to_string(),
                position: 1.0,
                category: "Done".to_string(),
            },
        ],
    };
    let err = handlers::reorder_tasks(State(Arc::clone(&state)), Json(req))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    // The valid entry was not applied either.
    let tasks = list(&state).await;
    assert_eq!(tasks[0].category, "To-Do");
}

// --- Users ---

#[tokio::test]
async fn p3_registration_is_idempotent() {
    let state = new_state();
    let body = NewUser {
        uid: Some("uid-1".to_string()),
        email: Some("a@example.com".to_string()),
        display_name: Some("Alice".to_string()),
        photo_url: None,
    };

    let first = handlers::register_user(State(Arc::clone(&state)), Json(body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = handlers::register_user(State(Arc::clone(&state)), Json(body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
}

#[tokio::test]
async fn registration_requires_uid_and_email() {
    let state = new_state();
    let err = handlers::register_user(
        State(Arc::clone(&state)),
        Json(NewUser {
            uid: Some("uid-1".to_string()),
            email: None,
            display_name: None,
            photo_url: None,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

// --- Storage failure gating ---

/// Store double whose every operation fails, standing in for a storage
/// collaborator outage.
struct FailingStore;

impl TaskStore for FailingStore {
    async fn insert_task(&self, _record: NewTaskRecord) -> Result<Task, StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn find_all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn update_task(&self, _id: &TaskId, _patch: TaskPatch) -> Result<u64, StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn delete_task(&self, _id: &TaskId) -> Result<u64, StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn reposition_tasks(&self, _updates: Vec<PositionUpdate>) -> Result<u64, StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn find_user(&self, _uid: &str) -> Result<Option<User>, StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }

    async fn insert_user(&self, _user: User) -> Result<(), StoreError> {
        Err(StoreError::Backend("connection reset".to_string()))
    }
}

#[tokio::test]
async fn storage_failure_surfaces_as_500_for_every_operation() {
    let state = Arc::new(AppState::new(FailingStore));

    let err = handlers::create_task(State(Arc::clone(&state)), Json(new_task("doomed")))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let err = handlers::update_task(
        State(Arc::clone(&state)),
        Path(TaskId::new().to_string()),
        Json(TaskPatch {
            title: Some("doomed".to_string()),
            ..TaskPatch::default()
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let err = handlers::delete_task(
        State(Arc::clone(&state)),
        Path(TaskId::new().to_string()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let err = handlers::reorder_tasks(
        State(Arc::clone(&state)),
        Json(ReorderRequest {
            updated_tasks: vec![ReorderEntry {
                id: TaskId::new().to_string(),
                position: 1.0,
                category: "Done".to_string(),
            }],
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let err = handlers::list_tasks(State(Arc::clone(&state)))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn failed_mutations_broadcast_nothing() {
    let state = Arc::new(AppState::new(FailingStore));

    // Attach a listener directly to the registry.
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    state.broadcaster.register(uuid::Uuid::now_v7(), tx).await;

    let _ = handlers::create_task(State(Arc::clone(&state)), Json(new_task("doomed"))).await;
    let _ = handlers::update_task(
        State(Arc::clone(&state)),
        Path(TaskId::new().to_string()),
        Json(TaskPatch {
            title: Some("doomed".to_string()),
            ..TaskPatch::default()
        }),
    )
    .await;
    let _ = handlers::delete_task(
        State(Arc::clone(&state)),
        Path(TaskId::new().to_string()),
    )
    .await;
    let _ = handlers::reorder_tasks(
        State(Arc::clone(&state)),
        Json(ReorderRequest {
            updated_tasks: vec![ReorderEntry {
                id: TaskId::new().to_string(),
                position: 1.0,
                category: "Done".to_string(),
            }],
        }),
    )
    .await;

    // Persistence failed each time, so no invalidation may have fanned out.
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn successful_mutation_broadcasts_invalidation() {
    let state = new_state();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    state.broadcaster.register(uuid::Uuid::now_v7(), tx).await;

    create(&state, new_task("observed")).await;
    assert!(rx.try_recv().is_ok());
}

#[tokio::test]
async fn validation_failure_never_touches_storage() {
    // If validation consulted the store first, FailingStore would turn this
    // 400 into a 500.
    let state = Arc::new(AppState::new(FailingStore));
    let err = handlers::create_task(State(Arc::clone(&state)), Json(new_task("")))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err = handlers::update_task(
        State(Arc::clone(&state)),
        Path("bad-id".to_string()),
        Json(TaskPatch::default()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}
