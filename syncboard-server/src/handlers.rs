//! REST mutation handlers for the task board.
//!
//! Each handler validates its input, delegates persistence to the storage
//! adapter, and triggers the invalidation broadcast only after persistence
//! has reported a definite success — clients are never notified of a change
//! that did not commit. Storage failures are caught here and converted to
//! the 500 response; nothing is retried.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use syncboard_proto::task::{
    InvalidTask, NewTask, ParseTaskIdError, ReorderRequest, Task, TaskId, TaskPatch,
};
use syncboard_proto::user::{MissingUserDetails, NewUser};

use crate::ordering::{self, OrderingError};
use crate::server::AppState;
use crate::store::{NewTaskRecord, StoreError, TaskStore};

/// Request failure taxonomy, mapped onto the HTTP surface.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Client input violated a field constraint or identifier format.
    /// No storage access was attempted.
    #[error("{0}")]
    Validation(String),
    /// A write matched zero documents. Ambiguous between "does not exist"
    /// and "exists but already matched the patch"; intentionally unresolved.
    #[error("{0}")]
    NotFound(String),
    /// Unexpected storage-layer failure, surfaced with its detail.
    #[error("{0}")]
    Storage(#[from] StoreError),
}

impl From<InvalidTask> for ApiError {
    fn from(e: InvalidTask) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<ParseTaskIdError> for ApiError {
    fn from(e: ParseTaskIdError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<MissingUserDetails> for ApiError {
    fn from(e: MissingUserDetails) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<OrderingError> for ApiError {
    fn from(e: OrderingError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl ApiError {
    /// The HTTP status this error surfaces as.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Storage(e) = &self {
            tracing::error!(error = %e, "request failed on storage");
        }
        let body = Json(json!({ "message": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// `POST /users` — idempotent register-or-fetch by external id.
///
/// # Errors
///
/// 400 when `uid` or `email` is missing, 500 on storage failure.
pub async fn register_user<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<NewUser>,
) -> Result<Response, ApiError> {
    body.validate()?;

    let uid = body.uid.clone().unwrap_or_default();
    if let Some(existing) = state.store.find_user(&uid).await? {
        return Ok((
            StatusCode::OK,
            Json(json!({ "message": "User already exists", "user": existing })),
        )
            .into_response());
    }

    let user = body.into_user(ordering::now_millis());
    state.store.insert_user(user.clone()).await?;
    tracing::info!(uid = %user.uid, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User registered", "user": user })),
    )
        .into_response())
}

/// `GET /tasks` — the authoritative snapshot, sorted for delivery.
///
/// # Errors
///
/// 500 on storage failure.
pub async fn list_tasks<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let mut tasks = state.store.find_all_tasks().await?;
    ordering::sort_for_delivery(&mut tasks);
    Ok(Json(tasks))
}

/// `POST /tasks` — create a task.
///
/// # Errors
///
/// 400 on invalid title/description, 500 on storage failure.
pub async fn create_task<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<NewTask>,
) -> Result<Response, ApiError> {
    body.validate()?;

    let record = NewTaskRecord {
        title: body.title.unwrap_or_default(),
        description: body.description.unwrap_or_default(),
        category: body
            .category
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| state.default_category.clone()),
        position: ordering::initial_position(),
        created_at: ordering::now_millis(),
    };
    let task = state.store.insert_task(record).await?;
    state.broadcaster.notify_invalidated().await;
    tracing::info!(task_id = %task.id, category = %task.category, "task created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Task added successfully", "task": task })),
    )
        .into_response())
}

/// `PUT /tasks/{id}` — partial-field update; the identifier itself is
/// immutable and any id in the body was already stripped at deserialization.
///
/// # Errors
///
/// 400 on a malformed id, 404 when no document matched or nothing changed
/// (the two are indistinguishable by design), 500 on storage failure.
pub async fn update_task<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> Result<Json<Value>, ApiError> {
    let id: TaskId = id.parse()?;

    let modified = state.store.update_task(&id, patch).await?;
    if modified == 0 {
        return Err(ApiError::NotFound(
            "Task not found or no changes made".to_string(),
        ));
    }

    state.broadcaster.notify_invalidated().await;
    tracing::info!(task_id = %id, "task updated");
    Ok(Json(json!({ "message": "Task updated successfully" })))
}

/// `DELETE /tasks/{id}` — physical delete, no soft-delete.
///
/// # Errors
///
/// 400 on a malformed id, 404 when nothing was deleted, 500 on storage
/// failure.
pub async fn delete_task<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: TaskId = id.parse()?;

    let deleted = state.store.delete_task(&id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    state.broadcaster.notify_invalidated().await;
    tracing::info!(task_id = %id, "task deleted");
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

/// `PUT /tasks/reorder` — batch category/position rewrite.
///
/// The whole batch is validated before any write; the bulk write itself has
/// no cross-document atomicity.
///
/// # Errors
///
/// 400 on any malformed id in the batch, 500 on storage failure.
pub async fn reorder_tasks<S: TaskStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(body): Json<ReorderRequest>,
) -> Result<Json<Value>, ApiError> {
    let updates = ordering::validate_reorder(&body.updated_tasks)?;

    let matched = state.store.reposition_tasks(updates).await?;
    state.broadcaster.notify_invalidated().await;
    tracing::info!(matched, "tasks reordered");
    Ok(Json(json!({ "message": "Tasks reordered successfully" })))
}
