//! Server assembly: shared application state, router construction, and the
//! listener entry points used by both `main.rs` and test code.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, put};

use syncboard_proto::task::DEFAULT_CATEGORY;

use crate::broadcast::{self, Broadcaster};
use crate::handlers;
use crate::store::{MemoryStore, TaskStore};

/// Shared application state: the injected storage handle plus the broadcast
/// coordinator. All in-process shared state lives here, behind `Arc`.
pub struct AppState<S> {
    /// Storage collaborator; the only holder of mutable task state.
    pub store: S,
    /// Connected-client registry and fan-out.
    pub broadcaster: Broadcaster,
    /// Lane assigned to tasks created without an explicit category.
    pub default_category: String,
}

impl<S: TaskStore> AppState<S> {
    /// Creates state over the given store with the compiled default lane.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_default_category(store, DEFAULT_CATEGORY)
    }

    /// Creates state with a configured default lane for new tasks.
    #[must_use]
    pub fn with_default_category(store: S, default_category: &str) -> Self {
        Self {
            store,
            broadcaster: Broadcaster::new(),
            default_category: default_category.to_string(),
        }
    }
}

/// Builds the application router: the REST surface plus the WebSocket
/// endpoint for live synchronization.
pub fn router<S: TaskStore>(state: Arc<AppState<S>>) -> Router {
    Router::new()
        .route("/users", axum::routing::post(handlers::register_user::<S>))
        .route(
            "/tasks",
            get(handlers::list_tasks::<S>).post(handlers::create_task::<S>),
        )
        .route("/tasks/reorder", put(handlers::reorder_tasks::<S>))
        .route(
            "/tasks/{id}",
            put(handlers::update_task::<S>).delete(handlers::delete_task::<S>),
        )
        .route("/ws", get(ws_handler::<S>))
        .with_state(state)
}

/// Starts the server on the given address over a fresh in-memory store and
/// returns the bound address and a join handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(AppState::new(MemoryStore::new()))).await
}

/// Starts the server with pre-configured [`AppState`].
///
/// This is the primary entry point used by both `main.rs` and test code;
/// tests bind to `127.0.0.1:0` for an OS-assigned port and keep a clone of
/// the state to drive mutations in-process.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state<S: TaskStore>(
    addr: &str,
    state: Arc<AppState<S>>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}

/// axum handler that upgrades an HTTP request to a WebSocket connection.
async fn ws_handler<S: TaskStore>(
    ws: axum::extract::ws::WebSocketUpgrade,
    axum::extract::State(state): axum::extract::State<Arc<AppState<S>>>,
) -> impl axum::response::IntoResponse {
    ws.on_upgrade(move |socket| broadcast::handle_socket(socket, state))
}
