//! Broadcast coordinator: connected-client registry, WebSocket handler, and
//! snapshot fan-out.
//!
//! After any successful mutation the coordinator emits a bare
//! `tasksInvalidated` signal to every connected client. When any client asks
//! for the current tasks, the full sorted snapshot is pushed to **all**
//! connected clients, not just the requester — one client's refresh triggers
//! everyone's, which guarantees eventual convergence across open sessions
//! without per-client diffing.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use syncboard_proto::event::{self, ClientEvent, ServerEvent};
use syncboard_proto::task::Task;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::ordering;
use crate::server::AppState;
use crate::store::TaskStore;

/// Registry of connected clients and the fan-out primitive.
///
/// The registry is unbounded — no connection quota is enforced — and a
/// disconnect deregisters its client silently, with no notification to
/// others.
pub struct Broadcaster {
    /// Maps a per-connection id to the sender half of its WebSocket writer
    /// channel.
    connections: RwLock<HashMap<Uuid, mpsc::UnboundedSender<Message>>>,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Broadcaster {
    /// Creates a new coordinator with no connected clients.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a client's writer channel under its connection id.
    pub async fn register(&self, client_id: Uuid, sender: mpsc::UnboundedSender<Message>) {
        let mut conns = self.connections.write().await;
        conns.insert(client_id, sender);
    }

    /// Removes a client from the registry.
    pub async fn unregister(&self, client_id: Uuid) {
        let mut conns = self.connections.write().await;
        conns.remove(&client_id);
    }

    /// Number of currently registered clients.
    pub async fn client_count(&self) -> usize {
        let conns = self.connections.read().await;
        conns.len()
    }

    /// Signals every connected client that task state changed.
    ///
    /// Fired only after persistence has reported success; carries no payload.
    pub async fn notify_invalidated(&self) {
        tracing::debug!("broadcasting task invalidation");
        self.send_to_all(&ServerEvent::TasksInvalidated).await;
    }

    /// Pushes the full sorted task list to every connected client.
    pub async fn push_snapshot(&self, tasks: Vec<Task>) {
        tracing::debug!(count = tasks.len(), "broadcasting task snapshot");
        self.send_to_all(&ServerEvent::TasksSnapshot { tasks }).await;
    }

    /// Send a WebSocket Close frame to all connected clients.
    ///
    /// Each client's writer task forwards the close frame, letting the
    /// remote end detect shutdown. Used for graceful shutdown and testing.
    pub async fn close_all_connections(&self) {
        let conns = self.connections.read().await;
        for (client_id, sender) in conns.iter() {
            tracing::info!(client_id = %client_id, "sending close frame to client");
            let _ = sender.send(Message::Close(None));
        }
    }

    /// Encodes an event once and fans it out to every registered client.
    ///
    /// Per-client send failures are ignored; the failing connection's own
    /// socket teardown deregisters it.
    async fn send_to_all(&self, event: &ServerEvent) {
        let text = match event::encode_server(event) {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode server event");
                return;
            }
        };
        let conns = self.connections.read().await;
        for sender in conns.values() {
            let _ = sender.send(Message::Text(text.clone().into()));
        }
    }
}

/// Handles an upgraded WebSocket connection for a single client.
///
/// Lifecycle:
/// 1. Assign a connection id and register the writer channel.
/// 2. No implicit snapshot push — the client must explicitly request one.
/// 3. Reader loop decodes client events until close.
/// 4. On disconnect, deregister silently.
pub async fn handle_socket<S: TaskStore>(socket: WebSocket, state: Arc<AppState<S>>) {
    let client_id = Uuid::now_v7();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
    state.broadcaster.register(client_id, tx).await;
    tracing::info!(client_id = %client_id, "client connected");

    // Writer task: forward fan-out messages from the channel to the socket.
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(client_id = %client_id, "WebSocket write failed");
                break;
            }
        }
    });

    // Reader loop: process incoming events from this client.
    let reader_state = Arc::clone(&state);
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_client_event(client_id, text.as_str(), &reader_state).await;
                }
                Message::Close(_) => {
                    tracing::info!(client_id = %client_id, "received close frame");
                    break;
                }
                _ => {
                    // Ignore binary, ping, pong frames.
                }
            }
        }
    });

    // Wait for either task to finish, then abort the other.
    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    state.broadcaster.unregister(client_id).await;
    tracing::info!(client_id = %client_id, "client disconnected and deregistered");
}

/// Handles one decoded text frame from a registered client.
async fn handle_client_event<S: TaskStore>(client_id: Uuid, text: &str, state: &Arc<AppState<S>>) {
    let msg = match event::decode_client(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!(client_id = %client_id, error = %e, "failed to decode client event");
            return;
        }
    };

    match msg {
        ClientEvent::RequestTasks => {
            tracing::debug!(client_id = %client_id, "client requested current tasks");
            match state.store.find_all_tasks().await {
                Ok(mut tasks) => {
                    ordering::sort_for_delivery(&mut tasks);
                    state.broadcaster.push_snapshot(tasks).await;
                }
                Err(e) => {
                    tracing::error!(client_id = %client_id, error = %e, "snapshot read failed");
                }
            }
        }
    }
}
