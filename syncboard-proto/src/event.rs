//! WebSocket event protocol for live task synchronization.
//!
//! Events travel as JSON text frames tagged by an `event` field. The server
//! never pushes deltas: `tasksInvalidated` is a bare cache-invalidation
//! signal, and `tasksSnapshot` carries the full sorted task list. No version
//! or ordering field accompanies either — clients simply re-render on the
//! latest snapshot they receive.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Events a client may send to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Ask the server to read the authoritative task list and push it to
    /// every connected client.
    RequestTasks,
}

/// Events the server fans out to all connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Task state changed; any held snapshot may be stale. Carries no payload.
    TasksInvalidated,
    /// The full task list, sorted by category then position.
    TasksSnapshot {
        /// Every task currently in storage, in delivery order.
        tasks: Vec<Task>,
    },
}

/// Encodes a [`ClientEvent`] as a JSON text frame.
///
/// # Errors
///
/// Returns an error string if serialization fails.
pub fn encode_client(msg: &ClientEvent) -> Result<String, String> {
    serde_json::to_string(msg).map_err(|e| format!("client event encode error: {e}"))
}

/// Decodes a [`ClientEvent`] from a JSON text frame.
///
/// # Errors
///
/// Returns an error string if deserialization fails.
pub fn decode_client(text: &str) -> Result<ClientEvent, String> {
    serde_json::from_str(text).map_err(|e| format!("client event decode error: {e}"))
}

/// Encodes a [`ServerEvent`] as a JSON text frame.
///
/// # Errors
///
/// Returns an error string if serialization fails.
pub fn encode_server(msg: &ServerEvent) -> Result<String, String> {
    serde_json::to_string(msg).map_err(|e| format!("server event encode error: {e}"))
}

/// Decodes a [`ServerEvent`] from a JSON text frame.
///
/// # Errors
///
/// Returns an error string if deserialization fails.
pub fn decode_server(text: &str) -> Result<ServerEvent, String> {
    serde_json::from_str(text).map_err(|e| format!("server event decode error: {e}"))
}
