//! `SyncBoard` server library.
//!
//! Exposes the task board server for use in tests and embedding: the storage
//! adapter seam, the ordering engine, the REST mutation handlers, and the
//! WebSocket broadcast coordinator.

pub mod broadcast;
pub mod config;
pub mod handlers;
pub mod ordering;
pub mod server;
pub mod store;
