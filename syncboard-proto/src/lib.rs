//! Shared protocol definitions for the `SyncBoard` wire format.

pub mod event;
pub mod task;
pub mod user;
