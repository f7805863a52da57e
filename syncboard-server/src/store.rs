//! Storage adapter for the task board's document collections.
//!
//! [`TaskStore`] is the seam between the mutation handlers and the storage
//! collaborator. The handle is injected into each handler rather than read
//! from a global, so tests can substitute a double. [`MemoryStore`] is the
//! reference implementation; its observable semantics mirror a document
//! store: per-document atomic writes with modified/deleted counts, and a
//! multi-document bulk write with no cross-document atomicity.

use std::cmp::Ordering;
use std::future::Future;

use syncboard_proto::task::{Task, TaskId, TaskPatch};
use syncboard_proto::user::User;
use tokio::sync::RwLock;

/// Errors surfaced by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Any unexpected failure reported by the backend. Not retried.
    #[error("storage error: {0}")]
    Backend(String),
}

/// Fields of a task to be inserted; the store assigns the identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskRecord {
    /// Validated title.
    pub title: String,
    /// Description, already defaulted to empty when absent.
    pub description: String,
    /// Lane, already defaulted to the configured unstarted lane.
    pub category: String,
    /// Initial sort key assigned by the ordering engine.
    pub position: f64,
    /// Creation timestamp in milliseconds since the Unix epoch.
    pub created_at: u64,
}

/// One operation of a bulk reorder write: sets `category` and `position`
/// together so a task never lands in a mixed old/new state.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionUpdate {
    /// Task to move; already validated as a well-formed identifier.
    pub id: TaskId,
    /// Target lane.
    pub category: String,
    /// New sort key within the target lane.
    pub position: f64,
}

/// Document-store operations over the `tasks` and `users` collections.
///
/// Single-document writes are atomic; [`TaskStore::reposition_tasks`] is a
/// bulk write with no atomicity across documents.
pub trait TaskStore: Send + Sync + 'static {
    /// Inserts a task, assigning its identifier, and returns the stored
    /// document.
    fn insert_task(
        &self,
        record: NewTaskRecord,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Returns every task in the collection, in arrival order.
    fn find_all_tasks(&self) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Applies a partial-field patch to the task with the given id.
    ///
    /// Returns the modified count: 0 when no document matched **or** the
    /// matching document already equaled the patch. The two cases are
    /// indistinguishable by design.
    fn update_task(
        &self,
        id: &TaskId,
        patch: TaskPatch,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Deletes the task with the given id, returning the deleted count.
    fn delete_task(&self, id: &TaskId) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Applies a batch of category/position rewrites, one document at a time,
    /// returning how many documents matched.
    fn reposition_tasks(
        &self,
        updates: Vec<PositionUpdate>,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Looks up a user by external id.
    fn find_user(&self, uid: &str)
    -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Inserts a user document.
    fn insert_user(&self, user: User) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// In-memory reference implementation of [`TaskStore`].
///
/// Vectors preserve arrival order, which is what breaks position ties at
/// delivery time. Thread-safe via [`RwLock`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tasks: RwLock<Vec<Task>>,
    users: RwLock<Vec<User>>,
}

impl MemoryStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for MemoryStore {
    async fn insert_task(&self, record: NewTaskRecord) -> Result<Task, StoreError> {
        let task = Task {
            id: TaskId::new(),
            title: record.title,
            description: record.description,
            category: record.category,
            position: record.position,
            created_at: record.created_at,
        };
        let mut tasks = self.tasks.write().await;
        tasks.push(task.clone());
        drop(tasks);
        Ok(task)
    }

    async fn find_all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.clone())
    }

    async fn update_task(&self, id: &TaskId, patch: TaskPatch) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.iter_mut().find(|t| t.id == *id) else {
            return Ok(0);
        };

        let mut changed = false;
        if let Some(title) = patch.title
            && task.title != title
        {
            task.title = title;
            changed = true;
        }
        if let Some(description) = patch.description
            && task.description != description
        {
            task.description = description;
            changed = true;
        }
        if let Some(category) = patch.category
            && task.category != category
        {
            task.category = category;
            changed = true;
        }
        if let Some(position) = patch.position
            && task.position.total_cmp(&position) != Ordering::Equal
        {
            task.position = position;
            changed = true;
        }
        drop(tasks);

        Ok(u64::from(changed))
    }

    async fn delete_task(&self, id: &TaskId) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != *id);
        Ok((before - tasks.len()) as u64)
    }

    async fn reposition_tasks(&self, updates: Vec<PositionUpdate>) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.write().await;
        let mut matched = 0u64;
        for update in updates {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == update.id) {
                task.category = update.category;
                task.position = update.position;
                matched += 1;
            }
        }
        drop(tasks);
        Ok(matched)
    }

    async fn find_user(&self, uid: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.uid == uid).cloned())
    }

    async fn insert_user(&self, user: User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        users.push(user);
        Ok(())
    }
}
