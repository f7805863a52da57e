//! Task domain types for `SyncBoard`.
//!
//! Defines the [`Task`] document as it is stored and served, the request
//! payloads for the mutation endpoints, and the field constraints every
//! write is validated against before it reaches storage.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 50;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

/// Canonical lane for tasks created without an explicit category.
pub const DEFAULT_CATEGORY: &str = "To-Do";

/// Storage-native unique identifier for a task, based on UUID v7 for
/// time-ordering.
///
/// Identifiers arriving in URL paths or request bodies are parsed through
/// [`std::str::FromStr`]; anything that is not a well-formed UUID is rejected
/// before any storage access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when a string is not a syntactically valid task identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid task ID")]
pub struct ParseTaskIdError;

impl std::str::FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self).map_err(|_| ParseTaskIdError)
    }
}

/// A task document as stored and served.
///
/// `id` is assigned by the store on insert and never changes. `position` is a
/// numeric sort key within a category; it is set to wall-clock milliseconds at
/// creation and only ever rewritten together with `category` during a reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Storage-assigned unique identifier, serialized under the document
    /// store's conventional `_id` key.
    #[serde(rename = "_id")]
    pub id: TaskId,
    /// Task title, 1 to [`MAX_TITLE_LENGTH`] characters.
    pub title: String,
    /// Task description, up to [`MAX_DESCRIPTION_LENGTH`] characters.
    pub description: String,
    /// Lane label. Open set; defaults to [`DEFAULT_CATEGORY`].
    pub category: String,
    /// Sort key within the category. Ties break by arrival order.
    pub position: f64,
    /// Creation timestamp in milliseconds since the Unix epoch. Immutable.
    #[serde(rename = "createdAt")]
    pub created_at: u64,
}

/// Validation failures for task field constraints.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidTask {
    /// The title is missing, empty, or over the length limit.
    #[error("Title is required (max {MAX_TITLE_LENGTH} chars)")]
    Title,
    /// The description is over the length limit.
    #[error("Description too long (max {MAX_DESCRIPTION_LENGTH} chars)")]
    Description,
}

/// Request body for creating a task.
///
/// `title` is optional at the serde level so that a missing field surfaces as
/// a validation error rather than a body-decode rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewTask {
    /// Required title; validated for presence and length.
    #[serde(default)]
    pub title: Option<String>,
    /// Optional description; defaults to empty.
    #[serde(default)]
    pub description: Option<String>,
    /// Optional lane; defaults to the configured unstarted lane.
    #[serde(default)]
    pub category: Option<String>,
}

impl NewTask {
    /// Checks the field constraints for a create request.
    ///
    /// Lengths are counted in Unicode scalar values, not bytes.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTask`] if the title is missing, empty, or over
    /// [`MAX_TITLE_LENGTH`] characters, or the description is over
    /// [`MAX_DESCRIPTION_LENGTH`] characters.
    pub fn validate(&self) -> Result<(), InvalidTask> {
        let title_len = self.title.as_ref().map_or(0, |t| t.chars().count());
        if title_len == 0 || title_len > MAX_TITLE_LENGTH {
            return Err(InvalidTask::Title);
        }
        if let Some(description) = &self.description
            && description.chars().count() > MAX_DESCRIPTION_LENGTH
        {
            return Err(InvalidTask::Description);
        }
        Ok(())
    }
}

/// Partial-field patch for updating a task.
///
/// Only the mutable fields are representable; anything else in the request
/// body — including a client-supplied `_id` or `id` — is dropped during
/// deserialization, so the identifier can never be overwritten via patch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    /// New title, if changing.
    pub title: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
    /// New lane, if changing.
    pub category: Option<String>,
    /// New sort key, if changing.
    pub position: Option<f64>,
}

impl TaskPatch {
    /// Returns `true` if the patch carries no fields at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.position.is_none()
    }
}

/// One entry of a drag-and-drop reorder batch.
///
/// The identifier is carried as a raw string so that a malformed id is
/// reported as a validation failure for the whole batch instead of a
/// body-decode rejection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReorderEntry {
    /// Identifier of the task to move, in string form.
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    /// New sort key within the target lane.
    pub position: f64,
    /// Target lane. Always rewritten together with `position`.
    pub category: String,
}

/// Request body for the batch reorder endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReorderRequest {
    /// The tasks to reposition, one entry per moved task.
    #[serde(rename = "updatedTasks")]
    pub updated_tasks: Vec<ReorderEntry>,
}
