//! Ordering engine: the ordering contract for tasks within and across lanes.
//!
//! Positions are wall-clock milliseconds at creation, so single-writer
//! creation sequences sort ascending; concurrent creations from multiple
//! clients order best-effort (no distributed clock sync). No ordering cache
//! is kept anywhere — the authoritative order is recomputed at read time by
//! sorting on `category` then `position`, with storage as the single source
//! of truth.

use std::time::{SystemTime, UNIX_EPOCH};

use syncboard_proto::task::{ReorderEntry, Task, TaskId};

use crate::store::PositionUpdate;

/// Errors from validating a reorder batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderingError {
    /// An entry's identifier is not a syntactically valid task id.
    #[error("Invalid task ID in reorder batch: {id}")]
    InvalidTaskId {
        /// The offending identifier as received.
        id: String,
    },
}

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// A clock before the epoch yields 0 rather than panicking.
#[must_use]
#[allow(clippy::cast_possible_truncation)] // ms since epoch fits u64 for ~584 My
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// Initial sort key for a newly created task.
///
/// Monotonically increasing in practice for a single writer; exact ordering
/// under concurrent creation is best-effort by design.
#[must_use]
#[allow(clippy::cast_precision_loss)] // ms timestamps stay well inside f64's 53-bit mantissa
pub fn initial_position() -> f64 {
    now_millis() as f64
}

/// Validates a reorder batch and shapes it into bulk-write operations.
///
/// Every identifier must parse; any failure rejects the whole batch before a
/// single write is issued. Partial failure of the bulk write itself is not
/// rolled back — that consistency gap lives in the store, not here.
///
/// # Errors
///
/// Returns [`OrderingError::InvalidTaskId`] naming the first malformed id.
pub fn validate_reorder(entries: &[ReorderEntry]) -> Result<Vec<PositionUpdate>, OrderingError> {
    entries
        .iter()
        .map(|entry| {
            let id: TaskId = entry
                .id
                .parse()
                .map_err(|_| OrderingError::InvalidTaskId {
                    id: entry.id.clone(),
                })?;
            Ok(PositionUpdate {
                id,
                category: entry.category.clone(),
                position: entry.position,
            })
        })
        .collect()
}

/// Sorts tasks into delivery order: by `category`, then `position`.
///
/// The sort is stable, so tasks with equal positions keep their arrival
/// order. Ties are accepted; there is no collision resolution.
pub fn sort_for_delivery(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.position.total_cmp(&b.position))
    });
}
