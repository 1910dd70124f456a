//! Owner-scoped task persistence.
//!
//! Defines the [`TaskStore`] trait the HTTP layer is generic over. Two
//! backends are provided:
//! - [`memory::MemoryTaskStore`]: in-process map, for tests and ephemeral servers
//! - [`sqlite::SqliteTaskStore`]: `SQLite` table indexed by owner
//!
//! Every operation is scoped by [`OwnerId`]. A task owned by someone else is
//! reported exactly like a task that does not exist.

pub mod memory;
pub mod sqlite;

use std::future::Future;

use taskdeck_proto::api::{NewTask, ValidationError};
use taskdeck_proto::task::{OwnerId, Task, TaskId, TodoStatus};

pub use memory::MemoryTaskStore;
pub use sqlite::SqliteTaskStore;

/// Errors returned by a [`TaskStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The task failed validation at the store boundary.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No task with this id is owned by the caller.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The storage backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

/// Async, owner-scoped task persistence.
///
/// Implementations must assign ids that are unique across all owners and
/// never reissued, and must check ownership explicitly on update and delete.
pub trait TaskStore: Send + Sync + 'static {
    /// Persists a new task for `owner` and returns it with a fresh id.
    fn create_task(
        &self,
        owner: &OwnerId,
        task: NewTask,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Returns every task owned by `owner`, in no particular order.
    fn list_tasks(
        &self,
        owner: &OwnerId,
    ) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;

    /// Sets the status of one of `owner`'s tasks and returns the updated task.
    fn update_status(
        &self,
        owner: &OwnerId,
        id: TaskId,
        status: TodoStatus,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;

    /// Removes one of `owner`'s tasks.
    fn delete_task(
        &self,
        owner: &OwnerId,
        id: TaskId,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
