//! Client-side task state for Taskdeck.
//!
//! Provides the observable [`TaskCache`], the [`TaskController`] that applies
//! optimistic edits and rolls them back on failure, and the pure sort layer
//! used to present the cache.

pub mod cache;
pub mod controller;
pub mod sort;

pub use cache::{OptimisticEdit, TaskCache};
pub use controller::{MutationPhase, PendingMutation, TaskController};
pub use sort::{SortDirection, SortKey, SortState, compare, completion_summary, derive};

use taskdeck_proto::api::{ErrorCode, ValidationError};
use taskdeck_proto::task::TaskId;
use thiserror::Error;

use crate::transport::TransportError;

/// Errors that can occur during task operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskError {
    /// Input was rejected locally before anything was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The task does not exist or belongs to someone else.
    #[error("{0}")]
    NotFound(String),
    /// The server did not accept the session token.
    #[error("not authorized: {0}")]
    Unauthorized(String),
    /// A mutation for this task is still in flight.
    #[error("task {0} already has a change in flight")]
    AlreadyPending(TaskId),
    /// Any other server or network failure.
    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for TaskError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Rejected {
                code: ErrorCode::NotFound,
                message,
            } => Self::NotFound(message),
            TransportError::Rejected {
                code: ErrorCode::Unauthorized,
                message,
            } => Self::Unauthorized(message),
            other => Self::Transport(other),
        }
    }
}

/// Outcome category of a settled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The server accepted the change.
    Success,
    /// The change failed and was rolled back.
    Error,
}

/// User-visible message emitted when an operation settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Success or failure.
    pub kind: NotificationKind,
    /// Text to show the user.
    pub message: String,
}

impl Notification {
    /// A success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    /// An error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}
