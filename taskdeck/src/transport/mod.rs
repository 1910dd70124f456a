//! Transport layer abstraction for the Taskdeck client.
//!
//! Defines the [`TaskApi`] trait the controller talks to. Concrete
//! implementations include:
//! - [`http::HttpTransport`] -- JSON over HTTP against `taskdeck-server`
//!
//! Tests substitute in-process fakes.

pub mod http;

use std::future::Future;

use taskdeck_proto::api::{CreateTaskRequest, ErrorCode, MutationResponse};
use taskdeck_proto::task::{Task, TaskId, TodoStatus};

/// Errors that can occur while talking to the task server.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with an error body.
    #[error("{message}")]
    Rejected {
        /// Error category reported by the server.
        code: ErrorCode,
        /// Server-provided description.
        message: String,
    },

    /// The server could not be reached or the connection failed mid-request.
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The server answered with something that is not a known response shape.
    #[error("unexpected response from server: {0}")]
    UnexpectedResponse(String),
}

/// The four task operations, scoped to whichever owner the transport
/// authenticates as.
pub trait TaskApi: Send + Sync {
    /// Fetch the owner's full task list.
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<Task>, TransportError>> + Send;

    /// Create a task.
    fn create_task(
        &self,
        request: &CreateTaskRequest,
    ) -> impl Future<Output = Result<MutationResponse, TransportError>> + Send;

    /// Set a task's status.
    fn update_status(
        &self,
        id: TaskId,
        status: TodoStatus,
    ) -> impl Future<Output = Result<MutationResponse, TransportError>> + Send;

    /// Delete a task.
    fn delete_task(
        &self,
        id: TaskId,
    ) -> impl Future<Output = Result<MutationResponse, TransportError>> + Send;
}
