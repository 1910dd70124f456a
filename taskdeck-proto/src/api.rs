//! HTTP API contract for Taskdeck.
//!
//! Request and response shapes exchanged between the client and the server,
//! plus the validation every request passes before it may reach a store.
//! Request bodies are decoded from raw bytes here so that malformed JSON and
//! unknown enum values surface as [`ValidationError`] on both sides.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{MIN_TITLE_LENGTH, Priority, Task, TaskId, TodoStatus};

/// Collection route: `GET` lists, `POST` creates.
pub const TASKS_PATH: &str = "/api/tasks";

/// Item route template: `PATCH` updates status, `DELETE` removes.
pub const TASK_PATH: &str = "/api/tasks/{id}";

/// Unauthenticated liveness route.
pub const HEALTH_PATH: &str = "/health";

/// Message returned after a successful create.
pub const CREATED_MESSAGE: &str = "Task created successfully";

/// Message returned after a successful status update.
pub const STATUS_UPDATED_MESSAGE: &str = "Task status updated successfully";

/// Message returned after a successful delete.
pub const DELETED_MESSAGE: &str = "Task deleted successfully";

/// Builds the item route for a concrete task id.
#[must_use]
pub fn task_path(id: TaskId) -> String {
    format!("{TASKS_PATH}/{id}")
}

/// Input rejected before it reaches a store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Title has fewer than [`MIN_TITLE_LENGTH`] characters.
    #[error("Title must be at least {min} characters long")]
    TitleTooShort {
        /// Required minimum length.
        min: usize,
    },
    /// Task id is not a positive integer.
    #[error("invalid task id '{0}' (expected a positive integer)")]
    InvalidId(String),
    /// Due date is neither an ISO calendar date nor an RFC 3339 timestamp.
    #[error("invalid due date '{0}' (expected YYYY-MM-DD)")]
    InvalidDueDate(String),
    /// Body is not valid JSON or does not match the request shape.
    #[error("malformed request: {0}")]
    MalformedBody(String),
}

/// Machine-readable error category carried in [`ErrorBody`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Request failed validation; nothing was stored.
    Validation,
    /// No task with that id is owned by the caller.
    NotFound,
    /// The request carried no resolvable identity.
    Unauthorized,
    /// The store failed unexpectedly.
    Internal,
}

/// JSON body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Error category.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
}

impl ErrorBody {
    /// Creates an error body.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Body of `POST /api/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Task title.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional due date as an ISO date string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Optional priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Initial status, pending when omitted.
    #[serde(default)]
    pub todo_status: TodoStatus,
    /// Optional labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl CreateTaskRequest {
    /// A request with only a title; everything else defaulted.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the due date string.
    #[must_use]
    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Sets the initial status.
    #[must_use]
    pub const fn with_status(mut self, todo_status: TodoStatus) -> Self {
        self.todo_status = todo_status;
        self
    }

    /// Sets the tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Validates the request into a [`NewTask`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::TitleTooShort`] or
    /// [`ValidationError::InvalidDueDate`].
    pub fn validate(self) -> Result<NewTask, ValidationError> {
        validate_title(&self.title)?;
        let due_date = match self.due_date.as_deref() {
            Some(raw) => parse_due_date(raw)?,
            None => None,
        };
        Ok(NewTask {
            title: self.title,
            description: self.description,
            due_date,
            priority: self.priority,
            todo_status: self.todo_status,
            tags: self.tags.unwrap_or_default(),
        })
    }
}

/// A validated create request, ready for a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Title, already checked against [`MIN_TITLE_LENGTH`].
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Parsed due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional priority.
    pub priority: Option<Priority>,
    /// Initial status.
    pub todo_status: TodoStatus,
    /// Labels in the order given.
    pub tags: Vec<String>,
}

/// Body of `PATCH /api/tasks/{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// New status.
    pub todo_status: TodoStatus,
}

/// Response of every mutation route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Always `true` on a 2xx response.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// The created or updated task; absent for deletes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<Task>,
}

impl MutationResponse {
    /// A successful response carrying a task.
    pub fn with_task(message: impl Into<String>, task: Task) -> Self {
        Self {
            success: true,
            message: message.into(),
            task: Some(task),
        }
    }

    /// A successful response without a task.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            task: None,
        }
    }
}

/// Checks the minimum title length, counting characters rather than bytes.
///
/// # Errors
///
/// Returns [`ValidationError::TitleTooShort`] for titles under
/// [`MIN_TITLE_LENGTH`] characters.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.chars().count() < MIN_TITLE_LENGTH {
        return Err(ValidationError::TitleTooShort {
            min: MIN_TITLE_LENGTH,
        });
    }
    Ok(())
}

/// Parses a task id from a path segment or CLI argument.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidId`] unless `raw` is a positive integer.
pub fn parse_task_id(raw: &str) -> Result<TaskId, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(TaskId::new(n)),
        _ => Err(ValidationError::InvalidId(raw.to_string())),
    }
}

/// Parses a due date.
///
/// Accepts `YYYY-MM-DD` (midnight UTC) or an RFC 3339 timestamp. An empty
/// string means no due date, which is what an untouched date input submits.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDueDate`] for anything else.
pub fn parse_due_date(raw: &str) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(Some(date.and_time(NaiveTime::MIN).and_utc()));
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|_| ValidationError::InvalidDueDate(raw.to_string()))
}

/// Decodes and validates a create request body.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedBody`] for bad JSON or unknown enum
/// values, otherwise any error from [`CreateTaskRequest::validate`].
pub fn decode_create(bytes: &[u8]) -> Result<NewTask, ValidationError> {
    let request: CreateTaskRequest =
        serde_json::from_slice(bytes).map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
    request.validate()
}

/// Decodes a status update body.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedBody`] for bad JSON or an unknown status.
pub fn decode_update_status(bytes: &[u8]) -> Result<TodoStatus, ValidationError> {
    serde_json::from_slice::<UpdateStatusRequest>(bytes)
        .map(|req| req.todo_status)
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))
}
