//! HTTP server core: shared state, identity extractor, error mapping, and
//! the four task routes.
//!
//! Every task route resolves the caller's [`OwnerId`] first; a request
//! without a valid session is rejected before its body is read or the store
//! is touched. Bodies are then decoded and validated by
//! [`taskdeck_proto::api`], so invalid input never reaches the store either.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use taskdeck_proto::api::{
    self, CREATED_MESSAGE, DELETED_MESSAGE, ErrorBody, ErrorCode, HEALTH_PATH, MutationResponse,
    STATUS_UPDATED_MESSAGE, TASK_PATH, TASKS_PATH, ValidationError,
};
use taskdeck_proto::task::{OwnerId, Task};

use crate::identity::OwnerResolver;
use crate::store::{StoreError, TaskStore};

/// Shared server state: the task store and the identity boundary.
pub struct ServerState<S> {
    /// Backing task store.
    pub store: S,
    identity: Box<dyn OwnerResolver>,
}

impl<S: TaskStore> ServerState<S> {
    /// Creates server state from a store and an identity resolver.
    pub fn new(store: S, identity: impl OwnerResolver + 'static) -> Self {
        Self {
            store,
            identity: Box::new(identity),
        }
    }
}

/// An error response: HTTP status plus an [`ErrorBody`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody::new(code, message),
        }
    }

    /// The rejection for requests without a resolvable owner.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "missing or invalid session",
        )
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Body of this error.
    #[must_use]
    pub const fn body(&self) -> &ErrorBody {
        &self.body
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::Validation, e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(v) => v.into(),
            StoreError::NotFound(id) => Self::new(
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                format!("task {id} not found"),
            ),
            StoreError::Backend(reason) => {
                tracing::error!(error = %reason, "task store failure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Internal,
                    "internal storage error",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// Extractor for the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub OwnerId);

impl<S: TaskStore> FromRequestParts<Arc<ServerState<S>>> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServerState<S>>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(owner) = state.identity.resolve_owner(parts) {
            Ok(Self(owner))
        } else {
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                "rejected request without a valid session"
            );
            Err(ApiError::unauthorized())
        }
    }
}

/// `GET /api/tasks`
async fn list_tasks<S: TaskStore>(
    State(state): State<Arc<ServerState<S>>>,
    Owner(owner): Owner,
) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.store.list_tasks(&owner).await?;
    tracing::debug!(owner = %owner, count = tasks.len(), "listed tasks");
    Ok(Json(tasks))
}

/// `POST /api/tasks`
async fn create_task<S: TaskStore>(
    State(state): State<Arc<ServerState<S>>>,
    Owner(owner): Owner,
    body: Bytes,
) -> Result<(StatusCode, Json<MutationResponse>), ApiError> {
    let new_task = api::decode_create(&body).inspect_err(|e| {
        tracing::warn!(owner = %owner, error = %e, "rejected create request");
    })?;
    let task = state.store.create_task(&owner, new_task).await?;
    tracing::info!(owner = %owner, task_id = %task.id, "task created");
    Ok((
        StatusCode::CREATED,
        Json(MutationResponse::with_task(CREATED_MESSAGE, task)),
    ))
}

/// `PATCH /api/tasks/{id}`
async fn update_status<S: TaskStore>(
    State(state): State<Arc<ServerState<S>>>,
    Owner(owner): Owner,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = api::parse_task_id(&raw_id)?;
    let status = api::decode_update_status(&body)?;
    let task = state
        .store
        .update_status(&owner, id, status)
        .await
        .inspect_err(|e| {
            tracing::warn!(owner = %owner, task_id = %id, error = %e, "status update failed");
        })?;
    tracing::info!(owner = %owner, task_id = %id, status = %status, "task status updated");
    Ok(Json(MutationResponse::with_task(STATUS_UPDATED_MESSAGE, task)))
}

/// `DELETE /api/tasks/{id}`
async fn delete_task<S: TaskStore>(
    State(state): State<Arc<ServerState<S>>>,
    Owner(owner): Owner,
    Path(raw_id): Path<String>,
) -> Result<Json<MutationResponse>, ApiError> {
    let id = api::parse_task_id(&raw_id)?;
    state
        .store
        .delete_task(&owner, id)
        .await
        .inspect_err(|e| {
            tracing::warn!(owner = %owner, task_id = %id, error = %e, "delete failed");
        })?;
    tracing::info!(owner = %owner, task_id = %id, "task deleted");
    Ok(Json(MutationResponse::ok(DELETED_MESSAGE)))
}

/// `GET /health`
async fn health() -> &'static str {
    "ok"
}

/// Builds the application router over the given state.
pub fn router<S: TaskStore>(state: Arc<ServerState<S>>) -> axum::Router {
    axum::Router::new()
        .route(HEALTH_PATH, get(health))
        .route(TASKS_PATH, get(list_tasks::<S>).post(create_task::<S>))
        .route(TASK_PATH, patch(update_status::<S>).delete(delete_task::<S>))
        .with_state(state)
}

/// Starts the task server with a pre-built [`ServerState`].
///
/// Binds to `addr` (use port `0` for an OS-assigned port) and returns the
/// bound address together with the serving task's handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state<S: TaskStore>(
    addr: &str,
    state: Arc<ServerState<S>>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "task server error");
        }
    });

    Ok((bound_addr, handle))
}
