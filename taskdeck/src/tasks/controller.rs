//! Optimistic mutation controller.
//!
//! Every status change or delete goes through the same state machine:
//!
//! ```text
//! Idle --intent--> Pending --success--> Settling --re-fetch done--> Idle
//!                     \
//!                      `--failure--> Idle (cache restored from snapshot, then re-fetched)
//! ```
//!
//! Entering `Pending` snapshots the cache and applies the edit at once, so
//! readers see the result before the server answers. A failure puts the
//! snapshot back verbatim. Either outcome is followed by a full re-fetch;
//! if that re-fetch fails the current cache is kept and the failure is
//! logged.
//!
//! Only one mutation per task id may be in flight. The controller rejects a
//! second intent with [`TaskError::AlreadyPending`] and exposes
//! [`TaskController::is_pending`] so callers can disable the control first.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use taskdeck_proto::api::{CreateTaskRequest, MutationResponse};
use taskdeck_proto::task::{Task, TaskId, TodoStatus};

use super::cache::{OptimisticEdit, TaskCache};
use super::{Notification, TaskError};
use crate::transport::{TaskApi, TransportError};

/// Where a task id sits in the mutation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
    /// No mutation in flight.
    Idle,
    /// Optimistic edit applied, waiting for the server.
    Pending,
    /// Server accepted the change, re-fetch in progress.
    Settling,
}

/// An optimistic edit together with the cache contents it replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    id: TaskId,
    edit: OptimisticEdit,
    snapshot: Vec<Task>,
}

impl PendingMutation {
    /// Snapshots `cache` and applies `edit` to the task with `id`.
    pub(crate) fn begin(cache: &TaskCache, id: TaskId, edit: OptimisticEdit) -> Self {
        let snapshot = cache.stage(id, edit);
        Self { id, edit, snapshot }
    }

    /// Restores the cache to the contents captured by [`begin`](Self::begin).
    pub(crate) fn rollback(self, cache: &TaskCache) {
        cache.replace(self.snapshot);
    }

    /// The task this mutation targets.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// The edit that was applied.
    #[must_use]
    pub const fn edit(&self) -> OptimisticEdit {
        self.edit
    }

    /// Cache contents from just before the edit.
    #[must_use]
    pub fn snapshot(&self) -> &[Task] {
        &self.snapshot
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    phases: HashMap<TaskId, MutationPhase>,
    /// Bumped by every list fetch and every optimistic edit; a fetch may only
    /// replace the cache if the counter still holds the value it started with.
    fetch_generation: u64,
}

/// Sole writer of the [`TaskCache`].
pub struct TaskController<A> {
    api: A,
    cache: TaskCache,
    state: Mutex<ControllerState>,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl<A: TaskApi> TaskController<A> {
    /// Creates a controller with an empty cache.
    ///
    /// Returns the controller and the receiving end of its notification
    /// channel. Every settled operation sends one [`Notification`].
    #[must_use]
    pub fn new(api: A) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = Self {
            api,
            cache: TaskCache::new(),
            state: Mutex::new(ControllerState::default()),
            notifications: tx,
        };
        (controller, rx)
    }

    /// Read access to the cache.
    #[must_use]
    pub const fn cache(&self) -> &TaskCache {
        &self.cache
    }

    /// The transport this controller talks through.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Current phase for `id`.
    #[must_use]
    pub fn phase(&self, id: TaskId) -> MutationPhase {
        self.state
            .lock()
            .phases
            .get(&id)
            .copied()
            .unwrap_or(MutationPhase::Idle)
    }

    /// Returns `true` while a mutation for `id` is pending or settling.
    #[must_use]
    pub fn is_pending(&self, id: TaskId) -> bool {
        self.phase(id) != MutationPhase::Idle
    }

    /// Fetches the initial task list.
    ///
    /// # Errors
    ///
    /// Returns the transport failure; the cache is left unchanged.
    pub async fn load(&self) -> Result<(), TaskError> {
        self.refresh().await?;
        tracing::info!(count = self.cache.len(), "task list loaded");
        Ok(())
    }

    /// Re-fetches the authoritative list and replaces the cache with it.
    ///
    /// If an optimistic edit or a newer fetch started while this one was in
    /// flight, the result is dropped instead of overwriting newer state.
    ///
    /// # Errors
    ///
    /// Returns the transport failure; the cache is left unchanged.
    pub async fn refresh(&self) -> Result<(), TaskError> {
        self.refetch().await.map(|_| ()).map_err(|e| {
            tracing::warn!(error = %e, "task list fetch failed");
            TaskError::from(e)
        })
    }

    /// Optimistically sets the status of task `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::AlreadyPending`] without touching the cache if
    /// `id` already has a mutation in flight. Any server or network failure
    /// is returned after the cache has been rolled back.
    pub async fn update_status(
        &self,
        id: TaskId,
        status: TodoStatus,
    ) -> Result<MutationResponse, TaskError> {
        self.mutate(
            id,
            OptimisticEdit::SetStatus(status),
            self.api.update_status(id, status),
        )
        .await
    }

    /// Flips the cached status of task `id` between pending and completed.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::NotFound`] if `id` is not in the cache, otherwise
    /// as [`update_status`](Self::update_status).
    pub async fn toggle_status(&self, id: TaskId) -> Result<MutationResponse, TaskError> {
        let Some(task) = self.cache.get(id) else {
            let err = TaskError::NotFound(format!("task {id} not found"));
            self.notify(Notification::error(err.to_string()));
            return Err(err);
        };
        self.update_status(id, task.todo_status.toggled()).await
    }

    /// Optimistically deletes task `id`.
    ///
    /// # Errors
    ///
    /// As [`update_status`](Self::update_status).
    pub async fn delete(&self, id: TaskId) -> Result<MutationResponse, TaskError> {
        self.mutate(id, OptimisticEdit::Remove, self.api.delete_task(id)).await
    }

    /// Creates a task and re-fetches the list once the server confirms it.
    ///
    /// Creation is not optimistic: the new task only appears in the cache
    /// after the re-fetch, carrying its server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Validation`] without contacting the server if
    /// the request is invalid, otherwise any transport failure.
    pub async fn create(&self, request: CreateTaskRequest) -> Result<MutationResponse, TaskError> {
        if let Err(e) = request.clone().validate() {
            self.notify(Notification::error(e.to_string()));
            return Err(e.into());
        }

        match self.api.create_task(&request).await {
            Ok(response) => {
                tracing::info!(title = %request.title, "task created");
                self.notify(Notification::success(response.message.clone()));
                self.settle_refetch().await;
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(error = %e, "task creation failed");
                let err = TaskError::from(e);
                self.notify(Notification::error(err.to_string()));
                Err(err)
            }
        }
    }

    async fn mutate(
        &self,
        id: TaskId,
        edit: OptimisticEdit,
        request: impl Future<Output = Result<MutationResponse, TransportError>> + Send,
    ) -> Result<MutationResponse, TaskError> {
        let pending = {
            let mut state = self.state.lock();
            if state.phases.contains_key(&id) {
                tracing::debug!(task_id = %id, "mutation rejected, another is in flight");
                return Err(TaskError::AlreadyPending(id));
            }
            state.phases.insert(id, MutationPhase::Pending);
            state.fetch_generation += 1;
            PendingMutation::begin(&self.cache, id, edit)
        };
        tracing::debug!(task_id = %id, ?edit, "optimistic edit applied");

        match request.await {
            Ok(response) => {
                drop(pending);
                self.state.lock().phases.insert(id, MutationPhase::Settling);
                tracing::info!(task_id = %id, ?edit, "mutation confirmed");
                self.notify(Notification::success(response.message.clone()));
                self.settle_refetch().await;
                self.state.lock().phases.remove(&id);
                Ok(response)
            }
            Err(e) => {
                {
                    let mut state = self.state.lock();
                    pending.rollback(&self.cache);
                    state.phases.remove(&id);
                    state.fetch_generation += 1;
                }
                tracing::warn!(task_id = %id, error = %e, "mutation failed, rolled back");
                let err = TaskError::from(e);
                self.notify(Notification::error(err.to_string()));
                self.settle_refetch().await;
                Err(err)
            }
        }
    }

    /// Re-fetch after a mutation settles either way. Failure keeps the
    /// current cache.
    async fn settle_refetch(&self) {
        if let Err(e) = self.refetch().await {
            tracing::warn!(error = %e, "re-fetch after mutation failed, keeping current state");
        }
    }

    /// Fetches the list; returns `false` if the result was superseded.
    async fn refetch(&self) -> Result<bool, TransportError> {
        let generation = {
            let mut state = self.state.lock();
            state.fetch_generation += 1;
            state.fetch_generation
        };

        let tasks = self.api.list_tasks().await?;

        let state = self.state.lock();
        if state.fetch_generation != generation {
            tracing::debug!(generation, "discarding superseded task list");
            return Ok(false);
        }
        self.cache.replace(tasks);
        drop(state);
        Ok(true)
    }

    fn notify(&self, notification: Notification) {
        if self.notifications.send(notification).is_err() {
            tracing::debug!("notification receiver dropped");
        }
    }
}
