//! In-memory task store.
//!
//! The [`MemoryTaskStore`] keeps every owner's tasks in one ordered map keyed
//! by id. Ids come from a counter that only moves forward, so a deleted id is
//! never handed out again.

use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use taskdeck_proto::api::{NewTask, validate_title};
use taskdeck_proto::task::{OwnerId, Task, TaskId, TodoStatus};

use super::{StoreError, TaskStore};

/// Id counter and rows, guarded together so id assignment and insert are atomic.
#[derive(Debug, Default)]
struct Tables {
    last_id: i64,
    tasks: BTreeMap<TaskId, Task>,
}

/// In-process task store.
///
/// Thread-safe via [`RwLock`]. Lists return tasks in id order, although
/// callers must not rely on it.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tables: RwLock<Tables>,
}

impl MemoryTaskStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of tasks across all owners.
    pub async fn len(&self) -> usize {
        self.tables.read().await.tasks.len()
    }

    /// Returns `true` if no owner has any task.
    pub async fn is_empty(&self) -> bool {
        self.tables.read().await.tasks.is_empty()
    }
}

/// Looks up a task only if `owner` owns it.
fn owned_mut<'a>(
    tasks: &'a mut BTreeMap<TaskId, Task>,
    owner: &OwnerId,
    id: TaskId,
) -> Result<&'a mut Task, StoreError> {
    tasks
        .get_mut(&id)
        .filter(|task| task.owner_id == *owner)
        .ok_or(StoreError::NotFound(id))
}

impl TaskStore for MemoryTaskStore {
    async fn create_task(&self, owner: &OwnerId, task: NewTask) -> Result<Task, StoreError> {
        validate_title(&task.title)?;

        let mut tables = self.tables.write().await;
        tables.last_id += 1;
        let id = TaskId::new(tables.last_id);
        let created = Task {
            id,
            owner_id: owner.clone(),
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            todo_status: task.todo_status,
            tags: task.tags,
            created_at: Utc::now(),
        };
        tables.tasks.insert(id, created.clone());
        drop(tables);
        Ok(created)
    }

    async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .values()
            .filter(|task| task.owner_id == *owner)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        owner: &OwnerId,
        id: TaskId,
        status: TodoStatus,
    ) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        let task = owned_mut(&mut tables.tasks, owner, id)?;
        task.todo_status = status;
        Ok(task.clone())
    }

    async fn delete_task(&self, owner: &OwnerId, id: TaskId) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        owned_mut(&mut tables.tasks, owner, id)?;
        tables.tasks.remove(&id);
        Ok(())
    }
}
