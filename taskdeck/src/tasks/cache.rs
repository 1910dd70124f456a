//! Observable client-side copy of the owner's task list.
//!
//! The cache holds either the last list the server confirmed, or that list
//! with one optimistic edit per in-flight mutation overlaid. Readers observe
//! it through [`TaskCache::subscribe`]; only the
//! [`TaskController`](super::TaskController) writes to it.

use tokio::sync::watch;

use taskdeck_proto::task::{Task, TaskId, TodoStatus};

/// A change applied to the cache ahead of server confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimisticEdit {
    /// Replace only the `todo_status` of the matching task.
    SetStatus(TodoStatus),
    /// Remove the matching task; no other entry moves.
    Remove,
}

/// Observable task list.
#[derive(Debug)]
pub struct TaskCache {
    tx: watch::Sender<Vec<Task>>,
}

impl Default for TaskCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self { tx }
    }

    /// Returns a receiver that is notified on every replacement or edit.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.tx.subscribe()
    }

    /// Clones the current contents.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Task> {
        self.tx.borrow().clone()
    }

    /// Returns a copy of the cached task with the given id.
    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tx.borrow().iter().find(|task| task.id == id).cloned()
    }

    /// Number of cached tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    /// Returns `true` if the cache holds no tasks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_empty()
    }

    /// Replaces the whole list.
    pub(crate) fn replace(&self, tasks: Vec<Task>) {
        self.tx.send_replace(tasks);
    }

    /// Snapshots the current list, then applies `edit` to the task with `id`.
    ///
    /// Both steps happen under the channel's write lock. If no cached task
    /// has that id the list is left alone and subscribers are not woken, but
    /// the snapshot is still returned.
    pub(crate) fn stage(&self, id: TaskId, edit: OptimisticEdit) -> Vec<Task> {
        let mut snapshot = Vec::new();
        self.tx.send_if_modified(|tasks| {
            snapshot.clone_from(tasks);
            let Some(pos) = tasks.iter().position(|task| task.id == id) else {
                return false;
            };
            match edit {
                OptimisticEdit::SetStatus(status) => tasks[pos].todo_status = status,
                OptimisticEdit::Remove => {
                    tasks.remove(pos);
                }
            }
            true
        });
        snapshot
    }
}
