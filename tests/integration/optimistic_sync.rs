// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown,
    clippy::future_not_send,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Integration tests for the optimistic mutation controller against a live
//! server.
//!
//! The server runs on top of `FlakyStore`, a `MemoryTaskStore` wrapper whose
//! mutations can be switched to fail with a backend error, so the rollback
//! path is exercised end to end:
//! - confirmed mutations settle into the server's list
//! - failed mutations restore the cache exactly, including order
//! - unknown ids come back as not-found with the cache unchanged
//! - every settled mutation produces one notification

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use taskdeck::tasks::{
    MutationPhase, Notification, NotificationKind, SortDirection, SortKey, TaskController,
    TaskError, completion_summary, derive,
};
use taskdeck::transport::TransportError;
use taskdeck::transport::http::HttpTransport;
use taskdeck_proto::api::{
    CREATED_MESSAGE, CreateTaskRequest, DELETED_MESSAGE, NewTask, STATUS_UPDATED_MESSAGE,
};
use taskdeck_proto::task::{OwnerId, Priority, Task, TaskId, TodoStatus};
use taskdeck_server::identity::BearerSessions;
use taskdeck_server::server::{ServerState, start_server_with_state};
use taskdeck_server::store::{MemoryTaskStore, StoreError, TaskStore};
use tokio::sync::mpsc;
use url::Url;

const TOKEN: &str = "alice-token";

/// Memory store whose mutations fail while `failing` is set.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryTaskStore,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("disk on fire".to_string()));
        }
        Ok(())
    }
}

impl TaskStore for FlakyStore {
    async fn create_task(&self, owner: &OwnerId, task: NewTask) -> Result<Task, StoreError> {
        self.check()?;
        self.inner.create_task(owner, task).await
    }

    async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, StoreError> {
        self.inner.list_tasks(owner).await
    }

    async fn update_status(
        &self,
        owner: &OwnerId,
        id: TaskId,
        status: TodoStatus,
    ) -> Result<Task, StoreError> {
        self.check()?;
        self.inner.update_status(owner, id, status).await
    }

    async fn delete_task(&self, owner: &OwnerId, id: TaskId) -> Result<(), StoreError> {
        self.check()?;
        self.inner.delete_task(owner, id).await
    }
}

struct Harness {
    controller: TaskController<HttpTransport>,
    notifications: mpsc::UnboundedReceiver<Notification>,
    failing: Arc<AtomicBool>,
}

impl Harness {
    /// Starts a server, seeds it with `titles` and loads the controller.
    async fn start(titles: &[&str]) -> Self {
        let store = FlakyStore::default();
        let failing = Arc::clone(&store.failing);
        let sessions = BearerSessions::new().with_session(TOKEN, OwnerId::new("alice"));
        let state = Arc::new(ServerState::new(store, sessions));
        let (addr, _handle) = start_server_with_state("127.0.0.1:0", state)
            .await
            .expect("failed to start task server");
        let base = Url::parse(&format!("http://{addr}")).unwrap();

        let (controller, notifications) =
            TaskController::new(HttpTransport::new(base, Some(TOKEN.to_string())));
        for title in titles {
            controller.create(CreateTaskRequest::new(*title)).await.unwrap();
        }
        let mut harness = Self {
            controller,
            notifications,
            failing,
        };
        harness.drain();
        harness.controller.load().await.unwrap();
        harness
    }

    fn fail_mutations(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    fn cached(&self) -> Vec<Task> {
        self.controller.cache().snapshot()
    }

    fn id_of(&self, title: &str) -> TaskId {
        self.cached()
            .into_iter()
            .find(|t| t.title == title)
            .map(|t| t.id)
            .unwrap()
    }

    fn drain(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(note) = self.notifications.try_recv() {
            out.push(note);
        }
        out
    }
}

#[tokio::test]
async fn create_is_listed_after_refetch() {
    let mut h = Harness::start(&[]).await;

    h.controller
        .create(CreateTaskRequest::new("Buy milk"))
        .await
        .unwrap();

    let cached = h.cached();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].title, "Buy milk");
    assert_eq!(cached[0].todo_status, TodoStatus::Pending);
    assert_eq!(cached[0].priority, None);
    assert_eq!(h.drain(), vec![Notification::success(CREATED_MESSAGE)]);
}

#[tokio::test]
async fn confirmed_status_change_matches_server() {
    let mut h = Harness::start(&["Walk dog", "Buy milk"]).await;
    let id = h.id_of("Buy milk");

    h.controller
        .update_status(id, TodoStatus::Completed)
        .await
        .unwrap();

    assert!(h.controller.cache().get(id).unwrap().is_completed());
    assert_eq!(h.controller.phase(id), MutationPhase::Idle);
    assert_eq!(completion_summary(&h.cached()), (1, 2));
    assert_eq!(h.drain(), vec![Notification::success(STATUS_UPDATED_MESSAGE)]);

    // The server agrees after an explicit refresh.
    h.controller.refresh().await.unwrap();
    assert!(h.controller.cache().get(id).unwrap().is_completed());
}

#[tokio::test]
async fn failed_delete_reappears_in_original_position() {
    let mut h = Harness::start(&["One", "Two", "Three"]).await;
    let before = h.cached();
    let id = h.id_of("Two");

    h.fail_mutations(true);
    let err = h.controller.delete(id).await.unwrap_err();

    assert!(matches!(err, TaskError::Transport(TransportError::Rejected { .. })));
    assert_eq!(h.cached(), before);
    let notes = h.drain();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].kind, NotificationKind::Error);
    // Backend details never reach the client.
    assert!(!notes[0].message.contains("disk"));

    h.fail_mutations(false);
    h.controller.delete(id).await.unwrap();
    let titles: Vec<String> = h.cached().into_iter().map(|t| t.title).collect();
    assert_eq!(titles, vec!["One", "Three"]);
    assert_eq!(h.drain(), vec![Notification::success(DELETED_MESSAGE)]);
}

#[tokio::test]
async fn failed_status_change_rolls_back() {
    let mut h = Harness::start(&["Call mom"]).await;
    let before = h.cached();
    let id = h.id_of("Call mom");

    h.fail_mutations(true);
    assert!(h.controller.toggle_status(id).await.is_err());

    assert_eq!(h.cached(), before);
    assert!(!h.controller.is_pending(id));
    assert_eq!(h.drain()[0].kind, NotificationKind::Error);
}

#[tokio::test]
async fn unknown_id_is_not_found_and_cache_unchanged() {
    let mut h = Harness::start(&["Only task"]).await;
    let before = h.cached();

    let err = h
        .controller
        .update_status(TaskId::new(5), TodoStatus::Completed)
        .await
        .unwrap_err();

    assert!(matches!(err, TaskError::NotFound(_)));
    assert_eq!(h.cached(), before);
    assert_eq!(h.drain()[0].kind, NotificationKind::Error);
}

#[tokio::test]
async fn invalid_session_fails_load() {
    let sessions = BearerSessions::new().with_session(TOKEN, OwnerId::new("alice"));
    let state = Arc::new(ServerState::new(MemoryTaskStore::new(), sessions));
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", state)
        .await
        .unwrap();
    let base = Url::parse(&format!("http://{addr}")).unwrap();

    let (controller, _notifications) =
        TaskController::new(HttpTransport::new(base, Some("wrong".to_string())));
    let err = controller.load().await.unwrap_err();
    assert!(matches!(err, TaskError::Unauthorized(_)));
    assert!(controller.cache().is_empty());
}

#[tokio::test]
async fn cache_subscribers_see_the_optimistic_edit() {
    let h = Harness::start(&["Read book"]).await;
    let id = h.id_of("Read book");
    let mut rx = h.controller.cache().subscribe();
    rx.mark_unchanged();

    h.controller.delete(id).await.unwrap();

    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_empty());
}

#[tokio::test]
async fn sorted_view_follows_the_cache() {
    let h = Harness::start(&[]).await;
    for (title, priority) in [
        ("low one", Priority::Low),
        ("high one", Priority::High),
        ("medium one", Priority::Medium),
    ] {
        h.controller
            .create(CreateTaskRequest::new(title).with_priority(priority))
            .await
            .unwrap();
    }
    h.controller
        .create(CreateTaskRequest::new("no priority"))
        .await
        .unwrap();

    let cached = h.cached();
    let sorted = derive(&cached, SortKey::Priority, SortDirection::Desc);
    let titles: Vec<&str> = sorted.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["high one", "medium one", "low one", "no priority"]);
    assert_eq!(h.cached(), cached);
}
