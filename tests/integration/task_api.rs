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

//! Integration tests for the task API over HTTP.
//!
//! Starts a real `taskdeck-server` on an OS-assigned port and drives it
//! through the client's `HttpTransport`, covering:
//! - create → list round trip, including optional fields
//! - ids are never reissued, across owners and after deletes
//! - another owner's task looks exactly like a missing one
//! - requests without a valid session are rejected before touching the store
//! - both the in-memory and SQLite backends behave the same

use std::sync::Arc;

use taskdeck::transport::http::HttpTransport;
use taskdeck::transport::{TaskApi, TransportError};
use taskdeck_proto::api::{
    CREATED_MESSAGE, CreateTaskRequest, DELETED_MESSAGE, ErrorCode, STATUS_UPDATED_MESSAGE,
};
use taskdeck_proto::task::{OwnerId, Priority, TaskId, TodoStatus};
use taskdeck_server::identity::BearerSessions;
use taskdeck_server::server::{ServerState, start_server_with_state};
use taskdeck_server::store::{MemoryTaskStore, SqliteTaskStore, TaskStore};
use url::Url;

const ALICE: &str = "alice-token";
const BOB: &str = "bob-token";

fn sessions() -> BearerSessions {
    BearerSessions::new()
        .with_session(ALICE, OwnerId::new("alice"))
        .with_session(BOB, OwnerId::new("bob"))
}

async fn start<S: TaskStore>(store: S) -> Url {
    let state = Arc::new(ServerState::new(store, sessions()));
    let (addr, _handle) = start_server_with_state("127.0.0.1:0", state)
        .await
        .expect("failed to start task server");
    Url::parse(&format!("http://{addr}")).unwrap()
}

async fn start_memory() -> Url {
    start(MemoryTaskStore::new()).await
}

fn client(base: &Url, token: &str) -> HttpTransport {
    HttpTransport::new(base.clone(), Some(token.to_string()))
}

#[tokio::test]
async fn created_task_is_listed() {
    let base = start_memory().await;
    let alice = client(&base, ALICE);

    let response = alice
        .create_task(&CreateTaskRequest::new("Buy milk"))
        .await
        .unwrap();
    assert!(response.success);
    assert_eq!(response.message, CREATED_MESSAGE);

    let tasks = alice.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk");
    assert_eq!(tasks[0].todo_status, TodoStatus::Pending);
    assert_eq!(tasks[0].priority, None);
    assert_eq!(tasks[0].owner_id, OwnerId::new("alice"));
}

#[tokio::test]
async fn optional_fields_survive_the_round_trip() {
    let base = start_memory().await;
    let alice = client(&base, ALICE);

    let request = CreateTaskRequest::new("File taxes")
        .with_description("before the deadline")
        .with_due_date("2024-04-15")
        .with_priority(Priority::High)
        .with_status(TodoStatus::Completed)
        .with_tags(vec!["money".to_string(), "admin".to_string()]);
    let created = alice.create_task(&request).await.unwrap().task.unwrap();

    let listed = alice.list_tasks().await.unwrap();
    assert_eq!(listed, vec![created.clone()]);
    assert_eq!(created.description.as_deref(), Some("before the deadline"));
    assert_eq!(
        created.due_date.unwrap().format("%Y-%m-%d").to_string(),
        "2024-04-15"
    );
    assert_eq!(created.priority, Some(Priority::High));
    assert!(created.is_completed());
    assert_eq!(created.tags, vec!["money", "admin"]);
}

#[tokio::test]
async fn empty_due_date_means_no_due_date() {
    let base = start_memory().await;
    let alice = client(&base, ALICE);

    let created = alice
        .create_task(&CreateTaskRequest::new("Someday").with_due_date(""))
        .await
        .unwrap()
        .task
        .unwrap();
    assert_eq!(created.due_date, None);
}

#[tokio::test]
async fn short_title_is_a_validation_error() {
    let base = start_memory().await;
    let alice = client(&base, ALICE);

    let err = alice
        .create_task(&CreateTaskRequest::new("ab"))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TransportError::Rejected {
            code: ErrorCode::Validation,
            message: "Title must be at least 3 characters long".to_string(),
        }
    );
    assert!(alice.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn ids_are_never_reissued() {
    let base = start_memory().await;
    let alice = client(&base, ALICE);
    let bob = client(&base, BOB);

    let mut seen = Vec::new();
    for (api, title) in [(&alice, "First"), (&bob, "Second"), (&alice, "Third")] {
        let task = api
            .create_task(&CreateTaskRequest::new(title))
            .await
            .unwrap()
            .task
            .unwrap();
        assert!(!seen.contains(&task.id));
        seen.push(task.id);
    }

    alice.delete_task(seen[2]).await.unwrap();
    let next = alice
        .create_task(&CreateTaskRequest::new("Fourth"))
        .await
        .unwrap()
        .task
        .unwrap();
    assert!(!seen.contains(&next.id));
}

#[tokio::test]
async fn status_update_changes_only_status() {
    let base = start_memory().await;
    let alice = client(&base, ALICE);
    let created = alice
        .create_task(&CreateTaskRequest::new("Water plants").with_priority(Priority::Low))
        .await
        .unwrap()
        .task
        .unwrap();

    let response = alice
        .update_status(created.id, TodoStatus::Completed)
        .await
        .unwrap();
    assert_eq!(response.message, STATUS_UPDATED_MESSAGE);
    let updated = response.task.unwrap();
    assert!(updated.is_completed());
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.priority, created.priority);
    assert_eq!(updated.created_at, created.created_at);
}

#[tokio::test]
async fn foreign_task_is_indistinguishable_from_missing() {
    let base = start_memory().await;
    let alice = client(&base, ALICE);
    let bob = client(&base, BOB);

    let bobs = bob
        .create_task(&CreateTaskRequest::new("Bob's task"))
        .await
        .unwrap()
        .task
        .unwrap();
    let missing = TaskId::new(bobs.id.get() + 1000);

    let foreign_update = alice
        .update_status(bobs.id, TodoStatus::Completed)
        .await
        .unwrap_err();
    let missing_update = alice
        .update_status(missing, TodoStatus::Completed)
        .await
        .unwrap_err();
    let foreign_delete = alice.delete_task(bobs.id).await.unwrap_err();

    for err in [&foreign_update, &missing_update, &foreign_delete] {
        assert!(matches!(
            err,
            TransportError::Rejected {
                code: ErrorCode::NotFound,
                ..
            }
        ));
    }
    // Same shape: only the echoed id differs.
    assert_eq!(
        foreign_update.to_string().replace(&bobs.id.to_string(), "ID"),
        missing_update.to_string().replace(&missing.to_string(), "ID")
    );

    // Bob's task is untouched and not visible to Alice.
    let bobs_tasks = bob.list_tasks().await.unwrap();
    assert_eq!(bobs_tasks, vec![bobs]);
    assert!(alice.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_removes_task() {
    let base = start_memory().await;
    let alice = client(&base, ALICE);
    let created = alice
        .create_task(&CreateTaskRequest::new("Doomed"))
        .await
        .unwrap()
        .task
        .unwrap();

    let response = alice.delete_task(created.id).await.unwrap();
    assert_eq!(response.message, DELETED_MESSAGE);
    assert!(response.task.is_none());
    assert!(alice.list_tasks().await.unwrap().is_empty());

    let again = alice.delete_task(created.id).await.unwrap_err();
    assert!(matches!(
        again,
        TransportError::Rejected {
            code: ErrorCode::NotFound,
            ..
        }
    ));
}

#[tokio::test]
async fn missing_or_unknown_token_is_unauthorized() {
    let base = start_memory().await;
    let anonymous = HttpTransport::new(base.clone(), None);
    let stranger = client(&base, "not-a-session");

    for api in [&anonymous, &stranger] {
        let err = api.list_tasks().await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Rejected {
                code: ErrorCode::Unauthorized,
                ..
            }
        ));
        let err = api
            .create_task(&CreateTaskRequest::new("Sneaky"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Rejected {
                code: ErrorCode::Unauthorized,
                ..
            }
        ));
    }

    assert!(client(&base, ALICE).list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn sqlite_backend_behaves_like_memory() {
    let base = start(SqliteTaskStore::open_in_memory().unwrap()).await;
    let alice = client(&base, ALICE);
    let bob = client(&base, BOB);

    let created = alice
        .create_task(
            &CreateTaskRequest::new("Persist me")
                .with_tags(vec!["db".to_string()])
                .with_due_date("2024-01-01"),
        )
        .await
        .unwrap()
        .task
        .unwrap();
    alice
        .update_status(created.id, TodoStatus::Completed)
        .await
        .unwrap();

    let listed = alice.list_tasks().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert!(listed[0].is_completed());
    assert_eq!(listed[0].tags, vec!["db"]);
    assert_eq!(listed[0].due_date, created.due_date);

    assert!(matches!(
        bob.delete_task(created.id).await.unwrap_err(),
        TransportError::Rejected {
            code: ErrorCode::NotFound,
            ..
        }
    ));
    alice.delete_task(created.id).await.unwrap();
    assert!(alice.list_tasks().await.unwrap().is_empty());
}
