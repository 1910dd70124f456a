//! `SQLite`-backed task store.
//!
//! One `tasks` table with an `AUTOINCREMENT` primary key, so ids are never
//! reissued after a delete, and an index on `owner_id` for listing. Update and
//! delete filter on both id and owner and treat zero affected rows as
//! [`StoreError::NotFound`].

use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};

use taskdeck_proto::api::{NewTask, validate_title};
use taskdeck_proto::task::{OwnerId, Priority, Task, TaskId, TodoStatus};

use super::{StoreError, TaskStore};

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id TEXT NOT NULL,
    title TEXT NOT NULL CHECK (length(title) >= 3),
    description TEXT,
    due_date TEXT,
    priority TEXT CHECK (priority IN ('low', 'medium', 'high')),
    todo_status TEXT NOT NULL DEFAULT 'pending'
        CHECK (todo_status IN ('pending', 'completed')),
    tags TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_owner ON tasks(owner_id);
";

const SELECT_COLUMNS: &str = "SELECT id, owner_id, title, description, due_date, priority, \
                              todo_status, tags, created_at FROM tasks";

/// Task store persisted in a `SQLite` database.
///
/// The connection sits behind a [`Mutex`]; every statement runs synchronously
/// while the lock is held and no lock outlives a single operation.
pub struct SqliteTaskStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteTaskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTaskStore").finish_non_exhaustive()
    }
}

impl SqliteTaskStore {
    /// Opens (or creates) a database file and initializes the schema.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the parent directory cannot be
    /// created or the database cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Backend(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] if the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn insert(&self, owner: &OwnerId, task: NewTask) -> Result<Task, StoreError> {
        validate_title(&task.title)?;
        let tags = serde_json::to_string(&task.tags)
            .map_err(|e| StoreError::Backend(format!("cannot encode tags: {e}")))?;

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO tasks (owner_id, title, description, due_date, priority, \
             todo_status, tags, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                owner.as_str(),
                task.title,
                task.description,
                task.due_date,
                task.priority.map(Priority::as_str),
                task.todo_status.as_str(),
                tags,
                Utc::now(),
            ],
        )?;
        let id = conn.last_insert_rowid();
        let created = conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id],
            parse_task,
        )?;
        drop(conn);
        Ok(created)
    }

    fn select_by_owner(&self, owner: &OwnerId) -> Result<Vec<Task>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE owner_id = ?1 ORDER BY id"))?;
        let tasks = stmt
            .query_map(params![owner.as_str()], parse_task)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    fn set_status(
        &self,
        owner: &OwnerId,
        id: TaskId,
        status: TodoStatus,
    ) -> Result<Task, StoreError> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE tasks SET todo_status = ?1 WHERE id = ?2 AND owner_id = ?3",
            params![status.as_str(), id.get(), owner.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        let updated = conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id.get()],
            parse_task,
        )?;
        drop(conn);
        Ok(updated)
    }

    fn remove(&self, owner: &OwnerId, id: TaskId) -> Result<(), StoreError> {
        let changed = self.conn.lock().execute(
            "DELETE FROM tasks WHERE id = ?1 AND owner_id = ?2",
            params![id.get(), owner.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}

/// Converts a text column with `parse`, reporting failures as conversion errors.
fn parse_column<T>(
    idx: usize,
    raw: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> rusqlite::Result<T> {
    parse(raw).map_err(|msg| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into()))
}

/// Parses a task from a row selected with [`SELECT_COLUMNS`].
fn parse_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let priority = match row.get::<_, Option<String>>(5)? {
        Some(raw) => Some(parse_column(5, &raw, str::parse::<Priority>)?),
        None => None,
    };
    let status: String = row.get(6)?;
    let tags: String = row.get(7)?;
    Ok(Task {
        id: TaskId::new(row.get(0)?),
        owner_id: OwnerId::new(row.get::<_, String>(1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        due_date: row.get::<_, Option<DateTime<Utc>>>(4)?,
        priority,
        todo_status: parse_column(6, &status, str::parse::<TodoStatus>)?,
        tags: parse_column(7, &tags, |raw| {
            serde_json::from_str(raw).map_err(|e| e.to_string())
        })?,
        created_at: row.get(8)?,
    })
}

impl TaskStore for SqliteTaskStore {
    async fn create_task(&self, owner: &OwnerId, task: NewTask) -> Result<Task, StoreError> {
        self.insert(owner, task)
    }

    async fn list_tasks(&self, owner: &OwnerId) -> Result<Vec<Task>, StoreError> {
        self.select_by_owner(owner)
    }

    async fn update_status(
        &self,
        owner: &OwnerId,
        id: TaskId,
        status: TodoStatus,
    ) -> Result<Task, StoreError> {
        self.set_status(owner, id, status)
    }

    async fn delete_task(&self, owner: &OwnerId, id: TaskId) -> Result<(), StoreError> {
        self.remove(owner, id)
    }
}
