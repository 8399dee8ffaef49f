use crate::error::{Result, TaskError};
use crate::models::{TaskDraft, TaskRecord};
use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Durable collection of tasks. Every operation is atomic with respect to
/// other callers of the same store.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Assigns a fresh id and creation time, then persists the draft.
    async fn create(&self, draft: TaskDraft) -> Result<TaskRecord>;

    /// All tasks, newest first.
    async fn read_all(&self) -> Result<Vec<TaskRecord>>;

    /// Overwrites title, description and completed. Never touches id or created_at.
    async fn update(&self, record: &TaskRecord) -> Result<()>;

    async fn set_completed(&self, id: &str, completed: bool) -> Result<()>;

    async fn delete(&self, id: &str) -> Result<()>;
}

#[derive(Clone)]
pub struct SqliteTaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTaskStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;\
             PRAGMA synchronous=FULL;\
             PRAGMA busy_timeout=5000;",
        )?;
        log::debug!("Opened task database at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (\
               id TEXT PRIMARY KEY,\
               title TEXT NOT NULL,\
               description TEXT NOT NULL,\
               completed INTEGER NOT NULL DEFAULT 0,\
               created_at INTEGER NOT NULL\
             );\
             CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks(created_at);",
        )?;
        Ok(SqliteTaskStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let guard = self
            .conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }

    async fn blocking<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.with_conn(f)).await?
    }
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    let micros: i64 = row.get(4)?;
    let created_at = DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, micros))?;
    Ok(TaskRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
        created_at,
    })
}

fn not_found_unless_changed(rows: usize, id: &str) -> Result<()> {
    if rows == 0 {
        return Err(TaskError::NotFound(id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn create(&self, draft: TaskDraft) -> Result<TaskRecord> {
        self.blocking(move |conn| {
            // stored with microsecond precision
            let record = TaskRecord {
                id: Uuid::new_v4().to_string(),
                title: draft.title,
                description: draft.description,
                completed: draft.completed,
                created_at: Utc::now().trunc_subsecs(6),
            };
            conn.execute(
                "INSERT INTO tasks (id, title, description, completed, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    record.title,
                    record.description,
                    record.completed,
                    record.created_at.timestamp_micros(),
                ],
            )?;
            Ok(record)
        })
        .await
    }

    async fn read_all(&self) -> Result<Vec<TaskRecord>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, description, completed, created_at FROM tasks \
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let tasks = stmt
                .query_map([], task_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(tasks)
        })
        .await
    }

    async fn update(&self, record: &TaskRecord) -> Result<()> {
        let record = record.clone();
        self.blocking(move |conn| {
            let rows = conn.execute(
                "UPDATE tasks SET title = ?1, description = ?2, completed = ?3 WHERE id = ?4",
                params![record.title, record.description, record.completed, record.id],
            )?;
            not_found_unless_changed(rows, &record.id)
        })
        .await
    }

    async fn set_completed(&self, id: &str, completed: bool) -> Result<()> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let rows = conn.execute(
                "UPDATE tasks SET completed = ?1 WHERE id = ?2",
                params![completed, id],
            )?;
            not_found_unless_changed(rows, &id)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let id = id.to_string();
        self.blocking(move |conn| {
            let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
            not_found_unless_changed(rows, &id)
        })
        .await
    }
}
