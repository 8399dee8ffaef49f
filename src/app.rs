use crate::error::{Result, TaskError};
use crate::models::{TaskDraft, TaskRecord};
use crate::parser::Command;
use crate::store::TaskStore;
use crate::sync::SyncOrchestrator;
use std::sync::Arc;

/// Entry point for the presentation layer. Keeps the last list that loaded
/// successfully so a failed refresh never clears what is on screen.
pub struct App {
    pub tasks: Vec<TaskRecord>,
    sync: SyncOrchestrator,
    store: Arc<dyn TaskStore>,
}

impl App {
    pub fn new(sync: SyncOrchestrator, store: Arc<dyn TaskStore>) -> App {
        App {
            tasks: Vec::new(),
            sync,
            store,
        }
    }

    /// Loads the list, importing the seed tasks on first launch.
    pub async fn load_tasks(&mut self) -> Result<()> {
        self.tasks = self.sync.load_tasks().await?;
        Ok(())
    }

    // Mutations go straight to the store, then re-read it. The write has
    // already committed by then, so a failed re-read keeps the previous list.
    async fn reload(&mut self) {
        match self.store.read_all().await {
            Ok(tasks) => self.tasks = tasks,
            Err(err) => log::warn!("Reloading tasks failed: {}", err),
        }
    }

    pub async fn create_task(&mut self, draft: TaskDraft) -> Result<TaskRecord> {
        let record = self.store.create(draft).await?;
        log::debug!("Created task {}", record.id);
        self.reload().await;
        Ok(record)
    }

    pub async fn update_task(&mut self, record: &TaskRecord) -> Result<()> {
        self.store.update(record).await?;
        self.reload().await;
        Ok(())
    }

    pub async fn update_status(&mut self, id: &str, completed: bool) -> Result<()> {
        self.store.set_completed(id, completed).await?;
        self.reload().await;
        Ok(())
    }

    pub async fn delete_task(&mut self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        log::debug!("Deleted task {}", id);
        self.reload().await;
        Ok(())
    }

    /// Task at a 1-based position in the current list.
    pub fn task_at(&self, position: usize) -> Result<&TaskRecord> {
        position
            .checked_sub(1)
            .and_then(|i| self.tasks.get(i))
            .ok_or_else(|| TaskError::NotFound(format!("#{}", position)))
    }

    // None flips the current status
    async fn set_status_at(&mut self, position: usize, completed: Option<bool>) -> Result<()> {
        let task = self.task_at(position)?;
        let completed = completed.unwrap_or(!task.completed);
        let id = task.id.clone();
        self.update_status(&id, completed).await
    }

    /// Applies a parsed command. Returns true when the user asked to quit.
    pub async fn handle_command(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Quit => return Ok(true),
            Command::List | Command::Help => {}
            Command::Add { title, description } => {
                self.create_task(TaskDraft::new(title, description)).await?;
            }
            Command::Edit {
                position,
                title,
                description,
            } => {
                let mut record = self.task_at(position)?.clone();
                record.title = title;
                if let Some(description) = description {
                    record.description = description;
                }
                self.update_task(&record).await?;
            }
            Command::Done(position) => self.set_status_at(position, Some(true)).await?,
            Command::Undo(position) => self.set_status_at(position, Some(false)).await?,
            Command::Toggle(position) => self.set_status_at(position, None).await?,
            Command::Remove(position) => {
                let id = self.task_at(position)?.id.clone();
                self.delete_task(&id).await?;
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SeedSource;
    use crate::flag::MemoryFlagStore;
    use crate::models::SeedItem;
    use crate::store::SqliteTaskStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    // Serves one seed task, or fails while `offline` is set
    struct Seed {
        offline: AtomicBool,
    }

    #[async_trait]
    impl SeedSource for Seed {
        async fn fetch_seed(&self) -> Result<Vec<SeedItem>> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(TaskError::NetworkUnavailable("offline".to_string()));
            }
            Ok(vec![SeedItem {
                id: 1,
                todo: "Buy milk".to_string(),
                completed: false,
                user_id: 7,
            }])
        }
    }

    fn app_with(seed: Arc<Seed>) -> App {
        let store = Arc::new(SqliteTaskStore::open_in_memory().unwrap());
        let flags = Arc::new(MemoryFlagStore::default());
        let sync = SyncOrchestrator::new(store.clone(), seed, flags);
        App::new(sync, store)
    }

    fn online() -> Arc<Seed> {
        Arc::new(Seed {
            offline: AtomicBool::new(false),
        })
    }

    #[tokio::test]
    async fn test_load_then_create() {
        let mut app = app_with(online());
        app.load_tasks().await.unwrap();
        assert_eq!(app.tasks.len(), 1);

        app.create_task(TaskDraft::new("Call mom", "")).await.unwrap();
        let titles: Vec<&str> = app.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Call mom", "Buy milk"]);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_last_list() {
        let seed = Arc::new(Seed {
            offline: AtomicBool::new(true),
        });
        let mut app = app_with(seed.clone());
        app.create_task(TaskDraft::new("local", "")).await.unwrap();
        assert_eq!(app.tasks.len(), 1);

        let err = app.load_tasks().await.unwrap_err();
        assert!(matches!(err, TaskError::NetworkUnavailable(_)));
        assert_eq!(app.tasks.len(), 1);

        seed.offline.store(false, Ordering::SeqCst);
        app.load_tasks().await.unwrap();
        assert_eq!(app.tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_commands() {
        let mut app = app_with(online());
        app.load_tasks().await.unwrap();

        let quit = app
            .handle_command(Command::Add {
                title: "Write report".to_string(),
                description: "quarterly".to_string(),
            })
            .await
            .unwrap();
        assert!(!quit);
        assert_eq!(app.task_at(1).unwrap().title, "Write report");

        app.handle_command(Command::Done(1)).await.unwrap();
        assert!(app.task_at(1).unwrap().completed);
        app.handle_command(Command::Toggle(1)).await.unwrap();
        assert!(!app.task_at(1).unwrap().completed);

        app.handle_command(Command::Edit {
            position: 1,
            title: "Write summary".to_string(),
            description: None,
        })
        .await
        .unwrap();
        let edited = app.task_at(1).unwrap();
        assert_eq!(edited.title, "Write summary");
        assert_eq!(edited.description, "quarterly");

        app.handle_command(Command::Remove(2)).await.unwrap();
        assert_eq!(app.tasks.len(), 1);

        assert!(app.handle_command(Command::Quit).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_position_is_not_found() {
        let mut app = app_with(online());
        app.load_tasks().await.unwrap();

        let err = app.handle_command(Command::Remove(5)).await.unwrap_err();
        assert!(matches!(err, TaskError::NotFound(_)));
        assert!(app.task_at(0).is_err());
        assert_eq!(app.tasks.len(), 1);
    }

    #[tokio::test]
    async fn test_status_of_deleted_task_is_not_found() {
        let mut app = app_with(online());
        app.load_tasks().await.unwrap();
        let id = app.tasks[0].id.clone();

        app.delete_task(&id).await.unwrap();
        let err = app.update_status(&id, true).await.unwrap_err();
        assert!(matches!(err, TaskError::NotFound(_)));
    }

    // Writes succeed; reads fail while `broken_reads` is set
    struct UnreadableStore {
        inner: SqliteTaskStore,
        broken_reads: AtomicBool,
    }

    #[async_trait]
    impl TaskStore for UnreadableStore {
        async fn create(&self, draft: TaskDraft) -> Result<TaskRecord> {
            self.inner.create(draft).await
        }

        async fn read_all(&self) -> Result<Vec<TaskRecord>> {
            if self.broken_reads.load(Ordering::SeqCst) {
                return Err(TaskError::Storage("read failed".to_string()));
            }
            self.inner.read_all().await
        }

        async fn update(&self, record: &TaskRecord) -> Result<()> {
            self.inner.update(record).await
        }

        async fn set_completed(&self, id: &str, completed: bool) -> Result<()> {
            self.inner.set_completed(id, completed).await
        }

        async fn delete(&self, id: &str) -> Result<()> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn test_committed_write_succeeds_when_reload_fails() {
        let store = Arc::new(UnreadableStore {
            inner: SqliteTaskStore::open_in_memory().unwrap(),
            broken_reads: AtomicBool::new(false),
        });
        let flags = Arc::new(MemoryFlagStore::default());
        let sync = SyncOrchestrator::new(store.clone(), online(), flags);
        let mut app = App::new(sync, store.clone());
        app.load_tasks().await.unwrap();
        let shown = app.tasks.clone();

        store.broken_reads.store(true, Ordering::SeqCst);
        let record = app.create_task(TaskDraft::new("once", "")).await.unwrap();
        assert_eq!(app.tasks, shown);

        let id = shown[0].id.clone();
        app.update_status(&id, true).await.unwrap();
        app.delete_task(&id).await.unwrap();
        assert_eq!(app.tasks, shown);

        store.broken_reads.store(false, Ordering::SeqCst);
        let stored = store.read_all().await.unwrap();
        assert_eq!(stored, vec![record]);
    }
}
