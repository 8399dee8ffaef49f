use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Description given to every task imported from the seed endpoint,
/// which carries no description of its own.
pub const SEED_DESCRIPTION: &str = "Default Description Message";

// A task as stored locally
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

// A task that has not been stored yet; the store assigns id and created_at
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            description: description.into(),
            completed: false,
        }
    }
}

// Body returned by the seed endpoint
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SeedDocument {
    pub todos: Vec<SeedItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SeedItem {
    pub id: i64,
    pub todo: String,
    pub completed: bool,
    #[serde(rename = "userId")]
    pub user_id: i64,
}

impl SeedItem {
    /// The remote id and user id are dropped; the store mints its own id.
    pub fn to_draft(&self) -> TaskDraft {
        TaskDraft {
            title: self.todo.clone(),
            description: SEED_DESCRIPTION.to_string(),
            completed: self.completed,
        }
    }
}
