pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod flag;
pub mod models;
pub mod parser;
pub mod store;
pub mod sync;

pub use app::App;
pub use error::{Result, TaskError};
pub use models::{TaskDraft, TaskRecord};
