use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("task not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, TaskError>;

impl TaskError {
    /// Fixed message shown to the user for each kind of failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            TaskError::NetworkUnavailable(_) => "We're having trouble connecting. Please try again.",
            TaskError::InvalidResponse(_) => "We couldn't process your request. Please try again.",
            TaskError::Storage(_) => "Oops, something went wrong. Please try again later.",
            TaskError::NotFound(_) => "That task no longer exists.",
        }
    }
}

impl From<rusqlite::Error> for TaskError {
    fn from(err: rusqlite::Error) -> Self {
        TaskError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for TaskError {
    fn from(err: std::io::Error) -> Self {
        TaskError::Storage(err.to_string())
    }
}

impl From<tokio::task::JoinError> for TaskError {
    fn from(err: tokio::task::JoinError) -> Self {
        TaskError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for TaskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_status() || err.is_decode() {
            TaskError::InvalidResponse(err.to_string())
        } else {
            // timeouts, refused connections and malformed requests
            TaskError::NetworkUnavailable(err.to_string())
        }
    }
}
