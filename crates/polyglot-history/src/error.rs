//! Error types for history storage

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    /// Database file or directory could not be opened
    #[error("Connection error: {0}")]
    Connection(String),

    /// Underlying rusqlite error
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

impl HistoryError {
    /// The statement failed because the history table does not exist yet.
    pub fn is_missing_table(&self) -> bool {
        match self {
            Self::Rusqlite(err) => err.to_string().contains("no such table"),
            Self::Connection(_) => false,
        }
    }
}

pub type HistoryResult<T> = Result<T, HistoryError>;
