//! Translation history on SQLite
//!
//! The table is created lazily: the first append that finds no schema creates
//! it and retries exactly once.

mod error;
mod store;

pub use error::{HistoryError, HistoryResult};
pub use store::{HistoryEntry, HistoryStore, NewHistoryEntry};
