//! Domain records owned by the task store.
//!
//! # Responsibility
//! - Define `Task` and `Category`, the only records persisted by core.
//! - Keep shape validation next to the types so every write path shares it.
//!
//! # Invariants
//! - A task lives in exactly one collection: active or archived.
//! - `completed_at` is present iff `is_completed` is true.

pub mod category;
pub mod task;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Shape violation detected before a record reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyId,
    EmptyTitle,
    EmptyCategoryName,
    /// `is_completed` and `completed_at` disagree.
    CompletionMismatch { id: String },
    /// Record completion state does not match the target collection.
    WrongCollection { id: String, collection: &'static str },
    /// Caller-side PIN rule (length or confirmation).
    Pin(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "id cannot be empty"),
            Self::EmptyTitle => write!(f, "task title cannot be empty"),
            Self::EmptyCategoryName => write!(f, "category name cannot be empty"),
            Self::CompletionMismatch { id } => write!(
                f,
                "task {id}: completed_at must be set exactly when is_completed is true"
            ),
            Self::WrongCollection { id, collection } => {
                write!(f, "task {id} cannot be stored in the {collection} collection")
            }
            Self::Pin(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ValidationError {}
