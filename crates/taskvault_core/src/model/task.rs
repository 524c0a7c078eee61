//! Task record.
//!
//! Serialized field names follow the backup file format (`createdAt`,
//! `completedAt`, `isCompleted`).

use super::ValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category id used when a task is captured before any category exists.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Opaque task identifier. Generated ids are time-ordered; imported ids
/// are kept verbatim.
pub type TaskId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Category id. May reference a category that no longer exists.
    pub category: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Only set while archived.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub is_completed: bool,
}

impl Task {
    /// Creates an active task with a fresh time-ordered id.
    ///
    /// `title` is trimmed; callers decide what an empty title means.
    pub fn new(title: &str, category: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            title: title.trim().to_string(),
            category: category.into(),
            created_at,
            completed_at: None,
            is_completed: false,
        }
    }

    /// Returns the archived form of this task, stamped at `completed_at`.
    pub fn completed(&self, completed_at: i64) -> Self {
        Self {
            completed_at: Some(completed_at),
            is_completed: true,
            ..self.clone()
        }
    }

    /// Returns the active form of this task with completion cleared.
    pub fn reopened(&self) -> Self {
        Self {
            completed_at: None,
            is_completed: false,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.is_completed != self.completed_at.is_some() {
            return Err(ValidationError::CompletionMismatch {
                id: self.id.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, UNCATEGORIZED};
    use crate::model::ValidationError;

    #[test]
    fn new_task_is_trimmed_and_active() {
        let task = Task::new("  buy milk \n", UNCATEGORIZED, 1_000);
        assert_eq!(task.title, "buy milk");
        assert!(!task.is_completed);
        assert_eq!(task.completed_at, None);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn generated_ids_are_unique() {
        let first = Task::new("a", UNCATEGORIZED, 1);
        let second = Task::new("b", UNCATEGORIZED, 1);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn completed_and_reopened_keep_identity() {
        let task = Task::new("write report", "work", 10);
        let done = task.completed(20);
        assert_eq!(done.id, task.id);
        assert_eq!(done.completed_at, Some(20));
        assert!(done.is_completed);
        assert_eq!(done.reopened(), task);
    }

    #[test]
    fn validate_rejects_half_completed_state() {
        let mut task = Task::new("x", "work", 10);
        task.is_completed = true;
        assert!(matches!(
            task.validate(),
            Err(ValidationError::CompletionMismatch { .. })
        ));
    }

    #[test]
    fn serializes_with_backup_field_names() {
        let task = Task::new("x", "work", 10).completed(20);
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["createdAt"], 10);
        assert_eq!(json["completedAt"], 20);
        assert_eq!(json["isCompleted"], true);
    }
}
