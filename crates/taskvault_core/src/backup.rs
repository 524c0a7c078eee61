//! Backup document for JSON export/import.
//!
//! # Responsibility
//! - Render the in-memory working set as a pretty-printed JSON document.
//! - Parse and shape-check an incoming document before any store mutation.
//!
//! # Invariants
//! - `tasks` and `categories` are required on import; `archivedTasks`
//!   defaults to empty.
//! - Parsing never touches storage.

use crate::model::category::Category;
use crate::model::task::Task;
use crate::repo::task_repo::StoreSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const BACKUP_FORMAT_VERSION: &str = "1.0";

#[derive(Debug)]
pub enum BackupError {
    /// Input is not JSON at all.
    MalformedJson(serde_json::Error),
    /// JSON is well-formed but misses required keys or has wrong shapes.
    InvalidFormat(String),
    Serialize(serde_json::Error),
}

impl Display for BackupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedJson(err) => write!(f, "Invalid JSON file: {err}"),
            Self::InvalidFormat(details) => write!(f, "Invalid backup file format: {details}"),
            Self::Serialize(err) => write!(f, "failed to render backup: {err}"),
        }
    }
}

impl Error for BackupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedJson(err) | Self::Serialize(err) => Some(err),
            Self::InvalidFormat(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
    #[serde(default)]
    pub archived_tasks: Vec<Task>,
    /// RFC 3339 export timestamp.
    #[serde(default)]
    pub export_date: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl BackupDocument {
    /// Builds an export document stamped with `export_date`.
    pub fn new(
        tasks: Vec<Task>,
        categories: Vec<Category>,
        archived_tasks: Vec<Task>,
        export_date: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            tasks,
            categories,
            archived_tasks,
            export_date: Some(export_date.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
            version: Some(BACKUP_FORMAT_VERSION.to_string()),
        }
    }

    /// Parses a backup file body.
    ///
    /// # Errors
    /// - `MalformedJson` when `input` is not JSON.
    /// - `InvalidFormat` when `tasks` or `categories` is missing or a record
    ///   has the wrong shape.
    pub fn from_json(input: &str) -> Result<Self, BackupError> {
        let value: Value = serde_json::from_str(input).map_err(BackupError::MalformedJson)?;
        let object = value
            .as_object()
            .ok_or_else(|| BackupError::InvalidFormat("top level must be an object".into()))?;
        for key in ["tasks", "categories"] {
            if !object.contains_key(key) {
                return Err(BackupError::InvalidFormat(format!("missing `{key}`")));
            }
        }
        serde_json::from_value(value).map_err(|err| BackupError::InvalidFormat(err.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, BackupError> {
        serde_json::to_string_pretty(self).map_err(BackupError::Serialize)
    }

    pub fn into_snapshot(self) -> StoreSnapshot {
        StoreSnapshot {
            tasks: self.tasks,
            categories: self.categories,
            archived_tasks: self.archived_tasks,
        }
    }
}

/// Default file name for an export taken at `now_ms`.
pub fn backup_file_name(now_ms: i64) -> String {
    format!("tasks-backup-{now_ms}.json")
}

#[cfg(test)]
mod tests {
    use super::{backup_file_name, BackupDocument, BackupError, BACKUP_FORMAT_VERSION};
    use chrono::TimeZone;

    #[test]
    fn archived_tasks_default_to_empty() {
        let doc = BackupDocument::from_json(r#"{"tasks": [], "categories": []}"#).unwrap();
        assert!(doc.archived_tasks.is_empty());
        assert_eq!(doc.version, None);
    }

    #[test]
    fn missing_categories_is_invalid_format() {
        let err = BackupDocument::from_json(r#"{"tasks": []}"#).unwrap_err();
        assert!(matches!(err, BackupError::InvalidFormat(_)));
        assert!(err.to_string().starts_with("Invalid backup file format"));
    }

    #[test]
    fn garbage_is_malformed_json() {
        let err = BackupDocument::from_json("{not json").unwrap_err();
        assert!(matches!(err, BackupError::MalformedJson(_)));
    }

    #[test]
    fn parses_browser_export() {
        let input = r##"{
          "tasks": [{"id": "1712", "title": "call mom", "category": "personal",
                     "createdAt": 1712, "isCompleted": false}],
          "categories": [{"id": "personal", "name": "Personal", "color": "#10B981"}],
          "archivedTasks": [{"id": "1700", "title": "old", "category": "gone",
                             "createdAt": 1700, "completedAt": 1705, "isCompleted": true}],
          "exportDate": "2024-04-10T10:00:00.000Z",
          "version": "1.0"
        }"##;
        let doc = BackupDocument::from_json(input).unwrap();
        assert_eq!(doc.tasks[0].title, "call mom");
        assert_eq!(doc.archived_tasks[0].completed_at, Some(1705));
        assert_eq!(doc.categories[0].color, "#10B981");
    }

    #[test]
    fn new_document_carries_metadata() {
        let at = chrono::Utc.timestamp_millis_opt(0).unwrap();
        let doc = BackupDocument::new(Vec::new(), Vec::new(), Vec::new(), at);
        assert_eq!(doc.export_date.as_deref(), Some("1970-01-01T00:00:00.000Z"));
        assert_eq!(doc.version.as_deref(), Some(BACKUP_FORMAT_VERSION));
        let json = doc.to_json_pretty().unwrap();
        assert!(json.contains("\n  \"archivedTasks\""));
        assert_eq!(backup_file_name(42), "tasks-backup-42.json");
    }
}
