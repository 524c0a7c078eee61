//! Core of TaskVault, a local-first task manager.
//! This crate is the single source of truth for task, archive and lock
//! invariants; front ends only drive it.

pub mod auth;
pub mod backup;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use auth::clock::{Clock, ManualClock, SystemClock};
pub use auth::pin::{validate_new_pin, MIN_PIN_LEN};
pub use auth::signal::{auto_lock, LockSignal, SignalHub, Subscription};
pub use auth::{LockGate, LockState, SESSION_DURATION_MS};
pub use backup::{backup_file_name, BackupDocument, BackupError};
pub use config::AppConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::category::{Category, PRESET_COLORS};
pub use model::task::{Task, TaskId, UNCATEGORIZED};
pub use model::ValidationError;
pub use repo::session_store::{MemorySessionStore, SessionStore, SqliteSessionStore};
pub use repo::task_repo::{
    Collection, RepoError, RepoResult, SqliteTaskRepository, StoreSnapshot, TaskRepository,
};
pub use service::task_service::{
    ControllerError, ControllerResult, TaskController, TaskStats, ARCHIVE_RETENTION_MS,
    UNDO_WINDOW_MS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
