//! Task lifecycle controller.
//!
//! # Responsibility
//! - Mirror the three collections in memory for the front end.
//! - Drive task transitions: add, complete, undo, delete.
//! - Manage categories, retention cleanup and backup import/export.
//!
//! # Invariants
//! - In-memory state changes only after the matching store call succeeds.
//! - Active and archived mirrors never share an id.
//! - Undo is accepted only within `UNDO_WINDOW_MS` of completion.

use crate::auth::clock::Clock;
use crate::backup::BackupDocument;
use crate::model::category::{default_categories, Category};
use crate::model::task::{Task, UNCATEGORIZED};
use crate::model::ValidationError;
use crate::repo::task_repo::{Collection, RepoError, TaskRepository};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// How long a completed task may be restored.
pub const UNDO_WINDOW_MS: i64 = 60 * 1000;
/// Archived tasks older than this are purged on start.
pub const ARCHIVE_RETENTION_MS: i64 = 30 * 24 * 60 * 60 * 1000;

#[derive(Debug)]
pub enum ControllerError {
    Validation(ValidationError),
    NotFound { collection: Collection, id: String },
    DuplicateKey { collection: Collection, id: String },
    UndoWindowExpired { id: String, completed_at: i64 },
    Persistence(RepoError),
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "`{id}` not found in {collection}"),
            Self::DuplicateKey { collection, id } => {
                write!(f, "duplicate id `{id}` in {collection}")
            }
            Self::UndoWindowExpired { id, .. } => {
                write!(f, "task {id} was completed more than a minute ago")
            }
            Self::Persistence(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ControllerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { collection, id } => Self::NotFound { collection, id },
            RepoError::DuplicateKey { collection, id } => Self::DuplicateKey { collection, id },
            other => Self::Persistence(other),
        }
    }
}

impl From<ValidationError> for ControllerError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Counts shown in the settings summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStats {
    pub active: usize,
    pub archived: usize,
    pub categories: usize,
}

/// Owns the in-memory working set and routes every mutation through the store.
pub struct TaskController<R: TaskRepository, C: Clock> {
    repo: R,
    clock: C,
    tasks: Vec<Task>,
    archived_tasks: Vec<Task>,
    categories: Vec<Category>,
}

impl<R: TaskRepository, C: Clock> TaskController<R, C> {
    /// Creates an empty controller; call [`Self::initialize`] before use.
    pub fn new(repo: R, clock: C) -> Self {
        Self {
            repo,
            clock,
            tasks: Vec::new(),
            archived_tasks: Vec::new(),
            categories: Vec::new(),
        }
    }

    /// Loads every collection, seeds default categories into an empty
    /// store and purges expired archives.
    pub fn initialize(&mut self) -> ControllerResult<()> {
        let result = self.load_all();
        match &result {
            Ok(()) => info!(
                "event=controller_init module=service status=ok tasks={} archived={} categories={}",
                self.tasks.len(),
                self.archived_tasks.len(),
                self.categories.len()
            ),
            Err(err) => error!("event=controller_init module=service status=error error={err}"),
        }
        result
    }

    fn load_all(&mut self) -> ControllerResult<()> {
        let mut categories = self.repo.list_categories()?;
        if categories.is_empty() {
            for category in default_categories() {
                self.repo.add_category(&category)?;
                categories.push(category);
            }
        }
        self.categories = categories;
        self.tasks = self.repo.list_tasks()?;
        self.archived_tasks = self.repo.list_archived_tasks()?;
        self.cleanup_old_archives()?;
        Ok(())
    }

    /// Captures a new task.
    ///
    /// Returns `Ok(None)` without touching storage when `title` is blank.
    /// Without a non-blank `category_id` the first category is used, then
    /// [`UNCATEGORIZED`].
    pub fn add_task(
        &mut self,
        title: &str,
        category_id: Option<&str>,
    ) -> ControllerResult<Option<Task>> {
        if title.trim().is_empty() {
            return Ok(None);
        }
        let category = category_id
            .filter(|id| !id.trim().is_empty())
            .map(str::to_string)
            .or_else(|| self.categories.first().map(|c| c.id.clone()))
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let task = Task::new(title, category, self.clock.now_ms());

        self.persist("task_add", &task.id, |repo| repo.add_task(&task))?;
        self.tasks.insert(0, task.clone());
        Ok(Some(task))
    }

    /// Archives the active task `id`, stamped with the current time.
    pub fn complete_task(&mut self, id: &str) -> ControllerResult<Task> {
        let position = self.active_position(id)?;
        let completed = self.tasks[position].completed(self.clock.now_ms());

        self.persist("task_complete", id, |repo| repo.archive_task(&completed))?;
        self.tasks.remove(position);
        self.archived_tasks.insert(0, completed.clone());
        Ok(completed)
    }

    /// Whether `task` is archived and still inside the undo window.
    pub fn can_undo(&self, task: &Task) -> bool {
        task.completed_at
            .is_some_and(|at| self.clock.now_ms().saturating_sub(at) < UNDO_WINDOW_MS)
    }

    /// Moves archived task `id` back to the active list.
    ///
    /// # Errors
    /// - `NotFound` when `id` is not archived.
    /// - `UndoWindowExpired` once `UNDO_WINDOW_MS` has passed since completion.
    pub fn undo_complete(&mut self, id: &str) -> ControllerResult<Task> {
        let position = self
            .archived_tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| ControllerError::NotFound {
                collection: Collection::ArchivedTasks,
                id: id.to_string(),
            })?;
        let archived = &self.archived_tasks[position];
        if !self.can_undo(archived) {
            return Err(ControllerError::UndoWindowExpired {
                id: id.to_string(),
                completed_at: archived.completed_at.unwrap_or_default(),
            });
        }
        let restored = archived.reopened();

        self.persist("task_undo", id, |repo| repo.restore_task(&restored))?;
        self.archived_tasks.remove(position);
        self.tasks.insert(0, restored.clone());
        Ok(restored)
    }

    /// Permanently deletes active task `id`; a missing id is a no-op.
    pub fn delete_task(&mut self, id: &str) -> ControllerResult<()> {
        self.persist("task_delete", id, |repo| repo.delete_task(id))?;
        self.tasks.retain(|task| task.id != id);
        Ok(())
    }

    /// Adds a category colored by its insertion index.
    pub fn add_category(&mut self, name: &str) -> ControllerResult<Category> {
        let category = Category::new(name, self.categories.len());
        category.validate()?;

        self.persist("category_add", &category.id, |repo| {
            repo.add_category(&category)
        })?;
        self.categories.push(category.clone());
        Ok(category)
    }

    /// Deletes a category. Tasks keep their (now orphaned) category id.
    pub fn delete_category(&mut self, id: &str) -> ControllerResult<()> {
        self.persist("category_delete", id, |repo| repo.delete_category(id))?;
        self.categories.retain(|category| category.id != id);
        Ok(())
    }

    /// Purges archived tasks completed more than 30 days ago and reloads
    /// the archived mirror. Returns how many were removed.
    pub fn cleanup_old_archives(&mut self) -> ControllerResult<usize> {
        let cutoff = self.clock.now_ms() - ARCHIVE_RETENTION_MS;
        let removed = self.persist("archive_cleanup", "-", |repo| {
            repo.delete_archived_before(cutoff)
        })?;
        self.archived_tasks = self.repo.list_archived_tasks()?;
        if removed > 0 {
            info!("event=archive_cleanup module=service status=ok removed={removed}");
        }
        Ok(removed)
    }

    /// Replaces all stored data with `document`, atomically.
    pub fn import_data(&mut self, document: BackupDocument) -> ControllerResult<()> {
        let snapshot = document.into_snapshot();
        self.persist("import", "-", |repo| repo.replace_all(&snapshot))?;
        info!(
            "event=import module=service status=ok tasks={} archived={} categories={}",
            snapshot.tasks.len(),
            snapshot.archived_tasks.len(),
            snapshot.categories.len()
        );
        self.tasks = snapshot.tasks;
        self.archived_tasks = snapshot.archived_tasks;
        self.categories = snapshot.categories;
        // Same order the store lists them in after a reload.
        self.tasks
            .sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id)));
        self.archived_tasks
            .sort_by(|a, b| (b.completed_at, &b.id).cmp(&(a.completed_at, &a.id)));
        Ok(())
    }

    /// Serializable snapshot of the in-memory working set.
    pub fn export_data(&self) -> BackupDocument {
        let exported_at = chrono::DateTime::from_timestamp_millis(self.clock.now_ms())
            .unwrap_or_default();
        BackupDocument::new(
            self.tasks.clone(),
            self.categories.clone(),
            self.archived_tasks.clone(),
            exported_at,
        )
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn archived_tasks(&self) -> &[Task] {
        &self.archived_tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn tasks_in_category<'a>(&'a self, category_id: &'a str) -> impl Iterator<Item = &'a Task> {
        self.tasks
            .iter()
            .filter(move |task| task.category == category_id)
    }

    /// Display name for a category id; orphaned ids render as themselves.
    pub fn category_label<'a>(&'a self, category_id: &'a str) -> &'a str {
        self.categories
            .iter()
            .find(|category| category.id == category_id)
            .map_or(category_id, |category| category.name.as_str())
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats {
            active: self.tasks.len(),
            archived: self.archived_tasks.len(),
            categories: self.categories.len(),
        }
    }

    fn active_position(&self, id: &str) -> ControllerResult<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| ControllerError::NotFound {
                collection: Collection::Tasks,
                id: id.to_string(),
            })
    }

    fn persist<T>(
        &self,
        event: &str,
        id: &str,
        op: impl FnOnce(&R) -> Result<T, RepoError>,
    ) -> ControllerResult<T> {
        op(&self.repo).map_err(|err| {
            error!("event={event} module=service status=error id={id} error={err}");
            ControllerError::from(err)
        })
    }
}
