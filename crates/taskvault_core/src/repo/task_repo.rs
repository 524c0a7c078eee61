//! Persistence store for tasks, archived tasks and categories.
//!
//! # Responsibility
//! - Provide keyed CRUD over the three collections.
//! - Own the composite moves between active and archived collections.
//!
//! # Invariants
//! - Write paths validate records before any SQL mutation.
//! - `archive_task`, `restore_task` and `replace_all` run in a single
//!   transaction: either every step lands or none does.
//! - Active rows are never completed; archived rows always carry `completed_at`.
//! - Deleting a missing id is a no-op, not an error.

use crate::db::DbError;
use crate::model::category::Category;
use crate::model::task::Task;
use crate::model::ValidationError;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const TASK_COLUMNS: &str = "id, title, category, created_at";
const ARCHIVED_COLUMNS: &str = "id, title, category, created_at, completed_at";

pub type RepoResult<T> = Result<T, RepoError>;

/// One of the three independently keyed collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Tasks,
    ArchivedTasks,
    Categories,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::ArchivedTasks => "archived_tasks",
            Self::Categories => "categories",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store-level error.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    DuplicateKey { collection: Collection, id: String },
    NotFound { collection: Collection, id: String },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateKey { collection, id } => {
                write!(f, "duplicate id `{id}` in {collection}")
            }
            Self::NotFound { collection, id } => write!(f, "`{id}` not found in {collection}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Full contents of the store, used for destructive import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub tasks: Vec<Task>,
    pub categories: Vec<Category>,
    pub archived_tasks: Vec<Task>,
}

/// Repository interface over the three task collections.
pub trait TaskRepository {
    /// Inserts an active task. Fails with `DuplicateKey` if the id exists.
    fn add_task(&self, task: &Task) -> RepoResult<()>;
    /// Lists active tasks, newest first.
    fn list_tasks(&self) -> RepoResult<Vec<Task>>;
    fn get_task(&self, id: &str) -> RepoResult<Option<Task>>;
    /// Inserts or replaces an active task by id.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn delete_task(&self, id: &str) -> RepoResult<()>;

    /// Inserts an archived task. Fails with `DuplicateKey` if the id exists.
    fn add_archived_task(&self, task: &Task) -> RepoResult<()>;
    /// Lists archived tasks, most recently completed first.
    fn list_archived_tasks(&self) -> RepoResult<Vec<Task>>;
    fn get_archived_task(&self, id: &str) -> RepoResult<Option<Task>>;
    fn delete_archived_task(&self, id: &str) -> RepoResult<()>;
    /// Deletes archived tasks completed strictly before `cutoff_ms`.
    fn delete_archived_before(&self, cutoff_ms: i64) -> RepoResult<usize>;

    /// Inserts a category. Fails with `DuplicateKey` if the id exists.
    fn add_category(&self, category: &Category) -> RepoResult<()>;
    /// Lists categories in insertion order.
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    fn delete_category(&self, id: &str) -> RepoResult<()>;

    /// Moves a completed task from active to archived in one transaction.
    fn archive_task(&self, task: &Task) -> RepoResult<()>;
    /// Moves a reopened task from archived back to active in one transaction.
    fn restore_task(&self, task: &Task) -> RepoResult<()>;
    /// Replaces every collection with `snapshot` in one transaction.
    ///
    /// A snapshot that lists the same id as both active and archived is
    /// rejected with `DuplicateKey` before anything is deleted.
    fn replace_all(&self, snapshot: &StoreSnapshot) -> RepoResult<()>;
}

/// SQLite-backed task store.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Wraps a connection returned by [`crate::db::open_db`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn immediate(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn add_task(&self, task: &Task) -> RepoResult<()> {
        insert_active(self.conn, task)
    }

    fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_active_row(row)?);
        }
        Ok(tasks)
    }

    fn get_task(&self, id: &str) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_active_row(row)?)),
            None => Ok(None),
        }
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        ensure_active(task)?;
        self.conn.execute(
            "INSERT INTO tasks (id, title, category, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                category = excluded.category,
                created_at = excluded.created_at;",
            params![task.id, task.title, task.category, task.created_at],
        )?;
        Ok(())
    }

    fn delete_task(&self, id: &str) -> RepoResult<()> {
        self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn add_archived_task(&self, task: &Task) -> RepoResult<()> {
        insert_archived(self.conn, task)
    }

    fn list_archived_tasks(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ARCHIVED_COLUMNS} FROM archived_tasks ORDER BY completed_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_archived_row(row)?);
        }
        Ok(tasks)
    }

    fn get_archived_task(&self, id: &str) -> RepoResult<Option<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ARCHIVED_COLUMNS} FROM archived_tasks WHERE id = ?1;"
        ))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_archived_row(row)?)),
            None => Ok(None),
        }
    }

    fn delete_archived_task(&self, id: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM archived_tasks WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn delete_archived_before(&self, cutoff_ms: i64) -> RepoResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM archived_tasks WHERE completed_at < ?1;",
            [cutoff_ms],
        )?;
        Ok(removed)
    }

    fn add_category(&self, category: &Category) -> RepoResult<()> {
        insert_category(self.conn, category)
    }

    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM categories ORDER BY position ASC, id ASC;")?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get("id")?,
                    name: row.get("name")?,
                    color: row.get("color")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    fn delete_category(&self, id: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM categories WHERE id = ?1;", [id])?;
        Ok(())
    }

    fn archive_task(&self, task: &Task) -> RepoResult<()> {
        let tx = self.immediate()?;
        insert_archived(&tx, task)?;
        tx.execute("DELETE FROM tasks WHERE id = ?1;", [task.id.as_str()])?;
        tx.commit()?;
        Ok(())
    }

    fn restore_task(&self, task: &Task) -> RepoResult<()> {
        let tx = self.immediate()?;
        let removed = tx.execute(
            "DELETE FROM archived_tasks WHERE id = ?1;",
            [task.id.as_str()],
        )?;
        if removed == 0 {
            return Err(RepoError::NotFound {
                collection: Collection::ArchivedTasks,
                id: task.id.clone(),
            });
        }
        insert_active(&tx, task)?;
        tx.commit()?;
        Ok(())
    }

    fn replace_all(&self, snapshot: &StoreSnapshot) -> RepoResult<()> {
        ensure_disjoint(snapshot)?;
        let tx = self.immediate()?;
        tx.execute_batch(
            "DELETE FROM tasks;
             DELETE FROM archived_tasks;
             DELETE FROM categories;",
        )?;
        for category in &snapshot.categories {
            insert_category(&tx, category)?;
        }
        for task in &snapshot.tasks {
            insert_active(&tx, task)?;
        }
        for task in &snapshot.archived_tasks {
            insert_archived(&tx, task)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn ensure_disjoint(snapshot: &StoreSnapshot) -> RepoResult<()> {
    let active: HashSet<&str> = snapshot.tasks.iter().map(|task| task.id.as_str()).collect();
    match snapshot
        .archived_tasks
        .iter()
        .find(|task| active.contains(task.id.as_str()))
    {
        Some(task) => Err(RepoError::DuplicateKey {
            collection: Collection::ArchivedTasks,
            id: task.id.clone(),
        }),
        None => Ok(()),
    }
}

fn ensure_active(task: &Task) -> RepoResult<()> {
    task.validate()?;
    if task.is_completed {
        return Err(ValidationError::WrongCollection {
            id: task.id.clone(),
            collection: Collection::Tasks.as_str(),
        }
        .into());
    }
    Ok(())
}

fn ensure_archived(task: &Task) -> RepoResult<i64> {
    task.validate()?;
    task.completed_at.ok_or_else(|| {
        ValidationError::WrongCollection {
            id: task.id.clone(),
            collection: Collection::ArchivedTasks.as_str(),
        }
        .into()
    })
}

fn insert_active(conn: &Connection, task: &Task) -> RepoResult<()> {
    ensure_active(task)?;
    conn.execute(
        "INSERT INTO tasks (id, title, category, created_at) VALUES (?1, ?2, ?3, ?4);",
        params![task.id, task.title, task.category, task.created_at],
    )
    .map_err(|err| map_insert_error(err, Collection::Tasks, &task.id))?;
    Ok(())
}

fn insert_archived(conn: &Connection, task: &Task) -> RepoResult<()> {
    let completed_at = ensure_archived(task)?;
    conn.execute(
        "INSERT INTO archived_tasks (id, title, category, created_at, completed_at)
         VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            task.id,
            task.title,
            task.category,
            task.created_at,
            completed_at
        ],
    )
    .map_err(|err| map_insert_error(err, Collection::ArchivedTasks, &task.id))?;
    Ok(())
}

fn insert_category(conn: &Connection, category: &Category) -> RepoResult<()> {
    category.validate()?;
    conn.execute(
        "INSERT INTO categories (id, name, color, position)
         VALUES (?1, ?2, ?3, (SELECT COALESCE(MAX(position), -1) + 1 FROM categories));",
        params![category.id, category.name, category.color],
    )
    .map_err(|err| map_insert_error(err, Collection::Categories, &category.id))?;
    Ok(())
}

fn map_insert_error(err: rusqlite::Error, collection: Collection, id: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(
                failure.extended_code,
                rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            ) =>
        {
            RepoError::DuplicateKey {
                collection,
                id: id.to_string(),
            }
        }
        _ => err.into(),
    }
}

fn parse_active_row(row: &Row<'_>) -> RepoResult<Task> {
    let task = Task {
        id: row.get("id")?,
        title: row.get("title")?,
        category: row.get("category")?,
        created_at: row.get("created_at")?,
        completed_at: None,
        is_completed: false,
    };
    task.validate()
        .map_err(|err| RepoError::InvalidData(format!("tasks row `{}`: {err}", task.id)))?;
    Ok(task)
}

fn parse_archived_row(row: &Row<'_>) -> RepoResult<Task> {
    let task = Task {
        id: row.get("id")?,
        title: row.get("title")?,
        category: row.get("category")?,
        created_at: row.get("created_at")?,
        completed_at: Some(row.get("completed_at")?),
        is_completed: true,
    };
    task.validate().map_err(|err| {
        RepoError::InvalidData(format!("archived_tasks row `{}`: {err}", task.id))
    })?;
    Ok(task)
}
