//! Schema migrations for the task store.
//!
//! # Responsibility
//! - Create the `tasks`, `archived_tasks` and `categories` collections plus
//!   their secondary indexes on first open.
//! - Create the `session_kv` slot used by the lock gate.
//!
//! # Invariants
//! - Steps are listed in strictly increasing `version` order.
//! - `PRAGMA user_version` always equals the last applied step.
//! - Re-opening an up-to-date database never touches existing rows.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

struct MigrationStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const STEPS: &[MigrationStep] = &[
    MigrationStep {
        version: 1,
        name: "task_collections",
        sql: include_str!("0001_init.sql"),
    },
    MigrationStep {
        version: 2,
        name: "session_kv",
        sql: include_str!("0002_session_kv.sql"),
    },
];

/// Returns the newest schema version this build can open.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to [`latest_version`] inside one transaction.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was written by a newer build.
/// - `DbError::Sqlite` when any step fails; nothing is applied in that case.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let on_disk = read_user_version(conn)?;
    let latest = latest_version();

    if on_disk > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: on_disk,
            latest_supported: latest,
        });
    }

    let pending: Vec<&MigrationStep> = STEPS.iter().filter(|step| step.version > on_disk).collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} steps={}",
        on_disk,
        latest,
        pending
            .iter()
            .map(|step| step.name)
            .collect::<Vec<_>>()
            .join(",")
    );
    Ok(())
}

fn read_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?)
}

#[cfg(test)]
mod tests {
    use super::{latest_version, STEPS};

    #[test]
    fn steps_are_strictly_increasing() {
        let versions: Vec<u32> = STEPS.iter().map(|step| step.version).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(latest_version(), *versions.last().unwrap());
    }
}
