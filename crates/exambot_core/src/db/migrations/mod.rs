//! Versioned schema for the exam database.
//!
//! Every step is a SQL script tagged with the `PRAGMA user_version` it leaves
//! behind. Pending steps share one transaction, so a failing step leaves the
//! file at the version it had before the open.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, Transaction};
use std::cmp::Ordering;

struct SchemaStep {
    version: u32,
    name: &'static str,
    script: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "init",
    script: include_str!("0001_init.sql"),
}];

/// Position of a connection's schema relative to this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    UpToDate,
    Behind { found: u32 },
    Ahead { found: u32 },
}

/// Highest schema version this build can produce.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

/// Compares the stored `user_version` with [`latest_version`].
pub fn schema_state(conn: &Connection) -> DbResult<SchemaState> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    Ok(match found.cmp(&latest_version()) {
        Ordering::Equal => SchemaState::UpToDate,
        Ordering::Less => SchemaState::Behind { found },
        Ordering::Greater => SchemaState::Ahead { found },
    })
}

/// Brings the schema up to [`latest_version`] and returns how many steps ran.
///
/// # Errors
/// - `SchemaTooNew` when the file is ahead of this build.
/// - `Migration` naming the step that failed.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<usize> {
    let found = match schema_state(conn)? {
        SchemaState::UpToDate => return Ok(0),
        SchemaState::Ahead { found } => {
            return Err(DbError::SchemaTooNew {
                found,
                supported: latest_version(),
            })
        }
        SchemaState::Behind { found } => found,
    };

    let tx = conn.transaction()?;
    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > found)
        .collect();
    for step in &pending {
        run_step(&tx, step)?;
    }
    tx.commit()?;
    Ok(pending.len())
}

fn run_step(tx: &Transaction<'_>, step: &SchemaStep) -> DbResult<()> {
    tx.execute_batch(step.script)
        .and_then(|()| tx.pragma_update(None, "user_version", step.version))
        .map_err(|source| DbError::Migration {
            version: step.version,
            source,
        })?;
    info!(
        "event=db_migrate module=db status=ok version={} step={}",
        step.version, step.name
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, run_step, schema_state, SchemaState, SchemaStep};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn steps_are_strictly_increasing() {
        let versions: Vec<u32> = super::SCHEMA_STEPS.iter().map(|step| step.version).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(versions.first(), Some(&1));
    }

    #[test]
    fn fresh_connection_is_behind_then_up_to_date() {
        let mut conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_state(&conn).unwrap(), SchemaState::Behind { found: 0 });

        assert_eq!(apply_migrations(&mut conn).unwrap(), super::SCHEMA_STEPS.len());
        assert_eq!(schema_state(&conn).unwrap(), SchemaState::UpToDate);
        assert_eq!(apply_migrations(&mut conn).unwrap(), 0);
    }

    #[test]
    fn failing_step_is_reported_and_rolled_back() {
        let mut conn = Connection::open_in_memory().unwrap();
        let broken = SchemaStep {
            version: latest_version() + 1,
            name: "broken",
            script: "CREATE TABLE exams_archive (name TEXT); CREATE TABLE;",
        };

        let tx = conn.transaction().unwrap();
        match run_step(&tx, &broken).unwrap_err() {
            DbError::Migration { version, .. } => assert_eq!(version, latest_version() + 1),
            other => panic!("unexpected error: {other}"),
        }
        drop(tx);

        assert_eq!(schema_state(&conn).unwrap(), SchemaState::Behind { found: 0 });
        let archived: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'exams_archive';",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(archived, 0);
    }
}
