use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};

use crate::cache::DehydratedState;
use crate::models::{CoreError, CoreErrorKind};
use crate::persistence::{
    LAST_SEARCH_TERM_KEY, LastSearchStore, MigrationStore, PersistenceResult,
    QueryCacheSnapshotStore,
};
use crate::sqlite::migrations::{
    MigrationDirection, MigrationStep, current_schema_version, migration, migration_path,
};

/// One row per applied migration; the highest version is the schema version.
const VERSION_LEDGER: &str = "tunescout_schema_migrations";

pub struct SqliteStore {
    database_path: PathBuf,
}

impl SqliteStore {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
        }
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// What `migrate_to_latest` would run against a database at `from_version`.
    pub fn planned_steps(&self, from_version: i64) -> Vec<MigrationStep> {
        migration_path(from_version, current_schema_version())
    }

    pub fn migrate_to_latest(&self) -> PersistenceResult<()> {
        self.apply_migration(current_schema_version())
    }

    fn with_connection<T>(
        &self,
        operation_name: &str,
        operation: impl FnOnce(&mut Connection) -> rusqlite::Result<T>,
    ) -> PersistenceResult<T> {
        let mut connection =
            connect(&self.database_path).map_err(|error| sqlite_failure(operation_name, error))?;
        operation(&mut connection).map_err(|error| sqlite_failure(operation_name, error))
    }

    fn read_state(&self, operation_name: &str, key: &str) -> PersistenceResult<Option<String>> {
        self.with_connection(operation_name, |connection| {
            require_schema(connection)?;
            connection
                .query_row(
                    "SELECT state_value FROM client_state WHERE state_key = ?1",
                    [key],
                    |row| row.get(0),
                )
                .optional()
        })
    }

    fn write_state(&self, operation_name: &str, key: &str, value: &str) -> PersistenceResult<()> {
        self.with_connection(operation_name, |connection| {
            require_schema(connection)?;
            connection.execute(
                "
INSERT INTO client_state (state_key, state_value, updated_at_unix)
VALUES (?1, ?2, strftime('%s', 'now'))
ON CONFLICT(state_key) DO UPDATE SET
    state_value = excluded.state_value,
    updated_at_unix = excluded.updated_at_unix
",
                (key, value),
            )?;
            Ok(())
        })
    }
}

impl MigrationStore for SqliteStore {
    fn current_version(&self) -> PersistenceResult<i64> {
        self.with_connection("current_version", |connection| schema_version(connection))
    }

    fn apply_migration(&self, target_version: i64) -> PersistenceResult<()> {
        let known = target_version == 0 || migration(target_version).is_some();
        if !known {
            return Err(storage_failure(
                "apply_migration",
                format!("no schema version {target_version}"),
            ));
        }

        self.with_connection("apply_migration", |connection| {
            let from_version = schema_version(connection)?;
            let (steps, record) = if from_version == target_version {
                // Idempotent DDL: replaying it restores tables dropped behind
                // the ledger's back.
                (migration_path(0, target_version), false)
            } else {
                (migration_path(from_version, target_version), true)
            };

            for step in steps {
                run_step(connection, step, record)?;
            }
            Ok(())
        })
    }
}

impl LastSearchStore for SqliteStore {
    fn last_search_term(&self) -> PersistenceResult<Option<String>> {
        self.read_state("last_search_term", LAST_SEARCH_TERM_KEY)
    }

    fn set_last_search_term(&self, term: &str) -> PersistenceResult<()> {
        if term.trim().is_empty() {
            return Err(CoreError::new(
                CoreErrorKind::InvalidInput,
                "last search term must not be empty",
            ));
        }
        self.write_state("set_last_search_term", LAST_SEARCH_TERM_KEY, term)
    }
}

impl QueryCacheSnapshotStore for SqliteStore {
    fn save_snapshot(&self, state: &DehydratedState) -> PersistenceResult<()> {
        let payload = state
            .to_json()
            .map_err(|error| storage_failure("save_snapshot", error.message))?;
        let entry_count = i64::try_from(state.entries.len())
            .map_err(|_| storage_failure("save_snapshot", "snapshot entry count overflow"))?;

        self.with_connection("save_snapshot", |connection| {
            require_schema(connection)?;
            connection.execute(
                "
INSERT INTO query_cache_snapshots (snapshot_id, entry_count, payload_json, saved_at_unix)
VALUES (1, ?1, ?2, strftime('%s', 'now'))
ON CONFLICT(snapshot_id) DO UPDATE SET
    entry_count = excluded.entry_count,
    payload_json = excluded.payload_json,
    saved_at_unix = excluded.saved_at_unix
",
                (entry_count, payload.as_str()),
            )?;
            Ok(())
        })
    }

    fn load_snapshot(&self) -> PersistenceResult<Option<DehydratedState>> {
        let payload: Option<String> = self.with_connection("load_snapshot", |connection| {
            require_schema(connection)?;
            connection
                .query_row(
                    "SELECT payload_json FROM query_cache_snapshots WHERE snapshot_id = 1",
                    [],
                    |row| row.get(0),
                )
                .optional()
        })?;

        payload
            .map(|raw| {
                DehydratedState::from_json(&raw)
                    .map_err(|error| storage_failure("load_snapshot", error.message))
            })
            .transpose()
    }
}

fn connect(database_path: &Path) -> rusqlite::Result<Connection> {
    let parent = database_path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir)
            .map_err(|error| rusqlite::Error::ToSqlConversionFailure(error.into()))?;
    }
    let connection = Connection::open(database_path)?;
    connection.execute_batch(&format!(
        "
CREATE TABLE IF NOT EXISTS {VERSION_LEDGER} (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at_unix INTEGER NOT NULL
);
"
    ))?;
    Ok(connection)
}

fn schema_version(connection: &Connection) -> rusqlite::Result<i64> {
    connection.query_row(
        &format!("SELECT COALESCE(MAX(version), 0) FROM {VERSION_LEDGER}"),
        [],
        |row| row.get(0),
    )
}

/// Client state tables exist only after the first migration.
fn require_schema(connection: &Connection) -> rusqlite::Result<()> {
    if schema_version(connection)? > 0 {
        return Ok(());
    }
    Err(rusqlite::Error::ToSqlConversionFailure(
        std::io::Error::other("schema not migrated; run migrate_to_latest first").into(),
    ))
}

/// Runs one step in its own transaction. With `record` set, the ledger gains
/// or loses the step's version row alongside the DDL.
fn run_step(
    connection: &mut Connection,
    step: MigrationStep,
    record: bool,
) -> rusqlite::Result<()> {
    let transaction = connection.transaction()?;
    transaction.execute_batch(step.sql())?;
    if record {
        let migration = step.migration;
        match step.direction {
            MigrationDirection::Up => transaction.execute(
                &format!(
                    "INSERT INTO {VERSION_LEDGER} (version, name, applied_at_unix)
                     VALUES (?1, ?2, strftime('%s', 'now'))"
                ),
                (migration.version, migration.name),
            )?,
            MigrationDirection::Down => transaction.execute(
                &format!("DELETE FROM {VERSION_LEDGER} WHERE version = ?1"),
                [migration.version],
            )?,
        };
    }
    transaction.commit()
}

fn sqlite_failure(operation: &str, error: rusqlite::Error) -> CoreError {
    storage_failure(operation, error.to_string())
}

fn storage_failure(operation: &str, message: impl AsRef<str>) -> CoreError {
    CoreError::new(
        CoreErrorKind::StorageFailure,
        format!("sqlite {operation} failed: {}", message.as_ref()),
    )
}
