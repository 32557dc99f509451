#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SqliteMigration {
    pub version: i64,
    pub name: &'static str,
    pub up_sql: &'static str,
    pub down_sql: &'static str,
}

const MIGRATION_0001: SqliteMigration = SqliteMigration {
    version: 1,
    name: "client_state",
    up_sql: r#"
CREATE TABLE IF NOT EXISTS client_state (
    state_key TEXT PRIMARY KEY,
    state_value TEXT NOT NULL,
    updated_at_unix INTEGER NOT NULL
);
"#,
    down_sql: r#"
DROP TABLE IF EXISTS client_state;
"#,
};

const MIGRATION_0002: SqliteMigration = SqliteMigration {
    version: 2,
    name: "query_cache_snapshots",
    up_sql: r#"
CREATE TABLE IF NOT EXISTS query_cache_snapshots (
    snapshot_id INTEGER PRIMARY KEY CHECK (snapshot_id = 1),
    entry_count INTEGER NOT NULL,
    payload_json TEXT NOT NULL,
    saved_at_unix INTEGER NOT NULL
);
"#,
    down_sql: r#"
DROP TABLE IF EXISTS query_cache_snapshots;
"#,
};

const MIGRATIONS: [SqliteMigration; 2] = [MIGRATION_0001, MIGRATION_0002];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MigrationDirection {
    Up,
    Down,
}

/// One migration applied in one direction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MigrationStep {
    pub direction: MigrationDirection,
    pub migration: &'static SqliteMigration,
}

impl MigrationStep {
    pub fn sql(&self) -> &'static str {
        match self.direction {
            MigrationDirection::Up => self.migration.up_sql,
            MigrationDirection::Down => self.migration.down_sql,
        }
    }
}

pub fn migrations() -> &'static [SqliteMigration] {
    &MIGRATIONS
}

pub fn current_schema_version() -> i64 {
    MIGRATIONS.last().map(|entry| entry.version).unwrap_or(0)
}

pub fn migration(version: i64) -> Option<&'static SqliteMigration> {
    MIGRATIONS.iter().find(|entry| entry.version == version)
}

/// Steps that take a database from schema version `from` to `to`, in the
/// order they run. Upgrades ascend, downgrades undo the newest first.
pub fn migration_path(from: i64, to: i64) -> Vec<MigrationStep> {
    if to >= from {
        MIGRATIONS
            .iter()
            .filter(|entry| entry.version > from && entry.version <= to)
            .map(|migration| MigrationStep {
                direction: MigrationDirection::Up,
                migration,
            })
            .collect()
    } else {
        MIGRATIONS
            .iter()
            .rev()
            .filter(|entry| entry.version > to && entry.version <= from)
            .map(|migration| MigrationStep {
                direction: MigrationDirection::Down,
                migration,
            })
            .collect()
    }
}
