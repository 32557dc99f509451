pub mod migrations;
pub mod store;

pub use migrations::{
    MigrationDirection, MigrationStep, SqliteMigration, current_schema_version, migration,
    migration_path, migrations,
};
pub use store::SqliteStore;
