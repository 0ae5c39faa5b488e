//! Embedded schema migrations.
//!
//! Each migration is a SQL script compiled into the binary and identified by
//! a version number. Applied versions are recorded in `schema_migrations`;
//! opening a database runs whatever is newer than the highest recorded
//! version, one transaction per script.

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

/// Migration error types
#[derive(Error, Debug)]
pub enum MigrationError {
    /// The bookkeeping table could not be created or read.
    #[error("Failed to read schema version: {0}")]
    Tracking(#[source] rusqlite::Error),

    /// A migration script failed; its transaction was rolled back.
    #[error("Migration {version} ({name}) failed: {source}")]
    Script {
        version: usize,
        name: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The database was written by a newer build.
    #[error("Database schema version {found} is newer than the supported version {supported}")]
    NewerSchema { found: usize, supported: usize },
}

struct Migration {
    version: usize,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "albums_and_images",
    sql: include_str!("001_initial.sql"),
}];

/// Bring the schema up to date.
///
/// Returns the number of migrations applied; zero for an up-to-date database.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    apply_pending(conn, MIGRATIONS)
}

/// Highest applied migration version, or 0 for an empty database.
pub fn current_version(conn: &Connection) -> Result<usize, MigrationError> {
    ensure_tracking_table(conn)?;
    recorded_version(conn)
}

/// Version the schema reaches after [`run_migrations`].
pub fn latest_version() -> usize {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

fn ensure_tracking_table(conn: &Connection) -> Result<(), MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .map_err(MigrationError::Tracking)
}

fn recorded_version(conn: &Connection) -> Result<usize, MigrationError> {
    conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
        row.get::<_, Option<usize>>(0)
    })
    .optional()
    .map(|v| v.flatten().unwrap_or(0))
    .map_err(MigrationError::Tracking)
}

fn apply_pending(conn: &Connection, migrations: &[Migration]) -> Result<usize, MigrationError> {
    ensure_tracking_table(conn)?;

    let found = recorded_version(conn)?;
    let supported = migrations.last().map(|m| m.version).unwrap_or(0);
    if found > supported {
        return Err(MigrationError::NewerSchema { found, supported });
    }

    let mut applied = 0;
    for migration in migrations.iter().filter(|m| m.version > found) {
        let script_error = |source| MigrationError::Script {
            version: migration.version,
            name: migration.name,
            source,
        };

        let tx = conn.unchecked_transaction().map_err(script_error)?;
        tx.execute_batch(migration.sql).map_err(script_error)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )
        .map_err(script_error)?;
        tx.commit().map_err(script_error)?;

        tracing::info!(
            version = migration.version,
            name = migration.name,
            "Applied database migration"
        );
        applied += 1;
    }

    Ok(applied)
}
