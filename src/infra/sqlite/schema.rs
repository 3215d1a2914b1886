use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Unicode lower-casing, matching `str::to_lowercase`. SQLite's own `lower`
/// only folds ASCII.
pub const FOLD_FN: &str = "fold";
/// `str::trim` followed by `str::to_lowercase`.
pub const FOLD_TRIM_FN: &str = "fold_trim";

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    register_text_functions(&conn)?;
    Ok(conn)
}

fn register_text_functions(conn: &Connection) -> Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_scalar_function(FOLD_FN, 1, flags, |ctx| {
        let value: Option<String> = ctx.get(0)?;
        Ok(value.map(|value| value.to_lowercase()))
    })
    .with_context(|| format!("failed to register sql function {FOLD_FN}"))?;
    conn.create_scalar_function(FOLD_TRIM_FN, 1, flags, |ctx| {
        let value: Option<String> = ctx.get(0)?;
        Ok(value.map(|value| value.trim().to_lowercase()))
    })
    .with_context(|| format!("failed to register sql function {FOLD_TRIM_FN}"))?;
    Ok(())
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS import_batch (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            kind        TEXT NOT NULL,
            source_path TEXT NOT NULL,
            row_count   INTEGER NOT NULL,
            imported_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS enrollment (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            import_id      INTEGER NOT NULL,
            date           TEXT NOT NULL,
            state          TEXT NOT NULL,
            district       TEXT NOT NULL,
            pincode        TEXT,
            age_0_5        INTEGER NOT NULL DEFAULT 0,
            age_5_17       INTEGER NOT NULL DEFAULT 0,
            age_18_greater INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY (import_id) REFERENCES import_batch(id)
        );

        CREATE INDEX IF NOT EXISTS idx_enrollment_state
            ON enrollment(state);

        CREATE INDEX IF NOT EXISTS idx_enrollment_import
            ON enrollment(import_id);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
