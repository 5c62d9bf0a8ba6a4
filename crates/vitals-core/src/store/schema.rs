//! Table definitions and schema maintenance.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rusqlite::{Connection, OptionalExtension};
use tracing::info;

use crate::error::{Result, VitalsError};

/// Written to `meta.format_version` when a store is created.
pub const FORMAT_VERSION: &str = "1";

/// Every table and index the store needs. Idempotent.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS user_table (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS activity_table (
    activity_id INTEGER PRIMARY KEY AUTOINCREMENT,
    steps INTEGER,
    distance INTEGER,
    time INTEGER,
    activity TEXT,
    log TEXT,
    user_table_user_id INTEGER NOT NULL,
    FOREIGN KEY (user_table_user_id) REFERENCES user_table (user_id)
);

CREATE TABLE IF NOT EXISTS heart_table (
    heart_id INTEGER PRIMARY KEY AUTOINCREMENT,
    rate INTEGER,
    resting INTEGER,
    recovery INTEGER,
    user_table_user_id INTEGER NOT NULL,
    FOREIGN KEY (user_table_user_id) REFERENCES user_table (user_id)
);

CREATE TABLE IF NOT EXISTS medication_table (
    med_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    scheduled INTEGER NOT NULL DEFAULT 0,
    taken INTEGER NOT NULL DEFAULT 0,
    user_table_user_id INTEGER NOT NULL,
    FOREIGN KEY (user_table_user_id) REFERENCES user_table (user_id)
);

CREATE TABLE IF NOT EXISTS nutrition_table (
    nutrition_id INTEGER PRIMARY KEY AUTOINCREMENT,
    goal INTEGER,
    consumed INTEGER,
    user_table_user_id INTEGER NOT NULL,
    FOREIGN KEY (user_table_user_id) REFERENCES user_table (user_id)
);

CREATE TABLE IF NOT EXISTS record_table (
    record_id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    doctor TEXT,
    diagnosis TEXT,
    user_table_user_id INTEGER NOT NULL,
    FOREIGN KEY (user_table_user_id) REFERENCES user_table (user_id)
);

CREATE INDEX IF NOT EXISTS activity_table_user ON activity_table (user_table_user_id);
CREATE INDEX IF NOT EXISTS heart_table_user ON heart_table (user_table_user_id);
CREATE INDEX IF NOT EXISTS medication_table_user ON medication_table (user_table_user_id);
CREATE INDEX IF NOT EXISTS nutrition_table_user ON nutrition_table (user_table_user_id);
CREATE INDEX IF NOT EXISTS record_table_user ON record_table (user_table_user_id);
"#;

/// The domain tables a reset may drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableName {
    User,
    Activity,
    Heart,
    Medication,
    Nutrition,
    Record,
}

impl TableName {
    pub const ALL: [TableName; 6] = [
        TableName::User,
        TableName::Activity,
        TableName::Heart,
        TableName::Medication,
        TableName::Nutrition,
        TableName::Record,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TableName::User => "user_table",
            TableName::Activity => "activity_table",
            TableName::Heart => "heart_table",
            TableName::Medication => "medication_table",
            TableName::Nutrition => "nutrition_table",
            TableName::Record => "record_table",
        }
    }

    /// Children drop before the user table they reference.
    fn drop_rank(self) -> u8 {
        match self {
            TableName::User => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = VitalsError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        let short = name.strip_suffix("_table").unwrap_or(&name);
        match short {
            "user" | "users" => Ok(TableName::User),
            "activity" => Ok(TableName::Activity),
            "heart" => Ok(TableName::Heart),
            "medication" | "medications" => Ok(TableName::Medication),
            "nutrition" => Ok(TableName::Nutrition),
            "record" | "records" => Ok(TableName::Record),
            _ => Err(VitalsError::InvalidInput(format!("Unknown table: {}", s))),
        }
    }
}

/// Create any missing tables and indexes in one transaction.
pub(crate) fn ensure_schema(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute(
        "INSERT OR IGNORE INTO meta (key, value) VALUES ('format_version', ?1)",
        [FORMAT_VERSION],
    )?;
    tx.execute(
        "INSERT OR IGNORE INTO meta (key, value) VALUES ('created_at', ?1)",
        [chrono::Utc::now().to_rfc3339()],
    )?;
    tx.commit()?;
    Ok(())
}

/// User tables currently present, sorted by name.
pub(crate) fn table_names(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(names)
}

pub(crate) fn table_exists(conn: &Connection, table: TableName) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Drop the requested tables that exist, children first, in one transaction.
///
/// Returns the tables actually dropped. Dropping `user_table` while a child
/// table that references it still holds rows fails and drops nothing.
pub(crate) fn drop_tables(conn: &mut Connection, tables: &BTreeSet<TableName>) -> Result<Vec<TableName>> {
    let mut ordered: Vec<TableName> = tables.iter().copied().collect();
    ordered.sort_by_key(|t| (t.drop_rank(), *t));

    let tx = conn.transaction()?;
    let mut dropped = Vec::new();
    for table in ordered {
        if !table_exists(&tx, table)? {
            info!(table = %table, "table does not exist, skipping drop");
            continue;
        }
        tx.execute_batch(&format!("DROP TABLE {};", table.as_str()))?;
        info!(table = %table, "dropped table");
        dropped.push(table);
    }
    tx.commit()?;
    Ok(dropped)
}

/// Run SQLite's consistency checks.
pub(crate) fn check_integrity(conn: &Connection) -> Result<()> {
    let verdict: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    if verdict != "ok" {
        return Err(VitalsError::Storage(format!(
            "Integrity check failed: {}",
            verdict
        )));
    }

    let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
    let mut rows = stmt.query([])?;
    if let Some(row) = rows.next()? {
        let table: String = row.get(0)?;
        return Err(VitalsError::Storage(format!(
            "Foreign key violation in {}",
            table
        )));
    }
    Ok(())
}
