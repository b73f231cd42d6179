//! Database schema and migrations

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::Result;
use crate::device::name_key;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// `meta` key recording that first-use seeding has run
pub const BOOTSTRAPPED: &str = "bootstrapped";

/// Initialize the database schema
///
/// Migrations run inside one immediate transaction, so concurrent openers
/// of the same file apply them once.
///
/// # Errors
///
/// Returns error if migration fails
pub fn init(conn: &Connection) -> Result<()> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    let version: i32 = tx
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        migrate_v1(&tx)?;
    }
    if version < 2 {
        migrate_v2(&tx)?;
    }

    tx.commit()?;
    Ok(())
}

fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        -- Devices keyed by case-insensitive name
        CREATE TABLE IF NOT EXISTS devices (
            name TEXT PRIMARY KEY COLLATE NOCASE,
            mac TEXT NOT NULL,
            ip TEXT,
            broadcast TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        PRAGMA user_version = 1;
        ",
    )?;

    tracing::info!("migrated to schema v1");
    Ok(())
}

/// Key devices by a Unicode-folded name and add the `meta` table
///
/// `NOCASE` only folds ASCII, so the key is computed here rather than in SQL.
/// Rows that collapse onto an existing key are dropped, oldest kept.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r"
        CREATE TABLE devices_v2 (
            name_key TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            mac TEXT NOT NULL,
            ip TEXT,
            broadcast TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        ",
    )?;

    {
        let mut select = conn.prepare(
            "SELECT name, mac, ip, broadcast, created_at, updated_at
             FROM devices ORDER BY created_at, rowid",
        )?;
        let mut insert = conn.prepare(
            r"
            INSERT OR IGNORE INTO devices_v2
                (name_key, name, mac, ip, broadcast, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )?;

        let mut rows = select.query([])?;
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let mac: String = row.get(1)?;
            let ip: Option<String> = row.get(2)?;
            let broadcast: Option<String> = row.get(3)?;
            let created_at: String = row.get(4)?;
            let updated_at: String = row.get(5)?;

            let inserted = insert.execute(rusqlite::params![
                name_key(&name),
                name,
                mac,
                ip,
                broadcast,
                created_at,
                updated_at,
            ])?;
            if inserted == 0 {
                tracing::warn!(device = %name, "dropping device whose name only differs by case");
            }
        }
    }

    conn.execute_batch(
        r"
        DROP TABLE devices;
        ALTER TABLE devices_v2 RENAME TO devices;
        ",
    )?;

    // A populated v1 store has already been seeded
    conn.execute(
        "INSERT INTO meta (key, value)
         SELECT ?1, datetime('now') WHERE EXISTS (SELECT 1 FROM devices)",
        [BOOTSTRAPPED],
    )?;

    conn.execute_batch("PRAGMA user_version = 2;")?;

    tracing::info!("migrated to schema v2");
    Ok(())
}
