//! Device repository backed by `SQLite`
//!
//! Rows are keyed by [`name_key`], a Unicode lowercase fold of the display
//! name. The primary key on that column is what guarantees at most one record
//! per name even when two writers race.

use chrono::Utc;
use rusqlite::{Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use super::DbPool;
use super::schema::BOOTSTRAPPED;
use crate::device::{Device, DeviceUpdate, name_key};
use crate::{Error, Result};

/// Device repository for CRUD operations
#[derive(Clone)]
pub struct DeviceRepo {
    pool: DbPool,
}

impl DeviceRepo {
    /// Create a new device repository
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// List all devices ordered by name, ignoring case
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn list(&self) -> Result<Vec<Device>> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT name, mac, ip, broadcast FROM devices ORDER BY name_key ASC",
        )?;

        let rows = stmt.query_map([], Self::row_to_device)?;

        let mut devices = Vec::new();
        for row in rows {
            devices.push(row?);
        }

        Ok(devices)
    }

    /// Get a device by name, ignoring case
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn get(&self, name: &str) -> Result<Option<Device>> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let device = conn
            .query_row(
                "SELECT name, mac, ip, broadcast FROM devices WHERE name_key = ?1",
                [name_key(name)],
                Self::row_to_device,
            )
            .optional()?;

        Ok(device)
    }

    /// Number of stored devices
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn count(&self) -> Result<usize> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM devices", [], |row| row.get(0))?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Insert a new device
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateName` if the name is taken, or a database error
    pub fn insert(&self, device: &Device) -> Result<()> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;
        insert_device(&conn, device)
    }

    /// Whether first-use seeding has already happened for this store
    ///
    /// A store holding devices counts as seeded even without a marker.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn is_bootstrapped(&self) -> Result<bool> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;
        bootstrap_recorded(&conn)
    }

    /// Insert the first-use devices and record that seeding ran
    ///
    /// Both happen in one immediate transaction. Returns `None` without
    /// inserting anything if the store was already seeded, which is what a
    /// second process racing on the same empty database observes. Entries
    /// whose name is taken by an earlier entry are skipped.
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn bootstrap(&self, devices: &[Device]) -> Result<Option<usize>> {
        let mut conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let seeded = bootstrap_recorded(&tx)?;
        let inserted = if seeded {
            None
        } else {
            let mut inserted = 0;
            for device in devices {
                match insert_device(&tx, device) {
                    Ok(()) => inserted += 1,
                    Err(Error::DuplicateName(name)) => {
                        tracing::warn!(device = %name, "duplicate device name while seeding, skipping");
                    }
                    Err(e) => return Err(e),
                }
            }
            Some(inserted)
        };

        tx.execute(
            "INSERT OR IGNORE INTO meta (key, value) VALUES (?1, ?2)",
            rusqlite::params![BOOTSTRAPPED, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;

        Ok(inserted)
    }

    /// Apply a partial update to the device stored under `name`
    ///
    /// Returns `false` if no such device exists.
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateName` if a rename collides with another
    /// device, or a database error
    pub fn update(&self, name: &str, update: &DeviceUpdate) -> Result<bool> {
        let mut conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let key = name_key(name);
        let current = tx
            .query_row(
                "SELECT name, mac, ip, broadcast FROM devices WHERE name_key = ?1",
                [&key],
                Self::row_to_device,
            )
            .optional()?;

        let Some(mut device) = current else {
            return Ok(false);
        };

        if update.is_empty() {
            return Ok(true);
        }

        update.apply_to(&mut device);

        tx.execute(
            r"
            UPDATE devices
            SET name_key = ?1, name = ?2, mac = ?3, ip = ?4, broadcast = ?5, updated_at = ?6
            WHERE name_key = ?7
            ",
            rusqlite::params![
                name_key(&device.name),
                device.name,
                device.mac,
                device.ip,
                device.broadcast,
                Utc::now().to_rfc3339(),
                key,
            ],
        )
        .map_err(|e| map_constraint(e, &device.name))?;

        tx.commit()?;
        Ok(true)
    }

    /// Delete a device by name, ignoring case
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn delete(&self, name: &str) -> Result<bool> {
        let conn = self.pool.get().map_err(|e| Error::Database(e.to_string()))?;

        let rows = conn.execute("DELETE FROM devices WHERE name_key = ?1", [name_key(name)])?;

        Ok(rows > 0)
    }

    fn row_to_device(row: &rusqlite::Row<'_>) -> rusqlite::Result<Device> {
        Ok(Device {
            name: row.get(0)?,
            mac: row.get(1)?,
            ip: row.get(2)?,
            broadcast: row.get(3)?,
        })
    }
}

fn insert_device(conn: &Connection, device: &Device) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    conn.execute(
        r"
        INSERT INTO devices (name_key, name, mac, ip, broadcast, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
        ",
        rusqlite::params![
            name_key(&device.name),
            device.name,
            device.mac,
            device.ip,
            device.broadcast,
            now,
        ],
    )
    .map_err(|e| map_constraint(e, &device.name))?;

    Ok(())
}

fn bootstrap_recorded(conn: &Connection) -> Result<bool> {
    let recorded = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM meta WHERE key = ?1) OR EXISTS(SELECT 1 FROM devices)",
        [BOOTSTRAPPED],
        |row| row.get(0),
    )?;
    Ok(recorded)
}

/// Map a uniqueness violation on `devices.name_key` to `DuplicateName`
fn map_constraint(err: rusqlite::Error, name: &str) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(ref e, _) if e.code == ErrorCode::ConstraintViolation => {
            Error::DuplicateName(name.to_string())
        }
        other => Error::Sqlite(other),
    }
}
