//! Device registry
//!
//! The registry owns the durable collection of named devices. It enforces
//! name rules and first-use bootstrap; physical storage is delegated to
//! [`DeviceRepo`]. MAC format is validated by callers before `add`/`update`.

use std::path::Path;

use crate::db::{DbPool, DeviceRepo};
use crate::device::{Device, DeviceUpdate};
use crate::{Error, Result};

/// What `load_devices` did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// Store was seeded on an earlier startup; nothing was changed
    Existing,
    /// Imported this many records from the legacy devices file
    Migrated(usize),
    /// Inserted the example device
    Seeded,
    /// Legacy file was unreadable or malformed; store left empty
    Skipped,
}

/// Named, durable collection of wake targets
#[derive(Clone)]
pub struct DeviceRegistry {
    repo: DeviceRepo,
}

impl DeviceRegistry {
    /// Create a registry over a database pool
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self {
            repo: DeviceRepo::new(pool),
        }
    }

    /// Seed a new store, preferring the legacy devices file when present
    ///
    /// Seeding happens at most once per database. Later startups return
    /// [`Bootstrap::Existing`] even if every device has since been removed.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read or written
    pub fn load_devices(&self, legacy_path: Option<&Path>) -> Result<Bootstrap> {
        if self.repo.is_bootstrapped()? {
            return Ok(Bootstrap::Existing);
        }

        let legacy = legacy_path.filter(|p| p.exists());
        let devices = match legacy {
            Some(path) => match read_legacy_file(path) {
                Ok(devices) => devices,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to read legacy devices file, skipping migration"
                    );
                    return Ok(Bootstrap::Skipped);
                }
            },
            None => vec![Device::example()],
        };

        // Another process may have seeded since the check above
        let Some(inserted) = self.repo.bootstrap(&devices)? else {
            return Ok(Bootstrap::Existing);
        };

        if let Some(path) = legacy {
            tracing::info!(path = %path.display(), count = inserted, "migrated legacy devices");
            Ok(Bootstrap::Migrated(inserted))
        } else {
            tracing::info!("seeded device store with example device");
            Ok(Bootstrap::Seeded)
        }
    }

    /// All devices ordered by name, ignoring case
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read
    pub fn list(&self) -> Result<Vec<Device>> {
        self.repo.list()
    }

    /// Look up a device by name, ignoring case
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be read
    pub fn get(&self, name: &str) -> Result<Option<Device>> {
        self.repo.get(name)
    }

    /// Register a new device
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateName` if the name is taken,
    /// `Error::InvalidDevice` for an empty name, or a persistence error
    pub fn add(&self, device: &Device) -> Result<()> {
        check_name(&device.name)?;
        self.repo.insert(device)?;
        tracing::info!(device = %device.name, mac = %device.mac, "device added");
        Ok(())
    }

    /// Remove a device; returns whether a record was removed
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot be written
    pub fn remove(&self, name: &str) -> Result<bool> {
        let removed = self.repo.delete(name)?;
        if removed {
            tracing::info!(device = %name, "device removed");
        }
        Ok(removed)
    }

    /// Apply a partial update; returns whether a matching device was found
    ///
    /// # Errors
    ///
    /// Returns `Error::DuplicateName` if a rename collides with a different
    /// device, `Error::InvalidDevice` for an empty new name, or a
    /// persistence error
    pub fn update(&self, name: &str, update: &DeviceUpdate) -> Result<bool> {
        if let Some(new_name) = &update.name {
            check_name(new_name)?;
        }
        if update.mac.as_deref().is_some_and(str::is_empty) {
            return Err(Error::InvalidDevice("mac cannot be empty".to_string()));
        }

        let updated = self.repo.update(name, update)?;
        if updated {
            tracing::info!(device = %name, "device updated");
        }
        Ok(updated)
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidDevice("name cannot be empty".to_string()));
    }
    Ok(())
}

fn read_legacy_file(path: &Path) -> Result<Vec<Device>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
