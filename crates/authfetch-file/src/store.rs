//! JSON file slot storage.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, instrument};

use authfetch_core::Result;
use authfetch_core::error::{Error, StorageError};
use authfetch_core::traits::SlotStorage;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

type Slots = BTreeMap<String, String>;

fn map_io(path: &Path, err: std::io::Error) -> Error {
    Error::Storage(StorageError::Io {
        path: path.display().to_string(),
        source: err,
    })
}

/// Slot storage kept in a single JSON object on disk.
///
/// Every mutation takes an exclusive advisory lock on a sibling `.lock`
/// file, rewrites the whole object to a temporary file and renames it into
/// place, so concurrent processes never observe a partially written file.
/// On Unix the file is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileSlotStorage {
    path: PathBuf,
}

impl FileSlotStorage {
    /// Create a storage backed by the file at `path`. Parent directories are
    /// created lazily on first write.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }

    fn open_lock(&self) -> Result<File> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| map_io(parent, e))?;
        }

        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| map_io(&lock_path, e))
    }

    fn read_slots(&self) -> Result<Slots> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Slots::new()),
            Err(e) => return Err(map_io(&self.path, e)),
        };

        if json.trim().is_empty() {
            return Ok(Slots::new());
        }

        serde_json::from_str(&json).map_err(|e| {
            Error::Storage(StorageError::Corrupt {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
        })
    }

    fn write_slots(&self, slots: &Slots) -> Result<()> {
        let temp_path = self.temp_path();
        let json = serde_json::to_string_pretty(slots).map_err(|e| {
            Error::Storage(StorageError::Corrupt {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
        })?;

        fs::write(&temp_path, &json).map_err(|e| map_io(&temp_path, e))?;

        // Set restrictive permissions (Unix only)
        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&temp_path)
                .map_err(|e| map_io(&temp_path, e))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&temp_path, perms).map_err(|e| map_io(&temp_path, e))?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| map_io(&self.path, e))?;
        Ok(())
    }

    /// Apply `f` to the slot map under the exclusive lock and persist the result.
    fn update(&self, f: impl FnOnce(&mut Slots)) -> Result<()> {
        let lock_file = self.open_lock()?;
        lock_file
            .lock_exclusive()
            .map_err(|e| map_io(&self.lock_path(), e))?;

        let result = self.read_slots().and_then(|mut slots| {
            f(&mut slots);
            self.write_slots(&slots)
        });

        lock_file
            .unlock()
            .map_err(|e| map_io(&self.lock_path(), e))?;

        result
    }
}

impl SlotStorage for FileSlotStorage {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn read(&self, key: &str) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let lock_file = self.open_lock()?;
        lock_file
            .lock_shared()
            .map_err(|e| map_io(&self.lock_path(), e))?;
        let slots = self.read_slots();
        lock_file
            .unlock()
            .map_err(|e| map_io(&self.lock_path(), e))?;

        Ok(slots?.get(key).cloned())
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.update(|slots| {
            slots.insert(key.to_string(), value.to_string());
        })?;
        debug!("Wrote slot");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|slots| {
            slots.remove(key);
        })
    }

    #[instrument(skip_all, fields(path = %self.path.display()))]
    fn write_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.update(|slots| {
            for (key, value) in entries {
                slots.insert(key.to_string(), value.to_string());
            }
        })?;
        debug!(count = entries.len(), "Wrote slots");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|slots| {
            for key in keys {
                slots.remove(*key);
            }
        })
    }
}
