//! Durable slot storage trait.

use crate::Result;

/// A durable, client-local string key/value store.
///
/// The credential store keeps each token in its own named slot, the same way
/// a browser client keeps them in local storage.
pub trait SlotStorage: Send + Sync {
    /// Read a slot, returning `None` if it was never written or was removed.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write a slot, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a slot. Removing a missing slot is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several slots. Implementations that can do so should apply them together.
    fn write_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.write(key, value)?;
        }
        Ok(())
    }

    /// Remove several slots.
    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
