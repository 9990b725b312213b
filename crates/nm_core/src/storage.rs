use crate::Result;

/// Session-scoped key/value slot. Values live until the session ends and are
/// never shared across sessions.
pub trait SessionSlot: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Drop the value stored under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
