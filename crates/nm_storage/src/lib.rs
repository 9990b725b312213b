use std::path::Path;
use std::sync::Arc;

use nm_core::{Error, Result, SessionSlot};

pub mod backends;
pub mod cache;

pub use backends::*;
pub use cache::SnapshotCache;

/// Builds a session slot by name. `file` slots live under `session_dir`.
pub fn create_slot(kind: &str, session_dir: &Path) -> Result<Arc<dyn SessionSlot>> {
    match kind {
        "memory" => Ok(Arc::new(MemorySlot::new())),
        "file" => Ok(Arc::new(FileSlot::new(session_dir))),
        other => Err(Error::Config(format!(
            "unknown session slot {:?}, expected one of: memory, file",
            other
        ))),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_slot, SnapshotCache};
}
