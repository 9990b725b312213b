use std::sync::Arc;

use nm_core::{Article, Result, SessionSlot, Snapshot};
use tracing::{debug, warn};

/// Last known unscoped snapshot, held in memory and mirrored into a session
/// slot. Every write replaces the whole snapshot. Slot failures are logged and
/// never propagate.
pub struct SnapshotCache {
    slot: Arc<dyn SessionSlot>,
    key: String,
    current: Option<Snapshot>,
}

impl SnapshotCache {
    pub fn new(slot: Arc<dyn SessionSlot>, key: impl Into<String>) -> Self {
        Self {
            slot,
            key: key.into(),
            current: None,
        }
    }

    /// Returns the cached snapshot. A missing or unreadable slot is a miss.
    pub fn read(&mut self) -> Option<Snapshot> {
        if let Some(snapshot) = &self.current {
            return Some(snapshot.clone());
        }

        let raw = match self.slot.read(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("failed to read session slot {}: {}", self.key, e);
                return None;
            }
        };

        match serde_json::from_str::<Vec<Article>>(&raw) {
            Ok(articles) => {
                let snapshot = Snapshot::unscoped(articles);
                debug!("restored {} articles from session slot {}", snapshot.len(), self.key);
                self.current = Some(snapshot.clone());
                Some(snapshot)
            }
            Err(e) => {
                warn!("ignoring unparseable session slot {}: {}", self.key, e);
                None
            }
        }
    }

    /// Replaces the cached snapshot. Only unscoped snapshots are cached.
    pub fn write(&mut self, snapshot: &Snapshot) {
        if !snapshot.scope().is_unscoped() {
            debug!("not caching {} snapshot", snapshot.scope());
            return;
        }

        self.current = Some(snapshot.clone());
        if let Err(e) = self.persist(snapshot) {
            warn!("failed to persist snapshot to session slot {}: {}", self.key, e);
        }
    }

    fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let raw = serde_json::to_string(snapshot.articles())?;
        self.slot.write(&self.key, &raw)
    }

    pub fn clear(&mut self) {
        self.current = None;
        if let Err(e) = self.slot.remove(&self.key) {
            warn!("failed to clear session slot {}: {}", self.key, e);
        }
    }
}
