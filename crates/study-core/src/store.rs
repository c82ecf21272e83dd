//! Session persistence
//!
//! The flow hands a snapshot of the session record to its store after every
//! successful transition. Saving is fire-and-forget from the flow's point of
//! view: failures are logged, never propagated into the transition.

use crate::error::StoreError;
use crate::session::SessionRecord;
use crate::types::ParticipantId;
use parking_lot::Mutex;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Destination for session snapshots
pub trait SessionStore: Send + Debug {
    /// Persist the full record, replacing any earlier snapshot
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;
}

/// In-process store keeping every snapshot, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Vec<SessionRecord>>>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All snapshots, oldest first
    #[must_use]
    pub fn snapshots(&self) -> Vec<SessionRecord> {
        self.inner.lock().clone()
    }

    /// Most recent snapshot
    #[must_use]
    pub fn latest(&self) -> Option<SessionRecord> {
        self.inner.lock().last().cloned()
    }

    /// Number of snapshots taken
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing was saved yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.inner.lock().push(record.clone());
        Ok(())
    }
}

/// One JSON file per participant, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create store rooted at `dir` (created on first save)
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the snapshots
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Snapshot file for a participant
    #[must_use]
    pub fn path_for(&self, participant_id: &ParticipantId) -> PathBuf {
        self.dir.join(format!("{participant_id}.json"))
    }

    /// Read a participant's latest snapshot
    pub fn load(&self, participant_id: &ParticipantId) -> Result<SessionRecord, StoreError> {
        let path = self.path_for(participant_id);
        if !path.exists() {
            return Err(StoreError::NotFound(participant_id.to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl SessionStore for JsonFileStore {
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(record.participant_id());
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(record)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}
