use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds since the Unix epoch; insertion keys and purge timestamps.
pub(crate) fn now_ns() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// The single persisted record per blacklist instance: revoked tokens keyed
/// by insertion timestamp, plus the time of the last purge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlacklistDocument {
    pub last_purge_ns: u64,
    pub entries: BTreeMap<u64, String>,
}

impl BlacklistDocument {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            last_purge_ns: now_ns(),
            entries: BTreeMap::new(),
        }
    }
}

/// Persistence boundary for a blacklist instance.
///
/// The document is read once at startup, appended to on every revocation,
/// and replaced wholesale on each purge. Implementations must be safe to
/// call from any request thread concurrently with the purge worker.
pub trait BlacklistStore: Send + Sync {
    /// Read the document, creating an empty one on first use.
    fn load(&self) -> Result<BlacklistDocument, StoreError>;

    /// Append one revoked token keyed by its insertion timestamp.
    fn append(&self, inserted_at_ns: u64, token: &str) -> Result<(), StoreError>;

    /// Atomically replace the document with only the entries younger than
    /// `cutoff_ns`, stamping a fresh `last_purge_ns`. Returns the document
    /// as persisted, which callers use to rebuild their in-memory mirror.
    fn replace_newer_than(&self, cutoff_ns: u64) -> Result<BlacklistDocument, StoreError>;
}

/// Store backed by a single JSON file. A mutex serializes the
/// read-modify-write cycles of `append` and `replace_newer_than`.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_document(&self) -> Result<Option<BlacklistDocument>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, doc: &BlacklistDocument) -> Result<(), StoreError> {
        fs::write(&self.path, serde_json::to_vec(doc)?)?;
        Ok(())
    }
}

impl BlacklistStore for JsonFileStore {
    fn load(&self) -> Result<BlacklistDocument, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        match self.read_document()? {
            Some(doc) => Ok(doc),
            None => {
                let doc = BlacklistDocument::empty();
                self.write_document(&doc)?;
                Ok(doc)
            }
        }
    }

    fn append(&self, inserted_at_ns: u64, token: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut doc = self.read_document()?.unwrap_or_else(BlacklistDocument::empty);
        doc.entries.insert(inserted_at_ns, token.to_string());
        self.write_document(&doc)
    }

    fn replace_newer_than(&self, cutoff_ns: u64) -> Result<BlacklistDocument, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut doc = self.read_document()?.unwrap_or_else(BlacklistDocument::empty);
        doc.entries.retain(|&inserted_at, _| inserted_at > cutoff_ns);
        doc.last_purge_ns = now_ns();
        self.write_document(&doc)?;
        Ok(doc)
    }
}

/// In-process store for tests and development.
#[derive(Default)]
pub struct MemoryStore {
    doc: Mutex<Option<BlacklistDocument>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlacklistStore for MemoryStore {
    fn load(&self) -> Result<BlacklistDocument, StoreError> {
        let mut guard = self.doc.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard.get_or_insert_with(BlacklistDocument::empty).clone())
    }

    fn append(&self, inserted_at_ns: u64, token: &str) -> Result<(), StoreError> {
        let mut guard = self.doc.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .get_or_insert_with(BlacklistDocument::empty)
            .entries
            .insert(inserted_at_ns, token.to_string());
        Ok(())
    }

    fn replace_newer_than(&self, cutoff_ns: u64) -> Result<BlacklistDocument, StoreError> {
        let mut guard = self.doc.lock().unwrap_or_else(|e| e.into_inner());
        let doc = guard.get_or_insert_with(BlacklistDocument::empty);
        doc.entries.retain(|&inserted_at, _| inserted_at > cutoff_ns);
        doc.last_purge_ns = now_ns();
        Ok(doc.clone())
    }
}
