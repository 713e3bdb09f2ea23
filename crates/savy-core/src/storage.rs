use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::RwLock,
};

use crate::CoreError;

/// Fixed key the serialized snapshot lives under.
pub const SAVY_STORAGE_KEY: &str = "savy_state";

/// Opaque fingerprint of the stored document; it moves whenever the document changes.
pub type Revision = u64;

/// Durable key-value slot holding the serialized ledger snapshot.
pub trait SnapshotStore: Send + Sync {
    /// Returns the raw stored document, or `None` when nothing has been written yet.
    fn read(&self) -> Result<Option<Vec<u8>>, CoreError>;

    fn write(&self, document: &str) -> Result<(), CoreError>;

    /// Keeps an unreadable document aside, byte for byte, before it gets overwritten.
    fn quarantine(&self, document: &[u8]) -> Result<(), CoreError> {
        let _ = document;
        Ok(())
    }

    /// Fingerprint of the current document, seen by every handle on the same
    /// storage. `None` when nothing is stored.
    fn revision(&self) -> Result<Option<Revision>, CoreError> {
        Ok(self.read()?.map(|bytes| revision_of(&bytes)))
    }
}

/// Content fingerprint used by stores without a cheaper change marker.
pub fn revision_of(document: &[u8]) -> Revision {
    let mut hasher = DefaultHasher::new();
    document.hash(&mut hasher);
    hasher.finish()
}

/// In-memory store for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    document: RwLock<Option<Vec<u8>>>,
    quarantined: RwLock<Vec<Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with raw bytes, which need not be valid UTF-8.
    pub fn with_document(document: impl Into<Vec<u8>>) -> Self {
        Self {
            document: RwLock::new(Some(document.into())),
            quarantined: RwLock::new(Vec::new()),
        }
    }

    pub fn document(&self) -> Option<String> {
        self.document
            .read()
            .map(|guard| {
                guard
                    .as_deref()
                    .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            })
            .unwrap_or_default()
    }

    pub fn quarantined(&self) -> Vec<Vec<u8>> {
        self.quarantined
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self) -> Result<Option<Vec<u8>>, CoreError> {
        let guard = self.document.read().map_err(|_| poisoned())?;
        Ok(guard.clone())
    }

    fn write(&self, document: &str) -> Result<(), CoreError> {
        let mut guard = self.document.write().map_err(|_| poisoned())?;
        *guard = Some(document.as_bytes().to_vec());
        Ok(())
    }

    fn quarantine(&self, document: &[u8]) -> Result<(), CoreError> {
        let mut guard = self.quarantined.write().map_err(|_| poisoned())?;
        guard.push(document.to_vec());
        Ok(())
    }
}

fn poisoned() -> CoreError {
    CoreError::Storage("memory store lock poisoned".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revision_follows_the_document() {
        let store = MemoryStore::new();
        assert_eq!(store.revision().expect("revision"), None);

        store.write("{}").expect("write");
        let first = store.revision().expect("revision");
        assert!(first.is_some());
        assert_eq!(store.revision().expect("revision"), first);

        store.write(r#"{"availableCash": 1}"#).expect("write");
        assert_ne!(store.revision().expect("revision"), first);
    }
}
