//! Ephemeral key-value stores for the editor round trip

use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::ports::outbound::{EphemeralStore, StoreError};

/// Process-local store
#[derive(Default)]
pub struct InMemoryEphemeralStore {
    entries: DashMap<String, String>,
}

impl InMemoryEphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EphemeralStore for InMemoryEphemeralStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key under a directory; survives process restarts
pub struct FileEphemeralStore {
    dir: PathBuf,
}

impl FileEphemeralStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::Io(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl EphemeralStore for FileEphemeralStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value).map_err(|e| StoreError::Io(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| StoreError::Io(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = InMemoryEphemeralStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileEphemeralStore::new(dir.path()).unwrap().set("campaign_wizard_state", "{}").unwrap();

        let reopened = FileEphemeralStore::new(dir.path()).unwrap();
        assert_eq!(reopened.get("campaign_wizard_state").unwrap().as_deref(), Some("{}"));
        reopened.remove("campaign_wizard_state").unwrap();
        assert_eq!(reopened.get("campaign_wizard_state").unwrap(), None);
    }

    #[test]
    fn test_file_store_key_cannot_escape_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEphemeralStore::new(dir.path()).unwrap();
        store.set("../outside", "x").unwrap();
        assert!(dir.path().join("___outside.json").exists());
    }
}
