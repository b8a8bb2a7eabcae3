// Key-value store - Persistence collaborator for session counters
// Flat string map, kept in memory or mirrored to a JSON file on disk

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No data directory available on this platform")]
    NoDataDir,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Minimal persistence interface: string keys to string values
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// Volatile store, used in tests and when no data directory exists
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a single JSON object, rewritten on every `set`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    values: HashMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file is an empty store
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = Self::load(&path)?;
        Ok(Self { path, values })
    }

    /// Open the store in the platform data directory
    pub fn open_default() -> StoreResult<Self> {
        Self::open(default_store_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> StoreResult<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }

        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

/// `<data dir>/mymusic_metronome/session.json`
pub fn default_store_path() -> StoreResult<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("mymusic_metronome").join("session.json"))
        .ok_or(StoreError::NoDataDir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("missing"), None);
        store.set("key", "value").unwrap();
        assert_eq!(store.get("key").as_deref(), Some("value"));
    }

    #[test]
    fn test_json_store_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("session.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("count"), None);
        store.set("count", "3").unwrap();

        // A new instance reads what the first one wrote
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("count").as_deref(), Some("3"));
    }

    #[test]
    fn test_json_store_rejects_garbage() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let result = JsonFileStore::open(&path);
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
