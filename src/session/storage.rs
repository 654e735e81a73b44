use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use super::SessionError;

/// String key/value persistence, the stand-in for browser local storage.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, key: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// One JSON object on disk. Every write replaces the file through a sibling
/// temp file and a rename.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(SessionError::Read {
                    path: self.path.display().to_string(),
                    source: e,
                })
            }
        };
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(|e| SessionError::Corrupt {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let write_err = |e: std::io::Error| SessionError::Write {
            path: self.path.display().to_string(),
            source: e,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let contents = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(write_err)?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        // A corrupt file is replaced by the next write instead of blocking it.
        let mut map = match self.read_map() {
            Err(SessionError::Corrupt { path, source }) => {
                warn!(%path, error = %source, "discarding unreadable session storage");
                BTreeMap::new()
            }
            other => other?,
        };
        f(&mut map);
        self.write_map(&map)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.update(|map| {
            map.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let first = FileStorage::new(&path);
        first.set("authToken", "abc").unwrap();
        first.set("userData", "{}").unwrap();

        let second = FileStorage::new(&path);
        assert_eq!(second.get("authToken").unwrap().as_deref(), Some("abc"));
        second.remove("authToken").unwrap();
        assert_eq!(first.get("authToken").unwrap(), None);
        assert_eq!(first.get("userData").unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));
        assert_eq!(storage.get("authToken").unwrap(), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();
        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("authToken"),
            Err(SessionError::Corrupt { .. })
        ));
    }

    #[test]
    fn writes_recover_from_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{\"authToken\": ").unwrap();
        let storage = FileStorage::new(&path);

        storage.remove("authToken").unwrap();
        assert_eq!(storage.get("authToken").unwrap(), None);

        storage.set("authToken", "fresh").unwrap();
        assert_eq!(storage.get("authToken").unwrap().as_deref(), Some("fresh"));
        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);
    }
}
