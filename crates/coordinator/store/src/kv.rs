//! Key-value backends.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// A string key-value store.
///
/// Values are opaque strings; the store above it decides their encoding.
pub trait KvStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KvError>;
}

/// Error raised by a [`KvStore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// An I/O failure, with the key involved.
    #[error("i/o error on key {key}: {source}")]
    Io {
        /// The key being accessed.
        key: String,
        /// The underlying error.
        source: io::Error,
    },

    /// The key cannot be mapped to a file name.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A lock guarding the backend was poisoned.
    #[error("store lock poisoned")]
    Poisoned,
}

/// An in-memory [`KvStore`].
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.entries.lock().map_err(|_| KvError::Poisoned)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.entries.lock().map_err(|_| KvError::Poisoned)?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        self.entries.lock().map_err(|_| KvError::Poisoned)?.remove(key);
        Ok(())
    }
}

/// A [`KvStore`] keeping one JSON file per key under a directory.
///
/// Writes go to a temporary sibling file which is then renamed over the target, so a reader
/// never observes a partially written value.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// When the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, KvError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|source| KvError::Io { key: dir.display().to_string(), source })?;

        Ok(Self { dir })
    }

    /// Returns the root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_of(&self, key: &str) -> Result<PathBuf, KvError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(KvError::InvalidKey(key.to_owned()));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        match fs::read_to_string(self.path_of(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(KvError::Io { key: key.to_owned(), source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let path = self.path_of(key)?;
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| KvError::Io { key: key.to_owned(), source };

        fs::write(&tmp, value).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)
    }

    fn delete(&self, key: &str) -> Result<(), KvError> {
        match fs::remove_file(self.path_of(key)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(KvError::Io { key: key.to_owned(), source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(kv: &dyn KvStore) {
        assert_eq!(kv.get("multisig-all").unwrap(), None);

        kv.set("multisig-all", "[]").unwrap();
        kv.set("multisig-all", "[1]").unwrap();
        assert_eq!(kv.get("multisig-all").unwrap().as_deref(), Some("[1]"));

        kv.delete("multisig-all").unwrap();
        kv.delete("multisig-all").unwrap();
        assert_eq!(kv.get("multisig-all").unwrap(), None);
    }

    #[test]
    fn memory_backend() {
        exercise(&MemoryKvStore::new());
    }

    #[test]
    fn file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKvStore::open(dir.path().join("nested")).unwrap();
        exercise(&kv);

        kv.set("multisig-wip", "{}").unwrap();
        assert!(kv.dir().join("multisig-wip.json").exists());
        assert!(!kv.dir().join("multisig-wip.json.tmp").exists());
    }

    #[test]
    fn file_backend_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let kv = FileKvStore::open(dir.path()).unwrap();

        assert!(matches!(kv.set("../escape", "x"), Err(KvError::InvalidKey(_))));
        assert!(matches!(kv.get(""), Err(KvError::InvalidKey(_))));
    }
}
