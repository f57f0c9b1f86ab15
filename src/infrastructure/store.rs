//! File-backed option store: one JSON object of option name to string value.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::infrastructure::traits::{FileSystem, OptionStore};

pub struct FileOptionStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileOptionStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> io::Result<BTreeMap<String, String>> {
        if !self.fs.exists(&self.path) {
            return Ok(BTreeMap::new());
        }
        let content = self.fs.read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{}: {}", self.path.display(), e),
            )
        })
    }
}

impl OptionStore for FileOptionStore {
    fn get(&self, name: &str) -> io::Result<Option<String>> {
        Ok(self.read_all()?.remove(name))
    }

    fn set(&self, name: &str, value: &str) -> io::Result<()> {
        let mut options = self.read_all()?;
        options.insert(name.to_string(), value.to_string());
        let content = serde_json::to_string_pretty(&options)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.fs.ensure_parent(&self.path)?;
        self.fs.write_atomic(&self.path, &content)?;
        debug!("stored option {} in {}", name, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    #[test]
    fn test_get_missing_file_is_unset() {
        let temp = TempDir::new().unwrap();
        let store = FileOptionStore::new(Arc::new(RealFileSystem), temp.path().join("none.json"));
        assert_eq!(store.get("anything").unwrap(), None);
    }

    #[test]
    fn test_set_keeps_other_options_and_creates_parent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("options.json");
        let store = FileOptionStore::new(Arc::new(RealFileSystem), &path);

        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        store.set("a", "3").unwrap();

        assert_eq!(store.get("a").unwrap().as_deref(), Some("3"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("options.json");
        std::fs::write(&path, "not json").unwrap();
        let store = FileOptionStore::new(Arc::new(RealFileSystem), &path);

        let err = store.get("a").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
