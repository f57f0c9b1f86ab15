//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with in-memory implementations.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use std::sync::RwLock;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace file contents atomically (temp file in the same directory, then rename).
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Key/value settings store holding string options.
pub trait OptionStore: Send + Sync {
    /// Value stored under `name`, `None` if unset.
    fn get(&self, name: &str) -> io::Result<Option<String>>;

    /// Store `value` under `name`, replacing any previous value.
    fn set(&self, name: &str, value: &str) -> io::Result<()>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

/// In-process option store, for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    options: RwLock<BTreeMap<String, String>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "option store lock poisoned")
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, name: &str) -> io::Result<Option<String>> {
        let options = self.options.read().map_err(|_| poisoned())?;
        Ok(options.get(name).cloned())
    }

    fn set(&self, name: &str, value: &str) -> io::Result<()> {
        let mut options = self.options.write().map_err(|_| poisoned())?;
        options.insert(name.to_string(), value.to_string());
        Ok(())
    }
}
