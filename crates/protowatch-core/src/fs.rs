use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;
use walkdir::WalkDir;

/// File system access needed by discovery and the orchestrator
/// This allows for dependency injection and testing with an in-memory tree
pub trait FileSystem: Send + Sync {
    /// Whether a file or directory exists at `path`
    fn exists(&self, path: &Path) -> bool;

    /// Every regular file below `root`, recursively, in a stable
    /// (name-sorted, depth-first) order. Fails only if `root` itself
    /// cannot be read; unreadable entries below it are skipped.
    fn walk_files(&self, root: &Path) -> std::io::Result<Vec<PathBuf>>;
}

/// The real file system
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        RealFileSystem
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn walk_files(&self, root: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(std::io::Error::from(e)),
                Err(e) => {
                    // Dangling links and link cycles
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }
}

/// In-memory file system for tests
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: Mutex<BTreeSet<PathBuf>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl Into<PathBuf>) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }

    pub fn remove_file(&self, path: &Path) {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path);
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|file| file == path || file.starts_with(path))
    }

    fn walk_files(&self, root: &Path) -> std::io::Result<Vec<PathBuf>> {
        let files = self.files.lock().unwrap_or_else(PoisonError::into_inner);
        if !files.iter().any(|file| file.starts_with(root)) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", root.display()),
            ));
        }
        Ok(files
            .iter()
            .filter(|file| file.starts_with(root))
            .cloned()
            .collect())
    }
}
