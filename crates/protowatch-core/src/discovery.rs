//! Discovery of interface-definition files and their shared include paths
//!
//! Every run re-scans the project tree. The include-path set is the set of
//! directories holding at least one `.proto` file, so any file can import any
//! other no matter where it lives.

use crate::config::OutputLanguage;
use crate::errors::{ProtowatchError, Result};
use crate::fs::FileSystem;
use indexmap::IndexSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension of interface-definition files
pub const PROTO_EXTENSION: &str = "proto";

/// A discovered `.proto` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    output_path: PathBuf,
    directory: PathBuf,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, language: OutputLanguage) -> Self {
        let path = path.into();
        let output_path = language.output_path(&path);
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            path,
            output_path,
            directory,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the generated bindings for this file are written
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Containing directory, also the compiler's output directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

/// Deduplicated directories passed to the compiler as `--proto_path`.
/// Iterates in first-discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludePathSet {
    dirs: IndexSet<PathBuf>,
}

impl IncludePathSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dir: impl Into<PathBuf>) -> bool {
        self.dirs.insert(dir.into())
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }
}

impl<'a> FromIterator<&'a SourceFile> for IncludePathSet {
    fn from_iter<I: IntoIterator<Item = &'a SourceFile>>(files: I) -> Self {
        let mut set = IncludePathSet::new();
        for file in files {
            set.insert(file.directory());
        }
        set
    }
}

/// Result of scanning a project root
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub files: Vec<SourceFile>,
    pub include_paths: IncludePathSet,
}

impl Discovery {
    /// Look up a discovered file by path
    pub fn find(&self, path: &Path) -> Option<&SourceFile> {
        self.files.iter().find(|file| file.path() == path)
    }
}

/// Whether `path` names an interface-definition file
pub fn is_proto_file(path: &Path) -> bool {
    path.extension().map(|ext| ext == PROTO_EXTENSION).unwrap_or(false)
}

/// Recursively find every `.proto` file under `root` and collect their
/// parent directories
pub fn discover(fs: &dyn FileSystem, root: &Path, language: OutputLanguage) -> Result<Discovery> {
    let files: Vec<SourceFile> = fs
        .walk_files(root)
        .map_err(|e| ProtowatchError::Discovery {
            root: root.to_path_buf(),
            message: e.to_string(),
        })?
        .into_iter()
        .filter(|path| is_proto_file(path))
        .map(|path| SourceFile::new(path, language))
        .collect();

    let include_paths: IncludePathSet = files.iter().collect();

    debug!(
        "Discovered {} proto file(s) in {} include path(s) under {:?}",
        files.len(),
        include_paths.len(),
        root
    );

    Ok(Discovery {
        files,
        include_paths,
    })
}
