//! Project trees and wired containers for tests

use crate::mocks::{MockCompilerRunner, RecordingArtifactTracker};
use protowatch_core::config::CompilerConfig;
use protowatch_core::diagnostics::CollectingDiagnosticHandler;
use protowatch_core::di::Container;
use protowatch_core::fs::MockFileSystem;
use protowatch_core::orchestrator::Orchestrator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A project on disk in a temporary directory
pub struct TempProject {
    _dir: TempDir,
    root: PathBuf,
}

impl TempProject {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Write `content` at `relative`, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

/// An orchestrator over an in-memory tree with recording collaborators
pub struct Harness {
    pub fs: Arc<MockFileSystem>,
    pub runner: Arc<MockCompilerRunner>,
    pub tracker: Arc<RecordingArtifactTracker>,
    pub diagnostics: Arc<CollectingDiagnosticHandler>,
    pub container: Container,
}

impl Harness {
    /// Files in `paths` are added to the mock file system
    pub fn new(config: CompilerConfig, paths: &[&str]) -> Self {
        Self::with_runner(config, paths, MockCompilerRunner::new())
    }

    pub fn with_runner(
        config: CompilerConfig,
        paths: &[&str],
        runner: Arc<MockCompilerRunner>,
    ) -> Self {
        let fs = Arc::new(MockFileSystem::new());
        for path in paths {
            fs.add_file(*path);
        }
        Self::with_parts(config, fs, runner)
    }

    pub fn with_parts(
        config: CompilerConfig,
        fs: Arc<MockFileSystem>,
        runner: Arc<MockCompilerRunner>,
    ) -> Self {
        let tracker = RecordingArtifactTracker::new();
        let diagnostics = Arc::new(CollectingDiagnosticHandler::new());
        let container = Container::with_dependencies(
            config,
            diagnostics.clone(),
            fs.clone(),
            runner.clone(),
            tracker.clone(),
        );
        Self {
            fs,
            runner,
            tracker,
            diagnostics,
            container,
        }
    }

    pub fn orchestrator(&self) -> Orchestrator {
        self.container.orchestrator()
    }

    pub fn messages(&self) -> Vec<String> {
        self.diagnostics
            .get_diagnostics()
            .into_iter()
            .map(|d| d.message)
            .collect()
    }
}
