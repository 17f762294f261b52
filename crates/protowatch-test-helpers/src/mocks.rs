//! Mock implementations for testing

use protowatch_core::command::CompileCommand;
use protowatch_core::errors::{ProtowatchError, Result};
use protowatch_core::fs::MockFileSystem;
use protowatch_core::runner::{CompileResult, CompilerRunner};
use protowatch_core::tracker::ArtifactTracker;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A compiler that never runs anything. Records every invocation and answers
/// with a scripted result keyed by input file (success by default).
#[derive(Debug, Default)]
pub struct MockCompilerRunner {
    invocations: Mutex<Vec<CompileCommand>>,
    responses: Mutex<HashMap<PathBuf, CompileResult>>,
    missing_executable: bool,
    outputs: Option<(Arc<MockFileSystem>, String)>,
}

impl MockCompilerRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A runner whose executable cannot be started
    pub fn missing() -> Arc<Self> {
        Arc::new(Self {
            missing_executable: true,
            ..Self::default()
        })
    }

    /// A runner that adds `<input stem>.<extension>` to `fs` on success,
    /// like a real compiler writing its output
    pub fn writing_outputs(fs: Arc<MockFileSystem>, extension: &str) -> Arc<Self> {
        Arc::new(Self {
            outputs: Some((fs, extension.to_string())),
            ..Self::default()
        })
    }

    /// Answer invocations for `input` with the given streams
    pub fn respond(&self, input: impl Into<PathBuf>, stdout: &str, stderr: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(input.into(), CompileResult::new(stdout, stderr));
    }

    pub fn invocations(&self) -> Vec<CompileCommand> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.invocations.lock().unwrap().len()
    }

    /// Input files of all invocations, in order
    pub fn compiled_inputs(&self) -> Vec<PathBuf> {
        self.invocations()
            .iter()
            .filter_map(|command| command.args().first())
            .map(PathBuf::from)
            .collect()
    }

    pub fn was_invoked_for(&self, input: &Path) -> bool {
        self.compiled_inputs().iter().any(|p| p == input)
    }
}

impl CompilerRunner for MockCompilerRunner {
    fn run(&self, command: &CompileCommand) -> Result<CompileResult> {
        self.invocations.lock().unwrap().push(command.clone());

        if self.missing_executable {
            return Err(ProtowatchError::MissingExecutable {
                path: command.program().to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            });
        }

        let input = command
            .args()
            .first()
            .map(PathBuf::from)
            .unwrap_or_default();
        let result = self
            .responses
            .lock()
            .unwrap()
            .get(&input)
            .cloned()
            .unwrap_or_default();

        if let Some((fs, extension)) = &self.outputs {
            if result.succeeded() {
                fs.add_file(input.with_extension(extension));
            }
        }

        Ok(result)
    }
}

/// One call received by a [`RecordingArtifactTracker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    Reimport(PathBuf),
    RefreshAll,
}

/// An artifact tracker that records the calls it receives
#[derive(Debug, Default)]
pub struct RecordingArtifactTracker {
    events: Mutex<Vec<TrackerEvent>>,
}

impl RecordingArtifactTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn reimports(&self) -> Vec<PathBuf> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                TrackerEvent::Reimport(path) => Some(path),
                TrackerEvent::RefreshAll => None,
            })
            .collect()
    }

    pub fn reimport_count(&self, path: &Path) -> usize {
        self.reimports().iter().filter(|p| p.as_path() == path).count()
    }

    pub fn refresh_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| **event == TrackerEvent::RefreshAll)
            .count()
    }
}

impl ArtifactTracker for RecordingArtifactTracker {
    fn force_reimport(&self, path: &Path) {
        self.events
            .lock()
            .unwrap()
            .push(TrackerEvent::Reimport(path.to_path_buf()));
    }

    fn refresh_all(&self) {
        self.events.lock().unwrap().push(TrackerEvent::RefreshAll);
    }
}

/// Convenience for asserting on argument lists
pub fn args_of(command: &CompileCommand) -> Vec<String> {
    command
        .args()
        .iter()
        .map(|arg: &OsString| arg.to_string_lossy().into_owned())
        .collect()
}
