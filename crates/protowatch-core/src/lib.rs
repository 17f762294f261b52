pub mod command;
pub mod config;
pub mod di;
pub mod diagnostics;
pub mod discovery;
pub mod errors;
pub mod fs;
pub mod orchestrator;
pub mod runner;
pub mod settings;
pub mod tracker;

pub use command::{CompileCommand, CompileRequest};
pub use config::{CliOverrides, CompilerConfig, OutputLanguage, Settings};
pub use di::Container;
pub use diagnostics::{Diagnostic, DiagnosticHandler, DiagnosticLevel};
pub use discovery::{discover, Discovery, IncludePathSet, SourceFile};
pub use errors::{ProtowatchError, SettingsError};
pub use orchestrator::{FileOutcome, FileReport, Orchestrator, RunReport};
pub use runner::{CompileResult, CompilerRunner, ProcessRunner};
pub use settings::{FileSettingsStore, MemorySettingsStore, SettingsStore};
pub use tracker::{ArtifactTracker, TracingArtifactTracker};
