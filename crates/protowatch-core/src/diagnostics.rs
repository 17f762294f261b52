use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Info,
}

/// A build message, optionally tied to the `.proto` file it concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub file: Option<PathBuf>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(file: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            file: file.map(Path::to_path_buf),
            message: message.into(),
        }
    }

    pub fn warning(file: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            file: file.map(Path::to_path_buf),
            message: message.into(),
        }
    }

    pub fn info(file: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            file: file.map(Path::to_path_buf),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}: {}", file.display(), self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Trait for routing build output to the host's logging surface
/// This allows for dependency injection and testing with collecting handlers
pub trait DiagnosticHandler: Send + Sync {
    fn report(&self, diagnostic: Diagnostic);

    fn error(&self, file: Option<&Path>, message: &str) {
        self.report(Diagnostic::error(file, message));
    }

    fn warning(&self, file: Option<&Path>, message: &str) {
        self.report(Diagnostic::warning(file, message));
    }

    fn info(&self, file: Option<&Path>, message: &str) {
        self.report(Diagnostic::info(file, message));
    }

    fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn error_count(&self) -> usize;
    fn warning_count(&self) -> usize;
}

/// Forwards diagnostics to `tracing`, keeping only counters so that a
/// long-running watch session does not accumulate messages
#[derive(Debug, Default)]
pub struct TracingDiagnosticHandler {
    errors: AtomicUsize,
    warnings: AtomicUsize,
}

impl TracingDiagnosticHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticHandler for TracingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.level {
            DiagnosticLevel::Error => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                tracing::error!("Protobuf: {}", diagnostic);
            }
            DiagnosticLevel::Warning => {
                self.warnings.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Protobuf: {}", diagnostic);
            }
            DiagnosticLevel::Info => tracing::info!("Protobuf: {}", diagnostic),
        }
    }

    fn error_count(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    fn warning_count(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }
}

/// Collecting diagnostic handler for testing
/// Collects all diagnostics without printing
#[derive(Debug, Default)]
pub struct CollectingDiagnosticHandler {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingDiagnosticHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn count(&self, level: DiagnosticLevel) -> usize {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|d| d.level == level)
            .count()
    }
}

impl DiagnosticHandler for CollectingDiagnosticHandler {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    fn error_count(&self) -> usize {
        self.count(DiagnosticLevel::Error)
    }

    fn warning_count(&self) -> usize {
        self.count(DiagnosticLevel::Warning)
    }
}
