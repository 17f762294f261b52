use crate::config::{CliOverrides, CompilerConfig};
use crate::diagnostics::{DiagnosticHandler, TracingDiagnosticHandler};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::orchestrator::Orchestrator;
use crate::runner::{CompilerRunner, ProcessRunner};
use crate::settings::SettingsStore;
use crate::tracker::{ArtifactTracker, TracingArtifactTracker};
use std::path::Path;
use std::sync::Arc;

/// Dependency injection container
/// Manages all shared dependencies and creates instances with proper wiring
pub struct Container {
    config: Arc<CompilerConfig>,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
    file_system: Arc<dyn FileSystem>,
    runner: Arc<dyn CompilerRunner>,
    tracker: Arc<dyn ArtifactTracker>,
}

impl Container {
    /// Create a new container with production dependencies
    pub fn new(config: CompilerConfig) -> Self {
        Container {
            config: Arc::new(config),
            diagnostic_handler: Arc::new(TracingDiagnosticHandler::new()),
            file_system: Arc::new(RealFileSystem::new()),
            runner: Arc::new(ProcessRunner::new()),
            tracker: Arc::new(TracingArtifactTracker::new()),
        }
    }

    /// Read the settings store once and build a production container.
    /// The resulting configuration is fixed for every run of this container.
    pub fn from_store(
        store: &dyn SettingsStore,
        project_root: &Path,
        overrides: &CliOverrides,
    ) -> Result<Self> {
        let mut settings = store.load()?;
        settings.merge(overrides);
        Ok(Self::new(CompilerConfig::from_settings(
            &settings,
            project_root,
        )))
    }

    /// Create a container with custom dependencies (for testing)
    pub fn with_dependencies(
        config: CompilerConfig,
        diagnostic_handler: Arc<dyn DiagnosticHandler>,
        file_system: Arc<dyn FileSystem>,
        runner: Arc<dyn CompilerRunner>,
        tracker: Arc<dyn ArtifactTracker>,
    ) -> Self {
        Container {
            config: Arc::new(config),
            diagnostic_handler,
            file_system,
            runner,
            tracker,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Arc<CompilerConfig> {
        &self.config
    }

    /// Get the diagnostic handler
    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostic_handler
    }

    /// Get the file system
    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    /// Wire an orchestrator from the container's dependencies
    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(
            self.config.clone(),
            self.file_system.clone(),
            self.runner.clone(),
            self.tracker.clone(),
            self.diagnostic_handler.clone(),
        )
    }

    /// Check if any errors have been reported
    pub fn has_errors(&self) -> bool {
        self.diagnostic_handler.has_errors()
    }

    /// Get the error count
    pub fn error_count(&self) -> usize {
        self.diagnostic_handler.error_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::diagnostics::CollectingDiagnosticHandler;
    use crate::fs::MockFileSystem;
    use crate::settings::MemorySettingsStore;

    #[test]
    fn test_container_creation() {
        let container = Container::new(CompilerConfig::default());

        assert_eq!(container.error_count(), 0);
        assert!(!container.has_errors());
    }

    #[test]
    fn test_container_with_mock_dependencies() {
        let diagnostics = Arc::new(CollectingDiagnosticHandler::new());
        let container = Container::with_dependencies(
            CompilerConfig::default(),
            diagnostics.clone(),
            Arc::new(MockFileSystem::new()),
            Arc::new(ProcessRunner::new()),
            Arc::new(TracingArtifactTracker::new()),
        );

        container
            .diagnostic_handler()
            .error(None, "Test error");

        assert!(container.has_errors());
        assert_eq!(container.error_count(), 1);
        assert_eq!(diagnostics.get_diagnostics().len(), 1);
    }

    #[test]
    fn test_from_store_applies_overrides() {
        let store = MemorySettingsStore::new(Settings {
            protoc_executable: "../bin/protoc".to_string(),
            ..Settings::default()
        });
        let overrides = CliOverrides {
            log_standard: Some(true),
            ..CliOverrides::default()
        };

        let container = Container::from_store(&store, Path::new("/proj"), &overrides).unwrap();

        assert!(container.config().log_standard);
        assert_eq!(
            container.config().protoc,
            std::path::PathBuf::from("/proj/../bin/protoc")
        );
    }

    #[test]
    fn test_disabled_container_does_nothing() {
        let mut config = CompilerConfig::default();
        config.enabled = false;
        let container = Container::with_dependencies(
            config,
            Arc::new(CollectingDiagnosticHandler::new()),
            Arc::new(MockFileSystem::new()),
            Arc::new(ProcessRunner::new()),
            Arc::new(TracingArtifactTracker::new()),
        );

        // Root does not exist in the mock; a disabled run never looks.
        let report = container
            .orchestrator()
            .force_compile(Path::new("/missing"))
            .unwrap();
        assert!(report.is_empty());
    }
}
