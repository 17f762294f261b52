use std::path::Path;
use tracing::info;

/// The host's mechanism for noticing newly generated files
pub trait ArtifactTracker: Send + Sync {
    /// Re-import one generated file right away
    fn force_reimport(&self, path: &Path);

    /// Rescan everything the host tracks
    fn refresh_all(&self);
}

/// Tracker for hosts without an asset database: records the events in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingArtifactTracker;

impl TracingArtifactTracker {
    pub fn new() -> Self {
        TracingArtifactTracker
    }
}

impl ArtifactTracker for TracingArtifactTracker {
    fn force_reimport(&self, path: &Path) {
        info!("Generated: {:?}", path);
    }

    fn refresh_all(&self) {
        tracing::debug!("Artifact refresh requested");
    }
}
