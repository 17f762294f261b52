use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading settings or driving the schema compiler
#[derive(Debug, Error)]
pub enum ProtowatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start compiler '{}': {source}", path.display())]
    MissingExecutable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to walk {}: {message}", root.display())]
    Discovery { root: PathBuf, message: String },
}

/// Errors from reading or writing the persistent settings store
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON settings: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings file already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, ProtowatchError>;
