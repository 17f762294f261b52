//! Persistent preference storage
//!
//! Settings are read once at the start of every run and turned into an
//! immutable [`CompilerConfig`](crate::config::CompilerConfig). Writers (the
//! `--save` and `--init` surfaces of the CLI) go through the same store.

use crate::config::Settings;
use crate::errors::SettingsError;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Default settings file name, looked up in the project root
pub const SETTINGS_FILE_NAME: &str = "protowatch.yaml";

/// A persistent key-value store for [`Settings`]
pub trait SettingsStore: Send + Sync {
    /// Load the stored settings, falling back to defaults for missing keys
    fn load(&self) -> Result<Settings, SettingsError>;

    /// Persist `settings`, replacing what was stored
    fn save(&self, settings: &Settings) -> Result<(), SettingsError>;
}

/// Settings kept in a YAML (or `.json`) file on disk
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<project_root>/protowatch.yaml`
    pub fn in_project(project_root: &Path) -> Self {
        Self::new(project_root.join(SETTINGS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a default settings file, refusing to clobber an existing one
    pub fn init(&self) -> Result<Settings, SettingsError> {
        if self.path.exists() {
            return Err(SettingsError::AlreadyExists {
                path: self.path.clone(),
            });
        }
        let settings = Settings::default();
        self.save(&settings)?;
        Ok(settings)
    }

    fn is_json(&self) -> bool {
        self.path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        if !self.path.exists() {
            debug!("No settings file at {:?}, using defaults", self.path);
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        let settings = if self.is_json() {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        debug!("Loaded settings from {:?}", self.path);
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let content = if self.is_json() {
            serde_json::to_string_pretty(settings)?
        } else {
            serde_yaml::to_string(settings)?
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, content)?;
        debug!("Saved settings to {:?}", self.path);
        Ok(())
    }
}

/// In-memory store, for hosts that manage persistence themselves and for tests
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Settings, SettingsError> {
        Ok(self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputLanguage;
    use indoc::indoc;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSettingsStore::in_project(temp_dir.path());

        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_yaml_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSettingsStore::in_project(temp_dir.path());

        let settings = Settings {
            grpc_path: "/usr/bin/grpc_csharp_plugin".to_string(),
            log_standard: true,
            ..Settings::default()
        };
        store.save(&settings).unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("grpcPath"));
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_hand_written_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSettingsStore::in_project(temp_dir.path());
        std::fs::write(
            store.path(),
            indoc! {"
                protocExecutable: /usr/local/bin/protoc
                language: python
                excludedPaths:
                  - Packages/com.e7.protobuf-unity
                  - ThirdParty/
            "},
        )
        .unwrap();

        let settings = store.load().unwrap();
        assert_eq!(settings.protoc_executable, "/usr/local/bin/protoc");
        assert_eq!(settings.language, OutputLanguage::Python);
        assert_eq!(settings.excluded_paths.len(), 2);
        assert!(settings.enabled);
        assert!(settings.log_error);
        assert!(settings.grpc_path.is_empty());
    }

    #[test]
    fn test_json_store() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "enabled": false, "logError": false }"#).unwrap();

        let settings = FileSettingsStore::new(&path).load().unwrap();
        assert!(!settings.enabled);
        assert!(!settings.log_error);
        assert!(!settings.log_standard);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSettingsStore::in_project(temp_dir.path());
        std::fs::write(store.path(), "enabled: [not, a, bool]").unwrap();

        assert!(matches!(store.load(), Err(SettingsError::Yaml(_))));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSettingsStore::in_project(temp_dir.path());

        store.init().unwrap();
        assert!(store.path().exists());
        assert!(matches!(
            store.init(),
            Err(SettingsError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySettingsStore::default();
        let mut settings = store.load().unwrap();
        settings.enabled = false;
        store.save(&settings).unwrap();

        assert!(!store.load().unwrap().enabled);
    }
}
