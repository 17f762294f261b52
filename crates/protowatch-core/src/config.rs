use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compiler location used when the settings leave it empty.
/// Treated as relative to the project root because it starts with `..`.
pub const DEFAULT_PROTOC_PATH: &str = "../Tools/protobuf/protoc.exe";

/// Path marker of the read-only package that ships this tool's own definitions
pub const VENDORED_PACKAGE_MARKER: &str = "Packages/com.e7.protobuf-unity";

/// Target language of the generated bindings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputLanguage {
    #[default]
    #[serde(rename = "csharp")]
    CSharp,
    #[serde(rename = "cpp")]
    Cpp,
    #[serde(rename = "python")]
    Python,
}

impl OutputLanguage {
    /// The `protoc` output flag, e.g. `--csharp_out`
    pub fn out_flag(&self) -> &'static str {
        match self {
            OutputLanguage::CSharp => "--csharp_out",
            OutputLanguage::Cpp => "--cpp_out",
            OutputLanguage::Python => "--python_out",
        }
    }

    /// Path of the generated source next to `input`
    pub fn output_path(&self, input: &Path) -> PathBuf {
        match self {
            OutputLanguage::CSharp => input.with_extension("cs"),
            OutputLanguage::Cpp => input.with_extension("pb.cc"),
            OutputLanguage::Python => {
                let stem = input.file_stem().unwrap_or_default().to_string_lossy();
                input.with_file_name(format!("{}_pb2.py", stem))
            }
        }
    }
}

/// Persisted user preferences, as stored by a [`crate::settings::SettingsStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Enable protobuf compilation (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to protoc; a leading `..` is relative to the project root
    #[serde(default = "default_protoc")]
    pub protoc_executable: String,

    /// Path to the gRPC plugin; empty disables gRPC output
    #[serde(default)]
    pub grpc_path: String,

    /// Log compilation errors from protoc (default: true)
    #[serde(default = "default_true")]
    pub log_error: bool,

    /// Log compilation completion messages and protoc stdout (default: false)
    #[serde(default)]
    pub log_standard: bool,

    /// Language of the generated bindings (default: csharp)
    #[serde(default)]
    pub language: OutputLanguage,

    /// Path fragments marking read-only vendored definitions
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// Run compiler invocations on a thread pool (default: false)
    #[serde(default)]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

fn default_protoc() -> String {
    DEFAULT_PROTOC_PATH.to_string()
}

fn default_excluded_paths() -> Vec<String> {
    vec![VENDORED_PACKAGE_MARKER.to_string()]
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            protoc_executable: default_protoc(),
            grpc_path: String::new(),
            log_error: true,
            log_standard: false,
            language: OutputLanguage::CSharp,
            excluded_paths: default_excluded_paths(),
            parallel: false,
        }
    }
}

/// Per-invocation overrides taken from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub enabled: Option<bool>,
    pub protoc_executable: Option<String>,
    pub grpc_path: Option<String>,
    pub log_error: Option<bool>,
    pub log_standard: Option<bool>,
    pub language: Option<OutputLanguage>,
    pub parallel: Option<bool>,
}

impl Settings {
    /// Merge command line overrides into these settings
    pub fn merge(&mut self, overrides: &CliOverrides) {
        if let Some(enabled) = overrides.enabled {
            self.enabled = enabled;
        }
        if let Some(ref protoc) = overrides.protoc_executable {
            self.protoc_executable = protoc.clone();
        }
        if let Some(ref grpc) = overrides.grpc_path {
            self.grpc_path = grpc.clone();
        }
        if let Some(log_error) = overrides.log_error {
            self.log_error = log_error;
        }
        if let Some(log_standard) = overrides.log_standard {
            self.log_standard = log_standard;
        }
        if let Some(language) = overrides.language {
            self.language = language;
        }
        if let Some(parallel) = overrides.parallel {
            self.parallel = parallel;
        }
    }
}

/// Immutable configuration for one orchestration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    pub enabled: bool,
    pub protoc: PathBuf,
    pub grpc_plugin: Option<PathBuf>,
    pub log_error: bool,
    pub log_standard: bool,
    pub language: OutputLanguage,
    pub excluded_paths: Vec<String>,
    pub parallel: bool,
}

impl CompilerConfig {
    /// Resolve raw settings against the project root
    pub fn from_settings(settings: &Settings, project_root: &Path) -> Self {
        let protoc = if settings.protoc_executable.is_empty() {
            DEFAULT_PROTOC_PATH
        } else {
            settings.protoc_executable.as_str()
        };

        let grpc_plugin = if settings.grpc_path.is_empty() {
            None
        } else {
            Some(resolve_setting_path(&settings.grpc_path, project_root))
        };

        Self {
            enabled: settings.enabled,
            protoc: resolve_setting_path(protoc, project_root),
            grpc_plugin,
            log_error: settings.log_error,
            log_standard: settings.log_standard,
            language: settings.language,
            excluded_paths: settings.excluded_paths.clone(),
            parallel: settings.parallel,
        }
    }

    /// Whether `path` lies inside one of the excluded vendored locations
    pub fn is_excluded(&self, path: &Path) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");
        self.excluded_paths
            .iter()
            .filter(|marker| !marker.is_empty())
            .any(|marker| normalized.contains(marker.as_str()))
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default(), Path::new("."))
    }
}

/// Paths starting with `..` are taken relative to the project root,
/// anything else is used as given
pub fn resolve_setting_path(raw: &str, project_root: &Path) -> PathBuf {
    if raw.starts_with("..") {
        project_root.join(raw)
    } else {
        PathBuf::from(raw)
    }
}
