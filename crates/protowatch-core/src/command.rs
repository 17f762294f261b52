use crate::config::CompilerConfig;
use crate::discovery::{IncludePathSet, SourceFile};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

pub const PROTO_PATH_FLAG: &str = "--proto_path";
pub const GRPC_OUT_FLAG: &str = "--grpc_out";
pub const GRPC_PLUGIN_FLAG: &str = "--plugin=protoc-gen-grpc";

/// One file to compile against the run's frozen include paths
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub file: &'a SourceFile,
    pub include_paths: &'a IncludePathSet,
    /// Recompile even if the output already exists
    pub force: bool,
}

impl<'a> CompileRequest<'a> {
    pub fn new(file: &'a SourceFile, include_paths: &'a IncludePathSet, force: bool) -> Self {
        Self {
            file,
            include_paths,
            force,
        }
    }

    /// Build the compiler invocation for this request
    pub fn to_command(&self, config: &CompilerConfig) -> CompileCommand {
        CompileCommand::build(config, self.file, self.include_paths)
    }
}

/// A fully resolved compiler invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CompileCommand {
    /// Arguments are, in order: the input file, the language output flag and
    /// directory, one `--proto_path` pair per include directory, then the gRPC
    /// flags when a plugin is configured.
    pub fn build(
        config: &CompilerConfig,
        file: &SourceFile,
        include_paths: &IncludePathSet,
    ) -> Self {
        let out_dir = file.directory();

        let mut args: Vec<OsString> = Vec::with_capacity(3 + include_paths.len() * 2 + 2);
        args.push(file.path().into());
        args.push(config.language.out_flag().into());
        args.push(out_dir.into());

        for dir in include_paths.iter() {
            args.push(PROTO_PATH_FLAG.into());
            args.push(dir.into());
        }

        if let Some(plugin) = &config.grpc_plugin {
            args.push(joined_flag(GRPC_OUT_FLAG, out_dir));
            args.push(joined_flag(GRPC_PLUGIN_FLAG, plugin));
        }

        Self {
            program: config.protoc.clone(),
            args,
        }
    }

    /// An arbitrary invocation, bypassing the `protoc` argument layout
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Whether `flag` is immediately followed by `value`
    pub fn has_pair(&self, flag: &str, value: impl AsRef<OsStr>) -> bool {
        let value = value.as_ref();
        self.args.windows(2).any(|pair| {
            pair[0].as_os_str() == OsStr::new(flag) && pair[1].as_os_str() == value
        })
    }
}

fn joined_flag(flag: &str, value: &Path) -> OsString {
    let mut joined = OsString::from(flag);
    joined.push("=");
    joined.push(value);
    joined
}

impl fmt::Display for CompileCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quoted(self.program.as_os_str()))?;
        for arg in &self.args {
            write!(f, " {}", quoted(arg))?;
        }
        Ok(())
    }
}

fn quoted(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    if arg.contains(char::is_whitespace) {
        format!("\"{}\"", arg)
    } else {
        arg.into_owned()
    }
}
