//! Build orchestration: decide, invoke, classify, refresh
//!
//! Each discovered file ends in exactly one [`FileOutcome`]:
//!
//! - `Excluded`: lives in a vendored package, silently ignored
//! - `SkippedExisting`: output already present and the run is not forced
//! - `Succeeded` / `Failed`: the compiler was invoked once, classified by
//!   whether it wrote to stderr
//!
//! Errors never abort a run; every file is processed independently.

use crate::command::{CompileCommand, CompileRequest};
use crate::config::CompilerConfig;
use crate::diagnostics::DiagnosticHandler;
use crate::discovery::{discover, is_proto_file, Discovery, SourceFile};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::runner::{CompileResult, CompilerRunner};
use crate::tracker::ArtifactTracker;
use indexmap::IndexSet;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Terminal state of one file in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Excluded,
    SkippedExisting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Per-file outcomes of one run, in processing order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn count(&self, outcome: FileOutcome) -> usize {
        self.files.iter().filter(|f| f.outcome == outcome).count()
    }

    /// Files for which the compiler was actually invoked
    pub fn invoked(&self) -> usize {
        self.count(FileOutcome::Succeeded) + self.count(FileOutcome::Failed)
    }

    pub fn outcome_of(&self, path: &Path) -> Option<FileOutcome> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.outcome)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn push(&mut self, path: &Path, outcome: FileOutcome) {
        self.files.push(FileReport {
            path: path.to_path_buf(),
            outcome,
        });
    }
}

/// What to do with one file before any process is started
enum Plan {
    Done(FileOutcome),
    Invoke(CompileCommand),
}

/// A plan after the parallel phase, waiting to be classified in order
enum Executed {
    Done(FileOutcome),
    Ran(CompileCommand, Result<CompileResult>),
}

/// Drives the schema compiler over a discovered project
pub struct Orchestrator {
    config: Arc<CompilerConfig>,
    file_system: Arc<dyn FileSystem>,
    runner: Arc<dyn CompilerRunner>,
    tracker: Arc<dyn ArtifactTracker>,
    diagnostics: Arc<dyn DiagnosticHandler>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<CompilerConfig>,
        file_system: Arc<dyn FileSystem>,
        runner: Arc<dyn CompilerRunner>,
        tracker: Arc<dyn ArtifactTracker>,
        diagnostics: Arc<dyn DiagnosticHandler>,
    ) -> Self {
        Self {
            config,
            file_system,
            runner,
            tracker,
            diagnostics,
        }
    }

    /// Host startup: build only files whose output is missing
    pub fn on_startup(&self, root: &Path) -> Result<RunReport> {
        info!("Initializing protobuf compiler for {:?}", root);
        self.run(root, false)
    }

    /// "Force Compilation": rebuild every file
    pub fn force_compile(&self, root: &Path) -> Result<RunReport> {
        self.run(root, true)
    }

    /// Discover `root` afresh and compile it
    pub fn run(&self, root: &Path, force_all: bool) -> Result<RunReport> {
        if !self.config.enabled {
            info!("Protobuf compilation is disabled");
            return Ok(RunReport::default());
        }

        let discovery = self.discover(root)?;
        Ok(self.compile_all(&discovery, force_all))
    }

    pub fn discover(&self, root: &Path) -> Result<Discovery> {
        discover(self.file_system.as_ref(), root, self.config.language)
    }

    /// Process every discovered file in order, then request a full refresh.
    /// The include-path set is frozen before the first invocation.
    pub fn compile_all(&self, discovery: &Discovery, force_all: bool) -> RunReport {
        let plans: Vec<Plan> = discovery
            .files
            .iter()
            .map(|file| {
                self.plan(CompileRequest::new(
                    file,
                    &discovery.include_paths,
                    force_all,
                ))
            })
            .collect();

        let report = if self.config.parallel {
            self.execute_parallel(&discovery.files, plans)
        } else {
            self.execute_sequential(&discovery.files, plans)
        };

        debug!(
            "Run finished: {} invoked, {} failed",
            report.invoked(),
            report.count(FileOutcome::Failed)
        );
        self.tracker.refresh_all();
        report
    }

    /// Recompile files reported as changed by the host. Paths that are not
    /// discovered `.proto` files (deleted, renamed, other extensions) are
    /// ignored. A refresh is requested only if something compiled.
    pub fn compile_changed(&self, root: &Path, changed: &[PathBuf]) -> Result<RunReport> {
        if !self.config.enabled {
            debug!("Protobuf compilation is disabled, ignoring changes");
            return Ok(RunReport::default());
        }

        let protos: IndexSet<&PathBuf> = changed.iter().filter(|p| is_proto_file(p)).collect();
        if protos.is_empty() {
            return Ok(RunReport::default());
        }

        let discovery = self.discover(root)?;
        let mut report = RunReport::default();

        for path in protos {
            let Some(file) = discovery.find(path) else {
                debug!("Changed file {:?} is no longer present", path);
                continue;
            };
            let request = CompileRequest::new(file, &discovery.include_paths, true);
            let outcome = match self.plan(request) {
                Plan::Done(outcome) => outcome,
                Plan::Invoke(command) => {
                    self.log_start(file, &command);
                    let result = self.runner.run(&command);
                    self.finish(file, result)
                }
            };
            report.push(file.path(), outcome);
        }

        if report.count(FileOutcome::Succeeded) > 0 {
            self.tracker.refresh_all();
        }
        Ok(report)
    }

    fn plan(&self, request: CompileRequest<'_>) -> Plan {
        let file = request.file;

        if self.config.is_excluded(file.path()) {
            return Plan::Done(FileOutcome::Excluded);
        }

        if !request.force {
            if self.file_system.exists(file.output_path()) {
                debug!(
                    "Target file exists, skip converting: {:?}",
                    file.output_path()
                );
                return Plan::Done(FileOutcome::SkippedExisting);
            }
            debug!(
                "Target file does not exist, converting: {:?}",
                file.output_path()
            );
        }

        Plan::Invoke(request.to_command(&self.config))
    }

    fn execute_sequential(&self, files: &[SourceFile], plans: Vec<Plan>) -> RunReport {
        let mut report = RunReport::default();
        for (file, plan) in files.iter().zip(plans) {
            let outcome = match plan {
                Plan::Done(outcome) => outcome,
                Plan::Invoke(command) => {
                    self.log_start(file, &command);
                    let result = self.runner.run(&command);
                    self.finish(file, result)
                }
            };
            report.push(file.path(), outcome);
        }
        report
    }

    /// Invoke on the rayon pool, then classify and log in discovery order
    fn execute_parallel(&self, files: &[SourceFile], plans: Vec<Plan>) -> RunReport {
        let executed: Vec<Executed> = plans
            .into_par_iter()
            .map(|plan| match plan {
                Plan::Done(outcome) => Executed::Done(outcome),
                Plan::Invoke(command) => {
                    let result = self.runner.run(&command);
                    Executed::Ran(command, result)
                }
            })
            .collect();

        let mut report = RunReport::default();
        for (file, executed) in files.iter().zip(executed) {
            let outcome = match executed {
                Executed::Done(outcome) => outcome,
                Executed::Ran(command, result) => {
                    self.log_start(file, &command);
                    self.finish(file, result)
                }
            };
            report.push(file.path(), outcome);
        }
        report
    }

    fn log_start(&self, file: &SourceFile, command: &CompileCommand) {
        if self.config.log_standard {
            let path = file.path();
            self.diagnostics
                .info(Some(path), &format!("Compiling {}", path.display()));
            self.diagnostics
                .info(Some(path), &format!("Final arguments: {}", command));
        }
    }

    /// Classify one invocation and notify the tracker on success
    fn finish(&self, file: &SourceFile, result: Result<CompileResult>) -> FileOutcome {
        let path = file.path();

        let result = match result {
            Ok(result) => result,
            Err(e) => {
                if self.config.log_error {
                    self.diagnostics.error(Some(path), &e.to_string());
                } else {
                    debug!("{}", e);
                }
                return FileOutcome::Failed;
            }
        };

        if self.config.log_standard {
            if !result.stdout.is_empty() {
                self.diagnostics.info(Some(path), &result.stdout);
            }
            if result.succeeded() {
                let name = path.file_name().unwrap_or_default().to_string_lossy();
                self.diagnostics
                    .info(Some(path), &format!("Compiled {}", name));
            }
        }

        if !result.succeeded() {
            if self.config.log_error {
                self.diagnostics.error(Some(path), &result.stderr);
            }
            return FileOutcome::Failed;
        }

        self.tracker.force_reimport(file.output_path());
        FileOutcome::Succeeded
    }
}
