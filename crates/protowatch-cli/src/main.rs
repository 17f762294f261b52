use anyhow::Context;
use clap::Parser;
use protowatch_core::config::{CliOverrides, OutputLanguage};
use protowatch_core::discovery::is_proto_file;
use protowatch_core::orchestrator::{FileOutcome, Orchestrator, RunReport};
use protowatch_core::settings::{FileSettingsStore, SettingsStore};
use protowatch_core::Container;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Protowatch - regenerate protobuf bindings for every .proto file in a project
#[derive(Parser, Debug, Clone)]
#[command(name = "protowatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project root to scan for .proto files
    #[arg(value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Path to the settings file (default: DIR/protowatch.yaml)
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Recompile every file, even when its generated output exists
    #[arg(short, long)]
    force: bool,

    /// Watch the project for changes and recompile edited files
    #[arg(short, long)]
    watch: bool,

    /// Write a default settings file into the project
    #[arg(long)]
    init: bool,

    /// Path to protoc (a leading .. is relative to DIR)
    #[arg(long, value_name = "PATH")]
    protoc: Option<String>,

    /// Path to the gRPC plugin; enables gRPC output
    #[arg(long, value_name = "PATH")]
    grpc_plugin: Option<String>,

    /// Language of the generated bindings (csharp, cpp, python)
    #[arg(long, value_name = "LANG")]
    language: Option<String>,

    /// Log compiler output and completion messages
    #[arg(long)]
    log_standard: bool,

    /// Do not log compiler errors
    #[arg(long)]
    no_log_error: bool,

    /// Run compiler invocations in parallel
    #[arg(long)]
    parallel: bool,

    /// Enable compilation (overrides the settings file)
    #[arg(long, conflicts_with = "disable")]
    enable: bool,

    /// Disable compilation (overrides the settings file)
    #[arg(long)]
    disable: bool,

    /// Persist the command line overrides to the settings file
    #[arg(long)]
    save: bool,
}

fn main() -> anyhow::Result<()> {
    // Set RUST_LOG=debug for detailed logs, RUST_LOG=info for normal output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("Project root {:?} does not exist", cli.root))?;
    let store = match cli.settings {
        Some(ref path) => FileSettingsStore::new(path),
        None => FileSettingsStore::in_project(&root),
    };

    if cli.init {
        return init_project(&store);
    }

    let overrides = build_overrides(&cli)?;

    if cli.save {
        let mut settings = store.load()?;
        settings.merge(&overrides);
        store.save(&settings)?;
        info!("Saved settings to {:?}", store.path());
    }

    let container = Container::from_store(&store, &root, &overrides)?;
    let config = container.config();
    info!("Project root: {:?}", root);
    debug!("Compiler: {:?}", config.protoc);
    debug!("gRPC plugin: {:?}", config.grpc_plugin);
    debug!("Watch mode: {}", cli.watch);

    let orchestrator = container.orchestrator();
    if cli.watch {
        watch_mode(&orchestrator, &root, cli.force)
    } else {
        let report = initial_run(&orchestrator, &root, cli.force)?;
        print_summary(&report);
        Ok(())
    }
}

/// Write a default settings file
fn init_project(store: &FileSettingsStore) -> anyhow::Result<()> {
    println!("Initializing protowatch settings...");
    store
        .init()
        .with_context(|| format!("Failed to initialize {:?}", store.path()))?;
    println!("Created {}", store.path().display());
    Ok(())
}

/// Parse the binding language name
fn parse_language(language: &str) -> anyhow::Result<OutputLanguage> {
    match language {
        "csharp" | "cs" | "c#" => Ok(OutputLanguage::CSharp),
        "cpp" | "c++" => Ok(OutputLanguage::Cpp),
        "python" | "py" => Ok(OutputLanguage::Python),
        _ => Err(anyhow::anyhow!(
            "Invalid language '{}'. Supported languages: csharp, cpp, python",
            language
        )),
    }
}

fn build_overrides(cli: &Cli) -> anyhow::Result<CliOverrides> {
    let mut overrides = CliOverrides::default();

    if cli.enable {
        overrides.enabled = Some(true);
    }
    if cli.disable {
        overrides.enabled = Some(false);
    }
    overrides.protoc_executable = cli.protoc.clone();
    overrides.grpc_path = cli.grpc_plugin.clone();
    if let Some(ref language) = cli.language {
        overrides.language = Some(parse_language(language)?);
    }
    if cli.log_standard {
        overrides.log_standard = Some(true);
    }
    if cli.no_log_error {
        overrides.log_error = Some(false);
    }
    if cli.parallel {
        overrides.parallel = Some(true);
    }

    Ok(overrides)
}

fn initial_run(orchestrator: &Orchestrator, root: &Path, force: bool) -> anyhow::Result<RunReport> {
    let report = if force {
        orchestrator.force_compile(root)?
    } else {
        orchestrator.on_startup(root)?
    };
    Ok(report)
}

fn print_summary(report: &RunReport) {
    info!(
        "Processed {} proto file(s): {} compiled, {} failed, {} up to date, {} excluded",
        report.files.len(),
        report.count(FileOutcome::Succeeded),
        report.count(FileOutcome::Failed),
        report.count(FileOutcome::SkippedExisting),
        report.count(FileOutcome::Excluded)
    );
}

/// Watch mode - recompile .proto files as they change
fn watch_mode(orchestrator: &Orchestrator, root: &Path, force: bool) -> anyhow::Result<()> {
    use notify::{Event, RecursiveMode, Watcher};
    use std::sync::mpsc::{channel, RecvTimeoutError};
    use std::time::{Duration, Instant};

    println!("Watching for changes... (Press Ctrl+C to stop)");

    println!("\nInitial compilation:");
    match initial_run(orchestrator, root, force) {
        Ok(report) => print_summary(&report),
        Err(e) => eprintln!("Error: {:#}", e),
    }

    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;

    // Changes are collected until the tree has been quiet for the debounce
    // window, then compiled together.
    let debounce_duration = Duration::from_millis(100);
    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
    let mut last_event = Instant::now();

    loop {
        match rx.recv_timeout(debounce_duration) {
            Ok(event) => {
                if collect_changes(event, &mut pending) {
                    last_event = Instant::now();
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                return Err(anyhow::anyhow!("File watcher disconnected"));
            }
        }

        if !pending.is_empty() && last_event.elapsed() >= debounce_duration {
            let changed: Vec<PathBuf> = std::mem::take(&mut pending).into_iter().collect();
            println!("\nFile changed, recompiling {} file(s)...", changed.len());
            match orchestrator.compile_changed(root, &changed) {
                Ok(report) => print_summary(&report),
                Err(e) => eprintln!("Error: {:#}", e),
            }
        }
    }
}

/// Queue the `.proto` paths of a change event. Returns true if the event
/// touched any, including ones already queued.
fn collect_changes(event: notify::Event, pending: &mut BTreeSet<PathBuf>) -> bool {
    use notify::event::{EventKind, ModifyKind};

    let is_change = matches!(
        event.kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any)
    );
    if !is_change {
        return false;
    }

    let mut touched = false;
    for path in event.paths.into_iter().filter(|p| is_proto_file(p)) {
        pending.insert(path);
        touched = true;
    }
    touched
}
