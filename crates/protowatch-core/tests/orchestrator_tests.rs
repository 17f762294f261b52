use protowatch_core::config::{CompilerConfig, OutputLanguage, Settings};
use protowatch_core::diagnostics::DiagnosticLevel;
use protowatch_core::fs::MockFileSystem;
use protowatch_core::orchestrator::FileOutcome;
use protowatch_test_helpers::mocks::{args_of, MockCompilerRunner, TrackerEvent};
use protowatch_test_helpers::project::Harness;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ROOT: &str = "/proj";

fn config() -> CompilerConfig {
    config_from(Settings {
        protoc_executable: "/usr/bin/protoc".to_string(),
        ..Settings::default()
    })
}

fn config_from(settings: Settings) -> CompilerConfig {
    CompilerConfig::from_settings(&settings, Path::new(ROOT))
}

fn root() -> &'static Path {
    Path::new(ROOT)
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_two_directories_no_outputs() {
    let harness = Harness::new(config(), &["/proj/a/x.proto", "/proj/b/y.proto"]);

    let report = harness.orchestrator().on_startup(root()).unwrap();

    assert_eq!(report.invoked(), 2);
    assert_eq!(harness.runner.invocation_count(), 2);
    for command in harness.runner.invocations() {
        assert!(command.has_pair("--proto_path", "/proj/a"));
        assert!(command.has_pair("--proto_path", "/proj/b"));
    }
    assert_eq!(
        harness.tracker.reimports(),
        vec![PathBuf::from("/proj/a/x.cs"), PathBuf::from("/proj/b/y.cs")]
    );
}

#[test]
fn test_generated_outputs_satisfy_next_startup() {
    let fs = Arc::new(MockFileSystem::new());
    fs.add_file("/proj/a/x.proto");
    fs.add_file("/proj/b/y.proto");
    let runner = MockCompilerRunner::writing_outputs(fs.clone(), "cs");
    let harness = Harness::with_parts(config(), fs, runner);
    let orchestrator = harness.orchestrator();

    let first = orchestrator.on_startup(root()).unwrap();
    let second = orchestrator.on_startup(root()).unwrap();

    assert_eq!(first.count(FileOutcome::Succeeded), 2);
    assert_eq!(second.invoked(), 0);
    assert_eq!(second.count(FileOutcome::SkippedExisting), 2);
    assert_eq!(harness.runner.invocation_count(), 2);
    assert_eq!(harness.tracker.refresh_count(), 2);
}

#[test]
fn test_existing_output_is_skipped_without_force() {
    let harness = Harness::new(
        config(),
        &["/proj/a/x.proto", "/proj/a/x.cs", "/proj/b/y.proto"],
    );

    let report = harness.orchestrator().on_startup(root()).unwrap();

    assert_eq!(
        harness.runner.compiled_inputs(),
        vec![PathBuf::from("/proj/b/y.proto")]
    );
    assert_eq!(
        report.outcome_of(Path::new("/proj/a/x.proto")),
        Some(FileOutcome::SkippedExisting)
    );
    assert_eq!(
        report.outcome_of(Path::new("/proj/b/y.proto")),
        Some(FileOutcome::Succeeded)
    );
}

#[test]
fn test_force_recompiles_existing_outputs() {
    let harness = Harness::new(
        config(),
        &["/proj/a/x.proto", "/proj/a/x.cs", "/proj/b/y.proto", "/proj/b/y.cs"],
    );

    let report = harness.orchestrator().force_compile(root()).unwrap();

    assert_eq!(report.count(FileOutcome::Succeeded), 2);
    assert!(harness.runner.was_invoked_for(Path::new("/proj/a/x.proto")));
    assert!(harness.runner.was_invoked_for(Path::new("/proj/b/y.proto")));
}

#[test]
fn test_grpc_flags_on_every_invocation() {
    let harness = Harness::new(
        config_from(Settings {
            protoc_executable: "/usr/bin/protoc".to_string(),
            grpc_path: "/usr/bin/grpc_csharp_plugin".to_string(),
            ..Settings::default()
        }),
        &["/proj/a/x.proto", "/proj/b/y.proto"],
    );

    harness.orchestrator().force_compile(root()).unwrap();

    let invocations = harness.runner.invocations();
    assert_eq!(invocations.len(), 2);
    for command in &invocations {
        let args = args_of(command);
        let out_dir = Path::new(&args[0]).parent().unwrap().display().to_string();
        assert!(args.contains(&format!("--grpc_out={}", out_dir)));
        assert!(args.contains(&"--plugin=protoc-gen-grpc=/usr/bin/grpc_csharp_plugin".to_string()));
    }
}

#[test]
fn test_invocation_argument_order() {
    let harness = Harness::new(config(), &["/proj/a/x.proto", "/proj/b/y.proto"]);

    harness.orchestrator().force_compile(root()).unwrap();

    let first = &harness.runner.invocations()[0];
    assert_eq!(first.program(), Path::new("/usr/bin/protoc"));
    assert_eq!(
        args_of(first),
        vec![
            "/proj/a/x.proto",
            "--csharp_out",
            "/proj/a",
            "--proto_path",
            "/proj/a",
            "--proto_path",
            "/proj/b",
        ]
    );
}

// ============================================================================
// EXCLUSION
// ============================================================================

#[test]
fn test_vendored_files_are_silently_ignored() {
    let vendored = "/proj/Packages/com.e7.protobuf-unity/Runtime/descriptor.proto";
    for force in [false, true] {
        let harness = Harness::new(
            config_from(Settings {
                protoc_executable: "/usr/bin/protoc".to_string(),
                log_standard: true,
                ..Settings::default()
            }),
            &[vendored, "/proj/a/x.proto"],
        );

        let report = harness.orchestrator().run(root(), force).unwrap();

        assert_eq!(
            report.outcome_of(Path::new(vendored)),
            Some(FileOutcome::Excluded)
        );
        assert!(!harness.runner.was_invoked_for(Path::new(vendored)));
        assert!(harness
            .diagnostics
            .get_diagnostics()
            .iter()
            .all(|d| d.file.as_deref() != Some(Path::new(vendored))));
    }
}

#[test]
fn test_vendored_directory_still_counts_as_include_path() {
    let harness = Harness::new(
        config(),
        &[
            "/proj/Packages/com.e7.protobuf-unity/Runtime/descriptor.proto",
            "/proj/a/x.proto",
        ],
    );

    harness.orchestrator().force_compile(root()).unwrap();

    let command = &harness.runner.invocations()[0];
    assert!(command.has_pair(
        "--proto_path",
        "/proj/Packages/com.e7.protobuf-unity/Runtime"
    ));
}

// ============================================================================
// CLASSIFICATION AND REFRESH
// ============================================================================

#[test]
fn test_stderr_means_failure_and_no_reimport() {
    let harness = Harness::new(config(), &["/proj/a/x.proto", "/proj/b/y.proto"]);
    harness
        .runner
        .respond("/proj/a/x.proto", "", "x.proto:3:1: Expected top-level statement.");

    let report = harness.orchestrator().force_compile(root()).unwrap();

    assert_eq!(
        report.outcome_of(Path::new("/proj/a/x.proto")),
        Some(FileOutcome::Failed)
    );
    assert_eq!(harness.tracker.reimport_count(Path::new("/proj/a/x.cs")), 0);
    assert_eq!(harness.tracker.reimport_count(Path::new("/proj/b/y.cs")), 1);
}

#[test]
fn test_refresh_all_requested_once_after_run() {
    let harness = Harness::new(config(), &["/proj/a/x.proto", "/proj/b/y.proto"]);

    harness.orchestrator().force_compile(root()).unwrap();

    let events = harness.tracker.events();
    assert_eq!(events.last(), Some(&TrackerEvent::RefreshAll));
    assert_eq!(harness.tracker.refresh_count(), 1);
}

#[test]
fn test_refresh_all_even_when_nothing_compiled() {
    let harness = Harness::new(config(), &["/proj/a/x.proto", "/proj/a/x.cs"]);

    let report = harness.orchestrator().on_startup(root()).unwrap();

    assert_eq!(report.invoked(), 0);
    assert_eq!(harness.tracker.events(), vec![TrackerEvent::RefreshAll]);
}

#[test]
fn test_missing_executable_does_not_abort_the_run() {
    let harness = Harness::with_runner(
        config(),
        &["/proj/a/x.proto", "/proj/b/y.proto"],
        MockCompilerRunner::missing(),
    );

    let report = harness.orchestrator().force_compile(root()).unwrap();

    assert_eq!(report.count(FileOutcome::Failed), 2);
    assert_eq!(harness.runner.invocation_count(), 2);
    let errors: Vec<_> = harness
        .diagnostics
        .get_diagnostics()
        .into_iter()
        .filter(|d| d.level == DiagnosticLevel::Error)
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].message.contains("/usr/bin/protoc"));
    assert!(harness.tracker.reimports().is_empty());
}

// ============================================================================
// LOG GATING
// ============================================================================

#[test]
fn test_errors_logged_only_with_log_error() {
    for log_error in [true, false] {
        let harness = Harness::new(
            config_from(Settings {
                log_error,
                ..Settings::default()
            }),
            &["/proj/a/x.proto"],
        );
        harness.runner.respond("/proj/a/x.proto", "", "boom");

        harness.orchestrator().force_compile(root()).unwrap();

        let errors = harness.diagnostics.get_diagnostics();
        if log_error {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].level, DiagnosticLevel::Error);
            assert_eq!(errors[0].message, "boom");
        } else {
            assert!(errors.is_empty());
        }
    }
}

#[test]
fn test_standard_output_logged_only_with_log_standard() {
    let quiet = Harness::new(config(), &["/proj/a/x.proto"]);
    quiet.runner.respond("/proj/a/x.proto", "note: done", "");
    quiet.orchestrator().force_compile(root()).unwrap();
    assert!(quiet.messages().is_empty());

    let verbose = Harness::new(
        config_from(Settings {
            protoc_executable: "/usr/bin/protoc".to_string(),
            log_standard: true,
            ..Settings::default()
        }),
        &["/proj/a/x.proto"],
    );
    verbose.runner.respond("/proj/a/x.proto", "note: done", "");
    verbose.orchestrator().force_compile(root()).unwrap();

    let messages = verbose.messages();
    assert_eq!(messages[0], "Compiling /proj/a/x.proto");
    assert!(messages[1].starts_with("Final arguments: /usr/bin/protoc /proj/a/x.proto"));
    assert_eq!(messages[2], "note: done");
    assert_eq!(messages[3], "Compiled x.proto");
}

#[test]
fn test_no_completion_message_on_failure() {
    let harness = Harness::new(
        config_from(Settings {
            log_standard: true,
            log_error: false,
            ..Settings::default()
        }),
        &["/proj/a/x.proto"],
    );
    harness.runner.respond("/proj/a/x.proto", "", "warning: unused import");

    harness.orchestrator().force_compile(root()).unwrap();

    assert!(!harness.messages().iter().any(|m| m.starts_with("Compiled")));
}

// ============================================================================
// ENABLED FLAG, LANGUAGES, PARALLEL
// ============================================================================

#[test]
fn test_disabled_runs_nothing() {
    let harness = Harness::new(
        config_from(Settings {
            enabled: false,
            ..Settings::default()
        }),
        &["/proj/a/x.proto"],
    );

    let orchestrator = harness.orchestrator();
    assert!(orchestrator.on_startup(root()).unwrap().is_empty());
    assert!(orchestrator.force_compile(root()).unwrap().is_empty());
    assert!(orchestrator
        .compile_changed(root(), &[PathBuf::from("/proj/a/x.proto")])
        .unwrap()
        .is_empty());
    assert_eq!(harness.runner.invocation_count(), 0);
    assert!(harness.tracker.events().is_empty());
}

#[test]
fn test_python_output_naming() {
    let harness = Harness::new(
        config_from(Settings {
            language: OutputLanguage::Python,
            ..Settings::default()
        }),
        &["/proj/a/x.proto", "/proj/a/x_pb2.py", "/proj/b/y.proto"],
    );

    harness.orchestrator().on_startup(root()).unwrap();

    assert_eq!(
        harness.runner.compiled_inputs(),
        vec![PathBuf::from("/proj/b/y.proto")]
    );
    assert!(harness.runner.invocations()[0].has_pair("--python_out", "/proj/b"));
    assert_eq!(
        harness.tracker.reimports(),
        vec![PathBuf::from("/proj/b/y_pb2.py")]
    );
}

#[test]
fn test_parallel_run_matches_sequential_output() {
    let files = [
        "/proj/a/one.proto",
        "/proj/a/two.proto",
        "/proj/b/three.proto",
        "/proj/c/four.proto",
        "/proj/c/four.cs",
    ];
    let run = |parallel: bool| {
        let harness = Harness::new(
            config_from(Settings {
                log_standard: true,
                parallel,
                ..Settings::default()
            }),
            &files,
        );
        harness.runner.respond("/proj/b/three.proto", "", "three.proto: error");
        let report = harness.orchestrator().on_startup(root()).unwrap();
        // One process per compiled file, never a retry
        assert_eq!(harness.runner.invocation_count(), 3);
        (report, harness.messages(), harness.tracker.events())
    };

    let sequential = run(false);
    let parallel = run(true);

    assert_eq!(sequential, parallel);
    assert_eq!(sequential.0.invoked(), 3);
    assert_eq!(sequential.0.count(FileOutcome::SkippedExisting), 1);
}

// ============================================================================
// CHANGE-TRIGGERED COMPILATION
// ============================================================================

#[test]
fn test_compile_changed_always_recompiles() {
    let harness = Harness::new(
        config(),
        &["/proj/a/x.proto", "/proj/a/x.cs", "/proj/b/y.proto"],
    );

    let report = harness
        .orchestrator()
        .compile_changed(root(), &[PathBuf::from("/proj/a/x.proto")])
        .unwrap();

    assert_eq!(
        harness.runner.compiled_inputs(),
        vec![PathBuf::from("/proj/a/x.proto")]
    );
    assert_eq!(report.count(FileOutcome::Succeeded), 1);
    // Include paths come from a fresh discovery of the whole tree.
    assert!(harness.runner.invocations()[0].has_pair("--proto_path", "/proj/b"));
    assert_eq!(
        harness.tracker.events(),
        vec![
            TrackerEvent::Reimport(PathBuf::from("/proj/a/x.cs")),
            TrackerEvent::RefreshAll,
        ]
    );
}

#[test]
fn test_compile_changed_ignores_other_files() {
    let harness = Harness::new(config(), &["/proj/a/x.proto", "/proj/a/notes.txt"]);

    let report = harness
        .orchestrator()
        .compile_changed(
            root(),
            &[
                PathBuf::from("/proj/a/notes.txt"),
                PathBuf::from("/proj/a/x.cs"),
                PathBuf::from("/proj/a/deleted.proto"),
            ],
        )
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(harness.runner.invocation_count(), 0);
    assert!(harness.tracker.events().is_empty());
}

#[test]
fn test_compile_changed_deduplicates_and_skips_refresh_on_failure() {
    let harness = Harness::new(config(), &["/proj/a/x.proto"]);
    harness.runner.respond("/proj/a/x.proto", "", "bad");

    let changed = vec![
        PathBuf::from("/proj/a/x.proto"),
        PathBuf::from("/proj/a/x.proto"),
    ];
    let report = harness
        .orchestrator()
        .compile_changed(root(), &changed)
        .unwrap();

    assert_eq!(report.files.len(), 1);
    assert_eq!(harness.runner.invocation_count(), 1);
    assert_eq!(harness.tracker.refresh_count(), 0);
}
