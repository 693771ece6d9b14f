//! End-to-end session tests: discovery, import, filtering, running, sorting

use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use trellis::{
    asserts, tag, Catalog, DefinitionError, DiscoveryError, Failure, Hook, Registrar, Registry,
    Session, Suite, SuiteBuilder, SuiteError, Test, TestFile, TestResult,
};

// ============================================================================
// Test Helpers
// ============================================================================

thread_local! {
    static EVENTS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(event: &str) {
    EVENTS.with(|e| e.borrow_mut().push(event.to_string()));
}

fn take_events() -> Vec<String> {
    EVENTS.with(|e| std::mem::take(&mut *e.borrow_mut()))
}

fn touch(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

/// A tree with two modules, one package, and their test files
fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("lib/calendar.rs"));
    touch(&root.join("lib/__tests/calendar.rs"));
    touch(&root.join("lib/paths.rs"));
    touch(&root.join("lib/__tests/paths.rs"));
    touch(&root.join("lib/strings/mod.rs"));
    touch(&root.join("lib/__tests/strings.rs"));
    dir
}

struct Calendar;

impl Suite for Calendar {
    fn new_shared_instance() -> Self {
        Calendar
    }

    fn before(&mut self) -> TestResult {
        record("before");
        Ok(())
    }

    fn after(&mut self) -> TestResult {
        record("after");
        Ok(())
    }
}

fn register_calendar(registrar: &mut Registrar<'_>) -> Result<(), DefinitionError> {
    registrar.define(
        SuiteBuilder::<Calendar>::new()
            .named("CalendarTests")
            .test("test_leap_year", |_| {
                record("body:test_leap_year");
                asserts::equal(&(2024 % 4), &0)
            })
            .test("test_slow_scan", |_| {
                record("body:test_slow_scan");
                Ok(())
            })
            .with(tag(["skip"]))
            .test("test_broken", |_| {
                record("body:test_broken");
                asserts::fail("month out of range")
            }),
    )?;
    Ok(())
}

struct Paths;

impl Suite for Paths {
    fn new_shared_instance() -> Self {
        Paths
    }

    fn initialize() -> TestResult {
        Err(Failure::msg("scratch directory unavailable"))
    }
}

fn register_paths(registrar: &mut Registrar<'_>) -> Result<(), DefinitionError> {
    registrar.define(
        SuiteBuilder::<Paths>::new()
            .named("PathsTests")
            .test("test_join", |_| Ok(())),
    )?;
    Ok(())
}

struct Strings;

impl Suite for Strings {
    fn new_shared_instance() -> Self {
        Strings
    }
}

fn register_strings(registrar: &mut Registrar<'_>) -> Result<(), DefinitionError> {
    registrar.define(
        SuiteBuilder::<Strings>::new()
            .named("B_StringsTests")
            .test("test_b", |_| Ok(()))
            .test("test_a", |_| Ok(())),
    )?;
    registrar.define(
        SuiteBuilder::<Strings>::new()
            .named("A_StringsTests")
            .test("test_z", |_| Ok(())),
    )?;
    Ok(())
}

fn register_syntax_error(_: &mut Registrar<'_>) -> Result<(), DefinitionError> {
    panic!("unexpected token")
}

fn catalog() -> Catalog {
    Catalog::new()
        .entry("lib/__tests/calendar.rs", register_calendar)
        .entry("lib/__tests/paths.rs", register_paths)
        .entry("lib/__tests/strings.rs", register_strings)
}

fn names(tests: &[Test]) -> Vec<(String, String)> {
    tests
        .iter()
        .map(|t| (t.suite_name().to_string(), t.test_name().to_string()))
        .collect()
}

// ============================================================================
// Aggregation
// ============================================================================

#[test]
fn test_report_is_sorted_by_module_suite_and_test() {
    let dir = project();
    let report = trellis::main(dir.path(), &mut catalog(), |t| !t.tags().contains("skip")).unwrap();

    assert_eq!(
        names(&report.tests),
        vec![
            ("CalendarTests".into(), "test_broken".into()),
            ("CalendarTests".into(), "test_leap_year".into()),
            ("A_StringsTests".into(), "test_z".into()),
            ("B_StringsTests".into(), "test_a".into()),
            ("B_StringsTests".into(), "test_b".into()),
        ]
    );
    assert_eq!(
        report.tests[2].module_path(),
        dir.path().join("lib/strings").as_path()
    );
}

#[test]
fn test_filtered_tests_never_run() {
    let dir = project();
    take_events();

    let report = trellis::main(dir.path(), &mut catalog(), |t| !t.tags().contains("skip")).unwrap();

    let events = take_events();
    assert!(!events.iter().any(|e| e == "body:test_slow_scan"));
    assert_eq!(events.iter().filter(|e| *e == "before").count(), 2);
    assert_eq!(events.iter().filter(|e| *e == "after").count(), 2);
    assert!(!report.tests.iter().any(|t| t.test_name() == "test_slow_scan"));
}

fn register_renamed_last(registrar: &mut Registrar<'_>) -> Result<(), DefinitionError> {
    registrar.define(
        SuiteBuilder::<Calendar>::new()
            .test("test_slow_scan", |_| {
                record("body:test_slow_scan");
                Ok(())
            })
            .with(tag(["skip"]))
            .test("test_leap_year", |_| Ok(()))
            .named("CalendarTests"),
    )?;
    Ok(())
}

#[test]
fn test_tags_survive_suite_renamed_after_decorating() {
    let dir = project();
    take_events();
    let mut catalog = Catalog::new().entry("lib/__tests/calendar.rs", register_renamed_last);

    let report = trellis::main(dir.path(), &mut catalog, |t| !t.tags().contains("skip")).unwrap();

    assert!(!take_events().iter().any(|e| e == "body:test_slow_scan"));
    let calendar: Vec<_> = report
        .tests
        .iter()
        .filter(|t| t.suite_name() == "CalendarTests")
        .map(|t| t.test_name())
        .collect();
    assert_eq!(calendar, vec!["test_leap_year"]);
}

#[test]
fn test_failures_are_reported_not_raised() {
    let dir = project();
    let report = trellis::main(dir.path(), &mut catalog(), |_| true).unwrap();

    let broken = report
        .tests
        .iter()
        .find(|t| t.test_name() == "test_broken")
        .unwrap();
    assert_eq!(broken.failure().unwrap().message(), "month out of range");
    assert!(broken.duration().is_some());

    let leap = report
        .tests
        .iter()
        .find(|t| t.test_name() == "test_leap_year")
        .unwrap();
    assert!(leap.passed());

    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());
}

#[test]
fn test_hook_failure_is_isolated_to_its_suite() {
    let dir = project();
    let report = trellis::main(dir.path(), &mut catalog(), |_| true).unwrap();

    assert_eq!(report.suite_errors.len(), 1);
    match &report.suite_errors[0] {
        SuiteError::Hook { suite, hook, failure } => {
            assert_eq!(suite, "PathsTests");
            assert_eq!(*hook, Hook::Initialize);
            assert_eq!(failure.message(), "scratch directory unavailable");
        }
        other => panic!("unexpected suite error: {other}"),
    }
    assert!(!report.tests.iter().any(|t| t.suite_name() == "PathsTests"));
    assert!(report.tests.iter().any(|t| t.suite_name() == "A_StringsTests"));
}

#[test]
fn test_import_failures_do_not_stop_discovery() {
    let dir = project();
    touch(&dir.path().join("lib/rng.rs"));
    touch(&dir.path().join("lib/__tests/rng.rs"));
    touch(&dir.path().join("lib/fernet.rs"));
    touch(&dir.path().join("lib/__tests/fernet.rs"));

    let mut catalog = catalog().entry("lib/__tests/rng.rs", register_syntax_error);
    let report = trellis::main(dir.path(), &mut catalog, |_| true).unwrap();

    assert_eq!(report.discovery_errors.len(), 2);
    assert_eq!(
        report.discovery_errors[&dir.path().join("lib/__tests/rng.rs")],
        DiscoveryError::Panicked {
            message: "unexpected token".into()
        }
    );
    assert!(matches!(
        report.discovery_errors[&dir.path().join("lib/__tests/fernet.rs")],
        DiscoveryError::NotLinked(_)
    ));
    assert!(report.tests.iter().any(|t| t.suite_name() == "CalendarTests"));
}

// ============================================================================
// Definition errors
// ============================================================================

fn register_sloppy(registrar: &mut Registrar<'_>) -> Result<(), DefinitionError> {
    // Swallowing the error must not hide it.
    let _ = registrar.define(
        SuiteBuilder::<Strings>::new()
            .named("SloppyTests")
            .test("check_something", |_| Ok(())),
    );
    Ok(())
}

#[test]
fn test_definition_error_is_fatal() {
    let dir = project();
    let mut catalog = catalog().entry("lib/__tests/strings.rs", register_sloppy);

    let err = trellis::main(dir.path(), &mut catalog, |_| true).unwrap_err();

    assert_eq!(
        err,
        DefinitionError::InvalidTestName {
            suite: "SloppyTests".into(),
            test: "check_something".into(),
        }
    );
}

#[test]
fn test_suite_outside_test_dir_is_rejected() {
    let dir = project();
    let mut registry = Registry::default();
    let err = registry
        .define(
            dir.path().join("lib/calendar.rs"),
            SuiteBuilder::<Calendar>::new().test("test_x", |_| Ok(())),
        )
        .unwrap_err();
    assert!(matches!(err, DefinitionError::InvalidLocation { .. }));
}

// ============================================================================
// Sessions and custom importers
// ============================================================================

#[test]
fn test_preregistered_suites_run_without_discovery() {
    let dir = project();
    let mut session = Session::new().with_seed(Some(3));
    session
        .registry_mut()
        .define(
            dir.path().join("lib/__tests/paths.rs"),
            SuiteBuilder::<Strings>::new()
                .named("Static")
                .test("test_static", |_| Ok(())),
        )
        .unwrap();

    let empty = TempDir::new().unwrap();
    let report = session.main(empty.path(), &mut Catalog::new(), |_| true).unwrap();

    assert_eq!(names(&report.tests), vec![("Static".into(), "test_static".into())]);
    assert!(report.is_success());
}

struct Recording {
    seen: Vec<PathBuf>,
}

impl trellis::Importer for Recording {
    fn import(&mut self, file: &TestFile, _: &mut Registrar<'_>) -> Result<(), DiscoveryError> {
        self.seen.push(file.relative.clone());
        Err(DiscoveryError::failed("not a real module"))
    }
}

#[test]
fn test_custom_importer_sees_every_valid_file() {
    let dir = project();
    touch(&dir.path().join("lib/__tests/ghost.rs"));
    let mut importer = Recording { seen: Vec::new() };

    let report = trellis::main(dir.path(), &mut importer, |_| true).unwrap();

    assert_eq!(
        importer.seen,
        vec![
            PathBuf::from("lib/__tests/calendar.rs"),
            PathBuf::from("lib/__tests/paths.rs"),
            PathBuf::from("lib/__tests/strings.rs"),
        ]
    );
    assert_eq!(report.discovery_errors.len(), 3);
    assert!(report.tests.is_empty());
}
