//! Aggregator - discover, import, collect, filter, run and sort

use crate::collector::{collect, Test};
use crate::discovery::{discover, DiscoveryError, Importer};
use crate::registry::{DefinitionError, Registrar, Registry};
use crate::runner::{SuiteError, TestRunner};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything a reporting tool needs after a session
#[derive(Debug, Default)]
pub struct Report {
    /// Every selected test, sorted by module path, suite name, test name
    pub tests: Vec<Test>,
    /// Test files that failed to import
    pub discovery_errors: BTreeMap<PathBuf, DiscoveryError>,
    /// Suites whose class-level hooks failed
    pub suite_errors: Vec<SuiteError>,
}

impl Report {
    pub fn passed(&self) -> usize {
        self.tests.iter().filter(|t| t.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.tests.len() - self.passed()
    }

    /// No failed test, no discovery error, no suite error
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.discovery_errors.is_empty() && self.suite_errors.is_empty()
    }
}

/// A registry plus a runner configuration
#[derive(Default)]
pub struct Session {
    registry: Registry,
    runner: TestRunner,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing registry (its layout drives discovery)
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.runner = self.runner.with_seed(seed);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register suites up front, without discovery
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Import every test file under `root`, then run every registered suite.
    ///
    /// Tests rejected by `condition` never run. Import failures and hook
    /// failures end up in the report; only a [`DefinitionError`] aborts.
    pub fn main<I, F>(
        &mut self,
        root: &Path,
        importer: &mut I,
        mut condition: F,
    ) -> Result<Report, DefinitionError>
    where
        I: Importer + ?Sized,
        F: FnMut(&Test) -> bool,
    {
        let mut report = Report::default();

        for file in discover(root, self.registry.layout()) {
            let mut registrar = Registrar::new(&mut self.registry, &file.path);
            let imported = importer.import(&file, &mut registrar);

            if let Some(fatal) = registrar.into_fatal() {
                return Err(fatal);
            }
            if let Err(e) = imported {
                warn!(path = %file.path.display(), error = %e, "failed to import test file");
                report.discovery_errors.insert(file.path, e);
            }
        }

        info!(
            suites = self.registry.len(),
            discovery_errors = report.discovery_errors.len(),
            "discovery finished"
        );

        for suite in self.registry.suites() {
            let mut tests: Vec<Test> = collect(suite)
                .into_iter()
                .filter(|t| condition(t))
                .collect();
            debug!(
                suite = suite.name(),
                selected = tests.len(),
                declared = suite.len(),
                "collected tests"
            );

            match self.runner.run(suite, &mut tests) {
                Ok(()) => report.tests.extend(tests),
                Err(e) => {
                    warn!(error = %e, "suite failed");
                    if e.tests_ran() {
                        report.tests.extend(tests);
                    }
                    report.suite_errors.push(e);
                }
            }
        }

        report.tests.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(report)
    }
}

/// Run a fresh default session over `root`
pub fn main<I, F>(root: &Path, importer: &mut I, condition: F) -> Result<Report, DefinitionError>
where
    I: Importer + ?Sized,
    F: FnMut(&Test) -> bool,
{
    Session::new().main(root, importer, condition)
}
