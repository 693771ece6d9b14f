//! Suite registry - every defined suite, validated against the layout

use crate::convention::{Layout, TEST_PREFIX};
use crate::metadata::MetadataTable;
use crate::suite::{Declared, Lifecycle, Suite, SuiteBuilder};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tracing::debug;

/// A suite declared in the wrong place or in a malformed way.
///
/// Definition errors are fatal: they abort discovery instead of being
/// collected as a per-file discovery error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("{suite} is not defined inside a valid test file: {path}")]
    InvalidLocation { suite: String, path: PathBuf },

    #[error("{suite}::{test} does not start with '{}'", TEST_PREFIX)]
    InvalidTestName { suite: String, test: String },

    #[error("{suite}::{test} is declared more than once")]
    DuplicateTest { suite: String, test: String },

    #[error("{suite} is already registered from {path}")]
    DuplicateSuite { suite: String, path: PathBuf },

    #[error("{suite} applies a decorator before declaring any test")]
    OrphanDecorator { suite: String },
}

impl DefinitionError {
    pub fn invalid_location(suite: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::InvalidLocation {
            suite: suite.into(),
            path: path.into(),
        }
    }

    /// Name of the offending suite
    pub fn suite(&self) -> &str {
        match self {
            Self::InvalidLocation { suite, .. }
            | Self::InvalidTestName { suite, .. }
            | Self::DuplicateTest { suite, .. }
            | Self::DuplicateSuite { suite, .. }
            | Self::OrphanDecorator { suite } => suite,
        }
    }
}

pub(crate) struct SuiteData {
    pub(crate) name: String,
    pub(crate) home_path: PathBuf,
    pub(crate) module_path: PathBuf,
    pub(crate) tests: Vec<Declared>,
    pub(crate) metadata: MetadataTable,
    pub(crate) lifecycle: Box<dyn Lifecycle>,
}

/// A registered suite. Cloning shares the same definition.
#[derive(Clone)]
pub struct SuiteDescriptor {
    pub(crate) data: Rc<SuiteData>,
}

impl SuiteDescriptor {
    /// Qualified suite name
    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// Test file that declared the suite
    pub fn home_path(&self) -> &Path {
        &self.data.home_path
    }

    /// Module (or package directory) the suite verifies
    pub fn module_path(&self) -> &Path {
        &self.data.module_path
    }

    /// Declared test names, in declaration order
    pub fn test_names(&self) -> impl Iterator<Item = &str> {
        self.data.tests.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.data.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.tests.is_empty()
    }

    /// Whether both handles refer to the same definition
    pub fn same(&self, other: &SuiteDescriptor) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    fn identifies(&self, name: &str, home_path: &Path) -> bool {
        self.data.name == name && self.data.home_path == home_path
    }
}

impl fmt::Debug for SuiteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteDescriptor")
            .field("name", &self.data.name)
            .field("home_path", &self.data.home_path)
            .field("module_path", &self.data.module_path)
            .field("tests", &self.test_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Collection of known suites, in registration order.
///
/// Not synchronized; a registry belongs to one thread.
#[derive(Default)]
pub struct Registry {
    layout: Layout,
    suites: Vec<SuiteDescriptor>,
}

impl Registry {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            suites: Vec::new(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Validate and record a suite declared in `home_path`
    pub fn define<S: Suite>(
        &mut self,
        home_path: impl Into<PathBuf>,
        builder: SuiteBuilder<S>,
    ) -> Result<SuiteDescriptor, DefinitionError> {
        let home_path = home_path.into();
        let parts = builder.into_parts();

        let module_path = self
            .layout
            .module_path(&home_path)
            .ok_or_else(|| DefinitionError::invalid_location(&parts.name, &home_path))?;

        if parts.orphan_decorator {
            return Err(DefinitionError::OrphanDecorator { suite: parts.name });
        }

        let mut seen = HashSet::new();
        for test in &parts.tests {
            if !test.name.starts_with(TEST_PREFIX) {
                return Err(DefinitionError::InvalidTestName {
                    suite: parts.name.clone(),
                    test: test.name.clone(),
                });
            }
            if !seen.insert(test.name.as_str()) {
                return Err(DefinitionError::DuplicateTest {
                    suite: parts.name.clone(),
                    test: test.name.clone(),
                });
            }
        }

        if self
            .suites
            .iter()
            .any(|s| s.identifies(&parts.name, &home_path))
        {
            return Err(DefinitionError::DuplicateSuite {
                suite: parts.name,
                path: home_path,
            });
        }

        debug!(
            suite = %parts.name,
            path = %home_path.display(),
            tests = parts.tests.len(),
            "registered suite"
        );

        let descriptor = SuiteDescriptor {
            data: Rc::new(SuiteData {
                name: parts.name,
                home_path,
                module_path,
                tests: parts.tests,
                metadata: parts.metadata,
                lifecycle: parts.lifecycle,
            }),
        };
        self.suites.push(descriptor.clone());
        Ok(descriptor)
    }

    /// Remove a suite; returns whether it was registered
    pub fn remove(&mut self, descriptor: &SuiteDescriptor) -> bool {
        let before = self.suites.len();
        self.suites.retain(|s| !s.same(descriptor));
        before != self.suites.len()
    }

    pub fn contains(&self, descriptor: &SuiteDescriptor) -> bool {
        self.suites.iter().any(|s| s.same(descriptor))
    }

    pub fn suites(&self) -> &[SuiteDescriptor] {
        &self.suites
    }

    pub fn len(&self) -> usize {
        self.suites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }
}

/// Registration handle for one discovered test file.
///
/// The home path is fixed by discovery. The first definition error is kept
/// even if the caller discards the returned `Result`.
pub struct Registrar<'a> {
    registry: &'a mut Registry,
    home_path: &'a Path,
    fatal: Option<DefinitionError>,
}

impl<'a> Registrar<'a> {
    pub fn new(registry: &'a mut Registry, home_path: &'a Path) -> Self {
        Self {
            registry,
            home_path,
            fatal: None,
        }
    }

    pub fn home_path(&self) -> &Path {
        self.home_path
    }

    pub fn define<S: Suite>(
        &mut self,
        builder: SuiteBuilder<S>,
    ) -> Result<SuiteDescriptor, DefinitionError> {
        let result = self.registry.define(self.home_path, builder);
        if let Err(e) = &result {
            self.fatal.get_or_insert_with(|| e.clone());
        }
        result
    }

    pub(crate) fn into_fatal(self) -> Option<DefinitionError> {
        self.fatal
    }
}
