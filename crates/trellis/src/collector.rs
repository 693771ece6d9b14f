//! Test collection - fresh `Test` records for a suite's declared tests

use crate::failure::Failure;
use crate::metadata::{Subjects, Tags, TestKey};
use crate::registry::SuiteDescriptor;
use crate::suite::Body;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// One test of a suite, with its metadata and its result once run
#[derive(Clone)]
pub struct Test {
    suite: SuiteDescriptor,
    name: String,
    pub(crate) body: Body,
    tags: Tags,
    subjects: Subjects,
    pub(crate) duration: Option<Duration>,
    pub(crate) failure: Option<Failure>,
}

impl Test {
    pub fn suite(&self) -> &SuiteDescriptor {
        &self.suite
    }

    pub fn suite_name(&self) -> &str {
        self.suite.name()
    }

    pub fn test_name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> TestKey {
        TestKey::new(self.suite.name(), self.name.as_str())
    }

    pub fn module_path(&self) -> &Path {
        self.suite.module_path()
    }

    pub fn home_path(&self) -> &Path {
        self.suite.home_path()
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn subjects(&self) -> &Subjects {
        &self.subjects
    }

    /// Time spent in the body; `None` until the body has run
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Failure raised by the body or its hooks, if any
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Whether the test ran and raised nothing
    pub fn passed(&self) -> bool {
        self.duration.is_some() && self.failure.is_none()
    }

    /// Report ordering key: module path, then suite name, then test name
    pub fn sort_key(&self) -> (&Path, &str, &str) {
        (self.module_path(), self.suite_name(), self.test_name())
    }
}

impl fmt::Debug for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Test")
            .field("suite", &self.suite.name())
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("subjects", &self.subjects)
            .field("duration", &self.duration)
            .field("failure", &self.failure)
            .finish()
    }
}

/// Build fresh records for every declared test, in declaration order.
///
/// No test code runs here.
pub fn collect(suite: &SuiteDescriptor) -> Vec<Test> {
    suite
        .data
        .tests
        .iter()
        .map(|declared| {
            let key = TestKey::new(suite.name(), declared.name.as_str());
            Test {
                suite: suite.clone(),
                name: declared.name.clone(),
                body: declared.body.clone(),
                tags: suite.data.metadata.tags(&key),
                subjects: suite.data.metadata.subjects(&key),
                duration: None,
                failure: None,
            }
        })
        .collect()
}
