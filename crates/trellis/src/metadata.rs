//! Test metadata - tags and subjects attached through decorators
//!
//! Decorators never touch the test closure. They produce immutable records
//! that the suite builder files in a [`MetadataTable`] keyed by
//! [`TestKey`], and the collector reads them back from there.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Stable identifier of a declared test
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TestKey {
    pub suite: String,
    pub test: String,
}

impl TestKey {
    pub fn new(suite: impl Into<String>, test: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            test: test.into(),
        }
    }
}

impl fmt::Display for TestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.suite, self.test)
    }
}

/// Free-form labels used to select tests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(BTreeSet<String>);

impl Tags {
    pub fn contains(&self, label: &str) -> bool {
        self.0.contains(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Identity token for a production symbol a test claims to exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subject(&'static str);

impl Subject {
    /// Token for a function item or value, by its fully qualified type name.
    ///
    /// For a function item such as `Subject::of(&convention::Layout::test_file)`
    /// the type name is the function's path, which is stable across runs.
    pub fn of<T: ?Sized>(_symbol: &T) -> Self {
        Self(std::any::type_name::<T>())
    }

    /// Token for a type
    pub fn of_type<T: ?Sized>() -> Self {
        Self(std::any::type_name::<T>())
    }

    /// Token for anything without a usable type name (constants, statics)
    pub fn named(path: &'static str) -> Self {
        Self(path)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Production symbols exercised by a test
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subjects(BTreeSet<Subject>);

impl Subjects {
    pub fn contains(&self, subject: &Subject) -> bool {
        self.0.contains(subject)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.0.iter()
    }
}

/// Build a tag decorator
pub fn tag<I, T>(labels: I) -> Tags
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    Tags(labels.into_iter().map(Into::into).collect())
}

/// Build a subjects decorator
pub fn subjects<I>(tokens: I) -> Subjects
where
    I: IntoIterator<Item = Subject>,
{
    Subjects(tokens.into_iter().collect())
}

/// Side table of decorator records
#[derive(Debug, Clone, Default)]
pub struct MetadataTable {
    tags: HashMap<TestKey, Tags>,
    subjects: HashMap<TestKey, Subjects>,
}

impl MetadataTable {
    pub fn tags(&self, key: &TestKey) -> Tags {
        self.tags.get(key).cloned().unwrap_or_default()
    }

    pub fn subjects(&self, key: &TestKey) -> Subjects {
        self.subjects.get(key).cloned().unwrap_or_default()
    }

    /// Move every record filed under suite `from` to suite `to`
    pub(crate) fn rename_suite(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        self.tags = rekey(std::mem::take(&mut self.tags), from, to);
        self.subjects = rekey(std::mem::take(&mut self.subjects), from, to);
    }
}

fn rekey<V>(records: HashMap<TestKey, V>, from: &str, to: &str) -> HashMap<TestKey, V> {
    records
        .into_iter()
        .map(|(mut key, value)| {
            if key.suite == from {
                key.suite = to.to_string();
            }
            (key, value)
        })
        .collect()
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Tags {}
    impl Sealed for super::Subjects {}
}

/// A record that can be attached to a declared test.
///
/// The set of decorators is closed: [`Tags`] and [`Subjects`] are the only
/// implementors, built with [`tag`] and [`subjects`].
///
/// ```compile_fail
/// use trellis::metadata::{Decorator, MetadataTable, TestKey};
///
/// struct Owner(&'static str);
///
/// impl Decorator for Owner {
///     fn attach(self, _key: TestKey, _table: &mut MetadataTable) {}
/// }
/// ```
pub trait Decorator: sealed::Sealed {
    /// File the record under `key`, replacing an earlier record of the same kind
    fn attach(self, key: TestKey, table: &mut MetadataTable);
}

impl Decorator for Tags {
    fn attach(self, key: TestKey, table: &mut MetadataTable) {
        table.tags.insert(key, self);
    }
}

impl Decorator for Subjects {
    fn attach(self, key: TestKey, table: &mut MetadataTable) {
        table.subjects.insert(key, self);
    }
}
