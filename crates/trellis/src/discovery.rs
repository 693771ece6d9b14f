//! Test discovery - find test files under a root and import them

use crate::convention::Layout;
use crate::failure::contain;
use crate::registry::{DefinitionError, Registrar};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// A discovered, valid test file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestFile {
    /// Path as found under the root
    pub path: PathBuf,
    /// Path relative to the root, used as the catalog key
    pub relative: PathBuf,
}

/// A test file that could not be imported
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("no suites are linked for {0}")]
    NotLinked(PathBuf),

    #[error("registration panicked: {message}")]
    Panicked { message: String },

    #[error("import failed: {message}")]
    Failed { message: String },
}

impl DiscoveryError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Files found in test directories under a root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// Files satisfying [`Layout::is_test_file`], in path order
    pub valid: Vec<TestFile>,
    /// Source files inside a test directory that fail validation
    pub invalid: Vec<PathBuf>,
}

/// Walk `root` and sort test-directory files into valid and invalid ones
pub fn scan(root: &Path, layout: &Layout) -> Scan {
    let mut scan = Scan::default();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !layout.in_test_dir(path) {
            continue;
        }

        if layout.is_test_file(path) {
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            debug!(path = %path.display(), "discovered test file");
            scan.valid.push(TestFile {
                path: path.to_path_buf(),
                relative,
            });
        } else if layout.has_extension(path) {
            debug!(path = %path.display(), "skipping invalid test file");
            scan.invalid.push(path.to_path_buf());
        }
    }

    scan
}

/// Find every valid test file under `root`, in path order
pub fn discover(root: &Path, layout: &Layout) -> Vec<TestFile> {
    scan(root, layout).valid
}

/// Turns a discovered test file into registered suites.
///
/// Implementations register through the [`Registrar`], which carries the
/// file's path; definition errors raised there are fatal regardless of what
/// `import` returns.
pub trait Importer {
    fn import(&mut self, file: &TestFile, registrar: &mut Registrar<'_>)
        -> Result<(), DiscoveryError>;
}

/// Registration function compiled for one test file
pub type RegisterFn = fn(&mut Registrar<'_>) -> Result<(), DefinitionError>;

/// Static table of registration functions keyed by root-relative path.
///
/// This is how test files are "imported": each file on disk has a
/// registration function linked into the harness binary.
///
/// ```
/// use trellis::{Catalog, Registrar, DefinitionError};
///
/// fn register_calendar(_registrar: &mut Registrar<'_>) -> Result<(), DefinitionError> {
///     Ok(())
/// }
///
/// let catalog = Catalog::new().entry("src/__tests/calendar.rs", register_calendar);
/// assert_eq!(catalog.len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<PathBuf, RegisterFn>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Link `register` to the test file at `relative`
    pub fn entry(mut self, relative: impl AsRef<Path>, register: RegisterFn) -> Self {
        self.entries.insert(normalize(relative.as_ref()), register);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }
}

impl Importer for Catalog {
    fn import(
        &mut self,
        file: &TestFile,
        registrar: &mut Registrar<'_>,
    ) -> Result<(), DiscoveryError> {
        let register = self
            .entries
            .get(&normalize(&file.relative))
            .ok_or_else(|| DiscoveryError::NotLinked(file.relative.clone()))?;

        // Definition errors are latched by the registrar.
        contain(|| {
            let _ = register(registrar);
            Ok(())
        })
        .map_err(|failure| DiscoveryError::Panicked {
            message: failure.message().to_string(),
        })
    }
}

/// Compare catalog keys by components so `a/b` and `a\b` style inputs agree
fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::suite::{Suite, SuiteBuilder};
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    struct Noop;

    impl Suite for Noop {
        fn new_shared_instance() -> Self {
            Noop
        }
    }

    fn register_noop(registrar: &mut Registrar<'_>) -> Result<(), DefinitionError> {
        registrar.define(
            SuiteBuilder::<Noop>::new()
                .named("NoopTests")
                .test("test_nothing", |_| Ok(())),
        )?;
        Ok(())
    }

    fn register_panics(_: &mut Registrar<'_>) -> Result<(), DefinitionError> {
        panic!("syntax error in test file")
    }

    #[test]
    fn test_discover_finds_valid_files_only() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("src/calc.rs"));
        touch(&root.join("src/__tests/calc.rs"));
        touch(&root.join("src/paths/mod.rs"));
        touch(&root.join("src/__tests/paths.rs"));
        touch(&root.join("src/__tests/orphan.rs"));
        touch(&root.join("src/__tests/notes.txt"));
        touch(&root.join("src/helpers.rs"));

        let files = discover(root, &Layout::default());
        let relative: Vec<_> = files.iter().map(|f| f.relative.clone()).collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("src/__tests/calc.rs"),
                PathBuf::from("src/__tests/paths.rs"),
            ]
        );
    }

    #[test]
    fn test_scan_reports_invalid_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("src/calc.rs"));
        touch(&root.join("src/__tests/calc.rs"));
        touch(&root.join("src/__tests/orphan.rs"));
        touch(&root.join("src/__tests/notes.txt"));

        let scan = scan(root, &Layout::default());
        assert_eq!(scan.valid.len(), 1);
        assert_eq!(scan.invalid, vec![root.join("src/__tests/orphan.rs")]);
    }

    #[test]
    fn test_discover_empty_root() {
        let dir = tempdir().unwrap();
        assert!(discover(dir.path(), &Layout::default()).is_empty());
    }

    #[test]
    fn test_catalog_import_registers_suites() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("calc.rs"));
        touch(&root.join("__tests/calc.rs"));

        let mut catalog = Catalog::new().entry("__tests/calc.rs", register_noop);
        let mut registry = Registry::default();
        let file = discover(root, registry.layout()).remove(0);

        let mut registrar = Registrar::new(&mut registry, &file.path);
        catalog.import(&file, &mut registrar).unwrap();
        assert!(registrar.into_fatal().is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.suites()[0].home_path(), file.path.as_path());
    }

    #[test]
    fn test_catalog_reports_unlinked_and_panicking_files() {
        let mut catalog = Catalog::new().entry("__tests/bad.rs", register_panics);
        let mut registry = Registry::default();
        let home = PathBuf::from("/nowhere/__tests/bad.rs");

        let missing = TestFile {
            path: PathBuf::from("/nowhere/__tests/other.rs"),
            relative: PathBuf::from("__tests/other.rs"),
        };
        let mut registrar = Registrar::new(&mut registry, &home);
        assert_eq!(
            catalog.import(&missing, &mut registrar),
            Err(DiscoveryError::NotLinked(PathBuf::from("__tests/other.rs")))
        );

        let bad = TestFile {
            path: home.clone(),
            relative: PathBuf::from("__tests/bad.rs"),
        };
        let err = catalog.import(&bad, &mut registrar).unwrap_err();
        assert_eq!(
            err,
            DiscoveryError::Panicked {
                message: "syntax error in test file".into()
            }
        );
    }

    #[test]
    fn test_normalize_ignores_redundant_separators() {
        assert_eq!(
            normalize(Path::new("src//__tests/./calc.rs")),
            PathBuf::from("src/__tests/calc.rs")
        );
    }
}
