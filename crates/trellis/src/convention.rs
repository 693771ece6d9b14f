//! Path convention - map modules to their `__tests` files and back
//!
//! A module `pkg/name.rs` is verified by `pkg/__tests/name.rs`. A package
//! `pkg/sub/mod.rs` is verified by `pkg/sub/__tests/sub.rs`, named after the
//! package directory rather than its entry file.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Name of the directory that holds test files
pub const TEST_DIRECTORY_NAME: &str = "__tests";

/// Prefix every declared test name must carry
pub const TEST_PREFIX: &str = "test_";

/// File naming rules used by discovery, registration and the audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Directory name holding test files (e.g., "__tests")
    pub test_dir: String,
    /// Source file extension without the dot (e.g., "rs")
    pub extension: String,
    /// File stem of a package entry file (e.g., "mod" for `mod.rs`)
    pub package_stem: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self::new(TEST_DIRECTORY_NAME, "rs", "mod")
    }
}

impl Layout {
    pub fn new(
        test_dir: impl Into<String>,
        extension: impl Into<String>,
        package_stem: impl Into<String>,
    ) -> Self {
        Self {
            test_dir: test_dir.into(),
            extension: extension.into(),
            package_stem: package_stem.into(),
        }
    }

    /// Layout for trees that use `__init__.py` package files
    pub fn python() -> Self {
        Self::new(TEST_DIRECTORY_NAME, "py", "__init__")
    }

    /// File name of a package entry file (e.g., `mod.rs`)
    pub fn package_file_name(&self) -> String {
        format!("{}.{}", self.package_stem, self.extension)
    }

    /// Whether `path` carries the source extension
    pub fn has_extension(&self, path: &Path) -> bool {
        path.extension() == Some(OsStr::new(&self.extension))
    }

    /// Whether `path` is a package entry file
    pub fn is_package_file(&self, path: &Path) -> bool {
        path.file_name() == Some(OsStr::new(&self.package_file_name()))
    }

    /// Whether `path` lives directly inside a test directory
    pub fn in_test_dir(&self, path: &Path) -> bool {
        path.parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == OsStr::new(&self.test_dir))
    }

    /// Check whether `path` is a legitimate test file.
    ///
    /// Exactly one of the sibling module file or the sibling package entry
    /// file must exist. Both or neither is ambiguous and rejected.
    pub fn is_test_file(&self, path: &Path) -> bool {
        self.module_path(path).is_some()
    }

    /// Derived module path of a test file, or `None` if it is not valid.
    ///
    /// Returns the module file when that candidate exists, otherwise the
    /// package directory.
    pub fn module_path(&self, path: &Path) -> Option<PathBuf> {
        if !path.is_file() || !self.has_extension(path) || !self.in_test_dir(path) {
            return None;
        }

        let (module, package) = self.candidates(path)?;
        let module_exists = module.exists();
        let package_exists = package.exists();

        match (module_exists, package_exists) {
            (true, false) => Some(module),
            (false, true) => package.parent().map(Path::to_path_buf),
            _ => None,
        }
    }

    /// Expected test file for a source module or package entry file
    pub fn test_file(&self, source: &Path) -> PathBuf {
        let dir = source.parent().unwrap_or_else(|| Path::new(""));

        let leaf = if self.is_package_file(source) {
            let package = dir.file_name().unwrap_or_default();
            let mut leaf = package.to_os_string();
            leaf.push(".");
            leaf.push(&self.extension);
            leaf
        } else {
            source.file_name().unwrap_or_default().to_os_string()
        };

        dir.join(&self.test_dir).join(leaf)
    }

    /// The two sibling candidates a test file may be verifying:
    /// `<dir>/<name>` and `<dir>/<stem>/<package file>`.
    fn candidates(&self, path: &Path) -> Option<(PathBuf, PathBuf)> {
        let name = path.file_name()?;
        let stem = path.file_stem()?;
        let dir = path.parent()?.parent()?;

        let module = dir.join(name);
        let package = dir.join(stem).join(self.package_file_name());
        Some((module, package))
    }
}
