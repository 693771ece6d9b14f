//! Audit - source modules without a test file

use crate::convention::Layout;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A module whose expected test file does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTestFile {
    /// Source file, relative to the audited root
    pub module: PathBuf,
    /// Where its test file should be, relative to the audited root
    pub expected: PathBuf,
}

/// List every source file under `root` whose test file is missing
pub fn missing_test_files(root: &Path, layout: &Layout) -> Vec<MissingTestFile> {
    let mut missing = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry, layout));

    for entry in walker.filter_map(Result::ok) {
        let path = entry.path();
        if !entry.file_type().is_file() || !layout.has_extension(path) {
            continue;
        }

        let expected = layout.test_file(path);
        if !expected.exists() {
            missing.push(MissingTestFile {
                module: relative(root, path),
                expected: relative(root, &expected),
            });
        }
    }

    missing
}

fn is_skipped_dir(entry: &DirEntry, layout: &Layout) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && name == layout.test_dir.as_str())
}

fn relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root).unwrap_or(path).to_path_buf()
}
