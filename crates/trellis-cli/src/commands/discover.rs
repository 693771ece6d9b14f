//! Discover command - list test files under a root

use crate::config::Config;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};
use trellis::Scan;

/// Arguments for the discover command
#[derive(Debug, Clone)]
pub struct DiscoverArgs {
    pub root: PathBuf,
    pub no_color: bool,
    pub json: bool,
}

/// Print valid test files, then files in test directories that fail validation
pub fn run(args: DiscoverArgs) -> Result<Scan> {
    let root = fs::canonicalize(&args.root)
        .with_context(|| format!("root {} does not exist", args.root.display()))?;
    let config = Config::load(&root)?;
    if args.no_color || config.no_color {
        colored::control::set_override(false);
    }

    let scan = trellis::scan(&root, &config.layout);

    if args.json {
        let invalid: Vec<_> = scan.invalid.iter().map(|p| relative(&root, p)).collect();
        println!(
            "{}",
            serde_json::json!({
                "valid": scan.valid.iter().map(|f| f.relative.display().to_string()).collect::<Vec<_>>(),
                "invalid": invalid,
            })
        );
    } else {
        print_scan(&scan, &root);
    }

    if args.no_color || config.no_color {
        colored::control::unset_override();
    }
    Ok(scan)
}

fn print_scan(scan: &Scan, root: &Path) {
    if scan.valid.is_empty() {
        println!("{}", "No test files found.".yellow());
    } else {
        println!(
            "Found {} test file{}",
            scan.valid.len().to_string().bold(),
            if scan.valid.len() == 1 { "" } else { "s" }
        );
        for file in &scan.valid {
            println!("  {} {}", "●".green(), file.relative.display());
        }
    }

    if !scan.invalid.is_empty() {
        println!();
        println!("{}", "Not matching any module:".yellow().bold());
        for path in &scan.invalid {
            println!("  {} {}", "●".yellow(), relative(root, path));
        }
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
