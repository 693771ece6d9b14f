//! Missing command - modules without a test file

use crate::config::Config;
use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::PathBuf;
use trellis::MissingTestFile;

/// Arguments for the missing command
#[derive(Debug, Clone)]
pub struct MissingArgs {
    pub root: PathBuf,
    pub no_color: bool,
    pub json: bool,
}

/// Print the module / expected test file table
pub fn run(args: MissingArgs) -> Result<Vec<MissingTestFile>> {
    let root = fs::canonicalize(&args.root)
        .with_context(|| format!("root {} does not exist", args.root.display()))?;
    let config = Config::load(&root)?;
    if args.no_color || config.no_color {
        colored::control::set_override(false);
    }

    let missing = trellis::missing_test_files(&root, &config.layout);

    if args.json {
        let rows: Vec<_> = missing
            .iter()
            .map(|m| {
                serde_json::json!({
                    "module": m.module.display().to_string(),
                    "expected": m.expected.display().to_string(),
                })
            })
            .collect();
        println!("{}", serde_json::json!({ "missing": rows }));
    } else if missing.is_empty() {
        println!("{}", "Every module has a test file.".green());
    } else {
        print_table(&missing);
    }

    if args.no_color || config.no_color {
        colored::control::unset_override();
    }
    Ok(missing)
}

fn print_table(missing: &[MissingTestFile]) {
    let rows: Vec<(String, String)> = missing
        .iter()
        .map(|m| (m.module.display().to_string(), m.expected.display().to_string()))
        .collect();
    let width = rows
        .iter()
        .map(|(module, _)| module.len())
        .max()
        .unwrap_or(0)
        .max("MODULE".len());

    println!("{:<width$}      {}", "MODULE".bold(), "MISSING TEST FILE".bold());
    for (module, expected) in rows {
        println!("{module:<width$}      {}", expected.red());
    }
}
