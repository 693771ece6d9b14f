//! Trellis harness and reporting
//!
//! A project links its test files into a [`Catalog`] and hands it to
//! [`harness`] from its own `main`:
//!
//! ```no_run
//! use std::process::ExitCode;
//! use trellis::{Catalog, DefinitionError, Registrar};
//!
//! fn register_clock(_registrar: &mut Registrar<'_>) -> Result<(), DefinitionError> {
//!     Ok(())
//! }
//!
//! fn main() -> ExitCode {
//!     trellis_cli::harness(Catalog::new().entry("src/__tests/clock.rs", register_clock))
//! }
//! ```
//!
//! The harness accepts `--root`, `--seed`, `--tag`, `--skip-tag`, `--filter`,
//! `--verbose`, `--no-color` and `--json`, reads `trellis.toml` from the root
//! and exits 0 only when the whole report is green.

pub mod commands;
pub mod config;
pub mod logging;
pub mod reporter;

use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use trellis::{Catalog, Importer};

/// Exit code for bad arguments, configuration or suite definitions
pub const USAGE_ERROR: u8 = 2;

/// Run every linked test suite under a root.
///
/// EXAMPLES:
///     my-harness                        Run everything under "."
///     my-harness --skip-tag slow        Leave out slow tests
///     my-harness --seed 7 --json        Reproducible order, JSON report
///
/// ENVIRONMENT VARIABLES:
///     TRELLIS_SEED        Default shuffle seed
///     TRELLIS_SKIP_TAGS   Comma-separated tags to skip
///     NO_COLOR            Set to disable colored output
///     RUST_LOG            Diagnostic tracing filter (default: warn)
#[derive(Parser, Debug)]
#[command(version)]
pub struct HarnessCli {
    /// Root searched for test directories
    #[arg(long, default_value = ".")]
    pub root: PathBuf,
    /// Shuffle seed for a reproducible order
    #[arg(long)]
    pub seed: Option<u64>,
    /// Only run tests with this tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Skip tests with this tag (repeatable)
    #[arg(long = "skip-tag", value_name = "TAG")]
    pub skip_tags: Vec<String>,
    /// Only run tests whose `suite::test` name contains this pattern
    #[arg(long)]
    pub filter: Option<String>,
    /// List passed tests too
    #[arg(long, short = 'v')]
    pub verbose: bool,
    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

impl From<HarnessCli> for commands::test::TestArgs {
    fn from(cli: HarnessCli) -> Self {
        Self {
            root: cli.root,
            seed: cli.seed,
            tags: cli.tags,
            skip_tags: cli.skip_tags,
            filter: cli.filter,
            verbose: cli.verbose,
            no_color: cli.no_color,
            json: cli.json,
        }
    }
}

/// Harness entry point reading the process arguments
pub fn harness(mut catalog: Catalog) -> ExitCode {
    harness_from(std::env::args_os(), &mut catalog)
}

/// Harness entry point with explicit arguments (the first is the program name)
pub fn harness_from<A, T, I>(args: A, importer: &mut I) -> ExitCode
where
    A: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
    I: Importer + ?Sized,
{
    logging::init();

    let cli = match HarnessCli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(USAGE_ERROR)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match commands::test::run(cli.into(), importer) {
        Ok(report) => commands::test::exit_code(&report),
        Err(e) => {
            commands::test::print_error(&e);
            ExitCode::from(USAGE_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harness_cli_parses_flags() {
        let cli = HarnessCli::try_parse_from([
            "harness", "--root", "lib", "--seed", "3", "--tag", "fast", "--skip-tag", "slow",
            "--skip-tag", "network", "--filter", "Clock", "-v", "--json",
        ])
        .unwrap();

        assert_eq!(cli.root, PathBuf::from("lib"));
        assert_eq!(cli.seed, Some(3));
        assert_eq!(cli.tags, vec!["fast"]);
        assert_eq!(cli.skip_tags, vec!["slow", "network"]);
        assert_eq!(cli.filter.as_deref(), Some("Clock"));
        assert!(cli.verbose);
        assert!(cli.json);
        assert!(!cli.no_color);
    }

    #[test]
    fn test_harness_cli_defaults() {
        let cli = HarnessCli::try_parse_from(["harness"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("."));
        assert!(cli.seed.is_none());
        assert!(cli.tags.is_empty());
    }

    #[test]
    fn test_harness_cli_rejects_bad_seed() {
        assert!(HarnessCli::try_parse_from(["harness", "--seed", "soon"]).is_err());
    }
}
