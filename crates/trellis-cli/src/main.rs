use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use trellis_cli::commands;

/// Trellis test layout tools.
///
/// Tests live in `__tests` directories next to the modules they verify.
/// These commands inspect a tree without running anything; tests run from
/// a project's own harness binary built on `trellis_cli::harness`.
///
/// EXAMPLES:
///     trellis discover               List test files under "."
///     trellis missing src/           Modules under src/ without tests
///
/// ENVIRONMENT VARIABLES:
///     NO_COLOR          Set to disable colored output
///     RUST_LOG          Diagnostic tracing filter (default: warn)
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List valid test files and test-directory files matching no module
    ///
    /// EXAMPLES:
    ///     trellis discover            Scan the current directory
    ///     trellis discover lib --json Output as JSON
    #[command(visible_alias = "d")]
    Discover {
        /// Root to scan
        #[arg(default_value = ".")]
        root: PathBuf,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List modules whose test file does not exist
    ///
    /// Exits with code 1 when anything is missing.
    ///
    /// EXAMPLES:
    ///     trellis missing             Audit the current directory
    ///     trellis missing lib --json  Output as JSON
    #[command(visible_alias = "m")]
    Missing {
        /// Root to audit
        #[arg(default_value = ".")]
        root: PathBuf,
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    trellis_cli::logging::init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            commands::test::print_error(&e);
            ExitCode::from(trellis_cli::USAGE_ERROR)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Discover {
            root,
            no_color,
            json,
        } => {
            let args = commands::discover::DiscoverArgs {
                root,
                no_color,
                json,
            };
            commands::discover::run(args)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Missing {
            root,
            no_color,
            json,
        } => {
            let args = commands::missing::MissingArgs {
                root,
                no_color,
                json,
            };
            let missing = commands::missing::run(args)?;
            if missing.is_empty() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
