//! Engine tracing on stderr
//!
//! A harness run has two audiences. The console or JSON report is the
//! result and is the only thing written to stdout, so it can be piped or
//! parsed. Engine events (files discovered, suites registered, batches
//! started and finished, secondary hook failures) are tracing events and go
//! to stderr, gated by `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directive used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Filter from `RUST_LOG`, falling back to [`DEFAULT_DIRECTIVE`]
pub fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Route engine events to stderr.
///
/// Only the first call in a process installs a subscriber; later calls are
/// no-ops, so both the `trellis` binary and every harness can call it.
///
/// `RUST_LOG=trellis=debug my-harness` shows each test's outcome as it runs.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
