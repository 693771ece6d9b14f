//! Trellis test engine
//!
//! Discovers test files kept in `__tests` directories next to the modules
//! they verify, registers the suites they declare, and runs every suite with
//! lifecycle hooks, a shuffled order and per-test failure containment.
//!
//! # Pipeline
//!
//! 1. [`discover`] walks a root for files satisfying [`Layout::is_test_file`]
//! 2. An [`Importer`] (usually a [`Catalog`]) registers each file's suites
//!    into the [`Registry`], with the file path passed explicitly
//! 3. [`collect`] builds fresh [`Test`] records per suite
//! 4. [`TestRunner`] shuffles and runs them against one shared instance
//! 5. [`main`] returns a [`Report`] sorted by module, suite and test name
//!
//! # Example
//!
//! ```no_run
//! use trellis::{Catalog, DefinitionError, Registrar, Suite, SuiteBuilder, TestResult, asserts, tag};
//! use std::path::Path;
//!
//! struct Arithmetic;
//!
//! impl Suite for Arithmetic {
//!     fn new_shared_instance() -> Self {
//!         Arithmetic
//!     }
//! }
//!
//! fn register(registrar: &mut Registrar<'_>) -> Result<(), DefinitionError> {
//!     registrar.define(
//!         SuiteBuilder::<Arithmetic>::new()
//!             .test("test_add", |_| asserts::equal(&(2 + 2), &4))
//!             .test("test_big", |_| asserts::is_true(u64::MAX > 0))
//!             .with(tag(["slow"])),
//!     )?;
//!     Ok(())
//! }
//!
//! let mut catalog = Catalog::new().entry("src/__tests/arith.rs", register);
//! let report = trellis::main(Path::new("."), &mut catalog, |t| !t.tags().contains("slow")).unwrap();
//! assert!(report.is_success());
//! ```

pub mod aggregator;
pub mod asserts;
pub mod audit;
pub mod collector;
pub mod convention;
pub mod discovery;
pub mod failure;
pub mod metadata;
pub mod registry;
pub mod runner;
pub mod suite;

pub use aggregator::{main, Report, Session};
pub use audit::{missing_test_files, MissingTestFile};
pub use collector::{collect, Test};
pub use convention::{Layout, TEST_DIRECTORY_NAME, TEST_PREFIX};
pub use discovery::{discover, scan, Catalog, DiscoveryError, Importer, RegisterFn, Scan, TestFile};
pub use failure::{Failure, Phase, SourceLocation, TestResult};
pub use metadata::{subjects, tag, Decorator, Subject, Subjects, Tags, TestKey};
pub use registry::{DefinitionError, Registrar, Registry, SuiteDescriptor};
pub use runner::{Hook, SuiteError, TestRunner};
pub use suite::{Suite, SuiteBuilder};
