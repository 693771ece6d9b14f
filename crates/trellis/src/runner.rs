//! Test runner - execute one suite's tests with hooks and a shuffled order

use crate::collector::Test;
use crate::failure::{contain, Failure, Phase};
use crate::registry::SuiteDescriptor;
use crate::suite::Instance;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::fmt;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Class-level hook of a suite
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// `Suite::new_shared_instance`
    Construct,
    /// `Suite::initialize`
    Initialize,
    /// `Suite::terminate`
    Terminate,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Construct => write!(f, "new_shared_instance"),
            Hook::Initialize => write!(f, "initialize"),
            Hook::Terminate => write!(f, "terminate"),
        }
    }
}

/// A failure that makes a whole suite run unusable
#[derive(Debug, Clone, Error)]
pub enum SuiteError {
    #[error("{suite}: {hook} failed: {failure}")]
    Hook {
        suite: String,
        hook: Hook,
        failure: Failure,
    },

    #[error("{suite}: test {test} belongs to suite {owner}")]
    ForeignTest {
        suite: String,
        test: String,
        owner: String,
    },
}

impl SuiteError {
    pub fn hook(suite: impl Into<String>, hook: Hook, failure: Failure) -> Self {
        Self::Hook {
            suite: suite.into(),
            hook,
            failure,
        }
    }

    pub fn suite(&self) -> &str {
        match self {
            Self::Hook { suite, .. } | Self::ForeignTest { suite, .. } => suite,
        }
    }

    /// Whether the suite's tests ran before the error (a failing `terminate`)
    pub fn tests_ran(&self) -> bool {
        matches!(
            self,
            Self::Hook {
                hook: Hook::Terminate,
                ..
            }
        )
    }
}

/// Runs a batch of tests of one suite.
///
/// Each call builds its own random generator, so runs never share ordering
/// state. The same seed always yields the same order.
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    seed: Option<u64>,
}

impl TestRunner {
    /// Create a runner with a non-deterministic order
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Fix the shuffle seed; `None` draws from OS entropy on every run
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Shuffle `tests` in place and run them in that order.
    ///
    /// One instance is shared by the whole batch. A failing test never stops
    /// its siblings; only class-level hooks fail the run.
    pub fn run(&self, suite: &SuiteDescriptor, tests: &mut [Test]) -> Result<(), SuiteError> {
        if let Some(foreign) = tests.iter().find(|t| !t.suite().same(suite)) {
            return Err(SuiteError::ForeignTest {
                suite: suite.name().to_string(),
                test: foreign.test_name().to_string(),
                owner: foreign.suite_name().to_string(),
            });
        }

        if tests.is_empty() {
            debug!(suite = suite.name(), "no tests selected, skipping suite");
            return Ok(());
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        tests.shuffle(&mut rng);

        let lifecycle = &suite.data.lifecycle;
        let mut instance = contain(|| Ok(lifecycle.new_shared_instance()))
            .map_err(|f| SuiteError::hook(suite.name(), Hook::Construct, f))?;

        contain(|| lifecycle.initialize())
            .map_err(|f| SuiteError::hook(suite.name(), Hook::Initialize, f))?;

        info!(suite = suite.name(), tests = tests.len(), "running suite");

        for test in tests.iter_mut() {
            run_one(instance.as_mut(), test);
        }

        contain(|| lifecycle.terminate())
            .map_err(|f| SuiteError::hook(suite.name(), Hook::Terminate, f))?;

        let failed = tests.iter().filter(|t| !t.passed()).count();
        info!(
            suite = suite.name(),
            passed = tests.len() - failed,
            failed,
            "suite finished"
        );
        Ok(())
    }
}

/// Run `before`, the timed body, then `after`, recording the outcome on `test`
fn run_one(instance: &mut dyn Instance, test: &mut Test) {
    test.duration = None;
    test.failure = None;

    match contain(|| instance.before()) {
        Err(failure) => test.failure = Some(failure.in_phase(Phase::Before)),
        Ok(()) => {
            let body = test.body.clone();
            let start = Instant::now();
            let outcome = contain(|| body(&mut *instance));
            test.duration = Some(start.elapsed());
            test.failure = outcome.err();
        }
    }

    if let Err(failure) = contain(|| instance.after()) {
        let failure = failure.in_phase(Phase::After);
        if test.failure.is_none() {
            test.failure = Some(failure);
        } else {
            warn!(
                suite = test.suite_name(),
                test = test.test_name(),
                %failure,
                "after hook failed on an already failing test"
            );
        }
    }

    match &test.failure {
        None => debug!(suite = test.suite_name(), test = test.test_name(), "passed"),
        Some(failure) => debug!(
            suite = test.suite_name(),
            test = test.test_name(),
            %failure,
            "failed"
        ),
    }
}
