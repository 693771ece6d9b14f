//! Suite definition - lifecycle hooks and the ordered test list

use crate::failure::{Failure, TestResult};
use crate::metadata::{Decorator, MetadataTable, TestKey};
use std::any::Any;
use std::marker::PhantomData;
use std::rc::Rc;

/// A group of tests sharing one instance and four lifecycle hooks.
///
/// # Shared instance
///
/// The runner calls [`Suite::new_shared_instance`] once per batch and hands
/// that single value to every test, `before` and `after` of the batch. State
/// left behind by one test is visible to the next one unless `after` resets
/// it. Tests run in a shuffled order, so they must not depend on each other.
///
/// ```
/// use trellis::{asserts, Suite, SuiteBuilder, TestResult};
///
/// #[derive(Default)]
/// struct Stack {
///     items: Vec<u32>,
/// }
///
/// impl Suite for Stack {
///     fn new_shared_instance() -> Self {
///         Stack::default()
///     }
///
///     fn after(&mut self) -> TestResult {
///         self.items.clear();
///         Ok(())
///     }
/// }
///
/// let builder = SuiteBuilder::<Stack>::new().test("test_push", |s| {
///     s.items.push(1);
///     asserts::equal(&s.items.len(), &1)
/// });
/// # let _ = builder;
/// ```
pub trait Suite: Sized + 'static {
    /// Build the instance shared by every test of one run batch
    fn new_shared_instance() -> Self;

    /// Run once before any test of the batch
    fn initialize() -> TestResult {
        Ok(())
    }

    /// Run once after every test of the batch
    fn terminate() -> TestResult {
        Ok(())
    }

    /// Run before each test
    fn before(&mut self) -> TestResult {
        Ok(())
    }

    /// Run after each test, even when the test failed
    fn after(&mut self) -> TestResult {
        Ok(())
    }
}

/// Type-erased test body bound to a shared instance at call time
pub(crate) type Body = Rc<dyn Fn(&mut dyn Instance) -> TestResult>;

/// Object-safe view of a suite instance
pub(crate) trait Instance {
    fn before(&mut self) -> TestResult;
    fn after(&mut self) -> TestResult;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: Suite> Instance for S {
    fn before(&mut self) -> TestResult {
        Suite::before(self)
    }

    fn after(&mut self) -> TestResult {
        Suite::after(self)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Object-safe view of a suite's class-level hooks
pub(crate) trait Lifecycle {
    fn new_shared_instance(&self) -> Box<dyn Instance>;
    fn initialize(&self) -> TestResult;
    fn terminate(&self) -> TestResult;
}

struct Hooks<S>(PhantomData<fn() -> S>);

impl<S: Suite> Lifecycle for Hooks<S> {
    fn new_shared_instance(&self) -> Box<dyn Instance> {
        Box::new(S::new_shared_instance())
    }

    fn initialize(&self) -> TestResult {
        S::initialize()
    }

    fn terminate(&self) -> TestResult {
        S::terminate()
    }
}

/// A test as declared on the builder
#[derive(Clone)]
pub(crate) struct Declared {
    pub(crate) name: String,
    pub(crate) body: Body,
}

/// Declares a suite: its name, its tests in order, and their metadata
pub struct SuiteBuilder<S> {
    name: String,
    tests: Vec<Declared>,
    metadata: MetadataTable,
    orphan_decorator: bool,
    _suite: PhantomData<fn() -> S>,
}

impl<S: Suite> Default for SuiteBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Suite> SuiteBuilder<S> {
    /// Start a suite named after the qualified type name of `S`
    pub fn new() -> Self {
        Self {
            name: std::any::type_name::<S>().to_string(),
            tests: Vec::new(),
            metadata: MetadataTable::default(),
            orphan_decorator: false,
            _suite: PhantomData,
        }
    }

    /// Override the suite name; records already attached follow the rename
    pub fn named(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.metadata.rename_suite(&self.name, &name);
        self.name = name;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a test; declaration order is collection order
    pub fn test<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut S) -> TestResult + 'static,
    {
        let name = name.into();
        let body: Body = Rc::new(move |instance: &mut dyn Instance| {
            match instance.as_any_mut().downcast_mut::<S>() {
                Some(suite) => body(suite),
                None => Err(Failure::new(
                    "instance",
                    format!("test instance is not a `{}`", std::any::type_name::<S>()),
                )),
            }
        });
        self.tests.push(Declared { name, body });
        self
    }

    /// Attach a decorator record to the most recently declared test
    pub fn with<D: Decorator>(mut self, decorator: D) -> Self {
        match self.tests.last() {
            Some(last) => {
                let key = TestKey::new(self.name.clone(), last.name.clone());
                decorator.attach(key, &mut self.metadata);
            }
            None => self.orphan_decorator = true,
        }
        self
    }

    pub(crate) fn into_parts(self) -> SuiteParts {
        SuiteParts {
            name: self.name,
            tests: self.tests,
            metadata: self.metadata,
            orphan_decorator: self.orphan_decorator,
            lifecycle: Box::new(Hooks::<S>(PhantomData)),
        }
    }
}

/// Builder output, consumed by the registry
pub(crate) struct SuiteParts {
    pub(crate) name: String,
    pub(crate) tests: Vec<Declared>,
    pub(crate) metadata: MetadataTable,
    pub(crate) orphan_decorator: bool,
    pub(crate) lifecycle: Box<dyn Lifecycle>,
}
