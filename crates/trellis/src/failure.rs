//! Test failures - the value a failing hook or test body produces

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe, Location};
use std::sync::Once;

/// Outcome of a test body or lifecycle hook
pub type TestResult = Result<(), Failure>;

/// Where a failure happened, relative to the test body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Raised by the suite's `before` hook
    Before,
    /// Raised by the test body itself
    #[default]
    Body,
    /// Raised by the suite's `after` hook
    After,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Before => write!(f, "before"),
            Phase::Body => write!(f, "body"),
            Phase::After => write!(f, "after"),
        }
    }
}

/// Approximate source location of a failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl From<&Location<'_>> for SourceLocation {
    fn from(location: &Location<'_>) -> Self {
        Self {
            file: location.file().to_string(),
            line: location.line(),
            column: location.column(),
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// A failed test or hook.
///
/// Every `std::error::Error` converts into a `Failure` through `?`, recording
/// the error's type name as its kind and the `?` site as its location. For
/// that reason `Failure` itself does not implement `std::error::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: String,
    message: String,
    location: Option<SourceLocation>,
    phase: Phase,
}

pub(crate) const ASSERTION_KIND: &str = "assertion";
pub(crate) const PANIC_KIND: &str = "panic";

impl Failure {
    /// Create a failure of an arbitrary kind located at the caller
    #[track_caller]
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            location: Some(Location::caller().into()),
            phase: Phase::Body,
        }
    }

    /// Create a plain failure with a message
    #[track_caller]
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new("failure", message)
    }

    /// Kind name (error type, "assertion" or "panic")
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Line number of the failure, if known
    pub fn line(&self) -> Option<u32> {
        self.location.as_ref().map(|l| l.line)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_panic(&self) -> bool {
        self.kind == PANIC_KIND
    }

    pub(crate) fn in_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }

    fn from_panic(payload: Box<dyn Any + Send>, location: Option<SourceLocation>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };

        Self {
            kind: PANIC_KIND.to_string(),
            message,
            location,
            phase: Phase::Body,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

impl<E> From<E> for Failure
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[track_caller]
    fn from(error: E) -> Self {
        Self::new(short_type_name(std::any::type_name::<E>()), error.to_string())
    }
}

/// Last path segment of a type name, keeping generic arguments intact
fn short_type_name(full: &str) -> &str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

thread_local! {
    static CONTAINING: Cell<bool> = const { Cell::new(false) };
    static PANIC_LOCATION: RefCell<Option<SourceLocation>> = const { RefCell::new(None) };
}

static HOOK: Once = Once::new();

/// Chain a panic hook that stays silent for contained panics and records
/// their location. Panics outside [`contain`] reach the previous hook.
fn install_panic_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CONTAINING.with(Cell::get) {
                let location = info.location().map(SourceLocation::from);
                PANIC_LOCATION.with(|slot| *slot.borrow_mut() = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Run `f`, turning a panic into a [`Failure`].
pub(crate) fn contain<T, F>(f: F) -> Result<T, Failure>
where
    F: FnOnce() -> Result<T, Failure>,
{
    install_panic_hook();

    let outer = CONTAINING.with(|c| c.replace(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    CONTAINING.with(|c| c.set(outer));

    match outcome {
        Ok(result) => result,
        Err(payload) => {
            let location = PANIC_LOCATION.with(|slot| slot.borrow_mut().take());
            Err(Failure::from_panic(payload, location))
        }
    }
}
