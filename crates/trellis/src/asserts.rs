//! Assertions that return a [`TestResult`] instead of panicking
//!
//! All functions are `#[track_caller]`, so the recorded failure points at the
//! assertion inside the test body.

use crate::failure::{Failure, TestResult, ASSERTION_KIND};
use std::fmt::Debug;

#[track_caller]
fn check(condition: bool, message: impl FnOnce() -> String) -> TestResult {
    if condition {
        Ok(())
    } else {
        Err(Failure::new(ASSERTION_KIND, message()))
    }
}

#[track_caller]
pub fn equal<T: PartialEq + Debug + ?Sized>(a: &T, b: &T) -> TestResult {
    check(a == b, || format!("assert {a:?} == {b:?}"))
}

#[track_caller]
pub fn not_equal<T: PartialEq + Debug + ?Sized>(a: &T, b: &T) -> TestResult {
    check(a != b, || format!("assert {a:?} != {b:?}"))
}

#[track_caller]
pub fn is_true(value: bool) -> TestResult {
    check(value, || "assert true".to_string())
}

#[track_caller]
pub fn is_false(value: bool) -> TestResult {
    check(!value, || "assert not true".to_string())
}

/// Check that `a` and `b` are the same value in memory, not just equal
#[track_caller]
pub fn same<T: ?Sized>(a: &T, b: &T) -> TestResult {
    check(std::ptr::eq(a, b), || format!("assert {a:p} is {b:p}"))
}

/// Check that `haystack` holds `needle`
#[track_caller]
pub fn contains<T: PartialEq + Debug>(haystack: &[T], needle: &T) -> TestResult {
    check(haystack.contains(needle), || {
        format!("assert {needle:?} in {haystack:?}")
    })
}

#[track_caller]
pub fn greater<T: PartialOrd + Debug>(a: &T, b: &T) -> TestResult {
    check(a > b, || format!("assert {a:?} > {b:?}"))
}

#[track_caller]
pub fn greater_equal<T: PartialOrd + Debug>(a: &T, b: &T) -> TestResult {
    check(a >= b, || format!("assert {a:?} >= {b:?}"))
}

#[track_caller]
pub fn less<T: PartialOrd + Debug>(a: &T, b: &T) -> TestResult {
    check(a < b, || format!("assert {a:?} < {b:?}"))
}

#[track_caller]
pub fn less_equal<T: PartialOrd + Debug>(a: &T, b: &T) -> TestResult {
    check(a <= b, || format!("assert {a:?} <= {b:?}"))
}

/// Fail unconditionally
#[track_caller]
pub fn fail(message: impl Into<String>) -> TestResult {
    Err(Failure::new(ASSERTION_KIND, message))
}
