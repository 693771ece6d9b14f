//! Shuffle ordering laws of the runner

use proptest::prelude::*;
use std::collections::HashSet;
use std::fs;
use tempfile::TempDir;
use trellis::{collect, Registry, Suite, SuiteBuilder, SuiteDescriptor, Test, TestRunner};

struct Plain;

impl Suite for Plain {
    fn new_shared_instance() -> Self {
        Plain
    }
}

fn ten_test_suite() -> (TempDir, SuiteDescriptor) {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("__tests")).unwrap();
    fs::write(dir.path().join("plain.rs"), "").unwrap();
    let home = dir.path().join("__tests/plain.rs");
    fs::write(&home, "").unwrap();

    let mut builder = SuiteBuilder::<Plain>::new().named("PlainTests");
    for i in 0..10 {
        builder = builder.test(format!("test_{i}"), |_| Ok(()));
    }
    let suite = Registry::default().define(home, builder).unwrap();
    (dir, suite)
}

fn run_order(runner: &TestRunner, suite: &SuiteDescriptor, tests: &[Test]) -> Vec<String> {
    let mut batch = tests.to_vec();
    runner.run(suite, &mut batch).unwrap();
    batch.iter().map(|t| t.test_name().to_string()).collect()
}

#[test]
fn test_seed_zero_is_reproducible() {
    let (_dir, suite) = ten_test_suite();
    let tests = collect(&suite);
    let runner = TestRunner::new().with_seed(Some(0));

    assert_eq!(
        run_order(&runner, &suite, &tests),
        run_order(&runner, &suite, &tests)
    );
}

#[test]
fn test_unseeded_order_varies() {
    let (_dir, suite) = ten_test_suite();
    let tests = collect(&suite);
    let runner = TestRunner::new();

    let orders: HashSet<Vec<String>> = (0..10)
        .map(|_| run_order(&runner, &suite, &tests))
        .collect();

    assert!(orders.len() > 1);
}

#[test]
fn test_every_test_runs_exactly_once() {
    let (_dir, suite) = ten_test_suite();
    let tests = collect(&suite);

    let mut order = run_order(&TestRunner::new(), &suite, &tests);
    order.sort();
    let mut declared: Vec<String> = suite.test_names().map(String::from).collect();
    declared.sort();
    assert_eq!(order, declared);
}

proptest! {
    #[test]
    fn prop_same_seed_same_order(seed in any::<u64>()) {
        let (_dir, suite) = ten_test_suite();
        let tests = collect(&suite);
        let runner = TestRunner::new().with_seed(Some(seed));

        prop_assert_eq!(
            run_order(&runner, &suite, &tests),
            run_order(&runner, &suite, &tests)
        );
    }
}
