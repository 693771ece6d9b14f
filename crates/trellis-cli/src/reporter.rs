//! Console reporter - one line per module, then failure details

use colored::*;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;
use trellis::{Phase, Report, Test};

/// Column the score starts at when the module name is short enough
const SCORE_COLUMN: usize = 60;

/// Console reporter with output configuration
pub struct TestReporter {
    /// List passed tests too
    verbose: bool,
    /// Disable colored output
    no_color: bool,
}

impl Default for TestReporter {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TestReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            no_color: false,
        }
    }

    /// Disable colored output
    pub fn with_no_color(mut self, no_color: bool) -> Self {
        self.no_color = no_color;
        self
    }

    /// Print `report` to stdout, naming modules relative to `root`
    pub fn report(&self, report: &Report, root: &Path) {
        let stdout = io::stdout();
        let _ = self.write_report(&mut stdout.lock(), report, root);
    }

    /// Write `report` to any sink
    pub fn write_report(&self, out: &mut dyn Write, report: &Report, root: &Path) -> io::Result<()> {
        if self.no_color {
            colored::control::set_override(false);
        }

        let result = self.write_all(out, report, root);

        if self.no_color {
            colored::control::unset_override();
        }
        result
    }

    fn write_all(&self, out: &mut dyn Write, report: &Report, root: &Path) -> io::Result<()> {
        self.write_discovery_errors(out, report, root)?;
        self.write_suite_errors(out, report)?;

        if report.tests.is_empty() {
            writeln!(out, "{}", "No tests found.".yellow())?;
            return Ok(());
        }

        self.write_header(out, report)?;
        for tests in group_by(&report.tests, |t| t.module_path()) {
            self.write_module(out, tests, root)?;
        }
        writeln!(out)
    }

    fn write_header(&self, out: &mut dyn Write, report: &Report) -> io::Result<()> {
        let total = report.tests.len();
        let passed = report.passed();
        let score = if passed == total {
            "ALL".to_string()
        } else {
            format!("{passed}/{total}")
        };
        let header = format!("Ran {score} tests successfully");

        writeln!(out)?;
        if passed == total {
            writeln!(out, "{}", header.green().bold())?;
        } else {
            writeln!(out, "{}", header.red().bold())?;
        }
        writeln!(out, "{}", "-".repeat(header.len()))?;
        writeln!(out)
    }

    fn write_module(&self, out: &mut dyn Write, tests: &[Test], root: &Path) -> io::Result<()> {
        let module = module_name(root, tests[0].module_path());
        let passed = tests.iter().filter(|t| t.passed()).count();
        let elapsed: Duration = tests.iter().filter_map(Test::duration).sum();

        let score = format!("{passed}/{}", tests.len());
        let score = if passed == tests.len() {
            score.green()
        } else {
            score.red()
        };
        let filler = SCORE_COLUMN.saturating_sub(module.len()).max(3);

        writeln!(
            out,
            "{}  {}  {} successful tests in {:.2} ms",
            module.bold(),
            ".".repeat(filler).dimmed(),
            score,
            elapsed.as_secs_f64() * 1000.0
        )?;

        if self.verbose {
            for test in tests.iter().filter(|t| t.passed()) {
                writeln!(
                    out,
                    "        {} {}::{} ({:.2?})",
                    "PASS".green().bold(),
                    test.suite_name(),
                    test.test_name(),
                    test.duration().unwrap_or_default()
                )?;
            }
        }

        let failed: Vec<Test> = tests.iter().filter(|t| !t.passed()).cloned().collect();
        for suite in group_by(&failed, |t| t.suite_name()) {
            writeln!(out, "    {}", suite[0].suite_name().bold())?;
            for test in suite {
                write_failed_test(out, test)?;
            }
        }
        Ok(())
    }

    fn write_discovery_errors(&self, out: &mut dyn Write, report: &Report, root: &Path) -> io::Result<()> {
        if report.discovery_errors.is_empty() {
            return Ok(());
        }

        writeln!(out, "{}", "During test discovery:".yellow().bold())?;
        for (path, error) in &report.discovery_errors {
            let shown = path.strip_prefix(root).unwrap_or(path);
            writeln!(out, "  {} {}", "●".yellow(), shown.display())?;
            writeln!(out, "    {}", error.to_string().dimmed())?;
        }
        writeln!(out)
    }

    fn write_suite_errors(&self, out: &mut dyn Write, report: &Report) -> io::Result<()> {
        if report.suite_errors.is_empty() {
            return Ok(());
        }

        writeln!(out, "{}", "Suite errors:".red().bold())?;
        for error in &report.suite_errors {
            writeln!(out, "  {} {}", "●".red(), error)?;
        }
        writeln!(out)
    }
}

fn write_failed_test(out: &mut dyn Write, test: &Test) -> io::Result<()> {
    let Some(failure) = test.failure() else {
        writeln!(out, "        {} -> {}", test.test_name(), "not run".yellow())?;
        return Ok(());
    };

    let mut line = format!("        {} -> {}", test.test_name(), failure.kind().red());
    if failure.phase() != Phase::Body {
        line.push_str(&format!(" in {}", failure.phase()));
    }
    if let Some(n) = failure.line() {
        line.push_str(&format!(" (line {n})"));
    }
    writeln!(out, "{line}")?;
    writeln!(out, "            err :: {}", failure.message())?;
    if let Some(location) = failure.location() {
        writeln!(out, "            where :: {location}")?;
    }
    Ok(())
}

/// Dotted module name: root-relative, extension dropped
pub fn module_name(root: &Path, module_path: &Path) -> String {
    let relative = module_path.strip_prefix(root).unwrap_or(module_path);
    relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(".")
}

/// Split a sorted slice into runs sharing the same key
fn group_by<'a, T, K, F>(items: &'a [T], key: F) -> Vec<&'a [T]>
where
    K: PartialEq,
    F: Fn(&'a T) -> K,
{
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=items.len() {
        if i == items.len() || key(&items[i]) != key(&items[start]) {
            if start < i {
                groups.push(&items[start..i]);
            }
            start = i;
        }
    }
    groups
}
