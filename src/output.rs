//! Progress and warning reporting for pipeline runs.
//!
//! The library never prints on its own; everything goes through a [`Reporter`]
//! so the CLI can render to stderr while tests stay silent.

use std::sync::Mutex;

/// Sink for human-readable pipeline progress.
pub trait Reporter: Send + Sync {
    /// Reports normal progress. Suppressed in quiet mode.
    fn progress(&self, message: &str);

    /// Reports a non-fatal problem (cleanup failures, skipped segments).
    /// Always shown.
    fn warn(&self, message: &str);
}

/// Reporter that writes to stderr, honoring the quiet flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrReporter {
    quiet: bool,
}

impl StderrReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl Reporter for StderrReporter {
    fn progress(&self, message: &str) {
        if !self.quiet {
            eprintln!("{}", message);
        }
    }

    fn warn(&self, message: &str) {
        eprintln!("warning: {}", message);
    }
}

/// Reporter that discards everything. Default for library use and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn progress(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}
}

/// Reporter that captures messages for test assertions.
#[derive(Default)]
pub struct CapturingReporter {
    lines: Mutex<Vec<String>>,
}

impl CapturingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything reported so far, warnings prefixed with "warn: ".
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("report log poisoned").clone()
    }

    /// Warnings only, without the prefix.
    pub fn warnings(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| line.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }
}

impl Reporter for CapturingReporter {
    fn progress(&self, message: &str) {
        self.lines
            .lock()
            .expect("report log poisoned")
            .push(message.to_string());
    }

    fn warn(&self, message: &str) {
        self.lines
            .lock()
            .expect("report log poisoned")
            .push(format!("warn: {message}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_reporter_discards() {
        let reporter = SilentReporter;
        reporter.progress("hello");
        reporter.warn("problem");
        // Nothing to assert; just must not panic.
    }

    #[test]
    fn test_stderr_reporter_quiet_flag() {
        // Quiet suppresses progress but not warnings; exercised for coverage,
        // output itself is not captured here.
        let reporter = StderrReporter::new(true);
        reporter.progress("suppressed");
        reporter.warn("shown");
    }

    #[test]
    fn test_capturing_reporter_records_in_order() {
        let reporter = CapturingReporter::new();
        reporter.progress("one");
        reporter.warn("two");

        assert_eq!(reporter.lines(), vec!["one", "warn: two"]);
        assert_eq!(reporter.warnings(), vec!["two"]);
    }
}
