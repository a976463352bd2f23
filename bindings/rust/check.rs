//! The `CanLoadGrammar` check.
//!
//! The check asks a [`GrammarProvider`] for the language once and verifies
//! that the handle is not empty and that a parser accepts it. Failures are
//! recorded, not raised, so one failing check never stops the others in a
//! [`CheckRun`]. A provider that cannot produce a handle at all is a
//! different matter and is returned as [`ProviderError`].

use std::fmt;

use tracing::{debug, error};

use crate::error::ProviderError;
use crate::provider::{GrammarProvider, LanguageHandle};

/// Name under which the check is reported.
pub const CHECK_NAME: &str = "CanLoadGrammar";

/// Message attached to every failure of the check.
pub const FAILURE_MESSAGE: &str = "Error loading Gloss grammar";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Running,
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The provider returned a null or empty handle.
    GrammarUnavailable,
    /// The handle was rejected by the parser, usually an ABI version mismatch.
    IncompatibleLanguage,
    /// The provider itself failed before returning a handle.
    ProviderFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub kind: FailureKind,
    pub message: &'static str,
    pub detail: Option<String>,
}

impl CheckFailure {
    fn new(kind: FailureKind, detail: Option<String>) -> Self {
        Self {
            kind,
            message: FAILURE_MESSAGE,
            detail,
        }
    }
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{}: {}", self.message, detail),
            None => f.write_str(self.message),
        }
    }
}

/// Outcome of one check against one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub name: &'static str,
    pub binding: String,
    pub state: CheckState,
    pub failures: Vec<CheckFailure>,
}

impl CheckReport {
    fn start(binding: &str) -> Self {
        Self {
            name: CHECK_NAME,
            binding: binding.to_string(),
            state: CheckState::Running,
            failures: Vec::new(),
        }
    }

    fn fail(&mut self, failure: CheckFailure) {
        self.failures.push(failure);
        self.state = CheckState::Failed;
    }

    fn finish(mut self) -> Self {
        if self.state == CheckState::Running {
            self.state = CheckState::Passed;
        }
        self
    }

    pub fn passed(&self) -> bool {
        self.state == CheckState::Passed
    }
}

/// Runs the check against `provider`.
///
/// Returns `Err` only when the provider call itself fails. A null handle or a
/// handle the parser rejects yields a failed [`CheckReport`].
pub fn check_can_load_grammar<P>(provider: &P) -> Result<CheckReport, ProviderError>
where
    P: GrammarProvider + ?Sized,
{
    let mut report = CheckReport::start(provider.binding());
    let handle = provider.language()?;

    if handle.is_empty() {
        report.fail(CheckFailure::new(FailureKind::GrammarUnavailable, None));
    } else if let Err(err) = handle.attach() {
        report.fail(CheckFailure::new(
            FailureKind::IncompatibleLanguage,
            Some(err.to_string()),
        ));
    }

    let report = report.finish();
    debug!(binding = %report.binding, state = ?report.state, "{CHECK_NAME} finished");
    Ok(report)
}

/// Runs the check and panics with the failure message if it does not pass.
///
/// Meant for `#[test]` functions in crates that bind the grammar.
#[track_caller]
pub fn assert_can_load_grammar<P>(provider: &P)
where
    P: GrammarProvider + ?Sized,
{
    match check_can_load_grammar(provider) {
        Ok(report) => {
            if let Some(failure) = report.failures.first() {
                panic!("{failure} (binding: {})", report.binding);
            }
        }
        Err(err) => panic!("{FAILURE_MESSAGE}: {err}"),
    }
}

/// Receives failures as checks finish.
pub trait Reporter {
    fn report(&mut self, report: &CheckReport, failure: &CheckFailure);
}

/// Emits each failure as a `tracing` error event.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, report: &CheckReport, failure: &CheckFailure) {
        error!(
            check = report.name,
            binding = %report.binding,
            kind = ?failure.kind,
            detail = failure.detail.as_deref().unwrap_or(""),
            "{}",
            failure.message
        );
    }
}

/// Keeps every failure it is given.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub failures: Vec<(String, CheckFailure)>,
}

impl Reporter for CollectingReporter {
    fn report(&mut self, report: &CheckReport, failure: &CheckFailure) {
        self.failures.push((report.binding.clone(), failure.clone()));
    }
}

/// A sequence of independent checks sharing one reporter.
#[derive(Debug)]
pub struct CheckRun<R> {
    reporter: R,
    reports: Vec<CheckReport>,
}

impl<R: Reporter> CheckRun<R> {
    pub fn new(reporter: R) -> Self {
        Self {
            reporter,
            reports: Vec::new(),
        }
    }

    /// Runs the check against `provider` and records the result.
    ///
    /// A provider error is recorded as a failed check, so the run continues.
    pub fn run<P>(&mut self, provider: &P) -> &CheckReport
    where
        P: GrammarProvider + ?Sized,
    {
        let report = match check_can_load_grammar(provider) {
            Ok(report) => report,
            Err(err) => {
                let mut report = CheckReport::start(provider.binding());
                report.fail(CheckFailure::new(
                    FailureKind::ProviderFailed,
                    Some(err.to_string()),
                ));
                report.finish()
            }
        };
        self.record(report)
    }

    /// Records the outcome of a provider that could not even be constructed.
    pub fn record_provider_error(&mut self, binding: &str, err: &ProviderError) -> &CheckReport {
        let mut report = CheckReport::start(binding);
        report.fail(CheckFailure::new(
            FailureKind::ProviderFailed,
            Some(err.to_string()),
        ));
        self.record(report.finish())
    }

    fn record(&mut self, report: CheckReport) -> &CheckReport {
        for failure in &report.failures {
            self.reporter.report(&report, failure);
        }
        self.reports.push(report);
        &self.reports[self.reports.len() - 1]
    }

    pub fn reports(&self) -> &[CheckReport] {
        &self.reports
    }

    pub fn failure_count(&self) -> usize {
        self.reports.iter().map(|r| r.failures.len()).sum()
    }

    /// True when every check recorded so far passed.
    pub fn passed(&self) -> bool {
        self.reports.iter().all(CheckReport::passed)
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }
}
