//! checks
//!
//! Pre-promotion safety checks over derived edge sets.
//!
//! # Modules
//!
//! - [`removal`] - Baseline comparison detecting vanished images
//! - [`size`] - Standalone size ceiling validation
//!
//! # Design
//!
//! Checks come in two shapes:
//!
//! - [`BaselineCheck`]: compares a trusted baseline edge set against a
//!   proposed one and reports regressions.
//! - [`StandaloneCheck`]: validates side data the caller loaded into the
//!   check instance before evaluation.
//!
//! Both return `Ok(())` or a structured [`CheckError`]. Checks own no
//! shared state, so independent checks over the same edge sets can run in
//! any order. Nothing here logs or retries; the caller decides what to do
//! with a violation.
//!
//! # Example
//!
//! ```
//! use imagepromoter::checks::{CheckSuite, ImageRemovalCheck, ImageSizeCheck};
//! use imagepromoter::core::edges::EdgeSet;
//!
//! let baseline = EdgeSet::new();
//! let proposed = EdgeSet::new();
//!
//! let report = CheckSuite::new()
//!     .with_baseline_check(ImageRemovalCheck)
//!     .with_standalone_check(ImageSizeCheck::new(2048).with_edges(proposed.clone()))
//!     .run(Some(&baseline), &proposed);
//!
//! assert!(report.passed());
//! ```

pub mod removal;
pub mod size;

pub use removal::{ImageRemovalCheck, ImageRemovalError};
pub use size::{DigestSizes, ImageSizeCheck, ImageSizeError};

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::edges::EdgeSet;

/// A violation reported by any check.
///
/// Serializes with a `kind` tag alongside the violation's own fields.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckError {
    #[error(transparent)]
    ImageRemoval(#[from] ImageRemovalError),

    #[error(transparent)]
    ImageSize(#[from] ImageSizeError),
}

/// A check comparing a baseline edge set against a proposed one.
pub trait BaselineCheck: Send + Sync {
    /// Stable identifier used in reports.
    fn name(&self) -> &'static str;

    /// Compare `proposed` against the trusted `baseline`.
    fn compare(&self, baseline: &EdgeSet, proposed: &EdgeSet) -> Result<(), CheckError>;
}

/// A check over side data owned by the check instance.
pub trait StandaloneCheck: Send + Sync {
    /// Stable identifier used in reports.
    fn name(&self) -> &'static str;

    /// Evaluate the check.
    fn run(&self) -> Result<(), CheckError>;
}

/// One failed check in a [`CheckReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    /// Name of the check that failed
    pub check: &'static str,
    /// The violation it reported
    pub error: CheckError,
}

/// Outcome of running a [`CheckSuite`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Names of checks that ran, in order
    pub ran: Vec<&'static str>,
    /// Names of baseline checks skipped for lack of a baseline
    pub skipped: Vec<&'static str>,
    /// Every failure, in run order
    pub failures: Vec<CheckFailure>,
}

impl CheckReport {
    /// Whether every check that ran passed.
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for failure in &self.failures {
            writeln!(f, "[{}] {}", failure.check, failure.error.to_string().trim_end())?;
        }
        Ok(())
    }
}

/// An ordered collection of checks run together.
///
/// Failures are collected rather than short-circuited so one run reports
/// every violation.
#[derive(Default)]
pub struct CheckSuite {
    baseline_checks: Vec<Box<dyn BaselineCheck>>,
    standalone_checks: Vec<Box<dyn StandaloneCheck>>,
}

impl CheckSuite {
    /// Create an empty suite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a baseline-comparison check.
    pub fn with_baseline_check(mut self, check: impl BaselineCheck + 'static) -> Self {
        self.baseline_checks.push(Box::new(check));
        self
    }

    /// Add a standalone check.
    pub fn with_standalone_check(mut self, check: impl StandaloneCheck + 'static) -> Self {
        self.standalone_checks.push(Box::new(check));
        self
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.baseline_checks.len() + self.standalone_checks.len()
    }

    /// Whether no checks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every check.
    ///
    /// Baseline checks are skipped when `baseline` is `None`.
    pub fn run(&self, baseline: Option<&EdgeSet>, proposed: &EdgeSet) -> CheckReport {
        let mut report = CheckReport::default();

        for check in &self.baseline_checks {
            let Some(baseline) = baseline else {
                report.skipped.push(check.name());
                continue;
            };
            report.ran.push(check.name());
            if let Err(error) = check.compare(baseline, proposed) {
                report.failures.push(CheckFailure {
                    check: check.name(),
                    error,
                });
            }
        }

        for check in &self.standalone_checks {
            report.ran.push(check.name());
            if let Err(error) = check.run() {
                report.failures.push(CheckFailure {
                    check: check.name(),
                    error,
                });
            }
        }

        report
    }
}
