//! Judgment classification and run-wide bookkeeping.
//!
//! Every evaluated expectation collapses into a [`CellResult`] written back
//! into the cell that raised it, and every counted judgment lands in one of
//! the four [`TestSummary`] buckets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Returned values that begin with this prefix are failure reports from the
/// remote fixture itself, already formatted for display. They are rendered
/// verbatim, never entity-escaped.
pub const EXCEPTION_FAILURE_PREFIX: &str = "Exception: ";

/// A classified outcome rendered into one grid cell.
///
/// `Pass`, `Fail`, `Error`, and `Ignore` are counted judgments. `Plain`
/// carries literal text, optionally trailing a nested judgment, for cells
/// that display information without asserting anything themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellResult {
    Pass(String),
    Fail(String),
    Error(String),
    Ignore(String),
    Plain {
        text: String,
        judgment: Option<Box<CellResult>>,
    },
}

impl CellResult {
    /// Literal text with no nested judgment.
    pub fn plain(text: impl Into<String>) -> Self {
        CellResult::Plain {
            text: text.into(),
            judgment: None,
        }
    }

    /// Literal text followed by a nested judgment.
    pub fn plain_with(text: impl Into<String>, judgment: CellResult) -> Self {
        CellResult::Plain {
            text: text.into(),
            judgment: Some(Box::new(judgment)),
        }
    }
}

impl fmt::Display for CellResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellResult::Pass(message) => write!(f, "pass({})", message),
            CellResult::Fail(message) => write!(f, "fail({})", message),
            CellResult::Error(message) => write!(f, "error({})", message),
            CellResult::Ignore(message) => write!(f, "ignore({})", message),
            CellResult::Plain { text, judgment } => match judgment {
                Some(judgment) if text.is_empty() => write!(f, "{}", judgment),
                Some(judgment) => write!(f, "{} {}", text, judgment),
                None => write!(f, "{}", text),
            },
        }
    }
}

/// True when a value is a fixture-formatted failure report, per the
/// [`EXCEPTION_FAILURE_PREFIX`] convention.
pub fn is_exception_failure(value: &str) -> bool {
    value.starts_with(EXCEPTION_FAILURE_PREFIX)
}

/// Substitute rendering for an empty matched expectation, so a passing
/// blank cell is visibly a judgment rather than still-empty.
pub fn announce_blank(text: &str) -> &str {
    if text.is_empty() {
        "BLANK"
    } else {
        text
    }
}

/// Counted judgments for one test run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSummary {
    pub right: usize,
    pub wrong: usize,
    pub exceptions: usize,
    pub ignores: usize,
}

impl TestSummary {
    pub fn total(&self) -> usize {
        self.right + self.wrong + self.exceptions + self.ignores
    }
}

impl fmt::Display for TestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R:{} W:{} E:{} I:{}",
            self.right, self.wrong, self.exceptions, self.ignores
        )
    }
}
