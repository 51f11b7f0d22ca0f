//! Judging returned values against their originating cells.
//!
//! Compilation anchors one [`Expectation`] per asserting cell. When results
//! arrive, each expectation looks up its tag, classifies the returned value
//! (or its absence), renders a [`CellResult`], and writes it back into the
//! grid, counting toward the run summary as it goes.

use crate::compare::Comparator;
use crate::escape::{escape, unescape};
use crate::grid::SharedGrid;
use crate::instructions::{exception_message, ExceptionMessage};
use crate::results::{announce_blank, is_exception_failure, CellResult, TestSummary};
use crate::symbols::SymbolTable;

/// The mutable run state every evaluation writes into: the shared symbol
/// table and the four counters.
pub struct EvalContext<'a> {
    pub symbols: &'a mut SymbolTable,
    pub summary: &'a mut TestSummary,
}

impl EvalContext<'_> {
    fn pass(&mut self, message: String) -> CellResult {
        self.summary.right += 1;
        CellResult::Pass(message)
    }

    /// A pass rendering that is not itself an assertion, so it stays out of
    /// the counters.
    fn pass_uncounted(&self, message: String) -> CellResult {
        CellResult::Pass(message)
    }

    fn fail(&mut self, message: String) -> CellResult {
        self.summary.wrong += 1;
        CellResult::Fail(message)
    }

    fn error(&mut self, message: String) -> CellResult {
        self.summary.exceptions += 1;
        CellResult::Error(message)
    }

    fn ignore(&mut self, message: String) -> CellResult {
        self.summary.ignores += 1;
        CellResult::Ignore(message)
    }
}

/// How one cell judges the value that comes back for its tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectationKind {
    /// Render the expanded expected text; the returned value is irrelevant.
    /// Used for constructor and void-call argument cells.
    VoidReturn,
    /// Produce nothing; the cell is left untouched.
    Silent,
    /// The fixture construction acknowledgement cell.
    Construction,
    /// Store the returned value under `symbol`, then show the binding.
    SymbolAssignment { symbol: String },
    /// Assert the returned value matches the cell's expression.
    ReturnedValue,
    /// Assert the returned value does NOT match the cell's expression.
    RejectedValue,
}

/// Binds `(tag, column, row)` to a judgment rule over one grid cell.
///
/// Created at compile time, consumed exactly once when results arrive.
#[derive(Debug, Clone)]
pub struct Expectation {
    pub tag: String,
    pub col: usize,
    pub row: usize,
    pub grid: SharedGrid,
    pub kind: ExpectationKind,
}

impl Expectation {
    pub fn new(
        tag: impl Into<String>,
        col: usize,
        row: usize,
        grid: SharedGrid,
        kind: ExpectationKind,
    ) -> Self {
        Self {
            tag: tag.into(),
            col,
            row,
            grid,
            kind,
        }
    }

    /// Judges `returned` (or its absence) against this cell and writes the
    /// rendered result back, except where the kind deliberately produces
    /// nothing.
    pub fn evaluate(&self, returned: Option<&str>, ctx: &mut EvalContext<'_>) {
        let expected = self.grid.cell_text(self.col, self.row);
        let result = match returned {
            None => {
                let judgment = ctx.ignore("Test not run".into());
                Some(CellResult::plain_with(expected, judgment))
            }
            Some(actual) => self.evaluation(actual, &expected, ctx),
        };
        if let Some(result) = result {
            self.grid.set_cell(self.col, self.row, &result);
        }
    }

    /// The shared template: marker-carrying values short-circuit every kind,
    /// then each kind builds its own message.
    fn evaluation(
        &self,
        actual: &str,
        expected: &str,
        ctx: &mut EvalContext<'_>,
    ) -> Option<CellResult> {
        if let Some(message) = exception_message(actual) {
            let judgment = match message {
                ExceptionMessage::Failure(rest) => ctx.fail(rest.into()),
                ExceptionMessage::Error(rest) => ctx.error(rest.into()),
            };
            return Some(CellResult::plain_with(expected, judgment));
        }

        match &self.kind {
            ExpectationKind::VoidReturn => {
                let message = ctx.symbols.replace_symbols_full_expansion(expected);
                Some(CellResult::plain(message))
            }
            ExpectationKind::Silent => None,
            ExpectationKind::Construction => {
                Some(self.construction_message(actual, expected, ctx))
            }
            ExpectationKind::SymbolAssignment { symbol } => {
                Some(assignment_message(symbol, actual, ctx))
            }
            ExpectationKind::ReturnedValue => {
                Some(self.comparison_message(actual, expected, false, ctx))
            }
            ExpectationKind::RejectedValue => {
                Some(self.comparison_message(actual, expected, true, ctx))
            }
        }
    }

    fn construction_message(
        &self,
        actual: &str,
        expected: &str,
        ctx: &mut EvalContext<'_>,
    ) -> CellResult {
        if actual.eq_ignore_ascii_case("OK") {
            // Construction success is not itself an assertion.
            let message = ctx.symbols.replace_symbols_full_expansion(expected);
            ctx.pass_uncounted(message)
        } else {
            ctx.error("Unknown construction message".into())
        }
    }

    /// Shared by ReturnedValue and RejectedValue; `invert` swaps how
    /// matches are reported, while the ignore and error branches stay the
    /// same for both.
    fn comparison_message(
        &self,
        actual: &str,
        expected: &str,
        invert: bool,
        ctx: &mut EvalContext<'_>,
    ) -> CellResult {
        let replaced = unescape(&ctx.symbols.replace_symbols(expected));

        if actual == replaced {
            let expansion = ctx.symbols.replace_symbols_full_expansion(expected);
            let message = announce_blank(&expansion).to_owned();
            return report_pass(ctx, invert, message);
        }
        if replaced.is_empty() {
            return ctx.ignore(actual.to_owned());
        }

        let comparator = Comparator::with_expression(&*ctx.symbols, &replaced, actual, expected);
        if let Some(verdict) = comparator.evaluate() {
            return if verdict.passed {
                report_pass(ctx, invert, verdict.message)
            } else {
                report_fail(ctx, invert, verdict.message)
            };
        }

        if is_exception_failure(actual) {
            return ctx.error(actual.to_owned());
        }

        let adjective = if invert { "is not" } else { "expected" };
        let expansion = ctx.symbols.replace_symbols_full_expansion(expected);
        let judgment = report_fail(ctx, invert, format!("{} [{}]", adjective, expansion));
        CellResult::plain_with(format!("[{}]", actual), judgment)
    }
}

fn assignment_message(symbol: &str, actual: &str, ctx: &mut EvalContext<'_>) -> CellResult {
    ctx.symbols.set(symbol, actual);
    let shown = if is_exception_failure(actual) {
        actual.to_owned()
    } else {
        escape(actual)
    };
    CellResult::plain(format!("${}<-[{}]", symbol, shown))
}

fn report_pass(ctx: &mut EvalContext<'_>, invert: bool, message: String) -> CellResult {
    if invert {
        ctx.fail(message)
    } else {
        ctx.pass(message)
    }
}

fn report_fail(ctx: &mut EvalContext<'_>, invert: bool, message: String) -> CellResult {
    if invert {
        ctx.pass(message)
    } else {
        ctx.fail(message)
    }
}
