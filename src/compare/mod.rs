//! The assertion mini-language evaluator.
//!
//! An expected-value cell may hold a comparator expression instead of a
//! literal: a relational operator (`<10`, `!= 3`), a range (`1 <= _ < 10`),
//! a regex containment test (`=~/^abc/`), or approximate equality (`~=`).
//! Evaluation yields a [`Verdict`] when the expression is one of these
//! forms, or nothing at all, in which case the caller falls back to literal
//! equality. Malformed expressions and non-numeric actuals also yield
//! nothing; assertion syntax degrades to a plain mismatch, never a crash.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use regex::Regex;

use crate::escape::unescape;
use crate::symbols::SymbolTable;

#[derive(Parser)]
#[grammar = "compare/grammar.pest"]
struct CompareParser;

/// Outcome of one comparator evaluation: whether the actual value satisfied
/// the expression, and the message to render either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
}

/// Evaluates one expected-cell expression against one actual value.
///
/// The expression the grammar sees is the expected text after symbol
/// substitution and entity unescaping; rendered messages are built from the
/// untouched expected text so symbol references stay visible and expand to
/// `$name->[value]` form.
pub struct Comparator<'a> {
    symbols: &'a SymbolTable,
    expression: String,
    actual: &'a str,
    expected: &'a str,
}

impl<'a> Comparator<'a> {
    /// Builds the expression from the raw expected cell, applying the same
    /// preprocessing the expectation engine does: symbol substitution, then
    /// entity unescaping.
    pub fn standalone(symbols: &'a SymbolTable, actual: &'a str, expected: &'a str) -> Self {
        let expression = unescape(&symbols.replace_symbols(expected));
        Self {
            symbols,
            expression,
            actual,
            expected,
        }
    }

    /// Wraps an expression the caller has already preprocessed.
    pub fn with_expression(
        symbols: &'a SymbolTable,
        expression: impl Into<String>,
        actual: &'a str,
        expected: &'a str,
    ) -> Self {
        Self {
            symbols,
            expression: expression.into(),
            actual,
            expected,
        }
    }

    /// Returns a verdict when the expression is a comparator form, `None`
    /// when it is not (or cannot be applied to this actual value).
    pub fn evaluate(&self) -> Option<Verdict> {
        let pairs = CompareParser::parse(Rule::expression, &self.expression).ok()?;
        let expression = pairs.peek()?;
        let form = expression.into_inner().find(|p| p.as_rule() != Rule::EOI)?;
        match form.as_rule() {
            Rule::regex_match => self.evaluate_regex(form),
            Rule::simple_comparison => self.evaluate_simple(form),
            Rule::range => self.evaluate_range(form),
            _ => None,
        }
    }

    fn evaluate_regex(&self, form: Pair<Rule>) -> Option<Verdict> {
        let body = form.into_inner().next()?.as_str();
        let pattern = Regex::new(body).ok()?;
        // Containment, not a full match.
        let passed = pattern.is_match(self.actual);
        let message = if passed {
            format!("/{}/ found in: {}", body, self.actual)
        } else {
            format!("/{}/ not found in: {}", body, self.actual)
        };
        Some(Verdict { passed, message })
    }

    fn evaluate_simple(&self, form: Pair<Rule>) -> Option<Verdict> {
        let mut inner = form.into_inner();
        let operator = inner.next()?.as_str();
        let literal = inner.next()?.as_str();
        let actual: f64 = self.actual.trim().parse().ok()?;
        let expected: f64 = literal.parse().ok()?;
        let passed = match operator {
            "<" | "!>=" => actual < expected,
            ">" | "!<=" => actual > expected,
            ">=" | "!<" => actual >= expected,
            "<=" | "!>" => actual <= expected,
            "!=" => actual != expected,
            "=" => actual == expected,
            "~=" => approximately_equal(literal, self.actual),
            "!~=" => !approximately_equal(literal, self.actual),
            _ => return None,
        };
        Some(self.simple_verdict(passed))
    }

    fn evaluate_range(&self, form: Pair<Rule>) -> Option<Verdict> {
        let mut inner = form.into_inner();
        let low: f64 = inner.next()?.as_str().parse().ok()?;
        let closed_low = inner.next()?.as_str() == "<=";
        let closed_high = inner.next()?.as_str() == "<=";
        let high: f64 = inner.next()?.as_str().parse().ok()?;
        let actual: f64 = self.actual.trim().parse().ok()?;
        let passed = (low < actual && actual < high)
            || (closed_low && actual == low)
            || (closed_high && actual == high);
        Some(self.range_verdict(passed))
    }

    /// `<actual><expression-with-spaces-stripped>`, symbol-expanded.
    fn simple_verdict(&self, passed: bool) -> Verdict {
        let message = format!("{}{}", self.actual, self.expected.replace(' ', ""));
        Verdict {
            passed,
            message: self.symbols.replace_symbols_full_expansion(&message),
        }
    }

    /// The actual value spliced into the placeholder gap, symbol-expanded.
    fn range_verdict(&self, passed: bool) -> Verdict {
        let stripped = self.expected.replace(' ', "");
        let mut fragments = stripped.split('_');
        let front = fragments.next().unwrap_or("");
        let back = fragments.next().unwrap_or("");
        let message = format!("{}{}{}", front, self.actual, back);
        Verdict {
            passed,
            message: self.symbols.replace_symbols_full_expansion(&message),
        }
    }
}

/// Tolerance comparison behind `~=`: the expected literal's fractional
/// digits set the precision, both values are scaled by that power of ten and
/// rounded half-up, and the rounded values must be equal. Unparseable input
/// compares unequal.
pub fn approximately_equal(standard: &str, candidate: &str) -> bool {
    let standard = standard.trim();
    match (standard.parse::<f64>(), candidate.trim().parse::<f64>()) {
        (Ok(standard_value), Ok(candidate_value)) => {
            let precision = match standard.find('.') {
                Some(point) => standard.len() - point - 1,
                None => 0,
            };
            let factor = 10f64.powi(precision as i32);
            round_half_up(standard_value * factor) == round_half_up(candidate_value * factor)
        }
        _ => false,
    }
}

/// Half-up rounding: halves go toward positive infinity, so `-2.5` rounds
/// to `-2`, not `-3`.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
