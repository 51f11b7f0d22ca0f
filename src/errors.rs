//! Trestle error handling.
//!
//! One error type for the whole crate: table syntax errors caught at
//! compile time, transport failures, and broken internal invariants all
//! surface as a [`TrestleError`] carrying the offending table rendered as
//! source text, a span over the relevant row, and a diagnostic code.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

/// The single error type: what went wrong, where, and how to help.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct TrestleError {
    /// What went wrong (type-specific data).
    pub kind: ErrorKind,
    /// Where it happened (the rendered table and a span within it).
    pub source_info: SourceInfo,
    /// How to help (error code, optional help text).
    pub diagnostic_info: DiagnosticInfo,
}

/// All failure modes the crate reports.
///
/// Compile-time syntax errors are deliberately not fatal to a run; the
/// engine converts them into an Error judgment on the offending table and
/// keeps evaluating its siblings. Transport failures abort the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Syntax error: {message}")]
    Syntax { message: String },
    #[error("Transport error: {message}")]
    Transport { message: String },
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ErrorKind {
    /// Middle segment of the diagnostic code.
    pub const fn code_family(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "compile",
            Self::Transport { .. } => "transport",
            Self::Internal { .. } => "internal",
        }
    }

    /// Final segment of the diagnostic code.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "syntax",
            Self::Transport { .. } => "failure",
            Self::Internal { .. } => "invariant",
        }
    }

    /// The full diagnostic code, e.g. `trestle::compile::syntax`.
    pub fn diagnostic_code(&self) -> String {
        format!("trestle::{}::{}", self.code_family(), self.code_suffix())
    }
}

/// Context-specific source information.
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    pub phase: String,
}

/// Diagnostic enhancement data.
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
}

impl TrestleError {
    /// True for compile-time syntax errors, which the engine localizes to
    /// their table instead of aborting the run.
    pub fn is_syntax(&self) -> bool {
        matches!(self.kind, ErrorKind::Syntax { .. })
    }

    fn primary_label(&self) -> String {
        match &self.kind {
            ErrorKind::Syntax { .. } => "malformed table row".into(),
            ErrorKind::Transport { .. } => "transport failed here".into(),
            ErrorKind::Internal { .. } => "invariant broken here".into(),
        }
    }
}

impl Diagnostic for TrestleError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

// ============================================================================
// TABLE SOURCE - rendering grids as annotatable source text
// ============================================================================

/// A grid rendered as pipe-delimited text, with one span recorded per row.
///
/// Tables arrive as in-memory grids rather than files, so this is what a
/// diagnostic's labeled span points into.
#[derive(Debug, Clone)]
pub struct TableSource {
    name: String,
    text: String,
    row_spans: Vec<(usize, usize)>,
}

impl TableSource {
    pub fn from_rows(name: impl Into<String>, rows: &[Vec<String>]) -> Self {
        let mut text = String::new();
        let mut row_spans = Vec::with_capacity(rows.len());
        for row in rows {
            let start = text.len();
            text.push('|');
            for cell in row {
                text.push_str(cell);
                text.push('|');
            }
            row_spans.push((start, text.len() - start));
            text.push('\n');
        }
        Self { name: name.into(), text, row_spans }
    }

    /// Span covering the given row, or the whole rendering when the row is
    /// out of range.
    pub fn row_span(&self, row: usize) -> SourceSpan {
        match self.row_spans.get(row) {
            Some(&(offset, len)) => (offset, len).into(),
            None => self.full_span(),
        }
    }

    pub fn full_span(&self) -> SourceSpan {
        (0, self.text.len()).into()
    }

    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.text.clone()))
    }
}

// ============================================================================
// ERROR CREATION
// ============================================================================

/// Context-aware error creation. Each compiling context knows its own table
/// rendering and phase, so errors built through it come out fully labeled.
pub trait ErrorReporting {
    /// Create an error with context-appropriate source information.
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> TrestleError;

    /// A malformed row shape or header for the context's table variant.
    fn syntax_error(&self, message: &str, span: SourceSpan) -> TrestleError {
        self.report(
            ErrorKind::Syntax {
                message: message.into(),
            },
            span,
        )
    }

    /// Creates an internal error - these indicate compiler bugs, not bad
    /// table input.
    fn internal_error(&self, message: &str, span: SourceSpan) -> TrestleError {
        let mut error = self.report(
            ErrorKind::Internal {
                message: message.into(),
            },
            span,
        );
        error.diagnostic_info.help =
            Some("This is an internal error. Please report this as a bug.".into());
        error
    }
}

/// Standalone constructor for transport failures.
///
/// Transport errors happen between a page and its runner rather than inside
/// any one table, so there is no table rendering to attach; they carry a
/// placeholder span.
pub fn transport_error(message: impl Into<String>) -> TrestleError {
    let kind = ErrorKind::Transport {
        message: message.into(),
    };
    let error_code = kind.diagnostic_code();

    TrestleError {
        kind,
        source_info: SourceInfo {
            source: Arc::new(NamedSource::new("transport", String::new())),
            primary_span: unspanned(),
            phase: "run".into(),
        },
        diagnostic_info: DiagnosticInfo {
            help: None,
            error_code,
        },
    }
}

/// Creates a placeholder span for errors not tied to a specific location in
/// a table rendering. This makes the intent of using an empty span explicit
/// and searchable.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}
