//! Wire-level instruction encoding and the transport seam.
//!
//! Compiling a page produces a flat, ordered list of [`Instruction`]s. Each
//! one serializes as a heterogeneous array whose first element is the
//! instruction's tag and whose second names the operation:
//!
//! ```text
//! [tag, "make", instanceName, className, arg...]
//! [tag, "call", instanceName, methodName, arg...]
//! [tag, "callAndAssign", symbolName, instanceName, methodName, arg...]
//! ```
//!
//! Results travel back as a map from tag to returned string. The reserved
//! strings below let a runner smuggle failure detail through that single
//! string channel; [`exception_message`] recovers it on this side.

use std::collections::HashMap;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::errors::TrestleError;

// ---------------------------------------------------------------------------
// Reserved wire strings
// ---------------------------------------------------------------------------

/// Prefix a runner prepends to a returned value that represents an
/// unexpected error (a blown-up call, a missing fixture, and so on).
pub const EXCEPTION_MARKER: &str = "__EXCEPTION__:";

/// Prefix a runner prepends to a returned value that represents an
/// assertion-style failure rather than an unexpected error.
pub const FAILURE_MARKER: &str = "__FAIL__:";

/// Conventional returned value for a call whose underlying method returns
/// nothing. The core treats it as ordinary text.
pub const VOID_RESULT: &str = "/__VOID__/";

/// A returned value carrying one of the two exception markers, split into
/// its severity and the marker-free remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionMessage<'a> {
    /// The runner reported an assertion-style failure ([`FAILURE_MARKER`]).
    Failure(&'a str),
    /// The runner reported an unexpected error ([`EXCEPTION_MARKER`]).
    Error(&'a str),
}

/// Classifies `value` as a marker-carrying exception message, if it is one.
///
/// # Examples
///
/// ```
/// use trestle::instructions::{exception_message, ExceptionMessage};
///
/// assert_eq!(
///     exception_message("__FAIL__:no such method"),
///     Some(ExceptionMessage::Failure("no such method")),
/// );
/// assert_eq!(exception_message("plain value"), None);
/// ```
pub fn exception_message(value: &str) -> Option<ExceptionMessage<'_>> {
    if let Some(rest) = value.strip_prefix(FAILURE_MARKER) {
        Some(ExceptionMessage::Failure(rest))
    } else if let Some(rest) = value.strip_prefix(EXCEPTION_MARKER) {
        Some(ExceptionMessage::Error(rest))
    } else {
        None
    }
}

/// True when `value` starts with either exception marker.
pub fn is_exception_message(value: &str) -> bool {
    exception_message(value).is_some()
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

/// One remote operation request, correlated to its eventual result by `tag`.
///
/// Tags are unique within a run and instructions are transmitted in the
/// order they were built, so the tag sequence doubles as the execution
/// order on the runner side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub tag: String,
    pub operation: Operation,
}

impl Instruction {
    pub fn new(tag: impl Into<String>, operation: Operation) -> Self {
        Self { tag: tag.into(), operation }
    }

    /// Number of elements in the serialized array form.
    fn wire_len(&self) -> usize {
        match &self.operation {
            Operation::Make { args, .. } | Operation::Call { args, .. } => 4 + args.len(),
            Operation::CallAndAssign { args, .. } => 5 + args.len(),
        }
    }
}

/// The three operations a runner understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Construct a fixture instance under a well-known instance name.
    Make { instance: String, class: String, args: Vec<InstructionArg> },
    /// Invoke a method on a previously constructed instance.
    Call { instance: String, method: String, args: Vec<InstructionArg> },
    /// Invoke a method and bind its returned value to a symbol on the
    /// runner side as well as (via the result map) on this side.
    CallAndAssign { symbol: String, instance: String, method: String, args: Vec<InstructionArg> },
}

impl Operation {
    /// The operation's name as it appears on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Make { .. } => "make",
            Operation::Call { .. } => "call",
            Operation::CallAndAssign { .. } => "callAndAssign",
        }
    }
}

/// One positional argument of an instruction: plain text, or a nested
/// table of rows for operations that take tabular input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InstructionArg {
    Text(String),
    Table(Vec<Vec<String>>),
}

impl From<String> for InstructionArg {
    fn from(text: String) -> Self {
        InstructionArg::Text(text)
    }
}

impl From<&str> for InstructionArg {
    fn from(text: &str) -> Self {
        InstructionArg::Text(text.to_owned())
    }
}

impl Serialize for Instruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.wire_len()))?;
        seq.serialize_element(&self.tag)?;
        seq.serialize_element(self.operation.name())?;
        match &self.operation {
            Operation::Make { instance, class, args } => {
                seq.serialize_element(instance)?;
                seq.serialize_element(class)?;
                for arg in args {
                    seq.serialize_element(arg)?;
                }
            }
            Operation::Call { instance, method, args } => {
                seq.serialize_element(instance)?;
                seq.serialize_element(method)?;
                for arg in args {
                    seq.serialize_element(arg)?;
                }
            }
            Operation::CallAndAssign { symbol, instance, method, args } => {
                seq.serialize_element(symbol)?;
                seq.serialize_element(instance)?;
                seq.serialize_element(method)?;
                for arg in args {
                    seq.serialize_element(arg)?;
                }
            }
        }
        seq.end()
    }
}

// ---------------------------------------------------------------------------
// Results and the transport seam
// ---------------------------------------------------------------------------

/// The runner's reply: returned values keyed by instruction tag.
///
/// A tag absent from the map means "no result was returned for this
/// instruction"; expectations anchored to it render as not run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstructionResults(HashMap<String, String>);

impl InstructionResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: impl Into<String>, value: impl Into<String>) {
        self.0.insert(tag.into(), value.into());
    }

    pub fn get(&self, tag: &str) -> Option<&str> {
        self.0.get(tag).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for InstructionResults {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The seam between compilation and execution.
///
/// Implementations ship a compiled instruction list to whatever actually
/// runs fixtures (a socket, a subprocess, an in-process fake) and hand
/// back the tag-keyed results. A transport error aborts the run; per-call
/// failures travel inside the result strings via the exception markers
/// instead.
pub trait InstructionTransport {
    fn execute(&mut self, instructions: &[Instruction]) -> Result<InstructionResults, TrestleError>;
}
