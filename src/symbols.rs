//! The run-scoped symbol store and the `$name` substitution scanner.
//!
//! Symbols are captured from instruction results and referenced from later
//! cells. Substitution scans left to right and resumes strictly after each
//! replacement, so substituted content is never rescanned; a value that
//! itself contains `$` cannot send the scanner into a loop.

use im::HashMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::escape::escape;
use crate::results::is_exception_failure;

/// A substitution token: `$` then a letter, then word characters. The name
/// classes are ASCII on purpose; symbol names come from fixture authors
/// typing identifiers, not prose.
static SYMBOL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([A-Za-z][A-Za-z0-9_]*)").unwrap());

/// An assignment cell: `$name =` with nothing else. Accepts a leading digit
/// where the substitution token does not.
static ASSIGNMENT_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\s*\$([A-Za-z0-9_]+)\s*=\s*\z").unwrap());

/// Recognizes an output cell that captures its result into a symbol, and
/// yields the symbol name.
///
/// # Examples
///
/// ```rust
/// use trestle::symbols::symbol_assignment;
/// assert_eq!(symbol_assignment(" $price = "), Some("price"));
/// assert_eq!(symbol_assignment("$price = 5"), None);
/// ```
pub fn symbol_assignment(cell_text: &str) -> Option<&str> {
    ASSIGNMENT_CELL
        .captures(cell_text)
        .and_then(|caps| caps.get(1))
        .map(|name| name.as_str())
}

/// Named values for one test run. Case-sensitive; assignment overwrites;
/// entries live until the run ends.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|value| value.as_str())
    }

    /// Substitutes every `$name` token with its stored value.
    ///
    /// An unknown name falls back to its strictly-shorter prefixes, longest
    /// first: the first prefix with a value is substituted and the unmatched
    /// tail is re-appended literally, so with only `x = "5"` defined,
    /// `"$xyz"` becomes `"5yz"`. A token with no matching prefix at all is
    /// left as the literal `$name`.
    pub fn replace_symbols(&self, text: &str) -> String {
        self.replace_all(text, format_value)
    }

    /// Like [`replace_symbols`](Self::replace_symbols), but renders each hit
    /// as `$name->[value]` for human review, entity-escaping the value
    /// unless it is a fixture-formatted failure report.
    pub fn replace_symbols_full_expansion(&self, text: &str) -> String {
        self.replace_all(text, format_expansion)
    }

    fn replace_all(&self, text: &str, format: fn(&str, &str) -> String) -> String {
        let mut result = text.to_string();
        let mut from = 0;
        while let Some(token) = SYMBOL_TOKEN.find_at(&result, from) {
            let (start, end) = (token.start(), token.end());
            let name = result[start + 1..end].to_string();
            let value = self.resolve_token(&name, format);
            result = format!("{}{}{}", &result[..start], value, &result[end..]);
            // Resume after the substituted value, never inside it.
            from = (start + value.len()).min(result.len());
            if from == result.len() {
                break;
            }
        }
        result
    }

    fn resolve_token(&self, name: &str, format: fn(&str, &str) -> String) -> String {
        if let Some(value) = self.get(name) {
            return format(name, value);
        }
        // Token names are ASCII by construction, so byte slicing is safe.
        for split in (1..name.len()).rev() {
            let prefix = &name[..split];
            if let Some(value) = self.get(prefix) {
                return format!("{}{}", format(prefix, value), &name[split..]);
            }
        }
        format!("${}", name)
    }
}

fn format_value(_name: &str, value: &str) -> String {
    value.to_string()
}

fn format_expansion(name: &str, value: &str) -> String {
    if is_exception_failure(value) {
        format!("${}->[{}]", name, value)
    } else {
        format!("${}->[{}]", name, escape(value))
    }
}
