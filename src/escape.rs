//! Minimal entity escaping for judgment rendering.
//!
//! Rendered judgments embed returned values in table cells, so the three
//! characters that can corrupt cell markup (`&`, `<`, `>`) are escaped on the
//! way in and unescaped when expected cell text is read back for comparison.
//! Full wiki-grade escaping belongs to the page layer, not this crate.

/// Escapes `&`, `<`, and `>` as HTML entities.
///
/// The ampersand must be replaced first; otherwise the entities introduced
/// for `<` and `>` would themselves be escaped.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Reverses [`escape`].
///
/// `&amp;` must be replaced last so a literal `&amp;lt;` round-trips to
/// `&lt;` rather than collapsing all the way to `<`.
pub fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
