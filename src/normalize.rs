//! Name normalization ("disgracing").
//!
//! Table authors write fixture and method names as prose: `click Button!`,
//! `my Fixture`. A graceful name is one carrying decoration for human eyes,
//! anything outside `[A-Za-z0-9_]`. Disgracing strips the decoration down to
//! a callable identifier: each run of decoration characters is deleted and
//! the letter after it is capitalized.

/// Normalizes a free-form method name into a callable identifier.
///
/// The first character keeps its original case; a name with no decoration
/// passes through unchanged.
///
/// # Examples
///
/// ```rust
/// use trestle::normalize::disgrace_method_name;
/// assert_eq!(disgrace_method_name("click Button!"), "clickButton");
/// assert_eq!(disgrace_method_name("alreadyCallable"), "alreadyCallable");
/// ```
pub fn disgrace_method_name(name: &str) -> String {
    if is_graceful(name) {
        disgrace(name, false)
    } else {
        name.to_string()
    }
}

/// Normalizes a free-form class name, capitalizing the first letter.
///
/// Two shapes pass through untouched no matter what decoration they carry:
/// qualified names (a `.` anywhere before the final character) and inner
/// types (any `$`). A name with no decoration also passes through.
///
/// # Examples
///
/// ```rust
/// use trestle::normalize::disgrace_class_name;
/// assert_eq!(disgrace_class_name("my Fixture"), "MyFixture");
/// assert_eq!(disgrace_class_name("a.b.C"), "a.b.C");
/// ```
pub fn disgrace_class_name(name: &str) -> String {
    if has_dots_before_end(name) || name.contains('$') {
        return name.to_string();
    }
    if is_graceful(name) {
        disgrace(name, true)
    } else {
        name.to_string()
    }
}

/// True when the name contains at least one decoration character.
fn is_graceful(name: &str) -> bool {
    name.chars().any(is_decoration)
}

fn is_decoration(c: char) -> bool {
    !(c.is_ascii_alphanumeric() || c == '_')
}

/// A trailing dot is decoration, not qualification.
fn has_dots_before_end(name: &str) -> bool {
    match name.find('.') {
        Some(i) => i != name.len() - 1,
        None => false,
    }
}

fn disgrace(name: &str, mut capitalize_next: bool) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        if is_decoration(c) {
            capitalize_next = true;
        } else {
            result.push(if capitalize_next {
                c.to_ascii_uppercase()
            } else {
                c
            });
            capitalize_next = false;
        }
    }
    result
}
