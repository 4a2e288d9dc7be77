//! Utility macros and functions for the view crate.
//!
//! This module provides helper macros and functions that are used internally
//! by the view location and rendering implementation.

/// A macro for early returns with an error if a condition is not met.
///
/// This is similar to the `assert!` macro, but returns an error instead of panicking.
/// It's used for argument validation where a programmer error must surface
/// to the caller instead of being swallowed.
///
/// # Arguments
///
/// * `$predicate` - A boolean expression that should evaluate to true
/// * `$error` - The error value to return if the predicate is false
///
/// # Example
///
/// ```ignore
/// ensure!(!view_name.is_empty(), ViewError::invalid_argument("view name is empty"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;

/// Encodes the characters that are significant in HTML markup.
pub fn html_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len() + input.len() / 8);
    for c in input.chars() {
        match c {
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            '\'' => encoded.push_str("&#39;"),
            c => encoded.push(c),
        }
    }
    encoded
}

/// Returns the extension of the last path segment of a view name, without the dot.
///
/// `"views/home/index.html"` yields `Some("html")`, `"views/home/index"` and
/// `"views/.hidden"` yield `None`.
pub(crate) fn view_name_extension(view_name: &str) -> Option<&str> {
    let file_name = view_name.rsplit('/').next().unwrap_or(view_name);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(index) if index + 1 == file_name.len() => None,
        Some(index) => Some(&file_name[index + 1..]),
    }
}

/// Compares an extension against a set case-insensitively, ignoring leading dots.
pub(crate) fn contains_extension<S: AsRef<str>>(extensions: &[S], extension: &str) -> bool {
    let extension = extension.trim_start_matches('.');
    extensions.iter().any(|candidate| candidate.as_ref().trim_start_matches('.').eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_encode() {
        assert_eq!(html_encode("<b>"), "&lt;b&gt;");
        assert_eq!(html_encode("a & \"b\" 'c'"), "a &amp; &quot;b&quot; &#39;c&#39;");
        assert_eq!(html_encode("plain"), "plain");
    }

    #[test]
    fn test_view_name_extension() {
        assert_eq!(view_name_extension("index.html"), Some("html"));
        assert_eq!(view_name_extension("views/home/index.HTML"), Some("HTML"));
        assert_eq!(view_name_extension("views/home.d/index"), None);
        assert_eq!(view_name_extension("views/.hidden"), None);
        assert_eq!(view_name_extension("index."), None);
    }

    #[test]
    fn test_contains_extension() {
        let extensions = vec!["sshtml".to_string(), ".html".to_string()];
        assert!(contains_extension(&extensions, "HTML"));
        assert!(contains_extension(&extensions, ".sshtml"));
        assert!(!contains_extension(&extensions, "htm"));
    }
}
