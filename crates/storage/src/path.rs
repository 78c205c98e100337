//! Filename sanitization for cache keys.
//!
//! Collection and item names come straight from remote metadata (channel
//! names, video titles) and may contain anything. They are reduced to a
//! single, portable path component before they touch the filesystem.

use crate::error::{ErrorKind, Result};

/// Characters that are reserved on at least one supported filesystem.
pub const FORBIDDEN: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Reduces an arbitrary name to a filesystem-safe path component.
///
/// Every [`FORBIDDEN`] character (and every control character) becomes a
/// space, runs of whitespace collapse into a single space, and the result is
/// trimmed. Sanitizing an already-sanitized string returns it unchanged.
///
/// > **Note:** Different inputs can sanitize to the same output
/// >           (`"a/b"` and `"a:b"` both become `"a b"`).
///
/// # Examples
///
/// ```
/// use pcmcache_storage::sanitize;
/// assert_eq!(sanitize("Some/Channel:Name"), "Some Channel Name");
/// assert_eq!(sanitize("Title? \"Quote\""), "Title Quote");
/// assert_eq!(sanitize("  spaced\t\tout  "), "spaced out");
/// assert_eq!(sanitize(sanitize("a<b>c")), sanitize("a<b>c"));
/// ```
pub fn sanitize(name: impl AsRef<str>) -> String {
    name.as_ref()
        .replace(|c: char| FORBIDDEN.contains(&c) || c.is_control(), " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sanitizes `name` and checks that the result is usable as a single path
/// component inside the cache root.
///
/// Returns [`InvalidKey`](ErrorKind::InvalidKey) when nothing is left after
/// sanitization, or when the result is `.` or `..` (separators are already
/// gone, but those two would still walk the directory tree).
pub(crate) fn component(name: impl AsRef<str>) -> Result<String> {
    let sanitized = sanitize(name.as_ref());
    match sanitized.as_str() {
        "" | "." | ".." => exn::bail!(ErrorKind::InvalidKey(name.as_ref().to_string())),
        _ => Ok(sanitized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Some/Channel:Name", "Some Channel Name")]
    #[case("Title? \"Quote\"", "Title Quote")]
    #[case("back\\slash", "back slash")]
    #[case("a*b<c>d|e", "a b c d e")]
    #[case("  leading and trailing  ", "leading and trailing")]
    #[case("tabs\tand\nnewlines", "tabs and newlines")]
    #[case("null\0byte", "null byte")]
    #[case("???", "")]
    #[case("Ünïcödé — fine", "Ünïcödé — fine")]
    fn test_sanitize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(sanitize(input), expected);
    }

    #[rstest]
    #[case("Some/Channel:Name")]
    #[case("Title? \"Quote\"")]
    #[case(" / : * ? \" < > | ")]
    #[case("already clean")]
    #[case("mixed \u{3000} unicode\u{00a0}spaces")]
    #[case("")]
    fn test_sanitize_is_idempotent(#[case] input: &str) {
        let once = sanitize(input);
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn test_sanitize_removes_every_forbidden_character() {
        let all: String = FORBIDDEN.iter().flat_map(|c| [*c, 'x']).collect();
        let sanitized = sanitize(&all);
        assert!(!sanitized.contains(FORBIDDEN));
        assert_eq!(sanitized, "x x x x x x x x x");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("/:*")]
    #[case(".")]
    #[case("..")]
    #[case(" .. ")]
    fn test_component_rejects_unusable_names(#[case] input: &str) {
        let err = component(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(raw) if raw == input));
    }

    #[test]
    fn test_component_allows_dots_inside_names() {
        assert_eq!(component("../etc/passwd").unwrap(), ".. etc passwd");
        assert_eq!(component("...").unwrap(), "...");
        assert_eq!(component("v1.2").unwrap(), "v1.2");
    }
}
