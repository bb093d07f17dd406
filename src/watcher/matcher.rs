//! Case folder name matching.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{Error, Result};

/// Default case folder shape: `F-YYYY-NNN` or one word character plus three
/// digits (`A123`).
pub const DEFAULT_CASE_PATTERN: &str = r"F-[0-9]{4}-[0-9]{3}|[0-9A-Za-z_][0-9]{3}";

static DEFAULT_MATCHER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&anchored(DEFAULT_CASE_PATTERN)).expect("default case pattern is valid")
});

fn anchored(pattern: &str) -> String {
    format!("^(?:{pattern})$")
}

/// Predicate over folder base names.
///
/// Patterns always match the whole name. Matching is case-sensitive and the
/// name is not trimmed.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
}

impl PathMatcher {
    /// Build a matcher from a custom pattern.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&anchored(pattern))
            .map_err(|e| Error::config(format!("invalid case pattern '{pattern}': {e}")))?;
        Ok(Self { regex })
    }

    /// Does `name` look like a case folder.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self {
            regex: DEFAULT_MATCHER.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_long_form() {
        let matcher = PathMatcher::default();
        assert!(matcher.matches("F-2025-001"));
        assert!(matcher.matches("F-1999-999"));
    }

    #[test]
    fn test_accepts_short_form() {
        let matcher = PathMatcher::default();
        for name in ["A123", "z000", "7001", "_123"] {
            assert!(matcher.matches(name), "{name} should match");
        }
    }

    #[test]
    fn test_rejects_other_shapes() {
        let matcher = PathMatcher::default();
        for name in [
            "",
            "randomdir",
            "f-2025-001",
            "F-25-001",
            "F-2025-01",
            "F-2025-0001",
            "F-2025-001x",
            " F-2025-001",
            "F-2025-001 ",
            "A12",
            "A1234",
            "AB123",
            "-123",
            "A12b",
            "F_2025_001",
        ] {
            assert!(!matcher.matches(name), "{name:?} should not match");
        }
    }

    #[test]
    fn test_rejects_non_ascii_digits() {
        let matcher = PathMatcher::default();
        // Thai digits
        assert!(!matcher.matches("A๑๒๓"));
    }

    #[test]
    fn test_custom_pattern_is_anchored() {
        let matcher = PathMatcher::new("CASE-[0-9]+").unwrap();
        assert!(matcher.matches("CASE-42"));
        assert!(!matcher.matches("old-CASE-42"));
        assert!(!matcher.matches("CASE-42-draft"));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = PathMatcher::new("F-(").unwrap_err();
        assert!(err.to_string().contains("invalid case pattern"));
    }
}
