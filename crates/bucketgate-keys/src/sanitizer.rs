//! Filename and path sanitization for storage keys
//!
//! Guards object keys against path traversal and characters that are unsafe
//! in URLs or on backends that map keys onto a filesystem.
//!
//! The transform runs in a fixed order:
//!
//! 1. every character outside the policy's allow-list becomes `_`
//! 2. every non-overlapping `..` (scanned left to right) becomes `_`
//! 3. the result is truncated to `max_length` characters
//!
//! Step 1 never introduces a `.`, and step 2 replaces each pair with a
//! character that is not a dot, so a single pass of step 2 leaves no `..`
//! behind. Truncation only removes a suffix. The output therefore satisfies
//! the allow-list, contains no `..`, and is a fixed point of the transform.

use crate::{KeyError, KeyResult};
use serde::Serialize;
use std::fmt;

/// Maximum key length (in characters) used when no policy overrides it
pub const DEFAULT_MAX_KEY_LENGTH: usize = 200;

/// Character substituted for anything outside the allow-list
pub const REPLACEMENT_CHAR: char = '_';

const TRAVERSAL: &str = "..";
const TRAVERSAL_REPLACEMENT: &str = "_";

/// Allow-list and length limit applied by [`sanitize`]
///
/// The base allow-list is ASCII alphanumerics plus `_`, `-` and `.`.
/// Parentheses and square brackets are allowed unless `allow_brackets` is
/// off; `/` is allowed only when `allow_separator` is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizePolicy {
    /// Permit `/` so a key may span sub-folders
    pub allow_separator: bool,
    /// Permit `(`, `)`, `[` and `]`
    pub allow_brackets: bool,
    /// Maximum number of characters kept
    pub max_length: usize,
}

impl SanitizePolicy {
    /// Policy with the default allow-list (brackets on)
    pub const fn new(allow_separator: bool, max_length: usize) -> Self {
        Self {
            allow_separator,
            allow_brackets: true,
            max_length,
        }
    }

    /// Policy for a single file name: no separator
    pub const fn file_name() -> Self {
        Self::new(false, DEFAULT_MAX_KEY_LENGTH)
    }

    /// Policy for a sub-folder prefix: separator allowed
    pub const fn folder() -> Self {
        Self::new(true, DEFAULT_MAX_KEY_LENGTH)
    }

    #[must_use]
    pub const fn with_brackets(mut self, allow_brackets: bool) -> Self {
        self.allow_brackets = allow_brackets;
        self
    }

    #[must_use]
    pub const fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    /// Whether `c` survives step 1 unchanged
    pub const fn allows(&self, c: char) -> bool {
        match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '-' | '.' => true,
            '(' | ')' | '[' | ']' => self.allow_brackets,
            '/' => self.allow_separator,
            _ => false,
        }
    }
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self::file_name()
    }
}

/// A key that has been through [`sanitize`]
///
/// Only the sanitizer constructs these, so holding one is proof the string
/// satisfies the policy it was produced under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SanitizedKey(String);

impl SanitizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Length in characters (keys are ASCII, so this equals the byte length)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SanitizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SanitizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Sanitize an untrusted name into a storage key
///
/// Total over all input text: no character causes a failure. The only error
/// is an empty result, which happens for an empty `candidate` or a policy
/// with `max_length == 0`.
///
/// # Errors
///
/// Returns [`KeyError::InvalidKey`] if nothing is left after sanitization.
pub fn sanitize(candidate: &str, policy: &SanitizePolicy) -> KeyResult<SanitizedKey> {
    let mapped: String = candidate
        .chars()
        .map(|c| if policy.allows(c) { c } else { REPLACEMENT_CHAR })
        .collect();

    let collapsed = mapped.replace(TRAVERSAL, TRAVERSAL_REPLACEMENT);

    let truncated: String = collapsed.chars().take(policy.max_length).collect();

    if truncated.is_empty() {
        return Err(KeyError::InvalidKey {
            candidate_chars: candidate.chars().count(),
            max_length: policy.max_length,
        });
    }

    Ok(SanitizedKey(truncated))
}

/// Positional form of [`sanitize`] using the default bracket allow-list
///
/// # Errors
///
/// Returns [`KeyError::InvalidKey`] if nothing is left after sanitization.
pub fn sanitize_with(
    candidate: &str,
    allow_separator: bool,
    max_length: usize,
) -> KeyResult<SanitizedKey> {
    sanitize(candidate, &SanitizePolicy::new(allow_separator, max_length))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(candidate: &str) -> String {
        sanitize(candidate, &SanitizePolicy::file_name())
            .unwrap()
            .into_inner()
    }

    #[test]
    fn test_traversal_without_separator() {
        // "/" -> "_" first gives ".._.._etc_passwd", then each ".." -> "_"
        assert_eq!(file("../../etc/passwd"), "____etc_passwd");
    }

    #[test]
    fn test_traversal_with_separator() {
        let key = sanitize("../../etc/passwd", &SanitizePolicy::folder()).unwrap();
        assert_eq!(key.as_str(), "_/_/etc/passwd");
    }

    #[test]
    fn test_spaces_replaced_and_parens_kept() {
        assert_eq!(file("my photo (1).JPG"), "my_photo_(1).JPG");
    }

    #[test]
    fn test_brackets_can_be_disabled() {
        let policy = SanitizePolicy::file_name().with_brackets(false);
        let key = sanitize("scan [draft] (2).pdf", &policy).unwrap();
        assert_eq!(key.as_str(), "scan__draft___2_.pdf");
    }

    #[test]
    fn test_fallback_name_passes_through() {
        assert_eq!(file("upload-1700000000000"), "upload-1700000000000");
    }

    #[test]
    fn test_truncates_to_max_length() {
        let long = "a".repeat(250);
        assert_eq!(file(&long), "a".repeat(200));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        // each "é" is two bytes but one character, and maps to one "_"
        let policy = SanitizePolicy::file_name().with_max_length(3);
        let key = sanitize("ééééé", &policy).unwrap();
        assert_eq!(key.as_str(), "___");
    }

    #[test]
    fn test_double_dots_collapse() {
        assert_eq!(file("a..b..c"), "a_b_c");
    }

    #[test]
    fn test_odd_dot_runs() {
        assert_eq!(file("..."), "_.");
        assert_eq!(file("...."), "__");
        assert_eq!(file("a...b"), "a_.b");
    }

    #[test]
    fn test_unicode_and_control_characters() {
        assert_eq!(file("фото\u{0}.png"), "_____.png");
        assert_eq!(file("📷 shot.jpg"), "__shot.jpg");
        assert_eq!(file("a\\b:c"), "a_b_c");
    }

    #[test]
    fn test_empty_candidate_is_invalid() {
        let result = sanitize("", &SanitizePolicy::file_name());
        assert_eq!(
            result,
            Err(KeyError::InvalidKey {
                candidate_chars: 0,
                max_length: DEFAULT_MAX_KEY_LENGTH,
            })
        );
    }

    #[test]
    fn test_zero_max_length_is_invalid() {
        let result = sanitize_with("photo.png", false, 0);
        assert!(matches!(result, Err(KeyError::InvalidKey { .. })));
    }

    #[test]
    fn test_sanitize_with_matches_policy_form() {
        let positional = sanitize_with("a/b c", true, 200).unwrap();
        let policy = sanitize("a/b c", &SanitizePolicy::folder()).unwrap();
        assert_eq!(positional, policy);
        assert_eq!(positional.as_str(), "a/b_c");
    }

    #[test]
    fn test_allows_matches_documented_allow_list() {
        let policy = SanitizePolicy::file_name();
        for c in ['A', 'z', '7', '_', '-', '.', '(', ')', '[', ']'] {
            assert!(policy.allows(c), "{c} should be allowed");
        }
        for c in ['/', ' ', '\\', '%', '?', '#', '~', '\u{e9}'] {
            assert!(!policy.allows(c), "{c} should be rejected");
        }
        assert!(SanitizePolicy::folder().allows('/'));
    }
}
