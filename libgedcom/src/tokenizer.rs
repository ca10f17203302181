//! Phase 1: Line Tokenizer
//!
//! Splits one logical line into its positional fields:
//!
//! ```text
//! LEVEL " " ["@" ID "@" " "] TAG [" " VALUE]
//! ```
//!
//! The level is one or two decimal digits. The value is everything after the
//! single space that follows the tag, kept verbatim (it may be empty).

use crate::error::{GedcomError, LoadContext, Result};

/// The fields of one tokenized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinePieces {
    pub level: usize,
    /// Cross-reference id, delimiters included.
    pub xref: Option<String>,
    pub tag: String,
    pub value: Option<String>,
}

/// Returns `true` if the line starts with a level number and a space.
pub fn begins_with_level(text: &str) -> bool {
    level_prefix(text.trim_start().as_bytes()).is_some()
}

/// Length of the level digits, if the line starts with a valid level.
fn level_prefix(bytes: &[u8]) -> Option<usize> {
    match bytes {
        [a, b, b' ', ..] if a.is_ascii_digit() && b.is_ascii_digit() => Some(2),
        [a, b' ', ..] if a.is_ascii_digit() => Some(1),
        _ => None,
    }
}

/// Tokenize one line. `line` is the 1-based line number used in errors.
pub fn tokenize(text: &str, line: usize, ctx: &LoadContext) -> Result<LinePieces> {
    let text = text.trim_start();
    let digits =
        level_prefix(text.as_bytes()).ok_or_else(|| GedcomError::malformed_level(ctx, line, text))?;
    let level = text[..digits]
        .parse::<usize>()
        .map_err(|_| GedcomError::malformed_level(ctx, line, text))?;
    let mut rest = &text[digits + 1..];

    let mut xref = None;
    if rest.starts_with('@') {
        let (token, after) = match rest.find(' ') {
            Some(sp) => (&rest[..sp], &rest[sp + 1..]),
            None => (rest, ""),
        };
        if token.len() < 2 || !token.ends_with('@') {
            return Err(GedcomError::malformed_xref(ctx, line, token));
        }
        xref = Some(token.to_string());
        rest = after;
    }

    let (tag, value) = match rest.find(' ') {
        Some(sp) => (&rest[..sp], Some(rest[sp + 1..].to_string())),
        None => (rest, None),
    };
    if tag.is_empty() {
        return Err(GedcomError::missing_tag(ctx, line, text));
    }

    Ok(LinePieces {
        level,
        xref,
        tag: tag.to_string(),
        value,
    })
}

/// Returns `true` if `value` is exactly one cross-reference token.
///
/// This is the single test the loader uses to tell a pointer to another
/// record from inline text.
pub fn is_xref(value: &str) -> bool {
    value.len() >= 3
        && value.starts_with('@')
        && value.ends_with('@')
        && !value[1..value.len() - 1].contains(&['@', ' '][..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(text: &str) -> Result<LinePieces> {
        tokenize(text, 1, &LoadContext::default())
    }

    #[test]
    fn test_full_line() {
        let p = tok("0 @I1@ INDI").unwrap();
        assert_eq!(p.level, 0);
        assert_eq!(p.xref.as_deref(), Some("@I1@"));
        assert_eq!(p.tag, "INDI");
        assert_eq!(p.value, None);
    }

    #[test]
    fn test_value_is_verbatim() {
        let p = tok("1 NAME John  /Doe/ ").unwrap();
        assert_eq!(p.value.as_deref(), Some("John  /Doe/ "));
    }

    #[test]
    fn test_trailing_space_gives_empty_value() {
        let p = tok("12 CONT ").unwrap();
        assert_eq!(p.level, 12);
        assert_eq!(p.value.as_deref(), Some(""));
    }

    #[test]
    fn test_leading_whitespace_is_ignored() {
        let p = tok("   2 DATE 1 JAN 1900").unwrap();
        assert_eq!(p.level, 2);
        assert_eq!(p.tag, "DATE");
    }

    #[test]
    fn test_pointer_value_is_not_an_xref() {
        let p = tok("1 HUSB @I1@").unwrap();
        assert_eq!(p.xref, None);
        assert_eq!(p.value.as_deref(), Some("@I1@"));
    }

    #[test]
    fn test_bad_level_is_fatal() {
        assert!(matches!(
            tok("X HEAD"),
            Err(GedcomError::MalformedLevel { .. })
        ));
        assert!(matches!(
            tok("100 HEAD"),
            Err(GedcomError::MalformedLevel { .. })
        ));
        assert!(matches!(tok("0HEAD"), Err(GedcomError::MalformedLevel { .. })));
    }

    #[test]
    fn test_unterminated_xref_is_fatal() {
        assert!(matches!(
            tok("0 @I1 INDI"),
            Err(GedcomError::MalformedXref { .. })
        ));
    }

    #[test]
    fn test_missing_tag_is_fatal() {
        assert!(matches!(tok("0 @I1@"), Err(GedcomError::MissingTag { .. })));
        assert!(matches!(tok("1 "), Err(GedcomError::MissingTag { .. })));
    }

    #[test]
    fn test_begins_with_level() {
        assert!(begins_with_level("1 CONT x"));
        assert!(begins_with_level("  01 CONT x"));
        assert!(!begins_with_level("continued text"));
    }

    #[test]
    fn test_is_xref() {
        assert!(is_xref("@I1@"));
        assert!(!is_xref("@@"));
        assert!(!is_xref("@I 1@"));
        assert!(!is_xref("see @I1@"));
        assert!(!is_xref("@I1"));
    }
}
