//! Error types for GEDCOM loading and writing.
//!
//! Only failures that stop an operation live here. Problems with the data
//! that a load can recover from are collected in
//! [`Diagnostics`](crate::Diagnostics) instead.

use thiserror::Error;

/// Result type for GEDCOM operations.
pub type Result<T> = std::result::Result<T, GedcomError>;

/// Load context carrying the filename for error reporting.
#[derive(Clone, Debug, Default)]
pub struct LoadContext {
    pub filename: Option<String>,
}

impl LoadContext {
    /// Create a new load context.
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Format a location suffix for error messages.
    pub fn loc_suffix(&self, line: usize) -> String {
        match &self.filename {
            Some(name) => format!(" at line {} of <{}>", line, name),
            None => format!(" at line {}", line),
        }
    }
}

/// Phase of a load, reported with progress events and cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Lines are being read into the generic tree.
    Reading,
    /// Root-level records are being interpreted.
    Loading,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Reading => f.write_str("reading"),
            Phase::Loading => f.write_str("loading"),
        }
    }
}

/// Error type for GEDCOM operations.
#[derive(Error, Debug)]
pub enum GedcomError {
    /// Line does not start with a one or two digit level and a space.
    #[error("Line does not begin with a level number: \"{text}\"{loc}")]
    MalformedLevel { text: String, loc: String },

    /// Cross-reference id starts with `@` but does not end with one.
    #[error("Malformed cross-reference id \"{xref}\"{loc}")]
    MalformedXref { xref: String, loc: String },

    /// Level and id present but no tag.
    #[error("Line has no tag: \"{text}\"{loc}")]
    MissingTag { text: String, loc: String },

    /// An observer asked for the load to stop.
    #[error("Load cancelled while {phase} after {count} items")]
    Cancelled { phase: Phase, count: usize },

    /// Underlying stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The API was called with arguments it cannot accept.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Validation found errors, so the document was not written.
    #[error("Cannot write file - validation produced {errors} error(s)")]
    ValidationFailed { errors: usize },

    /// The document holds data its declared version cannot express.
    #[error("{0}")]
    VersionMismatch(String),
}

impl GedcomError {
    /// Fatal error for a line without a usable level.
    pub fn malformed_level(ctx: &LoadContext, line: usize, text: &str) -> Self {
        GedcomError::MalformedLevel {
            text: text.to_string(),
            loc: ctx.loc_suffix(line),
        }
    }

    /// Fatal error for an id token that is not closed by `@`.
    pub fn malformed_xref(ctx: &LoadContext, line: usize, xref: &str) -> Self {
        GedcomError::MalformedXref {
            xref: xref.to_string(),
            loc: ctx.loc_suffix(line),
        }
    }

    /// Fatal error for a line that stops before its tag.
    pub fn missing_tag(ctx: &LoadContext, line: usize, text: &str) -> Self {
        GedcomError::MissingTag {
            text: text.to_string(),
            loc: ctx.loc_suffix(line),
        }
    }

    /// Returns `true` if this error is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GedcomError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loc_suffix_with_filename() {
        let ctx = LoadContext::new(Some("family.ged"));
        assert_eq!(ctx.loc_suffix(7), " at line 7 of <family.ged>");
    }

    #[test]
    fn test_malformed_level_message() {
        let ctx = LoadContext::new(None);
        let err = GedcomError::malformed_level(&ctx, 3, "X NAME Bob");
        assert_eq!(
            err.to_string(),
            "Line does not begin with a level number: \"X NAME Bob\" at line 3"
        );
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        let err = GedcomError::Cancelled {
            phase: Phase::Loading,
            count: 500,
        };
        assert!(err.is_cancelled());
        assert!(!GedcomError::InvalidArgument("x".into()).is_cancelled());
        assert_eq!(err.to_string(), "Load cancelled while loading after 500 items");
    }
}
