//! Diagnostics Sink: warnings and recoverable errors collected during a load.

use std::fmt;

/// A single human-readable diagnostic with its source line, if known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: Option<usize>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Line {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Ordered warnings and errors from one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record data that loaded but is inconsistent or not writable as-is.
    pub fn warn(&mut self, line: Option<usize>, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(line, "warning: {}", message);
        self.warnings.push(Diagnostic { line, message });
    }

    /// Record data that could not be loaded as intended.
    pub fn error(&mut self, line: Option<usize>, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(line, "error: {}", message);
        self.errors.push(Diagnostic { line, message });
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    /// Warning texts, each prefixed with its line number.
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }

    /// Error texts, each prefixed with its line number.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_line_prefix() {
        let mut d = Diagnostics::new();
        d.warn(Some(12), "careful");
        d.error(None, "broken");
        assert_eq!(d.warning_messages(), vec!["Line 12: careful"]);
        assert_eq!(d.error_messages(), vec!["broken"]);
        assert!(d.has_errors());
        assert!(!d.is_clean());
    }
}
