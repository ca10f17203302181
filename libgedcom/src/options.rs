//! Load and write configuration.

/// Settings for a single load.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Name used in fatal error messages.
    pub filename: Option<String>,
    /// Reject unrecognized standard tags (as errors) instead of keeping them
    /// as custom tags.
    pub strict_custom_tags: bool,
    /// Abort on a line without a level instead of treating it as a
    /// continuation of the previous line.
    pub strict_line_breaks: bool,
    /// Lines (while reading) or records (while loading) between progress
    /// events.
    pub notification_rate: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            filename: None,
            strict_custom_tags: true,
            strict_line_breaks: true,
            notification_rate: 500,
        }
    }
}

impl LoadOptions {
    pub fn with_filename(mut self, filename: &str) -> Self {
        self.filename = Some(filename.to_string());
        self
    }

    pub fn with_strict_custom_tags(mut self, strict: bool) -> Self {
        self.strict_custom_tags = strict;
        self
    }

    pub fn with_strict_line_breaks(mut self, strict: bool) -> Self {
        self.strict_line_breaks = strict;
        self
    }

    pub fn with_notification_rate(mut self, rate: usize) -> Self {
        self.notification_rate = rate;
        self
    }
}

/// Line terminator written after every output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    #[default]
    CrLf,
    Lf,
    Cr,
    LfCr,
}

impl LineTerminator {
    pub fn as_str(self) -> &'static str {
        match self {
            LineTerminator::CrLf => "\r\n",
            LineTerminator::Lf => "\n",
            LineTerminator::Cr => "\r",
            LineTerminator::LfCr => "\n\r",
        }
    }
}

/// Settings for [`GedcomWriter`](crate::GedcomWriter).
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub line_terminator: LineTerminator,
    /// Run validation first and refuse to write if it reports errors.
    pub validate: bool,
    /// Longest value written on one line before splitting with CONC.
    pub max_line_length: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            line_terminator: LineTerminator::CrLf,
            validate: true,
            max_line_length: 128,
        }
    }
}

impl WriterOptions {
    pub fn with_line_terminator(mut self, terminator: LineTerminator) -> Self {
        self.line_terminator = terminator;
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_defaults() {
        let opts = LoadOptions::default();
        assert!(opts.strict_custom_tags);
        assert!(opts.strict_line_breaks);
        assert_eq!(opts.notification_rate, 500);
        assert!(opts.filename.is_none());
    }

    #[test]
    fn test_terminators() {
        assert_eq!(LineTerminator::default().as_str(), "\r\n");
        assert_eq!(LineTerminator::LfCr.as_str(), "\n\r");
    }
}
