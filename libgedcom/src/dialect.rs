//! Version-Dialect Policy.
//!
//! GEDCOM 5.5 and 5.5.1 disagree about which substructures are legal. The
//! loader accepts both everywhere and asks a [`DialectPolicy`] whether to
//! warn about a construct that the declared version does not allow.

use std::fmt;

use crate::diagnostics::Diagnostics;
use crate::tree::StringTree;

/// Format versions the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SupportedVersion {
    V5_5,
    #[default]
    V5_5_1,
}

impl SupportedVersion {
    /// Parse a `GEDC.VERS` value.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "5.5" => Some(SupportedVersion::V5_5),
            "5.5.1" => Some(SupportedVersion::V5_5_1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SupportedVersion::V5_5 => "5.5",
            SupportedVersion::V5_5_1 => "5.5.1",
        }
    }
}

impl fmt::Display for SupportedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Character sets a header may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterSet {
    Ansel,
    Ascii,
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl CharacterSet {
    /// Recognize a `HEAD.CHAR` name. `UNICODE` means UTF-16; the byte order
    /// comes from the file itself, so little-endian is assumed here.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "ANSEL" => Some(CharacterSet::Ansel),
            "ASCII" => Some(CharacterSet::Ascii),
            "UTF-8" | "UTF8" => Some(CharacterSet::Utf8),
            "UNICODE" => Some(CharacterSet::Utf16Le),
            _ => None,
        }
    }

    /// Name as written in a header.
    pub fn name(self) -> &'static str {
        match self {
            CharacterSet::Ansel => "ANSEL",
            CharacterSet::Ascii => "ASCII",
            CharacterSet::Utf8 => "UTF-8",
            CharacterSet::Utf16Le | CharacterSet::Utf16Be => "UNICODE",
        }
    }
}

/// Decides which constructs draw a version warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DialectPolicy {
    version: SupportedVersion,
}

impl DialectPolicy {
    pub fn new(version: SupportedVersion) -> Self {
        Self { version }
    }

    /// Read the declared version from `HEAD.GEDC.VERS` before loading.
    ///
    /// Missing or unrecognized versions fall back to 5.5.1; the header
    /// loader reports the unrecognized case.
    pub fn from_tree(tree: &StringTree) -> Self {
        let version = tree
            .child(tree.root(), "HEAD")
            .and_then(|head| tree.child(head, "GEDC"))
            .and_then(|gedc| tree.child(gedc, "VERS"))
            .and_then(|vers| vers.value.as_deref())
            .and_then(SupportedVersion::parse)
            .unwrap_or_default();
        Self { version }
    }

    pub fn version(&self) -> SupportedVersion {
        self.version
    }

    pub fn is_55(&self) -> bool {
        self.version == SupportedVersion::V5_5
    }

    /// Warn when a 5.5.1-only construct appears in a 5.5 document.
    pub fn only_551(&self, line: usize, feature: &str, diagnostics: &mut Diagnostics) {
        if self.is_55() {
            diagnostics.warn(
                Some(line),
                format!(
                    "GEDCOM version is 5.5 but {} was specified, which is a GEDCOM 5.5.1 \
                     feature. Data loaded but cannot be re-written unless GEDCOM version changes.",
                    feature
                ),
            );
        }
    }

    /// Warn when a construct dropped in 5.5.1 appears in a 5.5.1 document.
    pub fn only_55(&self, line: usize, feature: &str, diagnostics: &mut Diagnostics) {
        if !self.is_55() {
            diagnostics.warn(
                Some(line),
                format!(
                    "GEDCOM version is 5.5.1 but {} was specified, which is only allowed in \
                     GEDCOM 5.5. Data loaded but cannot be re-written unless GEDCOM version changes.",
                    feature
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        assert_eq!(SupportedVersion::parse("5.5"), Some(SupportedVersion::V5_5));
        assert_eq!(SupportedVersion::parse(" 5.5.1"), Some(SupportedVersion::V5_5_1));
        assert_eq!(SupportedVersion::parse("7.0"), None);
        assert_eq!(SupportedVersion::default(), SupportedVersion::V5_5_1);
    }

    #[test]
    fn test_character_set_names() {
        assert_eq!(CharacterSet::from_name("ansel"), Some(CharacterSet::Ansel));
        assert_eq!(CharacterSet::from_name("UTF-8"), Some(CharacterSet::Utf8));
        assert_eq!(CharacterSet::from_name("UNICODE"), Some(CharacterSet::Utf16Le));
        assert_eq!(CharacterSet::from_name("EBCDIC"), None);
        assert_eq!(CharacterSet::Utf16Be.name(), "UNICODE");
    }

    #[test]
    fn test_policy_warns_only_on_mismatch() {
        let mut d = Diagnostics::new();
        let old = DialectPolicy::new(SupportedVersion::V5_5);
        old.only_551(9, "an email address (EMAIL)", &mut d);
        old.only_55(10, "a BLOB", &mut d);
        assert_eq!(d.warnings.len(), 1);
        assert_eq!(d.warnings[0].line, Some(9));
        assert!(d.warnings[0].message.starts_with("GEDCOM version is 5.5 but"));

        let new = DialectPolicy::default();
        new.only_551(11, "x", &mut d);
        new.only_55(12, "a BLOB", &mut d);
        assert_eq!(d.warnings.len(), 2);
        assert_eq!(d.warnings[1].line, Some(12));
    }
}
