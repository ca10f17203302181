//! Typed record graph.
//!
//! Records live in per-kind maps owned by [`Gedcom`], keyed by xref. Links
//! between records (family to spouse, individual to family, citation to
//! source, ...) are stored as xref strings and resolved through the
//! document, so the Individual/Family cycle never becomes an ownership cycle.

use indexmap::{IndexMap, IndexSet};

use crate::dialect::SupportedVersion;

/// A tag the loader did not interpret, kept verbatim with its subtree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomTag {
    pub tag: String,
    pub xref: Option<String>,
    pub value: Option<String>,
    pub children: Vec<CustomTag>,
}

impl CustomTag {
    pub fn new(tag: &str, value: Option<&str>) -> Self {
        Self {
            tag: tag.to_string(),
            value: value.map(String::from),
            ..Self::default()
        }
    }

    /// User-defined tags start with an underscore.
    pub fn is_user_defined(&self) -> bool {
        self.tag.starts_with('_')
    }
}

/// Access to the custom tags every model type carries.
pub trait HasCustomTags {
    fn custom_tags(&self) -> &[CustomTag];
    fn custom_tags_mut(&mut self) -> &mut Vec<CustomTag>;
}

macro_rules! has_custom_tags {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::model::HasCustomTags for $ty {
                fn custom_tags(&self) -> &[$crate::model::CustomTag] {
                    &self.custom_tags
                }
                fn custom_tags_mut(&mut self) -> &mut Vec<$crate::model::CustomTag> {
                    &mut self.custom_tags
                }
            }
        )*
    };
}
pub(crate) use has_custom_tags;

/// Declares a tag-keyed enum with `tag()` and `from_tag()`.
macro_rules! tag_enum {
    ($(#[$meta:meta])* $name:ident { $($(#[$vmeta:meta])* $variant:ident => $tag:literal),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn tag(self) -> &'static str {
                match self {
                    $($name::$variant => $tag),*
                }
            }

            pub fn from_tag(tag: &str) -> Option<Self> {
                match tag {
                    $($tag => Some($name::$variant),)*
                    _ => None,
                }
            }
        }
    };
}
pub(crate) use tag_enum;

mod common;
mod event;
mod family;
mod header;
mod individual;
mod media;
mod source;

pub use common::{
    Address, ChangeDate, Citation, CitationData, CitationWithSource, CitationWithoutSource,
    ContactInfo, NameVariation, Note, NoteStructure, Place, UserReference,
};
pub use event::{
    EventDetail, FamilyEvent, FamilyEventType, IndividualAttribute, IndividualAttributeType,
    IndividualEvent, IndividualEventType, LdsOrdinance, LdsOrdinanceType,
};
pub use family::Family;
pub use header::{
    CharacterSetDecl, Corporation, GedcomVersion, Header, HeaderSourceData, SourceSystem,
    Submission, Submitter, Trailer,
};
pub use individual::{
    Association, FamilyChild, FamilySpouse, Individual, PersonalName, PersonalNameVariation,
};
pub use media::{FileReference, Multimedia, MultimediaLink};
pub use source::{CallNumber, EventRecorded, Repository, RepositoryCitation, Source, SourceData};

/// A line value together with any custom tags found beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaggedValue {
    pub value: Option<String>,
    pub custom_tags: Vec<CustomTag>,
}

impl TaggedValue {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            custom_tags: Vec::new(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Missing, empty, or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.value.as_deref().map_or(true, |v| v.trim().is_empty())
    }
}

impl From<&str> for TaggedValue {
    fn from(value: &str) -> Self {
        TaggedValue::new(value)
    }
}

has_custom_tags!(TaggedValue);

tag_enum! {
    /// Kinds of top-level records that are addressed by xref.
    RecordKind {
        Individual => "INDI",
        Family => "FAM",
        Source => "SOUR",
        Repository => "REPO",
        Multimedia => "OBJE",
        Note => "NOTE",
        Submitter => "SUBM",
        Submission => "SUBN",
    }
}

/// A typed pointer to a top-level record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordRef {
    pub kind: RecordKind,
    pub xref: String,
}

impl RecordRef {
    pub fn new(kind: RecordKind, xref: &str) -> Self {
        Self {
            kind,
            xref: xref.to_string(),
        }
    }
}

impl std::fmt::Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.tag(), self.xref)
    }
}

/// A whole document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Gedcom {
    pub header: Option<Header>,
    pub submission: Option<Submission>,
    pub individuals: IndexMap<String, Individual>,
    pub families: IndexMap<String, Family>,
    pub sources: IndexMap<String, Source>,
    pub repositories: IndexMap<String, Repository>,
    pub multimedia: IndexMap<String, Multimedia>,
    pub notes: IndexMap<String, Note>,
    pub submitters: IndexMap<String, Submitter>,
    /// Root-level user-defined records.
    pub custom_tags: Vec<CustomTag>,
    pub trailer: Option<Trailer>,
    /// Records created only because something referenced them.
    pub stubs: IndexSet<RecordRef>,
}

impl Gedcom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record of `kind` with this xref exists.
    pub fn contains(&self, kind: RecordKind, xref: &str) -> bool {
        match kind {
            RecordKind::Individual => self.individuals.contains_key(xref),
            RecordKind::Family => self.families.contains_key(xref),
            RecordKind::Source => self.sources.contains_key(xref),
            RecordKind::Repository => self.repositories.contains_key(xref),
            RecordKind::Multimedia => self.multimedia.contains_key(xref),
            RecordKind::Note => self.notes.contains_key(xref),
            RecordKind::Submitter => self.submitters.contains_key(xref),
            RecordKind::Submission => self
                .submission
                .as_ref()
                .and_then(|s| s.xref.as_deref())
                .map_or(false, |x| x == xref),
        }
    }

    /// Whether any top-level record uses this xref.
    pub fn contains_any(&self, xref: &str) -> bool {
        RecordKind::ALL.iter().any(|&kind| self.contains(kind, xref))
    }

    /// Version declared in the header, if recognized.
    pub fn declared_version(&self) -> Option<SupportedVersion> {
        self.header
            .as_ref()?
            .gedcom_version
            .as_ref()?
            .version
            .as_ref()?
            .as_str()
            .and_then(SupportedVersion::parse)
    }

    /// Declared version, defaulting to 5.5.1 when absent.
    pub fn version(&self) -> SupportedVersion {
        self.declared_version().unwrap_or_default()
    }

    pub fn is_stub(&self, kind: RecordKind, xref: &str) -> bool {
        self.stubs.contains(&RecordRef::new(kind, xref))
    }
}

has_custom_tags!(Gedcom);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_value_blank() {
        assert!(TaggedValue::default().is_blank());
        assert!(TaggedValue::new("  ").is_blank());
        assert!(!TaggedValue::from("M").is_blank());
    }

    #[test]
    fn test_record_kind_tags() {
        assert_eq!(RecordKind::from_tag("FAM"), Some(RecordKind::Family));
        assert_eq!(RecordKind::Multimedia.tag(), "OBJE");
        assert_eq!(RecordKind::from_tag("HEAD"), None);
        assert_eq!(RecordKind::ALL.len(), 8);
    }

    #[test]
    fn test_contains_and_version() {
        let mut g = Gedcom::new();
        g.individuals.insert("@I1@".into(), Individual::new("@I1@"));
        assert!(g.contains(RecordKind::Individual, "@I1@"));
        assert!(!g.contains(RecordKind::Family, "@I1@"));
        assert!(g.contains_any("@I1@"));
        assert_eq!(g.version(), SupportedVersion::V5_5_1);

        let mut header = Header::default();
        header.gedcom_version = Some(GedcomVersion {
            version: Some(TaggedValue::new("5.5")),
            ..GedcomVersion::default()
        });
        g.header = Some(header);
        assert_eq!(g.declared_version(), Some(SupportedVersion::V5_5));
    }
}
