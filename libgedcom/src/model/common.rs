//! Substructures shared by many record kinds.

use super::{has_custom_tags, CustomTag, HasCustomTags, MultimediaLink, TaggedValue};

/// A postal address. `lines` holds the free-form ADDR text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    pub lines: Vec<String>,
    pub line1: Option<TaggedValue>,
    pub line2: Option<TaggedValue>,
    /// 5.5.1 only.
    pub line3: Option<TaggedValue>,
    pub city: Option<TaggedValue>,
    pub state_province: Option<TaggedValue>,
    pub postal_code: Option<TaggedValue>,
    pub country: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

/// Address and the contact fields that travel with it.
///
/// Web, fax and email fields exist only in 5.5.1.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContactInfo {
    pub address: Option<Address>,
    pub phone_numbers: Vec<TaggedValue>,
    pub www_urls: Vec<TaggedValue>,
    pub fax_numbers: Vec<TaggedValue>,
    pub emails: Vec<TaggedValue>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.phone_numbers.is_empty()
            && !self.has_551_fields()
    }

    /// Whether any web, fax or email field is present.
    pub fn has_551_fields(&self) -> bool {
        !self.www_urls.is_empty() || !self.fax_numbers.is_empty() || !self.emails.is_empty()
    }
}

/// When a record was last changed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeDate {
    pub date: Option<TaggedValue>,
    pub time: Option<TaggedValue>,
    pub notes: Vec<NoteStructure>,
    pub custom_tags: Vec<CustomTag>,
}

/// A user-assigned reference number (REFN) with its optional TYPE.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserReference {
    pub reference_num: Option<TaggedValue>,
    pub kind: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

/// A note record, or the body of an inline note.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Note {
    pub xref: Option<String>,
    pub lines: Vec<String>,
    pub citations: Vec<Citation>,
    pub user_references: Vec<UserReference>,
    pub rec_id_number: Option<TaggedValue>,
    pub change_date: Option<ChangeDate>,
    pub custom_tags: Vec<CustomTag>,
}

impl Note {
    pub fn new(xref: &str) -> Self {
        Self {
            xref: Some(xref.to_string()),
            ..Self::default()
        }
    }
}

/// A note attached to some structure: a pointer to a shared note record,
/// or text held in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteStructure {
    Reference {
        xref: String,
        custom_tags: Vec<CustomTag>,
    },
    Inline(Note),
}

impl NoteStructure {
    pub fn reference(xref: &str) -> Self {
        NoteStructure::Reference {
            xref: xref.to_string(),
            custom_tags: Vec::new(),
        }
    }

    pub fn inline(lines: &[&str]) -> Self {
        NoteStructure::Inline(Note {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            ..Note::default()
        })
    }

    /// The referenced note record, if this is a pointer.
    pub fn xref(&self) -> Option<&str> {
        match self {
            NoteStructure::Reference { xref, .. } => Some(xref),
            NoteStructure::Inline(_) => None,
        }
    }
}

impl HasCustomTags for NoteStructure {
    fn custom_tags(&self) -> &[CustomTag] {
        match self {
            NoteStructure::Reference { custom_tags, .. } => custom_tags,
            NoteStructure::Inline(note) => &note.custom_tags,
        }
    }

    fn custom_tags_mut(&mut self) -> &mut Vec<CustomTag> {
        match self {
            NoteStructure::Reference { custom_tags, .. } => custom_tags,
            NoteStructure::Inline(note) => &mut note.custom_tags,
        }
    }
}

/// Source citation pointing at a source record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CitationWithSource {
    pub source: String,
    /// PAGE
    pub where_in_source: Option<TaggedValue>,
    /// EVEN
    pub event_cited: Option<TaggedValue>,
    /// EVEN.ROLE
    pub role_in_event: Option<TaggedValue>,
    pub data: Vec<CitationData>,
    /// QUAY, 0 to 3.
    pub certainty: Option<TaggedValue>,
    pub notes: Vec<NoteStructure>,
    pub multimedia: Vec<MultimediaLink>,
    pub custom_tags: Vec<CustomTag>,
}

/// DATA block of a citation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CitationData {
    pub entry_date: Option<TaggedValue>,
    /// One entry per TEXT tag, each with its own lines.
    pub source_text: Vec<Vec<String>>,
    pub custom_tags: Vec<CustomTag>,
}

/// Source citation that describes the source in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CitationWithoutSource {
    pub description: Vec<String>,
    pub text_from_source: Vec<Vec<String>>,
    pub notes: Vec<NoteStructure>,
    pub custom_tags: Vec<CustomTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    WithSource(CitationWithSource),
    WithoutSource(CitationWithoutSource),
}

impl Citation {
    pub fn to_source(xref: &str) -> Self {
        Citation::WithSource(CitationWithSource {
            source: xref.to_string(),
            ..CitationWithSource::default()
        })
    }

    pub fn source_xref(&self) -> Option<&str> {
        match self {
            Citation::WithSource(c) => Some(&c.source),
            Citation::WithoutSource(_) => None,
        }
    }

    pub fn notes(&self) -> &[NoteStructure] {
        match self {
            Citation::WithSource(c) => &c.notes,
            Citation::WithoutSource(c) => &c.notes,
        }
    }
}

impl HasCustomTags for Citation {
    fn custom_tags(&self) -> &[CustomTag] {
        match self {
            Citation::WithSource(c) => &c.custom_tags,
            Citation::WithoutSource(c) => &c.custom_tags,
        }
    }

    fn custom_tags_mut(&mut self) -> &mut Vec<CustomTag> {
        match self {
            Citation::WithSource(c) => &mut c.custom_tags,
            Citation::WithoutSource(c) => &mut c.custom_tags,
        }
    }
}

/// Romanized or phonetic form of a place name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NameVariation {
    pub variation: Option<String>,
    pub variation_type: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

/// A place reference on an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Place {
    pub name: Option<String>,
    pub form: Option<TaggedValue>,
    pub citations: Vec<Citation>,
    pub notes: Vec<NoteStructure>,
    /// ROMN, 5.5.1 only.
    pub romanized: Vec<NameVariation>,
    /// FONE, 5.5.1 only.
    pub phonetic: Vec<NameVariation>,
    /// MAP.LATI, 5.5.1 only.
    pub latitude: Option<TaggedValue>,
    /// MAP.LONG, 5.5.1 only.
    pub longitude: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

impl Place {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn has_551_fields(&self) -> bool {
        !self.romanized.is_empty()
            || !self.phonetic.is_empty()
            || self.latitude.is_some()
            || self.longitude.is_some()
    }
}

has_custom_tags!(
    Address,
    ChangeDate,
    UserReference,
    Note,
    CitationWithSource,
    CitationData,
    CitationWithoutSource,
    NameVariation,
    Place,
);
