use super::{
    has_custom_tags, ChangeDate, Citation, CustomTag, HasCustomTags, NoteStructure, TaggedValue,
    UserReference,
};

/// A multimedia object, either a record or held inline in a link.
///
/// 5.5 objects carry a format, title and optional embedded BLOB directly;
/// 5.5.1 objects carry one or more file references instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Multimedia {
    pub xref: Option<String>,
    pub file_references: Vec<FileReference>,
    /// FORM, 5.5 records.
    pub embedded_media_format: Option<TaggedValue>,
    /// TITL, 5.5 records and inline links.
    pub embedded_title: Option<TaggedValue>,
    /// BLOB, 5.5 only.
    pub blob: Vec<String>,
    /// Chained OBJE, 5.5 only.
    pub continued_object: Option<String>,
    pub citations: Vec<Citation>,
    pub notes: Vec<NoteStructure>,
    pub user_references: Vec<UserReference>,
    pub rec_id_number: Option<TaggedValue>,
    pub change_date: Option<ChangeDate>,
    pub custom_tags: Vec<CustomTag>,
}

impl Multimedia {
    pub fn new(xref: &str) -> Self {
        Self {
            xref: Some(xref.to_string()),
            ..Self::default()
        }
    }

    /// Whether this object uses the 5.5.1 file-reference layout.
    pub fn is_551_style(&self) -> bool {
        !self.file_references.is_empty()
    }
}

/// FILE with its format, media type and title.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileReference {
    pub reference_to_file: Option<TaggedValue>,
    pub format: Option<TaggedValue>,
    pub media_type: Option<TaggedValue>,
    pub title: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

/// OBJE on another structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultimediaLink {
    Reference {
        xref: String,
        custom_tags: Vec<CustomTag>,
    },
    Inline(Multimedia),
}

impl MultimediaLink {
    pub fn reference(xref: &str) -> Self {
        MultimediaLink::Reference {
            xref: xref.to_string(),
            custom_tags: Vec::new(),
        }
    }

    pub fn xref(&self) -> Option<&str> {
        match self {
            MultimediaLink::Reference { xref, .. } => Some(xref),
            MultimediaLink::Inline(_) => None,
        }
    }
}

impl HasCustomTags for MultimediaLink {
    fn custom_tags(&self) -> &[CustomTag] {
        match self {
            MultimediaLink::Reference { custom_tags, .. } => custom_tags,
            MultimediaLink::Inline(m) => &m.custom_tags,
        }
    }

    fn custom_tags_mut(&mut self) -> &mut Vec<CustomTag> {
        match self {
            MultimediaLink::Reference { custom_tags, .. } => custom_tags,
            MultimediaLink::Inline(m) => &mut m.custom_tags,
        }
    }
}

has_custom_tags!(Multimedia, FileReference);
