use super::{
    has_custom_tags, ChangeDate, ContactInfo, CustomTag, MultimediaLink, NoteStructure,
    TaggedValue, UserReference,
};

/// A source record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Source {
    pub xref: Option<String>,
    pub data: Option<SourceData>,
    /// AUTH
    pub originators_authors: Vec<String>,
    /// TITL
    pub title: Vec<String>,
    /// ABBR
    pub source_filed_by: Option<TaggedValue>,
    /// PUBL
    pub publication_facts: Vec<String>,
    /// TEXT
    pub source_text: Vec<String>,
    pub repository_citations: Vec<RepositoryCitation>,
    pub multimedia: Vec<MultimediaLink>,
    pub notes: Vec<NoteStructure>,
    pub user_references: Vec<UserReference>,
    pub rec_id_number: Option<TaggedValue>,
    pub change_date: Option<ChangeDate>,
    pub custom_tags: Vec<CustomTag>,
}

impl Source {
    pub fn new(xref: &str) -> Self {
        Self {
            xref: Some(xref.to_string()),
            ..Self::default()
        }
    }
}

/// DATA block of a source record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceData {
    pub events_recorded: Vec<EventRecorded>,
    /// AGNC
    pub responsible_agency: Option<TaggedValue>,
    pub notes: Vec<NoteStructure>,
    pub custom_tags: Vec<CustomTag>,
}

/// DATA.EVEN: which kinds of events a source records, when and where.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventRecorded {
    pub event_type: Option<String>,
    pub date_period: Option<TaggedValue>,
    pub jurisdiction: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

/// REPO link from a source to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RepositoryCitation {
    pub repository: Option<String>,
    pub notes: Vec<NoteStructure>,
    pub call_numbers: Vec<CallNumber>,
    pub custom_tags: Vec<CustomTag>,
}

/// CALN with its media type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallNumber {
    pub call_number: Option<String>,
    /// MEDI
    pub media_type: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

/// A repository record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Repository {
    pub xref: Option<String>,
    pub name: Option<TaggedValue>,
    pub contact: ContactInfo,
    pub notes: Vec<NoteStructure>,
    pub user_references: Vec<UserReference>,
    pub rec_id_number: Option<TaggedValue>,
    pub change_date: Option<ChangeDate>,
    pub custom_tags: Vec<CustomTag>,
}

impl Repository {
    pub fn new(xref: &str) -> Self {
        Self {
            xref: Some(xref.to_string()),
            ..Self::default()
        }
    }
}

has_custom_tags!(
    Source,
    SourceData,
    EventRecorded,
    RepositoryCitation,
    CallNumber,
    Repository,
);
