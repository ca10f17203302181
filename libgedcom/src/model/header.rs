//! Header, submitter, submission and trailer.

use super::{
    has_custom_tags, ChangeDate, ContactInfo, CustomTag, MultimediaLink, NoteStructure,
    TaggedValue, UserReference,
};
use crate::dialect::{CharacterSet, SupportedVersion};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub source_system: Option<SourceSystem>,
    pub destination_system: Option<TaggedValue>,
    pub date: Option<TaggedValue>,
    /// DATE.TIME
    pub time: Option<TaggedValue>,
    pub character_set: Option<CharacterSetDecl>,
    /// SUBM pointer.
    pub submitter: Option<String>,
    /// SUBN pointer.
    pub submission: Option<String>,
    pub file_name: Option<TaggedValue>,
    /// COPR; more than one line is 5.5.1 only.
    pub copyright_data: Vec<String>,
    pub gedcom_version: Option<GedcomVersion>,
    pub language: Option<TaggedValue>,
    /// PLAC.FORM
    pub place_hierarchy: Option<TaggedValue>,
    /// NOTE, free text about the file.
    pub notes: Vec<String>,
    pub custom_tags: Vec<CustomTag>,
}

/// HEAD.SOUR: the program that produced the file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceSystem {
    pub system_id: Option<String>,
    pub version_num: Option<TaggedValue>,
    pub product_name: Option<TaggedValue>,
    pub corporation: Option<Corporation>,
    pub source_data: Option<HeaderSourceData>,
    pub custom_tags: Vec<CustomTag>,
}

/// HEAD.SOUR.CORP
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Corporation {
    pub business_name: Option<String>,
    pub contact: ContactInfo,
    pub custom_tags: Vec<CustomTag>,
}

/// HEAD.SOUR.DATA
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderSourceData {
    pub name: Option<String>,
    pub publish_date: Option<TaggedValue>,
    pub copyright: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

/// HEAD.CHAR
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterSetDecl {
    pub name: Option<String>,
    pub version_num: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

impl CharacterSetDecl {
    pub fn new(character_set: CharacterSet) -> Self {
        Self {
            name: Some(character_set.name().to_string()),
            ..Self::default()
        }
    }

    pub fn character_set(&self) -> Option<CharacterSet> {
        self.name.as_deref().and_then(CharacterSet::from_name)
    }
}

/// HEAD.GEDC
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GedcomVersion {
    pub version: Option<TaggedValue>,
    pub form: Option<TaggedValue>,
    pub custom_tags: Vec<CustomTag>,
}

impl GedcomVersion {
    pub fn new(version: SupportedVersion) -> Self {
        Self {
            version: Some(TaggedValue::new(version.as_str())),
            form: Some(TaggedValue::new("LINEAGE-LINKED")),
            custom_tags: Vec::new(),
        }
    }
}

/// The person or organization that contributed the data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Submitter {
    pub xref: Option<String>,
    pub name: Option<TaggedValue>,
    pub contact: ContactInfo,
    pub multimedia: Vec<MultimediaLink>,
    /// LANG, at most three.
    pub language_pref: Vec<TaggedValue>,
    /// RFN
    pub registration_file_number: Option<TaggedValue>,
    pub rec_id_number: Option<TaggedValue>,
    pub notes: Vec<NoteStructure>,
    pub user_references: Vec<UserReference>,
    pub change_date: Option<ChangeDate>,
    pub custom_tags: Vec<CustomTag>,
}

impl Submitter {
    pub fn new(xref: &str) -> Self {
        Self {
            xref: Some(xref.to_string()),
            ..Self::default()
        }
    }
}

/// SUBN record: a request to process the file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Submission {
    pub xref: Option<String>,
    pub submitter: Option<String>,
    /// FAMF
    pub name_of_family_file: Option<TaggedValue>,
    /// TEMP
    pub temple_code: Option<TaggedValue>,
    /// ANCE
    pub ancestors_count: Option<TaggedValue>,
    /// DESC
    pub descendants_count: Option<TaggedValue>,
    /// ORDI
    pub ordinance_process_flag: Option<TaggedValue>,
    pub rec_id_number: Option<TaggedValue>,
    pub notes: Vec<NoteStructure>,
    pub custom_tags: Vec<CustomTag>,
}

impl Submission {
    pub fn new(xref: &str) -> Self {
        Self {
            xref: Some(xref.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trailer {
    pub custom_tags: Vec<CustomTag>,
}

has_custom_tags!(
    Header,
    SourceSystem,
    Corporation,
    HeaderSourceData,
    CharacterSetDecl,
    GedcomVersion,
    Submitter,
    Submission,
    Trailer,
);
