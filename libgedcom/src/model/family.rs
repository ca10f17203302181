use super::{
    has_custom_tags, ChangeDate, Citation, CustomTag, FamilyEvent, LdsOrdinance, MultimediaLink,
    NoteStructure, TaggedValue, UserReference,
};

/// A family: spouses, children and the events they share.
///
/// Spouses and children are xrefs into [`Gedcom::individuals`](super::Gedcom).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Family {
    pub xref: Option<String>,
    pub husband: Option<String>,
    pub wife: Option<String>,
    pub children: Vec<String>,
    /// NCHI
    pub num_children: Option<TaggedValue>,
    pub events: Vec<FamilyEvent>,
    pub lds_spouse_sealings: Vec<LdsOrdinance>,
    pub submitters: Vec<String>,
    pub citations: Vec<Citation>,
    pub notes: Vec<NoteStructure>,
    pub multimedia: Vec<MultimediaLink>,
    pub user_references: Vec<UserReference>,
    /// RIN
    pub rec_id_number: Option<TaggedValue>,
    /// RFN
    pub permanent_rec_file_number: Option<TaggedValue>,
    /// RESN, 5.5.1 only.
    pub restriction_notice: Option<TaggedValue>,
    pub change_date: Option<ChangeDate>,
    pub custom_tags: Vec<CustomTag>,
}

impl Family {
    pub fn new(xref: &str) -> Self {
        Self {
            xref: Some(xref.to_string()),
            ..Self::default()
        }
    }

    /// Husband and wife, whichever are present.
    pub fn spouses(&self) -> impl Iterator<Item = &str> {
        self.husband.iter().chain(self.wife.iter()).map(String::as_str)
    }
}

has_custom_tags!(Family);
