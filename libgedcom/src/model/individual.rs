use super::{
    has_custom_tags, ChangeDate, Citation, ContactInfo, CustomTag, IndividualAttribute,
    IndividualEvent, LdsOrdinance, MultimediaLink, NoteStructure, TaggedValue, UserReference,
};

/// A person.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Individual {
    pub xref: Option<String>,
    pub names: Vec<PersonalName>,
    pub sex: Option<TaggedValue>,
    pub contact: ContactInfo,
    pub events: Vec<IndividualEvent>,
    pub attributes: Vec<IndividualAttribute>,
    pub lds_ordinances: Vec<LdsOrdinance>,
    pub families_where_child: Vec<FamilyChild>,
    pub families_where_spouse: Vec<FamilySpouse>,
    pub associations: Vec<Association>,
    /// ALIA, pointers to other individuals.
    pub aliases: Vec<String>,
    /// ANCI, pointers to submitters.
    pub ancestor_interest: Vec<String>,
    /// DESI, pointers to submitters.
    pub descendant_interest: Vec<String>,
    pub submitters: Vec<String>,
    pub citations: Vec<Citation>,
    pub notes: Vec<NoteStructure>,
    pub multimedia: Vec<MultimediaLink>,
    pub user_references: Vec<UserReference>,
    /// AFN
    pub ancestral_file_number: Option<TaggedValue>,
    /// RFN
    pub permanent_rec_file_number: Option<TaggedValue>,
    /// RIN
    pub rec_id_number: Option<TaggedValue>,
    /// RESN, 5.5.1 only.
    pub restriction_notice: Option<TaggedValue>,
    pub change_date: Option<ChangeDate>,
    pub custom_tags: Vec<CustomTag>,
}

impl Individual {
    pub fn new(xref: &str) -> Self {
        Self {
            xref: Some(xref.to_string()),
            ..Self::default()
        }
    }

    /// Families this individual is a child in, by xref.
    pub fn parent_families(&self) -> impl Iterator<Item = &str> {
        self.families_where_child.iter().map(|f| f.family.as_str())
    }

    /// The first name's basic form, if any.
    pub fn formatted_name(&self) -> Option<&str> {
        self.names.first().and_then(|n| n.basic.as_deref())
    }
}

/// NAME structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonalName {
    /// Name as written, surname between slashes.
    pub basic: Option<String>,
    /// TYPE, 5.5.1 only.
    pub name_type: Option<TaggedValue>,
    pub prefix: Option<TaggedValue>,
    pub given_name: Option<TaggedValue>,
    pub nickname: Option<TaggedValue>,
    pub surname_prefix: Option<TaggedValue>,
    pub surname: Option<TaggedValue>,
    pub suffix: Option<TaggedValue>,
    pub citations: Vec<Citation>,
    pub notes: Vec<NoteStructure>,
    /// ROMN, 5.5.1 only.
    pub romanized: Vec<PersonalNameVariation>,
    /// FONE, 5.5.1 only.
    pub phonetic: Vec<PersonalNameVariation>,
    pub custom_tags: Vec<CustomTag>,
}

impl PersonalName {
    pub fn new(basic: &str) -> Self {
        Self {
            basic: Some(basic.to_string()),
            ..Self::default()
        }
    }
}

/// Romanized or phonetic form of a personal name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PersonalNameVariation {
    pub variation: Option<String>,
    pub variation_type: Option<TaggedValue>,
    pub prefix: Option<TaggedValue>,
    pub given_name: Option<TaggedValue>,
    pub nickname: Option<TaggedValue>,
    pub surname_prefix: Option<TaggedValue>,
    pub surname: Option<TaggedValue>,
    pub suffix: Option<TaggedValue>,
    pub citations: Vec<Citation>,
    pub notes: Vec<NoteStructure>,
    pub custom_tags: Vec<CustomTag>,
}

/// FAMC link from an individual to a family.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FamilyChild {
    pub family: String,
    /// PEDI
    pub pedigree: Option<TaggedValue>,
    /// ADOP
    pub adopted_by: Option<TaggedValue>,
    /// STAT, 5.5.1 only.
    pub status: Option<TaggedValue>,
    pub notes: Vec<NoteStructure>,
    pub custom_tags: Vec<CustomTag>,
}

impl FamilyChild {
    pub fn new(family: &str) -> Self {
        Self {
            family: family.to_string(),
            ..Self::default()
        }
    }
}

/// FAMS link from an individual to a family.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FamilySpouse {
    pub family: String,
    pub notes: Vec<NoteStructure>,
    pub custom_tags: Vec<CustomTag>,
}

impl FamilySpouse {
    pub fn new(family: &str) -> Self {
        Self {
            family: family.to_string(),
            ..Self::default()
        }
    }
}

/// ASSO link to an associated record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Association {
    pub associated_entity: String,
    /// TYPE, 5.5 only.
    pub associated_entity_type: Option<TaggedValue>,
    /// RELA
    pub relationship: Option<TaggedValue>,
    pub citations: Vec<Citation>,
    pub notes: Vec<NoteStructure>,
    pub custom_tags: Vec<CustomTag>,
}

has_custom_tags!(
    Individual,
    PersonalName,
    PersonalNameVariation,
    FamilyChild,
    FamilySpouse,
    Association,
);
