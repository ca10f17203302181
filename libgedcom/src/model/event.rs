//! Events, attributes and LDS ordinances.

use super::{
    has_custom_tags, tag_enum, Citation, ContactInfo, CustomTag, HasCustomTags, MultimediaLink,
    NoteStructure, Place, TaggedValue,
};

tag_enum! {
    IndividualEventType {
        Birth => "BIRT",
        Christening => "CHR",
        Death => "DEAT",
        Burial => "BURI",
        Cremation => "CREM",
        Adoption => "ADOP",
        Baptism => "BAPM",
        BarMitzvah => "BARM",
        BasMitzvah => "BASM",
        Blessing => "BLES",
        AdultChristening => "CHRA",
        Confirmation => "CONF",
        FirstCommunion => "FCOM",
        Ordination => "ORDN",
        Naturalization => "NATU",
        Emigration => "EMIG",
        Immigration => "IMMI",
        Census => "CENS",
        Probate => "PROB",
        Will => "WILL",
        Graduation => "GRAD",
        Retirement => "RETI",
        Event => "EVEN",
    }
}

impl IndividualEventType {
    /// Events that may point at the family the individual was born into.
    pub fn takes_family_child(self) -> bool {
        matches!(
            self,
            IndividualEventType::Birth
                | IndividualEventType::Christening
                | IndividualEventType::Adoption
        )
    }
}

tag_enum! {
    IndividualAttributeType {
        Caste => "CAST",
        PhysicalDescription => "DSCR",
        Education => "EDUC",
        NationalId => "IDNO",
        Nationality => "NATI",
        ChildCount => "NCHI",
        MarriageCount => "NMR",
        Occupation => "OCCU",
        Possessions => "PROP",
        Religion => "RELI",
        Residence => "RESI",
        SocialSecurityNumber => "SSN",
        NobilityTitle => "TITL",
        /// 5.5.1 only.
        Fact => "FACT",
    }
}

tag_enum! {
    FamilyEventType {
        Annulment => "ANUL",
        Census => "CENS",
        Divorce => "DIV",
        DivorceFiled => "DIVF",
        Engagement => "ENGA",
        Marriage => "MARR",
        MarriageBann => "MARB",
        MarriageContract => "MARC",
        MarriageLicense => "MARL",
        MarriageSettlement => "MARS",
        /// 5.5.1 only.
        Residence => "RESI",
        Event => "EVEN",
    }
}

tag_enum! {
    LdsOrdinanceType {
        Baptism => "BAPL",
        Confirmation => "CONL",
        Endowment => "ENDL",
        ChildSealing => "SLGC",
        SpouseSealing => "SLGS",
    }
}

/// Details shared by every kind of event and attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventDetail {
    /// Text on the event line itself (for example `Y`, or an attribute value).
    pub description: Option<String>,
    /// TYPE
    pub subtype: Option<TaggedValue>,
    pub date: Option<TaggedValue>,
    pub place: Option<Place>,
    pub contact: ContactInfo,
    pub age: Option<TaggedValue>,
    pub cause: Option<TaggedValue>,
    /// AGNC
    pub responsible_agency: Option<TaggedValue>,
    /// RELI, 5.5.1 only.
    pub religious_affiliation: Option<TaggedValue>,
    /// RESN, 5.5.1 only.
    pub restriction_notice: Option<TaggedValue>,
    pub citations: Vec<Citation>,
    pub notes: Vec<NoteStructure>,
    pub multimedia: Vec<MultimediaLink>,
    pub custom_tags: Vec<CustomTag>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualEvent {
    pub kind: IndividualEventType,
    pub detail: EventDetail,
    /// FAMC on birth, christening and adoption events.
    pub family_child: Option<String>,
    /// FAMC.ADOP on adoption events.
    pub adopted_by: Option<TaggedValue>,
}

impl IndividualEvent {
    pub fn new(kind: IndividualEventType) -> Self {
        Self {
            kind,
            detail: EventDetail::default(),
            family_child: None,
            adopted_by: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndividualAttribute {
    pub kind: IndividualAttributeType,
    pub detail: EventDetail,
}

impl IndividualAttribute {
    pub fn new(kind: IndividualAttributeType) -> Self {
        Self {
            kind,
            detail: EventDetail::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyEvent {
    pub kind: FamilyEventType,
    pub detail: EventDetail,
    /// HUSB.AGE
    pub husband_age: Option<TaggedValue>,
    /// WIFE.AGE
    pub wife_age: Option<TaggedValue>,
}

impl FamilyEvent {
    pub fn new(kind: FamilyEventType) -> Self {
        Self {
            kind,
            detail: EventDetail::default(),
            husband_age: None,
            wife_age: None,
        }
    }
}

/// An LDS ordinance on an individual, or a spouse sealing on a family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdsOrdinance {
    pub kind: LdsOrdinanceType,
    /// Text on the ordinance line itself.
    pub description: Option<String>,
    pub date: Option<TaggedValue>,
    pub place: Option<TaggedValue>,
    /// STAT
    pub status: Option<TaggedValue>,
    /// TEMP
    pub temple: Option<TaggedValue>,
    /// FAMC, child sealing only.
    pub family_child: Option<String>,
    pub citations: Vec<Citation>,
    pub notes: Vec<NoteStructure>,
    pub custom_tags: Vec<CustomTag>,
}

impl LdsOrdinance {
    pub fn new(kind: LdsOrdinanceType) -> Self {
        Self {
            kind,
            description: None,
            date: None,
            place: None,
            status: None,
            temple: None,
            family_child: None,
            citations: Vec::new(),
            notes: Vec::new(),
            custom_tags: Vec::new(),
        }
    }
}

has_custom_tags!(EventDetail, LdsOrdinance);

macro_rules! custom_tags_in_detail {
    ($($ty:ty),*) => {
        $(
            impl HasCustomTags for $ty {
                fn custom_tags(&self) -> &[CustomTag] {
                    &self.detail.custom_tags
                }
                fn custom_tags_mut(&mut self) -> &mut Vec<CustomTag> {
                    &mut self.detail.custom_tags
                }
            }
        )*
    };
}

custom_tags_in_detail!(IndividualEvent, IndividualAttribute, FamilyEvent);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tags_round_trip() {
        for kind in IndividualEventType::ALL {
            assert_eq!(IndividualEventType::from_tag(kind.tag()), Some(*kind));
        }
        assert_eq!(FamilyEventType::from_tag("MARR"), Some(FamilyEventType::Marriage));
        assert_eq!(IndividualAttributeType::from_tag("BIRT"), None);
    }

    #[test]
    fn test_family_child_events() {
        assert!(IndividualEventType::Birth.takes_family_child());
        assert!(!IndividualEventType::Death.takes_family_child());
    }
}
