//! INDI records and their names, events and family links.

use super::Loader;
use crate::model::{
    Association, FamilyChild, FamilySpouse, IndividualAttribute, IndividualAttributeType,
    IndividualEvent, IndividualEventType, LdsOrdinanceType, PersonalName, PersonalNameVariation,
    RecordKind, TaggedValue,
};
use crate::tree::Node;

/// The name pieces shared by NAME and its ROMN/FONE variations.
#[derive(Default)]
struct NamePieces {
    prefix: Option<TaggedValue>,
    given_name: Option<TaggedValue>,
    nickname: Option<TaggedValue>,
    surname_prefix: Option<TaggedValue>,
    surname: Option<TaggedValue>,
    suffix: Option<TaggedValue>,
}

impl NamePieces {
    fn slot(&mut self, tag: &str) -> Option<&mut Option<TaggedValue>> {
        match tag {
            "NPFX" => Some(&mut self.prefix),
            "GIVN" => Some(&mut self.given_name),
            "NICK" => Some(&mut self.nickname),
            "SPFX" => Some(&mut self.surname_prefix),
            "SURN" => Some(&mut self.surname),
            "NSFX" => Some(&mut self.suffix),
            _ => None,
        }
    }
}

impl<'t> Loader<'t> {
    pub(super) fn load_individual_record(&mut self, node: &'t Node) {
        let Some(xref) = self.define(RecordKind::Individual, node) else {
            return;
        };
        let tree = self.tree;
        let mut ind = self
            .gedcom
            .individuals
            .get_mut(&xref)
            .map(std::mem::take)
            .unwrap_or_default();
        ind.xref = Some(xref.clone());

        for child in tree.children(node) {
            if self.contact_tag(child, &mut ind.contact) {
                continue;
            }
            let tag = child.tag.as_str();
            if let Some(kind) = IndividualEventType::from_tag(tag) {
                let event = self.load_individual_event(child, kind);
                ind.events.push(event);
                continue;
            }
            if let Some(kind) = IndividualAttributeType::from_tag(tag) {
                if kind == IndividualAttributeType::Fact {
                    self.dialect.only_551(child.line, "FACT", &mut self.diagnostics);
                }
                let mut attr = IndividualAttribute::new(kind);
                attr.detail.description = child.value.clone();
                for gch in tree.children(child) {
                    if !self.event_detail_tag(gch, &mut attr.detail) {
                        self.unknown_tag(gch, &mut attr.detail.custom_tags);
                    }
                }
                ind.attributes.push(attr);
                continue;
            }
            match tag {
                "NAME" => {
                    let name = self.load_personal_name(child);
                    ind.names.push(name);
                }
                "SEX" => {
                    let v = self.tagged(child);
                    self.once(&mut ind.sex, child, v);
                }
                "BAPL" | "CONL" | "ENDL" | "SLGC" => {
                    if let Some(kind) = LdsOrdinanceType::from_tag(tag) {
                        let ord = self.load_lds_ordinance(child, kind);
                        ind.lds_ordinances.push(ord);
                    }
                }
                "FAMC" => {
                    if let Some(link) = self.load_family_child(child) {
                        ind.families_where_child.push(link);
                    }
                }
                "FAMS" => {
                    if let Some(family) = self.pointer(child, RecordKind::Family) {
                        let mut link = FamilySpouse::new(&family);
                        for gch in tree.children(child) {
                            match gch.tag.as_str() {
                                "NOTE" => self.push_note(gch, &mut link.notes),
                                _ => self.unknown_tag(gch, &mut link.custom_tags),
                            }
                        }
                        ind.families_where_spouse.push(link);
                    }
                }
                "ASSO" => {
                    if let Some(asso) = self.load_association(child) {
                        ind.associations.push(asso);
                    }
                }
                "ALIA" => {
                    if let Some(x) = self.pointer(child, RecordKind::Individual) {
                        ind.aliases.push(x);
                    }
                }
                "ANCI" => {
                    if let Some(x) = self.pointer(child, RecordKind::Submitter) {
                        ind.ancestor_interest.push(x);
                    }
                }
                "DESI" => {
                    if let Some(x) = self.pointer(child, RecordKind::Submitter) {
                        ind.descendant_interest.push(x);
                    }
                }
                "SUBM" => {
                    if let Some(x) = self.pointer(child, RecordKind::Submitter) {
                        ind.submitters.push(x);
                    }
                }
                "SOUR" => ind.citations.push(self.load_citation(child)),
                "NOTE" => self.push_note(child, &mut ind.notes),
                "OBJE" => self.push_multimedia_link(child, &mut ind.multimedia),
                "REFN" => ind.user_references.push(self.load_user_reference(child)),
                "AFN" => {
                    let v = self.tagged(child);
                    self.once(&mut ind.ancestral_file_number, child, v);
                }
                "RFN" => {
                    let v = self.tagged(child);
                    self.once(&mut ind.permanent_rec_file_number, child, v);
                }
                "RIN" => {
                    let v = self.tagged(child);
                    self.once(&mut ind.rec_id_number, child, v);
                }
                "RESN" => {
                    self.dialect.only_551(child.line, "RESN", &mut self.diagnostics);
                    let v = self.tagged(child);
                    self.once(&mut ind.restriction_notice, child, v);
                }
                "CHAN" => {
                    let v = self.load_change_date(child);
                    self.once(&mut ind.change_date, child, v);
                }
                _ => self.unknown_tag(child, &mut ind.custom_tags),
            }
        }
        self.gedcom.individuals.insert(xref, ind);
    }

    fn load_individual_event(&mut self, node: &'t Node, kind: IndividualEventType) -> IndividualEvent {
        let tree = self.tree;
        let mut event = IndividualEvent::new(kind);
        event.detail.description = node.value.clone();
        for child in tree.children(node) {
            if self.event_detail_tag(child, &mut event.detail) {
                continue;
            }
            if child.tag == "FAMC" && kind.takes_family_child() {
                if let Some(family) = self.pointer(child, RecordKind::Family) {
                    self.once(&mut event.family_child, child, family);
                }
                for gch in tree.children(child) {
                    if gch.tag == "ADOP" && kind == IndividualEventType::Adoption {
                        let v = self.tagged(gch);
                        self.once(&mut event.adopted_by, gch, v);
                    } else {
                        self.unknown_tag(gch, &mut event.detail.custom_tags);
                    }
                }
                continue;
            }
            self.unknown_tag(child, &mut event.detail.custom_tags);
        }
        event
    }

    fn load_family_child(&mut self, node: &'t Node) -> Option<FamilyChild> {
        let family = self.pointer(node, RecordKind::Family)?;
        let tree = self.tree;
        let mut link = FamilyChild::new(&family);
        for child in tree.children(node) {
            match child.tag.as_str() {
                "PEDI" => {
                    let v = self.tagged(child);
                    self.once(&mut link.pedigree, child, v);
                }
                "ADOP" => {
                    let v = self.tagged(child);
                    self.once(&mut link.adopted_by, child, v);
                }
                "STAT" => {
                    self.dialect.only_551(
                        child.line,
                        "STAT on a child-to-family link",
                        &mut self.diagnostics,
                    );
                    let v = self.tagged(child);
                    self.once(&mut link.status, child, v);
                }
                "NOTE" => self.push_note(child, &mut link.notes),
                _ => self.unknown_tag(child, &mut link.custom_tags),
            }
        }
        Some(link)
    }

    fn load_association(&mut self, node: &'t Node) -> Option<Association> {
        let tree = self.tree;
        // TYPE names the kind of record the pointer targets, defaulting to INDI.
        let kind = tree
            .child(node, "TYPE")
            .and_then(|t| t.value.as_deref())
            .and_then(RecordKind::from_tag)
            .unwrap_or(RecordKind::Individual);
        let entity = self.pointer(node, kind)?;
        let mut asso = Association {
            associated_entity: entity,
            ..Association::default()
        };
        for child in tree.children(node) {
            match child.tag.as_str() {
                "TYPE" => {
                    self.dialect.only_55(
                        child.line,
                        "TYPE on an association",
                        &mut self.diagnostics,
                    );
                    let v = self.tagged(child);
                    self.once(&mut asso.associated_entity_type, child, v);
                }
                "RELA" => {
                    let v = self.tagged(child);
                    self.once(&mut asso.relationship, child, v);
                }
                "SOUR" => asso.citations.push(self.load_citation(child)),
                "NOTE" => self.push_note(child, &mut asso.notes),
                _ => self.unknown_tag(child, &mut asso.custom_tags),
            }
        }
        Some(asso)
    }

    fn load_personal_name(&mut self, node: &'t Node) -> PersonalName {
        let tree = self.tree;
        let mut name = PersonalName {
            basic: node.value.clone(),
            ..PersonalName::default()
        };
        let mut pieces = NamePieces::default();
        for child in tree.children(node) {
            if let Some(slot) = pieces.slot(&child.tag) {
                let v = self.tagged(child);
                self.once(slot, child, v);
                continue;
            }
            match child.tag.as_str() {
                "TYPE" => {
                    self.dialect.only_551(
                        child.line,
                        "TYPE on a personal name",
                        &mut self.diagnostics,
                    );
                    let v = self.tagged(child);
                    self.once(&mut name.name_type, child, v);
                }
                "ROMN" => {
                    self.dialect.only_551(child.line, "ROMN", &mut self.diagnostics);
                    let v = self.load_name_variation_pieces(child);
                    name.romanized.push(v);
                }
                "FONE" => {
                    self.dialect.only_551(child.line, "FONE", &mut self.diagnostics);
                    let v = self.load_name_variation_pieces(child);
                    name.phonetic.push(v);
                }
                "SOUR" => name.citations.push(self.load_citation(child)),
                "NOTE" => self.push_note(child, &mut name.notes),
                _ => self.unknown_tag(child, &mut name.custom_tags),
            }
        }
        name.prefix = pieces.prefix;
        name.given_name = pieces.given_name;
        name.nickname = pieces.nickname;
        name.surname_prefix = pieces.surname_prefix;
        name.surname = pieces.surname;
        name.suffix = pieces.suffix;
        name
    }

    fn load_name_variation_pieces(&mut self, node: &'t Node) -> PersonalNameVariation {
        let tree = self.tree;
        let mut variation = PersonalNameVariation {
            variation: node.value.clone(),
            ..PersonalNameVariation::default()
        };
        let mut pieces = NamePieces::default();
        for child in tree.children(node) {
            if let Some(slot) = pieces.slot(&child.tag) {
                let v = self.tagged(child);
                self.once(slot, child, v);
                continue;
            }
            match child.tag.as_str() {
                "TYPE" => {
                    let v = self.tagged(child);
                    self.once(&mut variation.variation_type, child, v);
                }
                "SOUR" => variation.citations.push(self.load_citation(child)),
                "NOTE" => self.push_note(child, &mut variation.notes),
                _ => self.unknown_tag(child, &mut variation.custom_tags),
            }
        }
        variation.prefix = pieces.prefix;
        variation.given_name = pieces.given_name;
        variation.nickname = pieces.nickname;
        variation.surname_prefix = pieces.surname_prefix;
        variation.surname = pieces.surname;
        variation.suffix = pieces.suffix;
        variation
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{IndividualAttributeType, IndividualEventType};
    use crate::load;

    #[test]
    fn test_individual_fields() {
        let src = "0 @I1@ INDI\n\
                   1 NAME John /Smith/\n\
                   2 GIVN John\n\
                   2 SURN Smith\n\
                   1 SEX M\n\
                   1 BIRT\n\
                   2 DATE 1 JAN 1900\n\
                   2 FAMC @F1@\n\
                   1 OCCU Farmer\n\
                   1 FAMC @F1@\n\
                   2 PEDI birth\n\
                   1 ASSO @I2@\n\
                   2 RELA Godfather\n\
                   0 @I2@ INDI\n\
                   0 @F1@ FAM\n\
                   1 CHIL @I1@\n\
                   0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        let ind = &loaded.gedcom.individuals["@I1@"];
        let name = &ind.names[0];
        assert_eq!(name.given_name.as_ref().unwrap().as_str(), Some("John"));
        assert_eq!(name.surname.as_ref().unwrap().as_str(), Some("Smith"));
        assert_eq!(ind.events[0].kind, IndividualEventType::Birth);
        assert_eq!(ind.events[0].family_child.as_deref(), Some("@F1@"));
        assert_eq!(ind.attributes[0].kind, IndividualAttributeType::Occupation);
        assert_eq!(ind.attributes[0].detail.description.as_deref(), Some("Farmer"));
        assert_eq!(ind.families_where_child[0].pedigree.as_ref().unwrap().as_str(), Some("birth"));
        assert_eq!(ind.associations[0].associated_entity, "@I2@");
        assert_eq!(ind.parent_families().collect::<Vec<_>>(), vec!["@F1@"]);
    }

    #[test]
    fn test_551_features_warn_under_55() {
        let src = "0 HEAD\n1 GEDC\n2 VERS 5.5\n\
                   0 @I1@ INDI\n1 NAME A /B/\n2 TYPE birth\n1 FACT Tall\n1 RESN locked\n\
                   0 TRLR\n";
        let loaded = load(src).unwrap();
        let warnings = loaded.diagnostics.warning_messages();
        assert_eq!(warnings.len(), 3, "{:?}", warnings);
        assert!(warnings[0].starts_with("Line 6: GEDCOM version is 5.5 but TYPE on a personal name"));
        assert!(warnings[1].contains("FACT was specified"));
        assert!(warnings[2].contains("RESN was specified"));
        assert!(loaded.diagnostics.errors.is_empty());
        let ind = &loaded.gedcom.individuals["@I1@"];
        assert!(ind.restriction_notice.is_some());
    }

    #[test]
    fn test_association_type_only_in_55() {
        let src = "0 @I1@ INDI\n1 ASSO @F1@\n2 TYPE FAM\n0 @F1@ FAM\n0 TRLR\n";
        let loaded = load(src).unwrap();
        let warnings = loaded.diagnostics.warning_messages();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("which is only allowed in GEDCOM 5.5"));
        assert!(loaded.gedcom.stubs.is_empty());
    }
}
