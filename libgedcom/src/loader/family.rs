//! FAM records.

use super::Loader;
use crate::model::{
    CustomTag, FamilyEvent, FamilyEventType, LdsOrdinanceType, RecordKind, TaggedValue,
};
use crate::tree::Node;

impl<'t> Loader<'t> {
    pub(super) fn load_family_record(&mut self, node: &'t Node) {
        let Some(xref) = self.define(RecordKind::Family, node) else {
            return;
        };
        let tree = self.tree;
        let mut fam = self
            .gedcom
            .families
            .get_mut(&xref)
            .map(std::mem::take)
            .unwrap_or_default();
        fam.xref = Some(xref.clone());

        for child in tree.children(node) {
            let tag = child.tag.as_str();
            if let Some(kind) = FamilyEventType::from_tag(tag) {
                if kind == FamilyEventType::Residence {
                    self.dialect
                        .only_551(child.line, "RESI on a family", &mut self.diagnostics);
                }
                let event = self.load_family_event(child, kind);
                fam.events.push(event);
                continue;
            }
            match tag {
                "HUSB" => {
                    if let Some(x) = self.pointer(child, RecordKind::Individual) {
                        self.once(&mut fam.husband, child, x);
                    }
                }
                "WIFE" => {
                    if let Some(x) = self.pointer(child, RecordKind::Individual) {
                        self.once(&mut fam.wife, child, x);
                    }
                }
                "CHIL" => {
                    if let Some(x) = self.pointer(child, RecordKind::Individual) {
                        fam.children.push(x);
                    }
                }
                "NCHI" => {
                    let v = self.tagged(child);
                    self.once(&mut fam.num_children, child, v);
                }
                "SLGS" => {
                    let ord = self.load_lds_ordinance(child, LdsOrdinanceType::SpouseSealing);
                    fam.lds_spouse_sealings.push(ord);
                }
                "SUBM" => {
                    if let Some(x) = self.pointer(child, RecordKind::Submitter) {
                        fam.submitters.push(x);
                    }
                }
                "SOUR" => fam.citations.push(self.load_citation(child)),
                "NOTE" => self.push_note(child, &mut fam.notes),
                "OBJE" => self.push_multimedia_link(child, &mut fam.multimedia),
                "REFN" => fam.user_references.push(self.load_user_reference(child)),
                "RIN" => {
                    let v = self.tagged(child);
                    self.once(&mut fam.rec_id_number, child, v);
                }
                "RFN" => {
                    let v = self.tagged(child);
                    self.once(&mut fam.permanent_rec_file_number, child, v);
                }
                "RESN" => {
                    self.dialect.only_551(child.line, "RESN", &mut self.diagnostics);
                    let v = self.tagged(child);
                    self.once(&mut fam.restriction_notice, child, v);
                }
                "CHAN" => {
                    let v = self.load_change_date(child);
                    self.once(&mut fam.change_date, child, v);
                }
                _ => self.unknown_tag(child, &mut fam.custom_tags),
            }
        }
        self.gedcom.families.insert(xref, fam);
    }

    fn load_family_event(&mut self, node: &'t Node, kind: FamilyEventType) -> FamilyEvent {
        let tree = self.tree;
        let mut event = FamilyEvent::new(kind);
        event.detail.description = node.value.clone();
        for child in tree.children(node) {
            if self.event_detail_tag(child, &mut event.detail) {
                continue;
            }
            match child.tag.as_str() {
                "HUSB" => {
                    let age = self.spouse_age(child, &mut event.detail.custom_tags);
                    self.once(&mut event.husband_age, child, age);
                }
                "WIFE" => {
                    let age = self.spouse_age(child, &mut event.detail.custom_tags);
                    self.once(&mut event.wife_age, child, age);
                }
                _ => self.unknown_tag(child, &mut event.detail.custom_tags),
            }
        }
        event
    }

    /// HUSB/WIFE under a family event carry only an AGE.
    fn spouse_age(&mut self, node: &'t Node, custom_tags: &mut Vec<CustomTag>) -> TaggedValue {
        let tree = self.tree;
        let mut age = None;
        for child in tree.children(node) {
            if child.tag == "AGE" {
                let v = self.tagged(child);
                self.once(&mut age, child, v);
            } else {
                self.unknown_tag(child, custom_tags);
            }
        }
        age.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::FamilyEventType;
    use crate::load;

    #[test]
    fn test_family_fields() {
        let src = "0 @F1@ FAM\n\
                   1 HUSB @I1@\n\
                   1 WIFE @I2@\n\
                   1 CHIL @I3@\n\
                   1 CHIL @I4@\n\
                   1 MARR\n\
                   2 DATE 2 FEB 1920\n\
                   2 HUSB\n\
                   3 AGE 25y\n\
                   1 SLGS\n\
                   2 TEMP SLAKE\n\
                   0 @I1@ INDI\n0 @I2@ INDI\n0 @I3@ INDI\n0 @I4@ INDI\n\
                   0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        let fam = &loaded.gedcom.families["@F1@"];
        assert_eq!(fam.spouses().collect::<Vec<_>>(), vec!["@I1@", "@I2@"]);
        assert_eq!(fam.children, vec!["@I3@", "@I4@"]);
        assert_eq!(fam.events[0].kind, FamilyEventType::Marriage);
        assert_eq!(fam.events[0].husband_age.as_ref().unwrap().as_str(), Some("25y"));
        assert_eq!(fam.lds_spouse_sealings[0].temple.as_ref().unwrap().as_str(), Some("SLAKE"));
    }

    #[test]
    fn test_second_husband_is_rejected() {
        let src = "0 @F1@ FAM\n1 HUSB @I1@\n1 HUSB @I2@\n0 @I1@ INDI\n0 @I2@ INDI\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert_eq!(loaded.diagnostics.errors.len(), 1);
        assert_eq!(loaded.gedcom.families["@F1@"].husband.as_deref(), Some("@I1@"));
    }
}
