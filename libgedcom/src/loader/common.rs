//! Substructures shared across record kinds: addresses, notes, citations,
//! places, event details and LDS ordinances.

use super::Loader;
use crate::model::{
    Address, ChangeDate, Citation, CitationData, CitationWithSource, CitationWithoutSource,
    ContactInfo, CustomTag, EventDetail, LdsOrdinance, LdsOrdinanceType, NameVariation, Note,
    NoteStructure, Place, RecordKind, UserReference,
};
use crate::text;
use crate::tokenizer::is_xref;
use crate::tree::Node;

impl<'t> Loader<'t> {
    // =========================================================================
    // Contact information
    // =========================================================================

    /// Handle ADDR, PHON, WWW, FAX and EMAIL. Returns `false` for other tags.
    pub(super) fn contact_tag(&mut self, node: &'t Node, contact: &mut ContactInfo) -> bool {
        match node.tag.as_str() {
            "ADDR" => {
                let address = self.load_address(node);
                self.once(&mut contact.address, node, address);
            }
            "PHON" => contact.phone_numbers.push(self.tagged(node)),
            "WWW" => {
                self.dialect.only_551(node.line, "WWW", &mut self.diagnostics);
                contact.www_urls.push(self.tagged(node));
            }
            "FAX" => {
                self.dialect.only_551(node.line, "FAX", &mut self.diagnostics);
                contact.fax_numbers.push(self.tagged(node));
            }
            "EMAIL" => {
                self.dialect
                    .only_551(node.line, "EMAIL", &mut self.diagnostics);
                contact.emails.push(self.tagged(node));
            }
            _ => return false,
        }
        true
    }

    fn load_address(&mut self, node: &'t Node) -> Address {
        let tree = self.tree;
        let mut address = Address {
            lines: text::first_line(node),
            ..Address::default()
        };
        for child in tree.children(node) {
            if text::continue_lines(&mut address.lines, child) {
                continue;
            }
            match child.tag.as_str() {
                "ADR1" => {
                    let v = self.tagged(child);
                    self.once(&mut address.line1, child, v);
                }
                "ADR2" => {
                    let v = self.tagged(child);
                    self.once(&mut address.line2, child, v);
                }
                "ADR3" => {
                    self.dialect.only_551(child.line, "ADR3", &mut self.diagnostics);
                    let v = self.tagged(child);
                    self.once(&mut address.line3, child, v);
                }
                "CITY" => {
                    let v = self.tagged(child);
                    self.once(&mut address.city, child, v);
                }
                "STAE" => {
                    let v = self.tagged(child);
                    self.once(&mut address.state_province, child, v);
                }
                "POST" => {
                    let v = self.tagged(child);
                    self.once(&mut address.postal_code, child, v);
                }
                "CTRY" => {
                    let v = self.tagged(child);
                    self.once(&mut address.country, child, v);
                }
                _ => self.unknown_tag(child, &mut address.custom_tags),
            }
        }
        address
    }

    // =========================================================================
    // Notes
    // =========================================================================

    /// NOTE attached to some structure: a pointer, or inline text.
    pub(super) fn push_note(&mut self, node: &'t Node, notes: &mut Vec<NoteStructure>) {
        if node.value.as_deref().map_or(false, is_xref) {
            let Some(xref) = self.pointer(node, RecordKind::Note) else {
                return;
            };
            let custom_tags = self.pointer_custom_tags(node);
            notes.push(NoteStructure::Reference { xref, custom_tags });
        } else if node.xref.is_some() {
            // A note record defined in place of a note structure.
            self.load_note_record(node);
            if let Some(xref) = &node.xref {
                notes.push(NoteStructure::reference(xref));
            }
        } else {
            let mut note = Note::default();
            self.note_body(node, &mut note);
            notes.push(NoteStructure::Inline(note));
        }
    }

    pub(super) fn load_note_record(&mut self, node: &'t Node) {
        let Some(xref) = self.define(RecordKind::Note, node) else {
            return;
        };
        let mut note = self
            .gedcom
            .notes
            .get_mut(&xref)
            .map(std::mem::take)
            .unwrap_or_default();
        note.xref = Some(xref.clone());
        self.note_body(node, &mut note);
        self.gedcom.notes.insert(xref, note);
    }

    fn note_body(&mut self, node: &'t Node, note: &mut Note) {
        let tree = self.tree;
        note.lines.extend(text::first_line(node));
        for child in tree.children(node) {
            if text::continue_lines(&mut note.lines, child) {
                continue;
            }
            match child.tag.as_str() {
                "SOUR" => note.citations.push(self.load_citation(child)),
                "REFN" => note.user_references.push(self.load_user_reference(child)),
                "RIN" => {
                    let v = self.tagged(child);
                    self.once(&mut note.rec_id_number, child, v);
                }
                "CHAN" => {
                    let v = self.load_change_date(child);
                    self.once(&mut note.change_date, child, v);
                }
                _ => self.unknown_tag(child, &mut note.custom_tags),
            }
        }
    }

    // =========================================================================
    // Record bookkeeping structures
    // =========================================================================

    pub(super) fn load_change_date(&mut self, node: &'t Node) -> ChangeDate {
        let tree = self.tree;
        let mut chan = ChangeDate::default();
        for child in tree.children(node) {
            match child.tag.as_str() {
                "DATE" => {
                    let mut time = None;
                    let date = self.tagged_with(child, |this, gch| {
                        if gch.tag == "TIME" {
                            let v = this.tagged(gch);
                            this.once(&mut time, gch, v);
                            true
                        } else {
                            false
                        }
                    });
                    self.once(&mut chan.date, child, date);
                    if time.is_some() {
                        chan.time = time;
                    }
                }
                "NOTE" => self.push_note(child, &mut chan.notes),
                _ => self.unknown_tag(child, &mut chan.custom_tags),
            }
        }
        chan
    }

    pub(super) fn load_user_reference(&mut self, node: &'t Node) -> UserReference {
        let tree = self.tree;
        let mut refn = UserReference {
            reference_num: node.value.as_deref().map(Into::into),
            ..UserReference::default()
        };
        for child in tree.children(node) {
            match child.tag.as_str() {
                "TYPE" => {
                    let v = self.tagged(child);
                    self.once(&mut refn.kind, child, v);
                }
                _ => self.unknown_tag(child, &mut refn.custom_tags),
            }
        }
        refn
    }

    // =========================================================================
    // Citations
    // =========================================================================

    pub(super) fn load_citation(&mut self, node: &'t Node) -> Citation {
        match node.value.as_deref() {
            Some(value) if is_xref(value) => {
                self.ensure(RecordKind::Source, value, node.line);
                Citation::WithSource(self.citation_with_source(node, value))
            }
            _ => Citation::WithoutSource(self.citation_without_source(node)),
        }
    }

    fn citation_with_source(&mut self, node: &'t Node, source: &str) -> CitationWithSource {
        let tree = self.tree;
        let mut cite = CitationWithSource {
            source: source.to_string(),
            ..CitationWithSource::default()
        };
        for child in tree.children(node) {
            match child.tag.as_str() {
                "PAGE" => {
                    let v = self.tagged(child);
                    self.once(&mut cite.where_in_source, child, v);
                }
                "EVEN" => {
                    let mut role = None;
                    let event = self.tagged_with(child, |this, gch| {
                        if gch.tag == "ROLE" {
                            let v = this.tagged(gch);
                            this.once(&mut role, gch, v);
                            true
                        } else {
                            false
                        }
                    });
                    self.once(&mut cite.event_cited, child, event);
                    if role.is_some() {
                        cite.role_in_event = role;
                    }
                }
                "DATA" => {
                    let data = self.load_citation_data(child);
                    cite.data.push(data);
                }
                "QUAY" => {
                    let v = self.tagged(child);
                    self.once(&mut cite.certainty, child, v);
                }
                "NOTE" => self.push_note(child, &mut cite.notes),
                "OBJE" => self.push_multimedia_link(child, &mut cite.multimedia),
                _ => self.unknown_tag(child, &mut cite.custom_tags),
            }
        }
        cite
    }

    fn load_citation_data(&mut self, node: &'t Node) -> CitationData {
        let tree = self.tree;
        let mut data = CitationData::default();
        for child in tree.children(node) {
            match child.tag.as_str() {
                "DATE" => {
                    let v = self.tagged(child);
                    self.once(&mut data.entry_date, child, v);
                }
                "TEXT" => {
                    let lines = self.lines(child, &mut data.custom_tags);
                    data.source_text.push(lines);
                }
                _ => self.unknown_tag(child, &mut data.custom_tags),
            }
        }
        data
    }

    fn citation_without_source(&mut self, node: &'t Node) -> CitationWithoutSource {
        let tree = self.tree;
        let mut cite = CitationWithoutSource {
            description: text::first_line(node),
            ..CitationWithoutSource::default()
        };
        for child in tree.children(node) {
            if text::continue_lines(&mut cite.description, child) {
                continue;
            }
            match child.tag.as_str() {
                "TEXT" => {
                    let lines = self.lines(child, &mut cite.custom_tags);
                    cite.text_from_source.push(lines);
                }
                "NOTE" => self.push_note(child, &mut cite.notes),
                _ => self.unknown_tag(child, &mut cite.custom_tags),
            }
        }
        cite
    }

    // =========================================================================
    // Places
    // =========================================================================

    pub(super) fn load_place(&mut self, node: &'t Node) -> Place {
        let tree = self.tree;
        let mut place = Place {
            name: node.value.clone(),
            ..Place::default()
        };
        for child in tree.children(node) {
            if text::continue_value(&mut place.name, child) {
                continue;
            }
            match child.tag.as_str() {
                "FORM" => {
                    let v = self.tagged(child);
                    self.once(&mut place.form, child, v);
                }
                "SOUR" => place.citations.push(self.load_citation(child)),
                "NOTE" => self.push_note(child, &mut place.notes),
                "ROMN" => {
                    self.dialect.only_551(child.line, "ROMN", &mut self.diagnostics);
                    let variation = self.load_name_variation(child);
                    place.romanized.push(variation);
                }
                "FONE" => {
                    self.dialect.only_551(child.line, "FONE", &mut self.diagnostics);
                    let variation = self.load_name_variation(child);
                    place.phonetic.push(variation);
                }
                "MAP" => {
                    self.dialect.only_551(child.line, "MAP", &mut self.diagnostics);
                    self.load_map(child, &mut place);
                }
                _ => self.unknown_tag(child, &mut place.custom_tags),
            }
        }
        place
    }

    fn load_name_variation(&mut self, node: &'t Node) -> NameVariation {
        let tree = self.tree;
        let mut variation = NameVariation {
            variation: node.value.clone(),
            ..NameVariation::default()
        };
        for child in tree.children(node) {
            match child.tag.as_str() {
                "TYPE" => {
                    let v = self.tagged(child);
                    self.once(&mut variation.variation_type, child, v);
                }
                _ => self.unknown_tag(child, &mut variation.custom_tags),
            }
        }
        variation
    }

    fn load_map(&mut self, node: &'t Node, place: &mut Place) {
        let tree = self.tree;
        for child in tree.children(node) {
            match child.tag.as_str() {
                "LATI" => {
                    let v = self.tagged(child);
                    self.once(&mut place.latitude, child, v);
                }
                "LONG" => {
                    let v = self.tagged(child);
                    self.once(&mut place.longitude, child, v);
                }
                _ => self.unknown_tag(child, &mut place.custom_tags),
            }
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Handle a tag common to every event and attribute. Returns `false`
    /// for tags the caller must handle itself.
    pub(super) fn event_detail_tag(&mut self, node: &'t Node, detail: &mut EventDetail) -> bool {
        if text::continue_value(&mut detail.description, node)
            || self.contact_tag(node, &mut detail.contact)
        {
            return true;
        }
        match node.tag.as_str() {
            "TYPE" => {
                let v = self.tagged(node);
                self.once(&mut detail.subtype, node, v);
            }
            "DATE" => {
                let v = self.tagged(node);
                self.once(&mut detail.date, node, v);
            }
            "PLAC" => {
                let v = self.load_place(node);
                self.once(&mut detail.place, node, v);
            }
            "AGE" => {
                let v = self.tagged(node);
                self.once(&mut detail.age, node, v);
            }
            "CAUS" => {
                let v = self.tagged(node);
                self.once(&mut detail.cause, node, v);
            }
            "AGNC" => {
                let v = self.tagged(node);
                self.once(&mut detail.responsible_agency, node, v);
            }
            "RELI" => {
                self.dialect
                    .only_551(node.line, "RELI on an event", &mut self.diagnostics);
                let v = self.tagged(node);
                self.once(&mut detail.religious_affiliation, node, v);
            }
            "RESN" => {
                self.dialect
                    .only_551(node.line, "RESN on an event", &mut self.diagnostics);
                let v = self.tagged(node);
                self.once(&mut detail.restriction_notice, node, v);
            }
            "SOUR" => detail.citations.push(self.load_citation(node)),
            "NOTE" => self.push_note(node, &mut detail.notes),
            "OBJE" => self.push_multimedia_link(node, &mut detail.multimedia),
            _ => return false,
        }
        true
    }

    pub(super) fn load_lds_ordinance(
        &mut self,
        node: &'t Node,
        kind: LdsOrdinanceType,
    ) -> LdsOrdinance {
        let tree = self.tree;
        let mut ord = LdsOrdinance::new(kind);
        ord.description = node.value.clone();
        for child in tree.children(node) {
            match child.tag.as_str() {
                "DATE" => {
                    let v = self.tagged(child);
                    self.once(&mut ord.date, child, v);
                }
                "PLAC" => {
                    let v = self.tagged(child);
                    self.once(&mut ord.place, child, v);
                }
                "STAT" => {
                    let v = self.tagged(child);
                    self.once(&mut ord.status, child, v);
                }
                "TEMP" => {
                    let v = self.tagged(child);
                    self.once(&mut ord.temple, child, v);
                }
                "FAMC" if kind == LdsOrdinanceType::ChildSealing => {
                    if let Some(xref) = self.pointer(child, RecordKind::Family) {
                        self.once(&mut ord.family_child, child, xref);
                    }
                }
                "SOUR" => ord.citations.push(self.load_citation(child)),
                "NOTE" => self.push_note(child, &mut ord.notes),
                _ => self.unknown_tag(child, &mut ord.custom_tags),
            }
        }
        ord
    }

    /// Children of a pointer line that carries nothing but custom tags.
    pub(super) fn pointer_custom_tags(&mut self, node: &'t Node) -> Vec<CustomTag> {
        let tree = self.tree;
        let mut custom_tags = Vec::new();
        for child in tree.children(node) {
            self.unknown_tag(child, &mut custom_tags);
        }
        custom_tags
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Citation, NoteStructure};
    use crate::load;

    #[test]
    fn test_inline_note_with_continuations() {
        let src = "0 @I1@ INDI\n1 NOTE First\n2 CONC  half\n2 CONT Second\n0 TRLR\n";
        let loaded = load(src).unwrap();
        let ind = &loaded.gedcom.individuals["@I1@"];
        match &ind.notes[0] {
            NoteStructure::Inline(note) => assert_eq!(note.lines, vec!["First half", "Second"]),
            other => panic!("expected inline note, got {:?}", other),
        }
    }

    #[test]
    fn test_note_reference_and_record() {
        let src = "0 @I1@ INDI\n1 NOTE @N1@\n0 @N1@ NOTE Shared\n1 CONT text\n0 TRLR\n";
        let loaded = load(src).unwrap();
        let g = &loaded.gedcom;
        assert_eq!(g.individuals["@I1@"].notes[0].xref(), Some("@N1@"));
        assert_eq!(g.notes["@N1@"].lines, vec!["Shared", "text"]);
        assert!(loaded.diagnostics.is_clean());
    }

    #[test]
    fn test_citation_forms() {
        let src = "0 @I1@ INDI\n\
                   1 SOUR @S1@\n\
                   2 PAGE 42\n\
                   2 EVEN BIRT\n\
                   3 ROLE CHIL\n\
                   2 DATA\n\
                   3 TEXT Quoted\n\
                   4 CONT more\n\
                   2 QUAY 3\n\
                   1 SOUR A family bible\n\
                   2 TEXT Inside cover\n\
                   0 @S1@ SOUR\n\
                   0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        let ind = &loaded.gedcom.individuals["@I1@"];
        match &ind.citations[0] {
            Citation::WithSource(c) => {
                assert_eq!(c.source, "@S1@");
                assert_eq!(c.where_in_source.as_ref().unwrap().as_str(), Some("42"));
                assert_eq!(c.role_in_event.as_ref().unwrap().as_str(), Some("CHIL"));
                assert_eq!(c.data[0].source_text[0], vec!["Quoted", "more"]);
                assert_eq!(c.certainty.as_ref().unwrap().as_str(), Some("3"));
            }
            other => panic!("expected citation with source, got {:?}", other),
        }
        match &ind.citations[1] {
            Citation::WithoutSource(c) => {
                assert_eq!(c.description, vec!["A family bible"]);
                assert_eq!(c.text_from_source, vec![vec!["Inside cover".to_string()]]);
            }
            other => panic!("expected citation without source, got {:?}", other),
        }
    }

    #[test]
    fn test_address_and_contact_in_55() {
        let src = "0 HEAD\n1 GEDC\n2 VERS 5.5\n\
                   0 @R1@ REPO\n1 NAME Archive\n1 ADDR 1 Main St\n2 CONT Springfield\n2 CITY Springfield\n1 EMAIL a@b.c\n\
                   0 TRLR\n";
        let loaded = load(src).unwrap();
        let repo = &loaded.gedcom.repositories["@R1@"];
        let addr = repo.contact.address.as_ref().unwrap();
        assert_eq!(addr.lines, vec!["1 Main St", "Springfield"]);
        assert_eq!(addr.city.as_ref().unwrap().as_str(), Some("Springfield"));
        assert_eq!(repo.contact.emails.len(), 1);
        let warnings = loaded.diagnostics.warning_messages();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Line 9: "), "{}", warnings[0]);
        assert!(warnings[0].contains("EMAIL was specified, which is a GEDCOM 5.5.1 feature"));
    }

    #[test]
    fn test_place_with_map() {
        let src = "0 @I1@ INDI\n1 BIRT\n2 PLAC Here\n3 MAP\n4 LATI N10.0\n4 LONG W20.0\n3 ROMN Hier\n4 TYPE pinyin\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean());
        let place = loaded.gedcom.individuals["@I1@"].events[0]
            .detail
            .place
            .clone()
            .unwrap();
        assert_eq!(place.name.as_deref(), Some("Here"));
        assert_eq!(place.latitude.unwrap().as_str(), Some("N10.0"));
        assert_eq!(place.romanized[0].variation.as_deref(), Some("Hier"));
    }
}
