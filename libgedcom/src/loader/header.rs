//! HEAD, SUBM and SUBN.

use super::Loader;
use crate::dialect::{CharacterSet, SupportedVersion};
use crate::model::{
    CharacterSetDecl, Corporation, GedcomVersion, Header, HeaderSourceData, RecordKind,
    SourceSystem, Submission,
};
use crate::tree::Node;

impl<'t> Loader<'t> {
    pub(super) fn load_header(&mut self, node: &'t Node) {
        if self.gedcom.header.is_some() {
            self.diagnostics.error(
                Some(node.line),
                "Only one HEAD record is allowed; this one was ignored",
            );
            return;
        }
        let tree = self.tree;
        let mut header = Header::default();
        for child in tree.children(node) {
            match child.tag.as_str() {
                "SOUR" => {
                    let v = self.load_source_system(child);
                    self.once(&mut header.source_system, child, v);
                }
                "DEST" => {
                    let v = self.tagged(child);
                    self.once(&mut header.destination_system, child, v);
                }
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
                    self.once(&mut header.date, child, date);
                    if time.is_some() {
                        header.time = time;
                    }
                }
                "CHAR" => {
                    let v = self.load_character_set(child);
                    self.once(&mut header.character_set, child, v);
                }
                "SUBM" => {
                    if let Some(xref) = self.pointer(child, RecordKind::Submitter) {
                        self.once(&mut header.submitter, child, xref);
                    }
                }
                "SUBN" => {
                    if let Some(xref) = self.pointer(child, RecordKind::Submission) {
                        self.once(&mut header.submission, child, xref);
                    }
                }
                "FILE" => {
                    let v = self.tagged(child);
                    self.once(&mut header.file_name, child, v);
                }
                "COPR" => {
                    let lines = self.lines(child, &mut header.custom_tags);
                    if lines.len() > 1 {
                        self.dialect.only_551(
                            child.line,
                            "a multi-line copyright",
                            &mut self.diagnostics,
                        );
                    }
                    header.copyright_data.extend(lines);
                }
                "GEDC" => {
                    let v = self.load_gedcom_version(child);
                    self.once(&mut header.gedcom_version, child, v);
                }
                "LANG" => {
                    let v = self.tagged(child);
                    self.once(&mut header.language, child, v);
                }
                "PLAC" => {
                    let mut form = None;
                    let mut custom_tags = Vec::new();
                    for gch in tree.children(child) {
                        if gch.tag == "FORM" {
                            let v = self.tagged(gch);
                            self.once(&mut form, gch, v);
                        } else {
                            self.unknown_tag(gch, &mut custom_tags);
                        }
                    }
                    // PLAC holds only FORM; its other children ride along with it.
                    let mut form = form.unwrap_or_default();
                    form.custom_tags.extend(custom_tags);
                    self.once(&mut header.place_hierarchy, child, form);
                }
                "NOTE" => {
                    let lines = self.lines(child, &mut header.custom_tags);
                    header.notes.extend(lines);
                }
                _ => self.unknown_tag(child, &mut header.custom_tags),
            }
        }
        self.gedcom.header = Some(header);
    }

    fn load_source_system(&mut self, node: &'t Node) -> SourceSystem {
        let tree = self.tree;
        let mut sour = SourceSystem {
            system_id: node.value.clone(),
            ..SourceSystem::default()
        };
        for child in tree.children(node) {
            match child.tag.as_str() {
                "VERS" => {
                    let v = self.tagged(child);
                    self.once(&mut sour.version_num, child, v);
                }
                "NAME" => {
                    let v = self.tagged(child);
                    self.once(&mut sour.product_name, child, v);
                }
                "CORP" => {
                    let v = self.load_corporation(child);
                    self.once(&mut sour.corporation, child, v);
                }
                "DATA" => {
                    let v = self.load_header_source_data(child);
                    self.once(&mut sour.source_data, child, v);
                }
                _ => self.unknown_tag(child, &mut sour.custom_tags),
            }
        }
        sour
    }

    fn load_corporation(&mut self, node: &'t Node) -> Corporation {
        let tree = self.tree;
        let mut corp = Corporation {
            business_name: node.value.clone(),
            ..Corporation::default()
        };
        for child in tree.children(node) {
            if !self.contact_tag(child, &mut corp.contact) {
                self.unknown_tag(child, &mut corp.custom_tags);
            }
        }
        corp
    }

    fn load_header_source_data(&mut self, node: &'t Node) -> HeaderSourceData {
        let tree = self.tree;
        let mut data = HeaderSourceData {
            name: node.value.clone(),
            ..HeaderSourceData::default()
        };
        for child in tree.children(node) {
            match child.tag.as_str() {
                "DATE" => {
                    let v = self.tagged(child);
                    self.once(&mut data.publish_date, child, v);
                }
                "COPR" => {
                    let v = self.tagged(child);
                    self.once(&mut data.copyright, child, v);
                }
                _ => self.unknown_tag(child, &mut data.custom_tags),
            }
        }
        data
    }

    fn load_character_set(&mut self, node: &'t Node) -> CharacterSetDecl {
        let tree = self.tree;
        let mut decl = CharacterSetDecl {
            name: node.value.clone(),
            ..CharacterSetDecl::default()
        };
        if let Some(name) = node.value.as_deref() {
            if CharacterSet::from_name(name).is_none() {
                self.diagnostics.error(
                    Some(node.line),
                    format!("Character set {} is not supported", name),
                );
            }
        }
        for child in tree.children(node) {
            match child.tag.as_str() {
                "VERS" => {
                    let v = self.tagged(child);
                    self.once(&mut decl.version_num, child, v);
                }
                _ => self.unknown_tag(child, &mut decl.custom_tags),
            }
        }
        decl
    }

    fn load_gedcom_version(&mut self, node: &'t Node) -> GedcomVersion {
        let tree = self.tree;
        let mut gedc = GedcomVersion::default();
        for child in tree.children(node) {
            match child.tag.as_str() {
                "VERS" => {
                    let v = self.tagged(child);
                    if let Some(text) = v.as_str() {
                        if SupportedVersion::parse(text).is_none() {
                            self.diagnostics.error(
                                Some(child.line),
                                format!(
                                    "GEDCOM version {} is not supported; loading as {}",
                                    text,
                                    self.dialect.version()
                                ),
                            );
                        }
                    }
                    self.once(&mut gedc.version, child, v);
                }
                "FORM" => {
                    let v = self.tagged(child);
                    self.once(&mut gedc.form, child, v);
                }
                _ => self.unknown_tag(child, &mut gedc.custom_tags),
            }
        }
        gedc
    }

    pub(super) fn load_submitter_record(&mut self, node: &'t Node) {
        let Some(xref) = self.define(RecordKind::Submitter, node) else {
            return;
        };
        let tree = self.tree;
        let mut subm = self
            .gedcom
            .submitters
            .get_mut(&xref)
            .map(std::mem::take)
            .unwrap_or_default();
        subm.xref = Some(xref.clone());
        for child in tree.children(node) {
            if self.contact_tag(child, &mut subm.contact) {
                continue;
            }
            match child.tag.as_str() {
                "NAME" => {
                    let v = self.tagged(child);
                    self.once(&mut subm.name, child, v);
                }
                "OBJE" => self.push_multimedia_link(child, &mut subm.multimedia),
                "LANG" => subm.language_pref.push(self.tagged(child)),
                "RFN" => {
                    let v = self.tagged(child);
                    self.once(&mut subm.registration_file_number, child, v);
                }
                "RIN" => {
                    let v = self.tagged(child);
                    self.once(&mut subm.rec_id_number, child, v);
                }
                "NOTE" => self.push_note(child, &mut subm.notes),
                "REFN" => subm.user_references.push(self.load_user_reference(child)),
                "CHAN" => {
                    let v = self.load_change_date(child);
                    self.once(&mut subm.change_date, child, v);
                }
                _ => self.unknown_tag(child, &mut subm.custom_tags),
            }
        }
        self.gedcom.submitters.insert(xref, subm);
    }

    pub(super) fn load_submission_record(&mut self, node: &'t Node) {
        let Some(xref) = self.define(RecordKind::Submission, node) else {
            return;
        };
        let tree = self.tree;
        let mut subn = match self.gedcom.submission.take() {
            Some(existing) if existing.xref.as_deref() == Some(xref.as_str()) => existing,
            Some(existing) => {
                self.diagnostics.error(
                    Some(node.line),
                    format!(
                        "Only one SUBN record is allowed; {} replaces {}",
                        xref,
                        existing.xref.as_deref().unwrap_or("the earlier one")
                    ),
                );
                Submission::new(&xref)
            }
            None => Submission::new(&xref),
        };
        for child in tree.children(node) {
            match child.tag.as_str() {
                "SUBM" => {
                    if let Some(x) = self.pointer(child, RecordKind::Submitter) {
                        self.once(&mut subn.submitter, child, x);
                    }
                }
                "FAMF" => {
                    let v = self.tagged(child);
                    self.once(&mut subn.name_of_family_file, child, v);
                }
                "TEMP" => {
                    let v = self.tagged(child);
                    self.once(&mut subn.temple_code, child, v);
                }
                "ANCE" => {
                    let v = self.tagged(child);
                    self.once(&mut subn.ancestors_count, child, v);
                }
                "DESC" => {
                    let v = self.tagged(child);
                    self.once(&mut subn.descendants_count, child, v);
                }
                "ORDI" => {
                    let v = self.tagged(child);
                    self.once(&mut subn.ordinance_process_flag, child, v);
                }
                "RIN" => {
                    let v = self.tagged(child);
                    self.once(&mut subn.rec_id_number, child, v);
                }
                "NOTE" => self.push_note(child, &mut subn.notes),
                _ => self.unknown_tag(child, &mut subn.custom_tags),
            }
        }
        self.gedcom.submission = Some(subn);
    }
}

#[cfg(test)]
mod tests {
    use crate::dialect::{CharacterSet, SupportedVersion};
    use crate::load;

    const HEAD: &str = "0 HEAD\n\
        1 SOUR MyApp\n\
        2 VERS 2.0\n\
        2 NAME My Application\n\
        2 CORP Acme\n\
        3 PHON 555-1212\n\
        1 DATE 1 JAN 2020\n\
        2 TIME 12:00:00\n\
        1 SUBM @U1@\n\
        1 GEDC\n\
        2 VERS 5.5.1\n\
        2 FORM LINEAGE-LINKED\n\
        1 CHAR UTF-8\n\
        1 PLAC\n\
        2 FORM City, County, State\n\
        0 @U1@ SUBM\n\
        1 NAME Jane Submitter\n\
        1 LANG English\n\
        0 TRLR\n";

    #[test]
    fn test_header_fields() {
        let loaded = load(HEAD).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        let g = &loaded.gedcom;
        let header = g.header.as_ref().unwrap();
        let sour = header.source_system.as_ref().unwrap();
        assert_eq!(sour.system_id.as_deref(), Some("MyApp"));
        assert_eq!(
            sour.corporation.as_ref().unwrap().contact.phone_numbers[0].as_str(),
            Some("555-1212")
        );
        assert_eq!(header.time.as_ref().unwrap().as_str(), Some("12:00:00"));
        assert_eq!(header.submitter.as_deref(), Some("@U1@"));
        assert_eq!(
            header.character_set.as_ref().unwrap().character_set(),
            Some(CharacterSet::Utf8)
        );
        assert_eq!(
            header.place_hierarchy.as_ref().unwrap().as_str(),
            Some("City, County, State")
        );
        assert_eq!(g.declared_version(), Some(SupportedVersion::V5_5_1));
        assert_eq!(g.submitters["@U1@"].language_pref.len(), 1);
    }

    #[test]
    fn test_unsupported_version_and_charset() {
        let src = "0 HEAD\n1 GEDC\n2 VERS 7.0\n1 CHAR EBCDIC\n0 TRLR\n";
        let loaded = load(src).unwrap();
        let errors = loaded.diagnostics.error_messages();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("GEDCOM version 7.0 is not supported"));
        assert!(errors[1].contains("Character set EBCDIC is not supported"));
    }

    #[test]
    fn test_multi_line_copyright_in_55() {
        let src = "0 HEAD\n1 GEDC\n2 VERS 5.5\n1 COPR Line one\n2 CONT Line two\n0 TRLR\n";
        let loaded = load(src).unwrap();
        let header = loaded.gedcom.header.as_ref().unwrap();
        assert_eq!(header.copyright_data, vec!["Line one", "Line two"]);
        assert_eq!(loaded.diagnostics.warnings.len(), 1);
    }

    #[test]
    fn test_submission_record() {
        let src = "0 HEAD\n1 SUBN @SN@\n0 @SN@ SUBN\n1 SUBM @U1@\n1 ANCE 3\n0 @U1@ SUBM\n1 NAME X\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        let subn = loaded.gedcom.submission.as_ref().unwrap();
        assert_eq!(subn.xref.as_deref(), Some("@SN@"));
        assert_eq!(subn.submitter.as_deref(), Some("@U1@"));
        assert_eq!(subn.ancestors_count.as_ref().unwrap().as_str(), Some("3"));
    }
}
