//! SOUR and REPO records.

use super::Loader;
use crate::model::{CallNumber, EventRecorded, RecordKind, RepositoryCitation, SourceData};
use crate::tree::Node;

impl<'t> Loader<'t> {
    pub(super) fn load_source_record(&mut self, node: &'t Node) {
        let Some(xref) = self.define(RecordKind::Source, node) else {
            return;
        };
        let tree = self.tree;
        let mut sour = self
            .gedcom
            .sources
            .get_mut(&xref)
            .map(std::mem::take)
            .unwrap_or_default();
        sour.xref = Some(xref.clone());

        for child in tree.children(node) {
            match child.tag.as_str() {
                "DATA" => {
                    let v = self.load_source_data(child);
                    self.once(&mut sour.data, child, v);
                }
                "AUTH" => {
                    let lines = self.lines(child, &mut sour.custom_tags);
                    sour.originators_authors.extend(lines);
                }
                "TITL" => {
                    let lines = self.lines(child, &mut sour.custom_tags);
                    sour.title.extend(lines);
                }
                "PUBL" => {
                    let lines = self.lines(child, &mut sour.custom_tags);
                    sour.publication_facts.extend(lines);
                }
                "TEXT" => {
                    let lines = self.lines(child, &mut sour.custom_tags);
                    sour.source_text.extend(lines);
                }
                "ABBR" => {
                    let v = self.tagged(child);
                    self.once(&mut sour.source_filed_by, child, v);
                }
                "REPO" => {
                    let v = self.load_repository_citation(child);
                    sour.repository_citations.push(v);
                }
                "OBJE" => self.push_multimedia_link(child, &mut sour.multimedia),
                "NOTE" => self.push_note(child, &mut sour.notes),
                "REFN" => sour.user_references.push(self.load_user_reference(child)),
                "RIN" => {
                    let v = self.tagged(child);
                    self.once(&mut sour.rec_id_number, child, v);
                }
                "CHAN" => {
                    let v = self.load_change_date(child);
                    self.once(&mut sour.change_date, child, v);
                }
                _ => self.unknown_tag(child, &mut sour.custom_tags),
            }
        }
        self.gedcom.sources.insert(xref, sour);
    }

    fn load_source_data(&mut self, node: &'t Node) -> SourceData {
        let tree = self.tree;
        let mut data = SourceData::default();
        for child in tree.children(node) {
            match child.tag.as_str() {
                "EVEN" => {
                    let mut even = EventRecorded {
                        event_type: child.value.clone(),
                        ..EventRecorded::default()
                    };
                    for gch in tree.children(child) {
                        match gch.tag.as_str() {
                            "DATE" => {
                                let v = self.tagged(gch);
                                self.once(&mut even.date_period, gch, v);
                            }
                            "PLAC" => {
                                let v = self.tagged(gch);
                                self.once(&mut even.jurisdiction, gch, v);
                            }
                            _ => self.unknown_tag(gch, &mut even.custom_tags),
                        }
                    }
                    data.events_recorded.push(even);
                }
                "AGNC" => {
                    let v = self.tagged(child);
                    self.once(&mut data.responsible_agency, child, v);
                }
                "NOTE" => self.push_note(child, &mut data.notes),
                _ => self.unknown_tag(child, &mut data.custom_tags),
            }
        }
        data
    }

    /// REPO under a source. The pointer may be absent when the citation
    /// only carries notes or call numbers.
    fn load_repository_citation(&mut self, node: &'t Node) -> RepositoryCitation {
        let tree = self.tree;
        let mut cite = RepositoryCitation::default();
        if node.value.is_some() {
            cite.repository = self.pointer(node, RecordKind::Repository);
        }
        for child in tree.children(node) {
            match child.tag.as_str() {
                "NOTE" => self.push_note(child, &mut cite.notes),
                "CALN" => {
                    let mut caln = CallNumber {
                        call_number: child.value.clone(),
                        ..CallNumber::default()
                    };
                    for gch in tree.children(child) {
                        match gch.tag.as_str() {
                            "MEDI" => {
                                let v = self.tagged(gch);
                                self.once(&mut caln.media_type, gch, v);
                            }
                            _ => self.unknown_tag(gch, &mut caln.custom_tags),
                        }
                    }
                    cite.call_numbers.push(caln);
                }
                _ => self.unknown_tag(child, &mut cite.custom_tags),
            }
        }
        cite
    }

    pub(super) fn load_repository_record(&mut self, node: &'t Node) {
        let Some(xref) = self.define(RecordKind::Repository, node) else {
            return;
        };
        let tree = self.tree;
        let mut repo = self
            .gedcom
            .repositories
            .get_mut(&xref)
            .map(std::mem::take)
            .unwrap_or_default();
        repo.xref = Some(xref.clone());

        for child in tree.children(node) {
            if self.contact_tag(child, &mut repo.contact) {
                continue;
            }
            match child.tag.as_str() {
                "NAME" => {
                    let v = self.tagged(child);
                    self.once(&mut repo.name, child, v);
                }
                "NOTE" => self.push_note(child, &mut repo.notes),
                "REFN" => repo.user_references.push(self.load_user_reference(child)),
                "RIN" => {
                    let v = self.tagged(child);
                    self.once(&mut repo.rec_id_number, child, v);
                }
                "CHAN" => {
                    let v = self.load_change_date(child);
                    self.once(&mut repo.change_date, child, v);
                }
                _ => self.unknown_tag(child, &mut repo.custom_tags),
            }
        }
        self.gedcom.repositories.insert(xref, repo);
    }
}

#[cfg(test)]
mod tests {
    use crate::load;

    #[test]
    fn test_source_and_repository() {
        let src = "0 @S1@ SOUR\n\
                   1 TITL Parish register\n\
                   2 CONC s of St. Mary\n\
                   1 AUTH Church of St. Mary\n\
                   1 DATA\n\
                   2 EVEN BIRT, DEAT\n\
                   3 DATE FROM 1800 TO 1850\n\
                   2 AGNC Diocese\n\
                   1 REPO @R1@\n\
                   2 CALN 123.45\n\
                   3 MEDI Book\n\
                   0 @R1@ REPO\n\
                   1 NAME County Archive\n\
                   0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        let g = &loaded.gedcom;
        let sour = &g.sources["@S1@"];
        assert_eq!(sour.title, vec!["Parish registers of St. Mary"]);
        let data = sour.data.as_ref().unwrap();
        assert_eq!(data.events_recorded[0].event_type.as_deref(), Some("BIRT, DEAT"));
        let repo_cite = &sour.repository_citations[0];
        assert_eq!(repo_cite.repository.as_deref(), Some("@R1@"));
        assert_eq!(
            repo_cite.call_numbers[0].media_type.as_ref().unwrap().as_str(),
            Some("Book")
        );
        assert_eq!(
            g.repositories["@R1@"].name.as_ref().unwrap().as_str(),
            Some("County Archive")
        );
    }

    #[test]
    fn test_repository_citation_without_pointer() {
        let src = "0 @S1@ SOUR\n1 REPO\n2 NOTE Held privately\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean());
        let cite = &loaded.gedcom.sources["@S1@"].repository_citations[0];
        assert!(cite.repository.is_none());
        assert_eq!(cite.notes.len(), 1);
    }
}
