//! OBJE records and links.
//!
//! 5.5 and 5.5.1 lay out multimedia differently. The layout actually used is
//! inferred from the shape of each structure (how many FILE and FORM
//! children it has) rather than trusted from the header, and a mismatch
//! with the declared version is reported as a warning.

use super::Loader;
use crate::model::{FileReference, Multimedia, MultimediaLink, RecordKind};
use crate::tokenizer::is_xref;
use crate::tree::Node;

impl<'t> Loader<'t> {
    /// OBJE attached to some structure: a pointer, or an inline object.
    pub(super) fn push_multimedia_link(&mut self, node: &'t Node, links: &mut Vec<MultimediaLink>) {
        if node.value.as_deref().map_or(false, is_xref) {
            let Some(xref) = self.pointer(node, RecordKind::Multimedia) else {
                return;
            };
            let custom_tags = self.pointer_custom_tags(node);
            links.push(MultimediaLink::Reference { xref, custom_tags });
            return;
        }

        let tree = self.tree;
        let files = tree.children(node).filter(|c| c.tag == "FILE").count();
        let forms = tree.children(node).filter(|c| c.tag == "FORM").count();
        if self.dialect.is_55() {
            if files > 1 {
                self.dialect.only_551(
                    node.line,
                    "more than one FILE on a multimedia link",
                    &mut self.diagnostics,
                );
            }
            if forms == 0 {
                self.dialect.only_551(
                    node.line,
                    "a multimedia link without a FORM tag",
                    &mut self.diagnostics,
                );
            }
        } else if forms > 0 {
            self.dialect.only_55(
                node.line,
                "FORM directly on a multimedia link",
                &mut self.diagnostics,
            );
        }
        if forms > 1 {
            self.diagnostics.error(
                Some(node.line),
                "Multimedia link has more than one FORM tag; the link was not loaded",
            );
            return;
        }

        let media = if files > 1 || forms < files {
            self.inline_media_551(node)
        } else {
            self.inline_media_55(node)
        };
        links.push(MultimediaLink::Inline(media));
    }

    /// Inline 5.5 object: FORM, TITL and FILE side by side.
    fn inline_media_55(&mut self, node: &'t Node) -> Multimedia {
        let tree = self.tree;
        let mut media = Multimedia::default();
        let mut file_ref = FileReference::default();
        for child in tree.children(node) {
            match child.tag.as_str() {
                "FORM" => {
                    let v = self.tagged(child);
                    self.once(&mut file_ref.format, child, v);
                }
                "TITL" => {
                    let v = self.tagged(child);
                    self.once(&mut media.embedded_title, child, v);
                }
                "FILE" => {
                    let v = self.tagged(child);
                    self.once(&mut file_ref.reference_to_file, child, v);
                }
                "NOTE" => self.push_note(child, &mut media.notes),
                _ => self.unknown_tag(child, &mut media.custom_tags),
            }
        }
        media.file_references.push(file_ref);
        media
    }

    /// Inline 5.5.1 object: one or more FILE, each with its own FORM.
    fn inline_media_551(&mut self, node: &'t Node) -> Multimedia {
        let tree = self.tree;
        let mut media = Multimedia::default();
        for child in tree.children(node) {
            match child.tag.as_str() {
                "FILE" => {
                    let file_ref = self.load_file_reference(child, true);
                    media.file_references.push(file_ref);
                }
                "TITL" => {
                    let v = self.tagged(child);
                    self.once(&mut media.embedded_title, child, v);
                }
                "NOTE" => {
                    self.dialect.only_55(
                        child.line,
                        "NOTE on a multimedia link",
                        &mut self.diagnostics,
                    );
                    self.push_note(child, &mut media.notes);
                }
                _ => self.unknown_tag(child, &mut media.custom_tags),
            }
        }
        media
    }

    /// FILE with FORM (and MEDI/TYPE below it) and TITL.
    fn load_file_reference(&mut self, node: &'t Node, form_required: bool) -> FileReference {
        let tree = self.tree;
        let mut file_ref = FileReference {
            reference_to_file: node.value.as_deref().map(Into::into),
            ..FileReference::default()
        };
        for child in tree.children(node) {
            match child.tag.as_str() {
                "FORM" => {
                    let mut media_type = None;
                    let format = self.tagged_with(child, |this, gch| {
                        if gch.tag == "MEDI" || gch.tag == "TYPE" {
                            let v = this.tagged(gch);
                            this.once(&mut media_type, gch, v);
                            true
                        } else {
                            false
                        }
                    });
                    self.once(&mut file_ref.format, child, format);
                    if media_type.is_some() {
                        file_ref.media_type = media_type;
                    }
                }
                "TITL" => {
                    let v = self.tagged(child);
                    self.once(&mut file_ref.title, child, v);
                }
                _ => self.unknown_tag(child, &mut file_ref.custom_tags),
            }
        }
        if form_required && file_ref.format.is_none() {
            self.diagnostics.error(
                Some(node.line),
                "FORM tag not found under FILE reference",
            );
        }
        file_ref
    }

    pub(super) fn load_multimedia_record(&mut self, node: &'t Node) {
        let Some(xref) = self.define(RecordKind::Multimedia, node) else {
            return;
        };
        let tree = self.tree;
        let mut media = self
            .gedcom
            .multimedia
            .get_mut(&xref)
            .map(std::mem::take)
            .unwrap_or_default();
        media.xref = Some(xref.clone());

        let files = tree.children(node).filter(|c| c.tag == "FILE").count();
        if files > 0 {
            self.dialect.only_551(
                node.line,
                "a 5.5.1-style multimedia record",
                &mut self.diagnostics,
            );
        } else {
            self.dialect.only_55(
                node.line,
                "a 5.5-style multimedia record",
                &mut self.diagnostics,
            );
        }

        for child in tree.children(node) {
            match child.tag.as_str() {
                "FILE" if files > 0 => {
                    let file_ref = self.load_file_reference(child, true);
                    media.file_references.push(file_ref);
                }
                "FORM" if files == 0 => {
                    let v = self.tagged(child);
                    self.once(&mut media.embedded_media_format, child, v);
                }
                "TITL" if files == 0 => {
                    let v = self.tagged(child);
                    self.once(&mut media.embedded_title, child, v);
                }
                "BLOB" if files == 0 => {
                    self.dialect
                        .only_55(child.line, "BLOB", &mut self.diagnostics);
                    let lines = self.lines(child, &mut media.custom_tags);
                    media.blob.extend(lines);
                }
                "OBJE" if files == 0 => {
                    self.dialect.only_55(
                        child.line,
                        "a chained OBJE",
                        &mut self.diagnostics,
                    );
                    if let Some(next) = self.pointer(child, RecordKind::Multimedia) {
                        self.once(&mut media.continued_object, child, next);
                    }
                }
                "SOUR" => media.citations.push(self.load_citation(child)),
                "NOTE" => self.push_note(child, &mut media.notes),
                "REFN" => media.user_references.push(self.load_user_reference(child)),
                "RIN" => {
                    let v = self.tagged(child);
                    self.once(&mut media.rec_id_number, child, v);
                }
                "CHAN" => {
                    let v = self.load_change_date(child);
                    self.once(&mut media.change_date, child, v);
                }
                _ => self.unknown_tag(child, &mut media.custom_tags),
            }
        }
        self.gedcom.multimedia.insert(xref, media);
    }
}

#[cfg(test)]
mod tests {
    use crate::model::MultimediaLink;
    use crate::load;

    #[test]
    fn test_551_record() {
        let src = "0 @M1@ OBJE\n1 FILE photo.jpg\n2 FORM jpg\n3 TYPE photo\n2 TITL Portrait\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        let media = &loaded.gedcom.multimedia["@M1@"];
        assert!(media.is_551_style());
        let file = &media.file_references[0];
        assert_eq!(file.reference_to_file.as_ref().unwrap().as_str(), Some("photo.jpg"));
        assert_eq!(file.media_type.as_ref().unwrap().as_str(), Some("photo"));
        assert_eq!(file.title.as_ref().unwrap().as_str(), Some("Portrait"));
    }

    #[test]
    fn test_55_record_with_blob_in_551_file() {
        let src = "0 @M1@ OBJE\n1 FORM bmp\n1 TITL Scan\n1 BLOB .HM.......k.1..F.\n2 CONT .HM.......k.1..G.\n1 OBJE @M2@\n\
                   0 @M2@ OBJE\n1 FORM bmp\n0 TRLR\n";
        let loaded = load(src).unwrap();
        let media = &loaded.gedcom.multimedia["@M1@"];
        assert!(!media.is_551_style());
        assert_eq!(media.blob.len(), 2);
        assert_eq!(media.continued_object.as_deref(), Some("@M2@"));
        // one per 5.5-style record, plus BLOB and the chained OBJE
        assert_eq!(loaded.diagnostics.warnings.len(), 4);
        assert!(loaded.diagnostics.errors.is_empty());
    }

    #[test]
    fn test_inline_55_link() {
        let src = "0 HEAD\n1 GEDC\n2 VERS 5.5\n0 @I1@ INDI\n1 OBJE\n2 FORM jpg\n2 FILE me.jpg\n2 TITL Me\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        match &loaded.gedcom.individuals["@I1@"].multimedia[0] {
            MultimediaLink::Inline(m) => {
                assert_eq!(m.file_references.len(), 1);
                let f = &m.file_references[0];
                assert_eq!(f.format.as_ref().unwrap().as_str(), Some("jpg"));
                assert_eq!(f.reference_to_file.as_ref().unwrap().as_str(), Some("me.jpg"));
                assert_eq!(m.embedded_title.as_ref().unwrap().as_str(), Some("Me"));
            }
            other => panic!("expected inline link, got {:?}", other),
        }
    }

    #[test]
    fn test_55_link_without_form_warns() {
        let src = "0 HEAD\n1 GEDC\n2 VERS 5.5\n0 @I1@ INDI\n1 OBJE\n2 FILE a.jpg\n3 FORM jpg\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.errors.is_empty());
        let warnings = loaded.diagnostics.warning_messages();
        assert_eq!(warnings.len(), 1, "{:?}", warnings);
        assert!(warnings[0].starts_with("Line 5: GEDCOM version is 5.5 but a multimedia link without a FORM tag"));
        match &loaded.gedcom.individuals["@I1@"].multimedia[0] {
            MultimediaLink::Inline(m) => {
                assert_eq!(m.file_references.len(), 1);
                assert_eq!(m.file_references[0].format.as_ref().unwrap().as_str(), Some("jpg"));
            }
            other => panic!("expected inline link, got {:?}", other),
        }
    }

    #[test]
    fn test_inline_551_link_with_two_files() {
        let src = "0 @I1@ INDI\n1 OBJE\n2 FILE a.jpg\n3 FORM jpg\n4 MEDI photo\n2 FILE b.png\n3 FORM png\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.is_clean(), "{:?}", loaded.diagnostics);
        match &loaded.gedcom.individuals["@I1@"].multimedia[0] {
            MultimediaLink::Inline(m) => {
                assert_eq!(m.file_references.len(), 2);
                assert_eq!(
                    m.file_references[0].media_type.as_ref().unwrap().as_str(),
                    Some("photo")
                );
            }
            other => panic!("expected inline link, got {:?}", other),
        }
    }

    #[test]
    fn test_link_with_two_forms_is_dropped() {
        let src = "0 @I1@ INDI\n1 OBJE\n2 FORM jpg\n2 FORM png\n2 FILE x\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.gedcom.individuals["@I1@"].multimedia.is_empty());
        assert_eq!(loaded.diagnostics.errors.len(), 1);
    }
}
