//! Phase 5: Writer
//!
//! Flattens a [`Gedcom`] back into leveled lines. Every structure is written
//! in the shape the loader reads it back from, so a clean document survives
//! a load/write/load cycle unchanged.
//!
//! Before anything is emitted the document is validated (unless disabled)
//! and checked against its declared version. Values that contain line breaks
//! are continued with `CONT`; values longer than the configured maximum are
//! split with `CONC`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::dialect::{CharacterSet, SupportedVersion};
use crate::error::{GedcomError, Result};
use crate::model::{
    Address, ChangeDate, Citation, ContactInfo, CustomTag, EventDetail, Family, FileReference,
    Gedcom, Header, Individual, LdsOrdinance, Multimedia, MultimediaLink, NameVariation, Note,
    NoteStructure, PersonalName, PersonalNameVariation, Place, RecordKind, Repository, Source,
    Submission, Submitter, TaggedValue, UserReference,
};
use crate::options::WriterOptions;
use crate::validate::{Severity, Validator};

/// Serializes one document.
pub struct GedcomWriter<'g> {
    gedcom: &'g Gedcom,
    options: WriterOptions,
}

impl<'g> GedcomWriter<'g> {
    pub fn new(gedcom: &'g Gedcom) -> Self {
        Self::with_options(gedcom, WriterOptions::default())
    }

    pub fn with_options(gedcom: &'g Gedcom, options: WriterOptions) -> Self {
        Self { gedcom, options }
    }

    /// The document as GEDCOM lines, without terminators.
    pub fn lines(&self) -> Result<Vec<String>> {
        if self.options.max_line_length == 0 {
            return Err(GedcomError::InvalidArgument(
                "maximum line length must be at least 1".to_string(),
            ));
        }
        if self.options.validate {
            let results = Validator::check(self.gedcom);
            let errors = results.by_severity(Severity::Error).count();
            if errors > 0 {
                tracing::debug!(errors, "validation blocked write");
                return Err(GedcomError::ValidationFailed { errors });
            }
        }
        check_version(self.gedcom)?;

        let mut emitter = Emitter::new(self.options.max_line_length, self.gedcom.version());
        emitter.document(self.gedcom);
        tracing::debug!(lines = emitter.out.len(), "write complete");
        Ok(emitter.out)
    }

    pub fn write_to_string(&self) -> Result<String> {
        let terminator = self.options.line_terminator.as_str();
        let mut out = String::new();
        for line in self.lines()? {
            out.push_str(&line);
            out.push_str(terminator);
        }
        Ok(out)
    }

    /// Write to any byte sink, encoded per the header's character set.
    pub fn write<W: Write>(&self, mut out: W) -> Result<()> {
        let text = self.write_to_string()?;
        let charset = self
            .gedcom
            .header
            .as_ref()
            .and_then(|h| h.character_set.as_ref())
            .and_then(|c| c.character_set());
        out.write_all(&encode(&text, charset))?;
        out.flush()?;
        Ok(())
    }

    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }
}

/// UTF-16 gets a byte order mark; everything else is written as UTF-8.
fn encode(text: &str, charset: Option<CharacterSet>) -> Vec<u8> {
    match charset {
        Some(CharacterSet::Utf16Le) => {
            let mut bytes = vec![0xFF, 0xFE];
            bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
            bytes
        }
        Some(CharacterSet::Utf16Be) => {
            let mut bytes = vec![0xFE, 0xFF];
            bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
            bytes
        }
        _ => text.as_bytes().to_vec(),
    }
}

// =============================================================================
// Version compatibility
// =============================================================================

/// Refuse data that the declared version has no way to express.
fn check_version(gedcom: &Gedcom) -> Result<()> {
    let version = gedcom.version();
    let mismatch = |what: String| {
        Err(GedcomError::VersionMismatch(format!(
            "{} cannot be written as GEDCOM {}",
            what, version
        )))
    };

    match version {
        SupportedVersion::V5_5 => {
            let utf8 = gedcom
                .header
                .as_ref()
                .and_then(|h| h.character_set.as_ref())
                .and_then(|c| c.character_set())
                == Some(CharacterSet::Utf8);
            if utf8 {
                return mismatch("UTF-8 character set".to_string());
            }
            for (xref, media) in &gedcom.multimedia {
                if media.is_551_style() {
                    return mismatch(format!("OBJE {} with FILE references", xref));
                }
            }
            for (xref, ind) in &gedcom.individuals {
                if ind.contact.has_551_fields() {
                    return mismatch(format!("INDI {} with WWW, FAX or EMAIL", xref));
                }
                if too_many_files(&ind.multimedia) {
                    return mismatch(format!("INDI {} with a multi-file OBJE", xref));
                }
            }
            for (xref, fam) in &gedcom.families {
                if too_many_files(&fam.multimedia) {
                    return mismatch(format!("FAM {} with a multi-file OBJE", xref));
                }
            }
            for (xref, sour) in &gedcom.sources {
                if too_many_files(&sour.multimedia) {
                    return mismatch(format!("SOUR {} with a multi-file OBJE", xref));
                }
            }
            for (xref, subm) in &gedcom.submitters {
                if subm.contact.has_551_fields() {
                    return mismatch(format!("SUBM {} with WWW, FAX or EMAIL", xref));
                }
            }
            for (xref, repo) in &gedcom.repositories {
                if repo.contact.has_551_fields() {
                    return mismatch(format!("REPO {} with WWW, FAX or EMAIL", xref));
                }
            }
        }
        SupportedVersion::V5_5_1 => {
            for (xref, media) in &gedcom.multimedia {
                if !media.blob.is_empty() {
                    return mismatch(format!("OBJE {} with BLOB data", xref));
                }
                if media.continued_object.is_some() {
                    return mismatch(format!("OBJE {} chained to another OBJE", xref));
                }
            }
        }
    }
    Ok(())
}

fn too_many_files(links: &[MultimediaLink]) -> bool {
    links.iter().any(|l| match l {
        MultimediaLink::Inline(m) => m.file_references.len() > 1,
        MultimediaLink::Reference { .. } => false,
    })
}

// =============================================================================
// Line emitter
// =============================================================================

struct Emitter {
    out: Vec<String>,
    max: usize,
    version: SupportedVersion,
}

/// Split at char boundaries into pieces of at most `max` chars.
fn chunks(text: &str, max: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (i, _) in text.char_indices() {
        if count == max {
            pieces.push(&text[start..i]);
            start = i;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

impl Emitter {
    fn new(max: usize, version: SupportedVersion) -> Self {
        Self {
            out: Vec::new(),
            max,
            version,
        }
    }

    fn raw(&mut self, level: usize, xref: Option<&str>, tag: &str, value: Option<&str>) {
        let mut line = level.to_string();
        if let Some(xref) = xref {
            line.push(' ');
            line.push_str(xref);
        }
        line.push(' ');
        line.push_str(tag);
        if let Some(value) = value {
            line.push(' ');
            line.push_str(value);
        }
        self.out.push(line);
    }

    /// A value continued with CONT at line breaks and CONC past the limit.
    fn text(&mut self, level: usize, xref: Option<&str>, tag: &str, value: Option<&str>) {
        let Some(value) = value else {
            self.raw(level, xref, tag, None);
            return;
        };
        for (i, segment) in value.split('\n').enumerate() {
            let pieces = chunks(segment, self.max);
            let mut pieces = pieces.into_iter();
            let first = pieces.next();
            if i == 0 {
                self.raw(level, xref, tag, Some(first.unwrap_or("")));
            } else {
                self.raw(level + 1, None, "CONT", first);
            }
            for piece in pieces {
                self.raw(level + 1, None, "CONC", Some(piece));
            }
        }
    }

    fn lines(&mut self, level: usize, tag: &str, lines: &[String]) {
        if lines.is_empty() {
            self.raw(level, None, tag, None);
        } else {
            self.text(level, None, tag, Some(&lines.join("\n")));
        }
    }

    /// Multi-line field that is omitted when empty.
    fn lines_if_any(&mut self, level: usize, tag: &str, lines: &[String]) {
        if !lines.is_empty() {
            self.lines(level, tag, lines);
        }
    }

    fn tagged(&mut self, level: usize, tag: &str, value: &Option<TaggedValue>) {
        if let Some(value) = value {
            self.tagged_with(level, tag, value, |_, _| {});
        }
    }

    /// A tagged value, with extra children written before its custom tags.
    fn tagged_with<F>(&mut self, level: usize, tag: &str, value: &TaggedValue, children: F)
    where
        F: FnOnce(&mut Self, usize),
    {
        self.text(level, None, tag, value.as_str());
        children(self, level + 1);
        self.custom_tags(level + 1, &value.custom_tags);
    }

    fn tagged_list(&mut self, level: usize, tag: &str, values: &[TaggedValue]) {
        for value in values {
            self.tagged_with(level, tag, value, |_, _| {});
        }
    }

    fn pointer(&mut self, level: usize, tag: &str, xref: &Option<String>) {
        if let Some(xref) = xref {
            self.raw(level, None, tag, Some(xref));
        }
    }

    fn pointers(&mut self, level: usize, tag: &str, xrefs: &[String]) {
        for xref in xrefs {
            self.raw(level, None, tag, Some(xref));
        }
    }

    fn custom_tags(&mut self, level: usize, tags: &[CustomTag]) {
        for tag in tags {
            self.raw(level, tag.xref.as_deref(), &tag.tag, tag.value.as_deref());
            self.custom_tags(level + 1, &tag.children);
        }
    }

    // =========================================================================
    // Document
    // =========================================================================

    fn document(&mut self, gedcom: &Gedcom) {
        if let Some(header) = &gedcom.header {
            self.header(header);
        }
        if let Some(subn) = &gedcom.submission {
            self.submission(subn);
        }
        let live = |kind: RecordKind, xref: &str| !gedcom.is_stub(kind, xref);

        for (xref, ind) in &gedcom.individuals {
            if live(RecordKind::Individual, xref) {
                self.individual(xref, ind);
            }
        }
        for (xref, fam) in &gedcom.families {
            if live(RecordKind::Family, xref) {
                self.family(xref, fam);
            }
        }
        for (xref, sour) in &gedcom.sources {
            if live(RecordKind::Source, xref) {
                self.source(xref, sour);
            }
        }
        for (xref, repo) in &gedcom.repositories {
            if live(RecordKind::Repository, xref) {
                self.repository(xref, repo);
            }
        }
        for (xref, media) in &gedcom.multimedia {
            if live(RecordKind::Multimedia, xref) {
                self.multimedia_record(xref, media);
            }
        }
        for (xref, note) in &gedcom.notes {
            if live(RecordKind::Note, xref) {
                self.note_body(0, Some(xref), note);
            }
        }
        for (xref, subm) in &gedcom.submitters {
            if live(RecordKind::Submitter, xref) {
                self.submitter(xref, subm);
            }
        }
        self.custom_tags(0, &gedcom.custom_tags);
        self.raw(0, None, "TRLR", None);
        if let Some(trailer) = &gedcom.trailer {
            self.custom_tags(1, &trailer.custom_tags);
        }
    }

    fn header(&mut self, h: &Header) {
        self.raw(0, None, "HEAD", None);
        if let Some(sour) = &h.source_system {
            self.raw(1, None, "SOUR", sour.system_id.as_deref());
            self.tagged(2, "VERS", &sour.version_num);
            self.tagged(2, "NAME", &sour.product_name);
            if let Some(corp) = &sour.corporation {
                self.raw(2, None, "CORP", corp.business_name.as_deref());
                self.contact(3, &corp.contact);
                self.custom_tags(3, &corp.custom_tags);
            }
            if let Some(data) = &sour.source_data {
                self.raw(2, None, "DATA", data.name.as_deref());
                self.tagged(3, "DATE", &data.publish_date);
                self.tagged(3, "COPR", &data.copyright);
                self.custom_tags(3, &data.custom_tags);
            }
            self.custom_tags(2, &sour.custom_tags);
        }
        self.tagged(1, "DEST", &h.destination_system);
        self.date_time(1, &h.date, &h.time);
        self.pointer(1, "SUBM", &h.submitter);
        self.pointer(1, "SUBN", &h.submission);
        self.tagged(1, "FILE", &h.file_name);
        self.lines_if_any(1, "COPR", &h.copyright_data);
        if let Some(gedc) = &h.gedcom_version {
            self.raw(1, None, "GEDC", None);
            self.tagged(2, "VERS", &gedc.version);
            self.tagged(2, "FORM", &gedc.form);
            self.custom_tags(2, &gedc.custom_tags);
        }
        if let Some(chr) = &h.character_set {
            self.raw(1, None, "CHAR", chr.name.as_deref());
            self.tagged(2, "VERS", &chr.version_num);
            self.custom_tags(2, &chr.custom_tags);
        }
        self.tagged(1, "LANG", &h.language);
        if h.place_hierarchy.is_some() {
            self.raw(1, None, "PLAC", None);
            self.tagged(2, "FORM", &h.place_hierarchy);
        }
        self.lines_if_any(1, "NOTE", &h.notes);
        self.custom_tags(1, &h.custom_tags);
    }

    /// DATE with an optional TIME beneath it.
    fn date_time(&mut self, level: usize, date: &Option<TaggedValue>, time: &Option<TaggedValue>) {
        if date.is_none() && time.is_none() {
            return;
        }
        let empty = TaggedValue::default();
        let date = date.as_ref().unwrap_or(&empty);
        self.tagged_with(level, "DATE", date, |e, l| e.tagged(l, "TIME", time));
    }

    fn submission(&mut self, subn: &Submission) {
        self.raw(0, subn.xref.as_deref(), "SUBN", None);
        self.pointer(1, "SUBM", &subn.submitter);
        self.tagged(1, "FAMF", &subn.name_of_family_file);
        self.tagged(1, "TEMP", &subn.temple_code);
        self.tagged(1, "ANCE", &subn.ancestors_count);
        self.tagged(1, "DESC", &subn.descendants_count);
        self.tagged(1, "ORDI", &subn.ordinance_process_flag);
        self.tagged(1, "RIN", &subn.rec_id_number);
        self.notes(1, &subn.notes);
        self.custom_tags(1, &subn.custom_tags);
    }

    fn submitter(&mut self, xref: &str, subm: &Submitter) {
        self.raw(0, Some(xref), "SUBM", None);
        self.tagged(1, "NAME", &subm.name);
        self.contact(1, &subm.contact);
        self.multimedia_links(1, &subm.multimedia);
        self.tagged_list(1, "LANG", &subm.language_pref);
        self.tagged(1, "RFN", &subm.registration_file_number);
        self.tagged(1, "RIN", &subm.rec_id_number);
        self.notes(1, &subm.notes);
        self.user_references(1, &subm.user_references);
        self.change_date(1, &subm.change_date);
        self.custom_tags(1, &subm.custom_tags);
    }

    // =========================================================================
    // Individuals and families
    // =========================================================================

    fn individual(&mut self, xref: &str, ind: &Individual) {
        self.raw(0, Some(xref), "INDI", None);
        self.tagged(1, "RESN", &ind.restriction_notice);
        for name in &ind.names {
            self.personal_name(1, name);
        }
        self.tagged(1, "SEX", &ind.sex);
        for event in &ind.events {
            self.event(1, event.kind.tag(), &event.detail, |e, l| {
                if let Some(family) = &event.family_child {
                    e.raw(l, None, "FAMC", Some(family));
                    e.tagged(l + 1, "ADOP", &event.adopted_by);
                }
            });
        }
        for attr in &ind.attributes {
            self.event(1, attr.kind.tag(), &attr.detail, |_, _| {});
        }
        for ord in &ind.lds_ordinances {
            self.lds_ordinance(1, ord);
        }
        for link in &ind.families_where_child {
            self.raw(1, None, "FAMC", Some(&link.family));
            self.tagged(2, "PEDI", &link.pedigree);
            self.tagged(2, "ADOP", &link.adopted_by);
            self.tagged(2, "STAT", &link.status);
            self.notes(2, &link.notes);
            self.custom_tags(2, &link.custom_tags);
        }
        for link in &ind.families_where_spouse {
            self.raw(1, None, "FAMS", Some(&link.family));
            self.notes(2, &link.notes);
            self.custom_tags(2, &link.custom_tags);
        }
        for asso in &ind.associations {
            self.raw(1, None, "ASSO", Some(&asso.associated_entity));
            self.tagged(2, "TYPE", &asso.associated_entity_type);
            self.tagged(2, "RELA", &asso.relationship);
            self.citations(2, &asso.citations);
            self.notes(2, &asso.notes);
            self.custom_tags(2, &asso.custom_tags);
        }
        self.pointers(1, "ALIA", &ind.aliases);
        self.pointers(1, "ANCI", &ind.ancestor_interest);
        self.pointers(1, "DESI", &ind.descendant_interest);
        self.pointers(1, "SUBM", &ind.submitters);
        self.contact(1, &ind.contact);
        self.citations(1, &ind.citations);
        self.notes(1, &ind.notes);
        self.multimedia_links(1, &ind.multimedia);
        self.user_references(1, &ind.user_references);
        self.tagged(1, "AFN", &ind.ancestral_file_number);
        self.tagged(1, "RFN", &ind.permanent_rec_file_number);
        self.tagged(1, "RIN", &ind.rec_id_number);
        self.change_date(1, &ind.change_date);
        self.custom_tags(1, &ind.custom_tags);
    }

    fn personal_name(&mut self, level: usize, name: &PersonalName) {
        self.raw(level, None, "NAME", name.basic.as_deref());
        let l = level + 1;
        self.tagged(l, "TYPE", &name.name_type);
        self.name_pieces(
            l,
            [
                &name.prefix,
                &name.given_name,
                &name.nickname,
                &name.surname_prefix,
                &name.surname,
                &name.suffix,
            ],
        );
        for variation in &name.romanized {
            self.name_variation(l, "ROMN", variation);
        }
        for variation in &name.phonetic {
            self.name_variation(l, "FONE", variation);
        }
        self.citations(l, &name.citations);
        self.notes(l, &name.notes);
        self.custom_tags(l, &name.custom_tags);
    }

    /// NPFX, GIVN, NICK, SPFX, SURN, NSFX in that order.
    fn name_pieces(&mut self, level: usize, pieces: [&Option<TaggedValue>; 6]) {
        const TAGS: [&str; 6] = ["NPFX", "GIVN", "NICK", "SPFX", "SURN", "NSFX"];
        for (tag, piece) in TAGS.iter().zip(pieces) {
            self.tagged(level, tag, piece);
        }
    }

    fn name_variation(&mut self, level: usize, tag: &str, v: &PersonalNameVariation) {
        self.raw(level, None, tag, v.variation.as_deref());
        let l = level + 1;
        self.tagged(l, "TYPE", &v.variation_type);
        self.name_pieces(
            l,
            [
                &v.prefix,
                &v.given_name,
                &v.nickname,
                &v.surname_prefix,
                &v.surname,
                &v.suffix,
            ],
        );
        self.citations(l, &v.citations);
        self.notes(l, &v.notes);
        self.custom_tags(l, &v.custom_tags);
    }

    fn family(&mut self, xref: &str, fam: &Family) {
        self.raw(0, Some(xref), "FAM", None);
        self.tagged(1, "RESN", &fam.restriction_notice);
        for event in &fam.events {
            self.event(1, event.kind.tag(), &event.detail, |e, l| {
                e.spouse_age(l, "HUSB", &event.husband_age);
                e.spouse_age(l, "WIFE", &event.wife_age);
            });
        }
        self.pointer(1, "HUSB", &fam.husband);
        self.pointer(1, "WIFE", &fam.wife);
        self.pointers(1, "CHIL", &fam.children);
        self.tagged(1, "NCHI", &fam.num_children);
        self.pointers(1, "SUBM", &fam.submitters);
        for ord in &fam.lds_spouse_sealings {
            self.lds_ordinance(1, ord);
        }
        self.citations(1, &fam.citations);
        self.multimedia_links(1, &fam.multimedia);
        self.notes(1, &fam.notes);
        self.user_references(1, &fam.user_references);
        self.tagged(1, "RIN", &fam.rec_id_number);
        self.tagged(1, "RFN", &fam.permanent_rec_file_number);
        self.change_date(1, &fam.change_date);
        self.custom_tags(1, &fam.custom_tags);
    }

    fn spouse_age(&mut self, level: usize, tag: &str, age: &Option<TaggedValue>) {
        if age.is_some() {
            self.raw(level, None, tag, None);
            self.tagged(level + 1, "AGE", age);
        }
    }

    /// An event or attribute line, its detail, then `extra` children.
    fn event<F>(&mut self, level: usize, tag: &str, detail: &EventDetail, extra: F)
    where
        F: FnOnce(&mut Self, usize),
    {
        self.text(level, None, tag, detail.description.as_deref());
        let l = level + 1;
        self.tagged(l, "TYPE", &detail.subtype);
        self.tagged(l, "DATE", &detail.date);
        if let Some(place) = &detail.place {
            self.place(l, place);
        }
        self.contact(l, &detail.contact);
        self.tagged(l, "AGE", &detail.age);
        self.tagged(l, "AGNC", &detail.responsible_agency);
        self.tagged(l, "RELI", &detail.religious_affiliation);
        self.tagged(l, "CAUS", &detail.cause);
        self.tagged(l, "RESN", &detail.restriction_notice);
        extra(self, l);
        self.citations(l, &detail.citations);
        self.multimedia_links(l, &detail.multimedia);
        self.notes(l, &detail.notes);
        self.custom_tags(l, &detail.custom_tags);
    }

    fn place(&mut self, level: usize, place: &Place) {
        self.text(level, None, "PLAC", place.name.as_deref());
        let l = level + 1;
        self.tagged(l, "FORM", &place.form);
        for variation in &place.phonetic {
            self.place_variation(l, "FONE", variation);
        }
        for variation in &place.romanized {
            self.place_variation(l, "ROMN", variation);
        }
        if place.latitude.is_some() || place.longitude.is_some() {
            self.raw(l, None, "MAP", None);
            self.tagged(l + 1, "LATI", &place.latitude);
            self.tagged(l + 1, "LONG", &place.longitude);
        }
        self.citations(l, &place.citations);
        self.notes(l, &place.notes);
        self.custom_tags(l, &place.custom_tags);
    }

    fn place_variation(&mut self, level: usize, tag: &str, v: &NameVariation) {
        self.raw(level, None, tag, v.variation.as_deref());
        self.tagged(level + 1, "TYPE", &v.variation_type);
        self.custom_tags(level + 1, &v.custom_tags);
    }

    fn lds_ordinance(&mut self, level: usize, ord: &LdsOrdinance) {
        self.raw(level, None, ord.kind.tag(), ord.description.as_deref());
        let l = level + 1;
        self.tagged(l, "DATE", &ord.date);
        self.tagged(l, "TEMP", &ord.temple);
        self.tagged(l, "PLAC", &ord.place);
        self.pointer(l, "FAMC", &ord.family_child);
        self.tagged(l, "STAT", &ord.status);
        self.citations(l, &ord.citations);
        self.notes(l, &ord.notes);
        self.custom_tags(l, &ord.custom_tags);
    }

    // =========================================================================
    // Sources, repositories, multimedia
    // =========================================================================

    fn source(&mut self, xref: &str, sour: &Source) {
        self.raw(0, Some(xref), "SOUR", None);
        if let Some(data) = &sour.data {
            self.raw(1, None, "DATA", None);
            for even in &data.events_recorded {
                self.raw(2, None, "EVEN", even.event_type.as_deref());
                self.tagged(3, "DATE", &even.date_period);
                self.tagged(3, "PLAC", &even.jurisdiction);
                self.custom_tags(3, &even.custom_tags);
            }
            self.tagged(2, "AGNC", &data.responsible_agency);
            self.notes(2, &data.notes);
            self.custom_tags(2, &data.custom_tags);
        }
        self.lines_if_any(1, "AUTH", &sour.originators_authors);
        self.lines_if_any(1, "TITL", &sour.title);
        self.tagged(1, "ABBR", &sour.source_filed_by);
        self.lines_if_any(1, "PUBL", &sour.publication_facts);
        self.lines_if_any(1, "TEXT", &sour.source_text);
        for cite in &sour.repository_citations {
            self.raw(1, None, "REPO", cite.repository.as_deref());
            self.notes(2, &cite.notes);
            for caln in &cite.call_numbers {
                self.raw(2, None, "CALN", caln.call_number.as_deref());
                self.tagged(3, "MEDI", &caln.media_type);
                self.custom_tags(3, &caln.custom_tags);
            }
            self.custom_tags(2, &cite.custom_tags);
        }
        self.multimedia_links(1, &sour.multimedia);
        self.notes(1, &sour.notes);
        self.user_references(1, &sour.user_references);
        self.tagged(1, "RIN", &sour.rec_id_number);
        self.change_date(1, &sour.change_date);
        self.custom_tags(1, &sour.custom_tags);
    }

    fn repository(&mut self, xref: &str, repo: &Repository) {
        self.raw(0, Some(xref), "REPO", None);
        self.tagged(1, "NAME", &repo.name);
        self.contact(1, &repo.contact);
        self.notes(1, &repo.notes);
        self.user_references(1, &repo.user_references);
        self.tagged(1, "RIN", &repo.rec_id_number);
        self.change_date(1, &repo.change_date);
        self.custom_tags(1, &repo.custom_tags);
    }

    fn multimedia_record(&mut self, xref: &str, media: &Multimedia) {
        self.raw(0, Some(xref), "OBJE", None);
        if media.is_551_style() {
            for file in &media.file_references {
                self.file_reference(1, file, "TYPE");
            }
        } else {
            self.tagged(1, "FORM", &media.embedded_media_format);
            self.tagged(1, "TITL", &media.embedded_title);
            self.lines_if_any(1, "BLOB", &media.blob);
            self.pointer(1, "OBJE", &media.continued_object);
        }
        self.citations(1, &media.citations);
        self.notes(1, &media.notes);
        self.user_references(1, &media.user_references);
        self.tagged(1, "RIN", &media.rec_id_number);
        self.change_date(1, &media.change_date);
        self.custom_tags(1, &media.custom_tags);
    }

    /// FILE with FORM (and its media type tag) and TITL.
    fn file_reference(&mut self, level: usize, file: &FileReference, media_tag: &str) {
        let empty = TaggedValue::default();
        let reference = file.reference_to_file.as_ref().unwrap_or(&empty);
        self.raw(level, None, "FILE", reference.as_str());
        let l = level + 1;
        if let Some(format) = &file.format {
            self.tagged_with(l, "FORM", format, |e, ll| {
                e.tagged(ll, media_tag, &file.media_type)
            });
        }
        self.tagged(l, "TITL", &file.title);
        self.custom_tags(l, &reference.custom_tags);
        self.custom_tags(l, &file.custom_tags);
    }

    fn multimedia_links(&mut self, level: usize, links: &[MultimediaLink]) {
        for link in links {
            match link {
                MultimediaLink::Reference { xref, custom_tags } => {
                    self.raw(level, None, "OBJE", Some(xref));
                    self.custom_tags(level + 1, custom_tags);
                }
                MultimediaLink::Inline(media) => self.inline_multimedia(level, media),
            }
        }
    }

    /// 5.5 puts FORM, TITL and FILE side by side; 5.5.1 nests FORM under
    /// each FILE.
    fn inline_multimedia(&mut self, level: usize, media: &Multimedia) {
        self.raw(level, None, "OBJE", None);
        let l = level + 1;
        if self.version == SupportedVersion::V5_5 {
            let file = media.file_references.first();
            if let Some(file) = file {
                self.tagged(l, "FORM", &file.format);
            }
            self.tagged(l, "TITL", &media.embedded_title);
            if let Some(file) = file {
                self.tagged(l, "FILE", &file.reference_to_file);
                self.custom_tags(l, &file.custom_tags);
            }
        } else {
            for file in &media.file_references {
                self.file_reference(l, file, "MEDI");
            }
            self.tagged(l, "TITL", &media.embedded_title);
        }
        self.notes(l, &media.notes);
        self.custom_tags(l, &media.custom_tags);
    }

    // =========================================================================
    // Shared substructures
    // =========================================================================

    fn contact(&mut self, level: usize, contact: &ContactInfo) {
        if let Some(address) = &contact.address {
            self.address(level, address);
        }
        self.tagged_list(level, "PHON", &contact.phone_numbers);
        self.tagged_list(level, "EMAIL", &contact.emails);
        self.tagged_list(level, "FAX", &contact.fax_numbers);
        self.tagged_list(level, "WWW", &contact.www_urls);
    }

    fn address(&mut self, level: usize, address: &Address) {
        self.lines(level, "ADDR", &address.lines);
        let l = level + 1;
        self.tagged(l, "ADR1", &address.line1);
        self.tagged(l, "ADR2", &address.line2);
        self.tagged(l, "ADR3", &address.line3);
        self.tagged(l, "CITY", &address.city);
        self.tagged(l, "STAE", &address.state_province);
        self.tagged(l, "POST", &address.postal_code);
        self.tagged(l, "CTRY", &address.country);
        self.custom_tags(l, &address.custom_tags);
    }

    fn notes(&mut self, level: usize, notes: &[NoteStructure]) {
        for note in notes {
            match note {
                NoteStructure::Reference { xref, custom_tags } => {
                    self.raw(level, None, "NOTE", Some(xref));
                    self.custom_tags(level + 1, custom_tags);
                }
                NoteStructure::Inline(body) => self.note_body(level, None, body),
            }
        }
    }

    /// A note record (level 0, with xref) or an inline note.
    fn note_body(&mut self, level: usize, xref: Option<&str>, note: &Note) {
        if note.lines.is_empty() {
            self.raw(level, xref, "NOTE", None);
        } else {
            self.text(level, xref, "NOTE", Some(&note.lines.join("\n")));
        }
        let l = level + 1;
        self.citations(l, &note.citations);
        self.user_references(l, &note.user_references);
        self.tagged(l, "RIN", &note.rec_id_number);
        self.change_date(l, &note.change_date);
        self.custom_tags(l, &note.custom_tags);
    }

    fn citations(&mut self, level: usize, citations: &[Citation]) {
        let l = level + 1;
        for citation in citations {
            match citation {
                Citation::WithSource(c) => {
                    self.raw(level, None, "SOUR", Some(&c.source));
                    self.tagged(l, "PAGE", &c.where_in_source);
                    if c.event_cited.is_some() || c.role_in_event.is_some() {
                        let empty = TaggedValue::default();
                        let event = c.event_cited.as_ref().unwrap_or(&empty);
                        self.tagged_with(l, "EVEN", event, |e, ll| {
                            e.tagged(ll, "ROLE", &c.role_in_event)
                        });
                    }
                    for data in &c.data {
                        self.raw(l, None, "DATA", None);
                        self.tagged(l + 1, "DATE", &data.entry_date);
                        for text in &data.source_text {
                            self.lines(l + 1, "TEXT", text);
                        }
                        self.custom_tags(l + 1, &data.custom_tags);
                    }
                    self.tagged(l, "QUAY", &c.certainty);
                    self.multimedia_links(l, &c.multimedia);
                    self.notes(l, &c.notes);
                    self.custom_tags(l, &c.custom_tags);
                }
                Citation::WithoutSource(c) => {
                    self.lines(level, "SOUR", &c.description);
                    for text in &c.text_from_source {
                        self.lines(l, "TEXT", text);
                    }
                    self.notes(l, &c.notes);
                    self.custom_tags(l, &c.custom_tags);
                }
            }
        }
    }

    fn user_references(&mut self, level: usize, refs: &[UserReference]) {
        for r in refs {
            let value = r.reference_num.as_ref().and_then(TaggedValue::as_str);
            self.raw(level, None, "REFN", value);
            self.tagged(level + 1, "TYPE", &r.kind);
            self.custom_tags(level + 1, &r.custom_tags);
        }
    }

    fn change_date(&mut self, level: usize, chan: &Option<ChangeDate>) {
        let Some(chan) = chan else {
            return;
        };
        self.raw(level, None, "CHAN", None);
        self.date_time(level + 1, &chan.date, &chan.time);
        self.notes(level + 1, &chan.notes);
        self.custom_tags(level + 1, &chan.custom_tags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::LineTerminator;
    use crate::{load, GedcomError};

    const FULL: &str = "0 HEAD\n\
        1 SOUR FamilyTool\n\
        2 VERS 2.0\n\
        2 NAME Family Tool\n\
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
        1 NAME Tester\n\
        1 LANG English\n\
        0 @I1@ INDI\n\
        1 NAME John /Doe/\n\
        2 GIVN John\n\
        2 SURN Doe\n\
        1 SEX M\n\
        1 BIRT\n\
        2 DATE 1 JAN 1900\n\
        2 PLAC Springfield\n\
        3 MAP\n\
        4 LATI N39.8\n\
        4 LONG W89.6\n\
        2 SOUR @S1@\n\
        3 PAGE p. 12\n\
        3 QUAY 2\n\
        1 OCCU Farmer\n\
        1 EMAIL john@example.com\n\
        1 FAMS @F1@\n\
        1 NOTE @N1@\n\
        1 OBJE\n\
        2 FILE john.jpg\n\
        3 FORM jpg\n\
        4 MEDI photo\n\
        2 TITL John\n\
        1 _NICKNAME Johnny\n\
        2 _SOURCE family lore\n\
        1 CHAN\n\
        2 DATE 2 FEB 2020\n\
        3 TIME 10:15\n\
        0 @I2@ INDI\n\
        1 NAME Jane /Doe/\n\
        1 FAMC @F1@\n\
        2 PEDI birth\n\
        0 @F1@ FAM\n\
        1 HUSB @I1@\n\
        1 CHIL @I2@\n\
        1 MARR\n\
        2 HUSB\n\
        3 AGE 25y\n\
        0 @S1@ SOUR\n\
        1 TITL Parish register\n\
        2 CONT of St. Mary\n\
        1 REPO @R1@\n\
        2 CALN 123\n\
        3 MEDI book\n\
        0 @R1@ REPO\n\
        1 NAME Archive\n\
        1 ADDR 1 Main St\n\
        2 CONT Springfield\n\
        2 CITY Springfield\n\
        0 @M1@ OBJE\n\
        1 FILE scan.png\n\
        2 FORM png\n\
        3 TYPE photo\n\
        2 TITL Scan\n\
        0 @N1@ NOTE First line\n\
        1 CONT Second line\n\
        0 TRLR\n";

    fn write(src: &str, options: WriterOptions) -> Result<String> {
        let gedcom = load(src)?.gedcom;
        GedcomWriter::with_options(&gedcom, options).write_to_string()
    }

    #[test]
    fn test_round_trip() {
        let first = load(FULL).unwrap();
        assert!(first.diagnostics.is_clean(), "{:?}", first.diagnostics);
        let options = WriterOptions::default().with_line_terminator(LineTerminator::Lf);
        let text = GedcomWriter::with_options(&first.gedcom, options)
            .write_to_string()
            .unwrap();
        let second = load(&text).unwrap();
        assert!(second.diagnostics.is_clean(), "{:?}", second.diagnostics);
        assert_eq!(first.gedcom, second.gedcom);
    }

    #[test]
    fn test_default_terminator_is_crlf() {
        let text = write(FULL, WriterOptions::default()).unwrap();
        assert!(text.starts_with("0 HEAD\r\n1 SOUR FamilyTool\r\n"));
        assert!(text.ends_with("0 TRLR\r\n"));
    }

    #[test]
    fn test_long_values_use_conc() {
        let long = "x".repeat(25);
        let src = FULL.replace("1 OCCU Farmer", &format!("1 OCCU {}", long));
        let gedcom = load(&src).unwrap().gedcom;
        let options = WriterOptions::default().with_max_line_length(10);
        let lines = GedcomWriter::with_options(&gedcom, options).lines().unwrap();
        let at = lines.iter().position(|l| l.starts_with("1 OCCU")).unwrap();
        assert_eq!(lines[at], "1 OCCU xxxxxxxxxx");
        assert_eq!(lines[at + 1], "2 CONC xxxxxxxxxx");
        assert_eq!(lines[at + 2], "2 CONC xxxxx");

        let reloaded = load(&lines.join("\n")).unwrap().gedcom;
        assert_eq!(reloaded, gedcom);
    }

    #[test]
    fn test_multi_line_note_uses_cont() {
        let lines = GedcomWriter::new(&load(FULL).unwrap().gedcom).lines().unwrap();
        let at = lines.iter().position(|l| l == "0 @N1@ NOTE First line").unwrap();
        assert_eq!(lines[at + 1], "1 CONT Second line");
    }

    #[test]
    fn test_chunks_respect_char_boundaries() {
        assert_eq!(chunks("äöüß", 3), vec!["äöü", "ß"]);
        assert!(chunks("", 3).is_empty());
    }

    #[test]
    fn test_validation_failure_blocks_write() {
        let src = FULL.replace("0 TRLR\n", "");
        match write(&src, WriterOptions::default()) {
            Err(GedcomError::ValidationFailed { errors }) => assert_eq!(errors, 1),
            other => panic!("expected validation failure, got {:?}", other),
        }
        let text = write(&src, WriterOptions::default().with_validation(false)).unwrap();
        assert!(text.ends_with("0 TRLR\r\n"));
    }

    #[test]
    fn test_version_mismatch_cannot_be_skipped() {
        let src = "0 HEAD\n1 GEDC\n2 VERS 5.5\n0 @M1@ OBJE\n1 FILE a.jpg\n2 FORM jpg\n0 TRLR\n";
        let result = write(src, WriterOptions::default().with_validation(false));
        assert!(matches!(result, Err(GedcomError::VersionMismatch(_))));
    }

    #[test]
    fn test_zero_line_length_is_rejected() {
        let result = write(FULL, WriterOptions::default().with_max_line_length(0));
        assert!(matches!(result, Err(GedcomError::InvalidArgument(_))));
    }

    #[test]
    fn test_inline_link_in_55_layout() {
        let src = "0 HEAD\n1 GEDC\n2 VERS 5.5\n0 @I1@ INDI\n1 OBJE\n2 FORM jpg\n2 FILE me.jpg\n\
                   2 TITL Me\n0 TRLR\n";
        let gedcom = load(src).unwrap().gedcom;
        let options = WriterOptions::default().with_validation(false);
        let lines = GedcomWriter::with_options(&gedcom, options).lines().unwrap();
        let at = lines.iter().position(|l| l == "1 OBJE").unwrap();
        assert_eq!(&lines[at + 1..at + 4], ["2 FORM jpg", "2 TITL Me", "2 FILE me.jpg"]);
    }

    #[test]
    fn test_stubs_are_not_written() {
        let src = "0 @F1@ FAM\n1 HUSB @I9@\n0 TRLR\n";
        let gedcom = load(src).unwrap().gedcom;
        let options = WriterOptions::default().with_validation(false);
        let lines = GedcomWriter::with_options(&gedcom, options).lines().unwrap();
        assert!(!lines.iter().any(|l| l.contains("@I9@ INDI")));
    }

    #[test]
    fn test_unicode_output_has_bom() {
        let src = FULL.replace("1 CHAR UTF-8", "1 CHAR UNICODE");
        let gedcom = load(&src).unwrap().gedcom;
        let mut bytes = Vec::new();
        GedcomWriter::new(&gedcom).write(&mut bytes).unwrap();
        assert_eq!(&bytes[..4], &[0xFF, 0xFE, b'0', 0x00]);
    }
}
