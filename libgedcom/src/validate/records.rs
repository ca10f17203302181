//! Individuals, families, sources, repositories, multimedia and notes.

use super::shared::{
    check_change_date, check_citations, check_contact, check_custom_tags, check_duplicates,
    check_event_detail, check_multimedia_links, check_notes, check_optional, check_pointer,
    check_pointers, check_required, check_user_references, only_551, retain_linked,
};
use super::{Context, ItemRef, ProblemCode, Severity, Snapshot};
use crate::model::{
    Family, FamilyEventType, Gedcom, Individual, IndividualAttributeType, LdsOrdinance,
    Multimedia, Note, PersonalName, RecordKind, RecordRef, Repository, Source,
};
use crate::tokenizer::is_xref;

/// The record's own xref must be well formed and match its map key.
pub(super) fn check_xref(ctx: &mut Context<'_>, key: &str, xref: &mut Option<String>) {
    if !is_xref(key) {
        ctx.report(
            Severity::Error,
            ProblemCode::XrefInvalid,
            "xref",
            format!("{:?} is not a well-formed cross-reference id", key),
        );
    }
    if xref.as_deref() != Some(key) {
        let description = format!(
            "record is stored under {} but its xref is {}",
            key,
            xref.as_deref().unwrap_or("missing")
        );
        if ctx.repairable(Severity::Error, ProblemCode::XrefInvalid, "xref", description) {
            *xref = Some(key.to_string());
        }
    }
}

pub(super) fn check_records(ctx: &mut Context<'_>, gedcom: &mut Gedcom) {
    let Gedcom {
        individuals,
        families,
        sources,
        repositories,
        multimedia,
        notes,
        stubs,
        ..
    } = gedcom;

    for (key, ind) in individuals.iter_mut() {
        let r = RecordRef::new(RecordKind::Individual, key);
        if stubs.contains(&r) {
            continue;
        }
        ctx.begin(ItemRef::Record(r));
        let before = Snapshot::Individual(ind.clone());
        check_xref(ctx, key, &mut ind.xref);
        check_individual(ctx, ind);
        ctx.finish(before, || Snapshot::Individual(ind.clone()));
    }
    for (key, fam) in families.iter_mut() {
        let r = RecordRef::new(RecordKind::Family, key);
        if stubs.contains(&r) {
            continue;
        }
        ctx.begin(ItemRef::Record(r));
        let before = Snapshot::Family(fam.clone());
        check_xref(ctx, key, &mut fam.xref);
        check_family(ctx, fam);
        ctx.finish(before, || Snapshot::Family(fam.clone()));
    }
    for (key, sour) in sources.iter_mut() {
        let r = RecordRef::new(RecordKind::Source, key);
        if stubs.contains(&r) {
            continue;
        }
        ctx.begin(ItemRef::Record(r));
        let before = Snapshot::Source(sour.clone());
        check_xref(ctx, key, &mut sour.xref);
        check_source(ctx, sour);
        ctx.finish(before, || Snapshot::Source(sour.clone()));
    }
    for (key, repo) in repositories.iter_mut() {
        let r = RecordRef::new(RecordKind::Repository, key);
        if stubs.contains(&r) {
            continue;
        }
        ctx.begin(ItemRef::Record(r));
        let before = Snapshot::Repository(repo.clone());
        check_xref(ctx, key, &mut repo.xref);
        check_repository(ctx, repo);
        ctx.finish(before, || Snapshot::Repository(repo.clone()));
    }
    for (key, media) in multimedia.iter_mut() {
        let r = RecordRef::new(RecordKind::Multimedia, key);
        if stubs.contains(&r) {
            continue;
        }
        ctx.begin(ItemRef::Record(r));
        let before = Snapshot::Multimedia(media.clone());
        check_xref(ctx, key, &mut media.xref);
        check_multimedia(ctx, media);
        ctx.finish(before, || Snapshot::Multimedia(media.clone()));
    }
    for (key, note) in notes.iter_mut() {
        let r = RecordRef::new(RecordKind::Note, key);
        if stubs.contains(&r) {
            continue;
        }
        ctx.begin(ItemRef::Record(r));
        let before = Snapshot::Note(note.clone());
        check_xref(ctx, key, &mut note.xref);
        check_note(ctx, note);
        ctx.finish(before, || Snapshot::Note(note.clone()));
    }
}

// =============================================================================
// Individuals
// =============================================================================

fn check_individual(ctx: &mut Context<'_>, ind: &mut Individual) {
    for (i, name) in ind.names.iter_mut().enumerate() {
        check_name(ctx, &format!("names[{}]", i), name);
    }
    check_duplicates(ctx, Severity::Warning, "names", &mut ind.names);

    check_optional(ctx, "sex", &mut ind.sex);
    if let Some(sex) = ind.sex.as_ref().and_then(|s| s.as_str()) {
        if !matches!(sex, "M" | "F" | "U") {
            ctx.report(
                Severity::Warning,
                ProblemCode::IllegalValue,
                "sex",
                format!("sex should be M, F or U, not {:?}", sex),
            );
        }
    }
    check_contact(ctx, "contact", &mut ind.contact);

    for (i, event) in ind.events.iter_mut().enumerate() {
        let path = format!("events[{}]", i);
        check_event_detail(ctx, &path, &mut event.detail);
        check_pointer(
            ctx,
            RecordKind::Family,
            &format!("{}.family_child", path),
            &mut event.family_child,
        );
        check_optional(ctx, &format!("{}.adopted_by", path), &mut event.adopted_by);
    }
    for (i, attr) in ind.attributes.iter_mut().enumerate() {
        let path = format!("attributes[{}]", i);
        if attr.kind == IndividualAttributeType::Fact && ctx.is_55() {
            ctx.report(
                Severity::Error,
                ProblemCode::NotAllowedInGedcom55,
                &path,
                "FACT is only allowed in GEDCOM 5.5.1",
            );
        }
        check_event_detail(ctx, &path, &mut attr.detail);
    }
    for (i, ord) in ind.lds_ordinances.iter_mut().enumerate() {
        check_lds_ordinance(ctx, &format!("lds_ordinances[{}]", i), ord);
    }

    retain_linked(ctx, "families_where_child", &mut ind.families_where_child, |l| {
        Some((RecordKind::Family, l.family.as_str()))
    });
    for (i, link) in ind.families_where_child.iter_mut().enumerate() {
        let path = format!("families_where_child[{}]", i);
        check_optional(ctx, &format!("{}.pedigree", path), &mut link.pedigree);
        check_optional(ctx, &format!("{}.adopted_by", path), &mut link.adopted_by);
        check_optional(ctx, &format!("{}.status", path), &mut link.status);
        only_551(ctx, &format!("{}.status", path), &mut link.status);
        check_notes(ctx, &format!("{}.notes", path), &mut link.notes);
        check_custom_tags(ctx, &path, &*link);
    }
    check_duplicates(
        ctx,
        Severity::Error,
        "families_where_child",
        &mut ind.families_where_child,
    );

    retain_linked(ctx, "families_where_spouse", &mut ind.families_where_spouse, |l| {
        Some((RecordKind::Family, l.family.as_str()))
    });
    for (i, link) in ind.families_where_spouse.iter_mut().enumerate() {
        let path = format!("families_where_spouse[{}]", i);
        check_notes(ctx, &format!("{}.notes", path), &mut link.notes);
        check_custom_tags(ctx, &path, &*link);
    }
    check_duplicates(
        ctx,
        Severity::Error,
        "families_where_spouse",
        &mut ind.families_where_spouse,
    );

    retain_linked(ctx, "associations", &mut ind.associations, |a| {
        let kind = a
            .associated_entity_type
            .as_ref()
            .and_then(|t| t.as_str())
            .and_then(RecordKind::from_tag)
            .unwrap_or(RecordKind::Individual);
        Some((kind, a.associated_entity.as_str()))
    });
    for (i, asso) in ind.associations.iter_mut().enumerate() {
        let path = format!("associations[{}]", i);
        check_optional(ctx, &format!("{}.relationship", path), &mut asso.relationship);
        check_citations(ctx, &format!("{}.citations", path), &mut asso.citations);
        check_notes(ctx, &format!("{}.notes", path), &mut asso.notes);
        check_custom_tags(ctx, &path, &*asso);
    }

    check_pointers(ctx, RecordKind::Individual, "aliases", &mut ind.aliases);
    check_pointers(ctx, RecordKind::Submitter, "ancestor_interest", &mut ind.ancestor_interest);
    check_pointers(
        ctx,
        RecordKind::Submitter,
        "descendant_interest",
        &mut ind.descendant_interest,
    );
    check_pointers(ctx, RecordKind::Submitter, "submitters", &mut ind.submitters);
    check_citations(ctx, "citations", &mut ind.citations);
    check_notes(ctx, "notes", &mut ind.notes);
    check_multimedia_links(ctx, "multimedia", &mut ind.multimedia);
    check_user_references(ctx, "user_references", &mut ind.user_references);
    check_optional(ctx, "ancestral_file_number", &mut ind.ancestral_file_number);
    check_optional(ctx, "permanent_rec_file_number", &mut ind.permanent_rec_file_number);
    check_optional(ctx, "rec_id_number", &mut ind.rec_id_number);
    check_optional(ctx, "restriction_notice", &mut ind.restriction_notice);
    only_551(ctx, "restriction_notice", &mut ind.restriction_notice);
    check_change_date(ctx, "change_date", &mut ind.change_date);
    check_custom_tags(ctx, "custom_tags", &*ind);
}

fn check_name(ctx: &mut Context<'_>, path: &str, name: &mut PersonalName) {
    for (field, value) in [
        ("name_type", &mut name.name_type),
        ("prefix", &mut name.prefix),
        ("given_name", &mut name.given_name),
        ("nickname", &mut name.nickname),
        ("surname_prefix", &mut name.surname_prefix),
        ("surname", &mut name.surname),
        ("suffix", &mut name.suffix),
    ] {
        check_optional(ctx, &format!("{}.{}", path, field), value);
    }
    only_551(ctx, &format!("{}.name_type", path), &mut name.name_type);
    only_551(ctx, &format!("{}.romanized", path), &mut name.romanized);
    only_551(ctx, &format!("{}.phonetic", path), &mut name.phonetic);
    for (i, variation) in name.romanized.iter_mut().chain(name.phonetic.iter_mut()).enumerate() {
        let v_path = format!("{}.variations[{}]", path, i);
        if variation.variation_type.as_ref().map_or(true, |t| t.is_blank()) {
            ctx.report(
                Severity::Error,
                ProblemCode::MissingRequiredValue,
                format!("{}.variation_type", v_path),
                "a name variation needs a TYPE",
            );
        }
        check_citations(ctx, &format!("{}.citations", v_path), &mut variation.citations);
        check_notes(ctx, &format!("{}.notes", v_path), &mut variation.notes);
        check_custom_tags(ctx, &v_path, &*variation);
    }
    check_citations(ctx, &format!("{}.citations", path), &mut name.citations);
    check_notes(ctx, &format!("{}.notes", path), &mut name.notes);
    check_custom_tags(ctx, path, &*name);
}

fn check_lds_ordinance(ctx: &mut Context<'_>, path: &str, ord: &mut LdsOrdinance) {
    for (field, value) in [
        ("date", &mut ord.date),
        ("place", &mut ord.place),
        ("status", &mut ord.status),
        ("temple", &mut ord.temple),
    ] {
        check_optional(ctx, &format!("{}.{}", path, field), value);
    }
    check_pointer(
        ctx,
        RecordKind::Family,
        &format!("{}.family_child", path),
        &mut ord.family_child,
    );
    check_citations(ctx, &format!("{}.citations", path), &mut ord.citations);
    check_notes(ctx, &format!("{}.notes", path), &mut ord.notes);
    check_custom_tags(ctx, path, &*ord);
}

// =============================================================================
// Families
// =============================================================================

fn check_family(ctx: &mut Context<'_>, fam: &mut Family) {
    check_pointer(ctx, RecordKind::Individual, "husband", &mut fam.husband);
    check_pointer(ctx, RecordKind::Individual, "wife", &mut fam.wife);
    check_pointers(ctx, RecordKind::Individual, "children", &mut fam.children);
    check_optional(ctx, "num_children", &mut fam.num_children);

    for (i, event) in fam.events.iter_mut().enumerate() {
        let path = format!("events[{}]", i);
        if event.kind == FamilyEventType::Residence && ctx.is_55() {
            ctx.report(
                Severity::Error,
                ProblemCode::NotAllowedInGedcom55,
                &path,
                "RESI on a family is only allowed in GEDCOM 5.5.1",
            );
        }
        check_event_detail(ctx, &path, &mut event.detail);
        check_optional(ctx, &format!("{}.husband_age", path), &mut event.husband_age);
        check_optional(ctx, &format!("{}.wife_age", path), &mut event.wife_age);
    }
    for (i, ord) in fam.lds_spouse_sealings.iter_mut().enumerate() {
        check_lds_ordinance(ctx, &format!("lds_spouse_sealings[{}]", i), ord);
    }
    check_pointers(ctx, RecordKind::Submitter, "submitters", &mut fam.submitters);
    check_citations(ctx, "citations", &mut fam.citations);
    check_notes(ctx, "notes", &mut fam.notes);
    check_multimedia_links(ctx, "multimedia", &mut fam.multimedia);
    check_user_references(ctx, "user_references", &mut fam.user_references);
    check_optional(ctx, "rec_id_number", &mut fam.rec_id_number);
    check_optional(ctx, "permanent_rec_file_number", &mut fam.permanent_rec_file_number);
    check_optional(ctx, "restriction_notice", &mut fam.restriction_notice);
    only_551(ctx, "restriction_notice", &mut fam.restriction_notice);
    check_change_date(ctx, "change_date", &mut fam.change_date);
    check_custom_tags(ctx, "custom_tags", &*fam);
}

// =============================================================================
// Sources, repositories, multimedia, notes
// =============================================================================

fn check_source(ctx: &mut Context<'_>, sour: &mut Source) {
    if let Some(data) = &mut sour.data {
        for (i, even) in data.events_recorded.iter_mut().enumerate() {
            let path = format!("data.events_recorded[{}]", i);
            check_optional(ctx, &format!("{}.date_period", path), &mut even.date_period);
            check_optional(ctx, &format!("{}.jurisdiction", path), &mut even.jurisdiction);
            check_custom_tags(ctx, &path, &*even);
        }
        check_optional(ctx, "data.responsible_agency", &mut data.responsible_agency);
        check_notes(ctx, "data.notes", &mut data.notes);
        check_custom_tags(ctx, "data", &*data);
    }
    check_optional(ctx, "source_filed_by", &mut sour.source_filed_by);
    for (i, cite) in sour.repository_citations.iter_mut().enumerate() {
        let path = format!("repository_citations[{}]", i);
        check_pointer(
            ctx,
            RecordKind::Repository,
            &format!("{}.repository", path),
            &mut cite.repository,
        );
        for (j, caln) in cite.call_numbers.iter_mut().enumerate() {
            let c_path = format!("{}.call_numbers[{}]", path, j);
            check_optional(ctx, &format!("{}.media_type", c_path), &mut caln.media_type);
            check_custom_tags(ctx, &c_path, &*caln);
        }
        check_notes(ctx, &format!("{}.notes", path), &mut cite.notes);
        check_custom_tags(ctx, &path, &*cite);
    }
    check_multimedia_links(ctx, "multimedia", &mut sour.multimedia);
    check_notes(ctx, "notes", &mut sour.notes);
    check_user_references(ctx, "user_references", &mut sour.user_references);
    check_optional(ctx, "rec_id_number", &mut sour.rec_id_number);
    check_change_date(ctx, "change_date", &mut sour.change_date);
    check_custom_tags(ctx, "custom_tags", &*sour);
}

fn check_repository(ctx: &mut Context<'_>, repo: &mut Repository) {
    check_required(ctx, "name", &repo.name);
    check_contact(ctx, "contact", &mut repo.contact);
    check_notes(ctx, "notes", &mut repo.notes);
    check_user_references(ctx, "user_references", &mut repo.user_references);
    check_optional(ctx, "rec_id_number", &mut repo.rec_id_number);
    check_change_date(ctx, "change_date", &mut repo.change_date);
    check_custom_tags(ctx, "custom_tags", &*repo);
}

fn check_multimedia(ctx: &mut Context<'_>, media: &mut Multimedia) {
    if media.is_551_style() {
        if ctx.is_55() {
            ctx.report(
                Severity::Error,
                ProblemCode::NotAllowedInGedcom55,
                "file_references",
                "file references in a multimedia record are only allowed in GEDCOM 5.5.1",
            );
        }
        for (i, file) in media.file_references.iter_mut().enumerate() {
            let path = format!("file_references[{}]", i);
            check_required(ctx, &format!("{}.reference_to_file", path), &file.reference_to_file);
            check_required(ctx, &format!("{}.format", path), &file.format);
            check_optional(ctx, &format!("{}.media_type", path), &mut file.media_type);
            check_optional(ctx, &format!("{}.title", path), &mut file.title);
            check_custom_tags(ctx, &path, &*file);
        }
    } else {
        if !ctx.is_55() {
            if !media.blob.is_empty() {
                ctx.report(
                    Severity::Error,
                    ProblemCode::NotAllowedInGedcom551,
                    "blob",
                    "BLOB is only allowed in GEDCOM 5.5",
                );
            }
            if media.continued_object.is_some() {
                ctx.report(
                    Severity::Error,
                    ProblemCode::NotAllowedInGedcom551,
                    "continued_object",
                    "chained OBJE is only allowed in GEDCOM 5.5",
                );
            }
        }
        check_required(ctx, "embedded_media_format", &media.embedded_media_format);
        check_optional(ctx, "embedded_title", &mut media.embedded_title);
    }
    check_pointer(
        ctx,
        RecordKind::Multimedia,
        "continued_object",
        &mut media.continued_object,
    );
    check_citations(ctx, "citations", &mut media.citations);
    check_notes(ctx, "notes", &mut media.notes);
    check_user_references(ctx, "user_references", &mut media.user_references);
    check_optional(ctx, "rec_id_number", &mut media.rec_id_number);
    check_change_date(ctx, "change_date", &mut media.change_date);
    check_custom_tags(ctx, "custom_tags", &*media);
}

fn check_note(ctx: &mut Context<'_>, note: &mut Note) {
    check_citations(ctx, "citations", &mut note.citations);
    check_user_references(ctx, "user_references", &mut note.user_references);
    check_optional(ctx, "rec_id_number", &mut note.rec_id_number);
    check_change_date(ctx, "change_date", &mut note.change_date);
    check_custom_tags(ctx, "custom_tags", &*note);
}

#[cfg(test)]
mod tests {
    use crate::load;
    use crate::model::{RecordKind, TaggedValue};
    use crate::validate::{ProblemCode, Severity, Validator};

    const HEAD: &str = "0 HEAD\n1 SOUR X\n1 SUBM @U1@\n1 GEDC\n2 VERS 5.5.1\n2 FORM LINEAGE-LINKED\n\
                        1 CHAR ANSEL\n0 @U1@ SUBM\n1 NAME A\n";

    fn doc(body: &str) -> String {
        format!("{}{}0 TRLR\n", HEAD, body)
    }

    #[test]
    fn test_xref_mismatch_repaired() {
        let mut g = load(&doc("0 @I1@ INDI\n1 NAME A\n")).unwrap().gedcom;
        g.individuals.get_mut("@I1@").unwrap().xref = Some("@I2@".into());
        let results = Validator::repairing().validate(&mut g);
        let finding = results.by_code(ProblemCode::XrefInvalid).next().unwrap();
        assert_eq!(finding.severity(), Severity::Info);
        assert_eq!(g.individuals["@I1@"].xref.as_deref(), Some("@I1@"));
    }

    #[test]
    fn test_bad_key_is_reported() {
        let mut g = load(&doc("")).unwrap().gedcom;
        let mut ind = crate::model::Individual::new("I1");
        ind.sex = Some(TaggedValue::new("M"));
        g.individuals.insert("I1".into(), ind);
        let results = Validator::new().validate(&mut g);
        assert_eq!(results.by_code(ProblemCode::XrefInvalid).count(), 1);
        assert_eq!(results.for_record(RecordKind::Individual, "I1").count(), 1);
    }

    #[test]
    fn test_dialect_fields_under_55() {
        let src = doc(
            "0 @I1@ INDI\n1 NAME A\n1 RESN locked\n1 EMAIL a@b.c\n1 FACT Tall\n1 BIRT\n2 RELI Quaker\n",
        )
        .replace("2 VERS 5.5.1", "2 VERS 5.5");
        let mut g = load(&src).unwrap().gedcom;
        let results = Validator::repairing().validate(&mut g);
        assert_eq!(results.by_code(ProblemCode::NotAllowedInGedcom55).count(), 4);
        // FACT cannot be repaired away
        assert_eq!(results.by_severity(Severity::Error).count(), 1);
        let ind = &g.individuals["@I1@"];
        assert!(ind.restriction_notice.is_none());
        assert!(ind.contact.emails.is_empty());
        assert!(ind.events[0].detail.religious_affiliation.is_none());
    }

    #[test]
    fn test_blob_under_551() {
        let mut g = load(&doc("0 @M1@ OBJE\n1 FORM bmp\n1 BLOB abc\n")).unwrap().gedcom;
        let results = Validator::new().validate(&mut g);
        assert_eq!(results.by_code(ProblemCode::NotAllowedInGedcom551).count(), 1);
    }

    #[test]
    fn test_certainty_range() {
        let mut g = load(&doc("0 @I1@ INDI\n1 SOUR @S1@\n2 QUAY 7\n0 @S1@ SOUR\n"))
            .unwrap()
            .gedcom;
        let results = Validator::new().validate(&mut g);
        let finding = results.by_code(ProblemCode::IllegalValue).next().unwrap();
        assert_eq!(finding.field(), "citations[0].certainty");
    }

    #[test]
    fn test_non_underscore_custom_tag_warns() {
        let src = doc("0 @I1@ INDI\n1 ODDTAG x\n");
        let opts = crate::LoadOptions::default().with_strict_custom_tags(false);
        let mut g = crate::load_with_options(&src, &opts).unwrap().gedcom;
        let results = Validator::new().validate(&mut g);
        assert_eq!(results.len(), 1);
        assert_eq!(results.all()[0].severity(), Severity::Warning);
    }

    #[test]
    fn test_custom_tags_under_pointers_are_checked() {
        let src = doc("0 @N1@ NOTE Shared\n0 @M1@ OBJE\n1 FILE a.jpg\n2 FORM jpg\n\
                       0 @I1@ INDI\n1 NOTE @N1@\n2 ODDTAG y\n1 OBJE @M1@\n2 OTHER z\n");
        let opts = crate::LoadOptions::default().with_strict_custom_tags(false);
        let mut g = crate::load_with_options(&src, &opts).unwrap().gedcom;
        let results = Validator::new().validate(&mut g);
        let fields: Vec<_> = results.all().iter().map(|f| f.field()).collect();
        assert_eq!(fields, vec!["notes[0][0]", "multimedia[0][0]"]);
    }
}
