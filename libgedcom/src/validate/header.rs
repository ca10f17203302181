//! Header, submission, submitters and trailer.

use super::shared::{
    check_change_date, check_contact, check_custom_tags, check_multimedia_links, check_notes,
    check_optional, check_pointer, check_user_references, snapshot,
};
use super::{Context, ItemRef, ProblemCode, Severity, Snapshot};
use crate::dialect::{CharacterSet, SupportedVersion};
use crate::model::{
    CharacterSetDecl, Gedcom, GedcomVersion, Header, RecordKind, RecordRef, SourceSystem,
    Submitter, TaggedValue, Trailer,
};

const UNSPECIFIED: &str = "UNSPECIFIED";

pub(super) fn check_header(ctx: &mut Context<'_>, gedcom: &mut Gedcom) {
    ctx.begin(ItemRef::Header);
    let before = Snapshot::Header(gedcom.header.clone());

    if gedcom.header.is_none()
        && ctx.repairable(
            Severity::Error,
            ProblemCode::MissingRequiredValue,
            "",
            "the document has no header",
        )
    {
        gedcom.header = Some(Header::default());
    }
    let first_submitter = gedcom.submitters.keys().next().cloned();
    let mut new_submitter = None;
    if let Some(header) = &mut gedcom.header {
        check_header_fields(ctx, header);
        new_submitter = check_header_submitter(ctx, header, first_submitter);
    }
    if let Some(xref) = new_submitter {
        let mut submitter = Submitter::new(&xref);
        submitter.name = Some(TaggedValue::new(UNSPECIFIED));
        gedcom.submitters.insert(xref.clone(), submitter);
        ctx.add_known(RecordKind::Submitter, &xref);
    }

    let header = &gedcom.header;
    ctx.finish(before, || Snapshot::Header(header.clone()));
}

fn check_header_fields(ctx: &mut Context<'_>, header: &mut Header) {
    // Source system
    match &mut header.source_system {
        None => {
            if ctx.repairable(
                Severity::Error,
                ProblemCode::MissingRequiredValue,
                "source_system",
                "the header has no source system",
            ) {
                header.source_system = Some(SourceSystem {
                    system_id: Some(UNSPECIFIED.to_string()),
                    ..SourceSystem::default()
                });
            }
        }
        Some(sour) => {
            let blank = sour.system_id.as_deref().map_or(true, |s| s.trim().is_empty());
            if blank
                && ctx.repairable(
                    Severity::Error,
                    ProblemCode::MissingRequiredValue,
                    "source_system.system_id",
                    "the source system has no id",
                )
            {
                sour.system_id = Some(UNSPECIFIED.to_string());
            }
            check_optional(ctx, "source_system.version_num", &mut sour.version_num);
            check_optional(ctx, "source_system.product_name", &mut sour.product_name);
            if let Some(corp) = &mut sour.corporation {
                check_contact(ctx, "source_system.corporation", &mut corp.contact);
                check_custom_tags(ctx, "source_system.corporation", &*corp);
            }
            if let Some(data) = &mut sour.source_data {
                check_optional(ctx, "source_system.source_data.publish_date", &mut data.publish_date);
                check_optional(ctx, "source_system.source_data.copyright", &mut data.copyright);
                check_custom_tags(ctx, "source_system.source_data", &*data);
            }
            check_custom_tags(ctx, "source_system", &*sour);
        }
    }

    // GEDCOM version
    match &mut header.gedcom_version {
        None => {
            if ctx.repairable(
                Severity::Error,
                ProblemCode::MissingRequiredValue,
                "gedcom_version",
                "the header does not declare a GEDCOM version",
            ) {
                header.gedcom_version = Some(GedcomVersion::new(SupportedVersion::V5_5_1));
            }
        }
        Some(gedc) => {
            match gedc.version.as_ref().and_then(TaggedValue::as_str) {
                None => {
                    if ctx.repairable(
                        Severity::Error,
                        ProblemCode::UnableToDetermineGedcomVersion,
                        "gedcom_version.version",
                        "the GEDCOM version is empty",
                    ) {
                        gedc.version = Some(TaggedValue::new(SupportedVersion::V5_5_1.as_str()));
                    }
                }
                Some(v) if SupportedVersion::parse(v).is_none() => {
                    let description = format!("GEDCOM version {} is not supported", v);
                    ctx.report(
                        Severity::Error,
                        ProblemCode::UnableToDetermineGedcomVersion,
                        "gedcom_version.version",
                        description,
                    );
                }
                Some(_) => {}
            }
            if gedc.form.as_ref().map_or(true, TaggedValue::is_blank)
                && ctx.repairable(
                    Severity::Error,
                    ProblemCode::MissingRequiredValue,
                    "gedcom_version.form",
                    "the GEDCOM form is missing",
                )
            {
                gedc.form = Some(TaggedValue::new("LINEAGE-LINKED"));
            }
            check_custom_tags(ctx, "gedcom_version", &*gedc);
        }
    }

    // Character set
    match &header.character_set {
        None => {
            if ctx.repairable(
                Severity::Error,
                ProblemCode::MissingRequiredValue,
                "character_set",
                "the header does not declare a character set",
            ) {
                header.character_set = Some(CharacterSetDecl::new(CharacterSet::Ansel));
            }
        }
        Some(decl) => match decl.character_set() {
            None => {
                let description = format!(
                    "character set {} is not recognized",
                    decl.name.as_deref().unwrap_or("")
                );
                ctx.report(
                    Severity::Error,
                    ProblemCode::IllegalValue,
                    "character_set.name",
                    description,
                );
            }
            Some(CharacterSet::Utf8) if ctx.is_55() => {
                ctx.report(
                    Severity::Error,
                    ProblemCode::NotAllowedInGedcom55,
                    "character_set.name",
                    "UTF-8 is only allowed in GEDCOM 5.5.1",
                );
            }
            Some(_) => {}
        },
    }

    if ctx.is_55() && header.copyright_data.len() > 1 {
        ctx.report(
            Severity::Error,
            ProblemCode::NotAllowedInGedcom55,
            "copyright_data",
            "GEDCOM 5.5 allows a single line of copyright data",
        );
    }

    if header.time.is_none() {
        check_optional(ctx, "date", &mut header.date);
    }
    check_optional(ctx, "time", &mut header.time);
    check_optional(ctx, "destination_system", &mut header.destination_system);
    check_optional(ctx, "file_name", &mut header.file_name);
    check_optional(ctx, "language", &mut header.language);
    check_optional(ctx, "place_hierarchy", &mut header.place_hierarchy);
    check_pointer(ctx, RecordKind::Submission, "submission", &mut header.submission);
    check_custom_tags(ctx, "custom_tags", &*header);
}

/// Returns the xref of a submitter record the caller must create.
fn check_header_submitter(
    ctx: &mut Context<'_>,
    header: &mut Header,
    first_submitter: Option<String>,
) -> Option<String> {
    check_pointer(ctx, RecordKind::Submitter, "submitter", &mut header.submitter);
    if header.submitter.is_some()
        || !ctx.repairable(
            Severity::Error,
            ProblemCode::MissingRequiredValue,
            "submitter",
            "the header does not name a submitter",
        )
    {
        return None;
    }
    if let Some(first) = first_submitter {
        header.submitter = Some(first);
        return None;
    }
    let mut xref = "@SUBM@".to_string();
    let mut n = 1;
    while ctx.exists(RecordKind::Submitter, &xref) {
        xref = format!("@SUBM{}@", n);
        n += 1;
    }
    header.submitter = Some(xref.clone());
    Some(xref)
}

pub(super) fn check_submission(ctx: &mut Context<'_>, gedcom: &mut Gedcom) {
    let Some(xref) = gedcom.submission.as_ref().and_then(|s| s.xref.clone()) else {
        return;
    };
    let r = RecordRef::new(RecordKind::Submission, &xref);
    if gedcom.stubs.contains(&r) {
        return;
    }
    ctx.begin(ItemRef::Record(r.clone()));
    let before = snapshot(gedcom, &r);
    if let Some(subn) = &mut gedcom.submission {
        check_pointer(ctx, RecordKind::Submitter, "submitter", &mut subn.submitter);
        for (name, value) in [
            ("name_of_family_file", &mut subn.name_of_family_file),
            ("temple_code", &mut subn.temple_code),
            ("ancestors_count", &mut subn.ancestors_count),
            ("descendants_count", &mut subn.descendants_count),
            ("ordinance_process_flag", &mut subn.ordinance_process_flag),
            ("rec_id_number", &mut subn.rec_id_number),
        ] {
            check_optional(ctx, name, value);
        }
        check_notes(ctx, "notes", &mut subn.notes);
        check_custom_tags(ctx, "custom_tags", &*subn);
    }
    let submission = &gedcom.submission;
    ctx.finish(before, || Snapshot::Submission(submission.clone()));
}

pub(super) fn check_submitters(ctx: &mut Context<'_>, gedcom: &mut Gedcom) {
    for (key, subm) in gedcom.submitters.iter_mut() {
        let r = RecordRef::new(RecordKind::Submitter, key);
        if gedcom.stubs.contains(&r) {
            continue;
        }
        ctx.begin(ItemRef::Record(r));
        let before = Snapshot::Submitter(subm.clone());
        super::records::check_xref(ctx, key, &mut subm.xref);

        if subm.name.as_ref().map_or(true, TaggedValue::is_blank)
            && ctx.repairable(
                Severity::Error,
                ProblemCode::MissingRequiredValue,
                "name",
                "a submitter needs a name",
            )
        {
            subm.name = Some(TaggedValue::new(UNSPECIFIED));
        }
        if subm.language_pref.len() > 3 {
            let description = format!(
                "at most 3 language preferences are allowed, found {}",
                subm.language_pref.len()
            );
            ctx.report(
                Severity::Error,
                ProblemCode::TooManyValues,
                "language_pref",
                description,
            );
        }
        check_contact(ctx, "contact", &mut subm.contact);
        check_multimedia_links(ctx, "multimedia", &mut subm.multimedia);
        check_optional(ctx, "registration_file_number", &mut subm.registration_file_number);
        check_optional(ctx, "rec_id_number", &mut subm.rec_id_number);
        check_notes(ctx, "notes", &mut subm.notes);
        check_user_references(ctx, "user_references", &mut subm.user_references);
        check_change_date(ctx, "change_date", &mut subm.change_date);
        check_custom_tags(ctx, "custom_tags", &*subm);

        ctx.finish(before, || Snapshot::Submitter(subm.clone()));
    }
}

pub(super) fn check_trailer(ctx: &mut Context<'_>, gedcom: &mut Gedcom) {
    ctx.begin(ItemRef::Trailer);
    let before = Snapshot::Trailer(gedcom.trailer.clone());
    match &gedcom.trailer {
        None => {
            if ctx.repairable(
                Severity::Error,
                ProblemCode::MissingRequiredValue,
                "",
                "the document has no trailer",
            ) {
                gedcom.trailer = Some(Trailer::default());
            }
        }
        Some(trailer) => check_custom_tags(ctx, "custom_tags", &*trailer),
    }
    let trailer = &gedcom.trailer;
    ctx.finish(before, || Snapshot::Trailer(trailer.clone()));
}

#[cfg(test)]
mod tests {
    use crate::load;
    use crate::validate::{ProblemCode, Severity, Validator};

    #[test]
    fn test_empty_document_is_repaired() {
        let mut g = load("").unwrap().gedcom;
        let results = Validator::repairing().validate(&mut g);
        assert!(!results.has_errors(), "{:#?}", results);
        let header = g.header.as_ref().unwrap();
        assert_eq!(
            header.source_system.as_ref().unwrap().system_id.as_deref(),
            Some("UNSPECIFIED")
        );
        assert_eq!(header.submitter.as_deref(), Some("@SUBM@"));
        assert_eq!(
            g.submitters["@SUBM@"].name.as_ref().unwrap().as_str(),
            Some("UNSPECIFIED")
        );
        assert!(g.trailer.is_some());
        assert!(Validator::repairing().validate(&mut g).is_empty());
    }

    #[test]
    fn test_missing_submitter_points_at_existing() {
        let src = "0 HEAD\n1 SOUR X\n1 GEDC\n2 VERS 5.5.1\n2 FORM LINEAGE-LINKED\n1 CHAR ASCII\n\
                   0 @U7@ SUBM\n1 NAME Someone\n0 TRLR\n";
        let mut g = load(src).unwrap().gedcom;
        let results = Validator::repairing().validate(&mut g);
        assert_eq!(results.len(), 1, "{:#?}", results);
        assert_eq!(g.header.unwrap().submitter.as_deref(), Some("@U7@"));
    }

    #[test]
    fn test_utf8_under_55() {
        let src = "0 HEAD\n1 SOUR X\n1 SUBM @U1@\n1 GEDC\n2 VERS 5.5\n2 FORM LINEAGE-LINKED\n1 CHAR UTF-8\n\
                   0 @U1@ SUBM\n1 NAME A\n0 TRLR\n";
        let mut g = load(src).unwrap().gedcom;
        let results = Validator::new().validate(&mut g);
        let codes: Vec<_> = results.all().iter().map(|f| f.code()).collect();
        assert_eq!(codes, vec![ProblemCode::NotAllowedInGedcom55]);
        assert_eq!(results.all()[0].severity(), Severity::Error);
    }

    #[test]
    fn test_submitter_without_name() {
        let src = "0 HEAD\n1 SOUR X\n1 SUBM @U1@\n1 GEDC\n2 VERS 5.5.1\n2 FORM LINEAGE-LINKED\n1 CHAR ANSEL\n\
                   0 @U1@ SUBM\n1 LANG English\n1 LANG French\n1 LANG German\n1 LANG Dutch\n0 TRLR\n";
        let mut g = load(src).unwrap().gedcom;
        let results = Validator::repairing().validate(&mut g);
        assert_eq!(results.by_code(ProblemCode::MissingRequiredValue).count(), 1);
        assert_eq!(results.by_code(ProblemCode::TooManyValues).count(), 1);
        assert_eq!(
            g.submitters["@U1@"].name.as_ref().unwrap().as_str(),
            Some("UNSPECIFIED")
        );
    }
}
