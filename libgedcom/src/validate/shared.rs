//! Checks shared by many structures: blank values, pointers, duplicates,
//! custom tags, notes, citations, multimedia links, places and events.

use super::{Context, ItemRef, ProblemCode, Severity, Snapshot};
use crate::model::{
    ChangeDate, Citation, ContactInfo, EventDetail, Gedcom, HasCustomTags, MultimediaLink,
    NoteStructure, Place, RecordKind, RecordRef, TaggedValue, UserReference,
};

// =============================================================================
// Stub records
// =============================================================================

pub(super) fn check_stubs(ctx: &mut Context<'_>, gedcom: &mut Gedcom) {
    let stubs: Vec<RecordRef> = gedcom.stubs.iter().cloned().collect();
    for stub in stubs {
        ctx.begin(ItemRef::Record(stub.clone()));
        let repair = ctx.repairable(
            Severity::Error,
            ProblemCode::CrossReferenceNotFound,
            "",
            format!("{} is referenced but never defined", stub),
        );
        if repair {
            let before = snapshot(gedcom, &stub);
            remove_record(gedcom, &stub);
            gedcom.stubs.shift_remove(&stub);
            ctx.finish(before, || Snapshot::Removed(stub.clone()));
        }
    }
}

/// Copy of the record behind `r`, or `Removed` if there is none.
pub(super) fn snapshot(gedcom: &Gedcom, r: &RecordRef) -> Snapshot {
    let x = r.xref.as_str();
    let found = match r.kind {
        RecordKind::Individual => gedcom.individuals.get(x).cloned().map(Snapshot::Individual),
        RecordKind::Family => gedcom.families.get(x).cloned().map(Snapshot::Family),
        RecordKind::Source => gedcom.sources.get(x).cloned().map(Snapshot::Source),
        RecordKind::Repository => gedcom.repositories.get(x).cloned().map(Snapshot::Repository),
        RecordKind::Multimedia => gedcom.multimedia.get(x).cloned().map(Snapshot::Multimedia),
        RecordKind::Note => gedcom.notes.get(x).cloned().map(Snapshot::Note),
        RecordKind::Submitter => gedcom.submitters.get(x).cloned().map(Snapshot::Submitter),
        RecordKind::Submission => Some(Snapshot::Submission(gedcom.submission.clone())),
    };
    found.unwrap_or_else(|| Snapshot::Removed(r.clone()))
}

fn remove_record(gedcom: &mut Gedcom, r: &RecordRef) {
    let x = r.xref.as_str();
    match r.kind {
        RecordKind::Individual => {
            gedcom.individuals.shift_remove(x);
        }
        RecordKind::Family => {
            gedcom.families.shift_remove(x);
        }
        RecordKind::Source => {
            gedcom.sources.shift_remove(x);
        }
        RecordKind::Repository => {
            gedcom.repositories.shift_remove(x);
        }
        RecordKind::Multimedia => {
            gedcom.multimedia.shift_remove(x);
        }
        RecordKind::Note => {
            gedcom.notes.shift_remove(x);
        }
        RecordKind::Submitter => {
            gedcom.submitters.shift_remove(x);
        }
        RecordKind::Submission => {
            if gedcom.contains(RecordKind::Submission, x) {
                gedcom.submission = None;
            }
        }
    }
}

pub(super) fn check_root_custom_tags(ctx: &mut Context<'_>, gedcom: &Gedcom) {
    ctx.begin(ItemRef::Document);
    check_custom_tags(ctx, "custom_tags", gedcom);
}

// =============================================================================
// Values
// =============================================================================

/// An optional value, when present, must not be blank.
pub(super) fn check_optional(ctx: &mut Context<'_>, field: &str, value: &mut Option<TaggedValue>) {
    let blank = value
        .as_ref()
        .map_or(false, |v| v.is_blank() && v.custom_tags.is_empty());
    if blank
        && ctx.repairable(
            Severity::Warning,
            ProblemCode::IllegalValue,
            field,
            "value is present but blank",
        )
    {
        *value = None;
    }
}

/// A required value must be present and not blank.
pub(super) fn check_required(ctx: &mut Context<'_>, field: &str, value: &Option<TaggedValue>) {
    if value.as_ref().map_or(true, TaggedValue::is_blank) {
        ctx.report(
            Severity::Error,
            ProblemCode::MissingRequiredValue,
            field,
            "a value is required",
        );
    }
}

/// Flag a field the 5.5 dialect does not have, clearing it on repair.
pub(super) fn only_551<T: Default + PartialEq>(ctx: &mut Context<'_>, field: &str, value: &mut T) {
    if ctx.is_55()
        && *value != T::default()
        && ctx.repairable(
            Severity::Error,
            ProblemCode::NotAllowedInGedcom55,
            field,
            "only allowed in GEDCOM 5.5.1",
        )
    {
        *value = T::default();
    }
}

pub(super) fn check_custom_tags<T: HasCustomTags + ?Sized>(
    ctx: &mut Context<'_>,
    field: &str,
    item: &T,
) {
    for (i, tag) in item.custom_tags().iter().enumerate() {
        if !tag.is_user_defined() {
            ctx.report(
                Severity::Warning,
                ProblemCode::IllegalValue,
                format!("{}[{}]", field, i),
                format!("custom tag {} does not begin with an underscore", tag.tag),
            );
        }
    }
}

// =============================================================================
// Pointers and lists
// =============================================================================

pub(super) fn check_pointer(
    ctx: &mut Context<'_>,
    kind: RecordKind,
    field: &str,
    slot: &mut Option<String>,
) {
    let missing = slot.as_deref().map_or(false, |x| !ctx.exists(kind, x));
    if missing {
        let xref = slot.as_deref().unwrap_or_default();
        let description = format!("{} {} does not exist", kind.tag(), xref);
        if ctx.repairable(
            Severity::Error,
            ProblemCode::CrossReferenceNotFound,
            field,
            description,
        ) {
            *slot = None;
        }
    }
}

/// Drop entries whose target record does not exist, then duplicates.
pub(super) fn check_pointers(
    ctx: &mut Context<'_>,
    kind: RecordKind,
    field: &str,
    list: &mut Vec<String>,
) {
    retain_linked(ctx, field, list, |x| Some((kind, x.as_str())));
    check_duplicates(ctx, Severity::Error, field, list);
}

/// Remove list entries whose link is dangling, when repair is allowed.
pub(super) fn retain_linked<T>(
    ctx: &mut Context<'_>,
    field: &str,
    list: &mut Vec<T>,
    target: impl Fn(&T) -> Option<(RecordKind, &str)>,
) {
    let mut i = 0;
    let mut index = 0;
    while i < list.len() {
        let dangling = match target(&list[i]) {
            Some((kind, xref)) if !ctx.exists(kind, xref) => {
                Some(format!("{} {} does not exist", kind.tag(), xref))
            }
            _ => None,
        };
        if let Some(description) = dangling {
            if ctx.repairable(
                Severity::Error,
                ProblemCode::CrossReferenceNotFound,
                format!("{}[{}]", field, index),
                description,
            ) {
                list.remove(i);
                index += 1;
                continue;
            }
        }
        i += 1;
        index += 1;
    }
}

/// Report entries equal to an earlier entry, removing them on repair.
pub(super) fn check_duplicates<T: PartialEq>(
    ctx: &mut Context<'_>,
    severity: Severity,
    field: &str,
    list: &mut Vec<T>,
) {
    let mut i = 0;
    while i < list.len() {
        if list[..i].contains(&list[i])
            && ctx.repairable(
                severity,
                ProblemCode::DuplicateValue,
                format!("{}[{}]", field, i),
                "duplicate entry",
            )
        {
            list.remove(i);
            continue;
        }
        i += 1;
    }
}

// =============================================================================
// Substructures
// =============================================================================

pub(super) fn check_notes(ctx: &mut Context<'_>, field: &str, notes: &mut Vec<NoteStructure>) {
    retain_linked(ctx, field, notes, |n| n.xref().map(|x| (RecordKind::Note, x)));
    for (i, note) in notes.iter_mut().enumerate() {
        let path = format!("{}[{}]", field, i);
        match note {
            NoteStructure::Reference { .. } => check_custom_tags(ctx, &path, &*note),
            NoteStructure::Inline(body) => {
                check_citations(ctx, &format!("{}.citations", path), &mut body.citations);
                check_user_references(
                    ctx,
                    &format!("{}.user_references", path),
                    &mut body.user_references,
                );
                check_optional(ctx, &format!("{}.rec_id_number", path), &mut body.rec_id_number);
                check_change_date(ctx, &format!("{}.change_date", path), &mut body.change_date);
                check_custom_tags(ctx, &path, &*body);
            }
        }
    }
    check_duplicates(ctx, Severity::Warning, field, notes);
}

pub(super) fn check_citations(ctx: &mut Context<'_>, field: &str, citations: &mut Vec<Citation>) {
    retain_linked(ctx, field, citations, |c| {
        c.source_xref().map(|x| (RecordKind::Source, x))
    });
    for (i, citation) in citations.iter_mut().enumerate() {
        let path = format!("{}[{}]", field, i);
        match citation {
            Citation::WithSource(c) => {
                check_optional(ctx, &format!("{}.where_in_source", path), &mut c.where_in_source);
                check_optional(ctx, &format!("{}.event_cited", path), &mut c.event_cited);
                check_optional(ctx, &format!("{}.role_in_event", path), &mut c.role_in_event);
                check_optional(ctx, &format!("{}.certainty", path), &mut c.certainty);
                if let Some(quay) = c.certainty.as_ref().and_then(|q| q.as_str()) {
                    if !matches!(quay.trim(), "0" | "1" | "2" | "3") {
                        ctx.report(
                            Severity::Error,
                            ProblemCode::IllegalValue,
                            format!("{}.certainty", path),
                            format!("certainty must be 0, 1, 2 or 3, not {:?}", quay),
                        );
                    }
                }
                for (j, data) in c.data.iter_mut().enumerate() {
                    let data_path = format!("{}.data[{}]", path, j);
                    check_optional(ctx, &format!("{}.entry_date", data_path), &mut data.entry_date);
                    check_custom_tags(ctx, &data_path, &*data);
                }
                check_notes(ctx, &format!("{}.notes", path), &mut c.notes);
                check_multimedia_links(ctx, &format!("{}.multimedia", path), &mut c.multimedia);
                check_custom_tags(ctx, &path, &*c);
            }
            Citation::WithoutSource(c) => {
                check_notes(ctx, &format!("{}.notes", path), &mut c.notes);
                check_custom_tags(ctx, &path, &*c);
            }
        }
    }
    check_duplicates(ctx, Severity::Warning, field, citations);
}

pub(super) fn check_multimedia_links(
    ctx: &mut Context<'_>,
    field: &str,
    links: &mut Vec<MultimediaLink>,
) {
    retain_linked(ctx, field, links, |m| {
        m.xref().map(|x| (RecordKind::Multimedia, x))
    });
    for (i, link) in links.iter_mut().enumerate() {
        let path = format!("{}[{}]", field, i);
        match link {
            MultimediaLink::Reference { .. } => check_custom_tags(ctx, &path, &*link),
            MultimediaLink::Inline(media) => {
                if ctx.is_55() && media.file_references.len() > 1 {
                    ctx.report(
                        Severity::Error,
                        ProblemCode::NotAllowedInGedcom55,
                        format!("{}.file_references", path),
                        "GEDCOM 5.5 allows only one file per multimedia link",
                    );
                }
                if media.file_references.is_empty() {
                    ctx.report(
                        Severity::Error,
                        ProblemCode::MissingRequiredValue,
                        format!("{}.file_references", path),
                        "a multimedia link needs a file reference",
                    );
                }
                for (j, file) in media.file_references.iter_mut().enumerate() {
                    let file_path = format!("{}.file_references[{}]", path, j);
                    check_required(
                        ctx,
                        &format!("{}.reference_to_file", file_path),
                        &file.reference_to_file,
                    );
                    check_required(ctx, &format!("{}.format", file_path), &file.format);
                    check_optional(ctx, &format!("{}.media_type", file_path), &mut file.media_type);
                    check_optional(ctx, &format!("{}.title", file_path), &mut file.title);
                    check_custom_tags(ctx, &file_path, &*file);
                }
                check_optional(ctx, &format!("{}.embedded_title", path), &mut media.embedded_title);
                check_notes(ctx, &format!("{}.notes", path), &mut media.notes);
                check_custom_tags(ctx, &path, &*media);
            }
        }
    }
    check_duplicates(ctx, Severity::Warning, field, links);
}

pub(super) fn check_contact(ctx: &mut Context<'_>, field: &str, contact: &mut ContactInfo) {
    only_551(ctx, &format!("{}.www_urls", field), &mut contact.www_urls);
    only_551(ctx, &format!("{}.fax_numbers", field), &mut contact.fax_numbers);
    only_551(ctx, &format!("{}.emails", field), &mut contact.emails);
    if contact.phone_numbers.len() > 3 {
        ctx.report(
            Severity::Warning,
            ProblemCode::TooManyValues,
            format!("{}.phone_numbers", field),
            format!(
                "at most 3 phone numbers are allowed, found {}",
                contact.phone_numbers.len()
            ),
        );
    }
    if let Some(address) = &mut contact.address {
        let path = format!("{}.address", field);
        only_551(ctx, &format!("{}.line3", path), &mut address.line3);
        for (name, value) in [
            ("line1", &mut address.line1),
            ("line2", &mut address.line2),
            ("line3", &mut address.line3),
            ("city", &mut address.city),
            ("state_province", &mut address.state_province),
            ("postal_code", &mut address.postal_code),
            ("country", &mut address.country),
        ] {
            check_optional(ctx, &format!("{}.{}", path, name), value);
        }
        check_custom_tags(ctx, &path, &*address);
    }
}

pub(super) fn check_place(ctx: &mut Context<'_>, field: &str, place: &mut Option<Place>) {
    let Some(p) = place else {
        return;
    };
    only_551(ctx, &format!("{}.romanized", field), &mut p.romanized);
    only_551(ctx, &format!("{}.phonetic", field), &mut p.phonetic);
    only_551(ctx, &format!("{}.latitude", field), &mut p.latitude);
    only_551(ctx, &format!("{}.longitude", field), &mut p.longitude);
    check_optional(ctx, &format!("{}.form", field), &mut p.form);
    check_citations(ctx, &format!("{}.citations", field), &mut p.citations);
    check_notes(ctx, &format!("{}.notes", field), &mut p.notes);
    check_custom_tags(ctx, field, &*p);
}

pub(super) fn check_event_detail(ctx: &mut Context<'_>, field: &str, detail: &mut EventDetail) {
    for (name, value) in [
        ("subtype", &mut detail.subtype),
        ("date", &mut detail.date),
        ("age", &mut detail.age),
        ("cause", &mut detail.cause),
        ("responsible_agency", &mut detail.responsible_agency),
        ("religious_affiliation", &mut detail.religious_affiliation),
        ("restriction_notice", &mut detail.restriction_notice),
    ] {
        check_optional(ctx, &format!("{}.{}", field, name), value);
    }
    only_551(
        ctx,
        &format!("{}.religious_affiliation", field),
        &mut detail.religious_affiliation,
    );
    only_551(
        ctx,
        &format!("{}.restriction_notice", field),
        &mut detail.restriction_notice,
    );
    check_place(ctx, &format!("{}.place", field), &mut detail.place);
    check_contact(ctx, field, &mut detail.contact);
    check_citations(ctx, &format!("{}.citations", field), &mut detail.citations);
    check_notes(ctx, &format!("{}.notes", field), &mut detail.notes);
    check_multimedia_links(ctx, &format!("{}.multimedia", field), &mut detail.multimedia);
    check_custom_tags(ctx, field, &*detail);
}

pub(super) fn check_change_date(ctx: &mut Context<'_>, field: &str, chan: &mut Option<ChangeDate>) {
    let Some(c) = chan else {
        return;
    };
    check_required(ctx, &format!("{}.date", field), &c.date);
    check_optional(ctx, &format!("{}.time", field), &mut c.time);
    check_notes(ctx, &format!("{}.notes", field), &mut c.notes);
    check_custom_tags(ctx, field, &*c);
}

pub(super) fn check_user_references(
    ctx: &mut Context<'_>,
    field: &str,
    refs: &mut Vec<UserReference>,
) {
    let mut i = 0;
    while i < refs.len() {
        let blank = refs[i]
            .reference_num
            .as_ref()
            .map_or(true, TaggedValue::is_blank);
        if blank
            && ctx.repairable(
                Severity::Error,
                ProblemCode::MissingRequiredValue,
                format!("{}[{}].reference_num", field, i),
                "a user reference needs a reference number",
            )
        {
            refs.remove(i);
            continue;
        }
        i += 1;
    }
    for (i, r) in refs.iter_mut().enumerate() {
        check_optional(ctx, &format!("{}[{}].kind", field, i), &mut r.kind);
        check_custom_tags(ctx, &format!("{}[{}]", field, i), &*r);
    }
    check_duplicates(ctx, Severity::Warning, field, refs);
}
