//! Findings, auto-repair snapshots and the queryable results collection.

use std::fmt;

use crate::model::{
    Family, Header, Individual, Multimedia, Note, RecordKind, RecordRef, Repository, Source,
    Submission, Submitter, Trailer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// An auto-repair was performed.
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProblemCode {
    CrossReferenceNotFound,
    DuplicateValue,
    IllegalValue,
    MissingRequiredValue,
    NotAllowedInGedcom55,
    NotAllowedInGedcom551,
    TooManyValues,
    XrefInvalid,
    UnableToDetermineGedcomVersion,
    CircularAncestry,
}

impl ProblemCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemCode::CrossReferenceNotFound => "CROSS_REFERENCE_NOT_FOUND",
            ProblemCode::DuplicateValue => "DUPLICATE_VALUE",
            ProblemCode::IllegalValue => "ILLEGAL_VALUE",
            ProblemCode::MissingRequiredValue => "MISSING_REQUIRED_VALUE",
            ProblemCode::NotAllowedInGedcom55 => "NOT_ALLOWED_IN_GEDCOM_55",
            ProblemCode::NotAllowedInGedcom551 => "NOT_ALLOWED_IN_GEDCOM_551",
            ProblemCode::TooManyValues => "TOO_MANY_VALUES",
            ProblemCode::XrefInvalid => "XREF_INVALID",
            ProblemCode::UnableToDetermineGedcomVersion => "UNABLE_TO_DETERMINE_GEDCOM_VERSION",
            ProblemCode::CircularAncestry => "CIRCULAR_ANCESTRY",
        }
    }
}

impl fmt::Display for ProblemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The top-level object a finding concerns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemRef {
    Document,
    Header,
    Trailer,
    Record(RecordRef),
}

impl ItemRef {
    pub fn record(kind: RecordKind, xref: &str) -> Self {
        ItemRef::Record(RecordRef::new(kind, xref))
    }
}

impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemRef::Document => f.write_str("document"),
            ItemRef::Header => f.write_str("HEAD"),
            ItemRef::Trailer => f.write_str("TRLR"),
            ItemRef::Record(r) => write!(f, "{}", r),
        }
    }
}

/// A copy of a whole top-level object, taken for auto-repair history.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Header(Option<Header>),
    Trailer(Option<Trailer>),
    Individual(Individual),
    Family(Family),
    Source(Source),
    Repository(Repository),
    Multimedia(Multimedia),
    Note(Note),
    Submitter(Submitter),
    Submission(Option<Submission>),
    /// A record removed from the document.
    Removed(RecordRef),
}

/// The object before and after an auto-repair.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoRepair {
    pub before: Snapshot,
    pub after: Snapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    item: ItemRef,
    severity: Severity,
    code: ProblemCode,
    field: String,
    description: String,
    related: Vec<RecordRef>,
    repairs: Vec<AutoRepair>,
}

impl Finding {
    pub(crate) fn new(
        item: ItemRef,
        severity: Severity,
        code: ProblemCode,
        field: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            item,
            severity,
            code,
            field: field.into(),
            description: description.into(),
            related: Vec::new(),
            repairs: Vec::new(),
        }
    }

    pub(crate) fn with_related(mut self, related: Vec<RecordRef>) -> Self {
        self.related = related;
        self
    }

    pub(crate) fn mark_repaired(&mut self) {
        self.severity = Severity::Info;
    }

    pub(crate) fn push_repair(&mut self, repair: AutoRepair) {
        self.repairs.push(repair);
    }

    pub fn item(&self) -> &ItemRef {
        &self.item
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> ProblemCode {
        self.code
    }

    /// Path of the offending field within the item, e.g. `names[0].surname`.
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Other records involved, such as the members of an ancestry cycle.
    pub fn related(&self) -> &[RecordRef] {
        &self.related
    }

    pub fn repairs(&self) -> &[AutoRepair] {
        &self.repairs
    }

    pub fn is_repaired(&self) -> bool {
        !self.repairs.is_empty()
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.severity, self.code, self.item)?;
        if !self.field.is_empty() {
            write!(f, " {}", self.field)?;
        }
        write!(f, ": {}", self.description)
    }
}

/// Every finding from one validation run, in the order found.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationResults {
    findings: Vec<Finding>,
}

impl ValidationResults {
    pub(crate) fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    pub fn all(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn by_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    pub fn by_code(&self, code: ProblemCode) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.code == code)
    }

    pub fn for_item<'a>(&'a self, item: &'a ItemRef) -> impl Iterator<Item = &'a Finding> {
        self.findings.iter().filter(move |f| &f.item == item)
    }

    pub fn for_record<'a>(
        &'a self,
        kind: RecordKind,
        xref: &'a str,
    ) -> impl Iterator<Item = &'a Finding> {
        self.findings.iter().filter(move |f| match &f.item {
            ItemRef::Record(r) => r.kind == kind && r.xref == xref,
            _ => false,
        })
    }

    pub fn has_errors(&self) -> bool {
        self.by_severity(Severity::Error).next().is_some()
    }

    pub fn into_vec(self) -> Vec<Finding> {
        self.findings
    }
}

impl<'a> IntoIterator for &'a ValidationResults {
    type Item = &'a Finding;
    type IntoIter = std::slice::Iter<'a, Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValidationResults {
        ValidationResults::new(vec![
            Finding::new(
                ItemRef::Header,
                Severity::Error,
                ProblemCode::MissingRequiredValue,
                "submitter",
                "missing",
            ),
            Finding::new(
                ItemRef::record(RecordKind::Individual, "@I1@"),
                Severity::Warning,
                ProblemCode::IllegalValue,
                "sex",
                "blank",
            ),
        ])
    }

    #[test]
    fn test_queries() {
        let results = sample();
        assert!(results.has_errors());
        assert_eq!(results.by_severity(Severity::Warning).count(), 1);
        assert_eq!(results.by_code(ProblemCode::MissingRequiredValue).count(), 1);
        assert_eq!(results.for_record(RecordKind::Individual, "@I1@").count(), 1);
        assert_eq!(results.for_item(&ItemRef::Header).count(), 1);
    }

    #[test]
    fn test_display() {
        let results = sample();
        assert_eq!(
            results.all()[1].to_string(),
            "WARNING ILLEGAL_VALUE INDI @I1@ sex: blank"
        );
    }
}
