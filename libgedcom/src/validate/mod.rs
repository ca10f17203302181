//! Phase 4: Validation Engine
//!
//! Walks a loaded [`Gedcom`] once, top-level object by top-level object,
//! and records a [`Finding`] for every defect. Repairable defects are fixed
//! in place when the configured [`AutoRepairResponder`] agrees; the finding
//! is then downgraded to INFO and carries a snapshot of the object before
//! and after.
//!
//! Every run starts from an empty findings list. Once a run with auto-repair
//! has fixed everything it can, a second run finds nothing new to repair.

mod ancestry;
mod finding;
mod header;
mod records;
mod shared;

use std::collections::HashSet;

pub use finding::{AutoRepair, Finding, ItemRef, ProblemCode, Severity, Snapshot, ValidationResults};

use crate::dialect::SupportedVersion;
use crate::model::{Gedcom, RecordKind, RecordRef};

/// Decides, per finding, whether an auto-repair may be performed.
pub trait AutoRepairResponder {
    fn may_repair(&self, finding: &Finding) -> bool;
}

impl<F> AutoRepairResponder for F
where
    F: Fn(&Finding) -> bool,
{
    fn may_repair(&self, finding: &Finding) -> bool {
        self(finding)
    }
}

/// Repair every repairable defect.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoRepairAll;

impl AutoRepairResponder for AutoRepairAll {
    fn may_repair(&self, _finding: &Finding) -> bool {
        true
    }
}

/// Report defects without touching the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoRepairNone;

impl AutoRepairResponder for AutoRepairNone {
    fn may_repair(&self, _finding: &Finding) -> bool {
        false
    }
}

pub struct Validator {
    responder: Box<dyn AutoRepairResponder>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// A validator that never repairs.
    pub fn new() -> Self {
        Self {
            responder: Box::new(AutoRepairNone),
        }
    }

    /// A validator that repairs everything it can.
    pub fn repairing() -> Self {
        Self::with_responder(AutoRepairAll)
    }

    pub fn with_responder(responder: impl AutoRepairResponder + 'static) -> Self {
        Self {
            responder: Box::new(responder),
        }
    }

    /// Validate `gedcom`, repairing it in place where the responder allows.
    pub fn validate(&self, gedcom: &mut Gedcom) -> ValidationResults {
        let mut ctx = Context::new(self.responder.as_ref(), gedcom);

        shared::check_stubs(&mut ctx, gedcom);
        ctx.refresh_known(gedcom);
        header::check_header(&mut ctx, gedcom);
        header::check_submission(&mut ctx, gedcom);
        records::check_records(&mut ctx, gedcom);
        header::check_submitters(&mut ctx, gedcom);
        header::check_trailer(&mut ctx, gedcom);
        shared::check_root_custom_tags(&mut ctx, gedcom);
        ancestry::check_cycles(&mut ctx, gedcom);

        let results = ValidationResults::new(ctx.findings);
        tracing::debug!(
            findings = results.len(),
            errors = results.by_severity(Severity::Error).count(),
            repairs = results.by_severity(Severity::Info).count(),
            "validation complete"
        );
        results
    }

    /// Validate a copy of `gedcom` without repairing anything.
    pub fn check(gedcom: &Gedcom) -> ValidationResults {
        let mut copy = gedcom.clone();
        Validator::new().validate(&mut copy)
    }
}

// =============================================================================
// Validation context
// =============================================================================

/// State threaded through every check during one run.
pub(crate) struct Context<'v> {
    responder: &'v dyn AutoRepairResponder,
    pub version: SupportedVersion,
    /// Records present when record checks started.
    known: HashSet<RecordRef>,
    findings: Vec<Finding>,
    /// Indexes of findings repaired since the current item began.
    pending: Vec<usize>,
    item: ItemRef,
}

impl<'v> Context<'v> {
    fn new(responder: &'v dyn AutoRepairResponder, gedcom: &Gedcom) -> Self {
        Self {
            responder,
            version: gedcom.version(),
            known: HashSet::new(),
            findings: Vec::new(),
            pending: Vec::new(),
            item: ItemRef::Document,
        }
    }

    fn refresh_known(&mut self, gedcom: &Gedcom) {
        let mut known = HashSet::new();
        let kinds: [(RecordKind, Vec<&String>); 7] = [
            (RecordKind::Individual, gedcom.individuals.keys().collect()),
            (RecordKind::Family, gedcom.families.keys().collect()),
            (RecordKind::Source, gedcom.sources.keys().collect()),
            (RecordKind::Repository, gedcom.repositories.keys().collect()),
            (RecordKind::Multimedia, gedcom.multimedia.keys().collect()),
            (RecordKind::Note, gedcom.notes.keys().collect()),
            (RecordKind::Submitter, gedcom.submitters.keys().collect()),
        ];
        for (kind, keys) in kinds {
            for key in keys {
                known.insert(RecordRef::new(kind, key));
            }
        }
        if let Some(xref) = gedcom.submission.as_ref().and_then(|s| s.xref.as_deref()) {
            known.insert(RecordRef::new(RecordKind::Submission, xref));
        }
        self.known = known;
    }

    pub fn exists(&self, kind: RecordKind, xref: &str) -> bool {
        self.known.contains(&RecordRef::new(kind, xref))
    }

    pub fn add_known(&mut self, kind: RecordKind, xref: &str) {
        self.known.insert(RecordRef::new(kind, xref));
    }

    pub fn is_55(&self) -> bool {
        self.version == SupportedVersion::V5_5
    }

    /// Start checking a new top-level object.
    pub fn begin(&mut self, item: ItemRef) {
        self.item = item;
        self.pending.clear();
    }

    /// Record a defect that cannot be repaired.
    pub fn report(
        &mut self,
        severity: Severity,
        code: ProblemCode,
        field: impl Into<String>,
        description: impl Into<String>,
    ) {
        let finding = Finding::new(self.item.clone(), severity, code, field, description);
        self.findings.push(finding);
    }

    pub fn report_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Record a repairable defect. Returns `true` when the caller should
    /// perform the repair.
    pub fn repairable(
        &mut self,
        severity: Severity,
        code: ProblemCode,
        field: impl Into<String>,
        description: impl Into<String>,
    ) -> bool {
        let mut finding = Finding::new(self.item.clone(), severity, code, field, description);
        let repair = self.responder.may_repair(&finding);
        if repair {
            finding.mark_repaired();
            self.pending.push(self.findings.len());
        }
        self.findings.push(finding);
        repair
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Attach before/after snapshots to the repairs made on the current item.
    pub fn finish(&mut self, before: Snapshot, after: impl FnOnce() -> Snapshot) {
        if self.pending.is_empty() {
            return;
        }
        let after = after();
        for index in self.pending.drain(..) {
            self.findings[index].push_repair(AutoRepair {
                before: before.clone(),
                after: after.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load;

    pub(crate) const VALID: &str = "0 HEAD\n\
        1 SOUR TEST\n\
        1 SUBM @U1@\n\
        1 GEDC\n\
        2 VERS 5.5.1\n\
        2 FORM LINEAGE-LINKED\n\
        1 CHAR UTF-8\n\
        0 @U1@ SUBM\n\
        1 NAME Tester\n\
        0 @I1@ INDI\n\
        1 NAME Ann /Lee/\n\
        1 FAMS @F1@\n\
        0 @I2@ INDI\n\
        1 NAME Bo /Lee/\n\
        1 FAMC @F1@\n\
        0 @F1@ FAM\n\
        1 WIFE @I1@\n\
        1 CHIL @I2@\n\
        0 TRLR\n";

    #[test]
    fn test_valid_document_has_no_findings() {
        let mut g = load(VALID).unwrap().gedcom;
        let results = Validator::new().validate(&mut g);
        assert!(results.is_empty(), "{:#?}", results);
    }

    #[test]
    fn test_check_does_not_modify() {
        let src = VALID.replace("0 TRLR\n", "");
        let g = load(&src).unwrap().gedcom;
        let results = Validator::check(&g);
        assert_eq!(results.by_code(ProblemCode::MissingRequiredValue).count(), 1);
        assert!(g.trailer.is_none());
    }

    #[test]
    fn test_repair_then_idempotent() {
        let src = "0 @I1@ INDI\n1 NAME X\n1 FAMC @F9@\n0 @F1@ FAM\n1 CHIL @I1@\n1 CHIL @I1@\n";
        let mut g = load(src).unwrap().gedcom;
        let first = Validator::repairing().validate(&mut g);
        assert!(first.by_severity(Severity::Info).count() > 0);
        assert!(!first.has_errors(), "{:#?}", first);
        assert!(g.header.is_some());
        assert!(g.trailer.is_some());
        assert_eq!(g.families["@F1@"].children, vec!["@I1@"]);
        assert!(g.individuals["@I1@"].families_where_child.is_empty());
        assert!(!g.families.contains_key("@F9@"));

        let second = Validator::repairing().validate(&mut g);
        assert_eq!(second.by_severity(Severity::Info).count(), 0, "{:#?}", second);
        assert!(second.is_empty(), "{:#?}", second);
    }

    #[test]
    fn test_repairs_are_idempotent_with_nested_blanks() {
        // entries that only become duplicates once their blanks are cleared
        let src = "0 @S1@ SOUR\n1 TITL Parish register\n\
                   0 @I1@ INDI\n1 NAME Ann /Lee/\n2 GIVN\n1 NAME Ann /Lee/\n\
                   1 SOUR @S1@\n2 PAGE\n1 SOUR @S1@\n";
        let mut g = load(src).unwrap().gedcom;
        let first = Validator::repairing().validate(&mut g);
        assert!(!first.has_errors(), "{:#?}", first);
        let ind = &g.individuals["@I1@"];
        assert_eq!(ind.names.len(), 1);
        assert!(ind.names[0].given_name.is_none());
        assert_eq!(ind.citations.len(), 1);

        let second = Validator::repairing().validate(&mut g);
        assert!(second.is_empty(), "{:#?}", second);
    }

    #[test]
    fn test_repair_snapshots() {
        let src = VALID.replace("1 CHIL @I2@\n", "1 CHIL @I2@\n1 CHIL @I2@\n");
        let mut g = load(&src).unwrap().gedcom;
        let results = Validator::repairing().validate(&mut g);
        let finding = results.by_code(ProblemCode::DuplicateValue).next().unwrap();
        assert_eq!(finding.severity(), Severity::Info);
        assert_eq!(finding.item(), &ItemRef::record(RecordKind::Family, "@F1@"));
        match (&finding.repairs()[0].before, &finding.repairs()[0].after) {
            (Snapshot::Family(before), Snapshot::Family(after)) => {
                assert_eq!(before.children.len(), 2);
                assert_eq!(after.children.len(), 1);
            }
            other => panic!("unexpected snapshots {:?}", other),
        }
    }

    #[test]
    fn test_selective_responder() {
        let src = VALID.replace("0 TRLR\n", "");
        let mut g = load(&src).unwrap().gedcom;
        let validator =
            Validator::with_responder(|f: &Finding| f.code() != ProblemCode::MissingRequiredValue);
        let results = validator.validate(&mut g);
        assert!(results.has_errors());
        assert!(g.trailer.is_none());
    }
}
