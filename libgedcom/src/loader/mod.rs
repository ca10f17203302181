//! Phase 3: Semantic Loader
//!
//! Walks the generic tree and builds the typed [`Gedcom`] graph. Dispatch is
//! by tag, one routine per record kind, with shared routines for the
//! substructures every record uses.
//!
//! Records are created the first time anything mentions their xref, as
//! stubs, and filled in when their own `0 @X@ TAG` line is reached. Stubs
//! that are never defined are reported when the load finishes.
//!
//! The loader never gives up on bad data. Unrecognized tags, broken
//! pointers and repeated singular tags become error diagnostics; data that
//! does not match the declared version becomes a warning.

mod common;
mod family;
mod header;
mod individual;
mod media;
mod source;

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::diagnostics::Diagnostics;
use crate::dialect::DialectPolicy;
use crate::error::{Phase, Result};
use crate::model::{
    CustomTag, Family, Gedcom, Individual, Multimedia, Note, RecordKind, RecordRef, Repository,
    Source, Submission, Submitter, TaggedValue, Trailer,
};
use crate::options::LoadOptions;
use crate::progress::Progress;
use crate::text;
use crate::tokenizer::is_xref;
use crate::tree::{Node, StringTree};

pub(crate) struct Loader<'t> {
    tree: &'t StringTree,
    options: &'t LoadOptions,
    dialect: DialectPolicy,
    diagnostics: Diagnostics,
    gedcom: Gedcom,
    /// First line that mentioned each record.
    referenced: IndexMap<RecordRef, usize>,
    /// Line of each record's own definition.
    defined: HashMap<RecordRef, usize>,
}

impl<'t> Loader<'t> {
    pub fn new(tree: &'t StringTree, options: &'t LoadOptions, diagnostics: Diagnostics) -> Self {
        let dialect = DialectPolicy::from_tree(tree);
        tracing::debug!(version = %dialect.version(), "dialect selected");
        Self {
            tree,
            options,
            dialect,
            diagnostics,
            gedcom: Gedcom::new(),
            referenced: IndexMap::new(),
            defined: HashMap::new(),
        }
    }

    /// Load every root-level record, then report stubs.
    pub fn load(mut self, progress: &mut Progress<'_>) -> Result<(Gedcom, Diagnostics)> {
        let tree = self.tree;
        let mut count = 0;
        for node in tree.children(tree.root()) {
            count += 1;
            progress.tick(Phase::Loading, count)?;
            self.load_root_record(node);
        }
        progress.finish(Phase::Loading, count)?;

        self.report_stubs();
        tracing::debug!(
            records = count,
            individuals = self.gedcom.individuals.len(),
            families = self.gedcom.families.len(),
            warnings = self.diagnostics.warnings.len(),
            errors = self.diagnostics.errors.len(),
            "load complete"
        );
        Ok((self.gedcom, self.diagnostics))
    }

    fn load_root_record(&mut self, node: &'t Node) {
        match node.tag.as_str() {
            "HEAD" => self.load_header(node),
            "SUBM" => self.load_submitter_record(node),
            "SUBN" => self.load_submission_record(node),
            "INDI" => self.load_individual_record(node),
            "FAM" => self.load_family_record(node),
            "SOUR" => self.load_source_record(node),
            "REPO" => self.load_repository_record(node),
            "OBJE" => self.load_multimedia_record(node),
            "NOTE" => self.load_note_record(node),
            "TRLR" => {
                let tree = self.tree;
                let mut trailer = Trailer::default();
                for child in tree.children(node) {
                    self.unknown_tag(child, &mut trailer.custom_tags);
                }
                self.gedcom.trailer = Some(trailer);
            }
            _ => {
                let mut tags = std::mem::take(&mut self.gedcom.custom_tags);
                self.unknown_tag(node, &mut tags);
                self.gedcom.custom_tags = tags;
            }
        }
    }

    // =========================================================================
    // Record bookkeeping
    // =========================================================================

    /// Register the definition of a root-level record and return its xref.
    fn define(&mut self, kind: RecordKind, node: &Node) -> Option<String> {
        let Some(xref) = node.xref.clone() else {
            self.diagnostics.error(
                Some(node.line),
                format!("{} record has no cross-reference id and was skipped", node.tag),
            );
            return None;
        };
        let key = RecordRef::new(kind, &xref);
        if let Some(first) = self.defined.get(&key) {
            self.diagnostics.error(
                Some(node.line),
                format!(
                    "{} {} was already defined on line {}; the two definitions were merged",
                    kind.tag(),
                    xref,
                    first
                ),
            );
        } else {
            self.defined.insert(key, node.line);
        }
        Some(xref)
    }

    /// Get-or-create the record `xref` of `kind` and note the reference.
    fn ensure(&mut self, kind: RecordKind, xref: &str, line: usize) {
        self.referenced
            .entry(RecordRef::new(kind, xref))
            .or_insert(line);
        let g = &mut self.gedcom;
        match kind {
            RecordKind::Individual => {
                g.individuals
                    .entry(xref.to_string())
                    .or_insert_with(|| Individual::new(xref));
            }
            RecordKind::Family => {
                g.families
                    .entry(xref.to_string())
                    .or_insert_with(|| Family::new(xref));
            }
            RecordKind::Source => {
                g.sources
                    .entry(xref.to_string())
                    .or_insert_with(|| Source::new(xref));
            }
            RecordKind::Repository => {
                g.repositories
                    .entry(xref.to_string())
                    .or_insert_with(|| Repository::new(xref));
            }
            RecordKind::Multimedia => {
                g.multimedia
                    .entry(xref.to_string())
                    .or_insert_with(|| Multimedia::new(xref));
            }
            RecordKind::Note => {
                g.notes
                    .entry(xref.to_string())
                    .or_insert_with(|| Note::new(xref));
            }
            RecordKind::Submitter => {
                g.submitters
                    .entry(xref.to_string())
                    .or_insert_with(|| Submitter::new(xref));
            }
            RecordKind::Submission => {
                if g.submission.is_none() {
                    g.submission = Some(Submission::new(xref));
                }
            }
        }
    }

    /// Read a pointer value and get-or-create its target.
    fn pointer(&mut self, node: &Node, kind: RecordKind) -> Option<String> {
        match node.value.as_deref() {
            Some(value) if is_xref(value) => {
                self.ensure(kind, value, node.line);
                Some(value.to_string())
            }
            other => {
                self.diagnostics.error(
                    Some(node.line),
                    format!(
                        "{} tag should point to a {} record but has value {:?}",
                        node.tag,
                        kind.tag(),
                        other.unwrap_or("")
                    ),
                );
                None
            }
        }
    }

    fn report_stubs(&mut self) {
        for (key, line) in &self.referenced {
            if self.defined.contains_key(key) {
                continue;
            }
            self.diagnostics.error(
                Some(*line),
                format!(
                    "{} is referenced but no {} record with that id was found",
                    key.xref,
                    key.kind.tag()
                ),
            );
            self.gedcom.stubs.insert(key.clone());
        }
    }

    // =========================================================================
    // Shared field helpers
    // =========================================================================

    /// A value with its CONC/CONT continuations; other children become
    /// custom tags (or unknown-tag errors).
    fn tagged(&mut self, node: &Node) -> TaggedValue {
        self.tagged_with(node, |_, _| false)
    }

    /// Like [`Self::tagged`], offering each child to `handle` first.
    fn tagged_with<F>(&mut self, node: &Node, mut handle: F) -> TaggedValue
    where
        F: FnMut(&mut Self, &'t Node) -> bool,
    {
        let tree = self.tree;
        let mut tv = TaggedValue {
            value: node.value.clone(),
            custom_tags: Vec::new(),
        };
        for child in tree.children(tree.node(node.id)) {
            if text::continue_value(&mut tv.value, child) || handle(self, child) {
                continue;
            }
            self.unknown_tag(child, &mut tv.custom_tags);
        }
        tv
    }

    /// The node's value plus CONC/CONT children as separate lines.
    fn lines(&mut self, node: &Node, custom_tags: &mut Vec<CustomTag>) -> Vec<String> {
        let tree = self.tree;
        let mut lines = text::first_line(node);
        for child in tree.children(tree.node(node.id)) {
            if !text::continue_lines(&mut lines, child) {
                self.unknown_tag(child, custom_tags);
            }
        }
        lines
    }

    /// Store a singular field, reporting a repeat instead of overwriting.
    fn once<T>(&mut self, slot: &mut Option<T>, node: &Node, value: T) {
        if slot.is_some() {
            let parent = self.tree.parent(node).map_or("", |p| p.tag.as_str());
            self.diagnostics.error(
                Some(node.line),
                format!(
                    "Only one {} tag is allowed under {}; this one was ignored",
                    node.tag, parent
                ),
            );
        } else {
            *slot = Some(value);
        }
    }

    /// Preserve a custom tag, or report a tag this context does not accept.
    fn unknown_tag(&mut self, node: &Node, custom_tags: &mut Vec<CustomTag>) {
        if node.tag.starts_with('_') || !self.options.strict_custom_tags {
            custom_tags.push(self.custom_tag(node));
            return;
        }
        let mut message = format!("Cannot handle tag {}", node.tag);
        let mut at_root = true;
        for ancestor in self.tree.ancestors(node) {
            at_root = false;
            message.push_str(", child of ");
            message.push_str(&ancestor.tag);
            if let Some(xref) = &ancestor.xref {
                message.push(' ');
                message.push_str(xref);
            }
            message.push_str(&format!(" on line {}", ancestor.line));
        }
        if at_root {
            message.push_str(" at root level");
        }
        self.diagnostics.error(Some(node.line), message);
    }

    fn custom_tag(&self, node: &Node) -> CustomTag {
        CustomTag {
            tag: node.tag.clone(),
            xref: node.xref.clone(),
            value: node.value.clone(),
            children: self
                .tree
                .children(node)
                .map(|child| self.custom_tag(child))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::model::RecordKind;
    use crate::{load, load_with_options, LoadOptions};

    #[test]
    fn test_forward_reference_is_one_record() {
        let src = "0 HEAD\n0 @F1@ FAM\n1 HUSB @I1@\n0 @I1@ INDI\n1 NAME John /Doe/\n1 FAMS @F1@\n0 TRLR\n";
        let loaded = load(src).unwrap();
        let g = &loaded.gedcom;
        assert_eq!(g.individuals.len(), 1);
        let john = &g.individuals["@I1@"];
        assert_eq!(john.formatted_name(), Some("John /Doe/"));
        assert_eq!(john.families_where_spouse[0].family, "@F1@");
        assert_eq!(g.families["@F1@"].husband.as_deref(), Some("@I1@"));
        assert!(g.stubs.is_empty());
        assert!(loaded.diagnostics.errors.is_empty());
    }

    #[test]
    fn test_undefined_reference_is_stub() {
        let src = "0 @F1@ FAM\n1 WIFE @I9@\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.gedcom.is_stub(RecordKind::Individual, "@I9@"));
        assert_eq!(
            loaded.diagnostics.error_messages(),
            vec!["Line 2: @I9@ is referenced but no INDI record with that id was found"]
        );
    }

    #[test]
    fn test_unknown_tag_reports_ancestors() {
        let src = "0 @I1@ INDI\n1 NAME Bob\n2 BOGUS x\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert_eq!(
            loaded.diagnostics.error_messages(),
            vec!["Line 3: Cannot handle tag BOGUS, child of NAME on line 2, child of INDI @I1@ on line 1"]
        );
        assert_eq!(
            loaded.gedcom.individuals["@I1@"].formatted_name(),
            Some("Bob")
        );
    }

    #[test]
    fn test_custom_tag_is_preserved() {
        let src = "0 @I1@ INDI\n1 _FAVCOLOR blue\n2 _SHADE dark\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert!(loaded.diagnostics.errors.is_empty());
        let tags = &loaded.gedcom.individuals["@I1@"].custom_tags;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag, "_FAVCOLOR");
        assert_eq!(tags[0].value.as_deref(), Some("blue"));
        assert_eq!(tags[0].children[0].tag, "_SHADE");
    }

    #[test]
    fn test_lenient_custom_tags_keep_standard_tags() {
        let src = "0 @I1@ INDI\n1 BOGUS x\n0 TRLR\n";
        let opts = LoadOptions::default().with_strict_custom_tags(false);
        let loaded = load_with_options(src, &opts).unwrap();
        assert!(loaded.diagnostics.errors.is_empty());
        assert_eq!(loaded.gedcom.individuals["@I1@"].custom_tags[0].tag, "BOGUS");
    }

    #[test]
    fn test_root_custom_record_and_unknown_root_tag() {
        let src = "0 _PLAC Somewhere\n0 WHAT x\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert_eq!(loaded.gedcom.custom_tags.len(), 1);
        assert_eq!(
            loaded.diagnostics.error_messages(),
            vec!["Line 2: Cannot handle tag WHAT at root level"]
        );
        assert!(loaded.gedcom.trailer.is_some());
    }

    #[test]
    fn test_record_without_xref_and_duplicates() {
        let src = "0 INDI\n0 @I1@ INDI\n1 SEX M\n0 @I1@ INDI\n1 NAME Al\n0 TRLR\n";
        let loaded = load(src).unwrap();
        let errors = loaded.diagnostics.error_messages();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].starts_with("Line 1: INDI record has no cross-reference id"));
        assert!(errors[1].starts_with("Line 4: INDI @I1@ was already defined on line 2"));
        let al = &loaded.gedcom.individuals["@I1@"];
        assert_eq!(al.sex.as_ref().and_then(|s| s.as_str()), Some("M"));
        assert_eq!(al.formatted_name(), Some("Al"));
    }

    #[test]
    fn test_repeated_singular_tag() {
        let src = "0 @I1@ INDI\n1 SEX M\n1 SEX F\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert_eq!(
            loaded.diagnostics.error_messages(),
            vec!["Line 3: Only one SEX tag is allowed under INDI; this one was ignored"]
        );
        let sex = loaded.gedcom.individuals["@I1@"].sex.clone().unwrap();
        assert_eq!(sex.as_str(), Some("M"));
    }

    #[test]
    fn test_bad_pointer() {
        let src = "0 @F1@ FAM\n1 HUSB Fred\n0 TRLR\n";
        let loaded = load(src).unwrap();
        assert_eq!(
            loaded.diagnostics.error_messages(),
            vec!["Line 2: HUSB tag should point to a INDI record but has value \"Fred\""]
        );
        assert!(loaded.gedcom.families["@F1@"].husband.is_none());
    }
}
