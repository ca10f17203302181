//! Phase 2: Tree Builder
//!
//! Rebuilds the hierarchy implied by line levels. Nodes live in an arena
//! owned by [`StringTree`]; parents and children refer to each other by
//! [`NodeId`]. The builder keeps a stack holding the most recent node at each
//! level, so finding a parent is a single index.

use crate::diagnostics::Diagnostics;
use crate::error::{LoadContext, Phase, Result};
use crate::input::InputLine;
use crate::options::LoadOptions;
use crate::progress::Progress;
use crate::tokenizer::{begins_with_level, tokenize, LinePieces};

/// Index of a node in its [`StringTree`].
pub type NodeId = usize;

/// One line of the document, placed in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Nesting depth; -1 for the synthetic root.
    pub level: i32,
    pub xref: Option<String>,
    pub tag: String,
    pub value: Option<String>,
    /// 1-based source line; 0 for the root.
    pub line: usize,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Generic leveled tree produced from a document.
#[derive(Debug, Clone)]
pub struct StringTree {
    nodes: Vec<Node>,
}

impl Default for StringTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTree {
    pub const ROOT: NodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                id: Self::ROOT,
                level: -1,
                xref: None,
                tag: String::new(),
                value: None,
                line: 0,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> &Node {
        &self.nodes[Self::ROOT]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Children of `node` in document order.
    pub fn children<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        node.children.iter().map(move |&id| &self.nodes[id])
    }

    /// First child of `node` with the given tag.
    pub fn child<'a>(&'a self, node: &'a Node, tag: &str) -> Option<&'a Node> {
        self.children(node).find(|c| c.tag == tag)
    }

    pub fn parent(&self, node: &Node) -> Option<&Node> {
        node.parent.map(|id| &self.nodes[id])
    }

    /// Ancestors of `node` from its parent up to, not including, the root.
    pub fn ancestors<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        std::iter::successors(self.parent(node), move |n| self.parent(n))
            .take_while(|n| n.id != Self::ROOT)
    }

    /// Append a node under `parent` and return its id.
    pub fn add(&mut self, parent: NodeId, pieces: LinePieces, line: usize) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            level: pieces.level as i32,
            xref: pieces.xref,
            tag: pieces.tag,
            value: pieces.value,
            line,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }
}

/// Build the generic tree from decoded lines.
///
/// A line whose level is deeper than its predecessor allows has no parent;
/// it is reported and dropped, and so are its descendants. Lines that do not
/// start with a level either abort the load or, with lenient line breaks,
/// become a CONT of the previous line.
pub(crate) fn build_tree(
    lines: &[InputLine<'_>],
    options: &LoadOptions,
    ctx: &LoadContext,
    diagnostics: &mut Diagnostics,
    progress: &mut Progress<'_>,
) -> Result<StringTree> {
    let mut tree = StringTree::new();
    // stack[n] is the most recent node at level n - 1
    let mut stack: Vec<NodeId> = vec![StringTree::ROOT];
    let mut last: Option<NodeId> = None;

    for (i, input) in lines.iter().enumerate() {
        progress.tick(Phase::Reading, i + 1)?;

        let text = input.text.trim_start();
        if text.is_empty() {
            continue;
        }

        if !options.strict_line_breaks && !begins_with_level(text) {
            match last {
                Some(prev) => {
                    let prev_node = tree.node(prev);
                    let parent = if prev_node.tag == "CONT" || prev_node.tag == "CONC" {
                        prev_node.parent.unwrap_or(StringTree::ROOT)
                    } else {
                        prev
                    };
                    let level = (tree.node(parent).level + 1).max(0) as usize;
                    let pieces = LinePieces {
                        level,
                        xref: None,
                        tag: "CONT".to_string(),
                        value: Some(text.to_string()),
                    };
                    last = Some(tree.add(parent, pieces, input.number));
                    diagnostics.warn(
                        Some(input.number),
                        "Line did not begin with a level and tag, so it was treated as a \
                         non-standard continuation of the previous line",
                    );
                }
                None => diagnostics.warn(
                    Some(input.number),
                    "Line did not begin with a level and tag, and there was no previous \
                     line to continue, so it was discarded",
                ),
            }
            continue;
        }

        let pieces = tokenize(text, input.number, ctx)?;
        let level = pieces.level;
        if level >= stack.len() {
            diagnostics.error(
                Some(input.number),
                format!(
                    "{} tag: Unable to find suitable parent node at level {}",
                    pieces.tag,
                    level as i32 - 1
                ),
            );
            continue;
        }

        let parent = stack[level];
        let id = tree.add(parent, pieces, input.number);
        stack.truncate(level + 1);
        stack.push(id);
        last = Some(id);
    }

    progress.finish(Phase::Reading, lines.len())?;
    tracing::debug!(nodes = tree.len() - 1, "tree built");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GedcomError;
    use crate::input::split_lines;
    use crate::progress::ProgressObserver;

    fn build(source: &str, options: &LoadOptions) -> (Result<StringTree>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut observers: Vec<Box<dyn ProgressObserver>> = Vec::new();
        let mut progress = Progress::new(&mut observers, 0);
        let lines = split_lines(source);
        let tree = build_tree(
            &lines,
            options,
            &LoadContext::default(),
            &mut diagnostics,
            &mut progress,
        );
        (tree, diagnostics)
    }

    fn tags<'a>(tree: &'a StringTree, node: &'a Node) -> Vec<&'a str> {
        tree.children(node).map(|n| n.tag.as_str()).collect()
    }

    #[test]
    fn test_nesting_follows_levels() {
        let src = "0 HEAD\n1 SOUR x\n2 VERS 1\n1 CHAR UTF-8\n0 @I1@ INDI\n1 NAME A\n0 TRLR\n";
        let (tree, diags) = build(src, &LoadOptions::default());
        let tree = tree.unwrap();
        assert!(diags.is_clean());
        let root = tree.root();
        assert_eq!(tags(&tree, root), vec!["HEAD", "INDI", "TRLR"]);
        let head = tree.child(root, "HEAD").unwrap();
        assert_eq!(tags(&tree, head), vec!["SOUR", "CHAR"]);
        let sour = tree.child(head, "SOUR").unwrap();
        assert_eq!(tags(&tree, sour), vec!["VERS"]);
        let indi = tree.child(root, "INDI").unwrap();
        assert_eq!(indi.xref.as_deref(), Some("@I1@"));
        assert_eq!(indi.line, 5);
    }

    #[test]
    fn test_every_child_is_one_level_below_parent() {
        let src = "0 A\n1 B\n2 C\n3 D\n2 E\n1 F\n0 G\n";
        let tree = build(src, &LoadOptions::default()).0.unwrap();
        for id in 1..tree.len() {
            let node = tree.node(id);
            let parent = tree.parent(node).unwrap();
            assert_eq!(node.level, parent.level + 1);
        }
    }

    #[test]
    fn test_level_skip_is_rejected_with_descendants() {
        let src = "0 @I1@ INDI\n2 GIVN Bob\n3 _X y\n1 SEX M\n";
        let (tree, diags) = build(src, &LoadOptions::default());
        let tree = tree.unwrap();
        let indi = tree.child(tree.root(), "INDI").unwrap();
        assert_eq!(tags(&tree, indi), vec!["SEX"]);
        assert_eq!(diags.errors.len(), 2);
        assert_eq!(
            diags.errors[0].to_string(),
            "Line 2: GIVN tag: Unable to find suitable parent node at level 1"
        );
        assert_eq!(diags.errors[1].line, Some(3));
    }

    #[test]
    fn test_ancestors_stop_below_root() {
        let tree = build("0 A\n1 B\n2 C\n", &LoadOptions::default()).0.unwrap();
        let c = tree.node(3);
        let chain: Vec<&str> = tree.ancestors(c).map(|n| n.tag.as_str()).collect();
        assert_eq!(chain, vec!["B", "A"]);
    }

    #[test]
    fn test_strict_line_breaks_abort() {
        let (tree, _) = build("0 NOTE a\nwrapped text\n", &LoadOptions::default());
        assert!(matches!(tree, Err(GedcomError::MalformedLevel { .. })));
    }

    #[test]
    fn test_lenient_line_breaks_become_cont() {
        let opts = LoadOptions::default().with_strict_line_breaks(false);
        let (tree, diags) = build("0 @N1@ NOTE a\nwrapped\nmore\n0 TRLR\n", &opts);
        let tree = tree.unwrap();
        let note = tree.child(tree.root(), "NOTE").unwrap();
        let conts: Vec<&str> = tree
            .children(note)
            .map(|n| n.value.as_deref().unwrap_or(""))
            .collect();
        assert_eq!(conts, vec!["wrapped", "more"]);
        assert_eq!(tree.child(note, "CONT").unwrap().level, 1);
        assert_eq!(diags.warnings.len(), 2);
    }

    #[test]
    fn test_lenient_line_break_without_previous_line() {
        let opts = LoadOptions::default().with_strict_line_breaks(false);
        let (tree, diags) = build("stray\n0 TRLR\n", &opts);
        assert_eq!(tree.unwrap().len(), 2);
        assert_eq!(diags.warnings.len(), 1);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let tree = build("0 HEAD\n\n   \n0 TRLR\n", &LoadOptions::default())
            .0
            .unwrap();
        assert_eq!(tags(&tree, tree.root()), vec!["HEAD", "TRLR"]);
        assert_eq!(tree.child(tree.root(), "TRLR").unwrap().line, 4);
    }
}
