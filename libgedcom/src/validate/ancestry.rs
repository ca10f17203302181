//! Circular ancestry: an individual who is, through any chain of families,
//! their own ancestor.

use std::collections::{BTreeSet, HashSet};

use indexmap::{IndexMap, IndexSet};

use super::{Context, Finding, ItemRef, ProblemCode, Severity};
use crate::model::{Gedcom, RecordKind, RecordRef};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Child to parents, from both CHIL on families and FAMC on individuals.
fn parent_map(gedcom: &Gedcom) -> IndexMap<&str, IndexSet<&str>> {
    let mut parents: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    let mut children_of: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for (xref, fam) in &gedcom.families {
        let entry = children_of.entry(xref.as_str()).or_default();
        entry.extend(fam.children.iter().map(String::as_str));
    }
    for (xref, ind) in &gedcom.individuals {
        for family in ind.parent_families() {
            if let Some((key, _)) = gedcom.families.get_key_value(family) {
                children_of
                    .entry(key.as_str())
                    .or_default()
                    .insert(xref.as_str());
            }
        }
    }
    for (family, children) in &children_of {
        let Some(fam) = gedcom.families.get(*family) else {
            continue;
        };
        for child in children {
            parents.entry(*child).or_default().extend(fam.spouses());
        }
    }
    parents
}

pub(super) fn check_cycles(ctx: &mut Context<'_>, gedcom: &Gedcom) {
    let parents = parent_map(gedcom);
    let mut marks: IndexMap<&str, Mark> = IndexMap::new();
    let mut seen: HashSet<BTreeSet<&str>> = HashSet::new();
    let mut cycles: Vec<Vec<&str>> = Vec::new();

    for start in gedcom.individuals.keys() {
        let start = start.as_str();
        if marks.get(start).copied().unwrap_or(Mark::Unvisited) != Mark::Unvisited {
            continue;
        }
        // (node, index of next parent to visit)
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
        marks.insert(start, Mark::OnPath);

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let next_parent = parents.get(node).and_then(|p| p.get_index(top.1)).copied();
            top.1 += 1;
            match next_parent {
                None => {
                    marks.insert(node, Mark::Done);
                    stack.pop();
                }
                Some(parent) => match marks.get(parent).copied().unwrap_or(Mark::Unvisited) {
                    Mark::Unvisited => {
                        marks.insert(parent, Mark::OnPath);
                        stack.push((parent, 0));
                    }
                    Mark::OnPath => {
                        let from = stack
                            .iter()
                            .position(|(n, _)| *n == parent)
                            .unwrap_or_default();
                        let cycle: Vec<&str> = stack[from..].iter().map(|(n, _)| *n).collect();
                        if seen.insert(cycle.iter().copied().collect()) {
                            cycles.push(cycle);
                        }
                    }
                    Mark::Done => {}
                },
            }
        }
    }

    for cycle in cycles {
        let first = cycle[0];
        let description = format!(
            "{} is their own ancestor through {}",
            first,
            cycle.join(" -> ")
        );
        let related = cycle
            .iter()
            .map(|x| RecordRef::new(RecordKind::Individual, x))
            .collect();
        let finding = Finding::new(
            ItemRef::record(RecordKind::Individual, first),
            Severity::Error,
            ProblemCode::CircularAncestry,
            "families_where_child",
            description,
        )
        .with_related(related);
        ctx.report_finding(finding);
    }
}

#[cfg(test)]
mod tests {
    use crate::load;
    use crate::model::{RecordKind, RecordRef};
    use crate::validate::{ProblemCode, Validator};

    #[test]
    fn test_no_cycle_in_plain_tree() {
        let src = "0 @I1@ INDI\n0 @I2@ INDI\n0 @I3@ INDI\n\
                   0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n\
                   0 @F2@ FAM\n1 HUSB @I2@\n1 CHIL @I3@\n";
        let g = load(src).unwrap().gedcom;
        let results = Validator::check(&g);
        assert_eq!(results.by_code(ProblemCode::CircularAncestry).count(), 0);
    }

    #[test]
    fn test_two_generation_cycle() {
        // I1 is the father of I2, who is the father of I1
        let src = "0 @I1@ INDI\n1 FAMC @F2@\n0 @I2@ INDI\n\
                   0 @F1@ FAM\n1 HUSB @I1@\n1 CHIL @I2@\n\
                   0 @F2@ FAM\n1 HUSB @I2@\n";
        let g = load(src).unwrap().gedcom;
        let results = Validator::check(&g);
        let cycles: Vec<_> = results.by_code(ProblemCode::CircularAncestry).collect();
        assert_eq!(cycles.len(), 1);
        let related = cycles[0].related();
        assert_eq!(related.len(), 2);
        assert!(related.contains(&RecordRef::new(RecordKind::Individual, "@I1@")));
        assert!(related.contains(&RecordRef::new(RecordKind::Individual, "@I2@")));
    }

    #[test]
    fn test_self_parent() {
        let src = "0 @I1@ INDI\n0 @F1@ FAM\n1 WIFE @I1@\n1 CHIL @I1@\n";
        let g = load(src).unwrap().gedcom;
        let results = Validator::check(&g);
        let cycle = results.by_code(ProblemCode::CircularAncestry).next().unwrap();
        assert_eq!(cycle.related().len(), 1);
    }
}
