//! Continuation lines.
//!
//! `CONC` continues the current line verbatim; `CONT` starts a new one.
//! Every multi-line field goes through [`continue_lines`] so the two rules
//! are applied the same way everywhere.

use crate::tree::Node;

/// Start a list of lines from a node's own value.
pub fn first_line(node: &Node) -> Vec<String> {
    node.value.iter().cloned().collect()
}

/// Apply `child` to `lines` if it is a `CONC` or `CONT`.
///
/// Returns `false` (leaving `lines` untouched) for any other tag so the
/// caller can handle it. A `CONC` without a value adds nothing; a `CONT`
/// without a value adds an empty line.
pub fn continue_lines(lines: &mut Vec<String>, child: &Node) -> bool {
    match child.tag.as_str() {
        "CONT" => {
            lines.push(child.value.clone().unwrap_or_default());
            true
        }
        "CONC" => {
            if let Some(value) = &child.value {
                match lines.last_mut() {
                    Some(last) => last.push_str(value),
                    None => lines.push(value.clone()),
                }
            }
            true
        }
        _ => false,
    }
}

/// Same rules for a single-string field whose lines are joined with `\n`.
pub fn continue_value(value: &mut Option<String>, child: &Node) -> bool {
    match child.tag.as_str() {
        "CONT" => {
            let text = child.value.as_deref().unwrap_or("");
            match value {
                Some(v) => {
                    v.push('\n');
                    v.push_str(text);
                }
                None => *value = Some(text.to_string()),
            }
            true
        }
        "CONC" => {
            if let Some(text) = &child.value {
                value.get_or_insert_with(String::new).push_str(text);
            }
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(tag: &str, value: Option<&str>) -> Node {
        Node {
            id: 1,
            level: 1,
            xref: None,
            tag: tag.to_string(),
            value: value.map(String::from),
            line: 1,
            parent: None,
            children: Vec::new(),
        }
    }

    #[test]
    fn test_conc_joins_without_separator() {
        let mut lines = first_line(&node("NOTE", Some("A")));
        assert!(continue_lines(&mut lines, &node("CONC", Some("B"))));
        assert_eq!(lines, vec!["AB"]);
    }

    #[test]
    fn test_cont_starts_new_line() {
        let mut lines = first_line(&node("NOTE", Some("A")));
        continue_lines(&mut lines, &node("CONT", Some("B")));
        continue_lines(&mut lines, &node("CONT", None));
        continue_lines(&mut lines, &node("CONC", Some("C")));
        assert_eq!(lines, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_conc_on_empty_list_pushes() {
        let mut lines = first_line(&node("NOTE", None));
        continue_lines(&mut lines, &node("CONC", None));
        assert!(lines.is_empty());
        continue_lines(&mut lines, &node("CONC", Some("x")));
        assert_eq!(lines, vec!["x"]);
    }

    #[test]
    fn test_other_tags_are_left_alone() {
        let mut lines = vec!["A".to_string()];
        assert!(!continue_lines(&mut lines, &node("SOUR", Some("@S1@"))));
        assert_eq!(lines, vec!["A"]);
    }

    #[test]
    fn test_single_value_form() {
        let mut value = Some("Main ".to_string());
        continue_value(&mut value, &node("CONC", Some("Street")));
        continue_value(&mut value, &node("CONT", Some("Apt 2")));
        assert_eq!(value.as_deref(), Some("Main Street\nApt 2"));

        let mut empty = None;
        continue_value(&mut empty, &node("CONT", Some("x")));
        assert_eq!(empty.as_deref(), Some("x"));
    }
}
