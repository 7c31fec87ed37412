//! Function-body line extraction over the tagged syntax tree.

use super::{NodeKind, SyntaxNode};
use std::collections::BTreeSet;

/// Collect every fragment-relative line number that lies inside a function or
/// lambda body anywhere in `node`, including nested definitions.
///
/// Line markers outside any function-like node (top-level statements, struct
/// fields, module bodies) are not collected.
#[must_use]
pub fn function_body_lines(node: &SyntaxNode) -> BTreeSet<u32> {
    let mut lines = BTreeSet::new();
    walk(node, false, &mut lines);
    lines
}

fn walk(node: &SyntaxNode, in_body: bool, lines: &mut BTreeSet<u32>) {
    if in_body {
        if let Some(line) = node.line {
            lines.insert(line);
        }
    }
    let child_in_body = in_body || node.kind.is_function_like();
    for child in &node.children {
        walk(child, child_in_body, lines);
    }
}

/// Locate the first embedded [`NodeKind::Error`] node in depth-first order and
/// report the nearest line marker preceding it, if any.
///
/// Returns `None` when the tree contains no error nodes.
#[must_use]
pub fn first_error_line(node: &SyntaxNode) -> Option<Option<u32>> {
    let mut last_marker = None;
    find_error(node, &mut last_marker)
}

fn find_error(node: &SyntaxNode, last_marker: &mut Option<u32>) -> Option<Option<u32>> {
    if node.kind == NodeKind::Error {
        return Some(node.line.or(*last_marker));
    }
    if let Some(line) = node.line {
        *last_marker = Some(line);
    }
    for child in &node.children {
        if let Some(found) = find_error(child, last_marker) {
            return Some(found);
        }
    }
    None
}
