//! Java parser built on tree-sitter.
//!
//! Parses a source string with the tree-sitter-java grammar and lowers the
//! borrowed CST into an owned [`SyntaxTree`] arena. Comments are dropped
//! during lowering; every other node, named or not, is kept together with its
//! grammar field name so later phases can address children the way the
//! grammar does (`operator`, `condition`, `body`, ...).

use crate::syntax::tree::{SyntaxNode, SyntaxTree};
use crate::types::{NodeId, Span};
use tree_sitter::{Node, Parser};

const NODE_LINE_COMMENT: &str = "line_comment";
const NODE_BLOCK_COMMENT: &str = "block_comment";

/// Parser for Java source files.
pub struct JavaParser {
    parser: Parser,
}

impl std::fmt::Debug for JavaParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JavaParser").field("language", &"Java").finish()
    }
}

/// The line of the first syntax error, when parsing fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntaxErrorLine(pub u32);

impl JavaParser {
    pub fn new() -> Result<Self, String> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| format!("Failed to initialize Java parser: {e}"))?;
        Ok(Self { parser })
    }

    /// Parse a compilation unit. The analyzer only promises defined behavior
    /// on syntactically well-formed input, so a tree containing error or
    /// missing nodes is rejected here.
    pub fn parse(&mut self, source: &str) -> Result<SyntaxTree, SyntaxErrorLine> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(SyntaxErrorLine(1))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(SyntaxErrorLine(first_error_line(root)));
        }

        let mut nodes = Vec::new();
        lower(root, None, None, &mut nodes);
        Ok(SyntaxTree { nodes })
    }
}

fn first_error_line(root: Node) -> u32 {
    let mut cursor = root.walk();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return node.start_position().row as u32 + 1;
        }
        for child in node.children(&mut cursor).collect::<Vec<_>>() {
            stack.push(child);
        }
    }
    root.start_position().row as u32 + 1
}

fn lower(
    node: Node,
    field: Option<&'static str>,
    parent: Option<NodeId>,
    nodes: &mut Vec<SyntaxNode>,
) -> NodeId {
    let id = NodeId::from_index(nodes.len());
    let start = node.start_position();
    nodes.push(SyntaxNode {
        kind: node.kind(),
        field,
        named: node.is_named(),
        span: Span::new(start.row as u32 + 1, start.column as u32 + 1),
        byte_range: (node.start_byte() as u32, node.end_byte() as u32),
        parent,
        children: Vec::new(),
    });

    let mut children = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            let child_field = cursor.field_name();
            if child.kind() != NODE_LINE_COMMENT && child.kind() != NODE_BLOCK_COMMENT {
                children.push((child, child_field));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    drop(cursor);

    let child_ids: Vec<NodeId> = children
        .into_iter()
        .map(|(child, child_field)| lower(child, child_field, Some(id), nodes))
        .collect();
    nodes[id.index()].children = child_ids;
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_class() {
        let mut parser = JavaParser::new().unwrap();
        let tree = parser.parse("class A { public A() {} }").unwrap();
        assert_eq!(tree.kind(tree.root()), "program");
    }

    #[test]
    fn rejects_malformed_input_with_line() {
        let mut parser = JavaParser::new().unwrap();
        let err = parser.parse("class A {\n  public int () broken\n}").unwrap_err();
        assert!(err.0 >= 1);
    }

    #[test]
    fn comments_are_dropped() {
        let mut parser = JavaParser::new().unwrap();
        let src = "// leading\nclass A { /* inner */ public A() {} }";
        let tree = parser.parse(src).unwrap();
        assert!(
            tree.descendants(tree.root())
                .all(|n| tree.kind(n) != "line_comment" && tree.kind(n) != "block_comment")
        );
    }

    #[test]
    fn operator_field_is_preserved() {
        let mut parser = JavaParser::new().unwrap();
        let src = "class A { public A() { int x = 1 + 2; } }";
        let tree = parser.parse(src).unwrap();
        let binary = tree.find_kind(tree.root(), "binary_expression").unwrap();
        let op = tree.child_by_field(binary, "operator").unwrap();
        assert_eq!(tree.text(op, src), "+");
    }
}
