//! Owned syntax-tree arena.
//!
//! The tree-sitter CST borrows from its parser, so the parse result is
//! lowered into a flat arena of [`SyntaxNode`]s indexed by [`NodeId`]. Scopes
//! and annotations produced by later phases reference subtrees by id without
//! holding any borrow. Node kinds are the `&'static str` kind names of the
//! tree-sitter-java grammar (`"class_declaration"`, `"binary_expression"`,
//! ...), and children keep the grammar field name they occupy in their parent
//! (`"name"`, `"type"`, `"operator"`, ...).

use crate::types::{NodeId, Span};

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: &'static str,
    pub field: Option<&'static str>,
    pub named: bool,
    pub span: Span,
    pub byte_range: (u32, u32),
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// One parsed compilation unit's tree. Index 0 is the `program` root.
#[derive(Debug, Clone, Default)]
pub struct SyntaxTree {
    pub(crate) nodes: Vec<SyntaxNode>,
}

impl SyntaxTree {
    pub fn root(&self) -> NodeId {
        NodeId::from_index(0)
    }

    pub fn get(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &'static str {
        self.get(id).kind
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.get(id).span
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).parent
    }

    pub fn text<'a>(&self, id: NodeId, source: &'a str) -> &'a str {
        let (start, end) = self.get(id).byte_range;
        &source[start as usize..end as usize]
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.get(id).children.iter().copied()
    }

    pub fn named_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).filter(|&c| self.get(c).named)
    }

    pub fn child_by_field(&self, id: NodeId, field: &str) -> Option<NodeId> {
        self.children(id).find(|&c| self.get(c).field == Some(field))
    }

    pub fn children_by_field<'a>(
        &'a self,
        id: NodeId,
        field: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id)
            .filter(move |&c| self.get(c).field == Some(field))
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// First descendant (pre-order) with the given kind, excluding `id` itself.
    pub fn find_kind(&self, id: NodeId, kind: &str) -> Option<NodeId> {
        self.descendants(id).skip(1).find(|&n| self.kind(n) == kind)
    }

    /// All descendants with the given kind, excluding `id` itself.
    pub fn find_all(&self, id: NodeId, kind: &str) -> Vec<NodeId> {
        self.descendants(id)
            .skip(1)
            .filter(|&n| self.kind(n) == kind)
            .collect()
    }

    /// Reassembles a dotted name chain from nested `field_access` /
    /// `scoped_identifier` nodes. Returns the identifiers in source order, or
    /// `None` when any component is something other than a plain name (a
    /// call, an array access, a parenthesized expression, ...). A leading
    /// `this` is returned as the literal identifier `"this"`.
    pub fn flatten_name(&self, id: NodeId, source: &str) -> Option<Vec<String>> {
        match self.kind(id) {
            "identifier" | "type_identifier" | "this" => {
                Some(vec![self.text(id, source).to_string()])
            }
            "field_access" => {
                let object = self.child_by_field(id, "object")?;
                let field = self.child_by_field(id, "field")?;
                if self.kind(field) != "identifier" {
                    return None;
                }
                let mut parts = self.flatten_name(object, source)?;
                parts.push(self.text(field, source).to_string());
                Some(parts)
            }
            "scoped_identifier" | "scoped_type_identifier" => {
                let scope = self.child_by_field(id, "scope").or_else(|| {
                    // scoped_type_identifier has no field names; the scope is
                    // the first named child, the name the last.
                    self.named_children(id).next()
                })?;
                let name = self
                    .child_by_field(id, "name")
                    .or_else(|| self.named_children(id).last())?;
                let mut parts = self.flatten_name(scope, source)?;
                parts.push(self.text(name, source).to_string());
                Some(parts)
            }
            _ => None,
        }
    }

    /// Indented dump of the subtree, for the `parse` CLI command.
    pub fn dump(&self, id: NodeId, source: &str) -> String {
        let mut out = String::new();
        self.dump_into(id, source, 0, &mut out);
        out
    }

    fn dump_into(&self, id: NodeId, source: &str, depth: usize, out: &mut String) {
        let node = self.get(id);
        if !node.named {
            return;
        }
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(node.kind);
        if let Some(field) = node.field {
            out.push_str(&format!(" [{field}]"));
        }
        if node.children.is_empty() {
            out.push_str(&format!(" {:?}", self.text(id, source)));
        }
        out.push('\n');
        for child in &node.children {
            self.dump_into(*child, source, depth + 1, out);
        }
    }
}

pub struct Descendants<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        let node = self.tree.get(id);
        self.stack.extend(node.children.iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::JavaParser;

    fn parse(source: &str) -> SyntaxTree {
        JavaParser::new().unwrap().parse(source).unwrap()
    }

    #[test]
    fn arena_roundtrip_and_fields() {
        let src = "class A { public A() {} }";
        let tree = parse(src);
        let class_decl = tree.find_kind(tree.root(), "class_declaration").unwrap();
        let name = tree.child_by_field(class_decl, "name").unwrap();
        assert_eq!(tree.text(name, src), "A");
        assert_eq!(tree.kind(name), "identifier");
        assert_eq!(tree.span(class_decl), Span::new(1, 1));
    }

    #[test]
    fn flatten_name_on_dotted_chains() {
        let src = "class A { public A() { int x = a.b.c; } }";
        let tree = parse(src);
        let access = tree.find_kind(tree.root(), "field_access").unwrap();
        assert_eq!(
            tree.flatten_name(access, src),
            Some(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn flatten_name_rejects_non_name_components() {
        let src = "class A { public A() { int x = f().b; } }";
        let tree = parse(src);
        let access = tree.find_kind(tree.root(), "field_access").unwrap();
        assert_eq!(tree.flatten_name(access, src), None);
    }

    #[test]
    fn descendants_are_preorder() {
        let src = "class A { public A() {} }";
        let tree = parse(src);
        let first = tree.descendants(tree.root()).next().unwrap();
        assert_eq!(first, tree.root());
        let kinds: Vec<_> = tree
            .descendants(tree.root())
            .map(|n| tree.kind(n))
            .collect();
        assert!(kinds.contains(&"constructor_declaration"));
    }
}
