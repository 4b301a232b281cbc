//! Name disambiguation: phase 5.
//!
//! Every dotted identifier chain in expression position is classified,
//! shortest prefix first: a chain rooted at `this`, at a local variable or
//! parameter, at a field of the enclosing type (implicit `this`), or at a
//! type name (the prefix that resolved); what remains after the root is a
//! sequence of field accesses the type checker will type. A chain that
//! resolves to nothing, or only to a package prefix, fails here. The results
//! are recorded in the environment's annotation table keyed by the chain's
//! syntax node; the type checker consumes them.
//!
//! Method invocation heads are validated here as well: a head naming a type
//! must name a class (not an interface) declaring a method of that name.

use crate::env::GlobalEnv;
use crate::error::{SemanticError, SemanticResult};
use crate::syntax::SyntaxTree;
use crate::typeck::values::TypeValue;
use crate::types::{NodeId, ScopeId, TypeId, UnitId};
use std::collections::HashMap;
use tracing::debug;

/// Classification of a dotted name chain's root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTarget {
    /// The chain starts with `this`; fields follow from index 1.
    This,
    /// The first identifier is a local variable or parameter.
    Local,
    /// The first identifier is a field of the enclosing type, accessed
    /// through the implicit `this`.
    Field,
    /// The first `parts` identifiers name a type; a static member access
    /// follows.
    Type { ty: TypeId, parts: usize },
}

/// Classify a chain of identifiers, shortest prefix first. The first prefix
/// that resolves fixes the classification; locals and fields of the
/// enclosing type take precedence over type names for the first identifier.
pub fn classify(
    env: &GlobalEnv,
    scope: ScopeId,
    parts: &[String],
    in_static: bool,
) -> SemanticResult<NameTarget> {
    let first = parts[0].as_str();

    if first == "this" {
        if in_static {
            return Err(SemanticError::new("Keyword 'this' found in static context"));
        }
        return Ok(NameTarget::This);
    }

    if env.resolve_local(scope, first).is_some() {
        return Ok(NameTarget::Local);
    }

    let enclosing = env.enclosing_type(scope);
    if !in_static && env.find_field(enclosing, first).is_some() {
        return Ok(NameTarget::Field);
    }

    for len in 1..=parts.len() {
        let name = parts[..len].join(".");
        if let Some(TypeValue::Decl(ty)) = env.resolve_name(enclosing, &name) {
            return Ok(NameTarget::Type { ty, parts: len });
        }
    }

    Err(SemanticError::new(format!(
        "Name '{}' could not be resolved in expression",
        parts.join(".")
    )))
}

/// Runs the disambiguation pass over every type body and records the
/// classification of every name chain.
pub fn disambiguate(env: &mut GlobalEnv) -> SemanticResult<()> {
    let mut annotations = HashMap::new();
    {
        let env: &GlobalEnv = env;
        for ty in env.type_ids() {
            let unit = env.type_decl(ty).unit;
            let walker = Disambiguator {
                env,
                unit,
                tree: &env.unit(unit).tree,
                source: &env.unit(unit).source,
            };
            walker.walk_type(ty, &mut annotations)?;
        }
    }
    env.annotations.extend(annotations);
    Ok(())
}

struct Disambiguator<'a> {
    env: &'a GlobalEnv,
    unit: UnitId,
    tree: &'a SyntaxTree,
    source: &'a str,
}

type Annotations = HashMap<(UnitId, NodeId), NameTarget>;

impl Disambiguator<'_> {
    fn walk_type(&self, ty: TypeId, out: &mut Annotations) -> SemanticResult<()> {
        let decl = self.env.type_decl(ty);
        let Some(body_scope) = decl.body_scope else {
            return Ok(());
        };
        debug!(name = %decl.name, "disambiguating names");

        let body = self.env.scope(body_scope).node;
        for member in self.tree.named_children(body) {
            match self.tree.kind(member) {
                "field_declaration" => {
                    let is_static = self.field_is_static(member);
                    if let Some(value) = self
                        .tree
                        .child_by_field(member, "declarator")
                        .and_then(|d| self.tree.child_by_field(d, "value"))
                    {
                        self.walk_expr(body_scope, is_static, value, out)?;
                    }
                }
                "method_declaration" | "constructor_declaration" => {
                    if let Some(body) = self.tree.child_by_field(member, "body") {
                        if let Some(scope) = self.env.scope_at(self.unit, body) {
                            let is_static = self.env.scope(scope).is_static;
                            self.walk_stmt(scope, is_static, body, out)?;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn field_is_static(&self, field: NodeId) -> bool {
        self.tree
            .children(field)
            .find(|&c| self.tree.kind(c) == "modifiers")
            .is_some_and(|mods| {
                self.tree
                    .children(mods)
                    .any(|m| self.tree.text(m, self.source) == "static")
            })
    }

    fn walk_stmt(
        &self,
        scope: ScopeId,
        in_static: bool,
        node: NodeId,
        out: &mut Annotations,
    ) -> SemanticResult<()> {
        // Scope-introducing statements were given their own scope by the
        // environment builder.
        let scope = self.env.scope_at(self.unit, node).unwrap_or(scope);

        match self.tree.kind(node) {
            "block" | "constructor_body" => {
                for child in self.tree.named_children(node) {
                    self.walk_stmt(scope, in_static, child, out)?;
                }
            }
            "local_variable_declaration" => {
                if let Some(value) = self
                    .tree
                    .child_by_field(node, "declarator")
                    .and_then(|d| self.tree.child_by_field(d, "value"))
                {
                    self.walk_expr(scope, in_static, value, out)?;
                }
            }
            "expression_statement" => {
                if let Some(expr) = self.tree.named_children(node).next() {
                    self.walk_expr(scope, in_static, expr, out)?;
                }
            }
            "return_statement" => {
                if let Some(expr) = self.tree.named_children(node).next() {
                    self.walk_expr(scope, in_static, expr, out)?;
                }
            }
            "if_statement" | "while_statement" => {
                if let Some(cond) = self.tree.child_by_field(node, "condition") {
                    self.walk_expr(scope, in_static, cond, out)?;
                }
                for field in ["consequence", "alternative", "body"] {
                    if let Some(stmt) = self.tree.child_by_field(node, field) {
                        self.walk_stmt(scope, in_static, stmt, out)?;
                    }
                }
            }
            "for_statement" => {
                for field in ["init", "condition", "update"] {
                    if let Some(part) = self.tree.child_by_field(node, field) {
                        if self.tree.kind(part) == "local_variable_declaration" {
                            self.walk_stmt(scope, in_static, part, out)?;
                        } else {
                            self.walk_expr(scope, in_static, part, out)?;
                        }
                    }
                }
                if let Some(body) = self.tree.child_by_field(node, "body") {
                    self.walk_stmt(scope, in_static, body, out)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn walk_expr(
        &self,
        scope: ScopeId,
        in_static: bool,
        node: NodeId,
        out: &mut Annotations,
    ) -> SemanticResult<()> {
        let tree = self.tree;
        match tree.kind(node) {
            "identifier" | "this" => self.classify_chain(scope, in_static, node, out)?,
            "field_access" => {
                if tree.flatten_name(node, self.source).is_some() {
                    self.classify_chain(scope, in_static, node, out)?;
                } else if let Some(object) = tree.child_by_field(node, "object") {
                    self.walk_expr(scope, in_static, object, out)?;
                }
            }
            "method_invocation" => {
                self.walk_invocation_head(scope, in_static, node, out)?;
                if let Some(args) = tree.child_by_field(node, "arguments") {
                    for arg in tree.named_children(args) {
                        self.walk_expr(scope, in_static, arg, out)?;
                    }
                }
            }
            "binary_expression" => {
                for field in ["left", "right"] {
                    if let Some(side) = tree.child_by_field(node, field) {
                        self.walk_expr(scope, in_static, side, out)?;
                    }
                }
            }
            "assignment_expression" => {
                for field in ["left", "right"] {
                    if let Some(side) = tree.child_by_field(node, field) {
                        self.walk_expr(scope, in_static, side, out)?;
                    }
                }
            }
            "unary_expression" => {
                if let Some(operand) = tree.child_by_field(node, "operand") {
                    self.walk_expr(scope, in_static, operand, out)?;
                }
            }
            "parenthesized_expression" => {
                if let Some(inner) = tree.named_children(node).next() {
                    self.walk_expr(scope, in_static, inner, out)?;
                }
            }
            "cast_expression" => {
                if let Some(value) = tree.child_by_field(node, "value") {
                    self.walk_expr(scope, in_static, value, out)?;
                }
            }
            "instanceof_expression" => {
                if let Some(left) = tree.child_by_field(node, "left") {
                    self.walk_expr(scope, in_static, left, out)?;
                }
            }
            "array_access" => {
                for field in ["array", "index"] {
                    if let Some(part) = tree.child_by_field(node, field) {
                        self.walk_expr(scope, in_static, part, out)?;
                    }
                }
            }
            "object_creation_expression" => {
                if let Some(args) = tree.child_by_field(node, "arguments") {
                    for arg in tree.named_children(args) {
                        self.walk_expr(scope, in_static, arg, out)?;
                    }
                }
            }
            "array_creation_expression" => {
                for dim in tree.find_all(node, "dimensions_expr") {
                    if let Some(expr) = tree.named_children(dim).next() {
                        self.walk_expr(scope, in_static, expr, out)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn classify_chain(
        &self,
        scope: ScopeId,
        in_static: bool,
        node: NodeId,
        out: &mut Annotations,
    ) -> SemanticResult<()> {
        let Some(parts) = self.tree.flatten_name(node, self.source) else {
            return Ok(());
        };
        let target = classify(self.env, scope, &parts, in_static)?;
        out.insert((self.unit, node), target);
        Ok(())
    }

    /// Validate the receiver of a method invocation. A head that names a
    /// type outright must be a class declaring (or inheriting) a method of
    /// the invoked name; a bare head requires such a method on the enclosing
    /// type.
    fn walk_invocation_head(
        &self,
        scope: ScopeId,
        in_static: bool,
        node: NodeId,
        out: &mut Annotations,
    ) -> SemanticResult<()> {
        let tree = self.tree;
        let method_name = tree
            .child_by_field(node, "name")
            .map(|n| tree.text(n, self.source).to_string())
            .unwrap_or_default();

        let Some(object) = tree.child_by_field(node, "object") else {
            // Implicit-this invocation.
            let enclosing = self.env.enclosing_type(scope);
            let decl = self.env.type_decl(enclosing);
            if !decl.methods.iter().any(|m| m.name == method_name) {
                return Err(SemanticError::at(
                    format!(
                        "Method {method_name} doesn't exist in class {}",
                        decl.name
                    ),
                    tree.span(node),
                ));
            }
            return Ok(());
        };

        let Some(parts) = tree.flatten_name(object, self.source) else {
            return self.walk_expr(scope, in_static, object, out);
        };

        let target = classify(self.env, scope, &parts, in_static)?;
        if let NameTarget::Type { ty, parts: len } = &target {
            if *len == parts.len() {
                // The whole receiver names a type: a static invocation.
                let decl = self.env.type_decl(*ty);
                if decl.is_interface() {
                    return Err(SemanticError::at(
                        format!(
                            "Can't call method {method_name} as static from interface {}",
                            decl.name
                        ),
                        tree.span(node),
                    ));
                }
                if !decl.methods.iter().any(|m| m.name == method_name) {
                    return Err(SemanticError::at(
                        format!(
                            "Method {method_name} doesn't exist in class {}",
                            decl.name
                        ),
                        tree.span(node),
                    ));
                }
            }
        }
        out.insert((self.unit, object), target);
        Ok(())
    }
}
