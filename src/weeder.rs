//! Weeding: syntactic well-formedness beyond the grammar.
//!
//! Runs once per compilation unit, before any symbol is declared. Two groups
//! of rules live here. The first is the classic Joos weeding set: file-name
//! agreement, modifier combinations, constructor presence, literal ranges,
//! method-body obligations. The second gates the dialect: tree-sitter parses
//! full Java, so constructs Joos 1W does not have (generics, ternary, `try`,
//! `switch`, `long`/`float`/`double`, increment operators, ...) are rejected
//! here rather than by the grammar.

use crate::error::{SemanticError, SemanticResult};
use crate::syntax::SyntaxTree;
use crate::types::NodeId;

const MAX_INT: u64 = i32::MAX as u64; // 2^31 - 1

/// Node kinds tree-sitter-java accepts but the analyzed dialect does not.
const UNSUPPORTED_KINDS: &[&str] = &[
    "ternary_expression",
    "switch_expression",
    "do_statement",
    "try_statement",
    "try_with_resources_statement",
    "throw_statement",
    "synchronized_statement",
    "assert_statement",
    "break_statement",
    "continue_statement",
    "labeled_statement",
    "yield_statement",
    "enhanced_for_statement",
    "lambda_expression",
    "method_reference",
    "generic_type",
    "type_arguments",
    "type_parameters",
    "enum_declaration",
    "record_declaration",
    "annotation_type_declaration",
    "annotation",
    "marker_annotation",
    "static_initializer",
    "explicit_constructor_invocation",
    "super",
    "spread_parameter",
    "array_initializer",
    "floating_point_type",
    "hex_integer_literal",
    "octal_integer_literal",
    "binary_integer_literal",
    "decimal_floating_point_literal",
];

const CLASS_MODIFIERS: &[&str] = &["public", "abstract", "final"];
const METHOD_MODIFIERS: &[&str] = &["public", "protected", "abstract", "static", "final", "native"];
const FIELD_MODIFIERS: &[&str] = &["public", "protected", "static"];
const CONSTRUCTOR_MODIFIERS: &[&str] = &["public", "protected"];

pub struct Weeder<'a> {
    tree: &'a SyntaxTree,
    source: &'a str,
    /// Source file base name without extension.
    file_stem: &'a str,
}

impl<'a> Weeder<'a> {
    pub fn new(tree: &'a SyntaxTree, source: &'a str, file_stem: &'a str) -> Self {
        Self {
            tree,
            source,
            file_stem,
        }
    }

    pub fn check(&self) -> SemanticResult<()> {
        let root = self.tree.root();

        let mut top_level_types = 0;
        for node in self.tree.descendants(root) {
            match self.tree.kind(node) {
                kind if UNSUPPORTED_KINDS.contains(&kind) => {
                    return Err(self.error(node, format!("Unsupported construct: {kind}")));
                }
                "class_declaration" => {
                    top_level_types += 1;
                    self.weed_class(node)?;
                }
                "interface_declaration" => {
                    top_level_types += 1;
                    self.weed_interface(node)?;
                }
                "constructor_declaration" => self.weed_constructor(node)?,
                "field_declaration" => self.weed_field(node)?,
                "local_variable_declaration" => self.weed_local(node)?,
                "formal_parameters" => self.weed_formal_parameters(node)?,
                "decimal_integer_literal" => self.weed_integer(node)?,
                "update_expression" => self.weed_update(node)?,
                "assignment_expression" => self.weed_assignment(node)?,
                "cast_expression" => self.weed_cast(node)?,
                "integral_type" => self.weed_integral(node)?,
                "import_declaration" => self.weed_import(node)?,
                _ => {}
            }
        }

        if top_level_types > 1 {
            return Err(self.error(root, "A file must declare exactly one class or interface"));
        }
        Ok(())
    }

    fn error(&self, node: NodeId, message: impl Into<String>) -> SemanticError {
        SemanticError::at(message, self.tree.span(node))
    }

    fn text(&self, node: NodeId) -> &str {
        self.tree.text(node, self.source)
    }

    /// Modifier keyword tokens of a declaration, in source order.
    fn modifiers(&self, node: NodeId) -> Vec<(String, NodeId)> {
        let Some(mods) = self
            .tree
            .children(node)
            .find(|&c| self.tree.kind(c) == "modifiers")
        else {
            return Vec::new();
        };
        self.tree
            .children(mods)
            .map(|c| (self.text(c).to_string(), c))
            .collect()
    }

    fn check_modifier_set(
        &self,
        node: NodeId,
        mods: &[(String, NodeId)],
        allowed: &[&str],
        what: &str,
    ) -> SemanticResult<()> {
        for (word, token) in mods {
            if !allowed.contains(&word.as_str()) {
                return Err(self.error(
                    *token,
                    format!("Invalid modifier \"{word}\" used in {what} declaration"),
                ));
            }
        }
        for (i, (word, _)) in mods.iter().enumerate() {
            if mods[i + 1..].iter().any(|(other, _)| other == word) {
                return Err(self.error(
                    node,
                    format!("{what} declaration cannot contain more than one of the same modifier"),
                ));
            }
        }
        Ok(())
    }

    fn has_modifier(mods: &[(String, NodeId)], word: &str) -> bool {
        mods.iter().any(|(w, _)| w == word)
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn weed_class(&self, node: NodeId) -> SemanticResult<()> {
        let tree = self.tree;
        let mods = self.modifiers(node);
        let name_node = tree
            .child_by_field(node, "name")
            .ok_or_else(|| self.error(node, "Class declaration without a name"))?;
        let name = self.text(name_node);

        if Self::has_modifier(&mods, "public") && name != self.file_stem {
            return Err(self.error(
                node,
                format!("{name} is public, should be declared in a file named {name}.java"),
            ));
        }

        self.check_modifier_set(node, &mods, CLASS_MODIFIERS, "Class")?;
        if Self::has_modifier(&mods, "abstract") && Self::has_modifier(&mods, "final") {
            return Err(self.error(node, "Class declaration cannot be both abstract and final"));
        }

        let body = tree
            .child_by_field(node, "body")
            .ok_or_else(|| self.error(node, "Class declaration without a body"))?;

        if tree.find_kind(body, "class_declaration").is_some()
            || tree.find_kind(body, "interface_declaration").is_some()
        {
            return Err(self.error(body, "Nested classes are not allowed"));
        }

        if tree.find_kind(body, "constructor_declaration").is_none() {
            return Err(self.error(body, "Class must contain an explicit constructor"));
        }

        let methods = tree.find_all(body, "method_declaration");
        if !Self::has_modifier(&mods, "abstract") {
            for &method in &methods {
                if Self::has_modifier(&self.modifiers(method), "abstract") {
                    return Err(
                        self.error(method, "Non-abstract class cannot contain an abstract method")
                    );
                }
            }
        }

        // Literal signatures: identifier plus unresolved parameter spellings.
        let signatures: Vec<(String, Vec<String>)> = methods
            .iter()
            .map(|&m| (self.method_name(m), self.raw_param_types(m)))
            .collect();
        for i in 0..signatures.len() {
            for j in i + 1..signatures.len() {
                if signatures[i] == signatures[j] {
                    return Err(
                        self.error(methods[j], "Two methods cannot have the same signature")
                    );
                }
            }
        }

        for &method in &methods {
            self.weed_method(method, false)?;
        }
        Ok(())
    }

    fn weed_interface(&self, node: NodeId) -> SemanticResult<()> {
        let tree = self.tree;
        let mods = self.modifiers(node);
        let name_node = tree
            .child_by_field(node, "name")
            .ok_or_else(|| self.error(node, "Interface declaration without a name"))?;
        let name = self.text(name_node);

        if Self::has_modifier(&mods, "public") && name != self.file_stem {
            return Err(self.error(
                node,
                format!("{name} is public, should be declared in a file named {name}.java"),
            ));
        }
        self.check_modifier_set(node, &mods, CLASS_MODIFIERS, "Interface")?;

        let body = tree
            .child_by_field(node, "body")
            .ok_or_else(|| self.error(node, "Interface declaration without a body"))?;

        if tree.find_kind(body, "constant_declaration").is_some() {
            return Err(self.error(body, "Interfaces cannot declare fields"));
        }

        for method in tree.find_all(body, "method_declaration") {
            self.weed_method(method, true)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------

    fn method_name(&self, method: NodeId) -> String {
        self.tree
            .child_by_field(method, "name")
            .map(|n| self.text(n).to_string())
            .unwrap_or_default()
    }

    fn raw_param_types(&self, method: NodeId) -> Vec<String> {
        let Some(params) = self.tree.child_by_field(method, "parameters") else {
            return Vec::new();
        };
        self.tree
            .named_children(params)
            .filter(|&p| self.tree.kind(p) == "formal_parameter")
            .filter_map(|p| self.tree.child_by_field(p, "type"))
            .map(|t| self.text(t).to_string())
            .collect()
    }

    fn return_type_text(&self, method: NodeId) -> String {
        self.tree
            .child_by_field(method, "type")
            .map(|t| self.text(t).to_string())
            .unwrap_or_else(|| "void".to_string())
    }

    fn weed_method(&self, node: NodeId, interface_method: bool) -> SemanticResult<()> {
        let mods = self.modifiers(node);
        self.check_modifier_set(node, &mods, METHOD_MODIFIERS, "Method")?;

        if Self::has_modifier(&mods, "public") && Self::has_modifier(&mods, "protected") {
            return Err(self.error(node, "Method cannot be both public and protected"));
        }

        let body = self.tree.child_by_field(node, "body");

        if interface_method {
            if Self::has_modifier(&mods, "final")
                || Self::has_modifier(&mods, "static")
                || Self::has_modifier(&mods, "native")
            {
                return Err(self.error(node, "An interface method cannot be static/final/native"));
            }
            if let Some(body) = body {
                return Err(self.error(body, "An interface method must not have a body"));
            }
            if !Self::has_modifier(&mods, "public") {
                return Err(self.error(node, "Method must be declared public"));
            }
            return Ok(());
        }

        if Self::has_modifier(&mods, "final") && Self::has_modifier(&mods, "static") {
            return Err(self.error(node, "A static method cannot be final"));
        }
        if Self::has_modifier(&mods, "native") && !Self::has_modifier(&mods, "static") {
            return Err(self.error(node, "A native method must be static"));
        }
        if Self::has_modifier(&mods, "abstract")
            && (Self::has_modifier(&mods, "static") || Self::has_modifier(&mods, "final"))
        {
            return Err(self.error(node, "Illegal combination of modifiers: abstract and final/static"));
        }

        if Self::has_modifier(&mods, "abstract") || Self::has_modifier(&mods, "native") {
            if let Some(body) = body {
                return Err(self.error(body, "An abstract/native method must not have a body"));
            }
        } else if body.is_none() {
            return Err(self.error(node, "A non-abstract/native method must have a body"));
        }

        let return_type = self.return_type_text(node);
        if Self::has_modifier(&mods, "native") {
            if return_type != "int" {
                return Err(self.error(
                    node,
                    format!("Native methods are restricted to int return type, found '{return_type}'"),
                ));
            }
            if self.raw_param_types(node) != ["int"] {
                return Err(self.error(node, "Native methods must have exactly one int parameter"));
            }
        }

        if !Self::has_modifier(&mods, "public") && !Self::has_modifier(&mods, "protected") {
            return Err(self.error(node, "Method must be declared public or protected"));
        }

        // Return-expression presence. Assignability is the type checker's.
        if let Some(body) = body {
            for ret in self.tree.find_all(body, "return_statement") {
                let has_expr = self.tree.named_children(ret).next().is_some();
                if return_type == "void" && has_expr {
                    return Err(self.error(
                        ret,
                        "Void function cannot contain an expression in a return statement",
                    ));
                }
                if return_type != "void" && !has_expr {
                    return Err(self.error(
                        ret,
                        "Non-void function must contain an expression in a return statement",
                    ));
                }
            }
        }
        Ok(())
    }

    fn weed_constructor(&self, node: NodeId) -> SemanticResult<()> {
        let mods = self.modifiers(node);
        self.check_modifier_set(node, &mods, CONSTRUCTOR_MODIFIERS, "Constructor")?;
        if Self::has_modifier(&mods, "public") && Self::has_modifier(&mods, "protected") {
            return Err(self.error(node, "Constructor cannot be both public and protected"));
        }
        if !Self::has_modifier(&mods, "public") && !Self::has_modifier(&mods, "protected") {
            return Err(self.error(node, "Package private constructors are not allowed"));
        }
        if let Some(body) = self.tree.child_by_field(node, "body") {
            for ret in self.tree.find_all(body, "return_statement") {
                if self.tree.named_children(ret).next().is_some() {
                    return Err(self.error(
                        ret,
                        "Constructor cannot contain an expression in a return statement",
                    ));
                }
            }
        }
        Ok(())
    }

    fn weed_field(&self, node: NodeId) -> SemanticResult<()> {
        let mods = self.modifiers(node);
        self.check_modifier_set(node, &mods, FIELD_MODIFIERS, "Field")?;
        if Self::has_modifier(&mods, "public") && Self::has_modifier(&mods, "protected") {
            return Err(self.error(node, "Field cannot be both public and protected"));
        }
        if self.tree.children_by_field(node, "declarator").count() > 1 {
            return Err(self.error(node, "One declarator per field declaration"));
        }
        Ok(())
    }

    fn weed_local(&self, node: NodeId) -> SemanticResult<()> {
        let declarators: Vec<_> = self.tree.children_by_field(node, "declarator").collect();
        if declarators.len() > 1 {
            return Err(self.error(node, "One declarator per local variable declaration"));
        }
        for declarator in declarators {
            if self.tree.child_by_field(declarator, "value").is_none() {
                return Err(self.error(declarator, "Local variable must have an initializer"));
            }
        }
        Ok(())
    }

    fn weed_formal_parameters(&self, node: NodeId) -> SemanticResult<()> {
        let names: Vec<&str> = self
            .tree
            .named_children(node)
            .filter(|&p| self.tree.kind(p) == "formal_parameter")
            .filter_map(|p| self.tree.child_by_field(p, "name"))
            .map(|n| self.text(n))
            .collect();
        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].contains(name) {
                return Err(self.error(node, "Formal parameters must have unique identifiers"));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions and tokens
    // ------------------------------------------------------------------

    fn weed_integer(&self, node: NodeId) -> SemanticResult<()> {
        let value: u64 = self
            .text(node)
            .parse()
            .map_err(|_| self.error(node, "Integer number too large"))?;

        // 2^31 is permitted only as the immediate operand of unary negation.
        let negated = self.tree.parent(node).is_some_and(|p| {
            self.tree.kind(p) == "unary_expression"
                && self
                    .tree
                    .child_by_field(p, "operator")
                    .is_some_and(|op| self.text(op) == "-")
        });
        let limit = if negated { MAX_INT + 1 } else { MAX_INT };
        if value > limit {
            return Err(self.error(node, "Integer number too large"));
        }
        Ok(())
    }

    fn weed_update(&self, node: NodeId) -> SemanticResult<()> {
        let first = self.tree.children(node).next();
        if first.is_some_and(|t| self.text(t) == "--") {
            return Err(self.error(node, "Pre-decrement operator not allowed"));
        }
        Err(self.error(node, "Unsupported construct: update_expression"))
    }

    fn weed_assignment(&self, node: NodeId) -> SemanticResult<()> {
        let op = self
            .tree
            .child_by_field(node, "operator")
            .map(|op| self.text(op))
            .unwrap_or("=");
        if op != "=" {
            return Err(self.error(node, format!("Compound assignment '{op}' not allowed")));
        }
        Ok(())
    }

    fn weed_cast(&self, node: NodeId) -> SemanticResult<()> {
        let Some(ty) = self.tree.child_by_field(node, "type") else {
            return Err(self.error(node, "Expression casting invalid"));
        };
        match self.tree.kind(ty) {
            "integral_type" | "boolean_type" | "array_type" | "type_identifier"
            | "scoped_type_identifier" => Ok(()),
            _ => Err(self.error(node, "Expression casting invalid")),
        }
    }

    fn weed_integral(&self, node: NodeId) -> SemanticResult<()> {
        if self.text(node) == "long" {
            return Err(self.error(node, "Unsupported construct: long"));
        }
        Ok(())
    }

    fn weed_import(&self, node: NodeId) -> SemanticResult<()> {
        if self.tree.children(node).any(|c| self.text(c) == "static") {
            return Err(self.error(node, "Static imports are not allowed"));
        }
        Ok(())
    }
}
