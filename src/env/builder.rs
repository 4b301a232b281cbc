//! Environment building: phase 2.
//!
//! Walks one compilation unit's syntax tree and declares every package,
//! type, field, method, constructor, parameter and local variable into the
//! global environment's scope tree. Type names appearing anywhere in the
//! declaration are enqueued (unresolved) in the type's `type_names` table for
//! the linker.

use crate::env::decls::{
    ConstructorDecl, FieldDecl, Import, LocalVar, MethodDecl, TypeDecl, TypeKind,
};
use crate::env::{GlobalEnv, ScopeOwner};
use crate::error::{SemanticError, SemanticResult};
use crate::syntax::SyntaxTree;
use crate::types::{Modifiers, NodeId, ScopeId, TypeId, UnitId};
use std::path::PathBuf;
use tracing::debug;

const OBJECT: &str = "java.lang.Object";

/// Parse result of one file, environment-built into `env`. The unit is added
/// to the environment on success; on error the whole analysis aborts anyway.
pub fn build_unit(
    env: &mut GlobalEnv,
    path: PathBuf,
    source: String,
    tree: SyntaxTree,
) -> SemanticResult<UnitId> {
    let unit = UnitId::from_index(env.units.len());
    {
        let mut builder = EnvBuilder {
            env,
            tree: &tree,
            source: &source,
            unit,
        };
        builder.build()?;
    }
    Ok(env.add_unit(path, source, tree))
}

struct EnvBuilder<'a> {
    env: &'a mut GlobalEnv,
    tree: &'a SyntaxTree,
    source: &'a str,
    unit: UnitId,
}

impl EnvBuilder<'_> {
    fn text(&self, node: NodeId) -> &str {
        self.tree.text(node, self.source)
    }

    fn build(&mut self) -> SemanticResult<()> {
        let root = self.tree.root();

        let mut package = String::new();
        // java.lang is importable on demand in every unit.
        let mut imports = vec![Import::OnDemand("java.lang".to_string())];
        let mut decl = None;

        for child in self.tree.named_children(root) {
            match self.tree.kind(child) {
                "package_declaration" => {
                    if let Some(name) = self.tree.named_children(child).next() {
                        package = self.text(name).to_string();
                    }
                }
                "import_declaration" => {
                    let Some(name) = self.tree.named_children(child).next() else {
                        continue;
                    };
                    let on_demand = self
                        .tree
                        .children(child)
                        .any(|c| self.tree.kind(c) == "asterisk");
                    let name = self.text(name).to_string();
                    imports.push(if on_demand {
                        Import::OnDemand(name)
                    } else {
                        Import::Single(name)
                    });
                }
                "class_declaration" | "interface_declaration" => decl = Some(child),
                _ => {}
            }
        }

        if let Some(decl) = decl {
            self.build_type(decl, &package, imports)?;
        }
        Ok(())
    }

    fn build_type(
        &mut self,
        node: NodeId,
        package: &str,
        imports: Vec<Import>,
    ) -> SemanticResult<()> {
        let tree = self.tree;
        let kind = if tree.kind(node) == "class_declaration" {
            TypeKind::Class
        } else {
            TypeKind::Interface
        };

        let name_node = tree
            .child_by_field(node, "name")
            .ok_or_else(|| SemanticError::at("Type declaration without a name", tree.span(node)))?;
        let simple = self.text(name_node).to_string();
        let canonical = if package.is_empty() {
            simple
        } else {
            format!("{package}.{simple}")
        };

        let modifiers = self.modifiers(node);

        let mut extends = Vec::new();
        let mut implements = Vec::new();
        for child in tree.named_children(node) {
            match tree.kind(child) {
                "superclass" => {
                    if let Some(ty) = tree.named_children(child).next() {
                        extends.push(self.text(ty).to_string());
                    }
                }
                "super_interfaces" | "extends_interfaces" => {
                    if let Some(list) = tree.named_children(child).next() {
                        let names = tree
                            .named_children(list)
                            .map(|t| self.text(t).to_string())
                            .collect::<Vec<_>>();
                        if tree.kind(child) == "super_interfaces" {
                            implements = names;
                        } else {
                            extends = names;
                        }
                    }
                }
                _ => {}
            }
        }

        // Every class other than Object itself has a superclass.
        if kind == TypeKind::Class && extends.is_empty() && canonical != OBJECT {
            extends.push(OBJECT.to_string());
        }

        debug!(name = %canonical, ?kind, "declaring type");

        let body = tree
            .child_by_field(node, "body")
            .ok_or_else(|| SemanticError::at("Type declaration without a body", tree.span(node)))?;

        let mut decl = TypeDecl {
            id: TypeId::from_index(0), // assigned by declare_type
            kind,
            name: canonical,
            modifiers,
            extends,
            implements,
            imports,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            type_names: Default::default(),
            span: tree.span(node),
            unit: self.unit,
            decl_node: node,
            body_scope: None,
            checked: false,
        };
        for name in decl.extends.iter().chain(&decl.implements) {
            decl.type_names.insert(name.clone(), None);
        }
        let ty = self.env.declare_type(decl)?;

        self.enqueue_type_names(ty, node);

        let body_scope = self
            .env
            .push_scope(None, ScopeOwner::Type(ty), self.unit, body, false);
        self.env.type_decl_mut(ty).body_scope = Some(body_scope);

        for member in tree.named_children(body) {
            match tree.kind(member) {
                "field_declaration" => self.build_field(ty, member)?,
                "method_declaration" => self.build_method(ty, body_scope, member)?,
                "constructor_declaration" => self.build_constructor(ty, body_scope, member)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// Enqueue every type name textually appearing in the declaration.
    /// Scoped names are recorded whole, not per component.
    fn enqueue_type_names(&mut self, ty: TypeId, node: NodeId) {
        let mut stack = vec![node];
        let mut names = Vec::new();
        while let Some(n) = stack.pop() {
            match self.tree.kind(n) {
                "type_identifier" => names.push(self.text(n).to_string()),
                "scoped_type_identifier" => names.push(self.text(n).to_string()),
                _ => stack.extend(self.tree.children(n)),
            }
        }
        let decl = self.env.type_decl_mut(ty);
        for name in names {
            decl.type_names.entry(name).or_insert(None);
        }
    }

    fn modifiers(&self, node: NodeId) -> Modifiers {
        let mut result = Modifiers::empty();
        if let Some(mods) = self
            .tree
            .children(node)
            .find(|&c| self.tree.kind(c) == "modifiers")
        {
            for child in self.tree.children(mods) {
                if let Some(m) = Modifiers::from_keyword(self.text(child)) {
                    result |= m;
                }
            }
        }
        result
    }

    fn formal_params(&self, node: NodeId) -> Vec<(String, String, crate::types::Span)> {
        let Some(params) = self.tree.child_by_field(node, "parameters") else {
            return Vec::new();
        };
        self.tree
            .named_children(params)
            .filter(|&p| self.tree.kind(p) == "formal_parameter")
            .filter_map(|p| {
                let ty = self.tree.child_by_field(p, "type")?;
                let name = self.tree.child_by_field(p, "name")?;
                Some((
                    self.text(ty).to_string(),
                    self.text(name).to_string(),
                    self.tree.span(p),
                ))
            })
            .collect()
    }

    fn build_field(&mut self, ty: TypeId, node: NodeId) -> SemanticResult<()> {
        let tree = self.tree;
        let field_ty = tree
            .child_by_field(node, "type")
            .map(|t| self.text(t).to_string())
            .ok_or_else(|| SemanticError::at("Field without a type", tree.span(node)))?;
        let declarator = tree
            .child_by_field(node, "declarator")
            .ok_or_else(|| SemanticError::at("Field without a declarator", tree.span(node)))?;
        let name = tree
            .child_by_field(declarator, "name")
            .map(|n| self.text(n).to_string())
            .ok_or_else(|| SemanticError::at("Field without a name", tree.span(node)))?;

        let modifiers = self.modifiers(node);
        let decl = self.env.type_decl_mut(ty);
        if decl.fields.iter().any(|f| f.name == name) {
            return Err(SemanticError::at(
                format!("Overlapping field declaration in scope: {name}"),
                tree.span(node),
            ));
        }
        debug!(field = %name, ty = %field_ty, "declaring field");
        decl.fields.push(FieldDecl {
            name,
            modifiers,
            ty: field_ty,
            span: tree.span(node),
            owner: ty,
        });
        Ok(())
    }

    fn build_method(&mut self, ty: TypeId, type_scope: ScopeId, node: NodeId) -> SemanticResult<()> {
        let tree = self.tree;
        let name = tree
            .child_by_field(node, "name")
            .map(|n| self.text(n).to_string())
            .ok_or_else(|| SemanticError::at("Method without a name", tree.span(node)))?;
        let return_type = tree
            .child_by_field(node, "type")
            .map(|t| self.text(t).to_string())
            .unwrap_or_else(|| "void".to_string());

        let mut modifiers = self.modifiers(node);
        // Interface methods are implicitly abstract.
        if self.env.type_decl(ty).is_interface() {
            modifiers |= Modifiers::ABSTRACT;
        }

        let params = self.formal_params(node);
        let body = tree.child_by_field(node, "body");

        let method = MethodDecl {
            name,
            modifiers,
            param_types: params.iter().map(|(t, _, _)| t.clone()).collect(),
            return_type,
            has_body: body.is_some(),
            span: tree.span(node),
            owner: ty,
        };

        let decl = self.env.type_decl_mut(ty);
        if decl
            .methods
            .iter()
            .any(|m| m.raw_signature() == method.raw_signature())
        {
            return Err(SemanticError::at(
                format!("Overlapping method declaration in scope: {}", method.name),
                tree.span(node),
            ));
        }
        debug!(method = %method.name, "declaring method");
        let index = decl.methods.len();
        let is_static = method.modifiers.is_static();
        decl.methods.push(method);

        if let Some(body) = body {
            let scope = self.env.push_scope(
                Some(type_scope),
                ScopeOwner::Method { ty, index },
                self.unit,
                body,
                is_static,
            );
            for (param_ty, param_name, span) in params {
                self.env.declare_local(
                    scope,
                    LocalVar {
                        name: param_name,
                        ty: param_ty,
                        span,
                    },
                )?;
            }
            self.walk_block(scope, body)?;
        }
        Ok(())
    }

    fn build_constructor(
        &mut self,
        ty: TypeId,
        type_scope: ScopeId,
        node: NodeId,
    ) -> SemanticResult<()> {
        let tree = self.tree;
        let params = self.formal_params(node);
        let ctor = ConstructorDecl {
            modifiers: self.modifiers(node),
            param_types: params.iter().map(|(t, _, _)| t.clone()).collect(),
            span: tree.span(node),
            owner: ty,
        };

        let decl = self.env.type_decl_mut(ty);
        if decl.constructors.iter().any(|c| c.param_types == ctor.param_types) {
            return Err(SemanticError::at(
                "Overlapping constructor declaration in scope",
                tree.span(node),
            ));
        }
        let index = decl.constructors.len();
        decl.constructors.push(ctor);

        if let Some(body) = tree.child_by_field(node, "body") {
            let scope = self.env.push_scope(
                Some(type_scope),
                ScopeOwner::Constructor { ty, index },
                self.unit,
                body,
                false,
            );
            for (param_ty, param_name, span) in params {
                self.env.declare_local(
                    scope,
                    LocalVar {
                        name: param_name,
                        ty: param_ty,
                        span,
                    },
                )?;
            }
            self.walk_block(scope, body)?;
        }
        Ok(())
    }

    /// Declare locals and open nested scopes below a method or constructor
    /// body. Control-flow statements introduce their own scope; everything
    /// else is traversed in place.
    fn walk_block(&mut self, scope: ScopeId, node: NodeId) -> SemanticResult<()> {
        for child in self.tree.named_children(node).collect::<Vec<_>>() {
            match self.tree.kind(child) {
                "local_variable_declaration" => {
                    let ty = self
                        .tree
                        .child_by_field(child, "type")
                        .map(|t| self.text(t).to_string())
                        .unwrap_or_default();
                    if let Some(declarator) = self.tree.child_by_field(child, "declarator") {
                        if let Some(name) = self.tree.child_by_field(declarator, "name") {
                            self.env.declare_local(
                                scope,
                                LocalVar {
                                    name: self.text(name).to_string(),
                                    ty,
                                    span: self.tree.span(child),
                                },
                            )?;
                        }
                    }
                }
                "block" | "if_statement" | "while_statement" | "for_statement" => {
                    let owner = self.env.scope(scope).owner;
                    let is_static = self.env.scope(scope).is_static;
                    let nested =
                        self.env
                            .push_scope(Some(scope), owner, self.unit, child, is_static);
                    self.walk_block(nested, child)?;
                }
                _ => self.walk_block(scope, child)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::JavaParser;

    fn build(sources: &[(&str, &str)]) -> SemanticResult<GlobalEnv> {
        let mut env = GlobalEnv::new();
        let mut parser = JavaParser::new().unwrap();
        for (name, source) in sources {
            let tree = parser.parse(source).expect("test source must parse");
            build_unit(&mut env, PathBuf::from(name), source.to_string(), tree)?;
        }
        Ok(env)
    }

    #[test]
    fn declares_type_in_package() {
        let env = build(&[(
            "A.java",
            "package foo.bar; public class A { public A() {} }",
        )])
        .unwrap();
        let id = env.lookup("foo.bar.A").unwrap();
        assert_eq!(env.type_decl(id).simple_name(), "A");
        assert_eq!(env.packages.get("foo.bar").unwrap(), &vec![id]);
    }

    #[test]
    fn default_package_is_empty() {
        let env = build(&[("A.java", "public class A { public A() {} }")]).unwrap();
        assert!(env.lookup("A").is_some());
        assert!(env.packages.contains_key(""));
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let err = build(&[
            ("A.java", "public class A { public A() {} }"),
            ("A2.java", "class A { public A() {} }"),
        ])
        .unwrap_err();
        assert!(err.message.contains("Overlapping type"));
    }

    #[test]
    fn members_are_declared() {
        let env = build(&[(
            "A.java",
            "public class A { public A() {} public int f; public int m(int x) { return x; } }",
        )])
        .unwrap();
        let decl = env.type_decl(env.lookup("A").unwrap());
        assert_eq!(decl.fields.len(), 1);
        assert_eq!(decl.methods.len(), 1);
        assert_eq!(decl.constructors.len(), 1);
        assert_eq!(decl.methods[0].param_types, vec!["int"]);
    }

    #[test]
    fn interface_methods_are_implicitly_abstract() {
        let env = build(&[("I.java", "public interface I { public int m(); }")]).unwrap();
        let decl = env.type_decl(env.lookup("I").unwrap());
        assert!(decl.methods[0].modifiers.is_abstract());
    }

    #[test]
    fn implicit_object_superclass() {
        let env = build(&[("A.java", "public class A { public A() {} }")]).unwrap();
        let decl = env.type_decl(env.lookup("A").unwrap());
        assert_eq!(decl.extends, vec!["java.lang.Object"]);
    }

    #[test]
    fn explicit_superclass_suppresses_object() {
        let env = build(&[
            ("B.java", "public class B { public B() {} }"),
            ("A.java", "public class A extends B { public A() {} }"),
        ])
        .unwrap();
        let decl = env.type_decl(env.lookup("A").unwrap());
        assert_eq!(decl.extends, vec!["B"]);
    }

    #[test]
    fn local_shadowing_is_rejected() {
        let err = build(&[(
            "A.java",
            "public class A { public A() {} public void m(int x) { if (true) { int x = 1; } } }",
        )])
        .unwrap_err();
        assert!(err.message.contains("Overlapping local variable"));
    }

    #[test]
    fn sibling_scopes_may_reuse_names() {
        assert!(build(&[(
            "A.java",
            "public class A { public A() {} public void m() { if (true) { int x = 1; } if (true) { int x = 2; } } }",
        )])
        .is_ok());
    }

    #[test]
    fn type_names_are_enqueued() {
        let env = build(&[(
            "A.java",
            "public class A extends B { public A() {} public C f; public D m(E x) { F y = null; return null; } }",
        )])
        .unwrap();
        let decl = env.type_decl(env.lookup("A").unwrap());
        for name in ["B", "C", "D", "E", "F"] {
            assert!(decl.type_names.contains_key(name), "missing {name}");
        }
    }

    #[test]
    fn implicit_java_lang_import() {
        let env = build(&[("A.java", "public class A { public A() {} }")]).unwrap();
        let decl = env.type_decl(env.lookup("A").unwrap());
        assert_eq!(decl.imports[0], Import::OnDemand("java.lang".to_string()));
    }
}
