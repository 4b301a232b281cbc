//! Declared symbols: types, fields, methods, constructors, locals.
//!
//! Type declarations live in an arena owned by the global environment and
//! reference each other through [`TypeId`]s; member declarations carry the id
//! of their declaring type so that access checks and signature resolution
//! keep working after hierarchy checking copies inherited members into
//! subtypes.

use crate::types::{Modifiers, NodeId, ScopeId, Span, TypeId, UnitId};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
}

impl TypeKind {
    pub fn describe(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Interface => "interface",
        }
    }
}

/// An import declaration of a compilation unit, in source order. Every unit
/// implicitly carries `OnDemand("java.lang")` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// `import a.b.C;` carrying the canonical name of one type.
    Single(String),
    /// `import a.b.*;` carrying a package name.
    OnDemand(String),
}

/// A class or interface declaration.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub id: TypeId,
    pub kind: TypeKind,
    /// Canonical dotted name, package included.
    pub name: String,
    pub modifiers: Modifiers,
    /// Textual supertype names as written (classes: 0-1 after the implicit
    /// `java.lang.Object` injection; interfaces: any number).
    pub extends: Vec<String>,
    /// Textual interface names; classes only.
    pub implements: Vec<String>,
    pub imports: Vec<Import>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub constructors: Vec<ConstructorDecl>,
    /// Every type name textually appearing in the declaration, mapped to its
    /// resolution. Enqueued with `None` by the environment builder, filled by
    /// the type linker.
    pub type_names: IndexMap<String, Option<TypeId>>,
    pub span: Span,
    pub unit: UnitId,
    pub decl_node: NodeId,
    /// Body scope, set by the environment builder.
    pub body_scope: Option<ScopeId>,
    /// Hierarchy-check memo: parents are fully checked before dependents.
    pub checked: bool,
}

impl TypeDecl {
    pub fn is_class(&self) -> bool {
        self.kind == TypeKind::Class
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn simple_name(&self) -> &str {
        crate::link::simple_name(&self.name)
    }

    pub fn package(&self) -> &str {
        crate::link::package_name(&self.name)
    }

    pub fn declared_field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub modifiers: Modifiers,
    /// Textual type as written (`int`, `Foo[]`, `java.lang.String`).
    pub ty: String,
    pub span: Span,
    /// Declaring type; unchanged when the field is inherited.
    pub owner: TypeId,
}

#[derive(Debug, Clone)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Modifiers,
    /// Textual parameter types as written.
    pub param_types: Vec<String>,
    /// Textual return type (`void` included).
    pub return_type: String,
    pub has_body: bool,
    pub span: Span,
    /// Declaring type; unchanged when the method is inherited.
    pub owner: TypeId,
}

impl MethodDecl {
    /// Identity within the declaring scope, before type linking: the literal
    /// parameter spelling distinguishes overloads.
    pub fn raw_signature(&self) -> String {
        format!("{}^{}", self.name, self.param_types.join(","))
    }
}

#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    pub modifiers: Modifiers,
    pub param_types: Vec<String>,
    pub span: Span,
    pub owner: TypeId,
}

/// A parameter or local variable, declared in its scope.
#[derive(Debug, Clone)]
pub struct LocalVar {
    pub name: String,
    pub ty: String,
    pub span: Span,
}
