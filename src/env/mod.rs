//! Global environment: the symbol graph shared by every phase.
//!
//! Types live in an arena ([`GlobalEnv::types`]) and reference each other by
//! [`TypeId`]; lexical scopes form a second arena wired into a tree. Phases
//! augment the environment monotonically: the builder declares symbols, the
//! linker fills `type_names`, the hierarchy checker appends inherited
//! members, the disambiguator records name annotations, the type checker only
//! reads.

pub mod builder;
pub mod decls;

pub use decls::{
    ConstructorDecl, FieldDecl, Import, LocalVar, MethodDecl, TypeDecl, TypeKind,
};

use crate::disambig::NameTarget;
use crate::error::{SemanticError, SemanticResult};
use crate::syntax::SyntaxTree;
use crate::typeck::values::{Primitive, TypeValue};
use crate::types::{NodeId, ScopeId, TypeId, UnitId};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::PathBuf;

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct Unit {
    pub id: UnitId,
    pub path: PathBuf,
    pub source: String,
    pub tree: SyntaxTree,
}

/// The construct that introduced a scope. Nested blocks share their enclosing
/// method's owner, so every scope can name its enclosing type directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeOwner {
    Type(TypeId),
    Method { ty: TypeId, index: usize },
    Constructor { ty: TypeId, index: usize },
}

impl ScopeOwner {
    pub fn enclosing_type(self) -> TypeId {
        match self {
            Self::Type(ty) | Self::Method { ty, .. } | Self::Constructor { ty, .. } => ty,
        }
    }
}

/// A node in the scope tree. Resolution of locals falls back to the parent.
#[derive(Debug, Clone)]
pub struct Scope {
    pub id: ScopeId,
    pub parent: Option<ScopeId>,
    pub owner: ScopeOwner,
    pub vars: Vec<LocalVar>,
    pub children: Vec<ScopeId>,
    pub unit: UnitId,
    /// The syntax node this scope covers.
    pub node: NodeId,
    /// Inherited from the introducing construct (a static method's body and
    /// everything nested in it).
    pub is_static: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GlobalEnv {
    pub types: Vec<TypeDecl>,
    by_name: HashMap<String, TypeId>,
    /// Package name -> types declared in it, in declaration order.
    pub packages: IndexMap<String, Vec<TypeId>>,
    pub scopes: Vec<Scope>,
    pub units: Vec<Unit>,
    scope_of_node: HashMap<(UnitId, NodeId), ScopeId>,
    /// Name-disambiguation results, keyed by the chain's syntax node.
    pub annotations: HashMap<(UnitId, NodeId), NameTarget>,
}

impl GlobalEnv {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Units
    // ------------------------------------------------------------------

    pub fn add_unit(&mut self, path: PathBuf, source: String, tree: SyntaxTree) -> UnitId {
        let id = UnitId::from_index(self.units.len());
        self.units.push(Unit {
            id,
            path,
            source,
            tree,
        });
        id
    }

    pub fn unit(&self, id: UnitId) -> &Unit {
        &self.units[id.index()]
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    pub fn type_decl(&self, id: TypeId) -> &TypeDecl {
        &self.types[id.index()]
    }

    pub fn type_decl_mut(&mut self, id: TypeId) -> &mut TypeDecl {
        &mut self.types[id.index()]
    }

    /// Look up a type by canonical name.
    pub fn lookup(&self, canonical: &str) -> Option<TypeId> {
        self.by_name.get(canonical).copied()
    }

    pub fn type_ids(&self) -> impl Iterator<Item = TypeId> + use<> {
        (0..self.types.len()).map(TypeId::from_index)
    }

    pub fn declare_type(&mut self, mut decl: TypeDecl) -> SemanticResult<TypeId> {
        if self.by_name.contains_key(&decl.name) {
            return Err(SemanticError::at(
                format!("Overlapping type declaration in scope: {}", decl.name),
                decl.span,
            ));
        }
        let id = TypeId::from_index(self.types.len());
        decl.id = id;
        self.by_name.insert(decl.name.clone(), id);
        self.packages
            .entry(decl.package().to_string())
            .or_default()
            .push(id);
        self.types.push(decl);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Scopes
    // ------------------------------------------------------------------

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn push_scope(
        &mut self,
        parent: Option<ScopeId>,
        owner: ScopeOwner,
        unit: UnitId,
        node: NodeId,
        is_static: bool,
    ) -> ScopeId {
        let id = ScopeId::from_index(self.scopes.len());
        self.scopes.push(Scope {
            id,
            parent,
            owner,
            vars: Vec::new(),
            children: Vec::new(),
            unit,
            node,
            is_static,
        });
        if let Some(parent) = parent {
            self.scopes[parent.index()].children.push(id);
        }
        self.scope_of_node.insert((unit, node), id);
        id
    }

    /// The scope introduced by a given syntax node, if any.
    pub fn scope_at(&self, unit: UnitId, node: NodeId) -> Option<ScopeId> {
        self.scope_of_node.get(&(unit, node)).copied()
    }

    /// Declare a parameter or local variable. Fails when any scope between
    /// here and the enclosing type body already declares the name.
    pub fn declare_local(&mut self, scope: ScopeId, var: LocalVar) -> SemanticResult<()> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let s = self.scope(id);
            if let ScopeOwner::Type(_) = s.owner {
                break;
            }
            if s.vars.iter().any(|v| v.name == var.name) {
                return Err(SemanticError::at(
                    format!("Overlapping local variable in scope: {}", var.name),
                    var.span,
                ));
            }
            cursor = s.parent;
        }
        self.scopes[scope.index()].vars.push(var);
        Ok(())
    }

    /// Resolve a local variable or parameter, innermost scope first.
    pub fn resolve_local(&self, scope: ScopeId, name: &str) -> Option<&LocalVar> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let s = self.scope(id);
            if let Some(var) = s.vars.iter().find(|v| v.name == name) {
                return Some(var);
            }
            cursor = s.parent;
        }
        None
    }

    pub fn enclosing_type(&self, scope: ScopeId) -> TypeId {
        self.scope(scope).owner.enclosing_type()
    }

    pub fn enclosing_method(&self, scope: ScopeId) -> Option<&MethodDecl> {
        match self.scope(scope).owner {
            ScopeOwner::Method { ty, index } => Some(&self.type_decl(ty).methods[index]),
            _ => None,
        }
    }

    pub fn is_static_context(&self, scope: ScopeId) -> bool {
        self.scope(scope).is_static
    }

    // ------------------------------------------------------------------
    // Name resolution from the standpoint of a type
    // ------------------------------------------------------------------

    /// Resolve a textual type name as seen from inside `from`'s declaration.
    ///
    /// Primitives and array suffixes are handled structurally; everything
    /// else goes through the `type_names` table the linker filled. Canonical
    /// names produced by earlier resolutions (which never appeared textually
    /// in the declaration) fall back to the same-package, on-demand-import,
    /// and global lookups.
    pub fn resolve_name(&self, from: TypeId, name: &str) -> Option<TypeValue> {
        let name = name.trim();
        if let Some(p) = Primitive::from_name(name) {
            return Some(TypeValue::Primitive(p));
        }
        if let Some(elem) = name.strip_suffix("[]") {
            return self
                .resolve_name(from, elem)
                .map(|e| TypeValue::Array(Box::new(e)));
        }

        let decl = self.type_decl(from);
        if let Some(Some(id)) = decl.type_names.get(name) {
            return Some(TypeValue::Decl(*id));
        }

        if name.contains('.') {
            if let Some(id) = self.lookup(name) {
                return Some(TypeValue::Decl(id));
            }
        } else {
            if let Some(ids) = self.packages.get(decl.package()) {
                if let Some(&id) = ids
                    .iter()
                    .find(|&&id| self.type_decl(id).simple_name() == name)
                {
                    return Some(TypeValue::Decl(id));
                }
            }
            for import in &decl.imports {
                if let Import::OnDemand(pkg) = import {
                    if let Some(id) = self.lookup(&format!("{pkg}.{name}")) {
                        return Some(TypeValue::Decl(id));
                    }
                }
            }
        }

        self.lookup(name).map(TypeValue::Decl)
    }

    /// True when `ty` is `target` or a (transitive) subclass/subinterface of
    /// it, by canonical name. Assumes the hierarchy is acyclic.
    pub fn is_subclass_of(&self, ty: TypeId, target: &str) -> bool {
        if self.type_decl(ty).name == target {
            return true;
        }
        self.type_decl(ty).extends.iter().any(|parent| {
            matches!(self.resolve_name(ty, parent), Some(TypeValue::Decl(p))
                if self.type_decl(p).name == target || self.is_subclass_of(p, target))
        })
    }

    /// True when class `ty` implements `target` directly, through a
    /// superinterface, or through a superclass.
    pub fn implements_interface(&self, ty: TypeId, target: &str) -> bool {
        let decl = self.type_decl(ty);
        for name in &decl.implements {
            if let Some(TypeValue::Decl(i)) = self.resolve_name(ty, name) {
                if self.type_decl(i).name == target || self.is_subclass_of(i, target) {
                    return true;
                }
            }
        }
        decl.extends.iter().any(|parent| {
            matches!(self.resolve_name(ty, parent), Some(TypeValue::Decl(p))
                if self.implements_interface(p, target))
        })
    }

    // ------------------------------------------------------------------
    // Member lookup (access checks live in the type checker)
    // ------------------------------------------------------------------

    /// Find a field by simple name on `ty` or a supertype. After hierarchy
    /// checking, inherited fields are present in `ty`'s own list; the
    /// supertype walk covers lookups made during checking itself.
    pub fn find_field(&self, ty: TypeId, name: &str) -> Option<&FieldDecl> {
        if let Some(field) = self.type_decl(ty).declared_field(name) {
            return Some(field);
        }
        for parent in &self.type_decl(ty).extends {
            if let Some(TypeValue::Decl(p)) = self.resolve_name(ty, parent) {
                if let Some(field) = self.find_field(p, name) {
                    return Some(field);
                }
            }
        }
        None
    }

    /// Find a method whose name and resolved parameter type names match.
    pub fn find_method(&self, ty: TypeId, name: &str, arg_types: &[String]) -> Option<&MethodDecl> {
        if let Some(m) = self
            .type_decl(ty)
            .methods
            .iter()
            .find(|m| m.name == name && self.resolved_param_names(m) == arg_types)
        {
            return Some(m);
        }
        for parent in &self.type_decl(ty).extends {
            if let Some(TypeValue::Decl(p)) = self.resolve_name(ty, parent) {
                if let Some(m) = self.find_method(p, name, arg_types) {
                    return Some(m);
                }
            }
        }
        None
    }

    /// Canonical names of a method's parameter types, resolved from the
    /// declaring type's standpoint. Unresolvable names keep their raw
    /// spelling, which can never equal a canonical name.
    pub fn resolved_param_names(&self, method: &MethodDecl) -> Vec<String> {
        method
            .param_types
            .iter()
            .map(|raw| match self.resolve_name(method.owner, raw) {
                Some(value) => value.display_name(self),
                None => raw.clone(),
            })
            .collect()
    }

    /// A method's signature: name plus resolved parameter type names.
    pub fn method_signature(&self, method: &MethodDecl) -> String {
        format!(
            "{}^{}",
            method.name,
            self.resolved_param_names(method).join(",")
        )
    }
}
