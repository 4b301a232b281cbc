//! Hierarchy checking: phase 4.
//!
//! Verifies the inheritance rules for every type and extends the symbol
//! graph with inherited members. A memo flag on each declaration guarantees
//! that a supertype is fully checked (its own inherited members appended)
//! before any dependent type consults it. Cycle detection runs first: the
//! inheritance traversal assumes an acyclic extends/implements graph.

use crate::env::{FieldDecl, GlobalEnv, MethodDecl, TypeKind};
use crate::error::{SemanticError, SemanticResult};
use crate::link::simple_name;
use crate::typeck::values::TypeValue;
use crate::types::TypeId;
use std::collections::HashSet;
use tracing::debug;

pub fn hierarchy_check(env: &mut GlobalEnv) -> SemanticResult<()> {
    for ty in env.type_ids().collect::<Vec<_>>() {
        check_cycle(env, ty, &mut Vec::new())?;
    }
    for ty in env.type_ids().collect::<Vec<_>>() {
        check_type(env, ty)?;
    }
    Ok(())
}

fn check_type(env: &mut GlobalEnv, ty: TypeId) -> SemanticResult<()> {
    match env.type_decl(ty).kind {
        TypeKind::Class => class_hierarchy_check(env, ty)?,
        TypeKind::Interface => interface_hierarchy_check(env, ty)?,
    }
    check_declared_signatures(env, ty)?;
    check_repeated_parents(env, ty, &env.type_decl(ty).extends.clone())?;
    Ok(())
}

/// DFS over extends and implements, recording the visited path. Revisiting a
/// type already on the path is a cycle. Names that do not resolve to a
/// declared type are reported by the kind checks below, not here.
fn check_cycle(env: &GlobalEnv, ty: TypeId, path: &mut Vec<TypeId>) -> SemanticResult<()> {
    if path.contains(&ty) {
        let mut names: Vec<&str> = path.iter().map(|&t| env.type_decl(t).name.as_str()).collect();
        names.push(&env.type_decl(ty).name);
        return Err(SemanticError::new(format!(
            "Cyclic dependency found, path {}",
            names.join(" -> ")
        )));
    }

    path.push(ty);
    let decl = env.type_decl(ty);
    let parents: Vec<String> = decl
        .extends
        .iter()
        .chain(&decl.implements)
        .cloned()
        .collect();
    for parent in parents {
        if let Some(TypeValue::Decl(next)) = env.resolve_name(ty, &parent) {
            check_cycle(env, next, path)?;
        }
    }
    path.pop();
    Ok(())
}

fn class_hierarchy_check(env: &mut GlobalEnv, ty: TypeId) -> SemanticResult<()> {
    if env.type_decl(ty).checked {
        return Ok(());
    }
    debug!(name = %env.type_decl(ty).name, "hierarchy check (class)");

    resolve_method_return_types(env, ty)?;

    let name = env.type_decl(ty).name.clone();
    for extend in env.type_decl(ty).extends.clone() {
        if extend == simple_name(&name) {
            return Err(SemanticError::new(format!(
                "Class {name} cannot extend itself"
            )));
        }

        let parent = match env.resolve_name(ty, &extend) {
            Some(TypeValue::Decl(parent)) => parent,
            _ => {
                return Err(SemanticError::new(format!(
                    "Class {name} cannot extend class {extend} that does not exist"
                )));
            }
        };
        if env.type_decl(parent).is_interface() {
            return Err(SemanticError::new(format!(
                "Class {name} cannot extend an interface ({extend})"
            )));
        }

        // Parents inherit their own members first.
        class_hierarchy_check(env, parent)?;

        if env.type_decl(parent).modifiers.is_final() {
            return Err(SemanticError::new(format!(
                "Class {name} cannot extend a final class ({extend})"
            )));
        }

        let methods = inherit_methods(env, ty, parent)?;
        let fields = inherit_fields(env, ty, parent);
        let decl = env.type_decl_mut(ty);
        decl.methods.extend(methods);
        decl.fields.extend(fields);
    }

    for implement in env.type_decl(ty).implements.clone() {
        let parent = match env.resolve_name(ty, &implement) {
            Some(TypeValue::Decl(parent)) => parent,
            _ => {
                return Err(SemanticError::new(format!(
                    "Class {name} cannot implement interface {implement} that does not exist"
                )));
            }
        };
        if env.type_decl(parent).is_class() {
            return Err(SemanticError::new(format!(
                "Class {name} cannot implement a class ({implement})"
            )));
        }

        interface_hierarchy_check(env, parent)?;

        let methods = inherit_methods(env, ty, parent)?;
        let fields = inherit_fields(env, ty, parent);
        let decl = env.type_decl_mut(ty);
        decl.methods.extend(methods);
        decl.fields.extend(fields);
    }

    check_repeated_parents(env, ty, &env.type_decl(ty).implements.clone())?;
    env.type_decl_mut(ty).checked = true;
    Ok(())
}

fn interface_hierarchy_check(env: &mut GlobalEnv, ty: TypeId) -> SemanticResult<()> {
    if env.type_decl(ty).checked {
        return Ok(());
    }
    debug!(name = %env.type_decl(ty).name, "hierarchy check (interface)");

    resolve_method_return_types(env, ty)?;

    let name = env.type_decl(ty).name.clone();
    for extend in env.type_decl(ty).extends.clone() {
        if extend == simple_name(&name) {
            return Err(SemanticError::new(format!(
                "Interface {name} cannot extend itself"
            )));
        }

        let parent = match env.resolve_name(ty, &extend) {
            Some(TypeValue::Decl(parent)) => parent,
            _ => {
                return Err(SemanticError::new(format!(
                    "Interface {name} cannot extend interface {extend} that does not exist"
                )));
            }
        };
        if env.type_decl(parent).is_class() {
            return Err(SemanticError::new(format!(
                "Interface {name} cannot extend a class ({extend})"
            )));
        }

        interface_hierarchy_check(env, parent)?;

        let methods = inherit_methods(env, ty, parent)?;
        let fields = inherit_fields(env, ty, parent);
        let decl = env.type_decl_mut(ty);
        decl.methods.extend(methods);
        decl.fields.extend(fields);
    }

    // Interfaces do not extend Object, but they implicitly declare the
    // signatures of Object's public methods: the replacement rules must hold,
    // though nothing is added to the interface's own method list.
    let object = match env.resolve_name(ty, "Object") {
        Some(TypeValue::Decl(object)) => object,
        _ => {
            return Err(SemanticError::new(
                "java.lang.Object is not declared in the environment",
            ));
        }
    };
    if object != ty {
        class_hierarchy_check(env, object)?;
        inherit_methods(env, ty, object)?;
    }

    check_repeated_parents(env, ty, &env.type_decl(ty).extends.clone())?;
    env.type_decl_mut(ty).checked = true;
    Ok(())
}

/// Every declared method's return type must resolve from the declaring
/// type's standpoint.
fn resolve_method_return_types(env: &GlobalEnv, ty: TypeId) -> SemanticResult<()> {
    for method in &env.type_decl(ty).methods {
        if env.resolve_name(ty, &method.return_type).is_none() {
            return Err(SemanticError::at(
                format!(
                    "Return type {} of method {} does not resolve to any existing type",
                    method.return_type, method.name
                ),
                method.span,
            ));
        }
    }
    Ok(())
}

fn return_type_name(env: &GlobalEnv, method: &MethodDecl) -> String {
    match env.resolve_name(method.owner, &method.return_type) {
        Some(value) => value.display_name(env),
        None => method.return_type.clone(),
    }
}

/// For every method of the supertype, either a same-signature method of `ty`
/// replaces it (subject to the replacement constraints) or it is inherited.
/// Returns the methods to inherit.
fn inherit_methods(
    env: &GlobalEnv,
    ty: TypeId,
    parent: TypeId,
) -> SemanticResult<Vec<MethodDecl>> {
    let decl = env.type_decl(ty);
    let name = &decl.name;
    let own_signatures: Vec<String> = decl
        .methods
        .iter()
        .map(|m| env.method_signature(m))
        .collect();

    let mut inherited = Vec::new();
    for method in &env.type_decl(parent).methods {
        let signature = env.method_signature(method);
        let replacing = own_signatures
            .iter()
            .position(|s| *s == signature)
            .map(|i| &decl.methods[i]);

        match replacing {
            Some(replacing) => {
                if return_type_name(env, replacing) != return_type_name(env, method) {
                    return Err(SemanticError::new(format!(
                        "Class/interface {name} cannot replace method with signature \
                         {signature} with differing return types"
                    )));
                }
                if replacing.modifiers.is_static() != method.modifiers.is_static() {
                    return Err(SemanticError::new(format!(
                        "Class/interface {name} cannot replace method with signature \
                         {signature} with differing static-ness"
                    )));
                }
                if replacing.modifiers.is_protected() && method.modifiers.is_public() {
                    return Err(SemanticError::new(format!(
                        "Class/interface {name} cannot replace public method with signature \
                         {signature} with a protected method"
                    )));
                }
                if method.modifiers.is_final() {
                    return Err(SemanticError::new(format!(
                        "Class/interface {name} cannot replace final method with signature \
                         {signature}"
                    )));
                }
            }
            None => {
                if decl.is_class()
                    && method.modifiers.is_abstract()
                    && !decl.modifiers.is_abstract()
                {
                    return Err(SemanticError::new(format!(
                        "Non-abstract class {name} cannot inherit abstract method with \
                         signature {signature} without implementing it"
                    )));
                }
                inherited.push(method.clone());
            }
        }
    }
    Ok(inherited)
}

/// Fields of the supertype whose simple name `ty` does not redeclare.
fn inherit_fields(env: &GlobalEnv, ty: TypeId, parent: TypeId) -> Vec<FieldDecl> {
    let decl = env.type_decl(ty);
    env.type_decl(parent)
        .fields
        .iter()
        .filter(|inherited| !decl.fields.iter().any(|own| own.name == inherited.name))
        .cloned()
        .collect()
}

/// No two methods in the final method set may share a signature.
fn check_declared_signatures(env: &GlobalEnv, ty: TypeId) -> SemanticResult<()> {
    let decl = env.type_decl(ty);
    let signatures: Vec<String> = decl
        .methods
        .iter()
        .map(|m| env.method_signature(m))
        .collect();
    for (i, signature) in signatures.iter().enumerate() {
        if signatures[i + 1..].contains(signature) {
            return Err(SemanticError::new(format!(
                "Class/interface {} cannot declare two methods with the same signature: \
                 {signature}",
                decl.name
            )));
        }
    }
    Ok(())
}

/// A type may not name the same parent twice (after canonicalization).
fn check_repeated_parents(env: &GlobalEnv, ty: TypeId, parents: &[String]) -> SemanticResult<()> {
    let mut seen = HashSet::new();
    for parent in parents {
        let canonical = match env.resolve_name(ty, parent) {
            Some(value) => value.display_name(env),
            None => parent.clone(),
        };
        if !seen.insert(canonical) {
            return Err(SemanticError::new(format!(
                "Class/interface {} cannot inherit a class/interface more than once",
                env.type_decl(ty).name
            )));
        }
    }
    Ok(())
}

/// Re-running the phase on a checked environment is a no-op; used by tests to
/// verify idempotence.
pub fn is_checked(env: &GlobalEnv) -> bool {
    env.types.iter().all(|t| t.checked)
}
