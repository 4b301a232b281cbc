//! Type linking: phase 3.
//!
//! Resolves every textual type name recorded by the environment builder to a
//! declared type. Resolution order inside a type `T`: `T`'s own simple name,
//! single-type imports, other types in `T`'s package, on-demand imports
//! (the implicit `java.lang.*` included).
//!
//! Terminology: a "canonical name" (or "qualified name") is the full dotted
//! name including the package (`foo.bar.Baz`); the "simple name" is its last
//! identifier (`Baz`).

use crate::env::{GlobalEnv, Import};
use crate::error::{SemanticError, SemanticResult};
use crate::types::TypeId;
use tracing::debug;

pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

pub fn package_name(qualified: &str) -> &str {
    match qualified.rfind('.') {
        Some(i) => &qualified[..i],
        None => "",
    }
}

/// All dotted prefixes of a name, shortest first, the name itself included.
pub fn prefixes(qualified: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    for part in qualified.split('.') {
        if !current.is_empty() {
            current.push('.');
        }
        current.push_str(part);
        result.push(current.clone());
    }
    result
}

/// Runs once over all type declarations in the global environment.
pub fn type_link(env: &mut GlobalEnv) -> SemanticResult<()> {
    for ty in env.type_ids().collect::<Vec<_>>() {
        link_type(env, ty)?;
    }

    // No package name or prefix of one may resolve to a type, except for
    // types in the default, unnamed package (the single-identifier prefix is
    // exempt for exactly that reason).
    for package in env.packages.keys() {
        for prefix in prefixes(package).into_iter().skip(1) {
            if env.lookup(&prefix).is_some() {
                return Err(SemanticError::new(format!(
                    "Prefix {prefix} of package {package} resolves to a type in the same environment"
                )));
            }
        }
    }
    Ok(())
}

fn link_type(env: &mut GlobalEnv, ty: TypeId) -> SemanticResult<()> {
    let canonical = env.type_decl(ty).name.clone();
    let imports = env.type_decl(ty).imports.clone();
    debug!(name = %canonical, "linking type");

    // The type's own simple name resolves to itself, and every type of the
    // same package is importable by simple name.
    let own_simple = simple_name(&canonical).to_string();
    env.type_decl_mut(ty)
        .type_names
        .insert(own_simple, Some(ty));
    if let Some(ids) = env.packages.get(package_name(&canonical)) {
        let same_package: Vec<(String, TypeId)> = ids
            .iter()
            .map(|&other| (env.type_decl(other).simple_name().to_string(), other))
            .collect();
        for (name, other) in same_package {
            env.type_decl_mut(ty).type_names.insert(name, Some(other));
        }
    }

    for import in &imports {
        match import {
            Import::Single(name) => {
                // A single-type import may not clash with the type declared
                // in this file, though a type can import itself.
                if *name != canonical && simple_name(name) == simple_name(&canonical) {
                    return Err(SemanticError::new(format!(
                        "Type {canonical} clashes with import declaration {name}"
                    )));
                }
                // Nor with another single-type import, duplicates excepted.
                for other in &imports {
                    if let Import::Single(other_name) = other {
                        if simple_name(other_name) == simple_name(name) && other_name != name {
                            return Err(SemanticError::new(format!(
                                "Import {name} clashes with {other_name}"
                            )));
                        }
                    }
                }
                let Some(target) = env.lookup(name) else {
                    return Err(SemanticError::new(format!(
                        "Import {name} does not resolve to any existing type"
                    )));
                };
                env.type_decl_mut(ty)
                    .type_names
                    .insert(simple_name(name).to_string(), Some(target));
            }
            Import::OnDemand(package) => {
                // Must name a declared package or a prefix of one.
                let dotted = format!("{package}.");
                let exists = env
                    .packages
                    .keys()
                    .any(|p| p == package || p.starts_with(&dotted));
                if !exists {
                    return Err(SemanticError::new(format!(
                        "Imported package {package} does not exist as either a package \
                         declaration or a prefix of a package declaration"
                    )));
                }
            }
        }
    }

    // Resolve what the imports and package didn't already cover.
    let pending: Vec<String> = env
        .type_decl(ty)
        .type_names
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(k, _)| k.clone())
        .collect();
    for name in pending {
        resolve_type(env, ty, &name)?;
    }

    let names: Vec<String> = env.type_decl(ty).type_names.keys().cloned().collect();
    for name in &names {
        check_type_clashes(env, ty, name)?;
    }
    Ok(())
}

/// Resolve one textual type name into `ty`'s `type_names` table.
pub fn resolve_type(env: &mut GlobalEnv, ty: TypeId, name: &str) -> SemanticResult<()> {
    debug!(%name, "resolving type name");

    if name.contains('.') {
        let Some(target) = env.lookup(name) else {
            return Err(SemanticError::new(format!(
                "Fully qualified type {name} does not resolve to any existing type"
            )));
        };
        env.type_decl_mut(ty)
            .type_names
            .insert(name.to_string(), Some(target));
        return Ok(());
    }

    // Simple names left over here can only come from on-demand imports; a
    // simple name reachable through two of them must agree.
    let imports = env.type_decl(ty).imports.clone();
    let mut found = false;
    for import in imports {
        let Import::OnDemand(package) = import else {
            continue;
        };
        if let Some(target) = env.lookup(&format!("{package}.{name}")) {
            let existing = env.type_decl(ty).type_names.get(name).copied().flatten();
            if let Some(existing) = existing {
                if existing != target {
                    return Err(SemanticError::new(format!(
                        "Simple type {name} resolves ambiguously through on demand imports \
                         (conflicting resolutions: {}, {})",
                        env.type_decl(existing).name,
                        env.type_decl(target).name
                    )));
                }
            }
            env.type_decl_mut(ty)
                .type_names
                .insert(name.to_string(), Some(target));
            found = true;
        }
    }

    if !found {
        return Err(SemanticError::new(format!(
            "Simple type {name} does not resolve to any existing type"
        )));
    }
    Ok(())
}

/// When a fully qualified name resolves to a type, no strict prefix of it may
/// resolve to a type in the same environment.
fn check_type_clashes(env: &GlobalEnv, ty: TypeId, name: &str) -> SemanticResult<()> {
    if !name.contains('.') {
        return Ok(());
    }
    let all = prefixes(name);
    for prefix in &all[..all.len() - 1] {
        if env
            .type_decl(ty)
            .type_names
            .get(prefix)
            .copied()
            .flatten()
            .is_some()
        {
            return Err(SemanticError::new(format!(
                "Prefix {prefix} of fully qualified type {name} resolves to a type in the \
                 same environment"
            )));
        }
    }
    Ok(())
}
