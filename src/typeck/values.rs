//! Type values and the assignability/castability relations.
//!
//! Every expression is assigned a [`TypeValue`]: a primitive, a reference to
//! a declared class or interface, an array, or the null type. The conversion
//! tables carry the full Java primitive set; only `byte`, `short`, `int` and
//! `char` are reachable from Joos source, the remaining rows are exercised by
//! the unit tests alone.

use crate::env::GlobalEnv;
use crate::types::TypeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
    Boolean,
    Void,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "byte" => Some(Self::Byte),
            "short" => Some(Self::Short),
            "int" => Some(Self::Int),
            "long" => Some(Self::Long),
            "char" => Some(Self::Char),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            "boolean" => Some(Self::Boolean),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Char => "char",
            Self::Float => "float",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::Void => "void",
        }
    }

    /// The numeric types of the analyzed dialect.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Char)
    }

    /// Widening primitive conversion.
    pub fn widens_to(self, target: Self) -> bool {
        use Primitive::*;
        match self {
            Byte => matches!(target, Short | Int | Long | Float | Double),
            Short => matches!(target, Int | Long | Float | Double),
            Char => matches!(target, Int | Long | Float | Double),
            Int => matches!(target, Long | Float | Double),
            Long => matches!(target, Float | Double),
            Float => matches!(target, Double),
            Double | Boolean | Void => false,
        }
    }

    /// Narrowing primitive conversion (castable, not assignable).
    pub fn narrows_to(self, target: Self) -> bool {
        use Primitive::*;
        match self {
            Byte => matches!(target, Char),
            Short => matches!(target, Byte | Char),
            Char => matches!(target, Byte | Short),
            Int => matches!(target, Byte | Short | Char),
            Long => matches!(target, Byte | Short | Char | Int),
            Float => matches!(target, Byte | Short | Char | Int | Long),
            Double => matches!(target, Byte | Short | Char | Int | Long | Float),
            Boolean | Void => false,
        }
    }
}

/// The type of an expression or the resolution of a textual type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeValue {
    Primitive(Primitive),
    /// A declared class or interface.
    Decl(TypeId),
    /// An array; the box holds the element type.
    Array(Box<TypeValue>),
    /// The type of the `null` literal.
    Null,
}

impl TypeValue {
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Primitive(p) if p.is_numeric())
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Boolean))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Void))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Decl(_) | Self::Array(_) | Self::Null)
    }

    pub fn decl_id(&self) -> Option<TypeId> {
        match self {
            Self::Decl(id) => Some(*id),
            _ => None,
        }
    }

    /// Canonical display name: `int`, `java.lang.String`, `int[]`, `null`.
    pub fn display_name(&self, env: &GlobalEnv) -> String {
        match self {
            Self::Primitive(p) => p.name().to_string(),
            Self::Decl(id) => env.type_decl(*id).name.clone(),
            Self::Array(elem) => format!("{}[]", elem.display_name(env)),
            Self::Null => "null".to_string(),
        }
    }
}

/// Returns true if a value of type `s` may be stored into a variable of type
/// `t` without an explicit cast.
pub fn assignable(env: &GlobalEnv, s: &TypeValue, t: &TypeValue) -> bool {
    if s == t {
        return true;
    }

    if s.is_primitive() != t.is_primitive() {
        return false;
    }

    if let (TypeValue::Primitive(sp), TypeValue::Primitive(tp)) = (s, t) {
        return sp.widens_to(*tp);
    }

    // Both reference types from here on.
    if matches!(t, TypeValue::Decl(id) if env.type_decl(*id).name == "java.lang.Object") {
        return true;
    }
    if matches!(s, TypeValue::Null) {
        return true;
    }
    if matches!(t, TypeValue::Null) {
        return false;
    }

    match (s, t) {
        (TypeValue::Array(_), TypeValue::Decl(tid)) => {
            let target = env.type_decl(*tid);
            target.is_interface()
                && (target.name == "java.lang.Cloneable" || target.name == "java.io.Serializable")
        }
        (TypeValue::Array(selem), TypeValue::Array(telem)) => {
            if selem.is_primitive() && telem.is_primitive() {
                selem == telem
            } else if selem.is_reference() && telem.is_reference() {
                assignable(env, selem, telem)
            } else {
                false
            }
        }
        (TypeValue::Decl(sid), TypeValue::Decl(tid)) => {
            let source = env.type_decl(*sid);
            let target = env.type_decl(*tid);
            match (source.kind, target.kind) {
                (crate::env::TypeKind::Class, crate::env::TypeKind::Class) => {
                    env.is_subclass_of(*sid, &target.name)
                }
                (crate::env::TypeKind::Class, crate::env::TypeKind::Interface) => {
                    env.implements_interface(*sid, &target.name)
                }
                (crate::env::TypeKind::Interface, crate::env::TypeKind::Interface) => {
                    env.is_subclass_of(*sid, &target.name)
                }
                (crate::env::TypeKind::Interface, crate::env::TypeKind::Class) => false,
            }
        }
        _ => false,
    }
}

/// Returns true if an explicit cast from `s` to `t` is permitted.
pub fn castable(env: &GlobalEnv, s: &TypeValue, t: &TypeValue) -> bool {
    if s == t {
        return true;
    }

    if s.is_primitive() != t.is_primitive() {
        return false;
    }

    if let (TypeValue::Primitive(sp), TypeValue::Primitive(tp)) = (s, t) {
        return sp.widens_to(*tp) || sp.narrows_to(*tp);
    }

    if assignable(env, s, t) || assignable(env, t, s) {
        return true;
    }

    // A cast between an interface and another interface or a non-final class
    // may succeed at runtime, in either direction.
    for (a, b) in [(s, t), (t, s)] {
        if let (Some(aid), Some(bid)) = (a.decl_id(), b.decl_id()) {
            let a_decl = env.type_decl(aid);
            let b_decl = env.type_decl(bid);
            if a_decl.is_interface()
                && (b_decl.is_interface() || (b_decl.is_class() && !b_decl.modifiers.is_final()))
            {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_table() {
        use Primitive::*;
        assert!(Byte.widens_to(Short));
        assert!(Byte.widens_to(Double));
        assert!(Short.widens_to(Int));
        assert!(Char.widens_to(Int));
        assert!(Int.widens_to(Long));
        assert!(Long.widens_to(Float));
        assert!(Float.widens_to(Double));

        assert!(!Short.widens_to(Byte));
        assert!(!Short.widens_to(Char));
        assert!(!Char.widens_to(Short));
        assert!(!Int.widens_to(Char));
        assert!(!Boolean.widens_to(Int));
        assert!(!Double.widens_to(Float));
    }

    #[test]
    fn narrowing_table() {
        use Primitive::*;
        assert!(Byte.narrows_to(Char));
        assert!(Short.narrows_to(Byte));
        assert!(Short.narrows_to(Char));
        assert!(Char.narrows_to(Byte));
        assert!(Char.narrows_to(Short));
        assert!(Int.narrows_to(Byte));
        assert!(Long.narrows_to(Int));
        assert!(Float.narrows_to(Long));
        assert!(Double.narrows_to(Float));

        assert!(!Byte.narrows_to(Short)); // widening, not narrowing
        assert!(!Int.narrows_to(Long));
        assert!(!Boolean.narrows_to(Int));
    }

    #[test]
    fn primitive_assignability_is_reflexive_and_antisymmetric() {
        use Primitive::*;
        let env = GlobalEnv::new();
        for p in [Byte, Short, Int, Char, Boolean] {
            let v = TypeValue::Primitive(p);
            assert!(assignable(&env, &v, &v));
        }
        // Distinct Joos primitives never widen in both directions.
        for a in [Byte, Short, Int, Char, Boolean] {
            for b in [Byte, Short, Int, Char, Boolean] {
                if a != b {
                    assert!(!(a.widens_to(b) && b.widens_to(a)), "{a:?} <-> {b:?}");
                }
            }
        }
    }

    #[test]
    fn primitive_array_elements_must_match_exactly() {
        let env = GlobalEnv::new();
        let ints = TypeValue::Array(Box::new(TypeValue::Primitive(Primitive::Int)));
        let shorts = TypeValue::Array(Box::new(TypeValue::Primitive(Primitive::Short)));
        assert!(assignable(&env, &ints, &ints));
        assert!(!assignable(&env, &shorts, &ints));
        assert!(!assignable(&env, &ints, &shorts));
    }

    #[test]
    fn null_assigns_to_nothing_primitive() {
        let env = GlobalEnv::new();
        assert!(!assignable(
            &env,
            &TypeValue::Null,
            &TypeValue::Primitive(Primitive::Int)
        ));
        assert!(castable(&env, &TypeValue::Null, &TypeValue::Null));
    }

    #[test]
    fn primitive_casts_allow_narrowing() {
        let env = GlobalEnv::new();
        let int = TypeValue::Primitive(Primitive::Int);
        let byte = TypeValue::Primitive(Primitive::Byte);
        assert!(castable(&env, &int, &byte));
        assert!(!assignable(&env, &int, &byte));
        assert!(assignable(&env, &byte, &int));
    }
}
