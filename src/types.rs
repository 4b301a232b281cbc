use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Source position, 1-based line and column.
///
/// Ordering is (line, column), which is what the forward-reference check in
/// field initializers compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(NonZeroU32);

        impl $name {
            pub fn new(value: u32) -> Option<Self> {
                NonZeroU32::new(value).map(Self)
            }

            /// Id for index `i` of the owning arena.
            pub fn from_index(i: usize) -> Self {
                Self(NonZeroU32::new(i as u32 + 1).expect("arena index overflow"))
            }

            pub fn index(self) -> usize {
                self.0.get() as usize - 1
            }

            pub fn value(self) -> u32 {
                self.0.get()
            }
        }
    };
}

arena_id! {
    /// A type declaration in the global environment's arena.
    TypeId
}
arena_id! {
    /// A scope in the global environment's scope tree.
    ScopeId
}
arena_id! {
    /// A parsed compilation unit (one source file).
    UnitId
}
arena_id! {
    /// A node in a unit's syntax-tree arena.
    NodeId
}

bitflags::bitflags! {
    /// Declaration modifiers. Joos admits a subset of Java's.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const PUBLIC    = 1 << 0;
        const PROTECTED = 1 << 1;
        const STATIC    = 1 << 2;
        const ABSTRACT  = 1 << 3;
        const FINAL     = 1 << 4;
        const NATIVE    = 1 << 5;
    }
}

impl Modifiers {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "public" => Some(Self::PUBLIC),
            "protected" => Some(Self::PROTECTED),
            "static" => Some(Self::STATIC),
            "abstract" => Some(Self::ABSTRACT),
            "final" => Some(Self::FINAL),
            "native" => Some(Self::NATIVE),
            _ => None,
        }
    }

    pub fn is_public(self) -> bool {
        self.contains(Self::PUBLIC)
    }

    pub fn is_protected(self) -> bool {
        self.contains(Self::PROTECTED)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Self::ABSTRACT)
    }

    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }

    pub fn is_native(self) -> bool {
        self.contains(Self::NATIVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_ids_round_trip_indices() {
        let id = TypeId::from_index(0);
        assert_eq!(id.index(), 0);
        assert_eq!(id.value(), 1);

        let id = ScopeId::from_index(41);
        assert_eq!(id.index(), 41);
        assert_eq!(id.value(), 42);
    }

    #[test]
    fn zero_id_is_rejected() {
        assert!(NodeId::new(0).is_none());
        assert!(UnitId::new(7).is_some());
    }

    #[test]
    fn span_orders_by_line_then_column() {
        assert!(Span::new(3, 40) < Span::new(4, 1));
        assert!(Span::new(4, 1) < Span::new(4, 2));
        assert_eq!(Span::new(2, 2), Span::new(2, 2));
    }

    #[test]
    fn modifier_keywords() {
        assert_eq!(Modifiers::from_keyword("public"), Some(Modifiers::PUBLIC));
        assert_eq!(Modifiers::from_keyword("native"), Some(Modifiers::NATIVE));
        assert_eq!(Modifiers::from_keyword("volatile"), None);

        let m = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
        assert!(m.is_public() && m.is_static() && m.is_final());
        assert!(!m.is_abstract());
    }
}
