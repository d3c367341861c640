//! Resolved type descriptors and the interning registry used to compare and
//! unify them.
//!
//! The AST's `TypeExpr` (see `ast.rs`) is syntax: whatever the parser read
//! off the token stream, including unresolved `Named` references. A
//! `TypeDesc` is semantics: the registry resolves `Named` against declared
//! structs/classes/unions/typedefs and interns the result, so two
//! syntactically different spellings of the same type (a typedef alias and
//! its target) compare equal by `TypeDescId` rather than by comparing
//! `String`s directly.

use ahash::AHashMap;

use crate::arena::{Arena, Id};

pub type TypeDescId = Id<TypeDesc>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Void,
    Bool,
    Int { bits: u16, signed: bool },
    Float { bits: u16 },
    Char,
    String,
    Null,
    Pointer(TypeDescId),
    Array { element: TypeDescId, len: Option<u64> },
    Function { params: Vec<TypeDescId>, ret: TypeDescId },
    Struct(String),
    Class(String),
    Union(String),
    /// Placeholder for a type that failed to resolve; compatible with
    /// everything so a single bad reference does not cascade into a wall of
    /// spurious type errors.
    Unknown,
}

/// Interns `TypeDesc`s so that structurally identical types share one id.
pub struct TypeRegistry {
    arena: Arena<TypeDesc>,
    by_desc: AHashMap<TypeDesc, TypeDescId>,
    pub void: TypeDescId,
    pub bool_: TypeDescId,
    pub char_: TypeDescId,
    pub string: TypeDescId,
    pub null: TypeDescId,
    pub unknown: TypeDescId,
    pub int: TypeDescId,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        let mut arena = Arena::new();
        let mut by_desc = AHashMap::default();
        let mut intern = |arena: &mut Arena<TypeDesc>, desc: TypeDesc| -> TypeDescId {
            let id = arena.alloc(desc.clone());
            by_desc.insert(desc, id);
            id
        };
        let void = intern(&mut arena, TypeDesc::Void);
        let bool_ = intern(&mut arena, TypeDesc::Bool);
        let char_ = intern(&mut arena, TypeDesc::Char);
        let string = intern(&mut arena, TypeDesc::String);
        let null = intern(&mut arena, TypeDesc::Null);
        let unknown = intern(&mut arena, TypeDesc::Unknown);
        let int = intern(&mut arena, TypeDesc::Int { bits: 64, signed: true });
        Self {
            arena,
            by_desc,
            void,
            bool_,
            char_,
            string,
            null,
            unknown,
            int,
        }
    }
}

impl TypeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `desc`, interning a new slot only the first time a
    /// given structural shape is seen.
    pub fn intern(&mut self, desc: TypeDesc) -> TypeDescId {
        if let Some(&id) = self.by_desc.get(&desc) {
            return id;
        }
        let id = self.arena.alloc(desc.clone());
        self.by_desc.insert(desc, id);
        id
    }

    #[must_use]
    pub fn get(&self, id: TypeDescId) -> &TypeDesc {
        self.arena.get(id)
    }

    /// Structural compatibility for assignment/argument binding.
    /// `Unknown` is compatible with anything so one unresolved reference does
    /// not cascade into unrelated errors; integer widths widen implicitly,
    /// narrowing does not.
    #[must_use]
    pub fn are_compatible(&self, from: TypeDescId, to: TypeDescId) -> bool {
        if from == to {
            return true;
        }
        match (self.get(from), self.get(to)) {
            (TypeDesc::Unknown, _) | (_, TypeDesc::Unknown) => true,
            (TypeDesc::Null, TypeDesc::Pointer(_)) => true,
            (
                TypeDesc::Int { bits: fb, signed: fs },
                TypeDesc::Int { bits: tb, signed: ts },
            ) => fb <= tb && fs == ts,
            (TypeDesc::Int { .. }, TypeDesc::Float { .. }) => true,
            (TypeDesc::Float { bits: fb }, TypeDesc::Float { bits: tb }) => fb <= tb,
            _ => false,
        }
    }

    /// The widest type two operands must be promoted to for a binary
    /// arithmetic operation, or `None` if no common numeric type exists.
    #[must_use]
    pub fn common_type(&self, a: TypeDescId, b: TypeDescId) -> Option<TypeDescId> {
        if a == b {
            return Some(a);
        }
        match (self.get(a), self.get(b)) {
            (TypeDesc::Float { bits: ba }, TypeDesc::Float { bits: bb }) => {
                Some(if ba >= bb { a } else { b })
            }
            (TypeDesc::Float { .. }, TypeDesc::Int { .. }) => Some(a),
            (TypeDesc::Int { .. }, TypeDesc::Float { .. }) => Some(b),
            (
                TypeDesc::Int { bits: ba, signed: sa },
                TypeDesc::Int { bits: bb, signed: sb },
            ) if sa == sb => Some(if ba >= bb { a } else { b }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_structural_shapes_intern_to_the_same_id() {
        let mut registry = TypeRegistry::new();
        let a = registry.intern(TypeDesc::Int { bits: 32, signed: true });
        let b = registry.intern(TypeDesc::Int { bits: 32, signed: true });
        assert_eq!(a, b);
    }

    #[test]
    fn narrower_int_is_compatible_with_wider_int() {
        let mut registry = TypeRegistry::new();
        let i32_ = registry.intern(TypeDesc::Int { bits: 32, signed: true });
        let i64_ = registry.intern(TypeDesc::Int { bits: 64, signed: true });
        assert!(registry.are_compatible(i32_, i64_));
        assert!(!registry.are_compatible(i64_, i32_));
    }

    #[test]
    fn unknown_is_compatible_with_anything() {
        let mut registry = TypeRegistry::new();
        let bool_ = registry.bool_;
        assert!(registry.are_compatible(registry.unknown, bool_));
        assert!(registry.are_compatible(bool_, registry.unknown));
    }
}
