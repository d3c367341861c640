//! Lexical symbol table built while parsing.
//!
//! A scope-chain stack rather than a fixed local/global/builtin split, since
//! Flux blocks, functions, and namespaces each introduce their own scope at
//! arbitrary nesting depth.

use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
    Type,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub declared_in_scope: usize,
    /// Set by `declare()` for a name seen during the top-level pre-scan but
    /// not yet reached by the real parse. A later `define_global` for the
    /// same name upgrades the entry in place instead of being rejected as a
    /// redeclaration, so forward references between top-level declarations
    /// resolve regardless of source order.
    pub forward: bool,
}

#[derive(Debug, Default)]
struct Scope {
    symbols: IndexMap<String, Symbol>,
}

/// A chain of lexical scopes, innermost last. Scope 0 is always the global
/// scope and is never popped.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pops the innermost scope. Panics if called with only the global scope
    /// remaining; callers must balance every `enter_scope` with a matching
    /// `leave_scope` before this point is reached.
    pub fn leave_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the global scope");
        self.scopes.pop();
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    /// Declares `name` in the innermost scope. Returns `false` without
    /// overwriting the existing entry if `name` is already declared in this
    /// same scope.
    pub fn define(&mut self, name: impl Into<String>, kind: SymbolKind) -> bool {
        let depth = self.depth();
        let scope = self.scopes.last_mut().expect("at least the global scope exists");
        let name = name.into();
        if scope.symbols.contains_key(&name) {
            return false;
        }
        scope.symbols.insert(
            name.clone(),
            Symbol {
                name,
                kind,
                declared_in_scope: depth,
                forward: false,
            },
        );
        true
    }

    /// Defines `name` directly in the global scope regardless of current
    /// nesting depth, used for top-level function/class/struct declarations
    /// that must be visible before their own body is resolved. A forward
    /// entry left by `declare()` is upgraded in place rather than rejected.
    pub fn define_global(&mut self, name: impl Into<String>, kind: SymbolKind) -> bool {
        let scope = &mut self.scopes[0];
        let name = name.into();
        if let Some(existing) = scope.symbols.get(&name) {
            if !existing.forward {
                return false;
            }
        }
        scope.symbols.insert(
            name.clone(),
            Symbol {
                name,
                kind,
                declared_in_scope: 0,
                forward: false,
            },
        );
        true
    }

    /// Marks `name` as forward-declared in the global scope, so lookups
    /// during the real parse (e.g. `is_known_type_identifier`) succeed for a
    /// top-level type referenced before its own declaration is reached.
    /// Returns `false` if `name` is already declared (forward or not).
    pub fn declare(&mut self, name: impl Into<String>, kind: SymbolKind) -> bool {
        let scope = &mut self.scopes[0];
        let name = name.into();
        if scope.symbols.contains_key(&name) {
            return false;
        }
        scope.symbols.insert(
            name.clone(),
            Symbol {
                name,
                kind,
                declared_in_scope: 0,
                forward: true,
            },
        );
        true
    }

    /// Looks up `name` starting at the innermost scope and walking outward.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.symbols.get(name))
    }

    /// Looks up `name` only in the innermost scope, used to detect shadowing
    /// versus redeclaration.
    #[must_use]
    pub fn lookup_local(&self, name: &str) -> Option<&Symbol> {
        self.scopes.last().and_then(|scope| scope.symbols.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redeclaration_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        assert!(table.define("x", SymbolKind::Variable));
        assert!(!table.define("x", SymbolKind::Variable));
    }

    #[test]
    fn inner_scope_may_shadow_outer() {
        let mut table = SymbolTable::new();
        table.define("x", SymbolKind::Variable);
        table.enter_scope();
        assert!(table.define("x", SymbolKind::Variable));
        assert!(table.lookup_local("x").is_some());
        table.leave_scope();
        assert_eq!(table.lookup("x").unwrap().declared_in_scope, 0);
    }

    #[test]
    fn declare_then_define_global_upgrades_the_forward_entry() {
        let mut table = SymbolTable::new();
        assert!(table.declare("Node", SymbolKind::Type));
        assert!(table.lookup("Node").unwrap().forward);
        assert!(table.define_global("Node", SymbolKind::Type));
        assert!(!table.lookup("Node").unwrap().forward);
    }

    #[test]
    fn declare_does_not_overwrite_a_real_definition() {
        let mut table = SymbolTable::new();
        assert!(table.define_global("Node", SymbolKind::Type));
        assert!(!table.declare("Node", SymbolKind::Type));
    }

    #[test]
    fn redeclaring_a_forward_name_is_rejected() {
        let mut table = SymbolTable::new();
        assert!(table.declare("Node", SymbolKind::Type));
        assert!(!table.declare("Node", SymbolKind::Type));
    }

    #[test]
    fn lookup_walks_outward_through_scopes() {
        let mut table = SymbolTable::new();
        table.define("outer", SymbolKind::Variable);
        table.enter_scope();
        table.define("inner", SymbolKind::Variable);
        assert!(table.lookup("outer").is_some());
        assert!(table.lookup("inner").is_some());
        table.leave_scope();
        assert!(table.lookup("inner").is_none());
    }
}
