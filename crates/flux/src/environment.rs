//! Lexical environment chain.
//!
//! Each binding lives in its own `Rc<RefCell<Value>>` cell rather than a
//! plain map slot, so `&x` (`AddressOf`) can hand out a `Pointer` that
//! aliases the same storage `env.get("x")` reads — exactly the "cell
//! handle" `get_reference` is specified to return.

use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashMap;

use crate::value::Value;

type Cell = Rc<RefCell<Value>>;

#[derive(Debug)]
struct Frame {
    bindings: AHashMap<String, Cell>,
    parent: Option<Environment>,
}

/// A cheaply-`Clone`able handle to a frame. Closures capture the handle
/// current at definition time; cloning shares the frame, it
/// does not copy bindings.
#[derive(Debug, Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    #[must_use]
    pub fn root() -> Self {
        Self(Rc::new(RefCell::new(Frame { bindings: AHashMap::default(), parent: None })))
    }

    #[must_use]
    pub fn child(&self) -> Self {
        Self(Rc::new(RefCell::new(Frame { bindings: AHashMap::default(), parent: Some(self.clone()) })))
    }

    /// Writes into the current frame unconditionally, shadowing any binding
    /// of the same name visible from an outer frame.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().bindings.insert(name.into(), Rc::new(RefCell::new(value)));
    }

    /// Walks the chain and mutates the nearest binding. Returns `false` if
    /// `name` is bound nowhere in the chain (*UndefinedName*).
    pub fn assign(&self, name: &str, value: Value) -> bool {
        match self.get_reference(name) {
            Some(cell) => {
                *cell.borrow_mut() = value;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.get_reference(name).map(|cell| cell.borrow().clone())
    }

    /// Returns the shared cell a name is bound to, used by `&` and by
    /// mutating compound assignments.
    #[must_use]
    pub fn get_reference(&self, name: &str) -> Option<Cell> {
        let frame = self.0.borrow();
        if let Some(cell) = frame.bindings.get(name) {
            return Some(Rc::clone(cell));
        }
        frame.parent.as_ref().and_then(|p| p.get_reference(name))
    }

    /// Binds an existing cell directly, used to alias `this` or to splice a
    /// pointer's target back into a fresh frame without copying the value.
    pub fn define_cell(&self, name: impl Into<String>, cell: Cell) {
        self.0.borrow_mut().bindings.insert(name.into(), cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_scope_sees_parent_bindings() {
        let root = Environment::root();
        root.define("x", Value::int(10));
        let child = root.child();
        assert_eq!(child.get("x").unwrap().to_string(), "10");
    }

    #[test]
    fn assign_mutates_the_outer_binding() {
        let root = Environment::root();
        root.define("x", Value::int(1));
        let child = root.child();
        assert!(child.assign("x", Value::int(2)));
        assert_eq!(root.get("x").unwrap().to_string(), "2");
    }

    #[test]
    fn undefined_name_is_reported_not_panicked() {
        let root = Environment::root();
        assert!(!root.assign("missing", Value::Nil));
        assert!(root.get("missing").is_none());
    }

    #[test]
    fn pointer_cell_aliases_the_binding() {
        let root = Environment::root();
        root.define("x", Value::int(10));
        let cell = root.get_reference("x").unwrap();
        *cell.borrow_mut() = Value::int(99);
        assert_eq!(root.get("x").unwrap().to_string(), "99");
    }
}
