//! Runtime values.
//!
//! Shared variants go straight into `Rc<RefCell<_>>` cells — simple
//! reference counting rather than a garbage-collected object graph, which
//! is all a single-threaded tree-walker with no snapshot/fork requirement
//! needs.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::ast::{DeclId, ExprId};
use crate::diagnostics::DiagnosticKind;
use crate::environment::Environment;
use crate::source::SourceRange;

/// A fixed set of operator-overload hooks a `Class` may implement, consulted
/// before the native fallback. Plain bools rather than a bitflags
/// dependency: nine named fields read at least as clearly as a flag set
/// this small.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub init: bool,
    pub exit: bool,
    pub add: bool,
    pub sub: bool,
    pub mul: bool,
    pub div: bool,
    pub eq: bool,
    pub lt: bool,
    pub expr: bool,
}

#[derive(Debug)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<Rc<ClassDef>>,
    pub field_defaults: Vec<(String, Option<ExprId>)>,
    pub methods: AHashMap<String, DeclId>,
    pub nested_objects: AHashMap<String, Rc<ObjectDef>>,
    pub capabilities: Capabilities,
}

impl ClassDef {
    /// Resolves a method by name, consulting this class, then its nested
    /// object namespaces, then the parent chain.
    #[must_use]
    pub fn resolve_method(&self, name: &str) -> Option<DeclId> {
        if let Some(&id) = self.methods.get(name) {
            return Some(id);
        }
        for obj in self.nested_objects.values() {
            if let Some(&id) = obj.methods.get(name) {
                return Some(id);
            }
        }
        self.parent.as_ref().and_then(|p| p.resolve_method(name))
    }

    /// Whether `name` is a nested-object qualifier on this class or one it
    /// inherits, consulted when validating `Class.Name` member access.
    #[must_use]
    pub fn has_nested_object(&self, name: &str) -> bool {
        self.nested_objects.contains_key(name) || self.parent.as_ref().is_some_and(|p| p.has_nested_object(name))
    }
}

#[derive(Debug)]
pub struct ObjectDef {
    pub name: String,
    pub overrides: Option<Vec<String>>,
    pub methods: AHashMap<String, DeclId>,
}

#[derive(Debug)]
pub struct StructDef {
    pub name: String,
    pub field_names: Vec<String>,
}

#[derive(Debug)]
pub struct ObjectInstance {
    pub class: Rc<ClassDef>,
    pub fields: RefCell<AHashMap<String, Value>>,
    /// Set once `__exit` has run so scope-exit cleanup never double-fires.
    pub exited: RefCell<bool>,
}

#[derive(Debug)]
pub struct StructInstance {
    pub def: Rc<StructDef>,
    pub fields: RefCell<AHashMap<String, Value>>,
}

/// A user-defined function's code plus the environment frame it closed over.
#[derive(Debug)]
pub struct Closure {
    pub decl: DeclId,
    pub captured_env: Environment,
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int { value: i64, bits: u16, signed: bool },
    Float { value: f64, bits: u16 },
    Char(char),
    String(Rc<RefCell<String>>),
    Array(Rc<RefCell<Vec<Value>>>),
    Pointer(Rc<RefCell<Value>>),
    Function(Rc<Closure>),
    /// A host/builtin callable, named rather than boxed as a closure so the
    /// evaluator (which already owns the `io`/`resource` seams) supplies the
    /// implementation; see `intrinsics.rs`.
    Intrinsic(Rc<str>),
    Struct(Rc<StructInstance>),
    Object(Rc<ObjectInstance>),
    Class(Rc<ClassDef>),

    /// Sentinel: propagates until unwound by the enclosing call.
    ReturnCarrier(Box<Value>),
    /// Sentinel: propagates until caught by a `TryCatch`.
    ExceptionCarrier(Box<Value>),
    /// Sentinel: `true` is `break`, `false` is `continue`. Folded into one
    /// variant to keep the enum small rather than adding two near-identical
    /// ones.
    LoopSignal(bool),
}

impl Value {
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(Rc::new(RefCell::new(s.into())))
    }

    #[must_use]
    pub fn array(items: Vec<Value>) -> Self {
        Self::Array(Rc::new(RefCell::new(items)))
    }

    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Int { value, bits: 32, signed: true }
    }

    #[must_use]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Self::ReturnCarrier(_) | Self::ExceptionCarrier(_) | Self::LoopSignal(_))
    }

    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Nil => false,
            Self::Bool(b) => *b,
            Self::Int { value, .. } => *value != 0,
            Self::Float { value, .. } => *value != 0.0,
            Self::Char(c) => *c != '\0',
            Self::String(s) => !s.borrow().is_empty(),
            Self::Array(a) => !a.borrow().is_empty(),
            _ => true,
        }
    }

    /// Builds a synthesized error record (kind, message, source range),
    /// wrapped as a catchable exception.
    #[must_use]
    pub fn exception(kind: DiagnosticKind, message: impl Into<String>, range: Option<SourceRange>) -> Self {
        let mut fields = AHashMap::default();
        fields.insert("kind".to_string(), Value::string(kind.to_string()));
        fields.insert("message".to_string(), Value::string(message.into()));
        fields.insert(
            "line".to_string(),
            range.map_or(Value::Nil, |r| Value::int(i64::from(r.start))),
        );
        let def = Rc::new(StructDef {
            name: "Exception".to_string(),
            field_names: vec!["kind".into(), "message".into(), "line".into()],
        });
        Value::Struct(Rc::new(StructInstance { def, fields: RefCell::new(fields) }))
    }

    #[must_use]
    pub fn exception_carrier(kind: DiagnosticKind, message: impl Into<String>, range: Option<SourceRange>) -> Self {
        Self::ExceptionCarrier(Box::new(Self::exception(kind, message, range)))
    }

    /// Best-effort type name, used by `to_string`/diagnostics/`typeof`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "null",
            Self::Bool(_) => "bool",
            Self::Int { .. } => "int",
            Self::Float { .. } => "float",
            Self::Char(_) => "char",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Pointer(_) => "pointer",
            Self::Function(_) => "function",
            Self::Intrinsic(_) => "intrinsic",
            Self::Struct(s) => {
                let _ = s;
                "struct"
            }
            Self::Object(_) => "object",
            Self::Class(_) => "class",
            Self::ReturnCarrier(_) | Self::ExceptionCarrier(_) | Self::LoopSignal(_) => "<sentinel>",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int { value, .. } => write!(f, "{value}"),
            Self::Float { value, .. } => write!(f, "{value}"),
            Self::Char(c) => write!(f, "{c}"),
            Self::String(s) => write!(f, "{}", s.borrow()),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Pointer(_) => write!(f, "<pointer>"),
            Self::Function(_) => write!(f, "<function>"),
            Self::Intrinsic(name) => write!(f, "<intrinsic {name}>"),
            Self::Struct(s) => write!(f, "<struct {}>", s.def.name),
            Self::Object(o) => write!(f, "<object {}>", o.class.name),
            Self::Class(c) => write!(f, "<class {}>", c.name),
            Self::ReturnCarrier(v) => write!(f, "{v}"),
            Self::ExceptionCarrier(v) => write!(f, "{v}"),
            Self::LoopSignal(is_break) => write!(f, "<{}>", if *is_break { "break" } else { "continue" }),
        }
    }
}

/// Raised only for *Internal* failures (an invariant violation in the
/// evaluator itself): evaluation aborts immediately rather than being
/// caught by user code.
#[derive(Debug)]
pub struct InternalAbort(pub String);

impl fmt::Display for InternalAbort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "internal error: {}", self.0)
    }
}

pub type EvalResult = Result<Value, InternalAbort>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_spec_primitives() {
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::int(0).is_truthy());
        assert!(Value::int(1).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("x").is_truthy());
    }

    #[test]
    fn exception_carrier_wraps_a_struct_record() {
        let v = Value::exception_carrier(DiagnosticKind::Arithmetic, "divide by zero", None);
        match v {
            Value::ExceptionCarrier(inner) => match *inner {
                Value::Struct(s) => {
                    assert_eq!(s.fields.borrow().get("kind").unwrap().to_string(), "ArithmeticError");
                }
                other => panic!("expected struct record, got {other:?}"),
            },
            other => panic!("expected exception carrier, got {other:?}"),
        }
    }
}
