//! Host intrinsics catalogue.
//!
//! Arity is checked here, before the evaluator dispatches to the actual
//! implementation in `evaluator.rs`; a mismatch is an *ArityError*
//! diagnostic, never a panic.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// At least this many arguments.
    Variadic(usize),
}

impl Arity {
    #[must_use]
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Self::Fixed(n) => n == count,
            Self::Variadic(min) => count >= min,
        }
    }
}

/// Every intrinsic name the core evaluator recognizes without an embedding
/// host registering anything further, plus
/// `range` (the `for (i in lo..hi)` lowering target, see `parser.rs`) and
/// `__delete` (the `delete` keyword's lowering target).
#[must_use]
pub fn lookup(name: &str) -> Option<Arity> {
    Some(match name {
        "print" => Arity::Variadic(0),
        "input" => Arity::Variadic(0),
        "length" => Arity::Fixed(1),
        "to_string" => Arity::Fixed(1),
        "to_number" => Arity::Fixed(1),
        "sqrt" | "sin" | "cos" | "tan" => Arity::Fixed(1),
        "memalloc" => Arity::Fixed(1),
        "range" => Arity::Fixed(2),
        "__delete" => Arity::Fixed(1),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_is_variadic_from_zero() {
        let arity = lookup("print").unwrap();
        assert!(arity.accepts(0));
        assert!(arity.accepts(5));
    }

    #[test]
    fn sqrt_requires_exactly_one_argument() {
        let arity = lookup("sqrt").unwrap();
        assert!(arity.accepts(1));
        assert!(!arity.accepts(0));
        assert!(!arity.accepts(2));
    }

    #[test]
    fn unknown_name_is_not_an_intrinsic() {
        assert!(lookup("frobnicate").is_none());
    }
}
