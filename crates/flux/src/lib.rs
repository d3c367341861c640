#![doc = include_str!("../../../README.md")]
#![expect(dead_code, reason = "some API surface is exercised only by flux-cli and by embedding hosts")]

mod arena;
mod ast;
mod diagnostics;
mod environment;
mod evaluator;
mod intrinsics;
mod io;
mod lexer;
mod parser;
mod resource;
mod source;
mod symbol;
mod token;
mod types;
mod value;

pub use crate::ast::Program;
pub use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorCollector, Severity};
pub use crate::evaluator::RunOutcome;
pub use crate::io::{CollectingIo, InputReader, PrintWriter, StdIo};
pub use crate::lexer::{Tokenizer, tokenize_all};
pub use crate::parser::parse;
pub use crate::resource::{CallGuard, LimitedTracker, NoLimitTracker, ResourceLimits, ResourceTracker};
pub use crate::source::{Source, SourcePosition, SourceRange};
pub use crate::symbol::SymbolTable;
pub use crate::token::{Token, TokenKind};
pub use crate::types::{TypeDesc, TypeDescId, TypeRegistry};
pub use crate::value::{EvalResult, InternalAbort, Value};

/// Tokenizes, parses, and evaluates one compilation unit, mirroring the
/// `interp` CLI's own pipeline, for embedding hosts that want the whole
/// thing in one call.
///
/// Returns `None` for the outcome when parsing produced at least one error
/// diagnostic (`main` never ran); callers render `errors` and report a
/// compile failure rather than treating that as a successful empty run.
pub fn run_source(
    source: &Source,
    print: &mut dyn PrintWriter,
    input: &mut dyn InputReader,
    tracker: &dyn ResourceTracker,
) -> (Option<Result<RunOutcome, InternalAbort>>, ErrorCollector) {
    let mut errors = ErrorCollector::new();
    let (program, _symbols, _types) = parse(source, &mut errors);
    if errors.had_error() {
        return (None, errors);
    }
    let outcome = evaluator::run(&program, &mut errors, print, input, tracker);
    (Some(outcome), errors)
}
