//! Recursive-descent parser with Pratt-style precedence climbing. Errors
//! never panic: every `expect` records a `Diagnostic` and returns a
//! best-effort placeholder, and statement/declaration parsing resynchronizes
//! on the token set below rather than unwinding the stack — the same
//! "collected, not thrown" policy the tokenizer uses.

use crate::ast::{
    BinaryOp, ClassDecl, Decl, Expr, FieldDecl, FunctionDecl, NamespaceDecl, ObjectDecl, Param, Program,
    SizeofOperand, Stmt, StmtId, StructDecl, SwitchCase, TypeExpr, UnaryOp, UnionDecl,
};
use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorCollector};
use crate::lexer::Tokenizer;
use crate::source::{Source, SourceRange};
use crate::symbol::{SymbolKind, SymbolTable};
use crate::token::{binary_precedence, Assoc, Literal, Token, TokenKind};
use crate::types::TypeRegistry;

/// Token kinds the panic-mode recovery routine resynchronizes on.
const SYNC_KINDS: &[TokenKind] = &[
    TokenKind::Semicolon,
    TokenKind::RBrace,
    TokenKind::KwDef,
    TokenKind::KwClass,
    TokenKind::KwStruct,
    TokenKind::KwObject,
    TokenKind::KwUnion,
    TokenKind::KwNamespace,
    TokenKind::KwImport,
    TokenKind::KwIf,
    TokenKind::KwWhile,
    TokenKind::KwFor,
    TokenKind::KwReturn,
];

pub struct Parser<'a> {
    source: &'a Source,
    tokenizer: Tokenizer<'a>,
    errors: &'a mut ErrorCollector,
    cur: Token,
    prev_end: u32,
    program: Program,
    symbols: SymbolTable,
    types: TypeRegistry,
}

/// Parses a whole compilation unit. The returned `Program`/`SymbolTable`/
/// `TypeRegistry` are handed to the evaluator regardless of `errors.had_error()`
/// — a best-effort AST is still produced on error.
pub fn parse(source: &Source, errors: &mut ErrorCollector) -> (Program, SymbolTable, TypeRegistry) {
    let mut parser = Parser::new(source, errors);
    parser.parse_program();
    (parser.program, parser.symbols, parser.types)
}

/// Walks the token stream once before the real parse to collect every
/// `class`/`struct`/`union`/`object`/`def` name, so the real parse can
/// `declare()` them into the global scope ahead of time: a declaration that
/// references another one appearing later in the source (e.g. `class
/// A<B>{};` before `class B{};`) still resolves via
/// `is_known_type_identifier`. Matches `define_global`'s own behavior of
/// registering every such name globally regardless of nesting — a method
/// `def` or nested `object` is reached the same way a top-level one is.
/// Uses a throwaway tokenizer and error collector; lex errors are
/// re-reported for real by the actual parse.
fn prescan_top_level_names(source: &Source) -> Vec<(String, SymbolKind)> {
    let mut tokenizer = Tokenizer::new(source);
    let mut errors = ErrorCollector::new();
    let mut names = Vec::new();
    loop {
        let tok = tokenizer.next_token(&mut errors);
        match tok.kind {
            TokenKind::KwClass | TokenKind::KwStruct | TokenKind::KwUnion | TokenKind::KwObject => {
                let next = tokenizer.peek_token(&mut errors);
                if next.kind == TokenKind::Identifier {
                    names.push((source.slice(next.range).to_string(), SymbolKind::Type));
                }
            }
            TokenKind::KwDef => {
                let next = tokenizer.peek_token(&mut errors);
                if next.kind == TokenKind::Identifier {
                    names.push((source.slice(next.range).to_string(), SymbolKind::Function));
                }
            }
            TokenKind::EndOfFile => break,
            _ => {}
        }
    }
    names
}

impl<'a> Parser<'a> {
    fn new(source: &'a Source, errors: &'a mut ErrorCollector) -> Self {
        let mut tokenizer = Tokenizer::new(source);
        let cur = tokenizer.next_token(errors);
        let mut symbols = SymbolTable::new();
        for (name, kind) in prescan_top_level_names(source) {
            symbols.declare(name, kind);
        }
        Self {
            source,
            tokenizer,
            errors,
            cur,
            prev_end: 0,
            program: Program::new(),
            symbols,
            types: TypeRegistry::new(),
        }
    }

    fn advance(&mut self) -> Token {
        self.prev_end = self.cur.range.end;
        let next = self.tokenizer.next_token(self.errors);
        std::mem::replace(&mut self.cur, next)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.cur.kind == kind
    }

    fn peek_is(&mut self, kind: TokenKind) -> bool {
        self.tokenizer.peek_token(self.errors).kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, msg: &str) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            self.error_here(format!("{msg}, found {:?}", self.cur.kind));
            false
        }
    }

    fn error_here(&mut self, message: impl Into<String>) {
        self.errors
            .push(Diagnostic::error(DiagnosticKind::Parse, message, self.cur.range));
    }

    fn expect_identifier(&mut self) -> String {
        if self.check(TokenKind::Identifier) {
            let name = self.source.slice(self.cur.range).to_owned();
            self.advance();
            name
        } else {
            self.error_here("expected identifier");
            String::from("<error>")
        }
    }

    /// Consumes tokens until a synchronization point. Leaves
    /// a trailing `;` consumed but a `}` unconsumed, so the caller's own
    /// closing-brace `expect` still fires correctly.
    fn synchronize(&mut self) {
        while !self.check(TokenKind::EndOfFile) {
            if self.check(TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if self.check(TokenKind::RBrace) || SYNC_KINDS.contains(&self.cur.kind) {
                return;
            }
            self.advance();
        }
    }

    fn range_from(&self, start: u32) -> SourceRange {
        SourceRange::new(start, self.prev_end.max(start))
    }

    // ---- top level -------------------------------------------------

    fn parse_program(&mut self) {
        while !self.check(TokenKind::EndOfFile) {
            let before = self.errors.diagnostics().len();
            if let Some(decl) = self.parse_declaration() {
                self.program.declarations.push(decl);
            }
            if self.errors.diagnostics().len() > before {
                self.synchronize();
            }
        }
    }

    fn parse_declaration(&mut self) -> Option<crate::ast::DeclId> {
        match self.cur.kind {
            TokenKind::KwImport => Some(self.parse_import()),
            TokenKind::KwUsing => Some(self.parse_using()),
            TokenKind::KwTypedef => Some(self.parse_typedef()),
            TokenKind::KwNamespace => Some(self.parse_namespace()),
            TokenKind::KwStruct => Some(self.parse_struct()),
            TokenKind::KwUnion => Some(self.parse_union()),
            TokenKind::KwClass => Some(self.parse_class()),
            TokenKind::KwObject => Some(self.parse_object_raw()),
            TokenKind::KwVolatile | TokenKind::KwDef => Some(self.parse_function()),
            _ => {
                self.error_here("expected a declaration");
                None
            }
        }
    }

    fn eat_trailing_semicolon(&mut self) {
        // Declarations in the example programs are routinely closed with a
        // stray `;` after the block's `}` (`class Foo { ... };`); tolerate it.
        self.eat(TokenKind::Semicolon);
    }

    fn parse_import(&mut self) -> crate::ast::DeclId {
        let start = self.cur.range.start;
        self.advance();
        let path = if self.check(TokenKind::StringLiteral) {
            match self.cur.literal.clone() {
                Some(Literal::Str(s)) => s,
                _ => String::new(),
            }
        } else {
            self.error_here("expected a string literal module path");
            String::new()
        };
        if self.check(TokenKind::StringLiteral) {
            self.advance();
        }
        let alias = if self.eat(TokenKind::KwAs) { Some(self.expect_identifier()) } else { None };
        self.expect(TokenKind::Semicolon, "expected ';' after import");
        let range = self.range_from(start);
        self.program.alloc_decl(Decl::Import { path, alias }, range)
    }

    fn parse_using(&mut self) -> crate::ast::DeclId {
        let start = self.cur.range.start;
        self.advance();
        let mut qualified_name = vec![self.expect_identifier()];
        while self.eat(TokenKind::ColonColon) {
            qualified_name.push(self.expect_identifier());
        }
        self.expect(TokenKind::Semicolon, "expected ';' after using directive");
        let range = self.range_from(start);
        self.program.alloc_decl(Decl::UsingDirective { qualified_name }, range)
    }

    fn parse_typedef(&mut self) -> crate::ast::DeclId {
        let start = self.cur.range.start;
        self.advance();
        let ty = self.parse_type();
        let name = self.expect_identifier();
        self.symbols.define_global(name.clone(), SymbolKind::Type);
        self.expect(TokenKind::Semicolon, "expected ';' after typedef");
        let range = self.range_from(start);
        self.program.alloc_decl(Decl::Typedef { name, ty }, range)
    }

    fn parse_namespace(&mut self) -> crate::ast::DeclId {
        let start = self.cur.range.start;
        self.advance();
        let name = self.expect_identifier();
        self.expect(TokenKind::LBrace, "expected '{' to begin namespace body");
        self.symbols.enter_scope();
        let mut declarations = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::EndOfFile) {
            let before = self.errors.diagnostics().len();
            if let Some(d) = self.parse_declaration() {
                declarations.push(d);
            }
            if self.errors.diagnostics().len() > before {
                self.synchronize();
            }
        }
        self.symbols.leave_scope();
        self.expect(TokenKind::RBrace, "expected '}' to close namespace body");
        self.eat_trailing_semicolon();
        let range = self.range_from(start);
        self.program.alloc_decl(Decl::Namespace(NamespaceDecl { name, declarations }), range)
    }

    fn parse_field_or_method_list(&mut self) -> (Vec<FieldDecl>, Vec<crate::ast::DeclId>, Vec<ObjectDecl>) {
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        let mut nested_objects = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::EndOfFile) {
            let before = self.errors.diagnostics().len();
            match self.cur.kind {
                TokenKind::KwObject => {
                    if let Decl::Object(obj) = self.take_decl(self.parse_object_raw()) {
                        nested_objects.push(obj);
                    }
                }
                TokenKind::KwVolatile | TokenKind::KwDef => {
                    methods.push(self.parse_function());
                }
                _ => {
                    fields.push(self.parse_field());
                }
            }
            if self.errors.diagnostics().len() > before {
                self.synchronize();
            }
        }
        (fields, methods, nested_objects)
    }

    fn take_decl(&mut self, id: crate::ast::DeclId) -> Decl {
        self.program.decls.get(id).clone()
    }

    fn parse_field(&mut self) -> FieldDecl {
        let ty = Some(self.parse_type());
        let name = self.expect_identifier();
        let init = if self.eat(TokenKind::Eq) { Some(self.parse_expression()) } else { None };
        self.expect(TokenKind::Semicolon, "expected ';' after field declaration");
        FieldDecl { name, ty, init }
    }

    fn parse_struct(&mut self) -> crate::ast::DeclId {
        let start = self.cur.range.start;
        self.advance();
        let name = self.expect_identifier();
        self.symbols.define_global(name.clone(), SymbolKind::Type);
        self.expect(TokenKind::LBrace, "expected '{' to begin struct body");
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::EndOfFile) {
            fields.push(self.parse_field());
        }
        self.expect(TokenKind::RBrace, "expected '}' to close struct body");
        self.eat_trailing_semicolon();
        let range = self.range_from(start);
        self.program.alloc_decl(Decl::Struct(StructDecl { name, fields }), range)
    }

    fn parse_union(&mut self) -> crate::ast::DeclId {
        let start = self.cur.range.start;
        self.advance();
        let name = self.expect_identifier();
        self.symbols.define_global(name.clone(), SymbolKind::Type);
        self.expect(TokenKind::LBrace, "expected '{' to begin union body");
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::EndOfFile) {
            let variant_name = self.expect_identifier();
            self.expect(TokenKind::Colon, "expected ':' after union variant name");
            let ty = self.parse_type();
            self.expect(TokenKind::Semicolon, "expected ';' after union variant");
            variants.push((variant_name, ty));
        }
        self.expect(TokenKind::RBrace, "expected '}' to close union body");
        self.eat_trailing_semicolon();
        let range = self.range_from(start);
        self.program.alloc_decl(Decl::Union(UnionDecl { name, variants }), range)
    }

    fn parse_class(&mut self) -> crate::ast::DeclId {
        let start = self.cur.range.start;
        self.advance();
        let name = self.expect_identifier();
        self.symbols.define_global(name.clone(), SymbolKind::Type);
        let parent = if self.eat(TokenKind::Lt) {
            let parent_name = self.expect_identifier();
            self.expect(TokenKind::Gt, "expected '>' after parent class name");
            Some(parent_name)
        } else {
            None
        };
        self.expect(TokenKind::LBrace, "expected '{' to begin class body");
        self.symbols.enter_scope();
        let (fields, methods, nested_objects) = self.parse_field_or_method_list();
        self.symbols.leave_scope();
        self.expect(TokenKind::RBrace, "expected '}' to close class body");
        self.eat_trailing_semicolon();
        let range = self.range_from(start);
        self.program.alloc_decl(
            Decl::Class(ClassDecl { name, parent, fields, methods, nested_objects }),
            range,
        )
    }

    /// Parses `object Name { ... }`, used both at top level (a stateless
    /// namespace callable the same way a class's methods are) and nested
    /// inside a class body. A nested object may carry a `<Parent.Peer>`
    /// override target.
    fn parse_object_raw(&mut self) -> crate::ast::DeclId {
        let start = self.cur.range.start;
        self.advance();
        let name = self.expect_identifier();
        let overrides = if self.eat(TokenKind::Lt) {
            let mut path = vec![self.expect_identifier()];
            while self.eat(TokenKind::Dot) {
                path.push(self.expect_identifier());
            }
            self.expect(TokenKind::Gt, "expected '>' after object override target");
            Some(path)
        } else {
            None
        };
        self.symbols.define_global(name.clone(), SymbolKind::Type);
        self.expect(TokenKind::LBrace, "expected '{' to begin object body");
        self.symbols.enter_scope();
        let (fields, methods, nested_objects) = self.parse_field_or_method_list();
        debug_assert!(nested_objects.is_empty(), "objects do not themselves nest further objects");
        self.symbols.leave_scope();
        self.expect(TokenKind::RBrace, "expected '}' to close object body");
        self.eat_trailing_semicolon();
        let range = self.range_from(start);
        self.program.alloc_decl(Decl::Object(ObjectDecl { overrides, name, fields, methods }), range)
    }

    fn parse_function(&mut self) -> crate::ast::DeclId {
        let start = self.cur.range.start;
        let is_volatile = self.eat(TokenKind::KwVolatile);
        self.expect(TokenKind::KwDef, "expected 'def'");
        let name = self.expect_identifier();
        self.symbols.define_global(name.clone(), SymbolKind::Function);
        let mut type_params = Vec::new();
        if self.eat(TokenKind::Lt) {
            if !self.check(TokenKind::Gt) {
                loop {
                    type_params.push(self.expect_identifier());
                    if !self.eat(TokenKind::Comma) {
                        break;
                    }
                }
            }
            self.expect(TokenKind::Gt, "expected '>' after type parameter list");
        }
        self.expect(TokenKind::LParen, "expected '(' after function name");
        self.symbols.enter_scope();
        let mut params = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                let ty = Some(self.parse_type());
                let pname = self.expect_identifier();
                self.symbols.define(pname.clone(), SymbolKind::Parameter);
                params.push(Param { name: pname, ty });
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after parameter list");
        let return_ty = if self.eat(TokenKind::Arrow) { Some(self.parse_type()) } else { None };
        let body = self.parse_block_stmt();
        self.symbols.leave_scope();
        self.eat_trailing_semicolon();
        let range = self.range_from(start);
        self.program.alloc_decl(
            Decl::Function(FunctionDecl { name, type_params, params, return_ty, body, is_volatile }),
            range,
        )
    }

    // ---- types -------------------------------------------------------

    fn looks_like_type_start(&self) -> bool {
        matches!(
            self.cur.kind,
            TokenKind::KwVoid
                | TokenKind::KwBool
                | TokenKind::KwInt
                | TokenKind::KwFloat
                | TokenKind::KwChar
                | TokenKind::KwString
                | TokenKind::KwSigned
                | TokenKind::KwUnsigned
                | TokenKind::KwData
        )
    }

    /// The tokenizer already fuses `{N}` into one `BitWidthSpecifier` token
    /// right after a numeric type keyword; nothing left to do here but read
    /// its payload.
    fn parse_bit_width(&mut self, default_bits: u16) -> u16 {
        if !self.check(TokenKind::BitWidthSpecifier) {
            return default_bits;
        }
        let bits = match &self.cur.literal {
            Some(Literal::Int { value, .. }) => *value as u16,
            _ => default_bits,
        };
        self.advance();
        bits
    }

    fn parse_type(&mut self) -> crate::ast::TypeId {
        let base = match self.cur.kind {
            TokenKind::KwVoid => {
                self.advance();
                TypeExpr::Void
            }
            TokenKind::KwBool => {
                self.advance();
                TypeExpr::Bool
            }
            TokenKind::KwChar => {
                self.advance();
                TypeExpr::Char
            }
            TokenKind::KwString => {
                self.advance();
                TypeExpr::String
            }
            TokenKind::KwSigned | TokenKind::KwUnsigned => {
                let signed = self.check(TokenKind::KwSigned);
                self.advance();
                self.eat(TokenKind::KwData);
                self.eat(TokenKind::KwInt);
                let bits = self.parse_bit_width(32);
                TypeExpr::Int { bits, signed }
            }
            TokenKind::KwData => {
                self.advance();
                let bits = self.parse_bit_width(32);
                TypeExpr::Int { bits, signed: false }
            }
            TokenKind::KwInt => {
                self.advance();
                let bits = self.parse_bit_width(32);
                TypeExpr::Int { bits, signed: true }
            }
            TokenKind::KwFloat => {
                self.advance();
                let bits = self.parse_bit_width(64);
                TypeExpr::Float { bits }
            }
            TokenKind::Identifier => {
                let mut path = vec![self.expect_identifier()];
                while self.eat(TokenKind::ColonColon) {
                    path.push(self.expect_identifier());
                }
                let mut type_args = Vec::new();
                if self.eat(TokenKind::Lt) {
                    if !self.check(TokenKind::Gt) {
                        loop {
                            type_args.push(self.parse_type());
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::Gt, "expected '>' after type argument list");
                }
                TypeExpr::Named { path, type_args }
            }
            TokenKind::KwNull => {
                self.advance();
                TypeExpr::Null
            }
            _ => {
                self.error_here("expected a type");
                TypeExpr::Named { path: vec!["<error>".into()], type_args: vec![] }
            }
        };
        let mut id = self.program.types.alloc(base);
        while self.check(TokenKind::Star) {
            self.advance();
            id = self.program.types.alloc(TypeExpr::Pointer(id));
        }
        while self.check(TokenKind::LBracket) {
            self.advance();
            let len = if !self.check(TokenKind::RBracket) { Some(self.parse_expression()) } else { None };
            self.expect(TokenKind::RBracket, "expected ']' after array type");
            id = self.program.types.alloc(TypeExpr::Array { element: id, len });
        }
        id
    }

    // ---- statements ----------------------------------------------------

    fn parse_block_stmt(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.expect(TokenKind::LBrace, "expected '{' to begin a block");
        self.symbols.enter_scope();
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::EndOfFile) {
            let before = self.errors.diagnostics().len();
            stmts.push(self.parse_statement());
            if self.errors.diagnostics().len() > before {
                self.synchronize();
            }
        }
        self.symbols.leave_scope();
        self.expect(TokenKind::RBrace, "expected '}' to close a block");
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::Block(stmts), range)
    }

    fn statement_looks_like_decl(&mut self) -> bool {
        if self.looks_like_type_start() {
            return true;
        }
        self.check(TokenKind::Identifier) && self.peek_is(TokenKind::Identifier)
    }

    fn parse_statement(&mut self) -> StmtId {
        match self.cur.kind {
            TokenKind::LBrace => self.parse_block_stmt(),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwDo => self.parse_do_while(),
            TokenKind::KwFor | TokenKind::KwForeach => self.parse_for(),
            TokenKind::KwReturn => self.parse_return(),
            TokenKind::KwBreak => self.parse_simple_keyword_stmt(Stmt::Break),
            TokenKind::KwContinue => self.parse_simple_keyword_stmt(Stmt::Continue),
            TokenKind::KwThrow => self.parse_throw(),
            TokenKind::KwTry => self.parse_try_catch(),
            TokenKind::KwAsm => self.parse_asm(),
            TokenKind::KwSwitch => self.parse_switch(),
            TokenKind::KwAssert => self.parse_assert(),
            _ if self.statement_looks_like_decl() => self.parse_variable_decl_stmt(false),
            _ => self.parse_expression_stmt(),
        }
    }

    fn parse_simple_keyword_stmt(&mut self, stmt: Stmt) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        self.expect(TokenKind::Semicolon, "expected ';'");
        let range = self.range_from(start);
        self.program.alloc_stmt(stmt, range)
    }

    fn parse_variable_decl_stmt(&mut self, is_global: bool) -> StmtId {
        let start = self.cur.range.start;
        let ty = Some(self.parse_type());
        let name = self.expect_identifier();
        self.symbols.define(name.clone(), SymbolKind::Variable);
        let init = if self.eat(TokenKind::Eq) { Some(self.parse_expression()) } else { None };
        self.expect(TokenKind::Semicolon, "expected ';' after variable declaration");
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::VariableDecl { name, ty, init, is_global }, range)
    }

    fn parse_expression_stmt(&mut self) -> StmtId {
        let start = self.cur.range.start;
        let expr = self.parse_expression();
        self.expect(TokenKind::Semicolon, "expected ';' after expression");
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::Expression(expr), range)
    }

    fn parse_if(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        self.expect(TokenKind::LParen, "expected '(' after 'if'");
        let cond = self.parse_expression();
        self.expect(TokenKind::RParen, "expected ')' after if condition");
        let then_branch = self.parse_statement();
        let else_branch = if self.eat(TokenKind::KwElse) { Some(self.parse_statement()) } else { None };
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::If { cond, then_branch, else_branch }, range)
    }

    fn parse_while(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        self.expect(TokenKind::LParen, "expected '(' after 'while'");
        let cond = self.parse_expression();
        self.expect(TokenKind::RParen, "expected ')' after while condition");
        let body = self.parse_statement();
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::While { cond, body }, range)
    }

    fn parse_do_while(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        let body = self.parse_statement();
        self.expect(TokenKind::KwWhile, "expected 'while' after do-block");
        self.expect(TokenKind::LParen, "expected '(' after 'while'");
        let cond = self.parse_expression();
        self.expect(TokenKind::RParen, "expected ')' after while condition");
        self.expect(TokenKind::Semicolon, "expected ';' after do-while");
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::DoWhile { body, cond }, range)
    }

    /// Handles both the C-style three-clause `for` and the `for (v in lo..hi)`
    /// form. The `lo..hi` shorthand is lowered to a call of the `range`
    /// intrinsic — there is no dedicated range-expression AST node; see
    /// DESIGN.md.
    fn parse_for(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        self.expect(TokenKind::LParen, "expected '(' after 'for'");
        if self.check(TokenKind::Identifier) && self.peek_is(TokenKind::KwIn) {
            let var = self.expect_identifier();
            self.advance(); // 'in'
            let low = self.parse_ternary();
            let iter = if self.check(TokenKind::Dot) && self.peek_is(TokenKind::Dot) {
                self.advance();
                self.advance();
                let high = self.parse_ternary();
                let callee = self.program.alloc_expr(Expr::Variable("range".into()), self.range_from(start));
                self.program.alloc_expr(Expr::Call { callee, args: vec![low, high] }, self.range_from(start))
            } else {
                low
            };
            self.expect(TokenKind::RParen, "expected ')' after for-in clause");
            self.symbols.enter_scope();
            self.symbols.define(var.clone(), SymbolKind::Variable);
            let body = self.parse_statement();
            self.symbols.leave_scope();
            let range = self.range_from(start);
            return self.program.alloc_stmt(Stmt::ForEach { var, iter, body }, range);
        }

        self.symbols.enter_scope();
        let init = if self.check(TokenKind::Semicolon) {
            self.advance();
            None
        } else if self.statement_looks_like_decl() {
            Some(self.parse_variable_decl_stmt(false))
        } else {
            Some(self.parse_expression_stmt())
        };
        let cond = if self.check(TokenKind::Semicolon) { None } else { Some(self.parse_expression()) };
        self.expect(TokenKind::Semicolon, "expected ';' after for-loop condition");
        let step = if self.check(TokenKind::RParen) { None } else { Some(self.parse_expression()) };
        self.expect(TokenKind::RParen, "expected ')' after for-loop clauses");
        let body = self.parse_statement();
        self.symbols.leave_scope();
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::For { init, cond, step, body }, range)
    }

    fn parse_return(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        let value = if self.check(TokenKind::Semicolon) { None } else { Some(self.parse_expression()) };
        self.expect(TokenKind::Semicolon, "expected ';' after return");
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::Return(value), range)
    }

    fn parse_throw(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        let value = self.parse_expression();
        self.expect(TokenKind::Semicolon, "expected ';' after throw");
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::Throw(value), range)
    }

    fn parse_try_catch(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        let try_block = self.parse_block_stmt();
        self.expect(TokenKind::KwCatch, "expected 'catch' after try-block");
        self.expect(TokenKind::LParen, "expected '(' after 'catch'");
        let catch_type = if self.eat(TokenKind::KwAuto) { None } else { Some(self.parse_type()) };
        let catch_var = self.expect_identifier();
        self.expect(TokenKind::RParen, "expected ')' after catch clause");
        self.symbols.enter_scope();
        self.symbols.define(catch_var.clone(), SymbolKind::Variable);
        let catch_body = self.parse_block_stmt();
        self.symbols.leave_scope();
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::TryCatch { try_block, catch_var, catch_type, catch_body }, range)
    }

    fn parse_asm(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        self.expect(TokenKind::LBrace, "expected '{' to begin asm block");
        let payload_start = self.prev_end;
        let mut depth: u32 = 1;
        loop {
            match self.cur.kind {
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    self.advance();
                }
                TokenKind::EndOfFile => {
                    self.error_here("unterminated asm block");
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
        let payload_end = self.cur.range.start;
        let payload = self.source.slice(SourceRange::new(payload_start, payload_end)).to_owned();
        self.expect(TokenKind::RBrace, "expected '}' to close asm block");
        self.eat_trailing_semicolon();
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::Asm(payload), range)
    }

    fn parse_switch(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        self.expect(TokenKind::LParen, "expected '(' after 'switch'");
        let scrutinee = self.parse_expression();
        self.expect(TokenKind::RParen, "expected ')' after switch scrutinee");
        self.expect(TokenKind::LBrace, "expected '{' to begin switch body");
        let mut cases = Vec::new();
        let mut default = None;
        while !self.check(TokenKind::RBrace) && !self.check(TokenKind::EndOfFile) {
            if self.eat(TokenKind::KwCase) {
                let value = self.parse_expression();
                self.expect(TokenKind::Colon, "expected ':' after case label");
                let mut body = Vec::new();
                while !matches!(self.cur.kind, TokenKind::KwCase | TokenKind::KwDefault | TokenKind::RBrace) {
                    body.push(self.parse_statement());
                }
                cases.push(SwitchCase { value, body });
            } else if self.eat(TokenKind::KwDefault) {
                self.expect(TokenKind::Colon, "expected ':' after 'default'");
                let mut body = Vec::new();
                while !matches!(self.cur.kind, TokenKind::KwCase | TokenKind::KwDefault | TokenKind::RBrace) {
                    body.push(self.parse_statement());
                }
                default = Some(body);
            } else {
                self.error_here("expected 'case' or 'default' in switch body");
                self.synchronize();
            }
        }
        self.expect(TokenKind::RBrace, "expected '}' to close switch body");
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::Switch { scrutinee, cases, default }, range)
    }

    fn parse_assert(&mut self) -> StmtId {
        let start = self.cur.range.start;
        self.advance();
        self.expect(TokenKind::LParen, "expected '(' after 'assert'");
        let cond = self.parse_expression();
        self.expect(TokenKind::RParen, "expected ')' after assert condition");
        self.expect(TokenKind::Semicolon, "expected ';' after assert");
        let range = self.range_from(start);
        self.program.alloc_stmt(Stmt::Assert(cond), range)
    }

    // ---- expressions ---------------------------------------------------

    fn parse_expression(&mut self) -> crate::ast::ExprId {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> crate::ast::ExprId {
        let start = self.cur.range.start;
        let target = self.parse_ternary();
        let op = match self.cur.kind {
            TokenKind::Eq => None,
            TokenKind::PlusEq => Some(BinaryOp::Add),
            TokenKind::MinusEq => Some(BinaryOp::Sub),
            TokenKind::StarEq => Some(BinaryOp::Mul),
            TokenKind::SlashEq => Some(BinaryOp::Div),
            TokenKind::PercentEq => Some(BinaryOp::Mod),
            TokenKind::AmpEq => Some(BinaryOp::BitAnd),
            TokenKind::PipeEq => Some(BinaryOp::BitOr),
            TokenKind::CaretEq => Some(BinaryOp::BitXor),
            TokenKind::ShlEq => Some(BinaryOp::Shl),
            TokenKind::ShrEq => Some(BinaryOp::Shr),
            _ => return target,
        };
        self.advance();
        let value = self.parse_assignment();
        let range = self.range_from(start);
        self.program.alloc_expr(Expr::Assign { op, target, value }, range)
    }

    fn parse_ternary(&mut self) -> crate::ast::ExprId {
        let start = self.cur.range.start;
        let cond = self.parse_binary(3);
        if self.eat(TokenKind::Question) {
            let then_branch = self.parse_assignment();
            self.expect(TokenKind::Colon, "expected ':' in ternary expression");
            let else_branch = self.parse_ternary();
            let range = self.range_from(start);
            return self.program.alloc_expr(Expr::Ternary { cond, then_branch, else_branch }, range);
        }
        cond
    }

    fn parse_binary(&mut self, min_prec: u8) -> crate::ast::ExprId {
        let start = self.cur.range.start;
        let mut left = self.parse_unary();
        loop {
            let Some((prec, assoc)) = binary_precedence(self.cur.kind) else { break };
            if prec < 3 || prec < min_prec {
                break;
            }
            // `as` reads a type, not a sub-expression; desugar straight to
            // the same `Cast` node `cast<Type>(expr)` produces instead of
            // going through `BinaryOp`.
            if self.cur.kind == TokenKind::KwAs {
                self.advance();
                let target = self.parse_type();
                let range = self.range_from(start);
                left = self.program.alloc_expr(Expr::Cast { target, operand: left }, range);
                continue;
            }
            let op = binary_op_for(self.cur.kind);
            self.advance();
            let next_min = if assoc == Assoc::Left { prec + 1 } else { prec };
            let right = self.parse_binary(next_min);
            let range = self.range_from(start);
            left = self.program.alloc_expr(Expr::Binary { op, left, right }, range);
        }
        left
    }

    fn parse_unary(&mut self) -> crate::ast::ExprId {
        let start = self.cur.range.start;
        let op = match self.cur.kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang | TokenKind::KwNot => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            TokenKind::PlusPlus => Some(UnaryOp::PreInc),
            TokenKind::MinusMinus => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let operand = self.parse_unary();
            let range = self.range_from(start);
            return self.program.alloc_expr(Expr::Unary { op, operand }, range);
        }
        if self.check(TokenKind::Star) {
            self.advance();
            let operand = self.parse_unary();
            let range = self.range_from(start);
            return self.program.alloc_expr(Expr::Dereference(operand), range);
        }
        if self.check(TokenKind::At) {
            self.advance();
            let operand = self.parse_unary();
            let range = self.range_from(start);
            return self.program.alloc_expr(Expr::AddressOf(operand), range);
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> crate::ast::ExprId {
        let start = self.cur.range.start;
        let mut expr = self.parse_primary();
        loop {
            match self.cur.kind {
                // `?.` collapses to a regular member access: the runtime
                // `Value` model has no nullable-reference wrapper to make
                // the short-circuit behavior observable (see DESIGN.md).
                TokenKind::Dot | TokenKind::QuestionDot => {
                    self.advance();
                    let name = self.expect_identifier();
                    let range = self.range_from(start);
                    expr = self.program.alloc_expr(Expr::Member { object: expr, name }, range);
                }
                TokenKind::Arrow => {
                    self.advance();
                    let name = self.expect_identifier();
                    let range = self.range_from(start);
                    expr = self.program.alloc_expr(Expr::ArrowMember { pointer: expr, name }, range);
                }
                TokenKind::ColonColon => {
                    self.advance();
                    let name = self.expect_identifier();
                    let range = self.range_from(start);
                    expr = match self.program.exprs.get(expr).clone() {
                        Expr::Variable(v) => {
                            self.program.alloc_expr(Expr::ScopeResolve { path: vec![v, name] }, range)
                        }
                        Expr::ScopeResolve { mut path } => {
                            path.push(name);
                            self.program.alloc_expr(Expr::ScopeResolve { path }, range)
                        }
                        _ => {
                            self.error_here("'::' may only follow a name");
                            expr
                        }
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression();
                    self.expect(TokenKind::RBracket, "expected ']' after index expression");
                    let range = self.range_from(start);
                    expr = self.program.alloc_expr(Expr::Index { array: expr, index }, range);
                }
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression());
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "expected ')' after call arguments");
                    // `Class(args){}`: an immediately-following empty brace
                    // pair turns the call into object instantiation; see
                    // DESIGN.md.
                    if self.check(TokenKind::LBrace) && self.peek_is(TokenKind::RBrace) {
                        self.advance();
                        self.advance();
                        let range = self.range_from(start);
                        expr = self.program.alloc_expr(Expr::Instantiate { class: expr, args }, range);
                    } else {
                        let range = self.range_from(start);
                        expr = self.program.alloc_expr(Expr::Call { callee: expr, args }, range);
                    }
                }
                TokenKind::PlusPlus => {
                    self.advance();
                    let range = self.range_from(start);
                    expr = self.program.alloc_expr(Expr::Unary { op: UnaryOp::PostInc, operand: expr }, range);
                }
                TokenKind::MinusMinus => {
                    self.advance();
                    let range = self.range_from(start);
                    expr = self.program.alloc_expr(Expr::Unary { op: UnaryOp::PostDec, operand: expr }, range);
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> crate::ast::ExprId {
        let start = self.cur.range.start;
        match self.cur.kind {
            TokenKind::IntLiteral => {
                let value = match self.cur.literal.clone() {
                    Some(Literal::Int { value, .. }) => value,
                    _ => 0,
                };
                self.advance();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Literal(crate::ast::LiteralValue::Int(value)), range)
            }
            TokenKind::FloatLiteral => {
                let value = match self.cur.literal.clone() {
                    Some(Literal::Float(v)) => v,
                    _ => 0.0,
                };
                self.advance();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Literal(crate::ast::LiteralValue::Float(value)), range)
            }
            TokenKind::BoolLiteral => {
                let value = match self.cur.literal.clone() {
                    Some(Literal::Bool(v)) => v,
                    _ => false,
                };
                self.advance();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Literal(crate::ast::LiteralValue::Bool(value)), range)
            }
            TokenKind::CharLiteral => {
                let value = match self.cur.literal.clone() {
                    Some(Literal::Char(v)) => v,
                    _ => '\0',
                };
                self.advance();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Literal(crate::ast::LiteralValue::Char(value)), range)
            }
            TokenKind::StringLiteral => {
                let value = match self.cur.literal.clone() {
                    Some(Literal::Str(v)) => v,
                    _ => String::new(),
                };
                self.advance();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Literal(crate::ast::LiteralValue::Str(value)), range)
            }
            TokenKind::KwNull => {
                self.advance();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Literal(crate::ast::LiteralValue::Null), range)
            }
            TokenKind::IStringStart => self.parse_istring(),
            TokenKind::Identifier => {
                let name = self.expect_identifier();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Variable(name), range)
            }
            TokenKind::KwThis => {
                self.advance();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Variable("this".into()), range)
            }
            TokenKind::KwSuper => {
                self.advance();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Variable("super".into()), range)
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression();
                self.expect(TokenKind::RParen, "expected ')' to close parenthesized expression");
                inner
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(TokenKind::RBracket) {
                    loop {
                        elements.push(self.parse_expression());
                        if !self.eat(TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(TokenKind::RBracket, "expected ']' to close array literal");
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::ArrayLiteral(elements), range)
            }
            TokenKind::KwCast => {
                self.advance();
                self.expect(TokenKind::Lt, "expected '<' after 'cast'");
                let target = self.parse_type();
                self.expect(TokenKind::Gt, "expected '>' after cast target type");
                self.expect(TokenKind::LParen, "expected '(' after cast target");
                let operand = self.parse_expression();
                self.expect(TokenKind::RParen, "expected ')' after cast operand");
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Cast { target, operand }, range)
            }
            TokenKind::KwSizeof => {
                self.advance();
                self.expect(TokenKind::LParen, "expected '(' after 'sizeof'");
                let operand = if self.looks_like_type_start() || self.is_known_type_identifier() {
                    SizeofOperand::Type(self.parse_type())
                } else {
                    SizeofOperand::Expr(self.parse_expression())
                };
                self.expect(TokenKind::RParen, "expected ')' after sizeof operand");
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Sizeof(operand), range)
            }
            TokenKind::KwTypeof => {
                self.advance();
                self.expect(TokenKind::LParen, "expected '(' after 'typeof'");
                let operand = self.parse_expression();
                self.expect(TokenKind::RParen, "expected ')' after typeof operand");
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Typeof(operand), range)
            }
            TokenKind::KwNew => {
                self.advance();
                let callee_name = self.expect_identifier();
                let callee = self.program.alloc_expr(Expr::Variable(callee_name), self.range_from(start));
                let mut args = Vec::new();
                if self.eat(TokenKind::LParen) {
                    if !self.check(TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression());
                            if !self.eat(TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(TokenKind::RParen, "expected ')' after constructor arguments");
                }
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Instantiate { class: callee, args }, range)
            }
            TokenKind::KwDelete => {
                self.advance();
                let operand = self.parse_unary();
                let callee = self.program.alloc_expr(Expr::Variable("__delete".into()), self.range_from(start));
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Call { callee, args: vec![operand] }, range)
            }
            _ => {
                self.error_here("expected an expression");
                self.advance();
                let range = self.range_from(start);
                self.program.alloc_expr(Expr::Literal(crate::ast::LiteralValue::Null), range)
            }
        }
    }

    fn is_known_type_identifier(&self) -> bool {
        self.check(TokenKind::Identifier) && {
            let name = self.source.slice(self.cur.range);
            matches!(self.symbols.lookup(name), Some(sym) if sym.kind == SymbolKind::Type)
        }
    }

    /// Interpolated-string literal: the tokenizer has already split the
    /// format text from the `;`-separated argument list.
    fn parse_istring(&mut self) -> crate::ast::ExprId {
        let start = self.cur.range.start;
        self.advance(); // IStringStart
        let mut format_parts = Vec::new();
        let mut args = Vec::new();
        match self.cur.kind {
            TokenKind::IStringEnd => {
                if let Some(Literal::Str(s)) = self.cur.literal.clone() {
                    format_parts.push(s);
                }
                self.advance();
            }
            TokenKind::IStringExprStart => {
                if let Some(Literal::Str(s)) = self.cur.literal.clone() {
                    format_parts.push(s);
                }
                self.advance();
                while !self.check(TokenKind::IStringExprEnd) && !self.check(TokenKind::EndOfFile) {
                    args.push(self.parse_expression());
                    self.expect(TokenKind::Semicolon, "expected ';' after interpolated expression");
                }
                self.expect(TokenKind::IStringExprEnd, "expected '}' to close interpolated expression list");
            }
            _ => {
                self.error_here("malformed interpolated string");
            }
        }
        let range = self.range_from(start);
        self.program.alloc_expr(Expr::IString { format_parts, args }, range)
    }
}

fn binary_op_for(kind: TokenKind) -> BinaryOp {
    use TokenKind::*;
    match kind {
        Plus => BinaryOp::Add,
        Minus => BinaryOp::Sub,
        Star => BinaryOp::Mul,
        Slash => BinaryOp::Div,
        Percent => BinaryOp::Mod,
        StarStar => BinaryOp::Pow,
        EqEq => BinaryOp::Eq,
        BangEq => BinaryOp::Ne,
        Lt => BinaryOp::Lt,
        Gt => BinaryOp::Gt,
        LtEq => BinaryOp::Le,
        GtEq => BinaryOp::Ge,
        KwAnd | AmpAmp => BinaryOp::And,
        KwOr | PipePipe => BinaryOp::Or,
        KwXor => BinaryOp::Xor,
        Amp => BinaryOp::BitAnd,
        Pipe => BinaryOp::BitOr,
        Caret => BinaryOp::BitXor,
        Shl => BinaryOp::Shl,
        Shr => BinaryOp::Shr,
        // `is`/`in` have a binary_precedence entry in the relational tier
        // but no dedicated BinaryOp; treat both as equality tests,
        // matching their use as membership/identity checks.
        KwIs | KwIn => BinaryOp::Eq,
        other => unreachable!("{other:?} is not a binary operator"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_ok(src: &str) -> (Program, ErrorCollector) {
        let source = Source::new("t.fx", src);
        let mut errors = ErrorCollector::new();
        let (program, _symbols, _types) = parse(&source, &mut errors);
        (program, errors)
    }

    #[test]
    fn parses_minimal_main_function() {
        let (program, errors) = parse_ok(r#"def main()->int{ print("hi"); return 0; };"#);
        assert!(!errors.had_error());
        assert_eq!(program.declarations.len(), 1);
        match program.decls.get(program.declarations[0]) {
            Decl::Function(f) => assert_eq!(f.name, "main"),
            other => panic!("expected a function decl, got {other:?}"),
        }
    }

    #[test]
    fn parses_struct_with_fields() {
        let (program, errors) = parse_ok("struct Point{ int x; int y; };");
        assert!(!errors.had_error());
        match program.decls.get(program.declarations[0]) {
            Decl::Struct(s) => assert_eq!(s.fields.len(), 2),
            other => panic!("expected a struct decl, got {other:?}"),
        }
    }

    #[test]
    fn parses_class_with_nested_object() {
        let src = r#"class Dog<Animal>{ object Actions<Animal.Actions>{ def speak()->string{ return "Woof"; }; }; };"#;
        let (program, errors) = parse_ok(src);
        assert!(!errors.had_error());
        match program.decls.get(program.declarations[0]) {
            Decl::Class(c) => {
                assert_eq!(c.parent.as_deref(), Some("Animal"));
                assert_eq!(c.nested_objects.len(), 1);
                assert_eq!(c.nested_objects[0].overrides, Some(vec!["Animal".into(), "Actions".into()]));
            }
            other => panic!("expected a class decl, got {other:?}"),
        }
    }

    #[test]
    fn parses_xor_as_a_binary_expression() {
        let (program, errors) = parse_ok("def main()->int{ bool b = true xor false; return 0; };");
        assert!(!errors.had_error());
        let Decl::Function(f) = program.decls.get(program.declarations[0]) else { panic!() };
        let Stmt::Block(stmts) = program.stmts.get(f.body) else { panic!() };
        let Stmt::VariableDecl { init: Some(init), .. } = program.stmts.get(stmts[0]) else { panic!() };
        assert!(matches!(program.exprs.get(*init), Expr::Binary { op: BinaryOp::Xor, .. }));
    }

    #[test]
    fn parses_as_into_a_cast_node() {
        let (program, errors) = parse_ok("def main()->int{ float f = 1 as float; return 0; };");
        assert!(!errors.had_error());
        let Decl::Function(f) = program.decls.get(program.declarations[0]) else { panic!() };
        let Stmt::Block(stmts) = program.stmts.get(f.body) else { panic!() };
        let Stmt::VariableDecl { init: Some(init), .. } = program.stmts.get(stmts[0]) else { panic!() };
        assert!(matches!(program.exprs.get(*init), Expr::Cast { .. }));
    }

    #[test]
    fn parses_for_in_range() {
        let src = "def main()->int{ for (i in 1..5) { print(i); }; return 0; };";
        let (_program, errors) = parse_ok(src);
        assert!(!errors.had_error());
    }

    #[test]
    fn parses_try_catch() {
        let src = "def main()->int{ int d=0; try{ int q=10/d; } catch(auto e){ print(\"caught\"); } return 0; };";
        let (_program, errors) = parse_ok(src);
        assert!(!errors.had_error());
    }

    #[test]
    fn unexpected_token_recovers_and_keeps_parsing() {
        let src = "def f(){ @@@ } def g(){ return; };";
        let (program, errors) = parse_ok(src);
        assert!(errors.had_error());
        assert_eq!(program.declarations.len(), 2);
    }

    #[test]
    fn operator_precedence_shapes_the_tree() {
        let (program, errors) = parse_ok("def main()->int{ int x = 1 + 2 * 3; return 0; };");
        assert!(!errors.had_error());
        let Decl::Function(f) = program.decls.get(program.declarations[0]) else { panic!() };
        let Stmt::Block(stmts) = program.stmts.get(f.body) else { panic!() };
        let Stmt::VariableDecl { init: Some(init), .. } = program.stmts.get(stmts[0]) else { panic!() };
        match program.exprs.get(*init) {
            Expr::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(program.exprs.get(*right), Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected addition at the root, got {other:?}"),
        }
    }

    #[test]
    fn forward_declared_type_resolves_sizeof_before_its_own_declaration() {
        let src = r#"
            def f()->int{ return sizeof(Tree); };
            struct Tree{ int x; };
        "#;
        let (program, errors) = parse_ok(src);
        assert!(!errors.had_error());
        let Decl::Function(f) = program.decls.get(program.declarations[0]) else { panic!() };
        let Stmt::Block(stmts) = program.stmts.get(f.body) else { panic!() };
        let Stmt::Return(Some(ret)) = program.stmts.get(stmts[0]) else { panic!() };
        assert!(matches!(program.exprs.get(*ret), Expr::Sizeof(SizeofOperand::Type(_))));
    }

    #[test]
    fn mutually_referencing_classes_both_declare_regardless_of_order() {
        let src = r#"
            class A<B>{};
            class B{};
        "#;
        let (program, errors) = parse_ok(src);
        assert!(!errors.had_error());
        assert_eq!(program.declarations.len(), 2);
    }
}
