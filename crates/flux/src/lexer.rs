//! Streaming tokenizer.
//!
//! Tracks a small interpolated-string sub-state on top of the ordinary
//! token scan (`None`, `InText`, `InExpr`, plus a brace-depth counter for
//! nested `{}` inside an interpolation). Also remembers the previous
//! token's kind, used only to recognize a `{N}` bit-width specifier right
//! after `int`/`float`/`data`/`signed`/`unsigned` as one token rather than
//! an ordinary brace. Errors never panic: an invalid character,
//! unterminated string, or bad escape produces an `Error` token and
//! scanning continues — diagnostics are collected, not thrown.

use crate::diagnostics::{Diagnostic, DiagnosticKind, ErrorCollector};
use crate::source::{Source, SourceRange};
use crate::token::{keyword_kind, Literal, NumberBase, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IStringState {
    None,
    InText,
    InExpr,
}

/// Tokenizer position + i-string sub-state. `peek_token` snapshots and
/// restores this whole struct so it never observes a side effect: offset,
/// line/column, and sub-state are all unchanged by a peek.
#[derive(Clone, Copy)]
struct Cursor {
    offset: u32,
    istring_state: IStringState,
    brace_depth: u32,
    /// Kind of the last token handed out, consulted only to disambiguate a
    /// bare `{` right after a numeric type keyword from an ordinary block.
    prev_kind: Option<TokenKind>,
}

pub struct Tokenizer<'a> {
    source: &'a Source,
    bytes: &'a [u8],
    cursor: Cursor,
    peeked: Option<(Token, Cursor)>,
}

impl<'a> Tokenizer<'a> {
    #[must_use]
    pub fn new(source: &'a Source) -> Self {
        Self {
            source,
            bytes: source.text().as_bytes(),
            cursor: Cursor {
                offset: 0,
                istring_state: IStringState::None,
                brace_depth: 0,
                prev_kind: None,
            },
            peeked: None,
        }
    }

    #[must_use]
    fn at(&self, offset: u32) -> Option<u8> {
        self.bytes.get(offset as usize).copied()
    }

    #[must_use]
    fn current(&self) -> Option<u8> {
        self.at(self.cursor.offset)
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.current()?;
        self.cursor.offset += 1;
        Some(b)
    }

    fn matches(&self, offset: u32, b: u8) -> bool {
        self.at(offset) == Some(b)
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&mut self, errors: &mut ErrorCollector) -> Token {
        if self.peeked.is_none() {
            let saved = self.cursor;
            let tok = self.scan_token(errors);
            let after = self.cursor;
            self.cursor = saved;
            self.peeked = Some((tok, after));
        }
        self.peeked.as_ref().unwrap().0.clone()
    }

    /// Consumes and returns the next token.
    pub fn next_token(&mut self, errors: &mut ErrorCollector) -> Token {
        if let Some((tok, after)) = self.peeked.take() {
            self.cursor = after;
            return tok;
        }
        self.scan_token(errors)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.current() {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.cursor.offset += 1;
                }
                Some(b'/') if self.matches(self.cursor.offset + 1, b'/') => {
                    while !matches!(self.current(), None | Some(b'\n')) {
                        self.cursor.offset += 1;
                    }
                }
                Some(b'/') if self.matches(self.cursor.offset + 1, b'*') => {
                    self.cursor.offset += 2;
                    while !(self.current().is_none() || (self.matches(self.cursor.offset, b'*') && self.matches(self.cursor.offset + 1, b'/'))) {
                        self.cursor.offset += 1;
                    }
                    if self.current().is_some() {
                        self.cursor.offset += 2;
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_token(&mut self, errors: &mut ErrorCollector) -> Token {
        let tok = self.scan_token_raw(errors);
        self.cursor.prev_kind = Some(tok.kind);
        tok
    }

    fn scan_token_raw(&mut self, errors: &mut ErrorCollector) -> Token {
        if self.cursor.istring_state == IStringState::InText {
            return self.scan_istring_text();
        }

        self.skip_trivia();
        let start = self.cursor.offset;
        let Some(b) = self.current() else {
            return Token::simple(TokenKind::EndOfFile, SourceRange::new(start, start));
        };

        if b == b'i' && self.matches(start + 1, b'"') {
            self.cursor.offset += 2;
            self.cursor.istring_state = IStringState::InText;
            return Token::simple(TokenKind::IStringStart, SourceRange::new(start, self.cursor.offset));
        }

        if is_ident_start(b) {
            return self.scan_identifier_or_keyword(start);
        }
        if b.is_ascii_digit() {
            return self.scan_number(start, errors);
        }
        match b {
            b'"' => self.scan_string(start, errors),
            b'\'' => self.scan_char(start, errors),
            _ => self.scan_operator(start, errors),
        }
    }

    fn scan_identifier_or_keyword(&mut self, start: u32) -> Token {
        while self.current().is_some_and(is_ident_continue) {
            self.cursor.offset += 1;
        }
        let range = SourceRange::new(start, self.cursor.offset);
        let text = self.source.slice(range);
        if let Some(kw) = keyword_kind(text) {
            if kw == TokenKind::KwTrue {
                return Token::literal(TokenKind::BoolLiteral, range, Literal::Bool(true));
            }
            if kw == TokenKind::KwFalse {
                return Token::literal(TokenKind::BoolLiteral, range, Literal::Bool(false));
            }
            return Token::simple(kw, range);
        }
        Token::simple(TokenKind::Identifier, range)
    }

    fn scan_number(&mut self, start: u32, errors: &mut ErrorCollector) -> Token {
        // Hex: 0x...
        if self.current() == Some(b'0') && matches!(self.at(self.cursor.offset + 1), Some(b'x' | b'X')) {
            self.cursor.offset += 2;
            let digits_start = self.cursor.offset;
            while self.current().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.cursor.offset += 1;
            }
            let range = SourceRange::new(start, self.cursor.offset);
            let digits = self.source.slice(SourceRange::new(digits_start, self.cursor.offset));
            return match i64::from_str_radix(digits, 16) {
                Ok(value) => Token::literal(
                    TokenKind::IntLiteral,
                    range,
                    Literal::Int { value, base: NumberBase::Hex, bits: None },
                ),
                Err(_) => self.emit_lex_error(range, "invalid hex literal", errors),
            };
        }

        let digits_start = self.cursor.offset;
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.offset += 1;
        }

        // Float: has a '.' followed by a digit, or an exponent.
        let mut is_float = false;
        if self.current() == Some(b'.') && self.at(self.cursor.offset + 1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.cursor.offset += 1;
            while self.current().is_some_and(|c| c.is_ascii_digit()) {
                self.cursor.offset += 1;
            }
        }
        if matches!(self.current(), Some(b'e' | b'E')) {
            let mark = self.cursor.offset;
            self.cursor.offset += 1;
            if matches!(self.current(), Some(b'+' | b'-')) {
                self.cursor.offset += 1;
            }
            if self.current().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                while self.current().is_some_and(|c| c.is_ascii_digit()) {
                    self.cursor.offset += 1;
                }
            } else {
                self.cursor.offset = mark;
            }
        }

        // Binary/octal suffix forms: `[01]+b`, `[0-7]+o`.
        if !is_float {
            if self.current() == Some(b'b') && self.source.slice(SourceRange::new(digits_start, self.cursor.offset)).bytes().all(|c| c == b'0' || c == b'1') {
                let digits = self.source.slice(SourceRange::new(digits_start, self.cursor.offset)).to_owned();
                self.cursor.offset += 1;
                let range = SourceRange::new(start, self.cursor.offset);
                return match i64::from_str_radix(&digits, 2) {
                    Ok(value) => Token::literal(TokenKind::IntLiteral, range, Literal::Int { value, base: NumberBase::Binary, bits: None }),
                    Err(_) => self.emit_lex_error(range, "invalid binary literal", errors),
                };
            }
            if self.current() == Some(b'o') {
                let digits = self.source.slice(SourceRange::new(digits_start, self.cursor.offset)).to_owned();
                self.cursor.offset += 1;
                let range = SourceRange::new(start, self.cursor.offset);
                return match i64::from_str_radix(&digits, 8) {
                    Ok(value) => Token::literal(TokenKind::IntLiteral, range, Literal::Int { value, base: NumberBase::Octal, bits: None }),
                    Err(_) => self.emit_lex_error(range, "invalid octal literal", errors),
                };
            }
        }

        let range = SourceRange::new(start, self.cursor.offset);
        let text = self.source.slice(range);
        if is_float {
            match text.parse::<f64>() {
                Ok(value) => Token::literal(TokenKind::FloatLiteral, range, Literal::Float(value)),
                Err(_) => self.emit_lex_error(range, "invalid float literal", errors),
            }
        } else {
            match text.parse::<i64>() {
                Ok(value) => Token::literal(TokenKind::IntLiteral, range, Literal::Int { value, base: NumberBase::Decimal, bits: None }),
                Err(_) => self.emit_lex_error(range, "invalid integer literal", errors),
            }
        }
    }

    fn scan_escape(&mut self, errors: &mut ErrorCollector) -> Option<char> {
        let esc_start = self.cursor.offset;
        self.cursor.offset += 1; // consume '\'
        let Some(b) = self.bump() else {
            self.emit_lex_error(SourceRange::new(esc_start, self.cursor.offset), "unterminated escape sequence", errors);
            return None;
        };
        Some(match b {
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'\\' => '\\',
            b'"' => '"',
            b'\'' => '\'',
            b'0' => '\0',
            b'x' => {
                let digits_start = self.cursor.offset;
                for _ in 0..2 {
                    self.bump();
                }
                let text = self.source.slice(SourceRange::new(digits_start, self.cursor.offset));
                match u32::from_str_radix(text, 16).ok().and_then(char::from_u32) {
                    Some(c) => c,
                    None => {
                        self.emit_lex_error(SourceRange::new(esc_start, self.cursor.offset), "invalid \\x escape", errors);
                        return None;
                    }
                }
            }
            b'u' => {
                let digits_start = self.cursor.offset;
                for _ in 0..4 {
                    self.bump();
                }
                let text = self.source.slice(SourceRange::new(digits_start, self.cursor.offset));
                match u32::from_str_radix(text, 16).ok().and_then(char::from_u32) {
                    Some(c) => c,
                    None => {
                        self.emit_lex_error(SourceRange::new(esc_start, self.cursor.offset), "invalid \\u escape", errors);
                        return None;
                    }
                }
            }
            other => {
                self.emit_lex_error(
                    SourceRange::new(esc_start, self.cursor.offset),
                    format!("invalid escape sequence '\\{}'", other as char),
                    errors,
                );
                return None;
            }
        })
    }

    fn scan_string(&mut self, start: u32, errors: &mut ErrorCollector) -> Token {
        self.cursor.offset += 1; // opening quote
        let mut value = String::new();
        loop {
            match self.current() {
                None | Some(b'\n') => {
                    return self.emit_lex_error(SourceRange::new(start, self.cursor.offset), "unterminated string literal", errors);
                }
                Some(b'"') => {
                    self.cursor.offset += 1;
                    break;
                }
                Some(b'\\') => {
                    if let Some(c) = self.scan_escape(errors) {
                        value.push(c);
                    }
                }
                _ => {
                    let ch_start = self.cursor.offset as usize;
                    let ch = self.source.text()[ch_start..].chars().next().unwrap();
                    self.cursor.offset += ch.len_utf8() as u32;
                    value.push(ch);
                }
            }
        }
        Token::literal(TokenKind::StringLiteral, SourceRange::new(start, self.cursor.offset), Literal::Str(value))
    }

    fn scan_char(&mut self, start: u32, errors: &mut ErrorCollector) -> Token {
        self.cursor.offset += 1; // opening quote
        let ch = match self.current() {
            Some(b'\\') => self.scan_escape(errors),
            None | Some(b'\'') => {
                return self.emit_lex_error(SourceRange::new(start, self.cursor.offset), "empty char literal", errors);
            }
            _ => {
                let ch_start = self.cursor.offset as usize;
                let c = self.source.text()[ch_start..].chars().next().unwrap();
                self.cursor.offset += c.len_utf8() as u32;
                Some(c)
            }
        };
        if self.current() != Some(b'\'') {
            return self.emit_lex_error(SourceRange::new(start, self.cursor.offset), "char literal must contain exactly one character", errors);
        }
        self.cursor.offset += 1;
        let Some(ch) = ch else {
            return Token::error(SourceRange::new(start, self.cursor.offset), "invalid char literal");
        };
        Token::literal(TokenKind::CharLiteral, SourceRange::new(start, self.cursor.offset), Literal::Char(ch))
    }

    /// `IN_TEXT` state: buffer literal characters (processing escapes) until
    /// the closing `"`, or the `":{` transition into the expression list.
    fn scan_istring_text(&mut self) -> Token {
        let start = self.cursor.offset;
        let mut dummy_errors = ErrorCollector::new();
        let mut value = String::new();
        loop {
            match self.current() {
                None => {
                    self.cursor.istring_state = IStringState::None;
                    return Token::error(SourceRange::new(start, self.cursor.offset), "unterminated interpolated string");
                }
                Some(b'"') => {
                    if self.matches(self.cursor.offset + 1, b':') && self.matches(self.cursor.offset + 2, b'{') {
                        let range = SourceRange::new(start, self.cursor.offset);
                        self.cursor.offset += 3;
                        self.cursor.istring_state = IStringState::InExpr;
                        self.cursor.brace_depth = 0;
                        return Token::literal(TokenKind::IStringExprStart, range, Literal::Str(value));
                    }
                    let range = SourceRange::new(start, self.cursor.offset);
                    self.cursor.offset += 1;
                    self.cursor.istring_state = IStringState::None;
                    return Token::literal(TokenKind::IStringEnd, range, Literal::Str(value));
                }
                Some(b'\\') => {
                    if let Some(c) = self.scan_escape(&mut dummy_errors) {
                        value.push(c);
                    }
                }
                _ => {
                    let ch_start = self.cursor.offset as usize;
                    let ch = self.source.text()[ch_start..].chars().next().unwrap();
                    self.cursor.offset += ch.len_utf8() as u32;
                    value.push(ch);
                }
            }
        }
    }

    fn emit_lex_error(&mut self, range: SourceRange, message: impl Into<String>, errors: &mut ErrorCollector) -> Token {
        let message = message.into();
        errors.push(Diagnostic::error(DiagnosticKind::Lex, message.clone(), range));
        Token::error(range, message)
    }

    fn scan_operator(&mut self, start: u32, errors: &mut ErrorCollector) -> Token {
        use TokenKind::*;
        let b = self.bump().unwrap();

        // Exiting IN_EXPR: track brace depth; `}` at depth 0 followed by `;`
        // closes the expression list and emits IStringExprEnd.
        if self.cursor.istring_state == IStringState::InExpr {
            if b == b'{' {
                self.cursor.brace_depth += 1;
            } else if b == b'}' {
                if self.cursor.brace_depth == 0 {
                    let range = SourceRange::new(start, self.cursor.offset);
                    self.cursor.istring_state = IStringState::None;
                    return Token::simple(TokenKind::IStringExprEnd, range);
                }
                self.cursor.brace_depth -= 1;
            }
        }

        macro_rules! two {
            ($next:expr, $two_kind:expr, $one_kind:expr) => {
                if self.current() == Some($next) {
                    self.cursor.offset += 1;
                    $two_kind
                } else {
                    $one_kind
                }
            };
        }

        let kind = match b {
            b'+' => {
                if self.current() == Some(b'+') {
                    self.cursor.offset += 1;
                    PlusPlus
                } else {
                    two!(b'=', PlusEq, Plus)
                }
            }
            b'-' => {
                if self.current() == Some(b'-') {
                    self.cursor.offset += 1;
                    MinusMinus
                } else if self.current() == Some(b'>') {
                    self.cursor.offset += 1;
                    Arrow
                } else {
                    two!(b'=', MinusEq, Minus)
                }
            }
            b'*' => {
                if self.current() == Some(b'*') {
                    self.cursor.offset += 1;
                    StarStar
                } else {
                    two!(b'=', StarEq, Star)
                }
            }
            b'/' => two!(b'=', SlashEq, Slash),
            b'%' => two!(b'=', PercentEq, Percent),
            b'^' => two!(b'=', CaretEq, Caret),
            b'~' => Tilde,
            b'&' => {
                if self.current() == Some(b'&') {
                    self.cursor.offset += 1;
                    AmpAmp
                } else {
                    two!(b'=', AmpEq, Amp)
                }
            }
            b'|' => {
                if self.current() == Some(b'|') {
                    self.cursor.offset += 1;
                    PipePipe
                } else {
                    two!(b'=', PipeEq, Pipe)
                }
            }
            b'!' => two!(b'=', BangEq, Bang),
            b'=' => two!(b'=', EqEq, Eq),
            b'<' => {
                if self.current() == Some(b'<') {
                    self.cursor.offset += 1;
                    two!(b'=', ShlEq, Shl)
                } else {
                    two!(b'=', LtEq, Lt)
                }
            }
            b'>' => {
                if self.current() == Some(b'>') {
                    self.cursor.offset += 1;
                    two!(b'=', ShrEq, Shr)
                } else {
                    two!(b'=', GtEq, Gt)
                }
            }
            b'.' => Dot,
            b':' => {
                if self.current() == Some(b':') {
                    self.cursor.offset += 1;
                    ColonColon
                } else {
                    Colon
                }
            }
            b'@' => At,
            b'?' => {
                if self.current() == Some(b'?') {
                    self.cursor.offset += 1;
                    QuestionQuestion
                } else if self.current() == Some(b'.') {
                    self.cursor.offset += 1;
                    QuestionDot
                } else {
                    Question
                }
            }
            b';' => Semicolon,
            b',' => Comma,
            b'(' => LParen,
            b')' => RParen,
            b'{' => {
                // `int{32}`/`float{64}`/`data{8}` etc: a `{` right after a
                // numeric type keyword opens a bit-width specifier, not a
                // block. Only attempted outside an i-string expression,
                // where `{`/`}` already carry brace-depth meaning.
                let after_numeric_type = matches!(
                    self.cursor.prev_kind,
                    Some(KwInt | KwFloat | KwData | KwSigned | KwUnsigned)
                );
                if after_numeric_type && self.cursor.istring_state != IStringState::InExpr {
                    if let Some(tok) = self.try_scan_bit_width_specifier(start, errors) {
                        return tok;
                    }
                }
                LBrace
            }
            b'}' => RBrace,
            b'[' => LBracket,
            b']' => RBracket,
            other => {
                return self.emit_lex_error(
                    SourceRange::new(start, self.cursor.offset),
                    format!("unexpected character '{}'", other as char),
                    errors,
                );
            }
        };
        Token::simple(kind, SourceRange::new(start, self.cursor.offset))
    }

    /// `brace_start` points just past the `{` that was already consumed.
    /// Rolls back and returns `None` if what follows isn't `digits '}'`, so
    /// the caller falls back to emitting a plain `LBrace`.
    fn try_scan_bit_width_specifier(&mut self, brace_start: u32, errors: &mut ErrorCollector) -> Option<Token> {
        let mark = self.cursor;
        self.skip_trivia();
        let digits_start = self.cursor.offset;
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.offset += 1;
        }
        if self.cursor.offset == digits_start {
            self.cursor = mark;
            return None;
        }
        let digits = self.source.slice(SourceRange::new(digits_start, self.cursor.offset)).to_owned();
        self.skip_trivia();
        if self.current() != Some(b'}') {
            self.cursor = mark;
            return None;
        }
        self.cursor.offset += 1;
        let range = SourceRange::new(brace_start, self.cursor.offset);
        match digits.parse::<i64>() {
            Ok(value) => Some(Token::literal(
                TokenKind::BitWidthSpecifier,
                range,
                Literal::Int { value, base: NumberBase::Decimal, bits: None },
            )),
            Err(_) => Some(self.emit_lex_error(range, "bit-width specifier out of range", errors)),
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Tokenizes the whole source, returning every non-`EndOfFile` token
/// followed by one trailing `EndOfFile`. Used by tests and by `-tokens`.
pub fn tokenize_all(source: &Source, errors: &mut ErrorCollector) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(source);
    let mut tokens = Vec::new();
    loop {
        let tok = tokenizer.next_token(errors);
        let is_eof = tok.kind == TokenKind::EndOfFile;
        tokens.push(tok);
        if is_eof {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let source = Source::new("t.fx", src);
        let mut errors = ErrorCollector::new();
        tokenize_all(&source, &mut errors).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizer_totality_ends_with_eof() {
        let source = Source::new("t.fx", "int x = 10 + 20;");
        let mut errors = ErrorCollector::new();
        let tokens = tokenize_all(&source, &mut errors);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn position_monotonicity_holds() {
        let source = Source::new("t.fx", "int x = 10 + 20 * foo(bar, 3.5);");
        let mut errors = ErrorCollector::new();
        let tokens = tokenize_all(&source, &mut errors);
        for w in tokens.windows(2) {
            assert!(w[0].range.end <= w[1].range.start, "{:?} then {:?}", w[0], w[1]);
        }
    }

    #[test]
    fn peek_is_idempotent() {
        let source = Source::new("t.fx", "a + b");
        let mut errors = ErrorCollector::new();
        let mut tok = Tokenizer::new(&source);
        let p1 = tok.peek_token(&mut errors);
        let p2 = tok.peek_token(&mut errors);
        assert_eq!(p1.kind, p2.kind);
        assert_eq!(p1.range, p2.range);
        let n1 = tok.next_token(&mut errors);
        assert_eq!(n1.kind, p1.kind);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(kinds("int foobar"), vec![TokenKind::KwInt, TokenKind::Identifier, TokenKind::EndOfFile]);
    }

    #[test]
    fn bit_width_specifier_follows_a_numeric_type_keyword() {
        assert_eq!(
            kinds("int{16} x"),
            vec![TokenKind::KwInt, TokenKind::BitWidthSpecifier, TokenKind::Identifier, TokenKind::EndOfFile]
        );
        let source = Source::new("t.fx", "data{8} y");
        let mut errors = ErrorCollector::new();
        let toks = tokenize_all(&source, &mut errors);
        match &toks[1].literal {
            Some(Literal::Int { value: 8, .. }) => {}
            other => panic!("expected bit-width payload of 8, got {other:?}"),
        }
    }

    #[test]
    fn brace_not_after_a_numeric_type_stays_a_block() {
        assert_eq!(
            kinds("def f(){ return; }"),
            vec![
                TokenKind::KwDef,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::KwReturn,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn integer_bases() {
        let source = Source::new("t.fx", "0xFF 101b 17o 42");
        let mut errors = ErrorCollector::new();
        let toks = tokenize_all(&source, &mut errors);
        let values: Vec<_> = toks
            .iter()
            .filter_map(|t| match &t.literal {
                Some(Literal::Int { value, .. }) => Some(*value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![255, 5, 15, 42]);
    }

    #[test]
    fn float_literal_with_exponent() {
        let source = Source::new("t.fx", "1.5e2");
        let mut errors = ErrorCollector::new();
        let toks = tokenize_all(&source, &mut errors);
        match &toks[0].literal {
            Some(Literal::Float(v)) => assert!((*v - 150.0).abs() < f64::EPSILON),
            other => panic!("expected float literal, got {other:?}"),
        }
    }

    #[test]
    fn string_escapes_are_decoded() {
        let source = Source::new("t.fx", r#""a\nb\tc""#);
        let mut errors = ErrorCollector::new();
        let toks = tokenize_all(&source, &mut errors);
        match &toks[0].literal {
            Some(Literal::Str(s)) => assert_eq!(s, "a\nb\tc"),
            other => panic!("expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_string_produces_error_token_not_panic() {
        let source = Source::new("t.fx", "\"abc");
        let mut errors = ErrorCollector::new();
        let toks = tokenize_all(&source, &mut errors);
        assert_eq!(toks[0].kind, TokenKind::Error);
        assert!(errors.had_error());
    }

    #[test]
    fn interpolated_string_splits_format_and_expressions() {
        let kinds = kinds(r#"i"Hello, {}!":{name;}"#);
        assert_eq!(
            kinds,
            vec![
                TokenKind::IStringStart,
                TokenKind::IStringExprStart,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::IStringExprEnd,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn interpolated_string_with_multiple_expressions_and_nested_braces() {
        let kinds = kinds(r#"i"{} {}":{a; foo({1;});}"#);
        assert!(kinds.contains(&TokenKind::IStringStart));
        assert!(kinds.contains(&TokenKind::IStringExprEnd));
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(kinds("int x; // trailing\nint y;"), kinds("int x;\nint y;"));
        assert_eq!(kinds("int /* mid */ x;"), kinds("int x;"));
    }
}
