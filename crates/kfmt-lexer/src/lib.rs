//! Kotlin lexer -- tokenizer for the Kotlin subset the formatter handles.
//!
//! Unlike a compiler front end, the lexer keeps ALL trivia: whitespace runs
//! (newlines included in the token text), line comments, block comments, and
//! KDoc comments each become tokens. The formatter needs them to decide where
//! blank lines and comment blocks go.

mod cursor;

use cursor::Cursor;
use kfmt_common::error::{LexError, LexErrorKind};
use kfmt_common::span::Span;
use kfmt_common::token::{keyword_from_str, Token, TokenKind};

/// Tracks what the lexer is currently doing.
#[derive(Debug, Clone, PartialEq)]
enum LexerState {
    /// Normal tokenization (top level or inside `${...}`).
    Normal,
    /// Inside a single-line string template (after StringStart).
    InString,
    /// Inside a raw `"""` string (after RawStringStart).
    InRawString,
    /// Inside `${...}` string interpolation.
    InInterpolation { brace_depth: u32 },
}

/// The Kotlin lexer. Converts source text into a stream of tokens.
///
/// Wraps a [`Cursor`] and implements `Iterator<Item = Token>`. A state
/// stack handles string templates and nested interpolation contexts.
/// Errors are collected, not panicked; callers check
/// [`Lexer::into_errors`] or use [`tokenize`].
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Whether we have already emitted the `Eof` token.
    emitted_eof: bool,
    /// Pending tokens to emit before resuming normal lexing.
    pending: Vec<Token>,
    /// State stack for tracking nested lexing contexts.
    state_stack: Vec<LexerState>,
    /// Errors collected along the way.
    errors: Vec<LexError>,
}

/// Tokenize the entire source, returning the tokens (with the final `Eof`)
/// and any lexer errors.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    for token in &mut lexer {
        tokens.push(token);
    }
    (tokens, lexer.errors)
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
            pending: Vec::new(),
            state_stack: vec![LexerState::Normal],
            errors: Vec::new(),
        }
    }

    /// Errors collected so far. Complete once the iterator is exhausted.
    pub fn into_errors(self) -> Vec<LexError> {
        self.errors
    }

    fn error(&mut self, kind: LexErrorKind, start: u32) {
        self.errors
            .push(LexError::new(kind, Span::new(start, self.cursor.pos())));
    }

    /// A token from `start` up to the current position.
    fn token(&self, kind: TokenKind, start: u32) -> Token {
        Token::new(kind, start, self.cursor.pos())
    }

    /// Produce the next token based on current state.
    fn produce_token(&mut self) -> Token {
        let state = self
            .state_stack
            .last()
            .expect("state stack must never be empty")
            .clone();
        match state {
            LexerState::Normal | LexerState::InInterpolation { .. } => self.lex_normal(),
            LexerState::InString => self.lex_string_content(),
            LexerState::InRawString => self.lex_raw_string_content(),
        }
    }

    // ── Normal mode ────────────────────────────────────────────────────

    fn lex_normal(&mut self) -> Token {
        let start = self.cursor.pos();

        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            // Whitespace runs, newlines included, become one trivia token.
            ' ' | '\t' | '\n' | '\r' => {
                self.cursor
                    .bump_while(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
                self.token(TokenKind::Whitespace, start)
            }

            '(' => self.single(TokenKind::LParen, start),
            ')' => self.single(TokenKind::RParen, start),
            '[' => self.single(TokenKind::LBracket, start),
            ']' => self.single(TokenKind::RBracket, start),
            '{' => self.lex_lbrace(start),
            '}' => self.lex_rbrace(start),
            ',' => self.single(TokenKind::Comma, start),
            ';' => self.single(TokenKind::Semicolon, start),
            '@' => self.single(TokenKind::At, start),

            // Compound operators are matched longest-first as prefixes.
            '=' => self.lex_operator(start, &[("==", TokenKind::EqEq)], TokenKind::Eq),
            '!' => self.lex_operator(start, &[("!=", TokenKind::NotEq)], TokenKind::Bang),
            '<' => self.lex_operator(start, &[("<=", TokenKind::LtEq)], TokenKind::Lt),
            '>' => self.lex_operator(start, &[(">=", TokenKind::GtEq)], TokenKind::Gt),
            '-' => self.lex_operator(start, &[("->", TokenKind::Arrow)], TokenKind::Minus),
            ':' => self.lex_operator(start, &[("::", TokenKind::ColonColon)], TokenKind::Colon),
            '.' => self.lex_operator(start, &[("..", TokenKind::DotDot)], TokenKind::Dot),
            '?' => self.lex_operator(
                start,
                &[
                    ("?.", TokenKind::QuestionDot),
                    ("?:", TokenKind::Elvis),
                ],
                TokenKind::Question,
            ),

            // `&` and `|` only exist doubled in this subset.
            '&' => {
                if self.cursor.eat("&&") {
                    self.token(TokenKind::AmpAmp, start)
                } else {
                    self.cursor.bump();
                    self.error(LexErrorKind::UnexpectedCharacter('&'), start);
                    self.token(TokenKind::Error, start)
                }
            }
            '|' => {
                if self.cursor.eat("||") {
                    self.token(TokenKind::PipePipe, start)
                } else {
                    self.cursor.bump();
                    self.error(LexErrorKind::UnexpectedCharacter('|'), start);
                    self.token(TokenKind::Error, start)
                }
            }

            '+' => self.single(TokenKind::Plus, start),
            '*' => self.single(TokenKind::Star, start),
            '%' => self.single(TokenKind::Percent, start),
            '$' => self.single(TokenKind::Dollar, start),

            '/' => {
                if self.cursor.at("//") {
                    self.cursor.bump_while(|c| c != '\n' && c != '\r');
                    self.token(TokenKind::LineComment, start)
                } else if self.cursor.at("/*") {
                    self.lex_block_comment(start)
                } else {
                    self.single(TokenKind::Slash, start)
                }
            }

            '0'..='9' => self.lex_number(start),
            '\'' => self.lex_char_literal(start),

            '"' => {
                if self.cursor.eat("\"\"\"") {
                    self.state_stack.push(LexerState::InRawString);
                    self.token(TokenKind::RawStringStart, start)
                } else {
                    self.cursor.bump();
                    self.state_stack.push(LexerState::InString);
                    self.token(TokenKind::StringStart, start)
                }
            }

            c if is_ident_start(c) => self.lex_ident(start),

            _ => {
                self.cursor.bump();
                self.error(LexErrorKind::UnexpectedCharacter(c), start);
                self.token(TokenKind::Error, start)
            }
        }
    }

    // ── Helpers ────────────────────────────────────────────────────────

    /// Consume one character and return a token of the given kind.
    fn single(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.bump();
        self.token(kind, start)
    }

    /// Try the compound spellings in order; fall back to consuming one
    /// character as `fallback`.
    fn lex_operator(
        &mut self,
        start: u32,
        compound: &[(&str, TokenKind)],
        fallback: TokenKind,
    ) -> Token {
        for (text, kind) in compound {
            if self.cursor.eat(text) {
                return self.token(kind.clone(), start);
            }
        }
        self.cursor.bump();
        self.token(fallback, start)
    }

    /// `{` -- inside an interpolation this deepens the brace count.
    fn lex_lbrace(&mut self, start: u32) -> Token {
        if let Some(LexerState::InInterpolation { brace_depth }) = self.state_stack.last_mut() {
            *brace_depth += 1;
        }
        self.single(TokenKind::LBrace, start)
    }

    /// `}` -- at interpolation depth 0 this closes the interpolation.
    fn lex_rbrace(&mut self, start: u32) -> Token {
        if let Some(LexerState::InInterpolation { brace_depth }) = self.state_stack.last() {
            if *brace_depth == 0 {
                self.cursor.bump();
                self.state_stack.pop(); // back to InString
                return self.token(TokenKind::InterpolationEnd, start);
            }
            if let Some(LexerState::InInterpolation { brace_depth }) = self.state_stack.last_mut()
            {
                *brace_depth -= 1;
            }
        }
        self.single(TokenKind::RBrace, start)
    }

    // ── Comments ──────────────────────────────────────────────────────

    /// `/* ... */` or `/** ... */`. Kotlin block comments nest.
    fn lex_block_comment(&mut self, start: u32) -> Token {
        self.cursor.eat("/*");
        // `/**` opens KDoc -- unless it is the empty comment `/**/`.
        let is_kdoc = self.cursor.at("*") && !self.cursor.at("*/");
        let mut depth: u32 = 1;

        while depth > 0 {
            if self.cursor.eat("/*") {
                depth += 1;
            } else if self.cursor.eat("*/") {
                depth -= 1;
            } else if self.cursor.bump().is_none() {
                self.error(LexErrorKind::UnterminatedBlockComment, start);
                return self.token(TokenKind::Error, start);
            }
        }

        let kind = if is_kdoc {
            TokenKind::KDoc
        } else {
            TokenKind::BlockComment
        };
        self.token(kind, start)
    }

    // ── Number literals ───────────────────────────────────────────────

    /// Decimal, hex (`0x`), binary (`0b`), floats, scientific notation,
    /// `_` separators, and `L`/`f`/`F` suffixes.
    fn lex_number(&mut self, start: u32) -> Token {
        let first = self.cursor.bump().unwrap_or('0');

        if first == '0' && (self.cursor.eat("x") || self.cursor.eat("X")) {
            self.cursor.bump_while(|c| c.is_ascii_hexdigit() || c == '_');
            self.cursor.eat("L");
            return self.token(TokenKind::IntLiteral, start);
        }
        if first == '0' && (self.cursor.eat("b") || self.cursor.eat("B")) {
            self.cursor.bump_while(|c| c == '0' || c == '1' || c == '_');
            self.cursor.eat("L");
            return self.token(TokenKind::IntLiteral, start);
        }

        self.cursor.bump_while(|c| c.is_ascii_digit() || c == '_');

        let mut is_float = false;

        // A `.` continues the literal only when a digit follows (`..` is
        // a range operator).
        if self.cursor.at(".")
            && self.cursor.rest()[1..].starts_with(|c: char| c.is_ascii_digit())
        {
            is_float = true;
            self.cursor.bump();
            self.cursor.bump_while(|c| c.is_ascii_digit() || c == '_');
        }

        if self.cursor.eat("e") || self.cursor.eat("E") {
            is_float = true;
            let _ = self.cursor.eat("+") || self.cursor.eat("-");
            self.cursor.bump_while(|c| c.is_ascii_digit());
        }

        if self.cursor.eat("f") || self.cursor.eat("F") {
            is_float = true;
        } else if !is_float {
            self.cursor.eat("L");
        }

        let kind = if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        };
        self.token(kind, start)
    }

    /// `'a'`, `'\n'`, `'A'`.
    fn lex_char_literal(&mut self, start: u32) -> Token {
        self.cursor.bump(); // opening '
        match self.cursor.peek() {
            Some('\\') => {
                self.cursor.bump();
                self.cursor.bump();
                self.cursor.bump_while(|c| c.is_ascii_hexdigit());
            }
            Some('\'') | None => {
                self.cursor.bump();
                self.error(LexErrorKind::MalformedCharLiteral, start);
                return self.token(TokenKind::Error, start);
            }
            Some(_) => {
                self.cursor.bump();
            }
        }
        if self.cursor.eat("'") {
            self.token(TokenKind::CharLiteral, start)
        } else {
            self.error(LexErrorKind::MalformedCharLiteral, start);
            self.token(TokenKind::Error, start)
        }
    }

    // ── String templates ──────────────────────────────────────────────

    /// Content inside a single-line string template.
    ///
    /// Stops at `${` (braced interpolation), `$ident` (short
    /// interpolation), the closing `"`, a raw newline (unterminated), or
    /// end of input.
    fn lex_string_content(&mut self) -> Token {
        let start = self.cursor.pos();

        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    self.state_stack.pop();
                    let end = self.cursor.pos();
                    self.errors.push(LexError::new(
                        LexErrorKind::UnterminatedString,
                        Span::new(start, end),
                    ));
                    if end > start {
                        self.pending.push(Token::new(TokenKind::Error, end, end));
                        return Token::new(TokenKind::StringContent, start, end);
                    }
                    return Token::new(TokenKind::Error, start, end);
                }
                Some('$') if self.cursor.at("${") => {
                    let content_end = self.cursor.pos();
                    self.cursor.eat("${");
                    self.state_stack
                        .push(LexerState::InInterpolation { brace_depth: 0 });
                    self.pending.push(Token::new(
                        TokenKind::InterpolationStart,
                        content_end,
                        self.cursor.pos(),
                    ));
                    if content_end > start {
                        return Token::new(TokenKind::StringContent, start, content_end);
                    }
                    return self.pending.remove(0);
                }
                Some('$')
                    if self
                        .cursor
                        .rest()
                        .chars()
                        .nth(1)
                        .is_some_and(is_ident_start) =>
                {
                    let content_end = self.cursor.pos();
                    if content_end > start {
                        return Token::new(TokenKind::StringContent, start, content_end);
                    }
                    self.cursor.bump(); // $
                    self.cursor.bump(); // first identifier char
                    self.cursor.bump_while(is_ident_continue);
                    return Token::new(TokenKind::ShortInterpolation, content_end, self.cursor.pos());
                }
                Some('"') => {
                    let content_end = self.cursor.pos();
                    self.cursor.bump();
                    self.state_stack.pop();
                    self.pending.push(Token::new(
                        TokenKind::StringEnd,
                        content_end,
                        self.cursor.pos(),
                    ));
                    if content_end > start {
                        return Token::new(TokenKind::StringContent, start, content_end);
                    }
                    return self.pending.remove(0);
                }
                Some('\\') => {
                    self.cursor.bump();
                    self.cursor.bump(); // escaped char stays in content
                }
                Some(_) => {
                    self.cursor.bump();
                }
            }
        }
    }

    /// Verbatim content inside a raw `"""` string.
    ///
    /// Raw strings have no escapes; interpolations are left as text, since
    /// the formatter treats the whole literal as opaque.
    fn lex_raw_string_content(&mut self) -> Token {
        let start = self.cursor.pos();

        loop {
            if self.cursor.at("\"\"\"") {
                let content_end = self.cursor.pos();
                self.cursor.eat("\"\"\"");
                self.state_stack.pop();
                self.pending.push(Token::new(
                    TokenKind::RawStringEnd,
                    content_end,
                    self.cursor.pos(),
                ));
                if content_end > start {
                    return Token::new(TokenKind::RawStringContent, start, content_end);
                }
                return self.pending.remove(0);
            }
            if self.cursor.bump().is_none() {
                self.state_stack.pop();
                let end = self.cursor.pos();
                self.errors.push(LexError::new(
                    LexErrorKind::UnterminatedRawString,
                    Span::new(start, end),
                ));
                if end > start {
                    self.pending.push(Token::new(TokenKind::Error, end, end));
                    return Token::new(TokenKind::RawStringContent, start, end);
                }
                return Token::new(TokenKind::Error, start, end);
            }
        }
    }

    // ── Identifiers and keywords ──────────────────────────────────────

    /// An identifier or hard keyword. Backtick-quoted identifiers
    /// (`` `fun test` ``) are kept verbatim, backticks included.
    fn lex_ident(&mut self, start: u32) -> Token {
        if self.cursor.eat("`") {
            self.cursor.bump_while(|c| c != '`' && c != '\n');
            self.cursor.eat("`");
            return self.token(TokenKind::Ident, start);
        }

        self.cursor.bump(); // first char
        self.cursor.bump_while(is_ident_continue);
        let text = self.cursor.slice(start, self.cursor.pos());

        if text == "_" {
            return self.token(TokenKind::Underscore, start);
        }
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        self.token(kind, start)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }

        if !self.pending.is_empty() {
            let token = self.pending.remove(0);
            if token.kind == TokenKind::Eof {
                self.emitted_eof = true;
            }
            return Some(token);
        }

        let token = self.produce_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Whether a character can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '`'
}

/// Whether a character can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
