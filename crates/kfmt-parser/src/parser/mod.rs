//! Event-based parser for the Kotlin subset.
//!
//! The parser consumes a token stream and produces events (Open/Close/Advance)
//! that are later converted into a rowan green tree. This decouples parsing
//! logic from tree construction.
//!
//! # Architecture
//!
//! 1. Parse functions call `open()` to start a node, `advance()` to consume
//!    tokens, and `close()` to finish a node with its actual kind.
//! 2. Events are collected into a flat `Vec<Event>`.
//! 3. `build_tree()` converts events into a rowan `GreenNode`.
//!
//! The `open_before()` method enables wrapping a previously completed node
//! (e.g., turning `ident` into `call_expr(ident, arg_list)`) using the
//! "forward parent" technique.
//!
//! # Trivia and newlines
//!
//! Whitespace and comment tokens are trivia: invisible to `current()`/`nth()`
//! but emitted into the CST by `advance()` so the formatter can see them.
//! Newlines live inside whitespace trivia. Statement boundaries use
//! [`Parser::newline_before_current`]: a binary operator may not start a new
//! line, while `.`/`?.` chains may.

pub(crate) mod expressions;
pub(crate) mod items;

use kfmt_common::span::Span;
use kfmt_common::token::{Token, TokenKind};

use crate::error::ParseError;
use crate::syntax_kind::SyntaxKind;

/// A parser event. Events are collected during parsing and later converted
/// into a rowan green tree by [`Parser::build_tree`].
#[derive(Debug)]
enum Event {
    /// Start a new CST node. The `kind` is initially TOMBSTONE and gets
    /// patched by `close()` with the real node kind.
    ///
    /// `forward_parent` is used by `open_before()` to indicate that this
    /// node should be opened before the node at the specified event index.
    Open {
        kind: SyntaxKind,
        forward_parent: Option<usize>,
    },
    /// Finish the current CST node.
    Close,
    /// Consume the current token, advancing the token position.
    Advance,
}

/// An opaque marker for a started but not-yet-closed CST node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkOpened {
    index: usize,
}

/// An opaque marker for a completed (opened and closed) CST node.
/// Used by `open_before()` to wrap a previously completed node.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkClosed {
    index: usize,
}

/// Event-based parser for Kotlin source code.
///
/// Consumes a `Vec<Token>` (from the lexer) and source text, producing
/// events that are later converted into a rowan green tree.
pub(crate) struct Parser<'src> {
    /// All tokens from the lexer (including Eof).
    tokens: Vec<Token>,
    /// Current position in the token stream.
    pos: usize,
    /// Collected parser events.
    events: Vec<Event>,
    /// Original source text (for extracting token text via spans).
    source: &'src str,
    /// Collected parse errors.
    errors: Vec<ParseError>,
    /// Whether an error has been encountered (first-error-only strategy).
    has_error: bool,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source text.
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            source,
            errors: Vec::new(),
            has_error: false,
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    /// Returns the SyntaxKind of the current significant (non-trivia) token.
    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Returns the SyntaxKind of the Nth significant token ahead.
    ///
    /// `nth(0)` is equivalent to `current()`. Returns `SyntaxKind::EOF` if
    /// past the end of the token stream.
    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        let mut pos = self.pos;
        let mut remaining = n;
        while pos < self.tokens.len() {
            let kind = &self.tokens[pos].kind;
            if kind.is_trivia() {
                pos += 1;
                continue;
            }
            if remaining == 0 {
                return SyntaxKind::from(kind.clone());
            }
            remaining -= 1;
            pos += 1;
        }
        SyntaxKind::EOF
    }

    /// Returns the text of the current significant token.
    pub(crate) fn current_text(&self) -> &str {
        let pos = self.skip_to_significant(self.pos);
        if pos < self.tokens.len() {
            let span = &self.tokens[pos].span;
            &self.source[span.start as usize..span.end as usize]
        } else {
            ""
        }
    }

    /// Returns the span of the current significant token.
    pub(crate) fn current_span(&self) -> Span {
        let pos = self.skip_to_significant(self.pos);
        if pos < self.tokens.len() {
            self.tokens[pos].span
        } else {
            Span::at(self.source.len() as u32)
        }
    }

    /// Check if the current significant token matches the given kind.
    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    /// Check if the current significant token matches any of the given kinds.
    pub(crate) fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current())
    }

    /// Check if the current token is an identifier with exactly this text.
    /// Used for soft keywords (modifier words, `by`, ...).
    pub(crate) fn at_ident(&self, text: &str) -> bool {
        self.at(SyntaxKind::IDENT) && self.current_text() == text
    }

    /// Whether the trivia between the previous significant token and the
    /// current one contains a newline. This is the statement-boundary test:
    /// binary operators may not start a line, `.`/`?.` chains may.
    pub(crate) fn newline_before_current(&self) -> bool {
        let mut pos = self.pos;
        while pos < self.tokens.len() && self.tokens[pos].kind.is_trivia() {
            if self.tokens[pos].kind == TokenKind::Whitespace {
                let span = &self.tokens[pos].span;
                if self.source[span.start as usize..span.end as usize].contains('\n') {
                    return true;
                }
            }
            pos += 1;
        }
        false
    }

    // ── Mutation: node management ──────────────────────────────────────

    /// Start a new CST node. Returns a marker that must be passed to
    /// `close()` to finish the node.
    pub(crate) fn open(&mut self) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        mark
    }

    /// Start a new CST node BEFORE a previously completed node.
    ///
    /// Uses the "forward parent" technique: instead of physically inserting
    /// into the events vec (which would invalidate indices), we set a
    /// `forward_parent` link on the completed node's Open event.
    pub(crate) fn open_before(&mut self, completed: MarkClosed) -> MarkOpened {
        let mark = MarkOpened {
            index: self.events.len(),
        };
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            forward_parent: None,
        });
        if let Event::Open { forward_parent, .. } = &mut self.events[completed.index] {
            *forward_parent = Some(mark.index);
        }
        mark
    }

    /// Close a CST node, patching its Open event with the actual kind.
    pub(crate) fn close(&mut self, m: MarkOpened, kind: SyntaxKind) -> MarkClosed {
        if let Event::Open {
            kind: slot_kind, ..
        } = &mut self.events[m.index]
        {
            *slot_kind = kind;
        }
        self.events.push(Event::Close);
        MarkClosed { index: m.index }
    }

    // ── Mutation: token consumption ────────────────────────────────────

    /// Emit Advance events for pending trivia WITHOUT consuming a
    /// significant token. Item lists call this before opening each item,
    /// so blank lines and comments between items attach to the list node
    /// rather than becoming leading trivia of the item.
    pub(crate) fn advance_trivia(&mut self) {
        while self.pos < self.tokens.len() && self.tokens[self.pos].kind.is_trivia() {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
    }

    /// Consume the current token, emitting Advance events for all skipped
    /// trivia tokens and then for the significant token itself.
    pub(crate) fn advance(&mut self) {
        while self.pos < self.tokens.len() && self.tokens[self.pos].kind.is_trivia() {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
        if self.pos < self.tokens.len() {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
    }

    /// If the current token matches `kind`, consume it and return true.
    /// Otherwise, emit an error and return false. Sets the error flag.
    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            self.error(&format!(
                "expected {:?}, found {:?}",
                kind,
                self.current()
            ));
            false
        }
    }

    /// If the current token matches `kind`, consume it and return true.
    /// Otherwise, return false (no error emitted).
    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ── Error reporting ────────────────────────────────────────────────

    /// Record a parse error at the current position. Sets the error flag.
    pub(crate) fn error(&mut self, message: &str) {
        let span = self.current_span();
        self.errors.push(ParseError::new(message, span));
        self.has_error = true;
    }

    /// Whether the parser has encountered an error.
    /// Parse functions check this and bail early.
    pub(crate) fn has_error(&self) -> bool {
        self.has_error
    }

    // ── Internals ──────────────────────────────────────────────────────

    /// Find the position of the next significant token starting from `pos`.
    fn skip_to_significant(&self, mut pos: usize) -> usize {
        while pos < self.tokens.len() && self.tokens[pos].kind.is_trivia() {
            pos += 1;
        }
        pos
    }

    // ── Tree building ──────────────────────────────────────────────────

    /// Convert collected events into a rowan `GreenNode` and errors.
    ///
    /// Forward parents: when `open_before(completed)` is called, the
    /// completed node's Open event gets a `forward_parent` link pointing to
    /// the wrapping Open event. During tree building, when we encounter such
    /// an Open, we follow the chain, collect all kinds, and open nodes in
    /// reverse order (outermost wrapper first). The wrapper Open events are
    /// then tombstoned so they are skipped when encountered later.
    pub(crate) fn build_tree(mut self) -> (rowan::GreenNode, Vec<ParseError>) {
        let mut builder = rowan::GreenNodeBuilder::new();
        let mut token_pos: usize = 0;
        let mut forward_parents: Vec<(usize, SyntaxKind)> = Vec::new();

        let mut i = 0;
        while i < self.events.len() {
            match self.events[i] {
                Event::Open {
                    kind,
                    forward_parent,
                } => {
                    if forward_parent.is_some() {
                        forward_parents.clear();
                        let mut current = i;
                        loop {
                            let (fk, fp) = match self.events[current] {
                                Event::Open {
                                    kind,
                                    forward_parent,
                                } => (kind, forward_parent),
                                _ => unreachable!(),
                            };
                            forward_parents.push((current, fk));
                            if let Some(next) = fp {
                                current = next;
                            } else {
                                break;
                            }
                        }

                        for &(fp_idx, _) in forward_parents.iter().skip(1) {
                            if let Event::Open {
                                ref mut kind,
                                ref mut forward_parent,
                            } = self.events[fp_idx]
                            {
                                *kind = SyntaxKind::TOMBSTONE;
                                *forward_parent = None;
                            }
                        }
                        if let Event::Open {
                            ref mut forward_parent,
                            ..
                        } = self.events[i]
                        {
                            *forward_parent = None;
                        }

                        for &(_, fk) in forward_parents.iter().rev() {
                            if fk != SyntaxKind::TOMBSTONE {
                                builder.start_node(rowan::SyntaxKind(fk as u16));
                            }
                        }
                    } else if kind != SyntaxKind::TOMBSTONE {
                        builder.start_node(rowan::SyntaxKind(kind as u16));
                    }
                }
                Event::Close => {
                    builder.finish_node();
                }
                Event::Advance => {
                    if token_pos < self.tokens.len() {
                        let token = &self.tokens[token_pos];
                        let syntax_kind = SyntaxKind::from(token.kind.clone());
                        let text =
                            &self.source[token.span.start as usize..token.span.end as usize];
                        builder.token(rowan::SyntaxKind(syntax_kind as u16), text);
                        token_pos += 1;
                    }
                }
            }
            i += 1;
        }

        (builder.finish(), self.errors)
    }
}

// ── Top-level parsing ──────────────────────────────────────────────────

/// Parse a complete source file.
///
/// Opens a SOURCE_FILE node, parses the package directive, imports, and
/// top-level declarations until EOF.
pub(crate) fn parse_source_file(p: &mut Parser) {
    let root = p.open();

    if p.at(SyntaxKind::PACKAGE_KW) {
        p.advance_trivia();
        items::parse_package_directive(p);
    }

    if p.at(SyntaxKind::IMPORT_KW) && !p.has_error() {
        p.advance_trivia();
        items::parse_import_list(p);
    }

    loop {
        p.eat(SyntaxKind::SEMICOLON);
        if p.at(SyntaxKind::EOF) || p.has_error() {
            break;
        }
        p.advance_trivia();
        items::parse_declaration_or_statement(p);
    }

    // Consume remaining tokens (trailing trivia and EOF) so the CST covers
    // the whole file.
    while !p.at(SyntaxKind::EOF) {
        p.advance();
    }
    p.advance(); // EOF

    p.close(root, SyntaxKind::SOURCE_FILE);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<Token> {
        let (tokens, errors) = kfmt_lexer::tokenize(source);
        assert!(errors.is_empty(), "lex errors: {errors:?}");
        tokens
    }

    #[test]
    fn smoke_test_parser_produces_green_node() {
        let source = "val x = 5";
        let mut parser = Parser::new(lex(source), source);

        parse_source_file(&mut parser);
        let (green, errors) = parser.build_tree();
        assert!(errors.is_empty(), "expected no errors: {:?}", errors);

        let root = crate::cst::SyntaxNode::new_root(green);
        assert_eq!(root.kind(), SyntaxKind::SOURCE_FILE);
        // Whitespace trivia is preserved, so the tree text is the source.
        assert_eq!(root.text().to_string(), source);

        let children: Vec<_> = root.children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].kind(), SyntaxKind::PROPERTY_DECL);
    }

    #[test]
    fn lookahead_skips_trivia() {
        let source = "val /* c */ x";
        let parser = Parser::new(lex(source), source);
        assert_eq!(parser.current(), SyntaxKind::VAL_KW);
        assert_eq!(parser.nth(1), SyntaxKind::IDENT);
    }

    #[test]
    fn newline_before_current_detected() {
        let source = "a\n+ b";
        let mut parser = Parser::new(lex(source), source);
        assert!(!parser.newline_before_current());
        parser.advance(); // a
        assert!(parser.newline_before_current());
    }

    #[test]
    fn expect_success_and_failure() {
        let source = "val x";
        let mut parser = Parser::new(lex(source), source);

        assert!(parser.expect(SyntaxKind::VAL_KW));
        assert!(!parser.has_error());

        assert!(!parser.expect(SyntaxKind::VAL_KW));
        assert!(parser.has_error());
        assert_eq!(parser.errors.len(), 1);
    }

    #[test]
    fn open_before_wraps_completed_node() {
        let source = "f(42)";
        let mut parser = Parser::new(lex(source), source);

        let root = parser.open();

        let name = parser.open();
        parser.advance(); // f
        let name_closed = parser.close(name, SyntaxKind::NAME_REF);

        let call = parser.open_before(name_closed);
        parser.advance(); // (
        parser.advance(); // 42
        parser.advance(); // )
        parser.close(call, SyntaxKind::CALL_EXPR);

        parser.advance(); // Eof
        parser.close(root, SyntaxKind::SOURCE_FILE);

        let (green, errors) = parser.build_tree();
        assert!(errors.is_empty());

        let root_node = crate::cst::SyntaxNode::new_root(green);
        let call_node = root_node.children().next().unwrap();
        assert_eq!(call_node.kind(), SyntaxKind::CALL_EXPR);
        let name_ref = call_node.children().next().unwrap();
        assert_eq!(name_ref.kind(), SyntaxKind::NAME_REF);
    }
}
