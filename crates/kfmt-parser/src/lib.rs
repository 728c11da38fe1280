//! Kotlin parser: recursive descent parser producing a rowan-based CST.
//!
//! This crate transforms the token stream from `kfmt-lexer` into a lossless
//! concrete syntax tree (CST) using the `rowan` library. The CST preserves
//! all tokens including whitespace and comments, which is what lets the
//! formatter reason about blank lines and comment placement.

pub mod cst;
pub mod error;
mod parser;
pub mod syntax_kind;

pub use cst::{KotlinLanguage, SyntaxElement, SyntaxNode, SyntaxToken};
pub use error::ParseError;
pub use syntax_kind::SyntaxKind;

/// Result of parsing a Kotlin source file.
///
/// Contains the green tree (the immutable, cheap-to-clone CST) and any
/// parse errors encountered. With the first-error-only strategy, `errors`
/// contains at most one parse error, preceded by any lexer errors.
pub struct Parse {
    green: rowan::GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Build the syntax tree root from the green node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// Parse errors encountered during lexing and parsing.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a Kotlin source file into a CST.
///
/// This is the main entry point for the parser. It lexes the source, parses
/// the token stream, and returns a [`Parse`] result containing the syntax
/// tree and any errors.
pub fn parse(source: &str) -> Parse {
    let (tokens, lex_errors) = kfmt_lexer::tokenize(source);
    let mut p = parser::Parser::new(tokens, source);
    parser::parse_source_file(&mut p);
    let (green, mut errors) = p.build_tree();

    // Lexer errors come first; they usually explain the parse error.
    let mut all: Vec<ParseError> = lex_errors
        .into_iter()
        .map(|e| ParseError::new(e.to_string(), e.span))
        .collect();
    all.append(&mut errors);

    Parse { green, errors: all }
}
