//! Tree scanners: per-construct rules that turn CST nodes into the token
//! IR, built on the node-pattern matcher.
//!
//! `TreeScanner::scan` walks a SOURCE_FILE; dispatch is by `SyntaxKind`.
//! Statement and member lists are walked directly (they are where blank
//! lines and comments between items matter); the shape of each individual
//! construct is described with a `NodePattern`.

mod comments;
mod decls;
mod exprs;
mod stmts;

use kfmt_parser::{SyntaxElement, SyntaxKind, SyntaxNode};
use rowan::NodeOrToken;

use crate::tokens::{self, begin, end, forced_break, leaf, ws, State, Token};
use crate::ScanError;

/// Stateless scanner over a parsed file. Patterns are built per scan call;
/// nothing survives between invocations, so one instance (or many) can
/// format any number of files.
pub struct TreeScanner;

impl TreeScanner {
    pub fn new() -> Self {
        TreeScanner
    }

    /// Scan a whole source file into a token stream.
    pub fn scan(&self, root: &SyntaxNode) -> Result<Vec<Token>, ScanError> {
        debug_assert_eq!(root.kind(), SyntaxKind::SOURCE_FILE);
        self.scan_top_level(root)
    }

    /// Dispatch on element kind. Tokens become leaves; nodes go to their
    /// construct scanner.
    pub fn scan_element(&self, element: &SyntaxElement) -> Result<Vec<Token>, ScanError> {
        match element {
            NodeOrToken::Token(token) => Ok(match token.kind() {
                SyntaxKind::EOF => Vec::new(),
                SyntaxKind::LINE_COMMENT => comments::line_comment(token.text(), false),
                SyntaxKind::BLOCK_COMMENT => comments::block_comment(token.text()),
                SyntaxKind::KDOC => comments::kdoc_block(token.text()),
                _ => vec![leaf(token.text())],
            }),
            NodeOrToken::Node(node) => self.scan_node(node),
        }
    }

    fn scan_node(&self, node: &SyntaxNode) -> Result<Vec<Token>, ScanError> {
        match node.kind() {
            SyntaxKind::SOURCE_FILE => self.scan_top_level(node),
            SyntaxKind::PACKAGE_DIRECTIVE => decls::package_directive(self, node),
            SyntaxKind::IMPORT_LIST => decls::import_list(self, node),
            SyntaxKind::IMPORT_DIRECTIVE => decls::import_directive(self, node),
            SyntaxKind::CLASS_DECL => decls::class_decl(self, node),
            SyntaxKind::CLASS_BODY => self.scan_braced(node),
            SyntaxKind::PRIMARY_CONSTRUCTOR => decls::primary_constructor(self, node),
            SyntaxKind::PARAMETER_LIST => decls::parameter_list(self, node),
            SyntaxKind::PARAMETER => decls::parameter(self, node),
            SyntaxKind::FUN_DECL => decls::fun_decl(self, node),
            SyntaxKind::PROPERTY_DECL => decls::property_decl(self, node),
            SyntaxKind::INIT_BLOCK => decls::init_block(self, node),
            SyntaxKind::TYPE_REF => Ok(vec![leaf(type_text(node))]),
            SyntaxKind::BLOCK => self.scan_braced(node),
            SyntaxKind::IF_EXPR => stmts::if_expr(self, node),
            SyntaxKind::WHILE_STMT => stmts::while_stmt(self, node),
            SyntaxKind::FOR_STMT => stmts::for_stmt(self, node),
            SyntaxKind::RETURN_STMT => stmts::return_stmt(self, node),
            SyntaxKind::BINARY_EXPR => exprs::binary_expr(self, node),
            SyntaxKind::PREFIX_EXPR => exprs::prefix_expr(self, node),
            SyntaxKind::PAREN_EXPR => exprs::paren_expr(self, node),
            SyntaxKind::CALL_EXPR => exprs::call_expr(self, node),
            SyntaxKind::VALUE_ARGUMENT_LIST => exprs::value_argument_list(self, node),
            SyntaxKind::VALUE_ARGUMENT => exprs::value_argument(self, node),
            SyntaxKind::DOT_QUALIFIED_EXPR | SyntaxKind::SAFE_QUALIFIED_EXPR => {
                exprs::qualified_chain(self, node)
            }
            SyntaxKind::INDEX_EXPR => exprs::index_expr(self, node),
            SyntaxKind::NAME_REF | SyntaxKind::LITERAL | SyntaxKind::DOTTED_NAME => {
                Ok(vec![leaf(compact_text_of_node(node))])
            }
            SyntaxKind::STRING_TEMPLATE => exprs::string_template(self, node),
            SyntaxKind::RAW_STRING_TEMPLATE => Ok(vec![
                begin(State::MultilineString),
                leaf(node.text().to_string()),
                end(),
            ]),
            SyntaxKind::INTERPOLATION => Ok(vec![leaf(node.text().to_string())]),
            // Anything else renders as its compacted source text; new node
            // kinds get a dedicated scanner when they need layout.
            _ => Ok(vec![leaf(compact_text_of_node(node))]),
        }
    }

    // ── Item lists ─────────────────────────────────────────────────────

    /// Top-level walk: package directive, imports, declarations, comments,
    /// separated by forced breaks. Blank lines collapse to at most one;
    /// the package directive and import list always get one after them.
    fn scan_top_level(&self, node: &SyntaxNode) -> Result<Vec<Token>, ScanError> {
        let items = self.collect_items(node.children_with_tokens())?;
        let mut out = Vec::new();
        let mut previous_kind: Option<SyntaxKind> = None;
        for item in items {
            if !out.is_empty() {
                let blank_after_header = matches!(
                    previous_kind,
                    Some(SyntaxKind::PACKAGE_DIRECTIVE) | Some(SyntaxKind::IMPORT_LIST)
                );
                let count = if blank_after_header { 2 } else { item.separator };
                out.push(forced_break(count));
            }
            out.extend(item.tokens);
            previous_kind = item.kind;
        }
        Ok(out)
    }

    /// `{ ... }` with one item per line. Empty bodies collapse to `{}`.
    fn scan_braced(&self, node: &SyntaxNode) -> Result<Vec<Token>, ScanError> {
        let interior = node.children_with_tokens().filter(|el| {
            !matches!(el.kind(), SyntaxKind::L_BRACE | SyntaxKind::R_BRACE)
        });
        let items = self.collect_items(interior)?;
        if items.is_empty() {
            return Ok(vec![leaf("{"), leaf("}")]);
        }

        let mut out = vec![leaf("{"), begin(State::Code)];
        let mut first = true;
        for item in items {
            let count = if first { 1 } else { item.separator };
            out.push(forced_break(count));
            out.extend(item.tokens);
            first = false;
        }
        out.push(tokens::closing_forced_break());
        out.push(end());
        out.push(leaf("}"));
        Ok(out)
    }

    /// Walk an item sequence, attaching trailing comments to their item
    /// and turning blank-line runs into separators.
    fn collect_items(
        &self,
        elements: impl Iterator<Item = SyntaxElement>,
    ) -> Result<Vec<Item>, ScanError> {
        let mut items: Vec<Item> = Vec::new();
        let mut pending_newlines: usize = 0;

        for element in elements {
            match element.kind() {
                SyntaxKind::WHITESPACE => {
                    if let NodeOrToken::Token(t) = &element {
                        pending_newlines += t.text().matches('\n').count();
                    }
                }
                SyntaxKind::SEMICOLON | SyntaxKind::EOF => {}
                SyntaxKind::LINE_COMMENT | SyntaxKind::BLOCK_COMMENT => {
                    let text = match &element {
                        NodeOrToken::Token(t) => t.text().to_string(),
                        NodeOrToken::Node(n) => n.text().to_string(),
                    };
                    let trailing = pending_newlines == 0 && !items.is_empty();
                    if trailing {
                        let item = items.last_mut().expect("trailing requires an item");
                        item.tokens.push(ws(" "));
                        item.tokens.extend(if element.kind() == SyntaxKind::LINE_COMMENT {
                            comments::line_comment(&text, true)
                        } else {
                            comments::block_comment(&text)
                        });
                    } else {
                        let tokens = if element.kind() == SyntaxKind::LINE_COMMENT {
                            comments::line_comment(&text, false)
                        } else {
                            comments::block_comment(&text)
                        };
                        items.push(Item {
                            tokens,
                            separator: separator_from(pending_newlines),
                            kind: None,
                        });
                        pending_newlines = 0;
                    }
                }
                SyntaxKind::KDOC => {
                    let text = match &element {
                        NodeOrToken::Token(t) => t.text().to_string(),
                        NodeOrToken::Node(n) => n.text().to_string(),
                    };
                    items.push(Item {
                        tokens: comments::kdoc_block(&text),
                        separator: separator_from(pending_newlines),
                        kind: None,
                    });
                    pending_newlines = 0;
                }
                _ => {
                    if let NodeOrToken::Node(node) = &element {
                        items.push(Item {
                            tokens: self.scan_statement(node)?,
                            separator: separator_from(pending_newlines),
                            kind: Some(node.kind()),
                        });
                        pending_newlines = 0;
                    }
                }
            }
        }
        Ok(items)
    }

    /// Scan a statement/declaration item. Constructs that manage their own
    /// block structure (bodies with forced breaks) pass through; bare
    /// expressions get a statement block so their continuation lines
    /// indent from the statement's own line.
    fn scan_statement(&self, node: &SyntaxNode) -> Result<Vec<Token>, ScanError> {
        match node.kind() {
            SyntaxKind::CLASS_DECL
            | SyntaxKind::FUN_DECL
            | SyntaxKind::PROPERTY_DECL
            | SyntaxKind::IF_EXPR
            | SyntaxKind::WHILE_STMT
            | SyntaxKind::FOR_STMT
            | SyntaxKind::RETURN_STMT
            | SyntaxKind::INIT_BLOCK
            | SyntaxKind::PACKAGE_DIRECTIVE
            | SyntaxKind::IMPORT_LIST => self.scan_node(node),
            _ => {
                let mut out = vec![begin(State::Code)];
                out.extend(self.scan_node(node)?);
                out.push(end());
                Ok(out)
            }
        }
    }
}

impl Default for TreeScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// One item of a statement/member list.
struct Item {
    tokens: Vec<Token>,
    /// Forced-break count before this item (1, or 2 after a blank line).
    separator: u8,
    kind: Option<SyntaxKind>,
}

fn separator_from(newlines: usize) -> u8 {
    if newlines >= 2 {
        2
    } else {
        1
    }
}

// ── Shared text helpers ────────────────────────────────────────────────

/// Concatenated non-trivia token text of a node: `a . b . c` -> "a.b.c".
pub(crate) fn compact_text_of_node(node: &SyntaxNode) -> String {
    let mut out = String::new();
    for element in node.descendants_with_tokens() {
        if let NodeOrToken::Token(token) = element {
            if !token.kind().is_trivia() {
                out.push_str(token.text());
            }
        }
    }
    out
}

/// Compact text of any element.
pub(crate) fn compact_text(element: &SyntaxElement) -> String {
    match element {
        NodeOrToken::Token(token) => token.text().to_string(),
        NodeOrToken::Node(node) => compact_text_of_node(node),
    }
}

/// Render a type reference: compact, but with a space after commas, so
/// `Map<String,List<Int>>` comes out as `Map<String, List<Int>>`.
pub(crate) fn type_text(node: &SyntaxNode) -> String {
    let mut out = String::new();
    for element in node.descendants_with_tokens() {
        if let NodeOrToken::Token(token) = element {
            if token.kind().is_trivia() {
                continue;
            }
            out.push_str(token.text());
            if token.kind() == SyntaxKind::COMMA {
                out.push(' ');
            }
        }
    }
    out
}

/// Convert a matched trivia run into tokens: whitespace vanishes, comments
/// survive. A line comment owns the rest of its line, so it is followed by
/// a forced break (which also promotes the surrounding block's
/// synchronized breaks). Used by pattern actions that would otherwise drop
/// trivia.
pub(crate) fn trivia_tokens(elements: &[SyntaxElement]) -> Vec<Token> {
    let mut out = Vec::new();
    for element in elements {
        let text = compact_text(element);
        match element.kind() {
            SyntaxKind::LINE_COMMENT => {
                out.push(ws(" "));
                out.extend(comments::line_comment(&text, true));
                out.push(forced_break(1));
            }
            SyntaxKind::BLOCK_COMMENT => {
                out.push(ws(" "));
                out.extend(comments::block_comment(&text));
                out.push(ws(" "));
            }
            SyntaxKind::KDOC => {
                out.push(ws(" "));
                out.extend(comments::kdoc_block(&text));
                out.push(ws(" "));
            }
            _ => {}
        }
    }
    out
}

/// Count `Begin` vs `End` and close any block the pattern left open. Lets
/// declaration patterns emit their header block eagerly and only decide at
/// the end whether the body closed it already.
pub(crate) fn close_open_blocks(mut tokens: Vec<Token>) -> Vec<Token> {
    let mut depth: i64 = 0;
    for token in &tokens {
        match token {
            Token::Begin { .. } => depth += 1,
            Token::End => depth -= 1,
            _ => {}
        }
    }
    while depth > 0 {
        tokens.push(end());
        depth -= 1;
    }
    tokens
}
