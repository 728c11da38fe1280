//! Statement scanners: `if`/`else`, `while`, `for`, `return`.
//!
//! Conditions live in their own block between the parentheses, closed by a
//! de-indenting synchronized break, so an over-long condition breaks at
//! its operators and the closing paren returns to the statement's indent.

use kfmt_parser::{SyntaxElement, SyntaxKind, SyntaxNode};

use crate::matcher::NodePattern;
use crate::tokens::{self, begin, closing_sync_break, leaf, ws, State, Token};
use crate::ScanError;

use super::{close_open_blocks, compact_text, TreeScanner};

fn children(node: &SyntaxNode) -> Vec<SyntaxElement> {
    node.children_with_tokens().collect()
}

fn last_significant(elements: &[SyntaxElement]) -> Option<&SyntaxElement> {
    elements.iter().rev().find(|el| !el.kind().is_trivia())
}

/// A control-flow body: blocks and chained `if`s follow the keyword on the
/// same line; a bare statement body gets its own statement block.
fn branch_tokens(
    scanner: &TreeScanner,
    element: &SyntaxElement,
) -> Result<Vec<Token>, ScanError> {
    match element.kind() {
        SyntaxKind::BLOCK | SyntaxKind::IF_EXPR => {
            let mut out = vec![leaf(" ")];
            out.extend(scanner.scan_element(element)?);
            Ok(out)
        }
        _ => {
            let mut out = vec![leaf(" "), begin(State::Code)];
            out.extend(scanner.scan_element(element)?);
            out.push(tokens::end());
            Ok(out)
        }
    }
}

/// `if (cond) body else body`.
pub(super) fn if_expr(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .node_of_type(SyntaxKind::IF_KW)
        .then_map_to_tokens(|_, _| Ok(vec![leaf("if"), leaf(" ")]))
        .possible_whitespace()
        .node_of_type(SyntaxKind::L_PAREN)
        .then_map_to_tokens(|_, _| Ok(vec![leaf("("), begin(State::Code)]))
        .possible_whitespace()
        .any_node()
        .then_map_to_tokens(|sc, acc| match last_significant(acc) {
            Some(cond) => sc.scan_element(cond),
            None => Ok(Vec::new()),
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::R_PAREN)
        .then_map_to_tokens(|_, _| {
            Ok(vec![closing_sync_break(0), tokens::end(), leaf(")")])
        })
        .possible_whitespace()
        .any_node()
        .then_map_to_tokens(|sc, acc| match last_significant(acc) {
            Some(branch) => branch_tokens(sc, branch),
            None => Ok(Vec::new()),
        })
        .zero_or_one(|b| {
            b.possible_whitespace()
                .node_of_type(SyntaxKind::ELSE_KW)
                .possible_whitespace()
                .any_node()
                .then_map_to_tokens(|sc, acc| {
                    let mut out = vec![leaf(" else")];
                    if let Some(branch) = last_significant(acc) {
                        out.extend(branch_tokens(sc, branch)?);
                    }
                    Ok(out)
                });
        })
        .possible_whitespace()
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// `while (cond) body`.
pub(super) fn while_stmt(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .node_of_type(SyntaxKind::WHILE_KW)
        .then_map_to_tokens(|_, _| Ok(vec![leaf("while"), leaf(" ")]))
        .possible_whitespace()
        .node_of_type(SyntaxKind::L_PAREN)
        .then_map_to_tokens(|_, _| Ok(vec![leaf("("), begin(State::Code)]))
        .possible_whitespace()
        .any_node()
        .then_map_to_tokens(|sc, acc| match last_significant(acc) {
            Some(cond) => sc.scan_element(cond),
            None => Ok(Vec::new()),
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::R_PAREN)
        .then_map_to_tokens(|_, _| {
            Ok(vec![closing_sync_break(0), tokens::end(), leaf(")")])
        })
        .possible_whitespace()
        .any_node()
        .then_map_to_tokens(|sc, acc| match last_significant(acc) {
            Some(body) => branch_tokens(sc, body),
            None => Ok(Vec::new()),
        })
        .possible_whitespace()
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// `for (name in iterable) body`.
pub(super) fn for_stmt(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .node_of_type(SyntaxKind::FOR_KW)
        .then_map_to_tokens(|_, _| Ok(vec![leaf("for"), leaf(" ")]))
        .possible_whitespace()
        .node_of_type(SyntaxKind::L_PAREN)
        .then_map_to_tokens(|_, _| Ok(vec![leaf("("), begin(State::Code)]))
        .possible_whitespace()
        .node_of_type(SyntaxKind::IDENT)
        .then_map_to_tokens(|_, acc| {
            let name = last_significant(acc).map(compact_text).unwrap_or_default();
            Ok(vec![leaf(name)])
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::IN_KW)
        .then_map_to_tokens(|_, _| Ok(vec![leaf(" in"), ws(" ")]))
        .possible_whitespace()
        .any_node()
        .then_map_to_tokens(|sc, acc| match last_significant(acc) {
            Some(iterable) => sc.scan_element(iterable),
            None => Ok(Vec::new()),
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::R_PAREN)
        .then_map_to_tokens(|_, _| {
            Ok(vec![closing_sync_break(0), tokens::end(), leaf(")")])
        })
        .possible_whitespace()
        .any_node()
        .then_map_to_tokens(|sc, acc| match last_significant(acc) {
            Some(body) => branch_tokens(sc, body),
            None => Ok(Vec::new()),
        })
        .possible_whitespace()
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// `return`, `return expr` -- a statement block of its own.
pub(super) fn return_stmt(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .node_of_type(SyntaxKind::RETURN_KW)
        .then_map_to_tokens(|_, _| Ok(vec![begin(State::Code), leaf("return")]))
        .zero_or_one(|b| {
            b.possible_whitespace().any_node().then_map_to_tokens(|sc, acc| {
                let mut out = vec![ws(" ")];
                if let Some(value) = last_significant(acc) {
                    out.extend(sc.scan_element(value)?);
                }
                Ok(out)
            });
        })
        .possible_whitespace()
        .then_map_tokens(|_, toks| Ok(close_open_blocks(toks)))
        .end();
    pattern.match_elements(&children(node), scanner)
}
