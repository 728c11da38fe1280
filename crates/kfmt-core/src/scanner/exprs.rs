//! Expression scanners: operators, call chains, argument lists, and
//! string templates.

use kfmt_parser::{SyntaxElement, SyntaxKind, SyntaxNode};
use rowan::NodeOrToken;

use crate::matcher::NodePattern;
use crate::tokens::{
    self, begin, closing_sync_break, leaf, sync_break, ws, State, Token,
};
use crate::ScanError;

use super::{compact_text, trivia_tokens, TreeScanner};

fn children(node: &SyntaxNode) -> Vec<SyntaxElement> {
    node.children_with_tokens().collect()
}

fn first_significant(elements: &[SyntaxElement]) -> Option<&SyntaxElement> {
    elements.iter().find(|el| !el.kind().is_trivia())
}

fn last_significant(elements: &[SyntaxElement]) -> Option<&SyntaxElement> {
    elements.iter().rev().find(|el| !el.kind().is_trivia())
}

/// `lhs op rhs` with a break opportunity after the operator, so operators
/// end lines. Nested binary nodes share the enclosing block, which is what
/// makes an over-long condition break at every operator at once. The range
/// operator glues its operands together.
pub(super) fn binary_expr(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .any_node()
        .then_map_to_tokens(|sc, acc| match first_significant(acc) {
            Some(lhs) => sc.scan_element(lhs),
            None => Ok(Vec::new()),
        })
        .possible_whitespace()
        .any_node()
        .then_map_to_tokens(|_, acc| {
            let op = last_significant(acc).map(compact_text).unwrap_or_default();
            if op == ".." {
                Ok(vec![leaf("..")])
            } else {
                Ok(vec![leaf(format!(" {op}")), ws(" ")])
            }
        })
        .possible_whitespace()
        .any_node()
        .then_map_to_tokens(|sc, acc| match last_significant(acc) {
            Some(rhs) => sc.scan_element(rhs),
            None => Ok(Vec::new()),
        })
        .possible_whitespace()
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// `!x`, `-x`, `+x` -- operator glued to its operand.
pub(super) fn prefix_expr(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut out = Vec::new();
    for element in node.children_with_tokens() {
        match &element {
            _ if element.kind() == SyntaxKind::WHITESPACE => {}
            _ if element.kind().is_trivia() => {
                out.extend(super::trivia_tokens(&[element.clone()]));
            }
            NodeOrToken::Token(t) => out.push(leaf(t.text())),
            NodeOrToken::Node(_) => out.extend(scanner.scan_element(&element)?),
        }
    }
    Ok(out)
}

/// `(expr)` -- the parentheses pass through; inner breaks belong to the
/// enclosing block.
pub(super) fn paren_expr(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut out = vec![leaf("(")];
    for child in node.children() {
        out.extend(scanner.scan_element(&NodeOrToken::Node(child.clone()))?);
    }
    out.push(leaf(")"));
    Ok(out)
}

/// `callee(args)`.
pub(super) fn call_expr(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut out = Vec::new();
    for child in node.children() {
        out.extend(scanner.scan_element(&NodeOrToken::Node(child.clone()))?);
    }
    Ok(out)
}

/// `(a, b, c)` with synchronized breaks, mirroring parameter lists.
pub(super) fn value_argument_list(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .possible_whitespace()
        .node_of_type(SyntaxKind::L_PAREN)
        .then_map_to_tokens(|_, _| Ok(vec![leaf("("), begin(State::Code)]))
        .zero_or_one(|b| {
            b.possible_whitespace()
                .node_of_type(SyntaxKind::VALUE_ARGUMENT)
                .then_map_to_tokens(|sc, acc| {
                    let mut out = vec![sync_break(0)];
                    out.extend(trivia_tokens(acc));
                    if let Some(arg) = last_significant(acc) {
                        out.extend(sc.scan_element(arg)?);
                    }
                    Ok(out)
                });
            b.zero_or_more(|b| {
                b.possible_whitespace()
                    .node_of_type(SyntaxKind::COMMA)
                    .possible_whitespace()
                    .node_of_type(SyntaxKind::VALUE_ARGUMENT)
                    .then_map_to_tokens(|sc, acc| {
                        let mut out = vec![leaf(","), sync_break(1)];
                        out.extend(trivia_tokens(acc));
                        if let Some(arg) = last_significant(acc) {
                            out.extend(sc.scan_element(arg)?);
                        }
                        Ok(out)
                    });
            });
            b.zero_or_one(|b| {
                b.possible_whitespace()
                    .node_of_type(SyntaxKind::COMMA)
                    .then_map_to_tokens(|_, _| Ok(Vec::new()));
            });
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::R_PAREN)
        .then_map_to_tokens(|_, _| {
            Ok(vec![closing_sync_break(0), tokens::end(), leaf(")")])
        })
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// A positional `expr` or named `name = expr` argument.
pub(super) fn value_argument(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut out = Vec::new();
    let mut named = false;
    for element in node.children_with_tokens() {
        match element.kind() {
            SyntaxKind::IDENT if !named => {
                out.push(leaf(compact_text(&element)));
            }
            SyntaxKind::EQ => {
                out.push(leaf(" = "));
                named = true;
            }
            SyntaxKind::WHITESPACE => {}
            kind if kind.is_trivia() => {
                out.extend(super::trivia_tokens(&[element.clone()]));
            }
            _ => out.extend(scanner.scan_element(&element)?),
        }
    }
    Ok(out)
}

/// A `.`/`?.` chain. The outermost qualified node wraps the whole chain in
/// one block with a zero-width break before each dot, so an over-long
/// chain puts every selector on its own continuation line.
pub(super) fn qualified_chain(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut out = vec![begin(State::Code)];
    out.extend(chain_parts(scanner, node)?);
    out.push(tokens::end());
    Ok(out)
}

fn chain_parts(scanner: &TreeScanner, node: &SyntaxNode) -> Result<Vec<Token>, ScanError> {
    let mut out = Vec::new();

    let mut nodes = node.children();
    let receiver = nodes.next();
    let selector = nodes.next();

    if let Some(receiver) = receiver {
        if matches!(
            receiver.kind(),
            SyntaxKind::DOT_QUALIFIED_EXPR | SyntaxKind::SAFE_QUALIFIED_EXPR
        ) {
            out.extend(chain_parts(scanner, &receiver)?);
        } else {
            out.extend(scanner.scan_element(&NodeOrToken::Node(receiver))?);
        }
    }

    let op = node
        .children_with_tokens()
        .find(|el| matches!(el.kind(), SyntaxKind::DOT | SyntaxKind::QUESTION_DOT))
        .map(|el| compact_text(&el))
        .unwrap_or_else(|| ".".to_string());
    out.push(ws(""));
    out.push(leaf(op));

    if let Some(selector) = selector {
        out.extend(scanner.scan_element(&NodeOrToken::Node(selector))?);
    }
    Ok(out)
}

/// `receiver[index]`.
pub(super) fn index_expr(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut out = Vec::new();
    let mut nodes = node.children();
    if let Some(receiver) = nodes.next() {
        out.extend(scanner.scan_element(&NodeOrToken::Node(receiver))?);
    }
    out.push(leaf("["));
    if let Some(index) = nodes.next() {
        out.extend(scanner.scan_element(&NodeOrToken::Node(index))?);
    }
    out.push(leaf("]"));
    Ok(out)
}

/// A string template, wrapped as a STRING_LITERAL block. Content splits at
/// word boundaries (spaces stay attached to the preceding word, so they
/// survive a wrap inside the closing quote); interpolations are opaque
/// single leaves, with break opportunities on either side.
pub(super) fn string_template(
    _scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut pieces: Vec<String> = Vec::new();
    for element in node.children_with_tokens() {
        match element.kind() {
            SyntaxKind::STRING_CONTENT => {
                pieces.extend(split_after_spaces(&compact_text(&element)));
            }
            SyntaxKind::SHORT_INTERPOLATION => pieces.push(compact_text(&element)),
            SyntaxKind::INTERPOLATION => {
                if let NodeOrToken::Node(n) = &element {
                    pieces.push(n.text().to_string());
                }
            }
            _ => {}
        }
    }

    let mut out = vec![begin(State::StringLiteral), leaf("\"")];
    let mut first = true;
    for piece in pieces {
        if !first {
            out.push(ws(""));
        }
        out.push(leaf(piece));
        first = false;
    }
    out.push(leaf("\""));
    out.push(tokens::end());
    Ok(out)
}

/// Split text after each run of spaces: `"ab  cd e"` becomes
/// `["ab  ", "cd ", "e"]`.
fn split_after_spaces(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_spaces = false;
    for c in text.chars() {
        if c == ' ' {
            in_spaces = true;
            current.push(c);
        } else {
            if in_spaces {
                out.push(std::mem::take(&mut current));
                in_spaces = false;
            }
            current.push(c);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::split_after_spaces;

    #[test]
    fn splits_after_space_runs() {
        assert_eq!(
            split_after_spaces("ab  cd e"),
            vec!["ab  ".to_string(), "cd ".to_string(), "e".to_string()]
        );
    }

    #[test]
    fn no_spaces_is_one_piece() {
        assert_eq!(split_after_spaces("abc"), vec!["abc".to_string()]);
    }

    #[test]
    fn trailing_spaces_stay_attached() {
        assert_eq!(split_after_spaces("ab "), vec!["ab ".to_string()]);
    }

    #[test]
    fn empty_text_has_no_pieces() {
        assert!(split_after_spaces("").is_empty());
    }
}
