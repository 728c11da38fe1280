//! Declaration scanners: package/import directives, classes, functions,
//! properties, and parameter lists.

use kfmt_parser::{SyntaxElement, SyntaxKind, SyntaxNode};
use rowan::NodeOrToken;

use crate::matcher::NodePattern;
use crate::tokens::{
    self, begin, closing_sync_break, leaf, sync_break, ws, State, Token,
};
use crate::ScanError;

use super::{close_open_blocks, compact_text, trivia_tokens, type_text, TreeScanner};

/// Children of a node as a vector for the matcher.
fn children(node: &SyntaxNode) -> Vec<SyntaxElement> {
    node.children_with_tokens().collect()
}

/// First non-trivia element of a matched group.
fn significant(elements: &[SyntaxElement]) -> Option<&SyntaxElement> {
    elements.iter().find(|el| !el.kind().is_trivia())
}

/// First element of the given kind in a matched group.
fn find_kind(elements: &[SyntaxElement], kind: SyntaxKind) -> Option<&SyntaxElement> {
    elements.iter().find(|el| el.kind() == kind)
}

/// First node (not token) in a matched group.
fn find_node(elements: &[SyntaxElement]) -> Option<&SyntaxNode> {
    elements.iter().find_map(|el| match el {
        NodeOrToken::Node(n) => Some(n),
        NodeOrToken::Token(_) => None,
    })
}

/// `modifier modifier ` leaves, each followed by a glue space.
fn modifier_tokens(elements: &[SyntaxElement]) -> Vec<Token> {
    let mut out = Vec::new();
    if let Some(NodeOrToken::Node(list)) = find_kind(elements, SyntaxKind::MODIFIER_LIST) {
        for child in list.children_with_tokens() {
            if child.kind() == SyntaxKind::IDENT {
                out.push(leaf(compact_text(&child)));
                out.push(leaf(" "));
            }
        }
    }
    out.extend(trivia_tokens(elements));
    out
}

/// `package a.b.c` -- one unbreakable block.
pub(super) fn package_directive(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .possible_whitespace()
        .then_map_to_tokens(|_, acc| Ok(trivia_tokens(acc)))
        .node_of_type(SyntaxKind::PACKAGE_KW)
        .then_map_to_tokens(|_, _| {
            Ok(vec![begin(State::PackageImport), leaf("package"), leaf(" ")])
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::DOTTED_NAME)
        .then_map_to_tokens(|_, acc| {
            let name = significant(acc).map(compact_text).unwrap_or_default();
            Ok(vec![leaf(name), tokens::end()])
        })
        .possible_whitespace()
        .then_map_to_tokens(|_, acc| Ok(trivia_tokens(acc)))
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// All import directives, one per line; blank lines between imports are
/// not preserved.
pub(super) fn import_list(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut out = Vec::new();
    for child in node.children() {
        if child.kind() == SyntaxKind::IMPORT_DIRECTIVE {
            if !out.is_empty() {
                out.push(tokens::forced_break(1));
            }
            out.extend(import_directive(scanner, &child)?);
        }
    }
    Ok(out)
}

/// `import a.b.C`, `import a.b.*`, `import a.b.C as D`.
pub(super) fn import_directive(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .possible_whitespace()
        .node_of_type(SyntaxKind::IMPORT_KW)
        .then_map_to_tokens(|_, _| {
            Ok(vec![begin(State::PackageImport), leaf("import"), leaf(" ")])
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::DOTTED_NAME)
        .then_map_to_tokens(|_, acc| {
            let name = significant(acc).map(compact_text).unwrap_or_default();
            Ok(vec![leaf(name)])
        })
        .zero_or_one(|b| {
            b.possible_whitespace()
                .node_of_type(SyntaxKind::AS_KW)
                .possible_whitespace()
                .node_of_type(SyntaxKind::IDENT)
                .then_map_to_tokens(|_, acc| {
                    let alias = find_kind(acc, SyntaxKind::IDENT)
                        .map(compact_text)
                        .unwrap_or_default();
                    Ok(vec![leaf(" as "), leaf(alias)])
                });
        })
        .possible_whitespace()
        .then_map_to_tokens(|_, _| Ok(vec![tokens::end()]))
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// `modifiers class Name(ctor) : Supertypes { body }` with every section
/// optional except the keyword and name.
pub(super) fn class_decl(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .then_map_to_tokens(|_, _| Ok(vec![begin(State::Code)]))
        .zero_or_one(|b| {
            b.node_of_type(SyntaxKind::MODIFIER_LIST)
                .possible_whitespace()
                .then_map_to_tokens(|_, acc| Ok(modifier_tokens(acc)));
        })
        .node_of_any(&[
            SyntaxKind::CLASS_KW,
            SyntaxKind::INTERFACE_KW,
            SyntaxKind::OBJECT_KW,
        ])
        .then_map_to_tokens(|_, acc| {
            let kw = significant(acc).map(compact_text).unwrap_or_default();
            Ok(vec![leaf(kw)])
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::IDENT)
        .then_map_to_tokens(|_, acc| {
            let name = find_kind(acc, SyntaxKind::IDENT)
                .map(compact_text)
                .unwrap_or_default();
            Ok(vec![leaf(" "), leaf(name)])
        })
        .zero_or_one(|b| {
            b.possible_whitespace()
                .node_of_type(SyntaxKind::PRIMARY_CONSTRUCTOR)
                .then_map_to_tokens(|sc, acc| match find_node(acc) {
                    Some(ctor) => sc.scan_element(&NodeOrToken::Node(ctor.clone())),
                    None => Ok(Vec::new()),
                });
        })
        .zero_or_one(|b| {
            b.possible_whitespace()
                .node_of_type(SyntaxKind::COLON)
                .possible_whitespace()
                .node_of_type(SyntaxKind::SUPERTYPE_LIST)
                .then_map_to_tokens(|sc, acc| {
                    let list = find_kind(acc, SyntaxKind::SUPERTYPE_LIST);
                    match list {
                        Some(NodeOrToken::Node(list)) => supertype_tokens(sc, list),
                        _ => Ok(Vec::new()),
                    }
                });
        })
        .zero_or_one(|b| {
            b.possible_whitespace()
                .node_of_type(SyntaxKind::CLASS_BODY)
                .then_map_to_tokens(|sc, acc| {
                    let mut out = vec![tokens::end(), leaf(" ")];
                    if let Some(body) = find_node(acc) {
                        out.extend(sc.scan_element(&NodeOrToken::Node(body.clone()))?);
                    }
                    Ok(out)
                });
        })
        .possible_whitespace()
        .then_map_tokens(|_, toks| Ok(close_open_blocks(toks)))
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// ` : Base(args), Other` -- breakable after the colon and each comma.
fn supertype_tokens(scanner: &TreeScanner, list: &SyntaxNode) -> Result<Vec<Token>, ScanError> {
    let mut out = vec![leaf(" :"), ws(" ")];
    let mut first = true;
    for supertype in list.children() {
        if supertype.kind() != SyntaxKind::SUPERTYPE {
            continue;
        }
        if !first {
            out.push(leaf(","));
            out.push(ws(" "));
        }
        for part in supertype.children() {
            match part.kind() {
                SyntaxKind::TYPE_REF => out.push(leaf(type_text(&part))),
                SyntaxKind::VALUE_ARGUMENT_LIST => {
                    out.extend(scanner.scan_element(&NodeOrToken::Node(part.clone()))?)
                }
                _ => {}
            }
        }
        first = false;
    }
    Ok(out)
}

/// A primary constructor is its parameter list.
pub(super) fn primary_constructor(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut out = Vec::new();
    for child in node.children() {
        if child.kind() == SyntaxKind::PARAMETER_LIST {
            out.extend(parameter_list(scanner, &child)?);
        }
    }
    Ok(out)
}

/// `(a: Int, b: Int)` -- synchronized breaks so either every parameter is
/// on its own line or none is, with the closing paren de-indented.
pub(super) fn parameter_list(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .possible_whitespace()
        .node_of_type(SyntaxKind::L_PAREN)
        .then_map_to_tokens(|_, _| Ok(vec![leaf("("), begin(State::Code)]))
        .zero_or_one(|b| {
            b.possible_whitespace()
                .node_of_type(SyntaxKind::PARAMETER)
                .then_map_to_tokens(|sc, acc| {
                    let mut out = vec![sync_break(0)];
                    out.extend(trivia_tokens(acc));
                    if let Some(param) = find_node(acc) {
                        out.extend(sc.scan_element(&NodeOrToken::Node(param.clone()))?);
                    }
                    Ok(out)
                });
            b.zero_or_more(|b| {
                b.possible_whitespace()
                    .node_of_type(SyntaxKind::COMMA)
                    .possible_whitespace()
                    .node_of_type(SyntaxKind::PARAMETER)
                    .then_map_to_tokens(|sc, acc| {
                        let mut out = vec![leaf(","), sync_break(1)];
                        out.extend(trivia_tokens(acc));
                        if let Some(param) = find_node(acc) {
                            out.extend(sc.scan_element(&NodeOrToken::Node(param.clone()))?);
                        }
                        Ok(out)
                    });
            });
            // Trailing comma in the source is dropped.
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

/// `modifiers val name: Type = default`.
pub(super) fn parameter(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .possible_whitespace()
        .zero_or_one(|b| {
            b.node_of_type(SyntaxKind::MODIFIER_LIST)
                .possible_whitespace()
                .then_map_to_tokens(|_, acc| Ok(modifier_tokens(acc)));
        })
        .zero_or_one(|b| {
            b.node_of_any(&[SyntaxKind::VAL_KW, SyntaxKind::VAR_KW])
                .possible_whitespace()
                .then_map_to_tokens(|_, acc| {
                    let kw = significant(acc).map(compact_text).unwrap_or_default();
                    Ok(vec![leaf(kw), leaf(" ")])
                });
        })
        .node_of_type(SyntaxKind::IDENT)
        .then_map_to_tokens(|_, acc| {
            let name = find_kind(acc, SyntaxKind::IDENT)
                .map(compact_text)
                .unwrap_or_default();
            Ok(vec![leaf(name)])
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::COLON)
        .possible_whitespace()
        .node_of_type(SyntaxKind::TYPE_REF)
        .then_map_to_tokens(|_, acc| {
            let ty = acc
                .iter()
                .find_map(|el| match el {
                    NodeOrToken::Node(n) if n.kind() == SyntaxKind::TYPE_REF => Some(n),
                    _ => None,
                })
                .map(type_text)
                .unwrap_or_default();
            Ok(vec![leaf(": "), leaf(ty)])
        })
        .zero_or_one(|b| {
            default_value_group(b);
        })
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// ` = <expr>` with a break opportunity after the `=`. The initializer is
/// wrapped as a block after the fact, via a marker: the wrap covers the
/// space and everything the expression emitted, so the break at `=` sees
/// the initializer's full flat width.
fn default_value_group(b: &mut crate::matcher::NodePatternBuilder) {
    b.possible_whitespace()
        .node_of_type(SyntaxKind::EQ)
        .possible_whitespace()
        .any_node()
        .then_map_to_tokens(|sc, acc| {
            let mut out = vec![leaf(" ="), tokens::marker(), ws(" ")];
            if let Some(expr) = acc.iter().rev().find(|el| !el.kind().is_trivia()) {
                out.extend(sc.scan_element(expr)?);
            }
            out.push(Token::BlockFromMarker);
            Ok(out)
        });
}

/// `modifiers fun name(params): Type` followed by a block body, an
/// expression body, or nothing.
pub(super) fn fun_decl(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .then_map_to_tokens(|_, _| Ok(vec![begin(State::Code)]))
        .zero_or_one(|b| {
            b.node_of_type(SyntaxKind::MODIFIER_LIST)
                .possible_whitespace()
                .then_map_to_tokens(|_, acc| Ok(modifier_tokens(acc)));
        })
        .node_of_type(SyntaxKind::FUN_KW)
        .possible_whitespace()
        .node_of_type(SyntaxKind::IDENT)
        .then_map_to_tokens(|_, acc| {
            let name = find_kind(acc, SyntaxKind::IDENT)
                .map(compact_text)
                .unwrap_or_default();
            Ok(vec![leaf("fun"), leaf(" "), leaf(name)])
        })
        .possible_whitespace()
        .node_of_type(SyntaxKind::PARAMETER_LIST)
        .then_map_to_tokens(|sc, acc| match find_node(acc) {
            Some(params) => sc.scan_element(&NodeOrToken::Node(params.clone())),
            None => Ok(Vec::new()),
        })
        .zero_or_one(|b| {
            b.possible_whitespace()
                .node_of_type(SyntaxKind::COLON)
                .possible_whitespace()
                .node_of_type(SyntaxKind::TYPE_REF)
                .then_map_to_tokens(|_, acc| {
                    let ty = acc
                        .iter()
                        .find_map(|el| match el {
                            NodeOrToken::Node(n) if n.kind() == SyntaxKind::TYPE_REF => Some(n),
                            _ => None,
                        })
                        .map(type_text)
                        .unwrap_or_default();
                    Ok(vec![leaf(":"), leaf(" "), leaf(ty)])
                });
        })
        .zero_or_one(|b| {
            b.either(
                |b| {
                    b.possible_whitespace()
                        .node_of_type(SyntaxKind::BLOCK)
                        .then_map_to_tokens(|sc, acc| {
                            let mut out = vec![tokens::end(), leaf(" ")];
                            if let Some(body) = find_node(acc) {
                                out.extend(sc.scan_element(&NodeOrToken::Node(body.clone()))?);
                            }
                            Ok(out)
                        });
                },
                |b| {
                    default_value_group(b);
                },
            );
        })
        .possible_whitespace()
        .then_map_tokens(|_, toks| Ok(close_open_blocks(toks)))
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// `modifiers val name: Type = initializer` as a statement block.
pub(super) fn property_decl(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let pattern = NodePattern::builder()
        .then_map_to_tokens(|_, _| Ok(vec![begin(State::Code)]))
        .zero_or_one(|b| {
            b.node_of_type(SyntaxKind::MODIFIER_LIST)
                .possible_whitespace()
                .then_map_to_tokens(|_, acc| Ok(modifier_tokens(acc)));
        })
        .node_of_any(&[SyntaxKind::VAL_KW, SyntaxKind::VAR_KW])
        .possible_whitespace()
        .node_of_type(SyntaxKind::IDENT)
        .then_map_to_tokens(|_, acc| {
            let kw = significant(acc).map(compact_text).unwrap_or_default();
            let name = find_kind(acc, SyntaxKind::IDENT)
                .map(compact_text)
                .unwrap_or_default();
            Ok(vec![leaf(kw), leaf(" "), leaf(name)])
        })
        .zero_or_one(|b| {
            b.possible_whitespace()
                .node_of_type(SyntaxKind::COLON)
                .possible_whitespace()
                .node_of_type(SyntaxKind::TYPE_REF)
                .then_map_to_tokens(|_, acc| {
                    let ty = acc
                        .iter()
                        .find_map(|el| match el {
                            NodeOrToken::Node(n) if n.kind() == SyntaxKind::TYPE_REF => Some(n),
                            _ => None,
                        })
                        .map(type_text)
                        .unwrap_or_default();
                    Ok(vec![leaf(": "), leaf(ty)])
                });
        })
        .zero_or_one(|b| {
            default_value_group(b);
        })
        .possible_whitespace()
        .then_map_tokens(|_, toks| Ok(close_open_blocks(toks)))
        .end();
    pattern.match_elements(&children(node), scanner)
}

/// `init { ... }`
pub(super) fn init_block(
    scanner: &TreeScanner,
    node: &SyntaxNode,
) -> Result<Vec<Token>, ScanError> {
    let mut out = vec![leaf("init"), leaf(" ")];
    for child in node.children() {
        if child.kind() == SyntaxKind::BLOCK {
            out.extend(scanner.scan_element(&NodeOrToken::Node(child.clone()))?);
        }
    }
    Ok(out)
}
