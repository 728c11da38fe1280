//! Pratt expression parser for the Kotlin subset.
//!
//! Implements operator precedence parsing using binding power tables.
//! Handles literals, identifiers, binary/unary operators, function calls,
//! qualified access (`.` and `?.`), indexing, grouping, and string
//! templates with interpolation.
//!
//! Newlines terminate statements, so the infix loop refuses to consume a
//! binary operator that starts a new line. Qualified access is the
//! exception: `.`/`?.` may begin a line, which is how call chains wrap.

use crate::syntax_kind::SyntaxKind;

use super::{items, MarkClosed, Parser};

// ── Binding Power Tables ───────────────────────────────────────────────

/// Returns (left_bp, right_bp) for infix operators.
///
/// Left < right means left-associative (the usual case); the elvis
/// operator is right-associative.
fn infix_binding_power(op: SyntaxKind) -> Option<(u8, u8)> {
    match op {
        SyntaxKind::PIPE_PIPE => Some((5, 6)),
        SyntaxKind::AMP_AMP => Some((7, 8)),
        SyntaxKind::EQ_EQ | SyntaxKind::NOT_EQ => Some((9, 10)),
        SyntaxKind::LT | SyntaxKind::GT | SyntaxKind::LT_EQ | SyntaxKind::GT_EQ => Some((11, 12)),
        // Named checks: `x in c`, `x is T`.
        SyntaxKind::IN_KW | SyntaxKind::IS_KW => Some((13, 14)),
        SyntaxKind::ELVIS => Some((16, 15)),
        SyntaxKind::DOT_DOT => Some((17, 18)),
        SyntaxKind::PLUS | SyntaxKind::MINUS => Some((19, 20)),
        SyntaxKind::STAR | SyntaxKind::SLASH | SyntaxKind::PERCENT => Some((21, 22)),
        SyntaxKind::AS_KW => Some((23, 24)),
        // `=` as assignment inside expression statements.
        SyntaxKind::EQ => Some((2, 1)),
        _ => None,
    }
}

/// Returns ((), right_bp) for prefix operators.
fn prefix_binding_power(op: SyntaxKind) -> Option<((), u8)> {
    match op {
        SyntaxKind::MINUS | SyntaxKind::PLUS | SyntaxKind::BANG => Some(((), 25)),
        _ => None,
    }
}

/// Postfix operations (call, qualified access, indexing) bind tighter than
/// all prefix and infix operators.
const POSTFIX_BP: u8 = 27;

// ── Expression Entry Point ─────────────────────────────────────────────

/// Parse an expression at the default (lowest) binding power.
pub(crate) fn expr(p: &mut Parser) {
    expr_bp(p, 0);
}

/// Parse an expression with the given minimum binding power.
fn expr_bp(p: &mut Parser, min_bp: u8) -> Option<MarkClosed> {
    let mut lhs = lhs(p)?;

    loop {
        if p.has_error() {
            break;
        }

        let current = p.current();

        // ── Postfix: function call. A `(` on a new line starts a new
        // statement, not a call.
        if current == SyntaxKind::L_PAREN && POSTFIX_BP >= min_bp && !p.newline_before_current() {
            let m = p.open_before(lhs);
            items::parse_value_argument_list(p);
            lhs = p.close(m, SyntaxKind::CALL_EXPR);
            continue;
        }

        // ── Postfix: qualified access (`.` or `?.`), newline allowed. ──
        if matches!(current, SyntaxKind::DOT | SyntaxKind::QUESTION_DOT) && POSTFIX_BP >= min_bp {
            let node_kind = if current == SyntaxKind::DOT {
                SyntaxKind::DOT_QUALIFIED_EXPR
            } else {
                SyntaxKind::SAFE_QUALIFIED_EXPR
            };
            let m = p.open_before(lhs);
            p.advance(); // . | ?.

            // Selector: a name, optionally called.
            let sel = p.open();
            p.expect(SyntaxKind::IDENT);
            let sel_closed = p.close(sel, SyntaxKind::NAME_REF);
            if p.at(SyntaxKind::L_PAREN) && !p.newline_before_current() {
                let call = p.open_before(sel_closed);
                items::parse_value_argument_list(p);
                p.close(call, SyntaxKind::CALL_EXPR);
            }

            lhs = p.close(m, node_kind);
            continue;
        }

        // ── Postfix: index access. ──
        if current == SyntaxKind::L_BRACKET && POSTFIX_BP >= min_bp && !p.newline_before_current()
        {
            let m = p.open_before(lhs);
            p.advance(); // [
            expr_bp(p, 0);
            p.expect(SyntaxKind::R_BRACKET);
            lhs = p.close(m, SyntaxKind::INDEX_EXPR);
            continue;
        }

        // ── Infix operators. ──
        if let Some((l_bp, r_bp)) = infix_binding_power(current) {
            if l_bp < min_bp {
                break;
            }
            // An operator on a new line belongs to the next statement.
            if p.newline_before_current() {
                break;
            }

            let m = p.open_before(lhs);
            p.advance(); // operator

            if matches!(current, SyntaxKind::AS_KW | SyntaxKind::IS_KW) {
                // The right-hand side of a cast or type check is a type.
                items::parse_type_ref(p);
            } else {
                expr_bp(p, r_bp);
            }

            lhs = p.close(m, SyntaxKind::BINARY_EXPR);
            continue;
        }

        break;
    }

    Some(lhs)
}

// ── Atom / Prefix Parsing (LHS) ───────────────────────────────────────

/// Parse the left-hand side of an expression: an atom or a prefix operator.
fn lhs(p: &mut Parser) -> Option<MarkClosed> {
    let current = p.current();

    if let Some(((), r_bp)) = prefix_binding_power(current) {
        let m = p.open();
        p.advance(); // operator
        expr_bp(p, r_bp);
        return Some(p.close(m, SyntaxKind::PREFIX_EXPR));
    }

    match current {
        SyntaxKind::INT_LITERAL
        | SyntaxKind::FLOAT_LITERAL
        | SyntaxKind::CHAR_LITERAL
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::NULL_KW
        | SyntaxKind::THIS_KW
        | SyntaxKind::SUPER_KW => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::LITERAL))
        }

        SyntaxKind::IDENT => {
            let m = p.open();
            p.advance();
            Some(p.close(m, SyntaxKind::NAME_REF))
        }

        SyntaxKind::STRING_START => Some(parse_string_template(p)),
        SyntaxKind::RAW_STRING_START => Some(parse_raw_string_template(p)),

        SyntaxKind::L_PAREN => {
            let m = p.open();
            p.advance(); // (
            expr_bp(p, 0);
            p.expect(SyntaxKind::R_PAREN);
            Some(p.close(m, SyntaxKind::PAREN_EXPR))
        }

        // `if` is an expression in Kotlin; reuse the statement parser.
        SyntaxKind::IF_KW => {
            items::parse_statement(p);
            None
        }

        _ => {
            p.error("expected an expression");
            None
        }
    }
}

/// `"text $name ${expr} more"`
fn parse_string_template(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.expect(SyntaxKind::STRING_START);
    loop {
        match p.current() {
            SyntaxKind::STRING_CONTENT | SyntaxKind::SHORT_INTERPOLATION => {
                p.advance();
            }
            SyntaxKind::INTERPOLATION_START => {
                let i = p.open();
                p.advance(); // ${
                expr_bp(p, 0);
                p.expect(SyntaxKind::INTERPOLATION_END);
                p.close(i, SyntaxKind::INTERPOLATION);
            }
            SyntaxKind::STRING_END => {
                p.advance();
                break;
            }
            _ => {
                p.error("unterminated string template");
                break;
            }
        }
    }
    p.close(m, SyntaxKind::STRING_TEMPLATE)
}

/// `"""verbatim content"""`
fn parse_raw_string_template(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.expect(SyntaxKind::RAW_STRING_START);
    while p.at(SyntaxKind::RAW_STRING_CONTENT) {
        p.advance();
    }
    p.expect(SyntaxKind::RAW_STRING_END);
    p.close(m, SyntaxKind::RAW_STRING_TEMPLATE)
}
