//! Declaration parsing: package/import directives, classes, functions,
//! properties, parameter lists, types, blocks, and statements.
//!
//! Modifier words (`private`, `data`, `override`, ...) are identifiers at
//! the token level; [`parse_modifier_list`] recognizes them by text, so they
//! stay usable as ordinary names in expressions.

use kfmt_common::token::is_modifier_word;

use super::{expressions, Parser};
use crate::syntax_kind::SyntaxKind;

/// `package a.b.c`
pub(crate) fn parse_package_directive(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::PACKAGE_KW);
    parse_dotted_name(p, false);
    p.close(m, SyntaxKind::PACKAGE_DIRECTIVE);
}

/// One or more consecutive `import` directives.
pub(crate) fn parse_import_list(p: &mut Parser) {
    let m = p.open();
    while p.at(SyntaxKind::IMPORT_KW) && !p.has_error() {
        p.advance_trivia();
        parse_import_directive(p);
    }
    p.close(m, SyntaxKind::IMPORT_LIST);
}

/// `import a.b.c`, `import a.b.*`, `import a.b.C as D`
fn parse_import_directive(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::IMPORT_KW);
    parse_dotted_name(p, true);
    if p.eat(SyntaxKind::AS_KW) {
        p.expect(SyntaxKind::IDENT);
    }
    p.close(m, SyntaxKind::IMPORT_DIRECTIVE);
}

/// `a.b.c`, optionally ending in `.*` when `allow_star` is set.
fn parse_dotted_name(p: &mut Parser, allow_star: bool) {
    let m = p.open();
    p.expect(SyntaxKind::IDENT);
    while p.at(SyntaxKind::DOT) && !p.has_error() {
        p.advance(); // .
        if allow_star && p.at(SyntaxKind::STAR) {
            p.advance();
            break;
        }
        p.expect(SyntaxKind::IDENT);
    }
    p.close(m, SyntaxKind::DOTTED_NAME);
}

/// A top-level declaration or statement.
pub(crate) fn parse_declaration_or_statement(p: &mut Parser) {
    if at_modifier(p) || p.at_any(DECL_START) {
        parse_declaration(p);
    } else {
        parse_statement(p);
    }
}

const DECL_START: &[SyntaxKind] = &[
    SyntaxKind::CLASS_KW,
    SyntaxKind::INTERFACE_KW,
    SyntaxKind::OBJECT_KW,
    SyntaxKind::FUN_KW,
];

/// Whether the current token is a modifier word applied to a declaration
/// (as opposed to an identifier used in an expression).
fn at_modifier(p: &Parser) -> bool {
    if !p.at(SyntaxKind::IDENT) || !is_modifier_word(p.current_text()) {
        return false;
    }
    // `open(x)` is a call, `open.y` a qualified name; `open class` and
    // `private val` are modifiers. Another identifier may itself be a
    // further modifier.
    matches!(
        p.nth(1),
        SyntaxKind::IDENT
            | SyntaxKind::CLASS_KW
            | SyntaxKind::INTERFACE_KW
            | SyntaxKind::OBJECT_KW
            | SyntaxKind::FUN_KW
            | SyntaxKind::VAL_KW
            | SyntaxKind::VAR_KW
            | SyntaxKind::CONSTRUCTOR_KW
    )
}

/// Parse `modifier*` into a MODIFIER_LIST if any are present.
fn parse_modifier_list(p: &mut Parser) {
    if !at_modifier(p) {
        return;
    }
    let m = p.open();
    while at_modifier(p) {
        p.advance();
    }
    p.close(m, SyntaxKind::MODIFIER_LIST);
}

/// A declaration with optional leading modifiers.
fn parse_declaration(p: &mut Parser) {
    let m = p.open();
    parse_modifier_list(p);
    match p.current() {
        SyntaxKind::CLASS_KW | SyntaxKind::INTERFACE_KW | SyntaxKind::OBJECT_KW => {
            parse_class_rest(p, m);
        }
        SyntaxKind::FUN_KW => parse_fun_rest(p, m),
        SyntaxKind::VAL_KW | SyntaxKind::VAR_KW => parse_property_rest(p, m),
        _ => {
            p.error("expected `class`, `interface`, `object`, `fun`, `val`, or `var`");
            p.close(m, SyntaxKind::ERROR_NODE);
        }
    }
}

/// `class Name(params)? : Supertype(args)?, ...? { body }?`
/// The MODIFIER_LIST (if any) is already inside the open mark `m`.
fn parse_class_rest(p: &mut Parser, m: super::MarkOpened) {
    p.advance(); // class | interface | object
    p.expect(SyntaxKind::IDENT);

    if p.at(SyntaxKind::L_PAREN) {
        let ctor = p.open();
        parse_parameter_list(p);
        p.close(ctor, SyntaxKind::PRIMARY_CONSTRUCTOR);
    }

    if p.eat(SyntaxKind::COLON) {
        parse_supertype_list(p);
    }

    if p.at(SyntaxKind::L_BRACE) {
        parse_class_body(p);
    }

    p.close(m, SyntaxKind::CLASS_DECL);
}

/// `Supertype(args)?, Supertype, ...`
fn parse_supertype_list(p: &mut Parser) {
    let m = p.open();
    loop {
        let s = p.open();
        parse_type_ref(p);
        if p.at(SyntaxKind::L_PAREN) {
            parse_value_argument_list(p);
        }
        p.close(s, SyntaxKind::SUPERTYPE);
        if !p.eat(SyntaxKind::COMMA) || p.has_error() {
            break;
        }
    }
    p.close(m, SyntaxKind::SUPERTYPE_LIST);
}

/// `{ member* }`
fn parse_class_body(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::L_BRACE);
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        p.eat(SyntaxKind::SEMICOLON);
        if p.at(SyntaxKind::R_BRACE) {
            break;
        }
        p.advance_trivia();
        parse_class_member(p);
    }
    p.expect(SyntaxKind::R_BRACE);
    p.close(m, SyntaxKind::CLASS_BODY);
}

fn parse_class_member(p: &mut Parser) {
    if p.at(SyntaxKind::INIT_KW) {
        let m = p.open();
        p.advance(); // init
        parse_block(p);
        p.close(m, SyntaxKind::INIT_BLOCK);
        return;
    }
    if at_modifier(p)
        || p.at_any(DECL_START)
        || p.at_any(&[SyntaxKind::VAL_KW, SyntaxKind::VAR_KW])
    {
        parse_declaration(p);
    } else {
        p.error("expected a class member");
    }
}

/// `fun name(params) : Type? (block | = expr)?`
fn parse_fun_rest(p: &mut Parser, m: super::MarkOpened) {
    p.advance(); // fun
    p.expect(SyntaxKind::IDENT);
    parse_parameter_list(p);
    if p.eat(SyntaxKind::COLON) {
        parse_type_ref(p);
    }
    if p.at(SyntaxKind::L_BRACE) {
        parse_block(p);
    } else if p.eat(SyntaxKind::EQ) {
        expressions::expr(p);
    }
    p.close(m, SyntaxKind::FUN_DECL);
}

/// `(param, param, ...)` with an optional trailing comma.
fn parse_parameter_list(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::L_PAREN);
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        parse_parameter(p);
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::PARAMETER_LIST);
}

/// `modifiers? (val|var)? name: Type (= default)?`
fn parse_parameter(p: &mut Parser) {
    let m = p.open();
    parse_modifier_list(p);
    if p.at(SyntaxKind::VAL_KW) || p.at(SyntaxKind::VAR_KW) {
        p.advance();
    }
    p.expect(SyntaxKind::IDENT);
    p.expect(SyntaxKind::COLON);
    parse_type_ref(p);
    if p.eat(SyntaxKind::EQ) {
        expressions::expr(p);
    }
    p.close(m, SyntaxKind::PARAMETER);
}

/// `(val|var) name (: Type)? (= initializer)?`
fn parse_property_rest(p: &mut Parser, m: super::MarkOpened) {
    p.advance(); // val | var
    p.expect(SyntaxKind::IDENT);
    if p.eat(SyntaxKind::COLON) {
        parse_type_ref(p);
    }
    if p.eat(SyntaxKind::EQ) {
        expressions::expr(p);
    }
    p.close(m, SyntaxKind::PROPERTY_DECL);
}

/// `a.b.C<T, U>??` -- dotted name, optional type arguments, nullability.
pub(crate) fn parse_type_ref(p: &mut Parser) {
    let m = p.open();
    parse_dotted_name(p, false);
    if p.at(SyntaxKind::LT) {
        parse_type_argument_list(p);
    }
    while p.eat(SyntaxKind::QUESTION) {}
    p.close(m, SyntaxKind::TYPE_REF);
}

/// `<Type, Type, ...>`
fn parse_type_argument_list(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::LT);
    loop {
        if p.at(SyntaxKind::STAR) {
            p.advance(); // star projection
        } else {
            parse_type_ref(p);
        }
        if !p.eat(SyntaxKind::COMMA) || p.has_error() {
            break;
        }
    }
    p.expect(SyntaxKind::GT);
    p.close(m, SyntaxKind::TYPE_ARGUMENT_LIST);
}

/// `{ statement* }`
pub(crate) fn parse_block(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::L_BRACE);
    while !p.at(SyntaxKind::R_BRACE) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        p.eat(SyntaxKind::SEMICOLON);
        if p.at(SyntaxKind::R_BRACE) {
            break;
        }
        p.advance_trivia();
        parse_statement(p);
    }
    p.expect(SyntaxKind::R_BRACE);
    p.close(m, SyntaxKind::BLOCK);
}

/// A statement inside a block (or at top level).
pub(crate) fn parse_statement(p: &mut Parser) {
    match p.current() {
        SyntaxKind::VAL_KW | SyntaxKind::VAR_KW => {
            let m = p.open();
            parse_property_rest(p, m);
        }
        SyntaxKind::IF_KW => parse_if(p),
        SyntaxKind::WHILE_KW => parse_while(p),
        SyntaxKind::FOR_KW => parse_for(p),
        SyntaxKind::RETURN_KW => parse_return(p),
        _ => {
            expressions::expr(p);
        }
    }
}

/// `if (cond) body (else body)?` -- body is a block or a single statement.
fn parse_if(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::IF_KW);
    p.expect(SyntaxKind::L_PAREN);
    expressions::expr(p);
    p.expect(SyntaxKind::R_PAREN);
    parse_control_body(p);
    if p.eat(SyntaxKind::ELSE_KW) {
        if p.at(SyntaxKind::IF_KW) {
            parse_if(p);
        } else {
            parse_control_body(p);
        }
    }
    p.close(m, SyntaxKind::IF_EXPR);
}

fn parse_while(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::WHILE_KW);
    p.expect(SyntaxKind::L_PAREN);
    expressions::expr(p);
    p.expect(SyntaxKind::R_PAREN);
    parse_control_body(p);
    p.close(m, SyntaxKind::WHILE_STMT);
}

/// `for (name in iterable) body`
fn parse_for(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::FOR_KW);
    p.expect(SyntaxKind::L_PAREN);
    p.expect(SyntaxKind::IDENT);
    p.expect(SyntaxKind::IN_KW);
    expressions::expr(p);
    p.expect(SyntaxKind::R_PAREN);
    parse_control_body(p);
    p.close(m, SyntaxKind::FOR_STMT);
}

/// `return expr?` -- the value must start on the same line.
fn parse_return(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::RETURN_KW);
    if !p.newline_before_current() && at_expr_start(p) {
        expressions::expr(p);
    }
    p.close(m, SyntaxKind::RETURN_STMT);
}

fn parse_control_body(p: &mut Parser) {
    if p.at(SyntaxKind::L_BRACE) {
        parse_block(p);
    } else {
        parse_statement(p);
    }
}

/// Whether the current token can begin an expression.
fn at_expr_start(p: &Parser) -> bool {
    matches!(
        p.current(),
        SyntaxKind::IDENT
            | SyntaxKind::INT_LITERAL
            | SyntaxKind::FLOAT_LITERAL
            | SyntaxKind::CHAR_LITERAL
            | SyntaxKind::STRING_START
            | SyntaxKind::RAW_STRING_START
            | SyntaxKind::TRUE_KW
            | SyntaxKind::FALSE_KW
            | SyntaxKind::NULL_KW
            | SyntaxKind::THIS_KW
            | SyntaxKind::SUPER_KW
            | SyntaxKind::L_PAREN
            | SyntaxKind::BANG
            | SyntaxKind::MINUS
            | SyntaxKind::PLUS
            | SyntaxKind::IF_KW
    )
}

/// `(arg, name = arg, ...)`
pub(crate) fn parse_value_argument_list(p: &mut Parser) {
    let m = p.open();
    p.expect(SyntaxKind::L_PAREN);
    while !p.at(SyntaxKind::R_PAREN) && !p.at(SyntaxKind::EOF) && !p.has_error() {
        let arg = p.open();
        if p.at(SyntaxKind::IDENT) && p.nth(1) == SyntaxKind::EQ {
            p.advance(); // name
            p.advance(); // =
        }
        expressions::expr(p);
        p.close(arg, SyntaxKind::VALUE_ARGUMENT);
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN);
    p.close(m, SyntaxKind::VALUE_ARGUMENT_LIST);
}
