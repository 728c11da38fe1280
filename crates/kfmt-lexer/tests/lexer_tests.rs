use insta::assert_snapshot;
use kfmt_lexer::tokenize;

/// Render the token stream for snapshotting: one line per token with its
/// kind and the source text it covers.
fn lex_snapshot(source: &str) -> String {
    let (tokens, errors) = tokenize(source);
    assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
    tokens
        .iter()
        .map(|tok| {
            let text = &source[tok.span.start as usize..tok.span.end as usize];
            format!("{:?} {:?}", tok.kind, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn keywords_and_identifiers() {
    assert_snapshot!(lex_snapshot("fun main"), @r###"
    Fun "fun"
    Whitespace " "
    Ident "main"
    Eof ""
    "###);
}

#[test]
fn modifier_words_lex_as_identifiers() {
    assert_snapshot!(lex_snapshot("private val data"), @r###"
    Ident "private"
    Whitespace " "
    Val "val"
    Whitespace " "
    Ident "data"
    Eof ""
    "###);
}

#[test]
fn whitespace_keeps_newlines_in_one_token() {
    assert_snapshot!(lex_snapshot("val a\n\n  val b"), @r###"
    Val "val"
    Whitespace " "
    Ident "a"
    Whitespace "\n\n  "
    Val "val"
    Whitespace " "
    Ident "b"
    Eof ""
    "###);
}

#[test]
fn operators() {
    assert_snapshot!(lex_snapshot("a == b != c ?: d ?. e -> f .. g :: h"), @r###"
    Ident "a"
    Whitespace " "
    EqEq "=="
    Whitespace " "
    Ident "b"
    Whitespace " "
    NotEq "!="
    Whitespace " "
    Ident "c"
    Whitespace " "
    Elvis "?:"
    Whitespace " "
    Ident "d"
    Whitespace " "
    QuestionDot "?."
    Whitespace " "
    Ident "e"
    Whitespace " "
    Arrow "->"
    Whitespace " "
    Ident "f"
    Whitespace " "
    DotDot ".."
    Whitespace " "
    Ident "g"
    Whitespace " "
    ColonColon "::"
    Whitespace " "
    Ident "h"
    Eof ""
    "###);
}

#[test]
fn number_literals() {
    assert_snapshot!(lex_snapshot("42 0xFF 1_000 42L 3.14 1e10 2.5f"), @r###"
    IntLiteral "42"
    Whitespace " "
    IntLiteral "0xFF"
    Whitespace " "
    IntLiteral "1_000"
    Whitespace " "
    IntLiteral "42L"
    Whitespace " "
    FloatLiteral "3.14"
    Whitespace " "
    FloatLiteral "1e10"
    Whitespace " "
    FloatLiteral "2.5f"
    Eof ""
    "###);
}

#[test]
fn simple_string_template() {
    assert_snapshot!(lex_snapshot(r#""hello""#), @r###"
    StringStart "\""
    StringContent "hello"
    StringEnd "\""
    Eof ""
    "###);
}

#[test]
fn string_with_short_interpolation() {
    assert_snapshot!(lex_snapshot(r#""hello $name!""#), @r###"
    StringStart "\""
    StringContent "hello "
    ShortInterpolation "$name"
    StringContent "!"
    StringEnd "\""
    Eof ""
    "###);
}

#[test]
fn string_with_braced_interpolation() {
    assert_snapshot!(lex_snapshot(r#""sum: ${a + b}""#), @r###"
    StringStart "\""
    StringContent "sum: "
    InterpolationStart "${"
    Ident "a"
    Whitespace " "
    Plus "+"
    Whitespace " "
    Ident "b"
    InterpolationEnd "}"
    StringEnd "\""
    Eof ""
    "###);
}

#[test]
fn escaped_dollar_stays_in_content() {
    assert_snapshot!(lex_snapshot(r#""cost: \$5""#), @r###"
    StringStart "\""
    StringContent "cost: \\$5"
    StringEnd "\""
    Eof ""
    "###);
}

#[test]
fn raw_string_is_verbatim() {
    assert_snapshot!(lex_snapshot("\"\"\"line1\nline2\"\"\""), @r###"
    RawStringStart "\"\"\""
    RawStringContent "line1\nline2"
    RawStringEnd "\"\"\""
    Eof ""
    "###);
}

#[test]
fn line_comment_runs_to_eol() {
    assert_snapshot!(lex_snapshot("val a // trailing\nval b"), @r###"
    Val "val"
    Whitespace " "
    Ident "a"
    Whitespace " "
    LineComment "// trailing"
    Whitespace "\n"
    Val "val"
    Whitespace " "
    Ident "b"
    Eof ""
    "###);
}

#[test]
fn block_comment_and_kdoc_distinguished() {
    assert_snapshot!(lex_snapshot("/* plain */ /** doc */"), @r###"
    BlockComment "/* plain */"
    Whitespace " "
    KDoc "/** doc */"
    Eof ""
    "###);
}

#[test]
fn nested_block_comment_is_one_token() {
    assert_snapshot!(lex_snapshot("/* outer /* inner */ still */"), @r###"
    BlockComment "/* outer /* inner */ still */"
    Eof ""
    "###);
}

#[test]
fn empty_block_comment_is_not_kdoc() {
    assert_snapshot!(lex_snapshot("/**/"), @r###"
    BlockComment "/**/"
    Eof ""
    "###);
}

#[test]
fn kdoc_spanning_lines() {
    assert_snapshot!(lex_snapshot("/**\n * Hello.\n */"), @r###"
    KDoc "/**\n * Hello.\n */"
    Eof ""
    "###);
}

#[test]
fn char_literals() {
    assert_snapshot!(lex_snapshot(r"'a' '\n'"), @r###"
    CharLiteral "'a'"
    Whitespace " "
    CharLiteral "'\\n'"
    Eof ""
    "###);
}

#[test]
fn unterminated_string_reports_error() {
    let (_, errors) = tokenize("\"oops\nval a = 1");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "unterminated string literal");
}

#[test]
fn spans_are_byte_accurate() {
    let (tokens, _) = tokenize("val x = 42");
    assert_eq!((tokens[0].span.start, tokens[0].span.end), (0, 3)); // val
    assert_eq!((tokens[2].span.start, tokens[2].span.end), (4, 5)); // x
    assert_eq!((tokens[4].span.start, tokens[4].span.end), (6, 7)); // =
    assert_eq!((tokens[6].span.start, tokens[6].span.end), (8, 10)); // 42
}
