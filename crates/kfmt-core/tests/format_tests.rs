//! End-to-end formatting tests: source in, formatted source out.

use kfmt_core::{FormatError, Formatter};

fn fmt(source: &str) -> String {
    Formatter::default()
        .format(source)
        .expect("formatting should succeed")
}

fn fmt_at(source: &str, max: usize) -> String {
    Formatter::new(max)
        .format(source)
        .expect("formatting should succeed")
}

#[test]
fn already_formatted_function_is_unchanged() {
    let source = "fun add(a: Int, b: Int): Int {\n    return a + b\n}\n";
    assert_eq!(fmt(source), source);
}

#[test]
fn messy_spacing_is_normalized() {
    let source = "fun  add( a :Int,b: Int ) :Int{\nreturn a+b\n}";
    assert_eq!(
        fmt(source),
        "fun add(a: Int, b: Int): Int {\n    return a + b\n}\n"
    );
}

#[test]
fn property_with_interpolated_string() {
    let source = "val greeting = \"Hello, $name!\"\n";
    assert_eq!(fmt(source), source);
}

#[test]
fn long_assignment_breaks_after_equals() {
    let source = "val widget = factory.createWidget(alpha, beta, gamma)\n";
    assert_eq!(
        fmt_at(source, 50),
        "val widget =\n        factory.createWidget(alpha, beta, gamma)\n"
    );
}

#[test]
fn long_constructor_puts_each_parameter_on_its_own_line() {
    let source = "class Person(firstName: String, lastName: String, age: Int)\n";
    assert_eq!(
        fmt_at(source, 50),
        "class Person(\n    firstName: String,\n    lastName: String,\n    age: Int\n)\n"
    );
}

#[test]
fn long_condition_breaks_inside_parens_and_deindents_close() {
    let source = "fun f() {\n    if (conditionOne && conditionTwo && conditionThree) {\n        act()\n    }\n}\n";
    assert_eq!(
        fmt_at(source, 50),
        concat!(
            "fun f() {\n",
            "    if (conditionOne &&\n",
            "            conditionTwo &&\n",
            "            conditionThree\n",
            "    ) {\n",
            "        act()\n",
            "    }\n",
            "}\n",
        )
    );
}

#[test]
fn long_call_chain_breaks_before_each_dot() {
    let source = "builder.withAlpha().withBeta().withGamma().withDelta().withEpsilon()\n";
    assert_eq!(
        fmt_at(source, 50),
        concat!(
            "builder\n",
            "        .withAlpha()\n",
            "        .withBeta()\n",
            "        .withGamma()\n",
            "        .withDelta()\n",
            "        .withEpsilon()\n",
        )
    );
}

#[test]
fn long_string_wraps_at_word_boundaries_with_concatenation() {
    let source = "val message = \"This string is long enough that it must wrap here and there\"\n";
    assert_eq!(
        fmt_at(source, 50),
        concat!(
            "val message = \"This string is long enough that it \" +\n",
            "        \"must wrap here and there\"\n",
        )
    );
}

#[test]
fn package_directive_never_breaks() {
    let source = "package org.a.b.c.d.e.f.very.long\n";
    assert_eq!(fmt_at(source, 20), source);
}

#[test]
fn package_and_imports_get_blank_lines_and_imports_are_dense() {
    let source = "package a.b\nimport c.d\n\n\nimport e.f\nval x = 1\n";
    assert_eq!(
        fmt(source),
        "package a.b\n\nimport c.d\nimport e.f\n\nval x = 1\n"
    );
}

#[test]
fn import_alias_survives() {
    let source = "import a.b.C as D\n";
    assert_eq!(fmt(source), source);
}

#[test]
fn blank_line_runs_collapse_to_one() {
    let source = "fun f() {\n    first()\n\n\n\n    second()\n}\n";
    assert_eq!(fmt(source), "fun f() {\n    first()\n\n    second()\n}\n");
}

#[test]
fn standalone_and_trailing_comments_are_kept() {
    let source = "// A standalone comment\nval x = 1 // trailing\n";
    assert_eq!(fmt(source), source);
}

#[test]
fn long_standalone_comment_rewraps() {
    let source = "// alpha beta gamma delta epsilon zeta\n";
    assert_eq!(
        fmt_at(source, 20),
        "// alpha beta gamma\n// delta epsilon\n// zeta\n"
    );
}

#[test]
fn class_with_kdoc_members_roundtrips() {
    let source = concat!(
        "/** A greeter. */\n",
        "class Greeter(val name: String) {\n",
        "    /** Says hello. */\n",
        "    fun greet(): String {\n",
        "        return \"Hello, $name!\"\n",
        "    }\n",
        "}\n",
    );
    assert_eq!(fmt(source), source);
}

#[test]
fn long_kdoc_expands_to_block_form() {
    let source =
        "/** This documentation comment is too long to stay on a single line. */\nfun f() {}\n";
    assert_eq!(
        fmt_at(source, 50),
        concat!(
            "/**\n",
            " * This documentation comment is too long to stay\n",
            " * on a single line.\n",
            " */\n",
            "fun f() {}\n",
        )
    );
}

#[test]
fn if_else_chain_roundtrips() {
    let source = concat!(
        "fun f(c: Boolean, d: Boolean): Int {\n",
        "    if (c) {\n",
        "        return 1\n",
        "    } else if (d) {\n",
        "        return 2\n",
        "    } else {\n",
        "        return 3\n",
        "    }\n",
        "}\n",
    );
    assert_eq!(fmt(source), source);
}

#[test]
fn while_and_for_roundtrip() {
    let source = concat!(
        "fun g(items: List<Int>) {\n",
        "    for (x in items) {\n",
        "        use(x)\n",
        "    }\n",
        "    var i = 0\n",
        "    while (i < 10) {\n",
        "        i = i + 1\n",
        "    }\n",
        "}\n",
    );
    assert_eq!(fmt(source), source);
}

#[test]
fn raw_string_content_is_verbatim() {
    let source = "val s = \"\"\"line one\nline two\"\"\"\n";
    assert_eq!(fmt(source), source);
}

#[test]
fn operator_precedence_spacing() {
    assert_eq!(fmt("val r = a&&b || c\n"), "val r = a && b || c\n");
    assert_eq!(fmt("val n = (value as Int) + 1\n"), "val n = (value as Int) + 1\n");
    assert_eq!(fmt("val r = a?.b ?: fallback\n"), "val r = a?.b ?: fallback\n");
    assert_eq!(fmt("val range = 1..10\n"), "val range = 1..10\n");
}

#[test]
fn named_arguments_roundtrip() {
    let source = "val p = Point(x = 1, y = 2)\n";
    assert_eq!(fmt(source), source);
}

#[test]
fn interface_with_abstract_member() {
    let source = "interface Shape {\n    fun area(): Double\n}\n";
    assert_eq!(fmt(source), source);
}

#[test]
fn data_class_with_supertype() {
    let source = "data class Point(val x: Int, val y: Int) : Base(x), Printable\n";
    assert_eq!(fmt(source), source);
}

#[test]
fn empty_body_collapses() {
    assert_eq!(fmt("fun f() { }\n"), "fun f() {}\n");
    assert_eq!(fmt("class Empty {\n}\n"), "class Empty {}\n");
}

#[test]
fn semicolons_are_dropped() {
    assert_eq!(
        fmt("fun f() {\n    a();\n    b();\n}\n"),
        "fun f() {\n    a()\n    b()\n}\n"
    );
}

// ── Properties ─────────────────────────────────────────────────────────

const CORPUS: &[&str] = &[
    "fun add(a: Int, b: Int): Int {\n    return a + b\n}\n",
    "fun  add( a :Int,b: Int ) :Int{\nreturn a+b\n}",
    "val widget = factory.createWidget(alpha, beta, gamma)\n",
    "class Person(firstName: String, lastName: String, age: Int)\n",
    "builder.withAlpha().withBeta().withGamma().withDelta().withEpsilon()\n",
    "package a.b\nimport c.d\n\n\nimport e.f\nval x = 1\n",
    "// A standalone comment\nval x = 1 // trailing\n",
    "fun f(c: Boolean, d: Boolean): Int {\n    if (c) {\n        return 1\n    } else {\n        return 2\n    }\n}\n",
];

#[test]
fn formatting_is_idempotent() {
    for max in [50, 100] {
        for source in CORPUS {
            let once = fmt_at(source, max);
            let twice = fmt_at(&once, max);
            assert_eq!(twice, once, "not idempotent at {max} for {source:?}");
        }
    }
}

#[test]
fn column_discipline_for_code_lines() {
    // Code-only inputs: every output line fits the limit.
    let inputs = [
        "val widget = factory.createWidget(alpha, beta, gamma)\n",
        "class Person(firstName: String, lastName: String, age: Int)\n",
        "builder.withAlpha().withBeta().withGamma().withDelta().withEpsilon()\n",
        "fun f() {\n    if (conditionOne && conditionTwo && conditionThree) {\n        act()\n    }\n}\n",
    ];
    for source in inputs {
        let out = fmt_at(source, 50);
        for line in out.lines() {
            assert!(
                line.len() <= 50,
                "line exceeds limit in output of {source:?}: {line:?}"
            );
        }
    }
}

#[test]
fn formatting_preserves_significant_tokens() {
    // Reformatting moves whitespace around; it must never change the
    // token stream (modulo trivia and dropped statement semicolons).
    for source in CORPUS {
        let formatted = fmt_at(source, 50);
        assert_eq!(
            significant_tokens(&formatted),
            significant_tokens(source),
            "token stream changed for {source:?}"
        );
    }
}

fn significant_tokens(source: &str) -> Vec<String> {
    use kfmt_common::token::TokenKind;
    let (tokens, errors) = kfmt_lexer::tokenize(source);
    assert!(errors.is_empty(), "lex errors in {source:?}");
    tokens
        .into_iter()
        .filter(|t| {
            !t.kind.is_trivia() && t.kind != TokenKind::Semicolon && t.kind != TokenKind::Eof
        })
        .map(|t| source[t.span.start as usize..t.span.end as usize].to_string())
        .collect()
}

#[test]
fn formatter_state_does_not_leak_between_calls() {
    let formatter = Formatter::default();
    let a = "class A(val x: Int)\n";
    let b = "fun b() {\n    run()\n}\n";
    let _ = formatter.format(a).unwrap();
    let b_after_a = formatter.format(b).unwrap();
    assert_eq!(b_after_a, Formatter::default().format(b).unwrap());
}

#[test]
fn parse_error_reports_line_and_leaves_no_output() {
    let err = Formatter::default()
        .format("fun valid() {}\nfun broken(\n")
        .unwrap_err();
    match err {
        FormatError::Parse { line, .. } => assert_eq!(line, 2),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn format_file_rewrites_only_when_changed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.kt");
    std::fs::write(&path, "val  x=1").unwrap();

    Formatter::default().format_file(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "val x = 1\n");
}

#[test]
fn format_file_leaves_unparseable_input_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.kt");
    std::fs::write(&path, "fun broken(").unwrap();

    Formatter::default().format_file(&path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "fun broken(");
}
