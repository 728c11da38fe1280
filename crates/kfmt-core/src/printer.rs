//! Line-breaking printer.
//!
//! Consumes the preprocessed token stream and emits indented text. The
//! printer's entire mutable state is the current line buffer, the indent
//! written at its start, and a stack of block frames; preprocessing has
//! already resolved synchronized behavior, so no backtracking happens here.
//!
//! Break decisions:
//! - a `Whitespace` breaks when the line cannot hold its lookahead length,
//!   or (in `Code` blocks) when the enclosing block already failed to fit
//!   flat at its opening;
//! - synchronized breaks fire iff their block failed to fit flat or some
//!   break in it already fired;
//! - forced breaks always fire;
//! - nothing breaks in `PackageImport` blocks, ever.

use unicode_width::UnicodeWidthStr;

use crate::kdoc;
use crate::tokens::{State, Token};

/// Printer configuration.
#[derive(Debug, Clone)]
pub struct PrintConfig {
    /// Maximum display width of an output line. Default: 100.
    pub max_line_length: usize,
    /// Indent step for block contents (statements, parameters). Default: 4.
    pub standard_indent: usize,
    /// Indent for continuation lines of a wrapped statement. Default: 8.
    pub continuation_indent: usize,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            max_line_length: 100,
            standard_indent: 4,
            continuation_indent: 8,
        }
    }
}

/// One open block while printing.
struct Frame {
    state: State,
    /// Indent of the line the block opened on; closing breaks return here.
    open_indent: usize,
    /// Indent for forced/synchronized breaks inside the block.
    content_indent: usize,
    /// The block's flat width did not fit when it opened.
    exceeded: bool,
    /// A break at this block's top level has fired.
    broken: bool,
}

/// Render a preprocessed token stream as text.
pub fn print(tokens: &[Token], config: &PrintConfig) -> String {
    let mut printer = Printer::new(config);
    for token in tokens {
        printer.handle(token);
    }
    printer.finish()
}

struct Printer<'cfg> {
    config: &'cfg PrintConfig,
    out: String,
    /// Current (unflushed) output line.
    line: String,
    /// Indent written at the start of the current line.
    line_indent: usize,
    frames: Vec<Frame>,
}

impl<'cfg> Printer<'cfg> {
    fn new(config: &'cfg PrintConfig) -> Self {
        Self {
            config,
            out: String::new(),
            line: String::new(),
            line_indent: 0,
            frames: vec![Frame {
                state: State::Code,
                open_indent: 0,
                // The root is not a statement block: top-level declarations
                // sit at column zero.
                content_indent: 0,
                exceeded: false,
                broken: false,
            }],
        }
    }

    fn column(&self) -> usize {
        UnicodeWidthStr::width(self.line.as_str())
    }

    fn frame(&self) -> &Frame {
        self.frames.last().expect("frame stack never empties")
    }

    fn frame_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().expect("frame stack never empties")
    }

    fn handle(&mut self, token: &Token) {
        match token {
            Token::Leaf { text } => self.emit_text(text),

            Token::KDocContent { text } => self.emit_kdoc(text),

            Token::Begin { state, length } => {
                let open_indent = self.line_indent;
                let content_indent = if *state == State::Code {
                    open_indent + self.config.standard_indent
                } else {
                    open_indent
                };
                let exceeded = self.column() + length > self.config.max_line_length;
                self.frames.push(Frame {
                    state: *state,
                    open_indent,
                    content_indent,
                    exceeded,
                    broken: false,
                });
            }

            Token::End => {
                if self.frames.len() > 1 {
                    self.frames.pop();
                }
            }

            Token::Whitespace { content, length } => self.handle_whitespace(content, *length),

            Token::ForcedBreak { count } => {
                for _ in 0..*count {
                    self.newline();
                }
                let indent = self.frame().content_indent;
                self.indent_to(indent);
                self.frame_mut().broken = true;
            }

            Token::ClosingForcedBreak => {
                self.newline();
                let indent = self.frame().open_indent;
                self.indent_to(indent);
                self.frame_mut().broken = true;
            }

            Token::SynchronizedBreak { spaces } => {
                if self.sync_break_fires() {
                    self.newline();
                    let indent = self.frame().content_indent;
                    self.indent_to(indent);
                    self.frame_mut().broken = true;
                } else {
                    self.line.push_str(&" ".repeat(*spaces));
                }
            }

            Token::ClosingSynchronizedBreak { spaces } => {
                if self.sync_break_fires() {
                    self.newline();
                    let indent = self.frame().open_indent;
                    self.indent_to(indent);
                    self.frame_mut().broken = true;
                } else {
                    self.line.push_str(&" ".repeat(*spaces));
                }
            }

            // Preprocessing leaves none of these behind.
            Token::Marker | Token::BlockFromMarker | Token::BlockFromLastForcedBreak => {
                debug_assert!(false, "marker token escaped preprocessing");
            }
        }
    }

    fn sync_break_fires(&self) -> bool {
        let frame = self.frame();
        if frame.state == State::PackageImport {
            return false;
        }
        frame.exceeded || frame.broken
    }

    fn handle_whitespace(&mut self, content: &str, length: usize) {
        let state = self.frame().state;
        let fits = self.column() + length <= self.config.max_line_length;
        let fires = match state {
            // Never break these; content passes through.
            State::PackageImport
            | State::LineComment
            | State::BlockComment
            | State::KDoc
            | State::MultilineString => false,
            // Consistent: also break when the block did not fit flat.
            State::Code => !fits || self.frame().exceeded,
            // Greedy wrapping: break only on actual overflow.
            State::StringLiteral | State::LongCommentContinuation => !fits,
        };

        if !fires {
            self.line.push_str(content);
            return;
        }

        match state {
            State::StringLiteral => {
                // Close the literal, add the concatenation operator, and
                // reopen at the continuation indent.
                self.line.push_str(content);
                self.line.push_str("\" +");
                self.newline();
                let indent = self.frame().open_indent + self.config.continuation_indent;
                self.indent_to(indent);
                self.line.push('"');
            }
            State::LongCommentContinuation => {
                self.newline();
                let indent = self.frame().open_indent;
                self.indent_to(indent);
                if let Some(prefix) = State::LongCommentContinuation.continuation_prefix() {
                    self.line.push_str(prefix);
                }
            }
            _ => {
                self.newline();
                let indent = self.frame().open_indent + self.config.continuation_indent;
                self.indent_to(indent);
            }
        }
        self.frame_mut().broken = true;
    }

    /// Append literal text; text with embedded newlines (raw strings) is
    /// flushed verbatim, without trimming or re-indenting.
    fn emit_text(&mut self, text: &str) {
        if !text.contains('\n') {
            self.line.push_str(text);
            return;
        }
        let mut parts = text.split('\n').peekable();
        while let Some(part) = parts.next() {
            self.line.push_str(part);
            if parts.peek().is_some() {
                // Verbatim flush: inner lines of a raw string are not ours
                // to touch.
                self.out.push_str(&self.line);
                self.out.push('\n');
                self.line.clear();
                self.line_indent = 0;
            }
        }
    }

    /// Render a documentation comment at the current indent.
    fn emit_kdoc(&mut self, text: &str) {
        let indent = self.frame().open_indent;
        let budget = self.config.max_line_length.saturating_sub(indent);
        let lines = kdoc::format_kdoc(text, budget);
        let mut first = true;
        for rendered in lines {
            if !first {
                self.newline();
                self.indent_to(indent);
            }
            self.line.push_str(&rendered);
            first = false;
        }
    }

    /// Flush the current line. Trailing spaces are stripped except inside
    /// raw strings.
    fn newline(&mut self) {
        if self.frame().state == State::MultilineString {
            self.out.push_str(&self.line);
        } else {
            self.out.push_str(self.line.trim_end());
        }
        self.out.push('\n');
        self.line.clear();
        self.line_indent = 0;
    }

    fn indent_to(&mut self, indent: usize) {
        self.line.push_str(&" ".repeat(indent));
        self.line_indent = indent;
    }

    fn finish(mut self) -> String {
        if !self.line.trim_end().is_empty() {
            self.newline();
        }
        // Exactly one trailing newline.
        let trimmed_len = self.out.trim_end_matches('\n').len();
        self.out.truncate(trimmed_len);
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::preprocess;
    use crate::tokens::*;

    fn render(tokens: Vec<Token>, max: usize) -> String {
        let config = PrintConfig {
            max_line_length: max,
            ..PrintConfig::default()
        };
        print(&preprocess(tokens, max), &config)
    }

    #[test]
    fn short_line_stays_flat() {
        let out = render(
            vec![
                begin(State::Code),
                leaf("val"),
                leaf(" "),
                leaf("a"),
                leaf(" ="),
                ws(" "),
                leaf("1"),
                end(),
            ],
            50,
        );
        assert_eq!(out, "val a = 1\n");
    }

    #[test]
    fn break_at_assignment_uses_continuation_indent() {
        // "val a = F(p1, p2, p3)" with an over-long right-hand side.
        let out = render(
            vec![
                begin(State::Code),
                leaf("val"),
                leaf(" "),
                leaf("a"),
                leaf(" ="),
                ws(" "),
                begin(State::Code),
                leaf("FooFactory(param1, param2, param3)"),
                end(),
                end(),
            ],
            40,
        );
        assert_eq!(out, "val a =\n        FooFactory(param1, param2, param3)\n");
    }

    #[test]
    fn sync_breaks_fire_together_when_block_overflows() {
        // "(aParameter, bParameter)" at width 20: every parameter on its
        // own line, closing paren back at the opening indent.
        let out = render(
            vec![
                leaf("f"),
                leaf("("),
                begin(State::Code),
                sync_break(0),
                leaf("aParameter"),
                leaf(","),
                sync_break(1),
                leaf("bParameter"),
                closing_sync_break(0),
                end(),
                leaf(")"),
            ],
            20,
        );
        assert_eq!(out, "f(\n    aParameter,\n    bParameter\n)\n");
    }

    #[test]
    fn sync_breaks_stay_inline_when_block_fits() {
        let out = render(
            vec![
                leaf("f"),
                leaf("("),
                begin(State::Code),
                sync_break(0),
                leaf("a"),
                leaf(","),
                sync_break(1),
                leaf("b"),
                closing_sync_break(0),
                end(),
                leaf(")"),
            ],
            50,
        );
        assert_eq!(out, "f(a, b)\n");
    }

    #[test]
    fn forced_break_indents_block_content() {
        let out = render(
            vec![
                leaf("fun f() {"),
                begin(State::Code),
                forced_break(1),
                leaf("body()"),
                closing_forced_break(),
                end(),
                leaf("}"),
            ],
            50,
        );
        assert_eq!(out, "fun f() {\n    body()\n}\n");
    }

    #[test]
    fn forced_break_count_two_leaves_blank_line() {
        // Top-level separators live in the root frame at column zero.
        let out = render(vec![leaf("a()"), forced_break(2), leaf("b()")], 50);
        assert_eq!(out, "a()\n\nb()\n");
    }

    #[test]
    fn package_import_never_breaks() {
        let out = render(
            vec![
                begin(State::PackageImport),
                leaf("package"),
                ws(" "),
                leaf("org.a.b.c.d.e.f.very.long"),
                end(),
            ],
            20,
        );
        assert_eq!(out, "package org.a.b.c.d.e.f.very.long\n");
    }

    #[test]
    fn string_literal_wraps_with_concatenation() {
        let out = render(
            vec![
                begin(State::Code),
                leaf("val s = "),
                begin(State::StringLiteral),
                leaf("\""),
                leaf("aaaa "),
                ws(""),
                leaf("bbbb "),
                ws(""),
                leaf("cccc"),
                leaf("\""),
                end(),
                end(),
            ],
            17,
        );
        assert_eq!(out, "val s = \"aaaa \" +\n        \"bbbb \" +\n        \"cccc\"\n");
    }

    #[test]
    fn long_comment_rewraps_with_prefix() {
        let out = render(
            vec![
                begin(State::LongCommentContinuation),
                leaf("//"),
                ws(" "),
                leaf("alpha"),
                ws(" "),
                leaf("beta"),
                ws(" "),
                leaf("gamma"),
                end(),
            ],
            12,
        );
        assert_eq!(out, "// alpha\n// beta\n// gamma\n");
    }

    #[test]
    fn multiline_string_kept_verbatim() {
        let out = render(
            vec![
                leaf("val s = "),
                begin(State::MultilineString),
                leaf("\"\"\"line one   \nline two\"\"\""),
                end(),
            ],
            10,
        );
        assert_eq!(out, "val s = \"\"\"line one   \nline two\"\"\"\n");
    }

    #[test]
    fn trailing_spaces_are_stripped() {
        let out = render(vec![leaf("a"), leaf("  "), forced_break(1), leaf("b")], 50);
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn nested_blocks_restore_indent() {
        // Outer block indents, inner block breaks deeper, both close back.
        let out = render(
            vec![
                leaf("outer {"),
                begin(State::Code),
                forced_break(1),
                leaf("inner {"),
                begin(State::Code),
                forced_break(1),
                leaf("x()"),
                closing_forced_break(),
                end(),
                leaf("}"),
                closing_forced_break(),
                end(),
                leaf("}"),
            ],
            50,
        );
        assert_eq!(out, "outer {\n    inner {\n        x()\n    }\n}\n");
    }

    #[test]
    fn output_ends_with_exactly_one_newline() {
        let out = render(vec![leaf("x"), begin(State::Code), forced_break(2), end()], 50);
        assert_eq!(out, "x\n");
    }
}
