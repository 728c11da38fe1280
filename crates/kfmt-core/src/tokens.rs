//! Formatting token IR.
//!
//! This module defines the intermediate representation between the tree
//! scanners and the printer. Scanners emit a flat stream of these tokens;
//! the preprocessor fills in lengths and resolves markers and synchronized
//! breaks; the printer consumes the result and emits text.
//!
//! Widths are display widths (via `unicode-width`), never byte counts.

use unicode_width::UnicodeWidthStr;

/// Formatting state carried by a [`Token::Begin`] block.
///
/// The state controls the indent increments applied when a break is taken
/// inside the block, whether plain whitespace participates in block-level
/// consistent breaking, and the prefix used on continuation lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Ordinary code.
    Code,
    /// A single-line string template; wraps by closing the quote and
    /// emitting `+` before the break.
    StringLiteral,
    /// A raw `"""` string; content is verbatim and never reflowed.
    MultilineString,
    /// A trailing `// ...` comment, preserved verbatim.
    LineComment,
    /// A `/* ... */` comment.
    BlockComment,
    /// A `/** ... */` documentation comment.
    KDoc,
    /// A package or import directive; never breaks, whatever the length.
    PackageImport,
    /// A standalone `// ...` comment being re-wrapped to the line limit;
    /// continuation lines get a `// ` prefix.
    LongCommentContinuation,
}

impl State {
    /// Whether plain whitespace inside this block breaks consistently when
    /// the block did not fit flat at its opening. Non-code states wrap
    /// greedily (string literals, re-wrapped comments) or not at all.
    pub fn breaks_consistently(self) -> bool {
        matches!(self, State::Code)
    }

    /// Prefix written after the indent on continuation lines.
    pub fn continuation_prefix(self) -> Option<&'static str> {
        match self {
            State::LongCommentContinuation => Some("// "),
            _ => None,
        }
    }

    /// Whether this is a comment state, for whitespace-before-comment
    /// handling in the preprocessor.
    pub fn is_comment(self) -> bool {
        matches!(
            self,
            State::LineComment
                | State::BlockComment
                | State::KDoc
                | State::LongCommentContinuation
        )
    }
}

/// One token of the formatting IR.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Literal output. Fixed width; never a break point.
    Leaf { text: String },
    /// A candidate break point. `content` is emitted verbatim when the
    /// break is not taken. `length` is filled in by the preprocessor:
    /// the content's own width (0 or 1) plus the width of what follows
    /// up to the next break opportunity.
    Whitespace { content: String, length: usize },
    /// Opens a block. `length` is the block's flat width, filled in by
    /// the preprocessor.
    Begin { state: State, length: usize },
    /// Closes the nearest enclosing `Begin`.
    End,
    /// Unconditional newline(s); `count` of 2 produces one blank line.
    ForcedBreak { count: u8 },
    /// Unconditional newline that de-indents to the block's opening
    /// indent (used before a closing delimiter).
    ClosingForcedBreak,
    /// Breaks iff any break in the same block fires; otherwise emits
    /// `spaces` spaces.
    SynchronizedBreak { spaces: usize },
    /// Same, but de-indents to the block's opening indent.
    ClosingSynchronizedBreak { spaces: usize },
    /// A position marker, later consumed by [`Token::BlockFromMarker`].
    Marker,
    /// Preprocessor directive: wrap the tokens since the most recent
    /// marker in a synthetic `Begin(Code)...End`.
    BlockFromMarker,
    /// Preprocessor directive: wrap the tokens since the last forced
    /// break in the current block (or the whole block if none).
    BlockFromLastForcedBreak,
    /// Opaque documentation content; may contain newlines. Width is the
    /// widest line.
    KDocContent { text: String },
}

impl Token {
    /// The width this token contributes to its enclosing block's flat
    /// length. `Begin`/`End` contribute nothing themselves: a nested
    /// block's contents are part of the same flattened stream and carry
    /// their own widths.
    pub fn intrinsic_width(&self) -> usize {
        match self {
            Token::Leaf { text } => text_width(text),
            Token::Whitespace { content, .. } => {
                if content.is_empty() {
                    0
                } else {
                    1
                }
            }
            Token::SynchronizedBreak { spaces } | Token::ClosingSynchronizedBreak { spaces } => {
                *spaces
            }
            Token::KDocContent { text } => text_width(text),
            _ => 0,
        }
    }
}

/// Display width of a string; for multi-line text, the widest line.
pub fn text_width(text: &str) -> usize {
    if text.contains('\n') {
        text.lines().map(UnicodeWidthStr::width).max().unwrap_or(0)
    } else {
        UnicodeWidthStr::width(text)
    }
}

// ── Helper constructors ─────────────────────────────────────────────────

/// Create a `Leaf` from a string-like value.
pub fn leaf(text: impl Into<String>) -> Token {
    Token::Leaf { text: text.into() }
}

/// Create a `Whitespace` break candidate; the preprocessor fills `length`.
pub fn ws(content: impl Into<String>) -> Token {
    Token::Whitespace {
        content: content.into(),
        length: 0,
    }
}

/// Create a `Begin` for the given state; the preprocessor fills `length`.
pub fn begin(state: State) -> Token {
    Token::Begin { state, length: 0 }
}

/// Create an `End`.
pub fn end() -> Token {
    Token::End
}

/// Create a `ForcedBreak`; `count` is clamped to 1..=2.
pub fn forced_break(count: u8) -> Token {
    Token::ForcedBreak {
        count: count.clamp(1, 2),
    }
}

/// Create a `ClosingForcedBreak`.
pub fn closing_forced_break() -> Token {
    Token::ClosingForcedBreak
}

/// Create a `SynchronizedBreak` that renders as `spaces` spaces inline.
pub fn sync_break(spaces: usize) -> Token {
    Token::SynchronizedBreak { spaces }
}

/// Create a `ClosingSynchronizedBreak`.
pub fn closing_sync_break(spaces: usize) -> Token {
    Token::ClosingSynchronizedBreak { spaces }
}

/// Create a `Marker`.
pub fn marker() -> Token {
    Token::Marker
}

/// Create a `KDocContent` token.
pub fn kdoc_content(text: impl Into<String>) -> Token {
    Token::KDocContent { text: text.into() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_width_is_display_width() {
        assert_eq!(leaf("hello").intrinsic_width(), 5);
        // Full-width CJK characters count double.
        assert_eq!(leaf("\u{4F60}\u{597D}").intrinsic_width(), 4);
    }

    #[test]
    fn whitespace_width_is_zero_or_one() {
        assert_eq!(ws("").intrinsic_width(), 0);
        assert_eq!(ws(" ").intrinsic_width(), 1);
        assert_eq!(ws("\n\n    ").intrinsic_width(), 1);
    }

    #[test]
    fn kdoc_width_is_widest_line() {
        let t = kdoc_content("short\na much longer line\nmid");
        assert_eq!(t.intrinsic_width(), 18);
    }

    #[test]
    fn structural_tokens_have_no_width() {
        assert_eq!(begin(State::Code).intrinsic_width(), 0);
        assert_eq!(end().intrinsic_width(), 0);
        assert_eq!(forced_break(2).intrinsic_width(), 0);
        assert_eq!(closing_forced_break().intrinsic_width(), 0);
    }

    #[test]
    fn sync_break_width_is_its_inline_spaces() {
        assert_eq!(sync_break(0).intrinsic_width(), 0);
        assert_eq!(sync_break(1).intrinsic_width(), 1);
    }

    #[test]
    fn forced_break_count_is_clamped() {
        assert_eq!(forced_break(0), Token::ForcedBreak { count: 1 });
        assert_eq!(forced_break(5), Token::ForcedBreak { count: 2 });
    }

    #[test]
    fn only_code_breaks_consistently() {
        assert!(State::Code.breaks_consistently());
        assert!(!State::StringLiteral.breaks_consistently());
        assert!(!State::LongCommentContinuation.breaks_consistently());
    }
}
