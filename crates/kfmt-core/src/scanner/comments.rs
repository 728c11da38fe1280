//! Comment emission.
//!
//! Standalone `//` comments become re-wrappable blocks: word by word with
//! breakable spaces, so an over-long comment flows onto `// `-prefixed
//! continuation lines. Trailing comments and block comments stay verbatim;
//! KDoc goes through the documentation reflow at print time.

use crate::tokens::{begin, end, forced_break, kdoc_content, leaf, ws, State, Token};

/// `// ...`. `standalone` comments re-wrap; trailing ones are verbatim.
pub(super) fn line_comment(text: &str, trailing: bool) -> Vec<Token> {
    if trailing {
        return vec![
            begin(State::LineComment),
            leaf(text.trim_end()),
            end(),
        ];
    }

    let interior = text.strip_prefix("//").unwrap_or(text);
    let mut out = vec![begin(State::LongCommentContinuation), leaf("//")];
    for word in interior.split_whitespace() {
        out.push(ws(" "));
        out.push(leaf(word));
    }
    out.push(end());
    out
}

/// `/* ... */`, line structure preserved. Continuation lines keep a ` * `
/// gutter only when the source wrote one.
pub(super) fn block_comment(text: &str) -> Vec<Token> {
    let mut out = vec![begin(State::BlockComment)];
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        out.push(leaf(first.trim_end()));
    }
    for line in lines {
        out.push(forced_break(1));
        let trimmed = line.trim();
        if trimmed.starts_with('*') {
            // Align the gutter star under the opener's one.
            out.push(leaf(format!(" {trimmed}")));
        } else {
            out.push(leaf(trimmed));
        }
    }
    out.push(end());
    out
}

/// `/** ... */` -- the interior travels opaque; rendering happens in the
/// printer against the real line budget.
pub(super) fn kdoc_block(text: &str) -> Vec<Token> {
    let interior = text.strip_prefix("/**").unwrap_or(text);
    let interior = interior.strip_suffix("*/").unwrap_or(interior);
    vec![begin(State::KDoc), kdoc_content(interior), end()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Token;

    #[test]
    fn standalone_line_comment_splits_words() {
        let tokens = line_comment("// hello   world", false);
        assert_eq!(tokens[0], begin(State::LongCommentContinuation));
        assert_eq!(tokens[1], leaf("//"));
        assert_eq!(tokens[2], ws(" "));
        assert_eq!(tokens[3], leaf("hello"));
        assert_eq!(tokens[4], ws(" "));
        assert_eq!(tokens[5], leaf("world"));
        assert_eq!(tokens.last(), Some(&end()));
    }

    #[test]
    fn trailing_line_comment_is_verbatim() {
        let tokens = line_comment("// keep   this   spacing", true);
        assert_eq!(
            tokens,
            vec![
                begin(State::LineComment),
                leaf("// keep   this   spacing"),
                end(),
            ]
        );
    }

    #[test]
    fn block_comment_keeps_line_structure() {
        let tokens = block_comment("/* one\n * two\n */");
        assert_eq!(tokens[0], begin(State::BlockComment));
        assert_eq!(tokens[1], leaf("/* one"));
        assert_eq!(tokens[2], forced_break(1));
        assert_eq!(tokens[3], leaf(" * two"));
        assert_eq!(tokens[4], forced_break(1));
        assert_eq!(tokens[5], leaf(" */"));
    }

    #[test]
    fn block_comment_without_gutter_stays_plain() {
        let tokens = block_comment("/* one\ntwo */");
        assert_eq!(tokens[3], leaf("two */"));
    }

    #[test]
    fn kdoc_block_strips_delimiters() {
        let tokens = kdoc_block("/** Hi. */");
        assert!(matches!(
            &tokens[1],
            Token::KDocContent { text } if text == " Hi. "
        ));
    }
}
