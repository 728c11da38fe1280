//! Documentation-comment reflow.
//!
//! Takes the interior of a `/** ... */` comment (delimiters stripped, the
//! ` * ` line markers still present) and renders it within a width budget:
//! a one-line `/** text */` when it fits, otherwise the block form with
//! ` * ` prefixes. Prose reflows at word boundaries; tags (`@param` etc.)
//! start their own paragraphs with continuations indented four extra
//! spaces; fenced code and list items pass through verbatim.

use unicode_width::UnicodeWidthStr;

/// Render a KDoc comment's interior. Returns output lines; the caller
/// applies the surrounding indent to every line but the first.
pub fn format_kdoc(text: &str, max_width: usize) -> Vec<String> {
    let lines = strip_markers(text);

    if lines.is_empty() {
        return vec!["/** */".to_string()];
    }

    if lines.len() == 1 && !lines[0].is_empty() {
        let single = format!("/** {} */", lines[0]);
        if UnicodeWidthStr::width(single.as_str()) <= max_width {
            return vec![single];
        }
    }

    render_block(&lines, max_width)
}

/// Split the interior into logical lines with the ` * ` markers removed.
/// Leading and trailing blank lines are dropped.
fn strip_markers(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text
        .lines()
        .map(|line| {
            let trimmed = line.trim_start();
            let without_star = trimmed.strip_prefix('*').unwrap_or(trimmed);
            let without_space = without_star.strip_prefix(' ').unwrap_or(without_star);
            without_space.trim_end().to_string()
        })
        .collect();

    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

/// Whether a logical line begins a list item (`* x`, `- x`, `1. x`).
fn is_list_item(line: &str) -> bool {
    if line.starts_with("* ") || line.starts_with("- ") {
        return true;
    }
    let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
    !digits.is_empty() && line[digits.len()..].starts_with(". ")
}

fn render_block(lines: &[String], max_width: usize) -> Vec<String> {
    // Budget for text after the " * " prefix.
    let budget = max_width.saturating_sub(3).max(1);

    let mut out: Vec<String> = vec!["/**".to_string()];
    let mut paragraph: Vec<&str> = Vec::new();
    let mut in_fence = false;

    let flush =
        |paragraph: &mut Vec<&str>, out: &mut Vec<String>| {
            if paragraph.is_empty() {
                return;
            }
            let joined = paragraph.join(" ");
            for wrapped in wrap_words(&joined, budget, 0) {
                out.push(format!(" * {wrapped}").trim_end().to_string());
            }
            paragraph.clear();
        };

    for line in lines {
        let is_fence_marker = line.trim_start().starts_with("```");

        if in_fence || is_fence_marker {
            flush(&mut paragraph, &mut out);
            out.push(format!(" * {line}").trim_end().to_string());
            if is_fence_marker {
                in_fence = !in_fence;
            }
            continue;
        }

        if line.is_empty() {
            flush(&mut paragraph, &mut out);
            // Paragraph separator; consecutive blanks collapse to one.
            if out.last().map(String::as_str) != Some(" *") {
                out.push(" *".to_string());
            }
            continue;
        }

        if line.starts_with('@') {
            flush(&mut paragraph, &mut out);
            for wrapped in wrap_words(line, budget, 4) {
                out.push(format!(" * {wrapped}").trim_end().to_string());
            }
            continue;
        }

        if is_list_item(line) {
            flush(&mut paragraph, &mut out);
            out.push(format!(" * {line}").trim_end().to_string());
            continue;
        }

        paragraph.push(line);
    }
    flush(&mut paragraph, &mut out);

    // A trailing bare " *" before the closer is noise.
    if out.last().map(String::as_str) == Some(" *") {
        out.pop();
    }
    out.push(" */".to_string());
    out
}

/// Greedy word wrap. Continuation lines are indented by `hanging` spaces
/// (used for tag continuations). A word wider than the budget gets its own
/// line; nothing breaks mid-word, so URLs survive.
fn wrap_words(text: &str, budget: usize, hanging: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        // The first line gets the full budget; continuations lose the
        // hanging indent prepended below.
        let limit = if out.is_empty() {
            budget
        } else {
            budget.saturating_sub(hanging)
        };
        let candidate = if line.is_empty() {
            UnicodeWidthStr::width(word)
        } else {
            UnicodeWidthStr::width(line.as_str()) + 1 + UnicodeWidthStr::width(word)
        };
        if !line.is_empty() && candidate > limit {
            out.push(line);
            line = String::new();
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        out.push(line);
    }

    // Apply the hanging indent to continuation lines.
    out.iter()
        .enumerate()
        .map(|(i, l)| {
            if i == 0 {
                l.clone()
            } else {
                format!("{}{}", " ".repeat(hanging), l)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_comment_collapses_to_one_line() {
        let lines = format_kdoc(" Returns the width. ", 80);
        assert_eq!(lines, vec!["/** Returns the width. */"]);
    }

    #[test]
    fn already_block_comment_with_short_text_collapses() {
        let lines = format_kdoc("\n * Returns the width.\n ", 80);
        assert_eq!(lines, vec!["/** Returns the width. */"]);
    }

    #[test]
    fn long_single_line_expands_to_block_form() {
        let text = " A quite long documentation sentence that will not fit on one line. ";
        let lines = format_kdoc(text, 40);
        assert_eq!(lines[0], "/**");
        assert_eq!(lines.last().unwrap(), " */");
        assert!(lines.len() > 3);
        for line in &lines[1..lines.len() - 1] {
            assert!(line.starts_with(" * "));
            assert!(UnicodeWidthStr::width(line.as_str()) <= 40, "{line:?}");
        }
    }

    #[test]
    fn paragraph_break_preserved_as_bare_star() {
        let text = "\n * First paragraph.\n *\n * Second paragraph.\n ";
        let lines = format_kdoc(text, 30);
        assert_eq!(
            lines,
            vec![
                "/**",
                " * First paragraph.",
                " *",
                " * Second paragraph.",
                " */"
            ]
        );
    }

    #[test]
    fn prose_reflows_across_source_lines() {
        let text = "\n * one two\n * three four\n ";
        let lines = format_kdoc(text, 80);
        // The two source lines are one paragraph; 80 columns fit it all...
        // but a single logical line would have collapsed, so force block
        // form with a second paragraph.
        assert_eq!(lines, vec!["/**", " * one two three four", " */"]);
    }

    #[test]
    fn tag_lines_start_new_paragraphs() {
        let text = "\n * Does a thing.\n * @param x the input\n * @return the output\n ";
        let lines = format_kdoc(text, 40);
        assert_eq!(
            lines,
            vec![
                "/**",
                " * Does a thing.",
                " * @param x the input",
                " * @return the output",
                " */"
            ]
        );
    }

    #[test]
    fn tag_continuation_indented_four_spaces() {
        let text = " @param alphabet the letters used by the quick brown fox jumping drill ";
        let lines = format_kdoc(text, 40);
        assert_eq!(lines[0], "/**");
        assert!(lines[1].starts_with(" * @param alphabet"));
        for cont in &lines[2..lines.len() - 1] {
            assert!(cont.starts_with(" *     "), "{cont:?}");
        }
    }

    #[test]
    fn fenced_code_passes_through_verbatim() {
        let text = "\n * Usage:\n * ```\n * val x   =  f( 1,2 )\n * ```\n ";
        let lines = format_kdoc(text, 80);
        assert_eq!(
            lines,
            vec![
                "/**",
                " * Usage:",
                " * ```",
                " * val x   =  f( 1,2 )",
                " * ```",
                " */"
            ]
        );
    }

    #[test]
    fn list_items_keep_their_own_lines() {
        let text = "\n * Options:\n * - first\n * - second\n * 1. ordered\n ";
        let lines = format_kdoc(text, 80);
        assert_eq!(
            lines,
            vec![
                "/**",
                " * Options:",
                " * - first",
                " * - second",
                " * 1. ordered",
                " */"
            ]
        );
    }

    #[test]
    fn unbreakable_word_is_not_split() {
        let url = "https://example.invalid/a/very/long/path/that/cannot/break";
        let lines = format_kdoc(&format!(" See {url} "), 30);
        assert!(lines.iter().any(|l| l.contains(url)));
    }

    #[test]
    fn empty_comment_renders_minimal_form() {
        assert_eq!(format_kdoc("  \n * \n ", 80), vec!["/** */"]);
    }
}
