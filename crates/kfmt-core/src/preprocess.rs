//! Length-annotating token preprocessor.
//!
//! Single pass over the scanner's token stream, maintaining a stack of
//! elements: open blocks, pending whitespace (buffered so its length can
//! include the width of what follows), and markers. On the way through it
//!
//! - defers `End` past trailing leaves, so closing delimiters count toward
//!   their block's flat length,
//! - collapses consecutive whitespace (the latter wins if non-empty),
//! - fills in `Whitespace.length` and `Begin.length`,
//! - promotes synchronized breaks to forced breaks in blocks that already
//!   contain a forced break (or multi-line doc content),
//! - drops a synchronized break that directly follows a forced one,
//! - rewrites `BlockFromMarker`/`BlockFromLastForcedBreak` into real
//!   `Begin(Code)...End` wrappings,
//! - turns newline-bearing whitespace in front of a comment block into a
//!   forced break.
//!
//! The output contains no `Marker`, `BlockFromMarker`, or
//! `BlockFromLastForcedBreak`, and every `Begin`/`End` pair is balanced.

use crate::tokens::{State, Token};

/// One element of the preprocessor stack.
///
/// Every element accumulates the tokens that follow it, so a pending
/// whitespace knows its first following token (whose width feeds the
/// whitespace length) and a marker knows the suffix it may later wrap.
enum StackElement {
    /// An open block, from a `Begin` not yet matched by its `End`.
    Block { state: State, tokens: Vec<Token> },
    /// A buffered whitespace waiting for its following width.
    Whitespace { content: String, tokens: Vec<Token> },
    /// A position recorded for a later `BlockFromMarker`.
    Marker { tokens: Vec<Token> },
}

/// Run the preprocessor over a scanner token stream.
///
/// `max_line_length` caps how much of a following block a whitespace's
/// lookahead length may absorb: a block that could never fit after the
/// whitespace is not part of its non-breaking run.
pub fn preprocess(input: Vec<Token>, max_line_length: usize) -> Vec<Token> {
    let mut pp = Preprocessor::new(max_line_length);
    for token in input {
        pp.push(token);
    }
    pp.finish()
}

struct Preprocessor {
    stack: Vec<StackElement>,
    /// `End` tokens seen but not yet applied; trailing leaves read in the
    /// meantime are absorbed into the closing block.
    pending_ends: usize,
    max_line_length: usize,
}

impl Preprocessor {
    fn new(max_line_length: usize) -> Self {
        Self {
            // Root pseudo-block; its Begin/End are never emitted.
            stack: vec![StackElement::Block {
                state: State::Code,
                tokens: Vec::new(),
            }],
            pending_ends: 0,
            max_line_length,
        }
    }

    fn push(&mut self, token: Token) {
        match token {
            Token::End => {
                self.pending_ends += 1;
            }
            Token::Leaf { .. } if self.pending_ends > 0 => {
                // EndToken deferral: the leaf sinks into the closing block.
                self.append(token);
            }
            other => {
                self.apply_pending_ends();
                self.dispatch(other);
            }
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.apply_pending_ends();
        // Fold any leftover whitespace/marker elements, then unwrap root.
        while self.stack.len() > 1 {
            match self.stack.last() {
                Some(StackElement::Block { .. }) => self.pop_block(),
                _ => {
                    let element = self.stack.pop().expect("stack is non-empty");
                    let flushed = self.flush_element(element);
                    for t in flushed {
                        self.append(t);
                    }
                }
            }
        }
        match self.stack.pop() {
            Some(StackElement::Block { tokens, .. }) => tokens,
            _ => unreachable!("root element is a block"),
        }
    }

    fn apply_pending_ends(&mut self) {
        while self.pending_ends > 0 {
            self.pending_ends -= 1;
            self.pop_block();
        }
    }

    fn dispatch(&mut self, token: Token) {
        match token {
            Token::Whitespace { content, .. } => self.push_whitespace(content),
            Token::Begin { state, .. } => {
                self.stack.push(StackElement::Block {
                    state,
                    tokens: Vec::new(),
                });
            }
            Token::SynchronizedBreak { .. } | Token::ClosingSynchronizedBreak { .. } => {
                // A synchronized break right after a forced one is noise.
                if !self.last_is_forced_break() {
                    self.append(token);
                }
            }
            Token::Marker => {
                self.stack.push(StackElement::Marker { tokens: Vec::new() });
            }
            Token::BlockFromMarker => self.block_from_marker(),
            Token::BlockFromLastForcedBreak => self.block_from_last_forced_break(),
            Token::End => unreachable!("End is handled by push()"),
            other => self.append(other),
        }
    }

    fn append(&mut self, token: Token) {
        match self.stack.last_mut().expect("stack is non-empty") {
            StackElement::Block { tokens, .. }
            | StackElement::Whitespace { tokens, .. }
            | StackElement::Marker { tokens } => tokens.push(token),
        }
    }

    fn last_is_forced_break(&self) -> bool {
        let tokens = match self.stack.last() {
            Some(StackElement::Block { tokens, .. })
            | Some(StackElement::Whitespace { tokens, .. })
            | Some(StackElement::Marker { tokens }) => tokens,
            None => return false,
        };
        matches!(
            tokens.last(),
            Some(Token::ForcedBreak { .. }) | Some(Token::ClosingForcedBreak)
        )
    }

    fn push_whitespace(&mut self, content: String) {
        // Collapse consecutive whitespace: the latter wins if non-empty.
        if let Some(StackElement::Whitespace {
            content: previous,
            tokens,
        }) = self.stack.last_mut()
        {
            if tokens.is_empty() {
                if !content.is_empty() {
                    *previous = content;
                }
                return;
            }
        }
        self.stack.push(StackElement::Whitespace {
            content,
            tokens: Vec::new(),
        });
    }

    /// Close the nearest open block: fold the elements above it, promote
    /// synchronized breaks if needed, compute the flat length, and emit
    /// `Begin(state, length) ... End` into the parent element.
    fn pop_block(&mut self) {
        let mut above: Vec<StackElement> = Vec::new();
        let (state, mut tokens) = loop {
            match self.stack.pop() {
                Some(StackElement::Block { state, tokens }) => break (state, tokens),
                Some(element) => above.push(element),
                None => {
                    // Unbalanced End from a scanner; treat as a no-op block.
                    break (State::Code, Vec::new());
                }
            }
        };
        for element in above.into_iter().rev() {
            let flushed = self.flush_element(element);
            tokens.extend(flushed);
        }

        promote_sync_breaks(&mut tokens);
        let length: usize = tokens.iter().map(Token::intrinsic_width).sum();

        self.append(Token::Begin { state, length });
        for t in tokens {
            self.append(t);
        }
        self.append(Token::End);
    }

    /// Wrap the tokens since the nearest marker (or the whole current
    /// block, if no marker is open) in a synthetic `Begin(Code)...End`.
    fn block_from_marker(&mut self) {
        let mut above: Vec<StackElement> = Vec::new();
        loop {
            match self.stack.pop() {
                Some(StackElement::Marker { tokens }) => {
                    let mut suffix = tokens;
                    for element in above.into_iter().rev() {
                        let flushed = self.flush_element(element);
                        suffix.extend(flushed);
                    }
                    self.append_wrapped(suffix);
                    return;
                }
                Some(StackElement::Block { state, tokens }) => {
                    let mut suffix = tokens;
                    for element in above.into_iter().rev() {
                        let flushed = self.flush_element(element);
                        suffix.extend(flushed);
                    }
                    // Preserve the block itself; it continues accumulating
                    // after the wrapped prefix.
                    self.stack.push(StackElement::Block {
                        state,
                        tokens: Vec::new(),
                    });
                    self.append_wrapped(suffix);
                    return;
                }
                Some(element) => above.push(element),
                None => return,
            }
        }
    }

    /// Wrap the tokens after the last forced break of the current block.
    /// Forced breaks act as implicit markers; with none present, the wrap
    /// covers the block from its beginning.
    fn block_from_last_forced_break(&mut self) {
        // Fold pending elements into the nearest block first.
        let mut above: Vec<StackElement> = Vec::new();
        let (state, mut tokens) = loop {
            match self.stack.pop() {
                Some(StackElement::Block { state, tokens }) => break (state, tokens),
                Some(element) => above.push(element),
                None => return,
            }
        };
        for element in above.into_iter().rev() {
            let flushed = self.flush_element(element);
            tokens.extend(flushed);
        }

        let split_at = last_forced_break_at_depth_zero(&tokens).map_or(0, |i| i + 1);
        let suffix = tokens.split_off(split_at);

        self.stack.push(StackElement::Block { state, tokens });
        self.append_wrapped(suffix);
    }

    /// Emit `Begin(Code, len) suffix End` into the current top element.
    fn append_wrapped(&mut self, mut suffix: Vec<Token>) {
        promote_sync_breaks(&mut suffix);
        let length: usize = suffix.iter().map(Token::intrinsic_width).sum();
        self.append(Token::Begin {
            state: State::Code,
            length,
        });
        for t in suffix {
            self.append(t);
        }
        self.append(Token::End);
    }
}

impl Preprocessor {
    /// Flush a folded stack element into plain tokens.
    ///
    /// A whitespace element becomes a length-annotated `Whitespace`
    /// followed by its accumulated tokens; when the whitespace spans
    /// newlines and a comment block follows, it becomes a forced break
    /// instead, so comments keep their own lines. An unused marker simply
    /// disappears.
    fn flush_element(&self, element: StackElement) -> Vec<Token> {
        match element {
            StackElement::Marker { tokens } => tokens,
            StackElement::Block { state, tokens } => {
                // Unbalanced Begin from a scanner: close it here.
                let mut out = Vec::with_capacity(tokens.len() + 2);
                let length: usize = tokens.iter().map(Token::intrinsic_width).sum();
                out.push(Token::Begin { state, length });
                out.extend(tokens);
                out.push(Token::End);
                out
            }
            StackElement::Whitespace { content, tokens } => {
                let newlines = content.matches('\n').count();
                if newlines > 0 && starts_with_comment_block(&tokens) {
                    let mut out = vec![Token::ForcedBreak {
                        count: newlines.min(2) as u8,
                    }];
                    out.extend(tokens);
                    return out;
                }

                let own = if content.is_empty() { 0 } else { 1 };
                // Newlines have no inline rendering; fall back to one space.
                let content = if newlines > 0 {
                    " ".to_string()
                } else {
                    content
                };

                // Breaking in front of a block that cannot fit on any line
                // rescues nothing -- the block will break internally. The
                // whitespace stops being a break candidate and becomes glue.
                if let Some(Token::Begin { length, .. }) = tokens.first() {
                    if own + length > self.max_line_length {
                        let mut out = if content.is_empty() {
                            Vec::new()
                        } else {
                            vec![Token::Leaf { text: content }]
                        };
                        out.extend(tokens);
                        return out;
                    }
                }

                let length = own + self.lookahead_width(&tokens, own);
                let mut out = vec![Token::Whitespace { content, length }];
                out.extend(tokens);
                out
            }
        }
    }

    /// Width of the non-breaking run following a whitespace: leaf widths
    /// accumulate until the next break candidate; a whole block counts only
    /// if the run plus its flat width could still fit on a line, otherwise
    /// the run stops in front of it (the block will handle its own breaks).
    fn lookahead_width(&self, tokens: &[Token], own: usize) -> usize {
        let mut acc: usize = 0;
        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::Leaf { .. } | Token::KDocContent { .. } => {
                    acc += tokens[i].intrinsic_width();
                }
                Token::Begin { length, .. } => {
                    if own + acc + length > self.max_line_length {
                        break;
                    }
                    acc += length;
                    // Skip to the matching End; the block's interior is
                    // already accounted for by its length.
                    let mut depth = 1;
                    while depth > 0 && i + 1 < tokens.len() {
                        i += 1;
                        match &tokens[i] {
                            Token::Begin { .. } => depth += 1,
                            Token::End => depth -= 1,
                            _ => {}
                        }
                    }
                }
                _ => break,
            }
            i += 1;
        }
        acc
    }
}

fn starts_with_comment_block(tokens: &[Token]) -> bool {
    matches!(
        tokens.first(),
        Some(Token::Begin { state, .. }) if state.is_comment()
    )
}

/// Find the index of the last `ForcedBreak`/`ClosingForcedBreak` at depth 0.
fn last_forced_break_at_depth_zero(tokens: &[Token]) -> Option<usize> {
    let mut depth: usize = 0;
    let mut found = None;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Begin { .. } => depth += 1,
            Token::End => depth = depth.saturating_sub(1),
            Token::ForcedBreak { .. } | Token::ClosingForcedBreak if depth == 0 => {
                found = Some(i);
            }
            _ => {}
        }
    }
    found
}

/// If the block's top level contains a forced break (or doc content with
/// embedded newlines), rewrite its top-level synchronized breaks into
/// forced ones, so the whole block breaks consistently.
fn promote_sync_breaks(tokens: &mut [Token]) {
    let mut depth: usize = 0;
    let mut trigger = false;
    for token in tokens.iter() {
        match token {
            Token::Begin { .. } => depth += 1,
            Token::End => depth = depth.saturating_sub(1),
            Token::ForcedBreak { .. } | Token::ClosingForcedBreak if depth == 0 => {
                trigger = true;
            }
            Token::KDocContent { text } if depth == 0 && text.contains('\n') => {
                trigger = true;
            }
            _ => {}
        }
    }
    if !trigger {
        return;
    }

    let mut depth: usize = 0;
    for token in tokens.iter_mut() {
        match token {
            Token::Begin { .. } => depth += 1,
            Token::End => depth = depth.saturating_sub(1),
            Token::SynchronizedBreak { .. } if depth == 0 => {
                *token = Token::ForcedBreak { count: 1 };
            }
            Token::ClosingSynchronizedBreak { .. } if depth == 0 => {
                *token = Token::ClosingForcedBreak;
            }
            _ => {}
        }
    }
}
