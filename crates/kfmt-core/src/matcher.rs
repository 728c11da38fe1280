//! Nondeterministic node-pattern matcher.
//!
//! Scanners describe the child sequence of a syntax node with a small
//! pattern DSL (`node_of_type`, quantifiers, ordered alternatives) and
//! attach actions that turn matched sub-sequences into formatting tokens.
//! The pattern compiles to an NFA whose states live in an arena
//! (`Vec<NfaState>` indexed by `StateId`), so loops (`zero_or_more`) need
//! no cyclic ownership.
//!
//! Matching simulates all alternatives in parallel. Paths are Rc-linked
//! spines; nothing is emitted until one path accepts, at which point that
//! path's actions run in order over the node sub-sequences it consumed.
//! The first accepting path wins, so the builder's ordering of
//! alternatives is the priority order, and the `frugal` quantifier
//! variants differ from the greedy ones only in which epsilon edge is
//! explored first.

use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use kfmt_parser::{SyntaxElement, SyntaxKind};

use crate::scanner::TreeScanner;
use crate::tokens::Token;
use crate::ScanError;

/// Index of a state in the pattern's arena.
type StateId = usize;

/// Predicate on one input element (or the synthetic terminal).
#[derive(Debug, Clone)]
enum Pred {
    /// Exactly one element of this kind.
    Kind(SyntaxKind),
    /// One element of any of these kinds.
    AnyOf(Vec<SyntaxKind>),
    /// Any single element except the terminal.
    AnyNode,
    /// One trivia element (whitespace or comment).
    Trivia,
    /// The synthetic end-of-sequence marker.
    Terminal,
}

impl Pred {
    fn accepts(&self, element: Option<&SyntaxElement>) -> bool {
        match (self, element) {
            (Pred::Terminal, None) => true,
            (_, None) => false,
            (Pred::Terminal, Some(_)) => false,
            (Pred::Kind(k), Some(el)) => el.kind() == *k,
            (Pred::AnyOf(ks), Some(el)) => ks.contains(&el.kind()),
            (Pred::AnyNode, Some(_)) => true,
            (Pred::Trivia, Some(el)) => el.kind().is_trivia(),
        }
    }
}

/// An action attached to a point in the pattern.
enum Action {
    /// Convert the nodes accumulated since the previous action into
    /// tokens, appending them to the output. Clears the accumulator.
    MapNodes(ActionFn),
    /// Transform the tokens produced so far by this pattern.
    MapTokens(TokenMapFn),
}

type ActionFn = Rc<dyn Fn(&TreeScanner, &[SyntaxElement]) -> Result<Vec<Token>, ScanError>>;
type TokenMapFn = Rc<dyn Fn(&TreeScanner, Vec<Token>) -> Result<Vec<Token>, ScanError>>;

/// One NFA state.
struct NfaState {
    /// Ordered epsilon successors; order encodes match priority.
    eps: Vec<StateId>,
    /// Consuming transition: if the predicate accepts the current element,
    /// move to the target state.
    cons: Option<(Pred, StateId)>,
    /// Action to record when a path passes through this state.
    action: Option<usize>,
    /// Accepting state (reached by consuming the terminal).
    terminal: bool,
}

impl NfaState {
    fn empty() -> Self {
        Self {
            eps: Vec::new(),
            cons: None,
            action: None,
            terminal: false,
        }
    }
}

/// A compiled node pattern.
pub struct NodePattern {
    states: Vec<NfaState>,
    actions: Vec<Action>,
    initial: StateId,
}

/// Pattern match failure: none of the alternatives accepted the children.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternNoMatch {
    /// Kinds of the elements the pattern was run against.
    pub kinds: Vec<SyntaxKind>,
    /// Byte offset of the first offending element in the source.
    pub offset: u32,
}

impl std::fmt::Display for PatternNoMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no pattern alternative matched children {:?}", self.kinds)
    }
}

impl std::error::Error for PatternNoMatch {}

// ── Path spine ─────────────────────────────────────────────────────────

/// One step of a match path. Steps reference their predecessor, so a path
/// is a linked spine shared structurally between alternatives; rejected
/// branches never run their actions.
enum PathStep {
    Initial {
        state: StateId,
    },
    /// Passed through `state` on an epsilon edge.
    Epsilon {
        prev: Rc<PathStep>,
        state: StateId,
    },
    /// Consumed `element` (None for the synthetic terminal) moving into
    /// `state`.
    Consumed {
        prev: Rc<PathStep>,
        state: StateId,
        element: Option<SyntaxElement>,
    },
}

impl PathStep {
    fn state(&self) -> StateId {
        match self {
            PathStep::Initial { state }
            | PathStep::Epsilon { state, .. }
            | PathStep::Consumed { state, .. } => *state,
        }
    }
}

impl NodePattern {
    /// Start building a pattern.
    pub fn builder() -> NodePatternBuilder {
        NodePatternBuilder::new()
    }

    /// Run the pattern against a child sequence.
    ///
    /// On success, the winning path's actions run in order over the
    /// sub-sequences they matched and the concatenated tokens are
    /// returned. On failure, returns [`PatternNoMatch`] with the child
    /// kinds; callers must surface it, never swallow it.
    pub fn match_elements(
        &self,
        elements: &[SyntaxElement],
        scanner: &TreeScanner,
    ) -> Result<Vec<Token>, ScanError> {
        let mut frontier: Vec<Rc<PathStep>> = vec![Rc::new(PathStep::Initial {
            state: self.initial,
        })];

        for element in elements {
            frontier = self.close_over_epsilon(frontier);
            frontier = self.consume(&frontier, Some(element));
            if frontier.is_empty() {
                return Err(ScanError::NoMatch(self.no_match(elements)));
            }
        }

        // One more closure and a consume on the synthetic terminal.
        frontier = self.close_over_epsilon(frontier);
        let finals = self.consume(&frontier, None);

        let winner = finals
            .into_iter()
            .find(|p| self.states[p.state()].terminal)
            .ok_or_else(|| ScanError::NoMatch(self.no_match(elements)))?;

        self.run_actions(&winner, scanner)
    }

    fn no_match(&self, elements: &[SyntaxElement]) -> PatternNoMatch {
        PatternNoMatch {
            kinds: elements.iter().map(|el| el.kind()).collect(),
            offset: elements
                .first()
                .map(|el| u32::from(el.text_range().start()))
                .unwrap_or(0),
        }
    }

    /// Extend every path with epsilon steps until the frontier is closed.
    ///
    /// States are visited at most once per closure; the first (highest
    /// priority) path to reach a state keeps it.
    fn close_over_epsilon(&self, frontier: Vec<Rc<PathStep>>) -> Vec<Rc<PathStep>> {
        let mut visited: FxHashSet<StateId> = FxHashSet::default();
        let mut closed: Vec<Rc<PathStep>> = Vec::new();
        let mut work: VecDeque<Rc<PathStep>> = frontier.into();
        // Depth-first in priority order: a path's first epsilon successor
        // is explored before its second, and before later paths.
        while let Some(path) = work.pop_front() {
            let state = path.state();
            if !visited.insert(state) {
                continue;
            }
            for &next in self.states[state].eps.iter().rev() {
                work.push_front(Rc::new(PathStep::Epsilon {
                    prev: Rc::clone(&path),
                    state: next,
                }));
            }
            closed.push(path);
        }
        closed
    }

    /// For each path, take every consuming transition whose predicate
    /// accepts the element.
    fn consume(&self, frontier: &[Rc<PathStep>], element: Option<&SyntaxElement>) -> Vec<Rc<PathStep>> {
        let mut next: Vec<Rc<PathStep>> = Vec::new();
        for path in frontier {
            if let Some((pred, target)) = &self.states[path.state()].cons {
                if pred.accepts(element) {
                    next.push(Rc::new(PathStep::Consumed {
                        prev: Rc::clone(path),
                        state: *target,
                        element: element.cloned(),
                    }));
                }
            }
        }
        next
    }

    /// Replay the winning path bottom-up, feeding each action the nodes
    /// accumulated since the previous action.
    fn run_actions(
        &self,
        winner: &Rc<PathStep>,
        scanner: &TreeScanner,
    ) -> Result<Vec<Token>, ScanError> {
        // Collect steps root-first.
        let mut steps: Vec<&PathStep> = Vec::new();
        let mut cur: &PathStep = winner;
        loop {
            steps.push(cur);
            match cur {
                PathStep::Initial { .. } => break,
                PathStep::Epsilon { prev, .. } | PathStep::Consumed { prev, .. } => {
                    cur = prev;
                }
            }
        }
        steps.reverse();

        let mut tokens: Vec<Token> = Vec::new();
        let mut acc: Vec<SyntaxElement> = Vec::new();
        for step in steps {
            if let PathStep::Consumed {
                element: Some(el), ..
            } = step
            {
                acc.push(el.clone());
            }
            if let Some(action_idx) = self.states[step.state()].action {
                match &self.actions[action_idx] {
                    Action::MapNodes(f) => {
                        tokens.extend(f(scanner, &acc)?);
                        acc.clear();
                    }
                    Action::MapTokens(f) => {
                        tokens = f(scanner, tokens)?;
                    }
                }
            }
        }
        Ok(tokens)
    }
}

// ── Builder ────────────────────────────────────────────────────────────

/// Composes NFA fragments into a [`NodePattern`].
///
/// Methods append to the pattern in sequence; quantifiers and `either`
/// take closures that build their sub-patterns on the same builder.
pub struct NodePatternBuilder {
    states: Vec<NfaState>,
    actions: Vec<Action>,
    initial: StateId,
    /// Open end of the pattern built so far.
    tail: StateId,
}

impl NodePatternBuilder {
    fn new() -> Self {
        let initial = NfaState::empty();
        Self {
            states: vec![initial],
            actions: Vec::new(),
            initial: 0,
            tail: 0,
        }
    }

    fn push_state(&mut self) -> StateId {
        self.states.push(NfaState::empty());
        self.states.len() - 1
    }

    fn link(&mut self, from: StateId, to: StateId) {
        self.states[from].eps.push(to);
    }

    /// Append a consuming step for `pred`.
    fn consume(&mut self, pred: Pred) -> &mut Self {
        let gate = self.push_state();
        let after = self.push_state();
        self.states[gate].cons = Some((pred, after));
        self.link(self.tail, gate);
        self.tail = after;
        self
    }

    /// Accept exactly one child of the given kind.
    pub fn node_of_type(&mut self, kind: SyntaxKind) -> &mut Self {
        self.consume(Pred::Kind(kind))
    }

    /// Accept exactly one child of any of the given kinds.
    pub fn node_of_any(&mut self, kinds: &[SyntaxKind]) -> &mut Self {
        self.consume(Pred::AnyOf(kinds.to_vec()))
    }

    /// Accept any one child.
    pub fn any_node(&mut self) -> &mut Self {
        self.consume(Pred::AnyNode)
    }

    /// Optionally match a run of trivia (whitespace and comments).
    pub fn possible_whitespace(&mut self) -> &mut Self {
        self.zero_or_more(|b| {
            b.consume(Pred::Trivia);
        })
    }

    /// Match the sub-pattern zero or one time, preferring one (greedy).
    pub fn zero_or_one(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.repeat_opt(f, true)
    }

    /// Match the sub-pattern zero or one time, preferring zero (frugal).
    pub fn zero_or_one_frugal(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.repeat_opt(f, false)
    }

    fn repeat_opt(&mut self, f: impl FnOnce(&mut Self), greedy: bool) -> &mut Self {
        let entry = self.push_state();
        let exit = self.push_state();
        self.link(self.tail, entry);

        let body_entry = self.push_state();
        self.tail = body_entry;
        f(self);
        let body_end = self.tail;
        self.link(body_end, exit);

        if greedy {
            self.states[entry].eps = vec![body_entry, exit];
        } else {
            self.states[entry].eps = vec![exit, body_entry];
        }
        self.tail = exit;
        self
    }

    /// Match the sub-pattern zero or more times, as many as possible.
    pub fn zero_or_more(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.repeat_star(f, true)
    }

    /// Match the sub-pattern zero or more times, as few as possible.
    pub fn zero_or_more_frugal(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.repeat_star(f, false)
    }

    fn repeat_star(&mut self, f: impl FnOnce(&mut Self), greedy: bool) -> &mut Self {
        let entry = self.push_state();
        let exit = self.push_state();
        self.link(self.tail, entry);

        let body_entry = self.push_state();
        self.tail = body_entry;
        f(self);
        let body_end = self.tail;
        // Loop back to the choice point.
        self.link(body_end, entry);

        if greedy {
            self.states[entry].eps = vec![body_entry, exit];
        } else {
            self.states[entry].eps = vec![exit, body_entry];
        }
        self.tail = exit;
        self
    }

    /// Match the sub-pattern one or more times, as many as possible.
    pub fn one_or_more(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.repeat_plus(f, true)
    }

    /// Match the sub-pattern one or more times, as few as possible.
    pub fn one_or_more_frugal(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.repeat_plus(f, false)
    }

    fn repeat_plus(&mut self, f: impl FnOnce(&mut Self), greedy: bool) -> &mut Self {
        let body_entry = self.push_state();
        self.link(self.tail, body_entry);
        self.tail = body_entry;
        f(self);
        let body_end = self.tail;

        let choice = self.push_state();
        let exit = self.push_state();
        self.link(body_end, choice);
        if greedy {
            self.states[choice].eps = vec![body_entry, exit];
        } else {
            self.states[choice].eps = vec![exit, body_entry];
        }
        self.tail = exit;
        self
    }

    /// Match the sub-pattern exactly once. Useful to group a sequence so
    /// one action covers it.
    pub fn exactly_one(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        f(self);
        self
    }

    /// Ordered alternatives: try `first`, then `second`.
    pub fn either(&mut self, first: impl FnOnce(&mut Self), second: impl FnOnce(&mut Self)) -> &mut Self {
        let entry = self.push_state();
        let exit = self.push_state();
        self.link(self.tail, entry);

        let a_entry = self.push_state();
        self.tail = a_entry;
        first(self);
        self.link(self.tail, exit);

        let b_entry = self.push_state();
        self.tail = b_entry;
        second(self);
        self.link(self.tail, exit);

        self.states[entry].eps = vec![a_entry, b_entry];
        self.tail = exit;
        self
    }

    /// Attach an action converting the nodes matched since the previous
    /// action into tokens.
    pub fn then_map_to_tokens(
        &mut self,
        f: impl Fn(&TreeScanner, &[SyntaxElement]) -> Result<Vec<Token>, ScanError> + 'static,
    ) -> &mut Self {
        let idx = self.actions.len();
        self.actions.push(Action::MapNodes(Rc::new(f)));
        let s = self.push_state();
        self.states[s].action = Some(idx);
        self.link(self.tail, s);
        self.tail = s;
        self
    }

    /// Alias of [`Self::then_map_to_tokens`], reading better mid-pattern.
    pub fn and_then(
        &mut self,
        f: impl Fn(&TreeScanner, &[SyntaxElement]) -> Result<Vec<Token>, ScanError> + 'static,
    ) -> &mut Self {
        self.then_map_to_tokens(f)
    }

    /// Attach an action transforming all tokens produced so far.
    pub fn then_map_tokens(
        &mut self,
        f: impl Fn(&TreeScanner, Vec<Token>) -> Result<Vec<Token>, ScanError> + 'static,
    ) -> &mut Self {
        let idx = self.actions.len();
        self.actions.push(Action::MapTokens(Rc::new(f)));
        let s = self.push_state();
        self.states[s].action = Some(idx);
        self.link(self.tail, s);
        self.tail = s;
        self
    }

    /// Require end-of-sequence and finish the pattern.
    pub fn end(&mut self) -> NodePattern {
        self.consume(Pred::Terminal);
        let tail = self.tail;
        self.states[tail].terminal = true;

        NodePattern {
            states: std::mem::take(&mut self.states),
            actions: std::mem::take(&mut self.actions),
            initial: self.initial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::TreeScanner;
    use crate::tokens::{leaf, Token};

    /// Children of the first node of the given kind in the parsed source.
    fn children_of(source: &str, kind: SyntaxKind) -> Vec<SyntaxElement> {
        let parse = kfmt_parser::parse(source);
        assert!(parse.ok(), "parse failed: {:?}", parse.errors());
        let node = parse
            .syntax()
            .descendants()
            .find(|n| n.kind() == kind)
            .expect("node kind present");
        node.children_with_tokens().collect()
    }

    fn texts(tokens: &[Token]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| match t {
                Token::Leaf { text } => text.clone(),
                other => format!("{other:?}"),
            })
            .collect()
    }

    #[test]
    fn sequence_with_whitespace_matches() {
        let elements = children_of("import a.b\n", SyntaxKind::IMPORT_DIRECTIVE);
        let pattern = NodePattern::builder()
            .possible_whitespace()
            .node_of_type(SyntaxKind::IMPORT_KW)
            .then_map_to_tokens(|_, _| Ok(vec![leaf("import")]))
            .possible_whitespace()
            .node_of_type(SyntaxKind::DOTTED_NAME)
            .then_map_to_tokens(|_, _| Ok(vec![leaf("name")]))
            .possible_whitespace()
            .end();
        let tokens = pattern
            .match_elements(&elements, &TreeScanner::new())
            .unwrap();
        assert_eq!(texts(&tokens), vec!["import", "name"]);
    }

    #[test]
    fn wrong_kind_is_no_match() {
        let elements = children_of("import a.b\n", SyntaxKind::IMPORT_DIRECTIVE);
        let pattern = NodePattern::builder()
            .node_of_type(SyntaxKind::PACKAGE_KW)
            .end();
        let err = pattern
            .match_elements(&elements, &TreeScanner::new())
            .unwrap_err();
        let ScanError::NoMatch(no_match) = err;
        assert!(no_match.kinds.contains(&SyntaxKind::IMPORT_KW));
    }

    #[test]
    fn missing_end_of_sequence_is_no_match() {
        let elements = children_of("import a.b\n", SyntaxKind::IMPORT_DIRECTIVE);
        // Pattern stops after the keyword; the dotted name is unconsumed.
        let pattern = NodePattern::builder()
            .node_of_type(SyntaxKind::IMPORT_KW)
            .end();
        assert!(pattern
            .match_elements(&elements, &TreeScanner::new())
            .is_err());
    }

    #[test]
    fn actions_run_in_order_over_their_groups() {
        let elements = children_of("import a.b\n", SyntaxKind::IMPORT_DIRECTIVE);
        let pattern = NodePattern::builder()
            .any_node()
            .then_map_to_tokens(|_, acc| {
                assert_eq!(acc.len(), 1);
                Ok(vec![leaf("first")])
            })
            .possible_whitespace()
            .any_node()
            .then_map_to_tokens(|_, acc| {
                // Accumulator was cleared by the previous action; only the
                // trivia (if any) and the dotted name are here.
                assert!(acc.iter().any(|el| el.kind() == SyntaxKind::DOTTED_NAME));
                Ok(vec![leaf("second")])
            })
            .end();
        let tokens = pattern
            .match_elements(&elements, &TreeScanner::new())
            .unwrap();
        assert_eq!(texts(&tokens), vec!["first", "second"]);
    }

    #[test]
    fn greedy_one_or_more_takes_everything() {
        let elements = children_of("import a.b\n", SyntaxKind::IMPORT_DIRECTIVE);
        let total = elements.len();
        let pattern = NodePattern::builder()
            .one_or_more(|b| {
                b.any_node();
            })
            .then_map_to_tokens(move |_, acc| Ok(vec![leaf(acc.len().to_string())]))
            .zero_or_more(|b| {
                b.any_node();
            })
            .end();
        let tokens = pattern
            .match_elements(&elements, &TreeScanner::new())
            .unwrap();
        assert_eq!(texts(&tokens), vec![total.to_string()]);
    }

    #[test]
    fn frugal_one_or_more_takes_minimum() {
        let elements = children_of("import a.b\n", SyntaxKind::IMPORT_DIRECTIVE);
        let pattern = NodePattern::builder()
            .one_or_more_frugal(|b| {
                b.any_node();
            })
            .then_map_to_tokens(|_, acc| Ok(vec![leaf(acc.len().to_string())]))
            .zero_or_more(|b| {
                b.any_node();
            })
            .end();
        let tokens = pattern
            .match_elements(&elements, &TreeScanner::new())
            .unwrap();
        assert_eq!(texts(&tokens), vec!["1".to_string()]);
    }

    #[test]
    fn either_prefers_first_alternative() {
        let elements = children_of("import a.b\n", SyntaxKind::IMPORT_DIRECTIVE);
        let pattern = NodePattern::builder()
            .either(
                |b| {
                    b.any_node().then_map_to_tokens(|_, _| Ok(vec![leaf("first")]));
                },
                |b| {
                    b.node_of_type(SyntaxKind::IMPORT_KW)
                        .then_map_to_tokens(|_, _| Ok(vec![leaf("second")]));
                },
            )
            .zero_or_more(|b| {
                b.any_node();
            })
            .end();
        let tokens = pattern
            .match_elements(&elements, &TreeScanner::new())
            .unwrap();
        assert_eq!(texts(&tokens), vec!["first"]);
    }

    #[test]
    fn then_map_tokens_transforms_output() {
        let elements = children_of("import a.b\n", SyntaxKind::IMPORT_DIRECTIVE);
        let pattern = NodePattern::builder()
            .zero_or_more(|b| {
                b.any_node();
            })
            .then_map_to_tokens(|_, _| Ok(vec![leaf("a"), leaf("b")]))
            .then_map_tokens(|_, tokens| {
                Ok(tokens.into_iter().rev().collect())
            })
            .end();
        let tokens = pattern
            .match_elements(&elements, &TreeScanner::new())
            .unwrap();
        assert_eq!(texts(&tokens), vec!["b", "a"]);
    }

    #[test]
    fn zero_or_one_is_optional() {
        let elements = children_of("import a.b\n", SyntaxKind::IMPORT_DIRECTIVE);
        let pattern = NodePattern::builder()
            .zero_or_one(|b| {
                b.node_of_type(SyntaxKind::PACKAGE_KW)
                    .then_map_to_tokens(|_, _| Ok(vec![leaf("never")]));
            })
            .zero_or_more(|b| {
                b.any_node();
            })
            .then_map_to_tokens(|_, _| Ok(vec![leaf("rest")]))
            .end();
        let tokens = pattern
            .match_elements(&elements, &TreeScanner::new())
            .unwrap();
        assert_eq!(texts(&tokens), vec!["rest"]);
    }
}
