//! Bracket-depth and split-delimiter tracking.
//!
//! A [`BracketTracker`] consumes the leaves of one logical line in order.
//! It stamps each leaf with its bracket nesting depth, links closing
//! brackets to their openers, and ranks the top-level split candidates
//! ("delimiters") by priority. The line-layout core queries it for open
//! bracket state and maximum-priority delimiter counts; the splitting
//! driver uses the same ranking to choose where a long line breaks.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::leaf::{Leaf, LeafId, ParentKind, TokenKind};

/// Split-candidate ranking. Higher splits first.
pub type Priority = u8;

pub const COMMA_PRIORITY: Priority = 18;
pub const TERNARY_PRIORITY: Priority = 16;
pub const LOGIC_PRIORITY: Priority = 14;
pub const STRING_PRIORITY: Priority = 12;
pub const COMPARATOR_PRIORITY: Priority = 10;
pub const DOT_PRIORITY: Priority = 1;

/// Priority of an arithmetic or bitwise operator, if it is one.
fn math_priority(kind: TokenKind) -> Option<Priority> {
    match kind {
        TokenKind::Vbar => Some(9),
        TokenKind::Circumflex => Some(8),
        TokenKind::Amp => Some(7),
        TokenKind::LeftShift | TokenKind::RightShift => Some(6),
        TokenKind::Plus | TokenKind::Minus => Some(5),
        TokenKind::Star
        | TokenKind::Slash
        | TokenKind::DoubleSlash
        | TokenKind::Percent
        | TokenKind::At
        | TokenKind::Tilde => Some(4),
        TokenKind::DoubleStar => Some(1),
        _ => None,
    }
}

/// The driver appended brackets in an order the tracker cannot reconcile.
/// Always a bug in leaf assembly, never a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("unmatched closing bracket {0:?}")]
    Unmatched(TokenKind),
}

/// Tracks bracket state and split-delimiter priorities for one line.
#[derive(Clone, Debug, Default)]
pub struct BracketTracker {
    depth: u32,
    /// Opening leaf waiting for its partner, keyed by (depth, closing kind).
    bracket_match: FxHashMap<(u32, TokenKind), Leaf>,
    /// Split priority per leaf identity.
    delimiters: FxHashMap<LeafId, Priority>,
    previous: Option<Leaf>,
    for_loop_depths: Vec<u32>,
    lambda_argument_depths: Vec<u32>,
}

impl BracketTracker {
    pub fn new() -> Self {
        BracketTracker::default()
    }

    /// Current bracket nesting depth.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Are any brackets currently open?
    #[inline]
    pub fn any_open_brackets(&self) -> bool {
        self.depth > 0
    }

    /// Update state with a freshly appended leaf.
    ///
    /// Stamps `bracket_depth`, links closers to openers, and records split
    /// delimiters at depth 0. Comments never affect bracket state.
    pub fn mark(&mut self, leaf: &mut Leaf) -> Result<(), BracketError> {
        if leaf.kind.is_comment() {
            return Ok(());
        }

        // The `in` of a for-header and the `:` of a lambda close artificial
        // depth opened below; neither is itself a split candidate.
        let demoted = self.maybe_decrement_after_for_loop_variable(leaf)
            || self.maybe_decrement_after_lambda_parameters(leaf);

        if leaf.kind.is_closing_bracket() {
            if self.depth == 0 {
                return Err(BracketError::Unmatched(leaf.kind));
            }
            self.depth -= 1;
            let opening = self
                .bracket_match
                .remove(&(self.depth, leaf.kind))
                .ok_or(BracketError::Unmatched(leaf.kind))?;
            leaf.opening_bracket = Some(opening.id());
        }
        leaf.bracket_depth = self.depth;

        if self.depth == 0 && !demoted {
            let before = split_priority_before(leaf, self.previous.as_ref());
            if before > 0 {
                if let Some(previous) = &self.previous {
                    let entry = self.delimiters.entry(previous.id()).or_insert(0);
                    *entry = (*entry).max(before);
                }
            }
            if leaf.kind == TokenKind::Comma {
                let entry = self.delimiters.entry(leaf.id()).or_insert(0);
                *entry = (*entry).max(COMMA_PRIORITY);
            }
        }

        if leaf.kind.is_opening_bracket() {
            if let Some(closing) = leaf.kind.matching_closing() {
                self.bracket_match.insert((self.depth, closing), leaf.clone());
            }
            self.depth += 1;
        }

        self.previous = Some(leaf.clone());
        self.maybe_increment_lambda_parameters(leaf);
        self.maybe_increment_for_loop_variable(leaf);
        Ok(())
    }

    /// Highest recorded delimiter priority, or 0 without delimiters.
    pub fn max_delimiter_priority(&self) -> Priority {
        self.delimiters.values().copied().max().unwrap_or(0)
    }

    /// Number of delimiters with the given priority.
    pub fn delimiter_count_with_priority(&self, priority: Priority) -> usize {
        self.delimiters
            .values()
            .filter(|&&p| p == priority)
            .count()
    }

    /// Are there any recorded split delimiters?
    #[inline]
    pub fn has_delimiters(&self) -> bool {
        !self.delimiters.is_empty()
    }

    /// Split priority recorded for a specific leaf, if any.
    pub fn delimiter_priority(&self, leaf: LeafId) -> Option<Priority> {
        self.delimiters.get(&leaf).copied()
    }

    /// The innermost currently open `[`, if any.
    pub fn get_open_lsqb(&self) -> Option<&Leaf> {
        let depth = self.depth.checked_sub(1)?;
        self.bracket_match.get(&(depth, TokenKind::Rsqb))
    }

    /// Treat the loop variable of a for-header as nested so its commas
    /// never become top-level split candidates.
    fn maybe_increment_for_loop_variable(&mut self, leaf: &Leaf) {
        if leaf.kind == TokenKind::Name && leaf.value == "for" {
            self.depth += 1;
            self.for_loop_depths.push(self.depth);
        }
    }

    fn maybe_decrement_after_for_loop_variable(&mut self, leaf: &Leaf) -> bool {
        if self.for_loop_depths.last() == Some(&self.depth)
            && leaf.kind == TokenKind::Name
            && leaf.value == "in"
        {
            self.depth -= 1;
            self.for_loop_depths.pop();
            return true;
        }
        false
    }

    /// Same demotion for lambda parameter lists, closed by the `:`.
    fn maybe_increment_lambda_parameters(&mut self, leaf: &Leaf) {
        if leaf.kind == TokenKind::Name && leaf.value == "lambda" {
            self.depth += 1;
            self.lambda_argument_depths.push(self.depth);
        }
    }

    fn maybe_decrement_after_lambda_parameters(&mut self, leaf: &Leaf) -> bool {
        if self.lambda_argument_depths.last() == Some(&self.depth)
            && leaf.kind == TokenKind::Colon
        {
            self.depth -= 1;
            self.lambda_argument_depths.pop();
            return true;
        }
        false
    }
}

/// Priority of a split placed before `leaf` (recorded on the previous leaf).
fn split_priority_before(leaf: &Leaf, previous: Option<&Leaf>) -> Priority {
    // `*args` / `**kwargs` markers are not operators.
    if matches!(leaf.parent, Some(ParentKind::StarExpr))
        && matches!(leaf.kind, TokenKind::Star | TokenKind::DoubleStar)
    {
        return 0;
    }

    if leaf.kind == TokenKind::Dot
        && !matches!(
            leaf.parent,
            Some(ParentKind::ImportFrom | ParentKind::DottedName)
        )
        && previous.is_none_or(|p| p.kind.is_closing_bracket())
    {
        return DOT_PRIORITY;
    }

    if leaf.kind.is_math_operator()
        && !matches!(leaf.parent, Some(ParentKind::Factor | ParentKind::StarExpr))
    {
        return math_priority(leaf.kind).unwrap_or(0);
    }

    if leaf.kind.is_comparator() {
        return COMPARATOR_PRIORITY;
    }

    if leaf.kind == TokenKind::String && previous.is_some_and(|p| p.kind == TokenKind::String) {
        return STRING_PRIORITY;
    }

    if leaf.kind == TokenKind::Name {
        match leaf.value.as_str() {
            "if" | "else" if previous.is_some() => return TERNARY_PRIORITY,
            "and" | "or" => return LOGIC_PRIORITY,
            "in" | "is" => return COMPARATOR_PRIORITY,
            _ => {}
        }
    }

    0
}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "tests fail loudly on tracker errors")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mark_all(tracker: &mut BracketTracker, leaves: &mut [Leaf]) {
        for leaf in leaves {
            tracker.mark(leaf).expect("balanced brackets");
        }
    }

    #[test]
    fn depth_and_partner_linking() {
        let mut tracker = BracketTracker::new();
        let mut leaves = vec![
            Leaf::new(TokenKind::Name, "f"),
            Leaf::new(TokenKind::Lpar, "("),
            Leaf::new(TokenKind::Name, "x"),
            Leaf::new(TokenKind::Rpar, ")"),
        ];
        mark_all(&mut tracker, &mut leaves);
        assert_eq!(leaves[1].bracket_depth, 0);
        assert_eq!(leaves[2].bracket_depth, 1);
        assert_eq!(leaves[3].bracket_depth, 0);
        assert_eq!(leaves[3].opening_bracket, Some(leaves[1].id()));
        assert!(!tracker.any_open_brackets());
    }

    #[test]
    fn unmatched_closer_is_an_error() {
        let mut tracker = BracketTracker::new();
        let mut close = Leaf::new(TokenKind::Rpar, ")");
        assert_eq!(
            tracker.mark(&mut close),
            Err(BracketError::Unmatched(TokenKind::Rpar))
        );
    }

    #[test]
    fn comma_delimiters_only_at_top_level() {
        let mut tracker = BracketTracker::new();
        // a , f ( b , c )
        let mut leaves = vec![
            Leaf::new(TokenKind::Name, "a"),
            Leaf::new(TokenKind::Comma, ","),
            Leaf::new(TokenKind::Name, "f"),
            Leaf::new(TokenKind::Lpar, "("),
            Leaf::new(TokenKind::Name, "b"),
            Leaf::new(TokenKind::Comma, ","),
            Leaf::new(TokenKind::Name, "c"),
            Leaf::new(TokenKind::Rpar, ")"),
        ];
        mark_all(&mut tracker, &mut leaves);
        assert_eq!(tracker.max_delimiter_priority(), COMMA_PRIORITY);
        assert_eq!(tracker.delimiter_count_with_priority(COMMA_PRIORITY), 1);
    }

    #[test]
    fn two_plus_operators_rank_equal() {
        let mut tracker = BracketTracker::new();
        let mut leaves = vec![
            Leaf::new(TokenKind::Name, "a"),
            Leaf::new(TokenKind::Plus, "+"),
            Leaf::new(TokenKind::Name, "b"),
            Leaf::new(TokenKind::Plus, "+"),
            Leaf::new(TokenKind::Name, "c"),
        ];
        mark_all(&mut tracker, &mut leaves);
        let max = tracker.max_delimiter_priority();
        assert_eq!(tracker.delimiter_count_with_priority(max), 2);
    }

    #[test]
    fn for_header_in_is_not_a_delimiter() {
        let mut tracker = BracketTracker::new();
        let mut leaves = vec![
            Leaf::new(TokenKind::Name, "for"),
            Leaf::new(TokenKind::Name, "x"),
            Leaf::new(TokenKind::Comma, ","),
            Leaf::new(TokenKind::Name, "y"),
            Leaf::new(TokenKind::Name, "in"),
            Leaf::new(TokenKind::Name, "pairs"),
            Leaf::new(TokenKind::Colon, ":"),
        ];
        mark_all(&mut tracker, &mut leaves);
        // The loop-variable comma is demoted to depth 1; `in` opens nothing.
        assert!(!tracker.has_delimiters());
        assert!(!tracker.any_open_brackets());
    }

    #[test]
    fn open_lsqb_is_visible_while_open() {
        let mut tracker = BracketTracker::new();
        let mut leaves = vec![
            Leaf::new(TokenKind::Name, "a").with_parent(ParentKind::Atom),
            Leaf::new(TokenKind::Lsqb, "[").with_parent(ParentKind::Trailer),
            Leaf::new(TokenKind::Name, "i"),
        ];
        mark_all(&mut tracker, &mut leaves);
        let open = tracker.get_open_lsqb().map(Leaf::id);
        assert_eq!(open, Some(leaves[1].id()));
    }
}
