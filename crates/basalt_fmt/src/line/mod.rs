//! Logical lines: the unit of formatter output before physical splitting.
//!
//! A [`Line`] buffers leaves in append order, files inline comments in an
//! identity-keyed side map, and tracks bracket state through its own
//! [`BracketTracker`]. The append protocol owns whitespace-prefix
//! computation, magic-trailing-comma detection, and comment attachment;
//! everything downstream (fit judgment, splitting, blank-line spacing) reads
//! the line through its classification predicates.

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;
use tracing::trace;

use basalt_ir::{
    is_import_keyword, is_multiline_string, is_one_sequence_between, is_type_comment, str_width,
    whitespace, BracketError, BracketTracker, IndentChain, Leaf, LeafId, ParentKind,
    SpacingContext, TokenKind,
};

use crate::mode::Mode;

/// Protocol violations in line assembly. Both indicate a bug in the
/// driver's append order, not a recoverable condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("cannot append to a standalone comment line")]
    AppendAfterStandaloneComment,
    #[error("cannot append a standalone comment to a populated line")]
    StandaloneCommentOnPopulatedLine,
    #[error(transparent)]
    Bracket(#[from] BracketError),
}

/// Insertion-ordered map from leaf identity to attached comments.
///
/// Iteration order is attachment order, not source order; rendering depends
/// on this, so a hash map would not do. Lines hold few leaves, linear scans
/// are fine.
#[derive(Clone, Debug, Default)]
pub struct CommentMap {
    entries: Vec<(LeafId, SmallVec<[Leaf; 2]>)>,
}

impl CommentMap {
    fn push(&mut self, id: LeafId, comment: Leaf) {
        if let Some((_, comments)) = self.entries.iter_mut().find(|(key, _)| *key == id) {
            comments.push(comment);
        } else {
            self.entries.push((id, SmallVec::from_iter([comment])));
        }
    }

    fn extend(&mut self, id: LeafId, comments: SmallVec<[Leaf; 2]>) {
        for comment in comments {
            self.push(id, comment);
        }
    }

    fn take(&mut self, id: LeafId) -> SmallVec<[Leaf; 2]> {
        if let Some(index) = self.entries.iter().position(|(key, _)| *key == id) {
            self.entries.remove(index).1
        } else {
            SmallVec::new()
        }
    }

    fn get(&self, id: LeafId) -> &[Leaf] {
        self.entries
            .iter()
            .find(|(key, _)| *key == id)
            .map_or(&[], |(_, comments)| comments.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = (LeafId, &[Leaf])> {
        self.entries.iter().map(|(id, c)| (*id, c.as_slice()))
    }

    /// Every attached comment, in attachment order.
    pub fn iter_comments(&self) -> impl Iterator<Item = &Leaf> {
        self.entries.iter().flat_map(|(_, c)| c.iter())
    }
}

/// One logical output line under assembly.
#[derive(Clone, Debug)]
pub struct Line {
    pub mode: Mode,
    pub depth: IndentChain,
    pub leaves: Vec<Leaf>,
    comments: CommentMap,
    pub bracket_tracker: BracketTracker,
    /// This line is a continuation fragment inside an enclosing bracket.
    pub inside_brackets: bool,
    /// The caller demands a right-hand-side split regardless of width.
    pub should_split_rhs: bool,
    /// The comma that forces the enclosing bracket to explode, if any.
    pub magic_trailing_comma: Option<Leaf>,
}

impl Line {
    pub fn new(mode: Mode) -> Self {
        Line::with_depth(mode, IndentChain::new())
    }

    pub fn with_depth(mode: Mode, depth: IndentChain) -> Self {
        Line {
            mode,
            depth,
            leaves: Vec::new(),
            comments: CommentMap::default(),
            bracket_tracker: BracketTracker::new(),
            inside_brackets: false,
            should_split_rhs: false,
            magic_trailing_comma: None,
        }
    }

    /// Add a new leaf to the end of the line.
    ///
    /// Leaves without visible value are dropped. Unless `preformatted`, the
    /// leaf receives a recomputed whitespace prefix and bracket-tracker
    /// metadata; magic trailing commas are recorded (or removable ones
    /// stripped, when the mode ignores them). Inline comments are put aside
    /// into the comment map instead of joining the leaf sequence.
    pub fn append(
        &mut self,
        mut leaf: Leaf,
        preformatted: bool,
        track_bracket: bool,
    ) -> Result<(), LineError> {
        if !leaf.has_value() {
            return Ok(());
        }

        // `class X():` — drop the useless empty parens when the colon lands.
        if leaf.kind == TokenKind::Colon && self.is_class_paren_empty() {
            self.leaves.truncate(self.leaves.len() - 2);
        }
        if !self.leaves.is_empty() && !preformatted {
            let ctx = SpacingContext {
                prev_is_first: self.leaves.len() == 1,
                in_subscript: self.bracket_tracker.get_open_lsqb().is_some(),
                complex_subscript: self.is_complex_subscript(&leaf),
                inside_brackets: self.bracket_tracker.any_open_brackets(),
            };
            let ws = whitespace(self.leaves.last(), &leaf, ctx);
            leaf.prefix.push_str(ws);
        }
        if self.inside_brackets || !preformatted || track_bracket {
            self.bracket_tracker.mark(&mut leaf)?;
            if self.mode.magic_trailing_comma {
                if self.has_magic_trailing_comma(&leaf, false) {
                    trace!(?leaf, "recording magic trailing comma");
                    self.magic_trailing_comma = Some(leaf.clone());
                }
            } else if self.has_magic_trailing_comma(&leaf, true) {
                trace!(?leaf, "stripping removable trailing comma");
                self.remove_trailing_comma();
            }
        }
        if let Some(leaf) = self.try_append_comment(leaf) {
            self.leaves.push(leaf);
        }
        Ok(())
    }

    /// Like [`Line::append`] but rejecting invalid standalone-comment
    /// structure: nothing may follow a standalone comment, and a standalone
    /// comment may only open a line while no bracket is open.
    pub fn append_safe(&mut self, leaf: Leaf, preformatted: bool) -> Result<(), LineError> {
        if self.bracket_tracker.depth() == 0 {
            if self.is_comment() {
                return Err(LineError::AppendAfterStandaloneComment);
            }
            if !self.leaves.is_empty() && leaf.kind == TokenKind::StandaloneComment {
                return Err(LineError::StandaloneCommentOnPopulatedLine);
            }
        }
        self.append(leaf, preformatted, false)
    }

    /// Does the line hold any leaves or comments?
    #[inline]
    pub fn has_content(&self) -> bool {
        !self.leaves.is_empty() || !self.comments.is_empty()
    }

    /// Is this line a standalone comment?
    #[inline]
    pub fn is_comment(&self) -> bool {
        self.leaves.len() == 1 && self.leaves[0].kind == TokenKind::StandaloneComment
    }

    /// Is this line a decorator?
    #[inline]
    pub fn is_decorator(&self) -> bool {
        self.leaves.first().is_some_and(|leaf| leaf.kind == TokenKind::At)
    }

    /// Is this an import line?
    #[inline]
    pub fn is_import(&self) -> bool {
        self.leaves.first().is_some_and(is_import_keyword)
    }

    /// Is this a `with` / `async with` statement header?
    pub fn is_with_stmt(&self) -> bool {
        match self.leaves.first() {
            Some(first) if first.kind == TokenKind::Name && first.value == "with" => true,
            Some(first) if first.kind == TokenKind::Async => self
                .leaves
                .get(1)
                .is_some_and(|second| second.kind == TokenKind::Name && second.value == "with"),
            _ => false,
        }
    }

    /// Is this line a class definition?
    pub fn is_class(&self) -> bool {
        self.leaves
            .first()
            .is_some_and(|leaf| leaf.kind == TokenKind::Name && leaf.value == "class")
    }

    /// Is this a class whose body is just `...`?
    pub fn is_stub_class(&self) -> bool {
        self.is_class()
            && self.leaves.len() >= 3
            && self.leaves[self.leaves.len() - 3..]
                .iter()
                .all(|leaf| leaf.kind == TokenKind::Dot && leaf.value == ".")
    }

    /// Is this a function definition? (True for `async def` too.)
    pub fn is_def(&self) -> bool {
        let Some(first) = self.leaves.first() else {
            return false;
        };
        if first.kind == TokenKind::Name && first.value == "def" {
            return true;
        }
        first.kind == TokenKind::Async
            && self
                .leaves
                .get(1)
                .is_some_and(|second| second.kind == TokenKind::Name && second.value == "def")
    }

    /// Is this a class header with empty, removable parentheses?
    pub fn is_class_paren_empty(&self) -> bool {
        self.leaves.len() == 4
            && self.is_class()
            && self.leaves[2].kind == TokenKind::Lpar
            && self.leaves[2].value == "("
            && self.leaves[3].kind == TokenKind::Rpar
            && self.leaves[3].value == ")"
    }

    /// Does the line start with a triple-quoted string (a docstring)?
    pub fn is_triple_quoted_string(&self) -> bool {
        self.leaves.first().is_some_and(|leaf| {
            leaf.kind == TokenKind::String
                && (leaf.value.starts_with("\"\"\"") || leaf.value.starts_with("'''"))
        })
    }

    /// Does this line open a new level of indentation?
    #[inline]
    pub fn opens_block(&self) -> bool {
        self.leaves.last().is_some_and(|leaf| leaf.kind == TokenKind::Colon)
    }

    /// Is this line a placeholder for a verbatim-preserved region?
    ///
    /// True only for a single standalone-comment leaf that records the first
    /// leaf of the region it replaced; `first_leaf_matches`, when given,
    /// must accept that original leaf.
    pub fn is_fmt_pass_converted(
        &self,
        first_leaf_matches: Option<&dyn Fn(&Leaf) -> bool>,
    ) -> bool {
        if self.leaves.len() != 1 {
            return false;
        }
        let leaf = &self.leaves[0];
        if leaf.kind != TokenKind::StandaloneComment {
            return false;
        }
        let Some(original) = &leaf.fmt_pass_converted_first_leaf else {
            return false;
        };
        match first_leaf_matches {
            None => true,
            Some(matches) => matches(original),
        }
    }

    /// Any standalone comment among the leaves forces a split.
    pub fn contains_standalone_comments(&self) -> bool {
        self.contains_standalone_comments_within(u32::MAX)
    }

    /// Standalone comments at or below the given bracket depth.
    pub fn contains_standalone_comments_within(&self, depth_limit: u32) -> bool {
        self.leaves
            .iter()
            .any(|leaf| leaf.kind == TokenKind::StandaloneComment && leaf.bracket_depth <= depth_limit)
    }

    /// Does any leaf render across several physical lines?
    pub fn contains_multiline_strings(&self) -> bool {
        self.leaves.iter().any(is_multiline_string)
    }

    /// Return true if the line ends in a magic trailing comma for the given
    /// closing bracket: a trailing comma that is neither a one-tuple nor a
    /// single-element subscript. With `ensure_removable`, single-element
    /// square-bracket indexing is additionally excluded.
    pub fn has_magic_trailing_comma(&self, closing: &Leaf, ensure_removable: bool) -> bool {
        if !closing.kind.is_closing_bracket() {
            return false;
        }
        let Some(last) = self.leaves.last() else {
            return false;
        };
        if last.kind != TokenKind::Comma {
            return false;
        }

        if closing.kind == TokenKind::Rbrace {
            return true;
        }

        if closing.kind == TokenKind::Rsqb {
            let single_element = closing
                .opening_bracket
                .is_some_and(|open| is_one_sequence_between(open, closing, &self.leaves));
            if closing.parent == Some(ParentKind::Trailer) && single_element {
                // One-tuple subscript indexing, `a[x,]`.
                return false;
            }
            if !ensure_removable {
                return true;
            }
            let Some(comma_parent) = last.parent else {
                return false;
            };
            return comma_parent != ParentKind::Subscriptlist || !single_element;
        }

        if self.is_import() {
            // Comma-terminated imports always split one name per line.
            return true;
        }

        if let Some(open) = closing.opening_bracket {
            if !is_one_sequence_between(open, closing, &self.leaves) {
                return true;
            }
        }
        false
    }

    /// File an inline or standalone comment.
    ///
    /// Returns the leaf back when it should join the leaf sequence instead
    /// (standalone comments, and comments that open an empty line).
    fn try_append_comment(&mut self, mut comment: Leaf) -> Option<Leaf> {
        if comment.kind == TokenKind::StandaloneComment
            && self.bracket_tracker.any_open_brackets()
        {
            comment.prefix.clear();
            return Some(comment);
        }
        if comment.kind != TokenKind::Comment {
            return Some(comment);
        }
        if self.leaves.is_empty() {
            comment.kind = TokenKind::StandaloneComment;
            comment.prefix.clear();
            return Some(comment);
        }

        let mut target = self.leaves.len() - 1;
        let last = &self.leaves[target];
        if last.kind == TokenKind::Rpar
            && last.value.is_empty()
            && self.wraps_single_leaf(last)
            && !is_type_comment(&comment)
        {
            // Comments on optional parens wrapping a single leaf belong to
            // the wrapped leaf; otherwise the comment migrates when the
            // parens are inserted or removed and formatting never settles.
            if self.leaves.len() < 2 {
                comment.kind = TokenKind::StandaloneComment;
                comment.prefix.clear();
                return Some(comment);
            }
            target -= 1;
        }
        let id = self.leaves[target].id();
        self.comments.push(id, comment);
        None
    }

    /// Does this closing bracket wrap exactly one leaf?
    fn wraps_single_leaf(&self, closing: &Leaf) -> bool {
        let Some(open_id) = closing.opening_bracket else {
            return false;
        };
        let Some(open_index) = self.leaves.iter().position(|leaf| leaf.id() == open_id) else {
            return false;
        };
        self.leaves.len() - open_index == 3
    }

    /// Comments filed under the given leaf, in attachment order.
    pub fn comments_after(&self, leaf: LeafId) -> &[Leaf] {
        self.comments.get(leaf)
    }

    /// The whole comment map, in attachment order.
    pub fn comments(&self) -> &CommentMap {
        &self.comments
    }

    /// Remove the trailing comma, re-filing its comments onto the new last
    /// leaf.
    pub fn remove_trailing_comma(&mut self) {
        let Some(trailing_comma) = self.leaves.pop() else {
            return;
        };
        let moved = self.comments.take(trailing_comma.id());
        if let Some(new_last) = self.leaves.last() {
            let id = new_last.id();
            self.comments.extend(id, moved);
        }
    }

    /// Is `leaf` part of a subscript holding expressions beyond bare
    /// names, numbers, and simple slices?
    ///
    /// Decides whether slice colons get surrounding whitespace.
    pub fn is_complex_subscript(&self, leaf: &Leaf) -> bool {
        let Some(open_lsqb) = self.bracket_tracker.get_open_lsqb() else {
            return false;
        };
        if open_lsqb.parent != Some(ParentKind::Trailer) {
            // A list display, not a subscript.
            return false;
        }
        let open_id = open_lsqb.id();
        let Some(open_index) = self.leaves.iter().position(|l| l.id() == open_id) else {
            return false;
        };
        self.leaves[open_index + 1..]
            .iter()
            .chain(std::iter::once(leaf))
            .any(subscript_leaf_is_complex)
    }

    /// Enumerate leaves with their rendered width (prefix, text, and any
    /// attached comments), stopping the moment a leaf with an embedded
    /// newline is reached — width past that point is ill-defined.
    pub fn enumerate_with_length(
        &self,
        backwards: bool,
    ) -> Box<dyn Iterator<Item = (usize, &Leaf, usize)> + '_> {
        let forward = self.leaves.iter().enumerate();
        let ordered: Box<dyn Iterator<Item = (usize, &Leaf)> + '_> = if backwards {
            Box::new(forward.rev())
        } else {
            Box::new(forward)
        };
        Box::new(
            ordered
                .take_while(|(_, leaf)| !leaf.value.contains('\n'))
                .map(move |(index, leaf)| {
                    let mut length = str_width(&leaf.prefix) + str_width(&leaf.value);
                    for comment in self.comments_after(leaf.id()) {
                        length += str_width(&comment.value);
                    }
                    (index, leaf, length)
                }),
        )
    }

    /// An empty line sharing this line's mode, depth, and split flags; used
    /// when re-splitting into head/body/tail fragments.
    pub fn clone_empty(&self) -> Line {
        Line {
            mode: self.mode,
            depth: self.depth.clone(),
            leaves: Vec::new(),
            comments: CommentMap::default(),
            bracket_tracker: BracketTracker::new(),
            inside_brackets: self.inside_brackets,
            should_split_rhs: self.should_split_rhs,
            magic_trailing_comma: self.magic_trailing_comma.clone(),
        }
    }

    /// The literal indentation prefix for this depth.
    pub fn render_indent(&self) -> String {
        self.depth.render(self.mode.use_tabs, self.mode.indent_width)
    }

    /// Display width of the indentation prefix.
    pub fn total_indent_width(&self) -> usize {
        self.depth
            .total_width(self.mode.use_tabs, self.mode.tab_width, self.mode.indent_width)
    }

    /// Rendering with tabs expanded, for width measurement only.
    pub fn render_for_width(&self) -> String {
        self.render(true)
    }

    fn render(&self, for_width: bool) -> String {
        if !self.has_content() {
            return "\n".to_string();
        }
        let indent = if for_width {
            " ".repeat(self.total_indent_width())
        } else {
            self.render_indent()
        };
        let mut leaves = self.leaves.iter();
        let Some(first) = leaves.next() else {
            return "\n".to_string();
        };
        let mut out = format!("{}{}{}", first.prefix, indent, first.value);
        for leaf in leaves {
            out.push_str(&leaf.to_string());
        }
        for comment in self.comments.iter_comments() {
            out.push_str(&comment.to_string());
        }
        out.push('\n');
        out
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// Is this subscript leaf anything beyond a bare name, number, or simple
/// slice punctuation?
fn subscript_leaf_is_complex(leaf: &Leaf) -> bool {
    match leaf.kind {
        TokenKind::Number | TokenKind::Colon | TokenKind::Comma => false,
        TokenKind::Name => matches!(
            leaf.value.as_str(),
            "if" | "else" | "for" | "lambda" | "and" | "or" | "not" | "in" | "is" | "await"
        ),
        _ => true,
    }
}

/// Append duplicates of `leaves` (a subset of `old_line`'s leaves) to
/// `new_line`, carrying over the comments attached to each.
pub fn append_leaves(
    new_line: &mut Line,
    old_line: &Line,
    leaves: &[Leaf],
    preformatted: bool,
) -> Result<(), LineError> {
    for old_leaf in leaves {
        new_line.append(old_leaf.duplicate(), preformatted, false)?;
        for comment_leaf in old_line.comments_after(old_leaf.id()) {
            new_line.append(comment_leaf.clone(), true, false)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
