//! Blank-line spacing between logical lines.
//!
//! [`EmptyLineTracker`] is the one stateful component of the layout core: it
//! walks lines in emission order and decides how many blank lines each one
//! gets before and after. Decisions are recorded in an append-only log of
//! [`LinesBlock`] entries so that a class or def line can reach back through
//! its leading comments and move its blank lines in front of them.

use tracing::trace;

use basalt_ir::{is_import_keyword, TokenKind};

use crate::line::Line;
use crate::mode::{Mode, Preview};

/// Handle into the tracker's block log.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlockId(usize);

/// One emitted logical line with its blank-line allocation.
///
/// `content_lines` is filled in by the emitter after splitting; the tracker
/// only decides `before` and `after`.
#[derive(Clone, Debug)]
pub struct LinesBlock {
    pub previous_block: Option<BlockId>,
    pub original_line: Line,
    pub before: usize,
    pub content_lines: Vec<String>,
    pub after: usize,
}

impl LinesBlock {
    /// The block's physical lines: blank lines, content, blank lines.
    pub fn all_lines(&self) -> Vec<String> {
        std::iter::repeat_n("\n".to_string(), self.before)
            .chain(self.content_lines.iter().cloned())
            .chain(std::iter::repeat_n("\n".to_string(), self.after))
            .collect()
    }
}

/// Decides the number of extra blank lines before and after each logical
/// line: two around top-level defs and classes, one when nested, with the
/// stub-file matrix applied under `is_pyi`.
///
/// Works on lines that have not been split yet and assumes the first leaf's
/// prefix holds the source's optional newlines; those are consumed here and
/// fold into the decision.
#[derive(Debug)]
pub struct EmptyLineTracker {
    mode: Mode,
    blocks: Vec<LinesBlock>,
    previous_line: Option<Line>,
    previous_block: Option<BlockId>,
    previous_defs: Vec<Line>,
    semantic_leading_comment: Option<BlockId>,
}

impl EmptyLineTracker {
    pub fn new(mode: Mode) -> Self {
        EmptyLineTracker {
            mode,
            blocks: Vec::new(),
            previous_line: None,
            previous_block: None,
            previous_defs: Vec::new(),
            semantic_leading_comment: None,
        }
    }

    /// The block behind a handle.
    pub fn block(&self, id: BlockId) -> &LinesBlock {
        &self.blocks[id.0]
    }

    /// Mutable access, for the emitter to fill `content_lines`.
    pub fn block_mut(&mut self, id: BlockId) -> &mut LinesBlock {
        &mut self.blocks[id.0]
    }

    /// Allocate blank lines around `current_line` and log the decision.
    ///
    /// Consumes the newlines in the first leaf's prefix. The returned handle
    /// stays valid for the life of the tracker; an already-logged comment
    /// block may still gain blank lines when a later def or class hoists its
    /// spacing over the comment.
    pub fn maybe_empty_lines(&mut self, current_line: &mut Line) -> BlockId {
        let (raw_before, after) = self.raw_empty_lines(current_line);
        let previous_after = self
            .previous_block
            .map_or(0, |id| self.blocks[id.0].after);
        let before = if self.previous_line.is_none() {
            // Never open the file with blank lines.
            0
        } else {
            raw_before.saturating_sub(previous_after)
        };
        let block = LinesBlock {
            previous_block: self.previous_block,
            original_line: current_line.clone(),
            before,
            content_lines: Vec::new(),
            after,
        };
        let id = BlockId(self.blocks.len());
        self.blocks.push(block);

        if current_line.is_comment() {
            let starts_semantic_block = match &self.previous_line {
                None => true,
                Some(prev) => {
                    !prev.is_decorator()
                        // A comment run only counts from its first comment,
                        // unless a blank line restarts it.
                        && (!prev.is_comment() || before > 0)
                        && (self.semantic_leading_comment.is_none() || before > 0)
                }
            };
            if starts_semantic_block {
                self.semantic_leading_comment = Some(id);
            }
        } else if !current_line.is_decorator() || before > 0 {
            self.semantic_leading_comment = None;
        }

        self.previous_line = Some(current_line.clone());
        self.previous_block = Some(id);
        id
    }

    fn raw_empty_lines(&mut self, current_line: &mut Line) -> (usize, usize) {
        let max_allowed = if current_line.depth.is_empty() {
            if self.mode.is_pyi {
                1
            } else {
                2
            }
        } else {
            1
        };
        let mut before = match current_line.leaves.first_mut() {
            Some(first_leaf) => {
                let newlines = first_leaf.prefix.matches('\n').count();
                first_leaf.prefix.clear();
                newlines.min(max_allowed)
            }
            None => 0,
        };

        let depth_len = current_line.depth.len();
        while self
            .previous_defs
            .last()
            .is_some_and(|def| def.depth.len() >= depth_len)
        {
            if self.mode.is_pyi {
                let after_method = depth_len > 0
                    && !current_line.is_def()
                    && self.previous_line.as_ref().is_some_and(Line::is_def);
                let last_def = &self.previous_defs[self.previous_defs.len() - 1];
                if after_method {
                    // Blank lines between attributes and methods survive.
                    before = before.min(1);
                } else if self.mode.contains(Preview::BLANK_LINE_AFTER_NESTED_STUB_CLASS)
                    && last_def.is_class()
                    && !last_def.is_stub_class()
                {
                    before = 1;
                } else if depth_len > 0 {
                    before = 0;
                } else {
                    before = 1;
                }
            } else if depth_len > 0 {
                before = 1;
            } else if !self.previous_defs[self.previous_defs.len() - 1]
                .depth
                .is_empty()
                && current_line
                    .leaves
                    .last()
                    .is_some_and(|leaf| leaf.kind == TokenKind::Colon)
                && current_line.leaves.first().is_some_and(|first| {
                    !matches!(
                        first.value.as_str(),
                        "with" | "try" | "for" | "while" | "if" | "match"
                    )
                })
            {
                // A dependent clause (`else`, `elif`, `except`, `finally`)
                // after an indented def stays close: the def itself only got
                // one blank line above, two below would read lopsided.
                before = 1;
            } else {
                before = 2;
            }
            self.previous_defs.pop();
        }

        if current_line.is_decorator() || current_line.is_def() || current_line.is_class() {
            return self.class_or_def_empty_lines(current_line, before);
        }

        if let Some(previous_line) = &self.previous_line {
            if previous_line.is_import()
                && !current_line.is_import()
                && !current_line.is_fmt_pass_converted(Some(&is_import_keyword))
                && depth_len == previous_line.depth.len()
            {
                return (before.max(1), 0);
            }

            if previous_line.is_class() && current_line.is_triple_quoted_string() {
                return (before, 1);
            }

            if previous_line.opens_block() {
                return (0, 0);
            }
        }
        (before, 0)
    }

    fn class_or_def_empty_lines(&mut self, current_line: &Line, before: usize) -> (usize, usize) {
        if !current_line.is_decorator() {
            self.previous_defs.push(current_line.clone());
        }
        let Some(previous_line) = self.previous_line.clone() else {
            // First line in the file.
            return (0, 0);
        };

        if previous_line.is_decorator() {
            if self.mode.is_pyi && current_line.is_stub_class() {
                return (0, 1);
            }
            return (0, 0);
        }

        if previous_line.depth.len() < current_line.depth.len()
            && (previous_line.is_class() || previous_line.is_def())
        {
            return (0, 0);
        }

        let mut comment_to_add_newlines: Option<BlockId> = None;
        if previous_line.is_comment()
            && previous_line.depth.len() == current_line.depth.len()
            && before == 0
        {
            let hoistable = self.semantic_leading_comment.and_then(|slc_id| {
                let slc = self.block(slc_id);
                let ahead = self.block(slc.previous_block?);
                (!ahead.original_line.is_class()
                    && !ahead.original_line.opens_block()
                    && slc.before <= 1)
                    .then_some(slc_id)
            });
            match hoistable {
                Some(slc_id) => comment_to_add_newlines = Some(slc_id),
                None => return (0, 0),
            }
        }

        let mut newlines = if self.mode.is_pyi {
            if current_line.is_class() || previous_line.is_class() {
                if previous_line.depth.len() < current_line.depth.len() {
                    0
                } else if previous_line.depth.len() > current_line.depth.len() {
                    1
                } else if current_line.is_stub_class() && previous_line.is_stub_class() {
                    // No blank line between classes with an empty body.
                    0
                } else {
                    1
                }
            } else if (current_line.is_def() || current_line.is_decorator())
                && !previous_line.is_def()
            {
                if current_line.depth.is_empty() {
                    // Blank line between a block of functions and a block of
                    // non-functions.
                    1
                } else {
                    // Blank lines between attributes and methods survive.
                    before.min(1)
                }
            } else if previous_line.depth.len() > current_line.depth.len() {
                1
            } else {
                0
            }
        } else if current_line.depth.is_empty() {
            2
        } else {
            1
        };

        if let Some(comment_id) = comment_to_add_newlines {
            let previous_after = self
                .block(comment_id)
                .previous_block
                .map(|ahead| self.block(ahead).after);
            if let Some(previous_after) = previous_after {
                trace!(
                    ?comment_id,
                    newlines,
                    "hoisting blank lines over leading comments"
                );
                let block = self.block_mut(comment_id);
                block.before = block.before.max(newlines).saturating_sub(previous_after);
                newlines = 0;
            }
        }
        (newlines, 0)
    }
}
