//! Basalt line layout
//!
//! The decision core of the formatter: logical lines are assembled leaf by
//! leaf, judged against the width budget, and spaced with blank lines. The
//! tree-walking driver feeds leaves in (see `basalt_ir`); physical splitting
//! executes elsewhere on the verdicts produced here.
//!
//! # Modules
//!
//! - [`mode`]: formatting configuration
//! - [`line`]: logical-line assembly, comment attachment, classification
//! - [`fit`]: single-line fit judgment and split feasibility
//! - [`blanks`]: blank-line allocation between logical lines

pub mod blanks;
pub mod fit;
pub mod line;
pub mod mode;

pub use blanks::{BlockId, EmptyLineTracker, LinesBlock};
pub use fit::{
    can_be_split, can_omit_invisible_parens, contains_uncollapsable_type_comments,
    contains_unsplittable_type_ignore, is_line_short_enough, line_to_string,
    trailing_pragma_comment_length, RHSResult,
};
pub use line::{append_leaves, CommentMap, Line, LineError};
pub use mode::{Mode, Preview, DEFAULT_INDENT_WIDTH, DEFAULT_LINE_LENGTH, DEFAULT_TAB_WIDTH};
