//! Basalt IR
//!
//! Leaf, bracket, and indentation model consumed by the basalt line-layout
//! core (`basalt_fmt`).
//!
//! This crate is the "external collaborator" surface of the formatter: the
//! tree-walking driver produces leaves, the line-layout core owns copies of
//! them. Leaves are distinguished by identity (a [`LeafId`] handle minted at
//! construction), not by value equality, because the core keeps per-leaf side
//! tables (comment attachment, split delimiters) keyed by identity.
//!
//! # Modules
//!
//! - [`leaf`]: token model with identity handles and structural queries
//! - [`brackets`]: bracket-depth and split-delimiter-priority tracking
//! - [`indent`]: indentation contexts and their rendering
//! - [`spacing`]: inter-token whitespace computation

pub mod brackets;
pub mod indent;
pub mod leaf;
pub mod spacing;

pub use brackets::{
    BracketError, BracketTracker, Priority, COMMA_PRIORITY, COMPARATOR_PRIORITY, DOT_PRIORITY,
    LOGIC_PRIORITY, STRING_PRIORITY, TERNARY_PRIORITY,
};
pub use indent::{Indent, IndentChain};
pub use leaf::{
    is_import_keyword, is_multiline_string, is_one_sequence_between, is_type_comment,
    is_type_ignore_comment, str_width, Leaf, LeafId, ParentKind, TokenKind,
};
pub use spacing::{whitespace, SpacingContext};
