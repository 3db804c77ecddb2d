//! Formatting configuration.
//!
//! `Mode` is pure, immutable input threaded explicitly through every
//! component; nothing in the crate reads ambient global configuration.

use bitflags::bitflags;

/// Default maximum line width before splitting.
pub const DEFAULT_LINE_LENGTH: usize = 88;

/// Spaces per indentation level.
pub const DEFAULT_INDENT_WIDTH: usize = 4;

/// Display width of one tab character.
pub const DEFAULT_TAB_WIDTH: usize = 8;

bitflags! {
    /// Experimental behavior toggles, individually selectable.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct Preview: u8 {
        /// Character-aware width instead of byte length.
        const STRING_WIDTH = 1;
        /// Multi-line-string-aware single-line fit.
        const MULTILINE_STRING_HANDLING = 1 << 1;
        /// Blank line after a nested non-stub class in stub files.
        const BLANK_LINE_AFTER_NESTED_STUB_CLASS = 1 << 2;
        /// Keep parens around multiple context managers in `with` headers.
        const WRAP_MULTIPLE_CONTEXT_MANAGERS_IN_PARENS = 1 << 3;
    }
}

/// Formatting configuration consumed by the layout core.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Mode {
    /// Maximum line width before splitting.
    pub line_length: usize,
    /// Spaces per indentation level.
    pub indent_width: usize,
    /// Indent with tabs instead of spaces.
    pub use_tabs: bool,
    /// Display width of one tab.
    pub tab_width: usize,
    /// Honor magic trailing commas as a forced-split signal. When off,
    /// removable trailing commas are stripped eagerly on append.
    pub magic_trailing_comma: bool,
    /// Always protect pragma/type-ignore comments from splitting. When off,
    /// trailing pragma suffixes are excluded from the effective length
    /// instead.
    pub wrap_pragma_comments: bool,
    /// Stub-file (`.pyi`) spacing rules.
    pub is_pyi: bool,
    /// Enabled experimental toggles.
    pub preview: Preview,
}

impl Default for Mode {
    fn default() -> Self {
        Mode {
            line_length: DEFAULT_LINE_LENGTH,
            indent_width: DEFAULT_INDENT_WIDTH,
            use_tabs: false,
            tab_width: DEFAULT_TAB_WIDTH,
            magic_trailing_comma: true,
            wrap_pragma_comments: true,
            is_pyi: false,
            preview: Preview::empty(),
        }
    }
}

impl Mode {
    /// A default mode with the given width budget.
    pub fn with_line_length(line_length: usize) -> Self {
        Mode {
            line_length,
            ..Mode::default()
        }
    }

    /// Is the given preview toggle enabled?
    #[inline]
    pub fn contains(&self, flag: Preview) -> bool {
        self.preview.contains(flag)
    }
}
