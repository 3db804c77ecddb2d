//! Indentation contexts and their rendering.
//!
//! A logical line's depth is a chain of indentation contexts rather than a
//! plain integer: some constructs fold several indent levels into one visual
//! line, and split fragments indent as continuations. The chain renders to
//! the literal indent string (tabs or spaces) and reports its display width
//! with the tab width applied.

use smallvec::SmallVec;

/// One indentation context.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Indent {
    /// A block opened by a colon-terminated header.
    Block,
    /// A continuation fragment produced by splitting inside brackets.
    Continuation,
}

/// An ordered chain of indentation contexts.
///
/// Depth comparisons throughout the layout core use [`IndentChain::len`].
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct IndentChain {
    indents: SmallVec<[Indent; 8]>,
}

impl IndentChain {
    pub fn new() -> Self {
        IndentChain::default()
    }

    /// Number of nested indentation contexts.
    #[inline]
    pub fn len(&self) -> usize {
        self.indents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indents.is_empty()
    }

    /// A new chain with one more context at the end.
    #[must_use]
    pub fn with_child(&self, indent: Indent) -> Self {
        let mut indents = self.indents.clone();
        indents.push(indent);
        IndentChain { indents }
    }

    /// The literal indent prefix for a line at this depth.
    ///
    /// One tab per context when tabs are in effect, otherwise
    /// `indent_width` spaces per context.
    pub fn render(&self, use_tabs: bool, indent_width: usize) -> String {
        if use_tabs {
            "\t".repeat(self.indents.len())
        } else {
            " ".repeat(self.indents.len() * indent_width)
        }
    }

    /// Display width of the rendered prefix, with the tab width applied.
    pub fn total_width(&self, use_tabs: bool, tab_width: usize, indent_width: usize) -> usize {
        let unit = if use_tabs { tab_width } else { indent_width };
        self.indents.len() * unit
    }
}

impl FromIterator<Indent> for IndentChain {
    fn from_iter<T: IntoIterator<Item = Indent>>(iter: T) -> Self {
        IndentChain {
            indents: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_chain_renders_nothing() {
        let chain = IndentChain::new();
        assert_eq!(chain.render(false, 4), "");
        assert_eq!(chain.total_width(false, 8, 4), 0);
    }

    #[test]
    fn spaces_rendering() {
        let chain = IndentChain::new()
            .with_child(Indent::Block)
            .with_child(Indent::Block);
        assert_eq!(chain.render(false, 4), "        ");
        assert_eq!(chain.total_width(false, 8, 4), 8);
    }

    #[test]
    fn tabs_render_one_per_context_but_width_uses_tab_width() {
        let chain = IndentChain::new()
            .with_child(Indent::Block)
            .with_child(Indent::Continuation);
        assert_eq!(chain.render(true, 4), "\t\t");
        assert_eq!(chain.total_width(true, 8, 4), 16);
    }
}
