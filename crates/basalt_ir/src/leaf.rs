//! Token (leaf) model for the line-layout core.
//!
//! A [`Leaf`] is an owned copy of one terminal grammar symbol: a kind tag,
//! literal text, a mutable whitespace prefix, and enough tree context
//! (`parent` kind, bracket partner, source line) for the layout heuristics.
//! Identity is carried by a [`LeafId`] minted at construction; clones keep
//! the id so side tables survive `Line` cloning, while [`Leaf::duplicate`]
//! mints a fresh one.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_LEAF_ID: AtomicU32 = AtomicU32::new(0);

/// Identity handle for a leaf.
///
/// Two leaves with equal kind and text are still distinct tokens; every side
/// table in the core (comment attachment, delimiter priorities) is keyed by
/// this handle rather than by structural equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(u32);

impl LeafId {
    fn fresh() -> Self {
        LeafId(NEXT_LEAF_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for LeafId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LeafId({})", self.0)
    }
}

/// Kind tag for a leaf.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TokenKind {
    // Words and literals
    Name,
    Number,
    String,
    Async,

    // Brackets
    Lpar,
    Rpar,
    Lsqb,
    Rsqb,
    Lbrace,
    Rbrace,

    // Punctuation
    Comma,
    Colon,
    Semi,
    Dot,
    At,
    Equal,
    Arrow,

    // Arithmetic / bitwise operators
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Amp,
    Vbar,
    Circumflex,
    LeftShift,
    RightShift,
    Tilde,

    // Comparators
    Less,
    Greater,
    EqEqual,
    NotEqual,
    LessEqual,
    GreaterEqual,

    // Comments
    Comment,
    /// Synthetic comment that occupies a whole logical line.
    StandaloneComment,
}

impl TokenKind {
    /// Is this one of `(`, `[`, `{`?
    #[inline]
    pub fn is_opening_bracket(self) -> bool {
        matches!(self, TokenKind::Lpar | TokenKind::Lsqb | TokenKind::Lbrace)
    }

    /// Is this one of `)`, `]`, `}`?
    #[inline]
    pub fn is_closing_bracket(self) -> bool {
        matches!(self, TokenKind::Rpar | TokenKind::Rsqb | TokenKind::Rbrace)
    }

    /// Is this any bracket?
    #[inline]
    pub fn is_bracket(self) -> bool {
        self.is_opening_bracket() || self.is_closing_bracket()
    }

    /// The closing kind matching an opening bracket.
    #[inline]
    pub fn matching_closing(self) -> Option<TokenKind> {
        match self {
            TokenKind::Lpar => Some(TokenKind::Rpar),
            TokenKind::Lsqb => Some(TokenKind::Rsqb),
            TokenKind::Lbrace => Some(TokenKind::Rbrace),
            _ => None,
        }
    }

    /// Is this a comparison operator?
    #[inline]
    pub fn is_comparator(self) -> bool {
        matches!(
            self,
            TokenKind::Less
                | TokenKind::Greater
                | TokenKind::EqEqual
                | TokenKind::NotEqual
                | TokenKind::LessEqual
                | TokenKind::GreaterEqual
        )
    }

    /// Is this an arithmetic or bitwise operator?
    #[inline]
    pub fn is_math_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::DoubleStar
                | TokenKind::Slash
                | TokenKind::DoubleSlash
                | TokenKind::Percent
                | TokenKind::Amp
                | TokenKind::Vbar
                | TokenKind::Circumflex
                | TokenKind::LeftShift
                | TokenKind::RightShift
                | TokenKind::Tilde
        )
    }

    /// Is this a comment of either flavor?
    #[inline]
    pub fn is_comment(self) -> bool {
        matches!(self, TokenKind::Comment | TokenKind::StandaloneComment)
    }
}

/// Grammar context of a leaf's parent node.
///
/// The layout core never walks the full tree; it only needs to know what
/// construct a leaf sits in for a handful of decisions (indexing trailers,
/// subscript lists, list displays, import statements).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ParentKind {
    /// Call or indexing trailer: `f(...)`, `a[...]`.
    Trailer,
    /// Comma-separated subscript: `a[x, y]`.
    Subscriptlist,
    /// List display contents: `[a, b]`.
    Listmaker,
    /// Parenthesized atom.
    Atom,
    /// Call argument list.
    Arglist,
    /// `def` parameter list.
    Typedargslist,
    /// `from x import (...)`.
    ImportFrom,
    /// Dotted name, e.g. `a.b.c` in an import.
    DottedName,
    /// Unary-operator operand.
    Factor,
    /// `*args` / `**kwargs` position.
    StarExpr,
    /// `with` statement header.
    WithStmt,
}

/// One terminal token, owned by a logical line.
#[derive(Clone)]
pub struct Leaf {
    id: LeafId,
    pub kind: TokenKind,
    pub value: String,
    /// Whitespace (and consumed newlines) preceding the token text.
    pub prefix: String,
    /// Originating physical source line; 0 for synthetic leaves.
    pub lineno: u32,
    /// Bracket nesting depth, stamped by the tracker on `mark`.
    pub bracket_depth: u32,
    /// Grammar context of the parent node, when known.
    pub parent: Option<ParentKind>,
    /// For closing brackets: the id of the matching opener.
    pub opening_bracket: Option<LeafId>,
    /// For verbatim-region placeholders: the first leaf of the original
    /// region this standalone comment replaced.
    pub fmt_pass_converted_first_leaf: Option<Box<Leaf>>,
}

impl Leaf {
    /// Create a synthetic leaf (lineno 0) with a fresh identity.
    pub fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Leaf {
            id: LeafId::fresh(),
            kind,
            value: value.into(),
            prefix: String::new(),
            lineno: 0,
            bracket_depth: 0,
            parent: None,
            opening_bracket: None,
            fmt_pass_converted_first_leaf: None,
        }
    }

    /// Set the originating source line.
    #[must_use]
    pub fn with_lineno(mut self, lineno: u32) -> Self {
        self.lineno = lineno;
        self
    }

    /// Set the parent grammar context.
    #[must_use]
    pub fn with_parent(mut self, parent: ParentKind) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Set the whitespace prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// The identity handle of this leaf. Clones share it.
    #[inline]
    pub fn id(&self) -> LeafId {
        self.id
    }

    /// Copy kind, text, source line and parent context under a fresh
    /// identity. Prefix and bracket linkage are not carried over; the
    /// receiving line recomputes both on append.
    pub fn duplicate(&self) -> Leaf {
        Leaf {
            id: LeafId::fresh(),
            kind: self.kind,
            value: self.value.clone(),
            prefix: String::new(),
            lineno: self.lineno,
            bracket_depth: 0,
            parent: self.parent,
            opening_bracket: None,
            fmt_pass_converted_first_leaf: None,
        }
    }

    /// Brackets always carry a value; other leaves must have non-blank text.
    #[inline]
    pub fn has_value(&self) -> bool {
        self.kind.is_bracket() || !self.value.trim().is_empty()
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.value)
    }
}

impl fmt::Debug for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?}) @ {}", self.kind, self.value, self.lineno)
    }
}

/// Is this a string literal that renders across several physical lines?
///
/// Covers triple-quoted strings and raw newlines introduced by continuation
/// markers; both make single-line width ill-defined past the leaf.
#[inline]
pub fn is_multiline_string(leaf: &Leaf) -> bool {
    leaf.kind == TokenKind::String && leaf.value.contains('\n')
}

/// Is this comment a `# type:` comment?
#[inline]
pub fn is_type_comment(leaf: &Leaf) -> bool {
    leaf.kind.is_comment() && leaf.value.starts_with("# type:")
}

/// Is this comment specifically a `# type: ignore` comment?
#[inline]
pub fn is_type_ignore_comment(leaf: &Leaf) -> bool {
    leaf.kind.is_comment() && leaf.value.starts_with("# type: ignore")
}

/// Does this leaf start an import statement (`import` / `from`)?
#[inline]
pub fn is_import_keyword(leaf: &Leaf) -> bool {
    leaf.kind == TokenKind::Name && (leaf.value == "import" || leaf.value == "from")
}

/// Return true if the content between `opening` and `closing` is a single
/// comma-free element (at most a trailing comma).
///
/// `closing` need not be present in `leaves` yet; the scan then runs to the
/// end of the slice, which matches the append-time call where the closing
/// bracket is the leaf currently being added.
pub fn is_one_sequence_between(opening: LeafId, closing: &Leaf, leaves: &[Leaf]) -> bool {
    let inner_depth = closing.bracket_depth + 1;
    let Some(opening_index) = leaves.iter().position(|leaf| leaf.id() == opening) else {
        return false;
    };

    let mut commas = 0;
    for leaf in &leaves[opening_index + 1..] {
        if leaf.id() == closing.id() {
            break;
        }
        if leaf.bracket_depth == inner_depth && leaf.kind == TokenKind::Comma {
            commas += 1;
            if matches!(
                leaf.parent,
                Some(ParentKind::Arglist | ParentKind::Typedargslist)
            ) {
                commas += 1;
                break;
            }
        }
    }
    commas < 2
}

/// Display width of a string, in characters.
///
/// Full East-Asian-width accounting belongs to the display-width
/// collaborator; counting chars keeps multibyte text from inflating byte
/// lengths in the meantime.
#[inline]
pub fn str_width(s: &str) -> usize {
    s.chars().count()
}
