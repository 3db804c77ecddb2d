//! Inter-token whitespace computation.
//!
//! When a leaf joins a line mid-assembly its prefix is recomputed from the
//! pair (previous leaf, incoming leaf) plus a little positional context.
//! The rules are table-like on kinds with a handful of value checks for
//! keywords; grammar-heavy cases (slice colons) lean on the caller-supplied
//! subscript flags.

use crate::leaf::{Leaf, ParentKind, TokenKind};

const NO: &str = "";
const SPACE: &str = " ";
const DOUBLESPACE: &str = "  ";

/// Positional context the line supplies alongside the leaf pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpacingContext {
    /// The previous leaf is the first leaf of the line.
    pub prev_is_first: bool,
    /// The incoming leaf sits inside an open `[` subscript.
    pub in_subscript: bool,
    /// That subscript holds expressions beyond bare names/numbers/slices.
    pub complex_subscript: bool,
    /// Any bracket is currently open.
    pub inside_brackets: bool,
}

/// Keywords that keep a space before a following bracket (`if (`, `in [`).
fn is_keyword(value: &str) -> bool {
    matches!(
        value,
        "if" | "elif"
            | "else"
            | "for"
            | "while"
            | "return"
            | "yield"
            | "await"
            | "assert"
            | "del"
            | "import"
            | "from"
            | "as"
            | "in"
            | "is"
            | "not"
            | "and"
            | "or"
            | "with"
            | "lambda"
            | "raise"
            | "global"
            | "nonlocal"
            | "class"
            | "def"
            | "async"
            | "except"
            | "finally"
            | "try"
            | "match"
            | "case"
    )
}

/// The whitespace prefix an appended leaf receives.
///
/// Returns an empty string for the first leaf of a line; indentation is the
/// renderer's job, not a prefix.
pub fn whitespace(previous: Option<&Leaf>, leaf: &Leaf, ctx: SpacingContext) -> &'static str {
    let Some(prev) = previous else {
        return NO;
    };

    match leaf.kind {
        TokenKind::Comment => return DOUBLESPACE,
        TokenKind::Comma | TokenKind::Semi | TokenKind::Dot => return NO,
        TokenKind::Rpar | TokenKind::Rsqb | TokenKind::Rbrace => return NO,
        TokenKind::Colon => {
            if ctx.in_subscript {
                return if ctx.complex_subscript { SPACE } else { NO };
            }
            return NO;
        }
        TokenKind::Equal => {
            // Keyword arguments bind tightly: f(a=1). Top-level assignment
            // and annotated defaults keep their spaces.
            if ctx.inside_brackets && !ctx.complex_subscript {
                return NO;
            }
            return SPACE;
        }
        _ => {}
    }

    if prev.kind.is_opening_bracket() {
        return NO;
    }

    match prev.kind {
        TokenKind::Dot | TokenKind::Tilde => return NO,
        // Decorator marker; a mid-line `@` is matrix multiplication.
        TokenKind::At if ctx.prev_is_first => return NO,
        TokenKind::Equal if ctx.inside_brackets && !ctx.complex_subscript => return NO,
        TokenKind::Colon => {
            if ctx.in_subscript {
                return if ctx.complex_subscript { SPACE } else { NO };
            }
            return SPACE;
        }
        _ => {}
    }

    // Unary operators glue to their operand.
    if prev.kind.is_math_operator()
        && matches!(
            prev.parent,
            Some(ParentKind::Factor | ParentKind::StarExpr)
        )
    {
        return NO;
    }

    if leaf.kind.is_opening_bracket() {
        return match prev.kind {
            TokenKind::Name if is_keyword(&prev.value) => SPACE,
            TokenKind::Name | TokenKind::Number | TokenKind::String => NO,
            kind if kind.is_closing_bracket() => NO,
            _ => SPACE,
        };
    }

    SPACE
}
