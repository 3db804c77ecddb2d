//! Single-line fit judgment and split feasibility.
//!
//! Everything here answers one question from different angles: may this
//! logical line stay physical-line-sized as it is, and if not, is removing
//! or keeping optional parentheses going to help? The answers are pure
//! functions of the line, its mode, and a width budget.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use basalt_ir::{
    is_multiline_string, is_type_comment, is_type_ignore_comment, str_width, Leaf, LeafId,
    ParentKind, TokenKind, COMMA_PRIORITY, DOT_PRIORITY,
};

use crate::line::Line;
use crate::mode::{Mode, Preview};

/// Pragma markers whose trailing comments are width-exempt when the mode
/// does not wrap them: `# pylint:`, `# pytype:`, `# noqa:`, `# type: ignore`.
static PRAGMA_RE: Lazy<Regex> = Lazy::new(|| {
    #[expect(clippy::unwrap_used, reason = "the pattern is a literal and known valid")]
    let re = Regex::new(r" *# (?:(?:pylint|pytype|noqa):|type: *ignore)").unwrap();
    re
});

/// Intermediate result of a right-hand split.
#[derive(Clone, Debug)]
pub struct RHSResult {
    pub head: Line,
    pub body: Line,
    pub tail: Line,
    pub opening_bracket: Leaf,
    pub closing_bracket: Leaf,
}

/// The line's rendering without the trailing newline.
pub fn line_to_string(line: &Line) -> String {
    line.to_string().trim_matches('\n').to_string()
}

/// Total width of pragma comment suffixes attached to the last leaf.
///
/// Measures from the start of the pragma marker (including the preceding
/// spaces) to the end of each comment.
pub fn trailing_pragma_comment_length(line: &Line) -> usize {
    let Some(last) = line.leaves.last() else {
        return 0;
    };
    let mut length = 0;
    for comment in line.comments_after(last.id()) {
        let comment_str = comment.to_string();
        if let Some(found) = PRAGMA_RE.find(&comment_str) {
            length += str_width(&comment_str[found.start()..]);
        }
    }
    length
}

/// Return true if `line` fits within the mode's width budget.
///
/// For lines containing multiline strings, looks at the bracket context
/// around the string to decide whether it may stay inline. Pass a
/// pre-rendered `line_str` to skip re-rendering.
pub fn is_line_short_enough(line: &Line, mode: &Mode, line_str: Option<&str>) -> bool {
    let rendered;
    let mut line_str = match line_str {
        Some(s) if !s.is_empty() => s,
        _ => {
            rendered = line_to_string(line);
            rendered.as_str()
        }
    };

    let tab_rendered;
    if mode.use_tabs {
        // Rendered tabs count as one char; re-render with tab width applied.
        tab_rendered = line.render_for_width();
        line_str = tab_rendered.trim_matches('\n');
    }

    let width: fn(&str) -> usize = if mode.contains(Preview::STRING_WIDTH) {
        str_width
    } else {
        str::len
    };
    let effective_length = if mode.wrap_pragma_comments {
        width(line_str)
    } else {
        width(line_str).saturating_sub(trailing_pragma_comment_length(line))
    };

    if !mode.contains(Preview::MULTILINE_STRING_HANDLING) {
        return effective_length <= mode.line_length
            && !line_str.contains('\n')
            && !line.contains_standalone_comments();
    }

    if line.contains_standalone_comments() {
        return false;
    }
    if !line_str.contains('\n') {
        return effective_length <= mode.line_length;
    }

    let mut physical = line_str.split('\n');
    let first = physical.next().unwrap_or("");
    let last = physical.next_back().unwrap_or(first);
    if width(first) > mode.line_length || width(last) > mode.line_length {
        return false;
    }

    multiline_string_fits(line)
}

/// The bracket-context walk deciding whether a multiline string may stay
/// inline: the string's enclosing bracket levels must be comma-free, trailing
/// commas directly after the string excepted.
fn multiline_string_fits(line: &Line) -> bool {
    // Comma count per bracket depth, indexed by depth.
    let mut commas: Vec<u32> = Vec::new();
    let mut multiline_string: Option<&Leaf> = None;
    // Once the string's level is closed, only shallower levels still update.
    let mut max_level_to_update: Option<u32> = None;

    let last_index = line.leaves.len().saturating_sub(1);
    for (i, leaf) in line.leaves.iter().enumerate() {
        let depth = leaf.bracket_depth as usize;
        if max_level_to_update.is_none() {
            let mut had_comma = None;
            if depth + 1 > commas.len() {
                commas.push(0);
            } else if depth + 1 < commas.len() {
                had_comma = commas.pop();
            }
            if let (Some(left_level_commas), Some(mls)) = (had_comma, multiline_string) {
                if mls.bracket_depth == leaf.bracket_depth + 1 {
                    max_level_to_update = Some(leaf.bracket_depth);
                    if left_level_commas > 0 {
                        trace!("multiline string shares a bracket level with commas");
                        return false;
                    }
                }
            }
        }

        if max_level_to_update.is_none_or(|level| leaf.bracket_depth <= level)
            && leaf.kind == TokenKind::Comma
        {
            // A trailing comma directly after the string does not force a
            // split on its own.
            let trailing_after_mls = i == last_index && multiline_string.is_some();
            if !trailing_after_mls {
                if let Some(count) = commas.get_mut(depth) {
                    *count += 1;
                }
            }
        }
        if let Some(level) = max_level_to_update {
            max_level_to_update = Some(level.min(leaf.bracket_depth));
        }

        if is_multiline_string(leaf) {
            if multiline_string.is_some() {
                // Two multiline strings never share a physical line.
                return false;
            }
            multiline_string = Some(leaf);
        }
    }

    // A plain string with embedded newlines, not a triple-quoted literal.
    if multiline_string.is_none() {
        return true;
    }

    commas.iter().all(|count| *count == 0)
}

/// Any type comment that splitting could detach from its target.
pub fn contains_uncollapsable_type_comments(line: &Line) -> bool {
    if !line.mode.wrap_pragma_comments {
        // Pragma comments are width-exempt instead of split-protected.
        return false;
    }

    let Some(last) = line.leaves.last() else {
        return false;
    };
    let mut ignored_ids = vec![last.id()];
    if last.kind == TokenKind::Comma || (last.kind == TokenKind::Rpar && last.value.is_empty()) {
        // Synthesized trailing commas and invisible parens leave the
        // previous element's comments in place; both ids are fair targets.
        if line.leaves.len() >= 2 {
            ignored_ids.push(line.leaves[line.leaves.len() - 2].id());
        }
    }

    // A type comment cannot collapse when it sits mid-line (it would attach
    // to a different element) or hides behind an earlier comment.
    let mut comment_seen = false;
    for (leaf_id, comments) in line.comments().iter() {
        for comment in comments {
            if is_type_comment(comment)
                && (comment_seen
                    || (!is_type_ignore_comment(comment) && !ignored_ids.contains(&leaf_id)))
            {
                return true;
            }
            comment_seen = true;
        }
    }
    false
}

/// A trailing `# type: ignore` on an originally-single physical line pins
/// the whole line: splitting would leave the ignore's target ambiguous.
pub fn contains_unsplittable_type_ignore(line: &Line) -> bool {
    if !line.mode.wrap_pragma_comments {
        return false;
    }
    if line.leaves.is_empty() {
        return false;
    }

    // Only lines that were one physical line in the source count; a
    // multi-line expression never earns single-line protection this way.
    let first_line = line
        .leaves
        .iter()
        .map(|leaf| leaf.lineno)
        .find(|lineno| *lineno != 0)
        .unwrap_or(0);
    let last_line = line
        .leaves
        .iter()
        .rev()
        .map(|leaf| leaf.lineno)
        .find(|lineno| *lineno != 0)
        .unwrap_or(0);
    if first_line != last_line {
        return false;
    }

    // The last two leaves, because a comma or invisible paren may have been
    // appended after the commented element.
    line.leaves
        .iter()
        .rev()
        .take(2)
        .any(|leaf| line.comments_after(leaf.id()).iter().any(is_type_ignore_comment))
}

/// Return false if the line cannot be split for sure.
///
/// A cheap shape check, not a search; its single special case is the
/// string-prefixed method chain, which right-hand splitting mangles.
pub fn can_be_split(line: &Line) -> bool {
    let leaves = &line.leaves;
    if leaves.len() < 2 {
        return false;
    }

    if leaves[0].kind == TokenKind::String && leaves[1].kind == TokenKind::Dot {
        let mut call_count = 0;
        let mut dot_count = 0;
        let next = &leaves[leaves.len() - 1];
        for leaf in leaves[..leaves.len() - 1].iter().rev() {
            if leaf.kind.is_opening_bracket() {
                if !next.kind.is_closing_bracket() {
                    return false;
                }
                call_count += 1;
            } else if leaf.kind == TokenKind::Dot {
                dot_count += 1;
            } else if leaf.kind == TokenKind::Name {
                if !(next.kind == TokenKind::Dot || next.kind.is_opening_bracket()) {
                    return false;
                }
            } else if !leaf.kind.is_closing_bracket() {
                return false;
            }

            if dot_count > 1 && call_count > 1 {
                return false;
            }
        }
    }

    true
}

/// Does `rhs.body` have a shape safe to reformat without the optional
/// parentheses around it?
///
/// Deliberately conservative: a false positive here produces an overlong
/// line, a false negative merely keeps redundant-looking parens.
pub fn can_omit_invisible_parens(rhs: &RHSResult, line_length: usize) -> bool {
    let line = &rhs.body;
    let tracker = &line.bracket_tracker;
    if !tracker.has_delimiters() {
        // Without delimiters the optional parentheses are useless.
        return true;
    }

    let max_priority = tracker.max_delimiter_priority();
    let delimiter_count = tracker.delimiter_count_with_priority(max_priority);
    if delimiter_count > 1 {
        // Several delimiters of one kind read better wrapped.
        return false;
    }

    if delimiter_count == 1
        && line
            .mode
            .contains(Preview::WRAP_MULTIPLE_CONTEXT_MANAGERS_IN_PARENS)
        && max_priority == COMMA_PRIORITY
        && rhs.head.is_with_stmt()
    {
        // Two context managers in one `with` header stay wrapped.
        return false;
    }

    if max_priority == DOT_PRIORITY {
        // A single stranded method call needs no optional parentheses.
        return true;
    }

    let [first, second, ..] = line.leaves.as_slice() else {
        // A stranded delimiter; keep the parens rather than guess.
        return false;
    };

    // With a single delimiter, omit when the expression starts or ends with
    // a bracket. A line may carry both a leading opening and a trailing
    // closing bracket, so a failed leading check still falls through.
    if first.kind.is_opening_bracket()
        && !second.kind.is_closing_bracket()
        && can_omit_opening_paren(line, first, line_length)
    {
        return true;
    }

    let penultimate = &line.leaves[line.leaves.len() - 2];
    let last = &line.leaves[line.leaves.len() - 1];

    let closes_line = last.kind == TokenKind::Rpar
        || last.kind == TokenKind::Rbrace
        // Indexing looks odd without its parens.
        || (last.kind == TokenKind::Rsqb && last.parent != Some(ParentKind::Trailer));
    if closes_line {
        if penultimate.kind.is_opening_bracket() {
            // Empty brackets do not help.
            return false;
        }
        if is_multiline_string(first) {
            // Wrapping a multiline string further is never useful.
            return true;
        }
        if can_omit_closing_paren(line, last, line_length) {
            return true;
        }
    }

    false
}

/// The leading-bracket half of [`can_omit_invisible_parens`]: everything
/// after the first bracket's closer must fit, unless another opening bracket
/// offers a later split point.
fn can_omit_opening_paren(line: &Line, first: &Leaf, line_length: usize) -> bool {
    let mut remainder = false;
    let mut length = line.total_indent_width();
    let mut last_index = None;
    for (index, leaf, leaf_length) in line.enumerate_with_length(false) {
        last_index = Some(index);
        if leaf.kind.is_closing_bracket() && leaf.opening_bracket == Some(first.id()) {
            remainder = true;
        }
        if remainder {
            length += leaf_length;
            if length > line_length {
                return false;
            }
            if leaf.kind.is_opening_bracket() {
                // There are brackets we can further split on.
                remainder = false;
            }
        }
    }
    // The walk must have covered every leaf; a multiline string cuts it
    // short and voids the measurement.
    last_index.is_some_and(|index| index + 1 == line.leaves.len())
}

/// The trailing-bracket half of [`can_omit_invisible_parens`]: the head up
/// to the last bracket's opener must fit, or an earlier bracket must offer a
/// split point.
fn can_omit_closing_paren(line: &Line, last: &Leaf, line_length: usize) -> bool {
    let opening: Option<LeafId> = last.opening_bracket;
    let mut length = line.total_indent_width();
    let mut seen_other_brackets = false;
    for (_, leaf, leaf_length) in line.enumerate_with_length(false) {
        length += leaf_length;
        if Some(leaf.id()) == opening {
            return seen_other_brackets || length <= line_length;
        }
        if leaf.kind.is_opening_bracket() {
            seen_other_brackets = true;
        }
    }
    false
}
