//! Tests for logical-line assembly.

#![expect(clippy::expect_used, reason = "tests fail loudly on append errors")]

use super::*;
use basalt_ir::Indent;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn name(value: &str) -> Leaf {
    Leaf::new(TokenKind::Name, value)
}

fn tok(kind: TokenKind, value: &str) -> Leaf {
    Leaf::new(kind, value)
}

fn line() -> Line {
    Line::new(Mode::default())
}

fn append_all(line: &mut Line, leaves: Vec<Leaf>) {
    for leaf in leaves {
        line.append(leaf, false, false).expect("append");
    }
}

#[test]
fn append_drops_invisible_non_brackets() {
    let mut line = line();
    append_all(&mut line, vec![name("x"), name("   "), name("")]);
    assert_eq!(line.leaves.len(), 1);
}

#[test]
fn append_keeps_invisible_brackets() {
    let mut line = line();
    append_all(
        &mut line,
        vec![tok(TokenKind::Lpar, ""), name("x"), tok(TokenKind::Rpar, "")],
    );
    assert_eq!(line.leaves.len(), 3);
}

#[test]
fn class_header_empty_parens_removed_at_colon() {
    let mut line = line();
    append_all(
        &mut line,
        vec![
            name("class"),
            name("X"),
            tok(TokenKind::Lpar, "("),
            tok(TokenKind::Rpar, ")"),
            tok(TokenKind::Colon, ":"),
        ],
    );
    let rendered: Vec<&str> = line.leaves.iter().map(|l| l.value.as_str()).collect();
    assert_eq!(rendered, vec!["class", "X", ":"]);
    assert!(line.is_class());
    assert!(line.opens_block());
}

#[test]
fn classification_predicates() {
    let mut def = line();
    append_all(&mut def, vec![name("def"), name("f")]);
    assert!(def.is_def());

    let mut async_def = line();
    append_all(&mut async_def, vec![tok(TokenKind::Async, "async"), name("def"), name("f")]);
    assert!(async_def.is_def());

    let mut deco = line();
    append_all(&mut deco, vec![tok(TokenKind::At, "@"), name("cached")]);
    assert!(deco.is_decorator());

    let mut import = line();
    append_all(&mut import, vec![name("from"), name("a"), name("import"), name("b")]);
    assert!(import.is_import());

    let mut with_stmt = line();
    append_all(&mut with_stmt, vec![name("with"), name("open")]);
    assert!(with_stmt.is_with_stmt());

    let mut async_with = line();
    append_all(&mut async_with, vec![tok(TokenKind::Async, "async"), name("with"), name("x")]);
    assert!(async_with.is_with_stmt());
}

#[test]
fn stub_class_is_class_with_ellipsis_body() {
    let mut stub = line();
    append_all(
        &mut stub,
        vec![
            name("class"),
            name("X"),
            tok(TokenKind::Colon, ":"),
            tok(TokenKind::Dot, "."),
            tok(TokenKind::Dot, "."),
            tok(TokenKind::Dot, "."),
        ],
    );
    assert!(stub.is_stub_class());

    let mut plain = line();
    append_all(&mut plain, vec![name("class"), name("X"), tok(TokenKind::Colon, ":")]);
    assert!(!plain.is_stub_class());
}

#[test]
fn magic_comma_on_closing_brace_is_always_magic() {
    let mut line = line();
    append_all(
        &mut line,
        vec![
            name("x"),
            tok(TokenKind::Equal, "="),
            tok(TokenKind::Lbrace, "{"),
            name("a"),
            tok(TokenKind::Comma, ","),
        ],
    );
    line.append(tok(TokenKind::Rbrace, "}"), false, false)
        .expect("append");
    assert!(line.magic_trailing_comma.is_some());
}

#[test]
fn one_element_subscript_comma_is_not_magic() {
    let mut line = line();
    append_all(
        &mut line,
        vec![
            name("a"),
            tok(TokenKind::Lsqb, "[").with_parent(ParentKind::Trailer),
            name("x"),
            tok(TokenKind::Comma, ","),
        ],
    );
    line.append(
        tok(TokenKind::Rsqb, "]").with_parent(ParentKind::Trailer),
        false,
        false,
    )
    .expect("append");
    assert!(line.magic_trailing_comma.is_none());
}

#[test]
fn two_element_subscript_comma_is_magic() {
    let mut line = line();
    append_all(
        &mut line,
        vec![
            name("a"),
            tok(TokenKind::Lsqb, "[").with_parent(ParentKind::Trailer),
            name("x"),
            tok(TokenKind::Comma, ","),
            name("y"),
            tok(TokenKind::Comma, ","),
        ],
    );
    line.append(
        tok(TokenKind::Rsqb, "]").with_parent(ParentKind::Trailer),
        false,
        false,
    )
    .expect("append");
    assert!(line.magic_trailing_comma.is_some());
}

#[test]
fn import_trailing_comma_is_magic_regardless_of_elements() {
    let mut line = line();
    append_all(
        &mut line,
        vec![
            name("from"),
            name("a"),
            name("import"),
            tok(TokenKind::Lpar, "("),
            name("b"),
            tok(TokenKind::Comma, ","),
            name("c"),
            tok(TokenKind::Comma, ","),
        ],
    );
    line.append(tok(TokenKind::Rpar, ")"), false, false)
        .expect("append");
    assert!(line.magic_trailing_comma.is_some());

    // Even a single imported name keeps its magic comma.
    let mut single = Line::new(Mode::default());
    append_all(
        &mut single,
        vec![
            name("from"),
            name("a"),
            name("import"),
            tok(TokenKind::Lpar, "("),
            name("b"),
            tok(TokenKind::Comma, ","),
        ],
    );
    single
        .append(tok(TokenKind::Rpar, ")"), false, false)
        .expect("append");
    assert!(single.magic_trailing_comma.is_some());
}

#[test]
fn one_tuple_in_parens_is_not_magic() {
    let mut line = line();
    append_all(
        &mut line,
        vec![
            name("x"),
            tok(TokenKind::Equal, "="),
            tok(TokenKind::Lpar, "("),
            name("a"),
            tok(TokenKind::Comma, ","),
        ],
    );
    line.append(tok(TokenKind::Rpar, ")"), false, false)
        .expect("append");
    assert!(line.magic_trailing_comma.is_none());
}

#[test]
fn removable_commas_stripped_when_magic_mode_off() {
    let mode = Mode {
        magic_trailing_comma: false,
        ..Mode::default()
    };
    let mut line = Line::new(mode);
    for leaf in [
        name("f"),
        tok(TokenKind::Lpar, "(").with_parent(ParentKind::Trailer),
        name("a").with_parent(ParentKind::Arglist),
        tok(TokenKind::Comma, ",").with_parent(ParentKind::Arglist),
        name("b").with_parent(ParentKind::Arglist),
        tok(TokenKind::Comma, ",").with_parent(ParentKind::Arglist),
    ] {
        line.append(leaf, false, false).expect("append");
    }
    line.append(tok(TokenKind::Rpar, ")").with_parent(ParentKind::Trailer), false, false)
        .expect("append");
    // The trailing comma is gone; the closing paren follows `b` directly.
    let values: Vec<&str> = line.leaves.iter().map(|l| l.value.as_str()).collect();
    assert_eq!(values, vec!["f", "(", "a", ",", "b", ")"]);
}

#[test]
fn comment_on_empty_line_becomes_standalone_leaf() {
    let mut line = line();
    line.append(tok(TokenKind::Comment, "# hello"), false, false)
        .expect("append");
    assert!(line.is_comment());
    assert_eq!(line.leaves[0].kind, TokenKind::StandaloneComment);
    assert!(line.leaves[0].prefix.is_empty());
}

#[test]
fn inline_comment_attaches_to_last_leaf() {
    let mut line = line();
    append_all(&mut line, vec![name("x"), tok(TokenKind::Equal, "="), name("y")]);
    let last_id = line.leaves.last().expect("leaves").id();
    line.append(tok(TokenKind::Comment, "# note"), false, false)
        .expect("append");
    assert_eq!(line.comments_after(last_id).len(), 1);
    assert_eq!(line.leaves.len(), 3);
}

#[test]
fn comment_redirected_past_invisible_paren() {
    let mut line = line();
    append_all(
        &mut line,
        vec![
            name("x"),
            tok(TokenKind::Equal, "="),
            tok(TokenKind::Lpar, ""),
            name("y"),
            tok(TokenKind::Rpar, ""),
        ],
    );
    let wrapped_id = line.leaves[3].id();
    let paren_id = line.leaves[4].id();
    line.append(tok(TokenKind::Comment, "# pinned"), false, false)
        .expect("append");
    assert_eq!(line.comments_after(wrapped_id).len(), 1);
    assert!(line.comments_after(paren_id).is_empty());
}

#[test]
fn type_comment_stays_on_invisible_paren() {
    let mut line = line();
    append_all(
        &mut line,
        vec![
            name("x"),
            tok(TokenKind::Equal, "="),
            tok(TokenKind::Lpar, ""),
            name("y"),
            tok(TokenKind::Rpar, ""),
        ],
    );
    let paren_id = line.leaves[4].id();
    line.append(tok(TokenKind::Comment, "# type: int"), false, false)
        .expect("append");
    assert_eq!(line.comments_after(paren_id).len(), 1);
}

#[test]
fn append_safe_rejects_leaf_after_standalone_comment() {
    let mut line = line();
    line.append_safe(tok(TokenKind::Comment, "# alone"), false)
        .expect("append");
    let err = line.append_safe(name("x"), false);
    assert_eq!(err, Err(LineError::AppendAfterStandaloneComment));
}

#[test]
fn append_safe_rejects_standalone_comment_on_populated_line() {
    let mut line = line();
    line.append_safe(name("x"), false).expect("append");
    let err = line.append_safe(tok(TokenKind::StandaloneComment, "# alone"), false);
    assert_eq!(err, Err(LineError::StandaloneCommentOnPopulatedLine));
}

#[test]
fn remove_trailing_comma_refiles_comments() {
    let mut line = line();
    append_all(&mut line, vec![name("a"), tok(TokenKind::Comma, ",")]);
    line.append(tok(TokenKind::Comment, "# keep me"), false, false)
        .expect("append");
    line.remove_trailing_comma();
    let new_last = line.leaves.last().expect("leaves").id();
    assert_eq!(line.comments_after(new_last).len(), 1);
    assert_eq!(line.leaves.len(), 1);
}

#[test]
fn enumerate_with_length_stops_at_multiline_string() {
    let mut line = line();
    append_all(
        &mut line,
        vec![
            name("x"),
            tok(TokenKind::Equal, "="),
            tok(TokenKind::String, "\"\"\"a\nb\"\"\""),
            tok(TokenKind::Dot, "."),
        ],
    );
    let seen: Vec<usize> = line.enumerate_with_length(false).map(|(i, _, _)| i).collect();
    assert_eq!(seen, vec![0, 1]);
}

#[test]
fn enumerate_with_length_counts_attached_comments() {
    let mut line = line();
    append_all(&mut line, vec![name("x")]);
    line.append(tok(TokenKind::Comment, "# four"), false, false)
        .expect("append");
    let (_, _, length) = line
        .enumerate_with_length(false)
        .next()
        .expect("one leaf");
    // "x" plus "# four"
    assert_eq!(length, 1 + 6);
}

#[test]
fn clone_empty_keeps_flags_but_no_leaves() {
    let mut line = line();
    line.inside_brackets = true;
    line.should_split_rhs = true;
    append_all(&mut line, vec![name("x")]);
    let fresh = line.clone_empty();
    assert!(fresh.leaves.is_empty());
    assert!(fresh.inside_brackets);
    assert!(fresh.should_split_rhs);
    assert_eq!(fresh.depth, line.depth);
}

#[test]
fn empty_line_renders_as_newline() {
    assert_eq!(line().to_string(), "\n");
}

#[test]
fn rendering_includes_indent_and_comments_in_attachment_order() {
    let mode = Mode::default();
    let depth = IndentChain::new().with_child(Indent::Block);
    let mut line = Line::with_depth(mode, depth);
    append_all(&mut line, vec![name("x"), tok(TokenKind::Equal, "="), name("y")]);
    line.append(tok(TokenKind::Comment, "# note"), false, false)
        .expect("append");
    assert_eq!(line.to_string(), "    x = y  # note\n");
}

#[test]
fn fmt_pass_converted_checks_original_first_leaf() {
    let mut placeholder = tok(TokenKind::StandaloneComment, "# basalt: verbatim");
    placeholder.fmt_pass_converted_first_leaf = Some(Box::new(name("import")));
    let mut line = line();
    line.append(placeholder, true, false).expect("append");

    assert!(line.is_fmt_pass_converted(None));
    let accepts = |leaf: &Leaf| leaf.value == "import";
    assert!(line.is_fmt_pass_converted(Some(&accepts)));
    let rejects = |leaf: &Leaf| leaf.value == "class";
    assert!(!line.is_fmt_pass_converted(Some(&rejects)));
}

#[test]
fn append_leaves_duplicates_subset_with_comments() {
    let mut old = line();
    append_all(&mut old, vec![name("a"), tok(TokenKind::Plus, "+"), name("b")]);
    let b_id = old.leaves[2].id();
    old.append(tok(TokenKind::Comment, "# tail"), false, false)
        .expect("append");

    let mut fresh = old.clone_empty();
    let subset: Vec<Leaf> = old.leaves.clone();
    append_leaves(&mut fresh, &old, &subset, false).expect("append_leaves");
    assert_eq!(fresh.leaves.len(), 3);
    // The duplicate of `b` carries the old comment under its fresh id.
    let new_b = fresh.leaves[2].id();
    assert_ne!(new_b, b_id);
    assert_eq!(fresh.comments_after(new_b).len(), 1);
}

proptest! {
    /// Appended leaves always carry a visible value.
    #[test]
    fn append_never_admits_blank_non_brackets(values in proptest::collection::vec(" {0,3}[a-z]{0,4}", 0..12)) {
        let mut line = Line::new(Mode::default());
        for value in &values {
            line.append(Leaf::new(TokenKind::Name, value.clone()), false, false).expect("append");
        }
        prop_assert!(line.leaves.iter().all(|leaf| !leaf.value.trim().is_empty()));
    }
}
