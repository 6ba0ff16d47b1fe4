#![allow(clippy::unwrap_used)]

use grove::languages::{calc, json};
use rstest::rstest;

use crate::helpers::documents::{CALC_PROGRAM, JSON_SMALL, calc_statements, json_records};
use crate::helpers::editing::{Document, parse_fresh, recording_logger};

fn assert_matches_fresh(doc: &Document) {
    let fresh = parse_fresh(doc.tree.language().clone(), &doc.text);
    assert_eq!(
        Document::layout(&doc.tree),
        Document::layout(&fresh),
        "incremental parse of {:?} differs from a fresh one",
        doc.text
    );
}

#[rstest]
#[case::change_number("3", "42")]
#[case::grow_array(r#""parser""#, r#""lexer", "parser""#)]
#[case::add_pair(r#""size": 3,"#, r#""size": 3, "more": {},"#)]
#[case::drop_nested(r#",
  "nested": {"ok": true, "none": null}"#, "")]
#[case::lose_colon(r#""ok":"#, r#""ok""#)]
#[case::unclosed_array("]", "")]
#[case::add_comment(r#""size""#, "// size\n  \"size\"")]
#[case::whitespace_only(r#""size": 3"#, r#""size"  :   3"#)]
#[case::identity("grove", "grove")]
fn test_json_edit_matches_fresh_parse(#[case] needle: &str, #[case] replacement: &str) {
    let mut doc = Document::new(json(), JSON_SMALL);
    doc.replace_text(needle, replacement);
    assert_matches_fresh(&doc);
}

#[rstest]
#[case::regroup("1 + 2 * 3", "(1 + 2) * 3")]
#[case::rename("let b", "let bb")]
#[case::unbalance("{\n", "")]
#[case::drop_semicolon("c * 2;", "c * 2")]
#[case::add_statement("print(a, b);", "print(a, b);\nlet z = 0;")]
#[case::edit_comment("# totals", "# totals and more")]
#[case::comment_out("let a", "# let a")]
#[case::stray_token("print", ") print")]
fn test_calc_edit_matches_fresh_parse(#[case] needle: &str, #[case] replacement: &str) {
    let mut doc = Document::new(calc(), CALC_PROGRAM);
    doc.replace_text(needle, replacement);
    assert_matches_fresh(&doc);
}

#[test]
fn test_edit_sequence_stays_consistent() {
    let mut doc = Document::new(json(), &json_records(40));
    for i in (0..40).step_by(7) {
        doc.replace_text(&format!("\"id\": {i},"), &format!("\"id\": {},", i * 100));
        assert_matches_fresh(&doc);
    }
    doc.replace_text("[true, false, null]", "[]");
    assert_matches_fresh(&doc);
    doc.replace(0, 1, "");
    assert_matches_fresh(&doc);
    doc.replace(0, 0, "[");
    assert_matches_fresh(&doc);
}

#[test]
fn test_edit_then_undo_restores_layout() {
    let mut doc = Document::new(calc(), &calc_statements(20));
    let original = Document::layout(&doc.tree);
    doc.replace_text("v3 * 4", "v3 * (4 + 1)");
    assert_matches_fresh(&doc);
    doc.replace_text("v3 * (4 + 1)", "v3 * 4");
    assert_eq!(Document::layout(&doc.tree), original);
}

#[test]
fn test_untouched_records_are_reused() {
    let text = json_records(200);
    let mut doc = Document::new(json(), &text);

    let (logger, lines) = recording_logger();
    doc.parser.set_logger(Some(logger));
    doc.replace_text("\"id\": 100,", "\"id\": 1000,");
    assert_matches_fresh(&doc);

    let lines = lines.lock();
    let reused_objects = lines
        .iter()
        .filter(|l| l.starts_with("parse: reuse_node sym:object"))
        .count();
    let incremental_shifts = lines.iter().filter(|l| l.starts_with("parse: shift sym:")).count();
    assert!(reused_objects >= 199, "only {reused_objects} objects reused");

    let (logger, fresh_lines) = recording_logger();
    let mut parser = crate::helpers::editing::parser_for(json());
    parser.set_logger(Some(logger));
    parser.parse_string(&doc.text, None).unwrap();
    let fresh_shifts = fresh_lines
        .lock()
        .iter()
        .filter(|l| l.starts_with("parse: shift sym:"))
        .count();
    assert!(incremental_shifts * 10 < fresh_shifts);
}

/// `groups` arrays of `per_group` records each, inside one outer array.
fn grouped_records(groups: usize, per_group: usize) -> String {
    let rows: Vec<String> = (0..groups)
        .map(|g| {
            let records: Vec<String> = (0..per_group)
                .map(|r| {
                    let i = g * per_group + r;
                    format!("{{\"id\": {i}, \"label\": \"item {i}\", \"flags\": [true, false, null]}}")
                })
                .collect();
            format!("  [{}]", records.join(", "))
        })
        .collect();
    format!("[\n{}\n]", rows.join(",\n"))
}

fn lexed_tokens(lines: &[String]) -> usize {
    lines.iter().filter(|l| l.starts_with("lex: lexed_lookahead")).count()
}

#[test]
fn test_one_token_edit_lexes_only_near_the_edit() {
    let text = grouped_records(40, 50);
    let mut doc = Document::new(json(), &text);

    let (logger, lines) = recording_logger();
    doc.parser.set_logger(Some(logger));
    doc.replace_text("\"id\": 1000,", "\"id\": 1001,");
    assert_matches_fresh(&doc);
    let incremental = lexed_tokens(&lines.lock());

    let (logger, fresh_lines) = recording_logger();
    let mut parser = crate::helpers::editing::parser_for(json());
    parser.set_logger(Some(logger));
    parser.parse_string(&doc.text, None).unwrap();
    let fresh = lexed_tokens(&fresh_lines.lock());

    // Untouched groups cost their first token and what follows them; only
    // the edited group is walked record by record.
    assert!(fresh > 40_000, "fresh parse lexed only {fresh} tokens");
    assert!(incremental < 400, "incremental parse lexed {incremental} tokens");
    assert!(incremental * 50 < fresh);
}

#[test]
fn test_edited_region_is_rebuilt() {
    let mut doc = Document::new(json(), "[[1, 2], [3, 4]]");
    let (logger, lines) = recording_logger();
    doc.parser.set_logger(Some(logger));
    doc.replace(2, 3, "10");

    let lines = lines.lock();
    assert!(lines.iter().any(|l| l == "parse: reuse_node sym:array, start:10, size:6"));
    assert!(!lines.iter().any(|l| l.starts_with("parse: reuse_node sym:array, start:1,")));
    assert_eq!(doc.sexp(), "(document (array (array (number) (number)) (array (number) (number))))");
}

#[test]
fn test_whitespace_shift_reuses_following_nodes() {
    let mut doc = Document::new(json(), "[[1], [2]]");
    let (logger, lines) = recording_logger();
    doc.parser.set_logger(Some(logger));
    doc.replace(5, 5, "\n\n   ");
    assert_matches_fresh(&doc);

    let reused_second = doc.tree.root_node().child(0).unwrap().named_child(1).unwrap();
    assert_eq!(reused_second.byte_range(), 11..14);
    assert!(
        lines
            .lock()
            .iter()
            .any(|l| l.starts_with("parse: reuse_node sym:array, start:11"))
    );
}
