#![allow(clippy::unwrap_used)]

use grove::languages::{calc, json};
use grove::{InputEdit, Point, Tree};
use rstest::rstest;

use crate::helpers::documents::json_records;
use crate::helpers::editing::{Document, byte_ranges, parser_for};

#[test]
fn test_unedited_reparse_reports_nothing() {
    let mut parser = parser_for(json());
    let text = json_records(10);
    let old = parser.parse_string(&text, None).unwrap();
    let new = parser.parse_string(&text, Some(&old)).unwrap();
    assert!(Tree::changed_ranges(&old, &new).is_empty());
}

#[rstest]
#[case::json_value(json(), "[1, 2, 3]", 4, 5, "20", vec![(4, 6)])]
#[case::json_string(json(), r#"{"k": "v"}"#, 6, 9, r#""w""#, vec![(6, 9)])]
#[case::calc_operand(calc(), "a + b;", 4, 5, "b * c", vec![(4, 9)])]
#[case::calc_whole_expression(calc(), "a+b;", 0, 3, "c-d", vec![(0, 3)])]
#[case::json_whitespace(json(), "[1, 2]", 3, 4, "\n\n", vec![])]
#[case::json_identity(json(), "[1, 2]", 1, 2, "1", vec![])]
fn test_single_edit(
    #[case] language: grove::Language,
    #[case] text: &str,
    #[case] start: usize,
    #[case] end: usize,
    #[case] replacement: &str,
    #[case] expected: Vec<(usize, usize)>,
) {
    let mut doc = Document::new(language, text);
    let old = doc.replace(start, end, replacement);
    let changed = Tree::changed_ranges(&old, &doc.tree);
    assert_eq!(byte_ranges(&changed), expected);
}

#[test]
fn test_range_points_follow_the_text() {
    let mut doc = Document::new(calc(), "let x = 1;\nlet y = a;\n");
    let old = doc.replace_text("a;", "f(a);");
    let changed = Tree::changed_ranges(&old, &doc.tree);
    // The old `a` absorbed the inserted text, so the shifted `;` is included.
    assert_eq!(byte_ranges(&changed), vec![(19, 24)]);
    assert_eq!(changed[0].start_point, Point::new(1, 8));
    assert_eq!(changed[0].end_point, Point::new(1, 13));
}

#[test]
fn test_separate_edits_give_separate_ranges() {
    let mut parser = parser_for(json());
    let text = "[1, 2, 3, 4]";
    let mut tree = parser.parse_string(text, None).unwrap();

    let first = InputEdit::for_utf8_text(text, 1, 2, "10");
    let text = "[10, 2, 3, 4]";
    tree.edit(&first);
    let second = InputEdit::for_utf8_text(text, 11, 12, "40");
    let text = "[10, 2, 3, 40]";
    tree.edit(&second);

    let new = parser.parse_string(text, Some(&tree)).unwrap();
    let changed = Tree::changed_ranges(&tree, &new);
    assert_eq!(byte_ranges(&changed), vec![(1, 3), (11, 13)]);
}

#[test]
fn test_deletion_is_reported_near_the_edit() {
    let mut doc = Document::new(json(), "[1, 2, 3]");
    let old = doc.replace(2, 5, "");
    assert_eq!(doc.text, "[1, 3]");
    let changed = Tree::changed_ranges(&old, &doc.tree);
    assert!(!changed.is_empty());
    assert!(changed.iter().all(|r| r.start_byte >= 1 && r.end_byte <= 5));
}

#[test]
fn test_ranges_are_sorted_and_disjoint() {
    let mut doc = Document::new(json(), &json_records(30));
    let mut tree = doc.tree.clone();
    let mut text = doc.text.clone();
    let edits = [
        ("\"id\": 3,", "\"x\": [],"),
        ("\"item 12\"", "[\"x\"]"),
        ("\"id\": 25,", "\"x\": [],"),
    ];
    for (needle, replacement) in edits {
        let start = text.find(needle).unwrap();
        let edit = InputEdit::for_utf8_text(&text, start, start + needle.len(), replacement);
        text.replace_range(start..start + needle.len(), replacement);
        tree.edit(&edit);
    }
    let new = doc.parser.parse_string(&text, Some(&tree)).unwrap();
    doc.tree = new;
    doc.text = text;

    let changed = Tree::changed_ranges(&tree, &doc.tree);
    assert!(changed.len() >= 3);
    for pair in changed.windows(2) {
        assert!(pair[0].end_byte < pair[1].start_byte);
    }
    for range in &changed {
        assert!(range.start_byte < range.end_byte);
        assert!(range.end_byte <= doc.text.len());
    }
}
