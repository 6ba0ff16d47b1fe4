#![allow(clippy::unwrap_used)]

use grove::languages::json;
use grove::{Error, InputEdit, Point, Range, Tree};

use crate::helpers::editing::{Document, parser_for};

const PAGE: &str = "<script>[1, 2]</script>\n<script>{\"a\": 3}</script>\n";

fn script_ranges() -> Vec<Range> {
    vec![
        Range::new(8, 14, Point::new(0, 8), Point::new(0, 14)),
        Range::new(32, 40, Point::new(1, 8), Point::new(1, 16)),
    ]
}

#[test]
fn test_embedded_ranges_parse_as_one_document() {
    let mut parser = parser_for(json());
    parser.set_included_ranges(&script_ranges()).unwrap();
    let tree = parser.parse_string(PAGE, None).unwrap();
    let root = tree.root_node();

    assert_eq!(
        root.to_sexp(),
        "(document (array (number) (number)) (object (pair (string) (number))))"
    );
    assert_eq!(root.start_byte(), 0);
    assert_eq!(root.end_byte(), 40);

    let array = root.child(0).unwrap();
    assert_eq!(array.byte_range(), 8..14);
    let object = root.child(1).unwrap();
    assert_eq!(object.byte_range(), 32..40);
    assert_eq!(object.start_position(), Point::new(1, 8));
    assert_eq!(object.end_position(), Point::new(1, 16));
    assert_eq!(tree.included_ranges(), script_ranges().as_slice());
}

#[test]
fn test_text_outside_ranges_is_ignored() {
    let mut parser = parser_for(json());
    parser.set_included_ranges(&script_ranges()).unwrap();
    let tree = parser.parse_string(PAGE, None).unwrap();
    // Tags would be ERROR tokens if they were lexed.
    assert!(!tree.root_node().has_error());
}

#[test]
fn test_ranges_past_the_end_are_truncated() {
    let mut parser = parser_for(json());
    let text = "<script>[true]";
    parser
        .set_included_ranges(&[Range::new(8, 1000, Point::new(0, 8), Point::new(0, 1000))])
        .unwrap();
    let tree = parser.parse_string(text, None).unwrap();
    assert_eq!(tree.root_node().end_byte(), text.len());
    assert_eq!(tree.root_node().to_sexp(), "(document (array (true)))");
}

#[test]
fn test_overlapping_ranges_are_rejected() {
    let mut parser = parser_for(json());
    let ranges = [
        Range::new(0, 10, Point::new(0, 0), Point::new(0, 10)),
        Range::new(5, 15, Point::new(0, 5), Point::new(0, 15)),
    ];
    let error = parser.set_included_ranges(&ranges).unwrap_err();
    assert!(matches!(error, Error::InvalidIncludedRanges { index: 1 }));
    assert_eq!(parser.included_ranges(), &[Range::ALL]);
}

#[test]
fn test_inverted_range_is_rejected() {
    let mut parser = parser_for(json());
    parser.set_included_ranges(&script_ranges()).unwrap();
    let inverted = [Range::new(9, 3, Point::new(0, 9), Point::new(0, 3))];
    assert!(parser.set_included_ranges(&inverted).is_err());
    assert_eq!(parser.included_ranges(), script_ranges().as_slice());
}

#[test]
fn test_empty_ranges_mean_whole_document() {
    let mut parser = parser_for(json());
    parser.set_included_ranges(&script_ranges()).unwrap();
    parser.set_included_ranges(&[]).unwrap();
    assert_eq!(parser.included_ranges(), &[Range::ALL]);
    let tree = parser.parse_string("[1]", None).unwrap();
    assert_eq!(tree.included_ranges(), &[Range::ALL]);
}

#[test]
fn test_edit_outside_ranges_then_reparse() {
    let mut parser = parser_for(json());
    parser.set_included_ranges(&script_ranges()).unwrap();
    let mut tree = parser.parse_string(PAGE, None).unwrap();

    let insert = "<p>hello</p>";
    let edit = InputEdit::for_utf8_text(PAGE, 24, 24, insert);
    let mut text = PAGE.to_string();
    text.insert_str(24, insert);
    tree.edit(&edit);

    let moved = tree.included_ranges().to_vec();
    assert_eq!(moved[0], script_ranges()[0]);
    assert_eq!(moved[1].start_byte, 44);
    assert_eq!(moved[1].start_point, Point::new(1, 20));

    parser.set_included_ranges(&moved).unwrap();
    let new_tree = parser.parse_string(&text, Some(&tree)).unwrap();

    let mut fresh_parser = parser_for(json());
    fresh_parser.set_included_ranges(&moved).unwrap();
    let fresh = fresh_parser.parse_string(&text, None).unwrap();
    assert_eq!(Document::layout(&new_tree), Document::layout(&fresh));
    assert_eq!(new_tree.root_node().child(1).unwrap().byte_range(), 44..52);
    assert!(Tree::changed_ranges(&tree, &new_tree).is_empty());
}
