#![allow(clippy::unwrap_used)]

use std::thread;

use grove::languages::json;
use grove::{InputEdit, Tree};

use crate::helpers::documents::JSON_SMALL;
use crate::helpers::editing::{Document, parse_fresh};

#[test]
fn test_copy_is_independent_of_edits() {
    let tree = parse_fresh(json(), JSON_SMALL);
    let mut copy = tree.copy();
    copy.edit(&InputEdit::for_utf8_text(JSON_SMALL, 0, 0, "  "));

    assert_eq!(tree.root_node().end_byte(), JSON_SMALL.len());
    assert!(!tree.root_node().has_changes());
    assert_eq!(copy.root_node().end_byte(), JSON_SMALL.len() + 2);
    assert!(copy.root_node().has_changes());
}

#[test]
fn test_dispose_does_not_affect_copies() {
    let tree = parse_fresh(json(), JSON_SMALL);
    let layout = Document::layout(&tree);
    let copy = tree.copy();
    tree.dispose();
    assert_eq!(Document::layout(&copy), layout);
}

#[test]
fn test_old_tree_survives_reparse() {
    let mut doc = Document::new(json(), "[1, 2]");
    let before = doc.tree.copy();
    let old = doc.replace(1, 2, "7");
    assert_eq!(before.root_node().child(0).unwrap().child(1).unwrap().text(), Some("1"));
    assert!(old.root_node().has_changes());
    assert!(!doc.tree.root_node().has_changes());
    assert_eq!(doc.tree.root_node().child(0).unwrap().child(1).unwrap().text(), Some("7"));
}

#[test]
fn test_copies_are_readable_from_other_threads() {
    let tree = parse_fresh(json(), JSON_SMALL);
    let expected = tree.root_node().to_sexp();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let copy = tree.copy();
            thread::spawn(move || copy.root_node().to_sexp())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn test_copies_edited_on_other_threads() {
    let tree = parse_fresh(json(), "[1, 2, 3]");
    let handles: Vec<_> = (1..4)
        .map(|i| {
            let mut copy = tree.copy();
            thread::spawn(move || {
                copy.edit(&InputEdit::for_utf8_text("[1, 2, 3]", 0, 0, &" ".repeat(i)));
                copy.root_node().child(0).unwrap().start_byte()
            })
        })
        .collect();
    let starts: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(starts, vec![1, 2, 3]);
    assert_eq!(tree.root_node().child(0).unwrap().start_byte(), 0);
}

#[test]
fn test_debug_output() {
    let tree: Tree = parse_fresh(json(), "[1]");
    assert_eq!(format!("{tree:?}"), "{Tree (document (array (number)))}");
    let number = tree.root_node().descendant_for_byte_range(1, 2).unwrap();
    assert_eq!(format!("{number:?}"), "{Node number (0, 1) - (0, 2)}");
}
