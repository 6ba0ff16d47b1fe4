#![allow(clippy::unwrap_used)]

use std::fs;

use grove::DotGraphSink;
use grove::languages::{calc, json};
use tempfile::TempDir;

use crate::helpers::editing::{Document, parse_fresh, parser_for};

#[test]
fn test_print_tree_graph_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.dot");
    let tree = parse_fresh(json(), r#"{"a": [1]}"#);
    tree.print_dot_graph(&path).unwrap();

    let dot = fs::read_to_string(&path).unwrap();
    assert!(dot.starts_with("digraph tree {"));
    assert!(dot.trim_end().ends_with('}'));
    assert!(dot.contains("label=\"document\""));
    assert!(dot.contains("label=\"pair\""));
    assert!(dot.contains("->"));
}

#[test]
fn test_tree_graph_marks_changes() {
    let mut doc = Document::new(json(), "[1, 2]");
    let old = doc.replace(1, 2, "3");
    let mut edited = Vec::new();
    old.write_dot_graph(&mut edited).unwrap();
    let mut fresh = Vec::new();
    doc.tree.write_dot_graph(&mut fresh).unwrap();

    let edited = String::from_utf8(edited).unwrap();
    let fresh = String::from_utf8(fresh).unwrap();
    assert!(edited.contains("has-changes: 1"));
    assert!(!fresh.contains("has-changes: 1"));
}

#[test]
fn test_print_tree_graph_to_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("tree.dot");
    let tree = parse_fresh(json(), "[]");
    assert!(tree.print_dot_graph(&path).is_err());
}

#[cfg(unix)]
#[test]
fn test_graph_files_are_world_readable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.dot");
    parse_fresh(json(), "[]").print_dot_graph(&path).unwrap();
    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);

    let stack_path = dir.path().join("stack.dot");
    let _sink = DotGraphSink::create(&stack_path).unwrap();
    let mode = fs::metadata(&stack_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[test]
fn test_parse_stack_graphs_to_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stack.dot");
    let mut parser = parser_for(calc());
    parser.print_dot_graphs(Some(DotGraphSink::create(&path).unwrap()));
    parser.parse_string("x;", None).unwrap();
    parser.print_dot_graphs(None);

    let dot = fs::read_to_string(&path).unwrap();
    // Two shifts and one reduce.
    assert_eq!(dot.matches("digraph stack {").count(), 3);
    assert!(dot.contains("label=\"expression_statement\""));
}
