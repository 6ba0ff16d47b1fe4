#![allow(clippy::unwrap_used)]

use std::thread;
use std::time::{Duration, Instant};

use grove::languages::json;
use grove::{FnInput, Point};
use tokio_util::sync::CancellationToken;

use crate::helpers::documents::{JSON_LARGE, json_records};
use crate::helpers::editing::{Document, parse_fresh, parser_for, recording_logger};

#[test]
fn test_preset_flag_halts_before_parsing() {
    let mut parser = parser_for(json());
    let flag = parser.set_cancellation_flag(7);
    assert_eq!(parser.cancellation_flag(), 7);
    assert!(parser.parse_string("[1]", None).is_none());

    flag.set(0);
    assert_eq!(parser.cancellation_flag(), 0);
    assert!(parser.parse_string("[1]", None).is_some());
}

#[test]
fn test_tiny_timeout_halts_large_parse() {
    let mut parser = parser_for(json());
    parser.set_timeout_micros(1);
    assert_eq!(parser.timeout_micros(), 1);
    assert!(parser.parse_string(&JSON_LARGE, None).is_none());

    parser.set_timeout_micros(0);
    let tree = parser.parse_string(&JSON_LARGE, None).unwrap();
    assert_eq!(tree.root_node().end_byte(), JSON_LARGE.len());
}

#[test]
fn test_cancellation_is_seen_between_reads() {
    let text = JSON_LARGE.as_str();
    let mut parser = parser_for(json());
    let flag = parser.set_cancellation_flag(0);
    let mut reads = 0;
    let mut input = FnInput::new(|offset: usize, _point: Point| {
        reads += 1;
        if reads == 3 {
            flag.cancel();
        }
        let end = (offset + 64).min(text.len());
        text.as_bytes()[offset.min(text.len())..end].to_vec()
    });
    assert!(parser.parse(&mut input, None).is_none());
    drop(input);
    assert_eq!(reads, 3);
}

#[test]
fn test_timeout_is_seen_while_waiting_on_slow_input() {
    let text = JSON_LARGE.as_str();
    let mut parser = parser_for(json());
    parser.set_timeout_micros(20_000);
    let mut input = FnInput::new(|offset: usize, _point: Point| {
        thread::sleep(Duration::from_millis(2));
        let end = (offset + 64).min(text.len());
        text.as_bytes()[offset.min(text.len())..end].to_vec()
    });
    let started = Instant::now();
    assert!(parser.parse(&mut input, None).is_none());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn test_flag_set_from_another_thread() {
    let mut parser = parser_for(json());
    let flag = parser.set_cancellation_flag(0);
    let trigger = flag.clone();
    parser.set_logger(Some(Box::new(move |_, line| {
        if line.starts_with("reduce sym:object") && !trigger.is_cancelled() {
            let remote = trigger.clone();
            thread::spawn(move || remote.cancel()).join().unwrap();
        }
    })));
    assert!(parser.parse_string(&json_records(50), None).is_none());
    assert!(flag.is_cancelled());
}

#[test]
fn test_token_cancelled_from_another_thread() {
    let mut parser = parser_for(json());
    let token = CancellationToken::new();
    parser.set_cancellation_token(Some(token.clone()));
    parser.set_logger(Some(Box::new(move |_, line| {
        if line.starts_with("reduce sym:pair") && !token.is_cancelled() {
            let remote = token.clone();
            thread::spawn(move || remote.cancel()).join().unwrap();
        }
    })));
    assert!(parser.parse_string(&json_records(50), None).is_none());

    parser.set_cancellation_token(None);
    assert!(parser.parse_string(&json_records(50), None).is_some());
}

#[test]
fn test_halted_parse_is_resumed() {
    let text = json_records(100);
    let mut parser = parser_for(json());
    let flag = parser.set_cancellation_flag(0);
    let trigger = flag.clone();
    let mut reduced = 0;
    parser.set_logger(Some(Box::new(move |_, line| {
        if line.starts_with("reduce sym:object") {
            reduced += 1;
            if reduced == 60 {
                trigger.cancel();
            }
        }
    })));
    assert!(parser.parse_string(&text, None).is_none());

    flag.set(0);
    let (logger, lines) = recording_logger();
    parser.set_logger(Some(logger));
    let resumed = parser.parse_string(&text, None).unwrap();

    let reused = lines
        .lock()
        .iter()
        .filter(|l| l.starts_with("parse: reuse_node sym:object"))
        .count();
    assert!(reused >= 50, "only {reused} objects reused after resuming");
    let fresh = parse_fresh(json(), &text);
    assert_eq!(Document::layout(&resumed), Document::layout(&fresh));
}

#[test]
fn test_reset_discards_halted_work() {
    let text = json_records(30);
    let mut parser = parser_for(json());
    let flag = parser.set_cancellation_flag(0);
    let trigger = flag.clone();
    parser.set_logger(Some(Box::new(move |_, line| {
        if line.starts_with("reduce sym:object") {
            trigger.cancel();
        }
    })));
    assert!(parser.parse_string(&text, None).is_none());

    flag.set(0);
    parser.reset();
    let (logger, lines) = recording_logger();
    parser.set_logger(Some(logger));
    let tree = parser.parse_string(&text, None).unwrap();
    assert!(!lines.lock().iter().any(|l| l.contains("reuse_node")));
    assert_eq!(Document::layout(&tree), Document::layout(&parse_fresh(json(), &text)));
}

#[test]
fn test_halted_parse_with_old_tree_still_matches_fresh() {
    let mut doc = Document::new(json(), &json_records(200));
    doc.replace_text("\"id\": 20,", "\"id\": 21,");

    let flag = doc.parser.set_cancellation_flag(0);
    let trigger = flag.clone();
    doc.parser.set_logger(Some(Box::new(move |_, line| {
        if line.starts_with("reuse_node") {
            trigger.cancel();
        }
    })));
    let edit = grove::InputEdit::for_utf8_text(&doc.text, 1, 1, " ");
    doc.text.insert(1, ' ');
    doc.tree.edit(&edit);
    assert!(doc.parser.parse_string(&doc.text, Some(&doc.tree)).is_none());

    flag.set(0);
    doc.parser.set_logger(None);
    let tree = doc.parser.parse_string(&doc.text, Some(&doc.tree)).unwrap();
    assert_eq!(Document::layout(&tree), Document::layout(&parse_fresh(json(), &doc.text)));
}
