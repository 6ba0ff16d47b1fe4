//! Graphviz export of finished trees.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use super::Subtree;
use crate::base::Length;
use crate::language::Language;

/// Create or truncate a graph output file, readable by everyone and
/// writable by its owner.
pub(crate) fn create_graph_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    let file = options.open(path)?;
    // The mode above is filtered through the umask.
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(Permissions::from_mode(0o644))?;
    }
    Ok(file)
}

/// Quote a string for use inside a double-quoted DOT attribute.
pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub(crate) fn write_tree_graph<W: Write + ?Sized>(
    writer: &mut W,
    root: &Subtree,
    language: &Language,
) -> io::Result<()> {
    writeln!(writer, "digraph tree {{")?;
    writeln!(writer, "edge [arrowhead=none]")?;
    let mut next_id = 0;
    write_subtree(writer, root, Length::ZERO, language, &mut next_id)?;
    writeln!(writer, "}}")?;
    Ok(())
}

fn write_subtree<W: Write + ?Sized>(
    writer: &mut W,
    subtree: &Subtree,
    position: Length,
    language: &Language,
    next_id: &mut usize,
) -> io::Result<usize> {
    let id = *next_id;
    *next_id += 1;

    let start = position + subtree.padding();
    let end = start + subtree.size();
    let mut attributes = String::new();
    if !subtree.is_visible() {
        attributes.push_str(", fontcolor=gray");
    }
    if subtree.is_missing() {
        attributes.push_str(", color=red");
    } else if subtree.has_error() && subtree.is_leaf() {
        attributes.push_str(", color=orange");
    }
    if subtree.is_extra() {
        attributes.push_str(", fontcolor=gray, style=dashed");
    }

    let name = language.symbol_name(subtree.symbol());
    let label = if subtree.is_missing() {
        format!("MISSING {name}")
    } else {
        name.to_string()
    };
    writeln!(
        writer,
        "tree_{id} [label=\"{}\"{attributes}, tooltip=\"range: {} - {}\\nstart: {} - end: {}\\nhas-changes: {}\\nlookahead-bytes: {}\"]",
        escape(&label),
        start.bytes,
        end.bytes,
        start.point,
        end.point,
        u8::from(subtree.has_changes()),
        subtree.lookahead_bytes(),
    )?;

    let mut child_position = position;
    for (index, child) in subtree.children().iter().enumerate() {
        let child_id = write_subtree(writer, child, child_position, language, next_id)?;
        writeln!(writer, "tree_{id} -> tree_{child_id} [tooltip={index}]")?;
        child_position += child.total_size();
    }
    Ok(id)
}
