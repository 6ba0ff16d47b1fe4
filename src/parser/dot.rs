//! Step-by-step parse graphs.

use std::fmt;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use crate::error::Result;
use crate::language::{Language, Symbol};
use crate::tree::{Subtree, create_graph_file, escape};

/// Destination for the parse-stack graphs written while parsing.
///
/// Every shift, reduce and reuse appends one `digraph` showing the nodes that
/// are still open. Clones write to the same destination.
#[derive(Clone)]
pub struct DotGraphSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl DotGraphSink {
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Write graphs to a file, creating or truncating it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = create_graph_file(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file)))
    }

    /// Failures are reported through `tracing` and otherwise ignored, so a
    /// broken graph target never changes the parse.
    pub(crate) fn write_stack<'s>(
        &self,
        language: &Language,
        frames: impl Iterator<Item = (Symbol, &'s [Subtree])>,
        lookahead: Symbol,
    ) {
        let mut writer = self.writer.lock();
        let written = write_stack_graph(&mut **writer, language, frames, lookahead)
            .and_then(|()| writer.flush());
        if let Err(error) = written {
            warn!(%error, "failed to write parse stack graph");
        }
    }
}

impl fmt::Debug for DotGraphSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DotGraphSink").finish_non_exhaustive()
    }
}

fn write_stack_graph<'s, W: Write + ?Sized>(
    writer: &mut W,
    language: &Language,
    frames: impl Iterator<Item = (Symbol, &'s [Subtree])>,
    lookahead: Symbol,
) -> io::Result<()> {
    writeln!(writer, "digraph stack {{")?;
    writeln!(writer, "rankdir=\"RL\";")?;
    writeln!(writer, "edge [arrowhead=none]")?;
    for (depth, (symbol, children)) in frames.enumerate() {
        writeln!(
            writer,
            "frame_{depth} [label=\"{}\", shape=box]",
            escape(language.symbol_name(symbol))
        )?;
        if depth > 0 {
            writeln!(writer, "frame_{depth} -> frame_{} [style=dashed]", depth - 1)?;
        }
        for (index, child) in children.iter().enumerate() {
            let name = language.symbol_name(child.symbol());
            let label = match child.text() {
                Some(text) if !child.is_named() || text.is_empty() => escape(name),
                Some(text) => format!("{} {}", escape(name), escape(&format!("{text:?}"))),
                None if child.is_missing() => format!("MISSING {}", escape(name)),
                None => escape(name),
            };
            writeln!(writer, "frame_{depth}_{index} [label=\"{label}\"]")?;
            writeln!(writer, "frame_{depth} -> frame_{depth}_{index} [tooltip={index}]")?;
        }
    }
    writeln!(
        writer,
        "lookahead [label=\"lookahead: {}\", shape=plaintext]",
        escape(language.symbol_name(lookahead))
    )?;
    writeln!(writer, "}}")?;
    Ok(())
}
