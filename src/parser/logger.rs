//! Caller-supplied parse trace sink.

use std::fmt;

/// Which stage of the parse produced a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogType {
    Parse,
    Lex,
}

impl LogType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Parse => "parse",
            Self::Lex => "lex",
        }
    }
}

/// Receives one human-readable line per lexer or parser action.
///
/// Installing a logger never changes the resulting tree.
pub type Logger = Box<dyn FnMut(LogType, &str) + Send>;

/// Borrowed logger for the duration of one parse. Lines are only formatted
/// when a logger is installed.
pub(crate) struct LogSink<'a>(Option<&'a mut Logger>);

impl<'a> LogSink<'a> {
    pub(crate) fn new(logger: Option<&'a mut Logger>) -> Self {
        Self(logger)
    }

    pub(crate) fn log(&mut self, log_type: LogType, args: fmt::Arguments<'_>) {
        if let Some(logger) = self.0.as_deref_mut() {
            let line = args.to_string();
            (**logger)(log_type, &line);
        }
    }
}
