//! Error types for configuration and diagnostic output.
//!
//! Parse abstention (timeout, cancellation, no language) is not an error:
//! [`Parser::parse`](crate::Parser::parse) reports it as `None`.

use thiserror::Error;

use crate::language::{LANGUAGE_VERSION, MIN_COMPATIBLE_LANGUAGE_VERSION};

/// Errors surfaced by configuration setters and debug-graph output.
#[derive(Debug, Error)]
pub enum Error {
    /// The grammar was compiled for an engine version this build cannot drive.
    #[error(
        "incompatible language version {version}, expected between {} and {}",
        MIN_COMPATIBLE_LANGUAGE_VERSION,
        LANGUAGE_VERSION
    )]
    IncompatibleLanguage { version: u32 },

    /// Included ranges overlap, descend, or are inverted.
    #[error("invalid included ranges: range {index} is malformed or overlaps its predecessor")]
    InvalidIncludedRanges { index: usize },

    /// Unknown text encoding name.
    #[error("unsupported input encoding: {0}")]
    InvalidEncoding(String),

    /// IO error while writing a debug graph.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
