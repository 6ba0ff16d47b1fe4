//! Input sources
//!
//! The engine pulls text through the [`Input`] trait: either one fixed buffer
//! ([`StrInput`]) or a caller callback handing out successive chunks
//! ([`FnInput`]). Each input declares the [`InputEncoding`] its bytes use; all
//! tree coordinates are expressed in bytes of that encoding.

use std::fmt;
use std::str::FromStr;

use crate::base::Point;
use crate::error::Error;

/// Text encoding of the bytes an [`Input`] produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InputEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl InputEncoding {
    /// Bytes per code unit
    pub fn code_unit_size(self) -> usize {
        match self {
            Self::Utf8 => 1,
            Self::Utf16Le | Self::Utf16Be => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
        }
    }
}

impl fmt::Display for InputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputEncoding {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            // Unmarked UTF-16 means little-endian.
            "utf16" | "utf-16" | "utf16le" | "utf-16le" => Ok(Self::Utf16Le),
            "utf16be" | "utf-16be" => Ok(Self::Utf16Be),
            _ => Err(Error::InvalidEncoding(name.to_string())),
        }
    }
}

/// A source of document text.
///
/// `read` returns the text starting at `byte_offset` (which lies at
/// `position`); an empty slice signals the end of the document. Within one
/// parse, repeated reads at the same offset must agree.
pub trait Input {
    fn encoding(&self) -> InputEncoding {
        InputEncoding::Utf8
    }

    fn read(&mut self, byte_offset: usize, position: Point) -> &[u8];
}

/// One immutable in-memory buffer.
#[derive(Debug, Clone, Copy)]
pub struct StrInput<'a> {
    bytes: &'a [u8],
    encoding: InputEncoding,
}

impl<'a> StrInput<'a> {
    pub fn new(text: &'a str) -> Self {
        Self::with_encoding(text.as_bytes(), InputEncoding::Utf8)
    }

    pub fn with_encoding(bytes: &'a [u8], encoding: InputEncoding) -> Self {
        Self { bytes, encoding }
    }
}

impl Input for StrInput<'_> {
    fn encoding(&self) -> InputEncoding {
        self.encoding
    }

    fn read(&mut self, byte_offset: usize, _position: Point) -> &[u8] {
        self.bytes.get(byte_offset..).unwrap_or(&[])
    }
}

/// Chunks produced on demand by a caller callback.
pub struct FnInput<F, T> {
    callback: F,
    encoding: InputEncoding,
    chunk: Option<T>,
}

impl<F, T> FnInput<F, T>
where
    F: FnMut(usize, Point) -> T,
    T: AsRef<[u8]>,
{
    pub fn new(callback: F) -> Self {
        Self::with_encoding(callback, InputEncoding::Utf8)
    }

    pub fn with_encoding(callback: F, encoding: InputEncoding) -> Self {
        Self {
            callback,
            encoding,
            chunk: None,
        }
    }
}

impl<F, T> Input for FnInput<F, T>
where
    F: FnMut(usize, Point) -> T,
    T: AsRef<[u8]>,
{
    fn encoding(&self) -> InputEncoding {
        self.encoding
    }

    fn read(&mut self, byte_offset: usize, position: Point) -> &[u8] {
        let chunk = self.chunk.insert((self.callback)(byte_offset, position));
        T::as_ref(chunk)
    }
}
