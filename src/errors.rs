//! Error and result types returned by this crate.
//!
//! One flat enum with a
//! variant per failure class, no `anyhow`/`thiserror` indirection, and a
//! crate-wide [`Result`] alias.

use std::fmt;
use std::io;

use crate::buffer::Position;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can be produced while parsing.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred while refilling the buffer from the source.
    Io(io::Error),

    /// An artifact start was recognized (`<!--`, `<![CDATA[`, `<!DOCTYPE`, a
    /// tag, ...) but input ended before it was terminated.
    ///
    /// Fatal in strict dialects; lenient HTML may instead reinterpret the
    /// prefix as text (see [`crate::config::ParseConfig`]).
    MalformedStructure {
        what: &'static str,
        at: Position,
    },

    /// A structure was encountered where the current dialect/strictness does
    /// not allow it, e.g. a top-level `</tag>` with an empty element stack
    /// under strict XML.
    UnexpectedStructure {
        what: &'static str,
        at: Position,
    },

    /// A configured invariant was violated, e.g. a duplicated attribute when
    /// [`crate::config::AttributeUniqueness::Require`] is set, or a DOCTYPE
    /// present when [`crate::config::Presence::Forbidden`] is configured.
    ConfigurationViolation {
        what: &'static str,
        at: Position,
    },

    /// An end-tag name did not match any name in the hierarchy of still-open
    /// elements, and [`crate::config::ParseConfig::no_unmatched_close_elements_required`]
    /// forbids unmatched close tags.
    UnmatchedCloseElement {
        name: Box<[u8]>,
        at: Position,
    },

    /// A [`crate::handler::MarkupHandler`] callback raised an error. Propagated
    /// unchanged; no further input is read afterwards.
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::MalformedStructure { what, at } => {
                write!(f, "malformed {} at {}:{}", what, at.line, at.col)
            }
            Error::UnexpectedStructure { what, at } => {
                write!(f, "unexpected {} at {}:{}", what, at.line, at.col)
            }
            Error::ConfigurationViolation { what, at } => {
                write!(f, "configuration violation ({}) at {}:{}", what, at.line, at.col)
            }
            Error::UnmatchedCloseElement { name, at } => write!(
                f,
                "unmatched close tag </{}> at {}:{}",
                String::from_utf8_lossy(name),
                at.line,
                at.col
            ),
            Error::Handler(e) => write!(f, "handler error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Handler(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}
