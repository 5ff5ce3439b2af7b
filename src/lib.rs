//! A streaming, event-driven parser core for HTML and XML dialects.
//!
//! This crate recognizes markup structure — text, comments, CDATA sections,
//! the XML declaration, DOCTYPEs, processing instructions, and element tags
//! with their attributes — from an incrementally-read [`Read`](std::io::Read)
//! source, and reports each one to a [`MarkupHandler`] as a set of
//! `(offset, length, line, col)` partitions into a shared buffer. Everything
//! downstream of "what structure is this and where does it start/end" —
//! building a DOM, minifying, pretty-printing, selecting elements, decoding
//! entities, transcoding — is a handler's job, not this crate's.
//!
//! ```
//! use markup_events::{parse_str, handler::{MarkupHandler, HandlerResult}, ParseConfig};
//! use markup_events::buffer::{BufferView, Partition};
//! use markup_events::status::ParseStatus;
//!
//! struct PrintTags;
//! impl MarkupHandler for PrintTags {
//!     fn open_element_start(&mut self, _status: &mut ParseStatus, view: BufferView<'_>, name: Partition) -> HandlerResult {
//!         println!("<{}>", String::from_utf8_lossy(view.slice(name)));
//!         Ok(())
//!     }
//! }
//!
//! parse_str("<p>hi</p>", ParseConfig::html(), &mut PrintTags).unwrap();
//! ```
//!
//! # Module map
//!
//! - [`text`] — ASCII-case-insensitive byte comparison
//! - [`config`] — [`ParseConfig`] and its builder
//! - [`status`] — [`status::ParseStatus`], the handler-writable back-channel
//! - [`buffer`] — [`buffer::Buffer`], the sliding read buffer, and [`buffer::BufferView`]
//! - [`tokenizer`] — structure recognition
//! - [`registry`] — HTML element metadata
//! - [`stack`] — the open-element stack and auto-balancer
//! - [`core`] — [`Parser`], the driving loop
//! - [`handler`] — [`MarkupHandler`] and the handler-composition helpers
//! - [`errors`] — [`errors::Error`] and the crate [`errors::Result`] alias

pub mod buffer;
pub mod config;
pub mod core;
pub mod errors;
pub mod handler;
pub mod registry;
pub mod stack;
pub mod status;
pub mod text;
pub mod tokenizer;

pub use config::ParseConfig;
pub use core::{parse_slice, parse_str, Parser};
pub use errors::{Error, Result};
pub use handler::MarkupHandler;
