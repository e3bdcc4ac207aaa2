//! XML document primitives for the vShield Manager REST API.
//!
//! The manager speaks XML on every endpoint. This crate parses response bodies
//! into a generic [`XmlNode`] tree, writes request bodies back out, and maps
//! trees to and from `serde_json::Value` so callers can work with loosely typed
//! documents instead of walking elements by hand.

pub mod document;
pub mod parser;
pub mod tree;
pub mod writer;

pub use document::{from_value, to_value, DocumentError};
pub use parser::{parse, parse_file, ParseError};
pub use tree::XmlNode;
pub use writer::{write, write_file, write_pretty, WriteError};
