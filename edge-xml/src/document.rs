//! Conversion between XML trees and loosely typed JSON-style documents.
//!
//! The manager API has no schema-level notion of a list: a collection with one
//! member is indistinguishable from a single nested element. [`to_value`]
//! therefore yields a bare object for a lone element and an array only when a
//! tag repeats among siblings. Callers that expect a sequence must coerce the
//! singular case themselves.

use serde_json::map::Entry;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tree::XmlNode;

/// Errors raised when a document cannot be expressed as XML.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document is not an object with exactly one key naming the root element.
    #[error("document must be an object with a single root key, found {0}")]
    NoRoot(String),
}

/// Convert an element tree into a document keyed by the root tag.
///
/// Leaf elements become strings (empty leaves become `null`), elements with
/// children become objects, and repeated sibling tags collapse into arrays in
/// document order. Attributes are not carried over.
pub fn to_value(root: &XmlNode) -> Value {
    let mut doc = Map::new();
    doc.insert(root.tag.clone(), element_value(root));
    Value::Object(doc)
}

/// Convert a document with a single root key back into an element tree.
///
/// Arrays expand into repeated sibling elements, `null` members are omitted,
/// and scalar values are written as text.
pub fn from_value(doc: &Value) -> Result<XmlNode, DocumentError> {
    let Value::Object(map) = doc else {
        return Err(DocumentError::NoRoot(kind_name(doc).to_string()));
    };
    let mut entries = map.iter();
    let (Some((tag, value)), None) = (entries.next(), entries.next()) else {
        return Err(DocumentError::NoRoot(format!("{} keys", map.len())));
    };
    if value.is_array() {
        return Err(DocumentError::NoRoot("array root".to_string()));
    }
    let mut root = XmlNode::new(tag.as_str());
    fill(&mut root, value);
    Ok(root)
}

fn element_value(node: &XmlNode) -> Value {
    if node.children.is_empty() {
        return node
            .text
            .as_ref()
            .map_or(Value::Null, |text| Value::String(text.clone()));
    }

    let mut map = Map::new();
    for child in &node.children {
        let value = element_value(child);
        match map.entry(child.tag.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                Value::Array(items) => items.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
        }
    }
    Value::Object(map)
}

fn fill(node: &mut XmlNode, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(b) => node.text = Some(b.to_string()),
        Value::Number(n) => node.text = Some(n.to_string()),
        Value::String(s) => node.text = Some(s.clone()),
        Value::Object(map) => {
            for (tag, member) in map {
                push_members(node, tag, member);
            }
        }
        Value::Array(items) => {
            // Only reachable for a nested array inside an array; flatten it.
            for item in items {
                fill(node, item);
            }
        }
    }
}

fn push_members(parent: &mut XmlNode, tag: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items {
                push_members(parent, tag, item);
            }
        }
        other => {
            let mut child = XmlNode::new(tag);
            fill(&mut child, other);
            parent.children.push(child);
        }
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
