use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

use quick_xml::escape::escape;
use serde::Serialize;

/// One element of an API document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct XmlNode {
    /// Element tag name.
    pub tag: String,
    /// XML attributes keyed by name.
    pub attributes: BTreeMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<XmlNode>,
    /// Trimmed text content, `None` when the element carries no text.
    pub text: Option<String>,
}

impl XmlNode {
    /// Create an element with no attributes, children, or text.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Create a leaf element holding `text`.
    pub fn leaf(tag: impl Into<String>, text: impl Into<String>) -> Self {
        let mut node = Self::new(tag);
        node.text = Some(text.into());
        node
    }

    /// Return the first child with the provided tag.
    pub fn get_child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Return all children with the provided tag.
    pub fn get_children(&self, tag: &str) -> Vec<&XmlNode> {
        self.children
            .iter()
            .filter(|child| child.tag == tag)
            .collect()
    }

    /// Walk a nested child path and return the terminal text if found.
    pub fn get_text<'a>(&'a self, path: &[&str]) -> Option<&'a str> {
        let mut current = self;
        for segment in path {
            current = current.get_child(segment)?;
        }
        current.text.as_deref()
    }

    /// True when the element has neither children nor text.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.text.is_none()
    }
}

/// Compact XML with escaped text and attribute values.
impl Display for XmlNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag)?;
        for (key, value) in &self.attributes {
            write!(f, " {key}=\"{}\"", escape(value.as_str()))?;
        }
        if self.is_empty() {
            return write!(f, "/>");
        }
        write!(f, ">")?;
        if let Some(text) = &self.text {
            write!(f, "{}", escape(text.as_str()))?;
        }
        for child in &self.children {
            write!(f, "{child}")?;
        }
        write!(f, "</{}>", self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::XmlNode;

    #[test]
    fn get_text_walks_nested_path() {
        let mut rule = XmlNode::new("firewallRule");
        let mut source = XmlNode::new("source");
        source.children.push(XmlNode::leaf("groupingObjectId", "ipset-3"));
        rule.children.push(source);

        assert_eq!(
            rule.get_text(&["source", "groupingObjectId"]),
            Some("ipset-3")
        );
        assert_eq!(rule.get_text(&["destination", "groupingObjectId"]), None);
    }

    #[test]
    fn display_collapses_empty_elements() {
        let mut rule = XmlNode::new("firewallRule");
        rule.children.push(XmlNode::leaf("name", "allow-web"));
        rule.children.push(XmlNode::new("source"));

        assert_eq!(
            rule.to_string(),
            "<firewallRule><name>allow-web</name><source/></firewallRule>"
        );
    }

    #[test]
    fn display_escapes_text_and_attributes() {
        let mut node = XmlNode::leaf("description", "web & <db> access");
        node.attributes
            .insert("note".to_string(), "a \"quoted\" & value".to_string());
        assert_eq!(
            node.to_string(),
            "<description note=\"a &quot;quoted&quot; &amp; value\">web &amp; &lt;db&gt; access</description>"
        );
    }
}
