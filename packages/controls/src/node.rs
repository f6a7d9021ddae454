use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Node of a rendered control tree
///
/// Hosts map elements onto their own toolkit widgets. Attribute and style
/// maps are ordered so two renders of the same state compare equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlNode {
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attributes: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        styles: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<ControlNode>,
        #[serde(skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },

    Text { content: String },

    /// Trusted markup, e.g. server-rendered preview or icon glyphs
    Markup { html: String },

    /// Inline error box replacing a failed control or preview region
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<String>,
    },
}

impl ControlNode {
    pub fn element(tag: impl Into<String>) -> Self {
        ControlNode::Element {
            tag: tag.into(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            children: Vec::new(),
            key: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        ControlNode::Text {
            content: content.into(),
        }
    }

    pub fn markup(html: impl Into<String>) -> Self {
        ControlNode::Markup { html: html.into() }
    }

    pub fn error(message: impl Into<String>, scope: Option<String>) -> Self {
        ControlNode::Error {
            message: message.into(),
            scope,
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let ControlNode::Element {
            ref mut attributes, ..
        } = self
        {
            attributes.insert(key.into(), value.into());
        }
        self
    }

    /// Set a boolean attribute only when `on`
    pub fn with_flag(self, key: impl Into<String>, on: bool) -> Self {
        if on {
            self.with_attr(key, "true")
        } else {
            self
        }
    }

    pub fn with_style(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let ControlNode::Element { ref mut styles, .. } = self {
            styles.insert(key.into(), value.into());
        }
        self
    }

    pub fn with_child(mut self, child: ControlNode) -> Self {
        if let ControlNode::Element {
            ref mut children, ..
        } = self
        {
            children.push(child);
        }
        self
    }

    pub fn with_children(mut self, new_children: impl IntoIterator<Item = ControlNode>) -> Self {
        if let ControlNode::Element {
            ref mut children, ..
        } = self
        {
            children.extend(new_children);
        }
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        if let ControlNode::Element {
            key: ref mut node_key,
            ..
        } = self
        {
            *node_key = Some(key.into());
        }
        self
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            ControlNode::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        match self {
            ControlNode::Element { attributes, .. } => attributes.get(key).map(String::as_str),
            _ => None,
        }
    }

    pub fn children(&self) -> &[ControlNode] {
        match self {
            ControlNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            ControlNode::Element { key, .. } => key.as_deref(),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ControlNode::Error { .. })
    }

    /// Depth-first walk including `self`
    pub fn descendants(&self) -> Vec<&ControlNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            for child in node.children().iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// First node in the tree with the given key
    pub fn find_key(&self, key: &str) -> Option<&ControlNode> {
        self.descendants().into_iter().find(|node| node.key() == Some(key))
    }

    pub fn find_attr(&self, name: &str, value: &str) -> Option<&ControlNode> {
        self.descendants()
            .into_iter()
            .find(|node| node.attr(name) == Some(value))
    }

    pub fn contains_error(&self) -> bool {
        self.descendants().iter().any(|node| node.is_error())
    }

    /// Concatenated text content of the subtree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for node in self.descendants() {
            match node {
                ControlNode::Text { content } => out.push_str(content),
                ControlNode::Error { message, .. } => out.push_str(message),
                _ => {}
            }
        }
        out
    }

    /// Indented outline, one node per line
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, 0);
        out
    }

    fn write_outline(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            ControlNode::Element {
                tag,
                attributes,
                children,
                key,
                ..
            } => {
                let _ = write!(out, "{}<{}", indent, tag);
                if let Some(key) = key {
                    let _ = write!(out, " #{}", key);
                }
                for (name, value) in attributes {
                    let _ = write!(out, " {}=\"{}\"", name, value);
                }
                out.push_str(">\n");
                for child in children {
                    child.write_outline(out, depth + 1);
                }
            }
            ControlNode::Text { content } => {
                let _ = writeln!(out, "{}\"{}\"", indent, content);
            }
            ControlNode::Markup { html } => {
                let _ = writeln!(out, "{}[markup {} bytes]", indent, html.len());
            }
            ControlNode::Error { message, scope } => match scope {
                Some(scope) => {
                    let _ = writeln!(out, "{}!! {} ({})", indent, message, scope);
                }
                None => {
                    let _ = writeln!(out, "{}!! {}", indent, message);
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_ignores_non_elements() {
        let text = ControlNode::text("hi").with_attr("a", "b").with_child(ControlNode::text("x"));
        assert_eq!(text, ControlNode::text("hi"));
    }

    #[test]
    fn test_find_and_text_content() {
        let tree = ControlNode::element("div")
            .with_key("root")
            .with_child(
                ControlNode::element("label")
                    .with_attr("data-field", "title")
                    .with_child(ControlNode::text("Title")),
            )
            .with_child(ControlNode::element("span").with_child(ControlNode::text("!")));

        assert_eq!(tree.find_attr("data-field", "title").and_then(|n| n.tag()), Some("label"));
        assert_eq!(tree.text_content(), "Title!");
        assert!(tree.find_key("root").is_some());
        assert!(!tree.contains_error());
    }

    #[test]
    fn test_serialized_shape_is_tagged() {
        let node = ControlNode::error("Could not load control", Some("title".to_string()));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "Error");
        assert_eq!(json["scope"], "title");
    }

    #[test]
    fn test_outline_lists_nodes() {
        let tree = ControlNode::element("div")
            .with_attr("class", "x")
            .with_child(ControlNode::text("a"));
        assert_eq!(tree.outline(), "<div class=\"x\">\n  \"a\"\n");
    }
}
