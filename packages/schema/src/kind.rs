use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared property type
///
/// Unknown type tags are kept verbatim so they can be reported, and are
/// edited with the plain text control.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyKind {
    Text,
    Editor,
    Textarea,
    Select,
    Toggle,
    Icon,
    Image,
    ImageGallery,
    Link,
    Query,
    Class,
    Unknown(String),
}

impl PropertyKind {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyKind::Text => "text",
            PropertyKind::Editor => "editor",
            PropertyKind::Textarea => "textarea",
            PropertyKind::Select => "select",
            PropertyKind::Toggle => "toggle",
            PropertyKind::Icon => "icon",
            PropertyKind::Image => "image",
            PropertyKind::ImageGallery => "image-gallery",
            PropertyKind::Link => "link",
            PropertyKind::Query => "query",
            PropertyKind::Class => "class",
            PropertyKind::Unknown(tag) => tag,
        }
    }

    /// Stored as a single string; arrays are joined, objects summarized
    pub fn is_text_like(&self) -> bool {
        matches!(
            self,
            PropertyKind::Text | PropertyKind::Editor | PropertyKind::Textarea
        )
    }

    /// Arrays are kept as arrays
    pub fn accepts_array(&self) -> bool {
        matches!(self, PropertyKind::Class | PropertyKind::ImageGallery)
    }

    /// Objects are kept as objects
    pub fn accepts_object(&self) -> bool {
        matches!(
            self,
            PropertyKind::Image
                | PropertyKind::Icon
                | PropertyKind::Link
                | PropertyKind::Query
                | PropertyKind::ImageGallery
        )
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, PropertyKind::Unknown(_))
    }
}

impl From<&str> for PropertyKind {
    fn from(tag: &str) -> Self {
        match tag {
            "text" => PropertyKind::Text,
            "editor" => PropertyKind::Editor,
            "textarea" => PropertyKind::Textarea,
            "select" => PropertyKind::Select,
            "toggle" => PropertyKind::Toggle,
            "icon" => PropertyKind::Icon,
            "image" => PropertyKind::Image,
            "image-gallery" => PropertyKind::ImageGallery,
            "link" => PropertyKind::Link,
            "query" => PropertyKind::Query,
            "class" => PropertyKind::Class,
            other => PropertyKind::Unknown(other.to_string()),
        }
    }
}

impl From<String> for PropertyKind {
    fn from(tag: String) -> Self {
        PropertyKind::from(tag.as_str())
    }
}

impl From<PropertyKind> for String {
    fn from(kind: PropertyKind) -> Self {
        kind.as_str().to_string()
    }
}

impl Default for PropertyKind {
    fn default() -> Self {
        PropertyKind::Text
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
