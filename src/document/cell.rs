//! Identifier-bearing cells and the plain XML value tree they are built from.
//!
//! A [`Cell`] is an immutable value: two cells are equal when their markup is
//! structurally equal, regardless of the order attributes were declared in or
//! of whitespace between child elements. Equality is not identity: a cell that
//! keeps its `id` but changes any attribute is a different cell.

use crate::error::{Result, WhiteboardError};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Attribute holding a cell's stable identifier.
pub const ID_ATTRIBUTE: &str = "id";

/// A node in a parsed XML tree.
///
/// Whitespace-only text is never stored, so indentation does not affect equality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// Nested element
    Element(XmlElement),
    /// Trimmed, non-empty character data
    Text(String),
}

/// An XML element with attributes kept sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    /// Tag name
    pub name: String,
    /// Attributes by name; `BTreeMap` makes equality order-independent
    pub attributes: BTreeMap<String, String>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        XmlElement {
            name: name.into(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder-style child setter.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Look up an attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    fn feed_digest(&self, hasher: &mut Sha256) {
        hasher.update(b"<");
        hasher.update(self.name.as_bytes());
        for (key, value) in &self.attributes {
            hasher.update(b"\0");
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
        }
        hasher.update(b">");
        for child in &self.children {
            match child {
                XmlNode::Element(element) => element.feed_digest(hasher),
                XmlNode::Text(text) => {
                    hasher.update(b"\x01");
                    hasher.update(text.as_bytes());
                    hasher.update(b"\x01");
                }
            }
        }
        hasher.update(b"</>");
    }
}

/// One atomic, identifier-bearing unit of a whiteboard document.
///
/// Cloning is cheap: the element tree is shared behind an `Arc`.
///
/// # Examples
///
/// ```
/// use whiteboard_sync::document::{Cell, XmlElement};
///
/// let a = Cell::new(XmlElement::new("mxCell")
///     .with_attribute("id", "2")
///     .with_attribute("parent", "1")).unwrap();
/// let b = Cell::new(XmlElement::new("mxCell")
///     .with_attribute("parent", "1")
///     .with_attribute("id", "2")).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.id(), "2");
/// ```
#[derive(Clone)]
pub struct Cell {
    id: String,
    element: Arc<XmlElement>,
    digest: [u8; 32],
}

impl Cell {
    /// Wrap an element, extracting its identifier.
    ///
    /// # Errors
    ///
    /// [`WhiteboardError::MalformedElement`] if the element has no `id` attribute.
    pub fn new(element: XmlElement) -> Result<Self> {
        let id = element
            .attribute(ID_ATTRIBUTE)
            .ok_or_else(|| {
                WhiteboardError::MalformedElement(format!(
                    "<{}> without an '{}' attribute",
                    element.name, ID_ATTRIBUTE
                ))
            })?
            .to_string();

        let mut hasher = Sha256::new();
        element.feed_digest(&mut hasher);
        let digest = hasher.finalize().into();

        Ok(Cell {
            id,
            element: Arc::new(element),
            digest,
        })
    }

    /// The stable identifier assigned by the originating client.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The full element tree, used for re-serialization.
    #[inline]
    pub fn element(&self) -> &XmlElement {
        &self.element
    }

    /// Hex SHA-256 digest of the canonical (attribute-sorted) form.
    ///
    /// Equal cells always have equal hashes; use this when identifiers may
    /// collide across clients.
    pub fn content_hash(&self) -> String {
        hex::encode(self.digest)
    }
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.digest == other.digest && self.element == other.element
    }
}

impl Eq for Cell {}

impl Hash for Cell {
    // Identifiers are unique within a document, so hashing the id is enough
    // and stays consistent with `eq`.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cell")
            .field("id", &self.id)
            .field("attributes", &self.element.attributes)
            .field("children", &self.element.children.len())
            .finish()
    }
}
