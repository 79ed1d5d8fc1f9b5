use crate::error::Location;
use std::fmt;
use std::sync::Arc;

/// A stable handle to a node inside a [`crate::Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A possibly-prefixed markup name such as `tal:block` or `div`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QualifiedName {
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => Self {
                prefix: Some(prefix.to_string()),
                local: local.to_string(),
            },
            _ => Self {
                prefix: None,
                local: raw.to_string(),
            },
        }
    }

    /// True for `xmlns` and `xmlns:*` declarations.
    pub fn is_namespace_declaration(&self) -> bool {
        self.prefix.as_deref() == Some("xmlns") || (self.prefix.is_none() && self.local == "xmlns")
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: QualifiedName::parse(name),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: QualifiedName,
    pub attributes: Vec<Attribute>,
    /// Start-tag position in the document the element was read from.
    pub position: Option<Location>,
    pub end_position: Option<Location>,
    /// Source name of the document this element was imported from, if any.
    pub imported_from: Option<Arc<str>>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: QualifiedName::parse(name),
            attributes: Vec::new(),
            position: None,
            end_position: None,
            imported_from: None,
        }
    }

    pub fn attribute(&self, raw_name: &str) -> Option<&str> {
        let wanted = QualifiedName::parse(raw_name);
        self.attributes
            .iter()
            .find(|a| a.name == wanted)
            .map(|a| a.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The document node; owns the prolog and the root element.
    Root,
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Declaration {
        version: String,
        encoding: Option<String>,
        standalone: Option<String>,
    },
    DocType(String),
}
