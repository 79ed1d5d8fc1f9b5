//! Directive vocabularies and the attribute specs used to find them on elements.

/// URI of the TAL attribute vocabulary.
pub const TAL_NAMESPACE_URI: &str = "http://xml.zope.org/namespaces/tal";
/// URI of the METAL macro vocabulary.
pub const METAL_NAMESPACE_URI: &str = "http://xml.zope.org/namespaces/metal";

/// A vocabulary identified by prefix and/or URI.
///
/// Two namespaces are equal when both carry a URI and the URIs match. When
/// either side lacks a URI the prefixes are compared instead.
#[derive(Debug, Clone, Default)]
pub struct Namespace {
    prefix: Option<String>,
    uri: Option<String>,
}

impl Namespace {
    pub fn new(prefix: Option<&str>, uri: Option<&str>) -> Self {
        Self {
            prefix: prefix.map(str::to_string),
            uri: uri.map(str::to_string),
        }
    }

    pub fn tal() -> Self {
        Self::new(Some("tal"), Some(TAL_NAMESPACE_URI))
    }

    pub fn metal() -> Self {
        Self::new(Some("metal"), Some(METAL_NAMESPACE_URI))
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn uri(&self) -> Option<&str> {
        self.uri.as_deref()
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        match (&self.uri, &other.uri) {
            (Some(a), Some(b)) => a == b,
            _ => self.prefix == other.prefix,
        }
    }
}

/// A (namespace, local name) pair naming one directive attribute, such as `tal:repeat`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    pub namespace: Namespace,
    pub name: String,
}

impl AttributeSpec {
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for AttributeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.namespace.prefix() {
            Some(prefix) => write!(f, "{}:{}", prefix, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}
