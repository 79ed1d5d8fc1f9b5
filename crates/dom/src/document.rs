//! The arena that owns every node of a markup tree.
//!
//! Nodes are never freed while the document lives; removing a node only
//! detaches it from its parent. Handles therefore stay valid across the
//! clone-and-insert mutations performed while rendering.

use crate::error::DomError;
use crate::namespace::{AttributeSpec, Namespace};
use crate::node::{Attribute, Element, NodeId, NodeKind, QualifiedName};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    source_name: Option<Arc<str>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document containing only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            source_name: None,
        }
    }

    /// The document node. Its children are the prolog and the root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_element(&self) -> Option<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn set_source_name(&mut self, name: impl Into<Arc<str>>) {
        self.source_name = Some(name.into());
    }

    pub(crate) fn source_name_arc(&self) -> Option<Arc<str>> {
        self.source_name.clone()
    }

    // --- Node access ---

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(e) => Some(e),
            _ => None,
        }
    }

    fn element_mut_or_err(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        self.element_mut(id).ok_or(DomError::NotAnElement(id))
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Element(_))
    }

    /// The qualified element name, e.g. `tal:block`.
    pub fn name(&self, id: NodeId) -> Option<&QualifiedName> {
        self.element(id).map(|e| &e.name)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|&p| self.is_element(p))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// All descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// True when the node can be reached from the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// Concatenated text of the node and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in std::iter::once(id).chain(self.descendants(id)) {
            match self.kind(node) {
                NodeKind::Text(t) | NodeKind::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    // --- Node construction ---

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Creates a detached node of any kind.
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.push(kind)
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeKind::Element(Element::new(name)))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    // --- Tree mutation ---

    /// Removes the node from its parent's child list. The node stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn remove(&mut self, id: NodeId) {
        self.detach(id);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    fn position_in_parent(&self, id: NodeId) -> Result<(NodeId, usize), DomError> {
        let parent = self.parent(id).ok_or(DomError::Detached(id))?;
        let index = self.nodes[parent.0]
            .children
            .iter()
            .position(|&c| c == id)
            .ok_or(DomError::Detached(id))?;
        Ok((parent, index))
    }

    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) -> Result<(), DomError> {
        self.detach(new);
        let (parent, index) = self.position_in_parent(reference)?;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, new);
        Ok(())
    }

    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) -> Result<(), DomError> {
        self.detach(new);
        let (parent, index) = self.position_in_parent(reference)?;
        self.nodes[new.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index + 1, new);
        Ok(())
    }

    /// Puts `replacements` where `old` was, in order, and detaches `old`.
    pub fn replace(&mut self, old: NodeId, replacements: &[NodeId]) -> Result<(), DomError> {
        for &node in replacements {
            self.insert_before(old, node)?;
        }
        self.detach(old);
        Ok(())
    }

    /// Strips the element's tag, promoting its children into its place.
    /// Returns the promoted children.
    pub fn omit(&mut self, id: NodeId) -> Result<Vec<NodeId>, DomError> {
        let children = self.nodes[id.0].children.clone();
        self.replace(id, &children)?;
        Ok(children)
    }

    pub fn clear_children(&mut self, id: NodeId) {
        for child in std::mem::take(&mut self.nodes[id.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    pub fn replace_children(&mut self, id: NodeId, children: &[NodeId]) {
        self.clear_children(id);
        for &child in children {
            self.append_child(id, child);
        }
    }

    /// Deep-copies a subtree inside this arena. The copy is detached.
    pub fn deep_copy(&mut self, id: NodeId) -> NodeId {
        let kind = self.nodes[id.0].kind.clone();
        let copy = self.push(kind);
        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_copy = self.deep_copy(child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    /// Deep-copies a subtree of another document into this arena, marking the
    /// top element as imported from that document's source.
    pub fn import_subtree(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.import_node(other, id);
        if let Some(origin) = other.source_name_arc()
            && let Some(element) = self.element_mut(copy)
        {
            element.imported_from = Some(origin);
        }
        copy
    }

    fn import_node(&mut self, other: &Document, id: NodeId) -> NodeId {
        let copy = self.push(other.kind(id).clone());
        for &child in other.children(id) {
            let child_copy = self.import_node(other, child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    // --- Plain attribute access ---

    pub fn attribute(&self, id: NodeId, raw_name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attribute(raw_name))
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.element(id).map(|e| e.attributes.as_slice()).unwrap_or(&[])
    }

    pub fn set_attribute(&mut self, id: NodeId, raw_name: &str, value: &str) -> Result<(), DomError> {
        let element = self.element_mut_or_err(id)?;
        let wanted = QualifiedName::parse(raw_name);
        match element.attributes.iter_mut().find(|a| a.name == wanted) {
            Some(existing) => existing.value = value.to_string(),
            None => element.attributes.push(Attribute {
                name: wanted,
                value: value.to_string(),
            }),
        }
        Ok(())
    }

    pub fn remove_attribute(&mut self, id: NodeId, raw_name: &str) -> Option<Attribute> {
        let wanted = QualifiedName::parse(raw_name);
        let element = self.element_mut(id)?;
        let index = element.attributes.iter().position(|a| a.name == wanted)?;
        Some(element.attributes.remove(index))
    }

    // --- Namespace-aware lookup ---

    /// Resolves a prefix (or the default namespace for `None`) to the URI
    /// declared on the element or its nearest declaring ancestor.
    pub fn lookup_namespace_uri(&self, id: NodeId, prefix: Option<&str>) -> Option<String> {
        let declaration = match prefix {
            Some(p) => QualifiedName {
                prefix: Some("xmlns".to_string()),
                local: p.to_string(),
            },
            None => QualifiedName {
                prefix: None,
                local: "xmlns".to_string(),
            },
        };
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(element) = self.element(node)
                && let Some(attr) = element.attributes.iter().find(|a| a.name == declaration)
            {
                return Some(attr.value.clone());
            }
            current = self.parent(node);
        }
        None
    }

    /// The namespace an element's own name belongs to.
    pub fn element_namespace(&self, id: NodeId) -> Option<Namespace> {
        let element = self.element(id)?;
        let prefix = element.name.prefix.as_deref();
        let uri = self.lookup_namespace_uri(id, prefix);
        Some(Namespace::new(prefix, uri.as_deref()))
    }

    pub fn is_in_namespace(&self, id: NodeId, namespace: &Namespace) -> bool {
        self.element_namespace(id).is_some_and(|ns| &ns == namespace)
    }

    /// True when `attr`, carried by element `id`, is the attribute named by `spec`.
    ///
    /// Unprefixed attributes match when the element itself lives in the
    /// spec's namespace, which covers `<tal:block content="...">`.
    pub fn attribute_matches(&self, id: NodeId, attr: &Attribute, spec: &AttributeSpec) -> bool {
        if attr.name.local != spec.name || attr.name.is_namespace_declaration() {
            return false;
        }
        match attr.name.prefix.as_deref() {
            Some(prefix) => {
                let uri = self.lookup_namespace_uri(id, Some(prefix));
                Namespace::new(Some(prefix), uri.as_deref()) == spec.namespace
            }
            None => self.is_in_namespace(id, &spec.namespace),
        }
    }

    pub fn find_attribute(&self, id: NodeId, spec: &AttributeSpec) -> Option<&Attribute> {
        self.attributes(id)
            .iter()
            .find(|a| self.attribute_matches(id, a, spec))
    }

    pub fn has_attribute(&self, id: NodeId, spec: &AttributeSpec) -> bool {
        self.find_attribute(id, spec).is_some()
    }

    /// Sets the attribute named by `spec`, reusing the prefix of an existing
    /// match or falling back to the spec's own prefix.
    pub fn set_attribute_by_spec(
        &mut self,
        id: NodeId,
        spec: &AttributeSpec,
        value: &str,
    ) -> Result<(), DomError> {
        if let Some(index) = self.matching_index(id, spec) {
            self.element_mut_or_err(id)?.attributes[index].value = value.to_string();
            return Ok(());
        }
        let name = QualifiedName {
            prefix: spec.namespace.prefix().map(str::to_string),
            local: spec.name.clone(),
        };
        self.element_mut_or_err(id)?.attributes.push(Attribute {
            name,
            value: value.to_string(),
        });
        Ok(())
    }

    pub fn remove_attribute_by_spec(&mut self, id: NodeId, spec: &AttributeSpec) -> Option<Attribute> {
        let index = self.matching_index(id, spec)?;
        self.element_mut(id).map(|e| e.attributes.remove(index))
    }

    fn matching_index(&self, id: NodeId, spec: &AttributeSpec) -> Option<usize> {
        self.attributes(id)
            .iter()
            .position(|a| self.attribute_matches(id, a, spec))
    }

    /// Namespace declarations in scope at `id`, nearest first. The default
    /// namespace is reported with a `None` prefix.
    pub fn in_scope_namespaces(&self, id: NodeId) -> Vec<(Option<String>, String)> {
        let mut seen: Vec<(Option<String>, String)> = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            for attr in self.attributes(node) {
                let prefix = match (&attr.name.prefix, attr.name.local.as_str()) {
                    (Some(p), local) if p == "xmlns" => Some(local.to_string()),
                    (None, "xmlns") => None,
                    _ => continue,
                };
                if !seen.iter().any(|(p, _)| *p == prefix) {
                    seen.push((prefix, attr.value.clone()));
                }
            }
            current = self.parent(node);
        }
        seen
    }

    /// True when `attr` belongs to `namespace`, counting an `xmlns:` declaration
    /// of that namespace as part of it.
    pub fn attribute_in_namespace(&self, id: NodeId, attr: &Attribute, namespace: &Namespace) -> bool {
        if attr.name.prefix.as_deref() == Some("xmlns") {
            let declared = Namespace::new(Some(&attr.name.local), Some(&attr.value));
            return declared == *namespace;
        }
        match attr.name.prefix.as_deref() {
            Some(prefix) => {
                let uri = self.lookup_namespace_uri(id, Some(prefix));
                Namespace::new(Some(prefix), uri.as_deref()) == *namespace
            }
            None => !attr.name.is_namespace_declaration() && self.is_in_namespace(id, namespace),
        }
    }
}
