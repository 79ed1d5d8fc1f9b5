//! Post-render removal of directive markup.

use crate::config::NamespaceRegistry;
use zpt_dom::{Document, NodeId};

/// Strips TAL and METAL attributes and namespace declarations, and unwraps
/// elements that are themselves in either namespace (such as `<tal:block>`).
///
/// Everything to remove is located before anything is changed, so prefixes
/// still resolve against the declarations being removed.
pub(crate) fn remove_directives(doc: &mut Document, root: NodeId, namespaces: &NamespaceRegistry) {
    let vocabularies = [namespaces.tal(), namespaces.metal()];
    let elements: Vec<NodeId> = std::iter::once(root)
        .chain(doc.descendants(root))
        .filter(|&node| doc.is_element(node))
        .collect();

    let mut doomed_attributes = Vec::new();
    let mut omitted = Vec::new();
    for &node in &elements {
        let names: Vec<String> = doc
            .attributes(node)
            .iter()
            .filter(|attr| vocabularies.iter().any(|ns| doc.attribute_in_namespace(node, attr, ns)))
            .map(|attr| attr.name.to_string())
            .collect();
        if !names.is_empty() {
            doomed_attributes.push((node, names));
        }
        if vocabularies.iter().any(|ns| doc.is_in_namespace(node, ns)) {
            omitted.push(node);
        }
    }

    for (node, names) in doomed_attributes {
        for name in names {
            doc.remove_attribute(node, &name);
        }
    }
    for node in omitted {
        if doc.parent(node).is_some() && doc.omit(node).is_err() {
            log::warn!("Could not unwrap directive element {}", node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directives_with_custom_prefixes() {
        let mut doc = Document::parse(
            "<html xmlns:t=\"http://xml.zope.org/namespaces/tal\" xmlns:m=\"http://xml.zope.org/namespaces/metal\" lang=\"en\">\
             <t:block t:condition=\"x\"><p t:content=\"y\" class=\"c\">a</p></t:block>\
             <div m:define-macro=\"d\">b</div></html>",
        )
        .unwrap();
        let root = doc.root();
        remove_directives(&mut doc, root, &NamespaceRegistry::default());
        assert_eq!(
            doc.to_xml_string(),
            "<html lang=\"en\"><p class=\"c\">a</p><div>b</div></html>"
        );
    }
}
