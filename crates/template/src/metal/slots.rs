//! Slot collection and filling.

use crate::specs::MetalSpecs;
use std::collections::BTreeMap;
use zpt_dom::{Document, NodeId};

/// A `fill-slot` element waiting to be copied into a macro.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: String,
    pub element: NodeId,
}

pub type SlotFillers = BTreeMap<String, Slot>;

/// Collects the `fill-slot` descendants of `root`, keyed by slot name.
///
/// Fillers inside a nested `use-macro` belong to that inner call and are
/// skipped. Within one call site the first filler for a name wins.
pub(crate) fn collect_fill_slots(doc: &Document, root: NodeId, specs: &MetalSpecs) -> SlotFillers {
    let mut fillers = SlotFillers::new();
    collect_into(doc, root, specs, &mut fillers);
    fillers
}

fn collect_into(doc: &Document, node: NodeId, specs: &MetalSpecs, fillers: &mut SlotFillers) {
    for child in doc.child_elements(node) {
        if let Some(name) = doc.find_attribute(child, &specs.fill_slot).map(|a| a.value.trim().to_string()) {
            fillers.entry(name.clone()).or_insert(Slot { name, element: child });
        }
        if !doc.has_attribute(child, &specs.use_macro) {
            collect_into(doc, child, specs, fillers);
        }
    }
}

/// Replaces each `define-slot` below `root` that has a filler with a copy of
/// that filler, consuming the filler. Returns how many slots were filled.
pub(crate) fn fill_slots(doc: &mut Document, root: NodeId, fillers: &mut SlotFillers, specs: &MetalSpecs) -> usize {
    let mut filled = 0;
    fill_below(doc, root, fillers, specs, &mut filled);
    filled
}

fn fill_below(doc: &mut Document, node: NodeId, fillers: &mut SlotFillers, specs: &MetalSpecs, filled: &mut usize) {
    for child in doc.child_elements(node) {
        let slot_name = doc
            .find_attribute(child, &specs.define_slot)
            .map(|a| a.value.trim().to_string());
        match slot_name.and_then(|name| fillers.remove(&name)) {
            Some(filler) => {
                fill_one(doc, child, &filler, specs);
                *filled += 1;
            }
            None => fill_below(doc, child, fillers, specs, filled),
        }
    }
}

fn fill_one(doc: &mut Document, slot: NodeId, filler: &Slot, specs: &MetalSpecs) {
    let replacement = doc.deep_copy(filler.element);
    // Inserted first so the copy resolves prefixes against the slot's ancestors.
    if doc.insert_before(slot, replacement).is_err() {
        return;
    }
    doc.remove_attribute_by_spec(replacement, &specs.fill_slot);
    if let Some(own_fill) = doc.find_attribute(slot, &specs.fill_slot).cloned() {
        let name = own_fill.name.to_string();
        if doc.set_attribute(replacement, &name, &own_fill.value).is_err() {
            log::warn!("Could not carry {} onto filled slot '{}'", name, filler.name);
        }
    }
    doc.remove(slot);
    log::debug!("Filled slot '{}'", filler.name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use zpt_dom::Namespace;

    const METAL: &str = "xmlns:metal=\"http://xml.zope.org/namespaces/metal\"";

    fn specs() -> MetalSpecs {
        MetalSpecs::new(&Namespace::metal())
    }

    #[test]
    fn collects_fillers_outside_nested_calls() {
        let doc = Document::parse(&format!(
            "<r {METAL}><a metal:fill-slot=\"title\"/><b metal:use-macro=\"m\"><c metal:fill-slot=\"inner\"/></b>\
             <d metal:fill-slot=\"title\"/></r>"
        ))
        .unwrap();
        let fillers = collect_fill_slots(&doc, doc.root_element().unwrap(), &specs());
        assert_eq!(fillers.keys().collect::<Vec<_>>(), vec!["title"]);
        let first = doc.child_elements(doc.root_element().unwrap())[0];
        assert_eq!(fillers["title"].element, first);
    }

    #[test]
    fn fills_matching_slots_once() {
        let mut doc = Document::parse(&format!(
            "<r {METAL}><use><h1 metal:fill-slot=\"title\">Mine</h1></use>\
             <m><div metal:define-slot=\"title\">Default <i metal:define-slot=\"nested\"/></div>\
             <p metal:define-slot=\"body\">Body</p></m></r>"
        ))
        .unwrap();
        let children = doc.child_elements(doc.root_element().unwrap());
        let (using, macro_root) = (children[0], children[1]);
        let mut fillers = collect_fill_slots(&doc, using, &specs());
        let filled = fill_slots(&mut doc, macro_root, &mut fillers, &specs());
        assert_eq!(filled, 1);
        assert!(fillers.is_empty());
        let xml = doc.node_to_string(macro_root);
        assert_eq!(xml, "<m><h1>Mine</h1><p metal:define-slot=\"body\">Body</p></m>");
    }

    #[test]
    fn carries_slot_fill_attribute_onto_replacement() {
        let mut doc = Document::parse(&format!(
            "<r {METAL}><use><b metal:fill-slot=\"s\">new</b></use>\
             <m><i metal:define-slot=\"s\" metal:fill-slot=\"outer\">old</i></m></r>"
        ))
        .unwrap();
        let children = doc.child_elements(doc.root_element().unwrap());
        let mut fillers = collect_fill_slots(&doc, children[0], &specs());
        fill_slots(&mut doc, children[1], &mut fillers, &specs());
        assert_eq!(doc.node_to_string(children[1]), "<m><b metal:fill-slot=\"outer\">new</b></m>");
    }
}
