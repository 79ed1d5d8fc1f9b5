//! Macro expansion, including `extend-macro` chains.

use super::slots::{SlotFillers, collect_fill_slots, fill_slots};
use super::{copy_macro_element, resolve_macro};
use crate::context::RenderingContext;
use crate::error::RenderError;
use itertools::Itertools;
use std::collections::HashSet;
use zpt_dom::{Document, NodeId};
use zpt_tales::MetalMacro;

/// The state of one expansion as it walks up an extension chain.
#[derive(Debug)]
pub struct MacroExpansionContext {
    /// Working copy of the macro currently being filled.
    pub current: NodeId,
    pub current_name: String,
    pub fillers: SlotFillers,
    chain: Vec<String>,
    visited: HashSet<String>,
}

impl MacroExpansionContext {
    fn new(current: NodeId, name: &str, fillers: SlotFillers) -> Self {
        Self {
            current,
            current_name: name.to_string(),
            fillers,
            chain: vec![name.to_string()],
            visited: HashSet::from([name.to_string()]),
        }
    }

    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    fn advance(&mut self, parent: &MetalMacro, copy: NodeId, max_depth: usize) -> Result<(), RenderError> {
        self.chain.push(parent.name.clone());
        if !self.visited.insert(parent.name.clone()) {
            return Err(RenderError::MacroChain {
                chain: self.chain.iter().join(" -> "),
                message: "extends itself".to_string(),
            });
        }
        if self.chain.len() > max_depth {
            return Err(RenderError::MacroChain {
                chain: self.chain.iter().join(" -> "),
                message: format!("is deeper than the limit of {}", max_depth),
            });
        }
        self.current = copy;
        self.current_name = parent.name.clone();
        Ok(())
    }
}

/// Expands `used` for the call site at `ctx`, returning a detached element
/// with every slot the call site and the extension chain provide filled in.
pub(crate) fn expand(doc: &mut Document, ctx: &RenderingContext, used: &MetalMacro) -> Result<NodeId, RenderError> {
    let settings = ctx.settings().clone();
    let specs = &settings.metal;
    let max_depth = settings.config.max_macro_depth;

    let fillers = collect_fill_slots(doc, ctx.node(), specs);
    let copy = copy_macro_element(doc, used.element, &settings);
    let mut expansion = MacroExpansionContext::new(copy, &used.name, fillers);
    fill_slots(doc, expansion.current, &mut expansion.fillers, specs);

    while let Some(expression) = doc
        .find_attribute(expansion.current, &specs.extend_macro)
        .map(|attr| attr.value.clone())
    {
        let Some(parent) = resolve_macro(doc, ctx, expansion.current, &specs.extend_macro, &expression)? else {
            break;
        };
        // An extension's fillers replace same-named ones from the call site. A
        // call site can still reach a slot the extension redefines with define-slot.
        expansion.fillers.extend(collect_fill_slots(doc, expansion.current, specs));
        let parent_copy = copy_macro_element(doc, parent.element, &settings);
        expansion.advance(&parent, parent_copy, max_depth)?;
        fill_slots(doc, expansion.current, &mut expansion.fillers, specs);
    }

    if !expansion.fillers.is_empty() {
        log::debug!(
            "Unused slot filler(s) for macro '{}': {}",
            used.name,
            expansion.fillers.keys().join(", ")
        );
    }
    log::debug!("Expanded macro chain {}", expansion.chain().iter().join(" -> "));
    Ok(expansion.current)
}
