//! METAL: macro discovery, `use-macro` expansion and slot filling.

mod expander;
mod slots;

pub use expander::MacroExpansionContext;
pub use slots::{Slot, SlotFillers};

use crate::config::NamespaceRegistry;
use crate::context::{DocumentSettings, RenderingContext, describe_element};
use crate::error::RenderError;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::iter;
use zpt_dom::{AttributeSpec, Document, Namespace, NodeId};
use zpt_tales::{MACROS_BINDING, MetalMacro, Model, Value};

/// Registers every `define-macro` element found under `roots` as a global
/// `macros` binding. When two macros share a name the first one wins.
///
/// Macros defined in the document are snapshotted before rendering starts,
/// so expansions copy the markup as written rather than as rendered in place.
pub(crate) fn register_macros(doc: &mut Document, roots: &[NodeId], model: &Model, settings: &DocumentSettings) -> usize {
    let spec = &settings.metal.define_macro;
    let mut macros: BTreeMap<String, Value> = BTreeMap::new();
    for &root in roots {
        for node in iter::once(root).chain(doc.descendants(root)) {
            if !doc.is_element(node) {
                continue;
            }
            let Some(name) = doc.find_attribute(node, spec).map(|a| a.value.trim().to_string()) else {
                continue;
            };
            if macros.contains_key(&name) {
                log::warn!("Ignoring duplicate macro '{}' on {}", name, describe_element(doc, node));
                continue;
            }
            let element = if doc.is_attached(node) {
                copy_macro_element(doc, node, settings)
            } else {
                node
            };
            log::trace!("Registered macro '{}'", name);
            macros.insert(name.clone(), Value::Macro(MetalMacro { name, element }));
        }
    }
    let count = macros.len();
    model.add_global(MACROS_BINDING, Value::Map(macros));
    count
}

/// Copies the `define-macro` elements of `library` into `doc`. The copies are
/// detached and remember their source for annotation.
pub(crate) fn import_library(doc: &mut Document, library: &Document, settings: &DocumentSettings) -> Vec<NodeId> {
    let spec = &settings.metal.define_macro;
    let Some(library_root) = library.root_element() else {
        return Vec::new();
    };
    let mut imported = Vec::new();
    for node in iter::once(library_root).chain(library.descendants(library_root)) {
        if !library.is_element(node) || !library.has_attribute(node, spec) {
            continue;
        }
        let declarations = directive_declarations(library, node, &settings.config.namespaces);
        let copy = doc.import_subtree(library, node);
        declare(doc, copy, &declarations);
        imported.push(copy);
    }
    log::debug!(
        "Imported {} macro(s) from {}",
        imported.len(),
        library.source_name().unwrap_or("an unnamed library")
    );
    imported
}

/// Replaces the context's element with its expanded macro when it carries
/// `use-macro`. The returned context is the one the TAL pipeline continues with.
pub(crate) fn handle_use_macro(doc: &mut Document, ctx: RenderingContext) -> Result<RenderingContext, RenderError> {
    let settings = ctx.settings().clone();
    let spec = &settings.metal.use_macro;
    let Some(expression) = ctx.directive(doc, spec).map(str::to_string) else {
        return Ok(ctx);
    };
    let Some(used) = resolve_macro(doc, &ctx, ctx.node(), spec, &expression)? else {
        return Ok(ctx);
    };

    let max_depth = settings.config.max_macro_depth;
    if ctx.macro_stack().len() >= max_depth {
        return Err(RenderError::MacroChain {
            chain: ctx.macro_stack().iter().chain(iter::once(&used.name)).join(" -> "),
            message: format!("nests use-macro deeper than the limit of {}", max_depth),
        });
    }

    let expanded = expander::expand(doc, &ctx, &used)?;
    doc.replace(ctx.node(), &[expanded])?;
    log::debug!("Replaced {} with macro '{}'", describe_element(doc, ctx.node()), used.name);
    Ok(ctx.enter_macro(doc, expanded, &used.name))
}

/// Evaluates a `use-macro` or `extend-macro` expression. `None` when the
/// expression cancels; anything other than a macro is `MacroNotFound`.
pub(crate) fn resolve_macro(
    doc: &Document,
    ctx: &RenderingContext,
    element: NodeId,
    spec: &AttributeSpec,
    expression: &str,
) -> Result<Option<MetalMacro>, RenderError> {
    let not_found = || RenderError::MacroNotFound {
        attribute: spec.to_string(),
        element: describe_element(doc, element),
        expression: expression.to_string(),
    };
    match ctx.evaluate(expression) {
        Ok(result) if result.cancels_action() => Ok(None),
        Ok(result) => match result.into_value() {
            Value::Macro(found) => Ok(Some(found)),
            other => {
                log::debug!("{}=\"{}\" gave a {} value", spec, expression, other.type_name());
                Err(not_found())
            }
        },
        Err(source) if source.is_parse_error() => Err(RenderError::Evaluation {
            directive: spec.to_string(),
            element: describe_element(doc, element),
            expression: expression.to_string(),
            source,
        }),
        Err(source) => {
            log::debug!("{}=\"{}\" failed: {}", spec, expression, source);
            Err(not_found())
        }
    }
}

/// Deep-copies a macro element, re-declaring the TAL and METAL prefixes it
/// inherited so the detached copy still resolves its directives.
pub(crate) fn copy_macro_element(doc: &mut Document, element: NodeId, settings: &DocumentSettings) -> NodeId {
    let declarations = directive_declarations(doc, element, &settings.config.namespaces);
    let copy = doc.deep_copy(element);
    declare(doc, copy, &declarations);
    copy
}

fn directive_declarations(doc: &Document, element: NodeId, namespaces: &NamespaceRegistry) -> Vec<(String, String)> {
    doc.in_scope_namespaces(element)
        .into_iter()
        .filter_map(|(prefix, uri)| {
            let prefix = prefix?;
            let declared = Namespace::new(Some(&prefix), Some(&uri));
            (declared == *namespaces.tal() || declared == *namespaces.metal()).then_some((prefix, uri))
        })
        .collect()
}

fn declare(doc: &mut Document, element: NodeId, declarations: &[(String, String)]) {
    for (prefix, uri) in declarations {
        let name = format!("xmlns:{}", prefix);
        if doc.attribute(element, &name).is_none() && doc.set_attribute(element, &name, uri).is_err() {
            log::warn!("Could not declare {} on macro copy", name);
        }
    }
}
