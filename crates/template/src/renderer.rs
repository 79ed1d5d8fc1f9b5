//! The render entry point and the walk that drives each element through
//! METAL expansion and the TAL pipeline.

use crate::annotation::SourceAnnotator;
use crate::cleanup::remove_directives;
use crate::config::{ContextVisitor, RenderingConfig};
use crate::context::{DocumentSettings, RenderingContext};
use crate::error::RenderError;
use crate::metal;
use crate::tal::{TalHandler, on_error};
use std::rc::Rc;
use std::sync::Arc;
use zpt_dom::{Document, NodeId};
use zpt_tales::{ExpressionCache, Model, Value, ValueResolver};

/// Renders documents in place against a model.
///
/// A renderer is cheap to clone and can be shared between threads; the
/// parsed-expression cache it holds is reused by every render.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    config: Arc<RenderingConfig>,
    cache: Arc<ExpressionCache>,
    resolver: Arc<ValueResolver>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(RenderingConfig::default())
    }
}

impl TemplateRenderer {
    pub fn new(config: RenderingConfig) -> Self {
        Self {
            config: Arc::new(config),
            cache: Arc::new(ExpressionCache::new()),
            resolver: Arc::new(ValueResolver::default()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<ExpressionCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_resolver(mut self, resolver: ValueResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn config(&self) -> &RenderingConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ExpressionCache> {
        &self.cache
    }

    /// Renders the whole document, starting at its root element.
    pub fn render(&self, doc: &mut Document, model: Value) -> Result<(), RenderError> {
        self.render_with_libraries(doc, model, &[])
    }

    /// Renders the whole document with the macros of `libraries` available
    /// through `macros` alongside the document's own.
    pub fn render_with_libraries(
        &self,
        doc: &mut Document,
        model: Value,
        libraries: &[&Document],
    ) -> Result<(), RenderError> {
        match doc.root_element() {
            Some(root) => self.render_node(doc, root, model, libraries),
            None => Ok(()),
        }
    }

    /// Renders the subtree at `node`. Macros are discovered across the whole
    /// document, and cleanup applies to the whole document.
    pub fn render_node(
        &self,
        doc: &mut Document,
        node: NodeId,
        model: Value,
        libraries: &[&Document],
    ) -> Result<(), RenderError> {
        let settings = Rc::new(self.document_settings());
        let model = Model::new(model);

        let mut macro_roots = vec![doc.root()];
        for library in libraries {
            macro_roots.extend(metal::import_library(doc, library, &settings));
        }
        let registered = metal::register_macros(doc, &macro_roots, &model, &settings);
        log::debug!(
            "Rendering {} with {} macro(s)",
            doc.source_name().unwrap_or("document"),
            registered
        );

        let ctx = RenderingContext::new(doc, node, model, Rc::clone(&settings));
        process(doc, ctx)?;

        if self.config.remove_directive_attributes {
            let root = doc.root();
            remove_directives(doc, root, &self.config.namespaces);
        }
        Ok(())
    }

    fn document_settings(&self) -> DocumentSettings {
        let mut settings = DocumentSettings::new(
            Arc::clone(&self.config),
            Arc::clone(&self.cache),
            Arc::clone(&self.resolver),
        );
        if self.config.source_annotation {
            let annotator: Arc<dyn ContextVisitor> =
                Arc::new(SourceAnnotator::new(self.config.annotation_root.clone()));
            settings.visitors.insert(0, annotator);
        }
        settings
    }
}

/// Runs `op` for `ctx`. A failure is offered to the element's `on-error`
/// handler; `Ok(None)` means it was handled and the context is finished.
fn guarded<T>(
    doc: &mut Document,
    ctx: &RenderingContext,
    op: impl FnOnce(&mut Document) -> Result<T, RenderError>,
) -> Result<Option<T>, RenderError> {
    match op(doc) {
        Ok(value) => Ok(Some(value)),
        Err(error) => on_error::handle_error(doc, ctx, error).map(|()| None),
    }
}

fn process(doc: &mut Document, ctx: RenderingContext) -> Result<(), RenderError> {
    let Some(ctx) = guarded(doc, &ctx, |doc| prepare(doc, ctx.clone()))? else {
        return Ok(());
    };

    let mut current = vec![ctx];
    let mut exposed = Vec::new();
    for handler in TalHandler::ORDER {
        let mut next = Vec::with_capacity(current.len());
        for ctx in current {
            if let Some(result) = guarded(doc, &ctx, |doc| handler.handle(doc, ctx.clone()))? {
                next.extend(result.contexts);
                exposed.extend(result.newly_exposed);
            }
        }
        current = next;
    }

    for ctx in current {
        if ctx.processes_children() {
            guarded(doc, &ctx, |doc| process_children(doc, &ctx))?;
        }
    }
    for ctx in exposed {
        process(doc, ctx)?;
    }
    Ok(())
}

/// Expands `use-macro` and runs the context visitors.
fn prepare(doc: &mut Document, ctx: RenderingContext) -> Result<RenderingContext, RenderError> {
    let mut ctx = metal::handle_use_macro(doc, ctx)?;
    let settings = Rc::clone(ctx.settings());
    for visitor in &settings.visitors {
        visitor.visit(doc, &mut ctx)?;
    }
    Ok(ctx)
}

fn process_children(doc: &mut Document, ctx: &RenderingContext) -> Result<(), RenderError> {
    for child in doc.child_elements(ctx.node()) {
        let child_ctx = ctx.create_child(doc, child);
        process(doc, child_ctx)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NS: &str = "xmlns:tal=\"http://xml.zope.org/namespaces/tal\" \
                      xmlns:metal=\"http://xml.zope.org/namespaces/metal\"";

    fn render(source: &str, model: serde_json::Value) -> Result<String, RenderError> {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut doc = Document::parse(source)?;
        TemplateRenderer::default().render(&mut doc, Value::from(model))?;
        Ok(doc.to_xml_string())
    }

    #[test]
    fn define_is_visible_to_later_directives_and_children() {
        let out = render(
            &format!("<r {NS}><p tal:define=\"n here/name\" tal:attributes=\"title n\"><b tal:content=\"n\"/></p></r>"),
            json!({"name": "x"}),
        )
        .unwrap();
        assert_eq!(out, "<r><p title=\"x\"><b>x</b></p></r>");
    }

    #[test]
    fn repeat_clones_run_remaining_stages() {
        let out = render(
            &format!(
                "<ul {NS}><li tal:repeat=\"i here/items\" tal:content=\"string:${{repeat/i/number}}=$i\" \
                 tal:attributes=\"class i\"/></ul>"
            ),
            json!({"items": ["a", "b"]}),
        )
        .unwrap();
        assert_eq!(out, "<ul><li class=\"a\">1=a</li><li class=\"b\">2=b</li></ul>");
    }

    #[test]
    fn condition_precedes_repeat() {
        let out = render(
            &format!("<ul {NS}><li tal:condition=\"false\" tal:repeat=\"i here/items\">x</li></ul>"),
            json!({"items": [1, 2, 3]}),
        )
        .unwrap();
        assert_eq!(out, "<ul/>");
    }

    #[test]
    fn directive_elements_are_unwrapped() {
        let out = render(
            &format!("<r {NS}><tal:block tal:repeat=\"i here/items\"><b tal:content=\"i\"/></tal:block></r>"),
            json!({"items": [1, 2]}),
        )
        .unwrap();
        assert_eq!(out, "<r><b>1</b><b>2</b></r>");
    }

    #[test]
    fn cancelled_replace_children_are_rendered() {
        let out = render(
            &format!("<r {NS}><div tal:replace=\"default\"><b tal:content=\"here/v\"/></div></r>"),
            json!({"v": "ok"}),
        )
        .unwrap();
        assert_eq!(out, "<r><b>ok</b></r>");
    }

    #[test]
    fn nearest_on_error_handles_descendant_failure() {
        let out = render(
            &format!(
                "<r {NS}><div tal:on-error=\"string:outer\"><p tal:on-error=\"string:inner: ${{error/type}}\">\
                 <b tal:content=\"here/missing\"/></p></div></r>"
            ),
            json!({}),
        )
        .unwrap();
        assert_eq!(out, "<r><div><p>inner: EvaluationError</p></div></r>");
    }

    #[test]
    fn failing_handler_propagates_to_outer_boundary() {
        let out = render(
            &format!(
                "<r {NS}><div tal:on-error=\"string:outer\"><p tal:on-error=\"here/also_missing\">\
                 <b tal:content=\"here/missing\"/></p></div></r>"
            ),
            json!({}),
        )
        .unwrap();
        assert_eq!(out, "<r><div>outer</div></r>");
    }

    #[test]
    fn on_error_on_repeated_element_applies_per_clone() {
        let out = render(
            &format!(
                "<ul {NS}><li tal:repeat=\"i here/items\" tal:on-error=\"string:bad\" tal:content=\"i/name\"/></ul>"
            ),
            json!({"items": [{"name": "a"}, 5]}),
        )
        .unwrap();
        assert_eq!(out, "<ul><li>a</li><li>bad</li></ul>");
    }

    #[test]
    fn unhandled_errors_abort() {
        let err = render(&format!("<r {NS}><b tal:content=\"here/missing\"/></r>"), json!({})).unwrap_err();
        assert!(matches!(err, RenderError::Evaluation { .. }));
    }

    #[test]
    fn syntax_errors_bypass_on_error() {
        let err = render(
            &format!("<r {NS}><div tal:on-error=\"string:x\"><b tal:content=\"a//b\"/></div></r>"),
            json!({}),
        )
        .unwrap_err();
        assert!(!err.is_recoverable());
    }

    #[test]
    fn macro_usage_renders_with_caller_scope() {
        let out = render(
            &format!(
                "<r {NS}><div metal:define-macro=\"card\"><h1 metal:define-slot=\"title\">T</h1>\
                 <p tal:content=\"here/body\"/></div>\
                 <section metal:use-macro=\"macros/card\"><h2 metal:fill-slot=\"title\" tal:content=\"here/title\"/></section></r>"
            ),
            json!({"title": "Hello", "body": "World"}),
        )
        .unwrap();
        assert_eq!(
            out,
            "<r><div><h1>T</h1><p>World</p></div><div><h2>Hello</h2><p>World</p></div></r>"
        );
    }

    #[test]
    fn missing_macro_is_recoverable() {
        let out = render(
            &format!("<r {NS}><div tal:on-error=\"string:no macro\"><p metal:use-macro=\"macros/none\"/></div></r>"),
            json!({}),
        )
        .unwrap();
        assert_eq!(out, "<r><div>no macro</div></r>");
    }

    #[test]
    fn cleanup_can_be_disabled() {
        let mut doc = Document::parse(&format!("<r {NS}><p tal:content=\"string:x\"/></r>")).unwrap();
        let renderer = TemplateRenderer::new(RenderingConfig::builder().with_directive_cleanup(false).build());
        renderer.render(&mut doc, Value::Null).unwrap();
        assert!(doc.to_xml_string().contains("<p tal:content=\"string:x\">x</p>"));
    }

    #[test]
    fn expressions_are_cached_across_renders() {
        let renderer = TemplateRenderer::default();
        for _ in 0..2 {
            let mut doc = Document::parse(&format!("<r {NS}><p tal:content=\"here/a\"/></r>")).unwrap();
            renderer.render(&mut doc, Value::from(json!({"a": 1}))).unwrap();
        }
        assert_eq!(renderer.cache().len(), 1);
    }
}
