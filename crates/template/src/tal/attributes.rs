use super::AttributeHandlingResult;
use crate::context::RenderingContext;
use crate::directive::{parse_attribute_assignment, split_items};
use crate::error::RenderError;
use zpt_dom::{Document, QualifiedName};

pub(crate) fn handle_attributes(doc: &mut Document, ctx: RenderingContext) -> Result<AttributeHandlingResult, RenderError> {
    let settings = ctx.settings().clone();
    let spec = &settings.tal.attributes;
    let Some(value) = ctx.directive(doc, spec).map(str::to_string) else {
        return Ok(AttributeHandlingResult::keep(ctx));
    };
    let node = ctx.node();

    for item in split_items(&value) {
        let (name, expression) =
            parse_attribute_assignment(&item).map_err(|message| ctx.syntax_error(doc, spec, &item, message))?;
        let result = ctx.evaluate_directive(doc, spec, expression)?;
        if result.cancels_action() {
            continue;
        }
        if result.value().is_null() {
            doc.remove_attribute(node, name);
            continue;
        }
        let qualified = QualifiedName::parse(name);
        if let Some(prefix) = qualified.prefix.as_deref()
            && doc.lookup_namespace_uri(node, Some(prefix)).is_none()
            && let Some(uri) = settings.config.namespaces.uri_for(prefix)
        {
            doc.set_attribute(node, &format!("xmlns:{}", prefix), uri)?;
        }
        doc.set_attribute(node, name, &result.value().to_text())?;
    }
    Ok(AttributeHandlingResult::keep(ctx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NamespaceRegistry, RenderingConfig};
    use crate::context::DocumentSettings;
    use crate::tal::test_support::{TAL, context_for};
    use serde_json::json;
    use std::rc::Rc;
    use std::sync::Arc;
    use zpt_tales::{ExpressionCache, Model, Value, ValueResolver};

    #[test]
    fn sets_removes_and_keeps() {
        let (mut doc, ctx) = context_for(
            &format!(
                "<r {TAL}><a href=\"#\" title=\"t\" class=\"c\" \
                 tal:attributes=\"href here/url; title nothing; class default; data-x string:a;;b\"/></r>"
            ),
            Value::from(json!({"url": "/home?a=1&b=2"})),
        );
        let node = ctx.node();
        handle_attributes(&mut doc, ctx).unwrap();
        assert_eq!(doc.attribute(node, "href"), Some("/home?a=1&b=2"));
        assert_eq!(doc.attribute(node, "title"), None);
        assert_eq!(doc.attribute(node, "class"), Some("c"));
        assert_eq!(doc.attribute(node, "data-x"), Some("a;b"));
        assert!(doc.to_xml_string().contains("href=\"/home?a=1&amp;b=2\""));
    }

    #[test]
    fn declares_registered_prefixes() {
        let doc = Document::parse(&format!("<r {TAL}><a tal:attributes=\"xlink:href string:/x\"/></r>")).unwrap();
        let config = RenderingConfig::builder()
            .with_namespaces(NamespaceRegistry::new().register("xlink", "http://www.w3.org/1999/xlink"))
            .build();
        let settings = Rc::new(DocumentSettings::new(
            Arc::new(config),
            Arc::new(ExpressionCache::new()),
            Arc::new(ValueResolver::default()),
        ));
        let node = doc.child_elements(doc.root_element().unwrap())[0];
        let ctx = RenderingContext::new(&doc, node, Model::new(Value::Null), settings);
        let mut doc = doc;
        handle_attributes(&mut doc, ctx).unwrap();
        assert_eq!(doc.attribute(node, "xmlns:xlink"), Some("http://www.w3.org/1999/xlink"));
        assert_eq!(doc.attribute(node, "xlink:href"), Some("/x"));
    }

    #[test]
    fn malformed_item_is_fatal() {
        let (mut doc, ctx) = context_for(&format!("<r {TAL}><a tal:attributes=\"href\"/></r>"), Value::Null);
        let err = handle_attributes(&mut doc, ctx).err().unwrap();
        assert!(matches!(err, RenderError::DirectiveSyntax { .. }));
    }
}
