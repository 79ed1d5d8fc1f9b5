use super::{AttributeHandlingResult, content_nodes, expose_children};
use crate::context::{RenderingContext, describe_element};
use crate::directive::parse_content;
use crate::error::RenderError;
use zpt_dom::{AttributeSpec, Document};

pub(crate) fn handle_content_or_replace(
    doc: &mut Document,
    ctx: RenderingContext,
) -> Result<AttributeHandlingResult, RenderError> {
    let settings = ctx.settings().clone();
    let content = ctx.directive(doc, &settings.tal.content).map(str::to_string);
    let replace = ctx.directive(doc, &settings.tal.replace).map(str::to_string);
    match (content, replace) {
        (Some(_), Some(_)) => Err(RenderError::ContentAndReplace {
            element: describe_element(doc, ctx.node()),
        }),
        (Some(value), None) => handle_content(doc, ctx, &settings.tal.content, &value),
        (None, Some(value)) => handle_replace(doc, ctx, &settings.tal.replace, &value),
        (None, None) => Ok(AttributeHandlingResult::keep(ctx)),
    }
}

fn handle_content(
    doc: &mut Document,
    mut ctx: RenderingContext,
    spec: &AttributeSpec,
    value: &str,
) -> Result<AttributeHandlingResult, RenderError> {
    let (mode, expression) = parse_content(value).map_err(|message| ctx.syntax_error(doc, spec, value, message))?;
    let result = ctx.evaluate_directive(doc, spec, expression)?;
    if result.cancels_action() {
        return Ok(AttributeHandlingResult::keep(ctx));
    }
    let node = ctx.node();
    if result.value().is_null() {
        doc.clear_children(node);
    } else {
        let nodes = content_nodes(doc, mode, result.value())?;
        doc.replace_children(node, &nodes);
    }
    ctx.skip_children();
    Ok(AttributeHandlingResult::keep(ctx))
}

fn handle_replace(
    doc: &mut Document,
    ctx: RenderingContext,
    spec: &AttributeSpec,
    value: &str,
) -> Result<AttributeHandlingResult, RenderError> {
    let (mode, expression) = parse_content(value).map_err(|message| ctx.syntax_error(doc, spec, value, message))?;
    let result = ctx.evaluate_directive(doc, spec, expression)?;
    let node = ctx.node();
    if result.cancels_action() {
        let promoted = doc.omit(node)?;
        return Ok(AttributeHandlingResult::exposing(expose_children(doc, &ctx, &promoted)));
    }
    if result.value().is_null() {
        doc.remove(node);
    } else {
        let nodes = content_nodes(doc, mode, result.value())?;
        doc.replace(node, &nodes)?;
    }
    Ok(AttributeHandlingResult::removed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tal::test_support::{TAL, context_for};
    use serde_json::json;
    use zpt_tales::Value;

    fn model() -> Value {
        Value::from(json!({"name": "A & B", "html": "<b>bold</b>", "bad": "<b>"}))
    }

    #[test]
    fn text_content_is_escaped() {
        let (mut doc, ctx) = context_for(&format!("<r {TAL}><p tal:content=\"here/name\">old</p></r>"), model());
        let result = handle_content_or_replace(&mut doc, ctx).unwrap();
        assert_eq!(result.contexts.len(), 1);
        assert!(!result.contexts[0].processes_children());
        assert!(doc.to_xml_string().contains(">A &amp; B</p>"));
    }

    #[test]
    fn structure_content_is_parsed() {
        let (mut doc, ctx) = context_for(
            &format!("<r {TAL}><p tal:content=\"structure here/html\">old</p></r>"),
            model(),
        );
        handle_content_or_replace(&mut doc, ctx).unwrap();
        assert!(doc.to_xml_string().contains("<b>bold</b></p>"));
    }

    #[test]
    fn null_content_clears_children() {
        let (mut doc, ctx) = context_for(&format!("<r {TAL}><p tal:content=\"nothing\">old</p></r>"), model());
        let node = ctx.node();
        handle_content_or_replace(&mut doc, ctx).unwrap();
        assert!(doc.children(node).is_empty());
    }

    #[test]
    fn cancelled_content_keeps_children() {
        let (mut doc, ctx) = context_for(&format!("<r {TAL}><p tal:content=\"default\">old</p></r>"), model());
        let result = handle_content_or_replace(&mut doc, ctx).unwrap();
        assert!(result.contexts[0].processes_children());
        assert!(doc.to_xml_string().contains(">old</p>"));
    }

    #[test]
    fn replace_swaps_element() {
        let (mut doc, ctx) = context_for(&format!("<r {TAL}><p tal:replace=\"here/name\">old</p></r>"), model());
        let result = handle_content_or_replace(&mut doc, ctx).unwrap();
        assert!(result.contexts.is_empty());
        assert!(doc.to_xml_string().contains(">A &amp; B</r>"));
    }

    #[test]
    fn cancelled_replace_exposes_children() {
        let (mut doc, ctx) = context_for(
            &format!("<r {TAL}><p tal:replace=\"default\"><i>a</i>t<b>b</b></p></r>"),
            model(),
        );
        let result = handle_content_or_replace(&mut doc, ctx).unwrap();
        assert!(result.contexts.is_empty());
        assert_eq!(result.newly_exposed.len(), 2);
        assert!(doc.to_xml_string().contains("<i>a</i>t<b>b</b></r>"));
    }

    #[test]
    fn null_replace_removes_element() {
        let (mut doc, ctx) = context_for(&format!("<r {TAL}><p tal:replace=\"nothing\">old</p></r>"), model());
        handle_content_or_replace(&mut doc, ctx).unwrap();
        assert!(!doc.to_xml_string().contains("<p"));
    }

    #[test]
    fn content_with_replace_is_fatal() {
        let (mut doc, ctx) = context_for(
            &format!("<r {TAL}><p tal:content=\"a\" tal:replace=\"b\"/></r>"),
            model(),
        );
        let err = handle_content_or_replace(&mut doc, ctx).err().unwrap();
        assert!(matches!(err, RenderError::ContentAndReplace { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn malformed_structure_is_a_tree_error() {
        let (mut doc, ctx) = context_for(
            &format!("<r {TAL}><p tal:content=\"structure here/bad\"/></r>"),
            model(),
        );
        let err = handle_content_or_replace(&mut doc, ctx).err().unwrap();
        assert!(matches!(err, RenderError::Dom(_)));
    }
}
