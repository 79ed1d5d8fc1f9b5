use super::AttributeHandlingResult;
use crate::context::{RenderingContext, describe_element};
use crate::directive::parse_repeat;
use crate::error::RenderError;
use zpt_dom::Document;
use zpt_tales::RepetitionInfo;

pub(crate) fn handle_repeat(doc: &mut Document, ctx: RenderingContext) -> Result<AttributeHandlingResult, RenderError> {
    let settings = ctx.settings().clone();
    let spec = &settings.tal.repeat;
    let Some(value) = ctx.directive(doc, spec) else {
        return Ok(AttributeHandlingResult::keep(ctx));
    };
    let (name, expression) = parse_repeat(value).map_err(|message| ctx.syntax_error(doc, spec, value, message))?;

    let result = ctx.evaluate_directive(doc, spec, expression)?;
    if result.cancels_action() || result.value().is_null() {
        return Ok(AttributeHandlingResult::keep(ctx));
    }
    let Some(items) = result.value().items() else {
        return Err(RenderError::NotIterable {
            element: describe_element(doc, ctx.node()),
            expression: expression.to_string(),
            type_name: result.value().type_name().to_string(),
        });
    };

    let original = ctx.node();
    let count = items.len();
    let mut contexts = Vec::with_capacity(count);
    for (index, item) in items.into_iter().enumerate() {
        let clone = doc.deep_copy(original);
        doc.insert_before(original, clone)?;
        doc.remove_attribute_by_spec(clone, spec);
        let mut sibling = ctx.create_sibling(doc, clone);
        sibling
            .model_mut()
            .add_repetition(RepetitionInfo::new(name, index, count, item).with_element(clone));
        contexts.push(sibling);
    }
    doc.remove(original);
    log::debug!("tal:repeat '{}' over '{}' produced {} item(s)", name, expression, count);
    Ok(AttributeHandlingResult::with_contexts(contexts))
}
