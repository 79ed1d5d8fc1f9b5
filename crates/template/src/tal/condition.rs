use super::AttributeHandlingResult;
use crate::context::RenderingContext;
use crate::error::RenderError;
use zpt_dom::Document;

pub(crate) fn handle_condition(doc: &mut Document, ctx: RenderingContext) -> Result<AttributeHandlingResult, RenderError> {
    let settings = ctx.settings().clone();
    let spec = &settings.tal.condition;
    let Some(expression) = ctx.directive(doc, spec) else {
        return Ok(AttributeHandlingResult::keep(ctx));
    };

    let result = ctx.evaluate_directive(doc, spec, expression)?;
    if result.cancels_action() || result.is_truthy() {
        return Ok(AttributeHandlingResult::keep(ctx));
    }
    log::debug!("tal:condition '{}' is false; removing element", expression);
    doc.remove(ctx.node());
    Ok(AttributeHandlingResult::removed())
}
