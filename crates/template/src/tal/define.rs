use super::AttributeHandlingResult;
use crate::context::RenderingContext;
use crate::directive::{parse_definition, split_items};
use crate::error::RenderError;
use zpt_dom::Document;
use zpt_tales::{DefinitionScope, parse_definition_target};

pub(crate) fn handle_define(doc: &mut Document, mut ctx: RenderingContext) -> Result<AttributeHandlingResult, RenderError> {
    let settings = ctx.settings().clone();
    let spec = &settings.tal.define;
    let Some(value) = ctx.directive(doc, spec).map(str::to_string) else {
        return Ok(AttributeHandlingResult::keep(ctx));
    };

    for item in split_items(&value) {
        let definition = parse_definition(&item).map_err(|message| ctx.syntax_error(doc, spec, &item, message))?;
        let (prefix_scope, name) = parse_definition_target(definition.target)
            .map_err(|e| ctx.syntax_error(doc, spec, &item, e.to_string()))?;
        let scope = prefix_scope.or(definition.scope).unwrap_or(DefinitionScope::Local);

        let result = ctx.evaluate_directive(doc, spec, definition.expression)?;
        if result.cancels_action() {
            log::trace!("tal:define of '{}' cancelled", name);
            continue;
        }
        match scope {
            DefinitionScope::Local => ctx.model_mut().add_local(name, result.into_value()),
            DefinitionScope::Global => ctx.model().add_global(name, result.into_value()),
        }
    }
    Ok(AttributeHandlingResult::keep(ctx))
}
