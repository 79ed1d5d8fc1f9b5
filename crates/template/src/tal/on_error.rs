//! `tal:on-error`: the recovery boundary around an element's rendering.

use super::content_nodes;
use crate::context::{RenderingContext, describe_element};
use crate::directive::parse_content;
use crate::error::RenderError;
use zpt_dom::Document;
use zpt_tales::{CaughtError, Value};

/// Tries to recover from `error` using the `on-error` directive of `ctx`'s
/// element. Hands the error back when the element has no handler or the
/// error is not recoverable, so the next enclosing boundary can try.
pub(crate) fn handle_error(doc: &mut Document, ctx: &RenderingContext, error: RenderError) -> Result<(), RenderError> {
    if !error.is_recoverable() {
        return Err(error);
    }
    let settings = ctx.settings().clone();
    let spec = &settings.tal.on_error;
    let Some(value) = ctx.directive(doc, spec) else {
        return Err(error);
    };
    log::warn!("Handling error on {}: {}", describe_element(doc, ctx.node()), error);

    let mut handler = ctx.clone();
    handler
        .model_mut()
        .set_error(Value::object(CaughtError::new(error.kind(), error.to_string())));
    let (mode, expression) = parse_content(value).map_err(|message| handler.syntax_error(doc, spec, value, message))?;
    let result = handler.evaluate_directive(doc, spec, expression)?;
    if result.cancels_action() {
        return Ok(());
    }

    let node = ctx.node();
    if result.value().is_null() {
        doc.clear_children(node);
    } else {
        let nodes = content_nodes(doc, mode, result.value())?;
        doc.replace_children(node, &nodes);
    }
    Ok(())
}
