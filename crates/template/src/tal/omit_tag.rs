use super::{AttributeHandlingResult, expose_children};
use crate::context::RenderingContext;
use crate::error::RenderError;
use zpt_dom::Document;

pub(crate) fn handle_omit_tag(doc: &mut Document, ctx: RenderingContext) -> Result<AttributeHandlingResult, RenderError> {
    let settings = ctx.settings().clone();
    let spec = &settings.tal.omit_tag;
    let Some(expression) = ctx.directive(doc, spec) else {
        return Ok(AttributeHandlingResult::keep(ctx));
    };

    // An empty value omits unconditionally.
    let omit = if expression.trim().is_empty() {
        true
    } else {
        let result = ctx.evaluate_directive(doc, spec, expression)?;
        !result.cancels_action() && result.is_truthy()
    };
    if !omit {
        return Ok(AttributeHandlingResult::keep(ctx));
    }

    let promoted = doc.omit(ctx.node())?;
    let exposed = if ctx.processes_children() {
        expose_children(doc, &ctx, &promoted)
    } else {
        Vec::new()
    };
    Ok(AttributeHandlingResult::exposing(exposed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tal::test_support::{TAL, context_for};
    use serde_json::json;
    use zpt_tales::Value;

    fn run(omit: &str) -> (String, AttributeHandlingResult) {
        let (mut doc, ctx) = context_for(
            &format!("<r {TAL}><div tal:omit-tag=\"{omit}\">a<b>x</b></div></r>"),
            Value::from(json!({"yes": 1, "no": 0})),
        );
        let result = handle_omit_tag(&mut doc, ctx).unwrap();
        (doc.to_xml_string(), result)
    }

    #[test]
    fn empty_value_omits() {
        let (xml, result) = run("");
        assert!(xml.contains(">a<b>x</b></r>"));
        assert!(result.contexts.is_empty());
        assert_eq!(result.newly_exposed.len(), 1);
    }

    #[test]
    fn truthy_omits_falsy_keeps() {
        assert!(!run("here/yes").0.contains("<div"));
        let (xml, result) = run("here/no");
        assert!(xml.contains("<div"));
        assert_eq!(result.contexts.len(), 1);
    }

    #[test]
    fn cancel_and_null_keep_tag() {
        assert!(run("default").0.contains("<div"));
        assert!(run("nothing").0.contains("<div"));
    }
}
