//! The TAL directive pipeline.
//!
//! Each handler takes one rendering context and returns the contexts that
//! continue to the next stage, along with any contexts it exposed (children
//! promoted by `omit-tag` or a cancelled `replace`) that must run through the
//! whole pipeline from the start.

mod attributes;
mod condition;
mod content;
mod define;
pub(crate) mod on_error;
mod omit_tag;
mod repeat;

use crate::context::RenderingContext;
use crate::directive::ContentMode;
use crate::error::RenderError;
use zpt_dom::{Document, NodeId};
use zpt_tales::Value;

#[derive(Default)]
pub struct AttributeHandlingResult {
    pub contexts: Vec<RenderingContext>,
    pub newly_exposed: Vec<RenderingContext>,
}

impl AttributeHandlingResult {
    pub fn keep(ctx: RenderingContext) -> Self {
        Self {
            contexts: vec![ctx],
            newly_exposed: Vec::new(),
        }
    }

    pub fn removed() -> Self {
        Self::default()
    }

    pub fn with_contexts(contexts: Vec<RenderingContext>) -> Self {
        Self {
            contexts,
            newly_exposed: Vec::new(),
        }
    }

    pub fn exposing(newly_exposed: Vec<RenderingContext>) -> Self {
        Self {
            contexts: Vec::new(),
            newly_exposed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TalHandler {
    Define,
    Condition,
    Repeat,
    ContentOrReplace,
    Attributes,
    OmitTag,
}

impl TalHandler {
    pub const ORDER: [TalHandler; 6] = [
        TalHandler::Define,
        TalHandler::Condition,
        TalHandler::Repeat,
        TalHandler::ContentOrReplace,
        TalHandler::Attributes,
        TalHandler::OmitTag,
    ];

    pub fn handle(self, doc: &mut Document, ctx: RenderingContext) -> Result<AttributeHandlingResult, RenderError> {
        match self {
            TalHandler::Define => define::handle_define(doc, ctx),
            TalHandler::Condition => condition::handle_condition(doc, ctx),
            TalHandler::Repeat => repeat::handle_repeat(doc, ctx),
            TalHandler::ContentOrReplace => content::handle_content_or_replace(doc, ctx),
            TalHandler::Attributes => attributes::handle_attributes(doc, ctx),
            TalHandler::OmitTag => omit_tag::handle_omit_tag(doc, ctx),
        }
    }
}

/// Builds the nodes a content-like directive writes for `value`.
pub(crate) fn content_nodes(doc: &mut Document, mode: ContentMode, value: &Value) -> Result<Vec<NodeId>, RenderError> {
    match mode {
        ContentMode::Text => Ok(vec![doc.create_text(value.to_text())]),
        ContentMode::Structure => Ok(doc.parse_fragment(&value.to_text())?),
    }
}

/// Child contexts for the element children promoted out of an omitted element.
pub(crate) fn expose_children(doc: &Document, ctx: &RenderingContext, promoted: &[NodeId]) -> Vec<RenderingContext> {
    promoted
        .iter()
        .copied()
        .filter(|&node| doc.is_element(node))
        .map(|node| ctx.create_child(doc, node))
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::RenderingConfig;
    use crate::context::{DocumentSettings, RenderingContext};
    use std::rc::Rc;
    use std::sync::Arc;
    use zpt_dom::Document;
    use zpt_tales::{ExpressionCache, Model, Value, ValueResolver};

    pub const TAL: &str = "xmlns:tal=\"http://xml.zope.org/namespaces/tal\"";

    pub fn settings() -> Rc<DocumentSettings> {
        Rc::new(DocumentSettings::new(
            Arc::new(RenderingConfig::default()),
            Arc::new(ExpressionCache::new()),
            Arc::new(ValueResolver::default()),
        ))
    }

    /// Parses `source` and returns a context for its first element below the root.
    pub fn context_for(source: &str, root: Value) -> (Document, RenderingContext) {
        let doc = Document::parse(source).unwrap();
        let outer = doc.root_element().unwrap();
        let node = doc.child_elements(outer)[0];
        let ctx = RenderingContext::new(&doc, node, Model::new(root), settings());
        (doc, ctx)
    }
}
