//! Per-node rendering state.

use crate::config::{ContextVisitor, RenderingConfig};
use crate::error::RenderError;
use crate::specs::{MetalSpecs, TalSpecs};
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;
use zpt_dom::{Attribute, AttributeSpec, Document, NodeId};
use zpt_tales::{EvaluationContext, EvaluationResult, ExpressionCache, Model, TalesError, ValueResolver};

/// State shared by every context of one render.
pub struct DocumentSettings {
    pub config: Arc<RenderingConfig>,
    pub cache: Arc<ExpressionCache>,
    pub resolver: Arc<ValueResolver>,
    pub tal: TalSpecs,
    pub metal: MetalSpecs,
    pub visitors: Vec<Arc<dyn ContextVisitor>>,
}

impl DocumentSettings {
    pub fn new(config: Arc<RenderingConfig>, cache: Arc<ExpressionCache>, resolver: Arc<ValueResolver>) -> Self {
        let tal = TalSpecs::new(config.namespaces.tal());
        let metal = MetalSpecs::new(config.namespaces.metal());
        let visitors = config.context_visitors.clone();
        Self {
            config,
            cache,
            resolver,
            tal,
            metal,
            visitors,
        }
    }
}

/// One element being rendered, with the scope its expressions see.
///
/// The element's attributes are captured when the context is created, so
/// directives read the values the template author wrote even after earlier
/// handlers have rewritten the element.
#[derive(Clone)]
pub struct RenderingContext {
    node: NodeId,
    model: Model,
    settings: Rc<DocumentSettings>,
    original_attributes: Rc<Vec<Attribute>>,
    attribute_values: Rc<BTreeMap<String, String>>,
    macro_stack: Rc<Vec<String>>,
    process_children: bool,
}

impl RenderingContext {
    pub fn new(doc: &Document, node: NodeId, model: Model, settings: Rc<DocumentSettings>) -> Self {
        let original_attributes = doc.attributes(node).to_vec();
        let attribute_values = original_attributes
            .iter()
            .map(|attr| (attr.name.to_string(), attr.value.clone()))
            .collect();
        Self {
            node,
            model,
            settings,
            original_attributes: Rc::new(original_attributes),
            attribute_values: Rc::new(attribute_values),
            macro_stack: Rc::new(Vec::new()),
            process_children: true,
        }
    }

    fn derive(&self, doc: &Document, node: NodeId, model: Model) -> Self {
        Self {
            macro_stack: Rc::clone(&self.macro_stack),
            ..Self::new(doc, node, model, Rc::clone(&self.settings))
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    pub fn settings(&self) -> &Rc<DocumentSettings> {
        &self.settings
    }

    pub fn original_attributes(&self) -> &[Attribute] {
        &self.original_attributes
    }

    pub fn processes_children(&self) -> bool {
        self.process_children
    }

    /// Marks the element's current children as generated output.
    pub fn skip_children(&mut self) {
        self.process_children = false;
    }

    /// A context for a child element, one scope level down.
    pub fn create_child(&self, doc: &Document, node: NodeId) -> Self {
        self.derive(doc, node, self.model.create_child())
    }

    /// A context for an element that takes this one's place, such as a
    /// repetition clone or an expanded macro.
    pub fn create_sibling(&self, doc: &Document, node: NodeId) -> Self {
        self.derive(doc, node, self.model.create_sibling())
    }

    /// Names of the macros whose expansions enclose this element, outermost first.
    pub fn macro_stack(&self) -> &[String] {
        &self.macro_stack
    }

    /// The context for the expansion of macro `name`, which replaces this element.
    pub fn enter_macro(&self, doc: &Document, node: NodeId, name: &str) -> Self {
        let mut entered = self.create_sibling(doc, node);
        Rc::make_mut(&mut entered.macro_stack).push(name.to_string());
        entered
    }

    /// The value the author wrote for `spec` on this element.
    pub fn directive<'c>(&'c self, doc: &Document, spec: &AttributeSpec) -> Option<&'c str> {
        self.original_attributes
            .iter()
            .find(|attr| doc.attribute_matches(self.node, attr, spec))
            .map(|attr| attr.value.as_str())
    }

    pub fn evaluate(&self, expression: &str) -> Result<EvaluationResult, TalesError> {
        let parsed = self.settings.cache.get_or_parse(expression)?;
        let config = &self.settings.config;
        let e_ctx = EvaluationContext::new(&self.model, &self.settings.resolver, &config.modules)
            .with_options(&config.keyword_options)
            .with_attributes(&self.attribute_values);
        zpt_tales::evaluate(&parsed, &e_ctx)
    }

    /// Evaluates a directive's expression, naming the directive and element on failure.
    pub fn evaluate_directive(
        &self,
        doc: &Document,
        spec: &AttributeSpec,
        expression: &str,
    ) -> Result<EvaluationResult, RenderError> {
        self.evaluate(expression).map_err(|source| RenderError::Evaluation {
            directive: spec.to_string(),
            element: describe_element(doc, self.node),
            expression: expression.to_string(),
            source,
        })
    }

    pub fn syntax_error(&self, doc: &Document, spec: &AttributeSpec, value: &str, message: impl Into<String>) -> RenderError {
        RenderError::DirectiveSyntax {
            directive: spec.to_string(),
            element: describe_element(doc, self.node),
            value: value.to_string(),
            message: message.into(),
        }
    }
}

/// `<name>` plus its source position when known, for error messages.
pub fn describe_element(doc: &Document, node: NodeId) -> String {
    match doc.element(node) {
        Some(element) => match &element.position {
            Some(location) => format!("<{}> at {}", element.name, location),
            None => format!("<{}>", element.name),
        },
        None => format!("node {}", node),
    }
}
