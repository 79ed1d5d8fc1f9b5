//! The evaluation engine for executing parsed TALES expressions against a [`Model`].

use crate::ast::{AlternateExpression, Expression, PathExpression, PathSegment, StringExpression, StringPart};
use crate::error::TalesError;
use crate::model::Model;
use crate::modules::ModuleRegistry;
use crate::resolver::ValueResolver;
use crate::value::Value;
use std::collections::BTreeMap;

/// Global binding under which registered macros are published.
pub const MACROS_BINDING: &str = "macros";

/// Everything an expression can see while it is evaluated.
pub struct EvaluationContext<'d> {
    pub model: &'d Model,
    pub resolver: &'d ValueResolver,
    pub modules: &'d ModuleRegistry,
    /// Keyword options exposed as `options`.
    pub options: Option<&'d BTreeMap<String, Value>>,
    /// The current element's attributes before any directive changed them, exposed as `attrs`.
    pub attributes: Option<&'d BTreeMap<String, String>>,
}

impl<'d> EvaluationContext<'d> {
    pub fn new(model: &'d Model, resolver: &'d ValueResolver, modules: &'d ModuleRegistry) -> Self {
        Self {
            model,
            resolver,
            modules,
            options: None,
            attributes: None,
        }
    }

    pub fn with_options(mut self, options: &'d BTreeMap<String, Value>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_attributes(mut self, attributes: &'d BTreeMap<String, String>) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// The outcome of evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult {
    value: Value,
}

impl EvaluationResult {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// True iff the value is the cancellation sentinel.
    pub fn cancels_action(&self) -> bool {
        self.value.cancels_action()
    }

    pub fn is_truthy(&self) -> bool {
        self.value.is_truthy()
    }
}

pub fn evaluate(expr: &Expression, e_ctx: &EvaluationContext<'_>) -> Result<EvaluationResult, TalesError> {
    let value = match expr {
        Expression::Path(path) => evaluate_path(path, e_ctx)?,
        Expression::String(s) => Value::String(evaluate_string(s, e_ctx)?),
        Expression::Not(inner) => Value::Bool(!evaluate(inner, e_ctx)?.is_truthy()),
        Expression::Exists(path) => Value::Bool(evaluate_path(path, e_ctx).is_ok()),
    };
    Ok(EvaluationResult::new(value))
}

pub fn evaluate_path(path: &PathExpression, e_ctx: &EvaluationContext<'_>) -> Result<Value, TalesError> {
    evaluate_path_from(path, None, e_ctx)
}

/// Tries each alternate left to right and returns the first that resolves.
///
/// With `start` set, the first segment of every alternate is looked up on
/// `start` rather than as a root name.
pub fn evaluate_path_from(
    path: &PathExpression,
    start: Option<&Value>,
    e_ctx: &EvaluationContext<'_>,
) -> Result<Value, TalesError> {
    let mut attempts = Vec::with_capacity(path.alternates.len());
    for (position, alternate) in path.alternates.iter().enumerate() {
        match evaluate_alternate(alternate, start, e_ctx) {
            Ok(value) => {
                if position > 0 {
                    log::trace!("'{}' resolved by alternate {}", path.text, position + 1);
                }
                return Ok(value);
            }
            Err(e) => {
                log::trace!("Alternate {} of '{}' failed: {}", position + 1, path.text, e);
                attempts.push(e);
            }
        }
    }
    Err(TalesError::AllAlternatesFailed {
        expression: path.text.clone(),
        attempts,
    })
}

fn evaluate_alternate(
    alternate: &AlternateExpression,
    start: Option<&Value>,
    e_ctx: &EvaluationContext<'_>,
) -> Result<Value, TalesError> {
    let mut current: Option<Value> = start.cloned();
    for segment in &alternate.segments {
        let next = match segment {
            PathSegment::Standard { name, dynamic } => {
                let effective = if *dynamic {
                    resolve_root(name, e_ctx)?.to_text()
                } else {
                    name.clone()
                };
                match &current {
                    None => resolve_root(&effective, e_ctx)?,
                    Some(value) => e_ctx.resolver.resolve(value, &effective)?,
                }
            }
            PathSegment::NamespaceOperation { module, argument } => {
                let handler = e_ctx
                    .modules
                    .get(module)
                    .ok_or_else(|| TalesError::UnknownModule(module.clone()))?;
                handler.evaluate(current.as_ref(), argument, e_ctx)?
            }
        };
        current = Some(next);
    }
    Ok(current.unwrap_or_default())
}

/// Resolves the first segment of a path: local binding, global binding, then built-in names.
pub fn resolve_root(name: &str, e_ctx: &EvaluationContext<'_>) -> Result<Value, TalesError> {
    if let Some(value) = e_ctx.model.get(name) {
        return Ok(value);
    }
    let builtin = match name {
        "here" => e_ctx.model.root().clone(),
        "nothing" => Value::Null,
        "default" => Value::Default,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "repeat" => e_ctx.model.repetitions_value(),
        "options" => Value::Map(e_ctx.options.cloned().unwrap_or_default()),
        "attrs" => Value::Map(
            e_ctx
                .attributes
                .map(|attrs| {
                    attrs
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        MACROS_BINDING => registered_macros(e_ctx.model),
        "template" => Value::Map(BTreeMap::from([(
            MACROS_BINDING.to_string(),
            registered_macros(e_ctx.model),
        )])),
        "error" => match e_ctx.model.error() {
            Some(error) => error.clone(),
            None => return Err(TalesError::RootNotFound(name.to_string())),
        },
        _ => return Err(TalesError::RootNotFound(name.to_string())),
    };
    Ok(builtin)
}

fn registered_macros(model: &Model) -> Value {
    model
        .get_global(MACROS_BINDING)
        .unwrap_or_else(|| Value::Map(BTreeMap::new()))
}

/// Concatenates literal text with the text form of each substitution.
/// Any failing substitution fails the whole string.
pub fn evaluate_string(expr: &StringExpression, e_ctx: &EvaluationContext<'_>) -> Result<String, TalesError> {
    let mut out = String::new();
    for part in &expr.parts {
        match part {
            StringPart::Literal(text) => out.push_str(text),
            StringPart::Substitution(path) => out.push_str(&evaluate_path(path, e_ctx)?.to_text()),
        }
    }
    Ok(out)
}
