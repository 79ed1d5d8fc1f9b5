//! Defines the registry and built-in implementations of namespace-operation modules.
//!
//! A path segment written `module:argument` hands the current value and the
//! argument text to the module registered under `module`.

use crate::engine::{self, EvaluationContext};
use crate::error::TalesError;
use crate::parser::{parse_expression, parse_path_expression, parse_string_expression};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub trait NamespaceModule: Send + Sync {
    /// `current` is `None` when the operation is the first segment of its alternate.
    fn evaluate(
        &self,
        current: Option<&Value>,
        argument: &str,
        e_ctx: &EvaluationContext<'_>,
    ) -> Result<Value, TalesError>;
}

#[derive(Clone)]
pub struct ModuleRegistry {
    modules: HashMap<String, Arc<dyn NamespaceModule>>,
}

impl ModuleRegistry {
    /// An empty registry, without the built-in modules.
    pub fn new() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }

    pub fn register(&mut self, alias: impl Into<String>, module: impl NamespaceModule + 'static) {
        self.register_arc(alias, Arc::new(module));
    }

    pub fn register_arc(&mut self, alias: impl Into<String>, module: Arc<dyn NamespaceModule>) {
        let alias = alias.into();
        if self.modules.insert(alias.clone(), module).is_some() {
            log::debug!("Namespace module '{}' replaced", alias);
        }
    }

    pub fn get(&self, alias: &str) -> Option<&Arc<dyn NamespaceModule>> {
        self.modules.get(alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.modules.contains_key(alias)
    }

    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("string", StringModule);
        registry.register("not", NotModule);
        registry.register("path", PathModule);
        registry.register("exists", ExistsModule);
        registry.register("pipe", PipeModule);
        registry
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("aliases", &self.aliases())
            .finish()
    }
}

/// `string:text with $substitutions`
pub struct StringModule;

impl NamespaceModule for StringModule {
    fn evaluate(
        &self,
        _current: Option<&Value>,
        argument: &str,
        e_ctx: &EvaluationContext<'_>,
    ) -> Result<Value, TalesError> {
        let expr = parse_string_expression(argument)?;
        Ok(Value::String(engine::evaluate_string(&expr, e_ctx)?))
    }
}

/// `not:expression` negates the expression; a bare `not:` negates the current value.
pub struct NotModule;

impl NamespaceModule for NotModule {
    fn evaluate(
        &self,
        current: Option<&Value>,
        argument: &str,
        e_ctx: &EvaluationContext<'_>,
    ) -> Result<Value, TalesError> {
        if argument.trim().is_empty() {
            let value = current.ok_or_else(|| TalesError::Module {
                module: "not".to_string(),
                message: "nothing to negate".to_string(),
            })?;
            return Ok(Value::Bool(!value.is_truthy()));
        }
        let expr = parse_expression(argument)?;
        let result = engine::evaluate(&expr, e_ctx)?;
        Ok(Value::Bool(!result.is_truthy()))
    }
}

/// `path:a/b` evaluates a nested path, starting from the current value when there is one.
pub struct PathModule;

impl NamespaceModule for PathModule {
    fn evaluate(
        &self,
        current: Option<&Value>,
        argument: &str,
        e_ctx: &EvaluationContext<'_>,
    ) -> Result<Value, TalesError> {
        let path = parse_path_expression(argument)?;
        engine::evaluate_path_from(&path, current, e_ctx)
    }
}

/// `exists:a/b` is true when the nested path resolves.
pub struct ExistsModule;

impl NamespaceModule for ExistsModule {
    fn evaluate(
        &self,
        current: Option<&Value>,
        argument: &str,
        e_ctx: &EvaluationContext<'_>,
    ) -> Result<Value, TalesError> {
        let path = parse_path_expression(argument)?;
        Ok(Value::Bool(engine::evaluate_path_from(&path, current, e_ctx).is_ok()))
    }
}

/// `pipe:source callable` applies the callable value to the source value.
/// The source is a path, the callable any expression.
pub struct PipeModule;

impl PipeModule {
    fn failure(message: impl Into<String>) -> TalesError {
        TalesError::Module {
            module: "pipe".to_string(),
            message: message.into(),
        }
    }
}

impl NamespaceModule for PipeModule {
    fn evaluate(
        &self,
        current: Option<&Value>,
        argument: &str,
        e_ctx: &EvaluationContext<'_>,
    ) -> Result<Value, TalesError> {
        let Some((source, callable)) = argument
            .trim()
            .split_once(char::is_whitespace)
            .map(|(source, callable)| (source, callable.trim()))
            .filter(|(_, callable)| !callable.is_empty())
        else {
            return Err(Self::failure(format!("expected 'source callable', found '{}'", argument.trim())));
        };

        let value = parse_path_expression(source)
            .and_then(|path| engine::evaluate_path_from(&path, current, e_ctx))
            .map_err(|e| Self::failure(format!("cannot resolve source '{}': {}", source, e)))?;
        let function = parse_expression(callable)
            .and_then(|expr| engine::evaluate(&expr, e_ctx))
            .map_err(|e| Self::failure(format!("cannot resolve callable '{}': {}", callable, e)))?
            .into_value();

        let Value::Object(obj) = &function else {
            return Err(Self::failure(format!("'{}' is a {} value, not a function", callable, function.type_name())));
        };
        match obj.call(&value) {
            Ok(Some(result)) => Ok(result),
            Ok(None) => Err(Self::failure(format!("'{}' is not callable", callable))),
            Err(e) => Err(Self::failure(format!("'{}' failed: {}", callable, e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Model;
    use crate::resolver::ValueResolver;
    use serde_json::json;

    fn eval(model: &Model, text: &str) -> Result<Value, TalesError> {
        let resolver = ValueResolver::default();
        let modules = ModuleRegistry::default();
        let e_ctx = EvaluationContext::new(model, &resolver, &modules);
        engine::evaluate(&parse_expression(text)?, &e_ctx).map(|r| r.into_value())
    }

    fn shop() -> Model {
        let model = Model::new(Value::from(json!({"price": 12, "name": "tea"})));
        model.add_global(
            "double",
            Value::function("double", |v| match v {
                Value::Int(i) => Ok(Value::Int(i * 2)),
                other => Err(TalesError::Conversion(format!("cannot double {}", other.type_name()))),
            }),
        );
        model
    }

    #[test]
    fn default_registry_has_builtins() {
        assert_eq!(
            ModuleRegistry::default().aliases(),
            vec!["exists", "not", "path", "pipe", "string"]
        );
    }

    #[test]
    fn pipe_applies_host_function() {
        let model = shop();
        assert_eq!(eval(&model, "pipe:here/price double").unwrap(), Value::Int(24));
        assert_eq!(eval(&model, "pipe:here/price  missing | double").unwrap(), Value::Int(24));
    }

    #[test]
    fn pipe_failures_are_module_errors() {
        let model = shop();
        for text in [
            "pipe:here/price",
            "pipe:here/nope double",
            "pipe:here/price nope",
            "pipe:here/name double",
            "pipe:here/price here/name",
        ] {
            let Err(TalesError::AllAlternatesFailed { attempts, .. }) = eval(&model, text) else {
                panic!("{text} should fail");
            };
            assert!(
                matches!(&attempts[..], [TalesError::Module { module, .. }] if module == "pipe"),
                "{text}: {attempts:?}"
            );
        }
    }
}
