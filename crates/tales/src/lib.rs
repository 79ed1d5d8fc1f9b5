//! TALES, the expression language of page templates.
//!
//! Expressions are parsed once into an [`ast::Expression`] (optionally through
//! the shared [`ExpressionCache`]) and evaluated against a [`Model`] scope
//! chain. Path traversal goes through a pluggable [`ValueResolver`], and
//! `module:argument` segments dispatch to a [`ModuleRegistry`].

pub mod ast;
pub mod cache;
pub mod engine;
pub mod error;
pub mod model;
pub mod modules;
pub mod parser;
pub mod repetition;
pub mod resolver;
pub mod value;

pub use ast::{AlternateExpression, DefinitionScope, Expression, PathExpression, PathSegment, StringExpression, StringPart};
pub use cache::ExpressionCache;
pub use engine::{EvaluationContext, EvaluationResult, MACROS_BINDING, evaluate, evaluate_path, evaluate_string};
pub use error::TalesError;
pub use model::{CaughtError, Model};
pub use modules::{ModuleRegistry, NamespaceModule};
pub use parser::{parse_definition_target, parse_expression, parse_path_expression, parse_string_expression};
pub use repetition::RepetitionInfo;
pub use resolver::{MemberStrategy, ValueResolver};
pub use value::{HostFunction, MetalMacro, TalesObject, Value};
