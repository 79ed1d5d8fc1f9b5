//! Rendering of ZPT templates: the TAL directive pipeline, the METAL macro
//! engine, source annotation and post-render cleanup.
//!
//! Rendering mutates a [`zpt_dom::Document`] in place. Each element is first
//! checked for `metal:use-macro`, then passed through the TAL handlers in a
//! fixed order (define, condition, repeat, content/replace, attributes,
//! omit-tag), with `tal:on-error` acting as a recovery boundary around the
//! element and everything below it.

pub mod annotation;
mod cleanup;
pub mod config;
pub mod context;
mod directive;
pub mod error;
pub mod metal;
pub mod renderer;
pub mod specs;
pub mod tal;

pub use annotation::SourceAnnotator;
pub use config::{ContextVisitor, DEFAULT_MAX_MACRO_DEPTH, NamespaceRegistry, RenderingConfig, RenderingConfigBuilder};
pub use context::{DocumentSettings, RenderingContext};
pub use error::RenderError;
pub use metal::{MacroExpansionContext, Slot, SlotFillers};
pub use renderer::TemplateRenderer;
pub use specs::{MetalSpecs, TalSpecs};
pub use tal::{AttributeHandlingResult, TalHandler};
