//! Zope Page Templates.
//!
//! Templates are well-formed markup carrying `tal:` directives, evaluated
//! with TALES expressions, plus `metal:` macros for sharing markup between
//! templates.
//!
//! ```no_run
//! use zpt::ZptTemplate;
//! use serde_json::json;
//!
//! let template = ZptTemplate::parse(
//!     r#"<p xmlns:tal="http://xml.zope.org/namespaces/tal" tal:content="here/name">x</p>"#,
//! )?;
//! assert_eq!(template.render_to_string(&json!({"name": "World"}))?, "<p>World</p>");
//! # Ok::<(), zpt::ZptError>(())
//! ```

pub mod error;
pub mod template;

pub use error::ZptError;
pub use template::ZptTemplate;

pub use zpt_dom as dom;
pub use zpt_tales as tales;
pub use zpt_template as rendering;

pub use zpt_dom::{Document, NodeId};
pub use zpt_tales::{TalesObject, Value};
pub use zpt_template::{ContextVisitor, NamespaceRegistry, RenderError, RenderingConfig, TemplateRenderer};
