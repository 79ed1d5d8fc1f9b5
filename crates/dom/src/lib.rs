//! An arena-backed markup tree for template rendering.
//!
//! Nodes live in a [`Document`] arena and are addressed through copyable
//! [`NodeId`] handles, so callers can clone, move and replace subtrees while
//! holding references to other nodes. Directive attributes are located
//! through [`AttributeSpec`]s, which match by namespace URI when one is
//! declared and by prefix otherwise.

pub mod document;
pub mod error;
pub mod namespace;
pub mod node;
mod reader;
mod writer;

pub use document::Document;
pub use error::{DomError, Location};
pub use namespace::{AttributeSpec, METAL_NAMESPACE_URI, Namespace, TAL_NAMESPACE_URI};
pub use node::{Attribute, Element, NodeId, NodeKind, QualifiedName};
