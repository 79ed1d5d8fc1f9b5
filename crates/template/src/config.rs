//! Rendering configuration and its builder.

use crate::context::RenderingContext;
use crate::error::RenderError;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use zpt_dom::{Document, Namespace};
use zpt_tales::{ModuleRegistry, NamespaceModule, Value};

pub const DEFAULT_MAX_MACRO_DEPTH: usize = 32;

/// A hook run on every rendering context before its directives are handled.
///
/// Visitors may inspect or rewrite the node, or add bindings to the context's
/// model. An error aborts the context like any directive failure would.
pub trait ContextVisitor: Send + Sync {
    fn name(&self) -> &str;

    fn visit(&self, doc: &mut Document, ctx: &mut RenderingContext) -> Result<(), RenderError>;
}

/// The TAL and METAL namespaces, plus any extra prefixes `tal:attributes`
/// may need to declare when it writes a prefixed attribute.
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    tal: Namespace,
    metal: Namespace,
    extra: BTreeMap<String, String>,
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self {
            tal: Namespace::tal(),
            metal: Namespace::metal(),
            extra: BTreeMap::new(),
        }
    }
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tal(mut self, namespace: Namespace) -> Self {
        self.tal = namespace;
        self
    }

    pub fn with_metal(mut self, namespace: Namespace) -> Self {
        self.metal = namespace;
        self
    }

    pub fn register(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.extra.insert(prefix.into(), uri.into());
        self
    }

    pub fn tal(&self) -> &Namespace {
        &self.tal
    }

    pub fn metal(&self) -> &Namespace {
        &self.metal
    }

    pub fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.extra.get(prefix).map(String::as_str)
    }
}

#[derive(Clone)]
pub struct RenderingConfig {
    /// Insert `source (line N)` comments at the root, around imported
    /// elements and at macro and slot definitions.
    pub source_annotation: bool,
    /// Stripped from the front of source names in annotations.
    pub annotation_root: Option<PathBuf>,
    pub output_encoding: String,
    pub context_visitors: Vec<Arc<dyn ContextVisitor>>,
    pub modules: ModuleRegistry,
    /// Exposed to expressions as `options`.
    pub keyword_options: BTreeMap<String, Value>,
    pub namespaces: NamespaceRegistry,
    pub max_macro_depth: usize,
    /// Strip TAL/METAL attributes, declarations and elements after rendering.
    pub remove_directive_attributes: bool,
}

impl Default for RenderingConfig {
    fn default() -> Self {
        Self {
            source_annotation: false,
            annotation_root: None,
            output_encoding: "utf-8".to_string(),
            context_visitors: Vec::new(),
            modules: ModuleRegistry::default(),
            keyword_options: BTreeMap::new(),
            namespaces: NamespaceRegistry::default(),
            max_macro_depth: DEFAULT_MAX_MACRO_DEPTH,
            remove_directive_attributes: true,
        }
    }
}

impl fmt::Debug for RenderingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderingConfig")
            .field("source_annotation", &self.source_annotation)
            .field("annotation_root", &self.annotation_root)
            .field("output_encoding", &self.output_encoding)
            .field(
                "context_visitors",
                &self.context_visitors.iter().map(|v| v.name().to_string()).collect::<Vec<_>>(),
            )
            .field("modules", &self.modules)
            .field("keyword_options", &self.keyword_options)
            .field("namespaces", &self.namespaces)
            .field("max_macro_depth", &self.max_macro_depth)
            .field("remove_directive_attributes", &self.remove_directive_attributes)
            .finish()
    }
}

impl RenderingConfig {
    pub fn builder() -> RenderingConfigBuilder {
        RenderingConfigBuilder::new()
    }
}

/// Builds a [`RenderingConfig`], starting from the defaults.
#[derive(Debug, Clone, Default)]
pub struct RenderingConfigBuilder {
    config: RenderingConfig,
}

impl RenderingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source_annotation(mut self, enabled: bool) -> Self {
        self.config.source_annotation = enabled;
        self
    }

    pub fn with_annotation_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.annotation_root = Some(root.into());
        self
    }

    pub fn with_output_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.config.output_encoding = encoding.into();
        self
    }

    pub fn with_context_visitor(mut self, visitor: impl ContextVisitor + 'static) -> Self {
        self.config.context_visitors.push(Arc::new(visitor));
        self
    }

    pub fn with_module(mut self, alias: impl Into<String>, module: impl NamespaceModule + 'static) -> Self {
        self.config.modules.register(alias, module);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.keyword_options.insert(key.into(), value.into());
        self
    }

    pub fn with_namespaces(mut self, namespaces: NamespaceRegistry) -> Self {
        self.config.namespaces = namespaces;
        self
    }

    pub fn with_max_macro_depth(mut self, depth: usize) -> Self {
        self.config.max_macro_depth = depth;
        self
    }

    pub fn with_directive_cleanup(mut self, enabled: bool) -> Self {
        self.config.remove_directive_attributes = enabled;
        self
    }

    pub fn build(self) -> RenderingConfig {
        self.config
    }
}
