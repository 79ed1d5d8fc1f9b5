//! A parsed template ready to be rendered any number of times.

use crate::error::ZptError;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use zpt_dom::Document;
use zpt_tales::Value;
use zpt_template::{RenderingConfig, TemplateRenderer};

/// A template document plus the renderer and macro libraries it renders with.
///
/// The parsed source is never mutated: each render works on a fresh copy, so
/// one `ZptTemplate` can serve many renders, including from several threads.
#[derive(Debug, Clone)]
pub struct ZptTemplate {
    source: Arc<Document>,
    renderer: TemplateRenderer,
    libraries: Vec<Arc<Document>>,
}

impl ZptTemplate {
    pub fn parse(markup: &str) -> Result<Self, ZptError> {
        Ok(Self::from_document(Document::parse(markup)?))
    }

    /// Parses `markup`, recording `name` as its source for annotations.
    pub fn parse_named(markup: &str, name: &str) -> Result<Self, ZptError> {
        Ok(Self::from_document(Document::parse_named(markup, name)?))
    }

    pub fn from_document(document: Document) -> Self {
        Self {
            source: Arc::new(document),
            renderer: TemplateRenderer::default(),
            libraries: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: RenderingConfig) -> Self {
        self.renderer = TemplateRenderer::new(config).with_cache(Arc::clone(self.renderer.cache()));
        self
    }

    pub fn with_renderer(mut self, renderer: TemplateRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Makes the macros defined in `library` available through `macros`.
    pub fn with_library(mut self, library: &ZptTemplate) -> Self {
        self.libraries.push(Arc::clone(&library.source));
        self
    }

    pub fn document(&self) -> &Document {
        &self.source
    }

    pub fn renderer(&self) -> &TemplateRenderer {
        &self.renderer
    }

    /// Renders against `model` and returns the rendered tree.
    pub fn render_value(&self, model: Value) -> Result<Document, ZptError> {
        let mut document = Document::clone(&self.source);
        let libraries: Vec<&Document> = self.libraries.iter().map(Arc::as_ref).collect();
        self.renderer.render_with_libraries(&mut document, model, &libraries)?;
        log::debug!(
            "Rendered {} ({} expression(s) cached)",
            document.source_name().unwrap_or("template"),
            self.renderer.cache().len()
        );
        Ok(document)
    }

    /// Renders against any serializable model, exposed to the template as `here`.
    pub fn render<T: Serialize + ?Sized>(&self, model: &T) -> Result<Document, ZptError> {
        self.render_value(Value::from_serialize(model)?)
    }

    pub fn render_to_string<T: Serialize + ?Sized>(&self, model: &T) -> Result<String, ZptError> {
        Ok(self.render(model)?.to_xml_string())
    }

    /// Renders and writes the result in the configured output encoding, which
    /// is also named in the XML declaration if the template has one.
    pub fn render_to_writer<T: Serialize + ?Sized, W: Write>(&self, model: &T, sink: &mut W) -> Result<(), ZptError> {
        let document = self.render(model)?;
        document
            .write_to(sink, Some(&self.renderer.config().output_encoding))
            .map_err(ZptError::Output)?;
        sink.flush()?;
        Ok(())
    }
}
