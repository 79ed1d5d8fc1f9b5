//! Source annotation: comments recording where rendered markup came from.

use crate::config::ContextVisitor;
use crate::context::RenderingContext;
use crate::error::RenderError;
use std::path::{MAIN_SEPARATOR, PathBuf};
use zpt_dom::{Document, Location, NodeId};

const DIVIDER_CHAR: char = '=';
const DIVIDER_LEN: usize = 78;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Start,
    End,
}

/// Adds a source comment before the root element, before and after imported
/// elements, before `define-macro` elements and after `define-slot` elements.
#[derive(Debug, Clone, Default)]
pub struct SourceAnnotator {
    base_path: Option<PathBuf>,
}

impl SourceAnnotator {
    pub fn new(base_path: Option<PathBuf>) -> Self {
        Self { base_path }
    }

    /// The comment text for one tag of `node`.
    fn annotation(&self, doc: &Document, node: NodeId, tag: Tag) -> String {
        let divider: String = std::iter::repeat_n(DIVIDER_CHAR, DIVIDER_LEN).collect();
        format!("\n{divider}\n{}\n{divider}\n", self.source_info(doc, node, tag))
    }

    fn source_info(&self, doc: &Document, node: NodeId, tag: Tag) -> String {
        let element = doc.element(node);
        let source = element
            .and_then(|e| e.imported_from.as_deref())
            .or_else(|| doc.source_name())
            .map(|name| self.strip_base_path(name))
            .unwrap_or_else(|| "<unknown source>".to_string());
        let location: Option<&Location> = element.and_then(|e| match tag {
            Tag::Start => e.position.as_ref(),
            Tag::End => e.end_position.as_ref(),
        });
        match location {
            Some(location) => format!("{} (line {})", source, location.line),
            None => source,
        }
    }

    fn strip_base_path(&self, name: &str) -> String {
        let Some(base) = self.base_path.as_ref().and_then(|p| p.to_str()).filter(|b| !b.is_empty()) else {
            return name.to_string();
        };
        match name.strip_prefix(base) {
            Some(relative) => relative.trim_start_matches([MAIN_SEPARATOR, '/']).to_string(),
            None => name.to_string(),
        }
    }

    fn comment_before(&self, doc: &mut Document, node: NodeId, tag: Tag) -> Result<(), RenderError> {
        let comment = doc.create_comment(self.annotation(doc, node, tag));
        doc.insert_before(node, comment)?;
        Ok(())
    }

    fn comment_after(&self, doc: &mut Document, node: NodeId, tag: Tag) -> Result<(), RenderError> {
        let comment = doc.create_comment(self.annotation(doc, node, tag));
        doc.insert_after(node, comment)?;
        Ok(())
    }
}

impl ContextVisitor for SourceAnnotator {
    fn name(&self) -> &str {
        "source-annotation"
    }

    fn visit(&self, doc: &mut Document, ctx: &mut RenderingContext) -> Result<(), RenderError> {
        let node = ctx.node();
        if doc.parent(node).is_none() {
            return Ok(());
        }
        let Some(element) = doc.element(node) else {
            return Ok(());
        };
        let imported = element.imported_from.is_some();
        let metal = &ctx.settings().metal;

        if doc.parent_element(node).is_none() {
            self.comment_before(doc, node, Tag::Start)
        } else if imported {
            self.comment_before(doc, node, Tag::Start)?;
            self.comment_after(doc, node, Tag::End)
        } else if doc.has_attribute(node, &metal.define_macro) {
            self.comment_before(doc, node, Tag::Start)
        } else if doc.has_attribute(node, &metal.define_slot) {
            self.comment_after(doc, node, Tag::Start)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tal::test_support::settings;
    use zpt_dom::NodeKind;
    use zpt_tales::{Model, Value};

    const METAL: &str = "xmlns:metal=\"http://xml.zope.org/namespaces/metal\"";

    fn comment_texts(doc: &Document, parent: NodeId) -> Vec<String> {
        doc.children(parent)
            .iter()
            .filter_map(|&c| match doc.kind(c) {
                NodeKind::Comment(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn root_element_gets_leading_comment() {
        let mut doc = Document::parse_named("<html>\n<body/></html>", "/srv/site/index.pt").unwrap();
        let root = doc.root_element().unwrap();
        let mut ctx = RenderingContext::new(&doc, root, Model::new(Value::Null), settings());
        SourceAnnotator::new(Some(PathBuf::from("/srv/site")))
            .visit(&mut doc, &mut ctx)
            .unwrap();
        let divider = "=".repeat(78);
        assert_eq!(
            comment_texts(&doc, doc.root()),
            vec![format!("\n{divider}\nindex.pt (line 1)\n{divider}\n")]
        );
    }

    #[test]
    fn slot_definitions_are_annotated_after() {
        let mut doc = Document::parse_named(
            &format!("<r {METAL}>\n<div metal:define-slot=\"s\"/></r>"),
            "page.pt",
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        let slot = doc.child_elements(root)[0];
        let mut ctx = RenderingContext::new(&doc, slot, Model::new(Value::Null), settings());
        SourceAnnotator::default().visit(&mut doc, &mut ctx).unwrap();
        let children = doc.children(root).to_vec();
        let position = children.iter().position(|&c| c == slot).unwrap();
        assert!(matches!(doc.kind(children[position + 1]), NodeKind::Comment(text) if text.contains("page.pt (line 2)")));
    }

    #[test]
    fn base_path_only_strips_matching_prefix() {
        let annotator = SourceAnnotator::new(Some(PathBuf::from("/srv")));
        assert_eq!(annotator.strip_base_path("/srv//a/b.pt"), "a/b.pt");
        assert_eq!(annotator.strip_base_path("/other/b.pt"), "/other/b.pt");
    }
}
