//! Builds a [`Document`] from markup using a streaming `quick-xml` reader.
use crate::document::Document;
use crate::error::{DomError, Location};
use crate::node::{Attribute, Element, NodeId, NodeKind, QualifiedName};
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event as XmlEvent};

fn get_line_col_from_pos(source: &str, pos: usize) -> (usize, usize) {
    let prefix = &source[..pos.min(source.len())];
    let line = prefix.matches('\n').count() + 1;
    let col = prefix.rfind('\n').map_or(pos + 1, |nl| pos - nl);
    (line, col)
}

fn markup_error(source: &str, pos: usize, message: impl ToString) -> DomError {
    DomError::Markup {
        message: message.to_string(),
        location: get_line_col_from_pos(source, pos).into(),
    }
}

impl Document {
    /// Parses a complete markup document.
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let mut doc = Document::new();
        let root = doc.root();
        read_into(&mut doc, root, source)?;
        Ok(doc)
    }

    /// Parses a document and records where it came from, for source annotations.
    pub fn parse_named(source: &str, name: &str) -> Result<Self, DomError> {
        let mut doc = Self::parse(source)?;
        doc.set_source_name(name);
        Ok(doc)
    }

    /// Parses a markup fragment (any number of top-level nodes) into detached
    /// nodes owned by this document.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<Vec<NodeId>, DomError> {
        let holder = self.create_element("fragment");
        read_into(self, holder, markup)?;
        let nodes = self.children(holder).to_vec();
        self.clear_children(holder);
        Ok(nodes)
    }
}

fn read_element(
    start: &BytesStart,
    reader: &Reader<&[u8]>,
    source: &str,
    pos: usize,
) -> Result<Element, DomError> {
    let raw_name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| markup_error(source, pos, e))?
        .to_string();
    let mut element = Element::new(&raw_name);
    element.position = Some(Location::from(get_line_col_from_pos(source, pos)));
    for attr in start.attributes() {
        let attr = attr.map_err(|e| markup_error(source, pos, e))?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|e| markup_error(source, pos, e))?;
        let value = attr
            .decode_and_unescape_value(reader.decoder())
            .map_err(|e| markup_error(source, pos, e))?;
        element.attributes.push(Attribute {
            name: QualifiedName::parse(key),
            value: value.into_owned(),
        });
    }
    Ok(element)
}

/// Adjacent text events (text split by entity references) collapse into one node.
fn append_text(doc: &mut Document, parent: NodeId, text: &str) {
    if let Some(&last) = doc.children(parent).last()
        && let NodeKind::Text(existing) = doc.kind_mut(last)
    {
        existing.push_str(text);
        return;
    }
    let node = doc.create_text(text);
    doc.append_child(parent, node);
}

fn read_into(doc: &mut Document, container: NodeId, source: &str) -> Result<(), DomError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut open: Vec<NodeId> = vec![container];

    loop {
        let pos = reader.buffer_position() as usize;
        let parent = *open.last().unwrap_or(&container);
        match reader
            .read_event_into(&mut buf)
            .map_err(|e| markup_error(source, pos, e))?
        {
            XmlEvent::Start(e) => {
                let element = read_element(&e, &reader, source, pos)?;
                let node = doc.create_node(NodeKind::Element(element));
                doc.append_child(parent, node);
                open.push(node);
            }
            XmlEvent::Empty(e) => {
                let element = read_element(&e, &reader, source, pos)?;
                let node = doc.create_node(NodeKind::Element(element));
                doc.append_child(parent, node);
            }
            XmlEvent::End(_) => {
                if open.len() <= 1 {
                    return Err(markup_error(source, pos, "unexpected end tag"));
                }
                if let Some(closed) = open.pop()
                    && let Some(element) = doc.element_mut(closed)
                {
                    element.end_position = Some(Location::from(get_line_col_from_pos(source, pos)));
                }
            }
            XmlEvent::Text(e) => {
                let raw_text = std::str::from_utf8(e.as_ref()).map_err(|e| markup_error(source, pos, e))?;
                let text = unescape(raw_text).map_err(|e| markup_error(source, pos, e))?;
                append_text(doc, parent, &text);
            }
            XmlEvent::GeneralRef(e) => {
                let resolved = if e.is_char_ref() {
                    e.resolve_char_ref()
                        .map_err(|err| markup_error(source, pos, err))?
                        .map(String::from)
                } else {
                    let name = e.decode().map_err(|err| markup_error(source, pos, err))?;
                    match resolve_predefined_entity(&name) {
                        Some(value) => Some(value.to_string()),
                        None => {
                            return Err(DomError::UnknownEntity {
                                name: name.into_owned(),
                                location: get_line_col_from_pos(source, pos).into(),
                            });
                        }
                    }
                };
                if let Some(text) = resolved {
                    append_text(doc, parent, &text);
                }
            }
            XmlEvent::CData(e) => {
                let node = doc.create_node(NodeKind::CData(String::from_utf8_lossy(&e).into_owned()));
                doc.append_child(parent, node);
            }
            XmlEvent::Comment(e) => {
                let node = doc.create_comment(String::from_utf8_lossy(&e).into_owned());
                doc.append_child(parent, node);
            }
            XmlEvent::PI(e) => {
                let node = doc.create_node(NodeKind::ProcessingInstruction(
                    String::from_utf8_lossy(&e).into_owned(),
                ));
                doc.append_child(parent, node);
            }
            XmlEvent::Decl(e) => {
                let version = e
                    .version()
                    .map(|v| String::from_utf8_lossy(&v).into_owned())
                    .unwrap_or_else(|_| "1.0".to_string());
                let encoding = e
                    .encoding()
                    .and_then(|r| r.ok())
                    .map(|v| String::from_utf8_lossy(&v).into_owned());
                let standalone = e
                    .standalone()
                    .and_then(|r| r.ok())
                    .map(|v| String::from_utf8_lossy(&v).into_owned());
                let node = doc.create_node(NodeKind::Declaration {
                    version,
                    encoding,
                    standalone,
                });
                doc.append_child(parent, node);
            }
            XmlEvent::DocType(e) => {
                let node = doc.create_node(NodeKind::DocType(
                    String::from_utf8_lossy(&e).trim().to_string(),
                ));
                doc.append_child(parent, node);
            }
            XmlEvent::Eof => break,
            _ => (),
        }
        buf.clear();
    }

    if open.len() > 1 {
        return Err(markup_error(source, source.len(), "unclosed element at end of input"));
    }
    log::trace!("Read markup into {} nodes", doc.descendants(container).len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_prolog_and_positions() {
        let d = Document::parse("<?xml version=\"1.0\"?>\n<!-- c -->\n<root>\n  <p a=\"1 &amp; 2\">x</p>\n</root>")
            .unwrap();
        let root = d.root_element().unwrap();
        let p = d.child_elements(root)[0];
        assert_eq!(d.attribute(p, "a"), Some("1 & 2"));
        assert_eq!(d.element(p).unwrap().position.map(|l| l.line), Some(4));
        assert!(matches!(d.kind(d.children(d.root())[0]), NodeKind::Declaration { .. }));
    }

    #[test]
    fn entity_references_merge_into_text() {
        let d = Document::parse("<p>a &lt; b &#65;</p>").unwrap();
        let p = d.root_element().unwrap();
        assert_eq!(d.children(p).len(), 1);
        assert_eq!(d.text_content(p), "a < b A");
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let err = Document::parse("<p>&nbsp;</p>").unwrap_err();
        assert!(matches!(err, DomError::UnknownEntity { ref name, .. } if name == "nbsp"));
    }

    #[test]
    fn fragment_yields_detached_nodes() {
        let mut d = Document::parse("<div/>").unwrap();
        let nodes = d.parse_fragment("<b>bold</b> tail").unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|&n| d.parent(n).is_none()));
    }

    #[test]
    fn unclosed_element_fails() {
        assert!(Document::parse("<a><b></a>").is_err());
        assert!(Document::parse("<a>").is_err());
    }
}
