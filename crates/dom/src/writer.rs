//! Serializes a [`Document`] back to markup.
use crate::document::Document;
use crate::error::DomError;
use crate::node::{NodeId, NodeKind};
use encoding_rs::{Encoding, UTF_8};
use quick_xml::escape::{escape, partial_escape};
use std::borrow::Cow;
use std::io::Write;

impl Document {
    /// Serializes the whole document.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root()) {
            self.write_node(child, None, &mut out);
        }
        out
    }

    /// Serializes one node and its subtree.
    pub fn node_to_string(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, None, &mut out);
        out
    }

    /// Writes the document to a byte sink. When `encoding` is given the
    /// output is encoded with it, and it replaces the encoding named by an
    /// existing XML declaration. Characters the encoding cannot represent
    /// are an error.
    pub fn write_to<W: Write>(&self, sink: &mut W, encoding: Option<&str>) -> Result<(), DomError> {
        let mut out = String::new();
        for &child in self.children(self.root()) {
            self.write_node(child, encoding, &mut out);
        }
        sink.write_all(&encode_output(&out, encoding)?)?;
        Ok(())
    }

    fn write_node(&self, id: NodeId, encoding: Option<&str>, out: &mut String) {
        match self.kind(id) {
            NodeKind::Root => {
                for &child in self.children(id) {
                    self.write_node(child, encoding, out);
                }
            }
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.name.to_string());
                for attr in &element.attributes {
                    out.push(' ');
                    out.push_str(&attr.name.to_string());
                    out.push_str("=\"");
                    out.push_str(&escape(attr.value.as_str()));
                    out.push('"');
                }
                let children = self.children(id);
                if children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in children {
                    self.write_node(child, encoding, out);
                }
                out.push_str("</");
                out.push_str(&element.name.to_string());
                out.push('>');
            }
            NodeKind::Text(text) => out.push_str(&partial_escape(text.as_str())),
            NodeKind::CData(text) => {
                out.push_str("<![CDATA[");
                out.push_str(text);
                out.push_str("]]>");
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction(text) => {
                out.push_str("<?");
                out.push_str(text);
                out.push_str("?>");
            }
            NodeKind::Declaration {
                version,
                encoding: declared,
                standalone,
            } => {
                out.push_str("<?xml version=\"");
                out.push_str(version);
                out.push('"');
                if let Some(enc) = encoding.or(declared.as_deref()) {
                    out.push_str(" encoding=\"");
                    out.push_str(enc);
                    out.push('"');
                }
                if let Some(sa) = standalone {
                    out.push_str(" standalone=\"");
                    out.push_str(sa);
                    out.push('"');
                }
                out.push_str("?>");
            }
            NodeKind::DocType(text) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(text);
                out.push('>');
            }
        }
    }
}

fn encode_output<'a>(text: &'a str, label: Option<&str>) -> Result<Cow<'a, [u8]>, DomError> {
    let Some(label) = label else {
        return Ok(Cow::Borrowed(text.as_bytes()));
    };
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| DomError::UnknownEncoding(label.to_string()))?;
    if encoding == UTF_8 {
        return Ok(Cow::Borrowed(text.as_bytes()));
    }
    // UTF-16 labels resolve to encoders that emit UTF-8.
    if encoding.output_encoding() != encoding {
        return Err(DomError::Unencodable {
            encoding: encoding.name().to_string(),
            message: "no encoder for this encoding".to_string(),
        });
    }
    let (bytes, _, had_errors) = encoding.encode(text);
    if had_errors {
        let unmappable = text
            .chars()
            .find(|c| {
                let mut buf = [0u8; 4];
                encoding.encode(c.encode_utf8(&mut buf)).2
            })
            .map(|c| format!("'{}' has no mapping", c))
            .unwrap_or_else(|| "unmappable character".to_string());
        return Err(DomError::Unencodable {
            encoding: encoding.name().to_string(),
            message: unmappable,
        });
    }
    log::trace!("Encoded {} byte(s) of output as {}", bytes.len(), encoding.name());
    Ok(bytes)
}
