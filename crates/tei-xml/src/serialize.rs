//! Serialization back to XML text.

use crate::dom::{Document, NodeId, NodeKind};
use quick_xml::escape::{escape, partial_escape};
use std::fmt::Write;

impl Document {
    /// Serialize the whole document.
    ///
    /// Top-level parts (declaration, doctype, comments, PIs, root element)
    /// are separated by newlines; whitespace inside the root is preserved.
    pub fn to_xml_string(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        parts.extend(self.declaration.iter().cloned());
        parts.extend(self.doctype.iter().cloned());
        parts.extend(
            self.children(self.root())
                .iter()
                .map(|&child| self.node_to_xml_string(child)),
        );
        parts.join("\n")
    }

    /// Serialize one node and its subtree.
    pub fn node_to_xml_string(&self, id: NodeId) -> String {
        if matches!(self.kind(id), NodeKind::Document) {
            return self.to_xml_string();
        }
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            NodeKind::Document => {}
            NodeKind::Text(text) => out.push_str(&partial_escape(text.as_str())),
            NodeKind::Comment(text) => {
                let _ = write!(out, "<!--{}-->", text);
            }
            NodeKind::ProcessingInstruction { target, data } if data.is_empty() => {
                let _ = write!(out, "<?{}?>", target);
            }
            NodeKind::ProcessingInstruction { target, data } => {
                let _ = write!(out, "<?{} {}?>", target, data);
            }
            NodeKind::Element(element) => {
                let name = element.name.qualified();
                let _ = write!(out, "<{}", name);
                for (prefix, uri) in &element.namespace_declarations {
                    match prefix {
                        Some(prefix) => {
                            let _ = write!(out, " xmlns:{}=\"{}\"", prefix, escape(uri.as_str()));
                        }
                        None => {
                            let _ = write!(out, " xmlns=\"{}\"", escape(uri.as_str()));
                        }
                    }
                }
                for attr in &element.attributes {
                    let _ = write!(
                        out,
                        " {}=\"{}\"",
                        attr.name.qualified(),
                        escape(attr.value.as_str())
                    );
                }
                let children = self.children(id);
                if children.is_empty() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    for &child in children {
                        self.write_node(child, out);
                    }
                    let _ = write!(out, "</{}>", name);
                }
            }
        }
    }
}
