//! Canonical location paths for DOM nodes.

use crate::dom::{Document, NodeId, NodeKind, NodeRef};
use std::fmt::Write;

/// Build the canonical `/tag[n]/...` path of `node`.
///
/// Steps use qualified tag names and the 1-based position among preceding
/// siblings with the same name, so the result selects exactly `node` when
/// evaluated with the document's own prefixes. Text, comment and PI nodes
/// end in `text()[n]`, `comment()[n]` or `processing-instruction()[n]`;
/// attributes append `/@name` to their owner's path. The document node is
/// `/`. Returns `None` for `None` and for nodes not attached to the document.
pub fn xpath_for_node(doc: &Document, node: Option<NodeRef>) -> Option<String> {
    let node = node?;
    let id = node.node();
    if !doc.contains(id) || !doc.is_attached(id) {
        return None;
    }

    let mut path = if id == doc.root() {
        String::new()
    } else {
        let mut steps: Vec<String> = std::iter::once(id)
            .chain(doc.ancestors(id))
            .take_while(|&n| n != doc.root())
            .map(|n| step(doc, n))
            .collect();
        steps.reverse();
        steps.iter().fold(String::new(), |mut acc, s| {
            acc.push('/');
            acc.push_str(s);
            acc
        })
    };

    if let NodeRef::Attribute { owner, index } = node {
        let attr = doc.attributes(owner).get(index)?;
        let _ = write!(path, "/@{}", attr.name.qualified());
    }

    if path.is_empty() {
        path.push('/');
    }
    Some(path)
}

fn step(doc: &Document, id: NodeId) -> String {
    let test = match doc.kind(id) {
        NodeKind::Element(e) => e.name.qualified().into_owned(),
        NodeKind::Text(_) => "text()".to_string(),
        NodeKind::Comment(_) => "comment()".to_string(),
        NodeKind::ProcessingInstruction { .. } => "processing-instruction()".to_string(),
        NodeKind::Document => return String::new(),
    };
    format!("{}[{}]", test, sibling_position(doc, id))
}

/// 1-based position among siblings matching the same step test.
fn sibling_position(doc: &Document, id: NodeId) -> usize {
    let Some(parent) = doc.parent(id) else {
        return 1;
    };
    let same_test = |other: NodeId| match (doc.kind(id), doc.kind(other)) {
        (NodeKind::Element(a), NodeKind::Element(b)) => a.name.qualified() == b.name.qualified(),
        (a, b) => std::mem::discriminant(a) == std::mem::discriminant(b),
    };
    doc.children(parent)
        .iter()
        .take_while(|&&c| c != id)
        .filter(|&&c| same_test(c))
        .count()
        + 1
}
