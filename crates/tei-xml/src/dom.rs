//! Arena DOM types.

use std::borrow::Cow;
use std::ops::Range;

/// Identity of a node within one [`Document`].
///
/// Parsed nodes are allocated in document order, so comparing two IDs of
/// attached nodes compares their document position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node or an attribute of an element.
///
/// Attributes are not tree nodes but XPath can select them, so anything
/// that carries "a DOM node" across crate boundaries uses this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Node(NodeId),
    Attribute { owner: NodeId, index: usize },
}

impl NodeRef {
    /// The tree node itself, or the owner element of an attribute.
    pub fn node(self) -> NodeId {
        match self {
            NodeRef::Node(id) => id,
            NodeRef::Attribute { owner, .. } => owner,
        }
    }

    pub fn as_node(self) -> Option<NodeId> {
        match self {
            NodeRef::Node(id) => Some(id),
            NodeRef::Attribute { .. } => None,
        }
    }

    pub fn is_attribute(self) -> bool {
        matches!(self, NodeRef::Attribute { .. })
    }
}

impl From<NodeId> for NodeRef {
    fn from(id: NodeId) -> Self {
        NodeRef::Node(id)
    }
}

/// A namespace-resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
    /// Resolved namespace URI; `None` when the name is in no namespace.
    pub namespace: Option<String>,
}

impl QName {
    pub fn new(prefix: Option<String>, local: impl Into<String>, namespace: Option<String>) -> Self {
        QName {
            prefix,
            local: local.into(),
            namespace,
        }
    }

    /// The name as written: `prefix:local` or `local`.
    pub fn qualified(&self) -> Cow<'_, str> {
        match &self.prefix {
            Some(prefix) => Cow::Owned(format!("{}:{}", prefix, self.local)),
            None => Cow::Borrowed(&self.local),
        }
    }

    /// Compare against a name as written, without allocating.
    pub fn is_qualified(&self, name: &str) -> bool {
        match &self.prefix {
            Some(prefix) => name
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .is_some_and(|local| local == self.local),
            None => name == self.local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    /// Value after entity expansion
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: QName,
    /// Attributes in source order, excluding namespace declarations.
    pub attributes: Vec<Attribute>,
    /// `xmlns` / `xmlns:p` declarations made on this element. A `None`
    /// prefix is the default namespace.
    pub namespace_declarations: Vec<(Option<String>, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element(ElementData),
    /// Character data; CDATA sections are merged into adjacent text.
    Text(String),
    Comment(String),
    ProcessingInstruction { target: String, data: String },
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) range: Option<Range<usize>>,
}

/// A parsed XML document.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<NodeData>,
    /// Raw `<?xml ...?>` declaration, if the source had one
    pub(crate) declaration: Option<String>,
    /// Raw `<!DOCTYPE ...>` text, if the source had one
    pub(crate) doctype: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only its document node.
    pub fn new() -> Self {
        Document {
            nodes: vec![NodeData {
                kind: NodeKind::Document,
                parent: None,
                children: Vec::new(),
                range: None,
            }],
            declaration: None,
            doctype: None,
        }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// The single root element.
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(self.root())
            .iter()
            .copied()
            .find(|&id| self.is_element(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn declaration(&self) -> Option<&str> {
        self.declaration.as_deref()
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element(_))
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.kind(id) {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    pub fn name(&self, id: NodeId) -> Option<&QName> {
        self.element(id).map(|e| &e.name)
    }

    /// Qualified tag name (`prefix:local` or `local`) of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<Cow<'_, str>> {
        self.name(id).map(QName::qualified)
    }

    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.name(id).and_then(|n| n.namespace.as_deref())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(move |&c| self.is_element(c))
    }

    /// Parent, grandparent, ... up to the document node.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&n| self.parent(n))
    }

    /// `id` and everything below it in document order.
    pub fn descendants_or_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.element(id)
            .map(|e| e.attributes.as_slice())
            .unwrap_or_default()
    }

    /// Attribute value by qualified name as written.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|a| a.name.is_qualified(name))
            .map(|a| a.value.as_str())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Text(text) | NodeKind::Comment(text) => text.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone(),
            NodeKind::Document | NodeKind::Element(_) => self
                .descendants_or_self(id)
                .into_iter()
                .filter_map(|n| match self.kind(n) {
                    NodeKind::Text(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect(),
        }
    }

    /// Byte range of the node in the parsed text; `None` for created nodes.
    pub fn range(&self, id: NodeId) -> Option<Range<usize>> {
        self.nodes[id.index()].range.clone()
    }

    /// True when the node hangs off the document node.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root() || self.ancestors(id).last() == Some(self.root())
    }

    /// Create an element that is not part of the tree.
    pub fn create_element(&mut self, name: QName) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind: NodeKind::Element(ElementData {
                name,
                attributes: Vec::new(),
                namespace_declarations: Vec::new(),
            }),
            parent: None,
            children: Vec::new(),
            range: None,
        });
        id
    }

    /// Namespace URI bound to `prefix` in scope at `id`.
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(crate::XML_NAMESPACE);
        }
        std::iter::once(id)
            .chain(self.ancestors(id))
            .filter_map(|n| self.element(n))
            .flat_map(|e| e.namespace_declarations.iter())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
            .filter(|uri| !uri.is_empty())
    }

    pub(crate) fn push(&mut self, kind: NodeKind, parent: NodeId, range: Range<usize>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            range: Some(range),
        });
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn test_qualified_names() {
        let plain = QName::new(None, "div", None);
        assert_eq!(plain.qualified(), "div");
        assert!(plain.is_qualified("div"));
        assert!(!plain.is_qualified("tei:div"));

        let prefixed = QName::new(Some("tei".into()), "div", Some(crate::TEI_NAMESPACE.into()));
        assert_eq!(prefixed.qualified(), "tei:div");
        assert!(prefixed.is_qualified("tei:div"));
        assert!(!prefixed.is_qualified("div"));
        assert!(!prefixed.is_qualified("teidiv"));
    }

    #[test]
    fn test_navigation_helpers() {
        let doc = parse("<a><b>one</b><!--c--><b>two<c/></b></a>").unwrap();
        let a = doc.document_element().unwrap();
        let bs: Vec<NodeId> = doc.element_children(a).collect();
        assert_eq!(bs.len(), 2);
        assert_eq!(doc.children(a).len(), 3);
        assert_eq!(doc.text_content(a), "onetwo");

        let c = doc.element_children(bs[1]).next().unwrap();
        let ancestors: Vec<NodeId> = doc.ancestors(c).collect();
        assert_eq!(ancestors, vec![bs[1], a, doc.root()]);
        assert!(doc.is_attached(c));
    }

    #[test]
    fn test_created_elements_are_detached() {
        let mut doc = parse("<a/>").unwrap();
        let created = doc.create_element(QName::new(None, "note", None));
        assert!(!doc.is_attached(created));
        assert_eq!(doc.range(created), None);
        assert_eq!(doc.tag_name(created).as_deref(), Some("note"));
    }

    #[test]
    fn test_lookup_namespace() {
        let doc = parse(r#"<a xmlns="urn:d" xmlns:x="urn:x"><b xmlns=""/></a>"#).unwrap();
        let a = doc.document_element().unwrap();
        let b = doc.element_children(a).next().unwrap();
        assert_eq!(doc.lookup_namespace(a, None), Some("urn:d"));
        assert_eq!(doc.lookup_namespace(b, Some("x")), Some("urn:x"));
        assert_eq!(doc.lookup_namespace(b, None), None);
        assert_eq!(doc.lookup_namespace(b, Some("xml")), Some(crate::XML_NAMESPACE));
    }
}
