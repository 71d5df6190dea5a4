//! Arena-backed parse tree and borrowed node handles.

use crate::cursor::TreeCursor;
use crate::kind::SyntaxKind;
use std::fmt;
use std::sync::Arc;

/// Index of a node within its [`SyntaxTree`].
///
/// IDs are only meaningful for the tree that produced them. After an edit
/// the tree is rebuilt and old IDs must not be reused; store offsets instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxNodeId(pub(crate) u32);

impl SyntaxNodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: SyntaxKind,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) parent: Option<SyntaxNodeId>,
    /// Position of this node in its parent's `children`
    pub(crate) index_in_parent: u32,
    pub(crate) children: Vec<SyntaxNodeId>,
}

/// A parse tree over one snapshot of the buffer text.
///
/// Nodes are allocated in pre-order, so ID order is document order.
#[derive(Clone)]
pub struct SyntaxTree {
    text: Arc<str>,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    pub(crate) fn new(text: Arc<str>, nodes: Vec<NodeData>) -> Self {
        debug_assert!(matches!(nodes.first(), Some(n) if n.kind == SyntaxKind::Document));
        SyntaxTree { text, nodes }
    }

    /// The `Document` node.
    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: SyntaxNodeId(0),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Shared handle to the text the tree was built from.
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // A tree always holds at least its Document node.
        false
    }

    pub fn node(&self, id: SyntaxNodeId) -> Option<SyntaxNode<'_>> {
        (id.index() < self.nodes.len()).then_some(SyntaxNode { tree: self, id })
    }

    pub fn cursor(&self) -> TreeCursor<'_> {
        TreeCursor::new(self.root())
    }

    /// All nodes in document (pre-)order.
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode<'_>> + '_ {
        (0..self.nodes.len()).map(move |i| SyntaxNode {
            tree: self,
            id: SyntaxNodeId(i as u32),
        })
    }

    /// Innermost node covering `offset`.
    ///
    /// A node covers `[start, end)`, so at a boundary the node that starts at
    /// `offset` wins over the one that ends there. `offset == text.len()`
    /// resolves to the `Document`. Returns `None` past the end of the text.
    pub fn node_at(&self, offset: usize) -> Option<SyntaxNode<'_>> {
        if offset > self.text.len() {
            return None;
        }
        let mut current = self.root();
        'descend: loop {
            let children = &self.nodes[current.id.index()].children;
            // Children are sorted and non-overlapping: find the last child
            // starting at or before `offset`.
            let idx = children.partition_point(|c| self.nodes[c.index()].start <= offset);
            if idx > 0 {
                let candidate = children[idx - 1];
                let data = &self.nodes[candidate.index()];
                if data.start <= offset && offset < data.end {
                    current = SyntaxNode {
                        tree: self,
                        id: candidate,
                    };
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    /// Innermost `Element` or `Document` covering `offset`.
    pub fn element_at(&self, offset: usize) -> Option<SyntaxNode<'_>> {
        let node = self.node_at(offset)?;
        node.ancestors_or_self().find(|n| n.kind().is_element_like())
    }

    /// The `Element` node starting exactly at `offset`, if any.
    pub fn element_starting_at(&self, offset: usize) -> Option<SyntaxNode<'_>> {
        let node = self.node_at(offset)?;
        node.ancestors_or_self()
            .take_while(|n| n.start() == offset)
            .find(|n| n.kind() == SyntaxKind::Element)
    }

    /// Indented `Kind start..end` listing of the whole tree.
    pub fn dump(&self) -> String {
        let mut lines = Vec::with_capacity(self.nodes.len());
        crate::traversals::topdown_traverse(&mut self.cursor(), &mut |node, phase| {
            if phase == crate::traversals::TraversePhase::Enter {
                lines.push(format!(
                    "{}{:?} {}..{}",
                    "  ".repeat(node.depth()),
                    node.kind(),
                    node.start(),
                    node.end()
                ));
            }
            true
        });
        lines.join("\n")
    }

    pub(crate) fn data(&self, id: SyntaxNodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("len", &self.text.len())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

/// A node handle borrowing its tree.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t SyntaxTree,
    id: SyntaxNodeId,
}

impl<'t> SyntaxNode<'t> {
    pub fn id(&self) -> SyntaxNodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> SyntaxKind {
        self.tree.data(self.id).kind
    }

    pub fn start(&self) -> usize {
        self.tree.data(self.id).start
    }

    pub fn end(&self) -> usize {
        self.tree.data(self.id).end
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start()..self.end()
    }

    /// Source text covered by the node.
    pub fn text(&self) -> &'t str {
        &self.tree.text()[self.range()]
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.tree.data(self.id).parent.map(|id| self.with_id(id))
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + ExactSizeIterator + 't {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.tree.data(self.id).children.len()
    }

    pub fn first_child(&self) -> Option<SyntaxNode<'t>> {
        self.tree.data(self.id).children.first().map(|&id| self.with_id(id))
    }

    pub fn last_child(&self) -> Option<SyntaxNode<'t>> {
        self.tree.data(self.id).children.last().map(|&id| self.with_id(id))
    }

    pub fn next_sibling(&self) -> Option<SyntaxNode<'t>> {
        let data = self.tree.data(self.id);
        let parent = self.tree.data(data.parent?);
        parent
            .children
            .get(data.index_in_parent as usize + 1)
            .map(|&id| self.with_id(id))
    }

    pub fn prev_sibling(&self) -> Option<SyntaxNode<'t>> {
        let data = self.tree.data(self.id);
        let parent = self.tree.data(data.parent?);
        let idx = (data.index_in_parent as usize).checked_sub(1)?;
        parent.children.get(idx).map(|&id| self.with_id(id))
    }

    /// This node followed by its ancestors up to the `Document`.
    pub fn ancestors_or_self(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        std::iter::successors(Some(*self), SyntaxNode::parent)
    }

    pub fn depth(&self) -> usize {
        self.ancestors_or_self().count() - 1
    }

    /// Child nodes of kind `Element`.
    pub fn element_children(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.children().filter(|c| c.kind() == SyntaxKind::Element)
    }

    /// The start tag (`OpenTag` or `SelfClosingTag`) of an element.
    pub fn start_tag(&self) -> Option<SyntaxNode<'t>> {
        if self.kind() != SyntaxKind::Element {
            return None;
        }
        self.first_child().filter(|c| c.kind().is_start_tag())
    }

    /// The end tag of an element, when one was written.
    pub fn close_tag(&self) -> Option<SyntaxNode<'t>> {
        if self.kind() != SyntaxKind::Element {
            return None;
        }
        self.last_child().filter(|c| c.kind() == SyntaxKind::CloseTag)
    }

    /// Tag name of an element (via its start tag), or of a tag node itself.
    pub fn tag_name(&self) -> Option<&'t str> {
        let tag = match self.kind() {
            SyntaxKind::Element => self.start_tag()?,
            SyntaxKind::OpenTag
            | SyntaxKind::SelfClosingTag
            | SyntaxKind::CloseTag
            | SyntaxKind::MismatchedCloseTag => *self,
            _ => return None,
        };
        tag.children()
            .find(|c| c.kind() == SyntaxKind::TagName)
            .map(|name| name.text())
    }

    fn with_id(&self, id: SyntaxNodeId) -> SyntaxNode<'t> {
        SyntaxNode {
            tree: self.tree,
            id,
        }
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}..{}", self.kind(), self.start(), self.end())
    }
}

#[cfg(test)]
mod tests {
    use crate::{SyntaxKind, parse};

    #[test]
    fn test_node_at_prefers_node_starting_at_offset() {
        let tree = parse("<a><b/></a>");
        // offset 3 is both the end of <a>'s OpenTag and the start of <b/>
        let node = tree.node_at(3).unwrap();
        assert_eq!(node.kind(), SyntaxKind::SelfClosingTag);
        assert_eq!(tree.element_at(3).unwrap().tag_name(), Some("b"));
    }

    #[test]
    fn test_node_at_end_of_text_is_document() {
        let text = "<a></a>";
        let tree = parse(text);
        assert_eq!(tree.node_at(text.len()).unwrap().kind(), SyntaxKind::Document);
        assert!(tree.node_at(text.len() + 1).is_none());
    }

    #[test]
    fn test_siblings_and_parents() {
        let tree = parse("<a><b/>text<c/></a>");
        let a = tree.root().element_children().next().unwrap();
        let b = a.element_children().next().unwrap();
        assert_eq!(b.tag_name(), Some("b"));

        let text = b.next_sibling().unwrap();
        assert_eq!(text.kind(), SyntaxKind::Text);
        assert_eq!(text.text(), "text");
        assert_eq!(text.prev_sibling(), Some(b));
        assert_eq!(text.parent(), Some(a));

        let c = text.next_sibling().unwrap();
        assert_eq!(c.tag_name(), Some("c"));
        assert_eq!(c.next_sibling().unwrap().kind(), SyntaxKind::CloseTag);
        assert_eq!(c.depth(), 2);
    }

    #[test]
    fn test_element_starting_at() {
        let tree = parse("<a>\n  <b>x</b>\n</a>");
        assert_eq!(tree.element_starting_at(0).unwrap().tag_name(), Some("a"));
        assert_eq!(tree.element_starting_at(6).unwrap().tag_name(), Some("b"));
        assert!(tree.element_starting_at(7).is_none());
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let tree = parse("<a x='1'><b/><c>t</c></a>");
        let starts: Vec<usize> = tree.descendants().map(|n| n.start()).collect();
        let mut sorted = starts.clone();
        sorted.sort_unstable();
        assert_eq!(starts, sorted);
    }
}
