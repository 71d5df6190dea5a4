/*
 * linker.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Links parse-tree elements to DOM elements.
 */

//! The tree linker.
//!
//! Both trees are walked from their document roots in lock-step. At each
//! level only element children take part: the `i`-th element child of a
//! parse-tree element is paired with the `i`-th element child of its DOM
//! counterpart. A name disagreement aborts the pass. Unpaired children on
//! either side are reported and skipped, and the map is marked partial.

use rustc_hash::FxHashMap;
use tei_syntax::{SyntaxKind, SyntaxNode, SyntaxTree};
use tei_xml::{Document, NodeId, NodeKind, xpath_for_node};

use crate::error::{LinkError, StructuralImbalance, TreeSide};

/// Two-way association between parse-tree element start offsets and DOM
/// elements. The document pair is not stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMap {
    by_offset: FxHashMap<usize, NodeId>,
    by_node: FxHashMap<NodeId, usize>,
    warnings: Vec<StructuralImbalance>,
}

impl LinkMap {
    pub fn dom_node_at(&self, offset: usize) -> Option<NodeId> {
        self.by_offset.get(&offset).copied()
    }

    pub fn offset_of(&self, node: NodeId) -> Option<usize> {
        self.by_node.get(&node).copied()
    }

    /// Number of linked element pairs.
    pub fn len(&self) -> usize {
        self.by_offset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_offset.is_empty()
    }

    /// Whether some subtree could not be paired completely.
    pub fn is_partial(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[StructuralImbalance] {
        &self.warnings
    }

    /// Linked pairs ordered by offset.
    pub fn pairs(&self) -> Vec<(usize, NodeId)> {
        let mut pairs: Vec<_> = self.by_offset.iter().map(|(&o, &n)| (o, n)).collect();
        pairs.sort_unstable();
        pairs
    }

    fn insert(&mut self, offset: usize, node: NodeId) {
        self.by_offset.insert(offset, node);
        self.by_node.insert(node, offset);
    }
}

/// Link a whole document: the parse-tree root with the DOM document node.
pub fn link(tree: &SyntaxTree, doc: &Document) -> Result<LinkMap, LinkError> {
    link_from(tree.root(), doc, doc.root())
}

/// Link the subtrees rooted at `syntax` and `dom`.
///
/// The pair must be two elements or two documents.
pub fn link_from(syntax: SyntaxNode<'_>, doc: &Document, dom: NodeId) -> Result<LinkMap, LinkError> {
    let mut map = LinkMap::default();
    let mut stack = vec![(syntax, dom)];

    while let Some((syntax, dom)) = stack.pop() {
        match (syntax.kind(), doc.kind(dom)) {
            (SyntaxKind::Document, NodeKind::Document) => {}
            (SyntaxKind::Element, NodeKind::Element(element)) => {
                let found = syntax.tag_name().unwrap_or_default();
                if !element.name.is_qualified(found) {
                    return Err(LinkError::TagMismatch {
                        expected: element.name.qualified().into_owned(),
                        found: found.to_string(),
                        offset: syntax.start(),
                    });
                }
                map.insert(syntax.start(), dom);
            }
            (syntax_kind, dom_kind) => {
                return Err(LinkError::InvalidArguments {
                    syntax_kind: syntax_kind.to_string(),
                    dom_kind: dom_kind_name(dom_kind).to_string(),
                    offset: syntax.start(),
                });
            }
        }

        let mut syntax_children = syntax.element_children();
        let mut dom_children = doc.element_children(dom);
        let mut pairs = Vec::new();
        loop {
            match (syntax_children.next(), dom_children.next()) {
                (Some(s), Some(d)) => pairs.push((s, d)),
                (Some(s), None) => map.warnings.push(StructuralImbalance {
                    side: TreeSide::ParseTree,
                    tag: s.tag_name().unwrap_or_default().to_string(),
                    offset: s.start(),
                    dom_path: None,
                }),
                (None, Some(d)) => map.warnings.push(StructuralImbalance {
                    side: TreeSide::Dom,
                    tag: doc.tag_name(d).unwrap_or_default().into_owned(),
                    offset: syntax.start(),
                    dom_path: xpath_for_node(doc, Some(d.into())),
                }),
                (None, None) => break,
            }
        }
        // Reversed so pairs pop in document order
        stack.extend(pairs.into_iter().rev());
    }

    for warning in &map.warnings {
        tracing::warn!(
            side = %warning.side,
            tag = %warning.tag,
            offset = warning.offset,
            "structural imbalance between parse tree and DOM"
        );
    }
    tracing::debug!(elements = map.len(), partial = map.is_partial(), "linked trees");
    Ok(map)
}

fn dom_kind_name(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Document => "document",
        NodeKind::Element(_) => "element",
        NodeKind::Text(_) => "text",
        NodeKind::Comment(_) => "comment",
        NodeKind::ProcessingInstruction { .. } => "processing instruction",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn link_text(text: &str) -> (SyntaxTree, Document, Result<LinkMap, LinkError>) {
        let tree = tei_syntax::parse(text);
        let doc = tei_xml::parse(text).unwrap();
        let result = link(&tree, &doc);
        (tree, doc, result)
    }

    #[test]
    fn test_links_every_element() {
        let text = r#"<?pi x?><a><!-- c --><b x="1">t</b><c/><![CDATA[<z/>]]><d><e/></d></a>"#;
        let (tree, doc, result) = link_text(text);
        let map = result.unwrap();
        assert!(!map.is_partial());
        assert_eq!(map.len(), 5);
        for (offset, node) in map.pairs() {
            let element = tree.element_starting_at(offset).unwrap();
            assert_eq!(element.tag_name(), doc.tag_name(node).as_deref());
            assert_eq!(doc.range(node).map(|r| r.start), Some(offset));
            assert_eq!(map.offset_of(node), Some(offset));
        }
    }

    #[test]
    fn test_prefixed_names_compare_qualified() {
        let (_, _, result) = link_text(r#"<t:a xmlns:t="urn:t"><t:b/></t:a>"#);
        assert_eq!(result.unwrap().len(), 2);
    }

    #[test]
    fn test_tag_mismatch_is_fatal() {
        // Same shape, different names: built from two texts
        let tree = tei_syntax::parse("<a><b/></a>");
        let doc = tei_xml::parse("<a><c/></a>").unwrap();
        assert_eq!(
            link(&tree, &doc),
            Err(LinkError::TagMismatch {
                expected: "c".into(),
                found: "b".into(),
                offset: 3,
            })
        );

        let tree = tei_syntax::parse("<x/>");
        assert!(matches!(link(&tree, &doc), Err(LinkError::TagMismatch { offset: 0, .. })));
    }

    #[test]
    fn test_tag_comparison_is_case_sensitive() {
        let tree = tei_syntax::parse("<A/>");
        let doc = tei_xml::parse("<a/>").unwrap();
        assert!(link(&tree, &doc).is_err());
    }

    #[test]
    fn test_extra_children_are_warnings() {
        let tree = tei_syntax::parse("<a><b/><c/><d/></a>");
        let doc = tei_xml::parse("<a><b/></a>").unwrap();
        let map = link(&tree, &doc).unwrap();
        assert!(map.is_partial());
        assert_eq!(map.len(), 2);
        let sides: Vec<_> = map.warnings().iter().map(|w| (w.side, w.tag.as_str(), w.offset)).collect();
        assert_eq!(
            sides,
            vec![(TreeSide::ParseTree, "c", 7), (TreeSide::ParseTree, "d", 11)]
        );

        let tree = tei_syntax::parse("<a><b/></a>");
        let doc = tei_xml::parse("<a><b/><p/></a>").unwrap();
        let map = link(&tree, &doc).unwrap();
        assert_eq!(map.warnings()[0].side, TreeSide::Dom);
        assert_eq!(map.warnings()[0].dom_path.as_deref(), Some("/a[1]/p[1]"));
    }

    #[test]
    fn test_invalid_arguments() {
        let tree = tei_syntax::parse("<a/>");
        let doc = tei_xml::parse("<a/>").unwrap();
        let element = doc.document_element().unwrap();
        let err = link_from(tree.root(), &doc, element).unwrap_err();
        assert_eq!(
            err,
            LinkError::InvalidArguments {
                syntax_kind: "Document".into(),
                dom_kind: "element".into(),
                offset: 0,
            }
        );
    }

    #[test]
    fn test_subtree_linking() {
        let text = "<a><b><c/></b></a>";
        let tree = tei_syntax::parse(text);
        let doc = tei_xml::parse(text).unwrap();
        let b_syntax = tree.element_starting_at(3).unwrap();
        let b_dom = doc.element_children(doc.document_element().unwrap()).next().unwrap();
        let map = link_from(b_syntax, &doc, b_dom).unwrap();
        assert_eq!(map.pairs().iter().map(|p| p.0).collect::<Vec<_>>(), vec![3, 6]);
    }

    #[test]
    fn test_relinking_is_idempotent() {
        let text = "<a><b/><b><c/></b></a>";
        let (tree, doc, first) = link_text(text);
        assert_eq!(first.unwrap(), link(&tree, &doc).unwrap());
    }

    #[test]
    fn test_link_map_listing() {
        let text = "<a><b/><!-- c --><x:d xmlns:x=\"urn:x\"><e/></x:d></a>";
        let (_tree, doc, result) = link_text(text);
        let listing: Vec<String> = result
            .unwrap()
            .pairs()
            .into_iter()
            .map(|(offset, node)| format!("{} @{}", doc.tag_name(node).unwrap_or_default(), offset))
            .collect();
        insta::assert_snapshot!(listing.join("\n"), @r"
        a @0
        b @3
        x:d @17
        e @38
        ");
    }
}
