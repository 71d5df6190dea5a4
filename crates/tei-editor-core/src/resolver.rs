/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Lookups between text offsets, parse-tree elements and DOM nodes.
 */

use tei_syntax::{SyntaxKind, SyntaxNode};
use tei_xml::{Document, NodeRef};
use tei_xpath::{NamespaceTable, XPath};

use crate::buffer::TextRange;
use crate::error::{EditorError, Result};
use crate::linker::LinkMap;
use crate::snapshot::DocumentSnapshot;

/// Queries against one [`DocumentSnapshot`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'s> {
    snapshot: &'s DocumentSnapshot,
    namespaces: &'s NamespaceTable,
}

impl<'s> Resolver<'s> {
    pub fn new(snapshot: &'s DocumentSnapshot, namespaces: &'s NamespaceTable) -> Self {
        Resolver {
            snapshot,
            namespaces,
        }
    }

    pub fn snapshot(&self) -> &'s DocumentSnapshot {
        self.snapshot
    }

    pub fn dom(&self) -> Result<&'s Document> {
        self.snapshot.dom().ok_or(EditorError::MalformedDocument)
    }

    fn link_map(&self) -> Option<&'s LinkMap> {
        self.snapshot.link_map()
    }

    /// Innermost parse-tree node covering `offset`, climbing to its
    /// `Element` or `Document` when `climb_to_element` is set.
    pub fn node_at_offset(&self, offset: usize, climb_to_element: bool) -> Result<SyntaxNode<'s>> {
        let tree = self.snapshot.syntax();
        let node = if climb_to_element {
            tree.element_at(offset)
        } else {
            tree.node_at(offset)
        };
        node.ok_or(EditorError::NoNodeAtPosition { offset })
    }

    /// The DOM node linked to the element around `offset`.
    pub fn dom_node_at_offset(&self, offset: usize) -> Result<NodeRef> {
        let dom = self.dom()?;
        let element = self.node_at_offset(offset, true)?;
        if element.kind() == SyntaxKind::Document {
            return Ok(NodeRef::Node(dom.root()));
        }
        self.link_map()
            .and_then(|map| map.dom_node_at(element.start()))
            .map(NodeRef::Node)
            .ok_or(EditorError::NoMappedDomNode { offset })
    }

    pub fn dom_nodes_by_xpath(&self, xpath: &str) -> Result<Vec<NodeRef>> {
        let dom = self.dom()?;
        let compiled = XPath::compile(xpath, self.namespaces).map_err(|e| EditorError::xpath(xpath, e))?;
        compiled
            .select(dom, NodeRef::Node(dom.root()))
            .map_err(|e| EditorError::xpath(xpath, e))
    }

    pub fn dom_node_by_xpath(&self, xpath: &str) -> Result<Option<NodeRef>> {
        Ok(self.dom_nodes_by_xpath(xpath)?.first().copied())
    }

    pub fn count_by_xpath(&self, xpath: &str) -> Result<usize> {
        let dom = self.dom()?;
        let compiled = XPath::compile(xpath, self.namespaces).map_err(|e| EditorError::xpath(xpath, e))?;
        compiled
            .count(dom, NodeRef::Node(dom.root()))
            .map_err(|e| EditorError::xpath(xpath, e))
    }

    /// Text range of the parse-tree element linked to `node`. Attributes
    /// resolve to their owner element; the document spans the whole text.
    pub fn range_of(&self, node: NodeRef) -> Option<TextRange> {
        let dom = self.snapshot.dom()?;
        let id = node.node();
        if id == dom.root() {
            return Some(TextRange::new(0, self.snapshot.text().len()));
        }
        let offset = self.link_map()?.offset_of(id)?;
        let element = self.snapshot.syntax().element_starting_at(offset)?;
        Some(element.range().into())
    }

    /// Range the first match of `xpath` occupies in the text.
    pub fn selection_for_xpath(&self, xpath: &str) -> Result<TextRange> {
        let node = self
            .dom_node_by_xpath(xpath)?
            .ok_or_else(|| EditorError::NoMatchingDomNode {
                xpath: xpath.to_string(),
            })?;
        self.range_of(node).ok_or_else(|| EditorError::NoMappedOffset {
            xpath: xpath.to_string(),
        })
    }

    /// Canonical `/name[n]` path of `node` in the current DOM.
    pub fn xpath_for_node(&self, node: Option<NodeRef>) -> Option<String> {
        tei_xml::xpath_for_node(self.snapshot.dom()?, node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DocumentVersion;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const TEXT: &str = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><text><p n="1">one <hi>two</hi></p><p>three</p></text></TEI>"#;

    fn snapshot(text: &str) -> DocumentSnapshot {
        DocumentSnapshot::build(DocumentVersion(1), Arc::from(text), false)
    }

    #[test]
    fn test_offsets_resolve_to_linked_elements() {
        let snapshot = snapshot(TEXT);
        let ns = NamespaceTable::default();
        let resolver = Resolver::new(&snapshot, &ns);
        let dom = resolver.dom().unwrap();

        let inside_hi = TEXT.find("two").unwrap();
        let node = resolver.dom_node_at_offset(inside_hi).unwrap();
        assert_eq!(dom.tag_name(node.node()).as_deref(), Some("hi"));

        // Text inside <p> but outside <hi> climbs to <p>
        let inside_p = TEXT.find("one").unwrap();
        let p = resolver.dom_node_at_offset(inside_p).unwrap();
        assert_eq!(
            resolver.xpath_for_node(Some(p)).as_deref(),
            Some("/TEI[1]/text[1]/p[1]")
        );

        // The end of the text is the document
        let end = resolver.dom_node_at_offset(TEXT.len()).unwrap();
        assert_eq!(end, NodeRef::Node(dom.root()));
        assert_eq!(resolver.xpath_for_node(Some(end)).as_deref(), Some("/"));

        assert_eq!(
            resolver.dom_node_at_offset(TEXT.len() + 1),
            Err(EditorError::NoNodeAtPosition {
                offset: TEXT.len() + 1
            })
        );
    }

    #[test]
    fn test_node_at_offset_without_climbing() {
        let snapshot = snapshot(TEXT);
        let ns = NamespaceTable::default();
        let resolver = Resolver::new(&snapshot, &ns);
        let offset = TEXT.find("one").unwrap();
        assert_eq!(resolver.node_at_offset(offset, false).unwrap().kind(), SyntaxKind::Text);
        assert_eq!(resolver.node_at_offset(offset, true).unwrap().kind(), SyntaxKind::Element);
        // On a `<`, the element starting there wins
        let hi = TEXT.find("<hi>").unwrap();
        assert_eq!(resolver.node_at_offset(hi, true).unwrap().start(), hi);
    }

    #[test]
    fn test_xpath_selection_ranges() {
        let snapshot = snapshot(TEXT);
        let ns = NamespaceTable::default();
        let resolver = Resolver::new(&snapshot, &ns);
        assert_eq!(resolver.count_by_xpath("//tei:p").unwrap(), 2);

        let range = resolver.selection_for_xpath("//tei:p[2]").unwrap();
        assert_eq!(&TEXT[range.start()..range.end()], "<p>three</p>");

        // Attributes select their owner
        let range = resolver.selection_for_xpath("//tei:p/@n").unwrap();
        assert!(TEXT[range.start()..range.end()].starts_with("<p n=\"1\">"));

        assert_eq!(
            resolver.selection_for_xpath("//tei:div"),
            Err(EditorError::NoMatchingDomNode {
                xpath: "//tei:div".into()
            })
        );
        assert!(matches!(
            resolver.count_by_xpath("//tei:p["),
            Err(EditorError::XPath { .. })
        ));
        assert!(matches!(
            resolver.count_by_xpath("string(//tei:p)"),
            Err(EditorError::XPath { source: tei_xpath::XPathError::NotANodeSet, .. })
        ));
        assert_eq!(resolver.count_by_xpath("//tei:div").unwrap(), 0);
    }

    #[test]
    fn test_malformed_documents_refuse_dom_queries() {
        let snapshot = snapshot("<a><b></a>");
        let ns = NamespaceTable::default();
        let resolver = Resolver::new(&snapshot, &ns);
        assert_eq!(resolver.dom_node_at_offset(1), Err(EditorError::MalformedDocument));
        assert_eq!(resolver.count_by_xpath("/a"), Err(EditorError::MalformedDocument));
        // The parse tree still answers
        assert_eq!(resolver.node_at_offset(4, true).unwrap().tag_name(), Some("b"));
    }

    #[test]
    fn test_unlinked_snapshot() {
        let mut snapshot = snapshot("<a><b/></a>");
        snapshot.replace_link(None);
        let ns = NamespaceTable::default();
        let resolver = Resolver::new(&snapshot, &ns);
        assert_eq!(
            resolver.dom_node_at_offset(3),
            Err(EditorError::NoMappedDomNode { offset: 3 })
        );
        assert_eq!(
            resolver.selection_for_xpath("/a/b"),
            Err(EditorError::NoMappedOffset { xpath: "/a/b".into() })
        );
        // XPath evaluation only needs the DOM
        assert_eq!(resolver.count_by_xpath("/a/b").unwrap(), 1);
    }
}
