/*
 * editor.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * The controller that owns the current document snapshot.
 */

//! [`XmlEditor`] reacts to buffer notifications.
//!
//! Every text change replaces the current [`DocumentSnapshot`] before the
//! next notification is looked at, so a selection event that follows an
//! edit always resolves against the rebuilt trees.

use std::collections::VecDeque;
use std::sync::Arc;

use tei_error_reporting::DiagnosticMessage;
use tei_syntax::SyntaxKind;
use tei_xml::{Document, NodeRef};
use tei_xpath::NamespaceTable;

use crate::buffer::{BufferEvent, TextBuffer, TextRange};
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::navigation::{NavigationEvent, NavigationState, PendingRequest};
use crate::resolver::Resolver;
use crate::snapshot::{DocumentSnapshot, DocumentVersion};

/// A selection range with the DOM node it falls in, when one is linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub range: TextRange,
    pub node: Option<NodeRef>,
    pub xpath: Option<String>,
}

/// Notifications for the host, collected until [`XmlEditor::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    DocumentChanged {
        version: DocumentVersion,
        well_formed: bool,
        diagnostics: Vec<DiagnosticMessage>,
    },
    SelectionChanged(Vec<ResolvedSelection>),
    Navigation(NavigationEvent),
    ValidationUpdated {
        version: DocumentVersion,
        diagnostics: Vec<DiagnosticMessage>,
    },
}

pub struct XmlEditor<B: TextBuffer> {
    pub(crate) buffer: B,
    pub(crate) config: EditorConfig,
    pub(crate) namespaces: NamespaceTable,
    pub(crate) version: DocumentVersion,
    pub(crate) snapshot: Option<Arc<DocumentSnapshot>>,
    pub(crate) navigation: NavigationState,
    pub(crate) pending: VecDeque<PendingRequest>,
    pub(crate) validation: Vec<DiagnosticMessage>,
    outbox: Vec<EditorEvent>,
}

impl<B: TextBuffer> XmlEditor<B> {
    /// Create an editor over `buffer`. A non-empty buffer is parsed right away.
    pub fn new(buffer: B, config: EditorConfig) -> Self {
        let namespaces = config.namespace_table();
        let mut editor = XmlEditor {
            buffer,
            config,
            namespaces,
            version: DocumentVersion::default(),
            snapshot: None,
            navigation: NavigationState::default(),
            pending: VecDeque::new(),
            validation: Vec::new(),
            outbox: Vec::new(),
        };
        if !editor.buffer.text().is_empty() {
            editor.rebuild();
        }
        editor
    }

    /// Replace the buffer text with a new document and start over.
    pub fn load_document(&mut self, text: &str) {
        self.navigation = NavigationState::default();
        if !self.pending.is_empty() {
            tracing::debug!(dropped = self.pending.len(), "dropping requests for the previous document");
            self.pending.clear();
        }
        self.validation.clear();
        self.buffer.set_text(text);
        self.rebuild();
    }

    /// Apply one buffer notification.
    pub fn handle_event(&mut self, event: BufferEvent) {
        match event {
            BufferEvent::Changed { structural } => {
                tracing::trace!(structural, "buffer changed");
                self.rebuild();
            }
            BufferEvent::SelectionChanged(ranges) => self.selection_changed(ranges),
            BufferEvent::Ready => self.drain_pending(),
        }
    }

    /// Handle every notification the buffer has queued. Returns how many.
    pub fn process_buffer_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.buffer.poll_event() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    fn rebuild(&mut self) {
        self.version = self.version.next();
        let text: Arc<str> = Arc::from(self.buffer.text());
        let snapshot = DocumentSnapshot::build(self.version, text, self.config.strict_linking);
        if !snapshot.is_well_formed() {
            tracing::debug!(version = %self.version, "document is malformed; DOM queries disabled");
        }
        self.outbox.push(EditorEvent::DocumentChanged {
            version: self.version,
            well_formed: snapshot.is_well_formed(),
            diagnostics: snapshot.diagnostics().to_vec(),
        });
        self.snapshot = Some(Arc::new(snapshot));
    }

    fn selection_changed(&mut self, ranges: Vec<TextRange>) {
        let resolved: Vec<ResolvedSelection> = match self.resolver() {
            Ok(resolver) => ranges
                .iter()
                .map(|&range| {
                    let node = resolver.dom_node_at_offset(range.from).ok();
                    ResolvedSelection {
                        range,
                        node,
                        xpath: resolver.xpath_for_node(node),
                    }
                })
                .collect(),
            Err(_) => ranges
                .iter()
                .map(|&range| ResolvedSelection {
                    range,
                    node: None,
                    xpath: None,
                })
                .collect(),
        };
        let primary = resolved.first().and_then(|s| s.node);
        self.outbox.push(EditorEvent::SelectionChanged(resolved));
        match primary {
            Some(node) => self.bubble_selection(node),
            None => tracing::debug!("selection is not linked to a DOM node"),
        }
    }

    pub(crate) fn emit(&mut self, event: EditorEvent) {
        self.outbox.push(event);
    }

    /// Drain the notifications produced so far.
    pub fn take_events(&mut self) -> Vec<EditorEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Direct access for edits. Notifications reach the editor through
    /// [`XmlEditor::handle_event`] or [`XmlEditor::process_buffer_events`].
    pub fn buffer_mut(&mut self) -> &mut B {
        &mut self.buffer
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn version(&self) -> DocumentVersion {
        self.version
    }

    pub fn snapshot(&self) -> Result<&Arc<DocumentSnapshot>> {
        self.snapshot.as_ref().ok_or(EditorError::NoDocumentLoaded)
    }

    pub fn is_well_formed(&self) -> bool {
        self.snapshot.as_ref().is_some_and(|s| s.is_well_formed())
    }

    pub fn resolver(&self) -> Result<Resolver<'_>> {
        Ok(Resolver::new(self.snapshot()?, &self.namespaces))
    }

    /// The current DOM.
    pub fn xml_tree(&self) -> Result<&Document> {
        self.snapshot()?.dom().ok_or(EditorError::MalformedDocument)
    }

    /// The current DOM serialized.
    pub fn xml(&self) -> Result<String> {
        Ok(self.xml_tree()?.to_xml_string())
    }

    /// Kind and range of the parse-tree node at `offset`.
    pub fn node_at_offset(&self, offset: usize, climb_to_element: bool) -> Result<(SyntaxKind, TextRange)> {
        let node = self.resolver()?.node_at_offset(offset, climb_to_element)?;
        Ok((node.kind(), node.range().into()))
    }

    pub fn dom_node_at_offset(&self, offset: usize) -> Result<NodeRef> {
        self.resolver()?.dom_node_at_offset(offset)
    }

    pub fn dom_nodes_by_xpath(&self, xpath: &str) -> Result<Vec<NodeRef>> {
        self.resolver()?.dom_nodes_by_xpath(xpath)
    }

    pub fn dom_node_by_xpath(&self, xpath: &str) -> Result<Option<NodeRef>> {
        self.resolver()?.dom_node_by_xpath(xpath)
    }

    pub fn count_by_xpath(&self, xpath: &str) -> Result<usize> {
        self.resolver()?.count_by_xpath(xpath)
    }

    pub fn xpath_for_node(&self, node: Option<NodeRef>) -> Option<String> {
        self.resolver().ok()?.xpath_for_node(node)
    }

    /// Select the element of the first match of `xpath` and scroll to it.
    pub fn select_by_xpath(&mut self, xpath: &str) -> Result<TextRange> {
        let range = self.resolver()?.selection_for_xpath(xpath)?;
        self.buffer.set_selection(range);
        self.buffer.scroll_into_view(range);
        tracing::debug!(xpath, from = range.from, to = range.to, "selected node");
        Ok(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use pretty_assertions::assert_eq;

    fn editor(text: &str) -> XmlEditor<MemoryBuffer> {
        XmlEditor::new(MemoryBuffer::new(text), EditorConfig::default())
    }

    #[test]
    fn test_empty_buffer_has_no_document() {
        let editor = editor("");
        assert_eq!(editor.version(), DocumentVersion(0));
        assert_eq!(editor.xml_tree().err(), Some(EditorError::NoDocumentLoaded));
        assert_eq!(editor.count_by_xpath("/a"), Err(EditorError::NoDocumentLoaded));
    }

    #[test]
    fn test_edits_rebuild_before_the_next_event() {
        let mut editor = editor("<a><b/></a>");
        assert_eq!(editor.version(), DocumentVersion(1));
        editor.buffer_mut().insert(3, "<c/>").unwrap();
        editor.buffer_mut().select(vec![TextRange::caret(4)]);
        assert_eq!(editor.process_buffer_events(), 2);
        assert_eq!(editor.version(), DocumentVersion(2));

        let events = editor.take_events();
        let EditorEvent::SelectionChanged(selections) = &events[2] else {
            panic!("unexpected events {events:?}");
        };
        assert_eq!(selections[0].xpath.as_deref(), Some("/a[1]/c[1]"));
    }

    #[test]
    fn test_malformed_edit_disables_the_dom_until_fixed() {
        let mut editor = editor("<a><b></b></a>");
        editor.take_events();
        // "<a><b></a>"
        editor.buffer_mut().replace(TextRange::new(6, 10), "").unwrap();
        editor.process_buffer_events();
        assert!(!editor.is_well_formed());
        assert_eq!(editor.xml_tree().err(), Some(EditorError::MalformedDocument));
        assert_eq!(editor.dom_node_at_offset(4), Err(EditorError::MalformedDocument));
        match &editor.take_events()[..] {
            [EditorEvent::DocumentChanged { well_formed, diagnostics, .. }] => {
                assert!(!well_formed);
                assert!(!diagnostics.is_empty());
            }
            other => panic!("unexpected events {other:?}"),
        }

        editor.buffer_mut().insert(6, "</b>").unwrap();
        editor.process_buffer_events();
        assert!(editor.is_well_formed());
        let b = editor.dom_node_at_offset(4).unwrap();
        assert_eq!(editor.xpath_for_node(Some(b)).as_deref(), Some("/a[1]/b[1]"));
    }

    #[test]
    fn test_select_by_xpath_sets_and_scrolls() {
        let mut editor = editor("<a><b/><b/></a>");
        let range = editor.select_by_xpath("/a/b[2]").unwrap();
        assert_eq!(range, TextRange::new(7, 11));
        assert_eq!(editor.buffer().selection(), &[range]);
        assert_eq!(editor.buffer().scrolled_to(), Some(range));
        assert!(matches!(
            editor.select_by_xpath("/a/c"),
            Err(EditorError::NoMatchingDomNode { .. })
        ));
    }

    #[test]
    fn test_serialized_tree() {
        let editor = editor("<a x=\"1\"><b/></a>");
        assert_eq!(editor.xml().unwrap(), "<a x=\"1\"><b/></a>");
        assert_eq!(
            editor.node_at_offset(10, true).unwrap(),
            (SyntaxKind::Element, TextRange::new(9, 13))
        );
    }
}
