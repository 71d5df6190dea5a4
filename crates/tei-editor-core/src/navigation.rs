/*
 * navigation.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Record-level navigation over a repeating parent path.
 */

//! The navigation controller.
//!
//! A parent path is an XPath matching the repeating records of a document,
//! for example `//tei:biblStruct`. Records are addressed by a 1-based index
//! into its matches. Any selection made in the buffer bubbles up to the
//! nearest ancestor whose name matches the last step of the parent path.

use tei_xml::{Document, NodeId, NodeRef};
use tei_xpath::{Expr, NodeTest, XPath};

use crate::buffer::{TextBuffer, TextRange};
use crate::editor::{EditorEvent, XmlEditor};
use crate::error::{EditorError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationState {
    pub parent_path: Option<String>,
    /// 1-based
    pub current_index: usize,
    pub selected_node: Option<NodeRef>,
    pub selected_xpath: Option<String>,
}

impl Default for NavigationState {
    fn default() -> Self {
        NavigationState {
            parent_path: None,
            current_index: 1,
            selected_node: None,
            selected_xpath: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// A selection bubbled up to a new record
    NodeSelected { node: NodeRef, xpath: Option<String> },
    /// A record was selected by index
    IndexSelected { index: usize, range: TextRange },
}

/// Requests waiting for the buffer to become ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingRequest {
    SelectByIndex(usize),
}

/// The name test of the step that selects the final nodes of `expr`.
fn final_node_test(expr: &Expr) -> Option<&NodeTest> {
    match expr {
        Expr::Path { steps, .. } => steps.last().map(|step| &step.test),
        Expr::Filter { primary, steps, .. } => match steps.last() {
            Some(step) => Some(&step.test),
            None => final_node_test(primary),
        },
        Expr::Union(_, rhs) => final_node_test(rhs),
        _ => None,
    }
}

fn element_matches(doc: &Document, node: NodeId, test: &NodeTest, ignore_case: bool) -> bool {
    let Some(name) = doc.name(node).filter(|_| doc.is_element(node)) else {
        return false;
    };
    match test {
        NodeTest::Any => true,
        NodeTest::AnyInNamespace(uri) => name.namespace.as_deref() == Some(uri.as_str()),
        NodeTest::Name { namespace, local } => {
            let same_local = if ignore_case {
                name.local.eq_ignore_ascii_case(local)
            } else {
                name.local == *local
            };
            same_local && name.namespace == *namespace
        }
        _ => false,
    }
}

impl<B: TextBuffer> XmlEditor<B> {
    /// Set the repeating container. The index goes back to 1.
    pub fn set_parent_path(&mut self, xpath: impl Into<String>) {
        let xpath = xpath.into();
        tracing::debug!(parent_path = %xpath, "parent path set");
        self.navigation.parent_path = Some(xpath);
        self.navigation.current_index = 1;
    }

    pub fn parent_path(&self) -> Option<&str> {
        self.navigation.parent_path.as_deref()
    }

    pub fn current_index(&self) -> usize {
        self.navigation.current_index
    }

    pub fn selected_node(&self) -> Option<NodeRef> {
        self.navigation.selected_node
    }

    pub fn selected_xpath(&self) -> Option<&str> {
        self.navigation.selected_xpath.as_deref()
    }

    pub fn navigation(&self) -> &NavigationState {
        &self.navigation
    }

    fn require_parent_path(&self) -> Result<String> {
        self.navigation
            .parent_path
            .clone()
            .ok_or(EditorError::NoParentPathSet)
    }

    /// Select match `index` (1-based) of the parent path.
    ///
    /// The parent path and the bounds are checked right away. Before the
    /// buffer is ready a request that passes is queued and runs once on
    /// [`crate::BufferEvent::Ready`]; without a DOM yet, bounds are checked
    /// only then. A failure to select the matched node is logged and the
    /// index still moves.
    pub fn select_by_index(&mut self, index: usize) -> Result<()> {
        let parent_path = self.require_parent_path()?;
        let ready = self.buffer.is_ready();
        match self.count_by_xpath(&parent_path) {
            Ok(count) if index < 1 || index > count => {
                return Err(EditorError::IndexOutOfBounds { index, count });
            }
            Ok(_) => {}
            Err(EditorError::NoDocumentLoaded | EditorError::MalformedDocument) if !ready => {
                tracing::debug!(index, "no DOM yet; bounds checked when the buffer is ready");
            }
            Err(err) => return Err(err),
        }
        if !ready {
            tracing::debug!(index, "buffer not ready; deferring selection");
            self.pending.push_back(PendingRequest::SelectByIndex(index));
            return Ok(());
        }
        self.navigation.current_index = index;

        let xpath = format!("{}[{}]", parent_path, index);
        match self.select_by_xpath(&xpath) {
            Ok(range) => {
                self.emit(EditorEvent::Navigation(NavigationEvent::IndexSelected { index, range }));
                Ok(())
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(%xpath, error = %err, "could not select node");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    pub fn next_node(&mut self) -> Result<()> {
        let count = self.count_by_xpath(&self.require_parent_path()?)?;
        let index = (self.navigation.current_index + 1).min(count).max(1);
        self.select_by_index(index)
    }

    pub fn previous_node(&mut self) -> Result<()> {
        let count = self.count_by_xpath(&self.require_parent_path()?)?;
        let index = self
            .navigation
            .current_index
            .saturating_sub(1)
            .min(count)
            .max(1);
        self.select_by_index(index)
    }

    pub(crate) fn drain_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        for request in pending {
            match request {
                PendingRequest::SelectByIndex(index) => {
                    if let Err(err) = self.select_by_index(index) {
                        tracing::warn!(index, error = %err, "deferred selection failed");
                    }
                }
            }
        }
    }

    /// Move the navigation selection to the record containing `node`.
    pub(crate) fn bubble_selection(&mut self, node: NodeRef) {
        let Some(parent_path) = self.navigation.parent_path.clone() else {
            tracing::debug!("no parent path; selection not bubbled");
            return;
        };
        let compiled = match XPath::compile(&parent_path, &self.namespaces) {
            Ok(compiled) => compiled,
            Err(err) => {
                tracing::warn!(%parent_path, error = %err, "parent path does not compile");
                return;
            }
        };
        let Some(test) = final_node_test(compiled.expr()) else {
            tracing::warn!(%parent_path, "parent path has no final name test");
            return;
        };
        let Ok(doc) = self.xml_tree() else {
            return;
        };

        let start = node.node();
        let ignore_case = self.config.case_insensitive_bubbling;
        let Some(found) = std::iter::once(start)
            .chain(doc.ancestors(start))
            .find(|&id| element_matches(doc, id, test, ignore_case))
        else {
            tracing::debug!(%parent_path, "no ancestor matches the parent path");
            return;
        };

        let found = NodeRef::Node(found);
        let xpath = tei_xml::xpath_for_node(doc, Some(found));
        if self.navigation.selected_node == Some(found) && self.navigation.selected_xpath == xpath {
            return;
        }
        tracing::debug!(xpath = ?xpath, "selection bubbled to record");
        self.navigation.selected_node = Some(found);
        self.navigation.selected_xpath = xpath.clone();
        self.emit(EditorEvent::Navigation(NavigationEvent::NodeSelected { node: found, xpath }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::MemoryBuffer;
    use crate::config::EditorConfig;
    use pretty_assertions::assert_eq;

    fn editor(text: &str) -> XmlEditor<MemoryBuffer> {
        XmlEditor::new(MemoryBuffer::new(text), EditorConfig::default())
    }

    #[test]
    fn test_index_bounds() {
        let mut editor = editor("<a><b/><b/><b/></a>");
        editor.set_parent_path("/a/b");
        assert_eq!(
            editor.select_by_index(0),
            Err(EditorError::IndexOutOfBounds { index: 0, count: 3 })
        );
        assert_eq!(
            editor.select_by_index(4),
            Err(EditorError::IndexOutOfBounds { index: 4, count: 3 })
        );
        assert_eq!(editor.current_index(), 1);
        editor.select_by_index(3).unwrap();
        assert_eq!(editor.current_index(), 3);
        editor.select_by_index(1).unwrap();
        assert_eq!(editor.current_index(), 1);
    }

    #[test]
    fn test_navigation_requires_a_parent_path() {
        let mut editor = editor("<a/>");
        assert_eq!(editor.select_by_index(1), Err(EditorError::NoParentPathSet));
        assert_eq!(editor.next_node(), Err(EditorError::NoParentPathSet));
        assert_eq!(editor.previous_node(), Err(EditorError::NoParentPathSet));
    }

    #[test]
    fn test_next_and_previous_clamp() {
        let mut editor = editor("<a><b/><b/></a>");
        editor.set_parent_path("/a/b");
        editor.previous_node().unwrap();
        assert_eq!(editor.current_index(), 1);
        editor.next_node().unwrap();
        editor.next_node().unwrap();
        assert_eq!(editor.current_index(), 2);
        assert_eq!(editor.buffer().selection(), &[TextRange::new(7, 11)]);
    }

    #[test]
    fn test_setting_the_parent_path_resets_the_index() {
        let mut editor = editor("<a><b/><b/></a>");
        editor.set_parent_path("/a/b");
        editor.select_by_index(2).unwrap();
        editor.set_parent_path("/a/b");
        assert_eq!(editor.current_index(), 1);
    }

    #[test]
    fn test_requests_wait_for_readiness() {
        let mut editor = XmlEditor::new(MemoryBuffer::pending("<a><b/><b/></a>"), EditorConfig::default());
        editor.set_parent_path("/a/b");
        editor.select_by_index(2).unwrap();
        assert_eq!(editor.current_index(), 1);

        editor.buffer_mut().mark_ready();
        editor.process_buffer_events();
        assert_eq!(editor.current_index(), 2);
        assert_eq!(editor.buffer().selection(), &[TextRange::new(7, 11)]);

        // Drained exactly once
        editor.buffer_mut().set_selection(TextRange::caret(0));
        editor.handle_event(crate::BufferEvent::Ready);
        assert_eq!(editor.buffer().selection(), &[TextRange::caret(0)]);
    }

    #[test]
    fn test_deferred_requests_are_checked_up_front() {
        let mut editor = XmlEditor::new(MemoryBuffer::pending("<a><b/><b/></a>"), EditorConfig::default());
        assert_eq!(editor.select_by_index(1), Err(EditorError::NoParentPathSet));

        editor.set_parent_path("/a/b");
        assert_eq!(
            editor.select_by_index(99),
            Err(EditorError::IndexOutOfBounds { index: 99, count: 2 })
        );
        assert!(editor.pending.is_empty());

        editor.select_by_index(2).unwrap();
        assert_eq!(editor.pending.len(), 1);
        editor.buffer_mut().mark_ready();
        editor.process_buffer_events();
        assert_eq!(editor.current_index(), 2);
    }

    #[test]
    fn test_empty_record_sets_cannot_be_walked() {
        let mut editor = editor("<a><c/></a>");
        editor.set_parent_path("/a/b");
        assert_eq!(
            editor.next_node(),
            Err(EditorError::IndexOutOfBounds { index: 1, count: 0 })
        );
        assert_eq!(
            editor.previous_node(),
            Err(EditorError::IndexOutOfBounds { index: 1, count: 0 })
        );
        assert_eq!(editor.current_index(), 1);
        assert_eq!(editor.selected_node(), None);
    }

    #[test]
    fn test_loading_a_document_drops_pending_requests() {
        let mut editor = XmlEditor::new(MemoryBuffer::pending("<a><b/><b/></a>"), EditorConfig::default());
        editor.set_parent_path("/a/b");
        editor.select_by_index(2).unwrap();
        editor.load_document("<a><b/></a>");
        assert_eq!(editor.parent_path(), None);
        editor.buffer_mut().mark_ready();
        editor.process_buffer_events();
        assert_eq!(editor.current_index(), 1);
    }

    #[test]
    fn test_bubbling_finds_the_record() {
        let text = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><listBibl><biblStruct><title><hi>x</hi></title></biblStruct><biblStruct><title>y</title></biblStruct></listBibl></TEI>"#;
        let mut editor = editor(text);
        editor.set_parent_path("//tei:biblStruct");
        editor.take_events();

        editor.buffer_mut().select(vec![TextRange::caret(text.find("<hi>").unwrap())]);
        editor.process_buffer_events();
        assert_eq!(
            editor.selected_xpath(),
            Some("/TEI[1]/listBibl[1]/biblStruct[1]")
        );
        let navigation: Vec<_> = editor
            .take_events()
            .into_iter()
            .filter(|e| matches!(e, EditorEvent::Navigation(_)))
            .collect();
        assert_eq!(navigation.len(), 1);

        // Moving within the same record does not re-emit
        editor.buffer_mut().select(vec![TextRange::caret(text.find("<title>").unwrap())]);
        editor.process_buffer_events();
        assert!(editor.take_events().iter().all(|e| !matches!(e, EditorEvent::Navigation(_))));

        editor.buffer_mut().select(vec![TextRange::caret(text.find(">y<").unwrap() + 1)]);
        editor.process_buffer_events();
        assert_eq!(
            editor.selected_xpath(),
            Some("/TEI[1]/listBibl[1]/biblStruct[2]")
        );
    }

    #[test]
    fn test_bubbling_without_a_match_changes_nothing() {
        let mut editor = editor("<a><b><c/></b></a>");
        editor.buffer_mut().select(vec![TextRange::caret(6)]);
        editor.process_buffer_events();
        assert_eq!(editor.selected_node(), None);

        editor.set_parent_path("//d");
        editor.buffer_mut().select(vec![TextRange::caret(6)]);
        editor.process_buffer_events();
        assert_eq!(editor.selected_node(), None);
    }

    #[test]
    fn test_bubbling_case_policy() {
        let text = "<a><Rec><c/></Rec></a>";
        let mut sensitive = editor(text);
        sensitive.set_parent_path("/a/rec");
        sensitive.buffer_mut().select(vec![TextRange::caret(8)]);
        sensitive.process_buffer_events();
        assert_eq!(sensitive.selected_xpath(), None);

        let config = EditorConfig {
            case_insensitive_bubbling: true,
            ..EditorConfig::default()
        };
        let mut insensitive = XmlEditor::new(MemoryBuffer::new(text), config);
        insensitive.set_parent_path("/a/rec");
        insensitive.buffer_mut().select(vec![TextRange::caret(8)]);
        insensitive.process_buffer_events();
        assert_eq!(insensitive.selected_xpath(), Some("/a[1]/Rec[1]"));
    }

    #[test]
    fn test_final_node_test() {
        let ns = tei_xpath::NamespaceTable::default();
        let test = |src: &str| {
            let xpath = XPath::compile(src, &ns).unwrap();
            final_node_test(xpath.expr()).cloned()
        };
        assert_eq!(
            test("(//tei:div[@type='entry'])[2]"),
            Some(NodeTest::Name {
                namespace: Some(tei_xml::TEI_NAMESPACE.to_string()),
                local: "div".into(),
            })
        );
        assert_eq!(test("//a | //b/*"), Some(NodeTest::Any));
        assert_eq!(test("count(//a)"), None);
    }
}
