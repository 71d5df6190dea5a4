//! End-to-end editing sessions over TEI documents.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tei_editor_core::{
    BufferEvent, DocumentSnapshot, DocumentVersion, EditorConfig, EditorError, EditorEvent, MemoryBuffer,
    NavigationEvent, Resolver, TextBuffer, TextRange, ValidationReport, XmlEditor, link,
};
use tei_xpath::NamespaceTable;

const BIBLIOGRAPHY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader><fileDesc><titleStmt><title>Sources</title></titleStmt></fileDesc></teiHeader>
  <text>
    <body>
      <listBibl>
        <biblStruct xml:id="b1"><monogr><title>Alpha</title><imprint><date>1901</date></imprint></monogr></biblStruct>
        <biblStruct xml:id="b2"><monogr><title>Beta</title><imprint><date>1902</date></imprint></monogr></biblStruct>
        <biblStruct xml:id="b3"><monogr><title>Gamma</title><imprint><date>1903</date></imprint></monogr></biblStruct>
      </listBibl>
    </body>
  </text>
</TEI>"#;

fn editor(text: &str) -> XmlEditor<MemoryBuffer> {
    XmlEditor::new(MemoryBuffer::new(text), EditorConfig::default())
}

fn selected_text(editor: &XmlEditor<MemoryBuffer>) -> &str {
    let range = editor.buffer().selection()[0];
    &editor.buffer().text()[range.start()..range.end()]
}

#[test]
fn records_are_walked_by_index() {
    let mut editor = editor(BIBLIOGRAPHY);
    editor.set_parent_path("//tei:biblStruct");
    assert_eq!(editor.count_by_xpath("//tei:biblStruct").unwrap(), 3);

    editor.select_by_index(2).unwrap();
    assert!(selected_text(&editor).starts_with(r#"<biblStruct xml:id="b2">"#));
    assert!(selected_text(&editor).ends_with("</biblStruct>"));

    editor.next_node().unwrap();
    editor.next_node().unwrap();
    assert_eq!(editor.current_index(), 3);
    assert!(selected_text(&editor).contains("Gamma"));

    editor.previous_node().unwrap();
    assert_eq!(editor.current_index(), 2);

    let indices: Vec<usize> = editor
        .take_events()
        .into_iter()
        .filter_map(|event| match event {
            EditorEvent::Navigation(NavigationEvent::IndexSelected { index, .. }) => Some(index),
            _ => None,
        })
        .collect();
    assert_eq!(indices, vec![2, 3, 3, 2]);
}

#[test]
fn cursor_moves_bubble_to_the_enclosing_record() {
    let mut editor = editor(BIBLIOGRAPHY);
    editor.set_parent_path("//tei:biblStruct");
    editor.take_events();

    let date = BIBLIOGRAPHY.find("1903").unwrap();
    editor.buffer_mut().select(vec![TextRange::caret(date)]);
    editor.process_buffer_events();
    assert_eq!(
        editor.selected_xpath(),
        Some("/TEI[1]/text[1]/body[1]/listBibl[1]/biblStruct[3]")
    );

    let events = editor.take_events();
    let EditorEvent::SelectionChanged(selections) = &events[0] else {
        panic!("unexpected events {events:?}");
    };
    assert_eq!(
        selections[0].xpath.as_deref(),
        Some("/TEI[1]/text[1]/body[1]/listBibl[1]/biblStruct[3]/monogr[1]/imprint[1]/date[1]")
    );

    // Outside every record the selection stays where it was
    let header = BIBLIOGRAPHY.find("Sources").unwrap();
    editor.buffer_mut().select(vec![TextRange::caret(header)]);
    editor.process_buffer_events();
    assert_eq!(
        editor.selected_xpath(),
        Some("/TEI[1]/text[1]/body[1]/listBibl[1]/biblStruct[3]")
    );
}

#[test]
fn a_broken_tag_suspends_dom_queries_until_repaired() {
    let mut editor = editor("<a><b></b></a>");
    editor.set_parent_path("/a/b");

    editor.buffer_mut().replace(TextRange::new(6, 10), "").unwrap();
    editor.process_buffer_events();
    assert_eq!(editor.buffer().text(), "<a><b></a>");
    assert!(!editor.is_well_formed());
    assert_eq!(editor.count_by_xpath("/a/b"), Err(EditorError::MalformedDocument));
    assert_eq!(editor.select_by_index(1), Err(EditorError::MalformedDocument));
    // The parse tree still answers
    let (kind, range) = editor.node_at_offset(4, true).unwrap();
    assert_eq!((kind.to_string(), range), ("Element".to_string(), TextRange::new(3, 6)));

    editor.buffer_mut().insert(6, "</b>").unwrap();
    editor.process_buffer_events();
    assert!(editor.is_well_formed());
    editor.select_by_index(1).unwrap();
    assert_eq!(selected_text(&editor), "<b></b>");
}

#[test]
fn edits_keep_offsets_current() {
    let mut editor = editor(BIBLIOGRAPHY);
    let before = editor.dom_node_by_xpath("//tei:biblStruct[2]").unwrap();

    // Lengthen the first title; every later offset shifts
    let alpha = BIBLIOGRAPHY.find("Alpha").unwrap();
    editor.buffer_mut().insert(alpha, "The ").unwrap();
    let beta = editor.buffer().text().find("Beta").unwrap();
    editor.buffer_mut().select(vec![TextRange::caret(beta)]);
    assert_eq!(editor.process_buffer_events(), 2);

    let node = editor.dom_node_at_offset(beta).unwrap();
    assert_eq!(editor.xml_tree().unwrap().text_content(node.node()), "Beta");
    let after = editor.dom_node_by_xpath("//tei:biblStruct[2]").unwrap();
    assert!(before.is_some() && after.is_some());
    let range = editor.select_by_xpath("//tei:biblStruct[2]//tei:title").unwrap();
    assert_eq!(&editor.buffer().text()[range.start()..range.end()], "<title>Beta</title>");
}

#[test]
fn loading_a_new_document_starts_over() {
    let mut editor = editor(BIBLIOGRAPHY);
    editor.set_parent_path("//tei:biblStruct");
    editor.select_by_index(3).unwrap();
    let version = editor.version();

    editor.load_document("<a><b/></a>");
    assert_eq!(editor.version(), version.next());
    assert_eq!(editor.parent_path(), None);
    assert_eq!(editor.current_index(), 1);
    assert_eq!(editor.selected_node(), None);
    assert_eq!(editor.xml().unwrap(), "<a><b/></a>");
}

#[test]
fn deferred_requests_run_when_the_buffer_mounts() {
    let mut editor = XmlEditor::new(MemoryBuffer::pending(BIBLIOGRAPHY), EditorConfig::default());
    editor.set_parent_path("//tei:biblStruct");
    editor.select_by_index(3).unwrap();
    assert_eq!(editor.buffer().scrolled_to(), None);

    editor.buffer_mut().mark_ready();
    editor.handle_event(BufferEvent::Ready);
    assert_eq!(editor.current_index(), 3);
    assert!(selected_text(&editor).contains("Gamma"));
}

#[test]
fn extra_prefixes_come_from_configuration() {
    let config = EditorConfig::from_toml_str(
        r#"
        [namespaces]
        ed = "urn:example:edition"
        "#,
    )
    .unwrap();
    let text = r#"<TEI xmlns="http://www.tei-c.org/ns/1.0" xmlns:x="urn:example:edition"><x:app/><x:app/></TEI>"#;
    let mut editor = XmlEditor::new(MemoryBuffer::new(text), config);
    editor.set_parent_path("/tei:TEI/ed:app");
    editor.select_by_index(2).unwrap();
    assert_eq!(selected_text(&editor), "<x:app/>");
    assert_eq!(editor.buffer().selection()[0].start(), text.rfind("<x:app/>").unwrap());
}

#[test]
fn validation_results_track_the_version() {
    let mut editor = editor(BIBLIOGRAPHY);
    let ticket = editor.begin_validation().unwrap();
    let end = editor.buffer().text().len();
    editor.buffer_mut().insert(end, "\n").unwrap();
    editor.process_buffer_events();
    assert!(
        !editor
            .apply_validation(ValidationReport {
                version: ticket.version,
                diagnostics: Vec::new(),
            })
            .is_applied()
    );

    let ticket = editor.begin_validation().unwrap();
    assert_eq!(ticket.version, DocumentVersion(2));
    assert!(ticket.text.ends_with('\n'));
    assert!(
        editor
            .apply_validation(ValidationReport {
                version: ticket.version,
                diagnostics: Vec::new(),
            })
            .is_applied()
    );
}

fn element() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("<pb/>".to_string()),
        "[a-z ]{0,5}".prop_map(|text| format!("<hi>{text}</hi>")),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        (
            prop::sample::select(vec!["p", "div", "seg"]),
            "[a-z ]{0,3}",
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(name, text, children)| format!("<{name}>{text}{}</{name}>", children.concat()))
    })
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec(element(), 0..4).prop_map(|children| format!("<body>{}</body>", children.concat()))
}

proptest! {
    #[test]
    fn every_element_round_trips_through_its_offset(text in document()) {
        let snapshot = DocumentSnapshot::build(DocumentVersion(1), text.as_str().into(), true);
        let ns = NamespaceTable::default();
        let resolver = Resolver::new(&snapshot, &ns);
        let dom = resolver.dom().unwrap();
        let map = snapshot.link_map().unwrap();
        let root = dom.document_element().unwrap();

        for node in dom.descendants_or_self(root).into_iter().filter(|&n| dom.is_element(n)) {
            let offset = map.offset_of(node).unwrap();
            prop_assert_eq!(resolver.dom_node_at_offset(offset).unwrap().node(), node);
            let range = resolver.range_of(node.into()).unwrap();
            prop_assert_eq!(range.start(), offset);
            prop_assert_eq!(dom.range(node), Some(range.start()..range.end()));
        }
    }

    #[test]
    fn relinking_unchanged_text_is_idempotent(text in document()) {
        let tree = tei_syntax::parse(&text);
        let dom = tei_xml::parse(&text).unwrap();
        let first = link(&tree, &dom).unwrap();
        let second = link(&tei_syntax::parse(&text), &dom).unwrap();
        prop_assert!(!first.is_partial());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn only_current_validation_results_apply(edits in 0usize..4) {
        let mut editor = editor("<a></a>");
        let ticket = editor.begin_validation().unwrap();
        for _ in 0..edits {
            editor.buffer_mut().insert(3, "x").unwrap();
            editor.process_buffer_events();
        }
        let outcome = editor.apply_validation(ValidationReport {
            version: ticket.version,
            diagnostics: Vec::new(),
        });
        prop_assert_eq!(outcome.is_applied(), edits == 0);
    }
}
