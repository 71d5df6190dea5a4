//! Parsing realistic TEI documents end to end.

use pretty_assertions::assert_eq;
use tei_xml::{Error, NodeKind, TEI_NAMESPACE, XML_NAMESPACE, parse, xpath_for_node};

const LETTER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<?xml-model href="tei_all.rng" type="application/xml"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0" xmlns:x="urn:extra">
  <teiHeader>
    <fileDesc><titleStmt><title>Letter to A.</title></titleStmt></fileDesc>
  </teiHeader>
  <text xml:id="t1">
    <body>
      <div type="letter"><p>Dear A., <x:note>aside</x:note> &amp; more.</p></div>
    </body>
  </text>
</TEI>
"#;

#[test]
fn letter_parses_with_namespaces_and_ranges() {
    let doc = parse(LETTER).unwrap();
    let root = doc.document_element().unwrap();
    assert_eq!(doc.namespace_uri(root), Some(TEI_NAMESPACE));

    // The xml-model PI sits before the root element
    let top: Vec<_> = doc.children(doc.root()).to_vec();
    assert!(matches!(
        doc.kind(top[0]),
        NodeKind::ProcessingInstruction { target, .. } if target == "xml-model"
    ));

    let text = doc
        .descendants_or_self(root)
        .into_iter()
        .find(|&n| doc.tag_name(n).as_deref() == Some("text"))
        .unwrap();
    let id = &doc.attributes(text)[0];
    assert_eq!(id.name.namespace.as_deref(), Some(XML_NAMESPACE));
    assert_eq!(id.value, "t1");

    let note = doc
        .descendants_or_self(root)
        .into_iter()
        .find(|&n| doc.tag_name(n).as_deref() == Some("x:note"))
        .unwrap();
    assert_eq!(doc.namespace_uri(note), Some("urn:extra"));
    let range = doc.range(note).unwrap();
    assert_eq!(&LETTER[range], "<x:note>aside</x:note>");
    assert_eq!(
        xpath_for_node(&doc, Some(note.into())).as_deref(),
        Some("/TEI[1]/text[1]/body[1]/div[1]/p[1]/x:note[1]")
    );

    let p = doc.parent(note).unwrap();
    assert_eq!(doc.text_content(p), "Dear A., aside & more.");
}

#[test]
fn serialization_reparses_to_the_same_structure() {
    let doc = parse(LETTER).unwrap();
    let again = parse(&doc.to_xml_string()).unwrap();
    let names = |d: &tei_xml::Document| -> Vec<String> {
        d.descendants_or_self(d.root())
            .into_iter()
            .filter_map(|n| d.tag_name(n).map(|t| t.into_owned()))
            .collect()
    };
    assert_eq!(names(&doc), names(&again));
}

#[test]
fn broken_documents_report_located_errors() {
    let err = parse("<TEI><text></TEI>").unwrap_err();
    assert!(matches!(err, Error::MismatchedEndTag { .. }));
    assert!(err.location().is_some());
    assert_eq!(err.to_diagnostic().code.as_deref(), Some("T-1-3"));

    let err = parse("<TEI><foo:bar/></TEI>").unwrap_err();
    assert!(matches!(err, Error::UnboundPrefix { ref prefix, .. } if prefix == "foo"));

    assert!(matches!(parse("  \n"), Err(Error::EmptyDocument)));
}
