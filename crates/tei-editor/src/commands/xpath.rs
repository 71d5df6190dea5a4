//! `tei-editor xpath`: evaluate an expression and show where the matches are.

use std::io::Write;

use anyhow::Result;
use tei_xml::NodeRef;

use super::{Session, write_json};

fn match_value(session: &Session, node: NodeRef) -> Result<String> {
    let doc = session.editor.xml_tree()?;
    Ok(match node {
        NodeRef::Attribute { owner, index } => doc
            .attributes(owner)
            .get(index)
            .map(|attr| attr.value.clone())
            .unwrap_or_default(),
        NodeRef::Node(id) => doc.text_content(id),
    })
}

/// Print every match of `expression`. Returns the number of matches.
pub fn execute(session: &Session, expression: &str, json: bool, out: &mut dyn Write) -> Result<usize> {
    let editor = &session.editor;
    let nodes = editor.dom_nodes_by_xpath(expression)?;
    let resolver = editor.resolver()?;
    tracing::debug!(expression, matches = nodes.len(), "evaluated expression");

    if json {
        let matches = nodes
            .iter()
            .map(|&node| {
                Ok(serde_json::json!({
                    "xpath": resolver.xpath_for_node(Some(node)),
                    "range": resolver.range_of(node).map(|r| session.range_json(r)),
                    "value": match_value(session, node)?,
                }))
            })
            .collect::<Result<Vec<_>>>()?;
        write_json(out, &serde_json::json!({ "expression": expression, "count": nodes.len(), "matches": matches }))?;
        return Ok(nodes.len());
    }

    for &node in &nodes {
        let xpath = resolver.xpath_for_node(Some(node)).unwrap_or_default();
        match resolver.range_of(node) {
            Some(range) => writeln!(
                out,
                "{}\t{}\t{}..{}",
                xpath,
                session.position(range.start()),
                range.start(),
                range.end()
            )?,
            None => writeln!(out, "{}\t(unlinked)", xpath)?,
        }
    }
    writeln!(out, "{} match(es)", nodes.len())?;
    Ok(nodes.len())
}
