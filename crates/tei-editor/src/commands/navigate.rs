//! `tei-editor navigate`: walk the records matched by a parent path.

use std::io::Write;

use anyhow::Result;
use tei_editor_core::{EditorEvent, NavigationEvent, TextRange};

use super::{Session, write_json};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub index: usize,
    pub range: TextRange,
    pub xpath: Option<String>,
}

fn selected_records(session: &mut Session) -> Vec<Record> {
    session
        .editor
        .take_events()
        .into_iter()
        .filter_map(|event| match event {
            EditorEvent::Navigation(NavigationEvent::IndexSelected { index, range }) => Some((index, range)),
            _ => None,
        })
        .map(|(index, range)| Record {
            index,
            range,
            xpath: session
                .editor
                .dom_node_at_offset(range.start())
                .ok()
                .and_then(|node| session.editor.xpath_for_node(Some(node))),
        })
        .collect()
}

/// Select record `index` of `parent`, or every record in turn without one.
pub fn execute(
    session: &mut Session,
    parent: &str,
    index: Option<usize>,
    json: bool,
    out: &mut dyn Write,
) -> Result<Vec<Record>> {
    session.editor.set_parent_path(parent);
    let count = session.editor.count_by_xpath(parent)?;
    session.editor.take_events();
    match index {
        Some(index) => session.editor.select_by_index(index)?,
        None => {
            for index in 1..=count {
                session.editor.select_by_index(index)?;
            }
        }
    }
    let records = selected_records(session);

    if json {
        let value = serde_json::json!({
            "parent_path": parent,
            "count": count,
            "records": records
                .iter()
                .map(|r| serde_json::json!({
                    "index": r.index,
                    "xpath": r.xpath,
                    "range": session.range_json(r.range),
                }))
                .collect::<Vec<_>>(),
        });
        write_json(out, &value)?;
        return Ok(records);
    }

    writeln!(out, "{}: {} record(s)", parent, count)?;
    for record in &records {
        writeln!(
            out,
            "[{}] {}\t{}",
            record.index,
            record.xpath.as_deref().unwrap_or("(unlinked)"),
            session.position(record.range.start())
        )?;
    }
    Ok(records)
}
