//! `tei-editor locate`: describe what sits at a cursor position.

use std::io::Write;

use anyhow::{Result, bail};
use tei_editor_core::TextRange;
use tei_source_map::FileInformation;

use super::{Session, write_json};

/// Parse a byte offset (`120`) or a 1-based `row:column` pair (`4:17`).
pub fn parse_position(text: &str, position: &str) -> Result<usize> {
    if let Some((row, column)) = position.split_once(':') {
        let (row, column): (usize, usize) = (row.trim().parse()?, column.trim().parse()?);
        if row == 0 || column == 0 {
            bail!("Rows and columns start at 1: {}", position);
        }
        return match FileInformation::new(text).location_to_offset(row - 1, column - 1) {
            Some(offset) => Ok(offset),
            None => bail!("Position {} is outside the document", position),
        };
    }
    let offset: usize = position.trim().parse()?;
    if offset > text.len() {
        bail!("Offset {} is past the end of the document ({} bytes)", offset, text.len());
    }
    Ok(offset)
}

pub fn execute(session: &mut Session, position: &str, parent: Option<&str>, json: bool, out: &mut dyn Write) -> Result<()> {
    let offset = parse_position(session.text(), position)?;
    let (kind, range) = session.editor.node_at_offset(offset, false)?;
    let (element_kind, element_range) = session.editor.node_at_offset(offset, true)?;
    let node = session.editor.dom_node_at_offset(offset);
    let xpath = node
        .as_ref()
        .ok()
        .and_then(|&n| session.editor.xpath_for_node(Some(n)));
    if let Err(err) = &node {
        tracing::debug!(offset, error = %err, "no DOM node at position");
    }

    let record = match parent {
        Some(parent) => {
            session.editor.set_parent_path(parent);
            session.editor.buffer_mut().select(vec![TextRange::caret(offset)]);
            session.editor.process_buffer_events();
            session.editor.selected_xpath().map(str::to_string)
        }
        None => None,
    };

    if json {
        let value = serde_json::json!({
            "offset": offset,
            "position": session.position(offset),
            "node": { "kind": kind.to_string(), "range": session.range_json(range) },
            "element": { "kind": element_kind.to_string(), "range": session.range_json(element_range) },
            "xpath": xpath,
            "record": record,
        });
        return write_json(out, &value);
    }

    writeln!(out, "position: {} (offset {})", session.position(offset), offset)?;
    writeln!(out, "node:     {} {}..{}", kind, range.start(), range.end())?;
    writeln!(
        out,
        "element:  {} {}..{}",
        element_kind,
        element_range.start(),
        element_range.end()
    )?;
    match &xpath {
        Some(xpath) => writeln!(out, "xpath:    {}", xpath)?,
        None => writeln!(out, "xpath:    (not linked)")?,
    }
    if parent.is_some() {
        writeln!(out, "record:   {}", record.as_deref().unwrap_or("(none)"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        let text = "<a>\n  <b/>\n</a>";
        assert_eq!(parse_position(text, "6").unwrap(), 6);
        assert_eq!(parse_position(text, "2:3").unwrap(), 6);
        assert_eq!(parse_position(text, "1:1").unwrap(), 0);
        assert!(parse_position(text, "0:1").is_err());
        assert!(parse_position(text, "9:1").is_err());
        assert!(parse_position(text, "99").is_err());
        assert!(parse_position(text, "x").is_err());
    }
}
