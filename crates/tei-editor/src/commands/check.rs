//! `tei-editor check`: report parse and link diagnostics for a document.

use std::io::Write;

use anyhow::Result;

use super::{Session, write_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CheckSummary {
    pub errors: usize,
    pub warnings: usize,
    pub linked: usize,
}

impl CheckSummary {
    pub fn is_clean(&self) -> bool {
        self.errors == 0
    }
}

pub fn execute(session: &Session, json: bool, out: &mut dyn Write) -> Result<CheckSummary> {
    let snapshot = session.editor.snapshot()?;
    let diagnostics = snapshot.diagnostics();
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let summary = CheckSummary {
        errors,
        warnings: diagnostics.len() - errors,
        linked: snapshot.link_map().map_or(0, |map| map.len()),
    };

    if json {
        let value = serde_json::json!({
            "file": session.path.display().to_string(),
            "version": snapshot.version().0,
            "well_formed": snapshot.is_well_formed(),
            "linked": snapshot.is_linked(),
            "partially_linked": snapshot.is_partially_linked(),
            "linked_elements": summary.linked,
            "diagnostics": diagnostics.iter().map(|d| d.to_json()).collect::<Vec<_>>(),
        });
        write_json(out, &value)?;
        return Ok(summary);
    }

    let ctx = session.source_context();
    for diagnostic in diagnostics {
        writeln!(out, "{}\n", diagnostic.to_text(Some(&ctx)))?;
    }
    let state = match (snapshot.is_well_formed(), snapshot.is_linked()) {
        (false, _) => "malformed".to_string(),
        (true, false) => "well-formed, not linked".to_string(),
        (true, true) if snapshot.is_partially_linked() => {
            format!("well-formed, {} elements linked (partial)", summary.linked)
        }
        (true, true) => format!("well-formed, {} elements linked", summary.linked),
    };
    writeln!(
        out,
        "{}: {} ({} errors, {} warnings)",
        session.path.display(),
        state,
        summary.errors,
        summary.warnings
    )?;
    Ok(summary)
}
