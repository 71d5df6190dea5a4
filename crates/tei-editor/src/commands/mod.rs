/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Shared pieces of the tei-editor subcommands
 */

pub mod check;
pub mod locate;
pub mod navigate;
pub mod xpath;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tei_editor_core::{EditorConfig, MemoryBuffer, TextBuffer, TextRange, XmlEditor};
use tei_source_map::{Location, SourceContext};

/// A document opened from disk.
pub struct Session {
    pub path: PathBuf,
    pub editor: XmlEditor<MemoryBuffer>,
}

impl Session {
    pub fn open(path: &Path, config: EditorConfig) -> Result<Session> {
        let text = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "opened document");
        Ok(Session {
            path: path.to_path_buf(),
            editor: XmlEditor::new(MemoryBuffer::new(text), config),
        })
    }

    pub fn text(&self) -> &str {
        self.editor.buffer().text()
    }

    /// A source context holding this document as file 0.
    pub fn source_context(&self) -> SourceContext {
        let mut ctx = SourceContext::new();
        ctx.add_file(self.path.display().to_string(), Some(self.text().to_string()));
        ctx
    }

    pub fn location(&self, offset: usize) -> Option<Location> {
        self.editor.snapshot().ok()?.location(offset)
    }

    /// `row:column`, 1-based.
    pub fn position(&self, offset: usize) -> String {
        match self.location(offset) {
            Some(loc) => format!("{}:{}", loc.row + 1, loc.column + 1),
            None => "?".to_string(),
        }
    }

    pub fn range_json(&self, range: TextRange) -> serde_json::Value {
        let start = self.location(range.start());
        serde_json::json!({
            "from": range.start(),
            "to": range.end(),
            "row": start.map(|l| l.row + 1),
            "column": start.map(|l| l.column + 1),
        })
    }
}

/// Load `--config`, or the defaults without one.
pub fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => Ok(EditorConfig::load(path)?),
        None => Ok(EditorConfig::default()),
    }
}

pub(crate) fn write_json(out: &mut dyn Write, value: &serde_json::Value) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
