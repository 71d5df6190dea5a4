//! Registered source files

use crate::file_info::FileInformation;
use crate::source_info::SourceInfo;
use crate::types::{FileId, Location};
use serde::{Deserialize, Serialize};

/// The set of files diagnostics may point into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceContext {
    files: Vec<SourceFile>,
}

/// A registered file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    /// File path or buffer name
    pub path: String,
    /// Content of in-memory buffers. `None` means "read from `path` on demand".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Line-break index, when the content was available at registration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInformation>,
}

impl SourceContext {
    pub fn new() -> Self {
        SourceContext { files: Vec::new() }
    }

    /// Register a file and return its ID.
    ///
    /// With `Some(content)` the file is an in-memory buffer; with `None` the
    /// content is read from `path` to build the line index, if it exists.
    pub fn add_file(&mut self, path: String, content: Option<String>) -> FileId {
        let id = FileId(self.files.len());
        let file_info = match &content {
            Some(c) => Some(FileInformation::new(c)),
            None => std::fs::read_to_string(&path)
                .ok()
                .map(|c| FileInformation::new(&c)),
        };
        self.files.push(SourceFile {
            path,
            content,
            file_info,
        });
        id
    }

    pub fn get_file(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0)
    }

    /// Start location of `info`, with rows and columns resolved.
    pub fn location(&self, info: &SourceInfo) -> Option<Location> {
        self.get_file(info.file_id)?
            .file_info
            .as_ref()?
            .offset_to_location(info.start_offset())
    }

    /// Content of a file, reading disk-backed files if needed.
    pub fn content(&self, id: FileId) -> Option<String> {
        let file = self.get_file(id)?;
        match &file.content {
            Some(c) => Some(c.clone()),
            None => std::fs::read_to_string(&file.path).ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        let ctx = SourceContext::new();
        assert!(ctx.get_file(FileId(0)).is_none());
    }

    #[test]
    fn test_add_and_get_file() {
        let mut ctx = SourceContext::new();
        let id = ctx.add_file("buffer.xml".to_string(), Some("<TEI/>".to_string()));

        assert_eq!(id, FileId(0));
        let file = ctx.get_file(id).unwrap();
        assert_eq!(file.path, "buffer.xml");
        assert_eq!(file.file_info.as_ref().unwrap().total_length(), 6);
        assert_eq!(ctx.content(id).as_deref(), Some("<TEI/>"));
    }

    #[test]
    fn test_location_resolves_rows() {
        let mut ctx = SourceContext::new();
        let id = ctx.add_file("buffer.xml".to_string(), Some("<a>\n<b/>\n</a>".to_string()));
        let loc = ctx.location(&SourceInfo::original(id, 4, 8)).unwrap();
        assert_eq!((loc.row, loc.column), (1, 0));
    }

    #[test]
    fn test_missing_disk_file() {
        let mut ctx = SourceContext::new();
        let id = ctx.add_file("does/not/exist.xml".to_string(), None);
        assert!(ctx.get_file(id).unwrap().file_info.is_none());
        assert!(ctx.content(id).is_none());
    }
}
