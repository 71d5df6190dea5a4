//! Line-break index for location lookups

use crate::types::Location;
use serde::{Deserialize, Serialize};

/// Line-break index of a buffer.
///
/// Stores the position of every `\n` so offsets convert to rows and columns
/// with a binary search instead of rescanning the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInformation {
    /// Byte offsets of each newline character
    line_breaks: Vec<usize>,

    /// Total length of the text in bytes
    total_length: usize,
}

impl FileInformation {
    /// Scan `content` once and index its line breaks.
    ///
    /// ```
    /// use tei_source_map::FileInformation;
    ///
    /// let info = FileInformation::new("<a>\n<b/>\n</a>");
    /// assert_eq!(info.line_count(), 3);
    /// ```
    pub fn new(content: &str) -> Self {
        let line_breaks = content
            .bytes()
            .enumerate()
            .filter_map(|(idx, b)| (b == b'\n').then_some(idx))
            .collect();

        FileInformation {
            line_breaks,
            total_length: content.len(),
        }
    }

    /// Convert a byte offset to a [`Location`].
    ///
    /// Returns `None` if the offset is past the end of the text. A newline
    /// belongs to the row it terminates.
    ///
    /// ```
    /// use tei_source_map::FileInformation;
    ///
    /// let info = FileInformation::new("hello\nworld");
    /// let loc = info.offset_to_location(6).unwrap();
    /// assert_eq!((loc.row, loc.column), (1, 0));
    /// ```
    pub fn offset_to_location(&self, offset: usize) -> Option<Location> {
        if offset > self.total_length {
            return None;
        }

        let row = match self.line_breaks.binary_search(&offset) {
            Ok(idx) | Err(idx) => idx,
        };
        let column = offset - self.row_start(row);

        Some(Location {
            offset,
            row,
            column,
        })
    }

    /// Convert a row/column pair back to a byte offset.
    ///
    /// Returns `None` if the row does not exist or the column runs past the
    /// end of the row.
    pub fn location_to_offset(&self, row: usize, column: usize) -> Option<usize> {
        if row >= self.line_count() {
            return None;
        }
        let start = self.row_start(row);
        let end = self
            .line_breaks
            .get(row)
            .copied()
            .unwrap_or(self.total_length);
        let offset = start + column;
        (offset <= end).then_some(offset)
    }

    fn row_start(&self, row: usize) -> usize {
        if row == 0 {
            0
        } else {
            self.line_breaks[row - 1] + 1
        }
    }

    /// Total length of the text in bytes
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Number of rows; a text without newlines has one.
    pub fn line_count(&self) -> usize {
        self.line_breaks.len() + 1
    }
}
