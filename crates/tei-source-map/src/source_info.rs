//! Byte spans within registered files

use crate::file_info::FileInformation;
use crate::types::{FileId, Location, Range};
use serde::{Deserialize, Serialize};

/// A span of source text within one registered file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceInfo {
    /// File the span belongs to
    pub file_id: FileId,
    /// The span itself
    pub range: Range,
}

impl SourceInfo {
    /// A span known only by its byte offsets.
    pub fn original(file_id: FileId, start: usize, end: usize) -> Self {
        SourceInfo {
            file_id,
            range: Range::from_offsets(start, end),
        }
    }

    /// A span with rows and columns filled in from `info`.
    ///
    /// Offsets past the end of the text fall back to offset-only locations.
    pub fn resolved(file_id: FileId, start: usize, end: usize, info: &FileInformation) -> Self {
        let locate = |offset| {
            info.offset_to_location(offset)
                .unwrap_or_else(|| Location::at_offset(offset))
        };
        SourceInfo {
            file_id,
            range: Range {
                start: locate(start),
                end: locate(end),
            },
        }
    }

    pub fn start_offset(&self) -> usize {
        self.range.start.offset
    }

    pub fn end_offset(&self) -> usize {
        self.range.end.offset
    }

    pub fn length(&self) -> usize {
        self.range.len()
    }
}
