//! Source locations for editor buffers.
//!
//! Every node of the parse tree and of the DOM carries a byte range into the
//! buffer text it was built from. This crate turns those byte ranges into
//! row/column positions for diagnostics and keeps the registered buffers
//! around so that diagnostics can be rendered with source snippets.
//!
//! # Overview
//!
//! - [`SourceInfo`]: a byte range within one registered file
//! - [`FileInformation`]: a line-break index for O(log n) offset lookups
//! - [`SourceContext`]: the set of registered files
//!
//! # Example
//!
//! ```rust
//! use tei_source_map::*;
//!
//! let mut ctx = SourceContext::new();
//! let file_id = ctx.add_file("letter.xml".into(), Some("<TEI>\n  <text/>\n</TEI>".into()));
//!
//! let info = SourceInfo::original(file_id, 8, 15);
//! let start = ctx.location(&info).unwrap();
//! assert_eq!((start.row, start.column), (1, 2));
//! ```

pub mod context;
pub mod file_info;
pub mod source_info;
pub mod types;

pub use context::{SourceContext, SourceFile};
pub use file_info::FileInformation;
pub use source_info::SourceInfo;
pub use types::{FileId, Location, Range};
