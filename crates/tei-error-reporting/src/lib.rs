//! Diagnostic messages for the TEI editor core.
//!
//! Every recoverable problem the core reports (malformed XML, link failures,
//! XPath errors, navigation failures) ends up as a [`DiagnosticMessage`]:
//! a tidyverse-style message with a stable error code, a problem statement,
//! bulleted details and hints, and an optional source location.
//!
//! Messages render three ways:
//! - plain text ([`DiagnosticMessage::to_text`]), with an ariadne source
//!   snippet when a [`tei_source_map::SourceContext`] is supplied
//! - JSON ([`DiagnosticMessage::to_json`])
//! - serde serialization of the struct itself
//!
//! ```
//! use tei_error_reporting::DiagnosticMessageBuilder;
//!
//! let msg = DiagnosticMessageBuilder::error("Mismatched XML End Tag")
//!     .with_code("T-1-3")
//!     .problem("End tag </div> does not match start tag <p>")
//!     .add_hint("Close the inner element first?")
//!     .build();
//! assert!(msg.to_text(None).starts_with("Error [T-1-3]: Mismatched XML End Tag"));
//! ```

pub mod builder;
pub mod catalog;
pub mod diagnostic;

pub use builder::DiagnosticMessageBuilder;
pub use catalog::{ERROR_CATALOG, ErrorCodeInfo, get_error_info, get_subsystem};
pub use diagnostic::{DetailItem, DetailKind, DiagnosticKind, DiagnosticMessage, MessageContent};
