//! Editor core for TEI documents.
//!
//! An [`XmlEditor`] watches a [`TextBuffer`] and keeps two views of its text
//! in step: a lossless parse tree that tolerates malformed markup, and a
//! namespace-aware DOM for XPath queries. The [`linker`] pairs the elements
//! of both so that a cursor offset can be turned into a DOM node and an
//! XPath match back into a text range.
//!
//! ```rust
//! use tei_editor_core::{EditorConfig, MemoryBuffer, TextRange, XmlEditor};
//!
//! let mut editor = XmlEditor::new(MemoryBuffer::new("<a><b/><b/></a>"), EditorConfig::default());
//! editor.set_parent_path("/a/b");
//! assert_eq!(editor.count_by_xpath("/a/b").unwrap(), 2);
//!
//! editor.select_by_index(2).unwrap();
//! assert_eq!(editor.buffer().selection(), &[TextRange::new(7, 11)]);
//!
//! editor.previous_node().unwrap();
//! assert_eq!(editor.current_index(), 1);
//! ```

pub mod buffer;
pub mod config;
pub mod editor;
pub mod error;
pub mod linker;
pub mod navigation;
pub mod resolver;
pub mod snapshot;
pub mod validation;

pub use buffer::{BufferEvent, MemoryBuffer, TextBuffer, TextRange};
pub use config::EditorConfig;
pub use editor::{EditorEvent, ResolvedSelection, XmlEditor};
pub use error::{EditorError, LinkError, Result, StructuralImbalance, TreeSide};
pub use linker::{LinkMap, link, link_from};
pub use navigation::{NavigationEvent, NavigationState};
pub use resolver::Resolver;
pub use snapshot::{DocumentSnapshot, DocumentVersion};
pub use validation::{ValidationDriver, ValidationOutcome, ValidationReport, ValidationTicket, Validator};
