//! Namespace-aware XML DOM with source tracking.
//!
//! The DOM is the semantic view of an editor buffer: it only exists for
//! well-formed text. It wraps [`quick-xml`] to build an arena of nodes where
//! every parsed node remembers the byte range it came from.
//!
//! # Example
//!
//! ```rust
//! use tei_xml::parse;
//!
//! let doc = parse(r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><text n="1"/></TEI>"#).unwrap();
//! let root = doc.document_element().unwrap();
//! assert_eq!(doc.tag_name(root).as_deref(), Some("TEI"));
//! assert_eq!(doc.namespace_uri(root), Some("http://www.tei-c.org/ns/1.0"));
//!
//! let text = doc.element_children(root).next().unwrap();
//! assert_eq!(doc.attribute(text, "n"), Some("1"));
//! assert_eq!(tei_xml::xpath_for_node(&doc, Some(text.into())).as_deref(), Some("/TEI[1]/text[1]"));
//! ```

pub mod dom;
pub mod error;
pub mod parser;
pub mod path;
pub mod serialize;

pub use dom::{Attribute, Document, ElementData, NodeId, NodeKind, NodeRef, QName};
pub use error::{Error, Result};
pub use parser::{parse, parse_with_file_id};
pub use path::xpath_for_node;

/// Namespace bound to the `xml` prefix in every document.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of `xmlns` declarations.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// The TEI namespace.
pub const TEI_NAMESPACE: &str = "http://www.tei-c.org/ns/1.0";
