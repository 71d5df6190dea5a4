//! Error types for XML parsing with source locations.

use tei_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use tei_source_map::SourceInfo;
use thiserror::Error;

/// Result type alias for tei-xml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that make a text unusable as a DOM.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// XML syntax error from quick-xml.
    #[error("XML syntax error: {message}")]
    XmlSyntax {
        message: String,
        location: Option<SourceInfo>,
    },

    /// Input ended while an element was open.
    #[error("Unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// What was expected when EOF was encountered.
        expected: String,
        location: Option<SourceInfo>,
    },

    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEndTag {
        expected: String,
        found: String,
        location: Option<SourceInfo>,
    },

    /// Well-formedness violations quick-xml does not check itself, such as
    /// text outside the root element or an end tag with nothing open.
    #[error("Invalid XML structure: {message}")]
    InvalidStructure {
        message: String,
        location: Option<SourceInfo>,
    },

    #[error("Empty XML document: no root element found")]
    EmptyDocument,

    #[error("Invalid XML: multiple root elements")]
    MultipleRoots { location: Option<SourceInfo> },

    #[error("Namespace prefix '{prefix}' is not bound")]
    UnboundPrefix {
        prefix: String,
        location: Option<SourceInfo>,
    },
}

impl Error {
    pub fn location(&self) -> Option<SourceInfo> {
        match self {
            Error::XmlSyntax { location, .. }
            | Error::UnexpectedEof { location, .. }
            | Error::MismatchedEndTag { location, .. }
            | Error::InvalidStructure { location, .. }
            | Error::MultipleRoots { location }
            | Error::UnboundPrefix { location, .. } => *location,
            Error::EmptyDocument => None,
        }
    }

    /// Convert this error to a DiagnosticMessage with the appropriate T-1-* error code.
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self {
            Error::XmlSyntax { message, .. } => DiagnosticMessageBuilder::error("XML Syntax Error")
                .with_code("T-1-1")
                .problem(message.clone()),

            Error::UnexpectedEof { expected, .. } => {
                DiagnosticMessageBuilder::error("Unexpected End of XML Input")
                    .with_code("T-1-2")
                    .problem(format!(
                        "The XML document ended unexpectedly; expected {}",
                        expected
                    ))
            }

            Error::MismatchedEndTag {
                expected, found, ..
            } => DiagnosticMessageBuilder::error("Mismatched XML End Tag")
                .with_code("T-1-3")
                .problem(format!(
                    "End tag </{}> does not match start tag <{}>",
                    found, expected
                ))
                .add_detail(format!("Expected: </{}>", expected))
                .add_detail(format!("Found: </{}>", found))
                .add_hint("Check that all opening tags have matching closing tags?"),

            Error::InvalidStructure { message, .. } => {
                DiagnosticMessageBuilder::error("Invalid XML Structure")
                    .with_code("T-1-4")
                    .problem(message.clone())
            }

            Error::EmptyDocument => DiagnosticMessageBuilder::error("Empty XML Document")
                .with_code("T-1-5")
                .problem("The XML document contains no root element")
                .add_hint("Add a root element to the document?"),

            Error::MultipleRoots { .. } => {
                DiagnosticMessageBuilder::error("Multiple XML Root Elements")
                    .with_code("T-1-6")
                    .problem("The XML document contains multiple root elements")
                    .add_detail("XML documents must have exactly one root element")
                    .add_hint("Wrap multiple elements in a single container element?")
            }

            Error::UnboundPrefix { prefix, .. } => {
                DiagnosticMessageBuilder::error("Unbound Namespace Prefix")
                    .with_code("T-1-7")
                    .problem(format!("The prefix '{}' has no namespace declaration in scope", prefix))
                    .add_hint(format!("Declare it with xmlns:{}=\"...\" on an ancestor?", prefix))
            }
        };

        match self.location() {
            Some(location) => builder.with_location(location).build(),
            None => builder.build(),
        }
    }
}
