/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Error types for linking, resolution and navigation.
 */

use tei_error_reporting::{DiagnosticMessage, DiagnosticMessageBuilder};
use tei_source_map::{FileId, SourceInfo};
use tei_xpath::XPathError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EditorError>;

/// Which tree a structural problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeSide {
    ParseTree,
    Dom,
}

impl std::fmt::Display for TreeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreeSide::ParseTree => write!(f, "parse tree"),
            TreeSide::Dom => write!(f, "DOM"),
        }
    }
}

/// Failures that abort a link pass. No map is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("Cannot link a {syntax_kind} parse-tree node with a {dom_kind} DOM node at offset {offset}")]
    InvalidArguments {
        syntax_kind: String,
        dom_kind: String,
        offset: usize,
    },

    #[error("Tag mismatch at offset {offset}: DOM has <{expected}>, parse tree has <{found}>")]
    TagMismatch {
        expected: String,
        found: String,
        offset: usize,
    },
}

impl LinkError {
    pub fn offset(&self) -> usize {
        match self {
            LinkError::InvalidArguments { offset, .. } | LinkError::TagMismatch { offset, .. } => {
                *offset
            }
        }
    }

    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let builder = match self {
            LinkError::InvalidArguments { .. } => {
                DiagnosticMessageBuilder::error("Invalid Link Arguments")
                    .with_code("T-2-1")
                    .problem(self.to_string())
            }
            LinkError::TagMismatch { expected, found, .. } => {
                DiagnosticMessageBuilder::error("Tag Mismatch")
                    .with_code("T-2-2")
                    .problem(format!(
                        "The parse tree reads <{}> where the DOM has <{}>",
                        found, expected
                    ))
                    .add_hint("Positions cannot be mapped to elements until the trees agree")
            }
        };
        let offset = self.offset();
        builder
            .with_location(SourceInfo::original(FileId(0), offset, offset))
            .build()
    }
}

/// A non-fatal link problem: one side has element children the other lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralImbalance {
    /// The tree holding the unmatched element
    pub side: TreeSide,
    pub tag: String,
    /// Start offset of the unmatched parse-tree element, or of the parent
    /// pair when the extra node is on the DOM side
    pub offset: usize,
    /// Canonical path of the unmatched DOM node
    pub dom_path: Option<String>,
}

impl StructuralImbalance {
    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        let mut builder = DiagnosticMessageBuilder::warning("Structural Imbalance")
            .with_code("T-2-3")
            .problem(format!(
                "Element <{}> exists only in the {}",
                self.tag, self.side
            ));
        if let Some(path) = &self.dom_path {
            builder = builder.add_detail(format!("DOM path: {}", path));
        }
        builder
            .with_location(SourceInfo::original(FileId(0), self.offset, self.offset))
            .build()
    }
}

/// Errors reported by [`crate::XmlEditor`] and [`crate::Resolver`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error("No document has been loaded")]
    NoDocumentLoaded,

    #[error("The document is not well-formed XML")]
    MalformedDocument,

    #[error("Position {offset} is outside the document")]
    NoNodeAtPosition { offset: usize },

    #[error("No DOM node is linked to position {offset}")]
    NoMappedDomNode { offset: usize },

    #[error("'{xpath}' matches no node")]
    NoMatchingDomNode { xpath: String },

    #[error("The node matched by '{xpath}' has no position in the text")]
    NoMappedOffset { xpath: String },

    #[error("Index {index} is out of bounds (count: {count})")]
    IndexOutOfBounds { index: usize, count: usize },

    #[error("No parent path has been set")]
    NoParentPathSet,

    #[error("Invalid XPath '{expression}': {source}")]
    XPath {
        expression: String,
        source: XPathError,
    },

    #[error("Range {from}..{to} is not valid in a text of {len} bytes")]
    InvalidRange { from: usize, to: usize, len: usize },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}

impl EditorError {
    pub(crate) fn xpath(expression: &str, source: XPathError) -> Self {
        EditorError::XPath {
            expression: expression.to_string(),
            source,
        }
    }

    /// Failures a navigation sequence downgrades to a warning.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EditorError::NoMappedDomNode { .. }
                | EditorError::NoMatchingDomNode { .. }
                | EditorError::NoMappedOffset { .. }
                | EditorError::MalformedDocument
        )
    }

    pub fn to_diagnostic(&self) -> DiagnosticMessage {
        match self {
            EditorError::XPath { expression, source } => source.to_diagnostic(expression),
            EditorError::IndexOutOfBounds { index, count } => {
                DiagnosticMessageBuilder::error("Index Out Of Bounds")
                    .with_code("T-4-1")
                    .problem(format!("Cannot select item {} of {}", index, count))
                    .add_hint("Indices start at 1")
                    .build()
            }
            EditorError::NoParentPathSet => DiagnosticMessageBuilder::error("No Parent Path Set")
                .with_code("T-4-2")
                .problem("Navigation requires a parent path")
                .add_hint("Call set_parent_path first?")
                .build(),
            EditorError::NoMappedDomNode { .. }
            | EditorError::NoMatchingDomNode { .. }
            | EditorError::NoMappedOffset { .. }
            | EditorError::NoNodeAtPosition { .. } => {
                DiagnosticMessageBuilder::warning("Selection Failed")
                    .with_code("T-4-3")
                    .problem(self.to_string())
                    .build()
            }
            EditorError::Validation(message) => DiagnosticMessageBuilder::error("Validation Failed")
                .with_code("T-5-1")
                .problem(message.clone())
                .build(),
            other => DiagnosticMessageBuilder::error("Editor Error")
                .with_code("T-0-1")
                .problem(other.to_string())
                .build(),
        }
    }
}
