//! Node kinds of the parse tree.

use std::fmt;

/// The kind of a parse tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    /// Root of every tree; spans the whole text.
    Document,
    /// An element: start tag, content and (when present) end tag.
    Element,
    /// `<name attr="v">`
    OpenTag,
    /// `</name>` closing the enclosing element
    CloseTag,
    /// `<name attr="v"/>`
    SelfClosingTag,
    /// `</name>` that matches no open element
    MismatchedCloseTag,
    TagName,
    Attribute,
    AttributeName,
    /// The value including its quotes
    AttributeValue,
    Text,
    /// `&name;`, `&#10;` or `&#x0A;`
    EntityReference,
    Comment,
    ProcessingInst,
    Cdata,
    DoctypeDecl,
    /// Input the parser could not make sense of, such as a stray `<`.
    Error,
}

impl SyntaxKind {
    /// Kinds the tree linker and offset resolution treat as elements.
    pub fn is_element_like(self) -> bool {
        matches!(self, SyntaxKind::Element | SyntaxKind::Document)
    }

    /// Kinds that carry the element's tag name as a `TagName` child.
    pub fn is_start_tag(self) -> bool {
        matches!(self, SyntaxKind::OpenTag | SyntaxKind::SelfClosingTag)
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
