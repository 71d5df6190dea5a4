//! XPath values and the conversions between them.

use crate::error::{Result, XPathError};
use tei_xml::{Document, NodeKind, NodeRef};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Nodes in document order without duplicates
    NodeSet(Vec<NodeRef>),
    Boolean(bool),
    Number(f64),
    String(String),
}

impl Value {
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::NodeSet(nodes) => !nodes.is_empty(),
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }

    pub fn to_number(&self, doc: &Document) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Boolean(true) => 1.0,
            Value::Boolean(false) => 0.0,
            Value::String(s) => string_to_number(s),
            Value::NodeSet(_) => string_to_number(&self.to_string_value(doc)),
        }
    }

    pub fn to_string_value(&self, doc: &Document) -> String {
        match self {
            Value::NodeSet(nodes) => nodes
                .first()
                .map(|&n| string_value(doc, n))
                .unwrap_or_default(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.clone(),
        }
    }

    pub fn into_node_set(self) -> Result<Vec<NodeRef>> {
        match self {
            Value::NodeSet(nodes) => Ok(nodes),
            _ => Err(XPathError::NotANodeSet),
        }
    }
}

/// String-value of a node as XPath defines it.
pub fn string_value(doc: &Document, node: NodeRef) -> String {
    match node {
        NodeRef::Attribute { owner, index } => doc
            .attributes(owner)
            .get(index)
            .map(|a| a.value.clone())
            .unwrap_or_default(),
        NodeRef::Node(id) => match doc.kind(id) {
            NodeKind::Text(text) | NodeKind::Comment(text) => text.clone(),
            NodeKind::ProcessingInstruction { data, .. } => data.clone(),
            NodeKind::Document | NodeKind::Element(_) => doc.text_content(id),
        },
    }
}

/// `number()` of a string: optional minus, digits with an optional
/// fraction, surrounded by whitespace. Anything else is NaN.
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r'));
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let valid = !digits.is_empty()
        && digits != "."
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.matches('.').count() <= 1;
    if !valid {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e17 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Sort key placing attributes after their owner and before its children.
pub(crate) fn document_order_key(node: NodeRef) -> (usize, usize) {
    match node {
        NodeRef::Node(id) => (id.index(), 0),
        NodeRef::Attribute { owner, index } => (owner.index(), index + 1),
    }
}

pub(crate) fn sort_document_order(nodes: &mut Vec<NodeRef>) {
    nodes.sort_by_key(|&n| document_order_key(n));
    nodes.dedup();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_to_number() {
        assert_eq!(string_to_number(" 42 "), 42.0);
        assert_eq!(string_to_number("-1.5"), -1.5);
        assert_eq!(string_to_number(".5"), 0.5);
        assert!(string_to_number("1e3").is_nan());
        assert!(string_to_number("+1").is_nan());
        assert!(string_to_number("").is_nan());
        assert!(string_to_number("inf").is_nan());
        assert!(string_to_number("1.2.3").is_nan());
    }

    #[test]
    fn test_number_to_string() {
        assert_eq!(number_to_string(2.0), "2");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.25), "0.25");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_boolean_conversion() {
        assert!(!Value::Number(f64::NAN).to_boolean());
        assert!(Value::String("false".into()).to_boolean());
        assert!(!Value::NodeSet(vec![]).to_boolean());
    }
}
