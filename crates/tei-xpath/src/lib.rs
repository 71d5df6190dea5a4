//! XPath 1.0 over [`tei_xml`] documents.
//!
//! Name-test prefixes are resolved against a [`NamespaceTable`] when the
//! expression is compiled, so a compiled [`XPath`] can be evaluated against
//! many documents.
//!
//! ```rust
//! use tei_xpath::{NamespaceTable, select_nodes};
//!
//! let doc = tei_xml::parse(
//!     r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><p n="1"/><p n="2"/></TEI>"#,
//! ).unwrap();
//! let ns = NamespaceTable::default();
//! let nodes = select_nodes(&doc, "//tei:p[@n = 2]", &ns).unwrap();
//! assert_eq!(nodes.len(), 1);
//! assert_eq!(tei_xpath::count(&doc, "/tei:TEI/tei:p", &ns).unwrap(), 2);
//! ```

pub mod ast;
pub mod error;
mod eval;
mod functions;
pub mod lexer;
pub mod namespaces;
pub mod parser;
pub mod value;

pub use ast::{Axis, BinaryOp, Expr, NodeTest, Step};
pub use error::{Result, XPathError};
pub use namespaces::NamespaceTable;
pub use value::Value;

use eval::{Context, Evaluator};
use tei_xml::{Document, NodeRef};

/// A compiled expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct XPath {
    source: String,
    expr: Expr,
}

impl XPath {
    pub fn compile(source: &str, namespaces: &NamespaceTable) -> Result<XPath> {
        let expr = parser::parse(source, namespaces)?;
        Ok(XPath {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate with `context` as the context node (position 1 of 1).
    pub fn evaluate(&self, doc: &Document, context: NodeRef) -> Result<Value> {
        Evaluator::new(doc).eval(&self.expr, &Context::root(context))
    }

    /// Evaluate as `count(expr)`: the size of the node-set, without
    /// handing the nodes back.
    pub fn count(&self, doc: &Document, context: NodeRef) -> Result<usize> {
        let counted = Expr::Function {
            name: "count".to_string(),
            args: vec![self.expr.clone()],
        };
        match Evaluator::new(doc).eval(&counted, &Context::root(context))? {
            Value::Number(n) => Ok(n as usize),
            _ => Err(XPathError::NotANodeSet),
        }
    }

    /// Evaluate and require a node-set, returned in document order.
    pub fn select(&self, doc: &Document, context: NodeRef) -> Result<Vec<NodeRef>> {
        self.evaluate(doc, context)?.into_node_set()
    }
}

/// Evaluate `expression` with the document node as context.
pub fn evaluate(doc: &Document, expression: &str, namespaces: &NamespaceTable) -> Result<Value> {
    tracing::trace!(expression, "evaluating XPath");
    XPath::compile(expression, namespaces)?.evaluate(doc, NodeRef::Node(doc.root()))
}

/// Nodes selected by `expression`, in document order.
pub fn select_nodes(
    doc: &Document,
    expression: &str,
    namespaces: &NamespaceTable,
) -> Result<Vec<NodeRef>> {
    tracing::trace!(expression, "selecting nodes");
    XPath::compile(expression, namespaces)?.select(doc, NodeRef::Node(doc.root()))
}

/// `count(expression)`.
pub fn count(doc: &Document, expression: &str, namespaces: &NamespaceTable) -> Result<usize> {
    let count = XPath::compile(expression, namespaces)?.count(doc, NodeRef::Node(doc.root()))?;
    tracing::trace!(expression, count, "counted nodes");
    Ok(count)
}
