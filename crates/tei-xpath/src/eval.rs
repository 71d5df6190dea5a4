//! Expression evaluation over a [`Document`].

use crate::ast::{Axis, BinaryOp, Expr, NodeTest, Step};
use crate::error::Result;
use crate::functions;
use crate::value::{Value, sort_document_order, string_to_number, string_value};
use tei_xml::{Document, NodeId, NodeKind, NodeRef};

/// Dynamic context of one evaluation step.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Context {
    pub(crate) node: NodeRef,
    /// 1-based
    pub(crate) position: usize,
    pub(crate) size: usize,
}

impl Context {
    pub(crate) fn root(node: NodeRef) -> Self {
        Context {
            node,
            position: 1,
            size: 1,
        }
    }
}

pub(crate) struct Evaluator<'d> {
    pub(crate) doc: &'d Document,
}

/// Operand of a comparison once node-sets are unpacked.
#[derive(Debug, Clone)]
enum Atom {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl Atom {
    fn of(value: &Value, doc: &Document) -> Atom {
        match value {
            Value::Boolean(b) => Atom::Bool(*b),
            Value::Number(n) => Atom::Num(*n),
            other => Atom::Str(other.to_string_value(doc)),
        }
    }

    /// The string-value of a node, typed to compare against `other`.
    fn of_node_against(node_string: String, other: &Atom) -> Atom {
        match other {
            Atom::Num(_) => Atom::Num(string_to_number(&node_string)),
            _ => Atom::Str(node_string),
        }
    }

    fn to_bool(&self) -> bool {
        match self {
            Atom::Str(s) => !s.is_empty(),
            Atom::Num(n) => *n != 0.0 && !n.is_nan(),
            Atom::Bool(b) => *b,
        }
    }

    fn to_num(&self) -> f64 {
        match self {
            Atom::Str(s) => string_to_number(s),
            Atom::Num(n) => *n,
            Atom::Bool(b) => f64::from(u8::from(*b)),
        }
    }
}

fn compare_atoms(op: BinaryOp, lhs: &Atom, rhs: &Atom) -> bool {
    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = match (lhs, rhs) {
                (Atom::Bool(_), _) | (_, Atom::Bool(_)) => lhs.to_bool() == rhs.to_bool(),
                (Atom::Num(_), _) | (_, Atom::Num(_)) => lhs.to_num() == rhs.to_num(),
                (Atom::Str(a), Atom::Str(b)) => a == b,
            };
            equal == (op == BinaryOp::Eq)
        }
        BinaryOp::Lt => lhs.to_num() < rhs.to_num(),
        BinaryOp::Le => lhs.to_num() <= rhs.to_num(),
        BinaryOp::Gt => lhs.to_num() > rhs.to_num(),
        BinaryOp::Ge => lhs.to_num() >= rhs.to_num(),
        _ => false,
    }
}

impl<'d> Evaluator<'d> {
    pub(crate) fn new(doc: &'d Document) -> Self {
        Evaluator { doc }
    }

    pub(crate) fn eval(&self, expr: &Expr, ctx: &Context) -> Result<Value> {
        match expr {
            Expr::Literal(s) => Ok(Value::String(s.clone())),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Negate(inner) => Ok(Value::Number(-self.eval(inner, ctx)?.to_number(self.doc))),
            Expr::Binary(BinaryOp::Or, lhs, rhs) => Ok(Value::Boolean(
                self.eval(lhs, ctx)?.to_boolean() || self.eval(rhs, ctx)?.to_boolean(),
            )),
            Expr::Binary(BinaryOp::And, lhs, rhs) => Ok(Value::Boolean(
                self.eval(lhs, ctx)?.to_boolean() && self.eval(rhs, ctx)?.to_boolean(),
            )),
            Expr::Binary(
                op @ (BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge),
                lhs,
                rhs,
            ) => {
                let lhs = self.eval(lhs, ctx)?;
                let rhs = self.eval(rhs, ctx)?;
                Ok(Value::Boolean(self.compare(*op, &lhs, &rhs)))
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = self.eval(lhs, ctx)?.to_number(self.doc);
                let b = self.eval(rhs, ctx)?.to_number(self.doc);
                Ok(Value::Number(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                }))
            }
            Expr::Union(lhs, rhs) => {
                let mut nodes = self.eval(lhs, ctx)?.into_node_set()?;
                nodes.extend(self.eval(rhs, ctx)?.into_node_set()?);
                sort_document_order(&mut nodes);
                Ok(Value::NodeSet(nodes))
            }
            Expr::Path { absolute, steps } => {
                let start = if *absolute {
                    NodeRef::Node(self.doc.root())
                } else {
                    ctx.node
                };
                Ok(Value::NodeSet(self.apply_steps(vec![start], steps)?))
            }
            Expr::Filter {
                primary,
                predicates,
                steps,
            } => {
                let nodes = self.eval(primary, ctx)?.into_node_set()?;
                let nodes = self.apply_predicates(nodes, predicates)?;
                Ok(Value::NodeSet(self.apply_steps(nodes, steps)?))
            }
            Expr::Function { name, args } => functions::call(self, name, args, ctx),
        }
    }

    fn compare(&self, op: BinaryOp, lhs: &Value, rhs: &Value) -> bool {
        let doc = self.doc;
        match (lhs, rhs) {
            (Value::NodeSet(a), Value::NodeSet(b)) => {
                let right: Vec<Atom> = b.iter().map(|&n| Atom::Str(string_value(doc, n))).collect();
                a.iter().any(|&n| {
                    let left = Atom::Str(string_value(doc, n));
                    right.iter().any(|r| compare_atoms(op, &left, r))
                })
            }
            (Value::NodeSet(a), Value::Boolean(b)) => {
                compare_atoms(op, &Atom::Bool(!a.is_empty()), &Atom::Bool(*b))
            }
            (Value::Boolean(b), Value::NodeSet(a)) => {
                compare_atoms(op, &Atom::Bool(*b), &Atom::Bool(!a.is_empty()))
            }
            (Value::NodeSet(a), other) => {
                let right = Atom::of(other, doc);
                a.iter().any(|&n| {
                    compare_atoms(op, &Atom::of_node_against(string_value(doc, n), &right), &right)
                })
            }
            (other, Value::NodeSet(b)) => {
                let left = Atom::of(other, doc);
                b.iter().any(|&n| {
                    compare_atoms(op, &left, &Atom::of_node_against(string_value(doc, n), &left))
                })
            }
            (a, b) => compare_atoms(op, &Atom::of(a, doc), &Atom::of(b, doc)),
        }
    }

    fn apply_steps(&self, mut nodes: Vec<NodeRef>, steps: &[Step]) -> Result<Vec<NodeRef>> {
        for step in steps {
            let mut next = Vec::new();
            for &node in &nodes {
                let candidates: Vec<NodeRef> = self
                    .axis(step.axis, node)
                    .into_iter()
                    .filter(|&n| self.matches(n, &step.test))
                    .collect();
                next.extend(self.apply_predicates(candidates, &step.predicates)?);
            }
            sort_document_order(&mut next);
            nodes = next;
        }
        Ok(nodes)
    }

    /// Filter `nodes` (in axis order) through each predicate in turn.
    fn apply_predicates(&self, mut nodes: Vec<NodeRef>, predicates: &[Expr]) -> Result<Vec<NodeRef>> {
        for predicate in predicates {
            let size = nodes.len();
            let mut kept = Vec::with_capacity(size);
            for (i, &node) in nodes.iter().enumerate() {
                let ctx = Context {
                    node,
                    position: i + 1,
                    size,
                };
                let keep = match self.eval(predicate, &ctx)? {
                    Value::Number(n) => n == (i + 1) as f64,
                    other => other.to_boolean(),
                };
                if keep {
                    kept.push(node);
                }
            }
            nodes = kept;
        }
        Ok(nodes)
    }

    fn matches(&self, node: NodeRef, test: &NodeTest) -> bool {
        match node {
            NodeRef::Attribute { owner, index } => {
                let Some(attr) = self.doc.attributes(owner).get(index) else {
                    return false;
                };
                match test {
                    NodeTest::Node | NodeTest::Any => true,
                    NodeTest::AnyInNamespace(uri) => attr.name.namespace.as_deref() == Some(uri),
                    NodeTest::Name { namespace, local } => {
                        attr.name.local == *local && attr.name.namespace == *namespace
                    }
                    _ => false,
                }
            }
            NodeRef::Node(id) => match (test, self.doc.kind(id)) {
                (NodeTest::Node, _) => true,
                (NodeTest::Text, NodeKind::Text(_)) => true,
                (NodeTest::Comment, NodeKind::Comment(_)) => true,
                (NodeTest::ProcessingInstruction(None), NodeKind::ProcessingInstruction { .. }) => true,
                (
                    NodeTest::ProcessingInstruction(Some(wanted)),
                    NodeKind::ProcessingInstruction { target, .. },
                ) => wanted == target,
                (NodeTest::Any, NodeKind::Element(_)) => true,
                (NodeTest::AnyInNamespace(uri), NodeKind::Element(e)) => {
                    e.name.namespace.as_deref() == Some(uri)
                }
                (NodeTest::Name { namespace, local }, NodeKind::Element(e)) => {
                    e.name.local == *local && e.name.namespace == *namespace
                }
                _ => false,
            },
        }
    }

    /// Nodes on `axis` from `node`, nearest first for reverse axes.
    pub(crate) fn axis(&self, axis: Axis, node: NodeRef) -> Vec<NodeRef> {
        let doc = self.doc;
        let wrap = |ids: Vec<NodeId>| ids.into_iter().map(NodeRef::Node).collect::<Vec<_>>();
        match (axis, node) {
            (Axis::Self_, _) => vec![node],
            (Axis::Attribute, NodeRef::Node(id)) => (0..doc.attributes(id).len())
                .map(|index| NodeRef::Attribute { owner: id, index })
                .collect(),
            (Axis::Attribute, NodeRef::Attribute { .. }) => Vec::new(),
            (Axis::Child, NodeRef::Node(id)) => wrap(doc.children(id).to_vec()),
            (Axis::Descendant, NodeRef::Node(id)) => {
                wrap(doc.descendants_or_self(id).into_iter().skip(1).collect())
            }
            (Axis::DescendantOrSelf, NodeRef::Node(id)) => wrap(doc.descendants_or_self(id)),
            (Axis::Child | Axis::Descendant, NodeRef::Attribute { .. }) => Vec::new(),
            (Axis::DescendantOrSelf, NodeRef::Attribute { .. }) => vec![node],
            (Axis::Parent, _) => match node {
                NodeRef::Attribute { owner, .. } => vec![NodeRef::Node(owner)],
                NodeRef::Node(id) => doc.parent(id).map(NodeRef::Node).into_iter().collect(),
            },
            (Axis::Ancestor, _) => self.ancestors(node),
            (Axis::AncestorOrSelf, _) => {
                let mut out = vec![node];
                out.extend(self.ancestors(node));
                out
            }
            (Axis::FollowingSibling | Axis::PrecedingSibling, NodeRef::Attribute { .. }) => {
                Vec::new()
            }
            (Axis::FollowingSibling, NodeRef::Node(id)) => {
                let siblings = self.siblings(id);
                let at = siblings.iter().position(|&s| s == id).unwrap_or(siblings.len());
                wrap(siblings.get(at + 1..).unwrap_or_default().to_vec())
            }
            (Axis::PrecedingSibling, NodeRef::Node(id)) => {
                let siblings = self.siblings(id);
                let at = siblings.iter().position(|&s| s == id).unwrap_or(0);
                wrap(siblings[..at].iter().rev().copied().collect())
            }
            (Axis::Following, _) => {
                // Past the subtree of a node; an attribute's owner subtree follows it.
                let after = match node {
                    NodeRef::Node(id) => doc.descendants_or_self(id).last().copied().unwrap_or(id),
                    NodeRef::Attribute { owner, .. } => owner,
                };
                wrap(
                    doc.descendants_or_self(doc.root())
                        .into_iter()
                        .filter(|n| n.index() > after.index())
                        .collect(),
                )
            }
            (Axis::Preceding, _) => {
                let id = node.node();
                let ancestors: Vec<NodeId> = std::iter::once(id).chain(doc.ancestors(id)).collect();
                wrap(
                    doc.descendants_or_self(doc.root())
                        .into_iter()
                        .filter(|n| n.index() < id.index() && !ancestors.contains(n))
                        .rev()
                        .collect(),
                )
            }
        }
    }

    fn ancestors(&self, node: NodeRef) -> Vec<NodeRef> {
        match node {
            NodeRef::Attribute { owner, .. } => std::iter::once(owner)
                .chain(self.doc.ancestors(owner))
                .map(NodeRef::Node)
                .collect(),
            NodeRef::Node(id) => self.doc.ancestors(id).map(NodeRef::Node).collect(),
        }
    }

    fn siblings(&self, id: NodeId) -> &'d [NodeId] {
        match self.doc.parent(id) {
            Some(parent) => self.doc.children(parent),
            None => &[],
        }
    }
}
