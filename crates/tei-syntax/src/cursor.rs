//! Stateful walker over a [`SyntaxTree`](crate::SyntaxTree).

use crate::tree::SyntaxNode;

/// A cursor that moves between parent, first child and next sibling.
///
/// The cursor never moves above the node it was created on.
#[derive(Debug, Clone)]
pub struct TreeCursor<'t> {
    origin: SyntaxNode<'t>,
    current: SyntaxNode<'t>,
}

impl<'t> TreeCursor<'t> {
    pub fn new(node: SyntaxNode<'t>) -> Self {
        TreeCursor {
            origin: node,
            current: node,
        }
    }

    pub fn node(&self) -> SyntaxNode<'t> {
        self.current
    }

    pub fn goto_first_child(&mut self) -> bool {
        match self.current.first_child() {
            Some(child) => {
                self.current = child;
                true
            }
            None => false,
        }
    }

    pub fn goto_next_sibling(&mut self) -> bool {
        if self.current == self.origin {
            return false;
        }
        match self.current.next_sibling() {
            Some(sibling) => {
                self.current = sibling;
                true
            }
            None => false,
        }
    }

    pub fn goto_parent(&mut self) -> bool {
        if self.current == self.origin {
            return false;
        }
        match self.current.parent() {
            Some(parent) => {
                self.current = parent;
                true
            }
            None => false,
        }
    }

    /// Number of steps below the starting node.
    pub fn depth(&self) -> usize {
        self.current.depth() - self.origin.depth()
    }

    pub fn reset(&mut self, node: SyntaxNode<'t>) {
        self.origin = node;
        self.current = node;
    }
}
