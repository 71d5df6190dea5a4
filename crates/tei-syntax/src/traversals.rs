/*
 * traversals.rs
 *
 * Copyright (c) 2025 Posit, PBC
 *
 * Generic traversal helpers for TreeCursor.
 */

use crate::cursor::TreeCursor;
use crate::tree::SyntaxNode;

/// Phase of tree traversal - whether we're entering or exiting a node.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub enum TraversePhase {
    Enter,
    Exit,
}

#[derive(Clone, Copy)]
enum Step {
    Visit,
    Parent,
    Exit,
    Siblings,
}

/// Top-down traversal starting at the cursor's node.
///
/// Visits each node twice: once on entry (before children) and once on exit
/// (after children). The visitor returns `true` to descend into children,
/// `false` to skip them. Uses an explicit stack, so deep documents do not
/// grow the call stack.
pub fn topdown_traverse<'t, F>(cursor: &mut TreeCursor<'t>, visitor: &mut F)
where
    F: FnMut(SyntaxNode<'t>, TraversePhase) -> bool,
{
    let mut stack = vec![Step::Visit];
    while let Some(step) = stack.pop() {
        match step {
            Step::Visit => {
                stack.push(Step::Exit);
                if visitor(cursor.node(), TraversePhase::Enter) && cursor.goto_first_child() {
                    stack.push(Step::Parent);
                    stack.push(Step::Siblings);
                    stack.push(Step::Visit);
                }
            }
            Step::Parent => {
                cursor.goto_parent();
            }
            Step::Exit => {
                visitor(cursor.node(), TraversePhase::Exit);
            }
            Step::Siblings => {
                if cursor.goto_next_sibling() {
                    stack.push(Step::Siblings);
                    stack.push(Step::Visit);
                }
            }
        }
    }
}
