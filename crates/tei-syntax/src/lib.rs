/*
 * lib.rs
 *
 * Copyright (c) 2025 Posit, PBC
 *
 * tei-syntax: error-tolerant parse trees for XML editor buffers.
 *
 * The parse tree is the editor's view of the text. Unlike the DOM it is
 * produced for every input, well-formed or not, and every node carries the
 * byte range it covers. This crate provides:
 *
 * - The tolerant parser (`parse`)
 * - The arena-backed tree and its borrowed node handles
 * - A cursor and generic top-down traversal
 * - Offset lookup (`SyntaxTree::node_at`)
 */

pub mod cursor;
pub mod kind;
pub mod parser;
pub mod traversals;
pub mod tree;

pub use cursor::TreeCursor;
pub use kind::SyntaxKind;
pub use parser::{parse, parse_shared};
pub use traversals::{TraversePhase, topdown_traverse};
pub use tree::{SyntaxNode, SyntaxNodeId, SyntaxTree};
