/*
 * parser.rs
 *
 * Copyright (c) 2025 Posit, PBC
 *
 * Error-tolerant XML parser producing a SyntaxTree for any input.
 */

use crate::kind::SyntaxKind;
use crate::tree::{NodeData, SyntaxNodeId, SyntaxTree};
use std::sync::Arc;

const ROOT: SyntaxNodeId = SyntaxNodeId(0);

/// Parse `text` into a syntax tree.
///
/// Never fails. Malformed markup produces `Error` or `MismatchedCloseTag`
/// nodes, unclosed elements extend to where they were implicitly closed,
/// and the `Document` node always spans the full text.
pub fn parse(text: &str) -> SyntaxTree {
    parse_shared(Arc::from(text))
}

/// Like [`parse`], reusing an already shared text buffer.
pub fn parse_shared(text: Arc<str>) -> SyntaxTree {
    let nodes = {
        let mut parser = Parser::new(&text);
        parser.run();
        parser.nodes
    };
    tracing::trace!(bytes = text.len(), nodes = nodes.len(), "built syntax tree");
    SyntaxTree::new(text, nodes)
}

struct OpenElement {
    id: SyntaxNodeId,
    name_start: usize,
    name_end: usize,
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    nodes: Vec<NodeData>,
    open: Vec<OpenElement>,
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':' || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let root = NodeData {
            kind: SyntaxKind::Document,
            start: 0,
            end: text.len(),
            parent: None,
            index_in_parent: 0,
            children: Vec::new(),
        };
        Parser {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            nodes: vec![root],
            open: Vec::new(),
        }
    }

    fn run(&mut self) {
        let mut text_start = None;
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'<' => {
                    self.flush_text(&mut text_start);
                    self.markup();
                }
                b'&' => {
                    if let Some(end) = self.entity_end(self.pos) {
                        self.flush_text(&mut text_start);
                        let parent = self.current_parent();
                        self.leaf(SyntaxKind::EntityReference, self.pos, end, parent);
                        self.pos = end;
                    } else {
                        text_start.get_or_insert(self.pos);
                        self.pos += 1;
                    }
                }
                _ => {
                    text_start.get_or_insert(self.pos);
                    self.pos += 1;
                }
            }
        }
        self.flush_text(&mut text_start);

        let len = self.bytes.len();
        while let Some(element) = self.open.pop() {
            self.nodes[element.id.index()].end = len;
        }
    }

    fn current_parent(&self) -> SyntaxNodeId {
        self.open.last().map_or(ROOT, |e| e.id)
    }

    fn flush_text(&mut self, text_start: &mut Option<usize>) {
        if let Some(start) = text_start.take() {
            let parent = self.current_parent();
            self.leaf(SyntaxKind::Text, start, self.pos, parent);
        }
    }

    /// Allocate a node with a provisional end; callers fix `end` once known.
    fn open_node(&mut self, kind: SyntaxKind, start: usize, parent: SyntaxNodeId) -> SyntaxNodeId {
        let id = SyntaxNodeId(self.nodes.len() as u32);
        let siblings = &mut self.nodes[parent.index()].children;
        let index_in_parent = siblings.len() as u32;
        siblings.push(id);
        self.nodes.push(NodeData {
            kind,
            start,
            end: start,
            parent: Some(parent),
            index_in_parent,
            children: Vec::new(),
        });
        id
    }

    fn leaf(&mut self, kind: SyntaxKind, start: usize, end: usize, parent: SyntaxNodeId) -> SyntaxNodeId {
        let id = self.open_node(kind, start, parent);
        self.nodes[id.index()].end = end;
        id
    }

    fn find(&self, from: usize, needle: &str) -> Option<usize> {
        self.text.get(from..)?.find(needle).map(|i| from + i)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.bytes[self.pos..].starts_with(prefix.as_bytes())
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn scan_name(&self, from: usize) -> usize {
        let mut end = from;
        if end < self.bytes.len() && is_name_start(self.bytes[end]) {
            end += 1;
            while end < self.bytes.len() && is_name_char(self.bytes[end]) {
                end += 1;
            }
        }
        end
    }

    /// End of a well-formed `&name;` or `&#..;` reference starting at `at`.
    fn entity_end(&self, at: usize) -> Option<usize> {
        let mut i = at + 1;
        if self.bytes.get(i) == Some(&b'#') {
            i += 1;
            let hex = self.bytes.get(i) == Some(&b'x');
            if hex {
                i += 1;
            }
            let digits_start = i;
            while i < self.bytes.len()
                && (if hex {
                    self.bytes[i].is_ascii_hexdigit()
                } else {
                    self.bytes[i].is_ascii_digit()
                })
            {
                i += 1;
            }
            if i == digits_start {
                return None;
            }
        } else {
            let end = self.scan_name(i);
            if end == i {
                return None;
            }
            i = end;
        }
        (self.bytes.get(i) == Some(&b';')).then_some(i + 1)
    }

    fn markup(&mut self) {
        let start = self.pos;
        let len = self.bytes.len();
        let parent = self.current_parent();

        if self.starts_with("<!--") {
            let end = self.find(start + 4, "-->").map_or(len, |i| i + 3);
            self.leaf(SyntaxKind::Comment, start, end, parent);
            self.pos = end;
        } else if self.starts_with("<![CDATA[") {
            let end = self.find(start + 9, "]]>").map_or(len, |i| i + 3);
            self.leaf(SyntaxKind::Cdata, start, end, parent);
            self.pos = end;
        } else if self.starts_with("<?") {
            let end = self.find(start + 2, "?>").map_or(len, |i| i + 2);
            self.leaf(SyntaxKind::ProcessingInst, start, end, parent);
            self.pos = end;
        } else if self.starts_with("<!") {
            let end = self.doctype_end(start + 2);
            self.leaf(SyntaxKind::DoctypeDecl, start, end, parent);
            self.pos = end;
        } else if self.starts_with("</") {
            self.close_tag();
        } else if start + 1 < len && is_name_start(self.bytes[start + 1]) {
            self.open_tag();
        } else {
            self.leaf(SyntaxKind::Error, start, start + 1, parent);
            self.pos = start + 1;
        }
    }

    fn doctype_end(&self, from: usize) -> usize {
        let mut depth = 0usize;
        for (i, &b) in self.bytes.iter().enumerate().skip(from) {
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return i + 1,
                _ => {}
            }
        }
        self.bytes.len()
    }

    fn open_tag(&mut self) {
        let start = self.pos;
        let parent = self.current_parent();
        let element = self.open_node(SyntaxKind::Element, start, parent);
        let tag = self.open_node(SyntaxKind::OpenTag, start, element);

        let name_start = start + 1;
        let name_end = self.scan_name(name_start);
        self.leaf(SyntaxKind::TagName, name_start, name_end, tag);
        self.pos = name_end;

        let len = self.bytes.len();
        loop {
            self.skip_whitespace();
            if self.pos >= len {
                self.nodes[tag.index()].end = len;
                break;
            }
            match self.bytes[self.pos] {
                b'>' => {
                    self.pos += 1;
                    self.nodes[tag.index()].end = self.pos;
                    break;
                }
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'>') => {
                    self.pos += 2;
                    let tag_data = &mut self.nodes[tag.index()];
                    tag_data.kind = SyntaxKind::SelfClosingTag;
                    tag_data.end = self.pos;
                    self.nodes[element.index()].end = self.pos;
                    return;
                }
                b'<' => {
                    // Unterminated start tag; the element still opens.
                    self.nodes[tag.index()].end = self.pos;
                    break;
                }
                b if is_name_start(b) => self.attribute(tag),
                _ => {
                    self.leaf(SyntaxKind::Error, self.pos, self.pos + 1, tag);
                    self.pos += 1;
                }
            }
        }

        self.open.push(OpenElement {
            id: element,
            name_start,
            name_end,
        });
    }

    fn attribute(&mut self, tag: SyntaxNodeId) {
        let start = self.pos;
        let attr = self.open_node(SyntaxKind::Attribute, start, tag);
        let name_end = self.scan_name(start);
        self.leaf(SyntaxKind::AttributeName, start, name_end, attr);
        self.pos = name_end;
        let mut end = name_end;

        let resume = self.pos;
        self.skip_whitespace();
        if self.bytes.get(self.pos) == Some(&b'=') {
            self.pos += 1;
            end = self.pos;
            self.skip_whitespace();
            if let Some(value_end) = self.attribute_value() {
                self.leaf(SyntaxKind::AttributeValue, self.pos, value_end, attr);
                self.pos = value_end;
                end = value_end;
            }
        } else {
            self.pos = resume;
        }
        self.nodes[attr.index()].end = end;
    }

    /// End of the attribute value at the current position, if one is there.
    fn attribute_value(&self) -> Option<usize> {
        let len = self.bytes.len();
        let first = *self.bytes.get(self.pos)?;
        if first == b'"' || first == b'\'' {
            // `<` cannot appear in a value, so it terminates an unclosed one.
            let mut i = self.pos + 1;
            while i < len {
                match self.bytes[i] {
                    b if b == first => return Some(i + 1),
                    b'<' => return Some(i),
                    _ => i += 1,
                }
            }
            return Some(len);
        }
        let mut i = self.pos;
        while i < len {
            match self.bytes[i] {
                b'>' | b'<' | b'"' | b'\'' | b'=' => break,
                b'/' if self.bytes.get(i + 1) == Some(&b'>') => break,
                b if b.is_ascii_whitespace() => break,
                _ => i += 1,
            }
        }
        (i > self.pos).then_some(i)
    }

    fn close_tag(&mut self) {
        let start = self.pos;
        let len = self.bytes.len();
        let name_start = start + 2;
        let name_end = self.scan_name(name_start);

        // Tag extent: through the next `>` unless another tag starts first.
        let mut end = name_end;
        while end < len {
            match self.bytes[end] {
                b'>' => {
                    end += 1;
                    break;
                }
                b'<' => break,
                _ => end += 1,
            }
        }
        self.pos = end;

        let parent = self.current_parent();
        if name_end == name_start {
            self.leaf(SyntaxKind::Error, start, end, parent);
            return;
        }

        let name = &self.bytes[name_start..name_end];
        let matching = self
            .open
            .iter()
            .rposition(|e| &self.bytes[e.name_start..e.name_end] == name);

        match matching {
            Some(depth) => {
                // Elements left open inside the matched one end where this tag begins.
                while self.open.len() > depth + 1 {
                    if let Some(inner) = self.open.pop() {
                        self.nodes[inner.id.index()].end = start;
                    }
                }
                if let Some(element) = self.open.pop() {
                    let tag = self.open_node(SyntaxKind::CloseTag, start, element.id);
                    self.leaf(SyntaxKind::TagName, name_start, name_end, tag);
                    self.nodes[tag.index()].end = end;
                    self.nodes[element.id.index()].end = end;
                }
            }
            None => {
                let tag = self.open_node(SyntaxKind::MismatchedCloseTag, start, parent);
                self.leaf(SyntaxKind::TagName, name_start, name_end, tag);
                self.nodes[tag.index()].end = end;
            }
        }
    }
}
