//! The editable text the core observes.
//!
//! The host owns a [`TextBuffer`] and forwards its notifications to
//! [`crate::XmlEditor::handle_event`] as [`BufferEvent`]s, in order.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// A byte range of the buffer text. `from` may be greater than `to` for a
/// selection made backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TextRange {
    pub from: usize,
    pub to: usize,
}

impl TextRange {
    pub fn new(from: usize, to: usize) -> Self {
        TextRange { from, to }
    }

    pub fn caret(offset: usize) -> Self {
        TextRange {
            from: offset,
            to: offset,
        }
    }

    pub fn start(&self) -> usize {
        self.from.min(self.to)
    }

    pub fn end(&self) -> usize {
        self.from.max(self.to)
    }

    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }
}

impl From<std::ops::Range<usize>> for TextRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        TextRange::new(range.start, range.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BufferEvent {
    /// The text changed. `structural` is false when the edit cannot have
    /// changed the markup (no `<`, `>` or `&` inserted or removed).
    Changed { structural: bool },
    /// The selection changed; the first range is the primary one
    SelectionChanged(Vec<TextRange>),
    /// The buffer can now accept selections
    Ready,
}

pub trait TextBuffer {
    /// Snapshot of the full text.
    fn text(&self) -> &str;

    /// Select `range`.
    fn set_selection(&mut self, range: TextRange);

    fn scroll_into_view(&mut self, range: TextRange);

    /// Replace the text in `range` with `text`.
    fn replace(&mut self, range: TextRange, text: &str) -> Result<()>;

    /// Load a new document. Sends no change notification; the caller
    /// rebuilds directly.
    fn set_text(&mut self, text: &str);

    /// Whether selections can be applied. Buffers that are still mounting
    /// report `false` and send [`BufferEvent::Ready`] later.
    fn is_ready(&self) -> bool {
        true
    }

    /// Next queued notification, for buffers that queue them.
    fn poll_event(&mut self) -> Option<BufferEvent> {
        None
    }
}

/// A [`TextBuffer`] over a `String` with queued notifications.
#[derive(Debug, Clone, Default)]
pub struct MemoryBuffer {
    text: String,
    selection: Vec<TextRange>,
    scrolled_to: Option<TextRange>,
    ready: bool,
    events: VecDeque<BufferEvent>,
}

impl MemoryBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        MemoryBuffer {
            text: text.into(),
            selection: vec![TextRange::caret(0)],
            scrolled_to: None,
            ready: true,
            events: VecDeque::new(),
        }
    }

    /// A buffer that accepts selections only after [`MemoryBuffer::mark_ready`].
    pub fn pending(text: impl Into<String>) -> Self {
        MemoryBuffer {
            ready: false,
            ..MemoryBuffer::new(text)
        }
    }

    pub fn mark_ready(&mut self) {
        if !self.ready {
            self.ready = true;
            self.events.push_back(BufferEvent::Ready);
        }
    }

    pub fn insert(&mut self, offset: usize, text: &str) -> Result<()> {
        self.replace(TextRange::caret(offset), text)
    }

    /// A selection made by the user.
    pub fn select(&mut self, ranges: Vec<TextRange>) {
        self.selection = ranges.clone();
        self.events.push_back(BufferEvent::SelectionChanged(ranges));
    }

    pub fn selection(&self) -> &[TextRange] {
        &self.selection
    }

    pub fn scrolled_to(&self) -> Option<TextRange> {
        self.scrolled_to
    }

    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }
}

fn is_markup(text: &str) -> bool {
    text.contains(['<', '>', '&'])
}

impl TextBuffer for MemoryBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_selection(&mut self, range: TextRange) {
        self.select(vec![range]);
    }

    fn scroll_into_view(&mut self, range: TextRange) {
        self.scrolled_to = Some(range);
    }

    fn replace(&mut self, range: TextRange, text: &str) -> Result<()> {
        let (start, end) = (range.start(), range.end());
        let valid = end <= self.text.len()
            && self.text.is_char_boundary(start)
            && self.text.is_char_boundary(end);
        if !valid {
            return Err(EditorError::InvalidRange {
                from: range.from,
                to: range.to,
                len: self.text.len(),
            });
        }
        let structural = is_markup(&self.text[start..end]) || is_markup(text);
        self.text.replace_range(start..end, text);
        self.events.push_back(BufferEvent::Changed { structural });
        Ok(())
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.selection = vec![TextRange::caret(0)];
        self.scrolled_to = None;
        self.events.clear();
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn poll_event(&mut self) -> Option<BufferEvent> {
        self.events.pop_front()
    }
}
