//! XML parser that builds a namespace-resolved [`Document`].

use crate::dom::{Attribute, Document, ElementData, NodeId, NodeKind, QName};
use crate::{Error, Result, XML_NAMESPACE};
use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tei_source_map::{FileId, FileInformation, SourceInfo};

/// Parse XML from a string.
///
/// # Example
///
/// ```rust
/// use tei_xml::parse;
///
/// let doc = parse("<root><child/></root>").unwrap();
/// let root = doc.document_element().unwrap();
/// assert_eq!(doc.range(root), Some(0..21));
/// ```
///
/// # Errors
///
/// Returns the first well-formedness or namespace error found.
pub fn parse(content: &str) -> Result<Document> {
    parse_with_file_id(content, FileId(0))
}

/// Parse XML, attributing error locations to `file_id`.
pub fn parse_with_file_id(content: &str, file_id: FileId) -> Result<Document> {
    let mut builder = DomBuilder::new(content, file_id);
    let result = builder.parse();
    match &result {
        Ok(doc) => tracing::debug!(bytes = content.len(), nodes = doc.len(), "parsed DOM"),
        Err(err) => tracing::debug!(error = %err, "document is not well-formed"),
    }
    result
}

type Bindings = Vec<(Option<String>, String)>;

struct OpenElement {
    id: NodeId,
    /// Name as written in the start tag
    raw_name: String,
    name_start: usize,
}

struct DomBuilder<'a> {
    source: &'a str,
    reader: Reader<&'a [u8]>,
    file_id: FileId,
    doc: Document,
    stack: Vec<OpenElement>,
    /// Namespace declarations per open element, innermost last
    scopes: Vec<Bindings>,
    seen_root: bool,
}

fn split_name(raw: &str) -> (Option<&str>, &str) {
    match raw.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, raw),
    }
}

impl<'a> DomBuilder<'a> {
    fn new(source: &'a str, file_id: FileId) -> Self {
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text_start = false;
        reader.config_mut().trim_text_end = false;
        // End tags are checked against our own stack to report locations.
        reader.config_mut().check_end_names = false;

        DomBuilder {
            source,
            reader,
            file_id,
            doc: Document::new(),
            stack: Vec::new(),
            scopes: Vec::new(),
            seen_root: false,
        }
    }

    fn parse(&mut self) -> Result<Document> {
        loop {
            let event_start = self.reader.buffer_position() as usize;

            match self.reader.read_event() {
                Ok(Event::Start(e)) => self.handle_start(&e, event_start, false)?,
                Ok(Event::Empty(e)) => self.handle_start(&e, event_start, true)?,
                Ok(Event::End(e)) => self.handle_end(&e, event_start)?,
                Ok(Event::Text(e)) => self.handle_text(&e, event_start)?,
                Ok(Event::CData(_)) => {
                    let end = self.position();
                    let content = &self.source[event_start + 9..end - 3];
                    self.push_text(content.to_string(), event_start, end)?;
                }
                Ok(Event::Comment(_)) => {
                    let end = self.position();
                    let content = self.source[event_start + 4..end - 3].to_string();
                    let parent = self.current_parent();
                    self.doc.push(NodeKind::Comment(content), parent, event_start..end);
                }
                Ok(Event::PI(_)) => {
                    let end = self.position();
                    let inner = &self.source[event_start + 2..end - 2];
                    let (target, data) = inner
                        .split_once(|c: char| c.is_ascii_whitespace())
                        .unwrap_or((inner, ""));
                    let kind = NodeKind::ProcessingInstruction {
                        target: target.to_string(),
                        data: data.trim_start().to_string(),
                    };
                    let parent = self.current_parent();
                    self.doc.push(kind, parent, event_start..end);
                }
                Ok(Event::Decl(_)) => {
                    let end = self.position();
                    self.doc.declaration = Some(self.source[event_start..end].to_string());
                }
                Ok(Event::DocType(_)) => {
                    let end = self.position();
                    self.doc.doctype = Some(self.source[event_start..end].to_string());
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    let pos = self.reader.error_position() as usize;
                    return Err(Error::XmlSyntax {
                        message: e.to_string(),
                        location: Some(self.make_location(pos, pos)),
                    });
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", open.raw_name),
                location: Some(
                    self.make_location(open.name_start, open.name_start + open.raw_name.len()),
                ),
            });
        }
        if !self.seen_root {
            return Err(Error::EmptyDocument);
        }

        Ok(std::mem::take(&mut self.doc))
    }

    fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    fn current_parent(&self) -> NodeId {
        self.stack.last().map_or(self.doc.root(), |e| e.id)
    }

    fn handle_start(&mut self, e: &BytesStart<'_>, event_start: usize, empty: bool) -> Result<()> {
        let end = self.position();
        if self.stack.is_empty() {
            if self.seen_root {
                return Err(Error::MultipleRoots {
                    location: Some(self.make_location(event_start, end)),
                });
            }
            self.seen_root = true;
        }

        let raw_name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let name_start = event_start + 1;

        let mut declarations = Bindings::new();
        let mut raw_attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::XmlSyntax {
                message: format!("Attribute error: {}", err),
                location: Some(self.make_location(event_start, end)),
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| Error::XmlSyntax {
                    message: format!("Invalid attribute value: {}", err),
                    location: Some(self.make_location(event_start, end)),
                })?
                .into_owned();

            if key == "xmlns" {
                declarations.push((None, value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                declarations.push((Some(prefix.to_string()), value));
            } else {
                raw_attributes.push((key, value));
            }
        }
        self.scopes.push(declarations.clone());

        let element_name = self.resolve(&raw_name, true, name_start)?;
        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (key, value) in raw_attributes {
            let name = self.resolve(&key, false, name_start)?;
            attributes.push(Attribute { name, value });
        }

        let parent = self.current_parent();
        let kind = NodeKind::Element(ElementData {
            name: element_name,
            attributes,
            namespace_declarations: declarations,
        });
        let id = self.doc.push(kind, parent, event_start..end);

        if empty {
            self.scopes.pop();
        } else {
            self.stack.push(OpenElement {
                id,
                raw_name,
                name_start,
            });
        }
        Ok(())
    }

    /// Resolve a written name against the namespace scopes.
    ///
    /// Unprefixed element names take the default namespace; unprefixed
    /// attribute names are always in no namespace.
    fn resolve(&self, raw: &str, is_element: bool, name_start: usize) -> Result<QName> {
        let (prefix, local) = split_name(raw);
        let namespace = match prefix {
            Some("xml") => Some(XML_NAMESPACE.to_string()),
            Some(p) => match self.lookup(Some(p)) {
                Some(uri) if !uri.is_empty() => Some(uri.to_string()),
                _ => {
                    return Err(Error::UnboundPrefix {
                        prefix: p.to_string(),
                        location: Some(self.make_location(name_start, name_start + raw.len())),
                    });
                }
            },
            None if is_element => self
                .lookup(None)
                .filter(|uri| !uri.is_empty())
                .map(str::to_string),
            None => None,
        };
        Ok(QName::new(prefix.map(str::to_string), local, namespace))
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.scopes
            .iter()
            .rev()
            .flat_map(|scope| scope.iter())
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn handle_end(&mut self, e: &BytesEnd<'_>, event_start: usize) -> Result<()> {
        let end = self.position();
        let found = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        let open = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
            message: format!("Unexpected closing tag </{}>", found),
            location: Some(self.make_location(event_start, end)),
        })?;

        if open.raw_name != found {
            return Err(Error::MismatchedEndTag {
                expected: open.raw_name,
                found,
                location: Some(self.make_location(event_start, end)),
            });
        }

        self.scopes.pop();
        if let Some(range) = self.doc.node_mut(open.id).range.as_mut() {
            range.end = end;
        }
        Ok(())
    }

    fn handle_text(&mut self, e: &BytesText<'_>, event_start: usize) -> Result<()> {
        let end = self.position();
        let text = e.unescape().map_err(|err| Error::XmlSyntax {
            message: format!("Invalid text content: {}", err),
            location: Some(self.make_location(event_start, end)),
        })?;
        self.push_text(text.into_owned(), event_start, end)
    }

    fn push_text(&mut self, text: String, start: usize, end: usize) -> Result<()> {
        let parent = match self.stack.last() {
            Some(open) => open.id,
            None if text.chars().all(|c| c.is_ascii_whitespace()) => return Ok(()),
            None => {
                return Err(Error::InvalidStructure {
                    message: "Text content outside the root element".to_string(),
                    location: Some(self.make_location(start, end)),
                });
            }
        };

        // Adjacent text and CDATA form one text node.
        if let Some(&last) = self.doc.children(parent).last() {
            let node = self.doc.node_mut(last);
            let contiguous = node.range.as_ref().is_some_and(|r| r.end == start);
            if let (NodeKind::Text(existing), true) = (&mut node.kind, contiguous) {
                existing.push_str(&text);
                if let Some(range) = node.range.as_mut() {
                    range.end = end;
                }
                return Ok(());
            }
        }
        self.doc.push(NodeKind::Text(text), parent, start..end);
        Ok(())
    }

    fn make_location(&self, start: usize, end: usize) -> SourceInfo {
        SourceInfo::resolved(self.file_id, start, end, &FileInformation::new(self.source))
    }
}
