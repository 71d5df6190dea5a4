//! Immutable per-edit document state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tei_error_reporting::DiagnosticMessage;
use tei_source_map::{FileInformation, Location, SourceInfo};
use tei_syntax::SyntaxTree;
use tei_xml::Document;

use crate::linker::{LinkMap, link};

/// Counter bumped on every text change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct DocumentVersion(pub u64);

impl DocumentVersion {
    pub fn next(self) -> DocumentVersion {
        DocumentVersion(self.0 + 1)
    }
}

impl fmt::Display for DocumentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Everything derived from one version of the text.
///
/// The parse tree always exists. The DOM exists only for well-formed text,
/// and the link map only when the DOM and the parse tree agree on names.
#[derive(Debug)]
pub struct DocumentSnapshot {
    version: DocumentVersion,
    syntax: SyntaxTree,
    dom: Option<Document>,
    link: Option<LinkMap>,
    strict_linking: bool,
    file_info: FileInformation,
    diagnostics: Vec<DiagnosticMessage>,
}

impl DocumentSnapshot {
    pub fn build(version: DocumentVersion, text: Arc<str>, strict_linking: bool) -> DocumentSnapshot {
        let file_info = FileInformation::new(&text);
        let syntax = tei_syntax::parse_shared(text.clone());
        let mut diagnostics = Vec::new();

        let dom = match tei_xml::parse(&text) {
            Ok(dom) => Some(dom),
            Err(err) => {
                diagnostics.push(err.to_diagnostic());
                None
            }
        };

        let link = dom.as_ref().and_then(|dom| match link(&syntax, dom) {
            Ok(map) => {
                diagnostics.extend(map.warnings().iter().map(|w| w.to_diagnostic()));
                Some(map)
            }
            Err(err) => {
                tracing::warn!(%version, error = %err, "link pass aborted");
                diagnostics.push(err.to_diagnostic());
                None
            }
        });

        for diagnostic in &mut diagnostics {
            if let Some(location) = diagnostic.location.as_mut() {
                *location = SourceInfo::resolved(
                    location.file_id,
                    location.start_offset(),
                    location.end_offset(),
                    &file_info,
                );
            }
        }

        tracing::debug!(
            %version,
            bytes = text.len(),
            well_formed = dom.is_some(),
            linked = link.as_ref().map_or(0, LinkMap::len),
            "rebuilt document snapshot"
        );

        DocumentSnapshot {
            version,
            syntax,
            dom,
            link,
            strict_linking,
            file_info,
            diagnostics,
        }
    }

    pub fn version(&self) -> DocumentVersion {
        self.version
    }

    pub fn text(&self) -> &str {
        self.syntax.text()
    }

    pub fn shared_text(&self) -> Arc<str> {
        self.syntax.shared_text()
    }

    pub fn syntax(&self) -> &SyntaxTree {
        &self.syntax
    }

    pub fn dom(&self) -> Option<&Document> {
        self.dom.as_ref()
    }

    pub fn is_well_formed(&self) -> bool {
        self.dom.is_some()
    }

    /// The link map, unless linking failed or a partial map is refused by
    /// `strict_linking`.
    pub fn link_map(&self) -> Option<&LinkMap> {
        self.link
            .as_ref()
            .filter(|map| !(self.strict_linking && map.is_partial()))
    }

    pub fn is_linked(&self) -> bool {
        self.link_map().is_some()
    }

    pub fn is_partially_linked(&self) -> bool {
        self.link.as_ref().is_some_and(LinkMap::is_partial)
    }

    /// Parse, link and imbalance diagnostics with resolved rows and columns.
    pub fn diagnostics(&self) -> &[DiagnosticMessage] {
        &self.diagnostics
    }

    pub fn location(&self, offset: usize) -> Option<Location> {
        self.file_info.offset_to_location(offset)
    }

    #[cfg(test)]
    pub(crate) fn replace_link(&mut self, link: Option<LinkMap>) {
        self.link = link;
    }
}
