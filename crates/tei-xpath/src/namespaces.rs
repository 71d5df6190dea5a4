//! Prefix bindings available to XPath name tests.

use indexmap::IndexMap;
use tei_xml::{TEI_NAMESPACE, XML_NAMESPACE};

/// Prefixes whose bindings are fixed.
pub const RESERVED_PREFIXES: [&str; 2] = ["tei", "xml"];

pub fn is_reserved_prefix(prefix: &str) -> bool {
    RESERVED_PREFIXES.contains(&prefix)
}

/// Prefix → namespace URI table used to resolve `prefix:name` tests.
///
/// Always binds `tei` and `xml`. Unprefixed name tests match elements in
/// no namespace only, so TEI documents are queried as `//tei:div`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTable {
    bindings: IndexMap<String, String>,
}

impl Default for NamespaceTable {
    fn default() -> Self {
        let mut bindings = IndexMap::new();
        bindings.insert("tei".to_string(), TEI_NAMESPACE.to_string());
        bindings.insert("xml".to_string(), XML_NAMESPACE.to_string());
        NamespaceTable { bindings }
    }
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix`, replacing an earlier binding. `tei` and `xml` cannot
    /// be rebound; such calls are ignored.
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> &mut Self {
        let prefix = prefix.into();
        if is_reserved_prefix(&prefix) {
            tracing::warn!(%prefix, "refusing to rebind a reserved prefix");
        } else {
            self.bindings.insert(prefix, uri.into());
        }
        self
    }

    pub fn with(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.bind(prefix, uri);
        self
    }

    pub fn resolve(&self, prefix: &str) -> Option<&str> {
        self.bindings.get(prefix).map(String::as_str)
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_bindings() {
        let table = NamespaceTable::new();
        assert_eq!(table.resolve("tei"), Some(TEI_NAMESPACE));
        assert_eq!(table.resolve("xml"), Some(XML_NAMESPACE));
        assert_eq!(table.resolve("xs"), None);
    }

    #[test]
    fn test_extra_bindings_keep_order() {
        let table = NamespaceTable::new()
            .with("mei", "http://www.music-encoding.org/ns/mei")
            .with("xml", "urn:nope");
        let prefixes: Vec<&str> = table.iter().map(|(p, _)| p).collect();
        assert_eq!(prefixes, vec!["tei", "xml", "mei"]);
        assert_eq!(table.resolve("xml"), Some(XML_NAMESPACE));
    }

    #[test]
    fn test_tei_cannot_be_rebound() {
        let mut table = NamespaceTable::new().with("tei", "urn:other");
        table.bind("tei", "urn:again");
        assert_eq!(table.resolve("tei"), Some(TEI_NAMESPACE));
        assert_eq!(table.iter().count(), 2);
        assert!(is_reserved_prefix("tei"));
        assert!(!is_reserved_prefix("mei"));
    }
}
