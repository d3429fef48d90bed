//! A document ready for token extraction.

use srvconf_core::{Dictionary, DocumentKind, IdentifierEntry};

use crate::properties::{self, PropertyLine};
use crate::token::Token;
use crate::xml;

/// Document text together with the knowledge needed to tokenize it.
///
/// Property files need the key dictionary to know which values are
/// comma-separated lists; XML documents ignore it.
#[derive(Debug, Clone, Copy)]
pub struct ConfigDocument<'a> {
    source: &'a str,
    kind: DocumentKind,
    dictionary: Option<&'a Dictionary>,
}

impl<'a> ConfigDocument<'a> {
    /// Wrap document text.
    pub const fn new(source: &'a str, kind: DocumentKind, dictionary: Option<&'a Dictionary>) -> Self {
        Self {
            source,
            kind,
            dictionary,
        }
    }

    /// The document text.
    pub const fn source(&self) -> &'a str {
        self.source
    }

    /// The document kind.
    pub const fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// The key dictionary, if any.
    pub const fn dictionary(&self) -> Option<&'a Dictionary> {
        self.dictionary
    }

    /// Look up the entry for a key.
    pub fn entry(&self, key: &str) -> Option<&'a IdentifierEntry> {
        self.dictionary?.lookup(key)
    }

    fn is_multi_value(&self, key: &str) -> bool {
        self.entry(key).is_some_and(|entry| entry.allows_multiple)
    }

    /// Every token in the document, in document order.
    ///
    /// The sequence is lazy and can be restarted by calling this again.
    /// XML documents yield only complete `${name}` references.
    pub fn tokens(&self) -> Box<dyn Iterator<Item = Token<'a>> + 'a> {
        let doc = *self;
        if self.kind.is_properties() {
            Box::new(
                properties::property_lines(self.source)
                    .flat_map(move |line| line.tokens(doc.is_multi_value(line.key))),
            )
        } else {
            Box::new(xml::tokens(self.source))
        }
    }

    /// The token a cursor at byte `offset` addresses, if any.
    pub fn token_at(&self, offset: usize) -> Option<Token<'a>> {
        if offset > self.source.len() || !self.source.is_char_boundary(offset) {
            return None;
        }
        if self.kind.is_properties() {
            let line = self.property_line_at(offset)?;
            line.token_at(offset, self.is_multi_value(line.key))
        } else {
            xml::token_at(self.source, offset)
        }
    }

    /// The parsed property line containing `offset`. Comment lines and XML
    /// documents yield `None`.
    pub fn property_line_at(&self, offset: usize) -> Option<PropertyLine<'a>> {
        if !self.kind.is_properties() {
            return None;
        }
        let span = properties::line_at(self.source, offset)?;
        PropertyLine::parse(self.source, span)
    }
}
