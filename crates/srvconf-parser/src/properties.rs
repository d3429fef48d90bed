//! `key=value` line files (`bootstrap.properties`, `server.env`).
//!
//! Each property occupies exactly one line. Lines whose first non-blank
//! character is `#` or `!` are comments. A line splits at the first `=`
//! that is not escaped with a backslash.

use crate::span::Span;
use crate::token::Token;

/// Spans of every line in `source`, excluding `\n` and a trailing `\r`.
pub fn lines(source: &str) -> impl Iterator<Item = Span> + '_ {
    let mut start = 0;
    source.split_inclusive('\n').map(move |chunk| {
        let line_start = start;
        start += chunk.len();
        let body = chunk.strip_suffix('\n').unwrap_or(chunk);
        let body = body.strip_suffix('\r').unwrap_or(body);
        Span::new(line_start, line_start + body.len())
    })
}

/// The line containing `offset`, if the offset is inside the document.
pub fn line_at(source: &str, offset: usize) -> Option<Span> {
    if offset > source.len() {
        return None;
    }
    if source.is_empty() || (source.ends_with('\n') && offset == source.len()) {
        return Some(Span::empty(offset));
    }
    lines(source).find(|line| line.touches(offset))
}

/// Every non-comment, non-blank line of a document.
pub fn property_lines(source: &str) -> impl Iterator<Item = PropertyLine<'_>> {
    lines(source)
        .filter_map(move |span| PropertyLine::parse(source, span))
        .filter(|line| !line.is_blank())
}

/// One comma-delimited piece of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueSegment {
    /// Region between the surrounding separators, whitespace included.
    pub raw: Span,
    /// The trimmed segment.
    pub span: Span,
}

/// A parsed, non-comment property line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyLine<'a> {
    source: &'a str,
    /// The whole line.
    pub span: Span,
    /// The trimmed key.
    pub key: &'a str,
    /// Span of the trimmed key.
    pub key_span: Span,
    /// Byte offset of the `=` separator.
    pub separator: Option<usize>,
}

impl<'a> PropertyLine<'a> {
    /// Parse one line. Comment lines yield `None`.
    pub fn parse(source: &'a str, span: Span) -> Option<Self> {
        let text = span.text(source);
        let first = text.trim_start().chars().next();
        if matches!(first, Some('#' | '!')) {
            return None;
        }

        let separator = find_separator(text).map(|i| span.start + i);
        let key_end = separator.unwrap_or(span.end);
        let key_span = Span::new(span.start, key_end).trimmed(source);

        Some(Self {
            source,
            span,
            key: key_span.text(source),
            key_span,
            separator,
        })
    }

    /// Whether the line holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.key.is_empty() && self.separator.is_none()
    }

    /// Everything after the separator, whitespace included.
    pub fn value_region(&self) -> Option<Span> {
        self.separator.map(|sep| Span::new(sep + 1, self.span.end))
    }

    /// Span of the trimmed value.
    pub fn value_span(&self) -> Option<Span> {
        self.value_region().map(|region| region.trimmed(self.source))
    }

    /// The trimmed value.
    pub fn value(&self) -> Option<&'a str> {
        self.value_span().map(|span| span.text(self.source))
    }

    /// The value split on commas, in order. Empty when there is no separator.
    pub fn segments(&self) -> impl Iterator<Item = ValueSegment> + 'a {
        let source = self.source;
        let region = self.value_region();
        let mut next_start = region.map(|r| r.start);
        let end = region.map_or(0, |r| r.end);

        std::iter::from_fn(move || {
            let start = next_start?;
            let rest = &source[start..end];
            let raw = match rest.find(',') {
                Some(comma) => {
                    next_start = Some(start + comma + 1);
                    Span::new(start, start + comma)
                }
                None => {
                    next_start = None;
                    Span::new(start, end)
                }
            };
            Some(ValueSegment {
                raw,
                span: raw.trimmed(source),
            })
        })
    }

    /// All tokens on the line, in column order.
    ///
    /// With `multi_value` each non-empty comma segment is its own token;
    /// otherwise the whole trimmed value is one token. Empty keys and
    /// values produce nothing.
    pub fn tokens(&self, multi_value: bool) -> impl Iterator<Item = Token<'a>> + 'a {
        let source = self.source;
        let key = self.key;
        let key_token = (!key.is_empty()).then_some(Token::key(key, self.key_span));

        let values: Box<dyn Iterator<Item = Span> + 'a> = if multi_value {
            Box::new(self.segments().map(|segment| segment.span))
        } else {
            Box::new(self.value_span().into_iter())
        };

        key_token.into_iter().chain(
            values
                .filter(|span| !span.is_empty())
                .map(move |span| Token::value(span.text(source), span, key)),
        )
    }

    /// The token a cursor at `offset` addresses.
    ///
    /// At or left of the separator the cursor addresses the key; right of
    /// it, the value (or, with `multi_value`, the segment under the
    /// cursor). A blank line yields an empty key token at the cursor.
    pub fn token_at(&self, offset: usize, multi_value: bool) -> Option<Token<'a>> {
        if !self.span.touches(offset) {
            return None;
        }
        if self.is_blank() {
            return Some(Token::key("", Span::empty(offset)));
        }

        match self.separator {
            Some(sep) if offset > sep => {
                let span = if multi_value {
                    self.segments()
                        .find(|segment| segment.raw.touches(offset))
                        .map(|segment| segment.span)?
                } else {
                    self.value_span()?
                };
                Some(Token::value(span.text(self.source), span, self.key))
            }
            _ => Some(Token::key(self.key, self.key_span)),
        }
    }
}

/// Byte index of the first unescaped `=` in a line.
fn find_separator(line: &str) -> Option<usize> {
    let mut escaped = false;
    for (i, b) in line.bytes().enumerate() {
        match b {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'=' => return Some(i),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    fn parse_line(source: &str) -> PropertyLine<'_> {
        let span = lines(source).next().unwrap();
        PropertyLine::parse(source, span).unwrap()
    }

    #[test]
    fn test_lines_strip_terminators() {
        let source = "a=1\r\nb=2\n\nc";
        let texts: Vec<_> = lines(source).map(|s| s.text(source)).collect();
        assert_eq!(texts, vec!["a=1", "b=2", "", "c"]);
    }

    #[test]
    fn test_line_at() {
        let source = "a=1\nbb=2\n";
        assert_eq!(line_at(source, 0).unwrap().text(source), "a=1");
        assert_eq!(line_at(source, 3).unwrap().text(source), "a=1");
        assert_eq!(line_at(source, 4).unwrap().text(source), "bb=2");
        assert_eq!(line_at(source, source.len()), Some(Span::empty(source.len())));
        assert_eq!(line_at(source, 99), None);
    }

    #[test]
    fn test_parse_key_value() {
        let source = "  com.ibm.ws.logging.console.format = DEV ";
        let line = parse_line(source);
        assert_eq!(line.key, "com.ibm.ws.logging.console.format");
        assert_eq!(line.key_span.start, 2);
        assert_eq!(line.value(), Some("DEV"));
        assert_eq!(line.value_span().unwrap().text(source), "DEV");
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "# a=b\n  ! c=d\ne=f";
        let keys: Vec<_> = property_lines(source).map(|l| l.key).collect();
        assert_eq!(keys, vec!["e"]);
    }

    #[test]
    fn test_escaped_separator() {
        let line = parse_line(r"a\=b=c");
        assert_eq!(line.key, r"a\=b");
        assert_eq!(line.value(), Some("c"));
    }

    #[test]
    fn test_segments() {
        let source = "k=trace, message ,";
        let line = parse_line(source);
        let segs: Vec<_> = line.segments().map(|s| s.span.text(source)).collect();
        assert_eq!(segs, vec!["trace", "message", ""]);
    }

    #[test]
    fn test_tokens_multi_value() {
        let source = "k=trace,,ffdc";
        let line = parse_line(source);
        let tokens: Vec<_> = line.tokens(true).collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Key);
        assert_eq!(tokens[1].raw_text, "trace");
        assert_eq!(tokens[2].raw_text, "ffdc");
        assert_eq!(tokens[2].span, Span::new(9, 13));
        assert_eq!(tokens[2].owner_key, Some("k"));

        let single: Vec<_> = line.tokens(false).collect();
        assert_eq!(single[1].raw_text, "trace,,ffdc");
    }

    #[test]
    fn test_empty_value_has_no_token() {
        let line = parse_line("k=   ");
        assert_eq!(line.tokens(false).count(), 1);
    }

    #[test]
    fn test_token_at_key_and_value() {
        let source = "key=value";
        let line = parse_line(source);
        assert_eq!(line.token_at(0, false).unwrap().kind, TokenKind::Key);
        assert_eq!(line.token_at(3, false).unwrap().kind, TokenKind::Key);
        let value = line.token_at(4, false).unwrap();
        assert_eq!(value.kind, TokenKind::Value);
        assert_eq!(value.raw_text, "value");
        assert_eq!(line.token_at(99, false), None);
    }

    #[test]
    fn test_token_at_segment() {
        let source = "k=trace,mess";
        let line = parse_line(source);
        let token = line.token_at(source.len(), true).unwrap();
        assert_eq!(token.raw_text, "mess");
        assert_eq!(token.span, Span::new(8, 12));

        let token = line.token_at(7, true).unwrap();
        assert_eq!(token.raw_text, "trace");
    }

    #[test]
    fn test_token_at_after_trailing_comma() {
        let source = "k=trace,";
        let line = parse_line(source);
        let token = line.token_at(source.len(), true).unwrap();
        assert_eq!(token.raw_text, "");
        assert_eq!(token.span, Span::empty(source.len()));
    }

    #[test]
    fn test_token_at_blank_line() {
        let source = "   ";
        let line = parse_line(source);
        let token = line.token_at(2, false).unwrap();
        assert_eq!(token.kind, TokenKind::Key);
        assert_eq!(token.span, Span::empty(2));
    }
}
