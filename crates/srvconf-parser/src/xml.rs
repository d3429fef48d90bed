//! Lenient XML scanning for `${...}` references.
//!
//! Two Logos lexers share the input: [`Markup`] for character data between
//! tags, and [`Tag`] for the inside of a start or end tag. The scanner
//! morphs between them on `<` and `>`. Comments, processing instructions,
//! CDATA sections and declarations are skipped by their callbacks. The
//! scanner never fails: unknown input is skipped and an unterminated
//! attribute value ends at the next `<` or at end of input.

use logos::{Lexer, Logos, Skip};

use crate::span::Span;
use crate::token::{Token, VariableForm};

/// Skip everything up to and including `terminator` (or to end of input).
fn skip_past<'s, T>(lex: &mut Lexer<'s, T>, terminator: &str) -> Skip
where
    T: Logos<'s, Source = str>,
{
    let rest = lex.remainder();
    let len = rest
        .find(terminator)
        .map_or(rest.len(), |i| i + terminator.len());
    lex.bump(len);
    Skip
}

/// Content between tags.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum Markup {
    #[token("<!--", |lex| skip_past(lex, "-->"))]
    Comment,

    #[token("<![CDATA[", |lex| skip_past(lex, "]]>"))]
    CData,

    #[token("<?", |lex| skip_past(lex, "?>"))]
    Instruction,

    #[token("<!", |lex| skip_past(lex, ">"))]
    Declaration,

    #[token("<")]
    TagOpen,

    #[regex("[^<]+")]
    Text,
}

/// The inside of a tag.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Tag {
    #[regex(r#"[^\s="'<>/]+"#)]
    Name,

    #[token("=")]
    Equals,

    #[regex(r#""[^"<]*"?"#)]
    DoubleQuoted,

    #[regex(r"'[^'<]*'?")]
    SingleQuoted,

    #[token("/")]
    Slash,

    /// A `<` inside a tag: the previous tag was never closed.
    #[token("<")]
    Restart,

    #[token(">")]
    End,
}

/// An attribute of a start tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name.
    pub name: &'a str,
    /// Attribute value, without quotes.
    pub value: &'a str,
    /// Span of the value, without quotes.
    pub value_span: Span,
    /// Whether the closing quote is present.
    pub closed: bool,
}

/// Something the scanner found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlEvent<'a> {
    /// A tag name. `closing` is set for `</name>`.
    TagStart {
        /// Element name.
        name: &'a str,
        /// Span of the name.
        span: Span,
        /// Whether this is an end tag.
        closing: bool,
    },
    /// An attribute of the most recent tag.
    Attribute(Attribute<'a>),
    /// Character data between tags.
    Text(Span),
}

enum State<'a> {
    Markup(Lexer<'a, Markup>),
    Tag(Lexer<'a, Tag>),
    Done,
}

/// Lazy scanner over a document.
pub struct XmlEvents<'a> {
    state: State<'a>,
    in_name: bool,
    closing: bool,
    pending_attribute: Option<&'a str>,
    awaiting_value: bool,
}

impl<'a> XmlEvents<'a> {
    /// Start scanning `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            state: State::Markup(Markup::lexer(source)),
            in_name: false,
            closing: false,
            pending_attribute: None,
            awaiting_value: false,
        }
    }

    fn start_tag(&mut self) {
        self.in_name = true;
        self.closing = false;
        self.pending_attribute = None;
        self.awaiting_value = false;
    }

    fn quoted(&mut self, lex: &Lexer<'a, Tag>, quote: char) -> Option<XmlEvent<'a>> {
        let slice = lex.slice();
        let range = lex.span();
        let closed = slice.len() >= 2 && slice.ends_with(quote);
        let end = if closed { range.end - 1 } else { range.end };
        let value_span = Span::new(range.start + 1, end);

        let name = self.pending_attribute.take().filter(|_| self.awaiting_value)?;
        self.awaiting_value = false;
        Some(XmlEvent::Attribute(Attribute {
            name,
            value: &slice[1..1 + value_span.len()],
            value_span,
            closed,
        }))
    }

    fn step_tag(&mut self, mut lex: Lexer<'a, Tag>) -> Option<XmlEvent<'a>> {
        let event = match lex.next()? {
            Ok(Tag::End) => {
                self.state = State::Markup(lex.morph());
                return None;
            }
            Ok(Tag::Restart) => {
                self.start_tag();
                None
            }
            Ok(Tag::Slash) => {
                if self.in_name {
                    self.closing = true;
                }
                None
            }
            Ok(Tag::Name) => {
                let name = lex.slice();
                if self.in_name {
                    self.in_name = false;
                    Some(XmlEvent::TagStart {
                        name,
                        span: lex.span().into(),
                        closing: self.closing,
                    })
                } else {
                    self.pending_attribute = Some(name);
                    self.awaiting_value = false;
                    None
                }
            }
            Ok(Tag::Equals) => {
                self.awaiting_value = self.pending_attribute.is_some();
                None
            }
            Ok(Tag::DoubleQuoted) => self.quoted(&lex, '"'),
            Ok(Tag::SingleQuoted) => self.quoted(&lex, '\''),
            Err(()) => None,
        };
        self.state = State::Tag(lex);
        event
    }
}

impl<'a> Iterator for XmlEvents<'a> {
    type Item = XmlEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Done => return None,
                State::Markup(mut lex) => match lex.next() {
                    None => return None,
                    Some(Ok(Markup::Text)) => {
                        let span = lex.span().into();
                        self.state = State::Markup(lex);
                        return Some(XmlEvent::Text(span));
                    }
                    Some(Ok(Markup::TagOpen)) => {
                        self.start_tag();
                        self.state = State::Tag(lex.morph());
                    }
                    Some(Ok(_) | Err(())) => self.state = State::Markup(lex),
                },
                State::Tag(lex) => {
                    if let Some(event) = self.step_tag(lex) {
                        return Some(event);
                    }
                }
            }
        }
    }
}

/// A start tag and its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    /// Element name.
    pub name: &'a str,
    /// Span of the name.
    pub span: Span,
    /// Attributes in document order.
    pub attributes: Vec<Attribute<'a>>,
}

impl<'a> Element<'a> {
    /// Value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value)
    }
}

/// Every start tag in the document, with its attributes.
pub fn elements(source: &str) -> Vec<Element<'_>> {
    let mut elements: Vec<Element<'_>> = Vec::new();
    let mut in_start_tag = false;
    for event in XmlEvents::new(source) {
        match event {
            XmlEvent::TagStart {
                name,
                span,
                closing,
            } => {
                in_start_tag = !closing;
                if !closing {
                    elements.push(Element {
                        name,
                        span,
                        attributes: Vec::new(),
                    });
                }
            }
            XmlEvent::Attribute(attr) if in_start_tag => {
                if let Some(element) = elements.last_mut() {
                    element.attributes.push(attr);
                }
            }
            XmlEvent::Attribute(_) | XmlEvent::Text(_) => {}
        }
    }
    elements
}

/// Where a scanned segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// An attribute value.
    AttributeValue,
    /// Character data between tags.
    Text,
}

/// A region of the document that may hold `${...}` references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Segment kind.
    pub kind: SegmentKind,
    /// Span of the text (without quotes for attribute values).
    pub span: Span,
}

/// Every attribute value and text region, in document order.
pub fn segments(source: &str) -> impl Iterator<Item = Segment> + '_ {
    XmlEvents::new(source).filter_map(|event| match event {
        XmlEvent::Attribute(attr) => Some(Segment {
            kind: SegmentKind::AttributeValue,
            span: attr.value_span,
        }),
        XmlEvent::Text(span) => Some(Segment {
            kind: SegmentKind::Text,
            span,
        }),
        XmlEvent::TagStart { .. } => None,
    })
}

/// A `${` found in a segment and what follows it.
enum Reference {
    /// `${name}`: span of the whole reference and of the name.
    Closed(Span, Span),
    /// `${` with no `}` before the next `${` or the segment end.
    Open { dollar: usize, limit: usize },
}

/// Walk the `${` openings of a segment.
fn references(source: &str, segment: Span) -> impl Iterator<Item = Reference> + '_ {
    let mut pos = segment.start;
    std::iter::from_fn(move || {
        let dollar = pos + source[pos..segment.end].find("${")?;
        let name_start = dollar + 2;
        let tail = &source[name_start..segment.end];
        let next_open = tail.find("${");
        match tail.find('}') {
            Some(close) if next_open.map_or(true, |open| close < open) => {
                let name_end = name_start + close;
                pos = name_end + 1;
                Some(Reference::Closed(
                    Span::new(dollar, pos),
                    Span::new(name_start, name_end),
                ))
            }
            _ => {
                let limit = next_open.map_or(segment.end, |open| name_start + open);
                pos = limit;
                Some(Reference::Open { dollar, limit })
            }
        }
    })
}

/// Complete `${name}` references inside a segment.
pub fn variable_refs(source: &str, segment: Span) -> impl Iterator<Item = Token<'_>> + '_ {
    references(source, segment).filter_map(move |reference| match reference {
        Reference::Closed(span, name) => Some(Token::variable(
            VariableForm::Delimited,
            name.text(source),
            span,
            name,
        )),
        Reference::Open { .. } => None,
    })
}

/// The variable token a cursor at `offset` addresses inside `segment`.
///
/// With `allow_bare`, a segment holding no `${` at all is offered as a
/// bare token covering the whole segment.
pub fn variable_at(
    source: &str,
    segment: Span,
    offset: usize,
    allow_bare: bool,
) -> Option<Token<'_>> {
    if !segment.touches(offset) {
        return None;
    }
    let text = segment.text(source);
    if !text.contains("${") {
        return allow_bare
            .then_some(Token::variable(VariableForm::Bare, text, segment, segment));
    }

    for reference in references(source, segment) {
        match reference {
            Reference::Closed(span, name) if span.touches(offset) => {
                return Some(Token::variable(
                    VariableForm::Delimited,
                    name.text(source),
                    span,
                    name,
                ));
            }
            Reference::Open { dollar, limit } if dollar + 2 <= offset && offset <= limit => {
                let name = Span::new(dollar + 2, offset);
                return Some(Token::variable(
                    VariableForm::Unterminated,
                    name.text(source),
                    Span::new(dollar, offset),
                    name,
                ));
            }
            Reference::Closed(span, _) if span.start > offset => return None,
            Reference::Open { dollar, .. } if dollar >= offset => return None,
            _ => {}
        }
    }
    None
}

/// Every complete `${name}` reference in the document, in document order.
pub fn tokens(source: &str) -> impl Iterator<Item = Token<'_>> + '_ {
    segments(source).flat_map(move |segment| variable_refs(source, segment.span))
}

/// The variable token under the cursor.
pub fn token_at(source: &str, offset: usize) -> Option<Token<'_>> {
    let segment = segments(source)
        .take_while(|segment| segment.span.start <= offset)
        .find(|segment| segment.span.touches(offset))?;
    variable_at(
        source,
        segment.span,
        offset,
        segment.kind == SegmentKind::AttributeValue,
    )
}
