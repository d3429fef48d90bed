//! Positioned identifier occurrences.

use crate::span::Span;

/// How a variable reference is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableForm {
    /// `${name}` with both delimiters.
    Delimited,
    /// `${name` with no closing brace yet; ends at the cursor.
    Unterminated,
    /// An attribute value with no `${` at all, offered for completion only.
    Bare,
}

/// What kind of identifier a token holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A property or environment key.
    Key,
    /// A property value, or one segment of a comma-separated value.
    Value,
    /// A variable reference.
    Variable(VariableForm),
}

/// One identifier occurrence in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    /// Identifier kind.
    pub kind: TokenKind,
    /// The identifier text (trimmed; the bare name for variables).
    pub raw_text: &'a str,
    /// The replaceable region (includes `${`/`}` for variables).
    pub span: Span,
    /// The region holding `raw_text`.
    pub text_span: Span,
    /// The key that constrains a `Value` token.
    pub owner_key: Option<&'a str>,
}

impl<'a> Token<'a> {
    /// A key token.
    pub const fn key(raw_text: &'a str, span: Span) -> Self {
        Self {
            kind: TokenKind::Key,
            raw_text,
            span,
            text_span: span,
            owner_key: None,
        }
    }

    /// A value token owned by `owner_key`.
    pub const fn value(raw_text: &'a str, span: Span, owner_key: &'a str) -> Self {
        Self {
            kind: TokenKind::Value,
            raw_text,
            span,
            text_span: span,
            owner_key: Some(owner_key),
        }
    }

    /// A variable token.
    pub const fn variable(form: VariableForm, name: &'a str, span: Span, name_span: Span) -> Self {
        Self {
            kind: TokenKind::Variable(form),
            raw_text: name,
            span,
            text_span: name_span,
            owner_key: None,
        }
    }

    /// Whether this is a variable reference of any form.
    pub const fn is_variable(&self) -> bool {
        matches!(self.kind, TokenKind::Variable(_))
    }

    /// Whether this is a complete `${name}` reference.
    pub const fn is_delimited(&self) -> bool {
        matches!(self.kind, TokenKind::Variable(VariableForm::Delimited))
    }
}
