//! Shared utility functions for LSP handlers.
//!
//! Engines work in byte offsets; the protocol speaks in line and UTF-16
//! column positions. [`LineIndex`] converts between the two.

use std::path::PathBuf;

use lsp_types::{Position, Range, Uri};
use srvconf_core::DocumentKind;
use srvconf_parser::Span;

/// A line index for offset/position conversion.
///
/// Building the index is O(n) in the source length; line lookup is a
/// binary search, column conversion is linear in the line length.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    /// Byte offset of the start of each line (line 0 starts at 0).
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Build a line index from source text.
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Number of lines in the source.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte range of a line, excluding its `\n`.
    fn line_bounds(&self, line: usize) -> Option<(usize, usize)> {
        let start = *self.line_starts.get(line)?;
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.source.len(), |next| next - 1);
        Some((start, end))
    }

    /// Convert a byte offset to a protocol position.
    ///
    /// Offsets past the end clamp to the end; offsets inside a multi-byte
    /// character snap back to its start.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts[line];
        let col = self.source[line_start..offset].encode_utf16().count();

        Position::new(line as u32, col as u32)
    }

    /// Convert a protocol position to a byte offset.
    ///
    /// Returns `None` for a line past the end. A column past the end of its
    /// line clamps to the line end.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let (start, end) = self.line_bounds(position.line as usize)?;
        let target = position.character as usize;

        let mut units = 0;
        for (i, ch) in self.source[start..end].char_indices() {
            if units >= target {
                return Some(start + i);
            }
            units += ch.len_utf16();
        }
        Some(end)
    }

    /// The protocol range of a span.
    pub fn range(&self, span: Span) -> Range {
        Range::new(
            self.offset_to_position(span.start),
            self.offset_to_position(span.end),
        )
    }

    /// The span of a protocol range.
    pub fn span(&self, range: Range) -> Option<Span> {
        let start = self.position_to_offset(range.start)?;
        let end = self.position_to_offset(range.end)?;
        (start <= end).then_some(Span::new(start, end))
    }
}

/// Convert a URI to a file path.
#[cfg(not(windows))]
pub fn uri_to_path(uri: &Uri) -> Option<PathBuf> {
    uri.as_str().strip_prefix("file://").map(PathBuf::from)
}

/// Convert a URI to a file path (Windows version).
#[cfg(windows)]
pub fn uri_to_path(uri: &Uri) -> Option<PathBuf> {
    uri.as_str()
        .strip_prefix("file://")
        // file:///C:/...
        .map(|p| p.strip_prefix('/').unwrap_or(p))
        .map(PathBuf::from)
}

/// Convert a file path to a URI.
pub fn path_to_uri(path: &std::path::Path) -> Option<Uri> {
    #[cfg(not(windows))]
    let text = format!("file://{}", path.display());
    #[cfg(windows)]
    let text = format!("file:///{}", path.display().to_string().replace('\\', "/"));
    text.parse().ok()
}

/// The document kind of a URI, from its file name.
pub fn document_kind(uri: &Uri) -> Option<DocumentKind> {
    DocumentKind::from_path(&uri_to_path(uri)?)
}
