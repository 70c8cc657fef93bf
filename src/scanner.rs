//! Lexical scanner for SQL query text.
//!
//! Walks a query string into contiguous, non-overlapping spans so that every
//! downstream rewrite pass can tell executable code apart from string
//! literals, quoted identifiers, and comments. Rules only ever fire on
//! `Code` spans; everything else is opaque and passes through byte-for-byte.

use crate::error::{TranslateError, TranslateResult};

/// What a span of the input contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    /// Executable SQL text, the only kind rewrite rules may touch.
    Code,
    /// `'...'` or `"..."` run, doubled-quote escaping honored.
    StringLiteral,
    /// `` `...` `` or `[...]` delimited identifier.
    QuotedIdentifier,
    /// `-- ...` to end of line, or `/* ... */`.
    Comment,
}

/// A tagged region of the input. Spans are contiguous and cover the whole
/// input; offsets are byte offsets into the scanned string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

/// Scan a single SQL statement into spans.
///
/// Fails closed on unterminated literals, identifiers, or block comments:
/// rewriting on top of a guess about where a literal ends would corrupt the
/// query.
pub fn scan(input: &str) -> TranslateResult<Vec<Span>> {
    let bytes = input.as_bytes();
    let mut spans = Vec::new();
    let mut code_start = 0usize;
    let mut i = 0usize;

    // Close the pending Code span, if any, ending at `upto`.
    let flush_code = |spans: &mut Vec<Span>, code_start: usize, upto: usize| {
        if upto > code_start {
            spans.push(Span {
                start: code_start,
                end: upto,
                kind: SpanKind::Code,
            });
        }
    };

    while i < bytes.len() {
        match bytes[i] {
            q @ (b'\'' | b'"') => {
                flush_code(&mut spans, code_start, i);
                let start = i;
                i += 1;
                loop {
                    match bytes.get(i) {
                        Some(&c) if c == q => {
                            // Doubled quote is an escaped quote, not a close.
                            if bytes.get(i + 1) == Some(&q) {
                                i += 2;
                            } else {
                                i += 1;
                                break;
                            }
                        }
                        Some(_) => i += 1,
                        None => {
                            return Err(TranslateError::malformed(
                                start,
                                "unterminated string literal",
                            ));
                        }
                    }
                }
                spans.push(Span {
                    start,
                    end: i,
                    kind: SpanKind::StringLiteral,
                });
                code_start = i;
            }
            b'`' => {
                flush_code(&mut spans, code_start, i);
                let start = i;
                i += 1;
                loop {
                    match bytes.get(i) {
                        Some(b'`') => {
                            if bytes.get(i + 1) == Some(&b'`') {
                                i += 2;
                            } else {
                                i += 1;
                                break;
                            }
                        }
                        Some(_) => i += 1,
                        None => {
                            return Err(TranslateError::malformed(
                                start,
                                "unterminated quoted identifier",
                            ));
                        }
                    }
                }
                spans.push(Span {
                    start,
                    end: i,
                    kind: SpanKind::QuotedIdentifier,
                });
                code_start = i;
            }
            b'[' => {
                flush_code(&mut spans, code_start, i);
                let start = i;
                i += 1;
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(TranslateError::malformed(
                        start,
                        "unterminated bracketed identifier",
                    ));
                }
                i += 1;
                spans.push(Span {
                    start,
                    end: i,
                    kind: SpanKind::QuotedIdentifier,
                });
                code_start = i;
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                flush_code(&mut spans, code_start, i);
                let start = i;
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                // The newline itself stays Code so statements keep their shape.
                spans.push(Span {
                    start,
                    end: i,
                    kind: SpanKind::Comment,
                });
                code_start = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                flush_code(&mut spans, code_start, i);
                let start = i;
                i += 2;
                loop {
                    if i + 1 >= bytes.len() {
                        return Err(TranslateError::malformed(start, "unterminated block comment"));
                    }
                    if bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
                spans.push(Span {
                    start,
                    end: i,
                    kind: SpanKind::Comment,
                });
                code_start = i;
            }
            _ => i += 1,
        }
    }
    flush_code(&mut spans, code_start, bytes.len());
    Ok(spans)
}

/// Offset → span-kind lookup over one scan of a buffer.
#[derive(Debug)]
pub struct SpanMap {
    spans: Vec<Span>,
}

impl SpanMap {
    /// Scan `input` and build the lookup.
    pub fn build(input: &str) -> TranslateResult<Self> {
        Ok(Self { spans: scan(input)? })
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// The span covering the byte at `offset`, if any.
    pub fn span_at(&self, offset: usize) -> Option<&Span> {
        let idx = self
            .spans
            .partition_point(|s| s.end <= offset);
        self.spans.get(idx).filter(|s| s.start <= offset)
    }

    /// True if the byte at `offset` is executable code.
    pub fn is_code(&self, offset: usize) -> bool {
        matches!(self.span_at(offset), Some(s) if s.kind == SpanKind::Code)
    }

    /// True if every byte of `start..end` lies inside a single Code span.
    /// This is the gate every matcher goes through: a match that touches a
    /// literal, identifier, or comment never fires.
    pub fn range_is_code(&self, start: usize, end: usize) -> bool {
        match self.span_at(start) {
            Some(s) => s.kind == SpanKind::Code && s.end >= end,
            None => false,
        }
    }
}

/// A statement's byte range within a larger buffer, semicolon excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementSpan {
    pub start: usize,
    pub end: usize,
}

/// Split a multi-statement buffer on `;` boundaries, using the scanner so a
/// semicolon inside a literal or comment never splits. A naive `;`-split is
/// exactly the pitfall this exists to close.
///
/// Every statement range is returned, including empty/whitespace-only ones,
/// so callers can reassemble the buffer losslessly.
pub fn split_statements(input: &str) -> TranslateResult<Vec<StatementSpan>> {
    let map = SpanMap::build(input)?;
    let mut statements = Vec::new();
    let mut start = 0usize;
    for span in map.spans() {
        if span.kind != SpanKind::Code {
            continue;
        }
        for (off, b) in input[span.start..span.end].bytes().enumerate() {
            if b == b';' {
                let end = span.start + off;
                statements.push(StatementSpan { start, end });
                start = end + 1;
            }
        }
    }
    statements.push(StatementSpan {
        start,
        end: input.len(),
    });
    Ok(statements)
}
