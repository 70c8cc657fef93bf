//! Boolean rewrites.
//!
//! MySQL conflates TINYINT(1) and BOOLEAN, so `col = 1` is only rewritten
//! for columns the caller declared boolean — never by guessing from the
//! literal. Tautology folding is purely syntactic and runs after every
//! other category, once the surrounding expression shape has stabilized.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TranslationContext;
use crate::error::TranslateResult;
use crate::scanner::SpanMap;

use super::Rewrite;

// Column reference (optionally qualified) compared to a 0/1 literal.
static COLUMN_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)\s*=\s*([01])\b").unwrap()
});
static TAUTOLOGY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:1|TRUE)\s*=\s*(?:1|TRUE)\b").unwrap());

/// `col = 1` / `col = 0` → `col = TRUE` / `col = FALSE`, only for columns in
/// the declared boolean set.
pub fn column_literal(
    buf: &str,
    map: &SpanMap,
    ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    if ctx.boolean_columns.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for caps in COLUMN_LITERAL.captures_iter(buf) {
        let m = caps.get(0).unwrap();
        if !map.range_is_code(m.start(), m.end()) {
            continue;
        }
        if !ctx.is_boolean_column(&caps[1]) {
            continue;
        }
        // `col = 1.5` — the 1 is the start of a decimal, not a flag literal.
        if matches!(buf.as_bytes().get(m.end()), Some(b'.')) {
            continue;
        }
        let value = if &caps[2] == "1" { "TRUE" } else { "FALSE" };
        out.push(Rewrite {
            start: m.start(),
            end: m.end(),
            replacement: format!("{} = {}", &caps[1], value),
        });
    }
    Ok(out)
}

/// `1 = 1`, `1 = TRUE`, `TRUE = 1`, `TRUE = TRUE` → `TRUE`.
pub fn tautology(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let bytes = buf.as_bytes();
    let mut out = Vec::new();
    for m in TAUTOLOGY.find_iter(buf) {
        if !map.range_is_code(m.start(), m.end()) {
            continue;
        }
        // A leading `$` or `.` means the 1 belongs to a placeholder or a
        // qualified/decimal token, not a standalone literal.
        if m.start() > 0 && matches!(bytes[m.start() - 1], b'$' | b'.') {
            continue;
        }
        if matches!(bytes.get(m.end()), Some(b'.')) {
            continue;
        }
        out.push(Rewrite {
            start: m.start(),
            end: m.end(),
            replacement: "TRUE".to_string(),
        });
    }
    Ok(out)
}
