//! Upsert rewrites: MySQL `ON DUPLICATE KEY UPDATE`.
//!
//! MySQL's clause never names the key the upsert resolves against, so the
//! conflict key must come from caller-supplied hints. No hint means the
//! statement fails closed as `AmbiguousUpsert` — guessing the key would
//! silently change update semantics.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TranslationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::scanner::{SpanKind, SpanMap};

use super::{find_calls, Rewrite};

static ON_DUP_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bON\s+DUPLICATE\s+KEY\s+UPDATE\b").unwrap());
static INSERT_INTO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bINSERT\s+(?:IGNORE\s+)?INTO\s+").unwrap());
static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap());
static VALUES_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bVALUES\s*\(").unwrap());

/// `ON DUPLICATE KEY UPDATE col = VALUES(col), ...` →
/// `ON CONFLICT (key) DO UPDATE SET col = EXCLUDED.col, ...`.
///
/// The clause is last in MySQL INSERT syntax, so it runs to the end of the
/// statement buffer.
pub fn on_duplicate_key(
    buf: &str,
    map: &SpanMap,
    ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let Some(m) = ON_DUP_KEY
        .find_iter(buf)
        .find(|m| map.range_is_code(m.start(), m.end()))
    else {
        return Ok(Vec::new());
    };

    let table = target_table(buf, map).ok_or_else(|| TranslateError::unsupported(
        m.start(),
        "ON DUPLICATE KEY UPDATE outside an INSERT statement",
    ))?;
    let Some(key) = ctx.conflict_key(&table) else {
        return Err(TranslateError::AmbiguousUpsert { table });
    };

    let assignments = rewrite_assignments(buf, map, m.end())?;
    Ok(vec![Rewrite {
        start: m.start(),
        end: buf.len(),
        replacement: format!(
            "ON CONFLICT ({}) DO UPDATE SET{}",
            key.join(", "),
            assignments
        ),
    }])
}

/// The table named by the statement's `INSERT INTO` head, unquoted.
fn target_table(buf: &str, map: &SpanMap) -> Option<String> {
    let m = INSERT_INTO
        .find_iter(buf)
        .find(|m| map.range_is_code(m.start(), m.end()))?;
    let at = m.end();
    match map.span_at(at) {
        Some(s) if s.kind == SpanKind::QuotedIdentifier => {
            let quoted = &buf[s.start..s.end];
            Some(quoted[1..quoted.len() - 1].to_string())
        }
        Some(s) if s.kind == SpanKind::Code => {
            IDENT.find(&buf[at..]).map(|id| id.as_str().to_string())
        }
        _ => None,
    }
}

/// The assignment list after the keyword, verbatim except that each
/// `VALUES(col)` reference becomes `EXCLUDED.col`.
fn rewrite_assignments(buf: &str, map: &SpanMap, from: usize) -> TranslateResult<String> {
    let mut swaps = Vec::new();
    for call in find_calls(buf, map, &VALUES_HEAD) {
        if call.head_start < from {
            continue;
        }
        if call.args.len() != 1 {
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        }
        swaps.push((call.head_start, call.end(), format!("EXCLUDED.{}", call.arg(buf, 0))));
    }
    let mut text = buf[from..].to_string();
    for (start, end, replacement) in swaps.into_iter().rev() {
        text.replace_range(start - from..end - from, &replacement);
    }
    Ok(text)
}
