//! String-function rewrites.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TranslationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::scanner::SpanMap;

use super::{find_calls, retain_innermost, Rewrite};

static CONCAT_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCONCAT\s*\(").unwrap());
static LOCATE_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bLOCATE\s*\(").unwrap());
static SUBSTRING_INDEX_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSUBSTRING_INDEX\s*\(").unwrap());

/// `CONCAT(a, b, ..., n)` → `a || b || ... || n`, arbitrary arity.
///
/// Only innermost calls are flattened per application; the pipeline's
/// fixpoint loop unwinds nested CONCATs outward, so the flattened result of
/// an inner call is spliced into its parent before the parent flattens.
pub fn concat(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for call in retain_innermost(find_calls(buf, map, &CONCAT_HEAD)) {
        if call.args.is_empty() {
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        }
        let joined = call
            .args
            .iter()
            .map(|&(s, e)| &buf[s..e])
            .collect::<Vec<_>>()
            .join(" || ");
        out.push(Rewrite {
            start: call.head_start,
            end: call.end(),
            replacement: joined,
        });
    }
    Ok(out)
}

/// `LOCATE(needle, haystack)` → `POSITION(needle IN haystack)`.
pub fn locate(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for call in retain_innermost(find_calls(buf, map, &LOCATE_HEAD)) {
        if call.args.len() != 2 {
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        }
        out.push(Rewrite {
            start: call.head_start,
            end: call.end(),
            replacement: format!("POSITION({} IN {})", call.arg(buf, 0), call.arg(buf, 1)),
        });
    }
    Ok(out)
}

/// `SUBSTRING_INDEX(s, sep, n)` → `SPLIT_PART(s, sep, n)`.
pub fn substring_index(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for call in retain_innermost(find_calls(buf, map, &SUBSTRING_INDEX_HEAD)) {
        if call.args.len() != 3 {
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        }
        out.push(Rewrite {
            start: call.head_start,
            end: call.end(),
            replacement: format!(
                "SPLIT_PART({}, {}, {})",
                call.arg(buf, 0),
                call.arg(buf, 1),
                call.arg(buf, 2)
            ),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(
        buf: &str,
        f: fn(&str, &SpanMap, &TranslationContext) -> TranslateResult<Vec<Rewrite>>,
    ) -> TranslateResult<Vec<Rewrite>> {
        let map = SpanMap::build(buf).unwrap();
        f(buf, &map, &TranslationContext::default())
    }

    #[test]
    fn test_concat_flattens() {
        let got = apply("SELECT CONCAT(firstname, ' ', surname) FROM members", concat).unwrap();
        assert_eq!(got[0].replacement, "firstname || ' ' || surname");
    }

    #[test]
    fn test_nested_concat_inner_only() {
        let got = apply("SELECT CONCAT(a, CONCAT(b, c))", concat).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].replacement, "b || c");
    }

    #[test]
    fn test_concat_comma_in_literal() {
        let got = apply("SELECT CONCAT(a, ', ', b)", concat).unwrap();
        assert_eq!(got[0].replacement, "a || ', ' || b");
    }

    #[test]
    fn test_locate() {
        let got = apply("SELECT LOCATE('@', email)", locate).unwrap();
        assert_eq!(got[0].replacement, "POSITION('@' IN email)");
    }

    #[test]
    fn test_substring_index() {
        let got = apply("SELECT SUBSTRING_INDEX(email, '@', 1)", substring_index).unwrap();
        assert_eq!(got[0].replacement, "SPLIT_PART(email, '@', 1)");
    }

    #[test]
    fn test_pipes_output_is_stable() {
        assert!(apply("SELECT a || b FROM t", concat).unwrap().is_empty());
    }
}
