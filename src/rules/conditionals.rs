//! Conditional-expression rewrites.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TranslationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::scanner::SpanMap;

use super::{find_calls, retain_innermost, Rewrite};

static IFNULL_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bIFNULL\s*\(").unwrap());
// `\bIF\s*\(` cannot match IFNULL( — the parenthesis check fails after IF.
static IF_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bIF\s*\(").unwrap());

/// `IFNULL(a, b)` → `COALESCE(a, b)`.
pub fn ifnull(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for call in retain_innermost(find_calls(buf, map, &IFNULL_HEAD)) {
        if call.args.len() != 2 {
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        }
        out.push(Rewrite {
            start: call.head_start,
            end: call.end(),
            replacement: format!("COALESCE({}, {})", call.arg(buf, 0), call.arg(buf, 1)),
        });
    }
    Ok(out)
}

/// `IF(cond, a, b)` → `CASE WHEN cond THEN a ELSE b END`.
pub fn if_case(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for call in retain_innermost(find_calls(buf, map, &IF_HEAD)) {
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
                "CASE WHEN {} THEN {} ELSE {} END",
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
    fn test_ifnull() {
        let got = apply("SELECT IFNULL(email, 'none') FROM members", ifnull).unwrap();
        assert_eq!(got[0].replacement, "COALESCE(email, 'none')");
    }

    #[test]
    fn test_if_case() {
        let got = apply("SELECT IF(score > 10, 'hi', 'lo')", if_case).unwrap();
        assert_eq!(got[0].replacement, "CASE WHEN score > 10 THEN 'hi' ELSE 'lo' END");
    }

    #[test]
    fn test_if_does_not_match_ifnull() {
        assert!(apply("SELECT IFNULL(a, b)", if_case).unwrap().is_empty());
    }

    #[test]
    fn test_nested_ifnull_rewrites_inner_first() {
        let buf = "SELECT IFNULL(IFNULL(a, b), c)";
        let got = apply(buf, ifnull).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].replacement, "COALESCE(a, b)");
    }

    #[test]
    fn test_wrong_arity_is_unsupported() {
        let err = apply("SELECT IF(a, b)", if_case).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_coalesce_output_is_stable() {
        assert!(apply("SELECT COALESCE(a, b)", ifnull).unwrap().is_empty());
    }
}
