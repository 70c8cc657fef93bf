//! Aggregate-function rewrites.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TranslationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::scanner::SpanMap;

use super::{find_calls, retain_innermost, Rewrite};

static GROUP_CONCAT_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bGROUP_CONCAT\s*\(").unwrap());
static SEPARATOR_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bSEPARATOR\b").unwrap());
static ORDER_BY_KW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").unwrap());

/// `GROUP_CONCAT(expr [ORDER BY ...] [SEPARATOR 'sep'])` →
/// `STRING_AGG(expr, 'sep' [ORDER BY ...])`.
///
/// Without SEPARATOR, the separator defaults to `','` (MySQL's implicit
/// default, which STRING_AGG does not have). MySQL puts ORDER BY before the
/// separator; STRING_AGG wants it after, so the two clauses swap places.
pub fn group_concat(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for call in retain_innermost(find_calls(buf, map, &GROUP_CONCAT_HEAD)) {
        let region_start = call.open + 1;
        let sep_kw = top_level_keyword(buf, map, region_start, call.close, &SEPARATOR_KW);
        let order_kw = top_level_keyword(buf, map, region_start, call.close, &ORDER_BY_KW);

        let expr_end = match (order_kw, sep_kw) {
            (Some((os, _)), _) => os,
            (None, Some((ss, _))) => ss,
            (None, None) => call.close,
        };
        let expr = buf[region_start..expr_end].trim();

        let sep = match sep_kw {
            Some((_, se)) => buf[se..call.close].trim(),
            None => "','",
        };
        let order = match (order_kw, sep_kw) {
            (Some((os, _)), Some((ss, _))) => {
                if os > ss {
                    // ORDER BY after SEPARATOR is not MySQL syntax.
                    return Err(TranslateError::unsupported(
                        call.head_start,
                        &buf[call.head_start..call.end()],
                    ));
                }
                buf[os..ss].trim()
            }
            (Some((os, _)), None) => buf[os..call.close].trim(),
            (None, _) => "",
        };

        if expr.is_empty() || sep.is_empty() || expr_contains_top_level_comma(&call, expr_end) {
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        }

        let replacement = if order.is_empty() {
            format!("STRING_AGG({}, {})", expr, sep)
        } else {
            format!("STRING_AGG({}, {} {})", expr, sep, order)
        };
        out.push(Rewrite {
            start: call.head_start,
            end: call.end(),
            replacement,
        });
    }
    Ok(out)
}

/// Find the first `re` keyword between `from` and `to` that sits at a Code
/// position and at parenthesis depth zero. Returns absolute (start, end).
fn top_level_keyword(
    buf: &str,
    map: &SpanMap,
    from: usize,
    to: usize,
    re: &Regex,
) -> Option<(usize, usize)> {
    let region = &buf[from..to];
    for m in re.find_iter(region) {
        let start = from + m.start();
        let end = from + m.end();
        if !map.range_is_code(start, end) {
            continue;
        }
        let mut depth = 0i32;
        for (off, b) in region[..m.start()].bytes().enumerate() {
            if map.is_code(from + off) {
                match b {
                    b'(' => depth += 1,
                    b')' => depth -= 1,
                    _ => {}
                }
            }
        }
        if depth == 0 {
            return Some((start, end));
        }
    }
    None
}

/// Multi-expression GROUP_CONCAT (`GROUP_CONCAT(a, b)`) has no direct
/// STRING_AGG equivalent; a top-level comma before the clause keywords
/// means exactly that.
fn expr_contains_top_level_comma(call: &super::CallSite, expr_end: usize) -> bool {
    call.args
        .iter()
        .skip(1)
        .any(|&(arg_start, _)| arg_start < expr_end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(buf: &str) -> TranslateResult<Vec<Rewrite>> {
        let map = SpanMap::build(buf).unwrap();
        group_concat(buf, &map, &TranslationContext::default())
    }

    #[test]
    fn test_with_separator() {
        let got = apply("SELECT GROUP_CONCAT(name SEPARATOR ', ') FROM t GROUP BY g").unwrap();
        assert_eq!(got[0].replacement, "STRING_AGG(name, ', ')");
    }

    #[test]
    fn test_default_separator() {
        let got = apply("SELECT GROUP_CONCAT(name) FROM t GROUP BY g").unwrap();
        assert_eq!(got[0].replacement, "STRING_AGG(name, ',')");
    }

    #[test]
    fn test_order_by_moves_after_separator() {
        let got =
            apply("SELECT GROUP_CONCAT(name ORDER BY name SEPARATOR ', ') FROM t GROUP BY g")
                .unwrap();
        assert_eq!(got[0].replacement, "STRING_AGG(name, ', ' ORDER BY name)");
    }

    #[test]
    fn test_order_by_without_separator() {
        let got = apply("SELECT GROUP_CONCAT(name ORDER BY name DESC) FROM t GROUP BY g").unwrap();
        assert_eq!(got[0].replacement, "STRING_AGG(name, ',' ORDER BY name DESC)");
    }

    #[test]
    fn test_separator_word_in_literal_is_not_keyword() {
        let got = apply("SELECT GROUP_CONCAT('SEPARATOR') FROM t").unwrap();
        assert_eq!(got[0].replacement, "STRING_AGG('SEPARATOR', ',')");
    }

    #[test]
    fn test_multi_expression_is_unsupported() {
        let err = apply("SELECT GROUP_CONCAT(a, b) FROM t").unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_string_agg_output_is_stable() {
        assert!(apply("SELECT STRING_AGG(name, ', ' ORDER BY name) FROM t")
            .unwrap()
            .is_empty());
    }
}
