//! Date and time rewrites.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TranslationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::scanner::SpanMap;

use super::{find_calls, retain_innermost, Rewrite};

static NOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOW\s*\(\s*\)").unwrap());
static CURDATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCURDATE\s*\(\s*\)").unwrap());
static DATE_ADD_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bDATE_ADD\s*\(").unwrap());
static DATE_SUB_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bDATE_SUB\s*\(").unwrap());
static EXTRACT_HEAD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(YEAR|MONTH|DAY)\s*\(").unwrap());
static DATEDIFF_HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bDATEDIFF\s*\(").unwrap());
static INTERVAL_ARG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^INTERVAL\s+(\d+)\s+(\w+)$").unwrap());

fn token_rewrites(buf: &str, map: &SpanMap, re: &Regex, replacement: &str) -> Vec<Rewrite> {
    re.find_iter(buf)
        .filter(|m| map.range_is_code(m.start(), m.end()))
        .map(|m| Rewrite {
            start: m.start(),
            end: m.end(),
            replacement: replacement.to_string(),
        })
        .collect()
}

/// `NOW()` → `CURRENT_TIMESTAMP`.
pub fn now(buf: &str, map: &SpanMap, _ctx: &TranslationContext) -> TranslateResult<Vec<Rewrite>> {
    Ok(token_rewrites(buf, map, &NOW, "CURRENT_TIMESTAMP"))
}

/// `CURDATE()` → `CURRENT_DATE`.
pub fn curdate(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    Ok(token_rewrites(buf, map, &CURDATE, "CURRENT_DATE"))
}

/// `DATE_ADD(expr, INTERVAL n unit)` → `(expr + INTERVAL 'n unit')`.
pub fn date_add(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    interval_arith(buf, map, &DATE_ADD_HEAD, '+')
}

/// `DATE_SUB(expr, INTERVAL n unit)` → `(expr - INTERVAL 'n unit')`.
pub fn date_sub(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    interval_arith(buf, map, &DATE_SUB_HEAD, '-')
}

fn interval_arith(
    buf: &str,
    map: &SpanMap,
    head: &Regex,
    op: char,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for call in retain_innermost(find_calls(buf, map, head)) {
        if call.args.len() != 2 {
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        }
        let interval = call.arg(buf, 1);
        let Some(caps) = INTERVAL_ARG.captures(interval) else {
            // Covers both a malformed second argument and a placeholder
            // amount, which the quoted interval form cannot carry.
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        };
        out.push(Rewrite {
            start: call.head_start,
            end: call.end(),
            replacement: format!("({} {} INTERVAL '{} {}')", call.arg(buf, 0), op, &caps[1], &caps[2]),
        });
    }
    Ok(out)
}

/// `YEAR(expr)` / `MONTH(expr)` / `DAY(expr)` → `EXTRACT(part FROM expr)`.
pub fn extract_part(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for call in retain_innermost(find_calls(buf, map, &EXTRACT_HEAD)) {
        if call.args.len() != 1 {
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        }
        let part = buf[call.head_start..call.open].trim().to_uppercase();
        out.push(Rewrite {
            start: call.head_start,
            end: call.end(),
            replacement: format!("EXTRACT({} FROM {})", part, call.arg(buf, 0)),
        });
    }
    Ok(out)
}

/// `DATEDIFF(a, b)` → `(a::DATE - b::DATE)`.
pub fn datediff(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for call in retain_innermost(find_calls(buf, map, &DATEDIFF_HEAD)) {
        if call.args.len() != 2 {
            return Err(TranslateError::unsupported(
                call.head_start,
                &buf[call.head_start..call.end()],
            ));
        }
        out.push(Rewrite {
            start: call.head_start,
            end: call.end(),
            replacement: format!("({}::DATE - {}::DATE)", call.arg(buf, 0), call.arg(buf, 1)),
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
    fn test_now() {
        let got = apply("SELECT NOW() FROM t", now).unwrap();
        assert_eq!(got[0].replacement, "CURRENT_TIMESTAMP");
    }

    #[test]
    fn test_now_in_literal_untouched() {
        assert!(apply("SELECT 'NOW()' FROM t", now).unwrap().is_empty());
    }

    #[test]
    fn test_curdate() {
        let got = apply("SELECT CURDATE()", curdate).unwrap();
        assert_eq!(got[0].replacement, "CURRENT_DATE");
    }

    #[test]
    fn test_date_add() {
        let got = apply("SELECT DATE_ADD(created_at, INTERVAL 30 DAY)", date_add).unwrap();
        assert_eq!(got[0].replacement, "(created_at + INTERVAL '30 DAY')");
    }

    #[test]
    fn test_date_sub() {
        let got = apply("SELECT DATE_SUB(NOW(), INTERVAL 1 HOUR)", date_sub).unwrap();
        assert_eq!(got[0].replacement, "(NOW() - INTERVAL '1 HOUR')");
    }

    #[test]
    fn test_nested_date_add_rewrites_inner_first() {
        let got = apply(
            "SELECT DATE_ADD(DATE_ADD(ts, INTERVAL 1 DAY), INTERVAL 1 MONTH)",
            date_add,
        )
        .unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].replacement, "(ts + INTERVAL '1 DAY')");
    }

    #[test]
    fn test_nested_datediff_rewrites_inner_first() {
        let got = apply("SELECT DATEDIFF(DATEDIFF(a, b), c)", datediff).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].replacement, "(a::DATE - b::DATE)");
    }

    #[test]
    fn test_date_add_placeholder_amount_is_unsupported() {
        let err = apply("SELECT DATE_ADD(ts, INTERVAL ? DAY)", date_add).unwrap_err();
        assert!(matches!(err, TranslateError::UnsupportedConstruct { .. }));
    }

    #[test]
    fn test_year_month_day() {
        let got = apply("SELECT YEAR(joined), MONTH(joined), DAY(joined)", extract_part).unwrap();
        assert_eq!(got[0].replacement, "EXTRACT(YEAR FROM joined)");
        assert_eq!(got[1].replacement, "EXTRACT(MONTH FROM joined)");
        assert_eq!(got[2].replacement, "EXTRACT(DAY FROM joined)");
    }

    #[test]
    fn test_extract_output_is_stable() {
        assert!(apply("SELECT EXTRACT(YEAR FROM joined)", extract_part)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_datediff() {
        let got = apply("SELECT DATEDIFF(a, b)", datediff).unwrap();
        assert_eq!(got[0].replacement, "(a::DATE - b::DATE)");
    }
}
