//! Pagination rewrites: MySQL's two-operand `LIMIT a, b`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TranslationContext;
use crate::error::TranslateResult;
use crate::scanner::SpanMap;

use super::Rewrite;

// Two numeric or placeholder operands separated by a comma; a lone LIMIT n
// never matches, so translated output is stable.
static LIMIT_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bLIMIT\s+(\?|\$\d+|\d+)\s*,\s*(\?|\$\d+|\d+)").unwrap()
});

/// `LIMIT a, b` → `OFFSET a LIMIT b`.
///
/// MySQL's comma form puts the offset first; the rewrite keeps both operands
/// in their original textual order, so placeholder order is untouched.
pub fn limit_comma(
    buf: &str,
    map: &SpanMap,
    _ctx: &TranslationContext,
) -> TranslateResult<Vec<Rewrite>> {
    let mut out = Vec::new();
    for caps in LIMIT_COMMA.captures_iter(buf) {
        let m = caps.get(0).unwrap();
        if !map.range_is_code(m.start(), m.end()) {
            continue;
        }
        out.push(Rewrite {
            start: m.start(),
            end: m.end(),
            replacement: format!("OFFSET {} LIMIT {}", &caps[1], &caps[2]),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(buf: &str) -> Vec<Rewrite> {
        let map = SpanMap::build(buf).unwrap();
        limit_comma(buf, &map, &TranslationContext::default()).unwrap()
    }

    #[test]
    fn test_numeric_operands() {
        let got = apply("SELECT * FROM t LIMIT 10, 20");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].replacement, "OFFSET 10 LIMIT 20");
    }

    #[test]
    fn test_placeholder_operands() {
        let got = apply("SELECT * FROM t LIMIT ?, ?");
        assert_eq!(got[0].replacement, "OFFSET ? LIMIT ?");
    }

    #[test]
    fn test_single_operand_untouched() {
        assert!(apply("SELECT * FROM t LIMIT 10").is_empty());
    }

    #[test]
    fn test_output_form_is_stable() {
        assert!(apply("SELECT * FROM t OFFSET 10 LIMIT 20").is_empty());
    }

    #[test]
    fn test_inside_literal_untouched() {
        assert!(apply("SELECT 'LIMIT 10, 20' FROM t").is_empty());
    }
}
