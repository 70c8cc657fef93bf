//! The rewrite rule catalog.
//!
//! One module per rule family. Every matcher goes through the `SpanMap` gate
//! so no rule ever fires on bytes inside a string literal, quoted
//! identifier, or comment. The catalog is built once and shared read-only
//! across callers; catalog order within a category is application order.

pub mod aggregates;
pub mod booleans;
pub mod conditionals;
pub mod dates;
pub mod pagination;
pub mod strings;
pub mod upsert;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::context::TranslationContext;
use crate::error::TranslateResult;
use crate::scanner::SpanMap;

/// Rule families, in pipeline order. Strings must precede Booleans because a
/// flattened CONCAT can expose a boolean comparison; Booleans run last so
/// tautology folding sees the stabilized expression shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Pagination,
    Dates,
    Conditionals,
    Strings,
    Aggregates,
    Upsert,
    Booleans,
}

impl Category {
    /// Pass order of the rewrite pipeline. Load-bearing; see module docs.
    pub const ORDER: [Category; 7] = [
        Category::Pagination,
        Category::Dates,
        Category::Conditionals,
        Category::Strings,
        Category::Aggregates,
        Category::Upsert,
        Category::Booleans,
    ];
}

/// One textual replacement within a buffer, absolute byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

/// Matcher + rewrite for one rule. Returns the non-overlapping rewrites one
/// application would perform; an input already in the rule's output form
/// must yield none (idempotence).
pub type ApplyFn =
    fn(&str, &SpanMap, &TranslationContext) -> TranslateResult<Vec<Rewrite>>;

pub struct Rule {
    pub id: &'static str,
    pub category: Category,
    pub apply: ApplyFn,
}

/// Process-wide, read-only catalog. Order within a category is priority.
pub static CATALOG: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule {
            id: "pagination-limit-offset",
            category: Category::Pagination,
            apply: pagination::limit_comma,
        },
        Rule {
            id: "dates-now",
            category: Category::Dates,
            apply: dates::now,
        },
        Rule {
            id: "dates-curdate",
            category: Category::Dates,
            apply: dates::curdate,
        },
        Rule {
            id: "dates-date-add",
            category: Category::Dates,
            apply: dates::date_add,
        },
        Rule {
            id: "dates-date-sub",
            category: Category::Dates,
            apply: dates::date_sub,
        },
        Rule {
            id: "dates-extract",
            category: Category::Dates,
            apply: dates::extract_part,
        },
        Rule {
            id: "dates-datediff",
            category: Category::Dates,
            apply: dates::datediff,
        },
        Rule {
            id: "conditionals-ifnull",
            category: Category::Conditionals,
            apply: conditionals::ifnull,
        },
        Rule {
            id: "conditionals-if-case",
            category: Category::Conditionals,
            apply: conditionals::if_case,
        },
        Rule {
            id: "strings-concat",
            category: Category::Strings,
            apply: strings::concat,
        },
        Rule {
            id: "strings-locate",
            category: Category::Strings,
            apply: strings::locate,
        },
        Rule {
            id: "strings-substring-index",
            category: Category::Strings,
            apply: strings::substring_index,
        },
        Rule {
            id: "aggregates-group-concat",
            category: Category::Aggregates,
            apply: aggregates::group_concat,
        },
        Rule {
            id: "upsert-on-duplicate-key",
            category: Category::Upsert,
            apply: upsert::on_duplicate_key,
        },
        Rule {
            id: "booleans-column-literal",
            category: Category::Booleans,
            apply: booleans::column_literal,
        },
        Rule {
            id: "booleans-tautology",
            category: Category::Booleans,
            apply: booleans::tautology,
        },
    ]
});

/// Rules of one category, in catalog order.
pub fn rules_for(category: Category) -> impl Iterator<Item = &'static Rule> {
    CATALOG.iter().filter(move |r| r.category == category)
}

/// A matched function call: `head_start` is the first byte of the function
/// name, `open`/`close` the parentheses, `args` the trimmed top-level
/// argument ranges. Argument ranges may carry literal spans inside them
/// verbatim; the head, parentheses, and separating commas are always Code.
#[derive(Debug, Clone)]
pub(crate) struct CallSite {
    pub head_start: usize,
    pub open: usize,
    pub close: usize,
    pub args: Vec<(usize, usize)>,
}

impl CallSite {
    pub fn end(&self) -> usize {
        self.close + 1
    }

    pub fn arg<'a>(&self, buf: &'a str, idx: usize) -> &'a str {
        let (s, e) = self.args[idx];
        &buf[s..e]
    }
}

/// Find calls whose head matches `head` (a regex ending in `\(`), with the
/// head entirely in Code, and balanced parentheses counted only at Code
/// positions. Calls with no matching close parenthesis are skipped.
pub(crate) fn find_calls(buf: &str, map: &SpanMap, head: &Regex) -> Vec<CallSite> {
    let mut calls = Vec::new();
    for m in head.find_iter(buf) {
        if !map.range_is_code(m.start(), m.end()) {
            continue;
        }
        let open = m.end() - 1;
        if let Some(call) = parse_call(buf, map, m.start(), open) {
            calls.push(call);
        }
    }
    calls
}

/// Walk from an opening parenthesis to its Code-position match, collecting
/// trimmed top-level argument ranges.
fn parse_call(buf: &str, map: &SpanMap, head_start: usize, open: usize) -> Option<CallSite> {
    let bytes = buf.as_bytes();
    let mut depth = 1usize;
    let mut arg_start = open + 1;
    let mut args = Vec::new();
    let mut i = open + 1;
    while i < bytes.len() {
        if map.is_code(i) {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        if let Some(range) = trim_range(buf, arg_start, i) {
                            args.push(range);
                        } else if !args.is_empty() {
                            // `f(a, )` — ragged but tolerated, keep the raw range.
                            args.push((arg_start, i));
                        }
                        return Some(CallSite {
                            head_start,
                            open,
                            close: i,
                            args,
                        });
                    }
                }
                b',' if depth == 1 => {
                    args.push(trim_range(buf, arg_start, i).unwrap_or((arg_start, i)));
                    arg_start = i + 1;
                }
                _ => {}
            }
        }
        i += 1;
    }
    None
}

/// Shrink `start..end` past surrounding whitespace; None if nothing remains.
fn trim_range(buf: &str, mut start: usize, mut end: usize) -> Option<(usize, usize)> {
    let bytes = buf.as_bytes();
    while start < end && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    (start < end).then_some((start, end))
}

/// Drop any call that strictly contains another, keeping the innermost set.
/// Innermost calls of one rule never overlap, so the survivors can all be
/// rewritten in a single batch; outer calls are picked up on the next
/// fixpoint iteration.
pub(crate) fn retain_innermost(calls: Vec<CallSite>) -> Vec<CallSite> {
    let ranges: Vec<(usize, usize)> = calls.iter().map(|c| (c.head_start, c.end())).collect();
    calls
        .into_iter()
        .filter(|c| {
            !ranges
                .iter()
                .any(|&(s, e)| s > c.head_start && e <= c.end() && (s, e) != (c.head_start, c.end()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;

    static CONCAT_HEAD: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)\bCONCAT\s*\(").unwrap());

    #[test]
    fn test_find_call_args() {
        let buf = "SELECT CONCAT(a, ' , ', b) FROM t";
        let map = SpanMap::build(buf).unwrap();
        let calls = find_calls(buf, &map, &CONCAT_HEAD);
        assert_eq!(calls.len(), 1);
        let call = &calls[0];
        assert_eq!(call.args.len(), 3);
        assert_eq!(call.arg(buf, 0), "a");
        assert_eq!(call.arg(buf, 1), "' , '");
        assert_eq!(call.arg(buf, 2), "b");
    }

    #[test]
    fn test_head_in_literal_never_matches() {
        let buf = "SELECT 'CONCAT(a, b)' FROM t";
        let map = SpanMap::build(buf).unwrap();
        assert!(find_calls(buf, &map, &CONCAT_HEAD).is_empty());
    }

    #[test]
    fn test_nested_parens_in_args() {
        let buf = "SELECT CONCAT(f(a, b), c) FROM t";
        let map = SpanMap::build(buf).unwrap();
        let calls = find_calls(buf, &map, &CONCAT_HEAD);
        assert_eq!(calls[0].args.len(), 2);
        assert_eq!(calls[0].arg(buf, 0), "f(a, b)");
    }

    #[test]
    fn test_retain_innermost() {
        let buf = "CONCAT(CONCAT(a, b), c)";
        let map = SpanMap::build(buf).unwrap();
        let calls = retain_innermost(find_calls(buf, &map, &CONCAT_HEAD));
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].head_start, 7);
    }

    #[test]
    fn test_catalog_order_matches_pipeline_order() {
        let mut seen = Vec::new();
        for rule in CATALOG.iter() {
            if seen.last() != Some(&rule.category) {
                seen.push(rule.category);
            }
        }
        assert_eq!(seen, Category::ORDER.to_vec());
    }
}
