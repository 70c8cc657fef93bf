//! Positional placeholder renumbering.
//!
//! Converts MySQL-style unnamed `?` placeholders into Postgres `$n`
//! placeholders, strictly left to right. This pass changes spelling only,
//! never position: the k-th placeholder in the source keeps binding the
//! caller's k-th argument. Already-numbered `$n` tokens pass through
//! unchanged so previously-translated text re-translates to itself.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{TranslateError, TranslateResult};
use crate::scanner::{SpanKind, SpanMap};

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\d+").unwrap());

/// Outcome of the renumbering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renumbered {
    pub query: String,
    /// Placeholders present in the rewritten query.
    pub parameter_count: usize,
}

/// Count placeholders (`?` and `$n`) in the Code spans of `buf`.
pub fn placeholder_count(buf: &str) -> TranslateResult<usize> {
    let map = SpanMap::build(buf)?;
    let mut count = 0;
    for span in map.spans() {
        if span.kind != SpanKind::Code {
            continue;
        }
        let code = &buf[span.start..span.end];
        count += code.bytes().filter(|&b| b == b'?').count();
        count += NUMBERED.find_iter(code).count();
    }
    Ok(count)
}

/// Replace the k-th `?` with the k-th free `$n`. Numbering starts past the
/// highest pre-existing `$n` so mixed inputs cannot collide; pure-`?` input
/// gets `$1..$n`.
pub fn renumber(buf: &str) -> TranslateResult<Renumbered> {
    let map = SpanMap::build(buf)?;
    let mut existing = 0usize;
    let mut highest = 0usize;
    for span in map.spans() {
        if span.kind != SpanKind::Code {
            continue;
        }
        for m in NUMBERED.find_iter(&buf[span.start..span.end]) {
            existing += 1;
            if let Ok(n) = m.as_str()[1..].parse::<usize>() {
                highest = highest.max(n);
            }
        }
    }

    let mut out = String::with_capacity(buf.len() + 8);
    let mut next = highest + 1;
    let mut replaced = 0usize;
    for span in map.spans() {
        let text = &buf[span.start..span.end];
        if span.kind != SpanKind::Code {
            out.push_str(text);
            continue;
        }
        for ch in text.chars() {
            if ch == '?' {
                out.push('$');
                out.push_str(&next.to_string());
                next += 1;
                replaced += 1;
            } else {
                out.push(ch);
            }
        }
    }

    let parameter_count = replaced + existing;
    let after = placeholder_count(&out)?;
    if after != parameter_count {
        return Err(TranslateError::InternalInvariantViolation(format!(
            "placeholder count drifted during renumbering: expected {parameter_count}, found {after}"
        )));
    }
    Ok(Renumbered {
        query: out,
        parameter_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_renumbering() {
        let got = renumber("SELECT * FROM members WHERE firstname = ? AND surname = ?").unwrap();
        assert_eq!(
            got.query,
            "SELECT * FROM members WHERE firstname = $1 AND surname = $2"
        );
        assert_eq!(got.parameter_count, 2);
    }

    #[test]
    fn test_question_mark_in_literal_untouched() {
        let got = renumber("SELECT * FROM t WHERE a = ? AND b = 'what?'").unwrap();
        assert_eq!(got.query, "SELECT * FROM t WHERE a = $1 AND b = 'what?'");
        assert_eq!(got.parameter_count, 1);
    }

    #[test]
    fn test_already_numbered_passes_through() {
        let got = renumber("SELECT * FROM t WHERE a = $1 AND b = $2").unwrap();
        assert_eq!(got.query, "SELECT * FROM t WHERE a = $1 AND b = $2");
        assert_eq!(got.parameter_count, 2);
    }

    #[test]
    fn test_mixed_input_numbers_past_existing() {
        let got = renumber("WHERE a = $2 AND b = ?").unwrap();
        assert_eq!(got.query, "WHERE a = $2 AND b = $3");
        assert_eq!(got.parameter_count, 2);
    }

    #[test]
    fn test_no_placeholders() {
        let got = renumber("SELECT 1").unwrap();
        assert_eq!(got.parameter_count, 0);
    }

    #[test]
    fn test_placeholder_count_skips_comments() {
        assert_eq!(placeholder_count("SELECT ? -- not this ?").unwrap(), 1);
    }
}
