//! The rewrite pipeline.
//!
//! Runs rule categories in their fixed dependency order. Each rule's batch
//! of rewrites is committed and the buffer re-scanned before the next rule
//! looks at it, so no matcher ever sees stale span boundaries. Each category
//! loops to a fixpoint (nested constructs unwind one layer per iteration)
//! with a hard bound: a category that will not converge is a rule bug, not
//! something to spin on.

use crate::audit::RewriteEvent;
use crate::context::TranslationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::rules::{rules_for, Category, Rewrite};
use crate::scanner::SpanMap;

/// Iterations a single category may take to stabilize. Real queries settle
/// in one or two; the bound only exists to turn a non-converging rule into
/// a hard error.
const MAX_CATEGORY_ITERATIONS: usize = 64;

/// Run every category pass over `buf`, accumulating one event per rule
/// firing, in execution order.
pub fn run(
    mut buf: String,
    ctx: &TranslationContext,
    events: &mut Vec<RewriteEvent>,
) -> TranslateResult<String> {
    for category in Category::ORDER {
        let mut iterations = 0;
        loop {
            let mut changed = false;
            for rule in rules_for(category) {
                let map = SpanMap::build(&buf)?;
                let mut rewrites = (rule.apply)(&buf, &map, ctx)?;
                if rewrites.is_empty() {
                    continue;
                }
                rewrites.sort_by_key(|r| r.start);
                check_disjoint(rule.id, &rewrites)?;
                for r in &rewrites {
                    events.push(RewriteEvent {
                        rule_id: rule.id,
                        original_text: buf[r.start..r.end].to_string(),
                        replacement_text: r.replacement.clone(),
                        position: r.start,
                    });
                }
                for r in rewrites.iter().rev() {
                    buf.replace_range(r.start..r.end, &r.replacement);
                }
                changed = true;
            }
            if !changed {
                break;
            }
            iterations += 1;
            if iterations >= MAX_CATEGORY_ITERATIONS {
                return Err(TranslateError::InternalInvariantViolation(format!(
                    "category {category:?} did not converge after {MAX_CATEGORY_ITERATIONS} iterations"
                )));
            }
        }
    }
    Ok(buf)
}

fn check_disjoint(rule_id: &str, rewrites: &[Rewrite]) -> TranslateResult<()> {
    for pair in rewrites.windows(2) {
        if pair[1].start < pair[0].end {
            return Err(TranslateError::InternalInvariantViolation(format!(
                "rule {rule_id} produced overlapping rewrites at {} and {}",
                pair[0].start, pair[1].start
            )));
        }
    }
    Ok(())
}
