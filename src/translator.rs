//! The translation entry points.
//!
//! `Translator` is a pure, synchronous function of its inputs: no I/O
//! (outside the explicit file mode), no shared mutable state, safe to share
//! across threads. The rule catalog it consults is a process-wide immutable
//! static.

use std::path::Path;

use crate::audit::{AuditReport, RewriteEvent};
use crate::context::TranslationContext;
use crate::error::{TranslateError, TranslateResult};
use crate::params;
use crate::pipeline;
use crate::scanner;

/// What one translation call returns. The caller owns it.
#[derive(Debug, Clone)]
pub struct TranslationResult {
    pub rewritten_query: String,
    /// One event per rule firing, in execution order.
    pub events: Vec<RewriteEvent>,
    /// Placeholders in the rewritten query; always equals the source count.
    pub parameter_count: usize,
}

impl TranslationResult {
    /// Build the operator-facing audit report against the source text.
    pub fn audit(&self, original: &str) -> AuditReport {
        AuditReport::new(original, self.rewritten_query.clone(), self.events.clone())
    }
}

/// Outcome for one statement in batch mode. Errors are per-statement: a
/// malformed statement is reported here without aborting its neighbors.
#[derive(Debug)]
pub struct StatementOutcome {
    /// Byte offset of the statement within the batch input.
    pub offset: usize,
    pub original: String,
    pub result: TranslateResult<TranslationResult>,
}

/// Batch translation of a multi-statement buffer.
#[derive(Debug)]
pub struct BatchReport {
    /// The whole buffer with every successfully translated statement spliced
    /// in and every failed statement left untouched (fail-closed).
    pub rewritten: String,
    pub statements: Vec<StatementOutcome>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &StatementOutcome> {
        self.statements.iter().filter(|s| s.result.is_err())
    }
}

/// MySQL → PostgreSQL query-text translator.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    context: TranslationContext,
}

impl Translator {
    pub fn new(context: TranslationContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &TranslationContext {
        &self.context
    }

    /// Translate a single statement.
    pub fn translate(&self, query: &str) -> TranslateResult<TranslationResult> {
        translate(query, &self.context)
    }

    /// Translate a multi-statement buffer, splitting on statement boundaries
    /// with the scanner — never a naive `;` split. Text between statements
    /// (whitespace, comments) is preserved byte-for-byte.
    pub fn translate_sql(&self, sql: &str) -> TranslateResult<BatchReport> {
        let spans = scanner::split_statements(sql)?;
        let mut pieces = Vec::with_capacity(spans.len());
        let mut statements = Vec::new();
        for span in spans {
            let raw = &sql[span.start..span.end];
            let core = raw.trim();
            if core.is_empty() {
                pieces.push(raw.to_string());
                continue;
            }
            let lead = raw.len() - raw.trim_start().len();
            let result = self.translate(core);
            let rewritten_core = match &result {
                Ok(r) => r.rewritten_query.as_str(),
                // Fail closed: the statement goes through untranslated.
                Err(_) => core,
            };
            pieces.push(format!(
                "{}{}{}",
                &raw[..lead],
                rewritten_core,
                &raw[lead + core.len()..]
            ));
            statements.push(StatementOutcome {
                offset: span.start,
                original: core.to_string(),
                result,
            });
        }
        Ok(BatchReport {
            rewritten: pieces.join(";"),
            statements,
        })
    }

    /// Translate a whole file of statements. The untranslated original is
    /// preserved as a sibling `<path>.orig` artifact before the rewritten
    /// text replaces the file, keeping batch migration reviewable and
    /// reversible.
    pub fn translate_file(&self, path: impl AsRef<Path>) -> TranslateResult<BatchReport> {
        let path = path.as_ref();
        let original = std::fs::read_to_string(path)?;
        let report = self.translate_sql(&original)?;
        let mut backup = path.as_os_str().to_owned();
        backup.push(".orig");
        std::fs::write(&backup, &original)?;
        std::fs::write(path, &report.rewritten)?;
        Ok(report)
    }
}

/// Translate one statement with the given context.
pub fn translate(query: &str, context: &TranslationContext) -> TranslateResult<TranslationResult> {
    let before = params::placeholder_count(query)?;
    let mut events = Vec::new();
    let rewritten = pipeline::run(query.to_string(), context, &mut events)?;
    let renumbered = params::renumber(&rewritten)?;
    if renumbered.parameter_count != before {
        // A rule ate or invented a placeholder; proceeding would silently
        // corrupt argument binding.
        return Err(TranslateError::InternalInvariantViolation(format!(
            "placeholder count changed from {before} to {} during translation",
            renumbered.parameter_count
        )));
    }
    Ok(TranslationResult {
        rewritten_query: renumbered.query,
        events,
        parameter_count: renumbered.parameter_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_is_pure_and_reusable() {
        let translator = Translator::default();
        let a = translator.translate("SELECT NOW()").unwrap();
        let b = translator.translate("SELECT NOW()").unwrap();
        assert_eq!(a.rewritten_query, b.rewritten_query);
    }

    #[test]
    fn test_malformed_input_fails_closed() {
        let err = Translator::default().translate("SELECT 'oops").unwrap_err();
        assert!(matches!(err, TranslateError::MalformedInput { .. }));
    }

    #[test]
    fn test_batch_preserves_statement_separators() {
        let report = Translator::default()
            .translate_sql("SELECT NOW();\nSELECT 1")
            .unwrap();
        assert_eq!(report.rewritten, "SELECT CURRENT_TIMESTAMP;\nSELECT 1");
        assert_eq!(report.statements.len(), 2);
    }

    #[test]
    fn test_batch_failure_is_per_statement() {
        let sql = "INSERT INTO t (a) VALUES (?) ON DUPLICATE KEY UPDATE a = VALUES(a); SELECT NOW()";
        let report = Translator::default().translate_sql(sql).unwrap();
        assert_eq!(report.failures().count(), 1);
        // The failing statement stays untranslated, the next one still runs.
        assert!(report.rewritten.contains("ON DUPLICATE KEY UPDATE"));
        assert!(report.rewritten.contains("CURRENT_TIMESTAMP"));
    }

    #[test]
    fn test_semicolon_in_literal_is_one_statement() {
        let report = Translator::default()
            .translate_sql("SELECT 'a;b' FROM t")
            .unwrap();
        assert_eq!(report.statements.len(), 1);
    }
}
