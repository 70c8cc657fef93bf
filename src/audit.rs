//! Audit reporting.
//!
//! Textual rewriting of executable queries is trust-sensitive, so every
//! translation carries its full audit trail: which rules fired, where, and
//! what they replaced. The reporter is purely observational — it never
//! touches the query.

use colored::Colorize;
use serde::Serialize;

/// One successful rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteEvent {
    /// Catalog id of the rule that fired.
    pub rule_id: &'static str,
    /// The text that was replaced.
    pub original_text: String,
    /// What it was replaced with.
    pub replacement_text: String,
    /// Byte offset of the match in the buffer at the time of rewriting.
    pub position: usize,
}

/// Before/after pair plus the event trail for one translation, for operator
/// review before anything irreversible happens with the rewritten query.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub original: String,
    pub rewritten: String,
    pub events: Vec<RewriteEvent>,
}

impl AuditReport {
    pub fn new(original: impl Into<String>, rewritten: impl Into<String>, events: Vec<RewriteEvent>) -> Self {
        Self {
            original: original.into(),
            rewritten: rewritten.into(),
            events,
        }
    }

    /// True if translation changed nothing.
    pub fn is_clean(&self) -> bool {
        self.original == self.rewritten
    }

    /// Render the operator-facing diff view.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{} {}\n", "Original: ".dimmed(), self.original.yellow()));
        out.push_str(&format!("{} {}\n", "Rewritten:".dimmed(), self.rewritten.green()));
        if self.events.is_empty() {
            out.push_str(&format!("{}\n", "(no rules fired)".dimmed()));
            return out;
        }
        out.push_str(&format!(
            "{}\n",
            format!("Rules fired ({}):", self.events.len()).white().bold()
        ));
        for event in &self.events {
            out.push_str(&format!(
                "  [{}] {} {} {} {}\n",
                event.position.to_string().dimmed(),
                event.rule_id.cyan(),
                event.original_text.yellow(),
                "→".dimmed(),
                event.replacement_text.green(),
            ));
        }
        out
    }
}
