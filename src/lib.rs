//! sqlport — translate MySQL query text into PostgreSQL query text.
//!
//! The translator is a pure function over query strings: it scans the input
//! into literal-safe spans, runs an ordered catalog of rewrite rules over the
//! code spans, renumbers positional placeholders, and hands back the
//! rewritten text together with an audit trail of every rule that fired.

pub mod audit;
pub mod context;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod rules;
pub mod scanner;
pub mod translator;

pub use context::TranslationContext;
pub use error::{TranslateError, TranslateResult};
pub use translator::{translate, TranslationResult, Translator};

pub mod prelude {
    pub use crate::audit::{AuditReport, RewriteEvent};
    pub use crate::context::TranslationContext;
    pub use crate::error::{TranslateError, TranslateResult};
    pub use crate::translator::{translate, TranslationResult, Translator};
}
