//! Caller-supplied schema knowledge.
//!
//! The translator never guesses types or keys from query text. Anything it
//! cannot read off the text itself — which columns are boolean, which unique
//! key an upsert resolves against — has to be declared here by the caller.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{TranslateError, TranslateResult};

/// Schema hints for one translation run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslationContext {
    /// Columns known to be boolean-typed. A bare name (`is_active`) matches
    /// any alias-qualified use (`u.is_active`); a dotted entry
    /// (`users.verified`) matches only that qualified spelling.
    #[serde(default)]
    pub boolean_columns: HashSet<String>,

    /// Conflict key per table, for rewriting ON DUPLICATE KEY UPDATE.
    /// MySQL's clause does not name the key, so it must be declared.
    #[serde(default)]
    pub conflict_keys: HashMap<String, Vec<String>>,
}

impl TranslationContext {
    /// Load a context from a TOML file.
    ///
    /// ```toml
    /// boolean_columns = ["is_active", "members.verified"]
    ///
    /// [conflict_keys]
    /// users = ["id"]
    /// counters = ["name", "day"]
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> TranslateResult<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            TranslateError::malformed(0, format!("invalid context file: {e}"))
        })
    }

    /// True if `reference` (possibly alias-qualified) names a declared
    /// boolean column.
    pub fn is_boolean_column(&self, reference: &str) -> bool {
        if self.boolean_columns.contains(reference) {
            return true;
        }
        match reference.rsplit_once('.') {
            Some((_, bare)) => self.boolean_columns.contains(bare),
            None => false,
        }
    }

    /// Conflict key for `table`, if one was declared.
    pub fn conflict_key(&self, table: &str) -> Option<&[String]> {
        self.conflict_keys.get(table).map(|v| v.as_slice())
    }
}
