//! Defines the core `SanitizationEngine` trait and its result types.
//!
//! The trait separates the event-driven monitor from the rule-application
//! strategy. The monitor only needs "text and caret in, text and caret out".
//!
//! License: MIT OR APACHE 2.0

use serde::{Deserialize, Serialize};

use crate::cursor;
use crate::redaction_match::RuleHit;
use crate::sanitizers::compiler::CompiledRules;

/// Output of one rule pass, before caret reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleApplication {
    pub text: String,
    /// End of the last literal-rule match starting at or before the caret.
    pub last_replacement_end: Option<usize>,
    pub hits: Vec<RuleHit>,
}

impl RuleApplication {
    /// The text + caret result of this pass over `original`.
    ///
    /// Empty input is returned unchanged, whatever the rules produced.
    pub fn to_result(&self, original: &str, cursor: Option<usize>, is_paste: bool) -> TransformResult {
        if original.is_empty() {
            return TransformResult::unchanged(original, cursor);
        }
        let cursor_position = cursor::reconcile(original, &self.text, cursor, is_paste, self.last_replacement_end);
        TransformResult { text: self.text.clone(), cursor_position }
    }
}

/// The engine's text + caret result.
///
/// `cursor_position` is `None` when the caller did not ask for caret tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    pub text: String,
    pub cursor_position: Option<usize>,
}

impl TransformResult {
    /// A result that leaves text and caret as they were.
    pub fn unchanged(text: &str, cursor_position: Option<usize>) -> Self {
        Self { text: text.to_string(), cursor_position }
    }
}

/// A pluggable text sanitization strategy.
///
/// Offsets are counted in characters (Unicode scalar values).
pub trait SanitizationEngine: Send + Sync {
    /// Applies every enabled rule, in order, to `text`.
    ///
    /// `cursor` is the caret before the rewrite; it only influences the
    /// recorded anchor, never the produced text.
    fn apply_rules(&self, text: &str, cursor: Option<usize>, is_paste: bool) -> RuleApplication;

    /// The compiled rules this engine applies.
    fn compiled_rules(&self) -> &CompiledRules;

    /// Applies the rules and computes where the caret lands afterwards.
    fn sanitize(&self, text: &str, cursor: Option<usize>, is_paste: bool) -> TransformResult {
        if text.is_empty() {
            return TransformResult::unchanged(text, cursor);
        }
        self.apply_rules(text, cursor, is_paste).to_result(text, cursor, is_paste)
    }
}
