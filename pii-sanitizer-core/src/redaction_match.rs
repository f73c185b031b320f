//! Match bookkeeping and PII-safe logging helpers.
//!
//! The engine logs every step of a rewrite, but the text it handles is
//! exactly the data the user wants kept private. Anything derived from user
//! text goes through `loggable` before it reaches a log line.

use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};

lazy_static! {
    /// Read once: whether raw user text may appear in debug logs.
    static ref PII_DEBUG_ALLOWED: bool = {
        std::env::var("PII_SANITIZER_ALLOW_DEBUG_PII")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };
}

/// How often one rule matched during a single pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleHit {
    pub rule_id: String,
    pub occurrences: usize,
}

/// Records `count` more matches for `rule_id`, keeping first-seen order.
pub(crate) fn record_hits(hits: &mut Vec<RuleHit>, rule_id: &str, count: usize) {
    if count == 0 {
        return;
    }
    match hits.iter_mut().find(|h| h.rule_id == rule_id) {
        Some(hit) => hit.occurrences += count,
        None => hits.push(RuleHit { rule_id: rule_id.to_string(), occurrences: count }),
    }
}

pub fn redact_sensitive(s: &str) -> String {
    const MAX_LEN: usize = 8;
    let len = s.chars().count();
    if len <= MAX_LEN {
        "[REDACTED]".to_string()
    } else {
        format!("[REDACTED: {} chars]", len)
    }
}

/// The form of `text` that is safe to put in a log line.
pub fn loggable(text: &str) -> String {
    if *PII_DEBUG_ALLOWED {
        text.to_string()
    } else {
        redact_sensitive(text)
    }
}

pub fn log_rule_applied_debug(rule_id: &str, occurrences: usize, line_before: &str, line_after: &str) {
    debug!(
        "Rule '{}' replaced {} match(es): '{}' -> '{}'",
        rule_id,
        occurrences,
        loggable(line_before),
        loggable(line_after)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_sensitive_short_string() {
        assert_eq!(redact_sensitive("abc"), "[REDACTED]".to_string());
    }

    #[test]
    fn test_redact_sensitive_counts_chars() {
        assert_eq!(redact_sensitive("ééééééééé"), "[REDACTED: 9 chars]".to_string());
    }

    #[test]
    fn test_record_hits_accumulates_per_rule() {
        let mut hits = Vec::new();
        record_hits(&mut hits, "email", 1);
        record_hits(&mut hits, "ssn", 0);
        record_hits(&mut hits, "email", 2);
        assert_eq!(hits, vec![RuleHit { rule_id: "email".into(), occurrences: 3 }]);
    }
}
