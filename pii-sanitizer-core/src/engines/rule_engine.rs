// pii-sanitizer-core/src/engines/rule_engine.rs
//! A `SanitizationEngine` that applies the ordered rule list line by line.
//!
//! The input is split into content and newline segments; rules only ever
//! see content segments, so a rewrite can never merge or split lines.
//! Literal rules additionally record where the caret should be anchored.
//! License: MIT OR APACHE 2.0

use log::debug;
use std::sync::Arc;

use crate::config::SanitizationRule;
use crate::cursor::char_len;
use crate::engine::{RuleApplication, SanitizationEngine};
use crate::redaction_match::{log_rule_applied_debug, record_hits};
use crate::sanitizers::compiler::{get_or_compile_rules, CompiledRule, CompiledRules};
use crate::sanitizers::pattern::MatchSpans;

/// A piece of the input: either line content or the line break after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Content(&'a str),
    /// `\n`, `\r\n` or a lone `\r`, kept verbatim.
    Newline(&'a str),
}

/// Splits `text` into alternating content and newline segments.
///
/// There is always one more content segment than newline segments; content
/// segments may be empty.
pub fn split_lines(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '\n' && c != '\r' {
            continue;
        }
        segments.push(Segment::Content(&text[start..i]));
        let mut end = i + 1;
        if c == '\r' {
            if let Some(&(_, '\n')) = chars.peek() {
                chars.next();
                end += 1;
            }
        }
        segments.push(Segment::Newline(&text[i..end]));
        start = end;
    }
    segments.push(Segment::Content(&text[start..]));
    segments
}

/// Number of logical lines in `text`.
pub fn count_lines(text: &str) -> usize {
    split_lines(text)
        .iter()
        .filter(|s| matches!(s, Segment::Newline(_)))
        .count()
        + 1
}

#[derive(Debug, Clone)]
pub struct RuleEngine {
    compiled_rules: Arc<CompiledRules>,
}

impl RuleEngine {
    pub fn new(rules: &[SanitizationRule]) -> Self {
        Self::from_compiled(get_or_compile_rules(rules))
    }

    pub fn from_compiled(compiled_rules: Arc<CompiledRules>) -> Self {
        Self { compiled_rules }
    }

    /// Returns the latest anchor of a literal rule whose match starts at or
    /// before `caret`. `line_offset` is the position of the line in the
    /// original text.
    fn literal_anchor(
        rule: &CompiledRule,
        line: &str,
        matches: &[MatchSpans],
        line_offset: usize,
        caret: usize,
    ) -> Option<usize> {
        let mut anchor = None;
        let mut scanned_bytes = 0;
        let mut scanned_chars = 0;
        for start in matches.iter().filter_map(|spans| spans.first().cloned().flatten()).map(|r| r.start) {
            scanned_chars += char_len(&line[scanned_bytes..start]);
            scanned_bytes = start;
            let global_start = line_offset + scanned_chars;
            if global_start <= caret {
                anchor = Some(global_start + rule.replacement_len());
            }
        }
        anchor
    }
}

impl SanitizationEngine for RuleEngine {
    fn apply_rules(&self, text: &str, cursor: Option<usize>, is_paste: bool) -> RuleApplication {
        let caret = if is_paste { None } else { cursor };
        let mut output = String::with_capacity(text.len());
        let mut last_replacement_end = None;
        let mut hits = Vec::new();
        let mut consumed = 0usize;

        for segment in split_lines(text) {
            let line = match segment {
                Segment::Newline(newline) => {
                    output.push_str(newline);
                    consumed += char_len(newline);
                    continue;
                }
                Segment::Content(line) => line,
            };

            let mut processed = line.to_string();
            for rule in &self.compiled_rules.rules {
                let matches = rule.pattern.match_spans(&processed);
                let occurrences = matches.len();
                if occurrences == 0 {
                    continue;
                }

                if rule.literal {
                    if let Some(caret) = caret {
                        if let Some(anchor) = Self::literal_anchor(rule, &processed, &matches, consumed, caret) {
                            last_replacement_end = Some(anchor);
                        }
                    }
                }
                let replaced = rule.template.apply(&processed, &matches);

                log_rule_applied_debug(&rule.id, occurrences, &processed, &replaced);
                record_hits(&mut hits, &rule.id, occurrences);
                processed = replaced;
            }

            output.push_str(&processed);
            consumed += char_len(line);
        }

        debug!(
            "Rule pass complete: {} rule(s) matched, anchor = {:?}.",
            hits.len(),
            last_replacement_end
        );
        RuleApplication { text: output, last_replacement_end, hits }
    }

    fn compiled_rules(&self) -> &CompiledRules {
        &self.compiled_rules
    }
}
