//! compiler.rs - Manages the compilation and caching of sanitization rules.
//!
//! Converts a rule snapshot into `CompiledRules`, ready for application.
//! Unlike a batch redaction run, a broken rule here never fails the whole
//! set: it is moved to `rejected`, logged, and the remaining rules still
//! compile. A global cache keyed by the snapshot's hash avoids recompiling
//! on every settings notification.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::{debug, warn};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

use crate::config::{SanitizationRule, MAX_PATTERN_LENGTH};
use crate::errors::SanitizerError;
use crate::sanitizers::pattern::{Pattern, Replacement};

/// Upper bound on distinct snapshots kept in the cache.
const CACHE_CAPACITY: usize = 32;

/// A single compiled, enabled rule.
#[derive(Debug)]
pub struct CompiledRule {
    /// The compiled expression; literal rules hold their escaped pattern.
    pub pattern: Pattern,
    /// The replacement as written in the rule.
    pub replacement: String,
    /// Parsed replacement; literal rules never expand `$` tokens.
    pub template: Replacement,
    pub id: String,
    /// True for literal rules, which also drive caret anchoring.
    pub literal: bool,
}

impl CompiledRule {
    /// Length of the replacement in characters.
    pub fn replacement_len(&self) -> usize {
        self.replacement.chars().count()
    }
}

/// The ordered set of compiled rules plus the rules that failed to compile.
#[derive(Debug, Default)]
pub struct CompiledRules {
    /// Enabled rules in snapshot order.
    pub rules: Vec<CompiledRule>,
    /// Rules skipped because they could not be compiled.
    pub rejected: Vec<SanitizerError>,
}

impl CompiledRules {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

lazy_static! {
    /// Global cache of compiled rule sets, keyed by a hash of the rule snapshot.
    static ref COMPILED_RULES_CACHE: RwLock<HashMap<u64, Arc<CompiledRules>>> = RwLock::new(HashMap::new());
}

/// Hashes the rule snapshot. Order matters, so the rules are hashed as given.
fn hash_rules(rules: &[SanitizationRule]) -> u64 {
    let mut hasher = DefaultHasher::new();
    rules.hash(&mut hasher);
    hasher.finish()
}

/// Compiles one rule. Literal patterns are escaped before compilation.
pub fn compile_rule(rule: &SanitizationRule) -> Result<CompiledRule, SanitizerError> {
    if rule.pattern.len() > MAX_PATTERN_LENGTH {
        return Err(SanitizerError::PatternLengthExceeded(
            rule.id.clone(),
            rule.pattern.len(),
            MAX_PATTERN_LENGTH,
        ));
    }
    // Lines are processed one at a time; a line break in the replacement
    // would change the line count.
    if rule.replacement.contains(['\n', '\r']) {
        return Err(SanitizerError::MultilineReplacement(rule.id.clone()));
    }

    let pattern = if rule.is_regex {
        Pattern::new(&rule.pattern)
    } else {
        Pattern::literal(&rule.pattern)
    }
    .map_err(|e| SanitizerError::RuleCompilationError(rule.id.clone(), e))?;
    if pattern.is_fancy() {
        debug!("Rule '{}' compiled with look-around support.", rule.id);
    }

    let template = if rule.is_regex {
        Replacement::parse(&rule.replacement, &pattern)
    } else {
        Replacement::verbatim(&rule.replacement)
    };

    Ok(CompiledRule {
        pattern,
        replacement: rule.replacement.clone(),
        template,
        id: rule.id.clone(),
        literal: !rule.is_regex,
    })
}

/// Compiles the enabled rules of a snapshot, preserving their order.
pub fn compile_rules(rules: &[SanitizationRule]) -> CompiledRules {
    debug!("Starting compilation of {} rules.", rules.len());

    let mut compiled = CompiledRules::default();
    for rule in rules.iter().filter(|r| r.enabled) {
        if rule.pattern.is_empty() {
            warn!("Skipping rule '{}' because its pattern is empty.", rule.id);
            continue;
        }
        match compile_rule(rule) {
            Ok(c) => {
                debug!(target: "pii_sanitizer_core::sanitizer", "Rule '{}' compiled successfully.", rule.id);
                compiled.rules.push(c);
            }
            Err(e) => {
                warn!("Skipping rule: {}", e);
                compiled.rejected.push(e);
            }
        }
    }

    debug!(
        "Finished compiling rules. Compiled: {}, rejected: {}.",
        compiled.rules.len(),
        compiled.rejected.len()
    );
    compiled
}

/// Gets compiled rules from the cache, compiling them if not found.
pub fn get_or_compile_rules(rules: &[SanitizationRule]) -> Arc<CompiledRules> {
    let cache_key = hash_rules(rules);

    if let Ok(cache) = COMPILED_RULES_CACHE.read() {
        if let Some(hit) = cache.get(&cache_key) {
            debug!("Serving compiled rules from cache for key: {}", cache_key);
            return Arc::clone(hit);
        }
    }

    let compiled = Arc::new(compile_rules(rules));

    if let Ok(mut cache) = COMPILED_RULES_CACHE.write() {
        if cache.len() >= CACHE_CAPACITY {
            debug!("Compiled rules cache is full; clearing {} entries.", cache.len());
            cache.clear();
        }
        cache.insert(cache_key, Arc::clone(&compiled));
    }
    compiled
}
