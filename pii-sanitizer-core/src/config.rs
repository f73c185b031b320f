//! Configuration management for `pii-sanitizer-core`.
//!
//! This module defines the settings snapshot the engine consumes from the
//! configuration collaborator: the ordered rule list, the website allow-list
//! and the global pause flag. The wire shape is shared with the settings
//! store, so field names follow its camelCase convention. It also provides
//! loading from JSON/YAML files, the embedded default snapshot, and rule
//! validation matching what the rule editor enforces.
//!
//! License: MIT OR Apache-2.0

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::errors::SanitizerError;
use crate::sanitizers::pattern::Pattern;

/// Maximum allowed length for a rule pattern string.
pub const MAX_PATTERN_LENGTH: usize = 500;

/// A single detection/replacement rule.
///
/// When `is_regex` is false the pattern is matched as a literal substring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SanitizationRule {
    /// Unique identifier for the rule.
    pub id: String,
    /// Human-readable description shown in the rule editor.
    pub description: String,
    /// Regex source, or literal text when `is_regex` is false.
    pub pattern: String,
    /// Text written in place of every match.
    pub replacement: String,
    pub enabled: bool,
    pub is_regex: bool,
}

impl Default for SanitizationRule {
    fn default() -> Self {
        Self {
            id: String::new(),
            description: String::new(),
            pattern: String::new(),
            replacement: String::new(),
            enabled: true,
            is_regex: true,
        }
    }
}

impl SanitizationRule {
    /// Convenience constructor for a literal (non-regex) rule.
    pub fn literal(id: &str, pattern: &str, replacement: &str) -> Self {
        Self {
            id: id.to_string(),
            description: format!("Literal '{}'", pattern),
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            enabled: true,
            is_regex: false,
        }
    }

    /// Convenience constructor for a regex rule.
    pub fn regex(id: &str, pattern: &str, replacement: &str) -> Self {
        Self {
            id: id.to_string(),
            description: format!("Pattern {}", id),
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            enabled: true,
            is_regex: true,
        }
    }
}

/// One allow-list entry. The stored form calls the hostname `url`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Website {
    #[serde(alias = "url")]
    pub hostname: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

/// The read-only snapshot of everything the engine consumes from settings.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsSnapshot {
    /// Rules in priority order.
    #[serde(alias = "sanitizations")]
    pub rules: Vec<SanitizationRule>,
    #[serde(alias = "websites")]
    pub allow_list: Vec<Website>,
    #[serde(alias = "isGloballyPaused")]
    pub paused: bool,
}

/// A change notification from the settings store.
///
/// Present fields replace the whole collection; absent fields are untouched.
#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsChange {
    #[serde(alias = "sanitizations")]
    pub rules: Option<Vec<SanitizationRule>>,
    #[serde(alias = "websites")]
    pub allow_list: Option<Vec<Website>>,
    #[serde(alias = "isGloballyPaused")]
    pub paused: Option<bool>,
}

impl SettingsChange {
    pub fn is_empty(&self) -> bool {
        self.rules.is_none() && self.allow_list.is_none() && self.paused.is_none()
    }

    /// Parses a change notification payload as delivered by the settings store.
    pub fn from_json(payload: &str) -> Result<Self, SanitizerError> {
        serde_json::from_str(payload).map_err(|e| SanitizerError::SerializationError(e.to_string()))
    }
}

impl From<SettingsSnapshot> for SettingsChange {
    fn from(snapshot: SettingsSnapshot) -> Self {
        Self {
            rules: Some(snapshot.rules),
            allow_list: Some(snapshot.allow_list),
            paused: Some(snapshot.paused),
        }
    }
}

impl SettingsSnapshot {
    /// Loads a snapshot from a JSON (`.json`) or YAML file and validates it.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let snapshot = Self::parse_file(path)?;
        snapshot.validate()?;
        info!(
            "Loaded {} rules and {} allow-list entries from {}.",
            snapshot.rules.len(),
            snapshot.allow_list.len(),
            path.display()
        );
        Ok(snapshot)
    }

    /// Reads a snapshot without validating it.
    ///
    /// Broken rules are left for the compiler to skip one by one, the way the
    /// engine treats a snapshot delivered by the settings store.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading settings snapshot from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        let snapshot: SettingsSnapshot = if is_json {
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse settings file {}", path.display()))?
        } else {
            serde_yml::from_str(&text)
                .with_context(|| format!("Failed to parse settings file {}", path.display()))?
        };

        debug!("Parsed {} rules from {}.", snapshot.rules.len(), path.display());
        Ok(snapshot)
    }

    /// Validates the rules and the allow-list, reporting every problem of both.
    pub fn validate(&self) -> Result<()> {
        let problems: Vec<String> = [validate_rules(&self.rules), validate_allow_list(&self.allow_list)]
            .into_iter()
            .filter_map(|r| r.err())
            .map(|e| e.to_string())
            .collect();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(anyhow!(problems.join("\n")))
        }
    }

    /// Loads the built-in snapshot embedded in the crate.
    pub fn load_default_rules() -> Result<Self> {
        debug!("Loading default rules from embedded string...");
        let default_yaml = include_str!("../config/default_rules.yaml");
        let snapshot: SettingsSnapshot =
            serde_yml::from_str(default_yaml).context("Failed to parse default rules")?;

        debug!("Loaded {} default rules.", snapshot.rules.len());
        Ok(snapshot)
    }

    /// Applies a change notification in place.
    pub fn apply(&mut self, change: SettingsChange) {
        if let Some(rules) = change.rules {
            debug!("Settings change: replacing {} rules with {}.", self.rules.len(), rules.len());
            self.rules = rules;
        }
        if let Some(allow_list) = change.allow_list {
            debug!("Settings change: allow-list now has {} entries.", allow_list.len());
            self.allow_list = allow_list;
        }
        if let Some(paused) = change.paused {
            debug!("Settings change: paused = {}.", paused);
            self.paused = paused;
        }
    }

    /// True when an enabled allow-list entry is contained in `hostname`.
    pub fn allows_host(&self, hostname: &str) -> bool {
        self.allow_list
            .iter()
            .any(|site| site.enabled && !site.hostname.is_empty() && hostname.contains(&site.hostname))
    }
}

/// Timing and marker settings for the content monitor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    /// Quiet period after the last structural change before a rescan fires.
    pub debounce_ms: u64,
    /// Interval of the fallback rescan that covers missed notifications.
    pub fallback_rescan_ms: u64,
    /// Class added to every monitored element.
    pub monitored_class: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            fallback_rescan_ms: 2000,
            monitored_class: "pii-monitored".to_string(),
        }
    }
}

impl MonitorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn fallback_rescan(&self) -> Duration {
        Duration::from_millis(self.fallback_rescan_ms)
    }
}

/// Validates rule integrity the same way the rule editor does.
///
/// Every problem is collected and reported in one error.
pub fn validate_rules(rules: &[SanitizationRule]) -> Result<()> {
    let mut ids = HashSet::new();
    let mut descriptions = HashSet::new();
    let mut patterns = HashSet::new();
    let mut errors = Vec::new();

    for rule in rules {
        if rule.id.is_empty() {
            errors.push("A rule has an empty `id` field.".to_string());
        } else if !ids.insert(rule.id.as_str()) {
            errors.push(format!("Duplicate rule id found: '{}'.", rule.id));
        }

        if rule.description.trim().is_empty() {
            errors.push(format!("Rule '{}' has an empty `description` field.", rule.id));
        } else if !descriptions.insert(rule.description.to_lowercase()) {
            errors.push(format!(
                "Rule '{}': a rule with the description '{}' already exists.",
                rule.id, rule.description
            ));
        }

        if rule.pattern.is_empty() {
            errors.push(format!("Rule '{}' has an empty `pattern` field.", rule.id));
            continue;
        }
        if !patterns.insert(rule.pattern.as_str()) {
            errors.push(format!("Rule '{}': this pattern already exists.", rule.id));
        }

        if rule.pattern.len() > MAX_PATTERN_LENGTH {
            errors.push(format!(
                "Rule '{}': pattern length ({}) exceeds maximum allowed ({}).",
                rule.id,
                rule.pattern.len(),
                MAX_PATTERN_LENGTH
            ));
        }

        if rule.replacement.contains(['\n', '\r']) {
            errors.push(format!("Rule '{}': replacement may not contain line breaks.", rule.id));
        }

        if rule.is_regex {
            if let Err(e) = Pattern::new(&rule.pattern) {
                errors.push(format!("Rule '{}' has an invalid regex pattern: {}", rule.id, e));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Rule validation failed:\n{}", errors.join("\n")))
    }
}

/// True for a hostname the website editor would accept: at least two
/// dot-separated labels of 1 to 63 alphanumerics, with inner hyphens only.
pub fn is_valid_hostname(hostname: &str) -> bool {
    let labels: Vec<&str> = hostname.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            let bytes = label.as_bytes();
            !bytes.is_empty()
                && bytes.len() <= 63
                && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
                && bytes[0] != b'-'
                && bytes[bytes.len() - 1] != b'-'
        })
}

/// Validates allow-list entries the same way the website editor does.
pub fn validate_allow_list(sites: &[Website]) -> Result<()> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for site in sites {
        if !is_valid_hostname(&site.hostname) {
            errors.push(format!("Allow-list entry '{}' is not a valid hostname.", site.hostname));
        } else if !seen.insert(site.hostname.as_str()) {
            errors.push(format!("Allow-list entry '{}' is already in the list.", site.hostname));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Allow-list validation failed:\n{}", errors.join("\n")))
    }
}
