//! errors.rs - Custom error types for the pii-sanitizer-core library.
//!
//! Most failures inside the engine are contained: a broken rule is skipped,
//! a failed caret placement falls back to end-of-content. These variants are
//! what gets logged (or, on the loading paths, returned) when that happens.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// All error types produced by the `pii-sanitizer-core` library.
///
/// New variants may be added as more editor variants are supported, hence
/// `#[non_exhaustive]`.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SanitizerError {
    #[error("Failed to compile sanitization rule '{0}': {1}")]
    RuleCompilationError(String, fancy_regex::Error),

    #[error("Rule '{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Rule '{0}': replacement text may not contain line breaks")]
    MultilineReplacement(String),

    #[error("Failed to place the caret: {0}")]
    CaretPlacement(String),

    #[error("Could not extract text from surface: {0}")]
    Extraction(String),

    #[error("Malformed settings payload: {0}")]
    SerializationError(String),
}

impl SanitizerError {
    /// The id of the rule this error belongs to, for rule-scoped errors.
    pub fn rule_id(&self) -> Option<&str> {
        match self {
            SanitizerError::RuleCompilationError(id, _)
            | SanitizerError::PatternLengthExceeded(id, _, _)
            | SanitizerError::MultilineReplacement(id) => Some(id),
            _ => None,
        }
    }
}
