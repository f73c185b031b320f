// pii-sanitizer-core/src/lib.rs
//! # PII Sanitizer Core Library
//!
//! `pii-sanitizer-core` is the text sanitization engine behind the PII
//! sanitizer: it watches the editable regions of an allow-listed page,
//! rewrites their content with an ordered list of find/replace rules as the
//! user types or pastes, and keeps the caret where the user expects it.
//!
//! The engine never touches a browser directly. The host page is reached
//! through the ports in [`dom`] and time through the [`scheduler`] port, so
//! the whole pipeline runs headless against [`memory::MemoryPage`] and a
//! [`VirtualClock`].
//!
//! ## Modules
//!
//! * `config`: `SanitizationRule`s, the settings snapshot and monitor tunables.
//! * `sanitizers`: Compiles rules into matchers, with a process-wide cache.
//! * `engine`: Defines the `SanitizationEngine` trait and its result types.
//! * `engines`: The line-preserving `RuleEngine`.
//! * `cursor`: Caret reconciliation after a rewrite.
//! * `redaction_match`: Per-rule hit reporting and PII-safe logging helpers.
//! * `dom`: Ports to the host page and its elements.
//! * `editor`: Editor-variant classification, extraction and injection.
//! * `scheduler`: Timer port and the deterministic `VirtualClock`.
//! * `discovery`: Debounced discovery of monitored surfaces.
//! * `state`: Settings, compiled engine and the re-entrancy guard.
//! * `monitor`: The composed event pipeline, `ContentMonitor`.
//! * `style`: The stylesheet marking monitored surfaces.
//! * `memory`: An in-memory page for tests and headless replays.
//!
//! ## Usage Example
//!
//! ```rust
//! use pii_sanitizer_core::{RuleEngine, SanitizationEngine, SanitizationRule};
//!
//! let engine = RuleEngine::new(&[SanitizationRule::regex(
//!     "ssn",
//!     r"\b\d{3}-\d{2}-\d{4}\b",
//!     "[SSN]",
//! )]);
//! let result = engine.sanitize("My SSN is 123-45-6789", Some(21), false);
//! assert_eq!(result.text, "My SSN is [SSN]");
//! assert_eq!(result.cursor_position, Some(15));
//! ```
//!
//! ## Error Handling
//!
//! Loading and validating settings returns `anyhow::Error` with context.
//! Rule compilation and caret placement failures are typed as
//! [`SanitizerError`]; the engine logs and skips them rather than aborting a
//! rewrite.
//!
//! ---
//! License: MIT OR Apache-2.0

pub mod config;
pub mod cursor;
pub mod discovery;
pub mod dom;
pub mod editor;
pub mod engine;
pub mod engines;
pub mod errors;
pub mod memory;
pub mod monitor;
pub mod redaction_match;
pub mod sanitizers;
pub mod scheduler;
pub mod state;
pub mod style;

/// Re-exports the settings types and rule validation.
pub use config::{
    validate_allow_list,
    validate_rules,
    MonitorConfig,
    SanitizationRule,
    SettingsChange,
    SettingsSnapshot,
    Website,
    MAX_PATTERN_LENGTH,
};

pub use errors::SanitizerError;

/// Re-exports the engine trait and its concrete implementation.
pub use engine::{RuleApplication, SanitizationEngine, TransformResult};
pub use engines::rule_engine::RuleEngine;

pub use cursor::reconcile;
pub use redaction_match::{redact_sensitive, RuleHit};
pub use sanitizers::compiler::{compile_rules, CompiledRule, CompiledRules};
pub use sanitizers::pattern::{Pattern, Replacement};

/// Re-exports the event pipeline and its ports.
pub use dom::{EditableElement, ElementDescriptor, ElementTag, MutationRecord, Page, SurfaceId};
pub use editor::EditorKind;
pub use memory::{MemoryElement, MemoryPage};
pub use monitor::ContentMonitor;
pub use scheduler::{Scheduler, Task, VirtualClock};
pub use state::EngineState;
