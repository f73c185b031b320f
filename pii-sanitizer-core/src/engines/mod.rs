// pii-sanitizer-core/src/engines/mod.rs
//! Concrete implementations of the `SanitizationEngine` trait.
//!
//! `rule_engine` applies the user's ordered rule list line by line.

pub mod rule_engine;
