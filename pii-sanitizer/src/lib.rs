// pii-sanitizer/src/lib.rs
//! # PII Sanitizer CLI
//!
//! A headless front end for the `pii-sanitizer-core` engine. It runs the rule
//! engine and caret reconciliation over stdin or a file, validates rule
//! snapshots, and reports which hosts a snapshot activates monitoring on.

pub mod cli;
pub mod commands;
pub mod logger;
pub mod ui;
