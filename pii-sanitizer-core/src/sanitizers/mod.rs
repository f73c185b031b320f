//! Rule compilation for the sanitization engine.
//!
//! Turns a settings snapshot's rule list into compiled expressions, keeping
//! the snapshot order and isolating rules that fail to compile.

pub mod compiler;
pub mod pattern;
