// pii-sanitizer/src/ui/mod.rs
//! Terminal output helpers. Everything here writes to a caller-supplied
//! writer and only colours output when asked to.

pub mod diff_viewer;
pub mod output_format;
pub mod summary;
