// pii-sanitizer/src/ui/summary.rs
//! Per-rule summary of a sanitization pass.

use owo_colors::OwoColorize;
use std::io::{self, Write};

use pii_sanitizer_core::RuleHit;

pub fn print_summary<W: Write>(hits: &[RuleHit], writer: &mut W, supports_color: bool) -> io::Result<()> {
    let header = "--- Sanitization Summary ---";
    if supports_color {
        writeln!(writer, "{}", header.yellow().bold())?;
    } else {
        writeln!(writer, "{}", header)?;
    }

    if hits.is_empty() {
        writeln!(writer, "No rules matched.")?;
        return Ok(());
    }
    for hit in hits {
        if supports_color {
            writeln!(writer, "{} ({} occurrences)", hit.rule_id.magenta(), hit.occurrences.cyan())?;
        } else {
            writeln!(writer, "{} ({} occurrences)", hit.rule_id, hit.occurrences)?;
        }
    }
    Ok(())
}
