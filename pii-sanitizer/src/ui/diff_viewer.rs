// pii-sanitizer/src/ui/diff_viewer.rs
//! Unified diff of a rewrite: removed lines in red, added lines in green.

use diffy::{create_patch, Line as DiffLine};
use owo_colors::OwoColorize;
use std::io::{self, Write};

pub fn print_diff<W: Write>(original: &str, sanitized: &str, writer: &mut W, supports_color: bool) -> io::Result<()> {
    let header = "--- Diff View ---";
    if supports_color {
        writeln!(writer, "{}", header.yellow().bold())?;
    } else {
        writeln!(writer, "{}", header)?;
    }

    let patch = create_patch(original, sanitized);
    if patch.hunks().is_empty() {
        writeln!(writer, "No changes.")?;
    }
    for hunk in patch.hunks() {
        for line in hunk.lines() {
            match line {
                DiffLine::Delete(s) => {
                    let s = s.trim_end_matches(['\n', '\r']);
                    if supports_color {
                        writeln!(writer, "{}", format!("-{}", s).red())?;
                    } else {
                        writeln!(writer, "-{}", s)?;
                    }
                }
                DiffLine::Insert(s) => {
                    let s = s.trim_end_matches(['\n', '\r']);
                    if supports_color {
                        writeln!(writer, "{}", format!("+{}", s).green())?;
                    } else {
                        writeln!(writer, "+{}", s)?;
                    }
                }
                DiffLine::Context(s) => writeln!(writer, " {}", s.trim_end_matches(['\n', '\r']))?,
            }
        }
    }
    Ok(())
}
