// pii-sanitizer/src/commands/sanitize.rs
//! `sanitize`: runs the rule engine and caret reconciliation over text.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::fs;
use std::io::{self, Read, Write};

use pii_sanitizer_core::redaction_match::loggable;
use pii_sanitizer_core::{RuleEngine, SanitizationEngine, TransformResult};

use crate::cli::SanitizeCommand;
use crate::commands::load_snapshot;
use crate::ui::{diff_viewer, output_format, summary};

/// Everything one sanitization run needs besides the engine.
#[derive(Debug, Clone, Default)]
pub struct SanitizeOptions {
    pub input: String,
    pub cursor: Option<usize>,
    pub paste: bool,
    pub diff: bool,
    pub json: bool,
    pub no_summary: bool,
    pub quiet: bool,
    /// Colour diagnostics written to stderr.
    pub color: bool,
}

pub fn run(cmd: &SanitizeCommand, quiet: bool) -> Result<()> {
    let snapshot = load_snapshot(cmd.rules.as_deref())?;
    let engine = RuleEngine::new(&snapshot.rules);
    for rejected in &engine.compiled_rules().rejected {
        output_format::print_warn_message(
            &mut io::stderr(),
            &format!("Skipping rule: {}", rejected),
            io::stderr().is_terminal(),
        )?;
    }

    let input = read_input(cmd)?;
    let opts = SanitizeOptions {
        input,
        cursor: cmd.cursor,
        paste: cmd.paste,
        diff: cmd.diff,
        json: cmd.json,
        no_summary: cmd.no_summary,
        quiet,
        color: io::stderr().is_terminal(),
    };
    let mut stdout = io::stdout().lock();
    run_sanitize_opts(&engine, &opts, &mut stdout, &mut io::stderr())?;
    Ok(())
}

fn read_input(cmd: &SanitizeCommand) -> Result<String> {
    match &cmd.input {
        Some(path) => {
            info!("Reading input from file: {}", path.display());
            fs::read_to_string(path).with_context(|| format!("Failed to read input file {}", path.display()))
        }
        None => {
            info!("Reading input from stdin...");
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

/// Sanitizes `opts.input`, writing the text to `out` and diagnostics to `err`.
pub fn run_sanitize_opts<W: Write, E: Write>(
    engine: &dyn SanitizationEngine,
    opts: &SanitizeOptions,
    out: &mut W,
    err: &mut E,
) -> Result<TransformResult> {
    info!("Starting sanitize operation.");
    let applied = engine.apply_rules(&opts.input, opts.cursor, opts.paste);
    let result = applied.to_result(&opts.input, opts.cursor, opts.paste);
    debug!(
        "Sanitized {} -> {}, cursor {:?} -> {:?}.",
        loggable(&opts.input),
        loggable(&result.text),
        opts.cursor,
        result.cursor_position
    );

    if opts.json {
        serde_json::to_writer(&mut *out, &result).context("Failed to serialize result")?;
        writeln!(out)?;
    } else {
        write!(out, "{}", result.text).context("Failed to write sanitized output")?;
    }
    out.flush()?;

    let color = opts.color;
    if opts.diff {
        diff_viewer::print_diff(&opts.input, &result.text, err, color)?;
    }
    if !opts.no_summary && !opts.quiet {
        if let Some(cursor) = result.cursor_position {
            output_format::print_info_message(err, &format!("Cursor position: {}", cursor), color)?;
        }
        summary::print_summary(&applied.hits, err, color)?;
    }

    info!("Sanitize operation completed.");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pii_sanitizer_core::SanitizationRule;

    fn engine() -> RuleEngine {
        RuleEngine::new(&[
            SanitizationRule::regex("ssn", r"\b\d{3}-\d{2}-\d{4}\b", "XXX-XX-XXXX"),
            SanitizationRule::literal("asd", "asd", "WEEEeeeEEEE"),
        ])
    }

    #[test]
    fn test_output_keeps_line_endings_verbatim() {
        let opts = SanitizeOptions { input: "a 123-45-6789\r\nb\n".into(), no_summary: true, ..Default::default() };
        let (mut out, mut err) = (Vec::new(), Vec::new());
        run_sanitize_opts(&engine(), &opts, &mut out, &mut err).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a XXX-XX-XXXX\r\nb\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_summary_reports_cursor_and_hits() {
        let opts = SanitizeOptions { input: "xasdy".into(), cursor: Some(4), ..Default::default() };
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let result = run_sanitize_opts(&engine(), &opts, &mut out, &mut err).unwrap();
        assert_eq!(result.cursor_position, Some(12));

        let err = String::from_utf8(err).unwrap();
        assert!(err.contains("Cursor position: 12"));
        assert!(err.contains("asd (1 occurrences)"));
    }

    #[test]
    fn test_json_output() {
        let opts = SanitizeOptions { input: "xasdy".into(), cursor: Some(4), json: true, quiet: true, ..Default::default() };
        let (mut out, mut err) = (Vec::new(), Vec::new());
        run_sanitize_opts(&engine(), &opts, &mut out, &mut err).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"text\":\"xWEEEeeeEEEEy\",\"cursorPosition\":12}\n"
        );
    }

    #[test]
    fn test_result_matches_engine_sanitize() {
        let engine = engine();
        for (input, cursor, paste) in [("xasdy", Some(4), false), ("asd tail", Some(0), true), ("", Some(0), false)] {
            let opts = SanitizeOptions { input: input.into(), cursor, paste, quiet: true, ..Default::default() };
            let (mut out, mut err) = (Vec::new(), Vec::new());
            let result = run_sanitize_opts(&engine, &opts, &mut out, &mut err).unwrap();
            assert_eq!(result, engine.sanitize(input, cursor, paste));
        }
    }

    #[test]
    fn test_quiet_suppresses_summary() {
        let opts = SanitizeOptions { input: "asd".into(), quiet: true, ..Default::default() };
        let (mut out, mut err) = (Vec::new(), Vec::new());
        run_sanitize_opts(&engine(), &opts, &mut out, &mut err).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "WEEEeeeEEEE");
        assert!(err.is_empty());
    }
}
