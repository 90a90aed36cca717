//! Handles all user-facing output for the CLI.
//!
//! Colored diffs, diagnostic rendering (miette or JSON), and the assertion
//! table. Color is only used when the stream is a terminal.

use std::io::{self, Write};

use difference::{Changeset, Difference};
use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::errors::{print_error, RetrofitError, Severity};
use crate::rewrite::{AssertionFamily, AssertionKind, AssertionRegistry};

// ============================================================================
// COLOR
// ============================================================================

pub fn stdout_color_choice() -> ColorChoice {
    if std::env::var_os("NO_COLOR").is_none() && atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

// ============================================================================
// DIFFS
// ============================================================================

/// Prints a unified-style line diff between `before` and `after` under a
/// header naming `path`.
pub fn print_diff(path: &str, before: &str, after: &str) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(stdout_color_choice());
    write_diff(&mut stdout, path, before, after)
}

pub fn write_diff<W: WriteColor>(out: &mut W, path: &str, before: &str, after: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    writeln!(out, "--- {path}")?;
    writeln!(out, "+++ {path}")?;
    out.reset()?;

    let changeset = Changeset::new(before, after, "\n");
    for diff in &changeset.diffs {
        let (marker, color, text) = match diff {
            Difference::Same(x) => (' ', None, x),
            Difference::Add(x) => ('+', Some(Color::Green), x),
            Difference::Rem(x) => ('-', Some(Color::Red), x),
        };
        out.set_color(ColorSpec::new().set_fg(color))?;
        for line in text.split('\n') {
            writeln!(out, "{marker}{line}")?;
        }
    }
    out.reset()
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// One diagnostic in `check --json` output.
#[derive(Debug, Serialize)]
pub struct DiagnosticRecord {
    pub file: String,
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl From<&RetrofitError> for DiagnosticRecord {
    fn from(error: &RetrofitError) -> Self {
        Self {
            file: error.source_name().to_string(),
            code: error.diagnostic_info.error_code.clone(),
            severity: error.diagnostic_info.severity,
            message: error.kind.to_string(),
            offset: error.offset(),
            help: error.diagnostic_info.help.clone(),
        }
    }
}

/// Per-run totals shown after `check`.
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CheckSummary {
    pub files: usize,
    pub rewritable: usize,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    summary: CheckSummary,
    diagnostics: &'a [DiagnosticRecord],
}

pub fn print_diagnostics(diagnostics: &[RetrofitError]) {
    for diagnostic in diagnostics {
        print_error(diagnostic);
    }
}

pub fn print_check_json(summary: CheckSummary, diagnostics: &[RetrofitError]) -> io::Result<()> {
    let records: Vec<DiagnosticRecord> = diagnostics.iter().map(DiagnosticRecord::from).collect();
    let report = CheckReport {
        summary,
        diagnostics: &records,
    };
    let json = serde_json::to_string_pretty(&report).map_err(io::Error::other)?;
    println!("{json}");
    Ok(())
}

pub fn print_check_summary(summary: CheckSummary) {
    eprintln!(
        "{} file(s) checked: {} call site(s) to rewrite, {} error(s), {} warning(s)",
        summary.files, summary.rewritable, summary.errors, summary.warnings
    );
}

// ============================================================================
// ASSERTION TABLE
// ============================================================================

#[derive(Debug, Serialize)]
pub struct AssertionEntry<'a> {
    pub name: &'a str,
    pub kind: AssertionKind,
    pub family: AssertionFamily,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_label: Option<&'static str>,
    pub target: &'static str,
}

pub fn assertion_entries(registry: &AssertionRegistry) -> Vec<AssertionEntry<'_>> {
    registry
        .rules()
        .map(|rule| AssertionEntry {
            name: &rule.name,
            kind: rule.rule.kind,
            family: rule.rule.kind.family(),
            requires_label: rule.rule.discriminating_label,
            target: rule.rule.kind.target_form(),
        })
        .collect()
}

pub fn print_assertions(registry: &AssertionRegistry, json: bool) -> io::Result<()> {
    let entries = assertion_entries(registry);
    if json {
        let json = serde_json::to_string_pretty(&entries).map_err(io::Error::other)?;
        println!("{json}");
        return Ok(());
    }

    let width = entries
        .iter()
        .map(|entry| display_name(entry).len())
        .max()
        .unwrap_or(0);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for entry in &entries {
        writeln!(out, "{:<width$}  {}", display_name(entry), entry.target)?;
    }
    Ok(())
}

fn display_name(entry: &AssertionEntry) -> String {
    match entry.requires_label {
        Some(label) => format!("{}(..., {label}:)", entry.name),
        None => entry.name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termcolor::NoColor;

    #[test]
    fn test_diff_marks_changed_lines() {
        let mut out = NoColor::new(Vec::new());
        write_diff(&mut out, "a.swift", "one\n#XCTFail()\nthree", "one\nIssue.record()\nthree").unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.starts_with("--- a.swift\n+++ a.swift\n"));
        assert!(text.contains("-#XCTFail()\n"));
        assert!(text.contains("+Issue.record()\n"));
        assert!(text.contains(" one\n"));
    }

    #[test]
    fn test_entries_cover_both_equal_rules() {
        let registry = AssertionRegistry::standard().unwrap();
        let entries = assertion_entries(&registry);
        assert_eq!(entries.len(), 19);
        let equal: Vec<_> = entries.iter().filter(|e| e.name == "XCTAssertEqual").collect();
        assert_eq!(equal.len(), 2);
        assert!(equal.iter().any(|e| e.requires_label == Some("accuracy")));
    }
}
