//! The Retrofit Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::Parser;

use crate::cli::args::{Command, RetrofitArgs};
use crate::config::RetrofitConfig;
use crate::discovery::discover_sources;
use crate::engine::{RewriteOutcome, SourceRewriter};
use crate::errors::{io_error, print_error, RetrofitError, SourceContext};
use crate::logging::{init_logging, LogLevel};

pub mod args;
pub mod output;

use output::CheckSummary;

/// The main entry point for the CLI.
pub fn run() {
    let args = RetrofitArgs::parse();
    init_logging(LogLevel::from_verbosity(args.verbose), args.log_format);

    match dispatch(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            print_error(&e);
            process::exit(2);
        }
    }
}

/// Runs one command and returns the process exit code.
pub fn dispatch(args: RetrofitArgs) -> Result<i32, RetrofitError> {
    let config = match &args.config {
        Some(path) => RetrofitConfig::load(path)?,
        None => RetrofitConfig::default(),
    };
    let rewriter = SourceRewriter::new(&config)?;

    match args.command {
        Command::Expand { path, write } => handle_expand(&rewriter, &config, &path, write),
        Command::Diff { path } => handle_diff(&rewriter, &config, &path),
        Command::Check { path, json } => handle_check(&rewriter, &config, &path, json),
        Command::List { json } => {
            output::print_assertions(rewriter.registry(), json).map_err(|e| stdout_error(&e))?;
            Ok(0)
        }
    }
}

// ============================================================================
// COMMAND HANDLERS
// ============================================================================

fn handle_expand(
    rewriter: &SourceRewriter,
    config: &RetrofitConfig,
    path: &Path,
    write: bool,
) -> Result<i32, RetrofitError> {
    let files = discover_sources(path, &config.extensions)?;
    let banners = files.len() > 1 && !write;

    for file in &files {
        let (source, outcome) = rewrite_file(rewriter, file)?;
        output::print_diagnostics(&outcome.diagnostics);

        if write {
            if outcome.output != source.content {
                fs::write(file, &outcome.output).map_err(|e| io_error(file, &e))?;
                tracing::info!(file = %file.display(), rewritten = outcome.rewritten, "rewrote file");
            }
            continue;
        }

        if banners {
            println!("// ==> {} <==", file.display());
        }
        print!("{}", outcome.output);
    }
    Ok(0)
}

fn handle_diff(
    rewriter: &SourceRewriter,
    config: &RetrofitConfig,
    path: &Path,
) -> Result<i32, RetrofitError> {
    for file in discover_sources(path, &config.extensions)? {
        let (source, outcome) = rewrite_file(rewriter, &file)?;
        output::print_diagnostics(&outcome.diagnostics);
        if outcome.output == source.content {
            continue;
        }
        output::print_diff(&source.name, &source.content, &outcome.output)
            .map_err(|e| stdout_error(&e))?;
    }
    Ok(0)
}

fn handle_check(
    rewriter: &SourceRewriter,
    config: &RetrofitConfig,
    path: &Path,
    json: bool,
) -> Result<i32, RetrofitError> {
    let mut summary = CheckSummary::default();
    let mut diagnostics = Vec::new();

    for file in discover_sources(path, &config.extensions)? {
        let (_, outcome) = rewrite_file(rewriter, &file)?;
        summary.files += 1;
        summary.rewritable += outcome.rewritten;
        summary.errors += outcome.errors().count();
        summary.warnings += outcome.warnings().count();
        diagnostics.extend(outcome.diagnostics);
    }

    if json {
        output::print_check_json(summary, &diagnostics).map_err(|e| stdout_error(&e))?;
    } else {
        output::print_diagnostics(&diagnostics);
        output::print_check_summary(summary);
    }
    Ok(if summary.errors > 0 { 1 } else { 0 })
}

// ============================================================================
// HELPERS
// ============================================================================

fn rewrite_file(
    rewriter: &SourceRewriter,
    path: &Path,
) -> Result<(SourceContext, RewriteOutcome), RetrofitError> {
    let content = fs::read_to_string(path).map_err(|e| io_error(path, &e))?;
    let source = SourceContext::from_file(path.display().to_string(), content);
    let outcome = rewriter.rewrite(&source);
    Ok((source, outcome))
}

fn stdout_error(error: &std::io::Error) -> RetrofitError {
    io_error(&PathBuf::from("<stdout>"), error)
}
