//! Defines the command-line arguments and subcommands for the Retrofit CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "retrofit",
    version,
    about = "Rewrites legacy XCTest assertions into expectation macros."
)]
pub struct RetrofitArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// YAML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the rewritten source, or rewrite files in place.
    Expand {
        /// A source file or a directory to walk.
        #[arg(required = true)]
        path: PathBuf,
        /// Overwrite each file that changes instead of printing it.
        #[arg(long)]
        write: bool,
    },
    /// Show a line diff of what a rewrite would change.
    Diff {
        /// A source file or a directory to walk.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Report diagnostics without changing anything.
    Check {
        /// A source file or a directory to walk.
        #[arg(required = true)]
        path: PathBuf,
        /// Emit diagnostics as JSON on stdout.
        #[arg(long)]
        json: bool,
    },
    /// List the supported assertions and their target forms.
    List {
        /// Emit the table as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = RetrofitArgs::try_parse_from([
            "retrofit",
            "check",
            "Tests",
            "--json",
            "-vv",
            "--log-format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(matches!(args.command, Command::Check { json: true, .. }));
    }

    #[test]
    fn test_expand_requires_a_path() {
        assert!(RetrofitArgs::try_parse_from(["retrofit", "expand"]).is_err());
    }
}
