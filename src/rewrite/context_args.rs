//! Optional trailing context of an assertion call: the message and the
//! source location, given either as `file:`/`line:` or as `sourceLocation:`.

use crate::ast::{Argument, Expr, Span};
use crate::errors::ErrorKind;

pub const FILE_LABEL: &str = "file";
pub const LINE_LABEL: &str = "line";
pub const SOURCE_LOCATION_LABEL: &str = "sourceLocation";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextArguments {
    pub message: Option<Expr>,
    pub file: Option<Expr>,
    pub line: Option<Expr>,
    pub source_location: Option<Expr>,
}

impl ContextArguments {
    /// Returns `None` only when `arguments` is shorter than `mandatory`.
    ///
    /// The message is the first unlabeled, non-closure argument after the
    /// operands. `file:` and `line:` are searched across the whole list with
    /// the first occurrence winning; `sourceLocation:` with the last winning.
    pub fn extract(arguments: &[Argument], mandatory: usize) -> Option<Self> {
        let rest = arguments.get(mandatory..)?;

        let message = rest
            .iter()
            .find(|arg| arg.label.is_none() && !arg.expr().is_closure())
            .map(|arg| arg.expr().clone());

        let first_labeled = |label: &str| {
            arguments
                .iter()
                .find(|arg| arg.has_label(label))
                .map(|arg| arg.expr().clone())
        };

        Some(Self {
            message,
            file: first_labeled(FILE_LABEL),
            line: first_labeled(LINE_LABEL),
            source_location: arguments
                .iter()
                .rev()
                .find(|arg| arg.has_label(SOURCE_LOCATION_LABEL))
                .map(|arg| arg.expr().clone()),
        })
    }

    /// The `sourceLocation:` argument for the rewritten call, if any location
    /// was given. An explicit `sourceLocation:` is passed through unchanged.
    pub fn source_location_argument(&self) -> Option<Argument> {
        if let Some(location) = &self.source_location {
            return Some(Argument::labeled(SOURCE_LOCATION_LABEL, location.clone()));
        }

        let mut parts = Vec::new();
        if let Some(file) = &self.file {
            parts.push(Argument::labeled(FILE_LABEL, file.clone()));
        }
        if let Some(line) = &self.line {
            parts.push(Argument::labeled(LINE_LABEL, line.clone()));
        }
        if parts.is_empty() {
            return None;
        }
        Some(Argument::labeled(
            SOURCE_LOCATION_LABEL,
            Expr::call(Expr::ident("SourceLocation"), parts),
        ))
    }

    /// `[message?, sourceLocation: ...?]`, in the order the target dialect
    /// expects them after the condition.
    pub fn to_arguments(&self) -> Vec<Argument> {
        self.message
            .iter()
            .map(|message| Argument::unlabeled(message.clone()))
            .chain(self.source_location_argument())
            .collect()
    }
}

/// Non-fatal findings about how context arguments were written.
pub fn context_warnings(assertion: &str, arguments: &[Argument]) -> Vec<(ErrorKind, Span)> {
    let mut warnings = Vec::new();

    let locations: Vec<&Argument> = arguments
        .iter()
        .filter(|arg| arg.has_label(SOURCE_LOCATION_LABEL))
        .collect();

    if let Some(last) = locations.last() {
        if locations.len() > 1 {
            warnings.push((
                ErrorKind::DuplicateLabel {
                    assertion: assertion.to_string(),
                    label: SOURCE_LOCATION_LABEL.to_string(),
                },
                last.value.span,
            ));
        }
        if arguments
            .iter()
            .any(|arg| arg.has_label(FILE_LABEL) || arg.has_label(LINE_LABEL))
        {
            warnings.push((
                ErrorKind::ConflictingSourceLocation {
                    assertion: assertion.to_string(),
                },
                last.value.span,
            ));
        }
    }

    warnings
}
