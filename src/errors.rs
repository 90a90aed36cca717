//! Retrofit Error Handling - Unified Diagnostic API
//!
//! Every failure and warning the rewriter produces is a `RetrofitError`: a
//! kind describing what went wrong, the source it points into, and the
//! diagnostic metadata `miette` needs to render it at the original call site.

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::fmt;
use std::sync::Arc;

use crate::ast::Span;

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Represents source context for error reporting with explicit hierarchy
/// between real sources (preferred) and fallbacks (tolerated when necessary)
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when real source is unavailable
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "fallback".to_string(),
            content: format!("// {}", context),
        }
    }

    /// Convert to NamedSource for use with miette error reporting
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("default context")
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// The single diagnostic type - kind, location, and rendering hints
#[derive(Debug, Clone)]
pub struct RetrofitError {
    /// What went wrong (type-specific data)
    pub kind: ErrorKind,
    /// Where it happened
    pub source_info: SourceInfo,
    /// How to help
    pub diagnostic_info: DiagnosticInfo,
}

/// All diagnostic kinds the rewriter can produce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    // Configuration errors - detected before any call site is rewritten
    #[error("unable to infer an assertion name from `{identifier}`")]
    UnableToInferAssertionName { identifier: String },
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    // Rewrite errors - abort a single call site
    #[error("expected assertion-name `{expected}` but encountered `{observed}` instead")]
    UnexpectedAssertionName { expected: String, observed: String },
    #[error("`{assertion}` needs at least {minimum} arguments, but only saw {observed}")]
    InsufficientArgumentCount {
        assertion: String,
        minimum: usize,
        observed: usize,
    },
    #[error("`{assertion}` failed to extract usable context arguments")]
    UnableToExtractContextArguments { assertion: String },

    // Internal errors - a synthesizer produced an invalid tree
    #[error("`{assertion}` synthesized a malformed expression: {reason}")]
    MalformedSynthesizedExpression { assertion: String, reason: String },

    // Parse errors
    #[error("malformed {construct}")]
    MalformedSource { construct: String },

    // Warnings
    #[error("`sourceLocation:` takes precedence over `file:`/`line:` in `{assertion}`")]
    ConflictingSourceLocation { assertion: String },
    #[error("`{label}:` is given more than once in `{assertion}`; the last one wins")]
    DuplicateLabel { assertion: String, label: String },
    #[error("labeled closure `{label}:` is not treated as an error handler in `{assertion}`")]
    LabeledClosureIgnored { assertion: String, label: String },

    // I/O
    #[error("cannot access `{path}`: {message}")]
    Io { path: String, message: String },
}

/// Context-specific source information
#[derive(Debug, Clone)]
pub struct SourceInfo {
    pub source: Arc<NamedSource<String>>,
    pub primary_span: SourceSpan,
    pub phase: String,
}

/// Diagnostic enhancement data
#[derive(Debug, Clone)]
pub struct DiagnosticInfo {
    pub help: Option<String>,
    pub error_code: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Parse,
    Rewrite,
    Internal,
    Io,
}

impl ErrorKind {
    /// Get the error category for test assertions
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnableToInferAssertionName { .. } | Self::InvalidConfiguration { .. } => {
                ErrorCategory::Configuration
            }

            Self::UnexpectedAssertionName { .. }
            | Self::InsufficientArgumentCount { .. }
            | Self::UnableToExtractContextArguments { .. }
            | Self::ConflictingSourceLocation { .. }
            | Self::DuplicateLabel { .. }
            | Self::LabeledClosureIgnored { .. } => ErrorCategory::Rewrite,

            Self::MalformedSynthesizedExpression { .. } => ErrorCategory::Internal,
            Self::MalformedSource { .. } => ErrorCategory::Parse,
            Self::Io { .. } => ErrorCategory::Io,
        }
    }

    /// Get error code suffix for diagnostic codes
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::UnableToInferAssertionName { .. } => "unable_to_infer_assertion_name",
            Self::InvalidConfiguration { .. } => "invalid_configuration",
            Self::UnexpectedAssertionName { .. } => "unexpected_assertion_name",
            Self::InsufficientArgumentCount { .. } => "insufficient_argument_count",
            Self::UnableToExtractContextArguments { .. } => {
                "unable_to_extract_context_arguments"
            }
            Self::MalformedSynthesizedExpression { .. } => "malformed_synthesized_expression",
            Self::MalformedSource { .. } => "malformed_source",
            Self::ConflictingSourceLocation { .. } => "conflicting_source_location",
            Self::DuplicateLabel { .. } => "duplicate_label",
            Self::LabeledClosureIgnored { .. } => "labeled_closure_ignored",
            Self::Io { .. } => "io",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::ConflictingSourceLocation { .. }
            | Self::DuplicateLabel { .. }
            | Self::LabeledClosureIgnored { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    fn default_help(&self) -> Option<String> {
        match self {
            Self::UnableToInferAssertionName { .. } => Some(
                "assertion identifiers must look like `XCT<Name>Macro`, or carry an explicit invocation name"
                    .into(),
            ),
            Self::UnexpectedAssertionName { expected, .. } => {
                Some(format!("this rewrite only applies to `#{expected}`"))
            }
            Self::InsufficientArgumentCount {
                assertion, minimum, ..
            } => Some(format!(
                "`{assertion}` takes {minimum} operand(s) before its message and location arguments"
            )),
            Self::MalformedSynthesizedExpression { .. } => {
                Some("This is an internal rewriter error. Please report this as a bug.".into())
            }
            Self::ConflictingSourceLocation { .. } => {
                Some("remove either `sourceLocation:` or `file:`/`line:`".into())
            }
            _ => None,
        }
    }
}

impl std::error::Error for RetrofitError {}

impl fmt::Display for RetrofitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.kind, f)
    }
}

impl Diagnostic for RetrofitError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.diagnostic_info.error_code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diagnostic_info.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diagnostic_info
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = vec![LabeledSpan::new_with_span(
            Some(self.primary_label()),
            self.source_info.primary_span,
        )];
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.source_info.source)
    }
}

impl RetrofitError {
    fn primary_label(&self) -> String {
        match &self.kind {
            ErrorKind::UnableToInferAssertionName { .. } => "misconfigured assertion".into(),
            ErrorKind::InvalidConfiguration { .. } => "invalid setting".into(),
            ErrorKind::UnexpectedAssertionName { .. } => "unexpected assertion".into(),
            ErrorKind::InsufficientArgumentCount { .. } => "too few arguments".into(),
            ErrorKind::UnableToExtractContextArguments { .. } => "unusable arguments".into(),
            ErrorKind::MalformedSynthesizedExpression { .. } => "rewrite failed here".into(),
            ErrorKind::MalformedSource { .. } => "malformed syntax".into(),
            ErrorKind::ConflictingSourceLocation { .. } => "location given twice".into(),
            ErrorKind::DuplicateLabel { .. } => "duplicate label".into(),
            ErrorKind::LabeledClosureIgnored { .. } => "ignored closure".into(),
            ErrorKind::Io { .. } => "here".into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.diagnostic_info.severity == Severity::Warning
    }

    /// Byte offset of the primary span, for machine-readable reports.
    pub fn offset(&self) -> usize {
        self.source_info.primary_span.offset()
    }

    pub fn source_name(&self) -> &str {
        self.source_info.source.name()
    }
}

// ============================================================================
// ERROR CONSTRUCTION
// ============================================================================

/// Context-aware error creation - each context knows how to create appropriate errors
pub trait ErrorReporting {
    /// Create an error with context-appropriate enhancements
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> RetrofitError;

    fn unexpected_assertion_name(&self, expected: &str, observed: &str, span: Span) -> RetrofitError {
        self.report(
            ErrorKind::UnexpectedAssertionName {
                expected: expected.into(),
                observed: observed.into(),
            },
            to_source_span(span),
        )
    }

    fn insufficient_argument_count(
        &self,
        assertion: &str,
        minimum: usize,
        observed: usize,
        span: Span,
    ) -> RetrofitError {
        self.report(
            ErrorKind::InsufficientArgumentCount {
                assertion: assertion.into(),
                minimum,
                observed,
            },
            to_source_span(span),
        )
    }

    fn malformed_synthesis(&self, assertion: &str, reason: &str, span: Span) -> RetrofitError {
        self.report(
            ErrorKind::MalformedSynthesizedExpression {
                assertion: assertion.into(),
                reason: reason.into(),
            },
            to_source_span(span),
        )
    }
}

/// General-purpose error creation context for a named phase over one source
pub struct PhaseContext {
    pub source: SourceContext,
    pub phase: String,
}

impl PhaseContext {
    pub fn new(source: SourceContext, phase: impl Into<String>) -> Self {
        Self {
            source,
            phase: phase.into(),
        }
    }
}

impl ErrorReporting for PhaseContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> RetrofitError {
        build_error(&self.source, &self.phase, kind, span)
    }
}

/// Builds a fully populated diagnostic; shared by every `ErrorReporting` impl.
pub fn build_error(
    source: &SourceContext,
    phase: &str,
    kind: ErrorKind,
    span: SourceSpan,
) -> RetrofitError {
    let error_code = format!("retrofit::{}::{}", phase, kind.code_suffix());
    let help = kind.default_help();
    let severity = kind.severity();

    RetrofitError {
        kind,
        source_info: SourceInfo {
            source: source.to_named_source(),
            primary_span: span,
            phase: phase.to_string(),
        },
        diagnostic_info: DiagnosticInfo {
            help,
            error_code,
            severity,
        },
    }
}

/// Standalone constructor for configuration-time failures, which have no
/// call site to point at.
pub fn configuration_error(kind: ErrorKind, origin: &str) -> RetrofitError {
    build_error(&SourceContext::fallback(origin), "config", kind, unspanned())
}

/// Standalone constructor for I/O failures on a path.
pub fn io_error(path: &std::path::Path, error: &std::io::Error) -> RetrofitError {
    let path = path.display().to_string();
    build_error(
        &SourceContext::fallback(&path),
        "io",
        ErrorKind::Io {
            path,
            message: error.to_string(),
        },
        unspanned(),
    )
}

/// Creates a placeholder span for errors not tied to a specific source code
/// location, such as I/O errors or configuration failures.
pub fn unspanned() -> SourceSpan {
    SourceSpan::from(0..0)
}

/// Converts an AST Span to a miette SourceSpan.
pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.start..span.end)
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints a RetrofitError with full miette diagnostics
pub fn print_error(error: &RetrofitError) {
    use miette::Report;
    let report = Report::new(error.clone());
    eprintln!("{report:?}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_includes_phase_and_kind() {
        let ctx = PhaseContext::new(SourceContext::from_file("t.swift", "#XCTFail()"), "rewrite");
        let err = ctx.insufficient_argument_count("XCTAssertEqual", 2, 1, Span::new(0, 10));
        assert_eq!(
            err.diagnostic_info.error_code,
            "retrofit::rewrite::insufficient_argument_count"
        );
        assert_eq!(err.kind.category(), ErrorCategory::Rewrite);
        assert!(!err.is_warning());
    }

    #[test]
    fn test_warnings_are_flagged() {
        let kind = ErrorKind::DuplicateLabel {
            assertion: "XCTAssert".into(),
            label: "sourceLocation".into(),
        };
        assert_eq!(kind.severity(), Severity::Warning);
    }

    #[test]
    fn test_display_mentions_expected_and_observed() {
        let kind = ErrorKind::UnexpectedAssertionName {
            expected: "XCTAssertEqual".into(),
            observed: "XCTAssertTrue".into(),
        };
        let text = kind.to_string();
        assert!(text.contains("XCTAssertEqual"));
        assert!(text.contains("XCTAssertTrue"));
    }
}
