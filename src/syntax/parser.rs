//! Retrofit Parser
//!
//! Recognizes freestanding macro call sites in host source and turns them
//! into `CallExpr` nodes with exact spans. Operands are classified into a
//! few leaf shapes and otherwise kept verbatim; the parser never tries to
//! understand the host language beyond balanced delimiters.

use crate::ast::{Argument, CallExpr, Callee, Closure, Expr, LabeledClosure, Span, WithSpan};
use crate::errors::{to_source_span, ErrorKind, ErrorReporting, PhaseContext, RetrofitError, SourceContext};
use once_cell::sync::Lazy;
use pest::{error::Error, iterators::Pair, Parser};
use pest_derive::Parser;
use regex::Regex;

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct AssertionParser;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parses a single call expression, keeping the whitespace and comments
/// around it as leading/trailing trivia.
pub fn parse_call(source: &SourceContext) -> Result<CallExpr, RetrofitError> {
    let pairs = AssertionParser::parse(Rule::call_expression, &source.content)
        .map_err(|e| convert_parse_error(e, source))?;

    let mut leading_trivia = None;
    let mut trailing_trivia = String::new();
    let mut call = None;

    for pair in pairs.flat_map(|p| p.into_inner()) {
        match pair.as_rule() {
            Rule::trivia if call.is_none() => leading_trivia = Some(pair.as_str().to_string()),
            Rule::trivia => trailing_trivia = pair.as_str().to_string(),
            Rule::call_site => call = Some(build_call(pair, 0)),
            _ => {}
        }
    }

    let mut call = call.ok_or_else(|| {
        PhaseContext::new(source.clone(), "parse").report(
            ErrorKind::MalformedSource {
                construct: "call expression".into(),
            },
            to_source_span(Span::new(0, source.content.len())),
        )
    })?;
    call.leading_trivia = leading_trivia.unwrap_or_default();
    call.trailing_trivia = trailing_trivia;
    Ok(call)
}

/// Finds every top-level call site in `text`. Spans are shifted by `offset`
/// so that calls found inside a fragment still point into the whole source.
pub fn scan_call_sites(
    source: &SourceContext,
    text: &str,
    offset: usize,
) -> Result<Vec<CallExpr>, RetrofitError> {
    let pairs = AssertionParser::parse(Rule::source, text).map_err(|e| {
        let mut error = convert_parse_error(e, source);
        let span = error.source_info.primary_span;
        error.source_info.primary_span = (span.offset() + offset, span.len()).into();
        error
    })?;

    Ok(pairs
        .flat_map(|p| p.into_inner())
        .filter(|p| p.as_rule() == Rule::call_site)
        .map(|p| build_call(p, offset))
        .collect())
}

/// True when every bracket in `text` is closed in order, ignoring brackets
/// inside string literals and comments.
pub fn is_balanced(text: &str) -> bool {
    AssertionParser::parse(Rule::fragment, text).is_ok()
}

pub fn is_identifier(text: &str) -> bool {
    IDENTIFIER.is_match(text)
}

// ============================================================================
// AST BUILDERS
// ============================================================================

fn build_call(pair: Pair<Rule>, offset: usize) -> CallExpr {
    let span = span_of(&pair, offset);
    let mut call = CallExpr::macro_call(String::new(), Vec::new());
    call.span = span;
    call.parenthesized = false;

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::macro_name => call.callee = Callee::Macro(inner.as_str().to_string()),
            Rule::generic_clause => call.generic_clause = Some(inner.as_str().to_string()),
            Rule::argument_clause => {
                call.parenthesized = true;
                call.arguments = inner
                    .into_inner()
                    .filter(|p| p.as_rule() == Rule::argument)
                    .map(|p| build_argument(p, offset))
                    .collect();
            }
            Rule::trailing_closures => build_trailing_closures(inner, &mut call, offset),
            _ => {}
        }
    }

    call
}

fn build_argument(pair: Pair<Rule>, offset: usize) -> Argument {
    let mut label = None;
    let mut value = WithSpan::new(Expr::Verbatim(String::new()), span_of(&pair, offset));

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::argument_label => label = Some(inner.as_str().to_string()),
            Rule::argument_value => {
                // The value runs up to the next separator; drop trailing layout.
                let text = inner.as_str().trim_end();
                let start = inner.as_span().start() + offset;
                value = WithSpan::new(classify_operand(text), Span::new(start, start + text.len()));
            }
            _ => {}
        }
    }

    Argument { label, value }
}

fn build_trailing_closures(pair: Pair<Rule>, call: &mut CallExpr, offset: usize) {
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::closure_literal => {
                call.trailing_closure = Some(WithSpan::new(
                    closure_from_literal(inner.as_str()),
                    span_of(&inner, offset),
                ))
            }
            Rule::additional_closure => {
                let mut label = String::new();
                let mut closure = WithSpan::new(Closure::Verbatim(String::new()), Span::default());
                for part in inner.into_inner() {
                    match part.as_rule() {
                        Rule::argument_label => label = part.as_str().to_string(),
                        Rule::closure_literal => {
                            closure =
                                WithSpan::new(closure_from_literal(part.as_str()), span_of(&part, offset))
                        }
                        _ => {}
                    }
                }
                call.additional_trailing_closures
                    .push(LabeledClosure { label, closure });
            }
            _ => {}
        }
    }
}

/// Picks the most specific leaf shape for an operand's source text.
fn classify_operand(text: &str) -> Expr {
    if AssertionParser::parse(Rule::closure_only, text).is_ok() {
        return Expr::Closure(closure_from_literal(text));
    }
    if AssertionParser::parse(Rule::string_only, text).is_ok() {
        return Expr::StringLiteral(text.to_string());
    }
    if is_identifier(text) {
        return Expr::Identifier(text.to_string());
    }
    Expr::Verbatim(text.to_string())
}

fn closure_from_literal(text: &str) -> Closure {
    let inner = text
        .strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(text);
    Closure::Verbatim(inner.to_string())
}

fn span_of(pair: &Pair<Rule>, offset: usize) -> Span {
    let span = pair.as_span();
    Span::new(span.start(), span.end()).offset(offset)
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

fn convert_parse_error(error: Error<Rule>, source: &SourceContext) -> RetrofitError {
    let span = match error.location {
        pest::error::InputLocation::Pos(pos) => Span::new(pos, pos),
        pest::error::InputLocation::Span((start, end)) => Span::new(start, end),
    };

    let rendered = error.to_string();
    let construct = if rendered.contains("argument_clause") {
        "argument list"
    } else if rendered.contains("call_site") || rendered.contains("macro_name") {
        "macro call (expected `#name(...)`)"
    } else {
        "source"
    };

    PhaseContext::new(source.clone(), "parse").report(
        ErrorKind::MalformedSource {
            construct: construct.to_string(),
        },
        to_source_span(span),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> CallExpr {
        parse_call(&SourceContext::from_file("test", text)).expect("call parses")
    }

    #[test]
    fn test_parse_binary_call_with_context_arguments() {
        let call = parse("#XCTAssertEqual(a, b, \"boo!\", file: file, line: line)");
        assert_eq!(call.invocation_name(), Some("XCTAssertEqual"));
        assert_eq!(call.arguments.len(), 5);
        assert_eq!(call.arguments[0].expr(), &Expr::Identifier("a".into()));
        assert_eq!(call.arguments[2].expr(), &Expr::StringLiteral("\"boo!\"".into()));
        assert_eq!(call.arguments[3].label.as_deref(), Some("file"));
        assert_eq!(call.arguments[4].label.as_deref(), Some("line"));
    }

    #[test]
    fn test_argument_spans_exclude_trailing_whitespace() {
        let call = parse("#XCTAssert(x , \"m\")");
        assert_eq!(call.arguments[0].value.span, Span::new(11, 12));
    }

    #[test]
    fn test_nested_commas_stay_inside_operands() {
        let call = parse("#XCTAssertEqual(f(1, 2), [3, 4])");
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(call.arguments[0].expr(), &Expr::Verbatim("f(1, 2)".into()));
        assert_eq!(call.arguments[1].expr(), &Expr::Verbatim("[3, 4]".into()));
    }

    #[test]
    fn test_string_with_comma_and_paren() {
        let call = parse("#XCTAssert(ok, \"a, b) \\(c(d))\")");
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(
            call.arguments[1].expr(),
            &Expr::StringLiteral("\"a, b) \\(c(d))\"".into())
        );
    }

    #[test]
    fn test_trailing_closure_and_trivia() {
        let call = parse("  #XCTAssertThrowsError(try f()) { error in print(error) }\n");
        assert_eq!(call.leading_trivia, "  ");
        assert_eq!(call.trailing_trivia, "\n");
        let closure = call.trailing_closure.expect("trailing closure");
        assert_eq!(closure.value, Closure::Verbatim(" error in print(error) ".into()));
        assert_eq!(closure.span, Span::new(33, 58));
    }

    #[test]
    fn test_raw_string_argument_is_one_operand() {
        let call = parse("#XCTAssert(ok, #\"say \"hi\", (\"#)");
        assert_eq!(call.arguments.len(), 2);
        assert_eq!(
            call.arguments[1].expr(),
            &Expr::Verbatim("#\"say \"hi\", (\"#".into())
        );
    }

    #[test]
    fn test_closure_argument_is_classified() {
        let call = parse("#XCTAssertThrowsError(try f(), \"m\", { e in g(e) })");
        assert!(call.arguments[2].expr().is_closure());
    }

    #[test]
    fn test_call_without_parentheses() {
        let call = parse("#XCTFail");
        assert!(!call.parenthesized);
        assert!(call.arguments.is_empty());
    }

    #[test]
    fn test_generic_clause_is_kept() {
        let call = parse("#XCTUnwrap<Int>(x)");
        assert_eq!(call.generic_clause.as_deref(), Some("<Int>"));
    }

    #[test]
    fn test_unbalanced_call_is_rejected() {
        assert!(parse_call(&SourceContext::from_file("test", "#XCTAssert(f(x)")).is_err());
    }

    #[test]
    fn test_scan_skips_strings_and_comments() {
        let text = "let s = \"#XCTFail()\"\n// #XCTFail()\n#XCTFail(\"real\")\n";
        let source = SourceContext::from_file("test", text);
        let calls = scan_call_sites(&source, text, 0).expect("scan succeeds");
        assert_eq!(calls.len(), 1);
        assert_eq!(&text[calls[0].span.start..calls[0].span.end], "#XCTFail(\"real\")");
    }

    #[test]
    fn test_scan_offsets_spans() {
        let text = "#XCTAssert(x)";
        let source = SourceContext::from_file("test", text);
        let calls = scan_call_sites(&source, text, 100).expect("scan succeeds");
        assert_eq!(calls[0].span, Span::new(100, 113));
    }

    #[test]
    fn test_is_balanced() {
        assert!(is_balanced("f(a, [b, {c}])"));
        assert!(is_balanced("\")\""));
        assert!(!is_balanced("f(a"));
        assert!(!is_balanced("a)"));
    }
}
