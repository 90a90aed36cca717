//! # Retrofit Rewrite Engine
//!
//! Turns one legacy assertion call into its target-dialect replacement.
//!
//! ## Pipeline
//!
//! Every call goes through the same fixed order, and nothing is synthesized
//! until the first three steps pass:
//!
//! 1. **Name check**: the call's invocation name must be the rule's name.
//! 2. **Arity check**: at least the family's mandatory operand count.
//! 3. **Context extraction**: message and source location.
//! 4. **Synthesis**: the condition, or one of the special throw forms.
//! 5. **Validation**: the produced tree must be structurally sound.
//!
//! Each failure aborts only the call being rewritten.
//!
//! **INVARIANT:** operands are moved into the output, never duplicated. A
//! synthesized tree references each operand exactly once.

use crate::ast::{validate::validate_call, Argument, CallExpr, Expr, Span};
use crate::errors::{
    build_error, to_source_span, ErrorKind, ErrorReporting, RetrofitError, SourceContext,
};
use miette::SourceSpan;

pub mod assemble;
pub mod context_args;
pub mod family;
pub mod fresh;
pub mod registry;
pub mod special;
pub mod synth;

pub use context_args::ContextArguments;
pub use family::{AssertionFamily, AssertionKind, KindRule, STANDARD_RULES};
pub use fresh::FreshNames;
pub use registry::{AssertionRegistry, AssertionRule};

// ============================================================================
// EXPANSION CONTEXT
// ============================================================================

/// Per-call state: where diagnostics point, the fresh-name scope, and the
/// warnings collected so far.
pub struct ExpansionContext<'a> {
    pub source: &'a SourceContext,
    pub fresh: FreshNames,
    pub diagnostics: Vec<RetrofitError>,
    /// Text fresh names must not collide with, besides the whole source.
    pub reserved: String,
}

impl<'a> ExpansionContext<'a> {
    pub fn new(source: &'a SourceContext, fresh: FreshNames) -> Self {
        Self {
            source,
            fresh,
            diagnostics: Vec::new(),
            reserved: String::new(),
        }
    }

    pub fn fresh_name(&mut self, hint: &str) -> String {
        self.fresh
            .make_unique(hint, &[self.source.content.as_str(), self.reserved.as_str()])
    }

    pub fn warn(&mut self, kind: ErrorKind, span: Span) {
        let warning = self.report(kind, to_source_span(span));
        tracing::warn!(code = %warning.diagnostic_info.error_code, "{}", warning);
        self.diagnostics.push(warning);
    }
}

impl ErrorReporting for ExpansionContext<'_> {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> RetrofitError {
        build_error(self.source, "rewrite", kind, span)
    }
}

// ============================================================================
// REWRITE DRIVER
// ============================================================================

/// Rewrites `call` under `rule`. The result is always a call expression: a
/// target macro, `Issue.record(...)`, or an immediately invoked closure.
pub fn rewrite_call(
    rule: &AssertionRule,
    call: &CallExpr,
    ctx: &mut ExpansionContext,
) -> Result<CallExpr, RetrofitError> {
    let name = rule.name.as_str();
    let kind = rule.rule.kind;
    let mandatory = kind.mandatory_argument_count();

    let observed = call.invocation_name().unwrap_or_default();
    if observed != name {
        return Err(ctx.unexpected_assertion_name(name, observed, call.span));
    }
    if call.arguments.len() < mandatory {
        return Err(ctx.insufficient_argument_count(name, mandatory, call.arguments.len(), call.span));
    }
    let context = ContextArguments::extract(&call.arguments, mandatory).ok_or_else(|| {
        ctx.report(
            ErrorKind::UnableToExtractContextArguments {
                assertion: name.to_string(),
            },
            to_source_span(call.span),
        )
    })?;

    for (warning, span) in context_args::context_warnings(name, &call.arguments) {
        ctx.warn(warning, span);
    }

    let operands: Vec<Expr> = call.arguments[..mandatory]
        .iter()
        .map(|arg| arg.expr().clone())
        .collect();

    tracing::debug!(assertion = name, kind = ?kind, operands = operands.len(), "rewriting call");

    let rewritten = match kind.family() {
        AssertionFamily::Unconditional => assemble::record_issue(call, &context),
        AssertionFamily::ThrowingExpectation => {
            special::throws_error(name, call, &operands[0], &context, ctx)
        }
        AssertionFamily::NonThrowingExpectation => special::no_throw(call, &operands[0], &context),
        AssertionFamily::Unary | AssertionFamily::Binary | AssertionFamily::BinaryWithTolerance => {
            let condition = synthesized_condition(rule, &operands, call, ctx)?;
            assemble::target_call(
                call,
                kind.target_macro(),
                vec![Argument::unlabeled(condition)],
                &context,
            )
        }
    };

    validate_call(&rewritten).map_err(|reason| ctx.malformed_synthesis(name, &reason, call.span))?;
    Ok(rewritten)
}

/// The condition for a unary, binary or tolerance rule. Operands that do not
/// fit the kind are an internal error, since arity was checked before.
fn synthesized_condition(
    rule: &AssertionRule,
    operands: &[Expr],
    call: &CallExpr,
    ctx: &ExpansionContext,
) -> Result<Expr, RetrofitError> {
    let kind = rule.rule.kind;
    synth::synthesize_condition(kind, operands, rule.rule.defensive_parentheses).ok_or_else(|| {
        ctx.malformed_synthesis(
            &rule.name,
            &format!(
                "{} operand(s) do not fit a {kind:?} condition",
                operands.len()
            ),
            call.span,
        )
    })
}

/// Rewrites `call` if the registry knows it; `Ok(None)` leaves it alone.
pub fn expand(
    call: &CallExpr,
    registry: &AssertionRegistry,
    ctx: &mut ExpansionContext,
) -> Result<Option<CallExpr>, RetrofitError> {
    match registry.resolve(call) {
        Some(rule) => rewrite_call(rule, call, ctx).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Renderer;
    use crate::errors::ErrorCategory;
    use crate::syntax::parse_call;

    fn rewrite(text: &str) -> Result<String, RetrofitError> {
        let source = SourceContext::from_file("test.swift", text);
        let call = parse_call(&source)?;
        let registry = AssertionRegistry::standard()?;
        let mut ctx = ExpansionContext::new(&source, FreshNames::root(fresh::DEFAULT_PREFIX, "test.swift", 0));
        let rewritten = expand(&call, &registry, &mut ctx)?.expect("known assertion");
        Ok(Renderer::default().render_call(&rewritten))
    }

    #[test]
    fn test_equal_scenario() {
        assert_eq!(rewrite("#XCTAssertEqual(0, 1)").unwrap(), "#expect((0) == (1))");
    }

    #[test]
    fn test_not_nil_scenario() {
        assert_eq!(rewrite("#XCTAssertNotNil(x)").unwrap(), "#expect((x) != nil)");
    }

    #[test]
    fn test_arity_failure_comes_before_synthesis() {
        let err = rewrite("#XCTAssertEqual(1)").unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::InsufficientArgumentCount {
                minimum: 2,
                observed: 1,
                ..
            }
        ));
        assert_eq!(err.kind.category(), ErrorCategory::Rewrite);
    }

    #[test]
    fn test_name_mismatch_is_reported() {
        let source = SourceContext::from_file("test.swift", "#XCTAssertTrue(x)");
        let call = parse_call(&source).unwrap();
        let registry = AssertionRegistry::standard().unwrap();
        let equal = registry
            .rules()
            .find(|rule| rule.rule.kind == AssertionKind::Equal)
            .unwrap();
        let mut ctx = ExpansionContext::new(&source, FreshNames::root("__t_", "test.swift", 0));
        let err = rewrite_call(equal, &call, &mut ctx).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnexpectedAssertionName {
                expected: "XCTAssertEqual".into(),
                observed: "XCTAssertTrue".into(),
            }
        );
    }

    #[test]
    fn test_trivia_is_preserved() {
        assert_eq!(
            rewrite("  #XCTAssert(ok) // note").unwrap(),
            "  #expect(Bool((ok))) // note"
        );
    }

    #[test]
    fn test_unwrap_renames_the_whole_call() {
        assert_eq!(
            rewrite("#XCTUnwrap(value, \"m\", file: f, line: l)").unwrap(),
            "#require(value, \"m\", sourceLocation: SourceLocation(file: f, line: l))"
        );
    }

    #[test]
    fn test_condition_mismatch_is_internal() {
        let source = SourceContext::from_file("test.swift", "#XCTAssertEqual(a, b)");
        let call = parse_call(&source).unwrap();
        let registry = AssertionRegistry::standard().unwrap();
        let rule = registry.resolve(&call).unwrap();
        let ctx = ExpansionContext::new(&source, FreshNames::root("__t_", "test.swift", 0));

        let err = synthesized_condition(rule, &[Expr::ident("a")], &call, &ctx).unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::MalformedSynthesizedExpression { ref assertion, .. } if assertion == "XCTAssertEqual"
        ));
        assert_eq!(err.kind.category(), ErrorCategory::Internal);
        assert_eq!(
            err.diagnostic_info.error_code,
            "retrofit::rewrite::malformed_synthesized_expression"
        );
    }
}
